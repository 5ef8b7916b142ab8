//! Workflow controller: drives the produce → review → decide → revise loop.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use super::policy::AcceptancePolicy;
use super::state::{RunSession, WorkflowPhase};
use super::{WorkflowError, WorkflowResult, WorkflowStatus};
use crate::config::{ConfigError, WorkflowConfig};
use crate::council::{Producer, ReviewFanout, ReviewerSeat, ReviewerSlot};
use crate::events::{preview, SharedEventBus, WorkflowEvent};
use crate::feedback::{
    build_revision_prompt, FeedbackAggregator, MarkdownResponseParser, ResponseParser,
};
use crate::review::Round;

const QUERY_PREVIEW_CHARS: usize = 120;

/// Runs review workflows for one producer and one fixed reviewer panel.
///
/// The controller holds no per-run state; each [`execute`](Self::execute)
/// owns its own [`RunSession`], so one controller can serve many queries.
pub struct WorkflowController {
    producer: Arc<dyn Producer>,
    panel: Vec<ReviewerSeat>,
    slots: Vec<ReviewerSlot>,
    config: WorkflowConfig,
    policy: AcceptancePolicy,
    aggregator: FeedbackAggregator,
    fanout: ReviewFanout,
    events: Option<SharedEventBus>,
}

impl WorkflowController {
    /// Build a controller. Fails if `config` is invalid for the panel or the
    /// panel's identities are not `0..N` in order.
    pub fn new(
        producer: Arc<dyn Producer>,
        panel: Vec<ReviewerSeat>,
        config: WorkflowConfig,
    ) -> Result<Self, WorkflowError> {
        config.validate(panel.len())?;
        for (idx, seat) in panel.iter().enumerate() {
            if seat.slot.id.0 != idx {
                return Err(ConfigError::Invalid(format!(
                    "reviewer at position {} has identity {}",
                    idx, seat.slot.id
                ))
                .into());
            }
        }

        let policy = config.policy();
        let slots = panel.iter().map(|seat| seat.slot.clone()).collect();
        let fanout = ReviewFanout::new(Arc::new(MarkdownResponseParser::new(config.max_score)))
            .with_timeout(config.reviewer_timeout());

        Ok(Self {
            producer,
            panel,
            slots,
            aggregator: FeedbackAggregator::new(&policy),
            policy,
            config,
            fanout,
            events: None,
        })
    }

    /// Swap the extraction strategy used on reviewer output.
    pub fn with_parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.fanout = ReviewFanout::new(parser).with_timeout(self.config.reviewer_timeout());
        self
    }

    /// Publish progress events to `bus`.
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    pub fn panel(&self) -> &[ReviewerSlot] {
        &self.slots
    }

    /// Run the workflow for `query` to a terminal status.
    ///
    /// Returns `Err` only for an empty query, a producer failure (no partial
    /// round is recorded for the failed attempt) or an internal state error.
    pub async fn execute(&self, query: &str) -> Result<WorkflowResult, WorkflowError> {
        if query.trim().is_empty() {
            return Err(WorkflowError::EmptyQuery);
        }

        let mut session = RunSession::new(query, self.config.max_iterations);
        info!(
            run_id = %session.id,
            max_iterations = self.config.max_iterations,
            reviewers = self.panel.len(),
            threshold = self.policy.threshold,
            quorum = self.policy.quorum,
            "Workflow run started"
        );
        self.publish(WorkflowEvent::RunStarted {
            run_id: session.id.clone(),
            query_preview: preview(query, QUERY_PREVIEW_CHARS),
            max_iterations: self.config.max_iterations,
            reviewers: self.panel.len(),
            timestamp: Utc::now(),
        });

        let mut prompt = query.to_string();

        loop {
            let iteration = session.iteration;
            let started_at = Utc::now();

            // ── Produce ─────────────────────────────────────────────
            debug!(run_id = %session.id, iteration, "Invoking producer");
            let artifact = match self.producer.produce(&prompt).await {
                Ok(artifact) => artifact,
                Err(source) => {
                    error!(run_id = %session.id, iteration, error = %source, "Producer failed");
                    self.advance(&mut session, WorkflowPhase::Failed, "producer failed")?;
                    self.publish(WorkflowEvent::RunFailed {
                        run_id: session.id.clone(),
                        iteration,
                        error: source.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Err(WorkflowError::Producer { iteration, source });
                }
            };
            self.advance(&mut session, WorkflowPhase::Reviewing, "artifact produced")?;

            // ── Review (barrier) ────────────────────────────────────
            let reviews = self.fanout.review(&artifact, &self.panel).await;
            let round = Round::new(iteration, artifact, reviews, started_at);
            self.advance(&mut session, WorkflowPhase::Deciding, "all reviews resolved")?;

            // ── Decide ──────────────────────────────────────────────
            let decision = self.policy.decide(&round.scores);
            self.publish_round(&session, &round, decision.passing, decision.accepted);
            info!(
                run_id = %session.id,
                iteration,
                scores = ?round.scores,
                passing = decision.passing,
                required = decision.required,
                failed_reviews = round.failed_reviews(),
                accepted = decision.accepted,
                "Round decided"
            );

            if decision.accepted {
                session.record_round(round);
                self.advance(&mut session, WorkflowPhase::Accepted, "quorum reached")?;
                return Ok(self.finish(session, WorkflowStatus::Accepted));
            }

            if session.on_final_iteration() {
                session.record_round(round);
                self.advance(
                    &mut session,
                    WorkflowPhase::Exhausted,
                    "rejected on final iteration",
                )?;
                return Ok(self.finish(session, WorkflowStatus::Exhausted));
            }

            // ── Revise ──────────────────────────────────────────────
            self.advance(&mut session, WorkflowPhase::Revising, "quorum missed")?;
            let directive = self.aggregator.aggregate(&round, &self.slots);
            debug!(
                run_id = %session.id,
                iteration,
                critical = directive.critical_count(),
                priorities = directive.priorities.len(),
                "Revision directive built"
            );
            prompt = build_revision_prompt(query, &round.artifact, &directive);
            session.record_round(round);
            self.advance(&mut session, WorkflowPhase::Producing, "revision requested")?;
        }
    }

    fn advance(
        &self,
        session: &mut RunSession,
        to: WorkflowPhase,
        reason: &str,
    ) -> Result<(), WorkflowError> {
        let from = session.phase;
        session.transition(to, reason)?;
        debug!(run_id = %session.id, iteration = session.iteration, %from, %to, reason, "Phase changed");
        self.publish(WorkflowEvent::PhaseChanged {
            run_id: session.id.clone(),
            iteration: session.iteration,
            from,
            to,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn publish_round(&self, session: &RunSession, round: &Round, passing: usize, accepted: bool) {
        if self.events.is_none() {
            return;
        }
        for review in &round.reviews {
            self.publish(WorkflowEvent::ReviewRecorded {
                run_id: session.id.clone(),
                iteration: round.iteration,
                reviewer: review.reviewer,
                reviewer_label: review.reviewer_label.clone(),
                score: review.score,
                recommendation: review.recommendation,
                timestamp: Utc::now(),
            });
        }
        self.publish(WorkflowEvent::RoundCompleted {
            run_id: session.id.clone(),
            iteration: round.iteration,
            scores: round.scores.clone(),
            passing,
            accepted,
            duration_ms: round.duration_ms,
            timestamp: Utc::now(),
        });
    }

    fn finish(&self, session: RunSession, status: WorkflowStatus) -> WorkflowResult {
        let (artifact, final_scores) = session
            .last_round()
            .map(|round| (round.artifact.clone(), round.scores.clone()))
            .unwrap_or_default();
        let iterations = session.rounds.len() as u32;

        info!(
            run_id = %session.id,
            %status,
            iterations,
            final_scores = ?final_scores,
            "Workflow run finished"
        );
        self.publish(WorkflowEvent::RunFinished {
            run_id: session.id.clone(),
            status,
            iterations,
            final_scores: final_scores.clone(),
            timestamp: Utc::now(),
        });

        WorkflowResult {
            run_id: session.id,
            query: session.query,
            status,
            artifact,
            rounds: session.rounds,
            final_scores,
            iterations,
            transitions: session.transitions,
        }
    }

    fn publish(&self, event: WorkflowEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("panel", &self.slots)
            .field("config", &self.config)
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}
