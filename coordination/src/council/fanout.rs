//! Parallel review fan-out.
//!
//! Every seat reviews the same artifact snapshot concurrently. Results come
//! back in seat order regardless of completion order, and a seat that errors,
//! times out or panics is replaced by a zero-score sentinel so the round
//! always carries exactly one review per seat.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{self, JoinSet};
use tracing::{debug, warn};

use super::ReviewerSeat;
use crate::feedback::{MarkdownResponseParser, ResponseParser};
use crate::review::Review;

/// Runs one review round across a panel.
#[derive(Clone)]
pub struct ReviewFanout {
    parser: Arc<dyn ResponseParser>,
    timeout: Option<Duration>,
}

impl Default for ReviewFanout {
    fn default() -> Self {
        Self::new(Arc::new(MarkdownResponseParser::default()))
    }
}

impl ReviewFanout {
    pub fn new(parser: Arc<dyn ResponseParser>) -> Self {
        Self {
            parser,
            timeout: None,
        }
    }

    /// Bound each reviewer call; slower reviewers become sentinels.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Review `artifact` with every seat and return reviews in seat order.
    ///
    /// Reviewer tasks live in a `JoinSet`; dropping the returned future
    /// aborts every call still in flight.
    pub async fn review(&self, artifact: &str, panel: &[ReviewerSeat]) -> Vec<Review> {
        let artifact: Arc<str> = Arc::from(artifact);
        let mut join_set: JoinSet<Result<String, String>> = JoinSet::new();
        let mut seat_of: HashMap<task::Id, usize> = HashMap::with_capacity(panel.len());

        for (idx, seat) in panel.iter().enumerate() {
            let reviewer = Arc::clone(&seat.reviewer);
            let artifact = Arc::clone(&artifact);
            let timeout = self.timeout;
            let handle = join_set.spawn(async move {
                let call = reviewer.review(&artifact);
                match timeout {
                    Some(limit) => match tokio::time::timeout(limit, call).await {
                        Ok(result) => result.map_err(|e| format!("reviewer error: {e}")),
                        Err(_) => Err(format!(
                            "reviewer timed out after {}ms",
                            limit.as_millis()
                        )),
                    },
                    None => call.await.map_err(|e| format!("reviewer error: {e}")),
                }
            });
            seat_of.insert(handle.id(), idx);
        }

        let mut outcomes: Vec<Option<Result<String, String>>> = vec![None; panel.len()];
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    if let Some(&idx) = seat_of.get(&id) {
                        outcomes[idx] = Some(outcome);
                    }
                }
                Err(join_err) => {
                    if let Some(&idx) = seat_of.get(&join_err.id()) {
                        let slot = &panel[idx].slot;
                        warn!(reviewer = %slot.id, label = %slot.label, error = %join_err, "Reviewer task failed");
                        outcomes[idx] = Some(Err(format!("reviewer task panicked: {join_err}")));
                    }
                }
            }
        }

        panel
            .iter()
            .zip(outcomes)
            .map(|(seat, outcome)| {
                let slot = &seat.slot;
                match outcome {
                    Some(Ok(text)) => {
                        let review = self.parser.parse_review(slot, text);
                        debug!(
                            reviewer = %slot.id,
                            score = review.score,
                            recommendation = %review.recommendation,
                            "Review parsed"
                        );
                        review
                    }
                    Some(Err(diagnostic)) => {
                        warn!(reviewer = %slot.id, label = %slot.label, error = %diagnostic, "Reviewer failed");
                        Review::sentinel(slot, &diagnostic)
                    }
                    None => Review::sentinel(slot, "reviewer task did not complete"),
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for ReviewFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewFanout")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
