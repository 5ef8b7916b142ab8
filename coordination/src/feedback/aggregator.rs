//! Council feedback aggregation
//!
//! Folds one round's reviews into a single [`RevisionDirective`]: a
//! critical-first priority list plus one feedback block per reviewer
//! category. Aggregation is a pure function of the round.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::council::{FeedbackCategory, ReviewerSlot};
use crate::review::{Review, Round};
use crate::workflow::policy::AcceptancePolicy;

/// Placeholder for a category without feedback
pub const NO_FEEDBACK: &str = "None";

/// Urgency of a priority item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    /// The category's reviewer scored below the acceptance threshold.
    Critical,
    /// Passing category that still left improvement notes.
    Note,
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::Note => write!(f, "NOTE"),
        }
    }
}

/// One line of the revision priority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityItem {
    pub level: PriorityLevel,
    pub category: String,
    pub action: String,
}

impl std::fmt::Display for PriorityItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.level, self.action)
    }
}

/// Improvement notes filed under one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFeedback {
    pub category: String,
    /// Labels of the reviewers filing under this category.
    pub reviewers: Vec<String>,
    /// Lowest score among those reviewers.
    pub score: f64,
    pub critical: bool,
    /// Priority directive used when the block is critical.
    pub critical_action: String,
    pub notes: Vec<String>,
}

impl CategoryFeedback {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes joined by blank lines, or `"None"`.
    pub fn text(&self) -> String {
        if self.notes.is_empty() {
            NO_FEEDBACK.to_string()
        } else {
            self.notes.join("\n\n")
        }
    }
}

/// Aggregated feedback from one round, used to build the next prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionDirective {
    /// Iteration of the round this directive was derived from.
    pub source_iteration: u32,
    pub scores: Vec<f64>,
    pub priorities: Vec<PriorityItem>,
    pub feedback: Vec<CategoryFeedback>,
    pub threshold: f64,
    pub quorum: usize,
}

impl RevisionDirective {
    pub fn critical_count(&self) -> usize {
        self.priorities
            .iter()
            .filter(|p| p.level == PriorityLevel::Critical)
            .count()
    }

    pub fn feedback_for(&self, category: &str) -> Option<&CategoryFeedback> {
        self.feedback.iter().find(|f| f.category == category)
    }
}

/// Builds revision directives against a fixed acceptance threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackAggregator {
    threshold: f64,
    quorum: usize,
}

impl FeedbackAggregator {
    pub fn new(policy: &AcceptancePolicy) -> Self {
        Self {
            threshold: policy.threshold,
            quorum: policy.quorum,
        }
    }

    /// Aggregate `round` for a panel whose slots are `panel`.
    pub fn aggregate(&self, round: &Round, panel: &[ReviewerSlot]) -> RevisionDirective {
        let mut feedback: Vec<CategoryFeedback> = Vec::new();

        for review in &round.reviews {
            let category = category_for(review, panel);
            let improvements = improvement_notes(review, &category);
            let critical = review.score < self.threshold;

            let idx = match feedback.iter().position(|f| f.category == category.name) {
                Some(idx) => idx,
                None => {
                    feedback.push(CategoryFeedback {
                        category: category.name.clone(),
                        reviewers: Vec::new(),
                        score: review.score,
                        critical: false,
                        critical_action: category.critical_action.clone(),
                        notes: Vec::new(),
                    });
                    feedback.len() - 1
                }
            };

            let entry = &mut feedback[idx];
            entry.reviewers.push(review.reviewer_label.clone());
            entry.score = entry.score.min(review.score);
            entry.critical |= critical;
            if let Some(notes) = improvements {
                entry.notes.push(notes.to_string());
            }
        }

        let critical = feedback.iter().filter(|f| f.critical).map(|f| PriorityItem {
            level: PriorityLevel::Critical,
            category: f.category.clone(),
            action: f.critical_action.clone(),
        });
        let notes = feedback
            .iter()
            .filter(|f| !f.critical && !f.is_empty())
            .map(|f| PriorityItem {
                level: PriorityLevel::Note,
                category: f.category.clone(),
                action: format!("Refine {} per reviewer notes", f.category.to_lowercase()),
            });
        let priorities = critical.chain(notes).collect();

        RevisionDirective {
            source_iteration: round.iteration,
            scores: round.scores.clone(),
            priorities,
            feedback,
            threshold: self.threshold,
            quorum: self.quorum,
        }
    }
}

fn category_for(review: &Review, panel: &[ReviewerSlot]) -> FeedbackCategory {
    panel
        .iter()
        .find(|slot| slot.id == review.reviewer)
        .map(|slot| slot.category.clone())
        .unwrap_or_else(|| {
            FeedbackCategory::new(
                &review.reviewer_label,
                &format!("Address {} feedback", review.reviewer_label),
            )
        })
}

/// First non-empty improvement section the category reads.
fn improvement_notes<'a>(review: &'a Review, category: &FeedbackCategory) -> Option<&'a str> {
    category
        .section_headers
        .iter()
        .find_map(|header| review.section(header))
}

/// Render the producer prompt for the next round.
///
/// Every priority item and every category block appears; empty blocks read
/// `None`.
pub fn build_revision_prompt(
    query: &str,
    prior_artifact: &str,
    directive: &RevisionDirective,
) -> String {
    let mut prompt = String::new();

    let scores = directive
        .scores
        .iter()
        .map(|s| format!("{:.1}", s))
        .collect::<Vec<_>>()
        .join(", ");

    let _ = writeln!(
        prompt,
        "REVISION REQUEST - Your report has been reviewed by the council and needs improvement."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Original Query: {}", query);
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Council Review Scores (round {}): [{}]",
        directive.source_iteration, scores
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "PREVIOUS REPORT:");
    let _ = writeln!(prompt, "{}", prior_artifact.trim());
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "TOP PRIORITIES FOR REVISION:");
    if directive.priorities.is_empty() {
        let _ = writeln!(prompt, "- {}", NO_FEEDBACK);
    }
    for item in &directive.priorities {
        let _ = writeln!(prompt, "- {}", item);
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "DETAILED FEEDBACK FROM COUNCIL:");
    for block in &directive.feedback {
        let _ = writeln!(prompt);
        let _ = writeln!(
            prompt,
            "{} FEEDBACK ({}):",
            block.category.to_uppercase(),
            block.reviewers.join(", ")
        );
        let _ = writeln!(prompt, "{}", block.text());
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "INSTRUCTIONS FOR REVISION:");
    let _ = writeln!(prompt, "1. Address ALL critical priority items listed above");
    let _ = writeln!(prompt, "2. Gather additional sources where coverage is thin");
    let _ = writeln!(
        prompt,
        "3. Prefer authoritative sources (.edu, .gov, peer-reviewed)"
    );
    let _ = writeln!(prompt, "4. Improve clarity, organization and structure as noted");
    let _ = writeln!(
        prompt,
        "5. Keep the strengths of the previous report while fixing its weaknesses"
    );
    let _ = writeln!(prompt);
    let _ = write!(
        prompt,
        "Your revised report will be reviewed again by the same council. \
         Aim for a score of {:.1} or higher from at least {} reviewers.",
        directive.threshold, directive.quorum
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::ReviewerId;
    use crate::review::{Recommendation, ReviewSection};
    use chrono::Utc;

    fn review(id: usize, label: &str, score: f64, header: &str, body: &str) -> Review {
        Review {
            reviewer: ReviewerId(id),
            reviewer_label: label.to_string(),
            raw_text: String::new(),
            score,
            recommendation: Recommendation::Revise,
            sections: vec![ReviewSection {
                header: header.to_string(),
                body: body.to_string(),
            }],
        }
    }

    fn round(scores: [f64; 3]) -> Round {
        let panel = ReviewerSlot::default_panel();
        let reviews = vec![
            review(0, &panel[0].label, scores[0], "Areas for Improvement", "- cite studies"),
            review(1, &panel[1].label, scores[1], "Coverage Gaps Identified", "- history"),
            review(2, &panel[2].label, scores[2], "Areas for Improvement", ""),
        ];
        Round::new(1, "report v1".to_string(), reviews, Utc::now())
    }

    fn aggregator() -> FeedbackAggregator {
        FeedbackAggregator::new(&AcceptancePolicy::default())
    }

    #[test]
    fn test_critical_items_for_low_scores() {
        let panel = ReviewerSlot::default_panel();
        let directive = aggregator().aggregate(&round([2.0, 2.0, 1.0]), &panel);

        assert_eq!(directive.critical_count(), 3);
        let lines: Vec<String> = directive.priorities.iter().map(|p| p.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "CRITICAL: Address methodology issues",
                "CRITICAL: Expand topic coverage",
                "CRITICAL: Improve clarity and organization",
            ]
        );
    }

    #[test]
    fn test_critical_before_notes() {
        let panel = ReviewerSlot::default_panel();
        // Methodology passes with notes, comprehensiveness fails
        let directive = aggregator().aggregate(&round([4.0, 2.5, 3.0]), &panel);

        assert_eq!(directive.priorities.len(), 2);
        assert_eq!(directive.priorities[0].level, PriorityLevel::Critical);
        assert_eq!(directive.priorities[0].category, "Comprehensiveness");
        assert_eq!(directive.priorities[1].level, PriorityLevel::Note);
        assert_eq!(directive.priorities[1].category, "Methodology");
    }

    #[test]
    fn test_threshold_boundary_is_not_critical() {
        let panel = ReviewerSlot::default_panel();
        let directive = aggregator().aggregate(&round([3.0, 3.0, 3.0]), &panel);
        assert_eq!(directive.critical_count(), 0);
    }

    #[test]
    fn test_feedback_blocks_use_fallback_sections() {
        let panel = ReviewerSlot::default_panel();
        let directive = aggregator().aggregate(&round([2.0, 2.0, 1.0]), &panel);

        assert_eq!(directive.feedback.len(), 3);
        assert_eq!(
            directive.feedback_for("Methodology").unwrap().text(),
            "- cite studies"
        );
        assert_eq!(
            directive.feedback_for("Comprehensiveness").unwrap().text(),
            "- history"
        );
        assert_eq!(directive.feedback_for("Clarity").unwrap().text(), "None");
    }

    #[test]
    fn test_shared_category_merges_blocks() {
        let shared = FeedbackCategory::new("Accuracy", "Fix factual errors");
        let panel = vec![
            ReviewerSlot::new(0, "A", shared.clone()),
            ReviewerSlot::new(1, "B", shared),
        ];
        let reviews = vec![
            review(0, "A", 4.0, "Areas for Improvement", "- one"),
            review(1, "B", 1.0, "Areas for Improvement", "- two"),
        ];
        let r = Round::new(1, "x".to_string(), reviews, Utc::now());
        let directive = aggregator().aggregate(&r, &panel);

        assert_eq!(directive.feedback.len(), 1);
        let block = &directive.feedback[0];
        assert!(block.critical);
        assert_eq!(block.score, 1.0);
        assert_eq!(block.reviewers, vec!["A", "B"]);
        assert_eq!(block.text(), "- one\n\n- two");
        assert_eq!(directive.priorities.len(), 1);
        assert_eq!(directive.priorities[0].action, "Fix factual errors");
    }

    #[test]
    fn test_sentinel_review_is_critical_without_notes() {
        let panel = ReviewerSlot::default_panel();
        let mut r = round([4.0, 4.0, 4.0]);
        r.reviews[2] = Review::sentinel(&panel[2], "timeout");
        let directive = aggregator().aggregate(&r, &panel);

        assert_eq!(directive.critical_count(), 1);
        assert_eq!(directive.priorities[0].category, "Clarity");
        assert_eq!(directive.feedback_for("Clarity").unwrap().text(), "None");
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let panel = ReviewerSlot::default_panel();
        let r = round([2.0, 3.5, 1.0]);
        let first = aggregator().aggregate(&r, &panel);
        let second = aggregator().aggregate(&r, &panel);
        assert_eq!(first, second);
    }

    #[test]
    fn test_revision_prompt_contains_every_item() {
        let panel = ReviewerSlot::default_panel();
        let directive = aggregator().aggregate(&round([2.0, 2.0, 1.0]), &panel);
        let prompt = build_revision_prompt("quantum computing", "report v1", &directive);

        assert!(prompt.contains("Original Query: quantum computing"));
        assert!(prompt.contains("report v1"));
        assert!(prompt.contains("[2.0, 2.0, 1.0]"));
        for item in &directive.priorities {
            assert!(prompt.contains(&item.to_string()));
        }
        assert!(prompt.contains("- cite studies"));
        assert!(prompt.contains("- history"));
        assert!(prompt.contains("CLARITY FEEDBACK (Dr. Emily Thompson (Clarity)):\nNone"));
        assert!(prompt.contains("at least 2 reviewers"));
    }
}
