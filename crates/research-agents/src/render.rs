//! Result rendering for the CLI: markdown report, compact text, JSON.

use std::fmt::Write;

use coordination::{Round, WorkflowConfig, WorkflowResult, WorkflowStatus};

fn join_scores(scores: &[f64]) -> String {
    scores
        .iter()
        .map(|s| format!("{:.1}", s))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_round(out: &mut String, round: &Round, config: &WorkflowConfig) {
    let _ = writeln!(out, "## Council Review Results (Iteration {})", round.iteration);
    let _ = writeln!(out);
    for review in &round.reviews {
        let indicator = if review.score >= config.acceptance_threshold {
            "🟢"
        } else {
            "🔴"
        };
        let _ = writeln!(out, "### {} {}", indicator, review.reviewer_label);
        let _ = writeln!(
            out,
            "**Score**: {:.1}/{:.1} | **Recommendation**: {}",
            review.score, config.max_score, review.recommendation
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", review.raw_text.trim());
        let _ = writeln!(out);
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
    }
}

/// Full markdown report: final artifact, every round's reviews, decision.
pub fn to_markdown(result: &WorkflowResult, config: &WorkflowConfig) -> String {
    let policy = config.policy();
    let mut out = String::new();

    let _ = writeln!(out, "# Research Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Query**: {}", result.query);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.artifact.trim());
    let _ = writeln!(out);

    for round in &result.rounds {
        render_round(&mut out, round, config);
    }

    let passing = result.passing_count(&policy);
    let reviewers = result.final_scores.len();
    match result.status {
        WorkflowStatus::Accepted => {
            let _ = writeln!(out, "## ✅ Research Accepted");
            let _ = writeln!(out);
            let _ = writeln!(out, "**Final Scores**: {}", join_scores(&result.final_scores));
            let _ = writeln!(out, "**Passing Reviews**: {}/{}", passing, reviewers);
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "The research met the quality standard ({} reviewers scored {:.1} or higher).",
                passing, policy.threshold
            );
        }
        WorkflowStatus::Exhausted => {
            let _ = writeln!(out, "## ⏭️ Maximum Iterations Reached");
            let _ = writeln!(out);
            let _ = writeln!(out, "**Final Scores**: {}", join_scores(&result.final_scores));
            let _ = writeln!(out, "**Passing Reviews**: {}/{}", passing, reviewers);
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "The research went through {} iterations without reaching the quorum of {}. \
                 This is the final version.",
                result.iterations, policy.quorum
            );
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "**Total Iterations**: {}", result.iterations);

    out
}

/// Compact summary followed by the final artifact.
pub fn to_text(result: &WorkflowResult, config: &WorkflowConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.summary_line());
    for round in &result.rounds {
        let _ = writeln!(
            out,
            "  round {}: [{}] passing {}/{} ({} ms)",
            round.iteration,
            join_scores(&round.scores),
            config.policy().passing_count(&round.scores),
            round.scores.len(),
            round.duration_ms
        );
        for review in round.reviews.iter().filter(|r| r.is_sentinel()) {
            let _ = writeln!(out, "    {} failed: {}", review.reviewer_label, review.raw_text);
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.artifact.trim());
    out
}

/// Serde form of the result.
pub fn to_json(result: &WorkflowResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coordination::{Recommendation, Review, ReviewerId, ReviewerSlot};

    fn review(id: usize, score: f64, recommendation: Recommendation) -> Review {
        Review {
            reviewer: ReviewerId(id),
            reviewer_label: format!("Reviewer {}", id),
            raw_text: format!("### Overall Score: {} / 5", score),
            score,
            recommendation,
            sections: Vec::new(),
        }
    }

    fn result(status: WorkflowStatus, scores: [f64; 3]) -> WorkflowResult {
        let reviews = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| review(i, s, Recommendation::Revise))
            .collect();
        let round = Round::new(1, "# Findings\nbody".to_string(), reviews, Utc::now());
        WorkflowResult {
            run_id: "run-1".to_string(),
            query: "Sleep and memory".to_string(),
            status,
            artifact: "# Findings\nbody".to_string(),
            final_scores: round.scores.clone(),
            rounds: vec![round],
            iterations: 1,
            transitions: Vec::new(),
        }
    }

    #[test]
    fn test_markdown_accepted() {
        let md = to_markdown(
            &result(WorkflowStatus::Accepted, [4.0, 2.0, 3.5]),
            &WorkflowConfig::default(),
        );
        assert!(md.contains("**Query**: Sleep and memory"));
        assert!(md.contains("### 🟢 Reviewer 0"));
        assert!(md.contains("### 🔴 Reviewer 1"));
        assert!(md.contains("**Score**: 3.5/5.0 | **Recommendation**: REVISE"));
        assert!(md.contains("## ✅ Research Accepted"));
        assert!(md.contains("**Final Scores**: 4.0, 2.0, 3.5"));
        assert!(md.contains("**Passing Reviews**: 2/3"));
    }

    #[test]
    fn test_markdown_exhausted() {
        let md = to_markdown(
            &result(WorkflowStatus::Exhausted, [2.0, 3.0, 1.0]),
            &WorkflowConfig::default(),
        );
        assert!(md.contains("## ⏭️ Maximum Iterations Reached"));
        assert!(md.contains("**Passing Reviews**: 1/3"));
    }

    #[test]
    fn test_text_lists_failed_reviewers() {
        let mut r = result(WorkflowStatus::Exhausted, [2.0, 3.0, 1.0]);
        let slot = ReviewerSlot::default_panel().remove(2);
        r.rounds[0].reviews[2] = Review::sentinel(&slot, "reviewer timed out after 5000ms");
        let text = to_text(&r, &WorkflowConfig::default());
        assert!(text.starts_with("[EXHAUSTED] 1 round(s)"));
        assert!(text.contains("round 1: [2.0, 3.0, 1.0] passing 1/3"));
        assert!(text.contains("Dr. Emily Thompson (Clarity) failed: reviewer timed out"));
        assert!(text.trim_end().ends_with("body"));
    }

    #[test]
    fn test_json_round_trips_status() {
        let json = to_json(&result(WorkflowStatus::Accepted, [4.0, 4.0, 4.0])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ACCEPTED");
        assert_eq!(value["rounds"][0]["reviews"].as_array().map(Vec::len), Some(3));
    }
}
