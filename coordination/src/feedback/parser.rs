//! Reviewer response parsing
//!
//! Best-effort extraction of a score, a verdict and named sections from
//! free-form reviewer text. Extraction never fails: unmatched or malformed
//! input degrades to score 0.0, [`Recommendation::Unknown`] and empty
//! sections.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::council::ReviewerSlot;
use crate::review::{Recommendation, Review, ReviewSection};

/// Default upper bound of the review score scale
pub const DEFAULT_MAX_SCORE: f64 = 5.0;

/// Score label patterns, tried in priority order.
static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Overall Score: 4.2 / 5
        r"(?i)overall\s+score\**\s*:\s*\**\s*(\d+(?:\.\d+)?)\s*\**\s*/\s*\d+(?:\.\d+)?",
        // Overall Score: 4.2
        r"(?i)overall\s+score\**\s*:\s*\**\s*(\d+(?:\.\d+)?)",
        // Score: 4/5
        r"(?i)score\**\s*:\s*\**\s*(\d+(?:\.\d+)?)\s*\**\s*/\s*\d+(?:\.\d+)?",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RECOMMENDATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)recommendation\**\s*:\s*\**\s*(accept|revise)").unwrap()
});

static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#{1,6}").unwrap());

/// Bold label opening a line: `**Label:**` or `**Label**:`.
static BOLD_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*[^*\n]+?(?::\*\*|\*\*\s*:)").unwrap());

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").unwrap());

/// Extraction strategy for reviewer output.
///
/// Implementations must be deterministic and must never panic or error on
/// arbitrary input.
pub trait ResponseParser: Send + Sync {
    /// Score clamped to `[0, max_score]`; 0.0 when absent.
    fn extract_score(&self, text: &str) -> f64;

    /// ACCEPT, REVISE or UNKNOWN. Never ERROR.
    fn extract_recommendation(&self, text: &str) -> Recommendation;

    /// Trimmed body of the section under `header`; empty when absent.
    fn extract_section(&self, text: &str, header: &str) -> String;

    /// Wrap raw reviewer text into a [`Review`] for `slot`, extracting the
    /// improvement sections its category reads.
    fn parse_review(&self, slot: &ReviewerSlot, text: String) -> Review {
        let sections = slot
            .category
            .section_headers
            .iter()
            .map(|header| ReviewSection {
                header: header.clone(),
                body: self.extract_section(&text, header),
            })
            .collect();

        Review {
            reviewer: slot.id,
            reviewer_label: slot.label.clone(),
            score: self.extract_score(&text),
            recommendation: self.extract_recommendation(&text),
            sections,
            raw_text: text,
        }
    }
}

/// Clamp a parsed score into `[0, max_score]`, rejecting non-finite values.
pub fn clamp_score(value: f64, max_score: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, max_score))
}

/// Regex extraction over the markdown review template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkdownResponseParser {
    max_score: f64,
}

impl MarkdownResponseParser {
    pub fn new(max_score: f64) -> Self {
        Self { max_score }
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }
}

impl Default for MarkdownResponseParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SCORE)
    }
}

impl ResponseParser for MarkdownResponseParser {
    fn extract_score(&self, text: &str) -> f64 {
        for pattern in SCORE_PATTERNS.iter() {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            let parsed = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .and_then(|v| clamp_score(v, self.max_score));
            if let Some(score) = parsed {
                return score;
            }
        }
        0.0
    }

    /// The leftmost labelled verdict wins. A later `Recommendation: ACCEPT`
    /// does not override an earlier `Recommendation: REVISE`, so a draft
    /// verdict quoted ahead of the final one decides the review.
    fn extract_recommendation(&self, text: &str) -> Recommendation {
        match RECOMMENDATION_PATTERN
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_uppercase())
            .as_deref()
        {
            Some("ACCEPT") => Recommendation::Accept,
            Some("REVISE") => Recommendation::Revise,
            _ => Recommendation::Unknown,
        }
    }

    fn extract_section(&self, text: &str, header: &str) -> String {
        let header = header.trim();
        if header.is_empty() {
            return String::new();
        }

        let mut lines = text.lines();
        let mut body: Vec<&str> = Vec::new();
        let mut found = false;

        for line in lines.by_ref() {
            if let Some(rest) = match_header_line(line, header) {
                found = true;
                if !rest.is_empty() {
                    body.push(rest);
                }
                break;
            }
        }

        if !found {
            return String::new();
        }

        for line in lines {
            if is_header_line(line) {
                break;
            }
            body.push(line);
        }

        body.join("\n").trim().to_string()
    }
}

/// A markdown heading or a leading bold label ends the current section.
fn is_header_line(line: &str) -> bool {
    HEADING_LINE.is_match(line) || BOLD_LABEL.is_match(line)
}

/// If `line` is a header line for `header`, return the trailing text after
/// the header (and its optional colon).
fn match_header_line<'a>(line: &'a str, header: &str) -> Option<&'a str> {
    let stripped = line
        .trim_start()
        .trim_start_matches('#')
        .trim_start()
        .trim_start_matches('*')
        .trim_start();

    let prefix = stripped.get(..header.len())?;
    if !prefix.eq_ignore_ascii_case(header) {
        return None;
    }

    let rest = stripped[header.len()..].trim_start_matches('*').trim_start();
    let rest = match rest.strip_prefix(':') {
        Some(after) => after,
        None if rest.is_empty() => rest,
        // "Areas for Improvement" must not match "Areas for Improvements list"
        None => return None,
    };
    Some(rest.trim_start_matches('*').trim())
}

/// Structured-output extraction: reads a JSON object with `score`,
/// `recommendation` and `sections`, falling back to markdown extraction for
/// any field the JSON does not carry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JsonResponseParser {
    fallback: MarkdownResponseParser,
}

impl JsonResponseParser {
    pub fn new(max_score: f64) -> Self {
        Self {
            fallback: MarkdownResponseParser::new(max_score),
        }
    }

    fn document(text: &str) -> Option<Value> {
        let candidate = match JSON_FENCE.captures(text).and_then(|c| c.get(1)) {
            Some(m) => m.as_str(),
            None => {
                let start = text.find('{')?;
                let end = text.rfind('}')?;
                text.get(start..=end)?
            }
        };
        serde_json::from_str::<Value>(candidate)
            .ok()
            .filter(Value::is_object)
    }
}

impl ResponseParser for JsonResponseParser {
    fn extract_score(&self, text: &str) -> f64 {
        let from_json = Self::document(text).and_then(|doc| match doc.get("score")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        });

        match from_json.and_then(|v| clamp_score(v, self.fallback.max_score())) {
            Some(score) => score,
            None => self.fallback.extract_score(text),
        }
    }

    fn extract_recommendation(&self, text: &str) -> Recommendation {
        let from_json = Self::document(text).and_then(|doc| {
            let value = doc.get("recommendation")?.as_str()?.trim().to_ascii_uppercase();
            match value.as_str() {
                "ACCEPT" => Some(Recommendation::Accept),
                "REVISE" => Some(Recommendation::Revise),
                _ => None,
            }
        });
        from_json.unwrap_or_else(|| self.fallback.extract_recommendation(text))
    }

    fn extract_section(&self, text: &str, header: &str) -> String {
        let from_json = Self::document(text).and_then(|doc| {
            let sections = doc.get("sections")?.as_object()?;
            sections
                .iter()
                .find(|(key, _)| key.trim().eq_ignore_ascii_case(header.trim()))
                .and_then(|(_, v)| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Array(items) => Some(
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(|s| format!("- {}", s.trim()))
                            .collect::<Vec<_>>()
                            .join("\n"),
                    ),
                    _ => None,
                })
        });
        match from_json {
            Some(body) if !body.is_empty() => body,
            _ => self.fallback.extract_section(text, header),
        }
    }
}
