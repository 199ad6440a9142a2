//! Response Normalizer. Recovers an `EvaluationResult` from free-form model output.
//!
//! Model output is untrusted. It may be wrapped in prose or code fences, omit
//! fields, or not be JSON at all. Parsing never fails outward: anything that
//! cannot be recovered degrades to `EvaluationResult::unavailable()`.
//!
//! Candidates are tried in order and the first that parses and validates wins:
//! 1. the whole output
//! 2. each top-level balanced `{...}` span, string-aware so braces inside
//!    feedback text do not end a span early
//! 3. the greedy span from the first `{` to the last `}`
//!
//! Validation checks that `score` and `sections` are present (not truthy, so a
//! genuine overall score of 0 is accepted) and that the overall score is
//! numeric. Scores and feedback are passed through as the model declared them;
//! nothing is clamped or re-scored.

use serde_json::{Map, Value};

use crate::models::evaluation::{AnalysisOutcome, EvaluationResult, ScoreSection, Sections};

pub fn parse(raw_output: &str) -> EvaluationResult {
    candidates(raw_output)
        .into_iter()
        .find_map(|candidate| {
            serde_json::from_str::<Value>(candidate)
                .ok()
                .and_then(|value| validate(&value))
        })
        .unwrap_or_else(EvaluationResult::unavailable)
}

fn candidates(raw_output: &str) -> Vec<&str> {
    let mut candidates = vec![raw_output.trim()];
    candidates.extend(balanced_spans(raw_output));
    candidates.extend(greedy_span(raw_output));
    candidates
}

/// Every top-level `{...}` span, in order of appearance.
fn balanced_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if depth == 0 {
            if c == '{' {
                depth = 1;
                start = i;
                in_string = false;
                escaped = false;
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    spans
}

fn greedy_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn validate(value: &Value) -> Option<EvaluationResult> {
    let object = value.as_object()?;
    let score = object.get("score").and_then(read_score)?;
    let sections = object.get("sections")?.as_object()?;

    Some(EvaluationResult {
        score: Some(score),
        sections: Sections {
            grammar_writing: read_section(sections, "grammarWriting"),
            formatting: read_section(sections, "formatting"),
            keyword_alignment: read_section(sections, "keywordAlignment"),
            experience_relevance: read_section(sections, "experienceRelevance"),
            skills_relevance: read_section(sections, "skillsRelevance"),
        },
        outcome: AnalysisOutcome::Analyzed,
    })
}

/// A missing or non-object section is filled with the sentinel section so the
/// five keys are always present.
fn read_section(sections: &Map<String, Value>, key: &str) -> ScoreSection {
    let Some(section) = sections.get(key).and_then(Value::as_object) else {
        return ScoreSection::unavailable();
    };
    ScoreSection {
        score: section.get("score").and_then(read_score),
        feedback: section
            .get("feedback")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

/// Integers pass through; floats and numeric strings are rounded. Anything
/// else is "could not be determined".
fn read_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}
