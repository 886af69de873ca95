use regex::Regex;
use shared::WasteCategory;

use super::extract::{
    as_confidence, as_list, as_text, find_field, first_json_object, key_value, list_lines,
    parse_confidence_word, partial_list, strip_code_fences,
};
use super::{FALLBACK_CONFIDENCE, ParseOutcome};
use crate::categories;

const CATEGORY_KEYS: &[&str] = &[
    "category",
    "waste_category",
    "disposal_category",
    "disposal_method",
    "bin",
];
const CONFIDENCE_KEYS: &[&str] = &["confidence", "score", "probability"];
const STEP_KEYS: &[&str] = &["preparation_steps", "steps", "preparation", "instructions"];

/// Category as written by the model; validated against the registry by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningVerdict {
    pub category: String,
    pub confidence: f64,
    pub preparation_steps: Vec<String>,
}

pub fn parse_reasoning(raw: &str) -> ParseOutcome<ReasoningVerdict> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return ParseOutcome::failed("empty reasoning response");
    }

    if let Some(map) = first_json_object(&text) {
        if let Some(category) = find_field(&map, CATEGORY_KEYS).and_then(as_text) {
            let confidence = find_field(&map, CONFIDENCE_KEYS).and_then(as_confidence);
            let steps = find_field(&map, STEP_KEYS).map(as_list);

            let verdict = ReasoningVerdict {
                category,
                confidence: confidence.unwrap_or(FALLBACK_CONFIDENCE),
                preparation_steps: steps.clone().unwrap_or_default(),
            };
            return match (confidence, steps) {
                (Some(_), Some(_)) => ParseOutcome::Parsed(verdict),
                (None, _) => ParseOutcome::degraded(verdict, "confidence missing"),
                (_, None) => ParseOutcome::degraded(verdict, "preparation steps missing"),
            };
        }
    }

    heuristic(&text)
}

fn heuristic(text: &str) -> ParseOutcome<ReasoningVerdict> {
    let category = key_value(text, &["category", "waste category", "disposal category"])
        .or_else(|| mentioned_category(text).map(str::to_string));
    let Some(category) = category else {
        return ParseOutcome::failed("no category found in reasoning response");
    };

    let confidence = key_value(text, CONFIDENCE_KEYS)
        .and_then(|v| parse_confidence_word(&v))
        .unwrap_or(FALLBACK_CONFIDENCE);
    let mut preparation_steps = list_lines(text);
    if preparation_steps.is_empty() {
        preparation_steps = partial_list(text, STEP_KEYS);
    }

    ParseOutcome::degraded(
        ReasoningVerdict {
            category,
            confidence,
            preparation_steps,
        },
        "no structured payload in reasoning response",
    )
}

lazy_static::lazy_static! {
    static ref KEYWORD_PATTERNS: Vec<(Regex, WasteCategory)> = categories::keywords()
        .filter_map(|(keyword, category)| {
            let parts: Vec<String> = keyword.split('-').map(regex::escape).collect();
            Regex::new(&format!(r"\b{}\b", parts.join(r"[-_\s]?")))
                .ok()
                .map(|re| (re, category))
        })
        .collect();
}

/// Earliest category keyword in free text, skipping negated mentions such as
/// "non-recyclable" or "not compostable".
fn mentioned_category(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let mut best: Option<(usize, usize, WasteCategory)> = None;

    for (re, category) in KEYWORD_PATTERNS.iter() {
        let found = re.find_iter(&lower).find(|m| !is_negated(&lower[..m.start()]));
        if let Some(m) = found {
            // Earliest match wins; on a tie the longer spelling does.
            let candidate = (m.start(), usize::MAX - m.len(), *category);
            if best.is_none_or(|current| (candidate.0, candidate.1) < (current.0, current.1)) {
                best = Some(candidate);
            }
        }
    }

    best.map(|(_, _, category)| category.key())
}

fn is_negated(before: &str) -> bool {
    let before = before.trim_end_matches(['-', ' ']);
    before.ends_with("non") || before.ends_with("not") || before.ends_with("never")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json() {
        let raw = r#"{"category": "recyclable", "confidence": 0.89, "preparation_steps": ["Empty the bottle", "Rinse it", "Replace the cap"]}"#;
        assert_eq!(
            parse_reasoning(raw),
            ParseOutcome::Parsed(ReasoningVerdict {
                category: "recyclable".into(),
                confidence: 0.89,
                preparation_steps: vec![
                    "Empty the bottle".into(),
                    "Rinse it".into(),
                    "Replace the cap".into()
                ],
            })
        );
    }

    #[test]
    fn unknown_category_is_passed_through_for_validation() {
        let outcome = parse_reasoning(r#"{"category": "plasma", "confidence": 0.7, "steps": []}"#);
        assert_eq!(outcome.value().unwrap().category, "plasma");
    }

    #[test]
    fn missing_steps_degrade() {
        let outcome = parse_reasoning(r#"{"category": "hazardous", "confidence": 0.9}"#);
        assert!(outcome.is_degraded());
        assert!(outcome.value().unwrap().preparation_steps.is_empty());
    }

    #[test]
    fn falls_back_to_keywords_in_prose() {
        let raw = "This item should go in the compost bin.\n1. Remove the sticker\n2. Chop large pieces";
        let outcome = parse_reasoning(raw);
        assert!(outcome.is_degraded());
        let verdict = outcome.value().unwrap();
        assert_eq!(verdict.category, "compostable");
        assert_eq!(verdict.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(verdict.preparation_steps, vec!["Remove the sticker", "Chop large pieces"]);
    }

    #[test]
    fn keyword_search_skips_negations() {
        let outcome = parse_reasoning("It is non-recyclable, so it belongs in landfill.");
        assert_eq!(outcome.value().unwrap().category, "landfill");
        let outcome = parse_reasoning("Not recyclable. Put it with the trash.");
        assert_eq!(outcome.value().unwrap().category, "landfill");
    }

    #[test]
    fn keyword_search_handles_hyphenated_keys() {
        let outcome = parse_reasoning("Old phones are e waste and need special handling.");
        assert_eq!(outcome.value().unwrap().category, "e-waste");
        let outcome = parse_reasoning("Answer: E-Waste");
        assert_eq!(outcome.value().unwrap().category, "e-waste");
    }

    #[test]
    fn key_value_category_is_read() {
        let outcome = parse_reasoning("Category: textile\nConfidence: 75%");
        let verdict = outcome.value().unwrap();
        assert_eq!(verdict.category, "textile");
        assert_eq!(verdict.confidence, 0.75);
    }

    #[test]
    fn json_without_category_uses_keywords() {
        let outcome = parse_reasoning(r#"{"answer": "Recycle it"}"#);
        assert_eq!(outcome.value().unwrap().category, "recyclable");
    }

    #[test]
    fn cut_off_json_keeps_its_complete_fields() {
        let raw = r#"{"category": "recyclable", "confidence": 0.9, "preparation_steps": ["Rinse the bottle", "Remove the ca"#;
        let outcome = parse_reasoning(raw);
        assert!(outcome.is_degraded());
        let verdict = outcome.value().unwrap();
        assert_eq!(verdict.category, "recyclable");
        assert_eq!(verdict.confidence, 0.9);
        assert_eq!(verdict.preparation_steps, vec!["Rinse the bottle"]);
    }

    #[test]
    fn unrecognisable_response_fails() {
        assert!(matches!(
            parse_reasoning("I'm not sure what to do with this."),
            ParseOutcome::Failed { .. }
        ));
        assert!(matches!(parse_reasoning(""), ParseOutcome::Failed { .. }));
    }
}
