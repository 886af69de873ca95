use shared::RejectionReason;

use super::extract::{
    as_bool, as_confidence, as_text, find_field, first_json_object, key_value, parse_bool_word,
    parse_confidence_word, strip_code_fences,
};
use super::{FALLBACK_CONFIDENCE, ParseOutcome};

const WASTE_FLAG_KEYS: &[&str] = &["is_waste_item", "is_waste", "waste_item", "is_item"];
const NAME_KEYS: &[&str] = &["item_name", "item", "object_name", "object", "name"];
const CONFIDENCE_KEYS: &[&str] = &["confidence", "score", "probability"];

/// Longest bare answer still treated as just the item's name.
const MAX_BARE_NAME_WORDS: usize = 6;

const PERSON_WORDS: &[&str] = &[
    "person", "people", "man", "woman", "men", "women", "boy", "girl", "child", "children", "kid",
    "baby", "face", "selfie", "human", "portrait",
];
const ANIMAL_WORDS: &[&str] = &[
    "animal", "dog", "cat", "bird", "pet", "puppy", "kitten", "horse", "cow",
];
const LANDSCAPE_WORDS: &[&str] = &[
    "landscape", "scenery", "sky", "mountain", "mountains", "beach", "ocean", "sea", "forest",
    "field", "sunset", "street", "building", "room", "park", "garden",
];
const UNCLEAR_WORDS: &[&str] = &[
    "unclear", "unknown", "blurry", "blank", "nothing", "none", "dark", "empty", "unidentifiable",
    "no object", "not sure", "unrecognizable",
];

#[derive(Debug, Clone, PartialEq)]
pub struct VisionVerdict {
    pub is_waste_item: bool,
    pub item_name: String,
    pub confidence: f64,
}

/// Classify an item name that obviously is not a disposable object.
///
/// Looks at the whole name and at its last word, so "dog food can" stays an
/// item while "golden retriever dog" is an animal.
pub fn non_waste_kind(item_name: &str) -> Option<RejectionReason> {
    let name = item_name.trim().to_lowercase();
    let name = name.trim_matches(|c: char| !c.is_alphanumeric() && c != ' ');
    if name.is_empty() {
        return Some(RejectionReason::Unclear);
    }
    let head = name.split_whitespace().last().unwrap_or(name);
    let hit = |words: &[&str]| words.iter().any(|w| *w == name || *w == head);

    if hit(UNCLEAR_WORDS) {
        Some(RejectionReason::Unclear)
    } else if hit(PERSON_WORDS) {
        Some(RejectionReason::Person)
    } else if hit(ANIMAL_WORDS) {
        Some(RejectionReason::Animal)
    } else if hit(LANDSCAPE_WORDS) {
        Some(RejectionReason::Landscape)
    } else {
        None
    }
}

pub fn parse_vision(raw: &str) -> ParseOutcome<VisionVerdict> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return ParseOutcome::failed("empty vision response");
    }

    if let Some(map) = first_json_object(&text) {
        let flag = find_field(&map, WASTE_FLAG_KEYS).and_then(as_bool);
        let name = find_field(&map, NAME_KEYS).and_then(as_text);
        let confidence = find_field(&map, CONFIDENCE_KEYS).and_then(as_confidence);

        match (flag, name, confidence) {
            (Some(is_waste_item), Some(item_name), Some(confidence)) => {
                return ParseOutcome::Parsed(VisionVerdict {
                    is_waste_item,
                    item_name,
                    confidence,
                });
            }
            (flag, Some(item_name), confidence) => {
                let is_waste_item = flag.unwrap_or_else(|| non_waste_kind(&item_name).is_none());
                let note = if flag.is_none() {
                    "waste flag inferred from item name"
                } else {
                    "confidence missing"
                };
                return ParseOutcome::degraded(
                    VisionVerdict {
                        is_waste_item,
                        item_name,
                        confidence: confidence.unwrap_or(FALLBACK_CONFIDENCE),
                    },
                    note,
                );
            }
            (Some(false), None, confidence) => {
                return ParseOutcome::degraded(
                    VisionVerdict {
                        is_waste_item: false,
                        item_name: "unknown".to_string(),
                        confidence: confidence.unwrap_or(FALLBACK_CONFIDENCE),
                    },
                    "item name missing",
                );
            }
            _ => {}
        }
    }

    heuristic(&text)
}

fn heuristic(text: &str) -> ParseOutcome<VisionVerdict> {
    let name = key_value(text, &["item_name", "item name", "item", "object", "name"])
        .or_else(|| bare_answer(text));
    let Some(item_name) = name else {
        return ParseOutcome::failed("no item name found in vision response");
    };

    let flag = key_value(text, &["is_waste_item", "is waste item", "is_waste", "waste item"])
        .and_then(|v| parse_bool_word(&v))
        .or_else(|| waste_phrase(text));
    let is_waste_item = flag.unwrap_or_else(|| non_waste_kind(&item_name).is_none());
    let confidence = key_value(text, CONFIDENCE_KEYS)
        .and_then(|v| parse_confidence_word(&v))
        .unwrap_or(FALLBACK_CONFIDENCE);

    ParseOutcome::degraded(
        VisionVerdict {
            is_waste_item,
            item_name,
            confidence,
        },
        "no structured payload in vision response",
    )
}

/// A short single-line answer such as "Plastic bottle." is the name itself.
fn bare_answer(text: &str) -> Option<String> {
    let line = text.trim();
    if line.contains('\n') || line.contains('{') {
        return None;
    }
    let cleaned = line
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string();
    let words = cleaned.split_whitespace().count();
    (words > 0 && words <= MAX_BARE_NAME_WORDS).then_some(cleaned)
}

fn waste_phrase(text: &str) -> Option<bool> {
    let lower = text.to_lowercase();
    const NEGATIVE: &[&str] = &[
        "not a waste item",
        "not waste",
        "no waste item",
        "not a disposable",
        "not an item",
    ];
    const POSITIVE: &[&str] = &["is a waste item", "is a disposable item", "can be disposed"];
    if NEGATIVE.iter().any(|p| lower.contains(p)) {
        Some(false)
    } else if POSITIVE.iter().any(|p| lower.contains(p)) {
        Some(true)
    } else {
        None
    }
}
