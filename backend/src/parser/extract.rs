//! Helpers for pulling values out of loosely structured model text.
use regex::Regex;
use serde_json::{Map, Value};

const MAX_LIST_ITEMS: usize = 8;

/// Drop markdown code fence lines, keeping whatever they wrapped.
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// The first complete JSON object embedded anywhere in `text`.
pub fn first_json_object(text: &str) -> Option<Map<String, Value>> {
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(Value::Object(map))) = stream.next() {
            return Some(map);
        }
    }
    None
}

/// Case-insensitive lookup over several accepted key spellings.
pub fn find_field<'a>(map: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| {
        map.iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    })
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().and_then(|n| match n {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }),
        Value::String(s) => parse_bool_word(s),
        _ => None,
    }
}

pub fn parse_bool_word(raw: &str) -> Option<bool> {
    match raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
        .as_str()
    {
        "true" | "yes" | "y" => Some(true),
        "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Confidence as a fraction in [0, 1].
///
/// Whole numbers above 1 and values written with `%` are percentages. Other
/// values are clamped, so 1.5 reads as 1.0.
pub fn as_confidence(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => normalize_confidence(n.as_f64()?, n.is_i64() || n.is_u64()),
        Value::String(s) => parse_confidence_word(s),
        _ => None,
    }
}

pub fn parse_confidence_word(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if let Some(percent) = trimmed.strip_suffix('%') {
        let number: f64 = percent.trim().parse().ok()?;
        return normalize_confidence(number / 100.0, false);
    }
    let number: f64 = trimmed.parse().ok()?;
    normalize_confidence(number, trimmed.parse::<i64>().is_ok())
}

fn normalize_confidence(number: f64, whole: bool) -> Option<f64> {
    if !number.is_finite() {
        return None;
    }
    let fraction = if whole && number > 1.0 {
        number / 100.0
    } else {
        number
    };
    Some(fraction.clamp(0.0, 1.0))
}

pub fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// A list of short strings from an array or from a delimited/numbered string.
pub fn as_list(value: &Value) -> Vec<String> {
    let items: Vec<String> = match value {
        Value::Array(rows) => rows.iter().filter_map(as_text).collect(),
        Value::String(s) => s.split(['\n', ';']).map(str::to_string).collect(),
        _ => Vec::new(),
    };
    items
        .iter()
        .map(|item| strip_list_marker(item))
        .filter(|item| !item.is_empty())
        .take(MAX_LIST_ITEMS)
        .collect()
}

/// Lines of `text` written as a numbered or bulleted list.
pub fn list_lines(text: &str) -> Vec<String> {
    lazy_static::lazy_static! {
        static ref LIST_LINE: Regex = Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+\S").unwrap();
    }
    text.lines()
        .filter(|line| LIST_LINE.is_match(line))
        .map(strip_list_marker)
        .filter(|item| !item.is_empty())
        .take(MAX_LIST_ITEMS)
        .collect()
}

fn strip_list_marker(item: &str) -> String {
    lazy_static::lazy_static! {
        static ref MARKER: Regex = Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s*").unwrap();
    }
    MARKER.replace(item.trim(), "").trim().to_string()
}

/// Value of a `key: value` (or `key = value`) pair for any of `names`.
///
/// Pairs may sit on their own line or inside a one-line dict such as
/// `{'item_name': 'cup', 'confidence': 0.9}`. A quoted value ends at its
/// closing quote, or at the end of the line when the text was cut off.
pub fn key_value(text: &str, names: &[&str]) -> Option<String> {
    let alternatives = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r#"(?i)(?:^|[\s{{,;*\-])[*"']*(?:{})[*"']*[ \t]*[:=][ \t]*(?:"([^"\n]*)|'([^'\n]*)|([^,}}\n]*))"#,
        alternatives
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures_iter(text).find_map(|caps| {
        let value = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
        let value = value
            .as_str()
            .trim_matches(|c: char| c.is_whitespace() || c == '*');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Complete quoted items of a `"key": [...]` array, even when the array
/// itself was cut off before its closing bracket.
pub fn partial_list(text: &str, names: &[&str]) -> Vec<String> {
    lazy_static::lazy_static! {
        static ref QUOTED: Regex = Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap();
    }
    let alternatives = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r#"(?i)["']?(?:{})["']?\s*:\s*\[([^\]]*)"#, alternatives);
    let Some(body) = Regex::new(&pattern)
        .ok()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
    else {
        return Vec::new();
    };
    QUOTED
        .captures_iter(body.as_str())
        .filter_map(|caps| caps.get(1))
        .map(|m| strip_list_marker(&m.as_str().replace("\\\"", "\"")))
        .filter(|item| !item.is_empty())
        .take(MAX_LIST_ITEMS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_object_inside_prose_and_fences() {
        let text = "Sure! Here is the answer:\n```json\n{\"a\": 1, \"b\": {\"c\": 2}}\n```\nHope it helps {not json}";
        let map = first_json_object(text).unwrap();
        assert_eq!(map["a"], json!(1));
        assert_eq!(map["b"]["c"], json!(2));
    }

    #[test]
    fn skips_malformed_candidates() {
        let text = "{broken, {\"ok\": true}";
        let map = first_json_object(text).unwrap();
        assert_eq!(map["ok"], json!(true));
        assert!(first_json_object("no braces here").is_none());
        assert!(first_json_object("{\"truncated\": ").is_none());
    }

    #[test]
    fn field_lookup_ignores_case_and_nulls() {
        let map = json!({"Item_Name": "cup", "confidence": null})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(find_field(&map, &["item_name"]), Some(&json!("cup")));
        assert_eq!(find_field(&map, &["confidence"]), None);
    }

    #[test]
    fn coerces_booleans() {
        assert_eq!(as_bool(&json!(true)), Some(true));
        assert_eq!(as_bool(&json!("False")), Some(false));
        assert_eq!(as_bool(&json!("yes")), Some(true));
        assert_eq!(as_bool(&json!(0)), Some(false));
        assert_eq!(as_bool(&json!("maybe")), None);
    }

    #[test]
    fn coerces_confidences_into_unit_range() {
        assert_eq!(as_confidence(&json!(0.95)), Some(0.95));
        assert_eq!(as_confidence(&json!("0.8")), Some(0.8));
        assert_eq!(as_confidence(&json!("87%")), Some(0.87));
        assert_eq!(as_confidence(&json!(92)), Some(0.92));
        assert_eq!(as_confidence(&json!(-0.2)), Some(0.0));
        assert_eq!(as_confidence(&json!(250)), Some(1.0));
        assert_eq!(as_confidence(&json!("high")), None);
    }

    #[test]
    fn fractional_overshoot_is_clamped_not_scaled() {
        assert_eq!(as_confidence(&json!(1.5)), Some(1.0));
        assert_eq!(as_confidence(&json!("1.5")), Some(1.0));
        assert_eq!(as_confidence(&json!(1)), Some(1.0));
        assert_eq!(as_confidence(&json!("75")), Some(0.75));
        assert_eq!(parse_confidence_word("150%"), Some(1.0));
    }

    #[test]
    fn lists_from_arrays_and_strings() {
        assert_eq!(
            as_list(&json!(["1. Rinse", "  2) Dry ", ""])),
            vec!["Rinse".to_string(), "Dry".to_string()]
        );
        assert_eq!(
            as_list(&json!("- Rinse\n- Flatten; Recycle")),
            vec!["Rinse", "Flatten", "Recycle"]
        );
    }

    #[test]
    fn extracts_list_lines() {
        let text = "Steps:\n1. Empty it\n2. Rinse it\nThat's all.\n- Recycle it";
        assert_eq!(list_lines(text), vec!["Empty it", "Rinse it", "Recycle it"]);
    }

    #[test]
    fn reads_key_value_lines() {
        let text = "Item name: glass jar\nIs waste item: yes\n\"confidence\": \"0.7\",";
        assert_eq!(
            key_value(text, &["item_name", "item name"]).as_deref(),
            Some("glass jar")
        );
        assert_eq!(
            key_value(text, &["is waste item"]).as_deref(),
            Some("yes")
        );
        assert_eq!(key_value(text, &["confidence"]).as_deref(), Some("0.7"));
        assert_eq!(key_value(text, &["category"]), None);
    }

    #[test]
    fn reads_pairs_inside_one_line_dicts() {
        let text = "{'is_waste_item': True, 'item_name': 'plastic bottle', 'confidence': 0.9}";
        assert_eq!(
            key_value(text, &["item_name"]).as_deref(),
            Some("plastic bottle")
        );
        assert_eq!(key_value(text, &["is_waste_item"]).as_deref(), Some("True"));
        assert_eq!(key_value(text, &["confidence"]).as_deref(), Some("0.9"));
        assert_eq!(key_value(text, &["name"]), None);
    }

    #[test]
    fn unquoted_values_keep_apostrophes() {
        assert_eq!(
            key_value("Item name: children's toy\nConfidence: 0.8", &["item name"]).as_deref(),
            Some("children's toy")
        );
        assert_eq!(
            key_value("**Category:** recyclable", &["category"]).as_deref(),
            Some("recyclable")
        );
    }

    #[test]
    fn unterminated_values_run_to_end_of_line() {
        let text = r#"{"message": "Recycling one can saves energy for"#;
        assert_eq!(
            key_value(text, &["message"]).as_deref(),
            Some("Recycling one can saves energy for")
        );
    }

    #[test]
    fn reads_items_of_a_cut_off_array() {
        let text = r#"{"category": "recyclable", "preparation_steps": ["Rinse it", "Say \"done\"", "Flatt"#;
        assert_eq!(
            partial_list(text, &["preparation_steps"]),
            vec!["Rinse it", "Say \"done\""]
        );
        assert!(partial_list(text, &["steps_missing"]).is_empty());
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```\nhello\n```"), "hello");
        assert_eq!(strip_code_fences("  plain  "), "plain");
    }
}
