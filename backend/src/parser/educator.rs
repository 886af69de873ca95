use shared::EnvironmentalMetric;
use std::str::FromStr;

use super::ParseOutcome;
use super::extract::{as_text, find_field, first_json_object, key_value, strip_code_fences};

const MESSAGE_KEYS: &[&str] = &["message", "feedback", "impact", "environmental_impact", "text"];
const METRIC_KEYS: &[&str] = &["primary_metric", "metric", "focus_metric"];
const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct EducatorFeedback {
    pub primary_metric: EnvironmentalMetric,
    pub message: String,
}

/// Map a loosely written metric name onto one of the six metrics.
pub fn resolve_metric(raw: &str) -> Option<EnvironmentalMetric> {
    let normalized = raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
        .replace(['-', ' '], "_");
    if let Ok(metric) = EnvironmentalMetric::from_str(&normalized) {
        return Some(metric);
    }
    let metric = match normalized.as_str() {
        "co2" | "carbon" | "co2_saved" | "carbon_emissions" | "emissions" | "greenhouse_gas" => {
            EnvironmentalMetric::Co2Emissions
        }
        "energy_saved" | "electricity" => EnvironmentalMetric::Energy,
        "water_saved" | "water_usage" => EnvironmentalMetric::Water,
        "landfill" | "landfill_diverted" | "waste_diverted" => EnvironmentalMetric::LandfillSpace,
        "resources" | "materials" | "natural_resources" | "raw_materials_saved" => {
            EnvironmentalMetric::RawMaterials
        }
        "pollution_prevented" | "toxicity" | "contamination" => EnvironmentalMetric::Pollution,
        _ => return None,
    };
    Some(metric)
}

/// `requested` is the metric the prompt asked for; it stands in when the
/// model does not name one.
pub fn parse_educator(raw: &str, requested: EnvironmentalMetric) -> ParseOutcome<EducatorFeedback> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return ParseOutcome::failed("empty educator response");
    }

    if let Some(map) = first_json_object(&text) {
        let Some(message) = find_field(&map, MESSAGE_KEYS).and_then(as_text) else {
            return ParseOutcome::failed("educator payload has no message");
        };
        let message = clip(&message);
        return match find_field(&map, METRIC_KEYS)
            .and_then(as_text)
            .and_then(|m| resolve_metric(&m))
        {
            Some(primary_metric) => ParseOutcome::Parsed(EducatorFeedback {
                primary_metric,
                message,
            }),
            None => ParseOutcome::degraded(
                EducatorFeedback {
                    primary_metric: requested,
                    message,
                },
                "metric missing or unknown",
            ),
        };
    }

    let primary_metric = key_value(&text, &["primary_metric", "primary metric", "metric"])
        .and_then(|m| resolve_metric(&m))
        .unwrap_or(requested);

    // An object that never closed; only its fields are usable as a message.
    if text.contains('{') {
        return match key_value(&text, MESSAGE_KEYS) {
            Some(message) => ParseOutcome::degraded(
                EducatorFeedback {
                    primary_metric,
                    message: clip(&message),
                },
                "educator payload was cut off",
            ),
            None => ParseOutcome::failed("incomplete educator payload has no message"),
        };
    }

    ParseOutcome::degraded(
        EducatorFeedback {
            primary_metric,
            message: clip(&text),
        },
        "no structured payload in educator response",
    )
}

fn clip(message: &str) -> String {
    let message = message.trim();
    match message.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((cut, _)) => message[..cut].trim_end().to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json() {
        let raw = r#"{"primary_metric": "energy", "message": "Recycling this bottle saves enough energy to power a bulb for 3 hours."}"#;
        assert_eq!(
            parse_educator(raw, EnvironmentalMetric::Water),
            ParseOutcome::Parsed(EducatorFeedback {
                primary_metric: EnvironmentalMetric::Energy,
                message: "Recycling this bottle saves enough energy to power a bulb for 3 hours."
                    .into(),
            })
        );
    }

    #[test]
    fn unknown_metric_falls_back_to_requested() {
        let raw = r#"{"primary_metric": "happiness", "message": "Good job."}"#;
        let outcome = parse_educator(raw, EnvironmentalMetric::Pollution);
        assert!(outcome.is_degraded());
        assert_eq!(
            outcome.value().unwrap().primary_metric,
            EnvironmentalMetric::Pollution
        );
    }

    #[test]
    fn plain_text_becomes_the_message() {
        let raw = "Composting one banana peel avoids about 0.1 kg of CO2-equivalent methane.";
        let outcome = parse_educator(raw, EnvironmentalMetric::Co2Emissions);
        assert!(outcome.is_degraded());
        let feedback = outcome.value().unwrap();
        assert_eq!(feedback.message, raw);
        assert_eq!(feedback.primary_metric, EnvironmentalMetric::Co2Emissions);
    }

    #[test]
    fn json_without_message_fails() {
        let outcome = parse_educator(r#"{"primary_metric": "water"}"#, EnvironmentalMetric::Water);
        assert!(matches!(outcome, ParseOutcome::Failed { .. }));
        assert!(matches!(
            parse_educator("  ", EnvironmentalMetric::Water),
            ParseOutcome::Failed { .. }
        ));
    }

    #[test]
    fn cut_off_json_yields_its_message_not_the_raw_payload() {
        let raw = r#"{"primary_metric": "energy", "message": "Recycling this can saves enough energy to run a TV for"#;
        let outcome = parse_educator(raw, EnvironmentalMetric::Water);
        assert!(outcome.is_degraded());
        assert_eq!(
            outcome.value().unwrap(),
            &EducatorFeedback {
                primary_metric: EnvironmentalMetric::Energy,
                message: "Recycling this can saves enough energy to run a TV for".into(),
            }
        );

        let outcome = parse_educator(r#"{"primary_metric": "energy", "mess"#, EnvironmentalMetric::Water);
        assert!(matches!(outcome, ParseOutcome::Failed { .. }));
    }

    #[test]
    fn long_messages_are_clipped() {
        let raw = "a".repeat(MAX_MESSAGE_CHARS + 50);
        let outcome = parse_educator(&raw, EnvironmentalMetric::Energy);
        assert_eq!(outcome.value().unwrap().message.len(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn resolves_metric_aliases() {
        assert_eq!(resolve_metric("CO2"), Some(EnvironmentalMetric::Co2Emissions));
        assert_eq!(resolve_metric("co2_emissions"), Some(EnvironmentalMetric::Co2Emissions));
        assert_eq!(resolve_metric("Landfill Space"), Some(EnvironmentalMetric::LandfillSpace));
        assert_eq!(resolve_metric("raw-materials"), Some(EnvironmentalMetric::RawMaterials));
        assert_eq!(resolve_metric("joy"), None);
    }
}
