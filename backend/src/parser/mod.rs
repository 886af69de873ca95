pub mod educator;
pub mod extract;
pub mod reasoning;
pub mod vision;

pub use educator::{EducatorFeedback, parse_educator};
pub use reasoning::{ReasoningVerdict, parse_reasoning};
pub use vision::{VisionVerdict, non_waste_kind, parse_vision};

/// Confidence assumed when a model answer carries no usable score.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Result of interpreting one model response.
///
/// `Degraded` means the value was recovered by heuristics or defaults rather
/// than read from a complete structured payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    Degraded { value: T, note: String },
    Failed { reason: String },
}

impl<T> ParseOutcome<T> {
    pub fn degraded(value: T, note: impl Into<String>) -> Self {
        ParseOutcome::Degraded {
            value,
            note: note.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        ParseOutcome::Failed {
            reason: reason.into(),
        }
    }

    #[cfg(test)]
    pub fn value(&self) -> Option<&T> {
        match self {
            ParseOutcome::Parsed(value) | ParseOutcome::Degraded { value, .. } => Some(value),
            ParseOutcome::Failed { .. } => None,
        }
    }

    #[cfg(test)]
    pub fn is_degraded(&self) -> bool {
        matches!(self, ParseOutcome::Degraded { .. })
    }
}

/// Truncate `text` to at most `max` characters for logs and error bodies.
pub fn snippet(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
