
use serde::{Deserialize, Serialize};

pub const FALLBACK_EMOTION: &str = "neutral";


#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmotionResult {
    pub label: String,
    pub confidence: f64,
}

impl EmotionResult {
    pub fn new(label: &str, confidence: f64) -> Self {
        Self {
            label: label.trim().to_lowercase(),
            confidence,
        }
    }

    // confidence 0.0 marks "fallback, not a genuine detection"
    pub fn fallback() -> Self {
        Self {
            label: FALLBACK_EMOTION.to_owned(),
            confidence: 0.0,
        }
    }
}


// Outcome of a classification attempt. Upstream problems never surface as
// errors; the caller gets the fallback together with the reason and decides
// how to present it.
#[derive(Debug, Clone)]
pub enum Classification {
    Detected(EmotionResult),
    Degraded { fallback: EmotionResult, reason: String },
}

impl Classification {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            fallback: EmotionResult::fallback(),
            reason: reason.into(),
        }
    }

    pub fn result(&self) -> &EmotionResult {
        match self {
            Self::Detected(result) => result,
            Self::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Self::Detected(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}


#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrackRecord {
    pub name: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub destination_url: String,
}
