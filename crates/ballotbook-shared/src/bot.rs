//! Client-measured interaction telemetry attached to a ballot.
//!
//! The browser records how long the voter spent on the ballot, how many
//! interactions it saw and the average seconds per question. The values are
//! heuristics for spotting scripted submissions; nothing here is trusted for
//! ballot validity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotDetection {
    #[serde(default)]
    pub vote_duration_ms: Option<i64>,
    #[serde(default)]
    pub interaction_count: Option<i64>,
    #[serde(default)]
    pub question_avg: Option<f64>,
}

impl BotDetection {
    pub fn is_empty(&self) -> bool {
        self.vote_duration_ms.is_none()
            && self.interaction_count.is_none()
            && self.question_avg.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_payload() {
        let bot: BotDetection =
            serde_json::from_str(r#"{"vote_duration_ms": 5321, "question_avg": 1.75}"#).unwrap();
        assert_eq!(bot.vote_duration_ms, Some(5321));
        assert_eq!(bot.interaction_count, None);
        assert_eq!(bot.question_avg, Some(1.75));
        assert!(!bot.is_empty());
        assert!(BotDetection::default().is_empty());
    }
}
