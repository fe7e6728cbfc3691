//! Per-turn domain values: query normalization, drug resolution, and reaction ranking.

pub(crate) mod adverse_event;
pub(crate) mod drug;
pub(crate) mod query;

use serde::{Deserialize, Serialize};

use crate::entities::adverse_event::RankedReactions;

/// Why a turn ended without a ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    EmptyQuery,
    NoMatch,
    InsufficientData,
    NetworkError,
    SchemaError,
}

impl FailureReason {
    /// Transport and payload failures share one user-facing message.
    pub fn is_upstream(self) -> bool {
        matches!(self, Self::NetworkError | Self::SchemaError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Success(RankedReactions),
    Failure(FailureReason),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::adverse_event::RankedReaction;

    #[test]
    fn outcome_serializes_with_status_tag() {
        let success = PipelineOutcome::Success(RankedReactions::from(vec![RankedReaction {
            term: "HEADACHE".into(),
            count: 6,
        }]));
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"][0]["term"], "HEADACHE");
        assert_eq!(json["data"][0]["count"], 6);

        let failure = PipelineOutcome::Failure(FailureReason::InsufficientData);
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["data"], "insufficient_data");
    }

    #[test]
    fn only_transport_and_schema_failures_are_upstream() {
        assert!(FailureReason::NetworkError.is_upstream());
        assert!(FailureReason::SchemaError.is_upstream());
        assert!(!FailureReason::EmptyQuery.is_upstream());
        assert!(!FailureReason::NoMatch.is_upstream());
        assert!(!FailureReason::InsufficientData.is_upstream());
    }
}
