//! Decision-source boundary
//!
//! Anything that can answer "given this perception, what should happen?"
//! sits behind the two traits here: [`DecisionSource`] for player-level
//! strategy (a batch of proposed directives) and [`TacticalSource`] for a
//! single unit's next action. Implementations may be network-backed
//! ([`llm::LlmDecisionSource`]) or local rules ([`rules::RuleBasedSource`]).

pub mod llm;
pub mod rules;

use crate::directive::ProposedDirective;
use crate::unit::perception::UnitPerception;
use crate::unit::UnitAction;
use serde::Deserialize;
use thiserror::Error;

/// Failure taxonomy for decision calls
///
/// Transport, Timeout, Status and Malformed are all handled identically by
/// callers (abandon the call, fall back). NotConfigured additionally
/// disables further calls for the session.
#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("decision request timed out")]
    Timeout,

    #[error("decision service returned status {0}")]
    Status(u16),

    #[error("decision service not configured")]
    NotConfigured,

    #[error("malformed decision payload: {0}")]
    Malformed(String),
}

/// Successful strategic response: a list of proposed directives
///
/// Proposals are unvalidated at this layer; the coordinator rejects bad
/// entries one by one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategicResponse {
    #[serde(default)]
    pub directives: Vec<ProposedDirective>,
}

/// Maps a serialized battle perception to proposed directives
#[allow(async_fn_in_trait)]
pub trait DecisionSource {
    async fn decide(&self, perception: &str) -> Result<StrategicResponse, DecisionError>;
}

/// Maps a single unit's perception to its next action
#[allow(async_fn_in_trait)]
pub trait TacticalSource {
    async fn advise(&self, perception: &UnitPerception) -> Result<UnitAction, DecisionError>;
}

/// Stand-in source for hosts running with no decision service at all
///
/// Always reports NotConfigured, which the coordinator turns into its
/// one-way degradation: defaults assigned, no further calls this session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

impl DecisionSource for NullSource {
    async fn decide(&self, _perception: &str) -> Result<StrategicResponse, DecisionError> {
        Err(DecisionError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parses_with_missing_directives_key() {
        let response: StrategicResponse = serde_json::from_str("{}").unwrap();
        assert!(response.directives.is_empty());
    }

    #[test]
    fn test_response_parses_directive_list() {
        let json = r#"{"directives": [
            {"unitId": "U1", "type": "gather"},
            {"unitId": "U2", "type": "attack", "targetUnitId": "E1"}
        ]}"#;
        let response: StrategicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.directives.len(), 2);
        assert_eq!(response.directives[1].kind, "attack");
    }

    #[tokio::test]
    async fn test_null_source_reports_not_configured() {
        let result = NullSource.decide("anything").await;
        assert!(matches!(result, Err(DecisionError::NotConfigured)));
    }
}
