//! Async LLM-backed decision source
//!
//! Model-agnostic HTTP client supporting both Anthropic and
//! OpenAI-compatible APIs (DeepSeek, etc). The LLM proposes strategy; it
//! never mutates game state directly, and everything it returns passes
//! through coordinator validation before becoming a directive.

use crate::decision::{DecisionError, DecisionSource, StrategicResponse, TacticalSource};
use crate::unit::perception::UnitPerception;
use crate::unit::UnitAction;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-request timeout; the coordinator wraps calls in its own wall-clock
/// timeout as well
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// API format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// LLM client answering both strategic and tactical requests
pub struct LlmDecisionSource {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
}

impl LlmDecisionSource {
    /// Create a new source with explicit configuration
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
        }
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    /// Create a source from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults to Anthropic API)
    /// Optional: LLM_MODEL (defaults to claude-3-haiku-20240307)
    pub fn from_env() -> Result<Self, DecisionError> {
        let api_key = std::env::var("LLM_API_KEY").map_err(|_| DecisionError::NotConfigured)?;
        let api_url = std::env::var("LLM_API_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "claude-3-haiku-20240307".into());

        Ok(Self::new(api_key, api_url, model))
    }

    /// Send a completion request and return the raw text response
    async fn complete(&self, system: &str, user: &str) -> Result<String, DecisionError> {
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(system, user).await,
            ApiFormat::OpenAI => self.complete_openai(system, user).await,
        }
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String, DecisionError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .timeout(REQUEST_TIMEOUT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response.status())?;

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| DecisionError::Malformed(e.to_string()))?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| DecisionError::Malformed("empty response".into()))
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String, DecisionError> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response.status())?;

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| DecisionError::Malformed(e.to_string()))?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| DecisionError::Malformed("empty response".into()))
    }
}

fn map_transport_error(e: reqwest::Error) -> DecisionError {
    if e.is_timeout() {
        DecisionError::Timeout
    } else {
        DecisionError::Transport(e.to_string())
    }
}

/// Map HTTP status to the failure taxonomy
///
/// 404/501 mean the endpoint itself is absent, which callers treat as a
/// permanent "not configured" signal for the session.
fn check_status(status: StatusCode) -> Result<(), DecisionError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::NOT_FOUND | StatusCode::NOT_IMPLEMENTED => Err(DecisionError::NotConfigured),
        other => Err(DecisionError::Status(other.as_u16())),
    }
}

/// Extract the JSON object from an LLM response (handles surrounding text)
fn extract_json(response: &str) -> Result<&str, DecisionError> {
    let start = response
        .find('{')
        .ok_or_else(|| DecisionError::Malformed("no JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| DecisionError::Malformed("no closing brace found in response".into()))?;
    if end < start {
        return Err(DecisionError::Malformed("unbalanced JSON braces".into()));
    }
    Ok(&response[start..=end])
}

impl DecisionSource for LlmDecisionSource {
    async fn decide(&self, perception: &str) -> Result<StrategicResponse, DecisionError> {
        let response = self.complete(STRATEGIC_SYSTEM_PROMPT, perception).await?;
        let json = extract_json(&response)?;
        serde_json::from_str(json)
            .map_err(|e| DecisionError::Malformed(format!("{} in: {}", e, json)))
    }
}

impl TacticalSource for LlmDecisionSource {
    async fn advise(&self, perception: &UnitPerception) -> Result<UnitAction, DecisionError> {
        let rendered = perception.render();
        let response = self.complete(TACTICAL_SYSTEM_PROMPT, &rendered).await?;
        let json = extract_json(&response)?;
        serde_json::from_str(json)
            .map_err(|e| DecisionError::Malformed(format!("{} in: {}", e, json)))
    }
}

/// System prompt for player-level strategy
const STRATEGIC_SYSTEM_PROMPT: &str = r#"You are the strategic advisor for one player in a real-time strategy game.
You receive a text snapshot of everything that player can currently see.
Respond with directives for that player's units.

DIRECTIVE TYPES: idle, move, gather, attack, build, explore, defend, patrol, siege

HARD RULES:
- Only assign non-idle directives to units listed under STANDING ORDERS.
  Units the player has not instructed must stay idle.
- Never override player intent expressed in a standing order.
- Coordinates are {"col": <int>, "row": <int>} on the grid shown in the map header.

OUTPUT FORMAT (JSON only, no explanation):
{
  "directives": [
    {"unitId": "U1", "type": "gather", "target": {"col": 4, "row": 7},
     "resourceType": "minerals", "priority": 6, "reasoning": "short rationale"}
  ]
}

Omit optional fields you have no value for. Units you leave out keep their
current directive or fall back to idle."#;

/// System prompt for single-unit tactical advice
const TACTICAL_SYSTEM_PROMPT: &str = r#"You advise a single unit in a real-time strategy game.
You receive that unit's own narrow view of the battlefield.
Respond with exactly one action.

ACTION KINDS: hold, move_to, attack_unit, gather_at, retreat, scout

OUTPUT FORMAT (JSON only, no explanation):
{"kind": "attack_unit", "targetUnit": "E3", "reasoning": "short rationale"}
or
{"kind": "move_to", "target": {"col": 9, "row": 2}, "reasoning": "short rationale"}"#;

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            LlmDecisionSource::detect_api_format("https://api.anthropic.com/v1/messages"),
            ApiFormat::Anthropic
        );
        assert_eq!(
            LlmDecisionSource::detect_api_format("https://api.deepseek.com/chat/completions"),
            ApiFormat::OpenAI
        );
    }

    #[test]
    fn test_explicit_construction() {
        let source = LlmDecisionSource::new(
            "key".into(),
            "https://api.deepseek.com/chat/completions".into(),
            "deepseek-chat".into(),
        );
        assert_eq!(source.api_format, ApiFormat::OpenAI);
    }

    #[test]
    fn test_extract_json_simple() {
        let response = r#"{"directives": []}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here is my assessment:\n{\"directives\": [{\"unitId\": \"U1\", \"type\": \"gather\"}]}\nGood luck.";
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert!(json.contains("gather"));
    }

    #[test]
    fn test_extract_json_no_json() {
        assert!(extract_json("I cannot decide right now").is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(DecisionError::NotConfigured)
        ));
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(DecisionError::Status(500))
        ));
    }

    #[test]
    fn test_strategic_payload_round_trip() {
        let json = r#"{"directives": [{"unitId": "U1", "type": "defend",
            "target": {"col": 3, "row": 3}, "reasoning": "hold the ramp"}]}"#;
        let parsed: StrategicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.directives.len(), 1);
        assert_eq!(parsed.directives[0].kind, "defend");
    }
}
