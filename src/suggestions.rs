//! Follow-up question suggestions
//!
//! One non-streamed completion over the transcript, instructed to answer
//! with a bare JSON array of 2-3 short questions. Models don't always
//! comply, so a bullet-list fallback parser recovers suggestions from
//! plain text.

use crate::llm::{ChatMessage, LlmError, LlmRequest, LlmService};
use std::sync::Arc;

const SUGGESTION_PROMPT: &str = "Based on the above conversation, suggest 2-3 helpful and natural follow-up questions the user might ask next. Respond with a plain JSON array of short questions only, no extra text.";

/// Moderate temperature: some variety without excessive drift
const SUGGESTION_TEMPERATURE: f32 = 0.7;

/// Generate follow-up question suggestions for a transcript.
///
/// # Errors
///
/// Returns the provider error when the completion request fails. Output
/// the model produced but that parses to nothing is not an error; the
/// result is simply empty.
pub async fn generate_suggestions(
    llm: &Arc<dyn LlmService>,
    history: &[ChatMessage],
) -> Result<Vec<String>, LlmError> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::system(SUGGESTION_PROMPT));

    let request = LlmRequest {
        messages,
        tools: Vec::new(),
        temperature: Some(SUGGESTION_TEMPERATURE),
    };

    let response = llm.complete(&request).await?;
    Ok(parse_suggestions(&response.content))
}

/// Parse the model's raw output into a suggestion list.
///
/// Tries a strict JSON string array first. On failure, keeps lines that
/// start with a bullet marker (`-` or `*`), strips the marker and discards
/// empties.
fn parse_suggestions(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();

    if let Ok(suggestions) = serde_json::from_str::<Vec<String>>(trimmed) {
        return suggestions;
    }

    trimmed
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-').or_else(|| line.strip_prefix('*')))
        .map(|rest| rest.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockLlm;
    use crate::llm::Role;

    #[test]
    fn parses_strict_json_array() {
        let raw = r#"["What is the price?", "Does it mop?"]"#;
        assert_eq!(
            parse_suggestions(raw),
            vec!["What is the price?", "Does it mop?"]
        );
    }

    #[test]
    fn falls_back_to_bullet_lines() {
        let raw = "- What is the price?\n- Does it mop?";
        assert_eq!(
            parse_suggestions(raw),
            vec!["What is the price?", "Does it mop?"]
        );
    }

    #[test]
    fn fallback_accepts_star_bullets_and_skips_prose() {
        let raw = "Here are some ideas:\n* How long does the battery last?\n- Can it map rooms?\nThanks!";
        assert_eq!(
            parse_suggestions(raw),
            vec!["How long does the battery last?", "Can it map rooms?"]
        );
    }

    #[test]
    fn unparseable_output_yields_empty_list() {
        assert!(parse_suggestions("I have no suggestions today.").is_empty());
        assert!(parse_suggestions("").is_empty());
        assert!(parse_suggestions("-\n- ").is_empty());
    }

    #[tokio::test]
    async fn json_reply_becomes_suggestion_list() {
        let llm: Arc<dyn LlmService> = {
            let mock = MockLlm::new();
            mock.queue_completion(r#"["Does it mop?"]"#);
            Arc::new(mock)
        };

        let history = vec![ChatMessage::user("tell me about the Duo")];
        let suggestions = generate_suggestions(&llm, &history).await.unwrap();
        assert_eq!(suggestions, vec!["Does it mop?"]);
    }

    #[tokio::test]
    async fn request_shape_is_history_plus_system_instruction() {
        let mock = Arc::new(MockLlm::new());
        mock.queue_completion("[]");
        let llm: Arc<dyn LlmService> = mock.clone();

        let history = vec![ChatMessage::user("tell me about the Duo")];
        generate_suggestions(&llm, &history).await.unwrap();

        let requests = mock.recorded_requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.temperature, Some(SUGGESTION_TEMPERATURE));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.messages[1].role, Role::System);
        assert_eq!(request.messages[1].content, SUGGESTION_PROMPT);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let mock = Arc::new(MockLlm::new());
        mock.queue_completion_error(LlmError::rate_limit("slow down"));
        let llm: Arc<dyn LlmService> = mock;

        let err = generate_suggestions(&llm, &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::llm::LlmErrorKind::RateLimit);
    }
}
