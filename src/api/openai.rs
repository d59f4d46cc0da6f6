use crate::error::{PipelineError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

const CHAT_COMPLETIONS_API: &str = "https://api.openai.com/v1/chat/completions";

/// Persona for the generation request. The format constraint is what
/// the frame composer later parses (`'QUOTE' - MOVIE TITLE (YEAR)`).
const SYSTEM_PROMPT: &str = "You are a film historian specializing in horror movies. \
Provide authentic, memorable quotes from horror films. Include only the quote and the \
movie title. Format as: 'QUOTE' - MOVIE TITLE (YEAR). Ensure each quote is unique and \
different from any you've provided before.";

#[derive(Debug, Clone)]
pub struct QuoteClient {
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl QuoteClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            model: "gpt-4".to_string(),
            client,
        }
    }

    /// Ask the completion API for `count` quote lines on `theme`. The seed
    /// and timestamp are embedded in the prompt to discourage cached
    /// responses across attempts.
    pub fn request_quotes(
        &self,
        count: usize,
        theme: &str,
        seed: u32,
        timestamp: &str,
    ) -> Result<Vec<String>> {
        info!("Requesting {} quotes focusing on {}...", count, theme);

        let user_prompt = format!(
            "Provide {count} different, authentic horror movie quotes focusing on {theme}. \
             Choose quotes that are impactful, memorable, and would look good on a dramatic \
             background. Random seed: {seed}, timestamp: {timestamp}. Make sure these are \
             completely different from typical horror quotes and avoid common, overused lines."
        );

        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": 1.0,
            "top_p": 0.9,
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_API)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()?;

        if !response.status().is_success() {
            let error_text = response.text()?;
            return Err(PipelineError::Api(format!(
                "Chat completions API error: {}",
                error_text
            )));
        }

        let parsed: ChatResponse = response.json()?;
        let content = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| PipelineError::Api("No choices in completion response".to_string()))?;

        Ok(split_quote_lines(content))
    }
}

/// The completion content is freeform text; each non-empty line is one
/// candidate quote.
fn split_quote_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_content_into_trimmed_lines() {
        let content = "  \"We all go a little mad sometimes.\" - Psycho (1960)\n\n\
                       \"They're here.\" - Poltergeist (1982)  \n";
        let lines = split_quote_lines(content);
        assert_eq!(
            lines,
            vec![
                "\"We all go a little mad sometimes.\" - Psycho (1960)",
                "\"They're here.\" - Poltergeist (1982)",
            ]
        );
    }

    #[test]
    fn empty_content_yields_no_candidates() {
        assert!(split_quote_lines("\n  \n").is_empty());
    }
}
