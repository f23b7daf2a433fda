use serde::Deserialize;
use serde_json::json;

use crate::{config::GENRES, error::AppResult, models::UserPreferences};

/// The model's reply was not the JSON object the prompt asks for.
#[derive(Debug, thiserror::Error)]
pub enum TagParseError {
    #[error("completion contained no choices")]
    EmptyCompletion,
    #[error("completion was not valid preference JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, model: String) -> Self {
        // Warn once on app load if extraction will be degraded
        if api_key.trim().is_empty() {
            tracing::warn!("no OPENAI_API_KEY provided - tag extraction will echo raw input");
        }
        Self { client, api_key, base_url, model }
    }

    /// Extracts preference tags from the user's sentence.
    ///
    /// Without an API key the whole sentence becomes a single keyword so
    /// the rest of the pipeline still produces results.
    pub async fn extract_tags(&self, input: &str) -> AppResult<Result<UserPreferences, TagParseError>> {
        if self.api_key.trim().is_empty() {
            let prefs =
                UserPreferences { keywords: vec![input.to_string()], ..Default::default() };
            return Ok(Ok(prefs));
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": extraction_prompt() },
                { "role": "user", "content": input },
            ],
            "response_format": { "type": "json_object" },
        });

        let resp: ChatCompletionResponse = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(choice) = resp.choices.into_iter().next() else {
            return Ok(Err(TagParseError::EmptyCompletion));
        };

        tracing::debug!(content = %choice.message.content, "model extraction output");
        Ok(parse_preferences(&choice.message.content))
    }
}

/// Parses raw completion text into preferences, tolerating the markdown
/// code fences some models wrap JSON in.
pub fn parse_preferences(content: &str) -> Result<UserPreferences, TagParseError> {
    let trimmed = strip_code_fence(content.trim());
    Ok(serde_json::from_str(trimmed)?)
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn extraction_prompt() -> String {
    format!(
        r#"Act as a specialized assistant who extracts tags from user input. The user will input a sentence describing the kind of movie they would like to watch. Extract the following tags from the input:
1. Movie Title: Also decide if the user wants to watch something similar to this movie or not.
2. Actors: Extract a list of actors if mentioned. For each actor specify whether the user would like that actor to be in the movie or not.
3. Genres: Extract a list of genres if mentioned. Each genre should be one of the following values:
      ```{genres}```
For each genre specify whether the user would like to watch a movie of that genre or not.
4. Era: If mentioned, include the era of the desired movie. Output one of two values, 'recent' or 'old'.
5. Keywords: Any other relevant keywords mentioned by the user.

Output the extracted tags in the JSON format as shown in the examples below.
Examples:
1. User input: "I want to watch a action movie, but not a comedy, starring Tom Cruise. The movie should have good dialogues and a twist in the ending. I do not want to watch a Penelope Cruz movie."
   Output: {{
                 "title": null,
                 "genres": [["action", 1], ["comedy", 0]],
                 "actors": [["Tom Cruise", 1], ["Penelope Cruz", 0]],
                 "era": null,
                 "keywords": ["good dialogues", "twist in the ending"]
                 }}

2. User input: "I want to watch an old dramatic musical. The movie should have great music and should be inspiring."
   Output: {{
                 "title": null,
                 "genres": [["musical", 1], ["drama", 1]],
                 "actors": null,
                 "era": "old",
                 "keywords": ["great music", "inspiring"]
                 }}

Do not infer any information. Include a title only if it is a valid movie name."#,
        genres = GENRES.join(", ")
    )
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let prefs = parse_preferences(
            r#"{"title": null, "genres": [["action", 1]], "actors": [], "era": null, "keywords": []}"#,
        )
        .unwrap();
        assert_eq!(prefs.genres, vec![("action".to_string(), 1)]);
    }

    #[test]
    fn parses_fenced_json() {
        let content = "```json\n{\"keywords\": [\"space\"]}\n```";
        let prefs = parse_preferences(content).unwrap();
        assert_eq!(prefs.keywords, vec!["space".to_string()]);
    }

    #[test]
    fn malformed_output_is_a_parse_error() {
        let err = parse_preferences("I'd recommend an action movie!").unwrap_err();
        assert!(matches!(err, TagParseError::InvalidJson(_)));
    }

    #[test]
    fn prompt_carries_genre_vocabulary() {
        let prompt = extraction_prompt();
        assert!(prompt.contains("film-noir"));
        assert!(prompt.contains("'recent' or 'old'"));
    }
}
