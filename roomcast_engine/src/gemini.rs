//! Gemini `generateContent` client for spatial reasoning.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use roomcast_core::Catalog;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::reasoning::{ReasoningService, TransportError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    url: String,
    api_key: String,
    temperature: f32,
    timeout: Duration,
    system_prompt: String,
}

impl GeminiClient {
    pub fn new(config: &EngineConfig, catalog: &Catalog) -> Result<Self, TransportError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(TransportError::MissingApiKey)?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        let url = format!(
            "{}/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        Ok(GeminiClient {
            client,
            url,
            api_key,
            temperature: config.temperature,
            timeout: config.timeout(),
            system_prompt: system_prompt(catalog),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

#[async_trait]
impl ReasoningService for GeminiClient {
    async fn request(&self, instruction: &str, room_state: &str) -> Result<String, TransportError> {
        let message = user_message(instruction, room_state);
        let body = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part {
                    text: &self.system_prompt,
                }],
            },
            contents: vec![Content {
                parts: vec![Part { text: &message }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        log::debug!("POST {} ({} byte instruction)", self.url, instruction.len());
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| self.classify(err))?;
        log::debug!("Gemini responded with {status}");
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        extract_candidate_text(&text)
    }
}

impl GeminiClient {
    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Http(err)
        }
    }
}

pub fn user_message(instruction: &str, room_state: &str) -> String {
    format!("Instruction: \"{instruction}\"\n\nCurrent room state:\n{room_state}")
}

/// Text of the first part of the first candidate.
pub fn extract_candidate_text(body: &str) -> Result<String, TransportError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(TransportError::EmptyResponse("no candidates".to_string()));
    };
    let finish = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
    candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| TransportError::EmptyResponse(format!("finish reason {finish}")))
}

/// Spatial-reasoning instructions for the room described by `catalog`.
pub fn system_prompt(catalog: &Catalog) -> String {
    let room = catalog.room;
    let mut prompt = format!(
        "You are an interior design spatial reasoning engine for RoomCast.\n\
         \n\
         You receive a voice or text instruction and the current room state JSON.\n\
         You output ONLY raw JSON. No markdown. No explanation. No code blocks. No backticks.\n\
         \n\
         Room boundaries: X = 0 to {w}, Z = 0 to {l}\n\
         Coordinate convention: all x, z values refer to the CENTER of each item.\n\
         Rotation is in degrees around the vertical axis; 0 faces the window wall.\n\
         \n\
         Named zones:\n\
         - \"near the window\" = Z {window_from} to {l} (north wall)\n\
         - \"near the door / entrance\" = Z 0 to 1.5 (south wall)\n\
         - \"center of the room\" = X about {cx}, Z about {cz}\n\
         - \"left wall\" = X close to 0 (accounting for item half-width)\n\
         - \"right wall\" = X close to {w} (accounting for item half-width)\n\
         \n\
         Default positions (use these when the user says \"reset\" or \"put it back\"):\n",
        w = room.width,
        l = room.length,
        window_from = room.length - 1.5,
        cx = room.width / 2.0,
        cz = room.length / 2.0,
    );
    for item in &catalog.items {
        prompt.push_str(&format!("- {}: x={}, z={}\n", item.id, item.x, item.z));
    }

    let swappable: Vec<String> = catalog
        .items
        .iter()
        .filter(|item| item.is_swappable())
        .map(|item| {
            let labels: Vec<&str> = item.variants.iter().map(|v| v.label.as_str()).collect();
            format!("- {}: {}", item.id, labels.join(" / "))
        })
        .collect();
    if !swappable.is_empty() {
        prompt.push_str(&format!(
            "\nItems with alternative styles (set \"swap\": true to switch to the next one):\n{}\n",
            swappable.join("\n")
        ));
    }

    prompt.push_str(
        "\nRules:\n\
         - When the user asks to \"reset\" an item, move it to its default position listed above\n\
         - Only move items explicitly mentioned or clearly implied\n\
         - Keep all items within room boundaries, accounting for item width and depth from center\n\
         - Approximate positions are acceptable; precision is not required\n\
         - Do NOT add new furniture items. Only move items that already exist in the room state.\n\
         - Do NOT remove furniture items. If asked to remove something, return an empty actions array and explain in user_message.\n\
         - Do NOT rename furniture items or change their IDs\n\
         - Omit \"rotation\" unless the user asks to turn or face an item\n\
         - If an instruction is ambiguous, make a reasonable design choice\n\
         \n\
         Output format, strictly this structure and nothing else:\n\
         {\n  \"actions\": [\n    {\"id\": \"<id from furniture list>\", \"x\": <number>, \"z\": <number>, \"rotation\": <optional degrees>, \"swap\": <optional boolean>}\n  ],\n  \
         \"room_description\": \"<2-3 sentence description of the full room in its updated state, written as an image generation prompt>\",\n  \
         \"user_message\": \"<one short friendly sentence confirming what was done>\"\n}\n\
         \n\
         If multiple items need to move, include multiple objects in the actions array.\n\
         If nothing needs to move, return an empty actions array.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_text_is_extracted() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"actions\":[]}"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(
            extract_candidate_text(body).expect("text present"),
            "{\"actions\":[]}"
        );
    }

    #[test]
    fn filtered_candidates_are_transport_failures() {
        let blocked = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        match extract_candidate_text(blocked) {
            Err(TransportError::EmptyResponse(reason)) => assert!(reason.contains("SAFETY")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            extract_candidate_text(r#"{"promptFeedback":{}}"#),
            Err(TransportError::EmptyResponse(_))
        ));
        assert!(matches!(
            extract_candidate_text("<html>"),
            Err(TransportError::Envelope(_))
        ));
    }

    #[test]
    fn request_body_uses_gemini_field_names() {
        let body = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part { text: "system" }],
            },
            contents: vec![Content {
                parts: vec![Part { text: "user" }],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };
        let json = serde_json::to_value(&body).expect("serializes");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "system");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "user");
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn prompt_lists_defaults_and_swappable_items() {
        let prompt = system_prompt(&Catalog::builtin());
        assert!(prompt.contains("Room boundaries: X = 0 to 5, Z = 0 to 8"));
        assert!(prompt.contains("- coffee_table: x=1.5, z=3"));
        assert!(prompt.contains("- sofa: Sofa / Sectional Sofa"));
        assert!(!prompt.contains("- desk: Desk"));
    }

    #[test]
    fn prompt_sections_stay_on_their_own_lines() {
        let prompt = system_prompt(&Catalog::builtin());
        assert!(prompt.contains("\"put it back\"):\n- "));
        assert!(prompt.contains("\n\nItems with alternative styles"));
        assert!(prompt.contains("\n\nRules:\n"));
        assert!(prompt.ends_with("empty actions array.\n"));
    }

    #[test]
    fn client_requires_an_api_key() {
        let config = EngineConfig::default();
        assert!(matches!(
            GeminiClient::new(&config, &Catalog::builtin()),
            Err(TransportError::MissingApiKey)
        ));

        let config = EngineConfig {
            api_key: Some("test-key".to_string()),
            endpoint: "http://localhost:9/models/".to_string(),
            ..EngineConfig::default()
        };
        let client = GeminiClient::new(&config, &Catalog::builtin()).expect("client builds");
        assert_eq!(
            client.url(),
            "http://localhost:9/models/gemini-3.1-pro-preview:generateContent"
        );
    }

    #[test]
    fn user_message_quotes_the_instruction() {
        let message = user_message("move the bed", "{}");
        assert!(message.starts_with("Instruction: \"move the bed\""));
        assert!(message.ends_with("Current room state:\n{}"));
    }
}
