use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

const GENERATE_CONTENT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models/";
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Suggestion produced for a task title. Priority is the Portuguese label
/// the model answers with, mapped to the domain enum by the caller.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct TaskEnhancement {
    pub description: String,
    pub priority: String,
    pub category: String,
    #[serde(default)]
    pub subtasks: Vec<String>,
}

#[async_trait]
pub trait EnhancementClient: Send + Sync {
    async fn enhance(&self, title: &str) -> Result<TaskEnhancement, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl ReqwestGeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Reads the API key from the environment. Returns None when no key is
    /// configured, in which case enhancement is unavailable.
    pub fn from_env(model: impl Into<String>) -> Option<Self> {
        Self::from_env_with(model, |name| std::env::var(name).ok())
    }

    fn from_env_with(
        model: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())?;
        Some(Self::new(api_key, model))
    }

    fn generate_content_endpoint(&self) -> Result<Url, InfraError> {
        let mut url = Url::parse(&format!("{GENERATE_CONTENT_BASE}{}:generateContent", self.model))
            .map_err(|error| InfraError::Enhancement(format!("invalid model endpoint: {error}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    fn http_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("gemini api error: http {}", status.as_u16())
        } else {
            format!("gemini api error: http {}; body={body}", status.as_u16())
        };
        InfraError::Enhancement(message)
    }
}

fn enhancement_prompt(title: &str) -> String {
    format!(
        "Você é um assistente de produtividade. Para a tarefa \"{title}\", responda em JSON \
         com os campos: description (uma frase curta), priority (\"Baixa\", \"Média\" ou \
         \"Alta\"), category (uma palavra) e subtasks (até quatro passos curtos)."
    )
}

#[derive(Debug, serde::Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, serde::Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, serde::Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ContentPart>>,
}

#[derive(Debug, serde::Deserialize)]
struct ContentPart {
    text: Option<String>,
}

fn parse_generate_content(raw: &str) -> Result<TaskEnhancement, InfraError> {
    let response: GenerateContentResponse = serde_json::from_str(raw)?;
    let text = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .filter_map(|content| content.parts)
        .flatten()
        .filter_map(|part| part.text)
        .next()
        .ok_or_else(|| InfraError::Enhancement("response carries no text part".to_string()))?;

    let enhancement: TaskEnhancement = serde_json::from_str(text.trim())?;
    if enhancement.description.trim().is_empty() {
        return Err(InfraError::Enhancement(
            "response description is empty".to_string(),
        ));
    }
    Ok(enhancement)
}

#[async_trait]
impl EnhancementClient for ReqwestGeminiClient {
    async fn enhance(&self, title: &str) -> Result<TaskEnhancement, InfraError> {
        let url = self.generate_content_endpoint()?;
        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": enhancement_prompt(title) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|error| InfraError::Enhancement(error.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|error| InfraError::Enhancement(error.to_string()))?;
        if !status.is_success() {
            return Err(Self::http_error(status, &raw));
        }

        parse_generate_content(&raw)
    }
}
