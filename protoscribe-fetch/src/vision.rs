use crate::error::{FetchError, Result};
use crate::figma::ensure_success;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// System and user instructions sent alongside one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Describes one image. Implementations own their retry policy and report exhaustion as
/// `None`, so callers never need a failure branch of their own.
#[async_trait]
pub trait VisionSummarizer: Send + Sync {
    async fn summarize(&self, image_url: &str, prompts: &PromptPair) -> Option<String>;
}

/// Plain prompt-in, text-out completion used for headings and story text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageRef<'a> },
}

#[derive(Debug, Serialize)]
struct ImageRef<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Azure OpenAI chat-completions deployment used for both image and text prompts.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    client: Client,
    completions_url: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl AzureOpenAiClient {
    pub fn new(endpoint: &str, api_key: &str, deployment: &str, api_version: &str) -> Result<Self> {
        if api_key.is_empty() || deployment.is_empty() {
            return Err(FetchError::Other(
                "Azure API key and deployment must be provided".to_string(),
            ));
        }

        let mut completions_url = Url::parse(endpoint)
            .and_then(|base| {
                base.join(&format!("openai/deployments/{deployment}/chat/completions"))
            })
            .map_err(|e| FetchError::InvalidUrl(format!("{endpoint}: {e}")))?;
        completions_url
            .query_pairs_mut()
            .append_pair("api-version", api_version);

        let client = Client::builder()
            .user_agent(concat!("Protoscribe/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            completions_url,
            api_key: api_key.to_string(),
            retry: RetryPolicy::linear(3, Duration::from_millis(1500)),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String> {
        let response = self
            .client
            .post(self.completions_url.clone())
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| FetchError::Other("completion had no content".to_string()))
    }
}

#[async_trait]
impl VisionSummarizer for AzureOpenAiClient {
    async fn summarize(&self, image_url: &str, prompts: &PromptPair) -> Option<String> {
        if image_url.is_empty() {
            return None;
        }

        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&prompts.system),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: &prompts.user,
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageRef { url: image_url },
                        },
                    ]),
                },
            ],
            temperature: 0.4,
            max_tokens: 4096,
        };

        let attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.complete(&request).await {
                Ok(text) => {
                    debug!("Summarized {} ({} chars)", image_url, text.len());
                    return Some(text);
                }
                Err(e) if attempt < attempts => {
                    warn!(
                        "Summarize attempt {}/{} failed for {}: {}",
                        attempt, attempts, image_url, e
                    );
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                }
                Err(e) => {
                    error!("Summarize final failure for {}: {}", image_url, e);
                }
            }
        }
        None
    }
}

#[async_trait]
impl TextGenerator for AzureOpenAiClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Text(prompt),
            }],
            temperature: 0.35,
            max_tokens,
        };
        self.complete(&request).await
    }
}
