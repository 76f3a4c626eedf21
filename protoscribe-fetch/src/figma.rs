use crate::error::{FetchError, Result};
use crate::node::{DesignNode, canonical_id};
use crate::retry::RetryPolicy;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const FIGMA_API_URL: &str = "https://api.figma.com";

#[derive(Debug, Deserialize)]
struct NodesResponse {
    #[serde(default)]
    nodes: HashMap<String, Option<NodeEnvelope>>,
}

#[derive(Debug, Deserialize)]
struct NodeEnvelope {
    document: DesignNode,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: HashMap<String, Option<String>>,
}

/// Client for the Figma REST endpoints the extractor needs: node subtrees and PNG renders.
#[derive(Debug, Clone)]
pub struct FigmaClient {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl FigmaClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(token, 120)
    }

    pub fn with_timeout(token: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Protoscribe/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(30)))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url: FIGMA_API_URL.to_string(),
            token: token.into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Browser link to a node inside a design file.
    pub fn design_link(file_key: &str, node_id: &str) -> String {
        format!("https://www.figma.com/file/{file_key}/?type=design&node-id={node_id}")
    }

    /// Fetch the subtree rooted at `node_id`, retrying transport and status failures.
    ///
    /// This is the only call whose failure aborts an extraction, so it is the only one that
    /// surfaces `RetriesExhausted`.
    pub async fn fetch_node_tree(&self, file_key: &str, node_id: &str) -> Result<DesignNode> {
        let url = format!("{}/v1/files/{}/nodes", self.base_url, file_key);
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            debug!("Fetching Figma node {} (attempt {}/{})", node_id, attempt, attempts);

            match self.get_nodes(&url, node_id).await {
                Ok(mut response) => {
                    let envelope = response
                        .nodes
                        .remove(node_id)
                        .flatten()
                        .ok_or_else(|| FetchError::MissingNode(node_id.to_string()))?;
                    info!("Fetched Figma node {} ({})", node_id, envelope.document.name);
                    return Ok(envelope.document);
                }
                Err(e) => {
                    warn!(
                        "Figma node request failed (attempt {}/{}): {}",
                        attempt, attempts, e
                    );
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts,
            last: last_error,
        })
    }

    async fn get_nodes(&self, url: &str, node_id: &str) -> Result<NodesResponse> {
        let response = self
            .client
            .get(url)
            .header("X-Figma-Token", &self.token)
            .query(&[("ids", node_id)])
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Render the given nodes to PNG and return `canonical id -> image url`.
    ///
    /// Ids the service could not render are simply absent from the map. An empty id list
    /// returns an empty map without touching the network.
    pub async fn fetch_images(
        &self,
        file_key: &str,
        node_ids: &[String],
    ) -> Result<HashMap<String, String>> {
        if node_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = node_ids
            .iter()
            .map(|id| canonical_id(id))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/v1/images/{}", self.base_url, file_key);
        debug!("Requesting {} renders from {}", node_ids.len(), url);

        let response = self
            .client
            .get(&url)
            .header("X-Figma-Token", &self.token)
            .query(&[("ids", ids.as_str()), ("format", "png")])
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body = response.text().await?;
        let parsed: ImagesResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .images
            .into_iter()
            .filter_map(|(id, url)| {
                url.filter(|u| !u.is_empty())
                    .map(|u| (canonical_id(&id).to_string(), u))
            })
            .collect())
    }
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(FetchError::Status {
        status: status.as_u16(),
        url,
        body,
    })
}
