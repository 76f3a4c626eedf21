use crate::error::Result;
use crate::figma::ensure_success;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Budget for a screen render.
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination renders are larger and slower to come back.
pub const DESTINATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the raw bytes behind an image URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}

/// Plain GET downloader for rendered screenshots.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: Client,
}

impl ImageDownloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Protoscribe/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for ImageDownloader {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        debug!("Downloading image {}", url);
        let response = self.client.get(url).timeout(timeout).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_fetch_returns_body_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/render/1.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
            .mount(&server)
            .await;

        let downloader = ImageDownloader::new().unwrap();
        let bytes = downloader
            .fetch(&format!("{}/render/1.png", server.uri()), FRAME_TIMEOUT)
            .await
            .unwrap();

        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_fetch_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("expired"))
            .mount(&server)
            .await;

        let downloader = ImageDownloader::new().unwrap();
        let result = downloader
            .fetch(&format!("{}/render/gone.png", server.uri()), FRAME_TIMEOUT)
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 403, .. })));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1, 2, 3])
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let downloader = ImageDownloader::new().unwrap();
        let result = downloader
            .fetch(&format!("{}/slow.png", server.uri()), Duration::from_millis(50))
            .await;

        assert!(matches!(result, Err(FetchError::HttpError(_))));
    }
}
