use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected status {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Node {0} not present in response")]
    MissingNode(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;
