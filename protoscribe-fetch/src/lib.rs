pub mod clickup;
pub mod download;
pub mod error;
pub mod figma;
pub mod node;
pub mod retry;
pub mod vision;

pub use clickup::{Attachment, Comment, TaskClient, TaskTicket};
pub use download::{DESTINATION_TIMEOUT, FRAME_TIMEOUT, ImageDownloader, ImageFetcher};
pub use error::FetchError;
pub use figma::FigmaClient;
pub use node::{DesignNode, NodeType, canonical_id};
pub use retry::RetryPolicy;
pub use vision::{AzureOpenAiClient, PromptPair, TextGenerator, VisionSummarizer};
