pub mod error;
pub mod http;
pub mod types;

pub use error::{ApiError, UpstreamError};
pub use types::{BoxType, FileNode, MediaDetail, MediaKind, QualityVariant, SearchResult, ShareKey};
