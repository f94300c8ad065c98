pub mod febbox;
pub mod quality;
pub mod source;

use thiserror::Error;

pub use febbox::{FebboxClient, FileServiceConfig};
pub use source::ShareSource;

/// Failure while constructing a file service client.
#[derive(Error, Debug)]
pub enum FilesError {
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("http client setup: {0}")]
    Client(#[from] reqwest::Error),
}
