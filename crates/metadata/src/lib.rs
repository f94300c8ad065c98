pub mod cipher;
pub mod provider;
pub mod showbox;

use thiserror::Error;

pub use cipher::{CipherCodec, CipherError, CipherKeys};
pub use provider::{DEFAULT_PAGE_LIMIT, MetadataProvider};
pub use showbox::{DeviceProfile, MetadataConfig, ShowboxClient};

/// Failure while constructing a metadata client.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("cipher setup: {0}")]
    Cipher(#[from] CipherError),
    #[error("http client setup: {0}")]
    Client(#[from] reqwest::Error),
}
