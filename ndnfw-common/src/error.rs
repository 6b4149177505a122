//! Error types for the ndnfw forwarder.
//!
//! Only setup paths (name parsing, configuration, face registration) return
//! these. The forwarding pipeline itself never propagates an error: policy
//! drops are logged and processing continues with the next packet.

use thiserror::Error;

use crate::types::FaceId;

/// All possible errors that can occur while setting up a forwarder.
#[derive(Error, Debug)]
pub enum Error {
    /// A name URI could not be parsed.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A face could not be registered or looked up.
    #[error("face {0}: {1}")]
    Face(FaceId, String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
