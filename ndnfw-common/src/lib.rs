//! Common types and utilities for the ndnfw forwarder.
//!
//! This crate holds the packet model (names, Interests, Data), face
//! identifiers, the shared error type and the forwarding counters. It has no
//! knowledge of the forwarding tables themselves.

pub mod ndn;
pub mod metrics;
pub mod types;
pub mod error;

/// Reexport of common types
pub use error::Error;
pub use ndn::{Data, Incoming, Interest, Name, NameComponent, NdnPacket};
pub use types::FaceId;
pub type Result<T> = std::result::Result<T, Error>;
