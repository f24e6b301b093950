//! Remote account metadata.
//!
//! The metadata check asks the server who the configured account is and how
//! much credit it holds. The wire format is owned by the remote service; this
//! module only maps its JSON into `AccountInfo`.

pub mod client;
pub mod types;

pub use client::{MetadataSource, RestMetadataClient};
pub use types::{AccountInfo, MetadataError, MetadataResult};
