//! Error types for the push channel.

use thiserror::Error;

/// Errors surfaced when constructing a channel manager. Runtime transport
/// failures are never surfaced as errors; they feed the reconnect loop.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// The configured origin is not an http(s)/ws(s) URL.
    #[error("invalid origin '{0}': expected an http, https, ws or wss URL")]
    InvalidOrigin(String),

    /// The configured channel path does not start with '/'.
    #[error("invalid channel path '{0}': must start with '/'")]
    InvalidPath(String),
}
