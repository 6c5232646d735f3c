use thiserror::Error;

/// Errors surfaced by the REST directory client and the room channel.
///
/// Each variant carries enough context to diagnose the failure without
/// needing to inspect the originating error directly.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The server replied with a non-2xx HTTP status code.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// A TCP-level connection could not be established.
    #[error("connection failed to {url}: {detail}")]
    Connect { url: String, detail: String },

    /// Response body could not be parsed as the expected JSON structure.
    #[error("JSON decode error from {url}: {detail}")]
    Decode { url: String, detail: String },

    /// The requested room id is not present in the server's directory.
    #[error("room {0} not found")]
    RoomNotFound(i64),
}
