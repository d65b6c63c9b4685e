//! Failures of a single poll against the node's info endpoint.

/// Why a poll produced no snapshots.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Endpoint unreachable, connection dropped, or the request timed out.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Body is not the expected JSON shape.
    #[error("cannot decode response ({source}): {body}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The fetch worker is no longer running.
    #[error("fetch worker stopped")]
    WorkerGone,
}

/// Terminal failures, split by whether the dashboard ever came up.
#[derive(Debug, thiserror::Error)]
pub enum UiError {
    /// Raw mode, alternate screen or backend could not be set up.
    #[error("cannot start terminal display: {0}")]
    Startup(#[source] std::io::Error),

    /// Drawing or reading input failed while the dashboard was running.
    #[error("terminal display failed while running: {0}")]
    Session(#[source] std::io::Error),
}
