use std::error::Error as _;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single answer-generation call.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty response from model '{model}'")]
    EmptyResponse { model: String },

    #[error("model did not answer within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Connection faults (refused, reset, dropped before the reply), timeouts,
    /// 429 and 5xx are transient. Other 4xx (unknown model, oversized prompt),
    /// undecodable bodies and cancellation are terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) if e.is_decode() => false,
            Self::Http(e) => {
                e.is_connect()
                    || e.is_timeout()
                    || e.is_request()
                    || (e.is_body() && connection_dropped(e))
            }
            Self::Server { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout(_) => true,
            Self::Json(_) | Self::EmptyResponse { .. } | Self::Cancelled => false,
        }
    }
}

/// Whether the error chain bottoms out in a socket the peer tore down.
fn connection_dropped(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<io::Error>()
            && matches!(
                io.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        {
            return true;
        }
        source = e.source();
    }
    false
}
