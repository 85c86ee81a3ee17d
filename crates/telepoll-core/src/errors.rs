/// Core error type.
///
/// Adapter crates map their transport errors into this type so the event loop can treat
/// every fetch failure the same way (log, back off, poll again).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("{method} failed with status {status}: {description}")]
    Api {
        method: String,
        status: u16,
        description: String,
    },

    #[error("no chat is associated with this update")]
    NoChat,

    #[error("update was not triggered by a callback query")]
    NoCallback,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure comes from talking to the remote service.
    ///
    /// The event loop recovers from these by backing off; everything else is a local bug
    /// or misuse that a handler should see as-is.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Decode(_) | Error::Api { .. } | Error::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failures_are_transient() {
        assert!(Error::Transport("timeout".into()).is_transient());
        assert!(Error::Decode("eof".into()).is_transient());
        assert!(Error::Api {
            method: "getUpdates".into(),
            status: 502,
            description: "Bad Gateway".into(),
        }
        .is_transient());
        assert!(!Error::NoChat.is_transient());
        assert!(!Error::Config("x".into()).is_transient());
    }

    #[test]
    fn api_error_mentions_method_and_status() {
        let e = Error::Api {
            method: "sendMessage".into(),
            status: 400,
            description: "Bad Request: chat not found".into(),
        };
        assert_eq!(
            e.to_string(),
            "sendMessage failed with status 400: Bad Request: chat not found"
        );
    }
}
