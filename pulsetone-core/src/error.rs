use thiserror::Error;

/// Failure reported by an audio or vibration sink implementation.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink rejected request: {0}")]
    Rejected(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("sink unavailable: {0}")]
    SinkUnavailable(#[from] SinkError),
    #[error("not initialized: {0}")]
    NotInitialized(&'static str),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_errors_become_sink_unavailable() {
        fn fails() -> Result<()> {
            let sink_result: std::result::Result<(), SinkError> = Err(SinkError::Rejected("no motor".into()));
            sink_result?;
            Ok(())
        }

        match fails() {
            Err(Error::SinkUnavailable(SinkError::Rejected(message))) => assert_eq!(message, "no motor"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn messages() {
        assert_eq!(Error::invalid("frequency must be positive").to_string(), "invalid argument: frequency must be positive");
        assert_eq!(Error::NotInitialized("vibrator").to_string(), "not initialized: vibrator");
    }
}
