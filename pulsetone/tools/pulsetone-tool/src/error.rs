use pulsetone_core::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Core(#[from] pulsetone_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0} thread panicked")]
    Thread(&'static str),
}

pub type Result<T> = std::result::Result<T, ToolError>;
