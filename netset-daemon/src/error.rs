use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// External command exited non-zero, wrote to stderr or could not be
    /// spawned. Carries the raw diagnostic text.
    #[error("command failed: {0}")]
    Execution(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
