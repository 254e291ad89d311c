use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApertiumError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Installation error: {0}")]
    Install(String),

    #[error("Pipeline {pair} exited with {code:?}: {stderr}")]
    Pipeline {
        pair: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Pipeline {pair} did not finish within {secs}s")]
    Timeout { pair: String, secs: u64 },
}

pub type Result<T> = std::result::Result<T, ApertiumError>;
