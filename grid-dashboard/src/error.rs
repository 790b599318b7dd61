//! Error types for the dashboard client
//!
//! Uses thiserror for ergonomic error definitions.
//! Every failure is caught at the boundary of the cycle that raised it
//! and rendered into the page's error banner; nothing here panics.

use thiserror::Error;

/// Custom Result type using our Error
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Dashboard client errors
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operator dismissed the credential prompt
    #[error("認證已取消")]
    AuthCancelled,

    /// Backend kept answering 401 after the retry budget was spent
    #[error("認證失敗 ({attempts} attempts)")]
    Unauthenticated { attempts: u32 },

    /// Non-2xx, non-401 response
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// Network / transport failures
    #[error("{0}")]
    Transport(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required page element is absent
    #[error("Element with id '{0}' not found")]
    MissingElement(String),
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Transport(err.to_string())
    }
}
