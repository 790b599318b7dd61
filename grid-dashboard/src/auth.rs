//! HTTP Basic authentication for the bot backend
//!
//! The backend guards every `/api/*` route with Basic auth. Credentials are
//! collected from the operator on first use and again whenever a request
//! is rejected with 401. They live only as long as the page does.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use futures::lock::Mutex;

use crate::error::{DashboardError, Result};
use crate::ui::Dialog;

/// Shown before re-prompting after a 401
pub const AUTH_FAILED_MESSAGE: &str = "認證失敗，請重新輸入憑證";

/// Username/password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both parts non-empty
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `Authorization` header value: `Basic base64(username:password)`
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", BASE64.encode(raw.as_bytes()))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Header to attach plus the credential generation it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub header: String,
    pub generation: u64,
}

#[derive(Default)]
struct SessionState {
    credentials: Option<Credentials>,
    /// Bumped every time new credentials are stored
    generation: u64,
}

/// Credential holder shared by every request of one client.
///
/// Prompting happens with the state lock held, so concurrent requests that
/// fail together wait for a single re-authentication and then reuse it.
#[derive(Default)]
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that starts out authenticated
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            state: Mutex::new(SessionState {
                credentials: Some(credentials),
                generation: 1,
            }),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.lock().await;
        state.credentials.as_ref().is_some_and(Credentials::is_complete)
    }

    /// Current credentials, prompting first if none are held
    pub async fn authorize<D: Dialog>(&self, dialog: &D) -> Result<Ticket> {
        let mut state = self.state.lock().await;
        Self::ensure(&mut state, dialog).await
    }

    /// Replace credentials rejected under `stale_generation`.
    ///
    /// If another caller already replaced them, the newer credentials are
    /// returned without prompting.
    pub async fn reauthenticate<D: Dialog>(&self, dialog: &D, stale_generation: u64) -> Result<Ticket> {
        let mut state = self.state.lock().await;
        if state.generation == stale_generation {
            state.credentials = None;
            dialog.notify(AUTH_FAILED_MESSAGE).await;
        }
        Self::ensure(&mut state, dialog).await
    }

    /// Forget credentials issued under `generation` so the next request prompts
    pub async fn invalidate(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.credentials = None;
        }
    }

    async fn ensure<D: Dialog>(state: &mut SessionState, dialog: &D) -> Result<Ticket> {
        if let Some(credentials) = state.credentials.as_ref().filter(|c| c.is_complete()) {
            return Ok(Ticket {
                header: credentials.basic_auth_header(),
                generation: state.generation,
            });
        }

        let credentials = dialog
            .prompt_credentials()
            .await
            .ok_or(DashboardError::AuthCancelled)?;
        state.generation += 1;
        let ticket = Ticket {
            header: credentials.basic_auth_header(),
            generation: state.generation,
        };
        state.credentials = Some(credentials);
        Ok(ticket)
    }
}
