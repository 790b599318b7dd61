//! Trading bot backend API client
//!
//! Implements the bot's dashboard API:
//! - Dashboard snapshot (prices, balances, indicators, parameters)
//! - Trading / auto-trading toggles
//! - Manual trade execution
//! - Parameter updates
//!
//! Every request goes through [`ApiClient::fetch_with_auth`], which attaches
//! Basic credentials and re-prompts on 401.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::Session;
use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::types::{AutoTradingToggle, DashboardSnapshot, ParamsUpdate, TradeExecution, TradingToggle};
use crate::ui::{Dialog, FormParams};

pub const DASHBOARD_PATH: &str = "/api/dashboard";
pub const TOGGLE_TRADING_PATH: &str = "/api/toggle_trading";
pub const TOGGLE_AUTO_TRADING_PATH: &str = "/api/toggle_auto_trading";
pub const EXECUTE_TRADE_PATH: &str = "/api/execute_trade";
pub const UPDATE_PARAMS_PATH: &str = "/api/update_params";

const AUTHORIZATION: &str = "Authorization";

/// Request description, independent of the HTTP stack that sends it
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as JSON and mark the request accordingly
    pub fn json<B: Serialize>(self, body: &B) -> Result<Self> {
        let mut request = self.header("Content-Type", "application/json");
        request.body = Some(serde_json::to_string(body)?);
        Ok(request)
    }

    /// Case-insensitive header lookup (last value wins)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Copy of this request carrying `value` as its only Authorization header
    fn authorized(&self, value: &str) -> Self {
        let mut request = self.clone();
        request.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(AUTHORIZATION));
        request.headers.push((AUTHORIZATION.to_string(), value.to_string()));
        request
    }
}

/// Status and raw body of a backend response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Sends one request. No auth, retries or status interpretation.
#[allow(async_fn_in_trait)] // single-threaded wasm, no Send bound wanted
pub trait Transport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport (browser `fetch` on wasm32)
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse> {
        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}

/// Trading bot API client
pub struct ApiClient<T, D> {
    config: Config,
    transport: T,
    dialog: D,
    session: Session,
}

impl<T: Transport, D: Dialog> ApiClient<T, D> {
    /// Create new client with an empty session
    pub fn new(config: Config, transport: T, dialog: D) -> Self {
        Self {
            config,
            transport,
            dialog,
            session: Session::new(),
        }
    }

    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn dialog(&self) -> &D {
        &self.dialog
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    /// Send `request` with Basic credentials, re-prompting on 401.
    ///
    /// Returns the first non-401 response. Once the retry policy is spent the
    /// credentials are dropped and `Unauthenticated` is returned.
    pub async fn fetch_with_auth(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);
        let mut ticket = self.session.authorize(&self.dialog).await?;
        let mut retries = 0u32;

        loop {
            log::debug!("{} {url}", request.method);
            let response = self.transport.send(&url, &request.authorized(&ticket.header)).await?;
            if !response.is_unauthorized() {
                return Ok(response);
            }

            if !self.config.auth_retry.allows(retries) {
                self.session.invalidate(ticket.generation).await;
                return Err(DashboardError::Unauthenticated { attempts: retries + 1 });
            }

            log::warn!("{} {url} rejected credentials, re-authenticating", request.method);
            ticket = self.session.reauthenticate(&self.dialog, ticket.generation).await?;
            retries += 1;
        }
    }

    /// Get the dashboard snapshot
    pub async fn dashboard(&self) -> Result<DashboardSnapshot> {
        self.call(&ApiRequest::get(DASHBOARD_PATH)).await
    }

    /// Flip the trading flag
    pub async fn toggle_trading(&self) -> Result<TradingToggle> {
        self.call(&ApiRequest::post(TOGGLE_TRADING_PATH)).await
    }

    /// Flip the auto-trading flag
    pub async fn toggle_auto_trading(&self) -> Result<AutoTradingToggle> {
        self.call(&ApiRequest::post(TOGGLE_AUTO_TRADING_PATH)).await
    }

    /// Run one trade cycle on the bot
    pub async fn execute_trade(&self) -> Result<TradeExecution> {
        self.call(&ApiRequest::get(EXECUTE_TRADE_PATH)).await
    }

    /// Submit raw form values; the bot answers with its canonical parameter set
    pub async fn update_params(&self, params: &FormParams) -> Result<ParamsUpdate> {
        self.call(&ApiRequest::post(UPDATE_PARAMS_PATH).json(params)?).await
    }

    async fn call<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R> {
        let response = self.fetch_with_auth(request).await?;
        Self::handle_response(response)
    }

    /// Handle API response, checking for errors
    fn handle_response<R: DeserializeOwned>(response: ApiResponse) -> Result<R> {
        if !response.is_success() {
            return Err(DashboardError::Http { status: response.status });
        }
        serde_json::from_str(&response.body).map_err(DashboardError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AUTH_FAILED_MESSAGE, Credentials};
    use crate::config::AuthRetryPolicy;
    use crate::testing::{FakeDialog, FakeTransport, admin};

    fn client(transport: FakeTransport, dialog: FakeDialog) -> ApiClient<FakeTransport, FakeDialog> {
        ApiClient::new(Config::default(), transport, dialog)
    }

    #[tokio::test]
    async fn test_first_request_prompts_and_attaches_basic_auth() {
        let transport = FakeTransport::new().respond(200, r#"{"message": "Trade executed successfully"}"#);
        let api = client(transport, FakeDialog::with_answers([Some(admin())]));

        let result = api.execute_trade().await.unwrap();

        assert_eq!(result.message, "Trade executed successfully");
        assert_eq!(api.dialog().prompt_count(), 1);
        let sent = api.transport().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://127.0.0.1:8080/api/execute_trade");
        assert_eq!(sent[0].1.method, Method::GET);
        assert_eq!(sent[0].1.header_value("authorization"), Some(admin().basic_auth_header().as_str()));
    }

    #[tokio::test]
    async fn test_caller_authorization_header_is_replaced() {
        let transport = FakeTransport::new().respond(200, "{}");
        let api = client(transport, FakeDialog::new()).with_session(Session::with_credentials(admin()));

        let request = ApiRequest::get("/api/dashboard").header("authorization", "Bearer forged");
        api.fetch_with_auth(&request).await.unwrap();

        let sent = &api.transport().requests()[0].1;
        let auth_headers: Vec<_> = sent
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth_headers.len(), 1);
        assert_eq!(auth_headers[0].1, admin().basic_auth_header());
    }

    #[tokio::test]
    async fn test_401_reprompts_once_and_replays_request() {
        let fresh = Credentials::new("admin", "fresh");
        let transport = FakeTransport::new()
            .respond(401, r#"{"error": "Authentication required"}"#)
            .respond(200, r#"{"new_params": {"GRID_NUMBER": 6.0}}"#);
        let api = client(transport, FakeDialog::with_answers([Some(fresh.clone())]))
            .with_session(Session::with_credentials(Credentials::new("admin", "stale")));

        let params = FormParams::from([("GRID_NUMBER".to_string(), "6".to_string())]);
        let update = api.update_params(&params).await.unwrap();

        assert_eq!(update.new_params["GRID_NUMBER"], serde_json::json!(6.0));
        assert_eq!(api.dialog().prompt_count(), 1);
        assert_eq!(api.dialog().messages(), vec![AUTH_FAILED_MESSAGE.to_string()]);

        let sent = api.transport().requests();
        assert_eq!(sent.len(), 2);
        let (first, second) = (&sent[0].1, &sent[1].1);
        assert_eq!(first.method, second.method);
        assert_eq!(first.body, second.body);
        assert_eq!(first.header_value("content-type"), second.header_value("content-type"));
        assert_ne!(first.header_value("authorization"), second.header_value("authorization"));
        assert_eq!(second.header_value("authorization"), Some(fresh.basic_auth_header().as_str()));
    }

    #[tokio::test]
    async fn test_bounded_retry_surfaces_unauthenticated() {
        let config = Config {
            auth_retry: AuthRetryPolicy::Bounded(1),
            ..Config::default()
        };
        let transport = FakeTransport::new().respond(401, "").respond(401, "");
        let api = ApiClient::new(config, transport, FakeDialog::with_answers([Some(admin()), Some(admin())]));

        let err = api.dashboard().await.unwrap_err();

        assert!(matches!(err, DashboardError::Unauthenticated { attempts: 2 }));
        // Initial prompt plus one re-prompt
        assert_eq!(api.dialog().prompt_count(), 2);
        assert_eq!(api.transport().requests().len(), 2);
        assert!(!api.session().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_default_policy_keeps_prompting() {
        let transport = FakeTransport::new()
            .respond(401, "")
            .respond(401, "")
            .respond(401, "")
            .respond(200, r#"{"trading_active": false}"#);
        let dialog = FakeDialog::with_answers([Some(admin()), Some(admin()), Some(admin())]);
        let api = client(transport, dialog).with_session(Session::with_credentials(admin()));

        let toggle = api.toggle_trading().await.unwrap();

        assert_eq!(toggle.trading_active, Some(false));
        assert_eq!(api.dialog().prompt_count(), 3);
        assert_eq!(api.dialog().messages().len(), 3);
        assert_eq!(api.transport().requests().len(), 4);
    }

    #[tokio::test]
    async fn test_server_error_never_prompts() {
        let transport = FakeTransport::new().respond(500, r#"{"error": "exchange down"}"#);
        let api = client(transport, FakeDialog::new()).with_session(Session::with_credentials(admin()));

        let err = api.dashboard().await.unwrap_err();

        assert!(matches!(err, DashboardError::Http { status: 500 }));
        assert_eq!(err.to_string(), "HTTP error! status: 500");
        assert_eq!(api.dialog().prompt_count(), 0);
        assert!(api.dialog().messages().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_prompt_sends_nothing() {
        let api = client(FakeTransport::new(), FakeDialog::with_answers([None]));

        let err = api.toggle_auto_trading().await.unwrap_err();

        assert!(matches!(err, DashboardError::AuthCancelled));
        assert!(api.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_params_sends_exact_json_body() {
        let transport = FakeTransport::new().respond(200, r#"{"new_params": {}}"#);
        let api = client(transport, FakeDialog::new()).with_session(Session::with_credentials(admin()));

        let params = FormParams::from([
            ("grid_step".to_string(), "0.01".to_string()),
            ("rsi_period".to_string(), "14".to_string()),
        ]);
        api.update_params(&params).await.unwrap();

        let (url, sent) = &api.transport().requests()[0];
        assert_eq!(url, "http://127.0.0.1:8080/api/update_params");
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.header_value("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"grid_step": "0.01", "rsi_period": "14"}));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let transport = FakeTransport::new().respond(200, "<html>oops</html>");
        let api = client(transport, FakeDialog::new()).with_session(Session::with_credentials(admin()));

        assert!(matches!(api.dashboard().await, Err(DashboardError::Json(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_passes_through() {
        let transport = FakeTransport::new().fail("Failed to fetch");
        let api = client(transport, FakeDialog::new()).with_session(Session::with_credentials(admin()));

        let err = api.execute_trade().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch");
    }
}
