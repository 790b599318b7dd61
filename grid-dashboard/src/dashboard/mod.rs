//! Dashboard module - refresh cycle and operator actions
//!
//! # Architecture
//! - `bindings.rs`: snapshot field -> element table, formatters, form sync
//! - `mod.rs`: the [`Dashboard`] controller driving the page
//!
//! # Cycles
//! - Scheduled refresh of the snapshot (default every 60 seconds)
//! - Toggle trading / toggle auto-trading
//! - Manual trade execution (followed by a refresh)
//! - Parameter form submission
//!
//! Every cycle handles its own failure by writing the shared error banner.
//! Cycles never return errors and never block one another.

pub mod bindings;

use futures::{Stream, StreamExt};

use crate::client::{ApiClient, Transport};
use crate::error::DashboardError;
use crate::types::DashboardSnapshot;
use crate::ui::{Dialog, FormEvent, Page};

use bindings::{AUTO_TRADING_STATUS, AUTO_TRADING_STATUS_ID, FieldValue, TRADING_STATUS, TRADING_STATUS_ID};

const FETCH_FAILED: &str = "獲取數據失敗";
const TOGGLE_TRADING_FAILED: &str = "切換交易狀態失敗";
const TOGGLE_AUTO_TRADING_FAILED: &str = "切換自動交易狀態失敗";
const EXECUTE_TRADE_FAILED: &str = "執行交易失敗";
const UPDATE_PARAMS_FAILED: &str = "更新參數失敗";
pub const STARTUP_FAILED: &str = "啟動失敗";

const TRADING_STARTED: &str = "交易已啟動";
const TRADING_STOPPED: &str = "交易已停止";
const AUTO_TRADING_STARTED: &str = "自動交易已啟動";
const AUTO_TRADING_STOPPED: &str = "自動交易已停止";
const PARAMS_UPDATED: &str = "參數更新成功";

/// Controller binding one API client to one page
pub struct Dashboard<T, D, P> {
    client: ApiClient<T, D>,
    page: P,
}

impl<T: Transport, D: Dialog, P: Page> Dashboard<T, D, P> {
    pub fn new(client: ApiClient<T, D>, page: P) -> Self {
        Self { client, page }
    }

    pub fn client(&self) -> &ApiClient<T, D> {
        &self.client
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Log every bound element the page lacks. Rendering tolerates them.
    pub fn check_page(&self) -> Vec<&'static str> {
        let missing = bindings::missing_elements(&self.page);
        for id in &missing {
            log::warn!("Element with id '{id}' not found");
        }
        missing
    }

    /// Refresh immediately, then once per tick until the stream ends
    pub async fn run(&self, ticks: impl Stream<Item = ()>) {
        let mut ticks = std::pin::pin!(ticks);
        self.refresh().await;
        while ticks.next().await.is_some() {
            self.refresh().await;
        }
    }

    /// Fetch one snapshot and reflect it into the page
    pub async fn refresh(&self) {
        match self.client.dashboard().await {
            Ok(snapshot) => self.apply_snapshot(&snapshot),
            Err(e) => self.report(FETCH_FAILED, &e),
        }
    }

    /// Render a snapshot and sync the parameter form from it
    pub fn apply_snapshot(&self, snapshot: &DashboardSnapshot) {
        bindings::render_snapshot(&self.page, snapshot);
        bindings::sync_params_form(&self.page, &snapshot.trading_params);

        if self.page.has_element(bindings::LAST_UPDATED_ID) {
            let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            self.page.set_text(bindings::LAST_UPDATED_ID, &stamp);
        }
    }

    pub async fn toggle_trading(&self) {
        match self.client.toggle_trading().await {
            Ok(toggle) => {
                let text = TRADING_STATUS.render(toggle.trading_active.map(FieldValue::Flag));
                self.set_text(TRADING_STATUS_ID, &text);
                let message = if toggle.trading_active.unwrap_or(false) {
                    TRADING_STARTED
                } else {
                    TRADING_STOPPED
                };
                self.client.dialog().notify(message).await;
            }
            Err(e) => self.report(TOGGLE_TRADING_FAILED, &e),
        }
    }

    pub async fn toggle_auto_trading(&self) {
        match self.client.toggle_auto_trading().await {
            Ok(toggle) => {
                let text = AUTO_TRADING_STATUS.render(toggle.auto_trading_active.map(FieldValue::Flag));
                self.set_text(AUTO_TRADING_STATUS_ID, &text);
                let message = if toggle.auto_trading_active.unwrap_or(false) {
                    AUTO_TRADING_STARTED
                } else {
                    AUTO_TRADING_STOPPED
                };
                self.client.dialog().notify(message).await;
            }
            Err(e) => self.report(TOGGLE_AUTO_TRADING_FAILED, &e),
        }
    }

    /// Run one trade cycle, show the bot's answer, then refresh
    pub async fn execute_trade(&self) {
        match self.client.execute_trade().await {
            Ok(execution) => {
                self.client.dialog().notify(&execution.message).await;
                self.refresh().await;
            }
            Err(e) => self.report(EXECUTE_TRADE_FAILED, &e),
        }
    }

    /// Handle a submit of the parameter form.
    ///
    /// The browser's own submission is always suppressed first. On success
    /// the form is rewritten from the bot's canonical parameters.
    pub async fn submit_params(&self, event: &impl FormEvent) {
        event.prevent_default();

        let Some(params) = self.page.read_form(bindings::PARAMS_FORM_ID) else {
            let err = DashboardError::MissingElement(bindings::PARAMS_FORM_ID.to_string());
            self.report(UPDATE_PARAMS_FAILED, &err);
            return;
        };

        match self.client.update_params(&params).await {
            Ok(update) => {
                self.client.dialog().notify(PARAMS_UPDATED).await;
                bindings::sync_params_form(&self.page, &update.new_params);
            }
            Err(e) => self.report(UPDATE_PARAMS_FAILED, &e),
        }
    }

    fn set_text(&self, id: &str, text: &str) {
        if !self.page.set_text(id, text) {
            log::warn!("Element with id '{id}' not found");
        }
    }

    fn report(&self, context: &str, err: &DashboardError) {
        report_error(&self.page, context, err);
    }
}

/// Write the error banner (last message wins)
pub fn report_error(page: &impl Page, context: &str, err: &DashboardError) {
    let message = format!("{context}: {err}");
    log::error!("{message}");
    if !page.set_text(bindings::ERROR_MESSAGE_ID, &message) {
        log::error!("Error message element not found: {message}");
    }
}
