//! Grid Dashboard - browser client for the grid trading bot
//!
//! A WebAssembly dashboard that watches and steers a running grid bot.
//!
//! # Architecture
//! - `client`: authenticated calls to the bot's `/api/*` endpoints
//! - `auth`: Basic credentials, prompted on demand and on 401
//! - `dashboard`: refresh cycle, operator actions, field bindings
//! - `ui`: traits the browser layer implements (page, dialogs)
//! - `web`: DOM / `window.prompt` / console bindings (wasm32 only)
//!
//! # Features
//! - Price, balance, P&L and indicator readout (SMA, RSI, Bollinger bands)
//! - Trading and auto-trading toggles
//! - Manual trade trigger
//! - Live parameter editing
//! - 60-second auto-refresh

#![allow(clippy::doc_markdown)] // Doc style flexibility
#![allow(clippy::float_cmp)] // Exact checks on integral floats when formatting

mod auth;
mod client;
mod config;
pub mod dashboard;
mod error;
mod types;
mod ui;

#[cfg(test)]
mod testing;

#[cfg(target_arch = "wasm32")]
mod web;

pub use auth::{AUTH_FAILED_MESSAGE, Credentials, Session, Ticket};
pub use client::{
    ApiClient, ApiRequest, ApiResponse, DASHBOARD_PATH, EXECUTE_TRADE_PATH, ReqwestTransport,
    TOGGLE_AUTO_TRADING_PATH, TOGGLE_TRADING_PATH, Transport, UPDATE_PARAMS_PATH,
};
pub use config::{AuthRetryPolicy, Config, ConfigSource, DEFAULT_API_BASE};
pub use dashboard::Dashboard;
pub use error::{DashboardError, Result};
pub use types::*;
pub use ui::{Dialog, FormEvent, FormParams, Page};
