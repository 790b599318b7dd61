//! Wire types for the trading bot backend
//!
//! Every field the bot may omit or null out is optional; rendering decides
//! what an absent value looks like.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Trading parameters as the backend reports them (name -> JSON value)
pub type TradingParams = BTreeMap<String, serde_json::Value>;

/// `GET /api/dashboard`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub total_balance: Option<f64>,
    #[serde(default)]
    pub free_balance: Option<f64>,
    #[serde(default)]
    pub pnl: Option<f64>,
    #[serde(default)]
    pub sma: Option<f64>,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub bb_upper: Option<f64>,
    #[serde(default)]
    pub bb_middle: Option<f64>,
    #[serde(default)]
    pub bb_lower: Option<f64>,
    #[serde(default)]
    pub grid_step: Option<f64>,
    #[serde(default)]
    pub open_orders: Option<u64>,
    #[serde(default)]
    pub trading_active: Option<bool>,
    #[serde(default)]
    pub auto_trading_active: Option<bool>,
    /// Fraction, e.g. 0.0567 for 5.67%
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub trading_params: TradingParams,
}

/// `POST /api/toggle_trading`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingToggle {
    #[serde(default)]
    pub trading_active: Option<bool>,
}

/// `POST /api/toggle_auto_trading`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoTradingToggle {
    #[serde(default)]
    pub auto_trading_active: Option<bool>,
}

/// `GET /api/execute_trade`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExecution {
    pub message: String,
}

/// `POST /api/update_params`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamsUpdate {
    #[serde(default)]
    pub message: Option<String>,
    pub new_params: TradingParams,
}
