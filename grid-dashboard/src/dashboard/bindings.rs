//! Snapshot field to page element bindings
//!
//! One table maps every dashboard field to the element that shows it and
//! the formatter applied on the way. Rendering, startup validation and
//! tests all iterate the same table.

use crate::types::{DashboardSnapshot, TradingParams};
use crate::ui::Page;

/// Text shown for a field the backend omitted or nulled
pub const PLACEHOLDER: &str = "N/A";

pub const TRADING_STATUS_ID: &str = "trading-status";
pub const AUTO_TRADING_STATUS_ID: &str = "auto-trading-status";
pub const ERROR_MESSAGE_ID: &str = "error-message";
pub const LAST_UPDATED_ID: &str = "last-updated";
pub const PARAMS_FORM_ID: &str = "paramsForm";

pub const TOGGLE_TRADING_BUTTON_ID: &str = "toggle-trading";
pub const TOGGLE_AUTO_TRADING_BUTTON_ID: &str = "toggle-auto-trading";
pub const EXECUTE_TRADE_BUTTON_ID: &str = "execute-trade";
pub const REFRESH_BUTTON_ID: &str = "refresh-dashboard";

pub const TRADING_STATUS: Format = Format::Status {
    on: "活躍",
    off: "已停止",
};
pub const AUTO_TRADING_STATUS: Format = Format::Status {
    on: "開啟",
    off: "關閉",
};

/// A raw snapshot value before formatting
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Count(u64),
    Flag(bool),
}

/// How a bound value is turned into display text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `$1234.50`
    Currency,
    /// Fixed-point with this many decimals
    Fixed(usize),
    /// Integer as-is
    Count,
    /// Fraction shown as a percentage with 2 decimals
    Percent,
    /// Boolean mapped to one of two labels
    Status { on: &'static str, off: &'static str },
}

impl Format {
    /// Whether this format is meant for `value`
    pub fn accepts(self, value: FieldValue) -> bool {
        matches!(
            (self, value),
            (Format::Currency | Format::Fixed(_) | Format::Percent, FieldValue::Number(_))
                | (Format::Count, FieldValue::Count(_))
                | (Format::Status { .. }, FieldValue::Flag(_))
        )
    }

    pub fn apply(self, value: FieldValue) -> String {
        debug_assert!(self.accepts(value), "{self:?} cannot render {value:?}");
        match (self, value) {
            (Format::Currency, FieldValue::Number(v)) => format!("${}", to_fixed(v, 2)),
            (Format::Fixed(decimals), FieldValue::Number(v)) => to_fixed(v, decimals),
            (Format::Percent, FieldValue::Number(v)) => format!("{}%", to_fixed(v * 100.0, 2)),
            (Format::Status { on, off }, FieldValue::Flag(flag)) => (if flag { on } else { off }).to_string(),
            (_, FieldValue::Count(n)) => n.to_string(),
            (_, FieldValue::Number(v)) => js_number(v),
            (_, FieldValue::Flag(flag)) => flag.to_string(),
        }
    }

    /// Formatted value, or the placeholder when absent
    pub fn render(self, value: Option<FieldValue>) -> String {
        value.map_or_else(|| PLACEHOLDER.to_string(), |v| self.apply(v))
    }
}

/// One row of the binding table
pub struct Binding {
    pub element_id: &'static str,
    pub format: Format,
    pub read: fn(&DashboardSnapshot) -> Option<FieldValue>,
}

impl Binding {
    pub fn render(&self, snapshot: &DashboardSnapshot) -> String {
        self.format.render((self.read)(snapshot))
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("element_id", &self.element_id)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

pub static SNAPSHOT_BINDINGS: &[Binding] = &[
    Binding {
        element_id: "current-price",
        format: Format::Currency,
        read: |s| s.current_price.map(FieldValue::Number),
    },
    Binding {
        element_id: "total-balance",
        format: Format::Fixed(2),
        read: |s| s.total_balance.map(FieldValue::Number),
    },
    Binding {
        element_id: "free-balance",
        format: Format::Fixed(2),
        read: |s| s.free_balance.map(FieldValue::Number),
    },
    Binding {
        element_id: "pnl",
        format: Format::Fixed(2),
        read: |s| s.pnl.map(FieldValue::Number),
    },
    Binding {
        element_id: "sma",
        format: Format::Fixed(2),
        read: |s| s.sma.map(FieldValue::Number),
    },
    Binding {
        element_id: "rsi",
        format: Format::Fixed(2),
        read: |s| s.rsi.map(FieldValue::Number),
    },
    Binding {
        element_id: "bb-upper",
        format: Format::Fixed(2),
        read: |s| s.bb_upper.map(FieldValue::Number),
    },
    Binding {
        element_id: "bb-middle",
        format: Format::Fixed(2),
        read: |s| s.bb_middle.map(FieldValue::Number),
    },
    Binding {
        element_id: "bb-lower",
        format: Format::Fixed(2),
        read: |s| s.bb_lower.map(FieldValue::Number),
    },
    Binding {
        element_id: "grid-step",
        format: Format::Fixed(4),
        read: |s| s.grid_step.map(FieldValue::Number),
    },
    Binding {
        element_id: "open-orders",
        format: Format::Count,
        read: |s| s.open_orders.map(FieldValue::Count),
    },
    Binding {
        element_id: TRADING_STATUS_ID,
        format: TRADING_STATUS,
        read: |s| s.trading_active.map(FieldValue::Flag),
    },
    Binding {
        element_id: AUTO_TRADING_STATUS_ID,
        format: AUTO_TRADING_STATUS,
        read: |s| s.auto_trading_active.map(FieldValue::Flag),
    },
    Binding {
        element_id: "volatility",
        format: Format::Percent,
        read: |s| s.volatility.map(FieldValue::Number),
    },
];

/// Bound element ids the page does not expose
pub fn missing_elements(page: &impl Page) -> Vec<&'static str> {
    SNAPSHOT_BINDINGS
        .iter()
        .map(|b| b.element_id)
        .chain([ERROR_MESSAGE_ID])
        .filter(|id| !page.has_element(id))
        .collect()
}

/// Write every bound field; absent elements are logged and skipped
pub fn render_snapshot(page: &impl Page, snapshot: &DashboardSnapshot) {
    for binding in SNAPSHOT_BINDINGS {
        if !page.set_text(binding.element_id, &binding.render(snapshot)) {
            log::warn!("Element with id '{}' not found", binding.element_id);
        }
    }
}

/// Overwrite form inputs named after parameter keys.
///
/// Keys without an input are ignored; inputs without a key keep their value.
pub fn sync_params_form(page: &impl Page, params: &TradingParams) {
    for (key, value) in params {
        if !page.set_input_value(key, &param_value_text(value)) {
            log::trace!("no input for parameter '{key}'");
        }
    }
}

/// Text an input shows for a parameter value (JavaScript number printing)
pub fn param_value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(js_number).unwrap_or_default()
            }
        }
        other => other.to_string(),
    }
}

/// Integral floats print without a fractional part, as in JavaScript
fn js_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        (if v > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if v == 0.0 {
        "0".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e21 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

/// `Number.prototype.toFixed`: ties round away from zero.
///
/// `{:.N}` rounds exact binary ties to even (`10.125` -> `10.12`), so the
/// value is expanded exactly and rounded on its first discarded digit.
pub fn to_fixed(v: f64, decimals: usize) -> String {
    if !v.is_finite() || v.abs() >= 1e21 {
        return js_number(v);
    }

    // Every finite f64 has at most 1074 fractional digits
    let exact = format!("{:.1074}", v.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut digits: Vec<u8> = int_part.bytes().chain(frac_part.bytes().take(decimals)).collect();

    if frac_part.as_bytes().get(decimals).is_some_and(|&d| d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let split = digits.len() - decimals;
    let mut text = String::with_capacity(digits.len() + 2);
    if v < 0.0 {
        text.push('-');
    }
    text.extend(digits[..split].iter().map(|&d| char::from(d)));
    if decimals > 0 {
        text.push('.');
        text.extend(digits[split..].iter().map(|&d| char::from(d)));
    }
    text
}
