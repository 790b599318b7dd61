//! Browser entry point (wasm32 only)
//!
//! Binds the dashboard to the live document: element writes go through
//! `web_sys`, credentials and confirmations through `window.prompt` /
//! `window.alert`, logs to the developer console.

use std::rc::Rc;

use gloo_timers::future::IntervalStream;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement, Window,
};

use crate::auth::Credentials;
use crate::client::{ApiClient, ReqwestTransport};
use crate::config::{Config, ConfigSource};
use crate::dashboard::{Dashboard, STARTUP_FAILED, report_error};
use crate::dashboard::bindings::{
    EXECUTE_TRADE_BUTTON_ID, PARAMS_FORM_ID, REFRESH_BUTTON_ID, TOGGLE_AUTO_TRADING_BUTTON_ID,
    TOGGLE_TRADING_BUTTON_ID,
};
use crate::ui::{Dialog, FormEvent, FormParams, Page};

type BrowserDashboard = Dashboard<ReqwestTransport, BrowserDialog, DomPage>;

const USERNAME_PROMPT: &str = "請輸入用戶名:";
const PASSWORD_PROMPT: &str = "請輸入密碼:";

/// `Page` over the live document
pub struct DomPage {
    document: Document,
}

impl Page for DomPage {
    fn has_element(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        match self.document.get_element_by_id(id) {
            Some(element) => {
                element.set_text_content(Some(text));
                true
            }
            None => false,
        }
    }

    fn set_input_value(&self, id: &str, value: &str) -> bool {
        let Some(element) = self.document.get_element_by_id(id) else {
            return false;
        };
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else {
            return false;
        }
        true
    }

    fn read_form(&self, form_id: &str) -> Option<FormParams> {
        let form = self
            .document
            .get_element_by_id(form_id)?
            .dyn_into::<HtmlFormElement>()
            .ok()?;
        let elements = form.elements();

        let mut params = FormParams::new();
        for index in 0..elements.length() {
            if let Some((name, value)) = elements.item(index).as_ref().and_then(form_entry) {
                params.insert(name, value);
            }
        }
        Some(params)
    }
}

/// Name/value a control contributes to a submission, as `FormData` would
fn form_entry(element: &Element) -> Option<(String, String)> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        if input.name().is_empty() || input.disabled() {
            return None;
        }
        return match input.type_().as_str() {
            "submit" | "button" | "reset" | "image" | "file" => None,
            "checkbox" | "radio" if !input.checked() => None,
            _ => Some((input.name(), input.value())),
        };
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return (!select.name().is_empty() && !select.disabled()).then(|| (select.name(), select.value()));
    }
    if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        return (!area.name().is_empty() && !area.disabled()).then(|| (area.name(), area.value()));
    }
    None
}

/// Blocking `prompt` / `alert` dialogs
pub struct BrowserDialog {
    window: Window,
}

impl Dialog for BrowserDialog {
    async fn prompt_credentials(&self) -> Option<Credentials> {
        let username = self.window.prompt_with_message(USERNAME_PROMPT).ok().flatten()?;
        let password = self.window.prompt_with_message(PASSWORD_PROMPT).ok().flatten()?;
        Some(Credentials::new(username, password))
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            log::error!("alert failed: {e:?}");
        }
    }
}

impl FormEvent for Event {
    fn prevent_default(&self) {
        Event::prevent_default(self);
    }
}

/// Configuration from `<body data-…>` attributes (`API_BASE` -> `data-api-base`)
struct BodyData(Option<HtmlElement>);

impl ConfigSource for BodyData {
    fn var(&self, key: &str) -> Option<String> {
        let attribute = format!("data-{}", key.to_ascii_lowercase().replace('_', "-"));
        self.0.as_ref()?.get_attribute(&attribute)
    }
}

/// Forwards `log` records to `console.*`
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}: {}", record.level(), record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logging(level: log::LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Module entry point: launch once the document is parsed
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;

    if document.ready_state() != "loading" {
        return launch(window, document);
    }

    let target = document.clone();
    let on_ready = Closure::<dyn FnMut()>::new(move || {
        if let Err(e) = launch(window.clone(), document.clone()) {
            web_sys::console::error_1(&e);
        }
    });
    target.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
    on_ready.forget();
    Ok(())
}

fn launch(window: Window, document: Document) -> Result<(), JsValue> {
    let origin = window.location().origin()?;
    let config = Config::from_source_with_base(&BodyData(document.body()), &origin);
    init_logging(config.log_filter());
    if let Err(e) = config.validate() {
        report_error(&DomPage { document }, STARTUP_FAILED, &e);
        return Err(JsValue::from_str(&e.to_string()));
    }

    let refresh_ms = u32::try_from(config.refresh_interval().as_millis()).unwrap_or(u32::MAX);
    log::info!("dashboard client for {} (refresh every {refresh_ms} ms)", config.api_base);

    let client = ApiClient::new(config, ReqwestTransport::new(), BrowserDialog { window });
    let dashboard = Rc::new(Dashboard::new(client, DomPage { document: document.clone() }));
    dashboard.check_page();

    on_click(&document, TOGGLE_TRADING_BUTTON_ID, &dashboard, |d| async move {
        d.toggle_trading().await;
    })?;
    on_click(&document, TOGGLE_AUTO_TRADING_BUTTON_ID, &dashboard, |d| async move {
        d.toggle_auto_trading().await;
    })?;
    on_click(&document, EXECUTE_TRADE_BUTTON_ID, &dashboard, |d| async move {
        d.execute_trade().await;
    })?;
    if document.get_element_by_id(REFRESH_BUTTON_ID).is_some() {
        on_click(&document, REFRESH_BUTTON_ID, &dashboard, |d| async move {
            d.refresh().await;
        })?;
    }
    on_params_submit(&document, &dashboard)?;

    let runner = Rc::clone(&dashboard);
    spawn_local(async move {
        runner.run(IntervalStream::new(refresh_ms)).await;
    });
    Ok(())
}

fn on_click<F, Fut>(document: &Document, id: &str, dashboard: &Rc<BrowserDashboard>, action: F) -> Result<(), JsValue>
where
    F: Fn(Rc<BrowserDashboard>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let Some(element) = document.get_element_by_id(id) else {
        log::warn!("Element with id '{id}' not found");
        return Ok(());
    };

    let dashboard = Rc::clone(dashboard);
    let handler = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        spawn_local(action(Rc::clone(&dashboard)));
    });
    element.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}

fn on_params_submit(document: &Document, dashboard: &Rc<BrowserDashboard>) -> Result<(), JsValue> {
    let Some(form) = document.get_element_by_id(PARAMS_FORM_ID) else {
        log::warn!("Element with id '{PARAMS_FORM_ID}' not found");
        return Ok(());
    };

    let dashboard = Rc::clone(dashboard);
    let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        // Must happen before the handler returns, the async cycle is too late
        Event::prevent_default(&event);
        let dashboard = Rc::clone(&dashboard);
        spawn_local(async move {
            dashboard.submit_params(&event).await;
        });
    });
    form.add_event_listener_with_callback("submit", handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}
