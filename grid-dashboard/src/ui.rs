//! Seams between the client core and whatever renders it
//!
//! The core never touches the DOM directly. The browser layer implements
//! these traits over `web_sys`; tests implement them in memory.

use std::collections::BTreeMap;

use crate::auth::Credentials;

/// Submitted parameter form: field name to raw string value
pub type FormParams = BTreeMap<String, String>;

/// Modal interaction with the operator
#[allow(async_fn_in_trait)] // single-threaded wasm, no Send bound wanted
pub trait Dialog {
    /// Ask for username and password. `None` when the operator cancels.
    async fn prompt_credentials(&self) -> Option<Credentials>;

    /// Show a message and wait until it is acknowledged
    async fn notify(&self, message: &str);
}

/// The display surface the dashboard writes into.
///
/// Methods return `false` when the target element does not exist.
pub trait Page {
    fn has_element(&self, id: &str) -> bool;

    fn set_text(&self, id: &str, text: &str) -> bool;

    /// Overwrite the value of the input control with this id
    fn set_input_value(&self, id: &str, value: &str) -> bool;

    /// Collect a form's named fields, `None` if the form is absent
    fn read_form(&self, form_id: &str) -> Option<FormParams>;
}

/// A submit event whose default navigation can be suppressed
pub trait FormEvent {
    fn prevent_default(&self);
}
