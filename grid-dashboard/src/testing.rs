//! In-memory fakes for the client's seams (test builds only)

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use crate::auth::Credentials;
use crate::client::{ApiRequest, ApiResponse, Transport};
use crate::error::{DashboardError, Result};
use crate::ui::{Dialog, FormEvent, FormParams, Page};

pub fn admin() -> Credentials {
    Credentials::new("admin", "password")
}

/// Scripted backend: answers requests in order, records what was sent
#[derive(Default)]
pub struct FakeTransport {
    responses: RefCell<VecDeque<Result<ApiResponse>>>,
    requests: RefCell<Vec<(String, ApiRequest)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses.borrow_mut().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(DashboardError::Transport(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<(String, ApiRequest)> {
        self.requests.borrow().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(_, r)| r.path.clone()).collect()
    }
}

impl Transport for FakeTransport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.borrow_mut().push((url.to_string(), request.clone()));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(DashboardError::Transport("no scripted response".into())))
    }
}

/// Operator stand-in: hands out queued answers, cancels once they run out
#[derive(Default)]
pub struct FakeDialog {
    answers: RefCell<VecDeque<Option<Credentials>>>,
    prompts: Cell<u32>,
    messages: RefCell<Vec<String>>,
    yield_on_prompt: bool,
}

impl FakeDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: impl IntoIterator<Item = Option<Credentials>>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Suspend once inside every prompt so concurrent callers can interleave
    pub fn yielding(mut self) -> Self {
        self.yield_on_prompt = true;
        self
    }

    pub fn prompt_count(&self) -> u32 {
        self.prompts.get()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Dialog for FakeDialog {
    async fn prompt_credentials(&self) -> Option<Credentials> {
        self.prompts.set(self.prompts.get() + 1);
        if self.yield_on_prompt {
            tokio::task::yield_now().await;
        }
        self.answers.borrow_mut().pop_front().flatten()
    }

    async fn notify(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Element id -> text / input value, plus named forms
#[derive(Default)]
pub struct FakePage {
    texts: RefCell<HashMap<String, String>>,
    inputs: RefCell<HashMap<String, String>>,
    forms: HashMap<String, FormParams>,
}

impl FakePage {
    /// Page exposing empty text elements with these ids
    pub fn with_elements<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            texts: RefCell::new(ids.into_iter().map(|id| (id.to_string(), String::new())).collect()),
            ..Self::default()
        }
    }

    pub fn with_input(self, id: &str, value: &str) -> Self {
        self.inputs.borrow_mut().insert(id.to_string(), value.to_string());
        self
    }

    pub fn with_form(mut self, id: &str, fields: &[(&str, &str)]) -> Self {
        let params = fields.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        self.forms.insert(id.to_string(), params);
        self
    }

    pub fn text(&self, id: &str) -> Option<String> {
        self.texts.borrow().get(id).cloned()
    }

    pub fn input(&self, id: &str) -> Option<String> {
        self.inputs.borrow().get(id).cloned()
    }
}

impl Page for FakePage {
    fn has_element(&self, id: &str) -> bool {
        self.texts.borrow().contains_key(id) || self.inputs.borrow().contains_key(id)
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        match self.texts.borrow_mut().get_mut(id) {
            Some(slot) => {
                *slot = text.to_string();
                true
            }
            None => false,
        }
    }

    fn set_input_value(&self, id: &str, value: &str) -> bool {
        match self.inputs.borrow_mut().get_mut(id) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }

    fn read_form(&self, form_id: &str) -> Option<FormParams> {
        self.forms.get(form_id).cloned()
    }
}

/// Submit event that remembers whether its default action was suppressed
#[derive(Default)]
pub struct FakeSubmit {
    prevented: Cell<bool>,
}

impl FakeSubmit {
    pub fn was_prevented(&self) -> bool {
        self.prevented.get()
    }
}

impl FormEvent for FakeSubmit {
    fn prevent_default(&self) {
        self.prevented.set(true);
    }
}
