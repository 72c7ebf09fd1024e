use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::Surface;
use crate::bus::Topic;
use crate::project::{ProjectRecord, ProjectStore};
use crate::services::AssistantBackend;
use crate::templates;

pub const THINKING_MESSAGE: &str = "Thinking...";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AssistantState {
    Idle,
    AwaitingResponse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    fn is_thinking(&self) -> bool {
        self.role == ChatRole::System && self.content == THINKING_MESSAGE
    }
}

/// Chat panel in front of the assistant backend.
pub struct AssistantSurface {
    store: Rc<ProjectStore>,
    backend: Rc<dyn AssistantBackend>,
    transcript: RefCell<Vec<ChatMessage>>,
    in_flight: Cell<usize>,
    project_name: RefCell<String>,
}

impl AssistantSurface {
    pub fn new(store: Rc<ProjectStore>, backend: Rc<dyn AssistantBackend>) -> Rc<Self> {
        Rc::new(Self {
            store,
            backend,
            transcript: RefCell::new(vec![ChatMessage::new(
                ChatRole::System,
                templates::assistant_intro(),
            )]),
            in_flight: Cell::new(0),
            project_name: RefCell::new(String::new()),
        })
    }

    pub fn state(&self) -> AssistantState {
        if self.in_flight.get() > 0 {
            AssistantState::AwaitingResponse
        } else {
            AssistantState::Idle
        }
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.borrow().clone()
    }

    /// Name of the project the chat is currently about.
    pub fn project_name(&self) -> String {
        self.project_name.borrow().clone()
    }

    /// Sends one prompt. The reply's patch, if any, lands on whatever
    /// project is current when the reply arrives.
    ///
    /// Overlapping submissions are not serialized: each resolves on its
    /// own and the last one to finish is the last one visible.
    pub async fn submit(&self, prompt: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return;
        }

        self.push(ChatRole::User, prompt);
        self.push(ChatRole::System, THINKING_MESSAGE);
        self.in_flight.set(self.in_flight.get() + 1);

        let context = self.store.snapshot();
        let result = self.backend.respond(prompt, &context).await;

        self.remove_thinking();
        self.in_flight.set(self.in_flight.get().saturating_sub(1));

        match result {
            Ok(reply) => {
                self.push(ChatRole::Assistant, reply.message);
                if let Some(patch) = reply.patch {
                    if self.store.apply_patch(&patch) {
                        tracing::info!("applied assistant patch");
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "assistant request failed");
                self.push(ChatRole::System, format!("Error: {e}"));
            }
        }
    }

    fn push(&self, role: ChatRole, content: impl Into<String>) {
        self.transcript.borrow_mut().push(ChatMessage::new(role, content));
    }

    fn remove_thinking(&self) {
        let mut transcript = self.transcript.borrow_mut();
        if let Some(pos) = transcript.iter().position(ChatMessage::is_thinking) {
            transcript.remove(pos);
        }
    }
}

impl Surface for AssistantSurface {
    fn name(&self) -> &'static str {
        "assistant"
    }

    fn topics(&self) -> &'static [Topic] {
        &[Topic::ProjectChanged]
    }

    fn render(&self, project: &ProjectRecord) {
        if *self.project_name.borrow() != project.name {
            *self.project_name.borrow_mut() = project.name.clone();
        }
    }
}
