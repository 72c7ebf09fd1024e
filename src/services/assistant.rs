use futures_util::future::{FutureExt, LocalBoxFuture};
use serde::Serialize;
use std::time::Duration;

use crate::error::Result;
use crate::project::{DocumentSnapshot, Patch};

/// What the assistant collaborator hands back for one prompt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssistantReply {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Patch>,
}

/// The model behind the assistant panel. Failures are reported to the
/// transcript by the caller and never touch the project.
pub trait AssistantBackend {
    fn respond<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a DocumentSnapshot,
    ) -> LocalBoxFuture<'a, Result<AssistantReply>>;
}

// ── Keyword rules ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
pub enum Trigger {
    AllOf(&'static [&'static str]),
    AnyOf(&'static [&'static str]),
}

impl Trigger {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Trigger::AllOf(words) => words.iter().all(|w| lowered.contains(w)),
            Trigger::AnyOf(words) => words.iter().any(|w| lowered.contains(w)),
        }
    }
}

#[derive(Clone, Copy)]
pub struct KeywordRule {
    pub name: &'static str,
    pub trigger: Trigger,
    build: fn(&DocumentSnapshot) -> AssistantReply,
}

impl KeywordRule {
    pub fn matches(&self, prompt: &str) -> bool {
        self.trigger.matches(&prompt.to_lowercase())
    }

    pub fn reply(&self, context: &DocumentSnapshot) -> AssistantReply {
        (self.build)(context)
    }
}

pub const FALLBACK_MESSAGE: &str = "I'm not sure how to help with that specific request. Could you try asking for something like adding a button, creating a header, or implementing a click handler?";

/// The canned rules in priority order. Overlapping prompts resolve to the
/// first match, so the specific button rule must stay ahead of the
/// generic header rule.
pub fn canned_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule {
            name: "red-button",
            trigger: Trigger::AllOf(&["red button", "hello"]),
            build: red_button,
        },
        KeywordRule {
            name: "click-handler",
            trigger: Trigger::AllOf(&["click", "handler"]),
            build: click_handler,
        },
        KeywordRule {
            name: "header",
            trigger: Trigger::AnyOf(&["header", "heading"]),
            build: gradient_header,
        },
    ]
}

pub fn match_rule<'r>(rules: &'r [KeywordRule], prompt: &str) -> Option<&'r KeywordRule> {
    let lowered = prompt.to_lowercase();
    rules.iter().find(|rule| rule.trigger.matches(&lowered))
}

pub fn canned_reply(
    rules: &[KeywordRule],
    prompt: &str,
    context: &DocumentSnapshot,
) -> AssistantReply {
    match match_rule(rules, prompt) {
        Some(rule) => rule.reply(context),
        None => AssistantReply {
            message: FALLBACK_MESSAGE.to_string(),
            patch: None,
        },
    }
}

fn red_button(ctx: &DocumentSnapshot) -> AssistantReply {
    AssistantReply {
        message: "I'll add a red button that says 'Hello' to your HTML and style it with CSS."
            .into(),
        patch: Some(Patch {
            html: Some(ctx.html.replacen(
                "</body>",
                "  <button id=\"hello-button\">Hello</button>\n</body>",
                1,
            )),
            css: Some(format!(
                "{}\n\n#hello-button {{\n  background-color: red;\n  color: white;\n  padding: 10px 20px;\n  border: none;\n  border-radius: 5px;\n  font-size: 16px;\n  cursor: pointer;\n}}\n\n#hello-button:hover {{\n  background-color: darkred;\n}}",
                ctx.css
            )),
            js: None,
        }),
    }
}

const DOM_READY_OPENER: &str = "document.addEventListener(\"DOMContentLoaded\", function() {";

fn click_handler(ctx: &DocumentSnapshot) -> AssistantReply {
    let handler = format!(
        "{DOM_READY_OPENER}\n  // Add click handler to button\n  const button = document.getElementById(\"hello-button\");\n  if (button) {{\n    button.addEventListener(\"click\", function() {{\n      console.log(\"Button clicked!\");\n    }});\n  }}"
    );
    AssistantReply {
        message:
            "I'll add a click event handler to the button that logs a message to the console."
                .into(),
        patch: Some(Patch {
            js: Some(ctx.js.replacen(DOM_READY_OPENER, &handler, 1)),
            ..Default::default()
        }),
    }
}

fn gradient_header(ctx: &DocumentSnapshot) -> AssistantReply {
    AssistantReply {
        message: "I'll add a header with a gradient background to your page.".into(),
        patch: Some(Patch {
            html: Some(ctx.html.replacen(
                "<body>",
                "<body>\n  <header>\n    <h1>My Awesome Web App</h1>\n  </header>",
                1,
            )),
            css: Some(format!(
                "{}\n\nheader {{\n  background: linear-gradient(to right, #4a86e8, #6d9eeb);\n  padding: 20px;\n  color: white;\n  text-align: center;\n  box-shadow: 0 2px 5px rgba(0,0,0,0.2);\n}}",
                ctx.css
            )),
            js: None,
        }),
    }
}

// ── Canned backend ──────────────────────────────────────────────────────────

/// Offline assistant answering from [`canned_rules`] after a short delay.
pub struct CannedAssistant {
    rules: Vec<KeywordRule>,
    delay: Duration,
}

impl CannedAssistant {
    pub fn new(delay: Duration) -> Self {
        Self {
            rules: canned_rules(),
            delay,
        }
    }
}

impl AssistantBackend for CannedAssistant {
    fn respond<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a DocumentSnapshot,
    ) -> LocalBoxFuture<'a, Result<AssistantReply>> {
        async move {
            tokio::time::sleep(self.delay).await;
            let reply = canned_reply(&self.rules, prompt, context);
            tracing::debug!(
                rule = match_rule(&self.rules, prompt).map(|r| r.name).unwrap_or("fallback"),
                "assistant reply ready"
            );
            Ok(reply)
        }
        .boxed_local()
    }
}
