use crate::app::App;
use crate::error::{AppError, Result};
use crate::surfaces::assistant::{ChatMessage, ChatRole};

/// Sends one prompt, prints the reply and saves whatever the reply changed.
pub async fn ask(app: &App, prompt: &str) -> Result<()> {
    let seen = app.assistant.transcript().len();
    app.assistant.submit(prompt).await;

    let transcript = app.assistant.transcript();
    let reply = transcript.iter().skip(seen).rev().find(|m| m.role != ChatRole::User);
    match reply {
        Some(ChatMessage {
            role: ChatRole::Assistant,
            content,
        }) => {
            println!("{content}");
            app.store().save_current()
        }
        Some(ChatMessage { content, .. }) => Err(AppError::Assistant(content.clone())),
        None => Err(AppError::Validation("prompt is empty".into())),
    }
}
