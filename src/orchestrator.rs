//! Completion orchestrator: turns a submitted draft into one streamed
//! assistant message.

use crate::config::Config;
use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmEvent};
use crate::prompts;
use crate::store::{Message, MessagePatch, MessageStatus, Role, SharedStore};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// How many trailing store entries are considered for the request payload.
const CONTEXT_WINDOW: usize = 10;

/// Drives completion exchanges against the conversation store.
#[derive(Clone)]
pub struct Orchestrator {
    config: Config,
    llm_client: LlmClient,
    store: SharedStore,
}

impl Orchestrator {
    pub fn new(config: Config, store: SharedStore) -> Self {
        let llm_client = LlmClient::new(config.clone());
        Self {
            config,
            llm_client,
            store,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Append the user's draft plus an assistant placeholder, then stream the
    /// completion into the placeholder from a background task. Fire-and-forget:
    /// failures never reach the caller, only the placeholder's final text.
    pub fn submit(&self, draft_text: String, submitted_at: DateTime<Utc>) -> Uuid {
        self.store.append(Message::user(draft_text, submitted_at));

        let placeholder = Message::placeholder(prompts::THINKING);
        let placeholder_id = placeholder.id;
        self.store.append(placeholder);

        let store = self.store.clone();
        let client = self.llm_client.clone();
        let temperature = self.config.temperature;
        let max_tokens = self.config.max_tokens;
        tokio::spawn(async move {
            let recent = store.tail(CONTEXT_WINDOW);
            let request = CompletionRequest::new(build_context(&recent, placeholder_id))
                .with_temperature(temperature)
                .with_max_tokens(max_tokens);

            match client.stream_completion(request).await {
                Ok(mut rx) => drive_stream(&store, placeholder_id, &mut rx).await,
                Err(e) => fail(&store, placeholder_id, &e.to_string()),
            }
        });

        placeholder_id
    }
}

/// Map the recent messages to a role-tagged payload, system instruction
/// first. The in-progress placeholder has no finalized content and must not
/// be echoed back to the model, so it is excluded.
fn build_context(recent: &[Message], placeholder_id: Uuid) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(prompts::SYSTEM_PROMPT)];

    for message in recent {
        match message.role {
            Role::User => messages.push(ChatMessage::user(&message.text)),
            Role::Assistant if message.id != placeholder_id => {
                messages.push(ChatMessage::assistant(&message.text));
            }
            Role::Assistant => {}
        }
    }

    messages
}

/// Reconcile stream events into the placeholder message. Each delta replaces
/// the displayed text with the full accumulated string.
async fn drive_stream(
    store: &SharedStore,
    placeholder_id: Uuid,
    rx: &mut mpsc::Receiver<LlmEvent>,
) {
    let mut accumulated = String::new();

    while let Some(event) = rx.recv().await {
        match event {
            LlmEvent::TextDelta(delta) => {
                accumulated.push_str(&delta);
                store.update(
                    placeholder_id,
                    MessagePatch::text(accumulated.clone()).with_status(MessageStatus::Streaming),
                );
            }
            // Already assembled from the deltas.
            LlmEvent::ResponseComplete(_) => {}
            LlmEvent::StreamComplete => {
                store.update(placeholder_id, MessagePatch::status(MessageStatus::Sent));
                return;
            }
            LlmEvent::Error(error) => {
                fail(store, placeholder_id, &error);
                return;
            }
        }
    }

    // Sender dropped without a terminal event; treat as a clean end.
    store.update(placeholder_id, MessagePatch::status(MessageStatus::Sent));
}

/// Replace the placeholder with the apology text plus the rendered error.
/// Partial streamed content is discarded.
fn fail(store: &SharedStore, placeholder_id: Uuid, error: &str) {
    store.update(
        placeholder_id,
        MessagePatch::text(format!("{} \n\n Error: {}", prompts::APOLOGY, error))
            .with_status(MessageStatus::Sent),
    );
}
