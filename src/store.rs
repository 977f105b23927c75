//! Conversation store: the ordered message log and its mutation surface.
//!
//! The store is the sole owner of conversation state. Everything else reads
//! snapshots and funnels mutations through [`SharedStore`], which keeps the
//! single-writer discipline intact when streaming tasks update messages from
//! other tasks.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Delivery state of a message. Transitions move forward only;
/// the variant order is the transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageStatus {
    Pending,
    Streaming,
    Sent,
}

/// A single entry in the conversation log.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            status,
            created_at: Utc::now(),
        }
    }

    /// A user message, already sent, timestamped by the caller.
    pub fn user(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            ..Self::new(Role::User, text, MessageStatus::Sent)
        }
    }

    /// A completed assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text, MessageStatus::Sent)
    }

    /// An assistant placeholder awaiting streamed content.
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text, MessageStatus::Pending)
    }
}

/// Field changes applied by [`ConversationStore::update`]. Only `text` and
/// `status` are mutable; identity, role and timestamp never change.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub text: Option<String>,
    pub status: Option<MessageStatus>,
}

impl MessagePatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            status: None,
        }
    }

    pub fn status(status: MessageStatus) -> Self {
        Self {
            text: None,
            status: Some(status),
        }
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Ordered, append-only message log with in-place updates by id.
pub struct ConversationStore {
    messages: Vec<Message>,
    revision: watch::Sender<u64>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            messages: Vec::new(),
            revision,
        }
    }

    /// Add a message at the end of the log. Callers must not reuse ids.
    pub fn append(&mut self, message: Message) {
        debug_assert!(
            !self.messages.iter().any(|m| m.id == message.id),
            "duplicate message id appended"
        );
        self.messages.push(message);
        self.bump();
    }

    /// Apply the patch to the message with the given id, in place. A missing
    /// id is a silent no-op, and a backward status transition is ignored.
    pub fn update(&mut self, id: Uuid, patch: MessagePatch) {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return;
        };
        if let Some(text) = patch.text {
            message.text = text;
        }
        if let Some(status) = patch.status {
            if status > message.status {
                message.status = status;
            }
        }
        self.bump();
    }

    /// The last `n` messages in original order, recomputed per call.
    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Owned copy of the full log, for rendering.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Revision counter that ticks on every mutation. Observers redraw when
    /// it changes; no presentation type leaks into the store.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Clonable handle that serializes all store access through one mutex,
/// so streaming tasks and the UI task share one logical writer.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<ConversationStore>>,
}

impl SharedStore {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn append(&self, message: Message) {
        self.lock().append(message);
    }

    pub fn update(&self, id: Uuid, patch: MessagePatch) {
        self.lock().update(id, patch);
    }

    pub fn tail(&self, n: usize) -> Vec<Message> {
        self.lock().tail(n).to_vec()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.lock().subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ConversationStore> {
        self.inner.lock().expect("conversation store lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store(n: usize) -> ConversationStore {
        let mut store = ConversationStore::new();
        for i in 0..n {
            store.append(Message::user(format!("message {i}"), Utc::now()));
        }
        store
    }

    #[test]
    fn append_preserves_insertion_order() {
        let store = seeded_store(5);
        assert_eq!(store.len(), 5);
        assert!(!store.is_empty());
        let texts: Vec<_> = store.snapshot().iter().map(|m| m.text.clone()).collect();
        assert_eq!(
            texts,
            ["message 0", "message 1", "message 2", "message 3", "message 4"]
        );
    }

    #[test]
    fn update_changes_text_and_status_in_place() {
        let mut store = seeded_store(3);
        let placeholder = Message::placeholder("thinking...");
        let id = placeholder.id;
        store.append(placeholder);

        store.update(id, MessagePatch::text("Hello").with_status(MessageStatus::Streaming));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 4);
        // Position is stable: the updated message is still last.
        assert_eq!(snapshot[3].id, id);
        assert_eq!(snapshot[3].text, "Hello");
        assert_eq!(snapshot[3].status, MessageStatus::Streaming);
    }

    #[test]
    fn update_with_unknown_id_is_a_noop() {
        let mut store = seeded_store(2);
        let before = store.snapshot();

        store.update(Uuid::new_v4(), MessagePatch::text("never lands"));

        let after = store.snapshot();
        assert_eq!(after.len(), before.len());
        for (a, b) in after.iter().zip(before.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn repeated_updates_never_move_a_message() {
        let mut store = seeded_store(2);
        let placeholder = Message::placeholder("thinking...");
        let id = placeholder.id;
        store.append(placeholder);
        store.append(Message::user("later", Utc::now()));

        for text in ["a", "ab", "abc"] {
            store.update(id, MessagePatch::text(text));
            let position = store
                .snapshot()
                .iter()
                .position(|m| m.id == id)
                .expect("message present");
            assert_eq!(position, 2);
        }
    }

    #[test]
    fn status_never_moves_backward() {
        let mut store = ConversationStore::new();
        let placeholder = Message::placeholder("thinking...");
        let id = placeholder.id;
        store.append(placeholder);

        store.update(id, MessagePatch::status(MessageStatus::Sent));
        store.update(id, MessagePatch::status(MessageStatus::Streaming));

        assert_eq!(store.snapshot()[0].status, MessageStatus::Sent);
    }

    #[test]
    fn tail_returns_last_n_in_original_order() {
        let store = seeded_store(12);
        let tail = store.tail(10);
        assert_eq!(tail.len(), 10);
        assert_eq!(tail[0].text, "message 2");
        assert_eq!(tail[9].text, "message 11");

        let small = seeded_store(3);
        assert_eq!(small.tail(10).len(), 3);
    }

    #[test]
    fn subscribe_sees_every_mutation() {
        let mut store = ConversationStore::new();
        let rx = store.subscribe();
        assert_eq!(*rx.borrow(), 0);

        let message = Message::assistant("hi");
        let id = message.id;
        store.append(message);
        assert_eq!(*rx.borrow(), 1);

        store.update(id, MessagePatch::text("hi!"));
        assert_eq!(*rx.borrow(), 2);

        // A no-op update does not tick the revision.
        store.update(Uuid::new_v4(), MessagePatch::text("x"));
        assert_eq!(*rx.borrow(), 2);
    }
}
