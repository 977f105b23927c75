//! Fixed texts that define the assistant's voice.

/// System instruction sent at the head of every completion request.
pub const SYSTEM_PROMPT: &str =
    "You're a cheerful chatbot who brings joy and humor to every conversation.";

/// Greeting seeded into every new conversation.
pub const GREETING: &str = "Hey! What's up?";

/// Stand-in text shown while a reply is being generated.
pub const THINKING: &str = "thinking...";

/// Shown in place of a reply when the completion exchange fails.
pub const APOLOGY: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";
