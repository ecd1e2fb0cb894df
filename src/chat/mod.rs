//! Chat about a stored analysis
//!
//! Each path identifier is one chat session. Replies are grounded in the
//! analysis summary stored for the path and in the session's recent turns.

mod relay;
mod service;

pub use relay::{spawn_relay, stream_error_fragment, CancellationToken, ChatStream};
pub use service::{
    build_chat_prompt, history_messages, ChatError, ChatHistory, ChatMessage, ChatReply,
    ChatResult, ChatService, Sender, CHAT_MAX_OUTPUT_TOKENS, CHAT_TEMPERATURE, CONTEXT_TURNS,
    HISTORY_TURNS, NO_HISTORY,
};
