//! Follow-up chat grounded in a stored analysis

use super::relay::{spawn_relay, ChatStream};
use crate::extract::AnalysisSummary;
use crate::generation::{GenerateRequest, GenerationError, ModelClient, TextStream};
use crate::storage::{
    run_blocking, AnalysisListing, AnalysisLookup, AnalysisStore, ChatSessionSummary,
    ConversationTurn, StorageError, StoredAnalysis, ANALYSIS_LISTING_LIMIT, SESSION_LISTING_LIMIT,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Turns of prior conversation included in the prompt
pub const CONTEXT_TURNS: usize = 10;
/// Turns returned by [`ChatService::history`]
pub const HISTORY_TURNS: usize = 20;
pub const CHAT_TEMPERATURE: f32 = 0.7;
pub const CHAT_MAX_OUTPUT_TOKENS: u32 = 1000;
pub const NO_HISTORY: &str = "No previous conversation.";

const STREAM_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No analysis found for this startup. Please generate analysis first.")]
    AnalysisNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to generate chat response: {0}")]
    Generation(#[from] GenerationError),
}

pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    fn label(self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistant => "Assistant",
        }
    }
}

/// One side of a conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

/// Reply to a non-streaming chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub startup_name: String,
    pub user_message: String,
    pub bot_response: String,
    pub has_analysis_context: bool,
}

/// A session's conversation, oldest message first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    pub session_id: String,
    pub startup_name: String,
    pub messages: Vec<ChatMessage>,
}

/// Flatten stored turns into alternating user/assistant messages.
///
/// Empty sides of a turn are skipped.
pub fn history_messages(turns: &[ConversationTurn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        if !turn.user_message.is_empty() {
            messages.push(ChatMessage {
                message: turn.user_message.clone(),
                sender: Sender::User,
                timestamp: turn.created_at,
            });
        }
        if !turn.model_response.is_empty() {
            messages.push(ChatMessage {
                message: turn.model_response.clone(),
                sender: Sender::Assistant,
                timestamp: turn.created_at,
            });
        }
    }
    messages
}

fn render_summary(summary: &AnalysisSummary) -> String {
    format!(
        "Short summary: {}\nDetailed analysis: {}",
        summary.short_summary, summary.detailed_analysis_summary
    )
}

fn render_history(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return NO_HISTORY.to_string();
    }
    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender.label(), m.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full prompt for one chat exchange
pub fn build_chat_prompt(
    startup_name: &str,
    summary: &AnalysisSummary,
    history: &[ChatMessage],
    user_message: &str,
) -> String {
    let name = if startup_name.is_empty() {
        "Unknown Company"
    } else {
        startup_name
    };

    format!(
        "You are an expert startup analyst assistant discussing {name}.\n\
         STARTUP ANALYSIS SUMMARY (your primary knowledge base):\n\
         {summary}\n\
         CONVERSATION HISTORY:\n\
         {history}\n\
         Based on this analysis summary and conversation history, provide accurate, insightful \
         responses about this startup. Answer in plain text only, without markdown, citations, \
         references, or formatting. Reference specific details from the analysis when relevant.\n\n\
         User: {user_message}\n\n\
         Assistant:",
        summary = render_summary(summary),
        history = render_history(history),
    )
}

/// Chat over stored analyses, with persistent per-path conversations
pub struct ChatService {
    model: Arc<dyn ModelClient>,
    store: Arc<dyn AnalysisStore>,
    context_turns: usize,
}

impl ChatService {
    pub fn new(model: Arc<dyn ModelClient>, store: Arc<dyn AnalysisStore>) -> Self {
        Self {
            model,
            store,
            context_turns: CONTEXT_TURNS,
        }
    }

    pub fn with_context_turns(mut self, turns: usize) -> Self {
        self.context_turns = turns;
        self
    }

    /// Stored analysis plus recent history, or `AnalysisNotFound`
    async fn load_context(
        &self,
        path_id: &str,
        turns: usize,
    ) -> ChatResult<(StoredAnalysis, Vec<ChatMessage>)> {
        let key = path_id.to_string();
        let (analysis, turns) = run_blocking(self.store.clone(), move |store| {
            let analysis = store.get_analysis(&AnalysisLookup::by_path(&key))?;
            let turns = match analysis {
                Some(_) => store.list_turns(&key, turns)?,
                None => Vec::new(),
            };
            Ok((analysis, turns))
        })
        .await?;

        let analysis = analysis.ok_or_else(|| ChatError::AnalysisNotFound(path_id.to_string()))?;
        Ok((analysis, history_messages(&turns)))
    }

    fn chat_request(prompt: String) -> GenerateRequest {
        GenerateRequest::text(prompt)
            .with_grounding(true)
            .with_temperature(CHAT_TEMPERATURE)
            .with_max_output_tokens(CHAT_MAX_OUTPUT_TOKENS)
    }

    /// Append a turn; failures are logged and otherwise ignored.
    async fn record_turn(
        store: Arc<dyn AnalysisStore>,
        session_id: String,
        user_message: String,
        reply: String,
        startup_name: String,
    ) {
        let result = run_blocking(store, move |store| {
            store.append_turn(&session_id, &user_message, &reply, Some(&startup_name))
        })
        .await;
        if let Err(e) = result {
            error!(error = %e, "failed to store conversation turn");
        }
    }

    /// Answer one message about the analysis stored for `path_id`.
    pub async fn respond(&self, path_id: &str, message: &str) -> ChatResult<ChatReply> {
        let (analysis, history) = self.load_context(path_id, self.context_turns).await?;
        let prompt = build_chat_prompt(
            &analysis.startup_name,
            &analysis.analysis_summary,
            &history,
            message,
        );

        let reply = self.model.generate(Self::chat_request(prompt)).await?;
        let reply = reply.trim().to_string();
        info!(path_id, chars = reply.len(), "chat reply generated");

        Self::record_turn(
            self.store.clone(),
            path_id.to_string(),
            message.to_string(),
            reply.clone(),
            analysis.startup_name.clone(),
        )
        .await;

        let summary = &analysis.analysis_summary;
        Ok(ChatReply {
            session_id: path_id.to_string(),
            startup_name: analysis.startup_name,
            user_message: message.to_string(),
            has_analysis_context: !(summary.short_summary.is_empty()
                && summary.detailed_analysis_summary.is_empty()),
            bot_response: reply,
        })
    }

    /// Stream a reply as text fragments.
    ///
    /// Only a missing analysis (or a storage failure while loading it) is
    /// reported as an error; model failures arrive in-band as a final
    /// `[Stream error: ...]` fragment. A reply that streams to completion is
    /// added to the conversation history.
    pub async fn respond_stream(&self, path_id: &str, message: &str) -> ChatResult<ChatStream> {
        let (analysis, history) = self.load_context(path_id, self.context_turns).await?;
        let prompt = build_chat_prompt(
            &analysis.startup_name,
            &analysis.analysis_summary,
            &history,
            message,
        );

        let upstream = match self.model.generate_stream(Self::chat_request(prompt)).await {
            Ok(stream) => stream,
            Err(e) => TextStream::from_items(vec![Err(e)]),
        };

        let store = self.store.clone();
        let session_id = path_id.to_string();
        let user_message = message.to_string();
        let startup_name = analysis.startup_name;
        Ok(spawn_relay(upstream, STREAM_BUFFER, move |full| {
            Self::record_turn(store, session_id, user_message, full, startup_name)
        }))
    }

    /// The conversation stored for `path_id`
    pub async fn history(&self, path_id: &str) -> ChatResult<ChatHistory> {
        let (analysis, messages) = self.load_context(path_id, HISTORY_TURNS).await?;
        Ok(ChatHistory {
            session_id: path_id.to_string(),
            startup_name: analysis.startup_name,
            messages,
        })
    }

    /// Sessions with stored conversation, most recently active first
    pub async fn sessions(&self) -> ChatResult<Vec<ChatSessionSummary>> {
        Ok(run_blocking(self.store.clone(), |store| {
            store.list_chat_sessions(SESSION_LISTING_LIMIT)
        })
        .await?)
    }

    /// Analyses available to chat about, newest first
    pub async fn available_analyses(&self) -> ChatResult<Vec<AnalysisListing>> {
        Ok(run_blocking(self.store.clone(), |store| {
            store.list_analyses(ANALYSIS_LISTING_LIMIT)
        })
        .await?)
    }
}
