//! §4.6 Single-Dialogue Orchestrator: wires the Session Manager, Remote
//! Dialogue Adapter, and Secure Reader together behind the three public
//! session operations. Mirrors codex-core's `codex_conversation.rs` in
//! spirit — a thin façade that serializes access to one long-lived
//! conversation handle — but the serialization here is per-session-lock
//! rather than per-process.

use std::path::Path;
use std::sync::Arc;

use reasoning_protocol::AnalysisKind;
use reasoning_protocol::RequestContext;
use reasoning_protocol::SessionId;
use reasoning_protocol::SessionStatus;
use reasoning_protocol::SummaryFormat;
use reasoning_protocol::TurnMetadata;
use reasoning_protocol::TurnRole;
use tracing::info;
use tracing::instrument;

use crate::adapter::ChatFactory;
use crate::adapter::RemoteDialogueAdapter;
use crate::error::CoreError;
use crate::error::Result;
use crate::sanitizer;
use crate::sanitizer::PromptValue;
use crate::secure_reader::SecureReader;
use crate::session::ExtractedResults;
use crate::session::manager::SessionManager;

pub struct StartConversationOutcome {
    pub session_id: SessionId,
    pub initial_response: String,
    pub follow_ups: Vec<String>,
    pub status: SessionStatus,
}

pub struct ContinueConversationOutcome {
    pub response: String,
    pub progress: f64,
    pub finalizable: bool,
    pub status: SessionStatus,
}

pub struct FinalizeConversationOutcome {
    pub result: reasoning_protocol::AnalysisResult,
    pub extracted: ExtractedResults,
}

pub struct Orchestrator {
    sessions: Arc<SessionManager>,
    adapter: Arc<RemoteDialogueAdapter>,
    reader: Arc<SecureReader>,
}

impl Orchestrator {
    pub fn new(
        sessions: Arc<SessionManager>,
        factory: Arc<dyn ChatFactory>,
        reader: Arc<SecureReader>,
    ) -> Self {
        Self {
            sessions,
            adapter: Arc::new(RemoteDialogueAdapter::new(factory, reader.clone())),
            reader,
        }
    }

    fn read_focus_files(&self, ctx: &RequestContext) -> Vec<(String, PromptValue)> {
        ctx.focus_area
            .files
            .iter()
            .filter_map(|path| {
                let content = self.reader.read(Path::new(path)).ok()?;
                Some((path.clone(), PromptValue::Text(sanitizer::format_file(path, &content))))
            })
            .collect()
    }

    /// §4.6's `startConversation`.
    #[instrument(skip(self, ctx), fields(kind = %kind))]
    pub async fn start_conversation(
        &self,
        ctx: RequestContext,
        kind: AnalysisKind,
        initial_question: Option<&str>,
    ) -> Result<StartConversationOutcome> {
        let file_fields = self.read_focus_files(&ctx);

        let outcome = self
            .adapter
            .start(&ctx, kind, initial_question, &file_fields)
            .await?;

        let chat = outcome.chat;
        let id = self.sessions.create(kind, ctx, chat).await;

        {
            let mut guard = self.sessions.acquire_lock(id, false).await?;
            guard.add_turn(TurnRole::System, outcome.system_turn, TurnMetadata::default());
            guard.add_turn(
                TurnRole::System,
                outcome.acknowledgement_turn,
                TurnMetadata::default(),
            );
            guard.add_turn(
                TurnRole::Remote,
                outcome.response.clone(),
                TurnMetadata {
                    analysis_kind: Some(kind),
                    follow_ups: outcome.follow_ups.clone(),
                    findings: Vec::new(),
                },
            );
        }

        info!(session_id = %id, "started a new conversation");
        Ok(StartConversationOutcome {
            session_id: id,
            initial_response: outcome.response,
            follow_ups: outcome.follow_ups,
            status: SessionStatus::Active,
        })
    }

    /// §4.6's `continueConversation`. The lock is released on every exit
    /// path — including early `?` returns — because [`SessionGuard`] is
    /// dropped as soon as this function returns.
    #[instrument(skip(self, message))]
    pub async fn continue_conversation(
        &self,
        id: SessionId,
        message: &str,
        include_snippets: bool,
    ) -> Result<ContinueConversationOutcome> {
        let mut guard = self.sessions.acquire_lock(id, false).await?;

        guard.add_turn(TurnRole::Caller, message, TurnMetadata::default());
        let ctx = guard.last_context.clone();

        let outcome = self
            .adapter
            .continue_dialogue(guard.chat.as_ref(), &ctx, message, include_snippets)
            .await?;

        guard.add_turn(
            TurnRole::Remote,
            outcome.response.clone(),
            TurnMetadata::default(),
        );
        guard.update_progress(outcome.progress, Vec::new());

        Ok(ContinueConversationOutcome {
            response: outcome.response,
            progress: outcome.progress,
            finalizable: outcome.finalizable,
            status: guard.status,
        })
    }

    /// §4.6's `finalizeConversation`. Does not destroy the session — it is
    /// left `completed` so status queries remain answerable.
    #[instrument(skip(self))]
    pub async fn finalize_conversation(
        &self,
        id: SessionId,
        format: SummaryFormat,
    ) -> Result<FinalizeConversationOutcome> {
        let mut guard = self.sessions.acquire_lock(id, true).await?;

        let ctx = guard.last_context.clone();
        let mut result = self
            .adapter
            .finalize(guard.chat.as_ref(), format, &ctx)
            .await?;
        let extracted = guard.extract_results();

        result
            .investigation_next_steps
            .extend(extracted.recommendations.clone());
        guard.status = SessionStatus::Completed;

        Ok(FinalizeConversationOutcome { result, extracted })
    }

    pub async fn status(&self, id: SessionId) -> Result<reasoning_protocol::SessionStatusSnapshot> {
        self.sessions.snapshot(id).await
    }
}
