//! §3/§4.5 Session. The in-memory record the Session Manager owns;
//! orchestrators only ever see it through a [`manager::SessionGuard`].

pub mod manager;

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use reasoning_protocol::AnalysisKind;
use reasoning_protocol::Finding;
use reasoning_protocol::ProgressRecord;
use reasoning_protocol::RequestContext;
use reasoning_protocol::SessionId;
use reasoning_protocol::SessionStatus;
use reasoning_protocol::SessionStatusSnapshot;
use reasoning_protocol::Turn;
use reasoning_protocol::TurnId;
use reasoning_protocol::TurnMetadata;
use reasoning_protocol::TurnRole;

use crate::adapter::ChatSession;
use crate::sanitizer::patterns::ci;

pub(crate) fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Cap on turns before a session is forced into `completing` regardless of
/// confidence, so a dialogue that never converges still terminates (spec.md
/// §3/§4.5: "turn count reaches the 50-turn cap").
pub const MAX_TURNS: usize = 50;

pub struct Session {
    pub id: SessionId,
    pub status: SessionStatus,
    pub analysis_kind: AnalysisKind,
    pub created_at_epoch_secs: u64,
    pub last_activity_epoch_secs: u64,
    pub turns: Vec<Turn>,
    pub progress: ProgressRecord,
    pub last_context: RequestContext,
    pub chat: Box<dyn ChatSession>,
}

/// The composed result of §4.5's `extractResults` operation: everything a
/// `finalize_conversation` response needs beyond what the adapter itself
/// returns.
#[derive(Debug, Clone, Default)]
pub struct ExtractedResults {
    pub turn_count: usize,
    pub wall_duration_secs: u64,
    pub completed_steps: Vec<String>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Session {
    pub fn new(
        id: SessionId,
        analysis_kind: AnalysisKind,
        context: RequestContext,
        chat: Box<dyn ChatSession>,
    ) -> Self {
        let now = now_epoch_secs();
        Self {
            id,
            status: SessionStatus::Active,
            analysis_kind,
            created_at_epoch_secs: now,
            last_activity_epoch_secs: now,
            turns: Vec::new(),
            progress: ProgressRecord::default(),
            last_context: context,
            chat,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity_epoch_secs = now_epoch_secs();
    }

    fn is_terminal(&self) -> bool {
        matches!(self.status, SessionStatus::Completed | SessionStatus::Abandoned)
    }

    pub fn add_turn(&mut self, role: TurnRole, content: impl Into<String>, metadata: TurnMetadata) {
        let id = TurnId(self.turns.len() as u32);
        self.turns.push(Turn {
            id,
            role,
            content: content.into(),
            sequence_millis: now_epoch_secs().saturating_mul(1000),
            metadata,
        });
        // spec.md §3/§4.5: reaching the turn cap pushes the session toward
        // `completing` regardless of confidence, so a dialogue that never
        // converges still terminates.
        if self.turns.len() >= MAX_TURNS && !self.is_terminal() {
            self.status = SessionStatus::Completing;
        }
    }

    pub fn update_progress(&mut self, confidence: f64, new_findings: Vec<Finding>) {
        self.progress.confidence = confidence;
        self.progress.key_findings.extend(new_findings);
        // spec.md §4.5's `updateProgress`: confidence >= 0.9 also moves the
        // session toward `completing`.
        if confidence >= 0.9 && !self.is_terminal() {
            self.status = SessionStatus::Completing;
        }
    }

    /// §4.5: high confidence or the turn cap reached moves a session toward
    /// `completing`.
    pub fn should_complete(&self) -> bool {
        crate::adapter::progress::is_finalizable(self.progress.confidence)
            || self.turns.len() >= MAX_TURNS
    }

    pub fn snapshot(&self, can_finalize: bool) -> SessionStatusSnapshot {
        SessionStatusSnapshot {
            session_id: self.id.to_string(),
            status: self.status,
            turn_count: self.turns.len(),
            last_activity_epoch_secs: self.last_activity_epoch_secs,
            progress: self.progress.clone(),
            can_finalize,
        }
    }

    /// §4.5's `extractResults`: insights from turn metadata, recommendations
    /// mined from `recommend(s)?:` lines in remote turns, plus session
    /// bookkeeping.
    pub fn extract_results(&self) -> ExtractedResults {
        static RECOMMEND_LINE: std::sync::LazyLock<regex_lite::Regex> =
            std::sync::LazyLock::new(|| ci(r"recommends?:\s*(.+)"));

        let mut insights = Vec::new();
        let mut recommendations = Vec::new();
        let mut completed_steps = Vec::new();

        for turn in &self.turns {
            match turn.role {
                TurnRole::Remote => {
                    for line in turn.content.lines() {
                        if let Some(caps) = RECOMMEND_LINE.captures(line) {
                            if let Some(m) = caps.get(1) {
                                recommendations.push(m.as_str().trim().to_string());
                            }
                        }
                    }
                    insights.extend(
                        turn.metadata
                            .follow_ups
                            .iter()
                            .map(|f| format!("follow-up raised: {f}")),
                    );
                }
                TurnRole::Caller => {
                    completed_steps.push(format!("reviewed caller turn #{}", turn.id.0));
                }
                TurnRole::System => {}
            }
        }

        ExtractedResults {
            turn_count: self.turns.len(),
            wall_duration_secs: self
                .last_activity_epoch_secs
                .saturating_sub(self.created_at_epoch_secs),
            completed_steps,
            insights,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use async_trait::async_trait;
    use reasoning_protocol::FocusArea;

    struct NoopChat;
    #[async_trait]
    impl ChatSession for NoopChat {
        async fn send(&self, _text: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    fn sample_session() -> Session {
        Session::new(
            SessionId::new(),
            AnalysisKind::Performance,
            RequestContext {
                focus_area: FocusArea {
                    files: vec![],
                    entry_points: None,
                    service_names: None,
                },
                ..Default::default()
            },
            Box::new(NoopChat),
        )
    }

    #[test]
    fn extracts_recommend_lines_from_remote_turns() {
        let mut session = sample_session();
        session.add_turn(
            TurnRole::Remote,
            "The root cause is a missing index.\nRecommends: add a composite index on (a, b).",
            TurnMetadata::default(),
        );
        let results = session.extract_results();
        assert_eq!(results.recommendations, vec!["add a composite index on (a, b)"]);
    }

    #[test]
    fn should_complete_once_finalizable_threshold_reached() {
        let mut session = sample_session();
        assert!(!session.should_complete());
        session.update_progress(0.85, vec![]);
        assert!(session.should_complete());
    }

    #[test]
    fn reaching_the_turn_cap_moves_status_to_completing() {
        let mut session = sample_session();
        for _ in 0..MAX_TURNS {
            assert_eq!(session.status, SessionStatus::Active);
            session.add_turn(TurnRole::Remote, "reply", TurnMetadata::default());
        }
        assert_eq!(session.status, SessionStatus::Completing);
    }

    #[test]
    fn high_confidence_moves_status_to_completing() {
        let mut session = sample_session();
        session.update_progress(0.5, vec![]);
        assert_eq!(session.status, SessionStatus::Active);
        session.update_progress(0.9, vec![]);
        assert_eq!(session.status, SessionStatus::Completing);
    }

    #[test]
    fn completing_does_not_regress_a_terminal_session() {
        let mut session = sample_session();
        session.status = SessionStatus::Completed;
        session.update_progress(0.95, vec![]);
        assert_eq!(session.status, SessionStatus::Completed);
    }
}
