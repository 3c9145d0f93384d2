//! §4.7 Tournament Scheduler: generate hypotheses, explore them in
//! parallelism-capped batches across rounds, eliminate and cross-pollinate,
//! then select a winner and derive recommendations.

use std::sync::Arc;
use std::time::Instant;

use reasoning_protocol::ActionPriority;
use reasoning_protocol::AnalysisKind;
use reasoning_protocol::CodeLocation;
use reasoning_protocol::Evidence;
use reasoning_protocol::EvidencePolarity;
use reasoning_protocol::ExplorationResult;
use reasoning_protocol::Finding;
use reasoning_protocol::FindingKind;
use reasoning_protocol::Hypothesis;
use reasoning_protocol::HypothesisCategory;
use reasoning_protocol::RecommendedAction;
use reasoning_protocol::RequestContext;
use reasoning_protocol::RoundRecord;
use reasoning_protocol::Severity;
use reasoning_protocol::SummaryFormat;
use reasoning_protocol::TournamentConfig;
use reasoning_protocol::TournamentResult;
use reasoning_protocol::TournamentStatus;
use regex_lite::Regex;
use std::sync::LazyLock;
use tokio::sync::Semaphore;
use tracing::instrument;
use tracing::warn;

use crate::adapter::ChatFactory;
use crate::adapter::ChatSession;
use crate::adapter::RemoteDialogueAdapter;
use crate::error::CoreError;
use crate::error::Result;
use crate::sanitizer::PromptValue;
use crate::sanitizer::format_file;
use crate::secure_reader::SecureReader;
use crate::tournament::evidence;
use crate::tournament::hypotheses;

/// Synthetic confidence assigned when a hypothesis exploration panics or
/// otherwise fails outright (spec.md §4.7 failure isolation).
const FAILURE_CONFIDENCE: f64 = 0.1;
const STRUGGLING_THRESHOLD: f64 = 0.5;
const SIGNIFICANT_INSIGHT_THRESHOLD: f64 = 0.6;

#[allow(clippy::unwrap_used)]
static FILE_LINE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9_./\-]+\.[A-Za-z]{1,6}):(\d+)").unwrap());

pub struct TournamentScheduler {
    adapter: Arc<RemoteDialogueAdapter>,
    reader: Arc<SecureReader>,
}

impl TournamentScheduler {
    pub fn new(factory: Arc<dyn ChatFactory>, reader: Arc<SecureReader>) -> Self {
        Self {
            adapter: Arc::new(RemoteDialogueAdapter::new(factory, reader.clone())),
            reader,
        }
    }

    fn read_focus_files(&self, ctx: &RequestContext) -> Vec<(String, PromptValue)> {
        ctx.focus_area
            .files
            .iter()
            .filter_map(|path| {
                let content = self.reader.read(std::path::Path::new(path)).ok()?;
                Some((path.clone(), PromptValue::Text(format_file(path, &content))))
            })
            .collect()
    }

    /// §4.7's top-level algorithm, run against the process-wide tournament
    /// budget (spec.md §5: "every request carries a per-request budget ...
    /// tournament 300s"). `budget` is checked between rounds rather than
    /// threaded into every adapter call, so a round already in flight always
    /// finishes; the caller's own outer timeout (spec.md §5's "pending
    /// adapter calls are abandoned") is the backstop for a single round that
    /// runs away.
    #[instrument(skip(self, ctx, issue))]
    pub async fn run(
        &self,
        ctx: RequestContext,
        issue: &str,
        config: TournamentConfig,
        budget: std::time::Duration,
    ) -> Result<TournamentResult> {
        let wall_start = Instant::now();
        let file_fields = self.read_focus_files(&ctx);

        let generation_prompt = format!(
            "Issue under investigation: {issue}\n\
             Propose up to {n} distinct hypotheses explaining this issue. Number each \
             one (\"1.\", \"2.\", ...) and for each include a Theory line, an Approach \
             line, and a Category line (performance, bug, security, architecture, or \
             integration).",
            n = config.max_hypotheses
        );
        let generation = self
            .adapter
            .start(&ctx, AnalysisKind::HypothesisTest, Some(&generation_prompt), &file_fields)
            .await?;

        let mut hypotheses = hypotheses::parse_hypotheses(&generation.response, config.max_hypotheses);
        if hypotheses.is_empty() {
            return Err(CoreError::ApiParse(
                "the remote response yielded no extractable hypotheses".to_string(),
            ));
        }
        let total_hypotheses = hypotheses.len();

        let mut rounds = Vec::new();
        let mut eliminated_theories: Vec<String> = Vec::new();
        let mut cross_round_insights: Vec<String> = Vec::new();
        let mut last_results: Vec<ExplorationResult> = Vec::new();
        let mut rounds_run = 0usize;

        for round_idx in 0..config.max_rounds {
            // The first round always runs, even with a single hypothesis;
            // later rounds stop once the tournament has narrowed to one
            // surviving contender, since there is nothing left to contest.
            if round_idx > 0 && hypotheses.len() <= 1 {
                break;
            }
            if wall_start.elapsed() >= budget {
                break;
            }
            rounds_run += 1;

            let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
            let mut tasks = Vec::with_capacity(hypotheses.len());
            for hypothesis in &hypotheses {
                let hypothesis = hypothesis.clone();
                let semaphore = semaphore.clone();
                let adapter = self.adapter.clone();
                let round_ctx = ctx.clone();
                let file_fields = file_fields.clone();
                let eliminated = eliminated_theories.clone();
                let insights = cross_round_insights.clone();
                tasks.push((
                    hypothesis.clone(),
                    tokio::spawn(async move {
                        let _permit = semaphore.acquire_owned().await;
                        explore_one(
                            adapter,
                            round_ctx,
                            hypothesis,
                            &file_fields,
                            &eliminated,
                            &insights,
                        )
                        .await
                    }),
                ));
            }

            let mut results = Vec::with_capacity(tasks.len());
            let mut chats: Vec<(usize, Box<dyn ChatSession>)> = Vec::new();
            for (hypothesis, task) in tasks {
                match task.await {
                    Ok((result, chat)) => {
                        let idx = results.len();
                        chats.push((idx, chat));
                        results.push(result);
                    }
                    Err(join_err) => {
                        warn!(error = %join_err, "hypothesis exploration task failed");
                        results.push(synthetic_failure_result(hypothesis, reasoning_protocol::SessionId::new()));
                    }
                }
            }

            if config.cross_pollination_enabled && results.len() >= 2 {
                let significant_insights = significant_insights(&results);
                if !significant_insights.is_empty() {
                    let message = format!(
                        "A pattern observed elsewhere in this investigation: {}",
                        significant_insights.join(" ")
                    );
                    for (idx, chat) in &chats {
                        if results[*idx].overall_confidence < STRUGGLING_THRESHOLD {
                            if let Ok(outcome) = self
                                .adapter
                                .continue_dialogue(chat.as_ref(), &ctx, &message, false)
                                .await
                            {
                                let mut extra = evidence::extract_evidence(&outcome.response);
                                let produced_insights = !outcome.response.trim().is_empty();
                                results[*idx].evidence.append(&mut extra);
                                results[*idx].overall_confidence = evidence::overall_confidence(
                                    &results[*idx].evidence,
                                    produced_insights,
                                );
                                results[*idx].exploration_depth += 1;
                            }
                        }
                    }
                }
            }

            let survivors_and_eliminated = eliminate(&hypotheses, &results, config.elimination_threshold);
            let eliminated_this_round = survivors_and_eliminated.1;
            for id in &eliminated_this_round {
                if let Some(h) = hypotheses.iter().find(|h| &h.id == id) {
                    eliminated_theories.push(h.theory.clone());
                }
            }

            cross_round_insights = significant_insights(&results);

            rounds.push(RoundRecord {
                hypotheses: hypotheses.clone(),
                results: results.clone(),
                eliminated: eliminated_this_round,
                cross_round_insights: cross_round_insights.clone(),
            });

            last_results = results;
            hypotheses = survivors_and_eliminated.0;
        }

        let mut ranked = last_results;
        ranked.sort_by(|a, b| rank_key(b).partial_cmp(&rank_key(a)).unwrap_or(std::cmp::Ordering::Equal));

        let winner = ranked.first().cloned();
        let runner_up = ranked.get(1).cloned();

        let wall_duration_millis = wall_start.elapsed().as_millis() as u64;
        let parallel_efficiency = if rounds_run == 0 || wall_duration_millis == 0 {
            0.0
        } else {
            let duration_secs = wall_duration_millis as f64 / 1000.0;
            (total_hypotheses as f64 * duration_secs / rounds_run as f64) / duration_secs
        };

        let (mut primary_actions, secondary_actions) = recommendations(&winner, &runner_up);

        let mut aggregated_findings = Vec::new();
        for result in &ranked {
            aggregated_findings.extend(result.related_findings.clone());
        }

        let budget_expired = wall_start.elapsed() >= budget;
        let status = if budget_expired || (rounds_run >= config.max_rounds && hypotheses.len() > 1) {
            TournamentStatus::Partial
        } else {
            TournamentStatus::Success
        };
        if budget_expired {
            // spec.md §7: budget expiry carries "an advisory immediate-action
            // entry describing the shortfall" alongside whatever the
            // tournament had already converged on.
            primary_actions.push(RecommendedAction {
                priority: ActionPriority::High,
                description: format!(
                    "Time budget of {}s elapsed after {rounds_run} of {} planned round(s); \
                     treat this result as partial.",
                    budget.as_secs(),
                    config.max_rounds,
                ),
            });
        }

        Ok(TournamentResult {
            issue: issue.to_string(),
            total_hypotheses,
            rounds,
            winner,
            runner_up,
            aggregated_findings,
            primary_actions,
            secondary_actions,
            wall_duration_millis,
            parallel_efficiency,
            status,
        })
    }
}

fn rank_key(result: &ExplorationResult) -> (f64, usize, std::cmp::Reverse<u128>) {
    // Tie-break (spec.md §4.7): equal confidence within 1e-6 -> more
    // supporting evidence -> lower id ordinal. We fold the epsilon
    // comparison into the sort by rounding confidence to six decimals.
    let rounded = (result.overall_confidence * 1_000_000.0).round();
    let supporting = result
        .evidence
        .iter()
        .filter(|e| e.polarity == EvidencePolarity::Supporting)
        .count();
    (rounded, supporting, std::cmp::Reverse(result.hypothesis.id.0.as_u128()))
}

fn eliminate(
    hypotheses: &[Hypothesis],
    results: &[ExplorationResult],
    threshold: f64,
) -> (Vec<Hypothesis>, Vec<reasoning_protocol::HypothesisId>) {
    let mut kept: Vec<&ExplorationResult> = results
        .iter()
        .filter(|r| r.overall_confidence >= threshold)
        .collect();
    kept.sort_by(|a, b| {
        rank_key(b)
            .partial_cmp(&rank_key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let keep_count = kept.len().div_ceil(2).max(if kept.is_empty() { 0 } else { 1 });
    let survivors: Vec<Hypothesis> = kept
        .into_iter()
        .take(keep_count)
        .map(|r| r.hypothesis.clone())
        .collect();
    let survivor_ids: std::collections::HashSet<_> = survivors.iter().map(|h| h.id).collect();
    let eliminated = hypotheses
        .iter()
        .map(|h| h.id)
        .filter(|id| !survivor_ids.contains(id))
        .collect();
    (survivors, eliminated)
}

fn significant_insights(results: &[ExplorationResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| r.overall_confidence > SIGNIFICANT_INSIGHT_THRESHOLD)
        .flat_map(|r| r.key_insights.iter())
        .filter(|insight| {
            let lower = insight.to_lowercase();
            crate::sanitizer::patterns::SYSTEMIC_PATTERN_KEYWORDS
                .iter()
                .any(|k| lower.contains(k))
        })
        .cloned()
        .collect()
}

fn synthetic_failure_result(
    hypothesis: Hypothesis,
    session_id: reasoning_protocol::SessionId,
) -> ExplorationResult {
    ExplorationResult {
        hypothesis,
        session_id,
        evidence: vec![Evidence {
            polarity: EvidencePolarity::Contradicting,
            description: "exploration failed before it could gather evidence".to_string(),
            location: None,
            confidence: FAILURE_CONFIDENCE,
            discovered_at_epoch_secs: crate::session::now_epoch_secs(),
        }],
        overall_confidence: FAILURE_CONFIDENCE,
        exploration_depth: 0,
        key_insights: Vec::new(),
        reproduction_steps: None,
        related_findings: Vec::new(),
    }
}

fn root_cause_to_finding(root_cause: &reasoning_protocol::RootCause) -> Finding {
    let location = root_cause
        .evidence
        .iter()
        .find_map(|e| {
            let caps = FILE_LINE_REF.captures(e)?;
            Some(CodeLocation {
                file: caps.get(1)?.as_str().to_string(),
                line: caps.get(2)?.as_str().parse().ok()?,
                column: None,
                function_name: None,
            })
        })
        .unwrap_or(CodeLocation {
            file: "unknown".to_string(),
            line: 0,
            column: None,
            function_name: None,
        });
    let severity = if root_cause.confidence < 0.2 {
        Severity::Low
    } else {
        Severity::Medium
    };
    Finding {
        kind: FindingKind::Bug,
        severity,
        location,
        description: root_cause.description.clone(),
        evidence: root_cause.evidence.clone(),
    }
}

async fn explore_one(
    adapter: Arc<RemoteDialogueAdapter>,
    base_ctx: RequestContext,
    hypothesis: Hypothesis,
    file_fields: &[(String, PromptValue)],
    eliminated_theories: &[String],
    cross_round_insights: &[String],
) -> (ExplorationResult, Box<dyn ChatSession>) {
    let mut ctx = base_ctx.clone();
    ctx.stuck_points.push(format!("Testing: {}", hypothesis.theory));

    let mut prompt = format!(
        "Theory: {}\nApproach: {}\nCategory: {}\nInvestigate whether the code \
         supports or contradicts this theory. Cite file:line references where you can.",
        hypothesis.theory, hypothesis.test_approach, hypothesis.category
    );
    if !eliminated_theories.is_empty() {
        prompt.push_str(&format!(
            "\nAlready ruled out in a prior round: {}",
            eliminated_theories.join("; ")
        ));
    }
    if !cross_round_insights.is_empty() {
        prompt.push_str(&format!(
            "\nPatterns noticed elsewhere: {}",
            cross_round_insights.join(" ")
        ));
    }

    let start = match adapter
        .start(&ctx, AnalysisKind::HypothesisTest, Some(&prompt), file_fields)
        .await
    {
        Ok(start) => start,
        Err(_) => {
            return (
                synthetic_failure_result(hypothesis, reasoning_protocol::SessionId::new()),
                Box::new(DeadChat),
            );
        }
    };

    let mut evidence = evidence::extract_evidence(&start.response);
    let produced_insights = !start.response.trim().is_empty();
    let mut depth = 1usize;
    let mut confidence = evidence::overall_confidence(&evidence, produced_insights);
    let mut reproduction_steps = None;

    if confidence > STRUGGLING_THRESHOLD {
        if let Ok(repro) = adapter
            .continue_dialogue(
                start.chat.as_ref(),
                &ctx,
                "Please give concrete, numbered steps to reproduce this.",
                false,
            )
            .await
        {
            depth += 1;
            if evidence::reproduction_succeeded(&repro.response) {
                reproduction_steps = Some(evidence::extract_steps(&repro.response));
            }
            let mut extra = evidence::extract_evidence(&repro.response);
            evidence.append(&mut extra);
            confidence = evidence::overall_confidence(&evidence, true);
        }
    }

    let related_findings = match adapter
        .finalize(start.chat.as_ref(), SummaryFormat::Actionable, &ctx)
        .await
    {
        Ok(result) => result
            .root_causes
            .iter()
            .filter(|rc| rc.confidence < STRUGGLING_THRESHOLD)
            .map(root_cause_to_finding)
            .collect(),
        Err(_) => Vec::new(),
    };
    depth += 1;

    let key_insights = evidence
        .iter()
        .filter(|e| e.polarity == EvidencePolarity::Supporting && e.confidence >= SIGNIFICANT_INSIGHT_THRESHOLD)
        .take(5)
        .map(|e| e.description.clone())
        .collect();

    let result = ExplorationResult {
        hypothesis,
        session_id: reasoning_protocol::SessionId::new(),
        evidence,
        overall_confidence: confidence,
        exploration_depth: depth,
        key_insights,
        reproduction_steps,
        related_findings,
    };
    (result, start.chat)
}

/// A chat handle used only to satisfy the return type when exploration
/// fails before a real session is ever established.
struct DeadChat;

#[async_trait::async_trait]
impl ChatSession for DeadChat {
    async fn send(&self, _text: &str) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("this exploration failed before a chat session was established"))
    }
}

fn recommendations(
    winner: &Option<ExplorationResult>,
    runner_up: &Option<ExplorationResult>,
) -> (Vec<RecommendedAction>, Vec<RecommendedAction>) {
    let mut primary = Vec::new();
    let mut secondary = Vec::new();

    if let Some(winner) = winner {
        if winner.overall_confidence > 0.7 {
            primary.push(RecommendedAction {
                priority: ActionPriority::Critical,
                description: format!("Fix the root cause: {}", winner.hypothesis.theory),
            });
            if winner.reproduction_steps.is_some() {
                primary.push(RecommendedAction {
                    priority: ActionPriority::Critical,
                    description: "Verify the fix via the captured reproduction steps.".to_string(),
                });
            }
        } else if winner.overall_confidence >= 0.3 {
            primary.push(RecommendedAction {
                priority: ActionPriority::High,
                description: format!("Investigate further: {}", winner.hypothesis.theory),
            });
        }
        if winner.hypothesis.category == HypothesisCategory::Performance {
            secondary.push(RecommendedAction {
                priority: ActionPriority::Medium,
                description: "Set up monitoring around this code path.".to_string(),
            });
        }
    }

    if let Some(runner_up) = runner_up {
        if runner_up.overall_confidence > 0.5 {
            secondary.push(RecommendedAction {
                priority: ActionPriority::Medium,
                description: format!("Also consider: {}", runner_up.hypothesis.theory),
            });
        }
    }

    for result in [winner, runner_up].into_iter().flatten() {
        for finding in &result.related_findings {
            if finding.severity >= Severity::High {
                secondary.push(RecommendedAction {
                    priority: ActionPriority::Medium,
                    description: format!("Unrelated issue: {}", finding.description),
                });
            }
        }
    }

    (primary, secondary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn result_with(confidence: f64, supporting: usize) -> ExplorationResult {
        ExplorationResult {
            hypothesis: Hypothesis {
                id: reasoning_protocol::HypothesisId::new(),
                theory: "t".to_string(),
                test_approach: "a".to_string(),
                category: HypothesisCategory::Bug,
                prior_priority: 0.5,
            },
            session_id: reasoning_protocol::SessionId::new(),
            evidence: (0..supporting)
                .map(|_| Evidence {
                    polarity: EvidencePolarity::Supporting,
                    description: "x".to_string(),
                    location: None,
                    confidence: 0.8,
                    discovered_at_epoch_secs: 0,
                })
                .collect(),
            overall_confidence: confidence,
            exploration_depth: 1,
            key_insights: Vec::new(),
            reproduction_steps: None,
            related_findings: Vec::new(),
        }
    }

    #[test]
    fn eliminate_keeps_top_half_above_threshold() {
        let hyps: Vec<Hypothesis> = (0..4).map(|_| result_with(0.0, 0).hypothesis).collect();
        let results = vec![
            result_with(0.9, 2),
            result_with(0.4, 1),
            result_with(0.2, 0),
            result_with(0.6, 1),
        ];
        let (survivors, eliminated) = eliminate(&hyps, &results, 0.3);
        assert_eq!(survivors.len(), 2);
        assert_eq!(eliminated.len(), 2);
    }

    #[test]
    fn rank_key_breaks_ties_by_supporting_evidence() {
        let a = result_with(0.5, 3);
        let b = result_with(0.5, 1);
        assert!(rank_key(&a) > rank_key(&b));
    }

    #[test]
    fn recommendations_escalate_with_confidence() {
        let winner = Some(result_with(0.8, 2));
        let (primary, _secondary) = recommendations(&winner, &None);
        assert!(primary.iter().any(|a| a.priority == ActionPriority::Critical));
    }
}
