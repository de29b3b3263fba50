//! Turn engine - one reasoning turn per call.
//!
//! A turn walks a fixed sequence of phases over a `Problem`:
//!
//! 1. Diff known facts against the last snapshot, then re-snapshot
//! 2. Re-evaluate existing hypotheses if facts changed
//! 3. Gap phase: suspend with `NeedsInput` while required gaps are open
//! 4. Decompose, solve sub-problems, merge (at most once per problem)
//! 5. Generate new hypotheses
//! 6. Evaluate the new hypotheses, absorbing discovered gaps
//! 7. Append and prune
//! 8. Rank and synthesize
//! 9. Verify constraints, record the solution, judge continuation
//!
//! Each phase records an `AuditEvent`; the turn's events come back with the
//! outcome. The engine itself is immutable configuration and can be shared
//! across problems.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use surmise_reasoning::{
    ContinuationAdvice, ContinuationJudge, DeltaEval, ExpectedValueJudge, Gap, Greedy, Hypothesis,
    HypothesisId, KnownFact, Policy, Problem, ReEvalReport, ReEvaluate, Selection, Solution,
};
use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditLog};
use crate::collaborators::{
    ConstraintVerifier, Decomposer, Evaluator, GapDetector, Generator, Merger, Synthesizer,
};
use crate::decompose::{ConcatMerger, NoDecomposition};
use crate::evaluate::{EvidenceEval, SelectiveEval, SequentialEval};
use crate::gaps::DeclaredGapDetector;
use crate::{Result, TurnError};

/// Result of a completed turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u32,
    /// The solution recorded this turn
    pub solution: Solution,
    /// Live hypotheses in the order handed to the synthesizer
    pub ranked: Vec<HypothesisId>,
    pub continuation: ContinuationAdvice,
    /// Present when known facts changed and hypotheses existed
    pub reevaluation: Option<ReEvalReport>,
    /// Evaluator calls made this turn
    pub evaluated: usize,
    /// Hypotheses superseded by the accumulation cap
    pub pruned: usize,
    /// Gap keys discovered during evaluation
    pub new_gaps: Vec<String>,
    /// Discovered gaps filled from their auto-resolve value
    pub auto_resolved: Vec<String>,
    /// Solved by decomposition rather than generation
    pub decomposed: bool,
    /// Solution confidence and volatility are both within policy thresholds
    pub settled: bool,
    pub audit: Vec<AuditEvent>,
}

/// What a call to `TurnEngine::run_turn` produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// Suspended at the gap phase. Answer the gaps and call again to resume.
    NeedsInput {
        turn: u32,
        gaps: Vec<Gap>,
        audit: Vec<AuditEvent>,
    },
    /// A solution was recorded
    Solved(Box<TurnReport>),
}

impl TurnOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, TurnOutcome::Solved(_))
    }

    pub fn report(&self) -> Option<&TurnReport> {
        match self {
            TurnOutcome::Solved(report) => Some(&**report),
            TurnOutcome::NeedsInput { .. } => None,
        }
    }

    pub fn into_report(self) -> Option<TurnReport> {
        match self {
            TurnOutcome::Solved(report) => Some(*report),
            TurnOutcome::NeedsInput { .. } => None,
        }
    }
}

/// Bookkeeping carried between phases
#[derive(Default)]
struct TurnProgress {
    reevaluation: Option<ReEvalReport>,
    evaluated: usize,
    pruned: usize,
    new_gaps: Vec<String>,
    auto_resolved: Vec<String>,
    ranked: Vec<HypothesisId>,
    decomposed: bool,
}

/// Drives reasoning turns over problems.
#[derive(Clone)]
pub struct TurnEngine {
    generator: Arc<dyn Generator>,
    synthesizer: Arc<dyn Synthesizer>,
    verifier: Arc<dyn ConstraintVerifier>,
    gap_detector: Arc<dyn GapDetector>,
    decomposer: Arc<dyn Decomposer>,
    merger: Arc<dyn Merger>,
    reevaluate: Arc<dyn ReEvaluate>,
    selection: Option<Arc<dyn Selection>>,
    evidence_eval: Arc<dyn EvidenceEval>,
    judge: Arc<dyn ContinuationJudge>,
    policy: Policy,
}

impl TurnEngine {
    /// Starts a builder with the four collaborators every engine needs.
    pub fn builder(
        generator: Arc<dyn Generator>,
        evaluator: Arc<dyn Evaluator>,
        synthesizer: Arc<dyn Synthesizer>,
        verifier: Arc<dyn ConstraintVerifier>,
    ) -> TurnEngineBuilder {
        TurnEngineBuilder {
            generator,
            evaluator,
            synthesizer,
            verifier,
            policy: Policy::default(),
            gap_detector: None,
            decomposer: None,
            merger: None,
            reevaluate: None,
            selection: None,
            evidence_eval: None,
            judge: None,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Runs one turn on `problem`.
    ///
    /// Returns `NeedsInput` when the turn suspends at the gap phase; the
    /// next call resumes it without counting a new turn. Fails only when no
    /// hypotheses exist and none could be generated.
    pub fn run_turn<'a>(
        &'a self,
        problem: &'a mut Problem,
    ) -> Pin<Box<dyn Future<Output = Result<TurnOutcome>> + Send + 'a>> {
        // Boxed so sub-problem turns can recurse
        Box::pin(self.turn(problem))
    }

    async fn turn(&self, problem: &mut Problem) -> Result<TurnOutcome> {
        let mut audit = AuditLog::new();
        let mut progress = TurnProgress::default();

        let resumed = problem.awaiting_input;
        if !resumed {
            problem.turn_count += 1;
        }
        problem.awaiting_input = false;
        let turn = problem.turn_count;
        info!(turn, depth = problem.depth, resumed, "turn started");
        audit.record(AuditEvent::TurnStarted {
            timestamp: Utc::now(),
            turn,
            depth: problem.depth,
            resumed,
        });

        // 1-2: known-fact changes
        let changed = problem.changed_known_keys();
        problem.take_snapshot();
        if !changed.is_empty() {
            debug!(turn, keys = ?changed, "known facts changed");
            audit.record(AuditEvent::KnownChanged {
                timestamp: Utc::now(),
                keys: changed.clone(),
            });
            if !problem.hypotheses().is_empty() {
                let report = self.reevaluate.reevaluate(problem, &changed, &self.policy);
                debug!(
                    turn,
                    strategy = self.reevaluate.name(),
                    updated = report.updated,
                    superseded = report.superseded,
                    "re-evaluated hypotheses"
                );
                audit.record(AuditEvent::Reevaluated {
                    timestamp: Utc::now(),
                    strategy: self.reevaluate.name().to_string(),
                    updated: report.updated,
                    superseded: report.superseded,
                    delta: report.delta,
                });
                progress.reevaluation = Some(report);
            }
        }

        // 3: gap phase
        problem.answer_known_gaps();
        if problem.gap_rounds < self.policy.max_gap_rounds {
            let detected = self.gap_detector.detect(problem).await;
            for gap in detected {
                if !problem.known.contains_key(&gap.key) {
                    problem.add_gap(gap);
                }
            }

            let open: Vec<Gap> = problem.open_required_gaps().into_iter().cloned().collect();
            if !open.is_empty() {
                problem.gap_rounds += 1;
                problem.awaiting_input = true;
                let keys: Vec<String> = open.iter().map(|g| g.key.clone()).collect();
                info!(turn, gap_round = problem.gap_rounds, gaps = ?keys, "turn needs input");
                audit.record(AuditEvent::GapsRequested {
                    timestamp: Utc::now(),
                    keys,
                    gap_round: problem.gap_rounds,
                });
                return Ok(TurnOutcome::NeedsInput {
                    turn,
                    gaps: open,
                    audit: audit.into_events(),
                });
            }
        }

        // 4: decomposition
        if problem.sub_problems().is_empty()
            && problem.depth < self.policy.max_sub_depth
            && self.decomposer.should(problem, &self.policy)
        {
            if let Some(solution) = self.solve_by_parts(problem, &mut audit).await {
                progress.decomposed = true;
                return self.conclude(problem, solution, progress, audit).await;
            }
        }

        // 5: generation
        let existing: Vec<Hypothesis> = problem.live_hypotheses().into_iter().cloned().collect();
        let mut generated = self.generator.generate(problem, &self.policy, &existing).await;
        let truncated = generated.len().saturating_sub(self.policy.max_hypotheses);
        generated.truncate(self.policy.max_hypotheses);
        for hypothesis in generated.iter_mut() {
            hypothesis.stamp_new(turn);
        }
        if generated.is_empty() && existing.is_empty() {
            warn!(turn, "no hypotheses generated and none carried over");
            return Err(TurnError::NoHypotheses);
        }
        debug!(turn, generated = generated.len(), truncated, "generated hypotheses");
        audit.record(AuditEvent::Generated {
            timestamp: Utc::now(),
            count: generated.len(),
            truncated,
        });

        // 6: evaluation
        let report = self
            .evidence_eval
            .evaluate(&mut generated, problem, &self.policy)
            .await;
        progress.evaluated = report.evaluated;
        self.absorb_gaps(problem, report.discovered_gaps, &mut progress, &mut audit);
        audit.record(AuditEvent::Evaluated {
            timestamp: Utc::now(),
            strategy: self.evidence_eval.name().to_string(),
            evaluated: report.evaluated,
            candidates: generated.len(),
            new_gaps: progress.new_gaps.len(),
        });

        // 7: accumulate
        problem.append_hypotheses(generated);
        progress.pruned = problem.prune_hypotheses(self.policy.max_accumulated_hypotheses);
        if progress.pruned > 0 {
            audit.record(AuditEvent::Pruned {
                timestamp: Utc::now(),
                superseded: progress.pruned,
                live: problem.live_hypotheses().len(),
            });
        }

        // 8: rank and synthesize
        let live: Vec<Hypothesis> = problem.live_hypotheses().into_iter().cloned().collect();
        let order = match &self.selection {
            Some(selection) => selection.rank(&live, &self.policy),
            None => Greedy.rank(&live, &self.policy),
        };
        let ranked: Vec<Hypothesis> = order.into_iter().filter_map(|i| live.get(i).cloned()).collect();
        progress.ranked = ranked.iter().map(|h| h.id).collect();

        let solution = self.synthesizer.synthesize(&ranked, problem).await;
        audit.record(AuditEvent::Synthesized {
            timestamp: Utc::now(),
            ranked: ranked.len(),
            confidence: solution.confidence.value(),
        });

        // 9
        self.conclude(problem, solution, progress, audit).await
    }

    /// Decomposes, runs one turn per sub-problem and merges what solved.
    ///
    /// Sub-problems inherit the parent's known facts and sit one level
    /// deeper. Sub-turns that suspend or fail contribute nothing.
    async fn solve_by_parts(&self, problem: &mut Problem, audit: &mut AuditLog) -> Option<Solution> {
        let mut subs = self.decomposer.decompose(problem).await;
        if subs.is_empty() {
            return None;
        }

        for sub in subs.iter_mut() {
            sub.depth = problem.depth + 1;
            sub.known = problem.known.clone();
        }

        let mut solutions = Vec::with_capacity(subs.len());
        for (index, sub) in subs.iter_mut().enumerate() {
            match self.run_turn(sub).await {
                Ok(TurnOutcome::Solved(report)) => solutions.push(report.solution),
                Ok(TurnOutcome::NeedsInput { gaps, .. }) => {
                    debug!(index, gaps = gaps.len(), "sub-problem needs input, skipped");
                }
                Err(e) => {
                    warn!(index, error = %e, "sub-problem failed");
                }
            }
        }

        info!(
            depth = problem.depth,
            sub_problems = subs.len(),
            solved = solutions.len(),
            "decomposed problem"
        );
        audit.record(AuditEvent::Decomposed {
            timestamp: Utc::now(),
            sub_problems: subs.len(),
            solved: solutions.len(),
        });
        problem.set_sub_problems(subs);

        let merged = self.merger.merge(&solutions, problem).await;
        if merged.is_none() {
            debug!("merger produced nothing, falling back to generation");
        }
        merged
    }

    /// Adds discovered gaps, up to the per-turn cap, and fills the ones
    /// that carry an auto-resolve answer. Gaps that arrive already closed
    /// are dropped.
    fn absorb_gaps(
        &self,
        problem: &mut Problem,
        discovered: Vec<Gap>,
        progress: &mut TurnProgress,
        audit: &mut AuditLog,
    ) {
        for gap in discovered {
            if progress.new_gaps.len() >= self.policy.max_mid_turn_gaps {
                debug!(cap = self.policy.max_mid_turn_gaps, "mid-turn gap cap reached");
                break;
            }
            if problem.known.contains_key(&gap.key) || problem.gap(&gap.key).is_some() {
                continue;
            }
            if !gap.is_open() {
                warn!(key = %gap.key, status = ?gap.status(), "discovered gap is not open, ignored");
                continue;
            }

            let key = gap.key.clone();
            let auto = gap.auto_resolve.clone();
            problem.add_gap(gap);
            progress.new_gaps.push(key.clone());

            if let Some(auto) = auto {
                let fact = KnownFact::inferred(auto.value.clone(), self.policy.inferred_confidence);
                if let Err(e) = problem.fill_gap(&key, fact) {
                    warn!(key = %key, error = %e, "auto-resolve failed");
                    continue;
                }
                audit.record(AuditEvent::GapAutoResolved {
                    timestamp: Utc::now(),
                    key: key.clone(),
                    value: auto.value,
                });
                progress.auto_resolved.push(key);
            }
        }
    }

    /// Verifies, records the solution and judges continuation
    async fn conclude(
        &self,
        problem: &mut Problem,
        mut solution: Solution,
        progress: TurnProgress,
        mut audit: AuditLog,
    ) -> Result<TurnOutcome> {
        let turn = problem.turn_count;
        solution.turn_id = turn;
        solution.constraint_results = self
            .verifier
            .verify(&solution, &problem.constraints, problem)
            .await;
        let passed = solution.constraint_results.values().filter(|ok| **ok).count();
        audit.record(AuditEvent::Verified {
            timestamp: Utc::now(),
            passed,
            failed: solution.constraint_results.len() - passed,
        });

        let continuation = self.judge.judge(&solution, problem, &self.policy);
        let settled = solution
            .confidence
            .is_settled(self.policy.confidence_threshold, self.policy.volatility_threshold);
        problem.record_solution(solution.clone());

        info!(
            turn,
            confidence = solution.confidence.value(),
            settled,
            recommend_continue = continuation.recommend,
            "turn completed"
        );
        audit.record(AuditEvent::TurnCompleted {
            timestamp: Utc::now(),
            turn,
            recommend_continue: continuation.recommend,
        });

        Ok(TurnOutcome::Solved(Box::new(TurnReport {
            turn,
            solution,
            ranked: progress.ranked,
            continuation,
            reevaluation: progress.reevaluation,
            evaluated: progress.evaluated,
            pruned: progress.pruned,
            new_gaps: progress.new_gaps,
            auto_resolved: progress.auto_resolved,
            decomposed: progress.decomposed,
            settled,
            audit: audit.into_events(),
        })))
    }
}

/// Builder for `TurnEngine`.
///
/// Everything not set falls back to a default: declared gaps only, no
/// decomposition, line-joining merge, delta re-evaluation, expected-value
/// continuation, and sequential evaluation (selective when a selection
/// algorithm is set).
pub struct TurnEngineBuilder {
    generator: Arc<dyn Generator>,
    evaluator: Arc<dyn Evaluator>,
    synthesizer: Arc<dyn Synthesizer>,
    verifier: Arc<dyn ConstraintVerifier>,
    policy: Policy,
    gap_detector: Option<Arc<dyn GapDetector>>,
    decomposer: Option<Arc<dyn Decomposer>>,
    merger: Option<Arc<dyn Merger>>,
    reevaluate: Option<Arc<dyn ReEvaluate>>,
    selection: Option<Arc<dyn Selection>>,
    evidence_eval: Option<Arc<dyn EvidenceEval>>,
    judge: Option<Arc<dyn ContinuationJudge>>,
}

impl TurnEngineBuilder {
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn gap_detector(mut self, detector: Arc<dyn GapDetector>) -> Self {
        self.gap_detector = Some(detector);
        self
    }

    pub fn decomposer(mut self, decomposer: Arc<dyn Decomposer>) -> Self {
        self.decomposer = Some(decomposer);
        self
    }

    pub fn merger(mut self, merger: Arc<dyn Merger>) -> Self {
        self.merger = Some(merger);
        self
    }

    pub fn reevaluate(mut self, strategy: Arc<dyn ReEvaluate>) -> Self {
        self.reevaluate = Some(strategy);
        self
    }

    /// Used for ranking, and for budgeted evaluation unless an explicit
    /// evaluation strategy is set
    pub fn selection(mut self, selection: Arc<dyn Selection>) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn evidence_eval(mut self, strategy: Arc<dyn EvidenceEval>) -> Self {
        self.evidence_eval = Some(strategy);
        self
    }

    pub fn judge(mut self, judge: Arc<dyn ContinuationJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Validates the policy and assembles the engine.
    pub fn build(self) -> Result<TurnEngine> {
        self.policy.validate()?;

        let evidence_eval: Arc<dyn EvidenceEval> = match (self.evidence_eval, &self.selection) {
            (Some(strategy), _) => strategy,
            (None, Some(selection)) => Arc::new(SelectiveEval::new(self.evaluator, selection.clone())),
            (None, None) => Arc::new(SequentialEval::new(self.evaluator)),
        };

        Ok(TurnEngine {
            generator: self.generator,
            synthesizer: self.synthesizer,
            verifier: self.verifier,
            gap_detector: self.gap_detector.unwrap_or_else(|| Arc::new(DeclaredGapDetector)),
            decomposer: self.decomposer.unwrap_or_else(|| Arc::new(NoDecomposition)),
            merger: self.merger.unwrap_or_else(|| Arc::new(ConcatMerger)),
            reevaluate: self.reevaluate.unwrap_or_else(|| Arc::new(DeltaEval)),
            selection: self.selection,
            evidence_eval,
            judge: self.judge.unwrap_or_else(|| Arc::new(ExpectedValueJudge)),
            policy: self.policy,
        })
    }
}
