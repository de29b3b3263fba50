//! Problem aggregate
//!
//! A `Problem` exclusively owns everything the engine reasons about: known
//! facts, gaps, constraints, the hypotheses accumulated across turns and the
//! solutions produced by each turn. Strategies receive it by `&mut` for the
//! duration of one call and never hold on to it.

pub mod gap;
pub mod known;
pub mod solution;

pub use gap::{AutoResolve, Gap, GapStatus};
pub use known::{KnownFact, KnownFacts, SOURCE_GIVEN, SOURCE_INFERRED, SOURCE_USER};
pub use solution::{Constraint, Solution};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ReasoningError, Result};
use crate::hypothesis::Hypothesis;

/// Statement words that add one unit of complexity
const WORDS_PER_COMPLEXITY_UNIT: usize = 25;

/// Gap tallies by status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapCounts {
    pub open: usize,
    pub answered: usize,
    pub skipped: usize,
    pub unanswerable: usize,
}

/// An open problem and everything accumulated while solving it
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Problem {
    pub statement: String,
    pub known: KnownFacts,
    gaps: Vec<Gap>,
    pub constraints: Vec<Constraint>,
    hypotheses: Vec<Hypothesis>,
    solutions: Vec<Solution>,
    pub turn_count: u32,
    pub gap_rounds: u32,
    known_snapshot: Option<KnownFacts>,
    /// Nesting depth; 0 for a top-level problem
    pub depth: u32,
    sub_problems: Vec<Problem>,
    /// Set while a turn is suspended waiting for gap answers
    pub awaiting_input: bool,
}

impl Problem {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            ..Default::default()
        }
    }

    pub fn with_known(mut self, key: impl Into<String>, fact: KnownFact) -> Self {
        self.set_known(key, fact);
        self
    }

    pub fn with_constraint(mut self, description: impl Into<String>) -> Self {
        self.constraints.push(Constraint::new(description));
        self
    }

    pub fn with_gap(mut self, gap: Gap) -> Self {
        self.add_gap(gap);
        self
    }

    // ----- known facts -----

    /// Insert or wholesale-replace a known fact
    pub fn set_known(&mut self, key: impl Into<String>, fact: KnownFact) {
        self.known.insert(key.into(), fact);
    }

    pub fn known_fact(&self, key: &str) -> Option<&KnownFact> {
        self.known.get(key)
    }

    /// Number of known facts below the given confidence
    pub fn low_confidence_known(&self, bound: f64) -> usize {
        self.known
            .values()
            .filter(|f| f.confidence() < bound)
            .count()
    }

    /// Keys whose fact was added, replaced with a different value or
    /// confidence, or removed since the last snapshot. Before the first
    /// snapshot every key counts as changed.
    pub fn changed_known_keys(&self) -> Vec<String> {
        let Some(snapshot) = &self.known_snapshot else {
            return self.known.keys().cloned().collect();
        };
        let mut changed: Vec<String> = self
            .known
            .iter()
            .filter(|(key, fact)| snapshot.get(*key) != Some(*fact))
            .map(|(key, _)| key.clone())
            .collect();
        changed.extend(
            snapshot
                .keys()
                .filter(|key| !self.known.contains_key(*key))
                .cloned(),
        );
        changed
    }

    /// Replace the snapshot with a copy of the current known facts
    pub fn take_snapshot(&mut self) {
        self.known_snapshot = Some(self.known.clone());
    }

    pub fn known_snapshot(&self) -> Option<&KnownFacts> {
        self.known_snapshot.as_ref()
    }

    // ----- gaps -----

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn gap(&self, key: &str) -> Option<&Gap> {
        self.gaps.iter().find(|g| g.key == key)
    }

    /// Add a gap unless one with the same key exists. Returns whether it was added.
    pub fn add_gap(&mut self, gap: Gap) -> bool {
        if self.gap(&gap.key).is_some() {
            return false;
        }
        self.gaps.push(gap);
        true
    }

    fn gap_mut(&mut self, key: &str) -> Result<&mut Gap> {
        self.gaps
            .iter_mut()
            .find(|g| g.key == key)
            .ok_or_else(|| ReasoningError::NotFound(format!("gap '{}'", key)))
    }

    /// Answer a gap by storing a fact under its key
    pub fn fill_gap(&mut self, key: &str, fact: KnownFact) -> Result<()> {
        self.gap_mut(key)?.transition(GapStatus::Answered)?;
        debug!(gap = key, source = fact.source(), "gap filled");
        self.set_known(key, fact);
        Ok(())
    }

    pub fn skip_gap(&mut self, key: &str) -> Result<()> {
        self.gap_mut(key)?.transition(GapStatus::Skipped)
    }

    pub fn mark_unanswerable(&mut self, key: &str) -> Result<()> {
        self.gap_mut(key)?.transition(GapStatus::Unanswerable)
    }

    /// Mark open gaps whose key already holds a known fact as answered.
    /// Covers callers that answer by setting facts directly. Returns the
    /// keys closed.
    pub fn answer_known_gaps(&mut self) -> Vec<String> {
        let mut closed = Vec::new();
        for gap in self.gaps.iter_mut() {
            if gap.is_open()
                && self.known.contains_key(&gap.key)
                && gap.transition(GapStatus::Answered).is_ok()
            {
                closed.push(gap.key.clone());
            }
        }
        closed
    }

    pub fn open_gaps(&self) -> Vec<&Gap> {
        self.gaps.iter().filter(|g| g.is_open()).collect()
    }

    pub fn open_required_gaps(&self) -> Vec<&Gap> {
        self.gaps
            .iter()
            .filter(|g| g.is_open() && g.required)
            .collect()
    }

    pub fn gap_counts(&self) -> GapCounts {
        let mut counts = GapCounts::default();
        for gap in &self.gaps {
            match gap.status() {
                GapStatus::Open => counts.open += 1,
                GapStatus::Answered => counts.answered += 1,
                GapStatus::Skipped => counts.skipped += 1,
                GapStatus::Unanswerable => counts.unanswerable += 1,
            }
        }
        counts
    }

    // ----- hypotheses -----

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    /// In-place access; hypotheses cannot be removed or reordered
    pub fn hypotheses_mut(&mut self) -> &mut [Hypothesis] {
        &mut self.hypotheses
    }

    /// Mutable hypotheses alongside read-only known facts
    pub fn hypotheses_with_known(&mut self) -> (&mut [Hypothesis], &KnownFacts) {
        (&mut self.hypotheses, &self.known)
    }

    pub fn append_hypotheses(&mut self, new: impl IntoIterator<Item = Hypothesis>) {
        self.hypotheses.extend(new);
    }

    pub fn live_hypotheses(&self) -> Vec<&Hypothesis> {
        self.hypotheses.iter().filter(|h| h.is_live()).collect()
    }

    /// Keep the `keep` most confident live hypotheses and supersede the
    /// rest. Returns how many were superseded.
    pub fn prune_hypotheses(&mut self, keep: usize) -> usize {
        let mut live: Vec<usize> = (0..self.hypotheses.len())
            .filter(|&i| self.hypotheses[i].is_live())
            .collect();
        if live.len() <= keep {
            return 0;
        }
        live.sort_by(|&a, &b| {
            self.hypotheses[b]
                .confidence
                .value()
                .partial_cmp(&self.hypotheses[a].confidence.value())
                .unwrap_or(Ordering::Equal)
        });
        let excess = &live[keep..];
        for &i in excess {
            self.hypotheses[i].supersede();
        }
        debug!(pruned = excess.len(), keep, "pruned hypotheses");
        excess.len()
    }

    // ----- solutions -----

    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn latest_solution(&self) -> Option<&Solution> {
        self.solutions.last()
    }

    pub fn record_solution(&mut self, solution: Solution) {
        self.solutions.push(solution);
    }

    // ----- decomposition -----

    pub fn sub_problems(&self) -> &[Problem] {
        &self.sub_problems
    }

    pub fn set_sub_problems(&mut self, subs: Vec<Problem>) {
        self.sub_problems = subs;
    }

    /// Rough size of the problem: constraints, open gaps, and one unit per
    /// 25 words of statement
    pub fn complexity(&self) -> usize {
        let words = self.statement.split_whitespace().count();
        self.constraints.len() + self.open_gaps().len() + words / WORDS_PER_COMPLEXITY_UNIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::{Confidence, HypothesisStatus};

    fn hypothesis(claim: &str, value: f64) -> Hypothesis {
        Hypothesis::new(claim).with_confidence(Confidence::new(value, 0.5, "test"))
    }

    #[test]
    fn test_prune_supersedes_excess() {
        let mut p = Problem::new("p");
        p.append_hypotheses(vec![
            hypothesis("a", 0.9),
            hypothesis("b", 0.1),
            hypothesis("c", 0.5),
            hypothesis("d", 0.7),
            hypothesis("e", 0.3),
        ]);

        assert_eq!(p.prune_hypotheses(3), 2);
        assert_eq!(p.live_hypotheses().len(), 3);
        let superseded: Vec<_> = p
            .hypotheses()
            .iter()
            .filter(|h| h.status() == HypothesisStatus::Superseded)
            .map(|h| h.claim())
            .collect();
        assert_eq!(superseded, vec!["b", "e"]);

        assert_eq!(p.prune_hypotheses(3), 0);
    }

    #[test]
    fn test_prune_within_cap_is_noop() {
        let mut p = Problem::new("p");
        p.append_hypotheses(vec![hypothesis("a", 0.9)]);
        assert_eq!(p.prune_hypotheses(5), 0);
        assert_eq!(p.live_hypotheses().len(), 1);
    }

    #[test]
    fn test_add_gap_dedupes_by_key() {
        let mut p = Problem::new("p");
        assert!(p.add_gap(Gap::new("budget", "How much?")));
        assert!(!p.add_gap(Gap::new("budget", "How much, again?")));
        assert_eq!(p.gaps().len(), 1);
    }

    #[test]
    fn test_fill_gap_records_fact() {
        let mut p = Problem::new("p").with_gap(Gap::new("budget", "How much?"));
        p.fill_gap("budget", KnownFact::user("5000", 0.9)).unwrap();

        assert_eq!(p.gap("budget").unwrap().status(), GapStatus::Answered);
        assert_eq!(p.known_fact("budget").unwrap().value(), "5000");
        assert!(p.open_required_gaps().is_empty());

        // refilling the same key is allowed
        p.fill_gap("budget", KnownFact::user("6000", 0.9)).unwrap();
        assert_eq!(p.known_fact("budget").unwrap().value(), "6000");
    }

    #[test]
    fn test_fill_missing_gap_is_not_found() {
        let mut p = Problem::new("p");
        let err = p.fill_gap("nope", KnownFact::user("x", 1.0)).unwrap_err();
        assert!(matches!(err, ReasoningError::NotFound(_)));
    }

    #[test]
    fn test_gap_counts() {
        let mut p = Problem::new("p")
            .with_gap(Gap::new("a", "?"))
            .with_gap(Gap::new("b", "?"))
            .with_gap(Gap::new("c", "?"))
            .with_gap(Gap::optional("d", "?"));
        p.skip_gap("a").unwrap();
        p.mark_unanswerable("b").unwrap();
        p.fill_gap("c", KnownFact::user("x", 1.0)).unwrap();

        let counts = p.gap_counts();
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.unanswerable, 1);
        assert_eq!(counts.answered, 1);
        assert_eq!(counts.open, 1);
        assert!(p.open_required_gaps().is_empty());
    }

    #[test]
    fn test_changed_known_keys() {
        let mut p = Problem::new("p")
            .with_known("budget", KnownFact::user("5000", 0.9))
            .with_known("team", KnownFact::given("4 people"));

        assert_eq!(p.changed_known_keys().len(), 2);
        p.take_snapshot();
        assert!(p.changed_known_keys().is_empty());

        p.set_known("budget", KnownFact::user("5000", 0.4));
        p.set_known("deadline", KnownFact::user("friday", 0.8));
        assert_eq!(p.changed_known_keys(), vec!["budget", "deadline"]);

        p.take_snapshot();
        p.known.shift_remove("team");
        assert_eq!(p.changed_known_keys(), vec!["team"]);
    }

    #[test]
    fn test_low_confidence_known() {
        let p = Problem::new("p")
            .with_known("a", KnownFact::user("x", 0.3))
            .with_known("b", KnownFact::user("y", 0.9));
        assert_eq!(p.low_confidence_known(0.5), 1);
    }

    #[test]
    fn test_complexity() {
        let p = Problem::new("short statement")
            .with_constraint("under budget")
            .with_constraint("ships by friday")
            .with_gap(Gap::new("k", "?"));
        assert_eq!(p.complexity(), 3);
    }

    #[test]
    fn test_answer_known_gaps() {
        let mut p = Problem::new("p")
            .with_gap(Gap::new("budget", "What is the budget?"))
            .with_gap(Gap::new("deadline", "When?"));
        p.set_known("budget", KnownFact::user("5000", 0.9));

        assert_eq!(p.answer_known_gaps(), vec!["budget"]);
        assert_eq!(p.gap("budget").unwrap().status(), GapStatus::Answered);
        assert!(p.gap("deadline").unwrap().is_open());
        assert!(p.answer_known_gaps().is_empty());
    }
}
