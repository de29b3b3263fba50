//! Hypothesis selection (bandit core)
//!
//! Every algorithm exposes the same four operations:
//!
//! - `init`: start a selection round over a candidate list
//! - `next`: pick the next candidate to evaluate, or `None`
//! - `update`: record the outcome of evaluating a candidate
//! - `rank`: order candidates without running a round
//!
//! Rounds are plain state owned by the caller, so one `Selection` value
//! can serve any number of problems concurrently.

pub mod greedy;
pub mod thompson;
pub mod ucb1;

pub use greedy::Greedy;
pub use thompson::{beta_mean, beta_params, sample_beta, Thompson};
pub use ucb1::Ucb1;

use std::cmp::Ordering;

use rand::rngs::StdRng;

use crate::hypothesis::Hypothesis;
use crate::policy::Policy;

/// Per-round bookkeeping for a selection algorithm
#[derive(Clone, Debug)]
pub struct SelectionRound {
    visited: Vec<bool>,
    visits: Vec<u32>,
    rewards: Vec<f64>,
    total_visits: u32,
    /// Beta parameters per candidate; only Thompson fills these in
    pub(crate) beta: Vec<(f64, f64)>,
    pub(crate) rng: Option<StdRng>,
}

impl SelectionRound {
    pub fn new(len: usize) -> Self {
        Self {
            visited: vec![false; len],
            visits: vec![0; len],
            rewards: vec![0.0; len],
            total_visits: 0,
            beta: Vec::new(),
            rng: None,
        }
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    pub fn is_visited(&self, index: usize) -> bool {
        self.visited.get(index).copied().unwrap_or(false)
    }

    pub fn visits(&self, index: usize) -> u32 {
        self.visits.get(index).copied().unwrap_or(0)
    }

    pub fn reward(&self, index: usize) -> f64 {
        self.rewards.get(index).copied().unwrap_or(0.0)
    }

    pub fn total_visits(&self) -> u32 {
        self.total_visits
    }

    /// Indices not yet visited this round
    pub fn unvisited(&self) -> impl Iterator<Item = usize> + '_ {
        self.visited
            .iter()
            .enumerate()
            .filter(|(_, v)| !**v)
            .map(|(i, _)| i)
    }

    /// Record one evaluation of `index` with the observed reward
    pub fn record(&mut self, index: usize, reward: f64) {
        if index >= self.len() {
            return;
        }
        self.visited[index] = true;
        self.visits[index] += 1;
        self.rewards[index] += reward;
        self.total_visits += 1;
    }
}

/// Uniform contract for hypothesis selection algorithms
pub trait Selection: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Start a round over `candidates`
    fn init(&self, candidates: &[Hypothesis]) -> SelectionRound {
        SelectionRound::new(candidates.len())
    }

    /// Index of the next candidate to evaluate
    fn next(
        &self,
        candidates: &[Hypothesis],
        round: &mut SelectionRound,
        policy: &Policy,
    ) -> Option<usize>;

    /// Record that `hypothesis` (at `index`) was evaluated. The observed
    /// reward is its confidence after evaluation.
    fn update(&self, index: usize, hypothesis: &mut Hypothesis, round: &mut SelectionRound) {
        hypothesis.eval_count += 1;
        round.record(index, hypothesis.confidence.value());
    }

    /// Candidate indices, best first. Pure.
    fn rank(&self, candidates: &[Hypothesis], policy: &Policy) -> Vec<usize>;
}

/// Indices sorted by descending score; equal scores keep their input order
pub(crate) fn rank_by<F>(candidates: &[Hypothesis], mut score: F) -> Vec<usize>
where
    F: FnMut(&Hypothesis) -> f64,
{
    let scores: Vec<f64> = candidates.iter().map(&mut score).collect();
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
    order
}

/// Best index among `indices` by score; the first wins ties
pub(crate) fn argmax<I, F>(indices: I, mut score: F) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
    F: FnMut(usize) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for i in indices {
        let s = score(i);
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::Confidence;

    #[test]
    fn test_round_record() {
        let mut round = SelectionRound::new(3);
        round.record(1, 0.7);
        round.record(1, 0.5);
        assert!(round.is_visited(1));
        assert_eq!(round.visits(1), 2);
        assert!((round.reward(1) - 1.2).abs() < 1e-12);
        assert_eq!(round.total_visits(), 2);
        assert_eq!(round.unvisited().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_round_ignores_out_of_range() {
        let mut round = SelectionRound::new(1);
        round.record(5, 1.0);
        assert_eq!(round.total_visits(), 0);
    }

    #[test]
    fn test_rank_by_is_stable() {
        let hs: Vec<Hypothesis> = [0.5, 0.9, 0.5]
            .iter()
            .map(|v| Hypothesis::new("h").with_confidence(Confidence::new(*v, 0.5, "t")))
            .collect();
        assert_eq!(rank_by(&hs, |h| h.confidence.value()), vec![1, 0, 2]);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        let scores = [0.3, 0.8, 0.8];
        assert_eq!(argmax(0..3, |i| scores[i]), Some(1));
        assert_eq!(argmax(std::iter::empty(), |i| scores[i]), None);
    }
}
