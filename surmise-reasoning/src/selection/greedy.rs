//! Greedy selection: always evaluate the most confident unvisited candidate

use crate::hypothesis::Hypothesis;
use crate::policy::Policy;
use crate::selection::{argmax, rank_by, Selection, SelectionRound};

/// Pure exploitation
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl Selection for Greedy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn next(
        &self,
        candidates: &[Hypothesis],
        round: &mut SelectionRound,
        _policy: &Policy,
    ) -> Option<usize> {
        argmax(
            round.unvisited().filter(|&i| i < candidates.len()),
            |i| candidates[i].confidence.value(),
        )
    }

    fn rank(&self, candidates: &[Hypothesis], _policy: &Policy) -> Vec<usize> {
        rank_by(candidates, |h| h.confidence.value())
    }
}
