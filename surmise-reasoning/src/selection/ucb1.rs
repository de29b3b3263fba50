//! UCB1 selection
//!
//! Unvisited candidates score infinitely and are always taken first. Once
//! every candidate has been tried, the score is the mean observed reward
//! plus `C * sqrt(ln N / n_i)`.
//!
//! `rank` works without a live round: it uses each hypothesis's persisted
//! `eval_count` (at least 1) as `n_i`, their sum as `N`, and the current
//! confidence as the exploitation term. The two exploration bonuses are
//! independent approximations and are not expected to agree numerically.

use crate::hypothesis::Hypothesis;
use crate::policy::Policy;
use crate::selection::{argmax, rank_by, Selection, SelectionRound};

/// Upper-confidence-bound selection
#[derive(Clone, Copy, Debug, Default)]
pub struct Ucb1;

/// UCB1 score for a candidate with `visits` visits out of `total`
pub fn ucb_score(mean_reward: f64, visits: u32, total: u32, exploration: f64) -> f64 {
    if visits == 0 {
        return f64::INFINITY;
    }
    let total = f64::from(total.max(1));
    mean_reward + exploration * (total.ln() / f64::from(visits)).sqrt()
}

impl Selection for Ucb1 {
    fn name(&self) -> &'static str {
        "ucb1"
    }

    fn next(
        &self,
        candidates: &[Hypothesis],
        round: &mut SelectionRound,
        policy: &Policy,
    ) -> Option<usize> {
        let len = candidates.len().min(round.len());
        if len == 0 {
            return None;
        }

        // exploration first; confidence breaks ties between unvisited
        let unvisited = argmax(
            (0..len).filter(|&i| round.visits(i) == 0),
            |i| candidates[i].confidence.value(),
        );
        if unvisited.is_some() {
            return unvisited;
        }

        let total = round.total_visits();
        argmax(0..len, |i| {
            let n = round.visits(i);
            ucb_score(round.reward(i) / f64::from(n), n, total, policy.exploration_constant)
        })
    }

    fn rank(&self, candidates: &[Hypothesis], policy: &Policy) -> Vec<usize> {
        let total: u32 = candidates.iter().map(|h| h.eval_count.max(1)).sum();
        rank_by(candidates, |h| {
            ucb_score(
                h.confidence.value(),
                h.eval_count.max(1),
                total,
                policy.exploration_constant,
            )
        })
    }
}
