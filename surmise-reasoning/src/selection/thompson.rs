//! Thompson sampling over Beta posteriors
//!
//! Each hypothesis maps to a Beta distribution with
//! `alpha = c*n + 1` and `beta = (1-c)*n + 1`, where `c` is its confidence
//! and `n = max(eval_count, 1)`. A round draws one sample per unvisited
//! candidate and takes the highest. Samples come from a Normal
//! approximation of `Beta(alpha/v, beta/v)` with `v = volatility + 0.5`,
//! which keeps the mean and widens the spread for volatile hypotheses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::hypothesis::Hypothesis;
use crate::policy::Policy;
use crate::selection::{argmax, rank_by, Selection, SelectionRound};

/// Offset added to volatility to get the variance scale
const VOLATILITY_SPREAD_OFFSET: f64 = 0.5;

/// Beta parameters for a hypothesis with the given evaluation history
pub fn beta_params(eval_count: u32, confidence: f64) -> (f64, f64) {
    let n = f64::from(eval_count.max(1));
    (confidence * n + 1.0, (1.0 - confidence) * n + 1.0)
}

pub fn beta_mean(alpha: f64, beta: f64) -> f64 {
    alpha / (alpha + beta)
}

fn beta_variance(alpha: f64, beta: f64) -> f64 {
    let sum = alpha + beta;
    (alpha * beta) / (sum.powi(2) * (sum + 1.0))
}

/// Standard normal draw (Box-Muller)
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // gen() is in [0, 1); flip it so ln never sees zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// One approximate sample from `Beta(alpha/v, beta/v)`, clamped to [0, 1]
pub fn sample_beta<R: Rng + ?Sized>(alpha: f64, beta: f64, volatility: f64, rng: &mut R) -> f64 {
    let v = volatility + VOLATILITY_SPREAD_OFFSET;
    let (a, b) = (alpha / v, beta / v);
    let mean = beta_mean(a, b);
    let std_dev = beta_variance(a, b).sqrt();
    (mean + std_dev * standard_normal(rng)).clamp(0.0, 1.0)
}

/// Thompson sampling; seed it for reproducible rounds
#[derive(Clone, Copy, Debug, Default)]
pub struct Thompson {
    seed: Option<u64>,
}

impl Thompson {
    pub fn new() -> Self {
        Self { seed: None }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl Selection for Thompson {
    fn name(&self) -> &'static str {
        "thompson"
    }

    fn init(&self, candidates: &[Hypothesis]) -> SelectionRound {
        let mut round = SelectionRound::new(candidates.len());
        round.beta = candidates
            .iter()
            .map(|h| beta_params(h.eval_count, h.confidence.value()))
            .collect();
        round.rng = Some(match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        });
        round
    }

    fn next(
        &self,
        candidates: &[Hypothesis],
        round: &mut SelectionRound,
        _policy: &Policy,
    ) -> Option<usize> {
        let len = candidates.len().min(round.len());
        let indices: Vec<usize> = round.unvisited().filter(|&i| i < len).collect();
        if indices.is_empty() {
            return None;
        }

        let SelectionRound { beta, rng, .. } = round;
        let rng = rng.get_or_insert_with(StdRng::from_entropy);
        argmax(indices, |i| {
            let (alpha, b) = beta.get(i).copied().unwrap_or_else(|| {
                beta_params(candidates[i].eval_count, candidates[i].confidence.value())
            });
            sample_beta(alpha, b, candidates[i].confidence.volatility(), &mut *rng)
        })
    }

    fn update(&self, index: usize, hypothesis: &mut Hypothesis, round: &mut SelectionRound) {
        let observed = hypothesis.confidence.value();
        if let Some((alpha, beta)) = round.beta.get_mut(index) {
            if observed > 0.5 {
                *alpha += observed;
            } else {
                *beta += observed;
            }
        }
        hypothesis.eval_count += 1;
        round.record(index, observed);
    }

    fn rank(&self, candidates: &[Hypothesis], _policy: &Policy) -> Vec<usize> {
        rank_by(candidates, |h| {
            let (alpha, beta) = beta_params(h.eval_count, h.confidence.value());
            beta_mean(alpha, beta)
        })
    }
}
