//! Default gap detection.

use async_trait::async_trait;
use surmise_reasoning::{Gap, Problem};

use crate::collaborators::GapDetector;

/// Reports the problem's own open required gaps.
///
/// Suits callers that declare every question up front and have no oracle
/// for discovering new ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclaredGapDetector;

#[async_trait]
impl GapDetector for DeclaredGapDetector {
    async fn detect(&self, problem: &Problem) -> Vec<Gap> {
        problem.open_required_gaps().into_iter().cloned().collect()
    }
}
