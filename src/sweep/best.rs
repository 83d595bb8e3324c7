//! Running best-degree bookkeeping.

use crate::domain::BestDegree;

/// Tracks the lowest validation MAE seen so far.
///
/// Only a strictly lower MAE replaces the current best, so ties keep the
/// earlier (lower) degree and NaN never wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BestTracker {
    best: Option<BestDegree>,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one degree's validation MAE. Returns `true` if it became the best.
    pub fn observe(&mut self, degree: u32, val_mae: f64) -> bool {
        let current = self.best.map_or(f64::INFINITY, |b| b.val_mae);
        if val_mae < current {
            self.best = Some(BestDegree { degree, val_mae });
            true
        } else {
            false
        }
    }

    pub fn best(&self) -> Option<BestDegree> {
        self.best
    }
}
