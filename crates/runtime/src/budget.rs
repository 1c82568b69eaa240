/// Per-frame dispatch budget.
///
/// Budgets count abstract work units (one per fetch job by default) rather
/// than wall-clock time, so scheduling stays deterministic and replayable.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameBudget {
    limit: u32,
    spent: u32,
}

impl FrameBudget {
    pub fn new(units: u32) -> Self {
        Self {
            limit: units,
            spent: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(u32::MAX)
    }

    pub fn remaining(&self) -> u32 {
        self.limit - self.spent
    }

    pub fn spent(&self) -> u32 {
        self.spent
    }

    pub fn is_exhausted(&self) -> bool {
        self.spent >= self.limit
    }

    /// Consumes `units` if they fit; leaves the budget untouched otherwise.
    pub fn try_consume(&mut self, units: u32) -> bool {
        if self.remaining() < units {
            return false;
        }
        self.spent += units;
        true
    }
}
