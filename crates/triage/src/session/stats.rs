//! Progress statistics.

use serde::{Deserialize, Serialize};

/// Labeling progress over a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Rows with a label.
    pub annotated: usize,
    /// All rows.
    pub total: usize,
    /// Rows set aside for later.
    pub skipped: usize,
}

impl SessionStats {
    /// Rows still without a label.
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.annotated)
    }

    /// Fraction of rows labeled (0.0 to 1.0). An empty table counts as done.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.annotated as f64 / self.total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.annotated >= self.total
    }
}
