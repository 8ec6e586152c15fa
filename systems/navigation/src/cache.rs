//! Cached grid path that an actor follows between re-plans.

use std::time::Duration;

use crawler_core::{Grid, GridPoint};

use crate::find_path;

/// Minimum age of a cached path before it is recomputed for the same target.
pub const REPATH_INTERVAL: Duration = Duration::from_millis(800);

/// Path toward a moving target together with the follower's progress along it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathCache {
    path: Vec<GridPoint>,
    index: usize,
    target: Option<GridPoint>,
    computed_at: Option<Duration>,
}

impl PathCache {
    /// Creates an empty cache that recomputes on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the path when there is none, the target cell changed, or
    /// the cached path is older than [`REPATH_INTERVAL`].
    ///
    /// Returns `true` when a new path was computed.
    pub fn refresh(&mut self, now: Duration, from: GridPoint, target: GridPoint, grid: &Grid) -> bool {
        let stale = match self.computed_at {
            Some(computed_at) => now.saturating_sub(computed_at) > REPATH_INTERVAL,
            None => true,
        };
        if !stale && self.target == Some(target) {
            return false;
        }

        self.path = find_path(from, target, grid);
        self.index = 0;
        self.target = Some(target);
        self.computed_at = Some(now);
        true
    }

    /// Cell the follower is currently heading for, if the path is not exhausted.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<GridPoint> {
        self.path.get(self.index).copied()
    }

    /// Moves on to the following waypoint.
    pub fn advance(&mut self) {
        self.index = (self.index + 1).min(self.path.len());
    }

    /// Remaining cells of the cached path.
    #[must_use]
    pub fn remaining(&self) -> &[GridPoint] {
        self.path.get(self.index..).unwrap_or(&[])
    }

    /// Drops the cached path so the next refresh recomputes it.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
