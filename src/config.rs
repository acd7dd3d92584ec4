//! Tunable thresholds shared by the diff, match and patch engines.

use std::time::Duration;

use crate::error::{Error, Result};

/// Number of bits in the bitap machine word.
///
/// Patterns handed to the bitap matcher may not be longer than this. Patch
/// construction and application keep their match patterns within it.
pub const MATCH_MAX_BITS: usize = 32;

/// Engine configuration.
///
/// A `Config` is read-only for the duration of every operation. Build one,
/// hand it to [`DiffMatchPatch::with_config`](crate::DiffMatchPatch::with_config)
/// and it stays fixed for the lifetime of that engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Time budget for one diff before falling back to a coarse result.
    /// Zero means no limit.
    pub diff_timeout: Duration,
    /// Cost of an empty edit operation in terms of edit characters.
    pub diff_edit_cost: usize,
    /// At what point no match is declared (0.0 = perfection, 1.0 = very loose).
    pub match_threshold: f64,
    /// How far to search for a match (0 = exact location, 1000+ = broad match).
    /// A match this many characters away from the expected location adds 1.0
    /// to its score.
    pub match_distance: usize,
    /// When deleting a large block of text, how closely its contents must
    /// match the expected contents (0.0 = perfection, 1.0 = very loose).
    pub patch_delete_threshold: f64,
    /// Number of context characters kept around each patch.
    pub patch_margin: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            diff_timeout: Duration::from_secs(1),
            diff_edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            patch_delete_threshold: 0.5,
            patch_margin: 4,
        }
    }
}

impl Config {
    /// Sets the diff time budget. `Duration::ZERO` disables the deadline.
    pub fn with_diff_timeout(mut self, timeout: Duration) -> Self {
        self.diff_timeout = timeout;
        self
    }

    /// Sets the cost of an empty edit used by efficiency cleanup.
    pub fn with_diff_edit_cost(mut self, cost: usize) -> Self {
        self.diff_edit_cost = cost;
        self
    }

    /// Sets the fuzzy match acceptance threshold.
    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Sets the fuzzy match search radius.
    pub fn with_match_distance(mut self, distance: usize) -> Self {
        self.match_distance = distance;
        self
    }

    /// Sets the content similarity floor for large deletions.
    pub fn with_patch_delete_threshold(mut self, threshold: f64) -> Self {
        self.patch_delete_threshold = threshold;
        self
    }

    /// Sets the number of context characters around each patch.
    pub fn with_patch_margin(mut self, margin: usize) -> Self {
        self.patch_margin = margin;
        self
    }

    /// Checks that every value is within the range the engines support.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a threshold is not a finite number
    /// in `0.0..=1.0`, if the patch margin is zero, or if it leaves no room
    /// for patch content inside a [`MATCH_MAX_BITS`]-wide match pattern.
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("match_threshold", self.match_threshold)?;
        check_unit_interval("patch_delete_threshold", self.patch_delete_threshold)?;

        let fits = self
            .patch_margin
            .checked_mul(2)
            .is_some_and(|width| width < MATCH_MAX_BITS);
        if self.patch_margin == 0 || !fits {
            return Err(Error::InvalidConfig(format!(
                "patch_margin {} must be within 1..{}",
                self.patch_margin,
                MATCH_MAX_BITS / 2
            )));
        }

        Ok(())
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be within 0.0..=1.0, got {value}"
        )))
    }
}
