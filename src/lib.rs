//! # dmpatch
//!
//! Diff, fuzzy match and patch for plain text.
//!
//! `dmpatch` computes a human-readable edit script between two texts, turns it
//! into a compact textual patch, and applies that patch to a text that may
//! have drifted since the patch was made.
//!
//! ## Quick Start
//!
//! ```
//! use dmpatch::{make_patch, apply_patch};
//!
//! let old = "The quick brown fox jumps over the lazy dog.";
//! let new = "The quick brown fox jumped over the lazy cat.";
//!
//! // Build a patch
//! let patch = make_patch(old, new);
//!
//! // Apply it to the old text
//! let (patched, applied) = apply_patch(&patch, old).unwrap();
//! assert_eq!(patched, new);
//! assert!(applied.iter().all(|&ok| ok));
//! ```
//!
//! For control over time budgets, match tolerance and patch context, build a
//! [`DiffMatchPatch`] from a [`Config`] and use its methods directly.
//!
//! ## Algorithm Details
//!
//! The engine works in three layers:
//! 1. Diff: Myers' O(ND) bisection, sped up by common prefix/suffix removal,
//!    a half-match heuristic and a line-level pre-pass for long texts, then
//!    cleaned up for readability
//! 2. Match: the bitap algorithm, scoring candidates by error count and
//!    distance from the expected location
//! 3. Patch: hunks with enough context to be unique, relocated with the
//!    matcher when applied and re-diffed when the surrounding text changed
//!
//! All offsets and lengths count Unicode scalar values (`char`s), not bytes.
//!
//! ## Wire Formats
//!
//! Patches serialize to a unidiff-like text (`@@ -1,8 +1,7 @@` headers and
//! percent-encoded bodies) that other diff-match-patch ports read and write.
//! Diffs also serialize to a tab-separated delta against the source text.
//! With the `zstd` or `lz4` feature, the [`codec`] module compresses patch
//! sets for transport.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod cleanup;
pub mod codec;
mod config;
mod diff;
mod encoding;
mod error;
mod matcher;
mod patch;
mod sequence;

pub use codec::{Codec, Compression, compress_patches, decompress_patches};
pub use config::{Config, MATCH_MAX_BITS};
pub use diff::{Diff, Op};
pub use error::{Error, Result};
pub use patch::{Patch, PatchInput};

/// The diff, match and patch engine.
///
/// An engine holds one immutable [`Config`]; every operation takes `&self`,
/// so a single engine can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct DiffMatchPatch {
    config: Config,
}

impl DiffMatchPatch {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a value is out of range; see
    /// [`Config::validate`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use dmpatch::{Config, DiffMatchPatch};
    ///
    /// let dmp = DiffMatchPatch::with_config(
    ///     Config::default().with_diff_timeout(Duration::ZERO),
    /// )?;
    /// assert!(DiffMatchPatch::with_config(Config::default().with_match_threshold(2.0)).is_err());
    /// # Ok::<(), dmpatch::Error>(())
    /// ```
    pub fn with_config(config: Config) -> Result<Self> {
        if let Err(e) = config.validate() {
            tracing::debug!(error = %e, "Rejected engine configuration");
            return Err(e);
        }
        Ok(Self { config })
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Computes the Levenshtein distance of a diff list: inserted, deleted
    /// or substituted characters.
    pub fn diff_levenshtein(&self, diffs: &[Diff]) -> usize {
        sequence::levenshtein(diffs)
    }
}

/// Creates a patch turning `old` into `new`, in patch text format.
///
/// Uses the default configuration. The result can be handed to
/// [`apply_patch`] on this or another machine.
///
/// # Examples
///
/// ```
/// use dmpatch::make_patch;
///
/// let patch = make_patch("Hello, World!", "Hello, Rust!");
/// assert!(patch.starts_with("@@ -"));
///
/// // Identical texts need no patch
/// assert!(make_patch("same", "same").is_empty());
/// ```
pub fn make_patch(old: &str, new: &str) -> String {
    let dmp = DiffMatchPatch::new();
    let patches = dmp.patch_make(PatchInput::Texts(old, new));
    dmp.patch_to_text(&patches)
}

/// Parses `patch` and applies it to `text` with the default configuration.
///
/// Returns the patched text and whether each hunk applied. A hunk that
/// cannot be located is skipped, not an error.
///
/// # Errors
///
/// Returns an error if `patch` is not valid patch text.
///
/// # Examples
///
/// ```
/// use dmpatch::{apply_patch, make_patch};
///
/// let patch = make_patch("The cat sat on the mat.", "The cat sat on the hat.");
///
/// // The text drifted since the patch was made; the hunk still lands
/// let (patched, applied) = apply_patch(&patch, "Look: The cat sat on the mat.")?;
/// assert_eq!(patched, "Look: The cat sat on the hat.");
/// assert_eq!(applied, vec![true]);
/// # Ok::<(), dmpatch::Error>(())
/// ```
pub fn apply_patch(patch: &str, text: &str) -> Result<(String, Vec<bool>)> {
    let dmp = DiffMatchPatch::new();
    let patches = dmp.patch_from_text(patch)?;
    Ok(dmp.patch_apply(&patches, text))
}
