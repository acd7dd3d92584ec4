//! Approximate string location.
//!
//! The matcher answers "where in `text` does something like `pattern` occur,
//! preferably near `loc`?". Exact hits at the expected location are returned
//! directly; everything else goes through the bitap algorithm, which scores
//! each candidate by its error count and its distance from `loc`.

use std::collections::HashMap;

use crate::DiffMatchPatch;
use crate::config::MATCH_MAX_BITS;
use crate::sequence::{find, rfind};

impl DiffMatchPatch {
    /// Locates the best instance of `pattern` in `text` near `loc`.
    ///
    /// Returns `None` when nothing scores within
    /// [`Config::match_threshold`](crate::Config::match_threshold). Offsets
    /// count chars, not bytes.
    ///
    /// Patterns longer than [`MATCH_MAX_BITS`] cannot be fuzzy matched; for
    /// those only the exact occurrence nearest `loc` is considered.
    ///
    /// # Examples
    ///
    /// ```
    /// use dmpatch::DiffMatchPatch;
    ///
    /// let dmp = DiffMatchPatch::new();
    /// assert_eq!(dmp.match_main("abcdefg", "efg", 3), Some(4));
    /// assert_eq!(dmp.match_main("abcdef", "xyz", 3), None);
    /// ```
    pub fn match_main(&self, text: &str, pattern: &str, loc: usize) -> Option<usize> {
        let text: Vec<char> = text.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        self.match_chars(&text, &pattern, loc)
    }

    pub(crate) fn match_chars(&self, text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
        let loc = loc.min(text.len());

        if text == pattern {
            // Shortcut (potentially not guaranteed by the algorithm)
            return Some(0);
        }
        if text.is_empty() {
            return None;
        }
        if text[loc..].starts_with(pattern) {
            // Perfect match at the perfect spot
            return Some(loc);
        }
        if pattern.len() > MATCH_MAX_BITS {
            tracing::debug!(
                pattern_len = pattern.len(),
                max = MATCH_MAX_BITS,
                "Pattern too long for bitap, falling back to exact search"
            );
            return nearest_exact(text, pattern, loc);
        }

        self.match_bitap(text, pattern, loc)
    }

    fn match_bitap(&self, text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
        let alphabet = match_alphabet(pattern);
        let pattern_len = pattern.len();

        // Highest score beyond which we give up
        let mut score_threshold = self.config.match_threshold;

        // Is there a nearby exact match? (speedup)
        if let Some(exact) = find(text, pattern, loc) {
            score_threshold = score_threshold.min(self.bitap_score(0, exact, loc, pattern_len));
            // What about in the other direction?
            if let Some(exact) = rfind(text, pattern, loc + pattern_len) {
                score_threshold = score_threshold.min(self.bitap_score(0, exact, loc, pattern_len));
            }
        }

        let match_mask: u64 = 1 << (pattern_len - 1);
        let mut best_loc = None;
        let mut bin_max = pattern_len + text.len();
        let mut last_rd: Vec<u64> = Vec::new();

        for d in 0..pattern_len {
            // Scan for the best match; each iteration allows for one more
            // error. Binary search for how far from `loc` we can stray at
            // this error level.
            let mut bin_min = 0;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if self.bitap_score(d, loc + bin_mid, loc, pattern_len) <= score_threshold {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            // This iteration's range bounds the next one
            bin_max = bin_mid;

            let mut start = (loc + 1).saturating_sub(bin_mid).max(1);
            let finish = (loc + bin_mid).min(text.len()) + pattern_len;

            let mut rd = vec![0u64; finish + 2];
            rd[finish + 1] = (1 << d) - 1;

            let mut j = finish;
            while j >= start {
                let char_match = if j > text.len() {
                    // Out of range
                    0
                } else {
                    alphabet.get(&text[j - 1]).copied().unwrap_or(0)
                };

                let shifted = ((rd[j + 1] << 1) | 1) & char_match;
                rd[j] = if d == 0 {
                    // First pass: exact match
                    shifted
                } else {
                    // Subsequent passes: fuzzy match
                    let prev_next = last_rd.get(j + 1).copied().unwrap_or(0);
                    let prev_here = last_rd.get(j).copied().unwrap_or(0);
                    shifted | (((prev_next | prev_here) << 1) | 1) | prev_next
                };

                if rd[j] & match_mask != 0 {
                    let score = self.bitap_score(d, j - 1, loc, pattern_len);
                    // This match will almost certainly be better than any
                    // existing match, but check anyway.
                    if score <= score_threshold {
                        score_threshold = score;
                        best_loc = Some(j - 1);
                        if j - 1 > loc {
                            // When passing loc, don't exceed our current
                            // distance from it
                            start = (2 * loc).saturating_sub(j - 1).max(1);
                        } else {
                            // Already passed loc, downhill from here on in
                            break;
                        }
                    }
                }
                j -= 1;
            }

            // No hope for a (better) match at greater error levels
            if self.bitap_score(d + 1, loc, loc, pattern_len) > score_threshold {
                break;
            }
            last_rd = rd;
        }

        best_loc
    }

    /// Scores a match with `errors` errors at `x` for a pattern expected at
    /// `loc`. Lower is better.
    fn bitap_score(&self, errors: usize, x: usize, loc: usize, pattern_len: usize) -> f64 {
        let accuracy = errors as f64 / pattern_len as f64;
        let proximity = x.abs_diff(loc);
        if self.config.match_distance == 0 {
            // Dodge divide by zero
            return if proximity == 0 { accuracy } else { 1.0 };
        }
        accuracy + proximity as f64 / self.config.match_distance as f64
    }
}

/// Builds the bitap alphabet: for each char of `pattern`, a mask with a bit
/// set for every position it occupies (first char in the highest bit).
pub(crate) fn match_alphabet(pattern: &[char]) -> HashMap<char, u64> {
    let mut alphabet = HashMap::with_capacity(pattern.len());
    for (i, &c) in pattern.iter().enumerate() {
        *alphabet.entry(c).or_insert(0) |= 1 << (pattern.len() - i - 1);
    }
    alphabet
}

/// Exact occurrence of `pattern` closest to `loc`, searching both ways.
fn nearest_exact(text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
    let after = find(text, pattern, loc);
    let before = rfind(text, pattern, loc);
    match (before, after) {
        (Some(before), Some(after)) => {
            if loc - before <= after - loc {
                Some(before)
            } else {
                Some(after)
            }
        }
        (found, None) | (None, found) => found,
    }
}
