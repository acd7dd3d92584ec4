//! Pure helpers over character sequences and diff lists.

use crate::diff::{Diff, Op};

/// Returns the number of characters common to the start of both sequences.
pub fn common_prefix(a: &[char], b: &[char]) -> usize {
    let max_len = a.len().min(b.len());
    let mut len = 0;

    #[cfg(feature = "simd")]
    {
        use wide::u32x4;

        // Compare 4 chars at a time
        while len + 4 <= max_len {
            let a_chunk = u32x4::new(lanes(a, len));
            let b_chunk = u32x4::new(lanes(b, len));

            if a_chunk != b_chunk {
                break;
            }
            len += 4;
        }
    }

    while len < max_len && a[len] == b[len] {
        len += 1;
    }

    len
}

/// Returns the number of characters common to the end of both sequences.
pub fn common_suffix(a: &[char], b: &[char]) -> usize {
    let max_len = a.len().min(b.len());
    let mut len = 0;

    #[cfg(feature = "simd")]
    {
        use wide::u32x4;

        // Compare 4 chars at a time (from the end)
        while len + 4 <= max_len {
            let a_chunk = u32x4::new(lanes(a, a.len() - len - 4));
            let b_chunk = u32x4::new(lanes(b, b.len() - len - 4));

            if a_chunk != b_chunk {
                break;
            }
            len += 4;
        }
    }

    while len < max_len && a[a.len() - len - 1] == b[b.len() - len - 1] {
        len += 1;
    }

    len
}

#[cfg(feature = "simd")]
#[inline]
fn lanes(s: &[char], at: usize) -> [u32; 4] {
    [
        s[at] as u32,
        s[at + 1] as u32,
        s[at + 2] as u32,
        s[at + 3] as u32,
    ]
}

/// Returns the length of the longest suffix of `a` that is also a prefix of `b`.
pub fn common_overlap(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Truncate the longer sequence
    let (a, b) = if a.len() > b.len() {
        (&a[a.len() - b.len()..], b)
    } else {
        (a, &b[..a.len()])
    };
    let text_len = a.len();

    if a == b {
        return text_len;
    }

    // Look for a single character match, then grow the candidate one
    // occurrence at a time.
    let mut best = 0;
    let mut length = 1;
    loop {
        if length > text_len {
            return best;
        }
        let pattern = &a[text_len - length..];
        let found = match find(b, pattern, 0) {
            Some(found) => found,
            None => return best,
        };
        length += found;
        if found == 0 || a[text_len - length..] == b[..length] {
            best = length;
            length += 1;
        }
    }
}

/// Finds the first occurrence of `needle` in `haystack` at or after `from`.
///
/// An empty needle matches at `from` (clamped to the haystack length).
pub fn find(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Finds the last occurrence of `needle` in `haystack` starting at or before `from`.
pub fn rfind(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    let last_start = haystack.len().checked_sub(needle.len())?;
    (0..=from.min(last_start))
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Two texts split around a long common substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfMatch<'a> {
    /// Part of text1 before the common substring
    pub prefix1: &'a [char],
    /// Part of text1 after the common substring
    pub suffix1: &'a [char],
    /// Part of text2 before the common substring
    pub prefix2: &'a [char],
    /// Part of text2 after the common substring
    pub suffix2: &'a [char],
    /// The common substring
    pub common: &'a [char],
}

/// Looks for a substring shared by both texts that is at least half the
/// length of the longer text.
///
/// This is a speedup that can produce non-minimal diffs, so callers only use
/// it when a diff deadline is in force.
pub fn half_match<'a>(text1: &'a [char], text2: &'a [char]) -> Option<HalfMatch<'a>> {
    let (long, short) = if text1.len() > text2.len() {
        (text1, text2)
    } else {
        (text2, text1)
    };

    if long.len() < 4 || short.len() * 2 < long.len() {
        return None;
    }

    // Seed from the second and third quarters of the longer text
    let hm1 = half_match_at(long, short, long.len().div_ceil(4));
    let hm2 = half_match_at(long, short, long.len().div_ceil(2));

    let hm = match (hm1, hm2) {
        (None, None) => return None,
        (Some(hm), None) | (None, Some(hm)) => hm,
        (Some(hm1), Some(hm2)) => {
            if hm1.common.len() > hm2.common.len() {
                hm1
            } else {
                hm2
            }
        }
    };

    // The split was computed as (long, short); map back to (text1, text2)
    if text1.len() > text2.len() {
        Some(hm)
    } else {
        Some(HalfMatch {
            prefix1: hm.prefix2,
            suffix1: hm.suffix2,
            prefix2: hm.prefix1,
            suffix2: hm.suffix1,
            common: hm.common,
        })
    }
}

/// Does a substring of `short` exist within `long` such that the substring
/// is at least half the length of `long`? The seed is the quarter of `long`
/// starting at `i`.
fn half_match_at<'a>(long: &'a [char], short: &'a [char], i: usize) -> Option<HalfMatch<'a>> {
    let seed = &long[i..i + long.len() / 4];
    let mut best: Option<HalfMatch<'a>> = None;
    let mut from = 0;

    while let Some(j) = find(short, seed, from) {
        let prefix_len = common_prefix(&long[i..], &short[j..]);
        let suffix_len = common_suffix(&long[..i], &short[..j]);
        let best_len = best.as_ref().map_or(0, |hm| hm.common.len());

        if best_len < suffix_len + prefix_len {
            best = Some(HalfMatch {
                prefix1: &long[..i - suffix_len],
                suffix1: &long[i + prefix_len..],
                prefix2: &short[..j - suffix_len],
                suffix2: &short[j + prefix_len..],
                common: &short[j - suffix_len..j + prefix_len],
            });
        }
        from = j + 1;
    }

    best.filter(|hm| hm.common.len() * 2 >= long.len())
}

/// Computes the Levenshtein distance of a diff list: the number of inserted,
/// deleted or substituted characters.
pub fn levenshtein(diffs: &[Diff]) -> usize {
    let mut distance = 0;
    let mut insertions = 0;
    let mut deletions = 0;

    for diff in diffs {
        match diff.op {
            Op::Insert => insertions += diff.text.len(),
            Op::Delete => deletions += diff.text.len(),
            Op::Equal => {
                // A deletion and an insertion is one substitution
                distance += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }

    distance + insertions.max(deletions)
}
