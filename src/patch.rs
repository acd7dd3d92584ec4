//! Patch construction and application.
//!
//! A patch is a run of diffs plus the context needed to find where it goes.
//! Building a patch set walks a diff list, cutting a new patch whenever a long
//! equality separates two edits. Applying a patch set relocates each patch
//! with the fuzzy matcher, so it still lands when the target text has drifted
//! from the text the patches were made against.

use std::collections::VecDeque;

use crate::DiffMatchPatch;
use crate::cleanup::{cleanup_efficiency, cleanup_semantic, cleanup_semantic_lossless};
use crate::config::MATCH_MAX_BITS;
use crate::diff::{Diff, Op, source_text, target_text, x_index};
use crate::sequence::{find, levenshtein, rfind};

/// One hunk of a patch set.
///
/// `length1` is the total length of the Equal and Delete fragments and
/// `length2` that of the Equal and Insert fragments. Starts are 0-based char
/// offsets. The [`Display`](std::fmt::Display) form is the patch text format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Patch {
    pub(crate) diffs: Vec<Diff>,
    pub(crate) start1: usize,
    pub(crate) start2: usize,
    pub(crate) length1: usize,
    pub(crate) length2: usize,
}

impl Patch {
    /// The edits of this hunk, including its context.
    pub fn diffs(&self) -> &[Diff] {
        &self.diffs
    }

    /// Offset of the hunk in the source text.
    pub fn start1(&self) -> usize {
        self.start1
    }

    /// Offset of the hunk in the target text.
    pub fn start2(&self) -> usize {
        self.start2
    }

    /// Length of the hunk in the source text.
    pub fn length1(&self) -> usize {
        self.length1
    }

    /// Length of the hunk in the target text.
    pub fn length2(&self) -> usize {
        self.length2
    }

    /// Source and target lengths as implied by the diffs.
    pub(crate) fn measured_lengths(&self) -> (usize, usize) {
        self.diffs.iter().fold((0, 0), |(len1, len2), diff| match diff.op {
            Op::Equal => (len1 + diff.len(), len2 + diff.len()),
            Op::Delete => (len1 + diff.len(), len2),
            Op::Insert => (len1, len2 + diff.len()),
        })
    }
}

/// What to build a patch set from.
#[derive(Debug, Clone, Copy)]
pub enum PatchInput<'a> {
    /// Old and new text; the diff is computed and cleaned up.
    Texts(&'a str, &'a str),
    /// A diff list; the old text is rebuilt from it.
    Diffs(&'a [Diff]),
    /// Old text and the diff list that turns it into the new text.
    TextDiffs(&'a str, &'a [Diff]),
    /// Old text, new text and the diff list between them. The new text is
    /// not needed and is ignored.
    TextsDiffs(&'a str, &'a str, &'a [Diff]),
}

impl DiffMatchPatch {
    /// Builds a patch set.
    ///
    /// # Examples
    ///
    /// ```
    /// use dmpatch::{DiffMatchPatch, PatchInput};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let patches = dmp.patch_make(PatchInput::Texts("Hello world.", "Hello Rust."));
    /// let (patched, applied) = dmp.patch_apply(&patches, "Hello world.");
    ///
    /// assert_eq!(patched, "Hello Rust.");
    /// assert!(applied.iter().all(|&ok| ok));
    /// ```
    pub fn patch_make(&self, input: PatchInput<'_>) -> Vec<Patch> {
        let (text1, diffs) = match input {
            PatchInput::Texts(text1, text2) => {
                let text1: Vec<char> = text1.chars().collect();
                let text2: Vec<char> = text2.chars().collect();
                let mut diffs = self.diff_chars(&text1, &text2, true, self.deadline());
                if diffs.len() > 2 {
                    cleanup_semantic(&mut diffs);
                    cleanup_efficiency(&mut diffs, self.config.diff_edit_cost);
                }
                (text1, diffs)
            }
            PatchInput::Diffs(diffs) => (source_text(diffs), diffs.to_vec()),
            PatchInput::TextDiffs(text1, diffs) | PatchInput::TextsDiffs(text1, _, diffs) => {
                (text1.chars().collect(), diffs.to_vec())
            }
        };
        self.make_patches(&text1, &diffs)
    }

    fn make_patches(&self, text1: &[char], diffs: &[Diff]) -> Vec<Patch> {
        let mut patches = Vec::new();
        if diffs.is_empty() {
            return patches;
        }

        let margin = self.config.patch_margin;
        let mut patch = Patch::default();
        let mut char_count1 = 0;
        let mut char_count2 = 0;
        // Walk from text1 towards text2. The pre-patch text is what the
        // current patch's context is taken from; the post-patch text has every
        // edit so far applied.
        let mut prepatch: Vec<char> = text1.to_vec();
        let mut postpatch: Vec<char> = text1.to_vec();

        for (i, diff) in diffs.iter().enumerate() {
            let len = diff.len();
            if patch.diffs.is_empty() && diff.op != Op::Equal {
                // A new patch starts here
                patch.start1 = char_count1;
                patch.start2 = char_count2;
            }

            match diff.op {
                Op::Insert => {
                    patch.diffs.push(diff.clone());
                    patch.length2 += len;
                    let at = char_count2.min(postpatch.len());
                    postpatch.splice(at..at, diff.text.iter().copied());
                }
                Op::Delete => {
                    patch.length1 += len;
                    patch.diffs.push(diff.clone());
                    let from = char_count2.min(postpatch.len());
                    let to = (char_count2 + len).min(postpatch.len());
                    postpatch.drain(from..to);
                }
                Op::Equal => {
                    if len <= 2 * margin && !patch.diffs.is_empty() && i + 1 != diffs.len() {
                        // Small equality inside a patch
                        patch.diffs.push(diff.clone());
                        patch.length1 += len;
                        patch.length2 += len;
                    } else if len >= 2 * margin && !patch.diffs.is_empty() {
                        // Time for a new patch
                        self.add_context(&mut patch, &prepatch);
                        patches.push(std::mem::take(&mut patch));
                        // Patches carry a rolling context: the next one is
                        // positioned against the text with this one applied
                        prepatch.clone_from(&postpatch);
                        char_count1 = char_count2;
                    }
                }
            }

            if diff.op != Op::Insert {
                char_count1 += len;
            }
            if diff.op != Op::Delete {
                char_count2 += len;
            }
        }

        // Pick up the leftover patch
        if !patch.diffs.is_empty() {
            self.add_context(&mut patch, &prepatch);
            patches.push(patch);
        }

        patches
    }

    /// Grows the context around `patch` until its pattern is unique in
    /// `text`, without exceeding what the matcher can handle.
    fn add_context(&self, patch: &mut Patch, text: &[char]) {
        if text.is_empty() {
            return;
        }

        let margin = self.config.patch_margin;
        let max_pattern = MATCH_MAX_BITS.saturating_sub(2 * margin);
        let start = patch.start2.min(text.len());
        let end = (patch.start2 + patch.length1).min(text.len());

        let mut pattern = &text[start..end];
        let mut padding = 0;

        // Two different matches means the pattern is ambiguous
        while find(text, pattern, 0) != rfind(text, pattern, text.len())
            && pattern.len() < max_pattern
            && margin > 0
        {
            padding += margin;
            pattern = &text[start.saturating_sub(padding)..(end + padding).min(text.len())];
        }
        // Add one chunk for good luck
        padding += margin;

        let prefix = &text[start.saturating_sub(padding)..start];
        if !prefix.is_empty() {
            patch.diffs.insert(0, Diff::from_chars(Op::Equal, prefix.to_vec()));
        }
        let suffix = &text[end..(end + padding).min(text.len())];
        if !suffix.is_empty() {
            patch.diffs.push(Diff::from_chars(Op::Equal, suffix.to_vec()));
        }

        // Roll back the start points and extend the lengths
        patch.start1 = patch.start1.saturating_sub(prefix.len());
        patch.start2 = patch.start2.saturating_sub(prefix.len());
        patch.length1 += prefix.len() + suffix.len();
        patch.length2 += prefix.len() + suffix.len();
    }

    /// Adds `patch_margin` chars of padding (`\u{1}`, `\u{2}`, ...) as
    /// context at both ends of the patch set, so edits at the very start or
    /// end of a text can still be matched. Returns the padding string.
    pub fn patch_add_padding(&self, patches: &mut [Patch]) -> String {
        let margin = self.config.patch_margin;
        let padding: Vec<char> = (1..=margin).map(|code| char::from(code as u8)).collect();

        if patches.is_empty() {
            return padding.iter().collect();
        }

        // Bump all the patches forward
        for patch in patches.iter_mut() {
            patch.start1 += margin;
            patch.start2 += margin;
        }

        // Pad the start of the first patch
        if let Some(first) = patches.first_mut() {
            match first.diffs.first_mut() {
                Some(diff) if diff.op == Op::Equal => {
                    if margin > diff.len() {
                        // Grow the first equality
                        let extra = margin - diff.len();
                        let mut text = padding[diff.len()..].to_vec();
                        text.extend_from_slice(&diff.text);
                        diff.text = text;
                        first.start1 -= extra;
                        first.start2 -= extra;
                        first.length1 += extra;
                        first.length2 += extra;
                    }
                }
                _ => {
                    first.diffs.insert(0, Diff::from_chars(Op::Equal, padding.clone()));
                    first.start1 -= margin;
                    first.start2 -= margin;
                    first.length1 += margin;
                    first.length2 += margin;
                }
            }
        }

        // Pad the end of the last patch
        if let Some(last) = patches.last_mut() {
            match last.diffs.last_mut() {
                Some(diff) if diff.op == Op::Equal => {
                    if margin > diff.len() {
                        // Grow the last equality
                        let extra = margin - diff.len();
                        diff.text.extend_from_slice(&padding[..extra]);
                        last.length1 += extra;
                        last.length2 += extra;
                    }
                }
                _ => {
                    last.diffs.push(Diff::from_chars(Op::Equal, padding.clone()));
                    last.length1 += margin;
                    last.length2 += margin;
                }
            }
        }

        padding.into_iter().collect()
    }

    /// Splits every patch whose source side is longer than the matcher can
    /// locate into smaller patches with overlapping context.
    pub fn patch_split_max(&self, patches: Vec<Patch>) -> Vec<Patch> {
        let patch_size = MATCH_MAX_BITS;
        let margin = self.config.patch_margin;
        let mut split = Vec::with_capacity(patches.len());

        for big in patches {
            if big.length1 <= patch_size {
                split.push(big);
                continue;
            }

            let mut start1 = big.start1;
            let mut start2 = big.start2;
            let mut remaining: VecDeque<Diff> = big.diffs.into();
            let mut precontext: Vec<char> = Vec::new();

            while !remaining.is_empty() {
                // Create one of several smaller patches
                let mut patch = Patch {
                    start1: start1.saturating_sub(precontext.len()),
                    start2: start2.saturating_sub(precontext.len()),
                    ..Patch::default()
                };
                let mut empty = true;
                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch
                        .diffs
                        .push(Diff::from_chars(Op::Equal, std::mem::take(&mut precontext)));
                }

                while patch.length1 < patch_size - margin {
                    let Some(front) = remaining.front_mut() else {
                        break;
                    };
                    let (op, len) = (front.op, front.len());

                    if op == Op::Insert {
                        // Insertions are harmless
                        patch.length2 += len;
                        start2 += len;
                        patch.diffs.extend(remaining.pop_front());
                        empty = false;
                    } else if op == Op::Delete
                        && patch.diffs.len() == 1
                        && patch.diffs[0].op == Op::Equal
                        && len > 2 * patch_size
                    {
                        // A large deletion: let it pass in one chunk
                        patch.length1 += len;
                        start1 += len;
                        patch.diffs.extend(remaining.pop_front());
                        empty = false;
                    } else {
                        // Deletion or equality: only take as much as fits
                        let take = len.min(patch_size - patch.length1 - margin);
                        let text = front.text[..take].to_vec();
                        if take == len {
                            remaining.pop_front();
                        } else {
                            front.text.drain(..take);
                        }

                        patch.length1 += take;
                        start1 += take;
                        if op == Op::Equal {
                            patch.length2 += take;
                            start2 += take;
                        } else {
                            empty = false;
                        }
                        patch.diffs.push(Diff::from_chars(op, text));
                    }
                }

                // Head context for the next patch
                let text2 = target_text(&patch.diffs);
                precontext = text2[text2.len().saturating_sub(margin)..].to_vec();

                // Tail context for this patch
                let postcontext: Vec<char> = remaining
                    .iter()
                    .filter(|diff| diff.op != Op::Insert)
                    .flat_map(|diff| diff.text.iter().copied())
                    .take(margin)
                    .collect();
                if !postcontext.is_empty() {
                    patch.length1 += postcontext.len();
                    patch.length2 += postcontext.len();
                    match patch.diffs.last_mut() {
                        Some(last) if last.op == Op::Equal => last.text.extend(postcontext),
                        _ => patch.diffs.push(Diff::from_chars(Op::Equal, postcontext)),
                    }
                }

                if !empty {
                    split.push(patch);
                }
            }
        }

        split
    }

    /// Applies a patch set to `text`.
    ///
    /// Returns the patched text and one flag per applied patch. Patches
    /// longer than [`MATCH_MAX_BITS`](crate::MATCH_MAX_BITS) are split before
    /// applying, so the flags line up with
    /// [`patch_split_max`](Self::patch_split_max) of the padded set rather
    /// than with `patches` itself. A patch that cannot be located is skipped
    /// and flagged `false`; the rest still apply.
    pub fn patch_apply(&self, patches: &[Patch], text: &str) -> (String, Vec<bool>) {
        if patches.is_empty() {
            return (text.to_string(), Vec::new());
        }

        // Work on a copy; the caller's patches stay untouched
        let mut patches = patches.to_vec();
        let padding: Vec<char> = self.patch_add_padding(&mut patches).chars().collect();
        let mut text: Vec<char> = padding
            .iter()
            .copied()
            .chain(text.chars())
            .chain(padding.iter().copied())
            .collect();
        let patches = self.patch_split_max(patches);

        // Offset between where a patch was expected and where it was found;
        // carried forward since later patches drift the same way
        let mut delta: isize = 0;
        let mut results = vec![false; patches.len()];

        for (x, patch) in patches.iter().enumerate() {
            let expected_loc = offset(patch.start2, delta);
            let text1 = source_text(&patch.diffs);

            let mut end_loc = None;
            let start_loc = if text1.len() > MATCH_MAX_BITS {
                // Only a monster delete survives splitting at this size;
                // anchor both of its ends
                let head = &text1[..MATCH_MAX_BITS];
                let tail = &text1[text1.len() - MATCH_MAX_BITS..];
                self.match_chars(&text, head, expected_loc).filter(|&start| {
                    end_loc = self.match_chars(
                        &text,
                        tail,
                        expected_loc + text1.len() - MATCH_MAX_BITS,
                    );
                    end_loc.is_some_and(|end| start < end)
                })
            } else {
                self.match_chars(&text, &text1, expected_loc)
            };

            let Some(start) = start_loc else {
                // No match found; later patches shift back by what this one
                // would have changed
                tracing::debug!(
                    patch = x,
                    expected_loc,
                    "Patch could not be located, skipping"
                );
                delta -= patch.length2 as isize - patch.length1 as isize;
                continue;
            };

            results[x] = true;
            delta = start as isize - expected_loc as isize;
            let found_end = match end_loc {
                Some(end) => end + MATCH_MAX_BITS,
                None => start + text1.len(),
            };
            let text2 = text[start..found_end.min(text.len())].to_vec();

            if text1 == text2 {
                // Perfect match, just shove the replacement text in
                text.splice(start..start + text1.len(), target_text(&patch.diffs));
                continue;
            }

            // Imperfect match. Diff to get a framework of equivalent indices.
            let mut diffs = self.diff_chars(&text1, &text2, false, self.deadline());
            if text1.len() > MATCH_MAX_BITS
                && levenshtein(&diffs) as f64 / text1.len() as f64
                    > self.config.patch_delete_threshold
            {
                // The end points match, but the content is unacceptably bad
                tracing::debug!(patch = x, "Patch content too different, rejecting");
                results[x] = false;
                continue;
            }

            cleanup_semantic_lossless(&mut diffs);
            let mut index1 = 0;
            for edit in &patch.diffs {
                match edit.op {
                    Op::Insert => {
                        // Positions past the end of the text land at the end
                        let at = (start + x_index(&diffs, index1)).min(text.len());
                        text.splice(at..at, edit.text.iter().copied());
                    }
                    Op::Delete => {
                        let from = (start + x_index(&diffs, index1)).min(text.len());
                        let to = (start + x_index(&diffs, index1 + edit.len()))
                            .clamp(from, text.len());
                        text.drain(from..to);
                    }
                    Op::Equal => {}
                }
                if edit.op != Op::Delete {
                    index1 += edit.len();
                }
            }
        }

        // Strip the padding off
        let pad = padding.len();
        let patched = if text.len() >= 2 * pad {
            text[pad..text.len() - pad].iter().collect()
        } else {
            String::new()
        };
        (patched, results)
    }
}

/// Applies a signed drift to an expected location, clamping at zero.
fn offset(loc: usize, delta: isize) -> usize {
    loc.checked_add_signed(delta).unwrap_or(0)
}
