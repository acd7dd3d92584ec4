//! Post-processing passes over raw edit scripts.
//!
//! None of these change what a diff list reconstructs; they reorganize it to
//! be shorter, more readable, or cheaper to turn into patches. Each pass is
//! idempotent.

use crate::DiffMatchPatch;
use crate::diff::{Diff, Op};
use crate::sequence::{common_overlap, common_prefix, common_suffix};

// Boundary scores for semantic-lossless alignment, best first.
const EDGE_SCORE: u8 = 6;
const BLANK_LINE_SCORE: u8 = 5;
const LINE_BREAK_SCORE: u8 = 4;
const SENTENCE_END_SCORE: u8 = 3;
const WHITESPACE_SCORE: u8 = 2;
const NON_ALPHANUMERIC_SCORE: u8 = 1;

impl DiffMatchPatch {
    /// Merges like edits, factors shared text out of replacements and slides
    /// single edits to remove equalities.
    pub fn diff_cleanup_merge(&self, mut diffs: Vec<Diff>) -> Vec<Diff> {
        cleanup_merge(&mut diffs);
        diffs
    }

    /// Trades minimality for readability: removes short equalities trapped
    /// between larger edits and extracts overlaps between deletions and
    /// insertions.
    ///
    /// # Examples
    ///
    /// ```
    /// use dmpatch::{Diff, DiffMatchPatch};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let diffs = vec![Diff::delete("a"), Diff::equal("b"), Diff::delete("c")];
    ///
    /// assert_eq!(
    ///     dmp.diff_cleanup_semantic(diffs),
    ///     vec![Diff::delete("abc"), Diff::insert("b")]
    /// );
    /// ```
    pub fn diff_cleanup_semantic(&self, mut diffs: Vec<Diff>) -> Vec<Diff> {
        cleanup_semantic(&mut diffs);
        diffs
    }

    /// Slides edits bracketed by equalities onto the nearest line, sentence
    /// or word boundary.
    pub fn diff_cleanup_semantic_lossless(&self, mut diffs: Vec<Diff>) -> Vec<Diff> {
        cleanup_semantic_lossless(&mut diffs);
        diffs
    }

    /// Removes short equalities between edits when that lowers the total
    /// edit cost under [`Config::diff_edit_cost`](crate::Config::diff_edit_cost).
    pub fn diff_cleanup_efficiency(&self, mut diffs: Vec<Diff>) -> Vec<Diff> {
        cleanup_efficiency(&mut diffs, self.config.diff_edit_cost);
        diffs
    }
}

pub(crate) fn cleanup_merge(diffs: &mut Vec<Diff>) {
    diffs.retain(|diff| !diff.text.is_empty());

    // A trailing empty equality flushes the last run
    diffs.push(Diff::from_chars(Op::Equal, Vec::new()));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete: Vec<char> = Vec::new();
    let mut text_insert: Vec<char> = Vec::new();

    while pointer < diffs.len() {
        match diffs[pointer].op {
            Op::Insert => {
                count_insert += 1;
                text_insert.extend_from_slice(&diffs[pointer].text);
                pointer += 1;
            }
            Op::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&diffs[pointer].text);
                pointer += 1;
            }
            Op::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        // Factor out any common prefix
                        let common = common_prefix(&text_insert, &text_delete);
                        if common != 0 {
                            let run_start = pointer - count_delete - count_insert;
                            if run_start > 0 && diffs[run_start - 1].op == Op::Equal {
                                diffs[run_start - 1]
                                    .text
                                    .extend_from_slice(&text_insert[..common]);
                            } else {
                                diffs.insert(
                                    0,
                                    Diff::from_chars(Op::Equal, text_insert[..common].to_vec()),
                                );
                                pointer += 1;
                            }
                            text_insert.drain(..common);
                            text_delete.drain(..common);
                        }

                        // Factor out any common suffix
                        let common = common_suffix(&text_insert, &text_delete);
                        if common != 0 {
                            let mut text = text_insert[text_insert.len() - common..].to_vec();
                            text.extend_from_slice(&diffs[pointer].text);
                            diffs[pointer].text = text;
                            text_insert.truncate(text_insert.len() - common);
                            text_delete.truncate(text_delete.len() - common);
                        }
                    }

                    // Replace the run with at most one deletion and one insertion
                    let run_start = pointer - count_delete - count_insert;
                    let mut merged = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        merged.push(Diff::from_chars(Op::Delete, std::mem::take(&mut text_delete)));
                    }
                    if !text_insert.is_empty() {
                        merged.push(Diff::from_chars(Op::Insert, std::mem::take(&mut text_insert)));
                    }
                    let merged_len = merged.len();
                    diffs.splice(run_start..pointer, merged);
                    pointer = if merged_len == 0
                        && run_start > 0
                        && diffs[run_start - 1].op == Op::Equal
                    {
                        // The run vanished, so the equalities around it touch
                        run_start
                    } else {
                        run_start + merged_len + 1
                    };
                } else if pointer != 0 && diffs[pointer - 1].op == Op::Equal {
                    // Merge this equality with the previous one
                    let text = diffs.remove(pointer).text;
                    diffs[pointer - 1].text.extend(text);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    if diffs.last().is_some_and(|diff| diff.text.is_empty()) {
        diffs.pop();
    }

    // Second pass: look for single edits surrounded on both sides by
    // equalities which can be shifted sideways to eliminate an equality,
    // e.g. A<ins>BA</ins>C -> <ins>AB</ins>AC
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Op::Equal && diffs[pointer + 1].op == Op::Equal {
            if diffs[pointer].text.ends_with(&diffs[pointer - 1].text) {
                // Shift the edit over the previous equality
                let previous = diffs.remove(pointer - 1).text;
                let edit = &diffs[pointer - 1].text;
                let mut shifted = previous.clone();
                shifted.extend_from_slice(&edit[..edit.len() - previous.len()]);
                diffs[pointer - 1].text = shifted;

                let mut next = previous;
                next.extend_from_slice(&diffs[pointer].text);
                diffs[pointer].text = next;
                changes = true;
            } else if diffs[pointer].text.starts_with(&diffs[pointer + 1].text) {
                // Shift the edit over the next equality
                let next = diffs.remove(pointer + 1).text;
                diffs[pointer - 1].text.extend_from_slice(&next);
                let edit = &mut diffs[pointer].text;
                edit.drain(..next.len());
                edit.extend_from_slice(&next);
                changes = true;
            }
        }
        pointer += 1;
    }

    // Shifts can expose further merges
    if changes {
        cleanup_merge(diffs);
    }
}

pub(crate) fn cleanup_semantic(diffs: &mut Vec<Diff>) {
    let mut changes = false;
    // Indices of candidate equalities
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    let mut pointer = 0;
    // Edit lengths before and after the last equality
    let mut insertions1 = 0;
    let mut deletions1 = 0;
    let mut insertions2 = 0;
    let mut deletions2 = 0;

    while pointer < diffs.len() {
        if diffs[pointer].op == Op::Equal {
            equalities.push(pointer);
            insertions1 = insertions2;
            deletions1 = deletions2;
            insertions2 = 0;
            deletions2 = 0;
            last_equality = Some(diffs[pointer].text.clone());
        } else {
            if diffs[pointer].op == Op::Insert {
                insertions2 += diffs[pointer].text.len();
            } else {
                deletions2 += diffs[pointer].text.len();
            }

            // An equality no longer than the edits on both sides of it
            let dominated = last_equality.as_ref().is_some_and(|equality| {
                equality.len() <= insertions1.max(deletions1)
                    && equality.len() <= insertions2.max(deletions2)
            });
            let candidate = if dominated {
                last_equality.take().zip(equalities.pop())
            } else {
                None
            };
            if let Some((text, at)) = candidate {
                // Turn the equality into a deletion plus insertion
                diffs.insert(at, Diff::from_chars(Op::Delete, text));
                diffs[at + 1].op = Op::Insert;
                // The previous equality needs reevaluating
                equalities.pop();
                insertions1 = 0;
                deletions1 = 0;
                insertions2 = 0;
                deletions2 = 0;
                changes = true;
                pointer = equalities.last().map_or(0, |&p| p + 1);
                continue;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);

    // Find overlaps between deletions and insertions, e.g.
    // <del>abcxxx</del><ins>xxxdef</ins> -> <del>abc</del>xxx<ins>def</ins>
    // <del>xxxabc</del><ins>defxxx</ins> -> <ins>def</ins>xxx<del>abc</del>
    // Only extract an overlap that is at least half of either edit.
    let mut pointer = 1;
    while pointer < diffs.len() {
        if diffs[pointer - 1].op == Op::Delete && diffs[pointer].op == Op::Insert {
            let deletion = diffs[pointer - 1].text.clone();
            let insertion = diffs[pointer].text.clone();
            let overlap1 = common_overlap(&deletion, &insertion);
            let overlap2 = common_overlap(&insertion, &deletion);

            if overlap1 >= overlap2 {
                if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                    diffs.insert(
                        pointer,
                        Diff::from_chars(Op::Equal, insertion[..overlap1].to_vec()),
                    );
                    diffs[pointer - 1].text = deletion[..deletion.len() - overlap1].to_vec();
                    diffs[pointer + 1].text = insertion[overlap1..].to_vec();
                    pointer += 1;
                }
            } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                // Reverse overlap: swap the edits around the shared text
                diffs.insert(
                    pointer,
                    Diff::from_chars(Op::Equal, deletion[..overlap2].to_vec()),
                );
                diffs[pointer - 1] =
                    Diff::from_chars(Op::Insert, insertion[..insertion.len() - overlap2].to_vec());
                diffs[pointer + 1] = Diff::from_chars(Op::Delete, deletion[overlap2..].to_vec());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

pub(crate) fn cleanup_semantic_lossless(diffs: &mut Vec<Diff>) {
    let mut pointer = 1;
    // Intentionally ignore the first and last element (don't need checking)
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Op::Equal && diffs[pointer + 1].op == Op::Equal {
            let mut equality1 = diffs[pointer - 1].text.clone();
            let mut edit = diffs[pointer].text.clone();
            let mut equality2 = diffs[pointer + 1].text.clone();

            // Shift the edit as far left as possible
            let common = common_suffix(&equality1, &edit);
            if common > 0 {
                let shared = edit[edit.len() - common..].to_vec();
                equality1.truncate(equality1.len() - common);
                let mut shifted = shared.clone();
                shifted.extend_from_slice(&edit[..edit.len() - common]);
                edit = shifted;
                let mut next = shared;
                next.extend_from_slice(&equality2);
                equality2 = next;
            }

            // Step right one character at a time, keeping the best fit.
            // Ties go to the later position.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                equality1.push(edit.remove(0));
                edit.push(equality2.remove(0));
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[pointer - 1].text != best_equality1 {
                if best_equality1.is_empty() {
                    diffs.remove(pointer - 1);
                    pointer -= 1;
                } else {
                    diffs[pointer - 1].text = best_equality1;
                }
                diffs[pointer].text = best_edit;
                if best_equality2.is_empty() {
                    diffs.remove(pointer + 1);
                    pointer = pointer.saturating_sub(1);
                } else {
                    diffs[pointer + 1].text = best_equality2;
                }
            }
        }
        pointer += 1;
    }
}

/// Scores how well the boundary between `one` and `two` falls on a logical
/// break, from 6 (edge of the text) down to 0 (inside a word).
fn semantic_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&char1), Some(&char2)) = (one.last(), two.first()) else {
        return EDGE_SCORE;
    };

    let non_alphanumeric1 = !char1.is_alphanumeric();
    let non_alphanumeric2 = !char2.is_alphanumeric();
    let whitespace1 = non_alphanumeric1 && char1.is_whitespace();
    let whitespace2 = non_alphanumeric2 && char2.is_whitespace();
    let line_break1 = whitespace1 && (char1 == '\r' || char1 == '\n');
    let line_break2 = whitespace2 && (char2 == '\r' || char2 == '\n');
    let blank_line1 = line_break1 && ends_with_blank_line(one);
    let blank_line2 = line_break2 && starts_with_blank_line(two);

    if blank_line1 || blank_line2 {
        BLANK_LINE_SCORE
    } else if line_break1 || line_break2 {
        LINE_BREAK_SCORE
    } else if non_alphanumeric1 && !whitespace1 && whitespace2 {
        SENTENCE_END_SCORE
    } else if whitespace1 || whitespace2 {
        WHITESPACE_SCORE
    } else if non_alphanumeric1 || non_alphanumeric2 {
        NON_ALPHANUMERIC_SCORE
    } else {
        0
    }
}

fn ends_with_blank_line(text: &[char]) -> bool {
    text.ends_with(&['\n', '\n']) || text.ends_with(&['\n', '\r', '\n'])
}

fn starts_with_blank_line(text: &[char]) -> bool {
    let rest = text.strip_prefix(&['\r']).unwrap_or(text);
    let Some(rest) = rest.strip_prefix(&['\n']) else {
        return false;
    };
    let rest = rest.strip_prefix(&['\r']).unwrap_or(rest);
    rest.starts_with(&['\n'])
}

pub(crate) fn cleanup_efficiency(diffs: &mut Vec<Diff>, edit_cost: usize) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    let mut pointer = 0;
    // Edits seen before and after the last candidate equality
    let mut pre_insert = false;
    let mut pre_delete = false;
    let mut post_insert = false;
    let mut post_delete = false;

    while pointer < diffs.len() {
        if diffs[pointer].op == Op::Equal {
            if diffs[pointer].text.len() < edit_cost && (post_insert || post_delete) {
                // Candidate found
                equalities.push(pointer);
                pre_insert = post_insert;
                pre_delete = post_delete;
                last_equality = Some(diffs[pointer].text.clone());
            } else {
                // Not a candidate, and can never become one
                equalities.clear();
                last_equality = None;
            }
            post_insert = false;
            post_delete = false;
        } else {
            if diffs[pointer].op == Op::Delete {
                post_delete = true;
            } else {
                post_insert = true;
            }

            // Split the equality when surrounded by all four edit kinds:
            //   <ins>A</ins><del>B</del>XY<ins>C</ins><del>D</del>
            // or by three of them when it is shorter than half the edit cost:
            //   <ins>A</ins>X<ins>C</ins><del>D</del>
            //   <ins>A</ins><del>B</del>X<ins>C</ins>
            //   <ins>A</del>X<ins>C</ins><del>D</del>
            //   <ins>A</ins><del>B</del>X<del>C</del>
            let sides = [pre_insert, pre_delete, post_insert, post_delete]
                .iter()
                .filter(|&&side| side)
                .count();
            let split = last_equality
                .as_ref()
                .is_some_and(|equality| sides == 4 || (equality.len() * 2 < edit_cost && sides == 3));

            let candidate = if split {
                last_equality.take().zip(equalities.pop())
            } else {
                None
            };
            if let Some((text, at)) = candidate {
                diffs.insert(at, Diff::from_chars(Op::Delete, text));
                diffs[at + 1].op = Op::Insert;
                changes = true;

                if pre_insert && pre_delete {
                    // Nothing changed that could affect the previous entry
                    post_insert = true;
                    post_delete = true;
                    equalities.clear();
                } else {
                    // The previous equality needs reevaluating
                    equalities.pop();
                    post_insert = false;
                    post_delete = false;
                    pointer = equalities.last().map_or(0, |&p| p + 1);
                    continue;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(mut diffs: Vec<Diff>) -> Vec<Diff> {
        cleanup_merge(&mut diffs);
        diffs
    }

    fn semantic(mut diffs: Vec<Diff>) -> Vec<Diff> {
        cleanup_semantic(&mut diffs);
        diffs
    }

    fn lossless(mut diffs: Vec<Diff>) -> Vec<Diff> {
        cleanup_semantic_lossless(&mut diffs);
        diffs
    }

    fn efficient(mut diffs: Vec<Diff>, edit_cost: usize) -> Vec<Diff> {
        cleanup_efficiency(&mut diffs, edit_cost);
        diffs
    }

    #[test]
    fn test_merge_basics() {
        assert!(merged(vec![]).is_empty());

        let unchanged = vec![Diff::equal("a"), Diff::delete("b"), Diff::insert("c")];
        assert_eq!(merged(unchanged.clone()), unchanged);

        assert_eq!(
            merged(vec![Diff::equal("a"), Diff::equal("b"), Diff::equal("c")]),
            vec![Diff::equal("abc")]
        );
        assert_eq!(
            merged(vec![Diff::delete("a"), Diff::delete("b"), Diff::delete("c")]),
            vec![Diff::delete("abc")]
        );
        assert_eq!(
            merged(vec![Diff::insert("a"), Diff::insert("b"), Diff::insert("c")]),
            vec![Diff::insert("abc")]
        );
        assert_eq!(
            merged(vec![
                Diff::delete("a"),
                Diff::insert("b"),
                Diff::delete("c"),
                Diff::insert("d"),
                Diff::equal("e"),
                Diff::equal("f"),
            ]),
            vec![Diff::delete("ac"), Diff::insert("bd"), Diff::equal("ef")]
        );
    }

    #[test]
    fn test_merge_factors_prefix_and_suffix() {
        assert_eq!(
            merged(vec![Diff::delete("a"), Diff::insert("abc"), Diff::delete("dc")]),
            vec![
                Diff::equal("a"),
                Diff::delete("d"),
                Diff::insert("b"),
                Diff::equal("c"),
            ]
        );
        assert_eq!(
            merged(vec![
                Diff::equal("x"),
                Diff::delete("a"),
                Diff::insert("abc"),
                Diff::delete("dc"),
                Diff::equal("y"),
            ]),
            vec![
                Diff::equal("xa"),
                Diff::delete("d"),
                Diff::insert("b"),
                Diff::equal("cy"),
            ]
        );
    }

    #[test]
    fn test_merge_slides_edits() {
        assert_eq!(
            merged(vec![Diff::equal("a"), Diff::insert("ba"), Diff::equal("c")]),
            vec![Diff::insert("ab"), Diff::equal("ac")]
        );
        assert_eq!(
            merged(vec![Diff::equal("c"), Diff::insert("ab"), Diff::equal("a")]),
            vec![Diff::equal("ca"), Diff::insert("ba")]
        );
        assert_eq!(
            merged(vec![
                Diff::equal("a"),
                Diff::delete("b"),
                Diff::equal("c"),
                Diff::delete("ac"),
                Diff::equal("x"),
            ]),
            vec![Diff::delete("abc"), Diff::equal("acx")]
        );
        assert_eq!(
            merged(vec![
                Diff::equal("x"),
                Diff::delete("ca"),
                Diff::equal("c"),
                Diff::delete("b"),
                Diff::equal("a"),
            ]),
            vec![Diff::equal("xca"), Diff::delete("cba")]
        );
    }

    #[test]
    fn test_merge_drops_empty() {
        assert_eq!(
            merged(vec![Diff::delete("b"), Diff::insert("ab"), Diff::equal("c")]),
            vec![Diff::insert("a"), Diff::equal("bc")]
        );
        assert_eq!(
            merged(vec![Diff::equal(""), Diff::insert("a"), Diff::equal("b")]),
            vec![Diff::insert("a"), Diff::equal("b")]
        );
        assert_eq!(
            merged(vec![Diff::insert(""), Diff::delete(""), Diff::equal("")]),
            vec![]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merged(vec![
            Diff::equal("x"),
            Diff::delete("a"),
            Diff::insert("abc"),
            Diff::delete("dc"),
            Diff::equal("y"),
            Diff::insert(""),
            Diff::equal("z"),
        ]);
        assert_eq!(merged(once.clone()), once);
    }

    #[test]
    fn test_merge_joins_equalities_around_cancelled_run() {
        let diffs = vec![
            Diff::equal("x"),
            Diff::delete("a"),
            Diff::insert("a"),
            Diff::equal("y"),
        ];
        assert_eq!(merged(diffs), vec![Diff::equal("xay")]);

        let diffs = vec![
            Diff::equal("x"),
            Diff::delete("ab"),
            Diff::insert("ab"),
            Diff::equal("y"),
            Diff::insert("z"),
        ];
        let once = merged(diffs);
        assert_eq!(once, vec![Diff::equal("xaby"), Diff::insert("z")]);
        assert_eq!(merged(once.clone()), once);
    }

    #[test]
    fn test_semantic_no_elimination() {
        assert!(semantic(vec![]).is_empty());

        let diffs = vec![
            Diff::delete("ab"),
            Diff::insert("cd"),
            Diff::equal("12"),
            Diff::delete("e"),
        ];
        assert_eq!(semantic(diffs.clone()), diffs);

        let diffs = vec![
            Diff::delete("abc"),
            Diff::insert("ABC"),
            Diff::equal("1234"),
            Diff::delete("wxyz"),
        ];
        assert_eq!(semantic(diffs.clone()), diffs);
    }

    #[test]
    fn test_semantic_elimination() {
        assert_eq!(
            semantic(vec![Diff::delete("a"), Diff::equal("b"), Diff::delete("c")]),
            vec![Diff::delete("abc"), Diff::insert("b")]
        );
        assert_eq!(
            semantic(vec![
                Diff::delete("ab"),
                Diff::equal("cd"),
                Diff::delete("e"),
                Diff::equal("f"),
                Diff::insert("g"),
            ]),
            vec![Diff::delete("abcdef"), Diff::insert("cdfg")]
        );
        assert_eq!(
            semantic(vec![
                Diff::insert("1"),
                Diff::equal("A"),
                Diff::delete("B"),
                Diff::insert("2"),
                Diff::equal("_"),
                Diff::insert("1"),
                Diff::equal("A"),
                Diff::delete("B"),
                Diff::insert("2"),
            ]),
            vec![Diff::delete("AB_AB"), Diff::insert("1A2_1A2")]
        );
    }

    #[test]
    fn test_semantic_word_boundaries() {
        assert_eq!(
            semantic(vec![
                Diff::equal("The c"),
                Diff::delete("ow and the c"),
                Diff::equal("at."),
            ]),
            vec![
                Diff::equal("The "),
                Diff::delete("cow and the "),
                Diff::equal("cat."),
            ]
        );
    }

    #[test]
    fn test_semantic_overlaps() {
        let diffs = vec![Diff::delete("abcxx"), Diff::insert("xxdef")];
        assert_eq!(semantic(diffs.clone()), diffs);

        assert_eq!(
            semantic(vec![Diff::delete("abcxxx"), Diff::insert("xxxdef")]),
            vec![Diff::delete("abc"), Diff::equal("xxx"), Diff::insert("def")]
        );
        assert_eq!(
            semantic(vec![Diff::delete("xxxabc"), Diff::insert("defxxx")]),
            vec![Diff::insert("def"), Diff::equal("xxx"), Diff::delete("abc")]
        );
        assert_eq!(
            semantic(vec![
                Diff::delete("abcd1212"),
                Diff::insert("1212efghi"),
                Diff::equal("----"),
                Diff::delete("A3"),
                Diff::insert("3BC"),
            ]),
            vec![
                Diff::delete("abcd"),
                Diff::equal("1212"),
                Diff::insert("efghi"),
                Diff::equal("----"),
                Diff::delete("A"),
                Diff::equal("3"),
                Diff::insert("BC"),
            ]
        );
    }

    #[test]
    fn test_semantic_score_ordering() {
        let c = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(semantic_score(&c(""), &c("a")), EDGE_SCORE);
        assert_eq!(semantic_score(&c("a\n\n"), &c("b")), BLANK_LINE_SCORE);
        assert_eq!(semantic_score(&c("a"), &c("\r\n\r\nb")), BLANK_LINE_SCORE);
        assert_eq!(semantic_score(&c("a\n"), &c("b")), LINE_BREAK_SCORE);
        assert_eq!(semantic_score(&c("a."), &c(" b")), SENTENCE_END_SCORE);
        assert_eq!(semantic_score(&c("a "), &c("b")), WHITESPACE_SCORE);
        assert_eq!(semantic_score(&c("a-"), &c("b")), NON_ALPHANUMERIC_SCORE);
        assert_eq!(semantic_score(&c("a"), &c("b")), 0);
    }

    #[test]
    fn test_lossless_boundaries() {
        assert!(lossless(vec![]).is_empty());

        assert_eq!(
            lossless(vec![
                Diff::equal("AAA\r\n\r\nBBB"),
                Diff::insert("\r\nDDD\r\n\r\nBBB"),
                Diff::equal("\r\nEEE"),
            ]),
            vec![
                Diff::equal("AAA\r\n\r\n"),
                Diff::insert("BBB\r\nDDD\r\n\r\n"),
                Diff::equal("BBB\r\nEEE"),
            ]
        );
        assert_eq!(
            lossless(vec![
                Diff::equal("AAA\r\nBBB"),
                Diff::insert(" DDD\r\nBBB"),
                Diff::equal(" EEE"),
            ]),
            vec![
                Diff::equal("AAA\r\n"),
                Diff::insert("BBB DDD\r\n"),
                Diff::equal("BBB EEE"),
            ]
        );
        assert_eq!(
            lossless(vec![
                Diff::equal("The-c"),
                Diff::insert("ow-and-the-c"),
                Diff::equal("at."),
            ]),
            vec![
                Diff::equal("The-"),
                Diff::insert("cow-and-the-"),
                Diff::equal("cat."),
            ]
        );
        assert_eq!(
            lossless(vec![
                Diff::equal("The xxx. The "),
                Diff::insert("zzz. The "),
                Diff::equal("yyy."),
            ]),
            vec![
                Diff::equal("The xxx."),
                Diff::insert(" The zzz."),
                Diff::equal(" The yyy."),
            ]
        );
    }

    #[test]
    fn test_lossless_ties_take_later_boundary() {
        // Every shift scores zero, so the last one scanned is kept
        assert_eq!(
            lossless(vec![Diff::equal("xa"), Diff::insert("ba"), Diff::equal("by")]),
            vec![Diff::equal("xab"), Diff::insert("ab"), Diff::equal("y")]
        );
        // Two whitespace boundaries tie with the space on either side
        assert_eq!(
            lossless(vec![
                Diff::equal("The"),
                Diff::delete(" cow and the"),
                Diff::equal(" cat."),
            ]),
            vec![
                Diff::equal("The "),
                Diff::delete("cow and the "),
                Diff::equal("cat."),
            ]
        );
    }

    #[test]
    fn test_lossless_hits_edges() {
        assert_eq!(
            lossless(vec![Diff::equal("a"), Diff::delete("a"), Diff::equal("ax")]),
            vec![Diff::delete("a"), Diff::equal("aax")]
        );
        assert_eq!(
            lossless(vec![Diff::equal("xa"), Diff::delete("a"), Diff::equal("a")]),
            vec![Diff::equal("xaa"), Diff::delete("a")]
        );
    }

    #[test]
    fn test_efficiency() {
        assert!(efficient(vec![], 4).is_empty());

        let diffs = vec![
            Diff::delete("ab"),
            Diff::insert("12"),
            Diff::equal("wxyz"),
            Diff::delete("cd"),
            Diff::insert("34"),
        ];
        assert_eq!(efficient(diffs.clone(), 4), diffs);

        assert_eq!(
            efficient(
                vec![
                    Diff::delete("ab"),
                    Diff::insert("12"),
                    Diff::equal("xyz"),
                    Diff::delete("cd"),
                    Diff::insert("34"),
                ],
                4
            ),
            vec![Diff::delete("abxyzcd"), Diff::insert("12xyz34")]
        );
        assert_eq!(
            efficient(
                vec![
                    Diff::insert("12"),
                    Diff::equal("x"),
                    Diff::delete("cd"),
                    Diff::insert("34"),
                ],
                4
            ),
            vec![Diff::delete("xcd"), Diff::insert("12x34")]
        );
        assert_eq!(
            efficient(
                vec![
                    Diff::delete("ab"),
                    Diff::insert("12"),
                    Diff::equal("xy"),
                    Diff::insert("34"),
                    Diff::equal("z"),
                    Diff::delete("cd"),
                    Diff::insert("56"),
                ],
                4
            ),
            vec![Diff::delete("abxyzcd"), Diff::insert("12xy34z56")]
        );
    }

    #[test]
    fn test_efficiency_high_cost() {
        assert_eq!(
            efficient(
                vec![
                    Diff::delete("ab"),
                    Diff::insert("12"),
                    Diff::equal("wxyz"),
                    Diff::delete("cd"),
                    Diff::insert("34"),
                ],
                5
            ),
            vec![Diff::delete("abwxyzcd"), Diff::insert("12wxyz34")]
        );
    }
}
