//! Diff engine: edit scripts between two texts.
//!
//! The entry point strips the common prefix and suffix, then tries, in order,
//! containment, the half-match speedup, line mode for long texts and finally
//! Myers' bisection. Results always pass through merge cleanup.

use std::collections::HashMap;
use std::fmt::Write;
use std::time::Instant;

use crate::DiffMatchPatch;
use crate::cleanup;
use crate::sequence::{common_prefix, common_suffix, find, half_match};

/// Texts at least this long on both sides are diffed line by line first.
const LINE_MODE_MIN_LENGTH: usize = 100;

/// Cap on distinct lines taken from the first text in line mode.
const LINE_MODE_MAX_LINES_TEXT1: usize = 40_000;

/// Cap on distinct lines across both texts in line mode.
const LINE_MODE_MAX_LINES: usize = 65_535;

/// The kind of a diff operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Op {
    /// Text present only in the old version.
    Delete,
    /// Text present only in the new version.
    Insert,
    /// Text present in both versions.
    Equal,
}

/// One operation of an edit script: an [`Op`] and the text it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "DiffRepr", into = "DiffRepr"))]
pub struct Diff {
    pub(crate) op: Op,
    pub(crate) text: Vec<char>,
}

impl Diff {
    /// Creates a diff of the given kind.
    pub fn new(op: Op, text: &str) -> Self {
        Self {
            op,
            text: text.chars().collect(),
        }
    }

    /// Creates an equality.
    pub fn equal(text: &str) -> Self {
        Self::new(Op::Equal, text)
    }

    /// Creates a deletion.
    pub fn delete(text: &str) -> Self {
        Self::new(Op::Delete, text)
    }

    /// Creates an insertion.
    pub fn insert(text: &str) -> Self {
        Self::new(Op::Insert, text)
    }

    pub(crate) fn from_chars(op: Op, text: Vec<char>) -> Self {
        Self { op, text }
    }

    /// Returns the operation.
    #[inline]
    pub fn op(&self) -> Op {
        self.op
    }

    /// Returns the text as a `String`.
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    /// Returns the text as characters.
    #[inline]
    pub fn chars(&self) -> &[char] {
        &self.text
    }

    /// Returns the text length in characters.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct DiffRepr {
    op: Op,
    text: String,
}

#[cfg(feature = "serde")]
impl From<DiffRepr> for Diff {
    fn from(repr: DiffRepr) -> Self {
        Diff::new(repr.op, &repr.text)
    }
}

#[cfg(feature = "serde")]
impl From<Diff> for DiffRepr {
    fn from(diff: Diff) -> Self {
        DiffRepr {
            op: diff.op,
            text: diff.text(),
        }
    }
}

impl DiffMatchPatch {
    /// Computes the differences between two texts, using line mode for long
    /// inputs and the configured time budget.
    ///
    /// # Examples
    ///
    /// ```
    /// use dmpatch::{Diff, DiffMatchPatch};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let diffs = dmp.diff_main("The quick brown fox", "The slow brown fox");
    ///
    /// assert_eq!(
    ///     diffs,
    ///     vec![
    ///         Diff::equal("The "),
    ///         Diff::delete("quick"),
    ///         Diff::insert("slow"),
    ///         Diff::equal(" brown fox"),
    ///     ]
    /// );
    /// ```
    pub fn diff_main(&self, text1: &str, text2: &str) -> Vec<Diff> {
        self.diff(text1, text2, true)
    }

    /// Computes the differences between two texts.
    ///
    /// With `check_lines` set, texts longer than 100 characters are first
    /// diffed line by line, which is faster but can be less optimal.
    pub fn diff(&self, text1: &str, text2: &str, check_lines: bool) -> Vec<Diff> {
        self.diff_with_deadline(text1, text2, check_lines, self.deadline())
    }

    /// Computes the differences between two texts, giving up on refinement
    /// once `deadline` has passed. `None` runs to completion.
    ///
    /// Missing the deadline never fails the diff; it yields a valid but
    /// less minimal edit script.
    pub fn diff_with_deadline(
        &self,
        text1: &str,
        text2: &str,
        check_lines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        let text1: Vec<char> = text1.chars().collect();
        let text2: Vec<char> = text2.chars().collect();
        self.diff_chars(&text1, &text2, check_lines, deadline)
    }

    /// Deadline for a top-level diff started now.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        if self.config.diff_timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(self.config.diff_timeout)
        }
    }

    pub(crate) fn diff_chars(
        &self,
        text1: &[char],
        text2: &[char],
        check_lines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        if text1 == text2 {
            return if text1.is_empty() {
                Vec::new()
            } else {
                vec![Diff::from_chars(Op::Equal, text1.to_vec())]
            };
        }

        // Trim off common prefix and suffix
        let prefix_len = common_prefix(text1, text2);
        let (prefix, text1, text2) = (&text1[..prefix_len], &text1[prefix_len..], &text2[prefix_len..]);
        let suffix_len = common_suffix(text1, text2);
        let suffix = &text1[text1.len() - suffix_len..];
        let text1 = &text1[..text1.len() - suffix_len];
        let text2 = &text2[..text2.len() - suffix_len];

        let mut diffs = self.compute(text1, text2, check_lines, deadline);

        if !prefix.is_empty() {
            diffs.insert(0, Diff::from_chars(Op::Equal, prefix.to_vec()));
        }
        if !suffix.is_empty() {
            diffs.push(Diff::from_chars(Op::Equal, suffix.to_vec()));
        }

        cleanup::cleanup_merge(&mut diffs);
        diffs
    }

    /// Diffs two texts that share no common prefix or suffix.
    fn compute(
        &self,
        text1: &[char],
        text2: &[char],
        check_lines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        if text1.is_empty() {
            return vec![Diff::from_chars(Op::Insert, text2.to_vec())];
        }
        if text2.is_empty() {
            return vec![Diff::from_chars(Op::Delete, text1.to_vec())];
        }

        let (long, short) = if text1.len() > text2.len() {
            (text1, text2)
        } else {
            (text2, text1)
        };

        // Shorter text is inside the longer text
        if let Some(i) = find(long, short, 0) {
            let op = if text1.len() > text2.len() {
                Op::Delete
            } else {
                Op::Insert
            };
            return vec![
                Diff::from_chars(op, long[..i].to_vec()),
                Diff::from_chars(Op::Equal, short.to_vec()),
                Diff::from_chars(op, long[i + short.len()..].to_vec()),
            ];
        }

        if short.len() == 1 {
            // Single character that is not in the other text
            return vec![
                Diff::from_chars(Op::Delete, text1.to_vec()),
                Diff::from_chars(Op::Insert, text2.to_vec()),
            ];
        }

        // Only risk a non-optimal split when there is a time budget
        let hm = if self.config.diff_timeout.is_zero() {
            None
        } else {
            half_match(text1, text2)
        };
        if let Some(hm) = hm {
            let mut diffs = self.diff_chars(hm.prefix1, hm.prefix2, check_lines, deadline);
            diffs.push(Diff::from_chars(Op::Equal, hm.common.to_vec()));
            diffs.extend(self.diff_chars(hm.suffix1, hm.suffix2, check_lines, deadline));
            return diffs;
        }

        if check_lines && text1.len() > LINE_MODE_MIN_LENGTH && text2.len() > LINE_MODE_MIN_LENGTH {
            return self.line_mode(text1, text2, deadline);
        }

        self.bisect(text1, text2, deadline)
    }

    /// Quick line-level diff followed by a character-level pass over every
    /// replaced block.
    fn line_mode(&self, text1: &[char], text2: &[char], deadline: Option<Instant>) -> Vec<Diff> {
        let encoded = LineEncoding::new(text1, text2);

        let mut diffs = self.diff_chars(&encoded.chars1, &encoded.chars2, false, deadline);
        encoded.expand(&mut diffs);
        cleanup::cleanup_semantic(&mut diffs);

        // Rediff each run of deletions and insertions character by character.
        // A trailing empty equality flushes the last run.
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
                }
                Op::Delete => {
                    count_delete += 1;
                    text_delete.extend_from_slice(&diffs[pointer].text);
                }
                Op::Equal => {
                    if count_delete >= 1 && count_insert >= 1 {
                        let start = pointer - count_delete - count_insert;
                        let sub_diffs = self.diff_chars(&text_delete, &text_insert, false, deadline);
                        let sub_len = sub_diffs.len();
                        diffs.splice(start..pointer, sub_diffs);
                        pointer = start + sub_len;
                    }
                    count_insert = 0;
                    count_delete = 0;
                    text_delete.clear();
                    text_insert.clear();
                }
            }
            pointer += 1;
        }
        diffs.pop();

        diffs
    }

    /// Finds the middle snake of the edit graph and splits the problem
    /// there (Myers 1986, "An O(ND) Difference Algorithm and Its Variations").
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn bisect(&self, text1: &[char], text2: &[char], deadline: Option<Instant>) -> Vec<Diff> {
        let len1 = text1.len() as isize;
        let len2 = text2.len() as isize;
        let max_d = (len1 + len2 + 1) / 2;
        let v_offset = max_d;
        let v_length = 2 * max_d;

        let mut v1 = vec![-1isize; v_length as usize];
        let mut v2 = vec![-1isize; v_length as usize];
        v1[(v_offset + 1) as usize] = 0;
        v2[(v_offset + 1) as usize] = 0;

        let delta = len1 - len2;
        // With an odd total length the front path collides with the reverse
        // path, otherwise the reverse path collides with the front path.
        let front = delta % 2 != 0;

        // Offsets for start and end of k loop, to prevent mapping of space
        // beyond the grid.
        let mut k1_start = 0;
        let mut k1_end = 0;
        let mut k2_start = 0;
        let mut k2_end = 0;

        for d in 0..max_d {
            if deadline.is_some_and(|deadline| Instant::now() > deadline) {
                tracing::debug!(
                    len1 = text1.len(),
                    len2 = text2.len(),
                    "diff deadline exceeded, emitting coarse edit"
                );
                break;
            }

            // Walk the front path one step
            let mut k1 = -d + k1_start;
            while k1 <= d - k1_end {
                let k1_offset = (v_offset + k1) as usize;
                let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                    v1[k1_offset + 1]
                } else {
                    v1[k1_offset - 1] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < len1 && y1 < len2 && text1[x1 as usize] == text2[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset] = x1;

                if x1 > len1 {
                    // Ran off the right of the graph
                    k1_end += 2;
                } else if y1 > len2 {
                    // Ran off the bottom of the graph
                    k1_start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                        // Mirror x2 onto the top-left coordinate system
                        let x2 = len1 - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.bisect_split(text1, text2, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }
                k1 += 2;
            }

            // Walk the reverse path one step
            let mut k2 = -d + k2_start;
            while k2 <= d - k2_end {
                let k2_offset = (v_offset + k2) as usize;
                let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                    v2[k2_offset + 1]
                } else {
                    v2[k2_offset - 1] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < len1
                    && y2 < len2
                    && text1[(len1 - x2 - 1) as usize] == text2[(len2 - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset] = x2;

                if x2 > len1 {
                    // Ran off the left of the graph
                    k2_end += 2;
                } else if y2 > len2 {
                    // Ran off the top of the graph
                    k2_start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        // Mirror x2 onto the top-left coordinate system
                        let x2 = len1 - x2;
                        if x1 >= x2 {
                            return self.bisect_split(text1, text2, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }
                k2 += 2;
            }
        }

        // Out of time or no commonality at all
        vec![
            Diff::from_chars(Op::Delete, text1.to_vec()),
            Diff::from_chars(Op::Insert, text2.to_vec()),
        ]
    }

    fn bisect_split(
        &self,
        text1: &[char],
        text2: &[char],
        x: usize,
        y: usize,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        let mut diffs = self.diff_chars(&text1[..x], &text2[..y], false, deadline);
        diffs.extend(self.diff_chars(&text1[x..], &text2[y..], false, deadline));
        diffs
    }

    /// Reconstructs the source text (all non-insertions).
    pub fn diff_text1(&self, diffs: &[Diff]) -> String {
        source_text(diffs).iter().collect()
    }

    /// Reconstructs the target text (all non-deletions).
    pub fn diff_text2(&self, diffs: &[Diff]) -> String {
        target_text(diffs).iter().collect()
    }

    /// Translates a location in text1 to the equivalent location in text2.
    ///
    /// A location inside a deletion maps to the start of that deletion.
    pub fn diff_x_index(&self, diffs: &[Diff], loc: usize) -> usize {
        x_index(diffs, loc)
    }

    /// Renders a diff list as HTML.
    pub fn diff_pretty_html(&self, diffs: &[Diff]) -> String {
        let mut html = String::new();
        for diff in diffs {
            let text = diff
                .text()
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
                .replace('\n', "&para;<br>");
            // Writing to a String cannot fail
            let _ = match diff.op {
                Op::Insert => write!(html, "<ins style=\"background:#e6ffe6;\">{text}</ins>"),
                Op::Delete => write!(html, "<del style=\"background:#ffe6e6;\">{text}</del>"),
                Op::Equal => write!(html, "<span>{text}</span>"),
            };
        }
        html
    }
}

/// Concatenates the fragments that exist in the source text.
pub(crate) fn source_text(diffs: &[Diff]) -> Vec<char> {
    diffs
        .iter()
        .filter(|diff| diff.op != Op::Insert)
        .flat_map(|diff| diff.text.iter().copied())
        .collect()
}

/// Concatenates the fragments that exist in the target text.
pub(crate) fn target_text(diffs: &[Diff]) -> Vec<char> {
    diffs
        .iter()
        .filter(|diff| diff.op != Op::Delete)
        .flat_map(|diff| diff.text.iter().copied())
        .collect()
}

pub(crate) fn x_index(diffs: &[Diff], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut landed_in = None;

    for diff in diffs {
        if diff.op != Op::Insert {
            chars1 += diff.text.len();
        }
        if diff.op != Op::Delete {
            chars2 += diff.text.len();
        }
        if chars1 > loc {
            landed_in = Some(diff.op);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }

    if landed_in == Some(Op::Delete) {
        return last_chars2;
    }
    last_chars2 + (loc - last_chars1)
}

/// Both texts re-encoded with one character per distinct line.
struct LineEncoding<'a> {
    chars1: Vec<char>,
    chars2: Vec<char>,
    /// Line text by code; code 0 is never handed out.
    lines: Vec<&'a [char]>,
}

impl<'a> LineEncoding<'a> {
    fn new(text1: &'a [char], text2: &'a [char]) -> Self {
        let mut lines: Vec<&'a [char]> = vec![&[]];
        let mut codes: HashMap<&'a [char], usize> = HashMap::new();

        let chars1 = encode_lines(text1, &mut lines, &mut codes, LINE_MODE_MAX_LINES_TEXT1);
        let chars2 = encode_lines(text2, &mut lines, &mut codes, LINE_MODE_MAX_LINES);

        Self {
            chars1,
            chars2,
            lines,
        }
    }

    /// Replaces every code in `diffs` with the line it stands for.
    fn expand(&self, diffs: &mut [Diff]) {
        for diff in diffs {
            diff.text = diff
                .text
                .iter()
                .flat_map(|&code| self.lines[char_to_code(code)].iter().copied())
                .collect();
        }
    }
}

fn encode_lines<'a>(
    text: &'a [char],
    lines: &mut Vec<&'a [char]>,
    codes: &mut HashMap<&'a [char], usize>,
    max_lines: usize,
) -> Vec<char> {
    let mut encoded = Vec::new();
    let mut line_start = 0;

    while line_start < text.len() {
        let mut line_end = text[line_start..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(text.len(), |pos| line_start + pos + 1);
        let mut line = &text[line_start..line_end];

        let code = match codes.get(line) {
            Some(&code) => code,
            None => {
                if lines.len() == max_lines {
                    // Out of codes, the rest of the text is one line
                    line = &text[line_start..];
                    line_end = text.len();
                }
                let code = lines.len();
                codes.insert(line, code);
                lines.push(line);
                code
            }
        };
        encoded.push(code_to_char(code));
        line_start = line_end;
    }

    encoded
}

/// Maps a line code to a char, stepping over the surrogate range.
#[allow(clippy::cast_possible_truncation)]
fn code_to_char(code: usize) -> char {
    let value = code as u32;
    let value = if value >= 0xD800 { value + 0x800 } else { value };
    // Codes stay below LINE_MODE_MAX_LINES, so this is always a scalar value
    char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn char_to_code(c: char) -> usize {
    let value = c as u32;
    let value = if value >= 0xE000 { value - 0x800 } else { value };
    value as usize
}
