//! Text wire formats: the patch text format and the diff delta format.
//!
//! Fragment text is percent-encoded the way `encodeURI` does it, except that
//! spaces stay literal. This keeps the output readable and byte-compatible
//! with other diff-match-patch ports.

use std::fmt;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

use crate::DiffMatchPatch;
use crate::diff::{Diff, Op};
use crate::error::{Error, Result};
use crate::patch::Patch;

/// Everything except the `encodeURI` reserved and unreserved marks, plus space.
const FRAGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b' ')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'#');

static PATCH_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+),?(\d*) \+(\d+),?(\d*) @@$").expect("Invalid Regex")
});

/// Percent-encodes a fragment for the patch or delta format.
pub(crate) fn encode_uri(text: &str) -> String {
    utf8_percent_encode(text, FRAGMENT).to_string()
}

/// Decodes a percent-encoded fragment.
///
/// Every `%` must start a two-digit hex escape and the decoded bytes must be
/// valid UTF-8.
pub(crate) fn decode_uri(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !valid {
                return Err(Error::InvalidEncoding(format!(
                    "bad escape at byte {i} in {text:?}"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(text)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::InvalidEncoding(format!("{e} in {text:?}")))
}

/// Formats one side of a patch header. Lengths of 0 and 1 have short forms.
fn header_coords(start: usize, length: usize) -> String {
    match length {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, length),
    }
}

/// Parses one side of a patch header back into a 0-based start and length.
fn parse_coords(start: &str, length: &str, header: &str) -> Result<(usize, usize)> {
    let invalid = || Error::InvalidHeader(header.to_string());
    let start: usize = start.parse().map_err(|_| invalid())?;

    match length {
        "" => Ok((start.checked_sub(1).ok_or_else(invalid)?, 1)),
        "0" => Ok((start, 0)),
        _ => {
            let length = length.parse().map_err(|_| invalid())?;
            Ok((start.checked_sub(1).ok_or_else(invalid)?, length))
        }
    }
}

impl fmt::Display for Patch {
    /// Renders the patch in GNU-diff-like unidiff form with encoded bodies.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            header_coords(self.start1, self.length1),
            header_coords(self.start2, self.length2)
        )?;
        for diff in &self.diffs {
            let sign = match diff.op {
                Op::Insert => '+',
                Op::Delete => '-',
                Op::Equal => ' ',
            };
            writeln!(f, "{sign}{}", encode_uri(&diff.text()))?;
        }
        Ok(())
    }
}

impl DiffMatchPatch {
    /// Serializes patches to the textual patch format.
    pub fn patch_to_text(&self, patches: &[Patch]) -> String {
        patches.iter().map(Patch::to_string).collect()
    }

    /// Parses the textual patch format.
    ///
    /// # Errors
    ///
    /// Returns an error if a header is malformed, a body line has an unknown
    /// prefix or bad percent-encoding, or a body does not add up to the
    /// lengths in its header.
    ///
    /// # Examples
    ///
    /// ```
    /// use dmpatch::DiffMatchPatch;
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let patches = dmp.patch_from_text("@@ -1 +1 @@\n-a\n+b\n")?;
    /// assert_eq!(patches[0].start1(), 0);
    /// assert_eq!(patches[0].length1(), 1);
    ///
    /// assert!(dmp.patch_from_text("@@ -1,5 +1,3 @@\n not5chars\n").is_err());
    /// # Ok::<(), dmpatch::Error>(())
    /// ```
    pub fn patch_from_text(&self, text: &str) -> Result<Vec<Patch>> {
        parse_patches(text)
    }

    /// Encodes a diff list as a compact delta against its source text:
    /// `=N` keeps N chars, `-N` deletes N chars, `+text` inserts text.
    /// Tokens are tab-separated.
    ///
    /// # Examples
    ///
    /// ```
    /// use dmpatch::{Diff, DiffMatchPatch};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let diffs = vec![Diff::equal("jump"), Diff::delete("s"), Diff::insert("ed")];
    /// assert_eq!(dmp.diff_to_delta(&diffs), "=4\t-1\t+ed");
    /// ```
    pub fn diff_to_delta(&self, diffs: &[Diff]) -> String {
        diffs
            .iter()
            .map(|diff| match diff.op {
                Op::Insert => format!("+{}", encode_uri(&diff.text())),
                Op::Delete => format!("-{}", diff.len()),
                Op::Equal => format!("={}", diff.len()),
            })
            .collect::<Vec<_>>()
            .join("\t")
    }

    /// Rebuilds a diff list from its source text and a delta.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDeltaToken`] for unknown operations, bad
    /// counts or counts that overrun `text1`, [`Error::InvalidEncoding`] for
    /// bad insert text, and [`Error::DeltaLengthMismatch`] when the delta
    /// does not cover `text1` exactly.
    pub fn diff_from_delta(&self, text1: &str, delta: &str) -> Result<Vec<Diff>> {
        let source: Vec<char> = text1.chars().collect();
        let mut diffs = Vec::new();
        let mut pointer: usize = 0;

        for token in delta.split('\t') {
            let mut chars = token.chars();
            let Some(op) = chars.next() else {
                // Blank tokens are ok (from a trailing \t)
                continue;
            };
            let param = chars.as_str();

            match op {
                '+' => diffs.push(Diff::new(Op::Insert, &decode_uri(param)?)),
                '-' | '=' => {
                    let count: usize = param.parse().map_err(|_| {
                        Error::InvalidDeltaToken(format!("invalid number in {token:?}"))
                    })?;
                    let end = pointer
                        .checked_add(count)
                        .filter(|&end| end <= source.len())
                        .ok_or_else(|| {
                            Error::InvalidDeltaToken(format!(
                                "{token:?} overruns source text of length {}",
                                source.len()
                            ))
                        })?;
                    let text = source[pointer..end].to_vec();
                    pointer = end;
                    let op = if op == '=' { Op::Equal } else { Op::Delete };
                    diffs.push(Diff::from_chars(op, text));
                }
                _ => {
                    return Err(Error::InvalidDeltaToken(format!(
                        "unknown operation in {token:?}"
                    )));
                }
            }
        }

        if pointer != source.len() {
            return Err(Error::DeltaLengthMismatch {
                consumed: pointer,
                expected: source.len(),
            });
        }
        Ok(diffs)
    }
}

/// Parses the patch text format; see [`DiffMatchPatch::patch_from_text`].
pub(crate) fn parse_patches(text: &str) -> Result<Vec<Patch>> {
    let mut patches = Vec::new();
    if text.is_empty() {
        return Ok(patches);
    }

    let mut lines = text.split('\n').peekable();
    while let Some(header) = lines.next() {
        let caps = PATCH_HEADER
            .captures(header)
            .ok_or_else(|| Error::InvalidHeader(header.to_string()))?;
        let (start1, length1) = parse_coords(&caps[1], &caps[2], header)?;
        let (start2, length2) = parse_coords(&caps[3], &caps[4], header)?;

        let mut patch = Patch {
            start1,
            start2,
            length1,
            length2,
            ..Patch::default()
        };

        while let Some(&line) = lines.peek() {
            let mut chars = line.chars();
            let Some(sign) = chars.next() else {
                // Blank line, skip it
                lines.next();
                continue;
            };
            if sign == '@' {
                // Start of the next patch
                break;
            }
            let op = match sign {
                '-' => Op::Delete,
                '+' => Op::Insert,
                ' ' => Op::Equal,
                mode => {
                    return Err(Error::InvalidLineMode {
                        mode,
                        line: line.to_string(),
                    });
                }
            };
            let body = decode_uri(chars.as_str())?;
            patch.diffs.push(Diff::new(op, &body));
            lines.next();
        }

        let (actual1, actual2) = patch.measured_lengths();
        if actual1 != patch.length1 || actual2 != patch.length2 {
            tracing::debug!(header, actual1, actual2, "Patch body disagrees with header");
            return Err(Error::LengthMismatch {
                header: header.to_string(),
                expected1: patch.length1,
                expected2: patch.length2,
                actual1,
                actual2,
            });
        }
        patches.push(patch);
    }

    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_keeps_safe_characters() {
        let safe = "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ";
        assert_eq!(encode_uri(safe), safe);
        assert_eq!(decode_uri(safe).unwrap(), safe);
    }

    #[test]
    fn test_encode_escapes() {
        assert_eq!(encode_uri("\n"), "%0A");
        assert_eq!(encode_uri("%"), "%25");
        assert_eq!(encode_uri("\u{0682} \u{2} \\ |"), "%DA%82 %02 %5C %7C");
        assert_eq!(decode_uri("%DA%82 %02 %5C %7C").unwrap(), "\u{0682} \u{2} \\ |");
    }

    #[test]
    fn test_decode_rejects_bad_escapes() {
        assert!(matches!(decode_uri("%c3%xy"), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode_uri("abc%"), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode_uri("%4"), Err(Error::InvalidEncoding(_))));
        // Lone continuation byte
        assert!(matches!(decode_uri("%80"), Err(Error::InvalidEncoding(_))));
    }

    #[test]
    fn test_header_coords() {
        assert_eq!(header_coords(20, 18), "21,18");
        assert_eq!(header_coords(20, 1), "21");
        assert_eq!(header_coords(20, 0), "20,0");
    }

    #[test]
    fn test_patch_from_text_headers() {
        let dmp = DiffMatchPatch::new();
        assert!(dmp.patch_from_text("").unwrap().is_empty());

        let patches = dmp.patch_from_text("@@ -1 +1 @@\n-a\n+b\n").unwrap();
        assert_eq!((patches[0].start1, patches[0].length1), (0, 1));
        assert_eq!((patches[0].start2, patches[0].length2), (0, 1));

        let patches = dmp.patch_from_text("@@ -1,3 +0,0 @@\n-abc\n").unwrap();
        assert_eq!((patches[0].start1, patches[0].length1), (0, 3));
        assert_eq!((patches[0].start2, patches[0].length2), (0, 0));

        let patches = dmp.patch_from_text("@@ -0,0 +1,3 @@\n+abc\n").unwrap();
        assert_eq!((patches[0].start1, patches[0].length1), (0, 0));
        assert_eq!((patches[0].start2, patches[0].length2), (0, 3));
    }

    #[test]
    fn test_patch_text_round_trip() {
        let dmp = DiffMatchPatch::new();
        for text in [
            "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0Alaz\n",
            "@@ -1,9 +1,9 @@\n-f\n+F\n oo+fooba\n@@ -7,9 +7,9 @@\n obar\n-,\n+.\n  tes\n",
        ] {
            let patches = dmp.patch_from_text(text).unwrap();
            assert_eq!(dmp.patch_to_text(&patches), text);
        }
    }

    #[test]
    fn test_patch_from_text_decodes_body() {
        let dmp = DiffMatchPatch::new();
        let patches = dmp
            .patch_from_text("@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0Alaz\n")
            .unwrap();
        let diffs = &patches[0].diffs;
        assert_eq!(diffs[0], Diff::equal("jump"));
        assert_eq!(diffs[3], Diff::equal(" over "));
        assert_eq!(diffs[6], Diff::equal("\nlaz"));
    }

    #[test]
    fn test_patch_from_text_errors() {
        let dmp = DiffMatchPatch::new();
        assert!(matches!(
            dmp.patch_from_text("Bad\nPatch\n"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(matches!(
            dmp.patch_from_text("@@ -0 +1 @@\n+a\n"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(matches!(
            dmp.patch_from_text("@@ -1 +1 @@\n*a\n"),
            Err(Error::InvalidLineMode { mode: '*', .. })
        ));
        assert!(matches!(
            dmp.patch_from_text("@@ -1 +1 @@\n-%zz\n+b\n"),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            dmp.patch_from_text("@@ -1,5 +1,3 @@\n not5chars\n"),
            Err(Error::LengthMismatch {
                expected1: 5,
                actual1: 9,
                ..
            })
        ));
    }

    #[test]
    fn test_delta_round_trip() {
        let dmp = DiffMatchPatch::new();
        let diffs = vec![
            Diff::equal("jump"),
            Diff::delete("s"),
            Diff::insert("ed"),
            Diff::equal(" over "),
            Diff::delete("the"),
            Diff::insert("a"),
            Diff::equal(" lazy"),
            Diff::insert("old dog"),
        ];
        let text1 = dmp.diff_text1(&diffs);
        assert_eq!(text1, "jumps over the lazy");

        let delta = dmp.diff_to_delta(&diffs);
        assert_eq!(delta, "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog");
        assert_eq!(dmp.diff_from_delta(&text1, &delta).unwrap(), diffs);
    }

    #[test]
    fn test_delta_special_characters() {
        let dmp = DiffMatchPatch::new();
        let diffs = vec![
            Diff::equal("\u{0680} \u{0} \t %"),
            Diff::delete("\u{0681} \u{1} \n ^"),
            Diff::insert("\u{0682} \u{2} \\ |"),
        ];
        let text1 = dmp.diff_text1(&diffs);
        assert_eq!(text1.chars().count(), 14);

        let delta = dmp.diff_to_delta(&diffs);
        assert_eq!(delta, "=7\t-7\t+%DA%82 %02 %5C %7C");
        assert_eq!(dmp.diff_from_delta(&text1, &delta).unwrap(), diffs);
    }

    #[test]
    fn test_delta_unchanged_characters() {
        let dmp = DiffMatchPatch::new();
        let diffs = vec![Diff::insert("A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ")];
        let delta = dmp.diff_to_delta(&diffs);
        assert_eq!(delta, "+A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ");
        assert_eq!(dmp.diff_from_delta("", &delta).unwrap(), diffs);
    }

    #[test]
    fn test_delta_errors() {
        let dmp = DiffMatchPatch::new();
        let delta = "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog";

        assert!(matches!(
            dmp.diff_from_delta("jumps over the lazyx", delta),
            Err(Error::DeltaLengthMismatch {
                consumed: 19,
                expected: 20
            })
        ));
        assert!(matches!(
            dmp.diff_from_delta("umps over the lazy", delta),
            Err(Error::InvalidDeltaToken(_))
        ));
        assert!(matches!(
            dmp.diff_from_delta("", "+%c3%xy"),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            dmp.diff_from_delta("abc", "=-3"),
            Err(Error::InvalidDeltaToken(_))
        ));
        assert!(matches!(
            dmp.diff_from_delta("abc", "*3"),
            Err(Error::InvalidDeltaToken(_))
        ));
    }

    #[test]
    fn test_delta_trailing_tab() {
        let dmp = DiffMatchPatch::new();
        assert_eq!(
            dmp.diff_from_delta("abc", "=3\t").unwrap(),
            vec![Diff::equal("abc")]
        );
    }
}
