//! Optional compression of serialized patch sets.
//!
//! Patch text is mostly context and percent escapes, so it compresses well.
//! The zstd and lz4 backends are behind cargo features of the same names;
//! asking for one that was not compiled in yields
//! [`Error::CodecUnavailable`].

#[cfg(feature = "lz4")]
use std::io;

use crate::encoding::parse_patches;
use crate::error::{Error, Result};
use crate::patch::Patch;

const ZSTD_MAGIC: &[u8] = &[0x28, 0xB5, 0x2F, 0xFD];
const LZ4_MAGIC: &[u8] = &[0x04, 0x22, 0x4D, 0x18];

#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 3;
#[cfg(feature = "lz4")]
const LZ4_LEVEL: u32 = 1;

/// A reversible byte transform.
pub trait Codec {
    /// Compresses `data`.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Reverses [`compress`](Codec::compress).
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Compression applied to serialized patches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Compression {
    /// Raw patch text
    #[default]
    None,
    /// Zstd frame (good balance)
    Zstd,
    /// LZ4 frame (faster)
    Lz4,
}

impl Compression {
    /// Identifies the codec of `data` from its frame magic. Anything
    /// unrecognized is taken to be uncompressed.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(ZSTD_MAGIC) {
            Self::Zstd
        } else if data.starts_with(LZ4_MAGIC) {
            Self::Lz4
        } else {
            Self::None
        }
    }

    /// Lowercase codec name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zstd => "zstd",
            Self::Lz4 => "lz4",
        }
    }
}

impl Codec for Compression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Zstd => compress_zstd(data),
            Self::Lz4 => compress_lz4(data),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Zstd => decompress_zstd(data),
            Self::Lz4 => decompress_lz4(data),
        }
    }
}

/// Serializes `patches` to patch text and compresses it.
///
/// # Errors
///
/// Returns [`Error::CodecUnavailable`] if `compression` was not compiled in,
/// or [`Error::Codec`] if the backend fails.
pub fn compress_patches(patches: &[Patch], compression: Compression) -> Result<Vec<u8>> {
    let text: String = patches.iter().map(Patch::to_string).collect();
    let compressed = compression.compress(text.as_bytes())?;
    tracing::debug!(
        codec = compression.name(),
        raw = text.len(),
        compressed = compressed.len(),
        "Compressed patch set"
    );
    Ok(compressed)
}

/// Detects the codec, decompresses and parses a patch set produced by
/// [`compress_patches`].
///
/// # Errors
///
/// Fails on codec errors, if the payload is not UTF-8, or if it is not valid
/// patch text.
pub fn decompress_patches(data: &[u8]) -> Result<Vec<Patch>> {
    let compression = Compression::detect(data);
    tracing::debug!(codec = compression.name(), "Detected patch set codec");

    let raw = compression.decompress(data)?;
    let text = String::from_utf8(raw)
        .map_err(|e| Error::InvalidEncoding(format!("patch set is not UTF-8: {e}")))?;
    parse_patches(&text)
}

#[cfg(feature = "zstd")]
fn compress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(data, ZSTD_LEVEL)
        .map_err(|e| Error::Codec(format!("zstd compression failed: {e}")))
}

#[cfg(feature = "zstd")]
fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(|e| Error::Codec(format!("zstd decompression failed: {e}")))
}

#[cfg(not(feature = "zstd"))]
fn compress_zstd(_data: &[u8]) -> Result<Vec<u8>> {
    Err(Error::CodecUnavailable("zstd"))
}

#[cfg(not(feature = "zstd"))]
fn decompress_zstd(_data: &[u8]) -> Result<Vec<u8>> {
    Err(Error::CodecUnavailable("zstd"))
}

#[cfg(feature = "lz4")]
fn compress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    // Frame format, so the output carries the magic bytes
    let mut encoder = lz4::EncoderBuilder::new()
        .level(LZ4_LEVEL)
        .build(Vec::new())
        .map_err(|e| Error::Codec(format!("failed to create LZ4 encoder: {e}")))?;

    io::copy(&mut &data[..], &mut encoder)
        .map_err(|e| Error::Codec(format!("LZ4 compression failed: {e}")))?;

    let (compressed, result) = encoder.finish();
    result.map_err(|e| Error::Codec(format!("failed to finish LZ4 compression: {e}")))?;

    Ok(compressed)
}

#[cfg(feature = "lz4")]
fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = lz4::Decoder::new(data)
        .map_err(|e| Error::Codec(format!("failed to create LZ4 decoder: {e}")))?;

    let mut decompressed = Vec::new();
    io::copy(&mut decoder, &mut decompressed)
        .map_err(|e| Error::Codec(format!("LZ4 decompression failed: {e}")))?;

    Ok(decompressed)
}

#[cfg(not(feature = "lz4"))]
fn compress_lz4(_data: &[u8]) -> Result<Vec<u8>> {
    Err(Error::CodecUnavailable("lz4"))
}

#[cfg(not(feature = "lz4"))]
fn decompress_lz4(_data: &[u8]) -> Result<Vec<u8>> {
    Err(Error::CodecUnavailable("lz4"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiffMatchPatch, PatchInput};

    fn sample_patches() -> Vec<Patch> {
        let dmp = DiffMatchPatch::new();
        let old = "The quick brown fox jumps over the lazy dog.\n".repeat(20);
        let new = old.replace("lazy", "sleepy");
        dmp.patch_make(PatchInput::Texts(&old, &new))
    }

    #[test]
    fn test_detect() {
        assert_eq!(Compression::detect(&[0x28, 0xB5, 0x2F, 0xFD, 0x00]), Compression::Zstd);
        assert_eq!(Compression::detect(&[0x04, 0x22, 0x4D, 0x18, 0x00]), Compression::Lz4);
        assert_eq!(Compression::detect(b"@@ -1 +1 @@\n"), Compression::None);
        assert_eq!(Compression::detect(&[]), Compression::None);
    }

    #[test]
    fn test_uncompressed_round_trip() {
        let patches = sample_patches();
        let bytes = compress_patches(&patches, Compression::None).unwrap();
        assert!(bytes.starts_with(b"@@ -"));
        assert_eq!(decompress_patches(&bytes).unwrap(), patches);
    }

    #[test]
    fn test_rejects_non_utf8_payload() {
        assert!(matches!(
            decompress_patches(&[0xFF, 0xFE, 0x00]),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn test_zstd_round_trip() {
        let patches = sample_patches();
        let bytes = compress_patches(&patches, Compression::Zstd).unwrap();
        assert_eq!(Compression::detect(&bytes), Compression::Zstd);
        assert_eq!(decompress_patches(&bytes).unwrap(), patches);
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_round_trip() {
        let patches = sample_patches();
        let bytes = compress_patches(&patches, Compression::Lz4).unwrap();
        assert_eq!(Compression::detect(&bytes), Compression::Lz4);
        assert_eq!(decompress_patches(&bytes).unwrap(), patches);
    }

    #[cfg(not(feature = "zstd"))]
    #[test]
    fn test_zstd_unavailable() {
        assert_eq!(
            Compression::Zstd.compress(b"data"),
            Err(Error::CodecUnavailable("zstd"))
        );
    }

    #[cfg(not(feature = "lz4"))]
    #[test]
    fn test_lz4_unavailable() {
        assert_eq!(
            Compression::Lz4.decompress(b"data"),
            Err(Error::CodecUnavailable("lz4"))
        );
    }
}
