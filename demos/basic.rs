//! Basic usage example for dmpatch.
//!
//! Run with `RUST_LOG=dmpatch=debug` to see degradation and relocation logs.

use dmpatch::{Compression, DiffMatchPatch, PatchInput, compress_patches, decompress_patches};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dmp = DiffMatchPatch::new();

    // Example 1: Simple text modification
    println!("=== Example 1: Simple Text Modification ===");
    let old_text = "The quick brown fox jumps over the lazy dog";
    let new_text = "The quick brown cat jumps over the lazy dog";

    let diffs = dmp.diff_main(old_text, new_text);
    println!("Old text: {old_text:?}");
    println!("New text: {new_text:?}");
    println!("Diff:     {:?}", diffs);
    println!("Distance: {} chars", dmp.diff_levenshtein(&diffs));
    println!("Delta:    {:?}", dmp.diff_to_delta(&diffs));

    println!();

    // Example 2: Patching a drifted document
    println!("=== Example 2: Patching a Drifted Document ===");
    let version1 = "# Project Documentation\n\
                    ## Overview\n\
                    This is the initial version of our project.\n\
                    It contains basic information.\n";

    let version2 = "# Project Documentation\n\
                    ## Overview\n\
                    This is version 2 of our project.\n\
                    It contains updated information and new features.\n\
                    ## New Section\n\
                    Additional content here.\n";

    let patches = dmp.patch_make(PatchInput::Texts(version1, version2));
    let patch_text = dmp.patch_to_text(&patches);
    println!("Patch ({} bytes):\n{patch_text}", patch_text.len());

    // Someone edited the top of the document in the meantime
    let drifted = format!("<!-- generated -->\n{version1}");
    let (patched, applied) = dmp.patch_apply(&patches, &drifted);
    println!("Applied hunks: {applied:?}");
    if applied.iter().all(|&ok| ok) {
        assert_eq!(patched, format!("<!-- generated -->\n{version2}"));
        println!("✓ Patch applied to the drifted document!");
    } else {
        println!("Some hunks did not apply:\n{patched}");
    }

    println!();

    // Example 3: Shipping a patch set
    println!("=== Example 3: Shipping a Patch Set ===");
    let compression = if cfg!(feature = "zstd") {
        Compression::Zstd
    } else if cfg!(feature = "lz4") {
        Compression::Lz4
    } else {
        Compression::None
    };

    match compress_patches(&patches, compression) {
        Ok(bytes) => {
            println!("Codec: {}", compression.name());
            println!("Patch text size: {} bytes", patch_text.len());
            println!("Payload size:    {} bytes", bytes.len());

            match decompress_patches(&bytes) {
                Ok(restored) => {
                    assert_eq!(restored, patches);
                    println!("✓ Successfully restored the patch set!");
                }
                Err(e) => eprintln!("Decompress error: {}", e),
            }
        }
        Err(e) => eprintln!("Compress error: {}", e),
    }

    println!();
    println!("=== All Examples Completed ===");
}
