//! Loading a flat little-endian word image from disk.

use rv16_core::Word;
use std::path::Path;

/// Read a `.bin` file of 32-bit little-endian words. A trailing partial
/// word (fewer than 4 bytes left) is ignored.
pub fn read_image(path: &Path) -> std::io::Result<Vec<Word>> {
    let bytes = std::fs::read(path)?;
    let words = bytes
        .chunks_exact(4)
        .map(|chunk| Word::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    Ok(words)
}
