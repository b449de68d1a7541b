use crate::content::ContentChunk;
use sha2::{Digest, Sha256};
use std::iter;

/// Deterministic chunk id: SHA-256 of the URL and character offset
pub fn chunk_id(url: &str, offset: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"#");
    hasher.update(offset.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Splits `text` into overlapping fixed-size windows
///
/// Windows advance by `window - overlap` characters. A window whose trimmed
/// text is shorter than `min_chars` is dropped. Offsets count characters, not
/// bytes, so multi-byte text never splits inside a code point.
///
/// # Arguments
///
/// * `url` - Source URL, part of every chunk id
/// * `text` - Whitespace-normalized document text
/// * `window` - Window size in characters
/// * `overlap` - Characters shared by consecutive windows (must be < `window`)
/// * `min_chars` - Minimum trimmed length of a kept window
pub fn chunk_text(
    url: &str,
    text: &str,
    window: usize,
    overlap: usize,
    min_chars: usize,
) -> Vec<ContentChunk> {
    if window == 0 || text.is_empty() {
        return Vec::new();
    }

    // Byte position of every char boundary, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(iter::once(text.len()))
        .collect();
    let total = boundaries.len() - 1;
    let step = window.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total {
        let end = (start + window).min(total);
        let slice = text[boundaries[start]..boundaries[end]].trim();

        if slice.chars().count() >= min_chars {
            chunks.push(ContentChunk {
                id: chunk_id(url, start),
                text: slice.to_string(),
                offset: start,
                word_count: slice.split_whitespace().count(),
            });
        }

        if end == total {
            break;
        }
        start += step;
    }

    chunks
}
