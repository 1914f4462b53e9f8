/// Streaming line-based text chunking.
///
/// Reads a file line by line and accumulates lines into bounded chunks
/// without ever holding the whole file in a single buffer. Lines longer
/// than [`MAX_LINE_CHARS`] are dropped outright; a single line that
/// exceeds the soft chunk bound is emitted alone, never split.
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::warn;

/// Hard per-line ceiling (in characters). Longer lines contribute to no chunk.
pub const MAX_LINE_CHARS: usize = 10_000;

/// One chunk of a file's text, before project metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkText {
    /// Trimmed chunk content.
    pub content: String,
    /// Zero-based position within the file, contiguous in emission order.
    pub chunk_index: usize,
}

/// Split a file into ordered chunks of at most `max_chunk_size` characters.
///
/// The bound is soft: a chunk holding a single line longer than
/// `max_chunk_size` is emitted as-is. Character counts include the
/// newlines joining accumulated lines. An empty file, or one whose
/// content trims to nothing, yields zero chunks. A read error aborts
/// this file only; the caller treats it as a per-file failure.
pub fn chunk_file(path: &Path, max_chunk_size: usize) -> io::Result<Vec<ChunkText>> {
    let reader = BufReader::new(File::open(path)?);

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for line in reader.lines() {
        let line = line?;
        let line_chars = line.chars().count();

        if line_chars > MAX_LINE_CHARS {
            warn!(
                "dropping oversized line ({line_chars} chars) in {}",
                path.display()
            );
            continue;
        }

        if buf_chars > 0 && buf_chars + line_chars > max_chunk_size {
            emit(&mut buf, &mut chunks);
            buf.push_str(&line);
            buf_chars = line_chars;
        } else {
            if buf_chars > 0 {
                buf.push('\n');
                buf_chars += 1;
            }
            buf.push_str(&line);
            buf_chars += line_chars;
        }
    }

    if buf_chars > 0 {
        emit(&mut buf, &mut chunks);
    }

    Ok(chunks)
}

/// Trim and append the buffer as the next chunk, skipping whitespace-only
/// buffers so chunk indices stay contiguous over non-empty content.
fn emit(buf: &mut String, chunks: &mut Vec<ChunkText>) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        chunks.push(ChunkText {
            content: trimmed.to_string(),
            chunk_index: chunks.len(),
        });
    }
    buf.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{content}").unwrap();
        f
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        let f = write_temp("");
        let chunks = chunk_file(f.path(), 1500).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_whitespace_only_yields_no_chunks() {
        let f = write_temp("   \n\n   \n");
        let chunks = chunk_file(f.path(), 1500).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_small_file_single_chunk() {
        let f = write_temp("line one\nline two\nline three");
        let chunks = chunk_file(f.path(), 1500).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].content, "line one\nline two\nline three");
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let lines: Vec<String> = (0..50).map(|i| format!("line number {i:04} {}", "x".repeat(40))).collect();
        let f = write_temp(&lines.join("\n"));
        let chunks = chunk_file(f.path(), 200).unwrap();
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
        }
    }

    #[test]
    fn test_chunk_size_bound() {
        let lines: Vec<String> = (0..100).map(|i| format!("{i}: some content here")).collect();
        let f = write_temp(&lines.join("\n"));
        let max = 120;
        let chunks = chunk_file(f.path(), max).unwrap();
        for c in &chunks {
            assert!(
                c.content.chars().count() <= max,
                "chunk exceeded bound: {} chars",
                c.content.chars().count()
            );
        }
    }

    #[test]
    fn test_oversize_line_not_split() {
        let long_line = "a".repeat(300);
        let f = write_temp(&format!("short\n{long_line}\nshort again"));
        let chunks = chunk_file(f.path(), 100).unwrap();
        // The long line stays whole in its own chunk
        assert!(chunks.iter().any(|c| c.content == long_line));
    }

    #[test]
    fn test_reconstruction() {
        let content = "fn main() {\n    println!(\"hello\");\n}\n\nfn other() {}\n";
        let f = write_temp(content);
        let chunks = chunk_file(f.path(), 1500).unwrap();
        let rebuilt: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        // Single chunk, trimmed
        assert_eq!(rebuilt.join("\n"), content.trim());
    }

    #[test]
    fn test_hard_line_limit_drops_line() {
        let huge = "z".repeat(MAX_LINE_CHARS + 1);
        let f = write_temp(&format!("keep me\n{huge}\nand me"));
        let chunks = chunk_file(f.path(), 1500).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "keep me\nand me");
        assert!(!chunks.iter().any(|c| c.content.contains(&huge)));
    }

    #[test]
    fn test_line_at_limit_kept() {
        let edge = "z".repeat(MAX_LINE_CHARS);
        let f = write_temp(&edge);
        let chunks = chunk_file(f.path(), 20_000).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, edge);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = chunk_file(Path::new("/definitely/not/a/file.txt"), 1500);
        assert!(result.is_err());
    }
}
