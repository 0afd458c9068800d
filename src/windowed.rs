use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, trace};

use crate::{ScriptSource, SplitError};

/// Default size of the decode window, in bytes of source text.
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

// A UTF-8 sequence is at most 4 bytes, so growing a chunk 3 times is enough to complete any
// sequence cut by a chunk boundary. If decoding still fails, the file is genuinely corrupt.
const MAX_DECODE_GROWTH: usize = 3;

/// Character encodings supported by the windowed reader.
///
/// UTF-8 covers the multi-byte case, Latin-1 the single-byte legacy case. Both decode with the
/// standard library; the splitter itself only ever sees character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

// The start of a chunk, in both byte and character space. Chunk starts are discovered in order
// as the window slides forward and kept so the window can slide backward again.
#[derive(Debug, Clone, Copy)]
struct ChunkStart {
    byte: u64,
    ch: usize,
}

// One decoded chunk of the file.
struct Chunk {
    index: usize,
    char_start: usize,
    chars: Vec<char>,
}

impl Chunk {
    fn char_end(&self) -> usize {
        self.char_start + self.chars.len()
    }

    fn contains(&self, pos: usize) -> bool {
        pos >= self.char_start && pos < self.char_end()
    }
}

/// A windowed random-access character view over a file.
///
/// At most two decoded chunks (the current one and the previously visited one) are kept in
/// memory, so memory use stays constant regardless of the file size. `char_at` and `slice`
/// operate in character space while I/O operates in byte space; the mapping between the two is
/// tracked per chunk so offsets are stable for multi-byte encodings.
///
/// Both forward and backward sliding are supported: the splitter re-examines the trailing
/// boundary of a completed command, which may live in the previous chunk. Only single-threaded,
/// single-reader access is supported. The file handle is owned by the window and closed exactly
/// once, when the window is dropped.
pub struct WindowedText {
    file: File,
    encoding: Encoding,
    chunk_size: usize,
    starts: Vec<ChunkStart>,
    /// Total length in characters, known once the end of the file has been reached.
    total_chars: Option<usize>,
    current: Option<Chunk>,
    previous: Option<Chunk>,
}

impl WindowedText {
    /// Opens a file for windowed reading with the default chunk size.
    pub fn open(path: impl AsRef<Path>, encoding: Encoding) -> Result<Self, SplitError> {
        Self::with_chunk_size(path, encoding, DEFAULT_CHUNK_SIZE)
    }

    /// Opens a file for windowed reading with an explicit chunk size (in bytes).
    pub fn with_chunk_size(
        path: impl AsRef<Path>,
        encoding: Encoding,
        chunk_size: usize,
    ) -> Result<Self, SplitError> {
        if chunk_size == 0 {
            return Err(SplitError::Config("chunk size must not be zero".to_string()));
        }
        let file = File::open(path.as_ref())?;
        debug!(
            "opened {} for windowed splitting ({:?}, {} byte chunks)",
            path.as_ref().display(),
            encoding,
            chunk_size
        );
        Ok(WindowedText {
            file,
            encoding,
            chunk_size,
            starts: vec![ChunkStart { byte: 0, ch: 0 }],
            total_chars: None,
            current: None,
            previous: None,
        })
    }

    /// Total length of the file in characters, once known. Only available after the window has
    /// reached the end of the file at least once.
    pub fn total_chars(&self) -> Option<usize> {
        self.total_chars
    }

    // Makes `self.current` the chunk containing `pos`. Returns false when `pos` is at or past
    // the end of the file.
    fn ensure_chunk_for(&mut self, pos: usize) -> Result<bool, SplitError> {
        loop {
            if let Some(total) = self.total_chars {
                if pos >= total {
                    return Ok(false);
                }
            }
            if matches!(&self.current, Some(chunk) if chunk.contains(pos)) {
                return Ok(true);
            }
            if matches!(&self.previous, Some(chunk) if chunk.contains(pos)) {
                std::mem::swap(&mut self.current, &mut self.previous);
                return Ok(true);
            }
            // Chunk starts are discovered in order, so the candidate is the last known start at
            // or before `pos`. When that chunk is already loaded but ends before `pos`, the next
            // start has just been discovered and the window slides one chunk forward.
            let mut index = self.starts.partition_point(|s| s.ch <= pos).saturating_sub(1);
            if matches!(&self.current, Some(chunk) if chunk.index == index && chunk.char_end() <= pos)
            {
                index += 1;
            }
            if index >= self.starts.len() || !self.load_chunk(index)? {
                return Ok(false);
            }
        }
    }

    // Loads chunk `index` into `self.current`, sliding the window. Returns false when the chunk
    // starts at the end of the file.
    fn load_chunk(&mut self, index: usize) -> Result<bool, SplitError> {
        if matches!(&self.current, Some(chunk) if chunk.index == index) {
            return Ok(true);
        }
        if matches!(&self.previous, Some(chunk) if chunk.index == index) {
            std::mem::swap(&mut self.current, &mut self.previous);
            return Ok(true);
        }
        let Some(start) = self.starts.get(index).copied() else {
            return Ok(false);
        };

        let mut growth = 0;
        let (chars, consumed, at_eof) = loop {
            let wanted = self.chunk_size + growth;
            self.file.seek(SeekFrom::Start(start.byte))?;
            let mut buf = Vec::with_capacity(wanted);
            self.file.by_ref().take(wanted as u64).read_to_end(&mut buf)?;
            let read = buf.len();
            let at_eof = read < wanted;
            match self.encoding {
                Encoding::Latin1 => {
                    break (buf.iter().map(|&b| b as char).collect::<Vec<char>>(), read, at_eof);
                }
                Encoding::Utf8 => match std::str::from_utf8(&buf) {
                    Ok(text) => break (text.chars().collect::<Vec<char>>(), read, at_eof),
                    Err(e) => {
                        // An incomplete sequence at the end of the chunk is an unlucky boundary:
                        // grow the chunk one byte at a time until the sequence completes. Any
                        // other failure is a corrupt encoding.
                        let incomplete_at_boundary = e.error_len().is_none() && !at_eof;
                        if incomplete_at_boundary && growth < MAX_DECODE_GROWTH {
                            growth += 1;
                            trace!(
                                "growing chunk {} to {} bytes to complete a multi-byte sequence",
                                index,
                                self.chunk_size + growth
                            );
                            continue;
                        }
                        return Err(SplitError::Decode {
                            offset: start.byte + e.valid_up_to() as u64,
                        });
                    }
                },
            }
        };

        if consumed == 0 {
            self.total_chars = Some(start.ch);
            return Ok(false);
        }
        if at_eof {
            self.total_chars = Some(start.ch + chars.len());
        } else if self.starts.len() == index + 1 {
            self.starts.push(ChunkStart { byte: start.byte + consumed as u64, ch: start.ch + chars.len() });
        }
        trace!("loaded chunk {} ({} chars at char offset {})", index, chars.len(), start.ch);
        self.previous = self.current.take();
        self.current = Some(Chunk { index, char_start: start.ch, chars });
        Ok(true)
    }
}

impl ScriptSource for WindowedText {
    fn char_at(&mut self, pos: usize) -> Result<Option<char>, SplitError> {
        if !self.ensure_chunk_for(pos)? {
            return Ok(None);
        }
        match &self.current {
            Some(chunk) => Ok(chunk.chars.get(pos - chunk.char_start).copied()),
            None => Ok(None),
        }
    }

    fn slice(&mut self, start: usize, end: usize) -> Result<String, SplitError> {
        let mut out = String::new();
        let mut pos = start;
        while pos < end {
            if !self.ensure_chunk_for(pos)? {
                break;
            }
            let Some(chunk) = &self.current else { break };
            let from = pos - chunk.char_start;
            let to = (end.min(chunk.char_end())) - chunk.char_start;
            out.extend(&chunk.chars[from..to]);
            pos = chunk.char_start + to;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
        file.write_all(content).expect("failed to write temp file");
        file.flush().expect("failed to flush temp file");
        file
    }

    #[test]
    fn test_char_at_matches_in_memory() {
        // Multi-byte characters with a tiny chunk size so boundaries fall inside sequences.
        let content = "sélect 'déjà vu' from tàble;\n".repeat(20);
        let file = write_temp(content.as_bytes());
        let mut window = WindowedText::with_chunk_size(file.path(), Encoding::Utf8, 16).unwrap();

        let chars: Vec<char> = content.chars().collect();
        for (i, &expected) in chars.iter().enumerate() {
            assert_eq!(window.char_at(i).unwrap(), Some(expected), "mismatch at char {i}");
        }
        assert_eq!(window.char_at(chars.len()).unwrap(), None);
        assert_eq!(window.total_chars(), Some(chars.len()));
    }

    #[test]
    fn test_backward_then_forward_sliding() {
        let content = "0123456789".repeat(10);
        let file = write_temp(content.as_bytes());
        let mut window = WindowedText::with_chunk_size(file.path(), Encoding::Utf8, 8).unwrap();

        // Scan forward past several chunks, then jump back to the start, then forward again.
        assert_eq!(window.char_at(77).unwrap(), Some('7'));
        assert_eq!(window.char_at(0).unwrap(), Some('0'));
        assert_eq!(window.char_at(99).unwrap(), Some('9'));
        assert_eq!(window.char_at(100).unwrap(), None);
    }

    #[test]
    fn test_slice_across_chunk_boundaries() {
        let content = "àbcdéfghîj".repeat(8);
        let file = write_temp(content.as_bytes());
        let mut window = WindowedText::with_chunk_size(file.path(), Encoding::Utf8, 8).unwrap();

        let chars: Vec<char> = content.chars().collect();
        let expected: String = chars[5..35].iter().collect();
        assert_eq!(window.slice(5, 35).unwrap(), expected);
        // An end past the end of the file is clamped.
        let expected: String = chars[70..].iter().collect();
        assert_eq!(window.slice(70, 1000).unwrap(), expected);
    }

    #[test]
    fn test_latin1_decoding() {
        // 0xE9 is 'é' in Latin-1 but an invalid UTF-8 sequence.
        let file = write_temp(b"caf\xE9;\n");
        let mut window = WindowedText::with_chunk_size(file.path(), Encoding::Latin1, 4).unwrap();
        assert_eq!(window.slice(0, 5).unwrap(), "café;");
        assert_eq!(window.slice(0, 6).unwrap(), "café;\n");
        assert_eq!(window.char_at(3).unwrap(), Some('é'));
    }

    #[test]
    fn test_corrupt_utf8_is_a_decode_error() {
        let file = write_temp(b"select \xE9 from t;");
        let mut window = WindowedText::with_chunk_size(file.path(), Encoding::Utf8, 64).unwrap();
        match window.char_at(0) {
            Err(SplitError::Decode { offset }) => assert_eq!(offset, 7),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_chunk_size_is_a_config_error() {
        let file = write_temp(b"select 1;");
        assert!(matches!(
            WindowedText::with_chunk_size(file.path(), Encoding::Utf8, 0),
            Err(SplitError::Config(_))
        ));
    }
}
