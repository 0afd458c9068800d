use crate::SplitError;

/// Random-access character view over the script being split.
///
/// All positions are character offsets, not byte offsets, so the offsets the splitter reports are
/// identical whether the script comes from memory or from a file read through a sliding window.
/// Implementations take `&mut self` because a windowed source may need to slide its chunk to
/// satisfy a read.
pub trait ScriptSource {
    /// The character at `pos`, or `None` at or past the end of the input.
    fn char_at(&mut self, pos: usize) -> Result<Option<char>, SplitError>;

    /// The characters in `start..end` as an owned string. An `end` past the end of the input is
    /// clamped.
    fn slice(&mut self, start: usize, end: usize) -> Result<String, SplitError>;
}

/// An in-memory source over a string.
///
/// The input is decoded to a character vector once so that `char_at` is O(1) in character space.
pub struct StringSource {
    chars: Vec<char>,
}

impl StringSource {
    pub fn new(input: &str) -> Self {
        StringSource { chars: input.chars().collect() }
    }
}

impl From<&str> for StringSource {
    fn from(input: &str) -> Self {
        StringSource::new(input)
    }
}

impl ScriptSource for StringSource {
    fn char_at(&mut self, pos: usize) -> Result<Option<char>, SplitError> {
        Ok(self.chars.get(pos).copied())
    }

    fn slice(&mut self, start: usize, end: usize) -> Result<String, SplitError> {
        let end = end.min(self.chars.len());
        if start >= end {
            return Ok(String::new());
        }
        Ok(self.chars[start..end].iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_at() {
        let mut source = StringSource::new("héllo");
        assert_eq!(source.char_at(0).unwrap(), Some('h'));
        assert_eq!(source.char_at(1).unwrap(), Some('é'));
        assert_eq!(source.char_at(4).unwrap(), Some('o'));
        assert_eq!(source.char_at(5).unwrap(), None);
    }

    #[test]
    fn test_slice_is_in_character_space() {
        let mut source = StringSource::new("héllo wörld");
        assert_eq!(source.slice(0, 5).unwrap(), "héllo");
        assert_eq!(source.slice(6, 11).unwrap(), "wörld");
        // An out-of-range end is clamped, an inverted range is empty.
        assert_eq!(source.slice(6, 100).unwrap(), "wörld");
        assert_eq!(source.slice(3, 3).unwrap(), "");
    }
}
