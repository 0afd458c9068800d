use thiserror::Error;

/// Errors surfaced by the splitter.
///
/// Malformed SQL (unterminated quotes, comments or dollar-quoted bodies) is never an error: the
/// splitter extends the unterminated construct to the end of the input and returns whatever was
/// accumulated as a final command. Only configuration mistakes and I/O or decoding failures while
/// streaming are surfaced.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The configuration is invalid (e.g. an empty delimiter, or two identical single-line
    /// delimiters). Raised before any parsing begins.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An I/O error occurred while reading the script file. Fatal for the current parse, the
    /// splitter does not retry.
    #[error("i/o error while reading the script")]
    Io(#[from] std::io::Error),

    /// A chunk of the script file could not be decoded with the declared encoding, even after
    /// growing the chunk to complete a multi-byte sequence. Indicates a genuinely corrupt
    /// encoding rather than an unlucky chunk boundary.
    #[error("could not decode chunk at byte offset {offset}")]
    Decode { offset: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SplitError::Config("delimiter must not be empty".to_string());
        assert_eq!(err.to_string(), "invalid configuration: delimiter must not be empty");

        let err = SplitError::Decode { offset: 524288 };
        assert_eq!(err.to_string(), "could not decode chunk at byte offset 524288");
    }
}
