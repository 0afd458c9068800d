//! A loose SQL script splitter.
//!
//! Splits a script into its individual commands without validating them: an unterminated string
//! or a syntactically broken statement still comes out as a command, which is the right behavior
//! for a partially-typed editor buffer. Every command carries exact character offsets into the
//! original source, so callers can map editor cursors back to commands with
//! [`command_index_at`].
//!
//! Delimiters inside string literals, quoted identifiers, comments and dollar-quoted bodies
//! never terminate a command. Dialect-specific rules (the PL/SQL `/`, the T-SQL `GO`, blank
//! lines as separators) are driven by [`Options`] and [`Dialect`].
//!
//! Scripts can be split from memory ([`split`], [`split_with_options`]) or streamed from a file
//! through a bounded window ([`split_file`]), producing identical commands either way.

use std::path::Path;

mod delimiter;
mod dialect;
mod error;
mod lexer;
mod locator;
mod options;
mod source;
mod splitter;
pub mod tokens;
mod windowed;

pub use delimiter::Delimiter;
pub use dialect::Dialect;
pub use error::SplitError;
pub use locator::command_index_at;
pub use options::Options;
pub use source::{ScriptSource, StringSource};
pub use splitter::{Command, CommandSplitter};
pub use tokens::{Token, TokenKind};
pub use windowed::{Encoding, WindowedText, DEFAULT_CHUNK_SIZE};

/// Splits an in-memory script with default options (standard dialect, `;` delimiter).
///
/// This is a non-validating splitter: it does not check the syntax of the commands, it only
/// separates them.
pub fn split(sql: &str) -> Vec<Command> {
    // In-memory splitting cannot fail.
    CommandSplitter::new(sql).map_while(Result::ok).collect()
}

/// Splits an in-memory script with explicit options.
pub fn split_with_options(sql: &str, options: Options) -> Result<Vec<Command>, SplitError> {
    CommandSplitter::with_options(sql, options)?.collect()
}

/// Splits a script file through a bounded sliding window, without loading the whole file into
/// memory. Returns the splitter itself so huge scripts can be consumed command by command.
pub fn split_file(
    path: impl AsRef<Path>,
    encoding: Encoding,
    options: Options,
) -> Result<CommandSplitter<WindowedText>, SplitError> {
    CommandSplitter::open_file(path, encoding, options)
}
