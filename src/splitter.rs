use std::path::Path;

use log::trace;

use crate::dialect::DelimiterTester;
use crate::lexer::Lexer;
use crate::source::StringSource;
use crate::tokens::TokenKind;
use crate::windowed::{Encoding, WindowedText};
use crate::{Delimiter, Options, ScriptSource, SplitError, Token};

/// One executable command extracted from a script.
///
/// Offsets are character offsets into the original source, end-exclusive, identical whether the
/// script was split in memory or through a file window. Commands are produced in strictly
/// increasing, non-overlapping offset order and are owned by the caller once yielded.
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// 0-based position of the command in the script.
    pub index: usize,
    /// Offset of the first character of the command.
    pub start: usize,
    /// Offset one past the last character of the command.
    pub end: usize,
    /// The materialized command text. `None` when statement-text storage is disabled, in which
    /// case the caller re-slices the source using the offsets.
    pub text: Option<String>,
    /// The delimiter that terminated the command. `None` when the command was terminated by a
    /// blank line, an include directive boundary or the end of the input.
    pub delimiter: Option<Delimiter>,
    /// Whether the command range includes the whitespace between the previous boundary and the
    /// first non-whitespace character.
    pub leading_whitespace_included: bool,
}

/// The command splitter: a single-threaded, synchronous pull iterator over the commands of a
/// script.
///
/// The splitter drives the lexer and the dialect's delimiter tester together and emits one
/// [`Command`] per call to [`next_command`](Self::next_command). It holds no external resources
/// itself; in streaming mode the file handle belongs to the underlying [`WindowedText`] and is
/// closed when the splitter is dropped.
pub struct CommandSplitter<S: ScriptSource> {
    lexer: Lexer<S>,
    options: Options,
    tester: DelimiterTester,
    next_index: usize,
    /// Where the segment being accumulated starts (right after the previous boundary).
    segment_start: usize,
    /// Whether the current physical line has non-whitespace content so far. Single-line
    /// delimiters only match on otherwise blank lines.
    line_has_content: bool,
    /// Lookahead filled by `has_more_commands`.
    pending: Option<Command>,
    done: bool,
}

impl CommandSplitter<StringSource> {
    /// A splitter over an in-memory script with default options.
    pub fn new(sql: &str) -> Self {
        // Default options always validate.
        CommandSplitter {
            lexer: Lexer::new(StringSource::new(sql), &Options::default()),
            options: Options::default(),
            tester: DelimiterTester::new(Default::default(), Delimiter::standard(), None),
            next_index: 0,
            segment_start: 0,
            line_has_content: false,
            pending: None,
            done: false,
        }
    }

    /// A splitter over an in-memory script.
    pub fn with_options(sql: &str, options: Options) -> Result<Self, SplitError> {
        CommandSplitter::from_source(StringSource::new(sql), options)
    }
}

impl CommandSplitter<WindowedText> {
    /// A splitter reading the script from a file through a bounded sliding window, so memory use
    /// stays constant regardless of the file size.
    pub fn open_file(
        path: impl AsRef<Path>,
        encoding: Encoding,
        options: Options,
    ) -> Result<Self, SplitError> {
        CommandSplitter::from_source(WindowedText::open(path, encoding)?, options)
    }
}

impl<S: ScriptSource> CommandSplitter<S> {
    /// A splitter over any character source.
    pub fn from_source(source: S, options: Options) -> Result<Self, SplitError> {
        options.validate()?;
        let tester = DelimiterTester::new(
            options.dialect,
            options.delimiter.clone(),
            options.alternate_delimiter.clone(),
        );
        let lexer = Lexer::new(source, &options);
        Ok(CommandSplitter {
            lexer,
            options,
            tester,
            next_index: 0,
            segment_start: 0,
            line_has_content: false,
            pending: None,
            done: false,
        })
    }

    /// Replaces the primary delimiter, effective from the next command onward.
    pub fn set_delimiter(&mut self, delimiter: Delimiter) -> Result<(), SplitError> {
        let mut candidate = self.options.clone();
        candidate.delimiter = delimiter.clone();
        candidate.validate()?;
        self.options = candidate;
        self.tester.set_primary(delimiter);
        Ok(())
    }

    /// Replaces the alternate delimiter, effective from the next command onward.
    pub fn set_alternate_delimiter(&mut self, delimiter: Option<Delimiter>) -> Result<(), SplitError> {
        let mut candidate = self.options.clone();
        candidate.alternate_delimiter = delimiter.clone();
        candidate.validate()?;
        self.options = candidate;
        self.tester.set_alternate(delimiter);
        Ok(())
    }

    pub fn set_empty_line_is_delimiter(&mut self, enabled: bool) {
        self.options.empty_line_is_delimiter = enabled;
    }

    pub fn set_store_statement_text(&mut self, enabled: bool) {
        self.options.store_statement_text = enabled;
    }

    pub fn set_return_leading_whitespace(&mut self, enabled: bool) {
        self.options.return_leading_whitespace = enabled;
    }

    /// Whether another command is available. Performs the lookahead, so a subsequent
    /// [`next_command`](Self::next_command) is cheap.
    pub fn has_more_commands(&mut self) -> Result<bool, SplitError> {
        if self.pending.is_none() {
            self.pending = self.scan_next()?;
        }
        Ok(self.pending.is_some())
    }

    /// The next command, or `None` once the source is exhausted. On end of input, any remaining
    /// non-whitespace content is emitted as a final command: scripts need not end with a
    /// delimiter.
    pub fn next_command(&mut self) -> Result<Option<Command>, SplitError> {
        if let Some(command) = self.pending.take() {
            return Ok(Some(command));
        }
        self.scan_next()
    }

    // Advances the state machine by pulling tokens until a genuine boundary is found or the
    // input ends.
    fn scan_next(&mut self) -> Result<Option<Command>, SplitError> {
        if self.done {
            return Ok(None);
        }
        let mut segment_start = self.segment_start;
        let mut content_start: Option<usize> = None;
        let mut content_end = segment_start;

        loop {
            let line_was_blank = !self.line_has_content;
            let Some(token) = self.lexer.next_token()? else {
                self.done = true;
                if let Some(start) = content_start {
                    trace!("final command at end of input ({}..{})", start, content_end);
                    return self.emit(segment_start, start, content_end, None).map(Some);
                }
                return Ok(None);
            };

            if token.is_whitespace() {
                let newlines = token.text.as_deref().map_or(0, |t| t.matches('\n').count());
                if newlines > 0 {
                    self.line_has_content = false;
                }
                // Two consecutive line breaks with only whitespace between them terminate the
                // current command, when enabled. Blank lines between commands are skipped, they
                // never become empty commands.
                if self.options.empty_line_is_delimiter && newlines >= 2 {
                    self.segment_start = token.end;
                    if let Some(start) = content_start {
                        self.tester.statement_finished();
                        trace!("blank-line boundary at {}", token.start);
                        return self.emit(segment_start, start, content_end, None).map(Some);
                    }
                    segment_start = token.end;
                }
                continue;
            }

            if token.is_comment() {
                // Comments belong to the surrounding command text.
                self.line_has_content = true;
                content_start.get_or_insert(token.start);
                content_end = token.end;
                continue;
            }

            // A line such as `@seed.sql` right after a statement boundary is its own command,
            // never merged with the previous or following statement.
            if self.options.support_include_directive
                && content_start.is_none()
                && line_was_blank
                && token.kind == TokenKind::Operator
                && token.text.as_deref() == Some("@")
            {
                return self.emit_include(segment_start, token.start).map(Some);
            }

            let inside_literal = token.is_literal();
            self.tester.current_token(&token, inside_literal);

            if !inside_literal {
                if let Some((delimiter, match_end)) = self.match_delimiter(&token, line_was_blank)? {
                    // A single-line delimiter owns the remainder of its line.
                    let next_start = match delimiter.is_single_line() {
                        true => self.consume_line(match_end)?,
                        false => match_end,
                    };
                    self.lexer.seek(next_start);
                    self.segment_start = next_start;
                    self.line_has_content = !delimiter.is_single_line();
                    self.tester.statement_finished();
                    if let Some(start) = content_start {
                        trace!("command boundary at {} ({})", token.start, delimiter);
                        return self
                            .emit(segment_start, start, content_end, Some(delimiter))
                            .map(Some);
                    }
                    // An empty segment (e.g. consecutive delimiters): skip it, keep scanning.
                    segment_start = next_start;
                    content_end = next_start;
                    continue;
                }
            }

            self.line_has_content = true;
            content_start.get_or_insert(token.start);
            content_end = token.end;
        }
    }

    // Tests whether `token` matches the delimiter currently in effect, or a single-line
    // alternate which is active at all times. Returns the winning delimiter and the offset one
    // past its text.
    //
    // Word delimiters (like `GO`) must match a whole identifier token, case-insensitively, so
    // `GOTO` never terminates. Punctuation delimiters are matched against the raw source from
    // the token start, so a multi-character delimiter spanning several operator tokens still
    // matches. Single-line delimiters additionally require the delimiter to be the only
    // non-whitespace content on its physical line.
    fn match_delimiter(
        &mut self,
        token: &Token,
        line_was_blank: bool,
    ) -> Result<Option<(Delimiter, usize)>, SplitError> {
        let current = self.tester.current_delimiter().clone();
        let always_active = self
            .tester
            .always_active_alternate()
            .filter(|d| **d != current)
            .cloned();
        // Tie-break: when both could match at the same position, the dialect-specific alternate
        // wins while the tester is in a non-initial state; otherwise the primary wins.
        let candidates = match (always_active, self.tester.alternate_wins()) {
            (Some(alternate), true) => vec![alternate, current],
            (Some(alternate), false) => vec![current, alternate],
            (None, _) => vec![current],
        };

        for candidate in candidates {
            let match_end = if candidate.is_word() {
                match token.word() {
                    Some(word) if candidate.matches_word(word) => Some(token.end),
                    _ => None,
                }
            } else if token.kind == TokenKind::Operator
                && self.lexer.starts_with(token.start, candidate.text())?
            {
                Some(token.start + candidate.char_len())
            } else {
                None
            };
            let Some(match_end) = match_end else { continue };
            if candidate.is_single_line() {
                if line_was_blank && self.lexer.rest_of_line_is_blank(match_end)? {
                    return Ok(Some((candidate, match_end)));
                }
            } else {
                return Ok(Some((candidate, match_end)));
            }
        }
        Ok(None)
    }

    // Emits the include directive starting at `at` as its own command, spanning to the end of
    // its line (trailing whitespace excluded).
    fn emit_include(&mut self, segment_start: usize, at: usize) -> Result<Command, SplitError> {
        let next_start = self.consume_line(at)?;
        let mut end = next_start;
        while end > at {
            match self.lexer.char_at(end - 1)? {
                Some(c) if c.is_whitespace() => end -= 1,
                _ => break,
            }
        }
        self.lexer.seek(next_start);
        self.segment_start = next_start;
        self.line_has_content = false;
        self.tester.statement_finished();
        trace!("include directive at {}", at);
        self.emit(segment_start, at, end, None)
    }

    // The offset one past the end of the physical line containing `from` (past the newline, or
    // the end of the input).
    fn consume_line(&mut self, from: usize) -> Result<usize, SplitError> {
        let mut p = from;
        while let Some(c) = self.lexer.char_at(p)? {
            p += 1;
            if c == '\n' {
                break;
            }
        }
        Ok(p)
    }

    fn emit(
        &mut self,
        segment_start: usize,
        content_start: usize,
        content_end: usize,
        delimiter: Option<Delimiter>,
    ) -> Result<Command, SplitError> {
        let start = match self.options.return_leading_whitespace {
            true => segment_start,
            false => content_start,
        };
        let text = match self.options.store_statement_text {
            true => Some(self.lexer.slice(start, content_end)?),
            false => None,
        };
        let index = self.next_index;
        self.next_index += 1;
        Ok(Command {
            index,
            start,
            end: content_end,
            text,
            delimiter,
            leading_whitespace_included: start < content_start,
        })
    }
}

impl<S: ScriptSource> Iterator for CommandSplitter<S> {
    type Item = Result<Command, SplitError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_command().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dialect;

    fn texts(commands: &[Command]) -> Vec<&str> {
        commands.iter().map(|c| c.text.as_deref().unwrap_or("")).collect()
    }

    #[test]
    fn test_pull_iteration() {
        let mut splitter = CommandSplitter::new("SELECT 1; SELECT 2");
        assert!(splitter.has_more_commands().unwrap());
        let first = splitter.next_command().unwrap().unwrap();
        assert_eq!(first.text.as_deref(), Some("SELECT 1"));
        assert_eq!(first.index, 0);
        assert_eq!(first.delimiter, Some(Delimiter::standard()));
        let second = splitter.next_command().unwrap().unwrap();
        assert_eq!(second.text.as_deref(), Some("SELECT 2"));
        // The trailing command has no terminating delimiter.
        assert_eq!(second.delimiter, None);
        assert!(!splitter.has_more_commands().unwrap());
        assert!(splitter.next_command().unwrap().is_none());
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let commands: Vec<Command> =
            CommandSplitter::new("SELECT 1;\n\t \n; SELECT 2").map_while(|r| r.ok()).collect();
        assert_eq!(texts(&commands), ["SELECT 1", "SELECT 2"]);
        assert_eq!(commands[1].index, 1);

        let commands: Vec<Command> =
            CommandSplitter::new("; SELECT 1;").map_while(|r| r.ok()).collect();
        assert_eq!(texts(&commands), ["SELECT 1"]);
    }

    #[test]
    fn test_store_statement_text_can_be_disabled() {
        let sql = "SELECT 1; SELECT 2;";
        let mut splitter = CommandSplitter::new(sql);
        splitter.set_store_statement_text(false);
        let commands: Vec<Command> = splitter.map_while(|r| r.ok()).collect();
        assert_eq!(commands.len(), 2);
        for command in &commands {
            assert!(command.text.is_none());
        }
        // The caller re-slices the source using the offsets.
        assert_eq!(&sql[commands[1].start..commands[1].end], "SELECT 2");
    }

    #[test]
    fn test_return_leading_whitespace() {
        let sql = "SELECT 1;\n  SELECT 2;";
        let mut splitter = CommandSplitter::new(sql);
        splitter.set_return_leading_whitespace(true);
        let commands: Vec<Command> = splitter.map_while(|r| r.ok()).collect();
        assert_eq!(commands[0].text.as_deref(), Some("SELECT 1"));
        assert!(!commands[0].leading_whitespace_included);
        assert_eq!(commands[1].text.as_deref(), Some("\n  SELECT 2"));
        assert!(commands[1].leading_whitespace_included);
        assert_eq!(commands[1].start, 9);
    }

    #[test]
    fn test_set_delimiter_validation() {
        let mut splitter = CommandSplitter::new("DROP\nGO\n");
        splitter.set_alternate_delimiter(Some(Delimiter::new("/", true).unwrap())).unwrap();
        assert!(splitter.set_delimiter(Delimiter::new("/", true).unwrap()).is_err());
        assert!(splitter.set_delimiter(Delimiter::new("GO", true).unwrap()).is_ok());
    }

    #[test]
    fn test_include_directive_is_its_own_command() {
        let sql = "select * from t;\n@seed.sql  \nselect 1;\n";
        let mut options = Options::for_dialect(Dialect::Oracle);
        options.support_include_directive = true;
        let commands: Vec<Command> = CommandSplitter::with_options(sql, options)
            .unwrap()
            .map_while(|r| r.ok())
            .collect();
        assert_eq!(texts(&commands), ["select * from t", "@seed.sql", "select 1"]);
        assert_eq!(commands[1].delimiter, None);

        // Mid-statement, `@` is ordinary text: the directive rule only applies right after a
        // statement boundary.
        let sql = "select *\nfrom t\n@not_a_directive;\n";
        let options = Options::for_dialect(Dialect::Oracle);
        let commands: Vec<Command> = CommandSplitter::with_options(sql, options)
            .unwrap()
            .map_while(|r| r.ok())
            .collect();
        assert_eq!(texts(&commands), ["select *\nfrom t\n@not_a_directive"]);
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_commands_serialize_to_json() {
        let command = CommandSplitter::new("SELECT 1; SELECT 2").nth(1).unwrap().unwrap();
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["index"], 1);
        assert_eq!(json["start"], 10);
        assert_eq!(json["end"], 18);
        assert_eq!(json["text"], "SELECT 2");
    }
}
