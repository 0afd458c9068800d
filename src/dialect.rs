use crate::tokens::Token;
use crate::{Delimiter, SplitError};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// The SQL dialect governing which delimiter currently terminates a statement.
///
/// The set is small and closed by design, so dialect behavior is dispatched over this enum
/// rather than an open-ended trait.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Standard,
    Oracle,
    Postgres,
    MsSql,
}

impl Dialect {
    /// Parses a dialect name as found on configuration surfaces.
    pub fn parse(name: &str) -> Result<Self, SplitError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Dialect::Standard),
            "oracle" => Ok(Dialect::Oracle),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mssql" => Ok(Dialect::MsSql),
            other => Err(SplitError::Config(format!("unknown dialect '{other}'"))),
        }
    }

    /// The conventional alternate delimiter of the dialect: `/` (single-line) for Oracle, `GO`
    /// (single-line) for MSSQL.
    pub fn conventional_alternate(&self) -> Option<Delimiter> {
        match self {
            Dialect::Oracle => Delimiter::new("/", true).ok(),
            Dialect::MsSql => Delimiter::new("GO", true).ok(),
            Dialect::Standard | Dialect::Postgres => None,
        }
    }
}

// States of the Oracle tester. The other dialects have no state: Standard and Postgres always
// search for the primary delimiter (dollar quoting is the lexer's business), and MSSQL keeps
// `GO` active independently of `;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TesterState {
    Initial,
    SawCreate,
    InBlock,
}

/// Decides, statement by statement, which delimiter currently terminates.
///
/// The tester consumes tokens as the splitter produces them. For Oracle, seeing
/// `CREATE [OR REPLACE] {PROCEDURE|FUNCTION|PACKAGE [BODY]|TRIGGER|TYPE [BODY]}` switches the
/// current delimiter to the alternate (`/`) until the statement finishes, so semicolons inside
/// the block body never terminate.
#[derive(Debug)]
pub(crate) struct DelimiterTester {
    dialect: Dialect,
    primary: Delimiter,
    alternate: Option<Delimiter>,
    state: TesterState,
}

impl DelimiterTester {
    pub(crate) fn new(dialect: Dialect, primary: Delimiter, alternate: Option<Delimiter>) -> Self {
        DelimiterTester { dialect, primary, alternate, state: TesterState::Initial }
    }

    pub(crate) fn set_primary(&mut self, primary: Delimiter) {
        self.primary = primary;
    }

    pub(crate) fn set_alternate(&mut self, alternate: Option<Delimiter>) {
        self.alternate = alternate;
    }

    /// Feeds the next token. Tokens inside literals, comments and whitespace never change state.
    pub(crate) fn current_token(&mut self, token: &Token, inside_literal: bool) {
        if inside_literal || token.is_comment() || token.is_whitespace() {
            return;
        }
        if self.dialect != Dialect::Oracle {
            return;
        }
        let Some(word) = token.word() else {
            // Punctuation between CREATE and the block kind means this is not a block statement.
            if self.state == TesterState::SawCreate {
                self.state = TesterState::Initial;
            }
            return;
        };
        let upper = word.to_ascii_uppercase();
        self.state = match (self.state, upper.as_str()) {
            (TesterState::Initial, "CREATE") => TesterState::SawCreate,
            (TesterState::SawCreate, "OR" | "REPLACE" | "EDITIONABLE" | "NONEDITIONABLE") => {
                TesterState::SawCreate
            }
            (TesterState::SawCreate, "PROCEDURE" | "FUNCTION" | "PACKAGE" | "TRIGGER" | "TYPE") => {
                TesterState::InBlock
            }
            (TesterState::SawCreate, _) => TesterState::Initial,
            (TesterState::InBlock, _) => TesterState::InBlock,
            (TesterState::Initial, _) => TesterState::Initial,
        };
    }

    /// Resets to the initial state, called by the splitter at every statement boundary.
    pub(crate) fn statement_finished(&mut self) {
        self.state = TesterState::Initial;
    }

    /// The delimiter that should currently be searched for.
    pub(crate) fn current_delimiter(&self) -> &Delimiter {
        match self.state {
            TesterState::InBlock => self.alternate.as_ref().unwrap_or(&self.primary),
            _ => &self.primary,
        }
    }

    /// A single-line alternate delimiter is tested alongside the current one at all times: a
    /// trailing `/` alone on its line always terminates an Oracle statement regardless of
    /// nesting, and the MSSQL `GO` is active independently of `;`.
    pub(crate) fn always_active_alternate(&self) -> Option<&Delimiter> {
        self.alternate.as_ref().filter(|d| d.is_single_line())
    }

    /// Tie-break when both the primary and the alternate delimiter match at the same position:
    /// the alternate wins while the tester is in a non-initial state.
    pub(crate) fn alternate_wins(&self) -> bool {
        self.state != TesterState::Initial
    }
}
