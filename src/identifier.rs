//! Riot ID parsing and validation
//!
//! A Riot ID is the player-facing account name in the form `GameName#TAG`.

use std::fmt;
use std::str::FromStr;

/// Longest game name Riot accepts, in characters.
pub const MAX_GAME_NAME_CHARS: usize = 16;

/// Longest tag line Riot accepts, in characters.
pub const MAX_TAG_LINE_CHARS: usize = 5;

/// Riot ID using format `GameName#TAG`
///
/// The game name keeps its case and inner spaces; the tag line is compared
/// case-insensitively by Riot and is normalized to uppercase here.
///
/// # Examples
///
/// ```
/// use lol_match_exporter::identifier::RiotId;
///
/// let id = RiotId::parse("Hide on bush#kr1").unwrap();
/// assert_eq!(id.game_name(), "Hide on bush");
/// assert_eq!(id.tag_line(), "KR1");
/// assert_eq!(id.to_string(), "Hide on bush#KR1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RiotId {
    game_name: String,
    tag_line: String,
}

impl RiotId {
    /// Parse a `GameName#TAG` string.
    ///
    /// Splits on the first `#`.
    ///
    /// # Errors
    ///
    /// Returns an error if the separator is missing, either part is empty or
    /// too long, or the tag contains anything but ASCII letters and digits.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let (game_name, tag_line) = s.split_once('#').ok_or_else(|| {
            IdentifierError::InvalidFormat("invalid Riot ID: expected GameName#TAG".to_string())
        })?;
        Self::new(game_name, tag_line)
    }

    /// Build a Riot ID from its two parts.
    pub fn new(game_name: &str, tag_line: &str) -> Result<Self, IdentifierError> {
        let game_name = game_name.trim();
        let tag_line = tag_line.trim();

        if game_name.is_empty() {
            return Err(IdentifierError::InvalidFormat(
                "game name cannot be empty".to_string(),
            ));
        }
        if game_name.chars().count() > MAX_GAME_NAME_CHARS {
            return Err(IdentifierError::InvalidFormat(format!(
                "game name longer than {MAX_GAME_NAME_CHARS} characters"
            )));
        }
        if tag_line.is_empty() {
            return Err(IdentifierError::InvalidFormat(
                "tag line cannot be empty".to_string(),
            ));
        }
        if tag_line.chars().count() > MAX_TAG_LINE_CHARS {
            return Err(IdentifierError::InvalidFormat(format!(
                "tag line longer than {MAX_TAG_LINE_CHARS} characters"
            )));
        }
        if !tag_line.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdentifierError::InvalidFormat(format!(
                "tag line must be alphanumeric: {tag_line}"
            )));
        }

        Ok(Self {
            game_name: game_name.to_string(),
            tag_line: tag_line.to_uppercase(),
        })
    }

    /// Game name as entered
    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    /// Tag line (uppercase)
    pub fn tag_line(&self) -> &str {
        &self.tag_line
    }

    /// Convert to a filesystem-safe directory name
    ///
    /// Lowercase, with every character outside `[a-z0-9]` replaced by `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lol_match_exporter::identifier::RiotId;
    ///
    /// let id = RiotId::parse("Hide on bush#KR1").unwrap();
    /// assert_eq!(id.to_filesystem_safe(), "hide_on_bush_kr1");
    /// ```
    pub fn to_filesystem_safe(&self) -> String {
        format!("{}_{}", self.game_name, self.tag_line)
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

impl FromStr for RiotId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors that can occur during identifier parsing
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    /// Invalid identifier format
    #[error("identifier error: {0}")]
    InvalidFormat(String),
}
