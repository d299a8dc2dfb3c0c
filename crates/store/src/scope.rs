use crate::error::{Result, StoreError};
use globset::GlobBuilder;

/// Compiled path scope. `*` matches any run of non-`/`, `**` crosses
/// separators, `?` matches one non-`/` character, `[…]` are character
/// classes. The bare `"*"` (and `"**"` and the empty string) means
/// "everything", matching how callers use it as a default scope.
#[derive(Debug, Clone)]
pub enum Scope {
    All,
    Glob(globset::GlobMatcher),
}

impl Scope {
    pub fn parse(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || trimmed == "*" || trimmed == "**" {
            return Ok(Self::All);
        }
        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .map_err(|e| StoreError::InvalidGlob {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::Glob(glob.compile_matcher()))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::All => true,
            Self::Glob(matcher) => matcher.is_match(path),
        }
    }
}
