//! LaTeX source accepted for compilation.

use super::error::DomainError;

/// Sources shorter than this many characters are rejected before a workspace is created.
pub const MIN_SOURCE_CHARS: usize = 50;

/// A LaTeX document that passed input validation. The text is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatexSource(String);

impl LatexSource {
    /// Validate raw request input. Length is counted in Unicode scalar values.
    pub fn parse(raw: Option<String>) -> Result<Self, DomainError> {
        let text = raw.ok_or_else(|| DomainError::missing("latex"))?;
        let length = text.chars().count();
        if length < MIN_SOURCE_CHARS {
            return Err(DomainError::validation(format!(
                "LaTeX source must be at least {MIN_SOURCE_CHARS} characters long (got {length})"
            )));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
