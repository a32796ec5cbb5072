//! Resource identifiers.

use core::{fmt, str::FromStr};

use crate::{constants::WORD, errors::ResourceError};

/// Identifier of a resource within its type.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResourceId {
    Numeric(WORD),
    Named(String),
}

impl ResourceId {
    /// Parse a user supplied identifier.
    ///
    /// A non-empty string of ASCII digits is a numeric id, anything else a named id carrying the text unchanged.
    /// Quotes are not stripped.
    ///
    /// # Returns
    /// Returns an [`ResourceError::InvalidArguments`] error if a numeric id does not fit into 16 bits.
    pub fn parse(text: &str) -> Result<Self, ResourceError> {
        if !text.is_empty() && text.bytes().all(|c| c.is_ascii_digit()) {
            return text.parse::<WORD>().map(ResourceId::Numeric).map_err(|_| {
                ResourceError::InvalidArguments(format!(
                    "resource id {} is larger than {}",
                    text,
                    WORD::MAX
                ))
            });
        }
        Ok(ResourceId::Named(text.to_string()))
    }

    /// Returns the numeric id, or `None` for named ids.
    pub fn number(&self) -> Option<WORD> {
        match self {
            ResourceId::Numeric(id) => Some(*id),
            ResourceId::Named(_) => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Numeric(id) => write!(f, "{}", id),
            ResourceId::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for ResourceId {
    type Err = ResourceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> { Self::parse(text) }
}

impl From<WORD> for ResourceId {
    fn from(id: WORD) -> Self { ResourceId::Numeric(id) }
}
