//! Composite secret names.
//!
//! A name of the form `outer:inner` addresses one field of a JSON object
//! stored under `outer`. A plain name addresses the stored value directly.

use std::fmt;

use crate::core::constants::COMPOSITE_SEPARATOR;
use crate::error::{Result, SecretError};

/// A secret name split on its first `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeName<'a> {
    outer: &'a str,
    inner: Option<&'a str>,
}

impl<'a> CompositeName<'a> {
    /// Split `name` on the first `:`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::InvalidName` if either side of the separator is
    /// empty, or if the name is empty.
    pub fn parse(name: &'a str) -> Result<Self> {
        let invalid = |reason| SecretError::InvalidName {
            name: name.to_string(),
            reason,
        };

        let (outer, inner) = match name.split_once(COMPOSITE_SEPARATOR) {
            Some((outer, inner)) => (outer, Some(inner)),
            None => (name, None),
        };

        if outer.is_empty() {
            return Err(invalid("name is empty").into());
        }
        if inner == Some("") {
            return Err(invalid("sub-variable name after ':' is empty").into());
        }

        Ok(Self { outer, inner })
    }

    /// Name under which the ciphertext is stored in the manifest.
    pub fn outer(&self) -> &'a str {
        self.outer
    }

    /// Field inside the stored JSON object, if this is a composite name.
    pub fn inner(&self) -> Option<&'a str> {
        self.inner
    }

    pub fn is_composite(&self) -> bool {
        self.inner.is_some()
    }
}

impl fmt::Display for CompositeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Some(inner) => write!(f, "{}{}{}", self.outer, COMPOSITE_SEPARATOR, inner),
            None => f.write_str(self.outer),
        }
    }
}
