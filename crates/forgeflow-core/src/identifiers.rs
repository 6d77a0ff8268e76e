//! Component name rules.
//!
//! A component name is used three ways: as the registry key, as the file
//! stem of its generated artifact (`<Name>.rs`) and as the struct name the
//! artifact template declares. A valid name therefore has to be a plain
//! Rust type identifier: an ASCII letter followed by ASCII letters, digits
//! or underscores.

use thiserror::Error;

/// Longest accepted component name, in bytes.
pub const MAX_NAME_LENGTH: usize = 64;

/// Why a string cannot name a component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("component names cannot be blank")]
    Blank,

    #[error("component names must start with an ASCII letter, found '{found}'")]
    BadLeadingChar { found: char },

    #[error("'{found}' at byte {position} cannot appear in a component name or artifact file name")]
    BadChar { found: char, position: usize },

    #[error("component name is {length} bytes, the limit is {max}")]
    TooLong { length: usize, max: usize },
}

/// Checks names before they reach the registry or the artifact directory.
pub struct IdValidator;

impl IdValidator {
    /// Accept `name` if it can serve as registry key, file stem and type name.
    ///
    /// ```rust
    /// use forgeflow_core::IdValidator;
    ///
    /// assert!(IdValidator::validate("EchoTool").is_ok());
    /// assert!(IdValidator::validate("Tool_2").is_ok());
    /// assert!(IdValidator::validate("../etc").is_err());
    /// assert!(IdValidator::validate("2Fast").is_err());
    /// ```
    pub fn validate(name: &str) -> Result<&str, NameError> {
        if name.trim().is_empty() {
            return Err(NameError::Blank);
        }
        let mut chars = name.char_indices();
        let Some((_, first)) = chars.next() else {
            return Err(NameError::Blank);
        };
        if !first.is_ascii_alphabetic() {
            return Err(NameError::BadLeadingChar { found: first });
        }
        if let Some((position, found)) =
            chars.find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(NameError::BadChar { found, position });
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(NameError::TooLong {
                length: name.len(),
                max: MAX_NAME_LENGTH,
            });
        }
        Ok(name)
    }
}
