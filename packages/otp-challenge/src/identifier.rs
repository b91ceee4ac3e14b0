//! Phone and email identifiers a code can be delivered to.
//!
//! Validation happens client-side so a malformed identifier never reaches
//! the network.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Phone,
    Email,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Phone => write!(f, "phone"),
            ChannelKind::Email => write!(f, "email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Please enter your phone number or email")]
    Empty,
    #[error("Please enter a valid phone number with country code (e.g. +94771234567)")]
    InvalidPhone,
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

/// A validated, normalized delivery target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// E.164 phone number, `+` followed by digits only
    Phone(String),
    /// Lowercased email address
    Email(String),
}

impl Identifier {
    /// Parse user input, inferring the channel from the presence of `@`.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if trimmed.contains('@') {
            Self::email(trimmed)
        } else {
            Self::phone(trimmed)
        }
    }

    /// Parse input that must be of the given channel kind.
    pub fn parse_as(kind: ChannelKind, input: &str) -> Result<Self, IdentifierError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }
        match kind {
            ChannelKind::Phone => Self::phone(trimmed),
            ChannelKind::Email => Self::email(trimmed),
        }
    }

    pub fn phone(input: &str) -> Result<Self, IdentifierError> {
        let compact: String = input
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        let digits = compact
            .strip_prefix('+')
            .ok_or(IdentifierError::InvalidPhone)?;

        let valid = (8..=15).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit())
            && !digits.starts_with('0');

        if valid {
            Ok(Identifier::Phone(compact))
        } else {
            Err(IdentifierError::InvalidPhone)
        }
    }

    pub fn email(input: &str) -> Result<Self, IdentifierError> {
        let email = input.trim().to_lowercase();
        if email.chars().any(char::is_whitespace) {
            return Err(IdentifierError::InvalidEmail);
        }

        let (local, domain) = email.split_once('@').ok_or(IdentifierError::InvalidEmail)?;
        let domain_ok = !domain.contains('@')
            && domain.contains('.')
            && domain.split('.').all(|label| !label.is_empty());

        if local.is_empty() || !domain_ok {
            return Err(IdentifierError::InvalidEmail);
        }
        Ok(Identifier::Email(email))
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            Identifier::Phone(_) => ChannelKind::Phone,
            Identifier::Email(_) => ChannelKind::Email,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Identifier::Phone(s) | Identifier::Email(s) => s,
        }
    }

    /// Log-safe rendering: keeps enough to recognize the target, hides the rest.
    pub fn masked(&self) -> String {
        match self {
            Identifier::Phone(phone) => {
                let chars: Vec<char> = phone.chars().collect();
                let keep_head = 4.min(chars.len());
                let keep_tail = 2.min(chars.len() - keep_head);
                let hidden = chars.len() - keep_head - keep_tail;
                let head: String = chars[..keep_head].iter().collect();
                let tail: String = chars[chars.len() - keep_tail..].iter().collect();
                format!("{head}{}{tail}", "*".repeat(hidden))
            }
            Identifier::Email(email) => match email.split_once('@') {
                Some((local, domain)) => {
                    let first: String = local.chars().take(1).collect();
                    format!("{first}***@{domain}")
                }
                None => "***".to_string(),
            },
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
