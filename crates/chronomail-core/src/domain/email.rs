//! Recipient validation and the message handed to a mail transport.

use std::fmt;

use lettre::Address;
use serde::{Deserialize, Serialize};

use super::ScheduleRecord;
use crate::error::ValidationError;

/// Subject used when the caller gave none.
pub const DEFAULT_SUBJECT: &str = "No Subject";

/// A syntactically valid, non-empty recipient address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Recipient(String);

impl Recipient {
    /// Trims surrounding whitespace, then checks the address syntax.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingRecipient);
        }
        trimmed
            .parse::<Address>()
            .map_err(|e| ValidationError::InvalidRecipient {
                address: trimmed.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Recipient {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Recipient> for String {
    fn from(value: Recipient) -> Self {
        value.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a transport actually sends.
///
/// Subject and body are always present here: an empty subject becomes
/// [`DEFAULT_SUBJECT`] and a missing body becomes `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    to: String,
    subject: String,
    body: String,
}

impl OutgoingEmail {
    pub fn new(to: impl Into<String>, subject: Option<&str>, body: Option<&str>) -> Self {
        let subject = match subject {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => DEFAULT_SUBJECT.to_string(),
        };
        Self {
            to: to.into(),
            subject,
            body: body.unwrap_or_default().to_string(),
        }
    }

    /// Message for a stored schedule. The stored address is used unchanged.
    pub fn from_record(record: &ScheduleRecord) -> Self {
        Self::new(
            record.recipient_address.clone(),
            Some(record.subject.as_str()),
            Some(record.body.as_str()),
        )
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
