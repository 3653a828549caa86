//! Errors handling
//!
//! These are carried inside `anyhow::Error` and recovered with
//! `downcast_ref` where the caller needs to tell them apart.

use std::fmt;

use reqwest::StatusCode;

use crate::notify::Channel;

/// A field could not be pulled out of a fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The CSS selector matched no element, usually because the upstream
    /// markup changed.
    MissingSelector { selector: String },
    /// An expected key is absent from a JSON document.
    MissingField { path: String },
    /// The field is present but cannot be read as the expected kind of value.
    InvalidValue { path: String, value: String },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExtractionError::MissingSelector { selector } => {
                write!(f, "selector `{selector}` matched no element")
            }
            ExtractionError::MissingField { path } => write!(f, "missing field `{path}`"),
            ExtractionError::InvalidValue { path, value } => {
                write!(f, "unexpected value {value:?} at `{path}`")
            }
        }
    }
}

impl std::error::Error for ExtractionError {}

/// A delivery channel (or the weather source) is missing a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialError {
    pub channel: Option<Channel>,
    pub missing: &'static str,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.channel {
            Some(channel) => write!(f, "{channel}: {} is not set", self.missing),
            None => write!(f, "{} is not set", self.missing),
        }
    }
}

impl std::error::Error for CredentialError {}

/// The remote endpoint answered with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    pub channel: Channel,
    pub status: StatusCode,
    /// Response body, verbatim.
    pub body: String,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} rejected the message with {}: {}",
            self.channel, self.status, self.body
        )
    }
}

impl std::error::Error for DeliveryError {}

/// The request never produced a response (DNS, connect, TLS, timeout, ...).
#[derive(Debug)]
pub struct NetworkError {
    pub url: String,
    pub source: reqwest::Error,
}

impl NetworkError {
    pub fn is_timeout(&self) -> bool {
        self.source.is_timeout()
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "request to {} failed", self.url)
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
