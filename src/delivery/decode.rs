//! # Payload decoding.
//!
//! [`Decoder`] turns an [`InboundMessage`] into an [`Envelope`]. Refusals are
//! classified, never thrown away:
//! - [`DecodeError::Unsupported`] version this service does not handle (acked silently)
//! - [`DecodeError::NotConfigured`] action this service is not configured for (acked, info)
//! - [`DecodeError::Malformed`] structurally invalid payload (acked, error)
//!
//! [`JsonDecoder`] handles both wire shapes:
//! ```text
//! Legacy: {"action": "order-create", "version": "2", ...fields}
//! Common: {"header": {"action": "order-create", "version": "2"}, "body": {...}}
//! ```

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::message::{FormatVersion, InboundMessage};

/// Decoded, typed message handed to the router.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub format: FormatVersion,
    pub action: String,
    pub version: Option<String>,
    pub body: Value,
}

/// Why a payload was not turned into an envelope.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported message version {version:?}")]
    Unsupported { version: Option<String> },

    #[error("service is not configured for action {action}")]
    NotConfigured { action: String },

    #[error("malformed message: {reason}")]
    Malformed { reason: String },
}

impl DecodeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            reason: reason.into(),
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::Unsupported { .. } => "decode_unsupported",
            DecodeError::NotConfigured { .. } => "decode_not_configured",
            DecodeError::Malformed { .. } => "decode_malformed",
        }
    }
}

/// Payload decoder seam.
pub trait Decoder: Send + Sync + 'static {
    fn decode(&self, message: &InboundMessage) -> Result<Envelope, DecodeError>;
}

#[derive(Deserialize)]
struct LegacyWire {
    action: Option<String>,
    version: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Deserialize)]
struct CommonWire {
    header: Header,
    #[serde(default)]
    body: Value,
}

#[derive(Deserialize)]
struct Header {
    action: Option<String>,
    version: Option<String>,
}

/// JSON decoder with optional version and action allow-lists.
///
/// An empty allow-list accepts everything.
#[derive(Clone, Debug, Default)]
pub struct JsonDecoder {
    versions: HashSet<String>,
    actions: HashSet<String>,
}

impl JsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = versions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    fn admit(
        &self,
        format: FormatVersion,
        action: Option<String>,
        version: Option<String>,
        body: Value,
    ) -> Result<Envelope, DecodeError> {
        let action = match action {
            Some(a) if !a.trim().is_empty() => a,
            _ => return Err(DecodeError::malformed("missing action")),
        };
        if !self.versions.is_empty()
            && !version.as_ref().is_some_and(|v| self.versions.contains(v))
        {
            return Err(DecodeError::Unsupported { version });
        }
        if !self.actions.is_empty() && !self.actions.contains(&action) {
            return Err(DecodeError::NotConfigured { action });
        }
        Ok(Envelope {
            format,
            action,
            version,
            body,
        })
    }
}

impl Decoder for JsonDecoder {
    fn decode(&self, message: &InboundMessage) -> Result<Envelope, DecodeError> {
        match message.format_version() {
            FormatVersion::Legacy => {
                let wire: LegacyWire = serde_json::from_slice(&message.payload)
                    .map_err(|e| DecodeError::malformed(e.to_string()))?;
                self.admit(
                    FormatVersion::Legacy,
                    wire.action,
                    wire.version,
                    Value::Object(wire.rest),
                )
            }
            FormatVersion::Common => {
                let wire: CommonWire = serde_json::from_slice(&message.payload)
                    .map_err(|e| DecodeError::malformed(e.to_string()))?;
                self.admit(
                    FormatVersion::Common,
                    wire.header.action,
                    wire.header.version,
                    wire.body,
                )
            }
        }
    }
}
