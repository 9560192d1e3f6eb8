use std::collections::HashMap;

use bytes::Bytes;

/// Attribute whose presence marks a message as [`FormatVersion::Common`].
pub const COMMON_FORMAT_ATTRIBUTE: &str = "commonFormat";

/// Wire shape of a message payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Flat JSON object with `action`/`version` at the top level.
    Legacy,
    /// `{"header": {...}, "body": ...}` envelope.
    Common,
}

/// One raw delivery, owned by the engine until it is acked or nacked.
#[derive(Clone, Debug, Default)]
pub struct InboundMessage {
    pub id: String,
    pub payload: Bytes,
    pub attributes: HashMap<String, String>,
    /// Broker-reported delivery attempt, when dead-lettering is enabled.
    pub delivery_attempt: Option<u32>,
}

impl InboundMessage {
    pub fn new(id: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Format selected by the [`COMMON_FORMAT_ATTRIBUTE`] marker; its value is ignored.
    pub fn format_version(&self) -> FormatVersion {
        if self.attributes.contains_key(COMMON_FORMAT_ATTRIBUTE) {
            FormatVersion::Common
        } else {
            FormatVersion::Legacy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_presence_selects_common_format() {
        let legacy = InboundMessage::new("1", "{}");
        assert_eq!(legacy.format_version(), FormatVersion::Legacy);

        let common = InboundMessage::new("2", "{}").with_attribute(COMMON_FORMAT_ATTRIBUTE, "");
        assert_eq!(common.format_version(), FormatVersion::Common);
    }
}
