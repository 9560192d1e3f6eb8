use std::fmt;

/// Where listeners connect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Endpoint {
    /// The managed broker, with ambient credentials.
    #[default]
    Default,
    /// A local emulator at `host:port`, plaintext and without credentials.
    Emulator(String),
}

impl Endpoint {
    /// `Emulator` for a non-blank host, `Default` otherwise.
    pub fn from_emulator_host(host: Option<&str>) -> Self {
        match host.map(str::trim) {
            Some(h) if !h.is_empty() => Endpoint::Emulator(h.to_string()),
            _ => Endpoint::Default,
        }
    }

    pub fn is_emulator(&self) -> bool {
        matches!(self, Endpoint::Emulator(_))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Default => f.write_str("default"),
            Endpoint::Emulator(host) => write!(f, "emulator({host})"),
        }
    }
}
