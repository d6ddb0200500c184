// SPDX-License-Identifier: MPL-2.0

//! Error types for the protocol layer

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Result type alias using ThetaError
pub type ThetaResult<T> = Result<T, ThetaError>;

/// Main error type
#[derive(Debug, Clone)]
pub enum ThetaError {
    /// A wire value could not be coerced to the type of its key
    Decode {
        /// Wire name of the offending key (dotted path for record fields)
        key: String,
        /// What went wrong
        message: String,
    },
    /// The device answered with `state: "error"`
    Device(DeviceError),
    /// The response contradicts its own declared state
    Protocol(String),
    /// Capture options do not apply to the capture kind
    Configuration(String),
    /// The capture or preview slot is occupied, or the operation is out of order
    State(String),
    /// Opaque failure reported by the transport collaborator
    Transport(TransportError),
    /// A caller-supplied deadline passed before the device finished
    Timeout {
        operation: String,
        after: Duration,
    },
    /// A value of the wrong shape was inserted for a key
    InvalidOption {
        /// Wire name of the key
        key: &'static str,
        /// Expected value shape
        expected: String,
    },
}

/// Error reported by the device, passed through verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    pub code: String,
    pub message: String,
}

/// Transport failure
///
/// The content is never inspected by this crate, only carried.
#[derive(Debug, Clone)]
pub struct TransportError {
    message: String,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error from the transport implementation
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ThetaError {
    pub fn decode(key: impl Into<String>, message: impl Into<String>) -> Self {
        ThetaError::Decode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this is a `StateError`
    pub fn is_state(&self) -> bool {
        matches!(self, ThetaError::State(_))
    }

    /// Key named by a decode error
    pub fn decode_key(&self) -> Option<&str> {
        match self {
            ThetaError::Decode { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for ThetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThetaError::Decode { key, message } => {
                write!(f, "Decode error for '{}': {}", key, message)
            }
            ThetaError::Device(e) => write!(f, "Device error: {}", e),
            ThetaError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            ThetaError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ThetaError::State(msg) => write!(f, "State error: {}", msg),
            ThetaError::Transport(e) => write!(f, "Transport error: {}", e),
            ThetaError::Timeout { operation, after } => {
                write!(f, "{} timed out after {:?}", operation, after)
            }
            ThetaError::InvalidOption { key, expected } => {
                write!(f, "Invalid value for '{}': expected {}", key, expected)
            }
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} ({})", self.message, source),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ThetaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ThetaError::Transport(e) => Some(e),
            ThetaError::Device(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for DeviceError {}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<DeviceError> for ThetaError {
    fn from(err: DeviceError) -> Self {
        ThetaError::Device(err)
    }
}

impl From<TransportError> for ThetaError {
    fn from(err: TransportError) -> Self {
        ThetaError::Transport(err)
    }
}
