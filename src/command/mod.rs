// SPDX-License-Identifier: MPL-2.0

//! Command envelope
//!
//! Every device operation is a named command posted to
//! [`paths::EXECUTE`](crate::constants::paths::EXECUTE). The device answers
//! with one of three states:
//!
//! ```text
//!              ┌──────────────────────────┐
//!              │                          ▼
//! Idle ──▶ Sent ──▶ InProgress(id) ──▶ Done | Error
//!                     │     ▲
//!                     └─────┘ poll(id)
//! ```
//!
//! This layer issues commands and single polls. How often and for how long
//! to poll is decided by the caller.

pub mod client;
pub mod execution;

pub use client::{
    AccessPoint, AuthMode, CommandClient, FileEntry, FileType, IpAddressAllocation, Metadata,
    PluginInfo,
};
pub use execution::{CommandExecution, CommandPhase};

use crate::constants::commands;
use crate::errors::{DeviceError, ThetaError, ThetaResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// A command to issue
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub name: String,
    pub session_id: Option<String>,
    pub parameters: Map<String, Value>,
}

impl CommandRequest {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            session_id: None,
            parameters: Map::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Request body; the session id travels inside `parameters`
    pub fn to_wire(&self) -> Value {
        let mut parameters = self.parameters.clone();
        if let Some(session_id) = &self.session_id {
            parameters.insert("sessionId".to_string(), Value::from(session_id.as_str()));
        }
        let mut body = Map::new();
        body.insert("name".to_string(), Value::from(self.name.as_str()));
        if !parameters.is_empty() {
            body.insert("parameters".to_string(), Value::Object(parameters));
        }
        Value::Object(body)
    }
}

/// Declared state of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandState {
    Done,
    InProgress,
    Error,
}

/// Progress of a long-running command, surfaced as reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(alias = "completion")]
    pub percentage: f64,
}

/// State-specific part of a response
///
/// Each state carries exactly the payload that belongs to it.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandStatus {
    Done { results: Value },
    InProgress { progress: Option<Progress> },
    Error(DeviceError),
}

/// A validated device response
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub name: String,
    pub id: Option<String>,
    pub status: CommandStatus,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    name: Option<String>,
    state: CommandState,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    results: Option<Value>,
    #[serde(default)]
    error: Option<WireError>,
    #[serde(default)]
    progress: Option<Progress>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    code: String,
    #[serde(default)]
    message: String,
}

/// Commands whose `done` response must carry `results`
///
/// The others (`setOptions`, `reset`, ...) are answered with a bare `done`.
pub fn expects_results(name: &str) -> bool {
    matches!(
        name,
        commands::GET_OPTIONS
            | commands::TAKE_PICTURE
            | commands::STOP_CAPTURE
            | commands::CONVERT_VIDEO_FORMATS
            | commands::LIST_FILES
            | commands::LIST_PLUGINS
            | commands::GET_PLUGIN_ORDERS
            | commands::GET_MY_SETTING
            | commands::LIST_ACCESS_POINTS
            | commands::GET_METADATA
            | commands::SET_BLUETOOTH_DEVICE
    )
}

impl CommandResponse {
    /// Parse and validate a response body
    ///
    /// `fallback_name` is used when the body does not echo the command name.
    /// A body that contradicts its own declared state is a
    /// [`ThetaError::Protocol`].
    pub fn from_wire(body: Value, fallback_name: &str) -> ThetaResult<Self> {
        let wire: WireResponse = serde_json::from_value(body)
            .map_err(|e| ThetaError::Protocol(format!("malformed response envelope: {}", e)))?;
        let name = wire.name.unwrap_or_else(|| fallback_name.to_string());

        let status = match wire.state {
            CommandState::Done => {
                if wire.error.is_some() || wire.progress.is_some() {
                    return Err(protocol(&name, "done response carries error or progress"));
                }
                match wire.results {
                    Some(results) => CommandStatus::Done { results },
                    None if expects_results(&name) => {
                        return Err(protocol(&name, "done response carries no results"));
                    }
                    None => CommandStatus::Done {
                        results: Value::Object(Map::new()),
                    },
                }
            }
            CommandState::InProgress => {
                if wire.results.is_some() || wire.error.is_some() {
                    return Err(protocol(&name, "inProgress response carries results or error"));
                }
                if wire.id.is_none() {
                    return Err(protocol(&name, "inProgress response has no id"));
                }
                CommandStatus::InProgress {
                    progress: wire.progress,
                }
            }
            CommandState::Error => {
                if wire.results.is_some() || wire.progress.is_some() {
                    return Err(protocol(&name, "error response carries results or progress"));
                }
                let error = wire
                    .error
                    .ok_or_else(|| protocol(&name, "error response has no error object"))?;
                CommandStatus::Error(DeviceError {
                    code: error.code,
                    message: error.message,
                })
            }
        };

        Ok(Self {
            name,
            id: wire.id,
            status,
        })
    }

    pub fn state(&self) -> CommandState {
        match self.status {
            CommandStatus::Done { .. } => CommandState::Done,
            CommandStatus::InProgress { .. } => CommandState::InProgress,
            CommandStatus::Error(_) => CommandState::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state() != CommandState::InProgress
    }

    pub fn results(&self) -> Option<&Value> {
        match &self.status {
            CommandStatus::Done { results } => Some(results),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        match &self.status {
            CommandStatus::InProgress { progress } => *progress,
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DeviceError> {
        match &self.status {
            CommandStatus::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Results of a finished command
    ///
    /// A device error becomes [`ThetaError::Device`]; a response that is still
    /// in progress is a [`ThetaError::State`].
    pub fn into_results(self) -> ThetaResult<Value> {
        match self.status {
            CommandStatus::Done { results } => Ok(results),
            CommandStatus::Error(e) => Err(ThetaError::Device(e)),
            CommandStatus::InProgress { .. } => Err(ThetaError::State(format!(
                "{} is still in progress (id {})",
                self.name,
                self.id.as_deref().unwrap_or("?")
            ))),
        }
    }
}

fn protocol(name: &str, message: &str) -> ThetaError {
    warn!(command = %name, "{}", message);
    ThetaError::Protocol(format!("{}: {}", name, message))
}
