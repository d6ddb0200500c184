// SPDX-License-Identifier: MPL-2.0

//! Lifecycle tracking for one issued command

use super::{CommandRequest, CommandResponse, CommandState};
use crate::errors::{ThetaError, ThetaResult};
use tracing::debug;

/// Where a command is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandPhase {
    Idle,
    Sent,
    InProgress { id: String },
    Done,
    Error,
}

/// One command from issuance to a terminal response
///
/// Transitions are `Idle → Sent → InProgress(id)* → Done | Error`, or
/// `Sent → Done | Error` for commands that finish immediately. Terminal
/// phases accept nothing further.
#[derive(Debug, Clone)]
pub struct CommandExecution {
    request: CommandRequest,
    phase: CommandPhase,
    last: Option<CommandResponse>,
}

impl CommandExecution {
    pub fn new(request: CommandRequest) -> Self {
        Self {
            request,
            phase: CommandPhase::Idle,
            last: None,
        }
    }

    pub fn request(&self) -> &CommandRequest {
        &self.request
    }

    pub fn phase(&self) -> &CommandPhase {
        &self.phase
    }

    pub fn last_response(&self) -> Option<&CommandResponse> {
        self.last.as_ref()
    }

    pub fn into_last_response(self) -> Option<CommandResponse> {
        self.last
    }

    /// Id to poll, while the command is in progress
    pub fn pending_id(&self) -> Option<&str> {
        match &self.phase {
            CommandPhase::InProgress { id } => Some(id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, CommandPhase::Done | CommandPhase::Error)
    }

    pub(crate) fn mark_sent(&mut self) -> ThetaResult<()> {
        if self.phase != CommandPhase::Idle {
            return Err(ThetaError::State(format!(
                "{} was already sent",
                self.request.name
            )));
        }
        self.phase = CommandPhase::Sent;
        Ok(())
    }

    /// Apply a response received for this command
    pub(crate) fn record(&mut self, response: CommandResponse) -> ThetaResult<&CommandResponse> {
        match &self.phase {
            CommandPhase::Sent => {}
            CommandPhase::InProgress { id } => {
                if let Some(reported) = &response.id
                    && reported != id
                {
                    return Err(ThetaError::Protocol(format!(
                        "status for {} reports id {} while polling {}",
                        self.request.name, reported, id
                    )));
                }
            }
            phase => {
                return Err(ThetaError::State(format!(
                    "{} cannot accept a response in phase {:?}",
                    self.request.name, phase
                )));
            }
        }

        self.phase = match response.state() {
            CommandState::Done => CommandPhase::Done,
            CommandState::Error => CommandPhase::Error,
            CommandState::InProgress => match (&self.phase, &response.id) {
                (_, Some(id)) => CommandPhase::InProgress { id: id.clone() },
                (CommandPhase::InProgress { id }, None) => CommandPhase::InProgress { id: id.clone() },
                _ => {
                    return Err(ThetaError::Protocol(format!(
                        "{} is in progress without an id",
                        self.request.name
                    )));
                }
            },
        };
        debug!(command = %self.request.name, phase = ?self.phase, "Command advanced");

        Ok(self.last.insert(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandStatus, Progress};
    use crate::constants::commands;
    use serde_json::json;

    fn in_progress(id: &str, pct: f64) -> CommandResponse {
        CommandResponse {
            name: commands::TAKE_PICTURE.to_string(),
            id: Some(id.to_string()),
            status: CommandStatus::InProgress {
                progress: Some(Progress { percentage: pct }),
            },
        }
    }

    fn done(id: &str) -> CommandResponse {
        CommandResponse {
            name: commands::TAKE_PICTURE.to_string(),
            id: Some(id.to_string()),
            status: CommandStatus::Done {
                results: json!({"fileUrl": "http://cam/100RICOH/R0010001.JPG"}),
            },
        }
    }

    #[test]
    fn test_sent_to_done() {
        let mut exec = CommandExecution::new(CommandRequest::new(commands::TAKE_PICTURE));
        exec.mark_sent().unwrap();
        exec.record(in_progress("9", 10.0)).unwrap();
        assert_eq!(exec.pending_id(), Some("9"));
        exec.record(done("9")).unwrap();
        assert_eq!(exec.phase(), &CommandPhase::Done);
        assert!(exec.is_terminal());
    }

    #[test]
    fn test_terminal_rejects_more() {
        let mut exec = CommandExecution::new(CommandRequest::new(commands::TAKE_PICTURE));
        exec.mark_sent().unwrap();
        exec.record(done("9")).unwrap();
        let err = exec.record(done("9")).unwrap_err();
        assert!(err.is_state());
    }

    #[test]
    fn test_id_mismatch() {
        let mut exec = CommandExecution::new(CommandRequest::new(commands::TAKE_PICTURE));
        exec.mark_sent().unwrap();
        exec.record(in_progress("9", 10.0)).unwrap();
        let err = exec.record(in_progress("10", 20.0)).unwrap_err();
        assert!(matches!(err, ThetaError::Protocol(_)));
    }

    #[test]
    fn test_idle_cannot_record() {
        let mut exec = CommandExecution::new(CommandRequest::new(commands::RESET));
        assert!(exec.record(done("1")).unwrap_err().is_state());
        exec.mark_sent().unwrap();
        assert!(exec.mark_sent().unwrap_err().is_state());
    }
}
