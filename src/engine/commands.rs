//! Host command surface.
//!
//! The host process sends small JSON requests such as `{"command": "last_settings"}`
//! and gets a [`CommandResponse`] back. Only `last_settings` is answered from
//! reconciliation state; the others are passed through.

use super::collaborator::RoutingEngine;
use super::scheduler::Reconciler;
use crate::error::ReconcileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    RunningInfo,
    LastSettings,
    ExportLogs,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    fn from_result(result: Result<String, ReconcileError>) -> CommandResponse {
        match result {
            Ok(payload) => CommandResponse {
                ok: true,
                payload: Some(payload),
                error: None,
            },
            Err(e) => CommandResponse {
                ok: false,
                payload: None,
                error: Some(e.to_string()),
            },
        }
    }
}

pub struct CommandHandler {
    reconciler: Reconciler,
    engine: Arc<dyn RoutingEngine>,
    log_file: Option<PathBuf>,
}

impl CommandHandler {
    pub fn new(
        reconciler: Reconciler,
        engine: Arc<dyn RoutingEngine>,
        log_file: Option<PathBuf>,
    ) -> CommandHandler {
        CommandHandler {
            reconciler,
            engine,
            log_file,
        }
    }

    pub async fn handle(&self, command: HostCommand) -> CommandResponse {
        log::debug!("Host command {command:?}");
        let result = match command {
            HostCommand::RunningInfo => self.engine.running_info().map_err(ReconcileError::Command),
            HostCommand::LastSettings => self.last_settings().await,
            HostCommand::ExportLogs => self.export_logs(),
        };
        CommandResponse::from_result(result)
    }

    /// Decode a JSON request, run it and encode the response.
    pub async fn handle_json(&self, request: &str) -> String {
        let response = match serde_json::from_str::<HostCommand>(request) {
            Ok(command) => self.handle(command).await,
            Err(e) => CommandResponse::from_result(Err(ReconcileError::Command(format!(
                "unknown request: {e}"
            )))),
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            log::error!("Error serializing command response: {e}");
            r#"{"ok":false}"#.to_string()
        })
    }

    async fn last_settings(&self) -> Result<String, ReconcileError> {
        let snapshot = self.reconciler.last_snapshot().await?;
        serde_json::to_string(&snapshot).map_err(|e| ReconcileError::Command(e.to_string()))
    }

    fn export_logs(&self) -> Result<String, ReconcileError> {
        let path = self
            .log_file
            .as_ref()
            .ok_or_else(|| ReconcileError::Command("no log file configured".to_string()))?;
        std::fs::read_to_string(path)
            .map_err(|e| ReconcileError::Command(format!("reading {}: {e}", path.display())))
    }
}
