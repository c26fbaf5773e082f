//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` for the backend worker. Returns `false` and sets `status` when
/// the command could not be queued.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "ui->backend queue full");
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "backend worker is gone");
            *status =
                "Backend worker disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;

    #[test]
    fn queued_command_leaves_status_alone() {
        let (cmd_tx, cmd_rx) = bounded(1);
        let mut status = "Ready".to_string();

        assert!(dispatch_backend_command(
            &cmd_tx,
            BackendCommand::ShowGraph,
            &mut status
        ));
        assert_eq!(status, "Ready");
        assert!(matches!(cmd_rx.try_recv(), Ok(BackendCommand::ShowGraph)));
    }

    #[test]
    fn full_queue_reports_retry() {
        let (cmd_tx, _cmd_rx) = bounded(1);
        let mut status = String::new();

        assert!(dispatch_backend_command(&cmd_tx, BackendCommand::ResetCache, &mut status));
        assert!(!dispatch_backend_command(&cmd_tx, BackendCommand::ResetCache, &mut status));
        assert!(status.contains("full"));
    }

    #[test]
    fn disconnected_worker_is_reported() {
        let (cmd_tx, cmd_rx) = bounded(1);
        drop(cmd_rx);
        let mut status = String::new();

        assert!(!dispatch_backend_command(
            &cmd_tx,
            BackendCommand::RefreshCacheStatus,
            &mut status
        ));
        assert!(status.contains("disconnected"));
    }
}
