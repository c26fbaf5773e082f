//! Backend worker thread: owns the tokio runtime and the `UiController`, and
//! turns queued UI commands into controller actions.

use std::{sync::Arc, thread};

use client_core::{ClientSettings, HttpGraphQaApi, UiController};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{ChannelView, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let api = match HttpGraphQaApi::new(&settings.server_url) {
                Ok(api) => api,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                        "invalid server url '{}': {err}",
                        settings.server_url
                    )));
                    tracing::error!(server_url = %settings.server_url, "invalid server url: {err}");
                    return;
                }
            };
            let view = Arc::new(ChannelView::new(ui_tx.clone()));
            let controller = UiController::new_with_settings(Arc::new(api), view, &settings);
            tracing::info!(server_url = %settings.server_url, "backend worker ready");
            let _ = ui_tx.try_send(UiEvent::BackendReady {
                server_url: settings.server_url.clone(),
            });

            tokio::spawn({
                let controller = controller.clone();
                async move {
                    controller.start().await;
                    controller.refresh_cache_status().await;
                }
            });

            while let Ok(cmd) = cmd_rx.recv() {
                run_command(&controller, cmd);
            }

            tracing::info!("ui command queue closed; stopping backend worker");
            controller.shutdown();
        });
    });
}

fn run_command(controller: &Arc<UiController>, cmd: BackendCommand) {
    let controller = controller.clone();
    match cmd {
        BackendCommand::SubmitQuestion { question } => {
            tokio::spawn(async move {
                // A fresh answer may have (re)built backend artifacts.
                if controller.submit_question(&question).await.is_success() {
                    controller.refresh_cache_status().await;
                }
            });
        }
        BackendCommand::ResetCache => {
            tokio::spawn(async move {
                if controller.reset_cache().await.is_success() {
                    controller.refresh_cache_status().await;
                }
            });
        }
        BackendCommand::ShowGraph => {
            tokio::spawn(async move {
                controller.show_graph().await;
            });
        }
        BackendCommand::SelectCharacter { character } => {
            tokio::spawn(async move {
                controller.select_character(character).await;
            });
        }
        BackendCommand::RefreshCacheStatus => {
            tokio::spawn(async move {
                controller.refresh_cache_status().await;
            });
        }
        BackendCommand::SetApiKey { api_key } => controller.set_api_key(api_key),
        BackendCommand::SetModels {
            llm_model,
            embedding_model,
        } => {
            controller.set_llm_model(llm_model);
            controller.set_embedding_model(embedding_model);
        }
    }
}
