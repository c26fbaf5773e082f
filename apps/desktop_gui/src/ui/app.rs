use std::{fs, time::Instant};

use arboard::Clipboard;
use client_core::{
    AnswerView, ClientSettings, ExplorerPane, GraphImage, GraphImageSlot, Notification,
    NotificationCenter, NotificationLevel,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{Character, EmbeddingModel, LlmModel},
    protocol::CacheStatus,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::graph_texture::EguiTextureFactory;

pub const SETTINGS_STORAGE_KEY: &str = "graph_qa_gui.settings";

/// Model choices remembered between launches. The API key never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedGuiSettings {
    pub llm_model: LlmModel,
    pub embedding_model: EmbeddingModel,
}

pub struct GraphQaApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_url: String,
    status: String,
    question: String,
    api_key: String,
    llm_model: LlmModel,
    embedding_model: EmbeddingModel,
    controls_enabled: bool,
    answer: Option<AnswerView>,
    result_error: Option<String>,
    graph: GraphImageSlot<EguiTextureFactory>,
    active_character: Option<Character>,
    explorer: Option<ExplorerPane>,
    cache_status: Option<CacheStatus>,
    notifications: NotificationCenter,
}

impl GraphQaApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: &ClientSettings,
        persisted: Option<PersistedGuiSettings>,
        ctx: egui::Context,
    ) -> Self {
        let (llm_model, embedding_model) = persisted
            .map(|p| (p.llm_model, p.embedding_model))
            .unwrap_or((settings.llm_model, settings.embedding_model));

        let mut app = Self {
            cmd_tx,
            ui_rx,
            server_url: settings.server_url.clone(),
            status: "Backend worker starting...".to_string(),
            question: String::new(),
            api_key: String::new(),
            llm_model,
            embedding_model,
            controls_enabled: true,
            answer: None,
            result_error: None,
            graph: GraphImageSlot::new(EguiTextureFactory::new(ctx)),
            active_character: None,
            explorer: None,
            cache_status: None,
            notifications: NotificationCenter::new(),
        };
        app.send_models();
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn send_models(&mut self) {
        self.dispatch(BackendCommand::SetModels {
            llm_model: self.llm_model,
            embedding_model: self.embedding_model,
        });
    }

    fn toast(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications
            .push(Notification::new(level, message), Instant::now());
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::BackendReady { server_url } => {
                    self.status = format!("Connected to {server_url}");
                    self.server_url = server_url;
                }
                UiEvent::BackendFailed(message) => {
                    self.status = message.clone();
                    self.toast(NotificationLevel::Danger, message);
                }
                UiEvent::ControlsEnabled(enabled) => self.controls_enabled = enabled,
                UiEvent::Notify(notification) => {
                    self.notifications.push(notification, Instant::now());
                }
                UiEvent::Answer(answer) => {
                    self.result_error = None;
                    self.answer = Some(answer);
                }
                UiEvent::ResultError(message) => {
                    self.answer = None;
                    self.result_error = Some(message);
                }
                UiEvent::GraphImage(image) => self.show_graph_image(&image),
                UiEvent::ActiveCharacter(character) => self.active_character = Some(character),
                UiEvent::Explorer(pane) => self.explorer = Some(pane),
                UiEvent::CacheStatus(status) => self.cache_status = Some(status),
            }
        }
    }

    fn show_graph_image(&mut self, image: &GraphImage) {
        if let Err(err) = self.graph.show(image) {
            self.toast(
                NotificationLevel::Danger,
                format!("Failed to display graph image: {err}"),
            );
        }
    }

    fn save_graph_image_as(&mut self) {
        let Some((bytes, suggested_name)) = self.graph.active().map(|active| {
            (
                active.source.bytes.clone(),
                format!("knowledge_graph.{}", active.source.extension()),
            )
        }) else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(suggested_name)
            .save_file()
        {
            match fs::write(&path, bytes) {
                Ok(()) => self.status = format!("Saved graph image to {}", path.display()),
                Err(err) => self.status = format!("Failed to save image: {err}"),
            }
        }
    }

    fn copy_answer(&mut self) {
        let Some(answer) = self.answer.as_ref().map(|a| a.answer.clone()) else {
            return;
        };
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(answer)) {
            Ok(()) => self.toast(NotificationLevel::Info, "Answer copied to clipboard"),
            Err(err) => self.status = format!("Clipboard unavailable: {err}"),
        }
    }

    /// Model choice from the radio groups. Ignored while a request holds the
    /// form locked.
    fn select_models(&mut self, llm_model: LlmModel, embedding_model: EmbeddingModel) {
        if !self.controls_enabled {
            return;
        }
        if (llm_model, embedding_model) == (self.llm_model, self.embedding_model) {
            return;
        }
        self.llm_model = llm_model;
        self.embedding_model = embedding_model;
        self.send_models();
    }

    fn update_api_key(&mut self, api_key: String) {
        if !self.controls_enabled || api_key == self.api_key {
            return;
        }
        self.api_key = api_key;
        let api_key = self.api_key.clone();
        self.dispatch(BackendCommand::SetApiKey { api_key });
    }

    fn show_question_form(&mut self, ui: &mut egui::Ui) {
        // Every input and button in the form is locked while busy.
        let enabled = self.controls_enabled;
        ui.add_enabled_ui(enabled, |ui| self.question_form_body(ui));
    }

    fn question_form_body(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Question").strong());
        let question = ui.add(
            egui::TextEdit::multiline(&mut self.question)
                .hint_text("e.g. Who is Magneto?")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        let submit_shortcut = question.has_focus()
            && ui.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Enter));

        ui.add_space(6.0);
        let mut api_key = self.api_key.clone();
        ui.horizontal(|ui| {
            ui.label("OpenAI API key");
            ui.add(
                egui::TextEdit::singleline(&mut api_key)
                    .password(true)
                    .hint_text("optional if the server has one"),
            );
        });
        self.update_api_key(api_key);

        ui.add_space(6.0);
        let (mut llm_model, mut embedding_model) = (self.llm_model, self.embedding_model);
        ui.horizontal_wrapped(|ui| {
            ui.label("LLM model:");
            for model in LlmModel::ALL {
                ui.radio_value(&mut llm_model, *model, model.as_str());
            }
        });
        ui.horizontal_wrapped(|ui| {
            ui.label("Embedding model:");
            for model in EmbeddingModel::ALL {
                ui.radio_value(&mut embedding_model, *model, model.as_str());
            }
        });
        self.select_models(llm_model, embedding_model);

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let submit_label = if self.controls_enabled {
                "Submit"
            } else {
                "Loading..."
            };
            let submit = ui.button(submit_label);
            if self.controls_enabled && (submit.clicked() || submit_shortcut) {
                let question = self.question.clone();
                self.dispatch(BackendCommand::SubmitQuestion { question });
            }
            if ui.button("Reset cache").clicked() && self.controls_enabled {
                self.dispatch(BackendCommand::ResetCache);
            }
            if ui.button("Show graph").clicked() && self.controls_enabled {
                self.dispatch(BackendCommand::ShowGraph);
            }
        });
    }

    fn show_result_pane(&mut self, ui: &mut egui::Ui) {
        if let Some(message) = &self.result_error {
            ui.colored_label(ui.visuals().error_fg_color, message);
            return;
        }
        let Some(answer) = &self.answer else {
            ui.weak("Ask a question to see the answer here.");
            return;
        };

        ui.label(&answer.answer);
        ui.add_space(4.0);
        if let Some(cost_line) = &answer.cost_line {
            ui.small(cost_line);
        }
        if !answer.cache_lines.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.small("Cache usage:");
                for line in &answer.cache_lines {
                    let text = egui::RichText::new(line.to_string()).small();
                    if line.status.is_cached() {
                        ui.label(text.color(egui::Color32::from_rgb(60, 160, 90)));
                    } else {
                        ui.label(text.weak());
                    }
                }
            });
        }
        if ui.small_button("Copy answer").clicked() {
            self.copy_answer();
        }
    }

    fn show_graph_panel(&mut self, ui: &mut egui::Ui) {
        let Some(active) = self.graph.active() else {
            return;
        };
        let sized = egui::load::SizedTexture::new(active.texture.id(), active.size);

        ui.separator();
        let mut save = false;
        let mut hide = false;
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Knowledge graph").strong());
            save = ui.small_button("Save image as...").clicked();
            hide = ui.small_button("Hide").clicked();
        });
        ui.add(egui::Image::new(sized).max_width(ui.available_width()));

        if save {
            self.save_graph_image_as();
        }
        if hide {
            self.graph.clear();
        }
    }

    fn show_explorer(&mut self, ui: &mut egui::Ui) {
        ui.heading("Character explorer");
        ui.horizontal_wrapped(|ui| {
            for character in Character::ALL {
                let selected = self.active_character == Some(*character);
                if ui.selectable_label(selected, character.name()).clicked() {
                    self.dispatch(BackendCommand::SelectCharacter {
                        character: *character,
                    });
                }
            }
        });
        ui.separator();

        match &self.explorer {
            None => {
                ui.weak("Select a character.");
            }
            Some(ExplorerPane::Loading(character)) => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(format!("Loading {character}..."));
                });
            }
            Some(ExplorerPane::Connections { connections, .. }) => {
                egui::ScrollArea::vertical()
                    .id_salt("explorer_connections")
                    .max_height(ui.available_height() * 0.6)
                    .show(ui, |ui| {
                        egui::Grid::new("explorer_connections_grid")
                            .striped(true)
                            .num_columns(2)
                            .show(ui, |ui| {
                                ui.strong("Relation");
                                ui.strong("Entity");
                                ui.end_row();
                                for connection in connections {
                                    ui.label(&connection.relation);
                                    ui.label(&connection.entity);
                                    ui.end_row();
                                }
                            });
                    });
            }
            Some(pane @ ExplorerPane::Empty(_)) => {
                ui.weak(pane.notice().unwrap_or_default());
            }
            Some(ExplorerPane::Error { message, .. }) => {
                ui.colored_label(ui.visuals().error_fg_color, message);
            }
        }
    }

    fn show_cache_status(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Backend cache");
            if ui.small_button("Refresh").clicked() {
                self.dispatch(BackendCommand::RefreshCacheStatus);
            }
        });
        match self.cache_status {
            None => {
                ui.weak("Unknown");
            }
            Some(status) => {
                for (label, present) in [
                    ("Graph", status.graph),
                    ("Triplets", status.triplets),
                    ("Index", status.index),
                ] {
                    ui.label(format!(
                        "{label}: {}",
                        if present { "cached" } else { "not built" }
                    ));
                }
            }
        }
    }

    fn show_toasts(&mut self, ctx: &egui::Context, now: Instant) {
        if self.notifications.is_empty() {
            return;
        }
        let mut dismissed = Vec::new();
        egui::Area::new(egui::Id::new("toast_stack"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -36.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in self.notifications.toasts() {
                    ui.scope(|ui| {
                        ui.multiply_opacity(toast.opacity(now));
                        egui::Frame::new()
                            .fill(level_color(toast.notification.level))
                            .corner_radius(6.0)
                            .inner_margin(egui::Margin::symmetric(10, 8))
                            .show(ui, |ui| {
                                ui.set_max_width(320.0);
                                ui.horizontal(|ui| {
                                    ui.label(
                                        egui::RichText::new(&toast.notification.message)
                                            .color(egui::Color32::WHITE),
                                    );
                                    if ui.small_button("x").clicked() {
                                        dismissed.push(toast.id);
                                    }
                                });
                            });
                    });
                    ui.add_space(6.0);
                }
            });
        for id in dismissed {
            self.notifications.dismiss(id, now);
        }
    }
}

fn level_color(level: NotificationLevel) -> egui::Color32 {
    match level {
        NotificationLevel::Info => egui::Color32::from_rgb(45, 110, 180),
        NotificationLevel::Success => egui::Color32::from_rgb(40, 140, 80),
        NotificationLevel::Warning => egui::Color32::from_rgb(190, 130, 20),
        NotificationLevel::Danger => egui::Color32::from_rgb(180, 45, 45),
    }
}

impl eframe::App for GraphQaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.process_ui_events();
        self.notifications.tick(now);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Marvel Knowledge Graph QA");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(egui::RichText::new(&self.server_url).weak());
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.small(egui::RichText::new(&self.status).weak());
        });

        egui::SidePanel::right("explorer_panel")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                self.show_explorer(ui);
                ui.add_space(12.0);
                ui.separator();
                self.show_cache_status(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_question_form(ui);
                ui.add_space(10.0);
                ui.separator();
                self.show_result_pane(ui);
                self.show_graph_panel(ui);
            });
        });

        self.show_toasts(ctx, now);

        if self.notifications.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedGuiSettings {
            llm_model: self.llm_model,
            embedding_model: self.embedding_model,
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}
