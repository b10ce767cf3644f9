use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use eframe::egui;

use crate::config::Settings;
use crate::curator::{self, ConfirmedDeletionList, Curation};
use crate::deleter::DeletionReport;
use crate::scanner::{self, ScanResult};
use crate::utils;

/// Messages sent from background threads to the UI thread.
pub enum BgMessage {
    ScanComplete(Result<ScanResult, String>),
    DeleteComplete(DeletionReport),
}

/// Overall application operation state.
#[derive(PartialEq)]
pub enum AppPhase {
    Idle,
    Scanning,
    Deleting,
}

pub struct VisioTidyApp {
    settings: Arc<Settings>,
    dir_input: String,
    phase: AppPhase,
    receiver: Option<mpsc::Receiver<BgMessage>>,
    scan_result: Option<ScanResult>,
    entry_selected: Vec<bool>, // parallel to scan_result.records()
    /// Curated list awaiting the user's answer in the modal.
    pending: Option<ConfirmedDeletionList>,
    status: String,
    /// Summary of the most recent deletion, kept across the follow-up rescan.
    last_deletion: Option<String>,
    warnings: Vec<String>,
}

impl VisioTidyApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let dir_input = settings
            .default_dir
            .as_ref()
            .filter(|_| settings.default_dir_valid())
            .map(|d| d.display().to_string())
            .unwrap_or_default();

        let warnings = settings.rejected.iter().map(|r| r.to_string()).collect();

        Self {
            settings: Arc::new(settings),
            dir_input,
            phase: AppPhase::Idle,
            receiver: None,
            scan_result: None,
            entry_selected: vec![],
            pending: None,
            status: "Choose a folder and press Scan.".to_string(),
            last_deletion: None,
            warnings,
        }
    }

    fn start_scan(&mut self) {
        let dir = PathBuf::from(self.dir_input.trim().trim_matches('"'));
        if self.dir_input.trim().is_empty() {
            self.status = "Enter a directory to scan.".to_string();
            return;
        }

        self.phase = AppPhase::Scanning;
        self.status = format!("Scanning {}...", dir.display());

        let (tx, rx) = mpsc::channel::<BgMessage>();
        self.receiver = Some(rx);
        let settings = Arc::clone(&self.settings);

        std::thread::spawn(move || {
            let result = scanner::scan(&dir, &settings.patterns, &settings.scan_options())
                .map_err(|e| e.to_string());
            let _ = tx.send(BgMessage::ScanComplete(result));
        });
    }

    /// Curate the checked rows and open the confirmation modal.
    fn request_delete(&mut self) {
        let Some(ref result) = self.scan_result else {
            return;
        };
        let chosen: Vec<PathBuf> = result
            .records()
            .iter()
            .zip(self.entry_selected.iter())
            .filter(|(_, sel)| **sel)
            .map(|(r, _)| r.path.clone())
            .collect();

        let curation = curator::curate(result, &chosen);
        for d in curation.dropped() {
            self.warnings
                .push(format!("Skipped {}: {}", d.path.display(), d.reason));
        }

        match curation {
            Curation::Confirmed { list, .. } => self.pending = Some(list),
            Curation::NothingToDelete { .. } => {
                self.status = "Nothing to delete.".to_string();
            }
        }
    }

    fn start_delete(&mut self, list: ConfirmedDeletionList) {
        let batch = match list.confirm(list.len()) {
            Ok(batch) => batch,
            Err(e) => {
                self.warnings.push(e.to_string());
                return;
            }
        };

        self.phase = AppPhase::Deleting;
        self.status = format!("Deleting {} file(s)...", batch.len());

        let (tx, rx) = mpsc::channel::<BgMessage>();
        self.receiver = Some(rx);
        let deleter = self.settings.deleter();

        std::thread::spawn(move || {
            let report = deleter.delete_all(&batch);
            let _ = tx.send(BgMessage::DeleteComplete(report));
        });
    }

    fn drain_messages(&mut self) {
        let Some(ref rx) = self.receiver else {
            return;
        };
        let mut rescan = false;

        while let Ok(msg) = rx.try_recv() {
            match msg {
                BgMessage::ScanComplete(Ok(result)) => {
                    self.phase = AppPhase::Idle;
                    self.status = if result.is_empty() {
                        "No matching temporary Visio files found in the specified location."
                            .to_string()
                    } else {
                        format!(
                            "Found {} file(s), {}.",
                            result.len(),
                            utils::format_size(result.total_bytes())
                        )
                    };
                    self.warnings.extend(result.warnings().iter().cloned());
                    self.entry_selected = vec![false; result.len()];
                    self.scan_result = Some(result);
                }
                BgMessage::ScanComplete(Err(err)) => {
                    self.phase = AppPhase::Idle;
                    self.status = format!("Scan failed: {err}");
                    self.scan_result = None;
                    self.entry_selected.clear();
                }
                BgMessage::DeleteComplete(report) => {
                    self.phase = AppPhase::Idle;
                    for (path, reason) in report.failures() {
                        self.warnings
                            .push(format!("Failed to delete {}: {reason}", path.display()));
                    }
                    if let Some(failure) = report.batch_failure() {
                        self.warnings.push(format!(
                            "{} ({} file(s) were not attempted)",
                            failure.reason, failure.unattempted
                        ));
                    }
                    self.last_deletion = Some(format!(
                        "Summary: {} deleted, {} failed. ({} freed)",
                        report.deleted_count(),
                        report.failed_count(),
                        utils::format_size(report.freed_bytes())
                    ));
                    rescan = true;
                }
            }
        }

        if rescan {
            self.start_scan();
        }
    }

    fn selected_count(&self) -> usize {
        self.entry_selected.iter().filter(|s| **s).count()
    }

    fn selected_bytes(&self) -> u64 {
        match &self.scan_result {
            Some(result) => result
                .records()
                .iter()
                .zip(self.entry_selected.iter())
                .filter(|(_, sel)| **sel)
                .filter_map(|(r, _)| r.size_bytes)
                .sum(),
            None => 0,
        }
    }

    fn render_header(&self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            ui.heading(
                egui::RichText::new("Visio Temporary File Remover")
                    .size(24.0)
                    .strong()
                    .color(egui::Color32::from_rgb(80, 180, 220)),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Patterns: {}",
                    self.settings.patterns.to_strings().join(", ")
                ))
                .size(12.0)
                .color(egui::Color32::GRAY),
            );
        });
        ui.add_space(8.0);
    }

    fn render_action_bar(&mut self, ui: &mut egui::Ui) {
        let is_busy = self.phase != AppPhase::Idle;

        ui.horizontal(|ui| {
            ui.add_space(4.0);
            ui.label("Folder:");
            ui.add_enabled(
                !is_busy,
                egui::TextEdit::singleline(&mut self.dir_input).desired_width(360.0),
            );

            if ui
                .add_enabled(!is_busy, egui::Button::new("Browse..."))
                .clicked()
            {
                let mut dialog = rfd::FileDialog::new();
                if let Some(dir) = self.settings.default_dir.as_ref() {
                    dialog = dialog.set_directory(dir);
                }
                if let Some(dir) = dialog.pick_folder() {
                    self.dir_input = dir.display().to_string();
                }
            }

            if ui.add_enabled(!is_busy, egui::Button::new("Scan")).clicked() {
                self.last_deletion = None;
                self.start_scan();
            }
        });

        ui.horizontal(|ui| {
            ui.add_space(4.0);
            let count = self.scan_result.as_ref().map_or(0, ScanResult::len);

            if ui
                .add_enabled(!is_busy && count > 0, egui::Button::new("Select All"))
                .clicked()
            {
                self.entry_selected.iter_mut().for_each(|s| *s = true);
            }
            if ui
                .add_enabled(!is_busy && count > 0, egui::Button::new("Select None"))
                .clicked()
            {
                self.entry_selected.iter_mut().for_each(|s| *s = false);
            }

            let can_delete = !is_busy && self.selected_count() > 0;
            if ui
                .add_enabled(
                    can_delete,
                    egui::Button::new(egui::RichText::new("Delete Selected").color(
                        if can_delete {
                            egui::Color32::from_rgb(220, 60, 60)
                        } else {
                            egui::Color32::GRAY
                        },
                    )),
                )
                .clicked()
            {
                self.request_delete();
            }

            if is_busy {
                ui.add_space(8.0);
                ui.spinner();
            }
        });

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new(&self.status).color(egui::Color32::LIGHT_GRAY));
        });

        // Show the deletion summary after a delete operation
        if let Some(ref summary) = self.last_deletion {
            ui.horizontal(|ui| {
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(summary).color(egui::Color32::from_rgb(80, 200, 80)),
                );
            });
        }
        ui.add_space(4.0);
    }

    fn render_file_list(&mut self, ui: &mut egui::Ui) {
        let Some(ref result) = self.scan_result else {
            ui.label(
                egui::RichText::new("Not yet scanned.")
                    .italics()
                    .color(egui::Color32::GRAY),
            );
            return;
        };

        if result.is_empty() {
            ui.label(
                egui::RichText::new("Nothing found.")
                    .italics()
                    .color(egui::Color32::GRAY),
            );
            return;
        }

        let is_busy = self.phase != AppPhase::Idle;
        let root = result.root().to_path_buf();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .max_height((ui.available_height() - 80.0).max(120.0))
            .show(ui, |ui| {
                egui::Grid::new("file_grid")
                    .striped(true)
                    .num_columns(5)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("");
                        ui.label(egui::RichText::new("Name").strong());
                        ui.label(egui::RichText::new("Folder").strong());
                        ui.label(egui::RichText::new("Size").strong());
                        ui.label(egui::RichText::new("Modified").strong());
                        ui.end_row();

                        for (record, sel) in
                            result.records().iter().zip(self.entry_selected.iter_mut())
                        {
                            ui.add_enabled(!is_busy, egui::Checkbox::new(sel, ""));
                            ui.label(&record.name);
                            ui.label(
                                egui::RichText::new(utils::relative_parent(&record.path, &root))
                                    .color(egui::Color32::from_rgb(160, 160, 170)),
                            )
                            .on_hover_text(utils::display_path(&record.path));
                            ui.label(
                                egui::RichText::new(utils::format_optional_size(
                                    record.size_bytes,
                                ))
                                .color(egui::Color32::from_rgb(220, 180, 50)),
                            );
                            ui.label(utils::format_modified(record.modified_at));
                            ui.end_row();
                        }
                    });
            });
    }

    fn render_summary(&self, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(format!("Selected: {} file(s),", self.selected_count()))
                    .strong(),
            );
            ui.label(
                egui::RichText::new(utils::format_size(self.selected_bytes()))
                    .strong()
                    .size(16.0)
                    .color(egui::Color32::from_rgb(80, 200, 80)),
            );
        });
        ui.add_space(4.0);
    }

    fn render_confirm_dialog(&mut self, ctx: &egui::Context) {
        let Some(ref list) = self.pending else {
            return;
        };
        let mut should_delete = false;
        let mut should_cancel = false;

        // Dark overlay behind the dialog to block background interaction
        egui::Area::new(egui::Id::new("confirm_overlay"))
            .fixed_pos(egui::Pos2::ZERO)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let screen = ui.ctx().screen_rect();
                ui.allocate_rect(screen, egui::Sense::click());
                ui.painter()
                    .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(160));
            });

        egui::Window::new("")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size([380.0, 0.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("\u{26A0}")
                            .size(36.0)
                            .color(egui::Color32::from_rgb(220, 180, 50)),
                    );
                    ui.add_space(4.0);
                    ui.label(egui::RichText::new("Confirm Deletion").size(18.0).strong());
                });
                ui.add_space(8.0);

                ui.label(format!(
                    "Are you sure you want to permanently delete {} file(s)?",
                    list.len()
                ));
                ui.add_space(8.0);

                egui::Frame::group(ui.style())
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        egui::ScrollArea::vertical()
                            .max_height(160.0)
                            .show(ui, |ui| {
                                for record in list.records() {
                                    ui.label(format!("\u{2022} {}", record.name));
                                }
                            });
                    });

                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "Total: {} will be freed",
                            utils::format_size(list.total_bytes())
                        ))
                        .strong()
                        .size(15.0)
                        .color(egui::Color32::from_rgb(80, 200, 80)),
                    );
                });

                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new("This action cannot be undone.")
                        .small()
                        .color(egui::Color32::from_rgb(200, 100, 100)),
                );
                ui.add_space(12.0);

                ui.columns(2, |cols| {
                    cols[0].vertical_centered(|ui| {
                        if ui
                            .add_sized([140.0, 32.0], egui::Button::new("Cancel"))
                            .clicked()
                        {
                            should_cancel = true;
                        }
                    });
                    cols[1].vertical_centered(|ui| {
                        if ui
                            .add_sized(
                                [140.0, 32.0],
                                egui::Button::new(
                                    egui::RichText::new("Delete Files")
                                        .strong()
                                        .color(egui::Color32::WHITE),
                                )
                                .fill(egui::Color32::from_rgb(200, 50, 50)),
                            )
                            .clicked()
                        {
                            should_delete = true;
                        }
                    });
                });
                ui.add_space(8.0);
            });

        if should_cancel {
            self.pending = None;
            self.status = "Deletion cancelled by user.".to_string();
        }
        if should_delete {
            if let Some(list) = self.pending.take() {
                self.start_delete(list);
            }
        }
    }

    fn render_warnings(&mut self, ui: &mut egui::Ui) {
        if self.warnings.is_empty() {
            return;
        }
        ui.add_space(4.0);
        let mut clear = false;
        egui::CollapsingHeader::new(
            egui::RichText::new(format!("Warnings ({})", self.warnings.len()))
                .color(egui::Color32::from_rgb(220, 150, 50)),
        )
        .default_open(false)
        .show(ui, |ui| {
            for warning in &self.warnings {
                ui.label(
                    egui::RichText::new(warning).color(egui::Color32::from_rgb(220, 100, 50)),
                );
            }
            clear = ui.small_button("Clear").clicked();
        });
        if clear {
            self.warnings.clear();
        }
    }
}

impl eframe::App for VisioTidyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();

        if self.phase != AppPhase::Idle {
            ctx.request_repaint();
        }

        if self.pending.is_some() {
            self.render_confirm_dialog(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            self.render_action_bar(ui);
            ui.separator();
            self.render_file_list(ui);
            ui.separator();
            self.render_summary(ui);
            self.render_warnings(ui);
        });
    }
}

/// Open the desktop window and block until it is closed.
pub fn run(settings: Settings) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Visio Tidy")
            .with_inner_size([820.0, 560.0])
            .with_min_inner_size([560.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Visio Tidy",
        options,
        Box::new(|cc| Ok(Box::new(VisioTidyApp::new(cc, settings)))),
    )
}
