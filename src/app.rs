//! Main application UI and state management.
//! Handles lesson management, lesson import/export and review sessions.

use chrono::{DateTime, Local, Utc};
use eframe::egui;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, warn};
use tutor_app::database::db;
use tutor_app::error::{Error, Result};
use tutor_app::models::fsrs::{format_interval, preview_intervals};
use tutor_app::models::xp::{self, SESSION_COMPLETE_BONUS};
use tutor_app::models::{Flashcard, Language, LearningSession, Lesson, LessonCatalog, Rating};
use tutor_app::transfer::json::{export_lesson_to_path, import_lesson};

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Review,
}

/// Main application state
pub struct TutorApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    catalog: LessonCatalog,
    selected_lesson_index: Option<usize>,
    current_term: String,
    current_transliteration: String,
    current_definition: String,
    new_lesson_title: String,
    new_lesson_language: Language,
    conn: Arc<Mutex<Connection>>,

    current_screen: AppScreen,
    learning_session: Option<LearningSession>,
    last_grade_message: String,

    current_date_display: String,
    total_xp: u64,

    show_export_dialog: bool,
    show_result_dialog: bool,
    result_message: String,
}

fn format_study_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

impl eframe::App for TutorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
        }

        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_export_dialog {
            let mut export_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Lesson")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a lesson to export:");
                    ui.separator();

                    for (i, lesson) in self.catalog.lessons.iter().enumerate() {
                        if ui
                            .button(format!("{} ({} cards)", lesson.title, lesson.vocabulary.len()))
                            .clicked()
                        {
                            export_index = Some(i);
                        }
                    }

                    ui.separator();

                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if self.show_result_dialog {
            egui::Window::new("Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.result_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_result_dialog = false;
                    }
                });
        }
    }
}

impl TutorApp {
    /// Creates the application with lessons loaded from the database
    pub fn new_with_catalog(catalog: LessonCatalog, conn: Connection) -> Self {
        let has_lessons = !catalog.lessons.is_empty();
        let mut app = Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            catalog,
            selected_lesson_index: if has_lessons { Some(0) } else { None },
            current_term: String::new(),
            current_transliteration: String::new(),
            current_definition: String::new(),
            new_lesson_title: String::new(),
            new_lesson_language: Language::Hebrew,
            conn: Arc::new(Mutex::new(conn)),
            current_screen: AppScreen::Main,
            learning_session: None,
            last_grade_message: String::new(),
            current_date_display: "Unknown".to_string(),
            total_xp: 0,
            show_export_dialog: false,
            show_result_dialog: false,
            result_message: String::new(),
        };
        app.refresh_status();
        app
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::StoragePoisoned)
    }

    fn show_message(&mut self, message: String) {
        self.result_message = message;
        self.show_result_dialog = true;
    }

    /// Re-reads the study clock and XP total
    fn refresh_status(&mut self) {
        let status = self.lock_conn().and_then(|conn| {
            Ok((db::get_current_date(&conn)?, db::get_total_xp(&conn)?))
        });
        match status {
            Ok((date, total_xp)) => {
                self.current_date_display = format_study_time(date);
                self.total_xp = total_xp;
            }
            Err(e) => warn!("failed to read app status: {}", e),
        }
    }

    /// Renders the main screen with lesson management
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        let mut action_next_day = false;
        let mut action_import = false;
        let mut action_create_lesson = false;
        let mut action_add_card = false;
        let mut action_select: Option<usize> = None;
        let mut action_review: Option<usize> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.current_date_display);
                if ui.button("Next Day").clicked() {
                    action_next_day = true;
                }
            });

            let level = xp::level_for_xp(self.total_xp);
            ui.horizontal(|ui| {
                ui.label(format!(
                    "Level {} ({}) | {} XP",
                    level.level, level.title, self.total_xp
                ));
            });
            match xp::progress_to_next_level(self.total_xp) {
                Some((earned, span)) => {
                    ui.add(
                        egui::ProgressBar::new(earned as f32 / span as f32)
                            .text(format!("{} / {} XP to next level", earned, span)),
                    );
                }
                None => {
                    ui.label("Maximum level reached");
                }
            }
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Export Lesson").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Lesson").clicked() {
                    action_import = true;
                }
            });

            ui.separator();

            ui.heading("Create New Lesson");
            ui.horizontal(|ui| {
                ui.label("Title:");
                ui.text_edit_singleline(&mut self.new_lesson_title);
            });
            ui.horizontal(|ui| {
                egui::ComboBox::from_label("Language")
                    .selected_text(self.new_lesson_language.as_str())
                    .show_ui(ui, |ui| {
                        for language in [Language::Hebrew, Language::Yiddish, Language::Aramaic] {
                            ui.selectable_value(
                                &mut self.new_lesson_language,
                                language,
                                language.as_str(),
                            );
                        }
                    });
                if ui.button("Create Lesson").clicked() {
                    action_create_lesson = true;
                }
            });

            ui.separator();

            ui.heading(format!("Lessons ({})", self.catalog.lessons.len()));

            egui::ScrollArea::vertical()
                .id_source("lessons_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for (i, lesson) in self.catalog.lessons.iter().enumerate() {
                        let is_selected = self.selected_lesson_index == Some(i);

                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!(
                                        "{}. {} [{}] ({} cards)",
                                        i + 1,
                                        lesson.title,
                                        lesson.language,
                                        lesson.vocabulary.len()
                                    ),
                                )
                                .clicked()
                            {
                                action_select = Some(i);
                            }

                            if ui.button("Review").clicked() {
                                action_review = Some(i);
                            }
                        });
                    }
                });

            ui.separator();

            let selected = self
                .selected_lesson_index
                .and_then(|i| self.catalog.lessons.get(i));
            if let Some(lesson) = selected {
                ui.heading(format!("Selected Lesson: {}", lesson.title));
                if let Some(description) = &lesson.description {
                    ui.label(description);
                }

                ui.horizontal(|ui| {
                    ui.label("Term:");
                    ui.text_edit_singleline(&mut self.current_term);
                });
                ui.horizontal(|ui| {
                    ui.label("Transliteration:");
                    ui.text_edit_singleline(&mut self.current_transliteration);
                });
                ui.horizontal(|ui| {
                    ui.label("Definition:");
                    ui.text_edit_singleline(&mut self.current_definition);
                });
                if ui.button("Add Card").clicked() {
                    action_add_card = true;
                }

                ui.separator();

                ui.heading(format!("Cards ({})", lesson.vocabulary.len()));

                egui::ScrollArea::vertical()
                    .id_source("cards_list")
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for (i, card) in lesson.vocabulary.iter().enumerate() {
                            ui.group(|ui| {
                                match &card.transliteration {
                                    Some(t) => ui.label(format!("{}. {} ({})", i + 1, card.term, t)),
                                    None => ui.label(format!("{}. {}", i + 1, card.term)),
                                };
                                ui.label(format!("   Definition: {}", card.definition));
                            });
                        }
                    });
            } else {
                ui.label("Select a lesson to add cards");
            }
        });

        if action_next_day {
            if let Err(e) = self.lock_conn().and_then(|conn| db::advance_day(&conn)) {
                error!("failed to advance study clock: {}", e);
            }
            self.refresh_status();
        }
        if action_import {
            self.handle_import();
        }
        if action_create_lesson {
            self.create_lesson();
        }
        if let Some(i) = action_select {
            self.selected_lesson_index = Some(i);
        }
        if action_add_card {
            self.add_card_to_selected();
        }
        if let Some(i) = action_review {
            self.start_review_session(i);
        }
    }

    fn create_lesson(&mut self) {
        let title = self.new_lesson_title.trim().to_string();
        if title.is_empty() {
            return;
        }
        if self.catalog.contains(&title) {
            self.show_message(format!("Lesson '{}' already exists!", title));
            return;
        }

        let lesson = Lesson::new(&title, self.new_lesson_language);
        let result = self.lock_conn().and_then(|conn| db::new_lesson(&lesson, &conn));
        match result {
            Ok(()) => {
                self.catalog.lessons.push(lesson);
                self.selected_lesson_index = Some(self.catalog.lessons.len() - 1);
                self.new_lesson_title.clear();
            }
            Err(e) => self.show_message(format!("Failed to create lesson: {}", e)),
        }
    }

    fn add_card_to_selected(&mut self) {
        let term = self.current_term.trim();
        let definition = self.current_definition.trim();
        if term.is_empty() || definition.is_empty() {
            return;
        }

        let mut card = Flashcard::new(term, definition);
        let transliteration = self.current_transliteration.trim();
        if !transliteration.is_empty() {
            card = card.with_transliteration(transliteration);
        }

        let Some(index) = self.selected_lesson_index else {
            return;
        };
        let Some(title) = self.catalog.lessons.get(index).map(|l| l.title.clone()) else {
            return;
        };

        let result = self
            .lock_conn()
            .and_then(|conn| db::add_card(&title, &card, &conn));
        match result {
            Ok(_) => {
                if let Some(lesson) = self.catalog.lessons.get_mut(index) {
                    if !lesson.vocabulary.iter().any(|c| c.term == card.term) {
                        lesson.vocabulary.push(card);
                    }
                }
                self.current_term.clear();
                self.current_transliteration.clear();
                self.current_definition.clear();
            }
            Err(e) => self.show_message(format!("Failed to add card: {}", e)),
        }
    }

    /// Renders the review screen
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        let mut action_toggle_def = false;
        let mut action_grade: Option<Rating> = None;
        let mut action_back = false;
        let mut bonus: Option<Result<Option<u64>>> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &mut self.learning_session else {
                action_back = true;
                return;
            };

            ui.heading(format!("Reviewing: {}", session.lesson_title));
            ui.label(session.phase_message());
            ui.label(format!(
                "Progress: {} / {} learned ({} remaining)",
                session.learned_count(),
                session.total_count(),
                session.remaining_count()
            ));
            if !self.last_grade_message.is_empty() {
                ui.label(&self.last_grade_message);
            }

            ui.add_space(20.0);

            if session.is_completed() {
                bonus = Some(session.claim_completion_bonus());

                ui.heading("Kol hakavod!");
                ui.label(format!(
                    "All due cards reviewed. XP earned this session: {}",
                    session.xp_earned
                ));

                ui.add_space(20.0);

                if ui.button("Back to Main Screen").clicked() {
                    action_back = true;
                }
            } else if let Some(card) = session.current_card() {
                let show_def = session.show_definition;

                ui.group(|ui| {
                    ui.set_min_height(200.0);
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);

                        ui.heading("Term:");
                        ui.label(egui::RichText::new(&card.flashcard.term).size(32.0));
                        if let Some(t) = &card.flashcard.transliteration {
                            ui.label(t);
                        }
                        if let Some(last) = card.last_rating {
                            ui.label(format!("Last time: {}", last.label()));
                        }

                        ui.add_space(20.0);

                        if show_def {
                            ui.heading("Definition:");
                            ui.label(&card.flashcard.definition);
                        } else {
                            ui.label("(Click 'Show Definition' to reveal)");
                        }

                        ui.add_space(20.0);
                    });
                });

                ui.add_space(20.0);

                if !show_def && ui.button("Show Definition").clicked() {
                    action_toggle_def = true;
                }

                // Rating buttons appear once the definition is revealed
                if show_def {
                    ui.label("How well did you recall it?");
                    ui.horizontal(|ui| {
                        for (rating, interval) in preview_intervals() {
                            let label = format!("{} ({})", rating.label(), format_interval(interval));
                            if ui.button(label).clicked() {
                                action_grade = Some(rating);
                            }
                        }
                    });
                }

                ui.add_space(20.0);

                if ui.button("Back to Main Screen").clicked() {
                    action_back = true;
                }
            }
        });

        if action_toggle_def {
            if let Some(session) = &mut self.learning_session {
                session.toggle_definition();
            }
        }

        if let Some(rating) = action_grade {
            self.grade(rating);
        }

        match bonus {
            Some(Ok(Some(total))) => {
                self.total_xp = total;
                self.last_grade_message = format!("Session complete! +{} XP bonus", SESSION_COMPLETE_BONUS);
            }
            Some(Err(e)) => {
                error!("failed to award session bonus: {}", e);
                self.show_message(format!("Failed to award session bonus: {}", e));
            }
            _ => {}
        }

        if action_back {
            self.current_screen = AppScreen::Main;
            self.learning_session = None;
            self.last_grade_message.clear();
            self.refresh_status();
        }
    }

    fn grade(&mut self, rating: Rating) {
        let Some(session) = &mut self.learning_session else {
            return;
        };

        match session.grade_current_card(rating) {
            Ok(Some(result)) => {
                session.next_card();
                self.total_xp = result.total_xp;
                self.last_grade_message = format!(
                    "Next review in {} (+{} XP)",
                    format_interval(result.outcome.next_interval),
                    result.xp_awarded
                );
            }
            Ok(None) => session.next_card(),
            Err(e) => {
                error!("failed to grade card: {}", e);
                self.show_message(format!("Failed to save review: {}", e));
            }
        }
    }

    /// Starts a review session with the lesson's due cards
    fn start_review_session(&mut self, lesson_index: usize) {
        let Some(title) = self.catalog.lessons.get(lesson_index).map(|l| l.title.clone()) else {
            return;
        };

        let due_cards = self
            .lock_conn()
            .and_then(|conn| db::get_cards_due_for_review(&title, &conn));

        match due_cards {
            Ok(cards) if cards.is_empty() => {
                self.show_message(format!("No cards in '{}' are due for review.", title));
            }
            Ok(cards) => {
                self.learning_session = Some(LearningSession::new_from_due_cards(
                    title,
                    cards,
                    Arc::clone(&self.conn),
                ));
                self.last_grade_message.clear();
                self.current_screen = AppScreen::Review;
            }
            Err(e) => self.show_message(format!("Failed to load due cards: {}", e)),
        }
    }

    fn handle_export(&mut self, lesson_index: usize) {
        self.show_export_dialog = false;

        let Some(lesson) = self.catalog.lessons.get(lesson_index) else {
            return;
        };

        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", lesson.title))
            .add_filter("JSON files", &["json"])
            .save_file()
        {
            let message = match export_lesson_to_path(lesson, &path) {
                Ok(()) => format!("Lesson '{}' exported successfully!", lesson.title),
                Err(e) => format!("Export failed: {}", e),
            };
            self.show_message(message);
        }
    }

    fn import_from_path(&self, path: &Path) -> Result<Lesson> {
        let lesson = import_lesson(path)?;
        if self.catalog.contains(&lesson.title) {
            return Err(Error::DuplicateLesson(lesson.title));
        }
        let mut conn = self.lock_conn()?;
        db::import_lesson(&lesson, &mut conn)?;
        Ok(lesson)
    }

    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        match self.import_from_path(&path) {
            Ok(lesson) => {
                let message = format!(
                    "Lesson '{}' imported successfully with {} cards!",
                    lesson.title,
                    lesson.vocabulary.len()
                );
                self.catalog.lessons.push(lesson);
                self.show_message(message);
            }
            Err(e) => {
                warn!("lesson import failed: {}", e);
                self.show_message(format!(
                    "Import failed: {}\n\nExpected structure:\n{{\n  \"title\": \"Lesson Title\",\n  \"language\": \"hebrew\",\n  \"vocabulary\": [{{ \"term\": \"...\", \"definition\": \"...\" }}]\n}}",
                    e
                ));
            }
        }
    }
}
