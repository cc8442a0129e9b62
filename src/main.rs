mod app;

use app::TutorApp;
use clap::Parser;
use tracing::{debug, info};
use tutor_app::config::Config;
use tutor_app::database::db;
use tutor_app::error::{Error, Result};
use tutor_app::logging;
use tutor_app::models::{Flashcard, Language, Lesson};

fn sample_lesson() -> Lesson {
    Lesson {
        title: "Hebrew Greetings".to_string(),
        language: Language::Hebrew,
        description: Some("Everyday greetings and courtesies".to_string()),
        vocabulary: vec![
            Flashcard::new("שָׁלוֹם", "hello; peace").with_transliteration("shalom"),
            Flashcard::new("תּוֹדָה", "thank you").with_transliteration("todah"),
            Flashcard::new("בְּבַקָּשָׁה", "please; you're welcome").with_transliteration("bevakasha"),
            Flashcard::new("בֹּקֶר טוֹב", "good morning").with_transliteration("boker tov"),
        ],
    }
}

fn main() -> Result<()> {
    let config = Config::parse();
    logging::init_tracing(&config.log_level);

    let mut conn = db::open_database(&config.database)?;

    if !config.no_sample_data && db::get_all_lesson_titles(&conn)?.is_empty() {
        db::import_lesson(&sample_lesson(), &mut conn)?;
        info!("sample lesson created");
    }

    let catalog = db::load_catalog(&conn)?;

    info!(
        lessons = catalog.lessons.len(),
        cards = catalog.total_cards(),
        "catalog loaded"
    );
    for lesson in &catalog.lessons {
        debug!(title = %lesson.title, language = %lesson.language, cards = lesson.vocabulary.len());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Hebrew Tutor",
        options,
        Box::new(move |_cc| Ok(Box::new(TutorApp::new_with_catalog(catalog, conn)))),
    )
    .map_err(|e| Error::Gui(e.to_string()))
}
