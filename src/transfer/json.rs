//! JSON import/export for lessons.
//! The file format is the lesson JSON accepted by the admin import.

use crate::error::Result;
use crate::models::Lesson;
use std::fs;
use std::path::Path;
use tracing::info;

/// Parses and validates lesson JSON.
pub fn parse_lesson(json: &str) -> Result<Lesson> {
    let lesson: Lesson = serde_json::from_str(json)?;
    lesson.validate()?;
    Ok(lesson)
}

/// Imports a lesson from a JSON file.
/// Returns an error if the file is missing, the JSON is malformed, or the lesson is invalid.
pub fn import_lesson(path: &Path) -> Result<Lesson> {
    let contents = fs::read_to_string(path)?;
    let lesson = parse_lesson(&contents)?;

    info!(
        title = %lesson.title,
        cards = lesson.vocabulary.len(),
        path = %path.display(),
        "lesson read from file"
    );
    Ok(lesson)
}

/// Exports a lesson to a pretty-printed JSON file.
pub fn export_lesson_to_path(lesson: &Lesson, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(lesson)?;
    fs::write(path, json_string)?;
    info!(title = %lesson.title, path = %path.display(), "lesson exported");
    Ok(())
}
