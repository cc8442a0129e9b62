pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod transfer;

pub use error::{Error, Result};
pub use models::{Flashcard, Language, LearningSession, Lesson, LessonCatalog, Rating, ReviewRecord};
