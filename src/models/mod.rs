pub mod catalog;
pub mod flashcard;
pub mod fsrs;
pub mod learning_card;
pub mod learning_session;
pub mod lesson;
pub mod rating;
pub mod review_record;
pub mod xp;

pub use catalog::LessonCatalog;
pub use flashcard::Flashcard;
pub use learning_card::LearningCard;
pub use learning_session::{GradeResult, LearningSession};
pub use lesson::{Language, Lesson};
pub use rating::Rating;
pub use review_record::ReviewRecord;
