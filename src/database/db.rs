//! Database operations for the tutor
//!
//! Handles SQLite schema setup, lesson/card CRUD, review record storage
//! and the persisted app state (study clock offset, XP total).

use crate::error::{Error, Result};
use crate::models::{Flashcard, Lesson, LessonCatalog, ReviewRecord, fsrs};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

const CLOCK_OFFSET_KEY: &str = "clock_offset_secs";
const TOTAL_XP_KEY: &str = "total_xp";

/// Opens (or creates) the database file and ensures the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_database(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Creates tables for lessons, cards, review records and app state.
/// Safe to call on an already initialized database.
pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lessons (
            title TEXT PRIMARY KEY,
            language TEXT NOT NULL,
            description TEXT
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lesson_title TEXT NOT NULL,
            term TEXT NOT NULL,
            transliteration TEXT,
            definition TEXT NOT NULL,
            FOREIGN KEY (lesson_title) REFERENCES lessons(title) ON DELETE CASCADE,
            UNIQUE(lesson_title, term)
        )",
        (),
    )?;

    // Timestamps are unix milliseconds; the shortest interval is one hour
    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_records (
            card_id INTEGER PRIMARY KEY,
            stability REAL NOT NULL,
            difficulty REAL NOT NULL,
            last_reviewed INTEGER,
            next_review_due INTEGER NOT NULL,
            reps INTEGER NOT NULL DEFAULT 0,
            lapses INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES (?1, '0')",
        params![CLOCK_OFFSET_KEY],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES (?1, '0')",
        params![TOTAL_XP_KEY],
    )?;

    Ok(())
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or(Error::InvalidTimestamp(ms))
}

fn get_state(key: &str, conn: &Connection) -> Result<String> {
    let value = conn.query_row(
        "SELECT value FROM app_state WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )?;
    Ok(value)
}

/// Reads an app_state value and parses it, failing on values that do not parse
fn get_parsed_state<T: FromStr>(key: &str, conn: &Connection) -> Result<T> {
    let value = get_state(key, conn)?;
    value.trim().parse::<T>().map_err(|_| Error::CorruptState {
        key: key.to_string(),
        value,
    })
}

fn set_state(key: &str, value: &str, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Returns the study clock: wall-clock time shifted by the persisted offset
pub fn get_current_date(conn: &Connection) -> Result<DateTime<Utc>> {
    let offset: i64 = get_parsed_state(CLOCK_OFFSET_KEY, conn)?;
    Ok(Utc::now() + Duration::seconds(offset))
}

/// Moves the study clock forward by 24 hours
pub fn advance_day(conn: &Connection) -> Result<()> {
    let offset: i64 = get_parsed_state(CLOCK_OFFSET_KEY, conn)?;
    let next = offset + Duration::days(1).num_seconds();
    set_state(CLOCK_OFFSET_KEY, &next.to_string(), conn)?;
    debug!(offset_secs = next, "study clock advanced one day");
    Ok(())
}

/// Creates a lesson row without vocabulary
pub fn new_lesson(lesson: &Lesson, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO lessons (title, language, description) VALUES (?1, ?2, ?3)",
        params![lesson.title, lesson.language.as_str(), lesson.description],
    )?;
    info!(title = %lesson.title, language = %lesson.language, "lesson created");
    Ok(())
}

/// Adds a card to a lesson and seeds its review record
///
/// Returns the card ID. A card with the same lesson + term is left as is,
/// together with its existing review record.
pub fn add_card(lesson_title: &str, card: &Flashcard, conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO cards (lesson_title, term, transliteration, definition)
         VALUES (?1, ?2, ?3, ?4)",
        params![lesson_title, card.term, card.transliteration, card.definition],
    )?;

    let card_id: i64 = conn.query_row(
        "SELECT id FROM cards WHERE lesson_title = ?1 AND term = ?2",
        params![lesson_title, card.term],
        |row| row.get(0),
    )?;

    let now = get_current_date(conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO review_records
            (card_id, stability, difficulty, last_reviewed, next_review_due, reps, lapses)
         VALUES (?1, ?2, ?3, NULL, ?4, 0, 0)",
        params![
            card_id,
            fsrs::initial_stability(),
            fsrs::initial_difficulty(),
            now.timestamp_millis()
        ],
    )?;

    Ok(card_id)
}

/// Validates and stores a whole lesson in one transaction
pub fn import_lesson(lesson: &Lesson, conn: &mut Connection) -> Result<()> {
    lesson.validate()?;

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lessons WHERE title = ?1)",
        params![lesson.title],
        |row| row.get(0),
    )?;
    if exists {
        return Err(Error::DuplicateLesson(lesson.title.clone()));
    }

    let tx = conn.transaction()?;
    new_lesson(lesson, &tx)?;
    for card in &lesson.vocabulary {
        add_card(&lesson.title, card, &tx)?;
    }
    tx.commit()?;

    info!(
        title = %lesson.title,
        cards = lesson.vocabulary.len(),
        "lesson imported"
    );
    Ok(())
}

/// Retrieves all cards of a lesson as (card_id, Flashcard) pairs
pub fn get_cards_for_lesson(lesson_title: &str, conn: &Connection) -> Result<Vec<(i64, Flashcard)>> {
    let mut stmt = conn.prepare(
        "SELECT id, term, transliteration, definition FROM cards
         WHERE lesson_title = ?1 ORDER BY id",
    )?;

    let cards = stmt
        .query_map(params![lesson_title], |row| {
            Ok((
                row.get(0)?,
                Flashcard {
                    term: row.get(1)?,
                    transliteration: row.get(2)?,
                    definition: row.get(3)?,
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<(i64, Flashcard)>>>()?;

    Ok(cards)
}

/// Raw review_records columns; converted once the row iterator is done
type RecordRow = (i64, f64, f64, Option<i64>, i64, u32, u32);

fn record_from_row(row: RecordRow) -> Result<ReviewRecord> {
    let (card_id, stability, difficulty, last_reviewed, next_review_due, reps, lapses) = row;
    Ok(ReviewRecord {
        card_id,
        stability,
        difficulty,
        last_reviewed: last_reviewed.map(from_millis).transpose()?,
        next_review_due: from_millis(next_review_due)?,
        reps,
        lapses,
    })
}

pub fn get_review_record(card_id: i64, conn: &Connection) -> Result<ReviewRecord> {
    let row: Option<RecordRow> = conn
        .query_row(
            "SELECT card_id, stability, difficulty, last_reviewed, next_review_due, reps, lapses
             FROM review_records WHERE card_id = ?1",
            params![card_id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some(row) => record_from_row(row),
        None => Err(Error::NotFound(format!("review record for card {}", card_id))),
    }
}

/// Writes a rated review record back to the database
pub fn update_review_record(record: &ReviewRecord, conn: &Connection) -> Result<()> {
    let updated = conn.execute(
        "UPDATE review_records
         SET stability = ?1, difficulty = ?2, last_reviewed = ?3, next_review_due = ?4,
             reps = ?5, lapses = ?6
         WHERE card_id = ?7",
        params![
            record.stability,
            record.difficulty,
            record.last_reviewed.map(|t| t.timestamp_millis()),
            record.next_review_due.timestamp_millis(),
            record.reps,
            record.lapses,
            record.card_id
        ],
    )?;

    if updated == 0 {
        return Err(Error::NotFound(format!("review record for card {}", record.card_id)));
    }
    Ok(())
}

/// Retrieves cards of a lesson that are due on the study clock
///
/// Ordered by next_review_due (oldest first).
pub fn get_cards_due_for_review(
    lesson_title: &str,
    conn: &Connection,
) -> Result<Vec<(i64, Flashcard, ReviewRecord)>> {
    let now = get_current_date(conn)?;

    let mut stmt = conn.prepare(
        "SELECT c.id, c.term, c.transliteration, c.definition,
                r.stability, r.difficulty, r.last_reviewed, r.next_review_due, r.reps, r.lapses
         FROM cards c
         JOIN review_records r ON c.id = r.card_id
         WHERE c.lesson_title = ?1 AND r.next_review_due <= ?2
         ORDER BY r.next_review_due ASC, c.id ASC",
    )?;

    let rows = stmt
        .query_map(params![lesson_title, now.timestamp_millis()], |row| {
            let id: i64 = row.get(0)?;
            let card = Flashcard {
                term: row.get(1)?,
                transliteration: row.get(2)?,
                definition: row.get(3)?,
            };
            let record: RecordRow = (
                id,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
            );
            Ok((id, card, record))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(id, card, record)| record_from_row(record).map(|r| (id, card, r)))
        .collect()
}

/// Retrieves all lesson titles in creation order
pub fn get_all_lesson_titles(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT title FROM lessons ORDER BY rowid")?;
    let titles = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(titles)
}

/// Loads all lessons with their vocabulary into memory
///
/// Review records are not loaded; they are fetched when a session starts.
pub fn load_catalog(conn: &Connection) -> Result<LessonCatalog> {
    let mut stmt =
        conn.prepare("SELECT title, language, description FROM lessons ORDER BY rowid")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut lessons = Vec::new();

    for (title, language, description) in rows {
        let vocabulary = get_cards_for_lesson(&title, conn)?
            .into_iter()
            .map(|(_, card)| card)
            .collect();

        lessons.push(Lesson {
            title,
            language: language.parse()?,
            description,
            vocabulary,
        });
    }

    Ok(LessonCatalog { lessons })
}

pub fn get_total_xp(conn: &Connection) -> Result<u64> {
    get_parsed_state(TOTAL_XP_KEY, conn)
}

/// Adds XP to the learner's total and returns the new total
pub fn add_xp(amount: u64, conn: &Connection) -> Result<u64> {
    let total = get_total_xp(conn)?.saturating_add(amount);
    set_state(TOTAL_XP_KEY, &total.to_string(), conn)?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, Rating};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        conn
    }

    fn greetings() -> Lesson {
        Lesson {
            title: "Greetings".to_string(),
            language: Language::Hebrew,
            description: Some("First words".to_string()),
            vocabulary: vec![
                Flashcard::new("שָׁלוֹם", "hello").with_transliteration("shalom"),
                Flashcard::new("תּוֹדָה", "thank you").with_transliteration("todah"),
                Flashcard::new("בְּבַקָּשָׁה", "please"),
            ],
        }
    }

    #[test]
    fn test_init_is_idempotent() {
        let conn = memory_db();
        init_database(&conn).unwrap();
        assert_eq!(get_total_xp(&conn).unwrap(), 0);
    }

    #[test]
    fn test_import_and_load_catalog() {
        let mut conn = memory_db();
        import_lesson(&greetings(), &mut conn).unwrap();

        assert_eq!(get_all_lesson_titles(&conn).unwrap(), vec!["Greetings"]);

        let catalog = load_catalog(&conn).unwrap();
        let lesson = catalog.find("Greetings").unwrap();
        assert_eq!(lesson.vocabulary.len(), 3);
        assert_eq!(lesson.description.as_deref(), Some("First words"));
        assert_eq!(lesson.vocabulary[0].transliteration.as_deref(), Some("shalom"));
        assert_eq!(lesson.vocabulary[2].transliteration, None);
    }

    #[test]
    fn test_duplicate_import_rejected() {
        let mut conn = memory_db();
        import_lesson(&greetings(), &mut conn).unwrap();
        let err = import_lesson(&greetings(), &mut conn).unwrap_err();
        assert!(matches!(err, Error::DuplicateLesson(ref t) if t == "Greetings"));
    }

    #[test]
    fn test_invalid_import_writes_nothing() {
        let mut conn = memory_db();
        let mut lesson = greetings();
        lesson.vocabulary.push(Flashcard::new("שָׁלוֹם", "peace"));

        assert!(import_lesson(&lesson, &mut conn).is_err());
        assert!(get_all_lesson_titles(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_new_cards_are_seeded_and_due() {
        let mut conn = memory_db();
        import_lesson(&greetings(), &mut conn).unwrap();

        let due = get_cards_due_for_review("Greetings", &conn).unwrap();
        assert_eq!(due.len(), 3);
        for (id, _, record) in &due {
            assert_eq!(record.card_id, *id);
            assert_eq!(record.stability, fsrs::INITIAL_STABILITY);
            assert_eq!(record.difficulty, fsrs::INITIAL_DIFFICULTY);
            assert_eq!(record.last_reviewed, None);
        }
    }

    #[test]
    fn test_add_card_twice_keeps_record() {
        let conn = memory_db();
        let lesson = Lesson::new("Numbers", Language::Aramaic);
        new_lesson(&lesson, &conn).unwrap();

        let card = Flashcard::new("חַד", "one");
        let id = add_card("Numbers", &card, &conn).unwrap();

        let mut record = get_review_record(id, &conn).unwrap();
        record.apply(Rating::Easy, get_current_date(&conn).unwrap());
        update_review_record(&record, &conn).unwrap();

        let again = add_card("Numbers", &card, &conn).unwrap();
        assert_eq!(id, again);
        assert_eq!(get_review_record(id, &conn).unwrap().reps, 1);
    }

    #[test]
    fn test_rated_card_leaves_due_list_until_clock_advances() {
        let mut conn = memory_db();
        import_lesson(&greetings(), &mut conn).unwrap();

        let (id, _, mut record) = get_cards_due_for_review("Greetings", &conn)
            .unwrap()
            .remove(0);
        record.apply(Rating::Good, get_current_date(&conn).unwrap());
        update_review_record(&record, &conn).unwrap();

        let stored = get_review_record(id, &conn).unwrap();
        assert_eq!(stored.reps, 1);
        assert!((stored.stability - record.stability).abs() < 1e-12);
        assert_eq!(
            stored.next_review_due.timestamp_millis(),
            record.next_review_due.timestamp_millis()
        );

        assert_eq!(get_cards_due_for_review("Greetings", &conn).unwrap().len(), 2);

        for _ in 0..4 {
            advance_day(&conn).unwrap();
        }
        assert_eq!(get_cards_due_for_review("Greetings", &conn).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let conn = memory_db();
        assert!(matches!(get_review_record(42, &conn), Err(Error::NotFound(_))));

        let record = ReviewRecord::new(42, Utc::now());
        assert!(matches!(update_review_record(&record, &conn), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_advance_day_moves_clock() {
        let conn = memory_db();
        let before = get_current_date(&conn).unwrap();
        advance_day(&conn).unwrap();
        let after = get_current_date(&conn).unwrap();
        assert!(after - before >= Duration::days(1));
        assert!(after - before < Duration::days(1) + Duration::minutes(1));
    }

    #[test]
    fn test_corrupt_xp_is_an_error() {
        let conn = memory_db();
        add_xp(500, &conn).unwrap();
        conn.execute("UPDATE app_state SET value = '500x' WHERE key = 'total_xp'", ())
            .unwrap();

        let err = add_xp(10, &conn).unwrap_err();
        assert!(matches!(err, Error::CorruptState { ref key, ref value }
            if key == "total_xp" && value == "500x"));
        assert!(get_total_xp(&conn).is_err());

        let stored: String = conn
            .query_row("SELECT value FROM app_state WHERE key = 'total_xp'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "500x");
    }

    #[test]
    fn test_corrupt_clock_offset_is_an_error() {
        let conn = memory_db();
        conn.execute(
            "UPDATE app_state SET value = 'tomorrow' WHERE key = 'clock_offset_secs'",
            (),
        )
        .unwrap();

        assert!(matches!(get_current_date(&conn), Err(Error::CorruptState { .. })));
        assert!(matches!(advance_day(&conn), Err(Error::CorruptState { .. })));
    }

    #[test]
    fn test_xp_accumulates() {
        let conn = memory_db();
        assert_eq!(add_xp(10, &conn).unwrap(), 10);
        assert_eq!(add_xp(15, &conn).unwrap(), 25);
        assert_eq!(get_total_xp(&conn).unwrap(), 25);
    }
}
