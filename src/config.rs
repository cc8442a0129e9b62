//! Command-line / environment configuration.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "tutor")]
#[command(about = "Hebrew, Yiddish and Aramaic vocabulary tutor with spaced repetition")]
#[command(version)]
pub struct Config {
    /// SQLite file holding lessons, cards and review records
    #[arg(short, long, default_value = "db.sqlite3", env = "TUTOR_DATABASE")]
    pub database: PathBuf,

    /// Tracing filter directive, e.g. "info" or "tutor_app=debug"
    #[arg(long, default_value = "info", env = "TUTOR_LOG")]
    pub log_level: String,

    /// Do not create the sample lesson when the database is empty
    #[arg(long)]
    pub no_sample_data: bool,
}
