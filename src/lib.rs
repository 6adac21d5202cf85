// Maple Monster - Core Library
// Wiki scraping, storage and reporting used by the CLI and tests

pub mod config;
pub mod monster;
pub mod extractor;  // HTML → MonsterRecord
pub mod fetcher;    // HTTP GET
pub mod db;         // SQLite persistence + import log
pub mod report;     // Histogram chart + recommendations
pub mod prompt;
pub mod commands;   // Command dispatcher

// Re-export commonly used types
pub use config::Config;
pub use monster::{MonsterRecord, StoredMonster, PLACEHOLDER, parse_stat};
pub use extractor::FieldExtractor;
pub use fetcher::PageFetcher;
pub use db::{
    ImportEvent, InsertOutcome,
    open_database, setup_database, ensure_monster_table, insert_monster, find_by_name,
    get_all_monsters, get_levels, find_in_level_range, count_monsters,
    record_import, get_import_for_monster, validate_table_name,
};
pub use report::{
    LevelHistogram, render_chart, recommend, level_window,
    BUCKET_COUNT, BUCKET_WIDTH, RECOMMEND_RADIUS,
};
pub use prompt::{Prompt, LinePrompt};
pub use commands::{Command, dispatch, run};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
