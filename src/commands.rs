// 🧭 Commands - one interactive command per run
// insert | visualize (visual) | recommend | list | export

use crate::config::Config;
use crate::db::{
    count_monsters, ensure_monster_table, get_all_monsters, get_import_for_monster, get_levels,
    insert_monster, open_database, setup_database, ImportEvent, InsertOutcome,
};
use crate::extractor::FieldExtractor;
use crate::fetcher::PageFetcher;
use crate::monster::{MonsterRecord, StoredMonster};
use crate::prompt::Prompt;
use crate::report::{level_window, recommend, render_chart, LevelHistogram};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

pub const COMMAND_PROMPT: &str = ">: ";
pub const URL_PROMPT: &str = "몬스터 데이터를 가져올 URL을 입력하세요 : ";
pub const LEVEL_PROMPT: &str = "추천받을 레벨을 입력하세요 : ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Insert,
    Visualize,
    Recommend,
    List,
    Export,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Insert => "insert",
            Command::Visualize => "visualize",
            Command::Recommend => "recommend",
            Command::List => "list",
            Command::Export => "export",
        }
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "insert" => Ok(Command::Insert),
            "visualize" | "visual" => Ok(Command::Visualize),
            "recommend" => Ok(Command::Recommend),
            "list" => Ok(Command::List),
            "export" => Ok(Command::Export),
            other => Err(anyhow!("Unknown command: {:?}", other)),
        }
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

/// One run of the tool: read the command word (argument or prompt), then
/// dispatch it. Every failure, prompt included, comes back as `Err` for the
/// caller to report.
pub async fn run(
    config: &Config,
    command: Option<String>,
    value: Option<String>,
    prompt: &mut dyn Prompt,
) -> Result<()> {
    let input = value_or_ask(command, prompt, COMMAND_PROMPT)?;
    dispatch(config, &input, value, prompt).await
}

/// Route one command word. `value` is the URL or target level when it was
/// given on the command line; otherwise it is prompted for.
/// Unknown commands are reported and are not an error.
pub async fn dispatch(
    config: &Config,
    input: &str,
    value: Option<String>,
    prompt: &mut dyn Prompt,
) -> Result<()> {
    let command = match input.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            println!("❓ {}", e);
            println!("   Commands: insert, visualize, recommend, list, export");
            return Ok(());
        }
    };
    log::debug!("Dispatching '{}'", command.name());

    match command {
        Command::Insert => {
            let url = value_or_ask(value, prompt, URL_PROMPT)?;
            run_insert(config, &url).await?;
        }
        Command::Visualize => {
            run_visualize(config)?;
        }
        Command::Recommend => {
            let raw = value_or_ask(value, prompt, LEVEL_PROMPT)?;
            let target: i64 = raw
                .parse()
                .with_context(|| format!("Target level must be a whole number, got {:?}", raw))?;
            run_recommend(config, target)?;
        }
        Command::List => {
            run_list(config)?;
        }
        Command::Export => {
            run_export(config)?;
        }
    }

    Ok(())
}

fn value_or_ask(value: Option<String>, prompt: &mut dyn Prompt, message: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => prompt.ask(message),
    }
}

// ============================================================================
// CONNECTION HANDLING
// Every command closes its connection explicitly, on success and on error.
// ============================================================================

/// Writers: WAL, monster table and import log
fn open_ready(config: &Config) -> Result<Connection> {
    let conn = open_database(&config.db_path)?;
    setup_database(&conn, &config.table)?;
    Ok(conn)
}

/// Reports: only the monster table has to exist
fn open_for_reports(config: &Config) -> Result<Connection> {
    let conn = open_database(&config.db_path)?;
    ensure_monster_table(&conn, &config.table)?;
    Ok(conn)
}

/// Close `conn`, then hand back the command's result (its error wins)
fn finish<T>(conn: Connection, result: Result<T>) -> Result<T> {
    let closed = conn
        .close()
        .map_err(|(_, e)| e)
        .context("Failed to close database");
    let value = result?;
    closed?;
    Ok(value)
}

// ============================================================================
// INSERT
// ============================================================================

/// Fetch one wiki page, extract its monster and store it once
pub async fn run_insert(config: &Config, url: &str) -> Result<InsertOutcome> {
    let mut conn = open_ready(config)?;
    let result = insert_from_page(&mut conn, config, url).await;
    finish(conn, result)
}

async fn insert_from_page(conn: &mut Connection, config: &Config, url: &str) -> Result<InsertOutcome> {
    println!("🌐 Fetching {}", url);
    let fetcher = PageFetcher::new(config)?;
    let html = fetcher
        .fetch(url)
        .await
        .context("failed to fetch monster data")?;

    let record = FieldExtractor::new()?.extract(&html);
    if record.is_nameless() {
        bail!("No monster name found on {}", url);
    }
    println!(
        "🔎 {} | level: {} | hp: {} | exp: {}",
        record.name, record.level, record.hp, record.exp
    );

    let outcome = insert_monster(conn, &config.table, &record, url)?;
    match outcome {
        InsertOutcome::Inserted { id } => {
            append_data_log(&config.data_log, &record)?;
            println!("✓ Inserted '{}' (id {})", record.name, id);
        }
        InsertOutcome::Duplicate => {
            println!("⚠️  '{}' is already stored, skipped", record.name);
        }
    }

    Ok(outcome)
}

/// Append one line per inserted monster to the plain-text log
pub fn append_data_log(path: &Path, record: &MonsterRecord) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open data log: {}", path.display()))?;

    writeln!(file, "{}", record.log_line(Utc::now()))
        .with_context(|| format!("Failed to write data log: {}", path.display()))?;

    Ok(())
}

// ============================================================================
// VISUALIZE
// ============================================================================

pub fn load_histogram(config: &Config) -> Result<LevelHistogram> {
    let conn = open_for_reports(config)?;
    let levels = get_levels(&conn, &config.table);
    let levels = finish(conn, levels)?;
    Ok(LevelHistogram::from_levels(levels))
}

pub fn run_visualize(config: &Config) -> Result<LevelHistogram> {
    let histogram = load_histogram(config)?;

    println!("📊 Level distribution ({} monsters)", histogram.total());
    for (label, count) in LevelHistogram::labels().iter().zip(histogram.counts()) {
        println!("   {:>8}: {}", label, count);
    }

    render_chart(&histogram, &config.chart_path)?;
    println!("✓ Chart saved to {}", config.chart_path.display());

    Ok(histogram)
}

// ============================================================================
// RECOMMEND
// ============================================================================

pub fn run_recommend(config: &Config, target: i64) -> Result<Vec<StoredMonster>> {
    let conn = open_for_reports(config)?;
    let monsters = recommend(&conn, &config.table, target);
    let monsters = finish(conn, monsters)?;

    let (low, high) = level_window(target);
    if monsters.is_empty() {
        println!("🔍 No monsters between level {} and {}", low, high);
    } else {
        println!("🎯 Monsters between level {} and {}:", low, high);
        for monster in &monsters {
            println!("   {}", monster.summary());
        }
    }

    Ok(monsters)
}

// ============================================================================
// LIST / EXPORT
// ============================================================================

/// Every stored monster with the page it was imported from
pub fn run_list(config: &Config) -> Result<Vec<(StoredMonster, Option<ImportEvent>)>> {
    let conn = open_ready(config)?;
    let listed = list_with_imports(&conn, &config.table);
    let (listed, total) = finish(conn, listed)?;

    for (monster, import) in &listed {
        println!("   #{} {}", monster.id, monster.summary());
        if let Some(import) = import {
            println!(
                "      ↳ {} ({})",
                import.source_url,
                import.imported_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    println!("✓ {} monsters stored", total);

    Ok(listed)
}

fn list_with_imports(
    conn: &Connection,
    table: &str,
) -> Result<(Vec<(StoredMonster, Option<ImportEvent>)>, i64)> {
    let mut listed = Vec::new();
    for monster in get_all_monsters(conn, table)? {
        let import = get_import_for_monster(conn, table, monster.id)?;
        listed.push((monster, import));
    }
    let total = count_monsters(conn, table)?;
    Ok((listed, total))
}

/// Write every stored monster to CSV; returns the row count
pub fn run_export(config: &Config) -> Result<usize> {
    let conn = open_for_reports(config)?;
    let monsters = get_all_monsters(&conn, &config.table);
    let monsters = finish(conn, monsters)?;

    let path = &config.export_path;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for monster in &monsters {
        writer.serialize(monster)?;
    }
    writer.flush()?;

    println!("✓ Exported {} monsters to {}", monsters.len(), path.display());
    Ok(monsters.len())
}
