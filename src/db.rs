use crate::monster::{MonsterRecord, StoredMonster};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result of a single insert attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New row written with this id
    Inserted { id: i64 },

    /// A row with the same name already exists; nothing written
    Duplicate,
}

// ============================================================================
// IMPORT LOG
// Stored rows keep only numbers; the import log keeps where a monster came
// from and the page text as it was scraped.
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportEvent {
    pub event_id: String,
    pub monster_table: String,
    pub monster_id: i64,
    pub source_url: String,
    pub scraped: MonsterRecord,
    pub imported_at: DateTime<Utc>,
}

impl ImportEvent {
    pub fn new(monster_table: &str, monster_id: i64, source_url: &str, scraped: &MonsterRecord) -> Self {
        ImportEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            monster_table: monster_table.to_string(),
            monster_id,
            source_url: source_url.to_string(),
            scraped: scraped.clone(),
            imported_at: Utc::now(),
        }
    }
}

/// Table names are spliced into SQL text, so only plain identifiers pass
pub fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(anyhow!("Invalid table name: {:?}", table))
    }
}

/// Open the database file (one connection per command)
pub fn open_database(path: &Path) -> Result<Connection> {
    Connection::open(path).with_context(|| format!("Failed to open database: {}", path.display()))
}

/// Full setup for commands that write: WAL, monster table, import log
pub fn setup_database(conn: &Connection, table: &str) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    log::debug!("journal_mode = {}", mode);

    ensure_monster_table(conn, table)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS import_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            monster_table TEXT NOT NULL,
            monster_id INTEGER NOT NULL,
            source_url TEXT NOT NULL,
            scraped TEXT NOT NULL,
            imported_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_import_events_monster
         ON import_events(monster_table, monster_id)",
        [],
    )?;

    Ok(())
}

/// Only the monster table; enough for the read-only reports
pub fn ensure_monster_table(conn: &Connection, table: &str) -> Result<()> {
    validate_table_name(table)?;

    // Name uniqueness is checked before insert, not by a constraint
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                level INTEGER,
                hp INTEGER,
                exp INTEGER,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )"
        ),
        [],
    )?;

    conn.execute(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_name ON {table}(name)"),
        [],
    )?;
    conn.execute(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_level ON {table}(level)"),
        [],
    )?;

    Ok(())
}

fn monster_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMonster> {
    Ok(StoredMonster {
        id: row.get(0)?,
        name: row.get(1)?,
        level: row.get(2)?,
        hp: row.get(3)?,
        exp: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Exact-name lookup used for duplicate detection
pub fn find_by_name(conn: &Connection, table: &str, name: &str) -> Result<Option<StoredMonster>> {
    let monster = conn
        .query_row(
            &format!(
                "SELECT id, name, level, hp, exp, created_at FROM {table}
                 WHERE name = ?1
                 LIMIT 1"
            ),
            params![name],
            monster_from_row,
        )
        .optional()?;

    Ok(monster)
}

/// Insert one monster unless its name is already stored.
///
/// The row and its import event are written in one transaction; any error
/// rolls both back and leaves the table as it was.
pub fn insert_monster(
    conn: &mut Connection,
    table: &str,
    record: &MonsterRecord,
    source_url: &str,
) -> Result<InsertOutcome> {
    if let Some(existing) = find_by_name(conn, table, &record.name)? {
        log::debug!("'{}' already stored as id {}", record.name, existing.id);
        return Ok(InsertOutcome::Duplicate);
    }

    let tx = conn.transaction()?;

    match write_monster(&tx, table, record, source_url) {
        Ok(id) => {
            tx.commit().context("Failed to commit monster insert")?;
            Ok(InsertOutcome::Inserted { id })
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                log::warn!("Rollback failed: {}", rollback_err);
            }
            Err(e.context(format!("Failed to insert monster '{}'", record.name)))
        }
    }
}

fn write_monster(
    conn: &Connection,
    table: &str,
    record: &MonsterRecord,
    source_url: &str,
) -> Result<i64> {
    conn.execute(
        &format!("INSERT INTO {table} (name, level, hp, exp) VALUES (?1, ?2, ?3, ?4)"),
        params![
            record.name,
            record.level_value(),
            record.hp_value(),
            record.exp_value(),
        ],
    )?;
    let id = conn.last_insert_rowid();

    record_import(conn, &ImportEvent::new(table, id, source_url, record))?;

    Ok(id)
}

pub fn record_import(conn: &Connection, event: &ImportEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO import_events (
            event_id, monster_table, monster_id, source_url, scraped, imported_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            event.monster_table,
            event.monster_id,
            event.source_url,
            serde_json::to_string(&event.scraped)?,
            event.imported_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

fn import_from_row(row: &Row<'_>) -> rusqlite::Result<ImportEvent> {
    let scraped_json: String = row.get(4)?;
    let imported_at: String = row.get(5)?;

    Ok(ImportEvent {
        event_id: row.get(0)?,
        monster_table: row.get(1)?,
        monster_id: row.get(2)?,
        source_url: row.get(3)?,
        scraped: serde_json::from_str(&scraped_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        imported_at: DateTime::parse_from_rfc3339(&imported_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
            .with_timezone(&Utc),
    })
}

/// Import event for one stored monster, if it was scraped by this tool
pub fn get_import_for_monster(
    conn: &Connection,
    table: &str,
    monster_id: i64,
) -> Result<Option<ImportEvent>> {
    let event = conn
        .query_row(
            "SELECT event_id, monster_table, monster_id, source_url, scraped, imported_at
             FROM import_events
             WHERE monster_table = ?1 AND monster_id = ?2
             ORDER BY id DESC
             LIMIT 1",
            params![table, monster_id],
            import_from_row,
        )
        .optional()?;

    Ok(event)
}

/// All stored monsters in storage order
pub fn get_all_monsters(conn: &Connection, table: &str) -> Result<Vec<StoredMonster>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, level, hp, exp, created_at FROM {table} ORDER BY id"
    ))?;

    let monsters = stmt
        .query_map([], monster_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(monsters)
}

/// Every non-NULL level, for the histogram
pub fn get_levels(conn: &Connection, table: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT level FROM {table} WHERE level IS NOT NULL ORDER BY id"
    ))?;

    let levels = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    Ok(levels)
}

/// Monsters with `low <= level <= high`, in storage order
pub fn find_in_level_range(
    conn: &Connection,
    table: &str,
    low: i64,
    high: i64,
) -> Result<Vec<StoredMonster>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, level, hp, exp, created_at FROM {table}
         WHERE level BETWEEN ?1 AND ?2
         ORDER BY id"
    ))?;

    let monsters = stmt
        .query_map(params![low, high], monster_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(monsters)
}

pub fn count_monsters(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monster::PLACEHOLDER;

    const TABLE: &str = "monster_";
    const URL: &str = "https://maplestory.fandom.com/ko/wiki/test";

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn, TABLE).unwrap();
        conn
    }

    fn insert(conn: &mut Connection, name: &str, level: &str) -> InsertOutcome {
        let record = MonsterRecord::new(name, level, "100", "10");
        insert_monster(conn, TABLE, &record, URL).unwrap()
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = test_db();
        setup_database(&conn, TABLE).unwrap();

        assert_eq!(count_monsters(&conn, TABLE).unwrap(), 0);
    }

    #[test]
    fn test_monster_table_only() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_monster_table(&conn, TABLE).unwrap();

        assert_eq!(count_monsters(&conn, TABLE).unwrap(), 0);
        let import_tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'import_events'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(import_tables, 0);
    }

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("monster_").is_ok());
        assert!(validate_table_name("maple_monster").is_ok());
        assert!(validate_table_name("_m2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2monster").is_err());
        assert!(validate_table_name("monster x").is_err());
        assert!(validate_table_name("monster;--").is_err());
    }

    #[test]
    fn test_insert_same_name_twice() {
        let mut conn = test_db();

        let first = insert(&mut conn, "주황버섯", "8");
        let second = insert(&mut conn, "주황버섯", "8");

        assert!(matches!(first, InsertOutcome::Inserted { .. }));
        assert_eq!(second, InsertOutcome::Duplicate);
        assert_eq!(count_monsters(&conn, TABLE).unwrap(), 1);

        println!("✅ Duplicate name test PASSED: 1 row after inserting twice");
    }

    #[test]
    fn test_insert_persists_all_stats() {
        let mut conn = test_db();
        let record = MonsterRecord::new("슬라임", "6", "1,050", "10");

        let outcome = insert_monster(&mut conn, TABLE, &record, URL).unwrap();
        let stored = find_by_name(&conn, TABLE, "슬라임").unwrap().unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted { id: stored.id });
        assert_eq!(stored.level, Some(6));
        assert_eq!(stored.hp, Some(1050));
        assert_eq!(stored.exp, Some(10));
    }

    #[test]
    fn test_placeholder_stored_as_null() {
        let mut conn = test_db();
        let record = MonsterRecord::new("유령", PLACEHOLDER, PLACEHOLDER, PLACEHOLDER);

        insert_monster(&mut conn, TABLE, &record, URL).unwrap();
        let stored = find_by_name(&conn, TABLE, "유령").unwrap().unwrap();

        assert_eq!(stored.level, None);
        assert_eq!(stored.hp, None);
        assert_eq!(stored.exp, None);
        assert!(get_levels(&conn, TABLE).unwrap().is_empty());
    }

    #[test]
    fn test_import_keeps_source_and_page_text() {
        let mut conn = test_db();
        let record = MonsterRecord::new("스텀프", "10", "1,200", PLACEHOLDER);

        let id = match insert_monster(&mut conn, TABLE, &record, URL).unwrap() {
            InsertOutcome::Inserted { id } => id,
            other => panic!("expected insert, got {:?}", other),
        };

        let event = get_import_for_monster(&conn, TABLE, id).unwrap().unwrap();
        assert_eq!(event.monster_id, id);
        assert_eq!(event.monster_table, TABLE);
        assert_eq!(event.source_url, URL);
        assert_eq!(event.scraped, record);

        // Same id under another table name is a different monster
        assert!(get_import_for_monster(&conn, "maple_monster", id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_writes_no_import() {
        let mut conn = test_db();
        insert(&mut conn, "달팽이", "1");
        insert(&mut conn, "달팽이", "1");

        let imports: i64 = conn
            .query_row("SELECT COUNT(*) FROM import_events", [], |row| row.get(0))
            .unwrap();
        assert_eq!(imports, 1);
    }

    #[test]
    fn test_failed_insert_rolls_back() {
        let mut conn = test_db();
        insert(&mut conn, "달팽이", "1");

        // Import log write inside the transaction will fail after the row insert
        conn.execute("DROP TABLE import_events", []).unwrap();

        let record = MonsterRecord::new("파란 달팽이", "2", "15", "3");
        let result = insert_monster(&mut conn, TABLE, &record, URL);

        assert!(result.is_err());
        assert_eq!(count_monsters(&conn, TABLE).unwrap(), 1);
        assert!(find_by_name(&conn, TABLE, "파란 달팽이").unwrap().is_none());

        println!("✅ Rollback test PASSED: table unchanged after failed insert");
    }

    #[test]
    fn test_find_in_level_range() {
        let mut conn = test_db();
        for (name, level) in [("a", "44"), ("b", "45"), ("c", "50"), ("d", "55"), ("e", "56")] {
            insert(&mut conn, name, level);
        }

        let names: Vec<String> = find_in_level_range(&conn, TABLE, 45, 55)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();

        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_get_all_monsters_in_storage_order() {
        let mut conn = test_db();
        insert(&mut conn, "first", "30");
        insert(&mut conn, "second", "1");

        let all = get_all_monsters(&conn, TABLE).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "first");
        assert_eq!(all[1].name, "second");
        assert_eq!(get_levels(&conn, TABLE).unwrap(), vec![30, 1]);
    }
}
