// 🍄 Monster Records - what the wiki page says vs. what the table stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text substituted for any stat the page does not show ("no data")
pub const PLACEHOLDER: &str = "정보 없음";

// ============================================================================
// EXTRACTED RECORD (page text, before storage)
// ============================================================================

/// Monster as scraped from a single wiki page.
/// Stats stay as the page wrote them (trimmed) or `PLACEHOLDER`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub name: String,
    pub level: String,
    pub hp: String,
    pub exp: String,
}

impl MonsterRecord {
    pub fn new(name: &str, level: &str, hp: &str, exp: &str) -> Self {
        MonsterRecord {
            name: name.to_string(),
            level: level.to_string(),
            hp: hp.to_string(),
            exp: exp.to_string(),
        }
    }

    pub fn level_value(&self) -> Option<i64> {
        parse_stat(&self.level)
    }

    pub fn hp_value(&self) -> Option<i64> {
        parse_stat(&self.hp)
    }

    pub fn exp_value(&self) -> Option<i64> {
        parse_stat(&self.exp)
    }

    /// True when the page had no usable name
    pub fn is_nameless(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// One line of the plain-text data log
    pub fn log_line(&self, at: DateTime<Utc>) -> String {
        format!(
            "{} | name: {} | level: {} | hp: {} | exp: {}",
            at.to_rfc3339(),
            self.name,
            self.level,
            self.hp,
            self.exp
        )
    }
}

/// Convert page text like "1,250" into a number.
/// The placeholder and anything non-numeric become `None` (stored as NULL).
pub fn parse_stat(text: &str) -> Option<i64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<i64>().ok()
}

// ============================================================================
// STORED ROW
// ============================================================================

/// Monster row as it lives in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMonster {
    pub id: i64,
    pub name: String,
    pub level: Option<i64>,
    pub hp: Option<i64>,
    pub exp: Option<i64>,
    pub created_at: String,
}

impl StoredMonster {
    /// Short console rendering: "Orange Mushroom (Lv. 8, HP 80, EXP 15)"
    pub fn summary(&self) -> String {
        format!(
            "{} (Lv. {}, HP {}, EXP {})",
            self.name,
            display_stat(self.level),
            display_stat(self.hp),
            display_stat(self.exp)
        )
    }
}

fn display_stat(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}
