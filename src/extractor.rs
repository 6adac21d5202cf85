// 🔎 Field Extractor - pulls monster stats out of a wiki infobox
// Portable infobox layout: title in <aside>, stats in the first smart group

use crate::monster::{MonsterRecord, PLACEHOLDER};
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

// ============================================================================
// SELECTORS
// ============================================================================

pub const INFOBOX_SELECTOR: &str = "aside.portable-infobox";
pub const NAME_SELECTOR: &str = "[data-source='이름']";
pub const GROUP_BODY_SELECTOR: &str = "section.pi-smart-group-body";
pub const LEVEL_SELECTOR: &str = "[data-source='레벨']";
pub const HP_SELECTOR: &str = "[data-source='HP']";
pub const EXP_SELECTOR: &str = "[data-source='경험치']";

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {:?}: {:?}", css, e))
}

// ============================================================================
// FIELD EXTRACTOR
// ============================================================================

pub struct FieldExtractor {
    infobox: Selector,
    name: Selector,
    group_body: Selector,
    level: Selector,
    hp: Selector,
    exp: Selector,
}

impl FieldExtractor {
    /// Compile the fixed selector set
    pub fn new() -> Result<Self> {
        Ok(FieldExtractor {
            infobox: compile(INFOBOX_SELECTOR)?,
            name: compile(NAME_SELECTOR)?,
            group_body: compile(GROUP_BODY_SELECTOR)?,
            level: compile(LEVEL_SELECTOR)?,
            hp: compile(HP_SELECTOR)?,
            exp: compile(EXP_SELECTOR)?,
        })
    }

    /// Read name, level, HP and EXP from a page.
    ///
    /// Stats missing from the page come back as `PLACEHOLDER`.
    /// A missing name comes back empty; that is not an error here.
    pub fn extract(&self, html: &str) -> MonsterRecord {
        let document = Html::parse_document(html);

        // Pages with several infoboxes contribute every name match
        let name = document
            .select(&self.infobox)
            .flat_map(|infobox| infobox.select(&self.name))
            .flat_map(|el| el.text())
            .collect::<String>()
            .trim()
            .to_string();

        // Only the first smart group carries the base stats
        let first_body = document.select(&self.group_body).next();
        let stat = |selector: &Selector| -> String {
            let text = first_body
                .map(|body| scoped_text(body, selector))
                .unwrap_or_default();
            if text.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                text
            }
        };

        MonsterRecord {
            level: stat(&self.level),
            hp: stat(&self.hp),
            exp: stat(&self.exp),
            name,
        }
    }
}

/// Concatenated text of every match under `scope`, trimmed
fn scoped_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}
