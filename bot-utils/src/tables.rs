//! Range tables (critical hits, perils and the like) loaded from TOML files.

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use thiserror::Error;
use zardoz_dice::{roll_expression, DieRoller, GameMode, RollError, RollValue};

/// Longest page `RollTable::pages` produces, in bytes.
pub const PAGE_LIMIT: usize = 1800;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("{0} is not a valid table.")]
    UnknownTable(String),
    #[error("No entry for {0}")]
    NoEntry(i64),
    #[error("`{0}` does not roll a single number")]
    NotANumber(String),
    #[error(transparent)]
    Roll(#[from] RollError),
}

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Inclusive on both ends.
    pub range: (i64, i64),
    #[serde(default)]
    pub name: Option<String>,
    pub effect: String,
}

impl TableEntry {
    fn contains(&self, value: i64) -> bool {
        self.range.0 <= value && value <= self.range.1
    }

    fn display_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollTable {
    pub slug: String,
    pub full_name: String,
    pub game: String,
    pub book: String,
    /// Dice expression rolled when no value is given.
    pub die: String,
    pub rolls: Vec<TableEntry>,
}

/// Result of a lookup on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRoll {
    /// Set when the value was rolled rather than given.
    pub die: Option<String>,
    pub value: i64,
    pub name: Option<String>,
    pub effect: String,
}

impl FromStr for RollTable {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl RollTable {
    pub fn title(&self) -> String {
        format!("{} ({}, {})", self.full_name, self.game, self.book)
    }

    /// Entry name and whitespace normalized effect for `value`.
    pub fn get(&self, value: i64) -> Result<(Option<String>, String), TableError> {
        self.rolls
            .iter()
            .find(|entry| entry.contains(value))
            .map(|entry| {
                (
                    entry.display_name(),
                    entry.effect.split_whitespace().collect::<Vec<_>>().join(" "),
                )
            })
            .ok_or(TableError::NoEntry(value))
    }

    /// Looks up `die` if it is a number, otherwise rolls it (or the table's own die).
    pub fn roll<R: DieRoller + ?Sized>(
        &self,
        die: Option<&str>,
        roller: &mut R,
    ) -> Result<TableRoll, TableError> {
        let (die, value) = match die.map(str::trim) {
            Some(given) => match given.parse::<i64>() {
                Ok(value) => (None, value),
                Err(_) => (Some(given.to_string()), roll_total(given, roller)?),
            },
            None => (Some(self.die.clone()), roll_total(&self.die, roller)?),
        };
        let (name, effect) = self.get(value)?;
        Ok(TableRoll {
            die,
            value,
            name,
            effect,
        })
    }

    /// Entries as `*name* (lo-hi):` blocks, split into pages of at most `limit` bytes.
    pub fn pages(&self, limit: usize) -> Vec<String> {
        let mut pages = Vec::new();
        let mut page = String::new();
        for entry in self.rolls.iter() {
            let name = entry
                .display_name()
                .map(|n| format!("*{}* ", n))
                .unwrap_or_default();
            let block = format!(
                "{}({}-{}):\n    {}\n",
                name, entry.range.0, entry.range.1, entry.effect.trim()
            );
            if !page.is_empty() && page.len() + block.len() > limit {
                pages.push(std::mem::take(&mut page));
            }
            page.push_str(&block);
        }
        if !page.is_empty() {
            pages.push(page);
        }
        pages
    }
}

fn roll_total<R: DieRoller + ?Sized>(die: &str, roller: &mut R) -> Result<i64, TableError> {
    let variables: HashMap<String, i64> = HashMap::new();
    let outcome = roll_expression(die, GameMode::Default, &variables, false, roller)?;
    match outcome.result {
        RollValue::Scalar(n) => Ok(n),
        RollValue::ResultSet(list) => Ok(list.sum()),
        _ => Err(TableError::NotANumber(die.to_string())),
    }
}

/// All tables, by slug.
#[derive(Debug, Clone, Default)]
pub struct RollTables {
    tables: BTreeMap<String, Arc<RollTable>>,
}

impl RollTables {
    /// Loads every `*.toml` in `dir`. Unreadable tables are skipped with a warning.
    pub fn load<P: AsRef<Path>>(dir: P) -> RollTables {
        let dir = dir.as_ref();
        let mut tables = RollTables::default();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("unable to read tables from {}: {}", dir.display(), e);
                return tables;
            }
        };
        for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match Self::load_file(&path) {
                Ok(table) => tables.insert(table),
                Err(e) => log::warn!("{}", e),
            }
        }
        log::info!(
            "loaded tables: {:?}",
            tables.tables.keys().collect::<Vec<_>>()
        );
        tables
    }

    fn load_file(path: &Path) -> Result<RollTable, TableLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| TableLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse().map_err(|source| TableLoadError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn insert(&mut self, table: RollTable) {
        self.tables.insert(table.slug.clone(), Arc::new(table));
    }

    pub fn get(&self, slug: &str) -> Result<Arc<RollTable>, TableError> {
        self.tables
            .get(slug)
            .cloned()
            .ok_or_else(|| TableError::UnknownTable(slug.to_string()))
    }

    /// Ordered by slug.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RollTable>> {
        self.tables.values()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    pub(crate) const PERILS: &str = r#"
slug = "perils"
full_name = "Perils of the Warp"
game = "Dark Heresy"
book = "Core Rulebook"
die = "1d100"

[[rolls]]
range = [1, 50]
name = "Dark Foreboding"
effect = """A faint breeze blows past the psyker
    and those near him."""

[[rolls]]
range = [51, 99]
effect = "The psyker is knocked down."

[[rolls]]
range = [100, 100]
name = "  "
effect = "Roll twice."
"#;

    pub(crate) fn perils() -> RollTable {
        PERILS.parse().unwrap()
    }

    #[test]
    fn test_get() {
        let table = perils();
        assert_eq!(table.title(), "Perils of the Warp (Dark Heresy, Core Rulebook)");
        assert_eq!(
            table.get(1),
            Ok((
                Some("Dark Foreboding".to_string()),
                "A faint breeze blows past the psyker and those near him.".to_string()
            ))
        );
        assert_eq!(
            table.get(51),
            Ok((None, "The psyker is knocked down.".to_string()))
        );
        assert_eq!(table.get(100), Ok((None, "Roll twice.".to_string())));
        assert_eq!(table.get(101), Err(TableError::NoEntry(101)));
        assert_eq!(table.get(0).unwrap_err().to_string(), "No entry for 0");
    }

    #[test]
    fn test_roll() {
        let table = perils();
        let mut rng = StdRng::seed_from_u64(11);
        let fixed = table.roll(Some("75"), &mut rng).unwrap();
        assert_eq!(fixed.die, None);
        assert_eq!(fixed.value, 75);

        let rolled = table.roll(None, &mut rng).unwrap();
        assert_eq!(rolled.die.as_deref(), Some("1d100"));
        assert!((1..=100).contains(&rolled.value));

        let given = table.roll(Some("2d50"), &mut rng).unwrap();
        assert_eq!(given.die.as_deref(), Some("2d50"));
        assert!((2..=100).contains(&given.value));

        assert_eq!(
            table.roll(Some("d20 > 3"), &mut rng),
            Err(TableError::NotANumber("d20 > 3".to_string()))
        );
        assert!(matches!(
            table.roll(Some("banana"), &mut rng),
            Err(TableError::Roll(RollError::MalformedDiceNotation(_)))
        ));
    }

    #[test]
    fn test_pages() {
        let table = perils();
        let pages = table.pages(PAGE_LIMIT);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].starts_with("*Dark Foreboding* (1-50):\n    A faint breeze"));
        assert!(pages[0].contains("(51-99):\n    The psyker is knocked down.\n"));
        assert_eq!(table.pages(10).len(), 3);
    }

    #[test]
    fn test_tables() {
        let mut tables = RollTables::default();
        assert!(tables.is_empty());
        tables.insert(perils());
        assert_eq!(tables.get("perils").unwrap().die, "1d100");
        assert_eq!(
            tables.get("crits").unwrap_err().to_string(),
            "crits is not a valid table."
        );
    }

    #[test]
    fn test_load() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("perils.toml"), PERILS).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "slug = 3").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let tables = RollTables::load(dir.path());
        assert_eq!(
            tables.iter().map(|t| t.slug.as_str()).collect::<Vec<_>>(),
            vec!["perils"]
        );
        assert!(RollTables::load(dir.path().join("missing")).is_empty());
    }
}
