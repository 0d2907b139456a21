//! Scenario Catalog
//!
//! The authored set of scenario templates. Catalog documents are JSON:
//! either an array of scenarios, an object mapping keys to scenarios, or a
//! single bare scenario. The layout is remembered so edits can be saved
//! back in the shape they were read.

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::info;

use super::Scenario;
use crate::errors::{CatalogError, EditError, LoadError};

const BUILTIN_CATALOG: &str = include_str!("../../scenarios/builtin.json");

/// Shape of the catalog document on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogLayout {
    /// `[ scenario, ... ]`
    List,
    /// `{ "key": scenario, ... }`
    Keyed,
    /// A bare scenario object
    Single,
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Object key in a keyed document
    pub key: Option<String>,
    pub scenario: Scenario,
}

/// Validated, ordered set of scenario templates
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    entries: Vec<CatalogEntry>,
    layout: CatalogLayout,
}

impl ScenarioCatalog {
    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Build a list-layout catalog from already-constructed templates
    pub fn from_scenarios(scenarios: Vec<Scenario>) -> Result<Self, CatalogError> {
        let entries = scenarios
            .into_iter()
            .map(|scenario| CatalogEntry {
                key: None,
                scenario,
            })
            .collect();
        Self::validated(entries, CatalogLayout::List)
    }

    /// Read a catalog document from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let catalog = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            scenarios = catalog.len(),
            "Loaded scenario catalog"
        );
        Ok(catalog)
    }

    /// Parse a catalog document. Any malformed scenario rejects the whole document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let (raw, layout): (Vec<(Option<String>, Value)>, CatalogLayout) = match value {
            Value::Array(items) => (
                items.into_iter().map(|v| (None, v)).collect(),
                CatalogLayout::List,
            ),
            Value::Object(map) if map.contains_key("steps") => {
                (vec![(None, Value::Object(map))], CatalogLayout::Single)
            }
            Value::Object(map) => (
                map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
                CatalogLayout::Keyed,
            ),
            _ => {
                return Err(CatalogError::Parse(
                    "expected an array or object of scenarios".to_string(),
                ))
            }
        };

        let mut entries = Vec::with_capacity(raw.len());
        for (index, (key, value)) in raw.into_iter().enumerate() {
            let scenario: Scenario =
                serde_json::from_value(value).map_err(|e| CatalogError::InvalidScenario {
                    index,
                    source: LoadError::Parse(e.to_string()),
                })?;
            entries.push(CatalogEntry { key, scenario });
        }

        Self::validated(entries, layout)
    }

    fn validated(entries: Vec<CatalogEntry>, layout: CatalogLayout) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            entry
                .scenario
                .validate()
                .map_err(|source| CatalogError::InvalidScenario { index, source })?;
        }
        Ok(Self { entries, layout })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn layout(&self) -> CatalogLayout {
        self.layout
    }

    pub fn get(&self, index: usize) -> Option<&Scenario> {
        self.entries.get(index).map(|e| &e.scenario)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Scenario> {
        self.entries.get_mut(index).map(|e| &mut e.scenario)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.entries.iter().map(|e| &e.scenario)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Resolve a selector: a position, a scenario id, or a document key.
    pub fn find(&self, selector: &str) -> Option<usize> {
        if let Ok(index) = selector.parse::<usize>() {
            if index < self.entries.len() {
                return Some(index);
            }
        }
        self.entries
            .iter()
            .position(|e| e.scenario.id == selector || e.key.as_deref() == Some(selector))
    }

    /// Like [`find`](Self::find), but a miss is an error
    pub fn require(&self, selector: &str) -> Result<usize, CatalogError> {
        self.find(selector)
            .ok_or_else(|| CatalogError::NotFound(selector.to_string()))
    }

    /// Resolve an optional selector. Without one, `fallback` (the configured
    /// start scenario) is used; it must be in range.
    pub fn select(&self, selector: Option<&str>, fallback: usize) -> Result<usize, CatalogError> {
        match selector {
            Some(selector) => self.require(selector),
            None if fallback < self.entries.len() => Ok(fallback),
            None => Err(CatalogError::NotFound(fallback.to_string())),
        }
    }

    /// Serialize back to the layout the catalog was read in
    pub fn to_json_pretty(&self) -> Result<String, CatalogError> {
        let value = match self.layout {
            CatalogLayout::Single => serde_json::to_value(&self.entries[0].scenario),
            CatalogLayout::List => {
                serde_json::to_value(self.iter().collect::<Vec<&Scenario>>())
            }
            CatalogLayout::Keyed => {
                let mut map = serde_json::Map::new();
                for entry in &self.entries {
                    let key = entry
                        .key
                        .clone()
                        .unwrap_or_else(|| entry.scenario.id.clone());
                    let scenario = serde_json::to_value(&entry.scenario)
                        .map_err(|e| CatalogError::Parse(e.to_string()))?;
                    map.insert(key, scenario);
                }
                Ok(Value::Object(map))
            }
        }
        .map_err(|e| CatalogError::Parse(e.to_string()))?;

        serde_json::to_string_pretty(&value).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Write the catalog to `path` atomically (temp file in the same directory, then rename).
    pub fn save(&self, path: &Path) -> Result<(), EditError> {
        let io_err = |message: String| EditError::Io {
            path: path.to_path_buf(),
            message,
        };

        let json = self.to_json_pretty().map_err(|e| io_err(e.to_string()))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .map_err(|e| io_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| io_err(e.to_string()))?;

        info!(path = %path.display(), "Saved scenario catalog");
        Ok(())
    }
}
