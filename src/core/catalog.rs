/// Intent catalog — quantity and entity configuration keyed by intent name,
/// loaded from RON and applied to parsed units.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::schema::intent_unit::{IntentTemplate, IntentUnit};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Per-intent configuration. Story markdown carries no entity or
/// repetition data, so it comes from here.
///
/// RON shape:
///
/// ```ron
/// {
///     "book_flight": (
///         quantity: 3,
///         necessary: [(name: "city", value: "Porto")],
///         unnecessary: [(name: "date", value: "tomorrow")],
///     ),
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct IntentCatalog {
    pub intents: FxHashMap<String, IntentTemplate>,
}

impl IntentCatalog {
    /// Load a catalog from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<IntentCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::parse_ron(&contents)?;
        info!(path = %path.display(), intents = catalog.len(), "loaded intent catalog");
        Ok(catalog)
    }

    /// Parse a catalog from a RON string.
    pub fn parse_ron(input: &str) -> Result<IntentCatalog, CatalogError> {
        Ok(ron::from_str(input)?)
    }

    /// Merge another catalog into this one. Entries from `other` override
    /// entries in `self` with the same name.
    pub fn merge(&mut self, other: IntentCatalog) {
        self.intents.extend(other.intents);
    }

    pub fn insert(&mut self, name: impl Into<String>, template: IntentTemplate) {
        self.intents.insert(name.into(), template);
    }

    pub fn get(&self, name: &str) -> Option<&IntentTemplate> {
        self.intents.get(name)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Copy quantity and entities onto every unit whose intent name has a
    /// catalog entry. Returns how many units were configured.
    pub fn apply(&self, units: &mut [IntentUnit]) -> usize {
        let mut applied = 0;
        for unit in units.iter_mut() {
            let template = match unit.display_name().and_then(|name| self.get(name.trim())) {
                Some(template) => template,
                None => continue,
            };
            debug!(intent = unit.intent.trim_end(), "applying catalog entry");
            unit.apply_template(template);
            applied += 1;
        }
        info!(applied, units = units.len(), "applied intent catalog");
        applied
    }
}
