use serde::Deserialize;

use super::entity::Entity;

/// Marker that opens a story block: `## <title>`.
pub const TITLE_MARKER: &str = "## ";
/// Marker of an intent line: `* <intent>`.
pub const INTENT_MARKER: &str = "* ";
/// Marker of a scripted response line: ` - <response>`.
pub const RESPONSE_MARKER: &str = " - ";
/// Prefix of a comment line, skipped entirely.
pub const COMMENT_MARKER: &str = "<!--";
/// A block-terminating blank line.
pub const BLANK_LINE: &str = "\n";

/// Repetitions rendered per unit in a repeated story when nothing else is
/// configured.
pub const DEFAULT_QUANTITY: usize = 5;

/// The configurable part of an intent unit: how many times it repeats and
/// which entities it carries.
///
/// Every field has a serde default so catalog entries only need to name what
/// they change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntentTemplate {
    #[serde(default = "default_quantity")]
    pub quantity: usize,
    #[serde(default)]
    pub necessary: Vec<Entity>,
    #[serde(default)]
    pub unnecessary: Vec<Entity>,
}

fn default_quantity() -> usize {
    DEFAULT_QUANTITY
}

impl Default for IntentTemplate {
    fn default() -> Self {
        Self {
            quantity: DEFAULT_QUANTITY,
            necessary: Vec::new(),
            unnecessary: Vec::new(),
        }
    }
}

/// Structured form of one markdown story block.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentUnit {
    /// The raw intent line, marker and line terminator included.
    pub intent: String,
    /// Occurrences rendered in a repeated story.
    pub quantity: usize,
    /// Entities included in every occurrence.
    pub necessary: Vec<Entity>,
    /// Entities from which a non-empty random subset is drawn per occurrence.
    pub unnecessary: Vec<Entity>,
    /// Raw response lines, written verbatim after the intent.
    pub responses: Vec<String>,
}

impl Default for IntentUnit {
    fn default() -> Self {
        Self::from_template(&IntentTemplate::default())
    }
}

impl IntentUnit {
    /// A fresh unit with the default template and no intent yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a unit whose quantity and entities are copied from `template`.
    pub fn from_template(template: &IntentTemplate) -> Self {
        Self {
            intent: String::new(),
            quantity: template.quantity,
            necessary: template.necessary.clone(),
            unnecessary: template.unnecessary.clone(),
            responses: Vec::new(),
        }
    }

    /// Overwrite quantity and entity lists from `template`, keeping the
    /// parsed intent and responses.
    pub fn apply_template(&mut self, template: &IntentTemplate) {
        self.quantity = template.quantity;
        self.necessary = template.necessary.clone();
        self.unnecessary = template.unnecessary.clone();
    }

    /// The intent name: everything after the first intent marker up to the
    /// end of the line. `None` when the intent line carries no marker.
    pub fn display_name(&self) -> Option<&str> {
        let start = self.intent.find(INTENT_MARKER)? + INTENT_MARKER.len();
        let rest = &self.intent[start..];
        Some(rest.split('\n').next().unwrap_or(rest))
    }
}
