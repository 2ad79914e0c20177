use serde::Deserialize;

/// A named slot with a literal value, injected into a generated intent
/// occurrence as `"name":"value"`.
///
/// The engine never interprets values; they are copied into the output
/// exactly as configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Entity {
    pub name: String,
    pub value: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The entity-object clause for this slot, including the trailing comma
    /// that separates it from the next clause: `"name":"value",`.
    pub fn clause(&self) -> String {
        format!("\"{}\":\"{}\",", self.name, self.value)
    }
}
