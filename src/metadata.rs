use serde::{Deserialize, Serialize};

/// Calendar-level properties written at the top of the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMetadata {
    pub product_id: String,
    pub calendar_name: String,
    /// Right-hand side of every event `UID`.
    pub uid_domain: String,
}

impl Default for CalendarMetadata {
    fn default() -> Self {
        Self {
            product_id: format!("-//colloscope//{}//FR", env!("CARGO_PKG_VERSION")),
            calendar_name: "Emploi du temps".to_string(),
            uid_domain: "colloscope".to_string(),
        }
    }
}

impl CalendarMetadata {
    pub fn named(calendar_name: impl Into<String>) -> Self {
        Self {
            calendar_name: calendar_name.into(),
            ..Self::default()
        }
    }
}
