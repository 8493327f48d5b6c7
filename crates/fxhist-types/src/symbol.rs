//! Symbol metadata as consumed from a symbol catalog.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Symbol category, also the `{symbolType}` segment of raw data paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Foreign exchange currency pairs.
    Forex,
    /// Precious metals.
    Metals,
    /// Synthetic indexes derived from other symbols.
    Synthetic,
    /// Stock indices.
    Index,
    /// Commodities (energy, agriculture).
    Commodity,
}

impl SymbolKind {
    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Forex => "forex",
            Self::Metals => "metals",
            Self::Synthetic => "synthetic",
            Self::Index => "index",
            Self::Commodity => "commodity",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata of one tradable symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Symbol name (e.g., "EURUSD").
    name: String,
    /// Description of the symbol.
    #[serde(default)]
    description: String,
    /// Symbol category.
    kind: SymbolKind,
    /// Price precision.
    digits: u32,
    /// Raw data source (e.g., "dukascopy"); empty to use the configured one.
    #[serde(default)]
    source: String,
    /// First day with synchronized history, as recorded by the catalog.
    #[serde(default)]
    history_start: Option<NaiveDate>,
    /// Last day with synchronized history, as recorded by the catalog.
    #[serde(default)]
    history_end: Option<NaiveDate>,
}

impl SymbolInfo {
    /// Creates a new symbol without a recorded history range.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: SymbolKind,
        digits: u32,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            digits,
            source: source.into(),
            history_start: None,
            history_end: None,
        }
    }

    /// Sets the recorded history range.
    #[must_use]
    pub const fn with_history(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.history_start = start;
        self.history_end = end;
        self
    }

    /// Replaces the raw data source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Returns the symbol name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the symbol category.
    #[must_use]
    pub const fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Returns the price precision.
    #[must_use]
    pub const fn digits(&self) -> u32 {
        self.digits
    }

    /// Returns the raw data source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the recorded first history day.
    #[must_use]
    pub const fn history_start(&self) -> Option<NaiveDate> {
        self.history_start
    }

    /// Returns the recorded last history day.
    #[must_use]
    pub const fn history_end(&self) -> Option<NaiveDate> {
        self.history_end
    }

    /// Replaces the recorded history range.
    pub const fn set_history_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.history_start = start;
        self.history_end = end;
    }
}

impl std::fmt::Display for SymbolInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {} digits)", self.name, self.kind, self.digits)
    }
}
