//! Symbol metadata lookup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fxhist_types::SymbolInfo;
use tracing::debug;

use crate::{Result, SyncError};

/// Source of symbol metadata for synchronization and path building.
pub trait SymbolCatalog {
    /// Looks up a symbol by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownSymbol`] if the symbol is not listed.
    fn lookup(&self, symbol: &str) -> Result<SymbolInfo>;

    /// Returns every listed symbol, ordered by name.
    fn symbols(&self) -> Vec<SymbolInfo>;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    symbols: BTreeMap<String, SymbolInfo>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a symbol.
    pub fn insert(&mut self, info: SymbolInfo) {
        self.symbols.insert(info.name().to_uppercase(), info);
    }

    /// Returns a mutable entry for a symbol.
    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut SymbolInfo> {
        self.symbols.get_mut(&symbol.to_uppercase())
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if the catalog lists no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl FromIterator<SymbolInfo> for MemoryCatalog {
    fn from_iter<I: IntoIterator<Item = SymbolInfo>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for info in iter {
            catalog.insert(info);
        }
        catalog
    }
}

impl SymbolCatalog for MemoryCatalog {
    fn lookup(&self, symbol: &str) -> Result<SymbolInfo> {
        self.symbols
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| SyncError::UnknownSymbol(symbol.to_string()))
    }

    fn symbols(&self) -> Vec<SymbolInfo> {
        self.symbols.values().cloned().collect()
    }
}

/// Catalog persisted as a JSON array of symbols.
#[derive(Debug, Clone)]
pub struct JsonSymbolCatalog {
    path: PathBuf,
    inner: MemoryCatalog,
}

impl JsonSymbolCatalog {
    /// Loads the catalog at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Catalog`] if the file cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| SyncError::catalog(&path, e))?;
        let symbols: Vec<SymbolInfo> =
            serde_json::from_str(&content).map_err(|e| SyncError::catalog(&path, e))?;

        debug!(path = %path.display(), symbols = symbols.len(), "loaded symbol catalog");
        Ok(Self {
            path,
            inner: symbols.into_iter().collect(),
        })
    }

    /// Wraps an in-memory catalog that will be saved to `path`.
    #[must_use]
    pub fn with_symbols(path: impl Into<PathBuf>, inner: MemoryCatalog) -> Self {
        Self {
            path: path.into(),
            inner,
        }
    }

    /// Returns the catalog location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records the synchronized history range of a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownSymbol`] if the symbol is not listed.
    pub fn set_history_range(
        &mut self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<()> {
        let info = self
            .inner
            .get_mut(symbol)
            .ok_or_else(|| SyncError::UnknownSymbol(symbol.to_string()))?;
        info.set_history_range(start, end);
        Ok(())
    }

    /// Writes the catalog back as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Catalog`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.inner.symbols())
            .map_err(|e| SyncError::catalog(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| SyncError::catalog(&self.path, e))
    }
}

impl SymbolCatalog for JsonSymbolCatalog {
    fn lookup(&self, symbol: &str) -> Result<SymbolInfo> {
        self.inner.lookup(symbol)
    }

    fn symbols(&self) -> Vec<SymbolInfo> {
        self.inner.symbols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhist_types::SymbolKind;
    use tempfile::TempDir;

    const CATALOG: &str = r#"[
        { "name": "EURUSD", "description": "Euro vs US Dollar", "kind": "forex", "digits": 5, "source": "dukascopy", "history_start": "2024-01-02" },
        { "name": "XAUUSD", "kind": "metals", "digits": 2, "source": "dukascopy" }
    ]"#;

    #[test]
    fn test_lookup_ignores_case() {
        let catalog: MemoryCatalog = [SymbolInfo::new("GBPJPY", "", SymbolKind::Forex, 3, "dukascopy")]
            .into_iter()
            .collect();
        assert_eq!(catalog.lookup("gbpjpy").unwrap().digits(), 3);
        assert!(matches!(catalog.lookup("USDCHF"), Err(SyncError::UnknownSymbol(_))));
    }

    #[test]
    fn test_load_update_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("symbols.json");
        fs::write(&path, CATALOG).unwrap();

        let mut catalog = JsonSymbolCatalog::load(&path).unwrap();
        assert_eq!(catalog.symbols().len(), 2);
        assert_eq!(
            catalog.lookup("EURUSD").unwrap().history_start(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );

        let end = NaiveDate::from_ymd_opt(2024, 3, 1);
        catalog.set_history_range("xauusd", NaiveDate::from_ymd_opt(2024, 1, 2), end).unwrap();
        catalog.save().unwrap();

        let reloaded = JsonSymbolCatalog::load(&path).unwrap();
        assert_eq!(reloaded.lookup("XAUUSD").unwrap().history_end(), end);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = JsonSymbolCatalog::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(SyncError::Catalog { .. })));
    }
}
