use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one persisted model: the upper-cased symbol plus the window size it was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelKey {
    symbol: String,
    window_size: usize,
}

impl ModelKey {
    pub fn new(symbol: &str, window_size: usize) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            window_size,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Deterministic artifact name without extension, e.g. `aapl_ws40`.
    pub fn file_stem(&self) -> String {
        format!("{}_ws{}", self.symbol.to_lowercase(), self.window_size)
    }

    /// Inverse of [`ModelKey::file_stem`]. Returns `None` for names not produced by it.
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        let (symbol, window) = stem.rsplit_once("_ws")?;
        if symbol.is_empty() {
            return None;
        }
        let window_size = window.parse::<usize>().ok()?;
        Some(Self::new(symbol, window_size))
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (window {})", self.symbol, self.window_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_case_insensitive() {
        assert_eq!(ModelKey::new("aapl", 40), ModelKey::new("AAPL", 40));
        assert_ne!(ModelKey::new("AAPL", 40), ModelKey::new("AAPL", 60));
    }

    #[test]
    fn test_file_stem_roundtrip() {
        let key = ModelKey::new("Brk_B", 60);
        assert_eq!(key.file_stem(), "brk_b_ws60");
        assert_eq!(ModelKey::from_file_stem("brk_b_ws60"), Some(key));
    }

    #[test]
    fn test_foreign_file_stems_are_rejected() {
        assert_eq!(ModelKey::from_file_stem("notes"), None);
        assert_eq!(ModelKey::from_file_stem("_ws40"), None);
        assert_eq!(ModelKey::from_file_stem("aapl_wsxx"), None);
    }
}
