//! parser configuration
//!
//! The only knob is where (and whether) compiled parse tables are cached. [ParserConfig::from_env] reads
//! `HCLPARSE_TABLE_CACHE`:
//! - unset: `<temp dir>/hclparse/parsetab.bin`
//! - `off` or empty: no cache, tables are built in memory on first use
//! - anything else: path of the cache file
use std::ffi::OsString;
use std::path::PathBuf;

pub const CACHE_ENV: &str = "HCLPARSE_TABLE_CACHE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    Disabled,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    pub cache: CacheMode,
}

impl ParserConfig {
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(CACHE_ENV))
    }

    fn from_env_value(value: Option<OsString>) -> Self {
        let cache = match value {
            None => CacheMode::File(Self::default_cache_path()),
            Some(value) if value.is_empty() || value == "off" => CacheMode::Disabled,
            Some(value) => CacheMode::File(PathBuf::from(value)),
        };
        Self { cache }
    }

    pub fn without_cache() -> Self {
        Self {
            cache: CacheMode::Disabled,
        }
    }

    pub fn with_cache_file(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: CacheMode::File(path.into()),
        }
    }

    pub fn default_cache_path() -> PathBuf {
        std::env::temp_dir().join("hclparse").join("parsetab.bin")
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::with_cache_file(Self::default_cache_path())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unset_uses_temp_dir() {
        assert_eq!(ParserConfig::from_env_value(None), ParserConfig::default());
        assert!(ParserConfig::default_cache_path().starts_with(std::env::temp_dir()));
    }

    #[test]
    fn off_disables() {
        assert_eq!(
            ParserConfig::from_env_value(Some("off".into())).cache,
            CacheMode::Disabled
        );
        assert_eq!(
            ParserConfig::from_env_value(Some("".into())).cache,
            CacheMode::Disabled
        );
    }

    #[test]
    fn explicit_path() {
        assert_eq!(
            ParserConfig::from_env_value(Some("/var/cache/tables.bin".into())).cache,
            CacheMode::File(PathBuf::from("/var/cache/tables.bin"))
        );
    }
}
