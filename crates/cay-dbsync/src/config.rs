use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DbSyncResult;
use crate::filter::NameFilter;

/// Policies applied when synchronizing object entities with their tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Remove object attributes mapped to foreign-key columns, leaving the
    /// relationship as the only way to reach them.
    pub remove_meaningful_fks: bool,
    /// Map numeric and boolean columns to primitive types.
    pub use_primitives: bool,
    /// Tables whose primary-key columns are mapped as attributes. Every
    /// other table keeps its primary key out of the object entity.
    pub meaningful_pk_tables: NameFilter,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            remove_meaningful_fks: true,
            use_primitives: false,
            meaningful_pk_tables: NameFilter::none(),
        }
    }
}

impl MergeConfig {
    /// Keep primary and foreign keys as attributes on every entity.
    pub fn keep_meaningful_keys() -> Self {
        Self {
            remove_meaningful_fks: false,
            meaningful_pk_tables: NameFilter::all(),
            ..Default::default()
        }
    }

    /// Shortcut for a primary-key filter that includes all tables (`false`)
    /// or none (`true`).
    pub fn remove_meaningful_pks(mut self, remove: bool) -> Self {
        self.meaningful_pk_tables = if remove {
            NameFilter::none()
        } else {
            NameFilter::all()
        };
        self
    }

    pub fn remove_meaningful_fks(mut self, remove: bool) -> Self {
        self.remove_meaningful_fks = remove;
        self
    }

    pub fn use_primitives(mut self, use_primitives: bool) -> Self {
        self.use_primitives = use_primitives;
        self
    }

    /// Returns `true` if primary keys of `table` are mapped as attributes.
    pub fn keeps_meaningful_pk(&self, table: &str) -> bool {
        self.meaningful_pk_tables.is_included(table)
    }

    pub fn from_toml_str(s: &str) -> DbSyncResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> DbSyncResult<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> DbSyncResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbSyncError;

    #[test]
    fn defaults_remove_both_key_kinds() {
        let config = MergeConfig::default();
        assert!(config.remove_meaningful_fks);
        assert!(!config.keeps_meaningful_pk("ARTIST"));
        assert!(!config.use_primitives);
    }

    #[test]
    fn pk_shortcut() {
        let config = MergeConfig::default().remove_meaningful_pks(false);
        assert!(config.keeps_meaningful_pk("ARTIST"));
        assert!(!config.remove_meaningful_pks(true).keeps_meaningful_pk("ARTIST"));
        assert!(MergeConfig::keep_meaningful_keys().keeps_meaningful_pk("X"));
    }

    #[test]
    fn parses_partial_toml() {
        let config = MergeConfig::from_toml_str(
            r#"
            use_primitives = true

            [meaningful_pk_tables]
            include = ["ARTIST*"]
            exclude = ["ARTIST_HISTORY"]
            "#,
        )
        .unwrap();
        assert!(config.use_primitives);
        assert!(config.remove_meaningful_fks);
        assert!(config.keeps_meaningful_pk("artist"));
        assert!(!config.keeps_meaningful_pk("ARTIST_HISTORY"));
    }

    #[test]
    fn toml_roundtrip() {
        let config = MergeConfig::keep_meaningful_keys().use_primitives(true);
        let text = config.to_toml_string().unwrap();
        assert_eq!(MergeConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn invalid_pattern_is_a_parse_error() {
        let err = MergeConfig::from_toml_str("[meaningful_pk_tables]\ninclude = [\"A[\"]\n")
            .unwrap_err();
        assert!(matches!(err, DbSyncError::ConfigParse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        fs::write(&path, "remove_meaningful_fks = false\n").unwrap();
        let config = MergeConfig::load(&path).unwrap();
        assert!(!config.remove_meaningful_fks);
        assert!(matches!(
            MergeConfig::load(dir.path().join("missing.toml")),
            Err(DbSyncError::Io(_))
        ));
    }
}
