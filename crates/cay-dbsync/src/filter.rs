//! Table name filters built from shell-style patterns.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{DbSyncError, DbSyncResult};

/// The serialized form of a [`NameFilter`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePatterns {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Selects table names by include and exclude patterns.
///
/// A name is included when it matches at least one include pattern and no
/// exclude pattern. Matching ignores case; `*` matches any run of
/// characters. With no include patterns nothing is included.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "NamePatterns", into = "NamePatterns")]
pub struct NameFilter {
    patterns: NamePatterns,
    include: GlobSet,
    exclude: GlobSet,
}

impl NameFilter {
    /// Compile a filter from include and exclude patterns.
    pub fn new<I, E, S, T>(include: I, exclude: E) -> DbSyncResult<Self>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self::from_patterns(NamePatterns {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        })
    }

    pub fn from_patterns(patterns: NamePatterns) -> DbSyncResult<Self> {
        let include = compile(&patterns.include)?;
        let exclude = compile(&patterns.exclude)?;
        Ok(Self {
            patterns,
            include,
            exclude,
        })
    }

    /// Includes no names.
    pub fn none() -> Self {
        Self {
            patterns: NamePatterns::default(),
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        }
    }

    /// Includes every name.
    pub fn all() -> Self {
        let patterns = NamePatterns {
            include: vec!["*".to_string()],
            exclude: Vec::new(),
        };
        // `*` always compiles
        let include = compile(&patterns.include).unwrap_or_else(|_| GlobSet::empty());
        Self {
            patterns,
            include,
            exclude: GlobSet::empty(),
        }
    }

    pub fn is_included(&self, name: &str) -> bool {
        self.include.is_match(name) && !self.exclude.is_match(name)
    }

    pub fn patterns(&self) -> &NamePatterns {
        &self.patterns
    }
}

impl Default for NameFilter {
    fn default() -> Self {
        Self::none()
    }
}

impl PartialEq for NameFilter {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl TryFrom<NamePatterns> for NameFilter {
    type Error = DbSyncError;

    fn try_from(patterns: NamePatterns) -> DbSyncResult<Self> {
        Self::from_patterns(patterns)
    }
}

impl From<NameFilter> for NamePatterns {
    fn from(filter: NameFilter) -> Self {
        filter.patterns
    }
}

fn compile(patterns: &[String]) -> DbSyncResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| DbSyncError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| DbSyncError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}
