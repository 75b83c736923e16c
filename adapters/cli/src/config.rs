//! Optional TOML parameter file.
//!
//! Every key is optional and mirrors a command-line flag. Values from the file
//! are applied first, so explicit flags always win.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use delve_core::{Point, SizeRange};
use serde::Deserialize;

/// Parameters read from a `--config` file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) depth: Option<u32>,
    pub(crate) seed: Option<u64>,
    pub(crate) randomness: Option<u32>,
    pub(crate) sparseness: Option<u32>,
    pub(crate) deadends: Option<u32>,
    pub(crate) start: Option<Point>,
    pub(crate) end: Option<Point>,
    pub(crate) mask: Option<PathBuf>,
    pub(crate) rooms: Option<SizeRange>,
    pub(crate) room_width: Option<SizeRange>,
    pub(crate) room_height: Option<SizeRange>,
    pub(crate) secret: Option<u32>,
    pub(crate) concealed: Option<u32>,
    pub(crate) sparse: Option<String>,
    pub(crate) density: Option<String>,
}

impl FileConfig {
    /// Reads and parses the file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    /// Parses TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config toml contents")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_sets_nothing() {
        assert_eq!(FileConfig::parse("").expect("empty toml"), FileConfig::default());
    }

    #[test]
    fn nested_values_parse() {
        let config = FileConfig::parse(
            r#"
            width = 30
            seed = 12
            start = { x = 1, y = 2, z = 0 }
            rooms = { min = 2, max = 6 }
            sparse = "quite"
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.width, Some(30));
        assert_eq!(config.seed, Some(12));
        assert_eq!(config.start, Some(Point::new(1, 2, 0)));
        assert_eq!(config.rooms, Some(SizeRange::new(2, 6)));
        assert_eq!(config.sparse.as_deref(), Some("quite"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = FileConfig::parse("widht = 3").expect_err("typo must be reported");
        assert!(format!("{error:#}").contains("widht"));
    }
}
