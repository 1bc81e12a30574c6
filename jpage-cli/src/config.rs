//! Settings file and flag resolution

use jpage_format::{Limits, Target};
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Optional TOML settings; every field may be overridden by a flag
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub key: Option<String>,
    pub depth: Option<usize>,
    pub skip_empty_pages: Option<bool>,
    pub max_nesting_depth: Option<usize>,
    pub max_element_bytes: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("cannot read config {}: {}", path.display(), err))?;
        let config = toml::from_str(&text)
            .map_err(|err| format!("invalid config {}: {}", path.display(), err))?;
        Ok(config)
    }
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct FlagValues {
    pub key: Option<String>,
    pub depth: Option<usize>,
    pub skip_empty_pages: bool,
}

/// Effective iterator settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub target: Target,
    pub skip_empty_pages: bool,
    pub limits: Limits,
}

impl Settings {
    pub fn resolve(file: FileConfig, flags: FlagValues) -> Result<Self, Box<dyn Error>> {
        let key = flags.key.or(file.key);
        let depth = flags.depth.or(file.depth);

        let target = match (key, depth) {
            (None, None) | (None, Some(0)) => Target::root(),
            (None, Some(depth)) => {
                return Err(format!("depth {depth} needs a key to search for").into());
            }
            (Some(_), Some(0)) => {
                return Err("a key needs a depth of at least 1".into());
            }
            (Some(key), depth) => Target::key(key, depth.unwrap_or(1)),
        };

        let defaults = Limits::default();
        let limits = Limits {
            max_nesting_depth: file.max_nesting_depth.unwrap_or(defaults.max_nesting_depth),
            max_element_bytes: file.max_element_bytes.unwrap_or(defaults.max_element_bytes),
        };
        limits.validate()?;

        Ok(Self {
            target,
            skip_empty_pages: flags.skip_empty_pages || file.skip_empty_pages.unwrap_or(false),
            limits,
        })
    }
}
