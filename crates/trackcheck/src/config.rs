use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TrackcheckError;

/// Catalog/state rules for one kind of tracked entity.
///
/// The catalog lives at `<root>/<type_name>` and each state directory at
/// `<root>/<type_name>/<state>`. `current_pointer` is relative to the
/// repository root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub type_name: String,
    /// State names in declaration order.
    pub states: Vec<String>,
    /// Catalog file names excluded from the one-state rule.
    #[serde(default)]
    pub exempt: BTreeSet<String>,
    #[serde(default)]
    pub current_pointer: Option<PathBuf>,
    /// Only files with this extension take part in the checks; `None` means all files.
    #[serde(default = "default_extension")]
    pub extension: Option<String>,
}

fn default_extension() -> Option<String> {
    Some("md".to_string())
}

impl DirectoryConfig {
    pub fn new(type_name: impl Into<String>, states: &[&str]) -> Self {
        Self {
            type_name: type_name.into(),
            states: states.iter().map(|s| s.to_string()).collect(),
            exempt: BTreeSet::new(),
            current_pointer: None,
            extension: default_extension(),
        }
    }

    pub fn with_exempt(mut self, name: impl Into<String>) -> Self {
        self.exempt.insert(name.into());
        self
    }

    pub fn with_current_pointer(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_pointer = Some(path.into());
        self
    }

    pub fn catalog_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.type_name)
    }

    /// `(state, directory)` pairs in declaration order.
    pub fn state_dirs(&self, root: &Path) -> Vec<(&str, PathBuf)> {
        let catalog = self.catalog_dir(root);
        self.states
            .iter()
            .map(|state| (state.as_str(), catalog.join(state)))
            .collect()
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        match &self.extension {
            Some(ext) => path.extension().and_then(|e| e.to_str()) == Some(ext.as_str()),
            None => true,
        }
    }

    fn validate(&self) -> Result<(), TrackcheckError> {
        if self.type_name.trim().is_empty() || self.type_name.contains(['/', '\\']) {
            return Err(TrackcheckError::Config(format!(
                "invalid type name '{}'",
                self.type_name
            )));
        }
        if self.states.is_empty() {
            return Err(TrackcheckError::Config(format!(
                "type '{}' declares no states",
                self.type_name
            )));
        }
        let mut seen = BTreeSet::new();
        for state in &self.states {
            if state.trim().is_empty() || state.contains(['/', '\\']) {
                return Err(TrackcheckError::Config(format!(
                    "type '{}' has invalid state name '{state}'",
                    self.type_name
                )));
            }
            if !seen.insert(state.as_str()) {
                return Err(TrackcheckError::Config(format!(
                    "type '{}' declares state '{state}' more than once",
                    self.type_name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    types: Vec<DirectoryConfig>,
}

/// Immutable set of known entity types, built once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeRegistry {
    types: BTreeMap<String, DirectoryConfig>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TypeRegistry {
    pub const DEFAULT_TYPE: &'static str = "tasks";

    /// The task and tweet lifecycles of the reference deployment.
    pub fn builtin() -> Self {
        let tasks = DirectoryConfig::new("tasks", &["new", "active", "paused", "done", "cancelled"])
            .with_current_pointer("CURRENT_TASK.md");
        let tweets = DirectoryConfig::new("tweets", &["new", "queued", "approved", "posted"])
            .with_exempt("README.md");

        Self {
            types: [tasks, tweets]
                .into_iter()
                .map(|config| (config.type_name.clone(), config))
                .collect(),
        }
    }

    pub fn from_configs(
        configs: impl IntoIterator<Item = DirectoryConfig>,
    ) -> Result<Self, TrackcheckError> {
        let mut types = BTreeMap::new();
        for config in configs {
            config.validate()?;
            let name = config.type_name.clone();
            if types.insert(name.clone(), config).is_some() {
                return Err(TrackcheckError::Config(format!(
                    "type '{name}' is defined more than once"
                )));
            }
        }
        if types.is_empty() {
            return Err(TrackcheckError::Config("no types defined".into()));
        }
        Ok(Self { types })
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, TrackcheckError> {
        let file: RegistryFile = serde_yaml::from_str(source)?;
        Self::from_configs(file.types)
    }

    pub fn load(path: &Path) -> Result<Self, TrackcheckError> {
        let source = std::fs::read_to_string(path).map_err(|source| TrackcheckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source).map_err(|err| err.context(path.display()))
    }

    pub fn get(&self, name: &str) -> Result<&DirectoryConfig, TrackcheckError> {
        self.types
            .get(name)
            .ok_or_else(|| TrackcheckError::UnknownType {
                name: name.to_string(),
                known: self.names().map(str::to_string).collect(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
