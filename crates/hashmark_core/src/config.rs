//! Hashing and templating options.
//!
//! [`Config`] is the full, validated set of options. [`ConfigPatch`] is a
//! partial update: it is what callers pass to `set` and what per-call options
//! are expressed as. Unknown keys are kept in `extra` and have no built-in
//! effect.

use crate::algorithm::HashAlgorithm;
use crate::error::{HashError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMPLATE: &str = "<%= name %>-<%= hash %>.<%= ext %>";
pub const DEFAULT_MANIFEST: &str = "assets.json";
pub const DEFAULT_LENGTH: usize = 10;

/// Wire names of the typed options. They can't be set as passthrough keys.
pub const RECOGNIZED_KEYS: [&str; 10] = [
    "hasher",
    "length",
    "replace",
    "manifest",
    "template",
    "save",
    "base",
    "path",
    "hashKey",
    "manifestKey",
];

/// Where the manifest goes, or `false` to never write one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ManifestRepr", into = "ManifestRepr")]
pub enum ManifestTarget {
    Disabled,
    /// Resolved against the output root when relative.
    Path(PathBuf),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ManifestRepr {
    Flag(bool),
    Path(PathBuf),
}

impl From<ManifestRepr> for ManifestTarget {
    fn from(repr: ManifestRepr) -> Self {
        match repr {
            ManifestRepr::Flag(false) => Self::Disabled,
            ManifestRepr::Flag(true) => Self::Path(DEFAULT_MANIFEST.into()),
            ManifestRepr::Path(path) => Self::Path(path),
        }
    }
}

impl From<ManifestTarget> for ManifestRepr {
    fn from(target: ManifestTarget) -> Self {
        match target {
            ManifestTarget::Disabled => Self::Flag(false),
            ManifestTarget::Path(path) => Self::Path(path),
        }
    }
}

/// How manifest keys are derived from an asset's original path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKey {
    /// Original path relative to `base`, with `/` separators.
    #[default]
    Relative,
    /// Original file name only.
    Name,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub hasher: HashAlgorithm,
    /// Hex characters kept from the digest.
    pub length: usize,
    /// Delete the original (and any stale hashed copy) once the new hashed
    /// file is written.
    pub replace: bool,
    pub manifest: ManifestTarget,
    pub template: String,
    /// Write the hashed file. When false only the hash and registry entry are
    /// produced.
    pub save: bool,
    /// Root that relative input paths and manifest keys are resolved against.
    pub base: PathBuf,
    /// Output root for hashed files and the manifest. Defaults to `base`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Salt mixed into every digest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_key: Option<String>,
    pub manifest_key: ManifestKey,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hasher: HashAlgorithm::Sha1,
            length: DEFAULT_LENGTH,
            replace: false,
            manifest: ManifestTarget::Path(DEFAULT_MANIFEST.into()),
            template: DEFAULT_TEMPLATE.to_string(),
            save: true,
            base: PathBuf::from("."),
            path: None,
            hash_key: None,
            manifest_key: ManifestKey::Relative,
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Validate `patch` and shallow-merge it. On error nothing is applied.
    pub fn set(&mut self, patch: ConfigPatch) -> Result<()> {
        let hasher = patch.hasher.as_deref().map(parse_hasher).transpose()?;
        if patch.length == Some(0) {
            return Err(HashError::InvalidConfig(
                "`length` must be a positive integer".into(),
            ));
        }
        if patch.template.as_deref().is_some_and(str::is_empty) {
            return Err(HashError::InvalidConfig("`template` must not be empty".into()));
        }
        if let Some(key) = patch.extra.keys().find(|key| RECOGNIZED_KEYS.contains(&key.as_str())) {
            return Err(HashError::InvalidConfig(format!(
                "`{key}` is a built-in option and can't be set as an extra key"
            )));
        }

        if let Some(hasher) = hasher {
            self.hasher = hasher;
        }
        if let Some(length) = patch.length {
            self.length = length;
        }
        if let Some(replace) = patch.replace {
            self.replace = replace;
        }
        if let Some(manifest) = patch.manifest {
            self.manifest = manifest;
        }
        if let Some(template) = patch.template {
            self.template = template;
        }
        if let Some(save) = patch.save {
            self.save = save;
        }
        if let Some(base) = patch.base {
            self.base = base;
        }
        if let Some(path) = patch.path {
            self.path = Some(path);
        }
        if let Some(hash_key) = patch.hash_key {
            self.hash_key = Some(hash_key);
        }
        if let Some(manifest_key) = patch.manifest_key {
            self.manifest_key = manifest_key;
        }
        self.extra.extend(patch.extra);
        Ok(())
    }

    /// Same as [`set`](Self::set) for an untyped JSON object.
    pub fn set_value(&mut self, value: Value) -> Result<()> {
        if !value.is_object() {
            return Err(HashError::InvalidConfig(format!(
                "expected a JSON object, got {value}"
            )));
        }
        let patch: ConfigPatch =
            serde_json::from_value(value).map_err(|e| HashError::InvalidConfig(e.to_string()))?;
        self.set(patch)
    }

    /// A copy of this config with `patch` applied. `self` is left untouched.
    pub fn merged(&self, patch: ConfigPatch) -> Result<Config> {
        let mut config = self.clone();
        config.set(patch)?;
        Ok(config)
    }

    /// Every option, keyed by its wire name.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// The value stored under `key`, or `""` when the key is absent.
    pub fn get(&self, key: &str) -> Value {
        match self.to_value() {
            Value::Object(mut map) => match map.remove(key) {
                Some(Value::Null) | None => Value::String(String::new()),
                Some(value) => value,
            },
            _ => Value::String(String::new()),
        }
    }

    pub fn output_root(&self) -> &Path {
        self.path.as_deref().unwrap_or(&self.base)
    }

    /// Absolute-or-base-relative location of the manifest, if enabled.
    pub fn manifest_path(&self) -> Option<PathBuf> {
        match &self.manifest {
            ManifestTarget::Disabled => None,
            ManifestTarget::Path(path) => Some(self.output_root().join(path)),
        }
    }

    pub fn resolve_input(&self, path: &Path) -> PathBuf {
        self.base.join(path)
    }
}

fn parse_hasher(name: &str) -> Result<HashAlgorithm> {
    HashAlgorithm::from_name(name).ok_or_else(|| {
        HashError::InvalidConfig(format!(
            "unsupported hasher `{name}`, expected one of {:?}",
            crate::algorithm::hashers()
        ))
    })
}

/// A partial [`Config`]. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    pub hasher: Option<String>,
    pub length: Option<usize>,
    pub replace: Option<bool>,
    pub manifest: Option<ManifestTarget>,
    pub template: Option<String>,
    pub save: Option<bool>,
    pub base: Option<PathBuf>,
    pub path: Option<PathBuf>,
    pub hash_key: Option<String>,
    pub manifest_key: Option<ManifestKey>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hasher(mut self, name: impl Into<String>) -> Self {
        self.hasher = Some(name.into());
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = Some(replace);
        self
    }

    pub fn manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(ManifestTarget::Path(path.into()));
        self
    }

    pub fn no_manifest(mut self) -> Self {
        self.manifest = Some(ManifestTarget::Disabled);
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn save(mut self, save: bool) -> Self {
        self.save = Some(save);
        self
    }

    pub fn base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn hash_key(mut self, key: impl Into<String>) -> Self {
        self.hash_key = Some(key.into());
        self
    }

    pub fn manifest_key(mut self, key: ManifestKey) -> Self {
        self.manifest_key = Some(key);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
