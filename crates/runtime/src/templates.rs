//! Read-only map templates and the stores that serve them.
//!
//! A template is parsed once and shared behind an `Arc`; every room clones
//! the grid before mutating it, so rooms never observe each other.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;

use game_core::{Grid, GridError, TemplateId};

use crate::api::{Result, TemplateError};

/// A named map layout rooms are created from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TemplateFile")]
pub struct MapTemplate {
    pub id: TemplateId,
    pub name: String,
    pub grid: Grid,
}

impl MapTemplate {
    /// Builds a template from the compact text layout understood by [`Grid::parse`].
    pub fn from_layout(
        id: impl Into<TemplateId>,
        name: impl Into<String>,
        layout: &str,
    ) -> std::result::Result<Self, GridError> {
        Ok(Self {
            id: id.into(),
            name: name.into(),
            grid: Grid::parse(layout)?,
        })
    }
}

/// On-disk shape: `{"id": "...", "name": "...", "layout": ["#S.", ...]}`.
#[derive(Deserialize)]
struct TemplateFile {
    id: TemplateId,
    name: String,
    layout: Vec<String>,
}

impl TryFrom<TemplateFile> for MapTemplate {
    type Error = GridError;

    fn try_from(file: TemplateFile) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: file.id,
            name: file.name,
            grid: Grid::parse(&file.layout.join("\n"))?,
        })
    }
}

/// Source of map templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Looks up a template; `None` when the id is unknown.
    async fn fetch(&self, id: &TemplateId) -> Result<Option<Arc<MapTemplate>>>;
}

/// Templates held in memory, optionally loaded from a directory of JSON files.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<TemplateId, Arc<MapTemplate>>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with every `*.json` template in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> std::result::Result<Self, TemplateError> {
        let store = Self::new();
        store.load_dir(dir)?;
        Ok(store)
    }

    /// Adds or replaces a template.
    pub fn insert(&self, template: MapTemplate) {
        self.templates
            .write()
            .insert(template.id.clone(), Arc::new(template));
    }

    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.read().is_empty()
    }

    pub fn ids(&self) -> Vec<TemplateId> {
        let mut ids: Vec<_> = self.templates.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Loads every `*.json` file in `dir`, returning how many were added.
    ///
    /// Files are read in name order so later files win on duplicate ids.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> std::result::Result<usize, TemplateError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TemplateError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let raw = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
                path: path.clone(),
                source,
            })?;
            let template: MapTemplate =
                serde_json::from_str(&raw).map_err(|source| TemplateError::Json {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(
                target: "runtime::templates",
                id = %template.id,
                path = %path.display(),
                "template loaded"
            );
            self.insert(template);
        }

        Ok(paths.len())
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn fetch(&self, id: &TemplateId) -> Result<Option<Arc<MapTemplate>>> {
        Ok(self.templates.read().get(id).cloned())
    }
}
