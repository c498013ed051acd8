//! Entity file loading
//!
//! Stands in for the external data-fetch collaborator: the whole entity list is
//! read from a JSON file and handed to the engine wholesale on every refresh.

use poi_overlay::{Entity, EntityId};
use std::collections::HashSet;
use crossbeam_channel::Receiver;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid entity file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum EntityFile {
    List(Vec<Entity>),
    Wrapped { entities: Vec<Entity> },
}

/// Parse an entity list. Later duplicates of an id are dropped with a warning.
pub fn parse_entities(json: &str) -> serde_json::Result<Vec<Entity>> {
    let entities = match serde_json::from_str::<EntityFile>(json)? {
        EntityFile::List(entities) | EntityFile::Wrapped { entities } => entities,
    };

    let mut seen: HashSet<EntityId> = HashSet::with_capacity(entities.len());
    Ok(entities
        .into_iter()
        .filter(|entity| {
            let fresh = seen.insert(entity.id);
            if !fresh {
                tracing::warn!("Dropping duplicate entity {} '{}'", entity.id, entity.name);
            }
            fresh
        })
        .collect())
}

pub fn load_entities(path: &Path) -> Result<Vec<Entity>> {
    profiling::scope!("load_entities");
    let json = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entities = parse_entities(&json).map_err(|source| DataError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Loaded {} entities from {}", entities.len(), path.display());
    Ok(entities)
}

/// Watches one file through the platform's filesystem notifications.
///
/// The parent directory is watched rather than the file itself so that editors
/// which save by replacing the file keep triggering events.
pub struct FileWatch {
    _watcher: RecommendedWatcher,
    changes: Receiver<()>,
}

impl FileWatch {
    /// Start watching `path`. `on_change` runs on the watcher thread after every
    /// change, e.g. to wake the UI.
    pub fn new(path: &Path, on_change: impl Fn() + Send + 'static) -> Result<Self> {
        let watch_error = |source| DataError::Watch {
            path: path.to_path_buf(),
            source,
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| watch_error(notify::Error::path_not_found()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, changes) = crossbeam_channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if relevant && tx.send(()).is_ok() {
                        on_change();
                    }
                }
                Err(err) => tracing::warn!("File watch error: {}", err),
            }
        })
        .map_err(watch_error)?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;

        tracing::info!("Watching {} for changes", path.display());
        Ok(Self {
            _watcher: watcher,
            changes,
        })
    }

    /// True when the file changed since the last call. Never blocks.
    pub fn poll(&self) -> bool {
        self.changes.try_iter().count() > 0
    }
}
