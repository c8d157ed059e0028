// src/store.rs
//! Route persistence over a simple key-value backend.
//!
//! All routes live as one JSON array under [`ROUTES_KEY`]. Writes replace the
//! whole array, and an import is only written after the incoming document has
//! parsed and validated, so a bad import never touches stored data.

use crate::{
    error::{Result, RouteError},
    route::Route,
};
use chrono::Local;
use log::{debug, info};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Collection key all routes are stored under
pub const ROUTES_KEY: &str = "routeRecorderRoutes";

/// String key-value storage, the moral equivalent of browser local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            RouteError::Persistence(format!(
                "Failed to create storage directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    /// `$HOME/.local/share/route-guide`
    pub fn default_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| RouteError::Other("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home).join(".local").join("share").join("route-guide"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RouteError::Persistence(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        // Write beside the target and rename so readers never see a torn file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| {
                RouteError::Persistence(format!("Failed to write {}: {}", path.display(), e))
            })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RouteError::Persistence(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Saved routes, addressed by id
pub struct RouteStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> RouteStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn list_routes(&self) -> Result<Vec<Route>> {
        match self.backend.get(ROUTES_KEY)? {
            Some(data) => serde_json::from_str(&data).map_err(|e| {
                RouteError::Persistence(format!("Stored routes are corrupt: {}", e))
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Persist a route, returning it with the id it was stored under.
    ///
    /// Ids come from the creation time, so one that collides with a stored
    /// route is bumped until unique.
    pub fn save_route(&mut self, mut route: Route) -> Result<Route> {
        if route.points.is_empty() {
            return Err(RouteError::EmptyRoute);
        }

        let mut routes = self.list_routes()?;
        while routes.iter().any(|r| r.id == route.id) {
            route.id += 1;
        }

        routes.push(route.clone());
        self.write_routes(&routes)?;
        info!(
            "Saved route {} '{}' ({} points, {:.2} km)",
            route.id,
            route.name,
            route.points.len(),
            route.total_distance_km
        );
        Ok(route)
    }

    /// First route with this id
    pub fn get_route(&self, id: i64) -> Result<Route> {
        self.list_routes()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(RouteError::NotFound(id))
    }

    /// Remove every route with this id
    pub fn delete_route(&mut self, id: i64) -> Result<()> {
        let routes = self.list_routes()?;
        let before = routes.len();
        let remaining: Vec<Route> = routes.into_iter().filter(|r| r.id != id).collect();

        if remaining.len() == before {
            return Err(RouteError::NotFound(id));
        }

        self.write_routes(&remaining)?;
        info!("Deleted route {}", id);
        Ok(())
    }

    pub fn clear_all(&mut self) -> Result<()> {
        self.backend.remove(ROUTES_KEY)?;
        info!("Cleared all routes");
        Ok(())
    }

    /// Pretty-printed JSON array of every stored route
    pub fn export_json(&self) -> Result<String> {
        let routes = self.list_routes()?;
        Ok(serde_json::to_string_pretty(&routes)?)
    }

    /// Append routes from a JSON array, returning how many were added.
    ///
    /// Incoming ids are not deduplicated against stored ones. Nothing is
    /// written unless the whole document parses and every route has valid points.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let imported: Vec<Route> = serde_json::from_str(json)
            .map_err(|e| RouteError::Persistence(format!("Failed to import routes: {}", e)))?;

        for route in &imported {
            route.validate().map_err(|e| {
                RouteError::Persistence(format!("Failed to import routes: route {}: {}", route.id, e))
            })?;
        }

        let mut routes = self.list_routes()?;
        let count = imported.len();
        routes.extend(imported);
        self.write_routes(&routes)?;
        info!("Imported {} route(s)", count);
        Ok(count)
    }

    fn write_routes(&mut self, routes: &[Route]) -> Result<()> {
        let data = serde_json::to_string(routes)?;
        debug!("Writing {} route(s), {} bytes", routes.len(), data.len());
        self.backend.set(ROUTES_KEY, &data)
    }
}

/// `routes_YYYY-MM-DD.json` for today
pub fn default_export_file_name() -> String {
    format!("routes_{}.json", Local::now().format("%Y-%m-%d"))
}
