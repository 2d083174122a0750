use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::TokenLensError;

const MAX_SNAPSHOT_FILE_SIZE: u64 = 1024 * 1024; // 1 MiB

/// One application visible to the caller, with its owning organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppRecord {
    pub id: u64,
    pub name: String,
    pub org_id: u64,
    pub org_slug: String,
}

/// Source of the application listing names are resolved from.
/// Queried once per run.
pub trait ApplicationListing {
    fn list_applications(&self) -> Result<Vec<AppRecord>, TokenLensError>;
}

impl ApplicationListing for [AppRecord] {
    fn list_applications(&self) -> Result<Vec<AppRecord>, TokenLensError> {
        Ok(self.to_vec())
    }
}

impl ApplicationListing for Vec<AppRecord> {
    fn list_applications(&self) -> Result<Vec<AppRecord>, TokenLensError> {
        self.as_slice().list_applications()
    }
}

// --- TOML snapshot (private, maps 1:1 to the file) ---

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotFile {
    #[serde(default)]
    apps: Vec<AppRecord>,
}

/// Application listing read from a TOML snapshot:
///
/// ```toml
/// [[apps]]
/// id = 2004659
/// name = "web"
/// org_id = 9709
/// org_slug = "personal"
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotListing {
    path: PathBuf,
}

impl SnapshotListing {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ApplicationListing for SnapshotListing {
    /// Checks file size before reading.
    fn list_applications(&self) -> Result<Vec<AppRecord>, TokenLensError> {
        let path = self.path.display();
        let metadata = std::fs::metadata(&self.path)
            .map_err(|e| TokenLensError::ResolverUnavailable(format!("cannot read {path}: {e}")))?;

        if metadata.len() > MAX_SNAPSHOT_FILE_SIZE {
            return Err(TokenLensError::ResolverUnavailable(format!(
                "{path} exceeds {MAX_SNAPSHOT_FILE_SIZE} byte limit"
            )));
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| TokenLensError::ResolverUnavailable(format!("cannot read {path}: {e}")))?;

        let file: SnapshotFile = toml::from_str(&content)
            .map_err(|e| TokenLensError::ResolverUnavailable(format!("{path}: {e}")))?;

        Ok(file.apps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Organization,
    App,
}

/// Organization and app display names, fixed for the duration of a run.
#[derive(Debug, Default, Clone)]
pub struct IdResolver {
    orgs: HashMap<u64, String>,
    apps: HashMap<u64, String>,
}

impl IdResolver {
    /// Build the tables from a single listing call.
    pub fn build<L: ApplicationListing + ?Sized>(listing: &L) -> Result<Self, TokenLensError> {
        let records = listing.list_applications()?;
        let resolver = Self::from_records(records);
        info!(
            orgs = resolver.orgs.len(),
            apps = resolver.apps.len(),
            "name tables built"
        );
        Ok(resolver)
    }

    pub fn from_records(records: impl IntoIterator<Item = AppRecord>) -> Self {
        let mut resolver = Self::default();
        for record in records {
            resolver.apps.insert(record.id, record.name);
            resolver.orgs.insert(record.org_id, record.org_slug);
        }
        resolver
    }

    /// Display name for `id`, or its decimal form when it is not known.
    pub fn resolve(&self, id: u64, kind: IdKind) -> Cow<'_, str> {
        let table = match kind {
            IdKind::Organization => &self.orgs,
            IdKind::App => &self.apps,
        };

        match table.get(&id) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(id.to_string()),
        }
    }
}
