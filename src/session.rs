use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Identifies the client whose last image `rescan` re-analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Most recently analyzed image, one entry per session.
///
/// Entries are swapped whole under the write lock, so a reader sees either
/// the previous image or the new one.
#[derive(Default)]
pub struct SessionCache {
    entries: RwLock<HashMap<SessionId, Arc<DynamicImage>>>,
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("sessions", &self.len())
            .finish()
    }
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session's entry, returning the previous image if any.
    pub fn store(&self, session: SessionId, image: Arc<DynamicImage>) -> Option<Arc<DynamicImage>> {
        self.write().insert(session, image)
    }

    pub fn load(&self, session: &SessionId) -> Option<Arc<DynamicImage>> {
        self.read().get(session).cloned()
    }

    pub fn forget(&self, session: &SessionId) -> Option<Arc<DynamicImage>> {
        self.write().remove(session)
    }

    pub fn contains(&self, session: &SessionId) -> bool {
        self.read().contains_key(session)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Entries are whole `Arc`s; a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Arc<DynamicImage>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Arc<DynamicImage>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
