//! Client-side root directory/file list, with a coarse lock guard so
//! mutation cannot race an in-flight RPC that depends on a roots snapshot.

use std::collections::HashSet;

use mcp_protocol::Root;
use parking_lot::RwLock;

#[derive(Debug, Clone, thiserror::Error)]
#[error("roots are locked for the duration of an in-flight request")]
pub struct RootsLockedError;

#[derive(Default)]
pub struct RootsManager {
    roots: RwLock<HashSet<Root>>,
    locked: std::sync::atomic::AtomicBool,
}

impl RootsManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) {
        self.locked.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn unlock(&self) {
        self.locked.store(false, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// # Errors
    /// [`RootsLockedError`] while locked.
    pub fn add(&self, root: Root) -> Result<(), RootsLockedError> {
        if self.is_locked() {
            return Err(RootsLockedError);
        }
        self.roots.write().insert(root);
        Ok(())
    }

    /// # Errors
    /// [`RootsLockedError`] while locked.
    pub fn remove(&self, uri: &str) -> Result<bool, RootsLockedError> {
        if self.is_locked() {
            return Err(RootsLockedError);
        }
        Ok(self.roots.write().remove(&Root {
            uri: uri.to_string(),
            name: None,
        }))
    }

    #[must_use]
    pub fn list(&self) -> Vec<Root> {
        self.roots.read().iter().cloned().collect()
    }
}
