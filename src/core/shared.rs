//! Thread-safe handle to a volume
//!
//! The engine itself is single-threaded. [`SharedVolume`] serialises access
//! with one global reader-writer lock: mutating operations take the write
//! lock, pure lookups share the read lock.

use crate::core::volume::Volume;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SharedVolume {
    inner: Arc<RwLock<Volume>>,
}

impl SharedVolume {
    pub fn new(volume: Volume) -> Self {
        SharedVolume {
            inner: Arc::new(RwLock::new(volume)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Volume> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Volume> {
        self.inner.write()
    }

    /// Run `f` with shared access
    pub fn with_read<T>(&self, f: impl FnOnce(&Volume) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access
    pub fn with_write<T>(&self, f: impl FnOnce(&mut Volume) -> T) -> T {
        f(&mut self.inner.write())
    }

    /// Unwrap the volume if this is the last handle
    pub fn try_unwrap(self) -> std::result::Result<Volume, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| SharedVolume { inner })
    }
}

impl From<Volume> for SharedVolume {
    fn from(volume: Volume) -> Self {
        SharedVolume::new(volume)
    }
}
