//! Per-field lazy cache.

use crate::Result;
use crate::store::StoreError;

/// One lazily loaded field of an entity view.
///
/// A field starts `Unloaded`, becomes `Loaded` on its first read and goes
/// back to `Unloaded` after every write through the same view. Writes never
/// store the value they wrote, so the next read reflects the durable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cached<T> {
    #[default]
    Unloaded,
    Loaded(T),
}

impl<T> Cached<T> {
    /// Whether the field has been read since the last invalidation.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Cached::Loaded(_))
    }

    /// The cached value, if any.
    pub fn get(&self) -> Option<&T> {
        match self {
            Cached::Loaded(v) => Some(v),
            Cached::Unloaded => None,
        }
    }

    /// Return the cached value, running `load` first if there is none.
    pub fn get_or_try_load(&mut self, load: impl FnOnce() -> Result<T>) -> Result<&T> {
        if let Cached::Unloaded = self {
            *self = Cached::Loaded(load()?);
        }
        match self {
            Cached::Loaded(value) => Ok(value),
            Cached::Unloaded => Err(StoreError::CacheUnloaded.into()),
        }
    }

    /// Forget the cached value.
    pub fn invalidate(&mut self) {
        *self = Cached::Unloaded;
    }
}

impl<T> From<T> for Cached<T> {
    fn from(value: T) -> Self {
        Cached::Loaded(value)
    }
}
