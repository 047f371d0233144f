use std::marker::PhantomData;
use std::sync::Arc;

use storage::repository::{SnapshotStore, StorageError};
use storage::snapshot::{self, SessionSnapshot, SnapshotError};
use tracing::debug;

/// What `hydrate` found in durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateOutcome {
    /// No snapshot was stored; state is at defaults.
    Empty,
    /// The stored snapshot was restored.
    Restored,
    /// The stored snapshot was unreadable and has been discarded.
    Recovered,
}

pub(crate) enum Loaded<T> {
    Missing,
    Restored(T),
    Corrupt(SnapshotError),
}

/// The storage key owned by one session type.
pub(crate) struct SnapshotSlot<S> {
    store: Arc<dyn SnapshotStore>,
    _snapshot: PhantomData<fn() -> S>,
}

impl<S: SessionSnapshot> SnapshotSlot<S> {
    pub(crate) fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            _snapshot: PhantomData,
        }
    }

    pub(crate) async fn read(&self) -> Result<Loaded<S::State>, StorageError> {
        let Some(raw) = self.store.load(S::KEY).await? else {
            debug!(key = S::KEY, "no snapshot stored");
            return Ok(Loaded::Missing);
        };
        match snapshot::decode::<S>(&raw) {
            Ok(state) => {
                debug!(key = S::KEY, bytes = raw.len(), "snapshot restored");
                Ok(Loaded::Restored(state))
            }
            Err(err) => Ok(Loaded::Corrupt(err)),
        }
    }

    pub(crate) async fn write(&self, state: &S::State) -> Result<(), StorageError> {
        let raw = snapshot::encode::<S>(state)?;
        self.store.save(S::KEY, &raw).await?;
        debug!(key = S::KEY, bytes = raw.len(), "snapshot persisted");
        Ok(())
    }

    pub(crate) async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(S::KEY).await
    }
}
