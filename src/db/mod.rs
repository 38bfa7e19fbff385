//! Persistence layer: a synchronous key-value slot.
//!
//! The tracker stores exactly two blobs, each overwritten whole on every
//! save. Backends only need `get`/`set`/`remove`; the [`WorkoutStore`]
//! owns the encoding.
//!
//! [`WorkoutStore`]: crate::services::WorkoutStore

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Key names as constants.
pub mod keys {
    /// Serialized `AthleteProfile`
    pub const PROFILE: &str = "profile";
    /// Serialized ordered list of workouts, each tagged with `kind`
    pub const WORKOUTS: &str = "workouts";
}

/// Synchronous key-value persistence, in the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
