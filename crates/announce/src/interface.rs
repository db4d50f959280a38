use crate::{Announcer, Key, Result, Stat};
use core::future::Future;

/// A minimal interface for announcing newly stored content.
///
/// Block stores and other producers depend on this rather than on
/// [`Announcer`] directly, so that tests and embedders can substitute their
/// own implementation.
pub trait Provide<K> {
    /// Submits `key` for announcement. See [`Announcer::provide`].
    fn provide(&self, key: K) -> impl Future<Output = Result<()>> + Send;

    /// Returns the current announce statistics. See [`Announcer::stat`].
    ///
    /// Implementations that front a remote or lazily built pipeline may fail
    /// here; [`Announcer`] never does.
    fn stat(&self) -> Result<Stat>;
}

impl<K: Key> Provide<K> for Announcer<K> {
    fn provide(&self, key: K) -> impl Future<Output = Result<()>> + Send {
        Announcer::provide(self, key)
    }

    fn stat(&self) -> Result<Stat> {
        Ok(Announcer::stat(self))
    }
}
