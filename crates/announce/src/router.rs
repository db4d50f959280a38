use core::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Error type a router may return from [`ContentRouter::announce`].
///
/// The pipeline only logs and counts router errors, so any error type is
/// accepted.
pub type RouterError = Box<dyn core::error::Error + Send + Sync>;

/// The routing overlay that learns which content this node can serve.
///
/// This is the only collaborator the pipeline talks to. The pipeline bounds
/// every call with a timeout and passes a token that is cancelled when the
/// pipeline shuts down; retries, if any, are the router's business.
pub trait ContentRouter<K>: Send + Sync + 'static {
    /// Tells the overlay that this node can serve `key`.
    ///
    /// Implementations should stop promptly once `cancel` fires. The returned
    /// future may also be dropped when the announce timeout elapses.
    fn announce(
        &self,
        key: &K,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), RouterError>> + Send;
}

impl<K, R> ContentRouter<K> for Arc<R>
where
    R: ContentRouter<K>,
{
    fn announce(
        &self,
        key: &K,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), RouterError>> + Send {
        (**self).announce(key, cancel)
    }
}
