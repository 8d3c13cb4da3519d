use crate::errors::ActorError;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

// Type aliases for common types
pub type ActorResult<T> = Result<T, ActorError>;
pub type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
/// Serialized payload passed into and out of actor methods.
pub type Payload = Vec<u8>;

/// Runs `fut` unless `token` fires first.
///
/// Work already done by `fut` before cancellation is not rolled back; only the
/// remaining suspension is cut short.
pub async fn cancellable<T, E, F>(token: &CancellationToken, fut: F) -> ActorResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ActorError>,
{
    if token.is_cancelled() {
        return Err(ActorError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ActorError::Cancelled),
        result = fut => result.map_err(Into::into),
    }
}
