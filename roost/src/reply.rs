use roost_api::types::{ActorResult, Payload};
use tokio::sync::oneshot;
use tracing::trace;

/// Outcome of one turn as seen by its caller.
pub type TurnResult = ActorResult<Payload>;

/// Sending half of a turn's reply.
#[derive(Debug)]
pub struct ReplySender(oneshot::Sender<TurnResult>);

impl ReplySender {
    /// Delivers the turn outcome.
    ///
    /// A dropped receiver means the caller stopped waiting (timeout or
    /// cancellation), which is not an error for the actor.
    pub fn send(self, result: TurnResult) {
        if self.0.send(result).is_err() {
            trace!("Turn caller stopped waiting for the reply");
        }
    }
}

pub fn reply_channel() -> (ReplySender, oneshot::Receiver<TurnResult>) {
    let (tx, rx) = oneshot::channel();
    (ReplySender(tx), rx)
}
