use crate::envelope::Envelope;
use crate::error::MailboxError;
use flume::{Receiver, Sender, TrySendError};

/// Sending side of one activation's mailbox.
///
/// Pushes never wait: a bounded mailbox that is full rejects the envelope
/// with [`MailboxError::Full`] instead of dropping anything silently.
#[derive(Debug)]
pub(crate) struct MailboxSender {
    sender: Sender<Envelope>,
    capacity: Option<usize>,
}

impl MailboxSender {
    pub(crate) fn push(&self, envelope: Envelope) -> Result<(), MailboxError> {
        self.sender.try_send(envelope).map_err(|err| match err {
            TrySendError::Full(_) => MailboxError::Full {
                capacity: self.capacity.unwrap_or_default(),
            },
            TrySendError::Disconnected(_) => MailboxError::Closed,
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

/// Creates a FIFO mailbox. `None` means unbounded.
pub(crate) fn mailbox(capacity: Option<usize>) -> (MailboxSender, Receiver<Envelope>) {
    let capacity = capacity.map(|c| c.max(1));
    let (sender, receiver) = match capacity {
        Some(capacity) => flume::bounded(capacity),
        None => flume::unbounded(),
    };
    (MailboxSender { sender, capacity }, receiver)
}
