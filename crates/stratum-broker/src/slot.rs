//! Single-use response mailbox.

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::message::Response;

/// Why a slot refused a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    /// A response was already written.
    #[error("response slot already consumed")]
    AlreadyConsumed,
    /// The waiter is gone.
    #[error("response slot abandoned by its waiter")]
    Abandoned,
}

/// Write side of a one-shot channel that accepts exactly one response.
#[derive(Debug)]
pub struct ResponseSlot {
    sender: Mutex<Option<oneshot::Sender<Response>>>,
}

impl ResponseSlot {
    /// Create a slot and the receiver its waiter suspends on.
    pub fn channel() -> (Self, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Hand `response` to the waiter. Only the first call succeeds.
    pub fn fill(&self, response: Response) -> Result<(), SlotError> {
        let sender = self.sender.lock().take().ok_or(SlotError::AlreadyConsumed)?;
        sender.send(response).map_err(|_| SlotError::Abandoned)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn response() -> Response {
        Response {
            correlation_id: Uuid::new_v4(),
            host: "node".into(),
            connection_id: Uuid::new_v4(),
            error: String::new(),
        }
    }

    #[tokio::test]
    async fn second_fill_fails_loudly() {
        let (slot, rx) = ResponseSlot::channel();
        let first = response();
        slot.fill(first.clone()).unwrap();
        assert_eq!(slot.fill(response()), Err(SlotError::AlreadyConsumed));
        assert_eq!(rx.await.unwrap(), first);
    }

    #[test]
    fn dropped_receiver_abandons() {
        let (slot, rx) = ResponseSlot::channel();
        drop(rx);
        assert_eq!(slot.fill(response()), Err(SlotError::Abandoned));
    }
}
