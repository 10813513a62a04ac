use crate::message::IncomingMessage;
use crate::twilight_exports::{ChannelMarker, Id, UserMarker};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot::{channel, error::RecvError, Receiver, Sender};

pub(crate) fn new_pair<F>(fun: F) -> (WaiterWaker, MessageWaiter)
where
    F: Fn(&IncomingMessage) -> bool + Send + 'static,
{
    let (sender, receiver) = channel();

    (
        WaiterWaker {
            predicate: Box::new(fun),
            sender,
        },
        MessageWaiter { receiver },
    )
}

/// A waiter used to wait for a message.
///
/// The waiter implements [`Future`], so in order to retrieve the message, just await the waiter.
pub struct MessageWaiter {
    receiver: Receiver<IncomingMessage>,
}

impl Future for MessageWaiter {
    type Output = Result<IncomingMessage, RecvError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx)
    }
}

/// A waker used to notify its associate [`waiter`] when the predicate has been satisfied and
/// deliver the message.
///
/// [`waiter`]: MessageWaiter
pub struct WaiterWaker {
    predicate: Box<dyn Fn(&IncomingMessage) -> bool + Send + 'static>,
    sender: Sender<IncomingMessage>,
}

impl WaiterWaker {
    pub fn check(&self, message: &IncomingMessage) -> bool {
        (self.predicate)(message)
    }

    /// Delivers the message, returning whether the waiter was still listening.
    pub fn wake(self, message: IncomingMessage) -> bool {
        self.sender.send(message).is_ok()
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Pending prompt replies and the set of users currently answering prompts.
#[derive(Default)]
pub struct Waiters {
    wakers: Mutex<Vec<WaiterWaker>>,
    /// Amount of collectors awaiting input per user and channel.
    awaiting: Mutex<HashMap<(Id<UserMarker>, Id<ChannelMarker>), usize>>,
}

impl Waiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for the first message satisfying the given predicate.
    pub fn wait_for<F>(&self, fun: F) -> MessageWaiter
    where
        F: Fn(&IncomingMessage) -> bool + Send + 'static,
    {
        let (waker, waiter) = new_pair(fun);
        self.wakers.lock().push(waker);
        waiter
    }

    /// Delivers the message to the first waiter whose predicate accepts it, returning whether
    /// one did.
    pub fn wake(&self, message: &IncomingMessage) -> bool {
        let mut lock = self.wakers.lock();
        lock.retain(|waker| !waker.is_closed());

        match lock.iter().position(|waker| waker.check(message)) {
            Some(index) => lock.remove(index).wake(message.clone()),
            None => false,
        }
    }

    /// Whether the given user is answering prompts in the given channel.
    pub fn is_awaiting(&self, user_id: Id<UserMarker>, channel_id: Id<ChannelMarker>) -> bool {
        self.awaiting.lock().contains_key(&(user_id, channel_id))
    }

    /// Marks the user as answering prompts in the channel until the returned guard is dropped.
    pub fn begin_awaiting(&self, user_id: Id<UserMarker>, channel_id: Id<ChannelMarker>) -> AwaitingGuard<'_> {
        *self.awaiting.lock().entry((user_id, channel_id)).or_default() += 1;

        AwaitingGuard {
            waiters: self,
            key: (user_id, channel_id),
        }
    }
}

/// Removes its user and channel pair from the awaiting set when dropped.
pub struct AwaitingGuard<'a> {
    waiters: &'a Waiters,
    key: (Id<UserMarker>, Id<ChannelMarker>),
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        let mut lock = self.waiters.awaiting.lock();

        if let Some(count) = lock.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                lock.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::message_from;

    #[tokio::test]
    async fn first_matching_waiter_is_woken() {
        let waiters = Waiters::new();
        let first = waiters.wait_for(|m| m.content == "yes");
        let second = waiters.wait_for(|m| m.content == "yes");

        assert!(!waiters.wake(&message_from(1, "no")));
        assert!(waiters.wake(&message_from(2, "yes")));

        assert_eq!(first.await.unwrap().id, Id::new(2));
        drop(second);
        assert!(!waiters.wake(&message_from(3, "yes")));
    }

    #[test]
    fn awaiting_guard_clears_on_drop() {
        let waiters = Waiters::new();
        let (user, channel) = (Id::new(1), Id::new(2));

        {
            let _guard = waiters.begin_awaiting(user, channel);
            assert!(waiters.is_awaiting(user, channel));
            assert!(!waiters.is_awaiting(user, Id::new(3)));

            drop(waiters.begin_awaiting(user, channel));
            assert!(waiters.is_awaiting(user, channel));
        }

        assert!(!waiters.is_awaiting(user, channel));
    }
}
