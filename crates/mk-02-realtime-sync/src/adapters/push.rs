//! In-process push transport.
//!
//! Each `open` creates a fresh signal channel for the scope. Tests and the
//! demo binary inject signals with [`InMemoryPushChannel::emit`].

use crate::domain::{ActorId, ChannelSignal, RealtimeError, ResourceScope};
use crate::ports::PushChannel;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::mpsc;

struct OpenChannel {
    actor: ActorId,
    sender: mpsc::Sender<ChannelSignal>,
    opens: u32,
}

/// Mock push transport.
pub struct InMemoryPushChannel {
    buffer: usize,
    auto_confirm: AtomicBool,
    refuse: AtomicU32,
    attempts: AtomicU32,
    channels: Mutex<HashMap<ResourceScope, OpenChannel>>,
}

impl InMemoryPushChannel {
    /// Transport whose channels buffer `buffer` signals and confirm
    /// themselves with `Subscribed` on open.
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            auto_confirm: AtomicBool::new(true),
            refuse: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_auto_confirm(&self, enabled: bool) {
        self.auto_confirm.store(enabled, Ordering::SeqCst);
    }

    /// Refuse the next `count` opens.
    pub fn refuse_next(&self, count: u32) {
        self.refuse.store(count, Ordering::SeqCst);
    }

    /// Push `signal` into the live channel for `scope`.
    pub async fn emit(&self, scope: &ResourceScope, signal: ChannelSignal) -> bool {
        let sender = self
            .channels
            .lock()
            .get(scope)
            .map(|open| open.sender.clone());
        match sender {
            Some(sender) => sender.send(signal).await.is_ok(),
            None => false,
        }
    }

    /// End the channel for `scope` from the server side.
    pub fn hang_up(&self, scope: &ResourceScope) {
        if let Some(open) = self.channels.lock().get_mut(scope) {
            let (closed, _) = mpsc::channel(1);
            open.sender = closed;
        }
    }

    /// Whether a receiver for `scope` is still alive.
    pub fn is_open(&self, scope: &ResourceScope) -> bool {
        self.channels
            .lock()
            .get(scope)
            .is_some_and(|open| !open.sender.is_closed())
    }

    /// Successful opens for `scope`.
    pub fn open_count(&self, scope: &ResourceScope) -> u32 {
        self.channels.lock().get(scope).map_or(0, |open| open.opens)
    }

    /// Every open call, refused or not.
    pub fn open_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Actor the live channel for `scope` was opened for.
    pub fn actor_for(&self, scope: &ResourceScope) -> Option<ActorId> {
        self.channels.lock().get(scope).map(|open| open.actor.clone())
    }
}

#[async_trait]
impl PushChannel for InMemoryPushChannel {
    async fn open(
        &self,
        actor: &ActorId,
        scope: &ResourceScope,
    ) -> Result<mpsc::Receiver<ChannelSignal>, RealtimeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(RealtimeError::ChannelOpen {
                scope: scope.clone(),
                message: "simulated transport refusal".into(),
            });
        }

        let (sender, receiver) = mpsc::channel(self.buffer);
        if self.auto_confirm.load(Ordering::SeqCst) {
            let _ = sender.try_send(ChannelSignal::Subscribed);
        }

        let mut channels = self.channels.lock();
        let opens = channels.get(scope).map_or(0, |open| open.opens) + 1;
        channels.insert(
            scope.clone(),
            OpenChannel {
                actor: actor.clone(),
                sender,
                opens,
            },
        );
        Ok(receiver)
    }
}
