//! Event bus routing helpers.

use crate::payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::sync::broadcast::Sender;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    replay: Arc<Mutex<VecDeque<EventEnvelope>>>,
    replay_capacity: usize,
    next_id: Arc<Mutex<EventId>>,
}

impl EventBus {
    /// Construct a bus with a custom replay capacity.
    ///
    /// A zero capacity is bumped to one; `tokio::broadcast` rejects empty channels.
    #[must_use]
    pub fn with_capacity(replay_capacity: usize) -> Self {
        let replay_capacity = replay_capacity.max(1);
        let (sender, _) = broadcast::channel(replay_capacity);
        Self {
            sender,
            replay: Arc::new(Mutex::new(VecDeque::with_capacity(replay_capacity))),
            replay_capacity,
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Construct a bus with the default replay capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Subscribe to the bus, replaying buffered events newer than `last_event_id`.
    #[must_use]
    pub fn subscribe(&self, last_event_id: Option<EventId>) -> EventStream {
        // Subscribe before reading the backlog so nothing published in between is lost;
        // duplicates are filtered by id in `EventStream::next`.
        let receiver = BroadcastStream::new(self.sender.subscribe());
        let backlog = last_event_id
            .map(|id| self.backlog_since(id).into())
            .unwrap_or_default();
        EventStream {
            backlog,
            receiver,
            last_seen: last_event_id.unwrap_or(0),
        }
    }

    /// Publish a new event to all subscribers.
    pub fn send(&self, event: Event) -> EventId {
        let mut next = self
            .next_id
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let id = *next;
        *next = next.saturating_add(1);

        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };
        {
            let mut replay = self.lock_replay();
            if replay.len() == self.replay_capacity {
                let _ = replay.pop_front();
            }
            replay.push_back(envelope.clone());
        }
        // Ids must reach the channel in order, so the counter lock is held until here.
        let _ = self.sender.send(envelope);
        drop(next);
        id
    }

    /// Publish and return the assigned event id.
    #[must_use]
    pub fn publish(&self, event: Event) -> EventId {
        self.send(event)
    }

    /// Last event id observed in the replay buffer.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.lock_replay().back().map(|env| env.id)
    }

    /// Collect a backlog of events emitted after the specified id.
    #[must_use]
    pub fn backlog_since(&self, id: EventId) -> Vec<EventEnvelope> {
        let replay = self.lock_replay();
        replay.iter().filter(|env| env.id > id).cloned().collect()
    }

    fn lock_replay(&self) -> MutexGuard<'_, VecDeque<EventEnvelope>> {
        self.replay
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber handle yielding replayed events first, then live ones.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: BroadcastStream<EventEnvelope>,
    last_seen: EventId,
}

impl EventStream {
    /// Receive the next event, or `None` once every bus handle has been dropped.
    ///
    /// Events lost to channel overflow are skipped; subscribers that need a
    /// complete history re-subscribe with their last seen id.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(envelope) = self.backlog.pop_front() {
            self.last_seen = envelope.id;
            return Some(envelope);
        }

        loop {
            match self.receiver.next().await? {
                Ok(envelope) if envelope.id > self.last_seen => {
                    self.last_seen = envelope.id;
                    return Some(envelope);
                }
                Ok(_) | Err(BroadcastStreamRecvError::Lagged(_)) => {}
            }
        }
    }

    /// Return an already-delivered event without waiting, if one is buffered.
    pub fn try_next(&mut self) -> Option<EventEnvelope> {
        let waker = std::task::Waker::noop();
        let mut context = std::task::Context::from_waker(waker);
        let future = self.next();
        let mut future = std::pin::pin!(future);
        match future.as_mut().poll(&mut context) {
            std::task::Poll::Ready(item) => item,
            std::task::Poll::Pending => None,
        }
    }
}
