//! Lifecycle notifications for display and audio collaborators.
//!
//! Subscribers get a [`Subscription`] backed by an mpsc channel. Dropping the
//! handle unsubscribes: the bus notices the closed channel on the next
//! publish and forgets the sender.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::Serialize;

use crate::{entities::EntityId, session::GameStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Topic {
    Ship,
    Asteroid,
    Ufo,
    Projectile,
    Session,
    Progress,
}

impl Topic {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Bitset of [`Topic`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopicSet(u8);

impl TopicSet {
    pub const ALL: TopicSet = TopicSet(0b11_1111);
    pub const NONE: TopicSet = TopicSet(0);

    pub fn of(topics: &[Topic]) -> Self {
        Self(topics.iter().fold(0, |bits, topic| bits | topic.bit()))
    }

    pub fn contains(self, topic: Topic) -> bool {
        self.0 & topic.bit() != 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    ShipCreated { id: EntityId },
    ShipDestroyed { id: EntityId, hit: bool },
    AsteroidsCreated { ids: Vec<EntityId> },
    AsteroidDestroyed { id: EntityId, generation: u8, hit: bool },
    UfoCreated { id: EntityId },
    UfoDestroyed { id: EntityId, hit: bool },
    ProjectileCreated { id: EntityId },
    ProjectileDestroyed { id: EntityId, hit: bool },
    SessionStarted,
    SessionPaused,
    SessionResumed,
    SessionFinished { score: u32, level: u32 },
    SessionReset { previous: GameStatus },
    LevelAdvanced { level: u32 },
    ScoreChanged { score: u32, lives: u32 },
}

impl GameEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::ShipCreated { .. } | Self::ShipDestroyed { .. } => Topic::Ship,
            Self::AsteroidsCreated { .. } | Self::AsteroidDestroyed { .. } => Topic::Asteroid,
            Self::UfoCreated { .. } | Self::UfoDestroyed { .. } => Topic::Ufo,
            Self::ProjectileCreated { .. } | Self::ProjectileDestroyed { .. } => Topic::Projectile,
            Self::SessionStarted
            | Self::SessionPaused
            | Self::SessionResumed
            | Self::SessionFinished { .. }
            | Self::SessionReset { .. } => Topic::Session,
            Self::LevelAdvanced { .. } | Self::ScoreChanged { .. } => Topic::Progress,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    topics: TopicSet,
    sender: Sender<GameEvent>,
}

/// Receiving end of a bus subscription.
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<GameEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn try_next(&self) -> Option<GameEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Everything published since the last drain.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topics: TopicSet) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, topics, sender });
        Subscription { id, receiver }
    }

    /// Delivers `event` to every interested subscriber and returns how many
    /// received it.
    pub fn publish(&mut self, event: GameEvent) -> usize {
        let topic = event.topic();
        let mut delivered = 0;
        self.subscribers.retain(|subscriber| {
            if !subscriber.topics.contains(topic) {
                return true;
            }
            match subscriber.sender.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::trace!(subscription = subscriber.id.0, "dropping closed subscription");
                    false
                }
            }
        });
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
