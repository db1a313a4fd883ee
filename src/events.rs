//! Typed change notifications emitted by [`Board`](crate::board::Board).
//!
//! Observers subscribe to one [`Topic`] and receive every [`BoardEvent`] of
//! that topic synchronously, in registration order, from inside the board
//! primitive that caused it. Callbacks run while the board is being mutated,
//! so they must not try to reach back into it; forwarding the event into a
//! channel is the intended pattern.

use crate::board::Piece;

/// Event categories an observer can subscribe to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Reset,
    /// Discs placed or removed (`Set` and `Unset`).
    Placement,
    Flip,
    TurnChange,
    End,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoardEvent {
    /// The board was reset or restored from a snapshot.
    Reset,
    Set { x: usize, y: usize, piece: Piece },
    Unset { x: usize, y: usize },
    Flip { x: usize, y: usize, before: Piece, after: Piece },
    /// The side to move changed. `ended` is true when this handoff is the
    /// transition into a finished game.
    TurnChange { ended: bool },
    End,
}

impl BoardEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BoardEvent::Reset => Topic::Reset,
            BoardEvent::Set { .. } | BoardEvent::Unset { .. } => Topic::Placement,
            BoardEvent::Flip { .. } => Topic::Flip,
            BoardEvent::TurnChange { .. } => Topic::TurnChange,
            BoardEvent::End => Topic::End,
        }
    }
}

/// Handle returned by [`Observers::subscribe`], used to unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&BoardEvent) + Send>;

struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    callback: Callback,
}

/// Topic-keyed subscriber registry.
#[derive(Default)]
pub struct Observers {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl Observers {
    pub fn subscribe<F>(&mut self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: FnMut(&BoardEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            topic,
            callback: Box::new(callback),
        });
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn emit(&mut self, event: BoardEvent) {
        let topic = event.topic();
        for sub in self.subscriptions.iter_mut().filter(|s| s.topic == topic) {
            (sub.callback)(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
