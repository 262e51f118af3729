// crates/crease-server/src/hub.rs
// ============================================================================
// Module: Subscription Hub
// Description: Room-per-match fan-out with bounded queues and pruning.
// Purpose: Stream validated deltas to spectators without blocking commands.
// Dependencies: crease-protocol, tokio
// ============================================================================

//! ## Overview
//! Each match has one room; each subscriber in the room owns a bounded queue
//! the command path only enqueues into. A subscriber whose queue overflows
//! is dropped with a resume hint (the last committed event sequence) so it
//! can reconnect and replay; dead subscribers are pruned on send failure,
//! and the room structure is released when the last subscriber leaves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crease_core::MatchId;
use crease_protocol::StreamMessage;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: Frames
// ============================================================================

/// One outbound frame queued to a subscriber.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    /// A serialized stream message.
    Message(String),
}

/// Handle returned to the socket task on attach.
pub struct Subscription {
    /// Owning room.
    pub match_id: MatchId,
    /// Subscriber identity within the room.
    pub subscriber_id: u64,
    /// Frame receiver drained by the socket task.
    pub receiver: mpsc::Receiver<OutboundFrame>,
    /// Resume hint updated by the hub; read when the queue closes.
    pub resume_hint: Arc<AtomicU64>,
}

// ============================================================================
// SECTION: Rooms
// ============================================================================

/// One subscriber's sending half.
struct Subscriber {
    /// Bounded frame queue.
    sender: mpsc::Sender<OutboundFrame>,
    /// Resume hint shared with the socket task.
    resume_hint: Arc<AtomicU64>,
}

/// One match room.
#[derive(Default)]
struct Room {
    /// Subscribers keyed by room-local identity.
    subscribers: HashMap<u64, Subscriber>,
    /// Next room-local subscriber identity.
    next_id: u64,
    /// Sequence of the last committed event broadcast to this room.
    last_committed_sequence: u64,
}

/// Aggregate statistics over the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    /// Rooms with at least one subscriber.
    pub active_rooms: usize,
    /// Total subscribers across all rooms.
    pub total_subscribers: usize,
}

// ============================================================================
// SECTION: Hub
// ============================================================================

/// Room-based fan-out hub, one per process.
///
/// # Invariants
/// - Broadcast never blocks: the command path only enqueues.
/// - A room exists exactly while it has subscribers.
pub struct MatchHub {
    /// Rooms keyed by match.
    rooms: Mutex<HashMap<MatchId, Room>>,
    /// Per-subscriber queue capacity (the high-water mark).
    queue_capacity: usize,
}

impl MatchHub {
    /// Creates a hub with the given per-subscriber queue capacity.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Attaches a subscriber to a match room.
    ///
    /// The caller sends the snapshot frame first through the returned queue.
    #[must_use]
    pub fn attach(&self, match_id: MatchId) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let resume_hint = Arc::new(AtomicU64::new(0));
        let subscriber_id = {
            let mut rooms = lock_rooms(&self.rooms);
            let room = rooms.entry(match_id).or_default();
            let id = room.next_id;
            room.next_id += 1;
            resume_hint.store(room.last_committed_sequence, Ordering::Relaxed);
            room.subscribers.insert(
                id,
                Subscriber {
                    sender,
                    resume_hint: Arc::clone(&resume_hint),
                },
            );
            id
        };
        Subscription {
            match_id,
            subscriber_id,
            receiver,
            resume_hint,
        }
    }

    /// Detaches a subscriber, releasing the room when it empties.
    pub fn detach(&self, match_id: MatchId, subscriber_id: u64) {
        let mut rooms = lock_rooms(&self.rooms);
        if let Some(room) = rooms.get_mut(&match_id) {
            room.subscribers.remove(&subscriber_id);
            if room.subscribers.is_empty() {
                rooms.remove(&match_id);
            }
        }
    }

    /// Enqueues a frame to one subscriber (snapshot on attach).
    ///
    /// Returns false when the subscriber is already gone.
    pub fn send_to(
        &self,
        match_id: MatchId,
        subscriber_id: u64,
        frame: &StreamMessage,
    ) -> bool {
        let Ok(serialized) = serde_json::to_string(frame) else {
            return false;
        };
        let sender = {
            let rooms = lock_rooms(&self.rooms);
            rooms
                .get(&match_id)
                .and_then(|room| room.subscribers.get(&subscriber_id))
                .map(|subscriber| subscriber.sender.clone())
        };
        sender.is_some_and(|sender| {
            sender.try_send(OutboundFrame::Message(serialized)).is_ok()
        })
    }

    /// Broadcasts frames to every subscriber of a match room.
    ///
    /// Frames are serialized once. Subscribers whose queue is full exceed
    /// the high-water mark and are dropped with their resume hint set; the
    /// socket task notices the closed queue and sends the close frame.
    pub fn broadcast(
        &self,
        match_id: MatchId,
        frames: &[StreamMessage],
        committed_sequence: u64,
    ) {
        if frames.is_empty() {
            return;
        }
        let serialized: Vec<String> = frames
            .iter()
            .filter_map(|frame| serde_json::to_string(frame).ok())
            .collect();
        let mut rooms = lock_rooms(&self.rooms);
        let Some(room) = rooms.get_mut(&match_id) else {
            return;
        };
        if committed_sequence > room.last_committed_sequence {
            room.last_committed_sequence = committed_sequence;
        }
        let resume = room.last_committed_sequence;
        let mut dropped = Vec::new();
        for (id, subscriber) in &room.subscribers {
            for frame in &serialized {
                match subscriber.sender.try_send(OutboundFrame::Message(frame.clone())) {
                    Ok(()) => {
                        subscriber.resume_hint.store(resume, Ordering::Relaxed);
                    }
                    Err(_) => {
                        // Queue full past the high-water mark, or receiver
                        // gone. Either way the subscriber is pruned; the
                        // resume hint keeps its last-delivered value.
                        dropped.push(*id);
                        break;
                    }
                }
            }
        }
        for id in dropped {
            room.subscribers.remove(&id);
        }
        if room.subscribers.is_empty() {
            rooms.remove(&match_id);
        }
    }

    /// Number of subscribers in a match room.
    #[must_use]
    pub fn room_size(&self, match_id: MatchId) -> usize {
        lock_rooms(&self.rooms).get(&match_id).map_or(0, |room| room.subscribers.len())
    }

    /// Matches with at least one subscriber.
    #[must_use]
    pub fn active_matches(&self) -> Vec<MatchId> {
        lock_rooms(&self.rooms).keys().copied().collect()
    }

    /// Aggregate hub statistics.
    #[must_use]
    pub fn stats(&self) -> HubStats {
        let rooms = lock_rooms(&self.rooms);
        HubStats {
            active_rooms: rooms.len(),
            total_subscribers: rooms.values().map(|room| room.subscribers.len()).sum(),
        }
    }
}

/// Locks the room map, recovering from a poisoned mutex.
fn lock_rooms(
    rooms: &Mutex<HashMap<MatchId, Room>>,
) -> std::sync::MutexGuard<'_, HashMap<MatchId, Room>> {
    match rooms.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
