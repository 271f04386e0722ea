//! Game Logic Module
//!
//! Match rules and state. 100% deterministic given the seed and commands.
//!
//! ## Module Structure
//!
//! - `participant`: Participant record, health and lives
//! - `registry`: Joined participants, variants and roles
//! - `spawn`: Spawn slot pool and occupancy query
//! - `state`: Match state and phase
//! - `lifecycle`: Lobby, setup, elimination and end of match
//! - `swap`: God/fighter role exchange
//! - `score`: End-of-match records and ranking
//! - `timer`: Round timer
//! - `deferred`: Actions scheduled for later ticks
//! - `command`: Collaborator input
//! - `events`: Game events for the presentation layer
//! - `tick`: Authoritative match loop
//! - `snapshot`: Read-only view for HUDs

pub mod participant;
pub mod registry;
pub mod spawn;
pub mod state;
pub mod lifecycle;
pub mod swap;
pub mod score;
pub mod timer;
pub mod deferred;
pub mod command;
pub mod events;
pub mod tick;
pub mod snapshot;

// Re-export key types
pub use participant::{Participant, ParticipantId, Role, VariantIndex, Placement};
pub use registry::EntityRegistry;
pub use spawn::{SpawnAllocator, SpawnPose, SpawnSlot, SlotId, OccupancyQuery, NeverOccupied};
pub use state::{MatchState, MatchPhase};
pub use score::{ScoreBoard, ScoreRecord};
pub use command::{MatchCommand, CommandLog};
pub use events::{GameEvent, GameEventData, SwapTrigger};
pub use swap::SwapOutcome;
pub use tick::{tick, TickResult};
pub use snapshot::MatchSnapshot;
