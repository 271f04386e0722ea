//! Godly Gambit Match Runner
//!
//! Headless driver for the match core: plays a scripted match, logs what
//! happens and checks that a replay of the same commands ends identically.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use godly_gambit::{
    MatchConfig, MatchState, TICK_RATE, VERSION,
    core::rng::derive_match_seed,
    game::{
        command::{CommandLog, MatchCommand},
        events::GameEventData,
        participant::ParticipantId,
        snapshot::MatchSnapshot,
        spawn::{NeverOccupied, SpawnPose},
        tick::{replay_match, tick_recorded},
    },
};

/// Give up on the demo after this many ticks (10 minutes).
const DEMO_TICK_LIMIT: u32 = 10 * 60 * TICK_RATE;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Godly Gambit Core v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => MatchConfig::load(&path)
            .with_context(|| format!("failed to load match config from {}", path))?,
        None => MatchConfig::default(),
    };
    info!(
        "Round: {} ticks (+{} per extra participant), {} lives",
        config.round_ticks, config.extra_ticks_per_participant, config.max_lives
    );

    demo_match(config)
}

/// Stage layout for the demo: a ring of fighter slots and the god's perch.
fn demo_stage() -> MatchCommand {
    let slots = (0..8)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / 8.0;
            SpawnPose::new(angle.cos() * 12.0, 0.0, angle.sin() * 12.0, angle.to_degrees() + 180.0)
        })
        .collect();
    MatchCommand::LoadStage {
        slots,
        god_slot: Some(SpawnPose::new(0.0, 8.0, 0.0, 0.0)),
    }
}

/// Demo function to exercise the match core.
fn demo_match(config: MatchConfig) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let participants: Vec<ParticipantId> = (0..4).map(ParticipantId).collect();
    let match_id = *Uuid::new_v4().as_bytes();
    let ids: Vec<u32> = participants.iter().map(|p| p.0).collect();
    let rng_seed = derive_match_seed(&match_id, &ids);

    info!("Match ID: {}", hex::encode(match_id));
    info!("RNG Seed: {}", rng_seed);

    let initial = MatchState::new(match_id, rng_seed, config);
    let mut state = initial.clone();
    let mut log = CommandLog::new();

    // Lobby
    let mut lobby = vec![demo_stage()];
    lobby.extend(participants.iter().map(|&id| MatchCommand::Join(id)));
    lobby.push(MatchCommand::Ready);

    let mut pending = lobby;
    let mut total_events = 0;
    let mut ended = false;

    while state.tick < DEMO_TICK_LIMIT {
        // Fighters take a hit every half second
        if state.is_in_progress() && state.tick % (TICK_RATE / 2) == 0 {
            if let Some(&participant) = state.registry.alive_fighters().first() {
                pending.push(MatchCommand::Damage { participant, amount: 35 });
            }
        }

        let result = tick_recorded(&mut state, &pending, &NeverOccupied, &mut log)?;
        pending.clear();
        total_events += result.events.len();

        for skipped in &result.skipped {
            warn!("Tick {}: skipped {}", state.tick, skipped);
        }

        // Log important events
        for event in &result.events {
            match &event.data {
                GameEventData::MatchStarted { god, fighters } => {
                    info!("Match started: god {}, {} fighters", god, fighters.len());
                }
                GameEventData::RoleSwapped { new_god, new_fighter, trigger, .. } => {
                    info!("Tick {}: {} is now god, {} fights ({:?})", event.tick, new_god, new_fighter, trigger);
                }
                GameEventData::ParticipantEliminated { participant } => {
                    info!("Tick {}: {} eliminated", event.tick, participant);
                }
                _ => {}
            }
        }

        if result.match_ended {
            info!("Match ended at tick {}", state.tick);
            ended = true;
            break;
        }
    }

    if !ended {
        warn!("Demo stopped after {} ticks without a winner", DEMO_TICK_LIMIT);
    }

    // Print final results
    info!("=== Match Results ===");
    let snapshot = MatchSnapshot::capture(&state);
    for (placement, id, record) in &snapshot.placements {
        info!(
            "#{}: {} - lives {}, survived {:.1}s",
            placement,
            id,
            record.lives + 1,
            record.survival_seconds()
        );
    }
    info!("Total events: {}", total_events);

    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replay_final, _) = replay_match(initial, &log, state.tick)?;
    let replay_hash = replay_final.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }

    Ok(())
}
