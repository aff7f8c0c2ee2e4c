//! A self-contained scheduler demo: one room, two simulated players, one
//! automated trivia game played to three points.
//!
//! Run with `RUST_LOG=debug cargo run -p trivia-demo` to watch the room
//! actor's decisions alongside the chat output.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_activity::{Capabilities, GameContent, RoundData};
use warden_core::{
    ChatTransport, FormatId, GameFormat, Moderation, Rank, RoomId, UserId,
};
use warden_room::{CreateKind, FormatRegistry, Scheduler, SchedulerConfig};
use warden_sched::MemoryStore;

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

const QUESTIONS: &[(&str, &str)] = &[
    ("This Kanto starter evolves into Charizard.", "Charmeleon"),
    ("The sleeping blocker of Kanto's routes.", "Snorlax"),
    ("This Pokemon's cry was famously its own name.", "Pikachu"),
    ("Mega Evolution of the Aura Pokemon.", "Mega Lucario"),
    ("The genetic Pokemon cloned from Mew.", "Mewtwo"),
    ("Ghost of the Lavender Tower, pre-Silph Scope.", "Haunter"),
];

/// Rounds walk the question table in order, wrapping around.
struct PokemonTrivia;

impl GameContent for PokemonTrivia {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            bot_play: true,
            variable_points: false,
        }
    }

    fn compute_round(&mut self, round: u64) -> RoundData {
        let (hint, answer) = QUESTIONS[(round as usize - 1) % QUESTIONS.len()];
        RoundData {
            hint: hint.to_string(),
            answers: vec![answer.to_string()],
        }
    }

    fn bot_guess(&self, round: &RoundData) -> Option<String> {
        round.answers.first().cloned()
    }
}

// ---------------------------------------------------------------------------
// Platform stand-ins
// ---------------------------------------------------------------------------

/// Prints everything the scheduler would say in chat.
struct StdoutTransport;

impl ChatTransport for StdoutTransport {
    fn announce(&self, room: &RoomId, text: &str) {
        println!("[{room}] {text}");
    }

    fn private(&self, room: &RoomId, user: &UserId, text: &str) {
        println!("[{room}] (to {user}) {text}");
    }
}

#[derive(Default)]
struct DemoModeration {
    ranks: Mutex<HashMap<UserId, Rank>>,
    modchat: Mutex<Rank>,
}

impl Moderation for DemoModeration {
    fn rank_of(&self, _room: &RoomId, user: &UserId) -> Rank {
        self.ranks
            .lock()
            .unwrap()
            .get(user)
            .copied()
            .unwrap_or_default()
    }

    fn set_rank(&self, _room: &RoomId, user: &UserId, rank: Rank) {
        self.ranks.lock().unwrap().insert(user.clone(), rank);
    }

    fn modchat(&self, _room: &RoomId) -> Rank {
        *self.modchat.lock().unwrap()
    }

    fn set_modchat(&self, _room: &RoomId, level: Rank) {
        *self.modchat.lock().unwrap() = level;
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

const PLAYERS: &[&str] = &["Ann", "Bob"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut formats = FormatRegistry::new();
    let trivia = GameFormat {
        round_duration: Duration::from_secs(8),
        ..GameFormat::scripted("pokemontrivia", "Pokemon Trivia")
    };
    formats.register(trivia, || Box::new(PokemonTrivia));
    formats.register_hosted(GameFormat::hosted("scavengerhunt", "Scavenger Hunt"));

    let mut config = SchedulerConfig::default();
    config.timing.between_rounds = Duration::from_secs(2);

    let mut scheduler = Scheduler::new(
        config,
        formats,
        Arc::new(StdoutTransport),
        Arc::new(DemoModeration::default()),
        Arc::new(MemoryStore::new()),
    );

    let room = RoomId::new("gamecorner");
    let id = scheduler
        .create_activity(
            &room,
            CreateKind::Scripted {
                format: FormatId::new("pokemontrivia"),
                target: Some(3),
            },
        )
        .await?;
    info!(%id, "demo game created");

    // A random player answers each round after a short think.
    let mut rng = rand::rng();
    let mut round = 1u64;
    while scheduler.room_status(&room).await?.activity.is_some() {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let name = PLAYERS[rng.random_range(0..PLAYERS.len())];
        let (_, answer) = QUESTIONS[(round as usize - 1) % QUESTIONS.len()];
        scheduler.guess(&room, UserId::from_name(name), name, answer)?;
        round += 1;
        // Wait out the between-rounds pause before the next answer.
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    let status = scheduler.room_status(&room).await?;
    println!(
        "[{room}] demo over; cooldowns armed: {}",
        status.cooldowns.len()
    );
    scheduler.shutdown();
    Ok(())
}
