#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates and plays dungeon levels headlessly.

mod autopilot;
mod config;
mod render;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crawler_core::{Command, ConsumableKind, Event};
use crawler_system_bootstrap::{Bootstrap, SceneManifest};
use crawler_world::{apply, query, SessionStatus, World};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::autopilot::Autopilot;

const LOW_HEALTH: f32 = 50.0;

/// Entry point for the dungeon crawler command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    let world = World::new(config);
    match cli.command {
        Mode::Generate(args) => generate(world, &args),
        Mode::Simulate(args) => simulate(world, &args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser, Debug)]
#[command(name = "crawler", about = "Headless dungeon crawler simulation", version)]
struct Cli {
    /// TOML file overriding the default dungeon configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Generate a level and print its map.
    Generate(GenerateArgs),
    /// Play a level with a scripted player and report the outcome.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Campaign seed.
    #[arg(long, default_value_t = 12345)]
    seed: u64,
    /// Level of the campaign to generate.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    level: u32,
    /// Print the scene manifest as JSON instead of a map.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Campaign seed.
    #[arg(long, default_value_t = 12345)]
    seed: u64,
    /// Maximum number of ticks to run.
    #[arg(long, default_value_t = 6000)]
    ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,
    /// Print the map of the level once the run ends.
    #[arg(long)]
    map: bool,
}

fn start(world: &mut World, seed: u64, level: u32) -> Result<SceneManifest> {
    let mut events = Vec::new();
    apply(world, Command::StartCampaign { seed }, &mut events);
    for _ in 1..level {
        apply(world, Command::AdvanceLevel, &mut events);
    }
    Bootstrap
        .scene_manifest(world)
        .context("campaign did not produce a level")
}

fn generate(mut world: World, args: &GenerateArgs) -> Result<()> {
    let manifest = start(&mut world, args.seed, args.level)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&manifest).context("failed to serialise manifest")?
        );
        return Ok(());
    }

    println!("{}", Bootstrap.welcome_banner(&world));
    println!("level {} (seed {:#018x})", manifest.level, manifest.seed);
    print!("{}", render::ascii_map(&manifest));
    println!(
        "rooms: {}  enemies: {}  props: {}  potions: {}  doors: {}",
        manifest.rooms.len(),
        manifest.enemies.len(),
        manifest.props.len(),
        manifest.potions.len(),
        manifest.doors.len(),
    );
    Ok(())
}

/// Running totals of what happened during a simulated run.
#[derive(Debug, Default)]
struct Tally {
    shots: u32,
    hits: u32,
    headshots: u32,
    kills: u32,
    props_destroyed: u32,
    damage_taken: f32,
    potions: u32,
    doors_opened: u32,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match event {
            Event::BulletFired { .. } => self.shots += 1,
            Event::EnemyHit { headshot, .. } => {
                self.hits += 1;
                if *headshot {
                    self.headshots += 1;
                }
            }
            Event::EnemyKilled { .. } => self.kills += 1,
            Event::PropDestroyed { .. } => self.props_destroyed += 1,
            Event::PlayerDamaged { amount, .. } => self.damage_taken += amount,
            Event::PotionCollected { .. } => self.potions += 1,
            Event::DoorOpened { .. } => self.doors_opened += 1,
            _ => {}
        }
    }
}

fn simulate(mut world: World, args: &SimulateArgs) -> Result<()> {
    let manifest = start(&mut world, args.seed, 1)?;
    info!(
        level = manifest.level,
        seed = manifest.seed,
        enemies = manifest.enemies.len(),
        "simulation started"
    );

    let dt = Duration::from_millis(args.dt_ms);
    let mut autopilot = Autopilot::new();
    let mut tally = Tally::default();
    let mut events = Vec::new();
    let mut ticks = 0;

    while ticks < args.ticks && query::status(&world) == SessionStatus::Playing {
        for command in autopilot.plan(&world, dt) {
            apply(&mut world, command, &mut events);
        }
        if wants_item(&world) {
            apply(&mut world, Command::UseItem, &mut events);
        }
        apply(&mut world, Command::Tick { dt }, &mut events);
        ticks += 1;

        for event in events.drain(..) {
            if !matches!(
                event,
                Event::TimeAdvanced { .. } | Event::EnemyMoved { .. } | Event::PlayerMoved { .. }
            ) {
                debug!(tick = ticks, ?event, "event");
            }
            tally.record(&event);
        }
    }

    let player = query::player(&world);
    let explored = query::discovered(&world)
        .iter()
        .filter(|seen| **seen)
        .count();
    println!("status: {:?} after {ticks} ticks", query::status(&world));
    println!(
        "health: {:.0}  shield: {:.0}  score: {}  key: {}  portal found: {}",
        player.health,
        player.shield,
        player.score,
        query::has_key(&world),
        query::level(&world).is_some_and(|level| level.portal_discovered())
    );
    println!(
        "shots: {}  hits: {} ({} headshots)  kills: {}  enemies left: {}",
        tally.shots,
        tally.hits,
        tally.headshots,
        tally.kills,
        query::remaining_enemies(&world)
    );
    println!(
        "damage taken: {:.0}  potions: {}  props destroyed: {}  doors opened: {}  cells explored: {explored}",
        tally.damage_taken, tally.potions, tally.props_destroyed, tally.doors_opened
    );

    if args.map {
        let manifest = Bootstrap
            .scene_manifest(&world)
            .context("level vanished during the run")?;
        print!("{}", render::ascii_map(&manifest));
    }
    Ok(())
}

/// Uses the held item right away unless it is a medkit kept for later.
fn wants_item(world: &World) -> bool {
    let player = query::player(world);
    match player.held {
        Some(ConsumableKind::Medkit) => player.health < LOW_HEALTH,
        Some(_) => true,
        None => false,
    }
}
