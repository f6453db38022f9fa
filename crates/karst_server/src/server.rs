use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use karst_core::events::{self, EventReceiver};
use karst_core::jobs::JobSystem;

use crate::commands::{self, Command};
use crate::config;
use crate::world::ServerWorld;

const IDLE_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub config_path: PathBuf,
    pub seed_override: Option<u64>,
    pub threads_override: Option<usize>,
}

pub fn run(config: ServerConfig, running: Arc<AtomicBool>) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = config::load(&config.config_path)?;
    if let Some(seed) = config.seed_override {
        settings.worldgen.seed = seed;
    }
    let threads = config.threads_override.or(settings.threads);

    let jobs = JobSystem::new(threads)?;
    let mut world = ServerWorld::new(&settings.worldgen);
    info!(
        seed = world.seed(),
        threads = jobs.num_threads(),
        "karst worldgen server ready; type 'help' for commands"
    );

    let command_rx = spawn_console_reader();

    while running.load(Ordering::SeqCst) {
        match command_rx.try_recv() {
            Ok(command) => {
                if !handle_command(&mut world, &jobs, command) {
                    break;
                }
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => std::thread::sleep(IDLE_POLL),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => break,
        }
    }

    info!("server shutting down");
    Ok(())
}

fn spawn_console_reader() -> EventReceiver<Command> {
    let (tx, rx) = events::channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(commands::parse_command(&line)).is_err() {
                break;
            }
        }
    });
    rx
}

fn handle_command(world: &mut ServerWorld, jobs: &JobSystem, command: Command) -> bool {
    match command {
        Command::Noop => {}
        Command::Stop => return false,
        Command::Help => {
            info!("commands: help | seed | stats | regen [radius] | stop");
        }
        Command::Seed => {
            info!(seed = world.seed(), "world seed");
        }
        Command::Stats => {
            info!(columns = world.column_count(), "loaded columns");
        }
        Command::Regen(radius) => {
            let started = Instant::now();
            let report = world.regenerate_area(radius, jobs);
            info!(
                columns = report.columns,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "regen finished"
            );
        }
        Command::InvalidUsage(message) => warn!("{message}"),
        Command::Unknown(input) => warn!("unknown command: {input}"),
    }
    true
}
