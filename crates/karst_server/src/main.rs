mod commands;
mod config;
mod server;
mod world;

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use server::ServerConfig;

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut config_path = PathBuf::from("worldgen.toml");
    let mut seed_override: Option<u64> = None;
    let mut threads_override: Option<usize> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(value) = args.next() else {
                    eprintln!("--config expects a path argument");
                    std::process::exit(2);
                };
                config_path = PathBuf::from(value);
            }
            "--seed" => {
                let Some(value) = args.next() else {
                    eprintln!("--seed expects a numeric argument");
                    std::process::exit(2);
                };
                match value.parse::<u64>() {
                    Ok(parsed) => seed_override = Some(parsed),
                    Err(err) => {
                        eprintln!("invalid seed '{value}': {err}");
                        std::process::exit(2);
                    }
                }
            }
            "--threads" => {
                let Some(value) = args.next() else {
                    eprintln!("--threads expects a numeric argument");
                    std::process::exit(2);
                };
                match value.parse::<usize>() {
                    Ok(parsed) if parsed > 0 => threads_override = Some(parsed),
                    _ => {
                        eprintln!("invalid thread count '{value}'");
                        std::process::exit(2);
                    }
                }
            }
            "--help" | "-h" => {
                println!(
                    "Usage: karst_server [--config <path>] [--seed <u64>] [--threads <count>]"
                );
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nShutdown signal received...");
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    let config = ServerConfig {
        config_path,
        seed_override,
        threads_override,
    };
    if let Err(err) = server::run(config, running) {
        eprintln!("server failed: {err}");
        std::process::exit(1);
    }
}
