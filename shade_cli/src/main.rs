#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]

mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use shade_core::{Command, TickStatus};

fn init_logging(json: bool, level: &str, file: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = file {
        let path = Path::new(path);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let name = path.file_name().map(std::ffi::OsStr::to_os_string);
        if let (Some(dir), Some(name)) = (dir.or(Some(Path::new("."))), name) {
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
            return;
        }
    }

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn real_main(args: Cli) -> eyre::Result<()> {
    let text = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("read config file {}", args.config.display()))?;
    let cfg = shade_config::load_toml(&text).wrap_err("parse config TOML")?;

    // The flag wins unless left at its default; then the config may raise or
    // lower the console level.
    let level = if args.log_level == "info" {
        cfg.logging.level.clone().unwrap_or_else(|| args.log_level.clone())
    } else {
        args.log_level.clone()
    };
    init_logging(args.json, &level, cfg.logging.file.as_deref());

    cfg.validate().wrap_err("invalid configuration")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .wrap_err("install Ctrl-C handler")?;
    }

    let command = match &args.cmd {
        Commands::MovePercent { percent } => Some(Command::MoveToPercent(*percent)),
        Commands::MoveTo { position } => Some(Command::MoveToPosition(*position)),
        Commands::SetMin => Some(Command::SetMin),
        Commands::SetMax => Some(Command::SetMax),
        Commands::Status | Commands::SelfCheck => None,
    };

    let mut assembled = run::assemble(&cfg)?;

    let Some(command) = command else {
        let sup = &assembled.supervisor;
        match &args.cmd {
            Commands::SelfCheck => {
                if args.json {
                    println!("{}", serde_json::json!({ "status": "ok" }));
                } else {
                    println!("self-check ok");
                }
            }
            _ => {
                if args.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "percent": sup.percent(),
                            "position": sup.position(),
                            "max_position": sup.max_position(),
                        })
                    );
                } else {
                    println!(
                        "position {} of {} ({}%)",
                        sup.position(),
                        sup.max_position(),
                        sup.percent()
                    );
                }
            }
        }
        return Ok(());
    };

    assembled.supervisor.handle(command)?;
    let outcome = run::drive(&mut assembled.supervisor, assembled.tick_interval, &shutdown)?;

    let sup = &assembled.supervisor;
    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "status": run::status_name(outcome.status),
                "percent": sup.percent(),
                "position": sup.position(),
                "max_position": sup.max_position(),
                "ticks": outcome.ticks,
            })
        );
    } else {
        match outcome.status {
            TickStatus::Stalled { percent } => {
                println!("stalled at {percent}% (position {})", sup.position());
            }
            _ => {
                println!(
                    "done: {}% (position {} of {})",
                    sup.percent(),
                    sup.position(),
                    sup.max_position()
                );
            }
        }
    }

    if matches!(outcome.status, TickStatus::Stalled { .. }) {
        return Err(eyre::Report::new(shade_core::ShadeError::Stall));
    }
    Ok(())
}

fn main() {
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporting: {e}");
    }

    if let Err(err) = real_main(args) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}
