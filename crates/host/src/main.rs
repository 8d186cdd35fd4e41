mod bots;
mod config;
mod events;
mod host;
mod io;
mod view;

use std::sync::atomic::Ordering;

use anyhow::{anyhow, Result};
use clap::Parser;
use tokio::sync::mpsc;

use config::HostConfig;
use host::HostServer;
use towers::{MatchSettings, RegistrySettings, TieBreak};

#[derive(Parser)]
#[command(name = "towers-host")]
#[command(about = "Headless host running scripted towers matches")]
struct Args {
    #[arg(short, long, default_value_t = 20)]
    tick_rate: u32,

    #[arg(short, long = "arena", default_value = "arena-1")]
    arenas: Vec<String>,

    #[arg(short, long, default_value_t = 4)]
    bots: u32,

    #[arg(long, help = "Stop after this many ticks")]
    max_ticks: Option<u64>,

    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    #[arg(long, default_value_t = 2, help = "Teams per match (2, 4 or 6)")]
    teams: u8,

    #[arg(long, default_value_t = 4)]
    team_size: u8,

    #[arg(long, default_value_t = 2)]
    min_players: u8,

    #[arg(long, default_value_t = 10, help = "Countdown length in seconds")]
    countdown: u32,

    #[arg(long, default_value_t = 300, help = "Round length in seconds, 0 for none")]
    round: u32,

    #[arg(long, help = "Points needed to win outright")]
    points_to_win: Option<u32>,

    #[arg(long, default_value_t = 60, help = "Overtime length in seconds, 0 to draw ties")]
    overtime: u32,
}

impl Args {
    fn into_config(self) -> Result<HostConfig> {
        let ticks = |seconds: u32| {
            seconds.checked_mul(self.tick_rate).ok_or_else(|| {
                anyhow!(
                    "{} seconds is too long at {} ticks per second",
                    seconds,
                    self.tick_rate
                )
            })
        };
        let default_match = MatchSettings {
            team_count: self.teams,
            team_capacity: self.team_size,
            min_players: self.min_players,
            countdown_ticks: ticks(self.countdown)?,
            round_ticks: match self.round {
                0 => None,
                round => Some(ticks(round)?),
            },
            points_to_win: self.points_to_win,
            tie_break: match self.overtime {
                0 => TieBreak::Draw,
                overtime => TieBreak::Overtime {
                    ticks: ticks(overtime)?,
                },
            },
            ..MatchSettings::default()
        };

        Ok(HostConfig {
            tick_rate: self.tick_rate,
            arenas: self.arenas,
            bots_per_arena: self.bots,
            max_ticks: self.max_ticks,
            seed: self.seed,
            registry: RegistrySettings {
                default_match,
                ..RegistrySettings::default()
            },
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    config.registry.default_match.validate()?;
    let setup = config.registry.default_match.team_setup_label();

    let runtime = tokio::runtime::Runtime::new()?;
    let (tx, rx) = mpsc::unbounded_channel();
    let encoder = runtime.spawn(io::run_encoder(rx));

    let mut server = HostServer::new(config, tx)?;
    let running = server.running();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            running.store(false, Ordering::SeqCst);
        }
    });

    log::info!(
        "Host started with {} bot(s), {}",
        server.bot_count(),
        setup
    );
    server.run(events::log_event);

    let stats = server.stats();
    drop(server);
    let io_stats = runtime.block_on(encoder)?;

    log::info!(
        "Host shutting down after {} ticks: {} presentation updates sent, {} failed",
        stats.ticks,
        stats.sent,
        stats.failed
    );
    log::info!(
        "Encoded {} packets ({} bytes, {} errors)",
        io_stats.packets,
        io_stats.bytes,
        io_stats.errors
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Result<HostConfig> {
        let mut argv = vec!["towers-host"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv)?.into_config()
    }

    #[test]
    fn seconds_become_ticks() {
        let config = config(&["--tick-rate", "10", "--round", "0", "--overtime", "5"]).unwrap();
        let settings = &config.registry.default_match;
        assert_eq!(settings.countdown_ticks, 100);
        assert_eq!(settings.round_ticks, None);
        assert_eq!(settings.tie_break, TieBreak::Overtime { ticks: 50 });
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let err = config(&["--tick-rate", "1000", "--round", "4294968"]).unwrap_err();
        assert!(err.to_string().contains("4294968 seconds"));
        assert!(config(&["--tick-rate", "4294967295", "--countdown", "2"]).is_err());
    }
}
