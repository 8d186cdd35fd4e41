use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use towers::{FlushStats, PresentationCommand, QueuedEvent, SessionRegistry};

use crate::bots::BotDriver;
use crate::config::HostConfig;
use crate::view::ChannelView;

#[derive(Debug, Clone, Copy, Default)]
pub struct HostStats {
    pub ticks: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Drives the session registry from a fixed-rate tick and feeds it scripted players.
pub struct HostServer {
    config: HostConfig,
    sessions: SessionRegistry,
    view: ChannelView,
    bots: BotDriver,
    stats: HostStats,
    tick_duration: Duration,
    last_tick_time: Instant,
    accumulator: Duration,
    running: Arc<AtomicBool>,
}

impl HostServer {
    pub fn new(config: HostConfig, tx: UnboundedSender<PresentationCommand>) -> anyhow::Result<Self> {
        anyhow::ensure!(config.tick_rate > 0, "tick rate must be positive");
        let mut sessions = SessionRegistry::new(config.registry.clone());
        for arena in &config.arenas {
            sessions.create_session(arena.as_str())?;
        }

        Ok(Self {
            tick_duration: Duration::from_secs_f64(1.0 / config.tick_rate as f64),
            sessions,
            view: ChannelView::new(tx),
            bots: BotDriver::new(&config.arenas, config.bots_per_arena, config.seed),
            stats: HostStats::default(),
            last_tick_time: Instant::now(),
            accumulator: Duration::ZERO,
            running: Arc::new(AtomicBool::new(true)),
            config,
        })
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = QueuedEvent> + '_ {
        self.sessions.drain_events()
    }

    pub fn run(&mut self, mut on_event: impl FnMut(&QueuedEvent)) {
        while self.running.load(Ordering::SeqCst) {
            self.tick_once();
            for event in self.drain_events() {
                on_event(&event);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        self.shutdown();
        for event in self.drain_events() {
            on_event(&event);
        }
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();
        self.accumulator += now - self.last_tick_time;
        self.last_tick_time = now;

        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.tick();

            if self
                .config
                .max_ticks
                .is_some_and(|max| self.stats.ticks >= max)
            {
                self.running.store(false, Ordering::SeqCst);
                break;
            }
        }
    }

    fn tick(&mut self) {
        let next = self.sessions.current_tick() + 1;
        self.bots.step(next, &mut self.sessions, &mut self.view);

        let FlushStats { sent, failed, .. } = self.sessions.tick(&mut self.view);
        self.stats.ticks += 1;
        self.stats.sent += sent as u64;
        self.stats.failed += failed as u64;
    }

    pub fn shutdown(&mut self) {
        self.bots.leave_all(&mut self.sessions, &mut self.view);
        let ids: Vec<_> = self.sessions.sessions().map(|game| game.id()).collect();
        for match_id in ids {
            self.sessions.remove_session(match_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use towers::MatchEvent;

    #[test]
    fn ticks_create_traffic() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = HostConfig {
            bots_per_arena: 2,
            ..HostConfig::default()
        };
        let mut host = HostServer::new(config, tx).unwrap();

        for _ in 0..20 {
            host.tick();
        }
        assert_eq!(host.stats().ticks, 20);
        assert!(host.stats().sent > 0);
        assert!(rx.try_recv().is_ok());

        host.shutdown();
        let closed = host
            .drain_events()
            .filter(|e| matches!(e.event, MatchEvent::SessionClosed { .. }))
            .count();
        assert_eq!(closed, 1);
    }
}
