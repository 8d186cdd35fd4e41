use towers::{GameAction, MatchId, Phase, PlayerId, PlayerRef, SessionRegistry};

use crate::view::ChannelView;

const REJOIN_DELAY: u64 = 40;

/// Deterministic splitmix64 stream, so a seed always replays the same match.
#[derive(Debug, Clone)]
struct Dice(u64);

impl Dice {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn one_in(&mut self, n: u64) -> bool {
        self.next() % n == 0
    }
}

#[derive(Debug)]
struct Bot {
    id: PlayerId,
    name: String,
    arena: String,
    join_at: u64,
    session: Option<MatchId>,
    busy_until: Option<u64>,
    health: f32,
}

/// Scripted players standing in for real connections.
#[derive(Debug)]
pub struct BotDriver {
    dice: Dice,
    bots: Vec<Bot>,
}

impl BotDriver {
    pub fn new(arenas: &[String], per_arena: u32, seed: u64) -> Self {
        let mut bots = Vec::new();
        let mut next_id: PlayerId = 1;

        for arena in arenas {
            for slot in 0..per_arena {
                bots.push(Bot {
                    id: next_id,
                    name: format!("bot{}", next_id),
                    arena: arena.clone(),
                    join_at: 1 + slot as u64 * 5,
                    session: None,
                    busy_until: None,
                    health: 20.0,
                });
                next_id += 1;
            }
        }

        Self {
            dice: Dice(seed),
            bots,
        }
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn step(&mut self, tick: u64, sessions: &mut SessionRegistry, view: &mut ChannelView) {
        for bot in &mut self.bots {
            // The session may have been torn down since the last tick.
            if bot.session.is_some() && sessions.session_of(bot.id).is_none() {
                bot.session = None;
                bot.busy_until = None;
                bot.join_at = tick + REJOIN_DELAY;
            }

            let Some(match_id) = bot.session else {
                if tick >= bot.join_at {
                    view.connect(bot.id);
                    match sessions.join(&bot.arena, PlayerRef::new(bot.id, bot.name.clone())) {
                        Ok(match_id) => bot.session = Some(match_id),
                        Err(e) => {
                            log::warn!("{} could not join {}: {}", bot.name, bot.arena, e);
                            bot.join_at = tick + REJOIN_DELAY;
                        }
                    }
                }
                continue;
            };

            let phase = sessions
                .get_session(match_id)
                .map(|game| game.phase())
                .unwrap_or(Phase::Ended);
            if !phase.allows_combat() {
                bot.health = 20.0;
                continue;
            }

            let action = if bot.busy_until.is_some_and(|until| tick >= until) {
                bot.busy_until = None;
                Some(GameAction::ActionCompleted { player_id: bot.id })
            } else if bot.busy_until.is_none() && self.dice.one_in(60) {
                bot.busy_until = Some(tick + 10);
                Some(GameAction::ActionStarted { player_id: bot.id })
            } else if self.dice.one_in(150) {
                Some(GameAction::ObjectiveCaptured { player_id: bot.id })
            } else if self.dice.one_in(12) {
                let damage = (self.dice.next() % 6) as f32 * 0.5;
                bot.health = (bot.health - damage).max(1.0);
                Some(GameAction::HealthChanged {
                    player_id: bot.id,
                    health: bot.health,
                })
            } else if self.dice.one_in(400) {
                Some(GameAction::ToggleNameTag { player_id: bot.id })
            } else {
                None
            };

            if let Some(action) = action {
                if let Err(e) = sessions.action(match_id, action) {
                    log::debug!("{} action {:?} rejected: {}", bot.name, action, e);
                }
            }
        }
    }

    /// Disconnects every bot, as a host would on shutdown.
    pub fn leave_all(&mut self, sessions: &mut SessionRegistry, view: &mut ChannelView) {
        for bot in &mut self.bots {
            if bot.session.take().is_some() {
                if let Err(e) = sessions.leave(bot.id) {
                    log::debug!("{} could not leave: {}", bot.name, e);
                }
            }
            view.disconnect(bot.id);
        }
    }
}
