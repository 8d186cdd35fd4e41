use super::types::{Phase, PhaseTimer, PhaseTransition, PhaseTrigger};
use crate::config::{MatchSettings, TieBreak};
use crate::error::MatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    pub countdown_ticks: u32,
    pub round_ticks: Option<u32>,
    pub overtime_ticks: Option<u32>,
    pub post_match_ticks: u32,
}

impl From<&MatchSettings> for PhaseTimings {
    fn from(settings: &MatchSettings) -> Self {
        Self {
            countdown_ticks: settings.countdown_ticks,
            round_ticks: settings.round_ticks,
            overtime_ticks: match settings.tie_break {
                TieBreak::Overtime { ticks } => Some(ticks),
                TieBreak::Draw => None,
            },
            post_match_ticks: settings.post_match_ticks,
        }
    }
}

/// Tick-counted phase state for one match.
///
/// All timing is expressed in host ticks, so feeding the same sequence of
/// `(tick, trigger)` inputs always produces the same transitions.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: Phase,
    entered_at: u64,
    timings: PhaseTimings,
}

impl PhaseMachine {
    pub fn new(timings: PhaseTimings, now: u64) -> Self {
        Self {
            phase: Phase::Lobby,
            entered_at: now,
            timings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn entered_at(&self) -> u64 {
        self.entered_at
    }

    pub fn timings(&self) -> &PhaseTimings {
        &self.timings
    }

    /// Applies a game-flow trigger. Triggers outside the table are ignored.
    pub fn fire(&mut self, trigger: PhaseTrigger, now: u64) -> Option<PhaseTransition> {
        let Some(to) = self.phase.next(trigger) else {
            log::trace!(
                "Ignoring {:?} in phase {}",
                trigger,
                self.phase.as_str()
            );
            return None;
        };
        Some(self.enter(to, trigger, now, false))
    }

    /// Administrative move to `target`, allowed only along a table edge.
    pub fn request(&mut self, target: Phase, now: u64) -> Result<PhaseTransition, MatchError> {
        let trigger = PhaseTrigger::ALL
            .into_iter()
            .find(|&t| self.phase.next(t) == Some(target))
            .ok_or(MatchError::InvalidTransition {
                from: self.phase,
                to: target,
            })?;
        Ok(self.enter(target, trigger, now, true))
    }

    pub fn reset(&mut self, now: u64) -> PhaseTransition {
        self.enter(Phase::Lobby, PhaseTrigger::AdminReset, now, true)
    }

    /// The tick at which the current phase's timer fires, if it has one.
    pub fn deadline(&self) -> Option<u64> {
        let length = match self.phase {
            Phase::Lobby => None,
            Phase::Countdown => Some(self.timings.countdown_ticks),
            Phase::Active => self.timings.round_ticks,
            Phase::Overtime => self.timings.overtime_ticks,
            Phase::Ended => Some(self.timings.post_match_ticks),
        }?;
        Some(self.entered_at + length as u64)
    }

    pub fn remaining_ticks(&self, now: u64) -> Option<u64> {
        self.deadline().map(|deadline| deadline.saturating_sub(now))
    }

    /// Reports the current phase's timer once its deadline has been reached.
    ///
    /// The machine does not move on its own; the caller turns the timer into
    /// a trigger after resolving whatever the phase needs (e.g. standings).
    pub fn poll_timer(&self, now: u64) -> Option<PhaseTimer> {
        if now < self.deadline()? {
            return None;
        }
        Some(match self.phase {
            Phase::Countdown => PhaseTimer::CountdownElapsed,
            Phase::Active => PhaseTimer::RoundElapsed,
            Phase::Overtime => PhaseTimer::OvertimeElapsed,
            Phase::Ended => PhaseTimer::PostMatchElapsed,
            Phase::Lobby => return None,
        })
    }

    fn enter(&mut self, to: Phase, trigger: PhaseTrigger, now: u64, forced: bool) -> PhaseTransition {
        let from = self.phase;
        self.phase = to;
        self.entered_at = now;

        PhaseTransition {
            from,
            to,
            trigger,
            tick: now,
            forced,
        }
    }
}
