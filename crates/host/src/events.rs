use towers::{MatchEvent, QueuedEvent};

/// Writes a drained match event to the log.
pub fn log_event(queued: &QueuedEvent) {
    match &queued.event {
        MatchEvent::SessionCreated { match_id, arena } => {
            log::info!("[{}] Match {} opened in {}", queued.tick, match_id, arena);
        }
        MatchEvent::PlayerJoined {
            match_id,
            player_id,
            team_id,
        } => match team_id {
            Some(team_id) => log::info!(
                "[{}] Player {} joined match {} on team {}",
                queued.tick,
                player_id,
                match_id,
                team_id
            ),
            None => log::info!(
                "[{}] Player {} is spectating match {}",
                queued.tick,
                player_id,
                match_id
            ),
        },
        MatchEvent::PlayerLeft {
            match_id,
            player_id,
        } => {
            log::info!("[{}] Player {} left match {}", queued.tick, player_id, match_id);
        }
        MatchEvent::TeamChanged {
            match_id,
            player_id,
            from,
            to,
        } => {
            log::debug!(
                "[{}] Player {} in match {} moved from {:?} to {:?}",
                queued.tick,
                player_id,
                match_id,
                from,
                to
            );
        }
        MatchEvent::PhaseChanged {
            match_id,
            transition,
        } => {
            log::debug!(
                "[{}] Match {} phase {} -> {} ({:?})",
                queued.tick,
                match_id,
                transition.from.as_str(),
                transition.to.as_str(),
                transition.trigger
            );
        }
        MatchEvent::MatchEnded { match_id, outcome } => {
            let points: Vec<String> = outcome
                .points
                .iter()
                .map(|(team, points)| format!("{}:{}", team, points))
                .collect();
            match outcome.winner {
                Some(team_id) => log::info!(
                    "[{}] Match {} won by team {} in {} [{}]",
                    queued.tick,
                    match_id,
                    team_id,
                    outcome.decided_in.as_str(),
                    points.join(" ")
                ),
                None => log::info!(
                    "[{}] Match {} ended in a draw [{}]",
                    queued.tick,
                    match_id,
                    points.join(" ")
                ),
            }
        }
        MatchEvent::SessionClosed {
            match_id,
            reason,
            players,
        } => {
            log::info!(
                "[{}] Match {} closed ({}), releasing {} player(s)",
                queued.tick,
                match_id,
                reason.as_str(),
                players.len()
            );
        }
    }
}
