//! Next scheduled game

use super::schedule::{Boundary, RowTiming, ScheduleCursor};
use crate::data::opponents::OpponentTable;
use crate::{NextGame, UpcomingGame};

/// The boundary row as an upcoming game, or `NoUpcomingGames` when the
/// season has run out
pub fn find_next_game(cursor: &ScheduleCursor, team: &str, opponents: &OpponentTable) -> NextGame {
    let Boundary::At(index) = cursor.boundary() else {
        return NextGame::NoUpcomingGames;
    };

    let Some(row) = cursor.table().row(index) else {
        return NextGame::NoUpcomingGames;
    };

    match cursor.timing(row) {
        Ok(RowTiming::Scheduled(at)) => NextGame::Scheduled(UpcomingGame {
            team: team.to_string(),
            opponent: opponents
                .resolve(&row.opponent)
                .unwrap_or_else(|| "TBD".to_string()),
            date_text: row.date_text.clone(),
            scheduled_at: at.fixed_offset(),
        }),
        _ => NextGame::NoUpcomingGames,
    }
}
