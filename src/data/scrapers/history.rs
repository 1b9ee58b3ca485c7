//! Recent completed games and the running season record
//!
//! Walks backward from the last played row of a schedule, keeping at most
//! `max_games` distinct games. When the current season has nothing played
//! yet, the prior season is used instead, once.

use super::schedule::{parse_record, ScheduleCursor, ScheduleTable};
use super::Period;
use crate::data::opponents::OpponentTable;
use crate::{CompletedGame, DugoutError, Result, SeasonRecord, TeamMeta};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Outcome and score read from a result cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub won: bool,
    pub team_score: u16,
    pub opponent_score: u16,
}

fn result_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([WL])\s*(\d{1,3})\s*-\s*(\d{1,3})").unwrap())
}

/// Parse "W 5-3", "L 2-4 F/10" and the like.
///
/// Anything after the opponent score (extra-innings markers such as "F/13")
/// is ignored.
pub fn parse_result(text: &str) -> Option<GameResult> {
    let caps = result_pattern().captures(text.trim())?;
    Some(GameResult {
        won: caps.get(1)?.as_str() == "W",
        team_score: caps.get(2)?.as_str().parse().ok()?,
        opponent_score: caps.get(3)?.as_str().parse().ok()?,
    })
}

/// Accumulates completed games and hands out sequential ids
#[derive(Debug, Clone, Default)]
pub struct GameLedger {
    games: Vec<CompletedGame>,
    next_id: u32,
}

impl GameLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a game unless an identical one is already present.
    ///
    /// Duplicates do not consume an id.
    pub fn admit(
        &mut self,
        team: &str,
        opponent: &str,
        date: NaiveDate,
        result: GameResult,
    ) -> Option<CompletedGame> {
        let duplicate = self.games.iter().any(|g| {
            g.dedup_key() == (team, opponent, date, result.opponent_score)
        });
        if duplicate {
            return None;
        }

        let game = CompletedGame {
            game_id: self.next_id,
            team: team.to_string(),
            opponent: opponent.to_string(),
            date,
            won: result.won,
            team_score: result.team_score,
            opponent_score: result.opponent_score,
        };
        self.next_id += 1;
        self.games.push(game.clone());
        Some(game)
    }

    pub fn games(&self) -> &[CompletedGame] {
        &self.games
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }
}

/// Recent form for one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistory {
    pub team: String,
    pub period: Period,
    pub season_year: i32,
    /// Set when the games come from the prior season
    pub advisory: Option<String>,
    pub record: Option<SeasonRecord>,
    /// Most recent first
    pub games: Vec<CompletedGame>,
}

/// Season record from the last played row, or the closest earlier row that has one
pub fn season_record(table: &ScheduleTable, last_played: usize, team: &str) -> Option<SeasonRecord> {
    table.rows_back_from(last_played).find_map(|row| {
        let (wins, losses) = parse_record(row.record_text.as_deref()?)?;
        Some(SeasonRecord {
            team: team.to_string(),
            wins,
            losses,
        })
    })
}

/// Collect up to `max_games` completed games before the cursor's boundary.
///
/// Returns `None` when nothing has been played: an empty table, a boundary
/// at the first row, or no row before the boundary with a usable result.
pub fn collect_recent_games(
    cursor: &ScheduleCursor,
    team: &str,
    opponents: &OpponentTable,
    max_games: usize,
    ledger: &mut GameLedger,
) -> Option<(Option<SeasonRecord>, Vec<CompletedGame>)> {
    let table = cursor.table();
    let last_played = cursor.last_played_index()?;
    let record = season_record(table, last_played, team);

    let mut games = Vec::new();
    for row in table.rows_back_from(last_played) {
        if games.len() >= max_games {
            break;
        }

        let Some(result) = parse_result(&row.time_or_result) else {
            log::debug!("Row {}: no result in {:?}", row.index, row.time_or_result);
            continue;
        };
        let Some(opponent) = opponents.resolve(&row.opponent) else {
            log::debug!("Row {}: no opponent", row.index);
            continue;
        };
        let Some(date) = table.season_date(&row.date_text) else {
            log::debug!("Row {}: bad date {:?}", row.index, row.date_text);
            continue;
        };

        match ledger.admit(team, &opponent, date, result) {
            Some(game) => games.push(game),
            None => log::debug!("Row {}: duplicate of an earlier game", row.index),
        }
    }

    if games.is_empty() {
        None
    } else {
        Some((record, games))
    }
}

/// Recent games for a team, falling back to the prior season once.
///
/// `load` fetches and parses the schedule for a period.
pub fn recent_games<F>(
    team: &TeamMeta,
    mut load: F,
    now: DateTime<Tz>,
    opponents: &OpponentTable,
    max_games: usize,
    ledger: &mut GameLedger,
) -> Result<GameHistory>
where
    F: FnMut(Period) -> Result<ScheduleTable>,
{
    history_for_period(team, Period::Current, &mut load, now, opponents, max_games, ledger)
}

fn history_for_period<F>(
    team: &TeamMeta,
    period: Period,
    load: &mut F,
    now: DateTime<Tz>,
    opponents: &OpponentTable,
    max_games: usize,
    ledger: &mut GameLedger,
) -> Result<GameHistory>
where
    F: FnMut(Period) -> Result<ScheduleTable>,
{
    let table = load(period)?;
    let cursor = ScheduleCursor::new(&table, now);

    if let Some((record, games)) =
        collect_recent_games(&cursor, &team.display_name, opponents, max_games, ledger)
    {
        log::info!(
            "{}: {} recent games from {} season",
            team.display_name,
            games.len(),
            table.reference_year
        );
        return Ok(GameHistory {
            team: team.display_name.clone(),
            period,
            season_year: table.reference_year,
            advisory: None,
            record,
            games,
        });
    }

    match period.fallback() {
        Some(previous) => {
            log::info!(
                "{}: no completed games in {}, trying prior season",
                team.display_name,
                table.reference_year
            );
            let mut history =
                history_for_period(team, previous, load, now, opponents, max_games, ledger)?;
            history.advisory = Some(format!(
                "No games played yet in {}; showing {} season",
                table.reference_year, history.season_year
            ));
            Ok(history)
        }
        None => Err(DugoutError::NoGameData {
            team: team.display_name.clone(),
        }),
    }
}
