//! Per-team extraction operations
//!
//! `TeamExtractor` ties a page source and a clock to the pure page scrapers.
//! Nothing runs on its own: each operation is invoked by the caller for one
//! team and fetches only the pages it needs.

use super::batch::CancelFlag;
use super::opponents::OpponentTable;
use super::scrapers::history::{self, GameHistory, GameLedger};
use super::scrapers::leaders::StatsPage;
use super::scrapers::roster::Roster;
use super::scrapers::schedule::{ScheduleCursor, ScheduleTable};
use super::scrapers::teams::TeamDirectory;
use super::scrapers::upcoming::find_next_game;
use super::scrapers::Period;
use super::source::{Clock, PageSource};
use crate::{Config, DugoutError, LeagueConfig, NextGame, Result, TeamMeta};
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

/// Fetch the league teams feed and build the directory for the clock's current year
pub fn fetch_directory(
    source: &dyn PageSource,
    clock: &dyn Clock,
    zone: Tz,
    league: &LeagueConfig,
) -> Result<TeamDirectory> {
    let current_year = clock.now(zone).year();
    log::info!("Fetching {} teams feed for {}", league.league, current_year);
    let body = source.fetch_page(&league.teams_feed_url)?;
    TeamDirectory::from_feed(&body, league, current_year)
}

pub struct TeamExtractor<'a> {
    source: &'a dyn PageSource,
    clock: &'a dyn Clock,
    zone: Tz,
    opponents: OpponentTable,
    max_games: usize,
    standing_markers: Vec<String>,
    cancel: Option<CancelFlag>,
}

impl<'a> TeamExtractor<'a> {
    pub fn new(source: &'a dyn PageSource, clock: &'a dyn Clock, zone: Tz) -> Self {
        let defaults = Config::default();
        TeamExtractor {
            source,
            clock,
            zone,
            opponents: OpponentTable::new(),
            max_games: defaults.extraction.max_games,
            standing_markers: defaults.league.standing_markers,
            cancel: None,
        }
    }

    /// Extractor configured from `config`, resolving opponents against `directory`
    pub fn from_config(
        source: &'a dyn PageSource,
        clock: &'a dyn Clock,
        config: &Config,
        directory: &TeamDirectory,
    ) -> Result<Self> {
        Ok(TeamExtractor::new(source, clock, config.reference_zone()?)
            .with_opponents(OpponentTable::with_directory(directory))
            .with_max_games(config.extraction.max_games)
            .with_standing_markers(config.league.standing_markers.clone()))
    }

    pub fn with_opponents(mut self, opponents: OpponentTable) -> Self {
        self.opponents = opponents;
        self
    }

    pub fn with_max_games(mut self, max_games: usize) -> Self {
        self.max_games = max_games;
        self
    }

    pub fn with_standing_markers(mut self, markers: Vec<String>) -> Self {
        self.standing_markers = markers;
        self
    }

    /// Refuse further fetches once `flag` is raised
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn max_games(&self) -> usize {
        self.max_games
    }

    /// Current instant in the reference zone
    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now(self.zone)
    }

    fn fetch(&self, url: &str) -> Result<String> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Err(DugoutError::Cancelled);
        }
        self.source.fetch_page(url)
    }

    /// Fetch and parse one season's schedule page
    pub fn schedule(&self, team: &TeamMeta, period: Period) -> Result<ScheduleTable> {
        let html = self.fetch(period.schedule_url(team))?;
        let table = ScheduleTable::parse(&html, period.year(team));
        log::info!(
            "{}: {} schedule rows for {}",
            team.display_name,
            table.rows().len(),
            table.reference_year
        );
        Ok(table)
    }

    /// Up to `max_games` most recent completed games, most recent first
    pub fn recent_games(&self, team: &TeamMeta) -> Result<GameHistory> {
        let now = self.now();
        let current = self.schedule(team, Period::Current)?;
        self.recent_games_in(team, current, now, &mut GameLedger::new())
    }

    /// Recent games starting from an already-fetched current schedule.
    ///
    /// The prior season is fetched only if `current` has nothing played.
    pub fn recent_games_in(
        &self,
        team: &TeamMeta,
        current: ScheduleTable,
        now: DateTime<Tz>,
        ledger: &mut GameLedger,
    ) -> Result<GameHistory> {
        let mut current = Some(current);
        history::recent_games(
            team,
            |period| match (period, current.take()) {
                (Period::Current, Some(table)) => Ok(table),
                _ => self.schedule(team, period),
            },
            now,
            &self.opponents,
            self.max_games,
            ledger,
        )
    }

    /// The next scheduled game in the current season
    pub fn next_game(&self, team: &TeamMeta) -> Result<NextGame> {
        let now = self.now();
        let current = self.schedule(team, Period::Current)?;
        Ok(self.next_game_in(team, &current, now))
    }

    pub fn next_game_in(&self, team: &TeamMeta, current: &ScheduleTable, now: DateTime<Tz>) -> NextGame {
        let cursor = ScheduleCursor::new(current, now);
        find_next_game(&cursor, &team.display_name, &self.opponents)
    }

    /// Leaders and standing; a malformed leader payload is returned beside the page
    pub fn stats(&self, team: &TeamMeta) -> Result<(StatsPage, Option<DugoutError>)> {
        let html = self.fetch(&team.stats_url)?;
        Ok(StatsPage::parse(&html, &team.display_name, &self.standing_markers))
    }

    pub fn roster(&self, team: &TeamMeta) -> Result<Roster> {
        let html = self.fetch(&team.roster_url)?;
        Ok(Roster::parse(&html, &team.display_name))
    }
}
