//! League-wide extraction on a bounded worker pool
//!
//! Each team is extracted independently. A failure is recorded on that
//! team's report and never stops its siblings; raising the cancel flag stops
//! new fetches while keeping whatever has already completed.

use super::extractor::TeamExtractor;
use super::scrapers::history::{GameHistory, GameLedger};
use super::scrapers::leaders::StatsPage;
use super::scrapers::roster::Roster;
use super::scrapers::Period;
use crate::{DugoutError, NextGame, Result, TeamMeta};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop signal, cheap to clone into other threads
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Schedule,
    History,
    Leaders,
    Stats,
    Roster,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Schedule => "schedule",
            Stage::History => "history",
            Stage::Leaders => "leaders",
            Stage::Stats => "stats",
            Stage::Roster => "roster",
        };
        write!(f, "{}", name)
    }
}

/// A recovered per-team error
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub team: TeamMeta,
    pub history: Option<GameHistory>,
    pub next_game: Option<NextGame>,
    pub stats: Option<StatsPage>,
    pub roster: Option<Roster>,
    pub failures: Vec<Failure>,
    pub cancelled: bool,
}

impl TeamReport {
    fn new(team: &TeamMeta) -> Self {
        TeamReport {
            team: team.clone(),
            history: None,
            next_game: None,
            stats: None,
            roster: None,
            failures: Vec::new(),
            cancelled: false,
        }
    }

    /// Record `error` against `stage`; cancellation marks the report instead
    fn fail(&mut self, stage: Stage, error: DugoutError) {
        if matches!(error, DugoutError::Cancelled) {
            self.cancelled = true;
            return;
        }
        log::warn!("{} {}: {}", self.team.display_name, stage, error);
        self.failures.push(Failure {
            stage,
            message: error.to_string(),
        });
    }

    /// Every stage produced a result
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueReport {
    pub teams: Vec<TeamReport>,
    pub cancelled: bool,
}

impl LeagueReport {
    pub fn failed(&self) -> impl Iterator<Item = &TeamReport> {
        self.teams.iter().filter(|r| !r.failures.is_empty())
    }
}

pub struct BatchRunner<'a> {
    extractor: &'a TeamExtractor<'a>,
    workers: usize,
    cancel: CancelFlag,
}

impl<'a> BatchRunner<'a> {
    /// `extractor` should carry the same flag via `TeamExtractor::with_cancel`
    /// for cancellation to reach fetches already under way
    pub fn new(extractor: &'a TeamExtractor<'a>, workers: usize, cancel: CancelFlag) -> Self {
        BatchRunner {
            extractor,
            workers: workers.max(1),
            cancel,
        }
    }

    /// Extract every team in `teams`, in order, on the worker pool
    pub fn run(&self, teams: &[&TeamMeta]) -> Result<LeagueReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| DugoutError::Config(format!("Failed to start worker pool: {}", e)))?;

        log::info!("Extracting {} teams on {} workers", teams.len(), self.workers);

        let reports: Vec<TeamReport> =
            pool.install(|| teams.par_iter().map(|team| self.run_team(team)).collect());

        let cancelled = self.cancel.is_cancelled();
        let done = reports.iter().filter(|r| r.is_complete()).count();
        log::info!("{}/{} teams extracted without failures", done, reports.len());

        Ok(LeagueReport {
            teams: reports,
            cancelled,
        })
    }

    fn run_team(&self, team: &TeamMeta) -> TeamReport {
        let mut report = TeamReport::new(team);
        if self.cancel.is_cancelled() {
            report.cancelled = true;
            return report;
        }

        let now = self.extractor.now();
        match self.extractor.schedule(team, Period::Current) {
            Ok(current) => {
                report.next_game = Some(self.extractor.next_game_in(team, &current, now));
                match self
                    .extractor
                    .recent_games_in(team, current, now, &mut GameLedger::new())
                {
                    Ok(history) => report.history = Some(history),
                    Err(e) => report.fail(Stage::History, e),
                }
            }
            Err(e) => report.fail(Stage::Schedule, e),
        }

        match self.extractor.stats(team) {
            Ok((stats, issue)) => {
                if let Some(e) = issue {
                    report.fail(Stage::Leaders, e);
                }
                report.stats = Some(stats);
            }
            Err(e) => report.fail(Stage::Stats, e),
        }

        match self.extractor.roster(team) {
            Ok(roster) => report.roster = Some(roster),
            Err(e) => report.fail(Stage::Roster, e),
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::FixedClock;
    use crate::data::testing::{
        played, roster_page, roster_section, schedule_page, stats_page, team, upcoming, StaticPages,
    };
    use crate::data::source::PageSource;
    use chrono_tz::America::New_York;

    /// Serves pages from `pages` and raises `flag` once `trigger` has been served
    struct CancelAfter {
        pages: StaticPages,
        trigger: String,
        flag: CancelFlag,
    }

    impl PageSource for CancelAfter {
        fn fetch_page(&self, url: &str) -> Result<String> {
            let body = self.pages.fetch_page(url);
            if url == self.trigger {
                self.flag.cancel();
            }
            body
        }
    }

    fn clock() -> FixedClock {
        FixedClock::parse_rfc3339("2025-04-08T16:00:00Z").unwrap()
    }

    fn league_pages(cubs: &TeamMeta, sox: &TeamMeta) -> StaticPages {
        StaticPages::new()
            .with_page(
                &cubs.current_schedule_url,
                schedule_page(
                    "Chicago Cubs",
                    2025,
                    &[
                        played("Mon, Apr 7", "texas-rangers", "Texas", "W 2-1", "8-5"),
                        upcoming("Tue, Apr 8", "texas-rangers", "Texas", "7:05 PM"),
                    ],
                ),
            )
            .with_page(
                &cubs.stats_url,
                stats_page(
                    r#""teamLeaders":{"leaders":[{"athlete":{"name":"Kyle Tucker"}}]},"dictionary":{}"#,
                    &["1st in NL Central"],
                ),
            )
            .with_page(
                &cubs.roster_url,
                roster_page(&[roster_section("Pitchers", &[("Shota Imanaga", "SP", "")])]),
            )
            // White Sox: no schedule page, broken leader payload
            .with_page(
                &sox.stats_url,
                stats_page(r#""teamLeaders":{"leaders":[{"athlete":},"dictionary":{}"#, &["5th in AL Central"]),
            )
            .with_page(
                &sox.roster_url,
                roster_page(&[roster_section("Catchers", &[("Kyle Teel", "C", "")])]),
            )
    }

    #[test]
    fn test_failures_stay_with_their_team() {
        let cubs = team("Chicago Cubs", "CHC", "chicago-cubs", 2025);
        let sox = team("Chicago White Sox", "CHW", "chicago-white-sox", 2025);
        let pages = league_pages(&cubs, &sox);
        let clock = clock();
        let extractor = TeamExtractor::new(&pages, &clock, New_York);
        let runner = BatchRunner::new(&extractor, 2, CancelFlag::new());

        let report = runner.run(&[&cubs, &sox]).unwrap();
        assert!(!report.cancelled);
        assert_eq!(report.teams.len(), 2);

        let cubs_report = &report.teams[0];
        assert!(cubs_report.is_complete());
        assert_eq!(cubs_report.history.as_ref().unwrap().games.len(), 1);
        assert!(cubs_report.next_game.as_ref().unwrap().upcoming().is_some());

        let sox_report = &report.teams[1];
        let stages: Vec<Stage> = sox_report.failures.iter().map(|f| f.stage).collect();
        assert_eq!(stages, vec![Stage::Schedule, Stage::Leaders]);
        assert!(sox_report.history.is_none());
        assert_eq!(
            sox_report.stats.as_ref().unwrap().standing.as_ref().unwrap().label,
            "5th in AL Central"
        );
        assert_eq!(sox_report.roster.as_ref().unwrap().players.len(), 1);
        assert_eq!(report.failed().count(), 1);
    }

    #[test]
    fn test_cancel_before_run_marks_every_team() {
        let cubs = team("Chicago Cubs", "CHC", "chicago-cubs", 2025);
        let sox = team("Chicago White Sox", "CHW", "chicago-white-sox", 2025);
        let pages = league_pages(&cubs, &sox);
        let clock = clock();
        let flag = CancelFlag::new();
        let extractor = TeamExtractor::new(&pages, &clock, New_York).with_cancel(flag.clone());
        let runner = BatchRunner::new(&extractor, 1, flag.clone());

        flag.cancel();
        let report = runner.run(&[&cubs, &sox]).unwrap();

        assert!(report.cancelled);
        assert!(report.teams.iter().all(|r| r.cancelled && r.failures.is_empty()));
        assert!(report.teams.iter().all(|r| r.history.is_none() && r.roster.is_none()));
    }

    #[test]
    fn test_cancel_mid_run_keeps_completed_teams() {
        let cubs = team("Chicago Cubs", "CHC", "chicago-cubs", 2025);
        let sox = team("Chicago White Sox", "CHW", "chicago-white-sox", 2025);
        let padres = team("San Diego Padres", "SD", "san-diego-padres", 2025);
        let flag = CancelFlag::new();
        // Roster is the last page fetched for a team
        let source = CancelAfter {
            pages: league_pages(&cubs, &sox),
            trigger: cubs.roster_url.clone(),
            flag: flag.clone(),
        };
        let clock = clock();
        let extractor = TeamExtractor::new(&source, &clock, New_York).with_cancel(flag.clone());
        let runner = BatchRunner::new(&extractor, 1, flag);

        let report = runner.run(&[&cubs, &sox, &padres]).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.teams.len(), 3);

        let first = &report.teams[0];
        assert!(first.is_complete());
        assert_eq!(first.history.as_ref().unwrap().games.len(), 1);
        assert_eq!(first.roster.as_ref().unwrap().players.len(), 1);

        for later in &report.teams[1..] {
            assert!(later.cancelled);
            assert!(later.failures.is_empty());
            assert!(later.history.is_none() && later.stats.is_none() && later.roster.is_none());
        }
    }

    #[test]
    fn test_cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }
}
