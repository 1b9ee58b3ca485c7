//! Team page extraction for league schedules, rosters and stat leaders
//!
//! Turns public team pages (schedule tables, roster tables, stat pages with
//! embedded script payloads) into plain records that callers can serialize.

pub mod data;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Per-team metadata derived from the league feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMeta {
    pub display_name: String,
    pub abbreviation: String,
    pub slug: String,
    pub logo_url: String,
    pub stats_url: String,
    pub roster_url: String,
    pub current_schedule_url: String,
    pub prior_schedule_url: String,
    /// Season year embedded in `current_schedule_url`
    pub current_year: i32,
}

impl TeamMeta {
    pub fn matches_name(&self, name: &str) -> bool {
        let name_lower = name.trim().to_lowercase();
        self.display_name.to_lowercase() == name_lower
            || self.abbreviation.to_lowercase() == name_lower
            || self.slug == name_lower
    }
}

/// A game that has already been played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedGame {
    pub game_id: u32,
    pub team: String,
    pub opponent: String,
    pub date: NaiveDate,
    pub won: bool,
    pub team_score: u16,
    pub opponent_score: u16,
}

impl CompletedGame {
    /// Key under which two rows describe the same game
    pub fn dedup_key(&self) -> (&str, &str, NaiveDate, u16) {
        (&self.team, &self.opponent, self.date, self.opponent_score)
    }

    /// Run differential from the team's point of view
    pub fn margin(&self) -> i32 {
        self.team_score as i32 - self.opponent_score as i32
    }
}

/// Running win-loss record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub team: String,
    pub wins: u32,
    pub losses: u32,
}

impl fmt::Display for SeasonRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wins, self.losses)
    }
}

/// The next scheduled game for a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingGame {
    pub team: String,
    pub opponent: String,
    /// Date exactly as printed in the schedule, e.g. "Tue, Apr 1"
    pub date_text: String,
    pub scheduled_at: DateTime<FixedOffset>,
}

/// Result of looking for the next game; running out of games is not an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextGame {
    Scheduled(UpcomingGame),
    NoUpcomingGames,
}

impl NextGame {
    pub fn upcoming(&self) -> Option<&UpcomingGame> {
        match self {
            NextGame::Scheduled(game) => Some(game),
            NextGame::NoUpcomingGames => None,
        }
    }
}

/// Roster position group, as used for table headings on roster pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PositionGroup {
    Pitchers,
    Catchers,
    Infielders,
    Outfielders,
    DesignatedHitter,
    TwoWayPlayers,
}

impl PositionGroup {
    pub fn label(&self) -> &'static str {
        match self {
            PositionGroup::Pitchers => "Pitchers",
            PositionGroup::Catchers => "Catchers",
            PositionGroup::Infielders => "Infielders",
            PositionGroup::Outfielders => "Outfielders",
            PositionGroup::DesignatedHitter => "Designated Hitter",
            PositionGroup::TwoWayPlayers => "Two-Way Players",
        }
    }

    pub fn from_heading(heading: &str) -> Option<Self> {
        match heading.trim().to_lowercase().as_str() {
            "pitchers" => Some(PositionGroup::Pitchers),
            "catchers" => Some(PositionGroup::Catchers),
            "infielders" => Some(PositionGroup::Infielders),
            "outfielders" => Some(PositionGroup::Outfielders),
            "designated hitter" | "designated hitters" => Some(PositionGroup::DesignatedHitter),
            "two-way players" | "two way players" => Some(PositionGroup::TwoWayPlayers),
            _ => None,
        }
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A rostered player; `listings` holds every group the player appears under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub position: String,
    pub headshot_url: Option<String>,
    pub team: String,
    pub listings: BTreeSet<PositionGroup>,
}

/// Statistical leader scraped from a team's stats page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderEntry {
    pub team: String,
    pub player_name: String,
    pub position: String,
    pub headshot_url: Option<String>,
}

/// Free-text division/rank label, e.g. "1st in NL Central"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub team: String,
    pub label: String,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum DugoutError {
    #[error("Source unavailable for {url}: {message}")]
    SourceUnavailable { url: String, message: String },

    #[error("Malformed leader payload for {team}: {reason}")]
    MalformedLeaderPayload { team: String, reason: String },

    #[error("No game data for {team} in the current or prior season")]
    NoGameData { team: String },

    #[error("Unparseable schedule row {index}: {reason}")]
    UnparseableRow { index: usize, reason: String },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, DugoutError>;

/// Application configuration loaded from dugout.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub league: LeagueConfig,
    pub source: SourceConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub sport: String,
    pub league: String,
    pub teams_feed_url: String,
    pub site_base: String,
    pub logo_base: String,
    pub standing_markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub cache_dir: Option<String>,
    pub offline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub max_games: usize,
    pub reference_zone: String,
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            league: LeagueConfig {
                sport: "baseball".to_string(),
                league: "mlb".to_string(),
                teams_feed_url:
                    "https://site.api.espn.com/apis/site/v2/sports/baseball/mlb/teams"
                        .to_string(),
                site_base: "https://www.espn.com".to_string(),
                logo_base: "https://a.espncdn.com/i/teamlogos/mlb/500/scoreboard".to_string(),
                standing_markers: vec!["NL ".to_string(), "AL ".to_string()],
            },
            source: SourceConfig {
                user_agent: "Mozilla/5.0 (compatible; dugout/0.1)".to_string(),
                timeout_secs: 30,
                retries: 3,
                cache_dir: None,
                offline: false,
            },
            extraction: ExtractionConfig {
                max_games: 5,
                reference_zone: "America/New_York".to_string(),
                workers: 4,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DugoutError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| DugoutError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DugoutError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the configured reference time zone
    pub fn reference_zone(&self) -> Result<chrono_tz::Tz> {
        self.extraction.reference_zone.parse().map_err(|e| {
            DugoutError::Config(format!(
                "Unknown time zone {}: {}",
                self.extraction.reference_zone, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.extraction.max_games, 5);
        assert_eq!(parsed.league.standing_markers, vec!["NL ", "AL "]);
        assert_eq!(parsed.reference_zone().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_bad_zone_is_config_error() {
        let mut config = Config::default();
        config.extraction.reference_zone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(config.reference_zone(), Err(DugoutError::Config(_))));
    }

    #[test]
    fn test_position_group_headings() {
        assert_eq!(
            PositionGroup::from_heading(" Pitchers "),
            Some(PositionGroup::Pitchers)
        );
        assert_eq!(
            PositionGroup::from_heading("Designated Hitter"),
            Some(PositionGroup::DesignatedHitter)
        );
        assert_eq!(PositionGroup::from_heading("Coaches"), None);
    }

    #[test]
    fn test_team_meta_matches_name() {
        let team = TeamMeta {
            display_name: "Chicago Cubs".to_string(),
            abbreviation: "CHC".to_string(),
            slug: "chicago-cubs".to_string(),
            logo_url: String::new(),
            stats_url: String::new(),
            roster_url: String::new(),
            current_schedule_url: String::new(),
            prior_schedule_url: String::new(),
            current_year: 2025,
        };
        assert!(team.matches_name("chicago cubs"));
        assert!(team.matches_name("chc"));
        assert!(team.matches_name("chicago-cubs"));
        assert!(!team.matches_name("Chicago White Sox"));
    }
}
