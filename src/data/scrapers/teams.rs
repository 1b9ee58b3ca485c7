//! League team directory
//!
//! Turns the league teams feed into `TeamMeta` records. All page URLs are
//! pure functions of abbreviation, slug and season year.

use crate::{DugoutError, LeagueConfig, Result, TeamMeta};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    sports: Vec<FeedSport>,
}

#[derive(Debug, Deserialize)]
struct FeedSport {
    #[serde(default)]
    leagues: Vec<FeedLeague>,
}

#[derive(Debug, Deserialize)]
struct FeedLeague {
    #[serde(default)]
    teams: Vec<serde_json::Value>,
}

/// Teams in feed order, looked up by display name
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    teams: Vec<TeamMeta>,
    by_name: HashMap<String, usize>,
}

impl TeamDirectory {
    /// Build the directory from the raw teams feed body.
    ///
    /// A body that is not a feed document at all means the feed could not be
    /// obtained; individual malformed entries are skipped.
    pub fn from_feed(body: &str, league: &LeagueConfig, current_year: i32) -> Result<Self> {
        let feed: Feed =
            serde_json::from_str(body).map_err(|e| DugoutError::SourceUnavailable {
                url: league.teams_feed_url.clone(),
                message: format!("teams feed is not valid JSON: {}", e),
            })?;

        let entries = feed
            .sports
            .first()
            .and_then(|sport| sport.leagues.first())
            .map(|l| l.teams.as_slice())
            .unwrap_or_default();

        let mut directory = TeamDirectory::default();
        for entry in entries {
            let team = &entry["team"];
            let fields = (
                team["displayName"].as_str(),
                team["abbreviation"].as_str(),
                team["slug"].as_str(),
            );

            let (Some(name), Some(abbr), Some(slug)) = fields else {
                log::warn!("Skipping malformed team entry: {}", entry);
                continue;
            };
            if name.trim().is_empty() || abbr.trim().is_empty() || slug.trim().is_empty() {
                log::warn!("Skipping team entry with empty fields: {}", entry);
                continue;
            }

            if directory.by_name.contains_key(name) {
                log::debug!("Duplicate team entry for {}", name);
                continue;
            }
            directory.insert(team_meta(name, abbr, slug, league, current_year));
        }

        log::info!("Built directory of {} teams", directory.len());
        Ok(directory)
    }

    pub fn from_teams(teams: impl IntoIterator<Item = TeamMeta>) -> Self {
        let mut directory = TeamDirectory::default();
        for team in teams {
            directory.insert(team);
        }
        directory
    }

    /// Append `team` unless its display name is already present; first one wins
    fn insert(&mut self, team: TeamMeta) {
        if self.by_name.contains_key(&team.display_name) {
            return;
        }
        self.by_name.insert(team.display_name.clone(), self.teams.len());
        self.teams.push(team);
    }

    pub fn get(&self, display_name: &str) -> Option<&TeamMeta> {
        self.by_name.get(display_name).map(|&i| &self.teams[i])
    }

    /// Look a team up by display name, abbreviation or slug
    pub fn find(&self, name: &str) -> Result<&TeamMeta> {
        self.get(name)
            .or_else(|| self.teams.iter().find(|t| t.matches_name(name)))
            .ok_or_else(|| DugoutError::UnknownTeam(name.to_string()))
    }

    /// Teams in the order the feed listed them
    pub fn iter(&self) -> impl Iterator<Item = &TeamMeta> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

/// Build metadata for one team
pub fn team_meta(
    display_name: &str,
    abbreviation: &str,
    slug: &str,
    league: &LeagueConfig,
    current_year: i32,
) -> TeamMeta {
    let abbr = abbreviation.to_lowercase();
    TeamMeta {
        display_name: display_name.to_string(),
        abbreviation: abbreviation.to_string(),
        slug: slug.to_string(),
        logo_url: format!("{}/{}.png", league.logo_base, abbr),
        stats_url: format!(
            "{}/{}/team/stats/_/name/{}/{}",
            league.site_base, league.league, abbr, slug
        ),
        roster_url: format!(
            "{}/{}/team/roster/_/name/{}/{}",
            league.site_base, league.league, abbr, slug
        ),
        current_schedule_url: schedule_url(league, abbreviation, current_year),
        prior_schedule_url: schedule_url(league, abbreviation, current_year - 1),
        current_year,
    }
}

/// Regular-season schedule page for a team and season
pub fn schedule_url(league: &LeagueConfig, abbreviation: &str, year: i32) -> String {
    format!(
        "{}/{}/team/schedule/_/name/{}/season/{}/seasontype/2",
        league.site_base,
        league.league,
        abbreviation.to_lowercase(),
        year
    )
}
