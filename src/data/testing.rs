//! Synthetic pages and in-memory collaborators for unit tests

use super::source::PageSource;
use crate::{Config, DugoutError, Result, TeamMeta};
use chrono::{DateTime, TimeZone};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use std::collections::HashMap;

/// Wall-clock time in New York
pub(crate) fn new_york(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
    New_York
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
}

pub(crate) fn team(display_name: &str, abbreviation: &str, slug: &str, year: i32) -> TeamMeta {
    crate::data::scrapers::teams::team_meta(
        display_name,
        abbreviation,
        slug,
        &Config::default().league,
        year,
    )
}

fn opponent_cell(slug: &str, label: &str) -> String {
    format!(
        r#"<td><div class="opponent"><span class="pr2">vs</span><span class="logo"><a href="/mlb/team/_/name/xx/{slug}"><img src="logo.png"/></a></span><span class="tc"><a href="/mlb/team/_/name/xx/{slug}">{label}</a></span></div></td>"#
    )
}

/// Cells of a completed game row; `result` like "W 5-3" or "L 2-4 F/10"
pub(crate) fn played(date: &str, slug: &str, label: &str, result: &str, record: &str) -> String {
    let (outcome, score) = result.split_once(' ').unwrap_or((result, ""));
    format!(
        r#"<td><span>{date}</span></td>{}<td><span class="fw-bold">{outcome}</span><span class="ml4"><a href="/mlb/game/_/gameId/1">{score}</a></span></td><td>{record}</td><td>Winner</td>"#,
        opponent_cell(slug, label)
    )
}

/// Cells of a game still to be played
pub(crate) fn upcoming(date: &str, slug: &str, label: &str, time: &str) -> String {
    format!(
        r#"<td><span>{date}</span></td>{}<td><a href="/mlb/game/_/gameId/2">{time}</a></td><td>Marquee</td><td>Tickets</td>"#,
        opponent_cell(slug, label)
    )
}

/// Cells of a row whose time field is a placeholder
pub(crate) fn placeholder(date: &str, slug: &str, label: &str, text: &str) -> String {
    format!(
        r#"<td><span>{date}</span></td>{}<td>{text}</td>"#,
        opponent_cell(slug, label)
    )
}

/// Full schedule page; rows get `data-idx` 1.. in the given order, preceded
/// by the title and column-header rows the real pages carry
pub(crate) fn schedule_page(team: &str, year: i32, rows: &[String]) -> String {
    let mut body = String::new();
    body.push_str(r#"<tr data-idx="0"><td colspan="8">Regular Season</td></tr>"#);
    body.push_str(r#"<tr data-idx="0"><td>DATE</td><td>OPPONENT</td><td>RESULT</td><td>W-L</td></tr>"#);
    for (i, cells) in rows.iter().enumerate() {
        body.push_str(&format!(r#"<tr data-idx="{}" class="Table__TR">{}</tr>"#, i + 1, cells));
    }
    format!(
        r#"<html><head><title>{team} {year} Schedule - ESPN</title></head><body><table class="Table"><tbody>{body}</tbody></table></body></html>"#
    )
}

/// Stats page with one inline script carrying `payload` and list items
pub(crate) fn stats_page(payload: &str, list_items: &[&str]) -> String {
    let items: String = list_items
        .iter()
        .map(|item| format!("<li>{}</li>", item))
        .collect();
    format!(
        r#"<html><head><script>var analytics = {{"page": "stats"}};</script><script>window['__espnfitt__']={{"page":{{"content":{{"stats":{{{payload}}}}}}}}};</script></head><body><ul class="ClubhouseHeader__Record">{items}</ul></body></html>"#
    )
}

/// Roster section with a heading and (name, position, headshot) rows
pub(crate) fn roster_section(heading: &str, players: &[(&str, &str, &str)]) -> String {
    let rows: String = players
        .iter()
        .map(|(name, position, headshot)| {
            format!(
                r#"<tr class="Table__TR"><td><div class="headshot"><img alt="{headshot}" src="{headshot}"/></div></td><td><a href="/mlb/player/_/id/1">{name}</a><span class="pl2">12</span></td><td>{position}</td><td>R/R</td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<div class="ResponsiveTable"><div class="Table__Title">{heading}</div><table class="Table"><thead><tr><th>Name</th><th>POS</th></tr></thead><tbody>{rows}</tbody></table></div>"#
    )
}

pub(crate) fn roster_page(sections: &[String]) -> String {
    format!(
        "<html><head><title>Roster</title></head><body>{}</body></html>",
        sections.concat()
    )
}

/// In-memory page source keyed by URL
#[derive(Default)]
pub(crate) struct StaticPages {
    pages: HashMap<String, String>,
}

impl StaticPages {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, body: String) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }
}

impl PageSource for StaticPages {
    fn fetch_page(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| DugoutError::SourceUnavailable {
                url: url.to_string(),
                message: "HTTP 404 Not Found".to_string(),
            })
    }
}
