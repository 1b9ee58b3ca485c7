//! Team roster pages
//!
//! Roster pages are split into one table per position group, each headed by
//! a title ("Pitchers", "Catchers", ...). A player listed under more than one
//! group is kept once with every group in `listings`.

use super::element_text;
use crate::{Player, PositionGroup};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub team: String,
    pub players: Vec<Player>,
}

impl Roster {
    pub fn new(team: &str) -> Self {
        Roster {
            team: team.to_string(),
            players: Vec::new(),
        }
    }

    /// Parse a roster page
    pub fn parse(html: &str, team: &str) -> Self {
        let document = Html::parse_document(html);
        let section_selector = Selector::parse("div.ResponsiveTable").unwrap();
        let title_selector = Selector::parse(".Table__Title").unwrap();
        let row_selector = Selector::parse("tbody tr").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        let mut roster = Roster::new(team);

        for section in document.select(&section_selector) {
            let Some(heading) = section.select(&title_selector).next().map(|t| element_text(&t)) else {
                continue;
            };
            let Some(group) = PositionGroup::from_heading(&heading) else {
                log::debug!("{}: skipping roster section {:?}", team, heading);
                continue;
            };

            for row in section.select(&row_selector) {
                let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
                match parse_player_cells(&cells) {
                    Some((name, position, headshot)) => {
                        roster.add(group, &name, &position, headshot)
                    }
                    None => log::debug!("{}: roster row without a name", team),
                }
            }
        }

        log::info!("{}: {} rostered players", team, roster.players.len());
        roster
    }

    /// Add a player under `group`, widening the listings of a player already present
    pub fn add(&mut self, group: PositionGroup, name: &str, position: &str, headshot: Option<String>) {
        if let Some(existing) = self.players.iter_mut().find(|p| p.name == name) {
            existing.listings.insert(group);
            if existing.position.is_empty() {
                existing.position = position.to_string();
            }
            if existing.headshot_url.is_none() {
                existing.headshot_url = headshot;
            }
            return;
        }

        self.players.push(Player {
            name: name.to_string(),
            position: position.to_string(),
            headshot_url: headshot,
            team: self.team.clone(),
            listings: BTreeSet::from([group]),
        });
    }

    pub fn group(&self, group: PositionGroup) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.listings.contains(&group))
            .collect()
    }

    /// Players keyed by every group they are listed under
    pub fn by_group(&self) -> BTreeMap<PositionGroup, Vec<&Player>> {
        let mut groups: BTreeMap<PositionGroup, Vec<&Player>> = BTreeMap::new();
        for player in &self.players {
            for group in &player.listings {
                groups.entry(*group).or_default().push(player);
            }
        }
        groups
    }
}

/// (name, position, headshot) from a roster row: headshot, name, position, ...
fn parse_player_cells(cells: &[ElementRef]) -> Option<(String, String, Option<String>)> {
    let link_selector = Selector::parse("a").unwrap();
    let img_selector = Selector::parse("img").unwrap();

    let name_cell = cells.get(1)?;
    let name = name_cell
        .select(&link_selector)
        .next()
        .map(|a| element_text(&a))
        .unwrap_or_else(|| element_text(name_cell));
    if name.is_empty() {
        return None;
    }

    let position = cells.get(2).map(element_text).unwrap_or_default();

    let headshot = cells
        .first()
        .and_then(|cell| cell.select(&img_selector).next())
        .and_then(|img| {
            ["data-src", "src", "alt"]
                .iter()
                .filter_map(|attr| img.value().attr(attr))
                .map(str::trim)
                .find(|v| !v.is_empty() && !v.starts_with("data:"))
                .map(str::to_string)
        });

    Some((name, position, headshot))
}
