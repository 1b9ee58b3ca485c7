//! Stat leaders and standing label from a team stats page
//!
//! Leaders are not in the markup proper; the page embeds its state as a
//! JSON blob inside an inline script, with backslash-escaped strings. The
//! `teamLeaders` object is cut out between two named anchors, unescaped and
//! parsed.

use crate::{DugoutError, LeaderEntry, Result, Standing};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Named boundaries of an embedded JSON fragment
#[derive(Debug, Clone, Copy)]
pub struct PayloadAnchors<'a> {
    /// Key whose value starts the fragment
    pub start: &'a str,
    /// Key that follows the fragment
    pub end: &'a str,
}

pub const TEAM_LEADERS: PayloadAnchors<'static> = PayloadAnchors {
    start: "teamLeaders",
    end: "dictionary",
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("start anchor {0:?} not found")]
    MissingStartAnchor(String),
    #[error("end anchor {0:?} not found after start anchor")]
    MissingEndAnchor(String),
    #[error("nothing between anchors")]
    EmptyFragment,
}

fn is_key_punct(c: char) -> bool {
    c == '"' || c == '\\' || c.is_whitespace()
}

/// Cut the value of `anchors.start` out of `text`, stopping before `anchors.end`.
///
/// For `..."teamLeaders":{...},"dictionary":...` this yields `{...}`. The
/// key's closing quote, the colon, and the separator before the end key are
/// dropped whether or not the quotes are backslash-escaped.
pub fn extract_fragment<'t>(text: &'t str, anchors: PayloadAnchors) -> std::result::Result<&'t str, PayloadError> {
    let start = text
        .find(anchors.start)
        .ok_or_else(|| PayloadError::MissingStartAnchor(anchors.start.to_string()))?;

    let value = text[start + anchors.start.len()..]
        .trim_start_matches(is_key_punct)
        .trim_start_matches(':')
        .trim_start();

    let end = value
        .find(anchors.end)
        .ok_or_else(|| PayloadError::MissingEndAnchor(anchors.end.to_string()))?;

    let fragment = value[..end]
        .trim_end_matches(is_key_punct)
        .trim_end_matches(',')
        .trim_end();

    if fragment.is_empty() {
        Err(PayloadError::EmptyFragment)
    } else {
        Ok(fragment)
    }
}

/// Leaders and standing from one stats page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPage {
    pub leaders: Vec<LeaderEntry>,
    pub standing: Option<Standing>,
}

impl StatsPage {
    /// Parse a stats page. A malformed leader payload leaves `leaders`
    /// empty and is handed back alongside the page.
    pub fn parse(html: &str, team: &str, standing_markers: &[String]) -> (Self, Option<DugoutError>) {
        let document = Html::parse_document(html);
        let standing = find_standing(&document, team, standing_markers);

        match leaders_from_document(&document, team) {
            Ok(leaders) => (StatsPage { leaders, standing }, None),
            Err(e) => {
                log::warn!("{}", e);
                (
                    StatsPage {
                        leaders: Vec::new(),
                        standing,
                    },
                    Some(e),
                )
            }
        }
    }
}

/// Parse the embedded leader payload of a stats page
pub fn extract_leaders(html: &str, team: &str) -> Result<Vec<LeaderEntry>> {
    leaders_from_document(&Html::parse_document(html), team)
}

/// First list-item text naming a league/conference, quotes stripped
pub fn extract_standing(html: &str, team: &str, markers: &[String]) -> Option<Standing> {
    find_standing(&Html::parse_document(html), team, markers)
}

fn leaders_from_document(document: &Html, team: &str) -> Result<Vec<LeaderEntry>> {
    let malformed = |reason: String| DugoutError::MalformedLeaderPayload {
        team: team.to_string(),
        reason,
    };

    let script_selector = Selector::parse("script").unwrap();
    let script_text = document
        .select(&script_selector)
        .map(|script| script.text().collect::<String>())
        .find(|text| text.contains(TEAM_LEADERS.start))
        .ok_or_else(|| {
            malformed(PayloadError::MissingStartAnchor(TEAM_LEADERS.start.to_string()).to_string())
        })?;

    let fragment = extract_fragment(&script_text, TEAM_LEADERS).map_err(|e| malformed(e.to_string()))?;
    let cleaned = fragment.replace('\\', "");

    let payload: Value =
        serde_json::from_str(cleaned.trim()).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

    let entries = payload["leaders"]
        .as_array()
        .ok_or_else(|| malformed("no leaders array".to_string()))?;

    let leaders = parse_leader_entries(entries, team);
    log::info!("{}: {} stat leaders", team, leaders.len());
    Ok(leaders)
}

/// Turn raw leader objects into entries, first occurrence of a name winning
fn parse_leader_entries(entries: &[Value], team: &str) -> Vec<LeaderEntry> {
    let mut seen = HashSet::new();
    let mut leaders = Vec::new();

    for entry in entries {
        let athlete = &entry["athlete"];
        let Some(name) = athlete["name"]
            .as_str()
            .or_else(|| athlete["displayName"].as_str())
        else {
            log::debug!("Leader entry without athlete name: {}", entry);
            continue;
        };

        if !seen.insert(name.to_string()) {
            continue;
        }

        leaders.push(LeaderEntry {
            team: team.to_string(),
            player_name: name.to_string(),
            position: string_or_field(&athlete["position"], &["abbreviation", "displayName", "name"])
                .unwrap_or_default(),
            headshot_url: string_or_field(&athlete["headshot"], &["href", "url"]),
        });
    }

    leaders
}

/// A value given either as a plain string or as an object with one of `keys`
fn string_or_field(value: &Value, keys: &[&str]) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => keys
            .iter()
            .find_map(|key| value[*key].as_str())
            .map(str::to_string),
        _ => None,
    }
}

fn find_standing(document: &Html, team: &str, markers: &[String]) -> Option<Standing> {
    let li_selector = Selector::parse("li").unwrap();

    document
        .select(&li_selector)
        .flat_map(|li| li.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .find(|text| markers.iter().any(|m| text.contains(m.as_str())))
        .map(|text| Standing {
            team: team.to_string(),
            label: text.trim_matches(['\'', '"']).trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::stats_page;

    fn markers() -> Vec<String> {
        vec!["NL ".to_string(), "AL ".to_string()]
    }

    #[test]
    fn test_extract_fragment_plain() {
        let text = r#"x = {"teamLeaders":{"leaders":[]},"dictionary":{}}"#;
        assert_eq!(extract_fragment(text, TEAM_LEADERS).unwrap(), r#"{"leaders":[]}"#);
    }

    #[test]
    fn test_extract_fragment_escaped() {
        let text = r#"{\"teamLeaders\":{\"leaders\":[]},\"dictionary\":{}}"#;
        assert_eq!(
            extract_fragment(text, TEAM_LEADERS).unwrap(),
            r#"{\"leaders\":[]}"#
        );
    }

    #[test]
    fn test_extract_fragment_errors() {
        assert_eq!(
            extract_fragment("nothing here", TEAM_LEADERS),
            Err(PayloadError::MissingStartAnchor("teamLeaders".to_string()))
        );
        assert_eq!(
            extract_fragment(r#""teamLeaders":{"leaders":[]}"#, TEAM_LEADERS),
            Err(PayloadError::MissingEndAnchor("dictionary".to_string()))
        );
        assert_eq!(
            extract_fragment(r#""teamLeaders":,"dictionary""#, TEAM_LEADERS),
            Err(PayloadError::EmptyFragment)
        );
        // Anchor at the very end of the text must not panic
        assert!(extract_fragment("teamLeaders", TEAM_LEADERS).is_err());
    }

    #[test]
    fn test_single_leader() {
        let html = stats_page(
            r#""teamLeaders":{"leaders":[{"athlete":{"name":"A","position":"P","headshot":"H"}}]},"dictionary":{"x":1}"#,
            &[],
        );
        let leaders = extract_leaders(&html, "Chicago Cubs").unwrap();
        assert_eq!(
            leaders,
            vec![LeaderEntry {
                team: "Chicago Cubs".to_string(),
                player_name: "A".to_string(),
                position: "P".to_string(),
                headshot_url: Some("H".to_string()),
            }]
        );
    }

    #[test]
    fn test_escaped_payload_and_dedup() {
        let html = stats_page(
            r#""teamLeaders":{"leaders":[{"athlete":{"name":"Seiya Suzuki","position":"RF","headshot":"https:\/\/a.espncdn.com\/i\/headshots\/1.png"}},{"athlete":{"name":"Seiya Suzuki","position":"DH"}},{"athlete":{"name":"Shota Imanaga","position":{"abbreviation":"SP"},"headshot":{"href":"https:\/\/img\/2.png"}}},{"athlete":{}}]},"dictionary":{}"#,
            &[],
        );
        let leaders = extract_leaders(&html, "Chicago Cubs").unwrap();

        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].position, "RF");
        assert_eq!(
            leaders[0].headshot_url.as_deref(),
            Some("https://a.espncdn.com/i/headshots/1.png")
        );
        assert_eq!(leaders[1].player_name, "Shota Imanaga");
        assert_eq!(leaders[1].position, "SP");
        assert_eq!(leaders[1].headshot_url.as_deref(), Some("https://img/2.png"));
    }

    #[test]
    fn test_missing_anchor_is_malformed() {
        let html = stats_page(r#""somethingElse":{}"#, &[]);
        assert!(matches!(
            extract_leaders(&html, "Chicago Cubs"),
            Err(DugoutError::MalformedLeaderPayload { .. })
        ));
    }

    #[test]
    fn test_bad_json_is_malformed_but_page_survives() {
        let html = stats_page(
            r#""teamLeaders":{"leaders":[{"athlete":},"dictionary":{}"#,
            &["1st in NL Central"],
        );
        let (page, issue) = StatsPage::parse(&html, "Chicago Cubs", &markers());

        assert!(page.leaders.is_empty());
        assert!(matches!(issue, Some(DugoutError::MalformedLeaderPayload { .. })));
        assert_eq!(page.standing.unwrap().label, "1st in NL Central");
    }

    #[test]
    fn test_standing_first_match_quotes_stripped() {
        let html = stats_page(
            r#""teamLeaders":{"leaders":[]},"dictionary":{}"#,
            &["84-78", "'2nd in AL East'", "3rd in NL West"],
        );
        let standing = extract_standing(&html, "New York Yankees", &markers()).unwrap();
        assert_eq!(standing.label, "2nd in AL East");
        assert_eq!(standing.team, "New York Yankees");
    }

    #[test]
    fn test_no_standing_is_none() {
        let html = stats_page(r#""teamLeaders":{"leaders":[]},"dictionary":{}"#, &["84-78", "NLDS"]);
        assert_eq!(extract_standing(&html, "Chicago Cubs", &markers()), None);
    }
}
