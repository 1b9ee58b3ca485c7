//! Canonical opponent names
//!
//! Schedule rows name opponents loosely: a city label ("Chicago"), a
//! disambiguated city ("New York (Mets)"), or a link to the opponent's team
//! page. Every call site resolves them through this one table.

use super::scrapers::schedule::OpponentRef;
use super::scrapers::teams::TeamDirectory;
use super::scrapers::title_case_slug;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct OpponentTable {
    by_slug: HashMap<String, String>,
    by_city: HashMap<String, String>,
}

impl Default for OpponentTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpponentTable {
    /// Table with the built-in franchise slugs and city aliases only
    pub fn new() -> Self {
        let by_city = Self::default_city_aliases();
        let by_slug = by_city
            .values()
            .map(|canonical| (slugify(canonical), canonical.clone()))
            .collect();
        OpponentTable { by_slug, by_city }
    }

    /// Table that also knows every slug in the directory
    pub fn with_directory(directory: &TeamDirectory) -> Self {
        let mut table = Self::new();
        for team in directory.iter() {
            table
                .by_slug
                .insert(team.slug.to_lowercase(), team.display_name.clone());
            table
                .by_city
                .insert(team.display_name.to_lowercase(), team.display_name.clone());
        }
        table
    }

    fn default_city_aliases() -> HashMap<String, String> {
        let mut aliases = HashMap::new();

        let table: &[(&str, &[&str])] = &[
            ("Arizona Diamondbacks", &["Phoenix", "Arizona"]),
            ("Athletics", &["Oakland", "Sacramento", "Athletics"]),
            ("Atlanta Braves", &["Atlanta"]),
            ("Baltimore Orioles", &["Baltimore"]),
            ("Boston Red Sox", &["Boston"]),
            ("Chicago Cubs", &["Chicago (Cubs)", "Chi Cubs", "Chicago Cubs"]),
            ("Chicago White Sox", &["Chicago", "Chicago (White Sox)", "Chi White Sox"]),
            ("Cincinnati Reds", &["Cincinnati"]),
            ("Cleveland Guardians", &["Cleveland"]),
            ("Colorado Rockies", &["Denver", "Colorado"]),
            ("Detroit Tigers", &["Detroit"]),
            ("Houston Astros", &["Houston"]),
            ("Kansas City Royals", &["Kansas City"]),
            ("Los Angeles Angels", &["Anaheim", "LA Angels", "Los Angeles (Angels)"]),
            ("Los Angeles Dodgers", &["Los Angeles", "LA Dodgers", "Los Angeles (Dodgers)"]),
            ("Miami Marlins", &["Miami"]),
            ("Milwaukee Brewers", &["Milwaukee"]),
            ("Minnesota Twins", &["Minneapolis", "Minnesota"]),
            ("New York Mets", &["New York (Mets)", "NY Mets"]),
            ("New York Yankees", &["New York (Yankees)", "NY Yankees"]),
            ("Philadelphia Phillies", &["Philadelphia"]),
            ("Pittsburgh Pirates", &["Pittsburgh"]),
            ("San Diego Padres", &["San Diego"]),
            ("San Francisco Giants", &["San Francisco"]),
            ("Seattle Mariners", &["Seattle"]),
            ("St. Louis Cardinals", &["St. Louis", "St Louis"]),
            ("Tampa Bay Rays", &["Tampa Bay", "Tampa"]),
            ("Texas Rangers", &["Arlington", "Texas"]),
            ("Toronto Blue Jays", &["Toronto"]),
            ("Washington Nationals", &["Washington"]),
        ];

        for (canonical, names) in table {
            for name in names.iter() {
                aliases.insert(name.to_lowercase(), canonical.to_string());
            }
            aliases.insert(canonical.to_lowercase(), canonical.to_string());
        }

        aliases
    }

    /// Resolve an opponent reference to a display name.
    ///
    /// A team link names the opponent outright; city labels are ambiguous
    /// ("Chicago") and only consulted for rows without one.
    pub fn resolve(&self, opponent: &OpponentRef) -> Option<String> {
        if let Some(slug) = &opponent.link_slug {
            if let Some(name) = self.by_slug.get(&slug.to_lowercase()) {
                return Some(name.clone());
            }
            let name = title_case_slug(slug);
            if !name.is_empty() {
                return Some(name);
            }
        }

        let label = opponent.label.as_ref()?.trim();
        let key = label.trim_end_matches('*').trim().to_lowercase();
        if let Some(name) = self.by_city.get(&key) {
            return Some(name.clone());
        }

        (!label.is_empty()).then(|| label.to_string())
    }
}

/// "St. Louis Cardinals" -> "st-louis-cardinals"
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::scrapers::teams::team_meta;
    use crate::Config;

    fn label(s: &str) -> OpponentRef {
        OpponentRef {
            label: Some(s.to_string()),
            link_slug: None,
        }
    }

    #[test]
    fn test_city_aliases() {
        let table = OpponentTable::new();
        assert_eq!(table.resolve(&label("Milwaukee")).unwrap(), "Milwaukee Brewers");
        assert_eq!(table.resolve(&label("Chicago (Cubs)")).unwrap(), "Chicago Cubs");
        assert_eq!(table.resolve(&label("chicago")).unwrap(), "Chicago White Sox");
        assert_eq!(table.resolve(&label("New York (Mets)")).unwrap(), "New York Mets");
    }

    #[test]
    fn test_directory_slug_wins_over_label() {
        let league = Config::default().league;
        let dir = TeamDirectory::from_teams([team_meta(
            "St. Louis Cardinals",
            "STL",
            "st-louis-cardinals",
            &league,
            2025,
        )]);
        let table = OpponentTable::with_directory(&dir);

        let opponent = OpponentRef {
            label: Some("Chicago".to_string()),
            link_slug: Some("st-louis-cardinals".to_string()),
        };
        assert_eq!(table.resolve(&opponent).unwrap(), "St. Louis Cardinals");
    }

    #[test]
    fn test_unknown_falls_back_to_slug_then_label() {
        let table = OpponentTable::new();
        let slug_only = OpponentRef {
            label: Some("Somewhere".to_string()),
            link_slug: Some("somewhere-sluggers".to_string()),
        };
        assert_eq!(table.resolve(&slug_only).unwrap(), "Somewhere Sluggers");
        assert_eq!(table.resolve(&label("Nowhere")).unwrap(), "Nowhere");
        assert_eq!(table.resolve(&OpponentRef::default()), None);
    }

    #[test]
    fn test_crosstown_link_beats_city_label() {
        let table = OpponentTable::new();
        let cubs = OpponentRef {
            label: Some("Chicago".to_string()),
            link_slug: Some("chicago-cubs".to_string()),
        };
        assert_eq!(table.resolve(&cubs).unwrap(), "Chicago Cubs");

        let cardinals = OpponentRef {
            label: Some("St. Louis".to_string()),
            link_slug: Some("st-louis-cardinals".to_string()),
        };
        assert_eq!(table.resolve(&cardinals).unwrap(), "St. Louis Cardinals");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("St. Louis Cardinals"), "st-louis-cardinals");
        assert_eq!(slugify("Athletics"), "athletics");
    }
}
