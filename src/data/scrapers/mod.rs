//! Page scrapers for team directory, schedule, roster and stats pages
//!
//! Every scraper here is a pure function over already-fetched content.

pub mod history;
pub mod leaders;
pub mod roster;
pub mod schedule;
pub mod teams;
pub mod upcoming;

use crate::{Result, TeamMeta};
use serde::{Deserialize, Serialize};

/// Which season's schedule a lookup runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Current,
    Prior,
}

impl Period {
    /// The period to retry with when this one has no games; `None` ends the chain
    pub fn fallback(self) -> Option<Period> {
        match self {
            Period::Current => Some(Period::Prior),
            Period::Prior => None,
        }
    }

    pub fn schedule_url(self, team: &TeamMeta) -> &str {
        match self {
            Period::Current => &team.current_schedule_url,
            Period::Prior => &team.prior_schedule_url,
        }
    }

    pub fn year(self, team: &TeamMeta) -> i32 {
        match self {
            Period::Current => team.current_year,
            Period::Prior => team.current_year - 1,
        }
    }
}

/// Retry an operation with exponential backoff
pub fn with_retry<T, F>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if attempt + 1 < max_attempts => {
                log::warn!("Attempt {} failed: {}", attempt + 1, e);
                std::thread::sleep(backoff_delay(attempt));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

const MAX_BACKOFF_MS: u64 = 30_000;

/// Delay after failed attempt `attempt` (0-based): 100ms doubling, capped at 30s
pub(crate) fn backoff_delay(attempt: u32) -> std::time::Duration {
    let millis = 2u64
        .checked_pow(attempt)
        .map_or(MAX_BACKOFF_MS, |factor| factor.saturating_mul(100))
        .min(MAX_BACKOFF_MS);
    std::time::Duration::from_millis(millis)
}

/// Collapse runs of whitespace (including nbsp) into single spaces
pub(crate) fn normalize_ws(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join an element's text nodes with spaces and normalize whitespace
pub(crate) fn element_text(element: &scraper::ElementRef) -> String {
    normalize_ws(&element.text().collect::<Vec<_>>().join(" "))
}

/// "chicago-cubs" -> "Chicago Cubs"
pub(crate) fn title_case_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
