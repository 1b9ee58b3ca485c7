//! Team schedule tables and the played/unplayed boundary
//!
//! A schedule page lists one row per game in chronological order. Rows
//! carry a sequential `data-idx` attribute; the first cell is the date
//! ("Sun, Mar 30"), the second the opponent, the third either a start time
//! ("7:05 PM", not yet played) or a result ("W 5-3"), and on played rows the
//! fourth is the running W-L record.

use super::{element_text, normalize_ws};
use crate::{DugoutError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// How a row names its opponent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpponentRef {
    /// Trailing label text, e.g. "Milwaukee"
    pub label: Option<String>,
    /// Last path segment of the opponent's team link, e.g. "milwaukee-brewers"
    pub link_slug: Option<String>,
}

/// One game row of a schedule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    /// 1-based position in the table
    pub index: usize,
    pub date_text: String,
    /// Whitespace-normalized time or result cell, e.g. "7:05 PM" or "W 5-3"
    pub time_or_result: String,
    pub opponent: OpponentRef,
    /// Result cell text exactly as it appears in the markup
    pub raw_result: String,
    /// Running record after this game, e.g. "32-27"
    pub record_text: Option<String>,
}

/// Parsed schedule for one team and season
#[derive(Debug, Clone)]
pub struct ScheduleTable {
    pub reference_year: i32,
    rows: Vec<ScheduleRow>,
    opening_month: Option<u32>,
}

/// How a row relates to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTiming {
    /// Start time is known
    Scheduled(DateTime<Tz>),
    /// Time field contains a hyphen (results, placeholders); never compared
    NotComparable,
}

/// Where the played/unplayed split falls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Index of the first row still in the future
    At(usize),
    /// No row is in the future (or the table is empty)
    PastEnd,
}

fn month_day_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})\b")
            .unwrap()
    })
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([ap])\.?m\.?").unwrap())
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b((?:19|20)\d{2})\b").unwrap())
}

fn record_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)-(\d+)").unwrap())
}

/// "Sun, Mar 30" -> (3, 30)
pub fn parse_month_day(date_text: &str) -> Option<(u32, u32)> {
    let caps = month_day_pattern().captures(date_text)?;
    let month = match caps.get(1)?.as_str().to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;
    (1..=31).contains(&day).then_some((month, day))
}

/// "7:05 PM" -> 19:05
pub fn parse_start_time(text: &str) -> Option<NaiveTime> {
    let caps = time_pattern().captures(text.trim())?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("p");
    let hour24 = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0)
}

/// "32-27" -> (32, 27)
pub fn parse_record(text: &str) -> Option<(u32, u32)> {
    let caps = record_pattern().captures(text.trim())?;
    Some((caps.get(1)?.as_str().parse().ok()?, caps.get(2)?.as_str().parse().ok()?))
}

/// First plausible season year in the page title
pub fn reference_year_from_title(document: &Html) -> Option<i32> {
    let title_selector = Selector::parse("title").unwrap();
    let title = document.select(&title_selector).next()?;
    let text: String = title.text().collect();
    year_pattern()
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

impl ScheduleTable {
    /// Build a table from rows in any order
    pub fn from_rows(reference_year: i32, mut rows: Vec<ScheduleRow>) -> Self {
        rows.sort_by_key(|r| r.index);
        rows.dedup_by_key(|r| r.index);
        let opening_month = rows
            .iter()
            .find_map(|r| parse_month_day(&r.date_text))
            .map(|(month, _)| month);

        ScheduleTable {
            reference_year,
            rows,
            opening_month,
        }
    }

    /// Parse a schedule page. `default_year` is used when the page title
    /// carries no year.
    pub fn parse(html: &str, default_year: i32) -> Self {
        let document = Html::parse_document(html);
        let reference_year = reference_year_from_title(&document).unwrap_or(default_year);

        let row_selector = Selector::parse("tr[data-idx]").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        let mut rows = Vec::new();
        for tr in document.select(&row_selector) {
            match parse_row(&tr, &cell_selector) {
                Ok(row) => rows.push(row),
                Err(e) => log::debug!("Skipping schedule row: {}", e),
            }
        }

        log::info!(
            "Parsed {} schedule rows for {} season",
            rows.len(),
            reference_year
        );
        Self::from_rows(reference_year, rows)
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_index(&self) -> Option<usize> {
        self.rows.first().map(|r| r.index)
    }

    pub fn row(&self, index: usize) -> Option<&ScheduleRow> {
        self.rows
            .binary_search_by_key(&index, |r| r.index)
            .ok()
            .map(|pos| &self.rows[pos])
    }

    /// Rows with index <= `index`, latest first
    pub fn rows_back_from(&self, index: usize) -> impl Iterator<Item = &ScheduleRow> {
        self.rows.iter().rev().filter(move |r| r.index <= index)
    }

    /// Calendar date of a row, rolling into the next year when the month
    /// comes before the season's opening month
    pub fn season_date(&self, date_text: &str) -> Option<NaiveDate> {
        let (month, day) = parse_month_day(date_text)?;
        let rollover = self.opening_month.is_some_and(|opening| month < opening);
        let year = if rollover {
            self.reference_year + 1
        } else {
            self.reference_year
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

fn parse_row(tr: &ElementRef, cell_selector: &Selector) -> Result<ScheduleRow> {
    let index: usize = tr
        .value()
        .attr("data-idx")
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| DugoutError::UnparseableRow {
            index: 0,
            reason: "missing data-idx".to_string(),
        })?;

    let unparseable = |reason: &str| DugoutError::UnparseableRow {
        index,
        reason: reason.to_string(),
    };

    if index == 0 {
        return Err(unparseable("header row"));
    }

    let cells: Vec<ElementRef> = tr.select(cell_selector).collect();
    if cells.len() < 3 {
        return Err(unparseable("fewer than three cells"));
    }

    let date_text = element_text(&cells[0]);
    // Section titles and column headers share the table but have no date
    if parse_month_day(&date_text).is_none() {
        return Err(unparseable("no date in first cell"));
    }

    let record_text = cells
        .get(3)
        .map(element_text)
        .filter(|text| parse_record(text).is_some());

    Ok(ScheduleRow {
        index,
        date_text,
        time_or_result: element_text(&cells[2]),
        opponent: parse_opponent(&cells[1]),
        raw_result: cells[2].text().collect(),
        record_text,
    })
}

fn parse_opponent(cell: &ElementRef) -> OpponentRef {
    let link_selector = Selector::parse("a[href]").unwrap();

    let link_slug = cell
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            href.split(['?', '#'])
                .next()
                .and_then(|path| path.rsplit('/').find(|seg| !seg.is_empty()))
                .map(str::to_string)
        })
        .next();

    let text = element_text(cell);
    let mut words: Vec<&str> = text.split(' ').collect();
    while let Some(first) = words.first() {
        if matches!(first.to_lowercase().as_str(), "vs" | "vs." | "@" | "at") {
            words.remove(0);
        } else {
            break;
        }
    }
    let label = normalize_ws(&words.join(" "));

    OpponentRef {
        label: (!label.is_empty()).then_some(label),
        link_slug,
    }
}

/// Walks a schedule table against a fixed "now"
pub struct ScheduleCursor<'a> {
    table: &'a ScheduleTable,
    now: DateTime<Tz>,
}

impl<'a> ScheduleCursor<'a> {
    pub fn new(table: &'a ScheduleTable, now: DateTime<Tz>) -> Self {
        ScheduleCursor { table, now }
    }

    pub fn table(&self) -> &'a ScheduleTable {
        self.table
    }

    /// Classify a row's time field
    pub fn timing(&self, row: &ScheduleRow) -> Result<RowTiming> {
        if row.time_or_result.contains('-') {
            return Ok(RowTiming::NotComparable);
        }

        let unparseable = |reason: &str| DugoutError::UnparseableRow {
            index: row.index,
            reason: reason.to_string(),
        };

        let date = self
            .table
            .season_date(&row.date_text)
            .ok_or_else(|| unparseable("bad date"))?;
        let time =
            parse_start_time(&row.time_or_result).ok_or_else(|| unparseable("no start time"))?;

        let zone = self.now.timezone();
        zone.from_local_datetime(&date.and_time(time))
            .earliest()
            .map(RowTiming::Scheduled)
            .ok_or_else(|| unparseable("local time does not exist"))
    }

    /// Scan rows in index order for the first one whose start is after now
    pub fn boundary(&self) -> Boundary {
        for row in self.table.rows() {
            match self.timing(row) {
                Ok(RowTiming::Scheduled(at)) if at > self.now => return Boundary::At(row.index),
                Ok(RowTiming::Scheduled(_)) => {}
                Ok(RowTiming::NotComparable) => {
                    log::debug!("Row {} not time-comparable: {}", row.index, row.time_or_result)
                }
                Err(e) => log::debug!("{}", e),
            }
        }
        Boundary::PastEnd
    }

    /// Index of the last row before the boundary
    pub fn last_played_index(&self) -> Option<usize> {
        match self.boundary() {
            Boundary::At(index) => self
                .table
                .rows()
                .iter()
                .map(|r| r.index)
                .filter(|&i| i < index)
                .max(),
            Boundary::PastEnd => self.table.rows().last().map(|r| r.index),
        }
    }
}
