use crate::types::CanonicalShowtime;
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

// "SUNDAY, 3/8/2026 6:30PM", "sunday ,03/08/2026  6:30 pm"
static SHOWTIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*([A-Za-z]+)\s*,\s*(\d{1,2})/(\d{1,2})/(\d{4})\s+(\d{1,2}):(\d{2})\s*([AaPp][Mm])\s*$",
    )
    .expect("showtime pattern is valid")
});

static LEADING_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z]+)(.*)$").expect("leading word pattern is valid"));

static TASK_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("task date pattern is valid"));

/// Result of reading a showtime heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowtimeParse {
    Parsed(CanonicalShowtime),
    /// Best-effort label: leading word title-cased, remainder verbatim.
    Fallback(String),
}

impl ShowtimeParse {
    pub fn canonical(&self) -> Option<&CanonicalShowtime> {
        match self {
            ShowtimeParse::Parsed(st) => Some(st),
            ShowtimeParse::Fallback(_) => None,
        }
    }

    /// Always usable as display text.
    pub fn label(&self) -> String {
        match self {
            ShowtimeParse::Parsed(st) => st.label(),
            ShowtimeParse::Fallback(text) => text.clone(),
        }
    }
}

/// Parses `DAYNAME, M/D/YYYY H:MM(AM|PM)` with flexible spacing and case.
pub fn parse_showtime(label: &str) -> ShowtimeParse {
    match parse_canonical(label) {
        Some(st) => ShowtimeParse::Parsed(st),
        None => ShowtimeParse::Fallback(fallback_label(label)),
    }
}

fn parse_canonical(label: &str) -> Option<CanonicalShowtime> {
    let caps = SHOWTIME_RE.captures(label)?;

    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let year: i32 = caps[4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let hour12: u32 = caps[5].parse().ok()?;
    let minute: u32 = caps[6].parse().ok()?;
    if !(1..=12).contains(&hour12) {
        return None;
    }
    let pm = caps[7].eq_ignore_ascii_case("pm");
    let hour = match (hour12, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;

    Some(CanonicalShowtime {
        day_name: capitalize(&caps[1]),
        date,
        time,
    })
}

fn fallback_label(label: &str) -> String {
    match LEADING_WORD_RE.captures(label) {
        Some(caps) => format!("{}{}", capitalize(&caps[1]), &caps[2]),
        None => label.to_string(),
    }
}

/// "SUNDAY" -> "Sunday"
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Why a task date was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDateError {
    Format,
    Calendar,
}

/// Strict `MM/DD/YYYY` as accepted from task submissions.
pub fn parse_task_date(text: &str) -> Result<NaiveDate, TaskDateError> {
    if !TASK_DATE_RE.is_match(text) {
        return Err(TaskDateError::Format);
    }
    NaiveDate::parse_from_str(text, "%m/%d/%Y").map_err(|_| TaskDateError::Calendar)
}

/// Lenient `M/D/YYYY` used by catalog listings ("9/17/2019").
pub fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut parts = text.split('/');
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
