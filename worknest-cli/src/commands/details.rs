//! Step 1: title, type, dates and place.

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use dialoguer::{Input, Select};
use owo_colors::OwoColorize;
use worknest_core::event::{format_date, parse_wire_datetime};
use worknest_core::{EventDraft, EventType};

/// A parsed date answer: a whole day, or a day with a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Day(NaiveDate),
    At(NaiveDateTime),
}

impl When {
    fn describe(self) -> String {
        match self {
            When::Day(d) => format_date(d),
            When::At(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub fn prompt(draft: &mut EventDraft) -> Result<()> {
    // --- Title ---
    draft.title = loop {
        let title: String = Input::new()
            .with_prompt("  Title")
            .with_initial_text(draft.title.clone())
            .allow_empty(true)
            .interact_text()?;
        if !title.trim().is_empty() {
            break title.trim().to_string();
        }
        eprintln!("  {}", "A title is required".red());
    };

    // --- Type ---
    let types = ["Internal (team members)", "External (contacts)"];
    let current = match draft.event_type {
        EventType::Internal => 0,
        EventType::External => 1,
    };
    draft.event_type = match Select::new()
        .with_prompt("  Type")
        .items(&types)
        .default(current)
        .interact()?
    {
        0 => EventType::Internal,
        _ => EventType::External,
    };

    // --- Start ---
    let start = prompt_with_retry("  When?", current_start(draft), parse_when)?;

    // --- End ---
    let default_hint = match start {
        When::Day(_) => "same day",
        When::At(_) => "1 hour",
    };
    let end = prompt_end(start, default_hint)?;
    apply_bounds(draft, start, end)?;

    // --- Location / description ---
    draft.location = Input::<String>::new()
        .with_prompt("  Where? (skip)")
        .with_initial_text(draft.location.clone())
        .allow_empty(true)
        .interact_text()?
        .trim()
        .to_string();
    draft.description = Input::<String>::new()
        .with_prompt("  Notes (skip)")
        .with_initial_text(draft.description.clone())
        .allow_empty(true)
        .interact_text()?;

    Ok(())
}

fn current_start(draft: &EventDraft) -> Option<String> {
    let date = draft.start_date?;
    let when = match (draft.all_day, draft.start_time) {
        (false, Some(time)) => When::At(date.and_time(time)),
        _ => When::Day(date),
    };
    Some(when.describe())
}

/// Prompt until `parse` accepts the answer. An existing value is offered as
/// the initial text.
fn prompt_with_retry<F>(prompt: &str, initial: Option<String>, parse: F) -> Result<When>
where
    F: Fn(&str) -> Result<When>,
{
    loop {
        let input: String = Input::new()
            .with_prompt(prompt)
            .with_initial_text(initial.clone().unwrap_or_default())
            .interact_text()?;
        match parse(&input) {
            Ok(result) => return Ok(result),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}

fn prompt_end(start: When, default_hint: &str) -> Result<When> {
    loop {
        let input: String = Input::new()
            .with_prompt(format!("  How long? ({default_hint})"))
            .default(String::new())
            .show_default(false)
            .interact_text()?;
        let end = if input.is_empty() {
            default_end(start)
        } else {
            parse_end(&input, start)
        };
        match end {
            Ok(result) => return Ok(result),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}

/// Both ends must be the same kind, and the end may not come first.
/// An all-day event may end on its start day.
fn check_bounds(start: When, end: When) -> Result<()> {
    match (start, end) {
        (When::Day(s), When::Day(e)) if e < s => {
            anyhow::bail!("The event cannot end before it starts")
        }
        (When::At(s), When::At(e)) if e <= s => anyhow::bail!("The event must end after it starts"),
        (When::At(_), When::Day(_)) => anyhow::bail!("Give an end time, not just a day"),
        (When::Day(_), When::At(_)) => anyhow::bail!("An all-day event ends on a day, not a time"),
        _ => Ok(()),
    }
}

/// Write start and end into the draft. A bare day makes the event all-day.
pub fn apply_bounds(draft: &mut EventDraft, start: When, end: When) -> Result<()> {
    check_bounds(start, end)?;

    match (start, end) {
        (When::Day(s), When::Day(e)) => {
            draft.all_day = true;
            draft.start_date = Some(s);
            draft.end_date = Some(e);
            draft.start_time = None;
            draft.end_time = None;
        }
        (When::At(s), When::At(e)) => {
            draft.all_day = false;
            draft.start_date = Some(s.date());
            draft.end_date = Some(e.date());
            draft.start_time = Some(s.time());
            draft.end_time = Some(e.time());
        }
        _ => {}
    }
    Ok(())
}

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    const ABBREVIATIONS: [(&str, &str); 22] = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| (*full).to_string())
                .unwrap_or_else(|| word.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact formats (`2024-05-01`, `2024-05-01 10:00`) first, then natural
/// language. Answers without a time token are whole days.
pub fn parse_when(input: &str) -> Result<When> {
    let input = input.trim();

    if let Some(dt) = parse_wire_datetime(input) {
        return Ok(if has_time_component(input) {
            When::At(dt)
        } else {
            When::Day(dt.date())
        });
    }

    let expanded = expand_abbreviations(input);
    let dt = fuzzydate::parse(&expanded)
        .map_err(|_| anyhow!("Could not parse date/time: \"{}\"", input))?;

    if has_time_component(input) {
        Ok(When::At(dt))
    } else {
        Ok(When::Day(dt.date()))
    }
}

/// Whether the answer names a time of day (am/pm, HH:MM, noon, midnight,
/// "at 3").
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();

    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    let bytes = lower.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'a' || b == b'p') && bytes.get(i + 1) == Some(&b'm') {
            if i > 0 && bytes[i - 1].is_ascii_digit() {
                return true;
            }
            if i > 1 && bytes[i - 1] == b' ' && bytes[i - 2].is_ascii_digit() {
                return true;
            }
        }
    }

    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' {
            let digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let digit_after = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if digit_before && digit_after {
                return true;
            }
        }
    }

    if let Some(pos) = lower.find(" at ") {
        if lower[pos + 4..].starts_with(|c: char| c.is_ascii_digit()) {
            return true;
        }
    }
    if let Some(after) = lower.strip_prefix("at ") {
        if after.starts_with(|c: char| c.is_ascii_digit()) {
            return true;
        }
    }

    false
}

/// A duration ("45m", "3days") first, then an end date/time with an
/// optional "until"/"to" prefix. Only ends that pass `check_bounds` come back.
fn parse_end(input: &str, start: When) -> Result<When> {
    let end = match humantime::parse_duration(input) {
        Ok(duration) => apply_duration(start, duration)?,
        Err(_) => {
            let cleaned = input
                .strip_prefix("until ")
                .or_else(|| input.strip_prefix("to "))
                .unwrap_or(input);
            parse_when(cleaned)?
        }
    };

    check_bounds(start, end)?;
    Ok(end)
}

fn apply_duration(start: When, duration: std::time::Duration) -> Result<When> {
    let duration = Duration::from_std(duration).context("Duration too large")?;

    match start {
        When::Day(d) => {
            let days = duration.num_days();
            if days < 1 || duration != Duration::days(days) {
                anyhow::bail!("All-day events last whole days (e.g. \"2days\")");
            }
            // A one-day all-day event ends on its start day.
            d.checked_add_signed(Duration::days(days - 1))
                .map(When::Day)
                .ok_or_else(|| anyhow!("Duration too large"))
        }
        When::At(dt) => dt
            .checked_add_signed(duration)
            .map(When::At)
            .ok_or_else(|| anyhow!("Duration too large")),
    }
}

/// One hour for timed events, the same day for all-day events.
fn default_end(start: When) -> Result<When> {
    match start {
        When::Day(d) => Ok(When::Day(d)),
        When::At(dt) => dt
            .checked_add_signed(Duration::hours(1))
            .map(When::At)
            .ok_or_else(|| anyhow!("Give an explicit end")),
    }
}
