use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;
use crate::utils::tui::with_spinner;

/// Days shown when only a start is given.
const DEFAULT_SPAN_DAYS: i64 = 30;

pub async fn run(from: Option<&str>, to: Option<&str>) -> Result<()> {
    let (from, to) = date_range(from, to, Local::now().date_naive())?;

    let app = App::load()?;
    let organization = app.organization();
    let mut events = with_spinner(
        "Loading events",
        app.api.list_events(&organization.organization_id, from, to),
    )
    .await?;

    if events.is_empty() {
        println!("{}", format!("No events between {from} and {to}").dimmed());
        return Ok(());
    }

    events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    for event in &events {
        println!("  {}", event.render());
    }
    Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date \"{input}\", expected YYYY-MM-DD"))
}

fn date_range(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let from = from.map(parse_date).transpose()?.unwrap_or(today);
    let to = match to {
        Some(to) => parse_date(to)?,
        None => from + Duration::days(DEFAULT_SPAN_DAYS),
    };

    if to < from {
        anyhow::bail!("--to ({to}) is before --from ({from})");
    }
    Ok((from, to))
}
