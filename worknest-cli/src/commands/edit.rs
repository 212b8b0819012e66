use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use super::wizard;
use crate::app::App;
use crate::utils::tui::with_spinner;

pub async fn run(event_id: &str) -> Result<()> {
    let app = App::load()?;
    let mut wizard = app.wizard();

    with_spinner("Loading event", wizard.load_event(event_id, None))
        .await
        .with_context(|| format!("Could not load event {event_id}"))?;

    println!("{} {}", "Editing".bold(), wizard.draft().title.bold());
    wizard::drive(wizard).await
}
