use anyhow::Result;
use owo_colors::OwoColorize;

use super::wizard;
use crate::app::App;

pub async fn run(title: Option<String>) -> Result<()> {
    let app = App::load()?;
    let organization = app.organization();

    let mut wizard = app.wizard();
    if let Some(title) = title {
        wizard.draft_mut().title = title;
    }

    println!(
        "{} {}",
        "New event in".bold(),
        organization.organization_id.dimmed()
    );
    wizard::drive(wizard).await
}
