//! Runs an `EventWizard` interactively until it completes or is cancelled.

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use owo_colors::OwoColorize;
use worknest_core::{StepOutcome, Visibility, WizardStep, WorknestError};

use super::{details, participants};
use crate::app::Wizard;
use crate::render::{Render, draft_summary};
use crate::utils::tui::with_spinner;

/// What the user chose at the end of a step.
pub enum Action {
    Next,
    Back,
    Cancel,
}

pub async fn drive(mut wizard: Wizard) -> Result<()> {
    loop {
        println!();
        println!(
            "{}",
            format!("Step {} of 3: {}", wizard.step().number(), step_title(wizard.step())).bold()
        );

        let action = match wizard.step() {
            WizardStep::Details => {
                details::prompt(wizard.draft_mut())?;
                Action::Next
            }
            WizardStep::Participants => participants::menu(&mut wizard).await?,
            WizardStep::Settings => settings(&mut wizard)?,
        };

        match action {
            Action::Cancel => {
                if let Some(id) = &wizard.draft().event_id {
                    println!("  {}", format!("Stopped. Event {id} keeps what was saved so far.").dimmed());
                } else {
                    println!("  {}", "Cancelled".dimmed());
                }
                return Ok(());
            }
            Action::Back => {
                wizard.back();
            }
            Action::Next => {
                let saving = wizard.step() != WizardStep::Details;
                let result = if saving {
                    with_spinner("Saving", wizard.next()).await
                } else {
                    wizard.next().await
                };

                match result {
                    Ok(StepOutcome::Moved(_)) => {
                        if saving {
                            if let Some(id) = &wizard.draft().event_id {
                                println!("  {}", format!("Saved as {id}").dimmed());
                            }
                        }
                    }
                    Ok(StepOutcome::Completed(report)) => {
                        println!();
                        println!("  {}", report.render());
                        return Ok(());
                    }
                    Err(WorknestError::Validation(message)) => {
                        eprintln!("  {}", message.red());
                    }
                    // Already reported through the notifier; stay on this step.
                    Err(_) => {}
                }
            }
        }
    }
}

fn step_title(step: WizardStep) -> &'static str {
    match step {
        WizardStep::Details => "Details",
        WizardStep::Participants => "Participants",
        WizardStep::Settings => "Settings",
    }
}

/// Step 3: reminders and sharing, then save.
fn settings(wizard: &mut Wizard) -> Result<Action> {
    let draft = wizard.draft_mut();

    draft.notification_minutes = Input::new()
        .with_prompt("  Reminder (minutes before)")
        .default(draft.notification_minutes)
        .interact_text()?;

    let visibilities = ["Public", "Private"];
    let current = match draft.visibility {
        Visibility::Public => 0,
        Visibility::Private => 1,
    };
    draft.visibility = match Select::new()
        .with_prompt("  Visibility")
        .items(&visibilities)
        .default(current)
        .interact()?
    {
        0 => Visibility::Public,
        _ => Visibility::Private,
    };

    draft.guests_allowed = Confirm::new()
        .with_prompt("  Guests may invite others?")
        .default(draft.guests_allowed)
        .interact()?;

    println!();
    for line in draft_summary(wizard.draft(), wizard.selection(), wizard.directory()) {
        println!("{line}");
    }
    println!();

    let choice = Select::new()
        .items(&["Save", "Back", "Cancel"])
        .default(0)
        .interact()?;

    Ok(match choice {
        0 => Action::Next,
        1 => Action::Back,
        _ => Action::Cancel,
    })
}
