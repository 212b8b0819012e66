//! Step 2 menus, plus the standalone directory listing.

use anyhow::Result;
use dialoguer::{Input, MultiSelect, Select};
use owo_colors::OwoColorize;
use worknest_core::directory::{DepartmentTree, DirectoryClient};
use worknest_core::{EventType, ExternalContact};

use super::wizard::Action;
use crate::app::{App, Wizard};
use crate::render::Render;
use crate::utils::tui::with_spinner;

pub async fn run() -> Result<()> {
    let app = App::load()?;
    let organization = app.organization();
    let client = DirectoryClient::new(app.api.clone(), app.identity.clone());

    let directory = with_spinner("Loading people", client.fetch_participants()).await?;

    println!(
        "{} {}",
        "Organization".bold(),
        organization.organization_id.dimmed()
    );
    println!("{}", directory.tree.render());
    Ok(())
}

pub async fn menu(wizard: &mut Wizard) -> Result<Action> {
    match wizard.draft().event_type {
        EventType::Internal => internal_menu(wizard).await,
        EventType::External => external_menu(wizard),
    }
}

async fn internal_menu(wizard: &mut Wizard) -> Result<Action> {
    if wizard.directory().users.is_empty() {
        if let Err(e) = with_spinner("Loading people", wizard.load_directory()).await {
            eprintln!("  {}", format!("Could not load people: {e}").red());
        }
    }

    loop {
        println!(
            "  {}",
            format!("{} selected", wizard.selection().members().len()).dimmed()
        );

        let choice = Select::new()
            .with_prompt("  Participants")
            .items(&[
                "Pick people",
                "Add a whole team",
                "Remove a whole team",
                "Next",
                "Back",
                "Cancel",
            ])
            .default(0)
            .interact()?;

        match choice {
            0 => pick_people(wizard)?,
            1 => {
                if let Some((department, sub)) = pick_team(wizard.directory().tree.clone())? {
                    let added = wizard.add_all_in_department_sub(&department, &sub);
                    println!("  Added {added}");
                }
            }
            2 => {
                if let Some((department, sub)) = pick_team(wizard.directory().tree.clone())? {
                    let removed = wizard.remove_all_in_department_sub(&department, &sub);
                    println!("  Removed {removed}");
                }
            }
            3 => return Ok(Action::Next),
            4 => return Ok(Action::Back),
            _ => return Ok(Action::Cancel),
        }
    }
}

/// Checkbox list over the directory. Selected ids that are not in the
/// directory (guests of an edited event) are left alone.
fn pick_people(wizard: &mut Wizard) -> Result<()> {
    let users = wizard.directory().users.clone();
    if users.is_empty() {
        eprintln!("  {}", "No people loaded".yellow());
        return Ok(());
    }

    let labels: Vec<String> = users
        .iter()
        .map(|u| format!("{} ({})", u.display_name(), u.id))
        .collect();
    let defaults: Vec<bool> = users
        .iter()
        .map(|u| wizard.selection().contains(&u.id))
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt("  Space to toggle, enter to confirm")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    for (index, user) in users.iter().enumerate() {
        let want = chosen.contains(&index);
        if want != wizard.selection().contains(&user.id) {
            wizard.toggle_member(&user.id);
        }
    }
    Ok(())
}

fn pick_team(tree: DepartmentTree) -> Result<Option<(String, String)>> {
    let nodes: Vec<(String, String, String)> = tree
        .departments()
        .iter()
        .flat_map(|d| {
            d.sub_departments.iter().map(move |s| {
                (
                    d.id.clone(),
                    s.id.clone(),
                    format!("{} / {} ({})", d.name, s.name, s.members.len()),
                )
            })
        })
        .collect();

    if nodes.is_empty() {
        eprintln!("  {}", "No teams loaded".yellow());
        return Ok(None);
    }

    let labels: Vec<&str> = nodes.iter().map(|(_, _, label)| label.as_str()).collect();
    let choice = Select::new()
        .with_prompt("  Team")
        .items(&labels)
        .default(0)
        .interact_opt()?;

    Ok(choice.map(|i| (nodes[i].0.clone(), nodes[i].1.clone())))
}

fn external_menu(wizard: &mut Wizard) -> Result<Action> {
    loop {
        for (index, contact) in wizard.selection().external().iter().enumerate() {
            println!(
                "  {} {} <{}> {}",
                format!("{}.", index + 1).dimmed(),
                contact.name,
                contact.email,
                contact.phone.dimmed()
            );
        }

        let choice = Select::new()
            .with_prompt("  Contacts")
            .items(&["Add contact", "Remove contact", "Next", "Back", "Cancel"])
            .default(0)
            .interact()?;

        match choice {
            0 => {
                let contact = prompt_contact()?;
                if !wizard.add_external_contact(contact) {
                    eprintln!("  {}", "An email address is required".red());
                }
            }
            1 => {
                let labels: Vec<String> = wizard
                    .selection()
                    .external()
                    .iter()
                    .map(|c| format!("{} <{}>", c.name, c.email))
                    .collect();
                if labels.is_empty() {
                    continue;
                }
                if let Some(index) = Select::new()
                    .with_prompt("  Remove")
                    .items(&labels)
                    .interact_opt()?
                {
                    wizard.remove_external_contact(index);
                }
            }
            2 => return Ok(Action::Next),
            3 => return Ok(Action::Back),
            _ => return Ok(Action::Cancel),
        }
    }
}

fn prompt_contact() -> Result<ExternalContact> {
    let name: String = Input::new()
        .with_prompt("  Name")
        .allow_empty(true)
        .interact_text()?;
    let email: String = Input::new()
        .with_prompt("  Email")
        .allow_empty(true)
        .interact_text()?;
    let phone: String = Input::new()
        .with_prompt("  Phone (skip)")
        .allow_empty(true)
        .interact_text()?;
    Ok(ExternalContact::new(name, email, phone))
}
