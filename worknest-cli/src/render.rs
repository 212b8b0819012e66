//! Colored terminal rendering for worknest-core types.

use owo_colors::OwoColorize;
use worknest_core::api::protocol::EventDetail;
use worknest_core::directory::{Directory, DepartmentTree};
use worknest_core::event::{format_date, parse_wire_datetime};
use worknest_core::{EventDraft, EventType, ParticipantSelection, SaveReport, VerifyOutcome};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventType {
    fn render(&self) -> String {
        match self {
            EventType::Internal => "internal".blue().to_string(),
            EventType::External => "external".magenta().to_string(),
        }
    }
}

impl Render for VerifyOutcome {
    fn render(&self) -> String {
        match self {
            VerifyOutcome::Skipped => "not checked".dimmed().to_string(),
            VerifyOutcome::Confirmed => "participants confirmed".green().to_string(),
            VerifyOutcome::Compensated => "participants repaired".yellow().to_string(),
            VerifyOutcome::Degraded => "participants missing".red().to_string(),
            VerifyOutcome::Aborted => "could not check participants".dimmed().to_string(),
        }
    }
}

impl Render for SaveReport {
    fn render(&self) -> String {
        let verb = if self.created { "Created" } else { "Saved" };
        format!(
            "{} {} ({} guests, {})",
            format!("{verb} event").green(),
            self.event_id.bold(),
            self.guest_ids.len(),
            self.verification.render()
        )
    }
}

impl Render for EventDetail {
    fn render(&self) -> String {
        let start = self
            .start_time
            .as_deref()
            .or(self.start_date.as_deref())
            .and_then(parse_wire_datetime);
        let when = match start {
            Some(dt) if self.all_day => format_date(dt.date()),
            Some(dt) => format!("{} {}", format_date(dt.date()), dt.format("%H:%M")),
            None => "?".to_string(),
        };
        let id = self.event_id.as_deref().unwrap_or("-");

        format!("{}  {}  {}", when.dimmed(), self.title.bold(), id.dimmed())
    }
}

/// Summary shown before saving.
pub fn draft_summary(
    draft: &EventDraft,
    selection: &ParticipantSelection,
    directory: &Directory,
) -> Vec<String> {
    let mut lines = vec![format!("  {} [{}]", draft.title.bold(), draft.event_type.render())];

    let dates = match (draft.start_date, draft.end_date) {
        (Some(s), Some(e)) if s == e => format_date(s),
        (Some(s), Some(e)) => format!("{} to {}", format_date(s), format_date(e)),
        _ => "no dates".to_string(),
    };
    let times = match (draft.all_day, draft.start_time, draft.end_time) {
        (true, _, _) => "all day".to_string(),
        (false, Some(s), Some(e)) => format!("{} to {}", s.format("%H:%M"), e.format("%H:%M")),
        _ => "no times".to_string(),
    };
    lines.push(format!("  {dates}, {times}"));

    if !draft.location.is_empty() {
        lines.push(format!("  at {}", draft.location));
    }

    match draft.event_type {
        EventType::Internal => {
            let names: Vec<&str> = selection
                .members()
                .iter()
                .map(|id| directory.label(id))
                .collect();
            lines.push(format!("  {} {}", "Guests:".dimmed(), names.join(", ")));
        }
        EventType::External => {
            for contact in selection.external() {
                lines.push(format!("  {} {} <{}>", "-".dimmed(), contact.name, contact.email));
            }
        }
    }

    lines
}

impl Render for DepartmentTree {
    fn render(&self) -> String {
        if self.is_empty() {
            return "  No users found".dimmed().to_string();
        }

        let mut lines = Vec::new();
        for department in self.departments() {
            lines.push(format!("  {}", department.name.bold()));
            for sub in &department.sub_departments {
                lines.push(format!(
                    "    {} {}",
                    sub.name,
                    format!("({})", sub.members.len()).dimmed()
                ));
                for member in &sub.members {
                    lines.push(format!("      {} {}", member.display_name(), member.id.dimmed()));
                }
            }
        }
        lines.join("\n")
    }
}
