//! Wizard-local participant selection.
//!
//! Holds both participant models side by side; the event type decides which
//! one is sent. Every operation is a plain state transition and repeating it
//! is harmless.

use std::collections::HashSet;

use crate::api::protocol::EventDetail;
use crate::directory::DepartmentTree;
use crate::event::ExternalContact;

#[derive(Debug, Clone, Default)]
pub struct ParticipantSelection {
    /// Internal user ids, unique, in the order they were picked.
    members: Vec<String>,
    external: Vec<ExternalContact>,
}

/// Members compare as a set; external contacts by position.
impl PartialEq for ParticipantSelection {
    fn eq(&self, other: &Self) -> bool {
        self.member_set() == other.member_set() && self.external == other.external
    }
}

impl Eq for ParticipantSelection {}

impl ParticipantSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an event that already exists.
    pub fn from_detail(detail: &EventDetail) -> Self {
        let mut selection = ParticipantSelection::new();
        for id in &detail.internal_guest_ids {
            selection.insert(id);
        }
        for contact in &detail.external_contacts {
            selection.add_external_contact(contact.clone());
        }
        selection
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn member_set(&self) -> HashSet<&str> {
        self.members.iter().map(String::as_str).collect()
    }

    pub fn external(&self) -> &[ExternalContact] {
        &self.external
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.external.is_empty()
    }

    fn insert(&mut self, id: &str) -> bool {
        if id.is_empty() || self.contains(id) {
            return false;
        }
        self.members.push(id.to_string());
        true
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != id);
        self.members.len() != before
    }

    /// Select if unselected, unselect otherwise. Returns whether `id` is
    /// selected afterwards.
    pub fn toggle_member(&mut self, id: &str) -> bool {
        if self.remove(id) {
            false
        } else {
            self.insert(id)
        }
    }

    /// Union with every user under the node. Returns how many were added.
    pub fn add_all_in_department_sub(
        &mut self,
        tree: &DepartmentTree,
        department_id: &str,
        sub_id: &str,
    ) -> usize {
        tree.member_ids(department_id, sub_id)
            .iter()
            .filter(|id| self.insert(id))
            .count()
    }

    /// Difference with every user under the node. Returns how many were removed.
    pub fn remove_all_in_department_sub(
        &mut self,
        tree: &DepartmentTree,
        department_id: &str,
        sub_id: &str,
    ) -> usize {
        let node: HashSet<String> = tree.member_ids(department_id, sub_id).into_iter().collect();
        let before = self.members.len();
        self.members.retain(|m| !node.contains(m));
        before - self.members.len()
    }

    /// Appends the contact unless its email is blank.
    pub fn add_external_contact(&mut self, contact: ExternalContact) -> bool {
        let email = contact.email.trim();
        if email.is_empty() {
            return false;
        }

        self.external.push(ExternalContact {
            name: contact.name.trim().to_string(),
            email: email.to_string(),
            phone: contact.phone.trim().to_string(),
        });
        true
    }

    pub fn remove_external_contact(&mut self, index: usize) -> Option<ExternalContact> {
        if index < self.external.len() {
            Some(self.external.remove(index))
        } else {
            None
        }
    }
}
