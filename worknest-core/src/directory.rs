//! Organization user directory, grouped into departments and sub-departments.
//!
//! The tree is a read-only projection rebuilt on every fetch. Users without
//! any department go into a synthetic "Unassigned / General" bucket so that
//! everyone listed by the backend stays selectable.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::api::protocol::{DepartmentMembership, UserRecord};
use crate::error::WorknestResult;
use crate::identity::IdentityResolver;
use crate::session::SessionStore;

pub const UNASSIGNED_DEPARTMENT_ID: &str = "unassigned";
pub const UNASSIGNED_DEPARTMENT_NAME: &str = "Unassigned";
pub const GENERAL_SUB_DEPARTMENT_ID: &str = "general";
pub const GENERAL_SUB_DEPARTMENT_NAME: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub departments: Vec<DepartmentMembership>,
}

impl DirectoryUser {
    /// Full name, falling back to username, then id.
    pub fn display_name(&self) -> &str {
        if !self.full_name.trim().is_empty() {
            &self.full_name
        } else if !self.username.trim().is_empty() {
            &self.username
        } else {
            &self.id
        }
    }
}

impl From<UserRecord> for DirectoryUser {
    fn from(record: UserRecord) -> Self {
        DirectoryUser {
            id: record.id,
            username: record.username,
            full_name: record.full_name,
            departments: record.departments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubDepartment {
    pub id: String,
    pub name: String,
    pub members: Vec<DirectoryUser>,
}

impl SubDepartment {
    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|u| u.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub sub_departments: Vec<SubDepartment>,
}

/// Departments and sub-departments in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepartmentTree {
    departments: Vec<Department>,
}

/// A resolved (department, sub-department) placement for one membership.
struct Placement {
    department_id: String,
    department_name: String,
    sub_id: String,
    sub_name: String,
}

impl Placement {
    fn unassigned() -> Self {
        Placement {
            department_id: UNASSIGNED_DEPARTMENT_ID.to_string(),
            department_name: UNASSIGNED_DEPARTMENT_NAME.to_string(),
            sub_id: GENERAL_SUB_DEPARTMENT_ID.to_string(),
            sub_name: GENERAL_SUB_DEPARTMENT_NAME.to_string(),
        }
    }

    /// None when the membership names no department at all.
    fn from_membership(m: &DepartmentMembership) -> Option<Self> {
        let department_id = non_blank(m.department_id.as_deref())
            .or_else(|| non_blank(m.department_name.as_deref()))?;
        let department_name =
            non_blank(m.department_name.as_deref()).unwrap_or_else(|| department_id.clone());

        let sub_id = non_blank(m.sub_department_id.as_deref())
            .or_else(|| non_blank(m.sub_department_name.as_deref()));
        let (sub_id, sub_name) = match sub_id {
            Some(id) => {
                let name = non_blank(m.sub_department_name.as_deref()).unwrap_or_else(|| id.clone());
                (id, name)
            }
            None => (
                GENERAL_SUB_DEPARTMENT_ID.to_string(),
                GENERAL_SUB_DEPARTMENT_NAME.to_string(),
            ),
        };

        Some(Placement {
            department_id,
            department_name,
            sub_id,
            sub_name,
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

impl DepartmentTree {
    pub fn build(users: &[DirectoryUser]) -> Self {
        let mut tree = DepartmentTree::default();

        for user in users {
            let mut placements: Vec<Placement> = user
                .departments
                .iter()
                .filter_map(Placement::from_membership)
                .collect();
            if placements.is_empty() {
                placements.push(Placement::unassigned());
            }

            for placement in placements {
                tree.insert(placement, user);
            }
        }

        tree
    }

    fn insert(&mut self, placement: Placement, user: &DirectoryUser) {
        let department = match self
            .departments
            .iter()
            .position(|d| d.id == placement.department_id)
        {
            Some(i) => &mut self.departments[i],
            None => {
                self.departments.push(Department {
                    id: placement.department_id,
                    name: placement.department_name,
                    sub_departments: Vec::new(),
                });
                let last = self.departments.len() - 1;
                &mut self.departments[last]
            }
        };

        let sub = match department
            .sub_departments
            .iter()
            .position(|s| s.id == placement.sub_id)
        {
            Some(i) => &mut department.sub_departments[i],
            None => {
                department.sub_departments.push(SubDepartment {
                    id: placement.sub_id,
                    name: placement.sub_name,
                    members: Vec::new(),
                });
                let last = department.sub_departments.len() - 1;
                &mut department.sub_departments[last]
            }
        };

        if !sub.members.iter().any(|m| m.id == user.id) {
            sub.members.push(user.clone());
        }
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn sub_department(&self, department_id: &str, sub_id: &str) -> Option<&SubDepartment> {
        self.departments
            .iter()
            .find(|d| d.id == department_id)?
            .sub_departments
            .iter()
            .find(|s| s.id == sub_id)
    }

    /// Every user id under one sub-department node; empty if the node is unknown.
    pub fn member_ids(&self, department_id: &str, sub_id: &str) -> Vec<String> {
        self.sub_department(department_id, sub_id)
            .map(|s| s.member_ids().map(String::from).collect())
            .unwrap_or_default()
    }
}

/// One fetch of the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Directory {
    pub users: Vec<DirectoryUser>,
    pub tree: DepartmentTree,
}

impl Directory {
    pub fn from_records(records: Vec<UserRecord>) -> Self {
        let users: Vec<DirectoryUser> = records.into_iter().map(DirectoryUser::from).collect();
        let tree = DepartmentTree::build(&users);
        Directory { users, tree }
    }

    pub fn user_ids(&self) -> HashSet<String> {
        self.users.iter().map(|u| u.id.clone()).collect()
    }

    pub fn user(&self, id: &str) -> Option<&DirectoryUser> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Human label for a selected id; unknown ids are shown as-is.
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.user(id).map(DirectoryUser::display_name).unwrap_or(id)
    }
}

pub struct DirectoryClient<S> {
    api: ApiClient,
    identity: IdentityResolver<S>,
}

impl<S: SessionStore> DirectoryClient<S> {
    pub fn new(api: ApiClient, identity: IdentityResolver<S>) -> Self {
        DirectoryClient { api, identity }
    }

    /// Fetch the directory for the current organization. Errors are meant to
    /// be shown inline; selection keeps working with an empty tree.
    pub async fn fetch_participants(&self) -> WorknestResult<Directory> {
        let context = self.identity.resolve(None);
        let records = self.api.list_users(&context.organization_id).await?;
        debug!(
            organization_id = %context.organization_id,
            users = records.len(),
            "fetched directory"
        );
        Ok(Directory::from_records(records))
    }

    /// Ids allowed as internal guests, or None if the directory is unreachable.
    pub async fn valid_user_ids(&self) -> Option<HashSet<String>> {
        match self.fetch_participants().await {
            Ok(directory) => Some(directory.user_ids()),
            Err(e) => {
                warn!(error = %e, "directory unavailable, guest ids will not be filtered");
                None
            }
        }
    }
}
