//! Resolves which organization and user every request is made on behalf of.
//!
//! Several places may hold the organization id depending on which login path
//! the user went through. The first usable candidate wins:
//!
//! 1. session `organization_id`
//! 2. session `selectedOrganizationId`
//! 3. session `orgId`
//! 4. `organization_id` inside the serialized `user_info` record
//! 5. the organization id carried by the event being edited
//!
//! When none is usable the default tenant token is returned and written back
//! under `organization_id`. Storage failures count as "absent"; resolution
//! itself cannot fail.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::DEFAULT_ORGANIZATION_ID;
use crate::session::{
    ORG_ID_KEY, ORGANIZATION_ID_KEY, SELECTED_ORGANIZATION_ID_KEY, SessionStore, USER_ID_CAMEL_KEY,
    USER_ID_KEY, USER_INFO_KEY,
};

const ORGANIZATION_KEYS: [&str; 3] = [ORGANIZATION_ID_KEY, SELECTED_ORGANIZATION_ID_KEY, ORG_ID_KEY];
const USER_KEYS: [&str; 2] = [USER_ID_KEY, USER_ID_CAMEL_KEY];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationContext {
    /// Never empty.
    pub organization_id: String,
    pub user_id: Option<String>,
}

#[derive(Clone)]
pub struct IdentityResolver<S> {
    store: S,
    default_organization_id: String,
}

impl<S: SessionStore> IdentityResolver<S> {
    /// A blank or placeholder default falls back to the built-in tenant token.
    pub fn new(store: S, default_organization_id: impl Into<String>) -> Self {
        let default_organization_id = usable(&default_organization_id.into())
            .unwrap_or_else(|| DEFAULT_ORGANIZATION_ID.to_string());

        IdentityResolver {
            store,
            default_organization_id,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolve(&self, event_organization_id: Option<&str>) -> OrganizationContext {
        let user_info = self.user_info();

        let organization_id = ORGANIZATION_KEYS
            .iter()
            .find_map(|key| self.read(key))
            .or_else(|| user_info.as_ref().and_then(|info| field(info, "organization_id")))
            .or_else(|| event_organization_id.and_then(usable))
            .unwrap_or_else(|| self.fall_back_to_default());

        let user_id = USER_KEYS.iter().find_map(|key| self.read(key)).or_else(|| {
            user_info
                .as_ref()
                .and_then(|info| field(info, "id").or_else(|| field(info, "user_id")))
        });

        OrganizationContext {
            organization_id,
            user_id,
        }
    }

    fn fall_back_to_default(&self) -> String {
        let default = self.default_organization_id.clone();
        debug!(organization_id = %default, "no organization in session, using default tenant");

        if let Err(e) = self.store.set(ORGANIZATION_ID_KEY, &default) {
            warn!(error = %e, "could not persist default organization");
        }

        default
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.as_deref().and_then(usable),
            Err(e) => {
                debug!(key, error = %e, "session read failed, treating as absent");
                None
            }
        }
    }

    fn user_info(&self) -> Option<Value> {
        let raw = self.read(USER_INFO_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(value @ Value::Object(_)) => Some(value),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "user_info is not valid JSON");
                None
            }
        }
    }
}

/// Serialized storage turns missing values into the strings "null" and
/// "undefined"; those count as absent, as do blank strings.
fn usable(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("undefined")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn field(record: &Value, name: &str) -> Option<String> {
    match record.get(name)? {
        Value::String(s) => usable(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
