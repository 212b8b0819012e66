//! The three-step create/edit event wizard.
//!
//! Details -> Participants -> Settings. Leaving the participants step saves
//! the event to the server (create the first time, update afterwards), and
//! so does the final submit. Each save reconciles guests against what the
//! server already holds and then verifies the write.
//!
//! Every action takes `&mut self`, so a second action cannot start while a
//! save is in flight.

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::api::protocol::EventDetail;
use crate::directory::{Directory, DirectoryClient};
use crate::error::{WorknestError, WorknestResult};
use crate::event::{EventDraft, EventType, ExternalContact};
use crate::identity::{IdentityResolver, OrganizationContext};
use crate::notify::{Notice, Notifier};
use crate::participants::ParticipantSelection;
use crate::reconcile::{existing_guest_ids, reconcile};
use crate::retry::RetryPolicy;
use crate::session::SessionStore;
use crate::verify::{PostSaveVerifier, VerifyOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Details,
    Participants,
    Settings,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Details => 1,
            WizardStep::Participants => 2,
            WizardStep::Settings => 3,
        }
    }

    fn previous(self) -> Self {
        match self {
            WizardStep::Details | WizardStep::Participants => WizardStep::Details,
            WizardStep::Settings => WizardStep::Participants,
        }
    }
}

/// What one save did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub event_id: String,
    pub created: bool,
    /// Internal guest ids that were sent (empty for external events).
    pub guest_ids: Vec<String>,
    pub verification: VerifyOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Moved(WizardStep),
    /// The final submit went through; the caller should leave the wizard.
    Completed(SaveReport),
}

pub struct EventWizard<S, N> {
    api: ApiClient,
    identity: IdentityResolver<S>,
    directory_client: DirectoryClient<S>,
    verifier: PostSaveVerifier<N>,
    step: WizardStep,
    draft: EventDraft,
    selection: ParticipantSelection,
    directory: Directory,
    /// The event as handed to the wizard when editing.
    snapshot: Option<EventDetail>,
    completed: bool,
}

impl<S, N> EventWizard<S, N>
where
    S: SessionStore + Clone,
    N: Notifier + Clone,
{
    pub fn new(
        api: ApiClient,
        identity: IdentityResolver<S>,
        verify_policy: RetryPolicy,
        notifier: N,
    ) -> Self {
        EventWizard {
            directory_client: DirectoryClient::new(api.clone(), identity.clone()),
            verifier: PostSaveVerifier::new(api.clone(), verify_policy, notifier),
            api,
            identity,
            step: WizardStep::Details,
            draft: EventDraft::default(),
            selection: ParticipantSelection::new(),
            directory: Directory::default(),
            snapshot: None,
            completed: false,
        }
    }

    /// Start editing an existing event. The event detail endpoint is
    /// authoritative; `snapshot` (what the caller already had) is used only
    /// when that read fails.
    pub async fn load_event(
        &mut self,
        event_id: &str,
        snapshot: Option<EventDetail>,
    ) -> WorknestResult<()> {
        let event_organization = snapshot.as_ref().and_then(|s| s.organization_id.clone());
        let context = self.identity.resolve(event_organization.as_deref());

        let detail = match self.api.event_detail(&context.organization_id, event_id).await {
            Ok(detail) => detail,
            Err(e) => match &snapshot {
                Some(snapshot) => {
                    warn!(event_id, error = %e, "event detail unavailable, editing from snapshot");
                    snapshot.clone()
                }
                None => return Err(e),
            },
        };

        let mut draft = EventDraft::from_detail(&detail);
        draft.event_id = Some(event_id.to_string());
        if draft.organization_id.is_none() {
            draft.organization_id = event_organization;
        }

        self.selection = ParticipantSelection::from_detail(&detail);
        self.draft = draft;
        self.snapshot = snapshot;
        self.step = WizardStep::Details;
        self.completed = false;
        Ok(())
    }

    /// Fetch the directory for the participants step. On error the previous
    /// (possibly empty) tree is kept and the error is returned for display.
    pub async fn load_directory(&mut self) -> WorknestResult<&Directory> {
        self.directory = self.directory_client.fetch_participants().await?;
        Ok(&self.directory)
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn draft(&self) -> &EventDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut EventDraft {
        &mut self.draft
    }

    pub fn selection(&self) -> &ParticipantSelection {
        &self.selection
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn organization(&self) -> OrganizationContext {
        self.identity.resolve(self.draft.organization_id.as_deref())
    }

    pub fn can_advance(&self) -> bool {
        match self.step {
            WizardStep::Details => self.draft.details_complete(),
            WizardStep::Participants | WizardStep::Settings => true,
        }
    }

    // PARTICIPANTS:

    pub fn toggle_member(&mut self, id: &str) -> bool {
        self.selection.toggle_member(id)
    }

    pub fn add_all_in_department_sub(&mut self, department_id: &str, sub_id: &str) -> usize {
        self.selection
            .add_all_in_department_sub(&self.directory.tree, department_id, sub_id)
    }

    pub fn remove_all_in_department_sub(&mut self, department_id: &str, sub_id: &str) -> usize {
        self.selection
            .remove_all_in_department_sub(&self.directory.tree, department_id, sub_id)
    }

    pub fn add_external_contact(&mut self, contact: ExternalContact) -> bool {
        self.selection.add_external_contact(contact)
    }

    pub fn remove_external_contact(&mut self, index: usize) -> Option<ExternalContact> {
        self.selection.remove_external_contact(index)
    }

    // NAVIGATION:

    /// Never touches the network.
    pub fn back(&mut self) -> WizardStep {
        self.step = self.step.previous();
        self.step
    }

    /// Advance one step. Leaving the participants step saves the event;
    /// "next" on the last step is the final submit.
    ///
    /// On a failed save the step does not change and an error notice is
    /// sent; nothing is retried automatically.
    pub async fn next(&mut self) -> WorknestResult<StepOutcome> {
        match self.step {
            WizardStep::Details => {
                self.draft.validate_details()?;
                self.step = WizardStep::Participants;
                Ok(StepOutcome::Moved(self.step))
            }
            WizardStep::Participants => {
                self.save_or_notify().await?;
                self.step = WizardStep::Settings;
                Ok(StepOutcome::Moved(self.step))
            }
            WizardStep::Settings => self.submit().await.map(StepOutcome::Completed),
        }
    }

    /// Final save. Can be called from any step once the details are valid.
    pub async fn submit(&mut self) -> WorknestResult<SaveReport> {
        let report = self.save_or_notify().await?;
        self.completed = true;
        info!(event_id = %report.event_id, "event saved");
        Ok(report)
    }

    async fn save_or_notify(&mut self) -> WorknestResult<SaveReport> {
        match self.save().await {
            Ok(report) => Ok(report),
            Err(e @ WorknestError::Validation(_)) => Err(e),
            Err(e) => {
                warn!(step = self.step.number(), error = %e, "saving event failed");
                self.verifier
                    .notifier()
                    .notify(Notice::error(format!("Could not save event: {e}")));
                Err(e)
            }
        }
    }

    async fn save(&mut self) -> WorknestResult<SaveReport> {
        self.draft.validate_details()?;

        let context = self.identity.resolve(self.draft.organization_id.as_deref());
        let guest_ids = match self.draft.event_type {
            EventType::Internal => self.guests_to_send(&context).await,
            EventType::External => Vec::new(),
        };

        let payload =
            self.draft
                .to_payload(&context, guest_ids.clone(), self.selection.external().to_vec())?;

        let (event_id, created) = match self.draft.event_id.clone() {
            None => {
                let id = self
                    .api
                    .create_event(&context.organization_id, &payload)
                    .await?;
                debug!(event_id = %id, "event created");
                self.draft.event_id = Some(id.clone());
                (id, true)
            }
            Some(id) => {
                self.api
                    .update_event(&context.organization_id, &id, &payload)
                    .await?;
                debug!(event_id = %id, "event updated");
                (id, false)
            }
        };

        let verification = self
            .verifier
            .verify(
                &context.organization_id,
                &event_id,
                self.draft.event_type,
                &guest_ids,
            )
            .await;

        Ok(SaveReport {
            event_id,
            created,
            guest_ids,
            verification,
        })
    }

    /// The directory check and the persisted-guest read are independent, so
    /// they run side by side.
    async fn guests_to_send(&self, context: &OrganizationContext) -> Vec<String> {
        let candidates = self.selection.members();

        let valid_ids = async {
            if candidates.is_empty() {
                None
            } else {
                self.directory_client.valid_user_ids().await
            }
        };
        let existing = existing_guest_ids(
            &self.api,
            &context.organization_id,
            self.draft.event_id.as_deref(),
            self.snapshot.as_ref(),
        );

        let (valid_ids, existing) = tokio::join!(valid_ids, existing);
        reconcile(candidates, &existing, valid_ids.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use crate::session::MemoryStore;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::{Value, json};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    type TestWizard = EventWizard<Arc<MemoryStore>, RecordingNotifier>;

    const USERS_PATH: &str = "/organizations/acme/users";
    const EVENTS_PATH: &str = "/organizations/acme/events";
    const EVENT_PATH: &str = "/organizations/acme/events/e1";

    fn wizard(server: &MockServer) -> (TestWizard, RecordingNotifier) {
        let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let store = Arc::new(MemoryStore::with_values([("organization_id", "acme")]));
        let notifier = RecordingNotifier::new();
        let wizard = EventWizard::new(
            api,
            IdentityResolver::new(store, "default"),
            RetryPolicy::new(3, Duration::from_millis(5)),
            notifier.clone(),
        );
        (wizard, notifier)
    }

    fn fill_details(draft: &mut EventDraft) {
        draft.title = "Sprint Review".into();
        draft.start_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        draft.end_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        draft.start_time = NaiveTime::from_hms_opt(10, 0, 0);
        draft.end_time = NaiveTime::from_hms_opt(11, 0, 0);
    }

    async fn mount_users(server: &MockServer, ids: &[u32]) {
        let users: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "id": id, "username": format!("user{id}") }))
            .collect();
        Mock::given(method("GET"))
            .and(path(USERS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(users))
            .mount(server)
            .await;
    }

    async fn mount_event(server: &MockServer, guests: &[&str]) {
        Mock::given(method("GET"))
            .and(path(EVENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "event_id": "e1",
                "title": "Sprint Review",
                "event_type": "internal",
                "start_time": "2024-05-01T10:00:00",
                "end_time": "2024-05-01T11:00:00",
                "internal_guest_ids": guests,
                "organization_id": "acme"
            })))
            .mount(server)
            .await;
    }

    async fn bodies(server: &MockServer, verb: &str) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == verb)
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    fn guest_set(body: &Value) -> HashSet<String> {
        body["internal_guest_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn empty_title_blocks_first_step_without_network() {
        let server = MockServer::start().await;
        let (mut wizard, _) = wizard(&server);
        fill_details(wizard.draft_mut());
        wizard.draft_mut().title = String::new();

        assert!(!wizard.can_advance());
        let result = wizard.next().await;

        assert!(matches!(result, Err(WorknestError::Validation(_))));
        assert_eq!(wizard.step(), WizardStep::Details);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn creating_internal_event_sends_selected_members() {
        let server = MockServer::start().await;
        mount_users(&server, &[7, 12]).await;
        Mock::given(method("POST"))
            .and(path(EVENTS_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "event_id": "e1" })))
            .expect(1)
            .mount(&server)
            .await;
        mount_event(&server, &["7", "12"]).await;

        let (mut wizard, notifier) = wizard(&server);
        fill_details(wizard.draft_mut());

        assert_eq!(wizard.next().await.unwrap(), StepOutcome::Moved(WizardStep::Participants));
        wizard.toggle_member("7");
        wizard.toggle_member("12");
        assert_eq!(wizard.next().await.unwrap(), StepOutcome::Moved(WizardStep::Settings));

        let posted = bodies(&server, "POST").await;
        assert_eq!(posted.len(), 1);
        let body = &posted[0];
        assert_eq!(body["event_type"], "internal");
        assert_eq!(body["internal_guest_ids"], json!(["7", "12"]));
        assert_eq!(body["external_contacts"], json!([]));
        assert_eq!(body["start_time"], "2024-05-01T10:00:00");
        assert_eq!(body["end_date"], "2024-05-01T11:00:00");
        assert_eq!(body["organization_id"], "acme");
        assert!(body.get("event_id").is_none());

        assert_eq!(wizard.draft().event_id.as_deref(), Some("e1"));
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn final_submit_updates_the_created_event() {
        let server = MockServer::start().await;
        mount_users(&server, &[7, 12]).await;
        Mock::given(method("POST"))
            .and(path(EVENTS_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "e1" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(EVENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;
        mount_event(&server, &["7"]).await;

        let (mut wizard, _) = wizard(&server);
        fill_details(wizard.draft_mut());
        wizard.next().await.unwrap();
        wizard.toggle_member("7");
        wizard.next().await.unwrap();

        let outcome = wizard.next().await.unwrap();
        let StepOutcome::Completed(report) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };

        assert!(!report.created);
        assert_eq!(report.event_id, "e1");
        assert_eq!(report.verification, VerifyOutcome::Confirmed);
        assert!(wizard.is_completed());

        let put = bodies(&server, "PUT").await;
        assert_eq!(put[0]["event_id"], "e1");
    }

    #[tokio::test]
    async fn editing_keeps_persisted_guests() {
        let server = MockServer::start().await;
        mount_users(&server, &[7, 12]).await;
        mount_event(&server, &["7"]).await;
        Mock::given(method("PUT"))
            .and(path(EVENT_PATH))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (mut wizard, _) = wizard(&server);
        wizard.load_event("e1", None).await.unwrap();
        assert!(wizard.selection().contains("7"));

        wizard.next().await.unwrap();
        wizard.toggle_member("12");
        wizard.submit().await.unwrap();

        let put = bodies(&server, "PUT").await;
        assert_eq!(guest_set(&put[0]), HashSet::from(["7".to_string(), "12".to_string()]));
    }

    #[tokio::test]
    async fn unselecting_a_persisted_guest_does_not_remove_it() {
        let server = MockServer::start().await;
        mount_users(&server, &[7, 12]).await;
        mount_event(&server, &["7"]).await;
        Mock::given(method("PUT"))
            .and(path(EVENT_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (mut wizard, _) = wizard(&server);
        wizard.load_event("e1", None).await.unwrap();
        wizard.toggle_member("7");
        wizard.toggle_member("12");
        wizard.submit().await.unwrap();

        let put = bodies(&server, "PUT").await;
        assert_eq!(guest_set(&put[0]), HashSet::from(["7".to_string(), "12".to_string()]));
    }

    #[tokio::test]
    async fn unknown_members_are_filtered_by_directory() {
        let server = MockServer::start().await;
        mount_users(&server, &[7]).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "event_id": "e1" })))
            .mount(&server)
            .await;
        mount_event(&server, &["7"]).await;

        let (mut wizard, _) = wizard(&server);
        fill_details(wizard.draft_mut());
        wizard.toggle_member("7");
        wizard.toggle_member("404");
        let report = wizard.submit().await.unwrap();

        assert_eq!(report.guest_ids, vec!["7"]);
    }

    #[tokio::test]
    async fn failed_save_stays_on_participants_and_notifies() {
        let server = MockServer::start().await;
        mount_users(&server, &[7]).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (mut wizard, notifier) = wizard(&server);
        fill_details(wizard.draft_mut());
        wizard.next().await.unwrap();
        wizard.toggle_member("7");

        let result = wizard.next().await;

        assert!(result.unwrap_err().is_server_error());
        assert_eq!(wizard.step(), WizardStep::Participants);
        assert_eq!(wizard.draft().event_id, None);
        assert_eq!(notifier.count(NoticeLevel::Error), 1);
        assert!(!wizard.is_completed());
    }

    #[tokio::test]
    async fn external_event_sends_contacts_and_skips_verification() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "event_id": "e1" })))
            .expect(1)
            .mount(&server)
            .await;

        let (mut wizard, _) = wizard(&server);
        fill_details(wizard.draft_mut());
        wizard.draft_mut().event_type = EventType::External;
        wizard.toggle_member("7");
        assert!(wizard.add_external_contact(ExternalContact::new("Bo", "bo@x.io", "555")));
        assert!(!wizard.add_external_contact(ExternalContact::new("Nobody", "", "")));

        let report = wizard.submit().await.unwrap();

        assert_eq!(report.verification, VerifyOutcome::Skipped);
        let body = &bodies(&server, "POST").await[0];
        assert_eq!(body["event_type"], "external");
        assert_eq!(body["internal_guest_ids"], json!([]));
        assert_eq!(body["external_contacts"][0]["email"], "bo@x.io");
        assert_eq!(bodies(&server, "GET").await.len(), 0);
    }

    #[tokio::test]
    async fn load_falls_back_to_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EVENT_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let snapshot = EventDetail {
            event_id: Some("e1".into()),
            title: "Offsite".into(),
            start_time: Some("2024-03-10T00:00:00".into()),
            end_time: Some("2024-03-10T23:59:00".into()),
            internal_guest_ids: vec!["3".into()],
            ..Default::default()
        };

        let (mut wizard, _) = wizard(&server);
        wizard.load_event("e1", Some(snapshot)).await.unwrap();

        assert_eq!(wizard.draft().title, "Offsite");
        assert!(wizard.draft().all_day);
        assert!(wizard.selection().contains("3"));
        assert!(wizard.can_advance());
    }

    #[tokio::test]
    async fn load_without_snapshot_propagates_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (mut wizard, _) = wizard(&server);
        assert!(wizard.load_event("e1", None).await.is_err());
    }

    #[tokio::test]
    async fn department_bulk_selection_uses_loaded_tree() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "departments": [{ "department_id": "eng", "sub_department_id": "web" }] },
                { "id": 2, "departments": [{ "department_id": "eng", "sub_department_id": "web" }] }
            ])))
            .mount(&server)
            .await;

        let (mut wizard, _) = wizard(&server);
        assert_eq!(wizard.add_all_in_department_sub("eng", "web"), 0);

        wizard.load_directory().await.unwrap();
        assert_eq!(wizard.add_all_in_department_sub("eng", "web"), 2);
        assert_eq!(wizard.remove_all_in_department_sub("eng", "web"), 2);
        assert!(wizard.selection().is_empty());
    }

    #[tokio::test]
    async fn back_never_leaves_the_first_step() {
        let server = MockServer::start().await;
        let (mut wizard, _) = wizard(&server);
        fill_details(wizard.draft_mut());

        assert_eq!(wizard.back(), WizardStep::Details);
        wizard.next().await.unwrap();
        assert_eq!(wizard.back(), WizardStep::Details);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
