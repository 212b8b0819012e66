//! Post-save verification of internal guests.
//!
//! After a write the event is read back. Reads that fail with a 5xx are
//! retried under the configured policy; anything else ends verification
//! quietly. If the server shows no guests although some were sent, one
//! guest-only update is issued and the event is read once more. A still
//! empty list is reported to the user as a warning; the save itself is
//! never turned into a failure.

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::api::protocol::{EventDetail, GuestPatch};
use crate::error::WorknestResult;
use crate::event::EventType;
use crate::notify::{Notice, Notifier};
use crate::retry::RetryPolicy;

pub const GUESTS_NOT_SAVED: &str = "Participants were not saved on the server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// External event or nothing to check.
    Skipped,
    /// First read already showed guests.
    Confirmed,
    /// Guests showed up after the compensating update.
    Compensated,
    /// Guests are still missing; the user was warned.
    Degraded,
    /// Could not read the event back; nothing is known.
    Aborted,
}

pub struct PostSaveVerifier<N> {
    api: ApiClient,
    policy: RetryPolicy,
    notifier: N,
}

impl<N: Notifier> PostSaveVerifier<N> {
    pub fn new(api: ApiClient, policy: RetryPolicy, notifier: N) -> Self {
        PostSaveVerifier {
            api,
            policy,
            notifier,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub async fn verify(
        &self,
        organization_id: &str,
        event_id: &str,
        event_type: EventType,
        expected: &[String],
    ) -> VerifyOutcome {
        if event_type == EventType::External || expected.is_empty() {
            debug!(event_id, "nothing to verify");
            return VerifyOutcome::Skipped;
        }

        let detail = match self.read_with_retry(organization_id, event_id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(event_id, error = %e, "could not read event back, skipping verification");
                return VerifyOutcome::Aborted;
            }
        };

        if !detail.internal_guest_ids.is_empty() {
            debug!(event_id, guests = detail.internal_guest_ids.len(), "guests confirmed");
            return VerifyOutcome::Confirmed;
        }

        warn!(
            event_id,
            expected = expected.len(),
            "server shows no guests, sending compensating update"
        );
        let patch = GuestPatch {
            internal_guest_ids: expected.to_vec(),
        };
        if let Err(e) = self
            .api
            .patch_event_guests(organization_id, event_id, &patch)
            .await
        {
            warn!(event_id, error = %e, "compensating guest update failed");
            self.notifier.notify(Notice::warning(GUESTS_NOT_SAVED));
            return VerifyOutcome::Degraded;
        }

        match self.api.event_detail(organization_id, event_id).await {
            Ok(detail) if !detail.internal_guest_ids.is_empty() => {
                info!(event_id, "guests present after compensating update");
                VerifyOutcome::Compensated
            }
            Ok(_) => {
                warn!(event_id, "guests still missing after compensating update");
                self.notifier.notify(Notice::warning(GUESTS_NOT_SAVED));
                VerifyOutcome::Degraded
            }
            Err(e) => {
                warn!(event_id, error = %e, "could not re-read event after compensating update");
                VerifyOutcome::Aborted
            }
        }
    }

    async fn read_with_retry(
        &self,
        organization_id: &str,
        event_id: &str,
    ) -> WorknestResult<EventDetail> {
        let api = &self.api;
        self.policy
            .run(move || api.event_detail(organization_id, event_id))
            .await
    }
}
