//! Client-side core of the worknest event wizard.
//!
//! - `identity` works out which organization and user a request acts for
//! - `directory` fetches users and groups them by department
//! - `participants` holds what the user picked in the wizard
//! - `reconcile` merges picked guests with the ones already on the server
//! - `wizard` drives the three steps and saves the event
//! - `verify` reads the event back and repairs a lost guest list

pub mod api;
pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod event;
pub mod identity;
pub mod notify;
pub mod participants;
pub mod reconcile;
pub mod retry;
pub mod session;
pub mod verify;
pub mod wizard;

pub use api::ApiClient;
pub use config::WorknestConfig;
pub use directory::{Directory, DirectoryClient};
pub use error::{WorknestError, WorknestResult};
pub use event::{EventDraft, EventType, ExternalContact, Visibility};
pub use identity::{IdentityResolver, OrganizationContext};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use participants::ParticipantSelection;
pub use retry::RetryPolicy;
pub use session::{FileStore, MemoryStore, SessionStore};
pub use verify::{PostSaveVerifier, VerifyOutcome};
pub use wizard::{EventWizard, SaveReport, StepOutcome, WizardStep};
