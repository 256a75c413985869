//! services/session/src/app/state.rs
//!
//! Defines the state owned by one user session and the handles views use to
//! reach it.

use crate::adapters::assistant::WELCOME_MESSAGE;
use crate::app::toaster::Toaster;
use crate::config::Config;
use lemuria_core::domain::{
    AstrologySystem, ChatMessage, Gender, ProfileDraft, ProfileField, ProfileRecord,
};
use lemuria_core::notifications::NotificationQueue;
use lemuria_core::ports::{AssistantService, Scheduler};
use lemuria_core::store::{ChatStore, ProfileStore};
use lemuria_core::validation::{ValidationError, ValidationErrors};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

//=========================================================================================
// Navigation Targets
//=========================================================================================

/// Where the host should navigate once a deferred operation completes.
/// The session never navigates by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Landing,
    ProfileCreation,
    Chat,
}

//=========================================================================================
// SessionState (Everything One Session Owns)
//=========================================================================================

/// A profile form: its draft, the error shown since the last submit and its submit flag.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub draft: ProfileDraft,
    /// Holds at most the earliest failure of the last rejected submit.
    pub errors: ValidationErrors,
    pub is_open: bool,
    pub in_flight: bool,
    /// The profile being edited; `None` means the form creates a new one.
    pub editing: Option<Uuid>,
}

impl ProfileForm {
    /// Updates one field and clears any error currently shown for it.
    pub fn edit(&mut self, field: ProfileField, value: impl Into<String>) {
        self.draft.set(field, value);
        self.errors.clear(field);
    }

    /// Records a rejected submit. Only the earliest failure is kept, so fixing
    /// it shows nothing further until the next submit.
    pub fn reject(&mut self, errors: &ValidationErrors) {
        self.errors = errors.only_first();
    }

    /// Discards the draft and errors. The open flag is left to the caller.
    pub fn clear(&mut self) {
        self.draft = ProfileDraft::default();
        self.errors = ValidationErrors::default();
        self.in_flight = false;
        self.editing = None;
    }

    /// The error the form displays.
    pub fn visible_error(&self) -> Option<&ValidationError> {
        self.errors.first()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Preferences {
    pub astrology_system: AstrologySystem,
    pub daily_insights: bool,
    pub planetary_alerts: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            astrology_system: AstrologySystem::Western,
            daily_insights: true,
            planetary_alerts: false,
        }
    }
}

/// Onboarding progress: the chosen system and the first-profile form.
#[derive(Debug, Clone, Default)]
pub struct OnboardingState {
    pub selected_system: Option<AstrologySystem>,
    pub is_saving_system: bool,
    pub form: ProfileForm,
}

/// The state for a single session. Views mutate it only while holding the lock.
#[derive(Debug, Default)]
pub struct SessionState {
    pub profiles: ProfileStore,
    pub messages: ChatStore,
    pub notifications: NotificationQueue,
    pub profile_form: ProfileForm,
    pub onboarding: OnboardingState,
    pub awaiting_reply: bool,
    pub preferences: Preferences,
    pub is_signing_out: bool,
}

impl SessionState {
    /// Seeds the demo primary profile and the assistant's welcome message.
    pub fn seed_demo(&mut self, scheduler: &dyn Scheduler) {
        let now = scheduler.now();
        self.profiles.append(ProfileRecord {
            id: Uuid::nil(),
            name: "John Doe".to_string(),
            gender: Gender::Male,
            date_of_birth: "1990-05-15".to_string(),
            time_of_birth: "14:30".to_string(),
            place_of_birth: "New York, USA".to_string(),
            astrology_system: AstrologySystem::Western,
            is_primary: true,
            created_at: now,
        });
        self.messages
            .append(ChatMessage::new(WELCOME_MESSAGE, false, now));
    }
}

//=========================================================================================
// Session (Shared Handle)
//=========================================================================================

/// A cheaply clonable handle to one session and its collaborators.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    pub scheduler: Arc<dyn Scheduler>,
    pub assistant: Arc<dyn AssistantService>,
    pub config: Arc<Config>,
    /// Cancelled when the session closes; every view scope derives from it.
    token: CancellationToken,
}

impl Session {
    pub fn new(
        config: Arc<Config>,
        scheduler: Arc<dyn Scheduler>,
        assistant: Arc<dyn AssistantService>,
    ) -> Self {
        let mut state = SessionState::default();
        if config.seed_demo_data {
            state.seed_demo(scheduler.as_ref());
        }
        info!(
            profiles = state.profiles.len(),
            messages = state.messages.len(),
            "Session created"
        );
        Self {
            state: Arc::new(Mutex::new(state)),
            scheduler,
            assistant,
            config,
            token: CancellationToken::new(),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Opens a scope for a mounted view. Closing the session tears it down too.
    pub fn scope(&self) -> ViewScope {
        ViewScope {
            token: self.token.child_token(),
        }
    }

    pub fn toaster(&self) -> Toaster {
        Toaster::new(
            self.state.clone(),
            self.scheduler.clone(),
            self.config.toast_ttl,
            self.token.clone(),
        )
    }

    /// Applies the effects of a deferred completion, unless `token` was cancelled.
    ///
    /// The cancellation check happens under the state lock, so a teardown that
    /// lands before the lock is acquired always wins.
    pub async fn commit<R>(
        &self,
        token: &CancellationToken,
        apply: impl FnOnce(&mut SessionState) -> R,
    ) -> Option<R> {
        let mut state = self.state.lock().await;
        if token.is_cancelled() {
            debug!("Discarding completion for a torn-down scope");
            return None;
        }
        Some(apply(&mut state))
    }

    /// Ends the session, cancelling every pending completion and expiry.
    pub fn close(&self) {
        info!("Session closed");
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

//=========================================================================================
// ViewScope (Lifetime of One Mounted View)
//=========================================================================================

/// Ties deferred completions to a mounted view. Dropping it tears the view down.
#[derive(Debug)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
