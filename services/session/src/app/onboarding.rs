//! services/session/src/app/onboarding.rs
//!
//! First-run flow: pick an astrology system, then create your own profile.
//! Both steps resolve to the route the host should show next.

use crate::app::deferred::Deferred;
use crate::app::profiles::SubmitOutcome;
use crate::app::state::{Route, Session, ViewScope};
use lemuria_core::domain::{AstrologySystem, ProfileField};
use lemuria_core::validation::{validate, ValidationErrors};
use tracing::{debug, info};

pub struct OnboardingView {
    session: Session,
    scope: ViewScope,
}

impl OnboardingView {
    pub async fn mount(session: Session) -> Self {
        {
            let mut state = session.lock().await;
            state.onboarding.is_saving_system = false;
            state.onboarding.form.clear();
        }
        let scope = session.scope();
        Self { session, scope }
    }

    pub fn unmount(self) {
        self.scope.teardown();
    }

    pub async fn select_system(&self, system: AstrologySystem) {
        let mut state = self.session.lock().await;
        if !state.onboarding.is_saving_system {
            state.onboarding.selected_system = Some(system);
        }
    }

    /// Saves the selected system. Does nothing without a selection or while saving.
    pub async fn confirm_system(&self) -> Option<Deferred<Route>> {
        let system = {
            let mut state = self.session.lock().await;
            let onboarding = &mut state.onboarding;
            let system = onboarding.selected_system?;
            if onboarding.is_saving_system {
                return None;
            }
            onboarding.is_saving_system = true;
            system
        };

        let session = self.session.clone();
        Some(Deferred::spawn(
            self.session.scheduler.clone(),
            self.session.config.system_select_delay,
            self.scope.token(),
            move |token| async move {
                session
                    .commit(&token, move |state| {
                        state.onboarding.is_saving_system = false;
                        state.preferences.astrology_system = system;
                        info!(?system, "Astrology system chosen");
                        Route::ProfileCreation
                    })
                    .await
            },
        ))
    }

    pub async fn edit_field(&self, field: ProfileField, value: impl Into<String>) {
        self.session.lock().await.onboarding.form.edit(field, value);
    }

    /// Validates the user's own profile and schedules its creation.
    pub async fn submit_profile(&self) -> SubmitOutcome<Route> {
        let (valid, system) = {
            let mut state = self.session.lock().await;
            let system = state
                .onboarding
                .selected_system
                .unwrap_or(state.preferences.astrology_system);
            let form = &mut state.onboarding.form;
            if form.in_flight {
                debug!("Onboarding submission ignored; one is already in flight");
                return SubmitOutcome::AlreadyPending;
            }
            match validate(&form.draft) {
                Ok(valid) => {
                    form.errors = ValidationErrors::default();
                    form.in_flight = true;
                    (valid, system)
                }
                Err(errors) => {
                    form.reject(&errors);
                    return SubmitOutcome::Rejected(errors);
                }
            }
        };

        let session = self.session.clone();
        SubmitOutcome::Scheduled(Deferred::spawn(
            self.session.scheduler.clone(),
            self.session.config.onboarding_submit_delay,
            self.scope.token(),
            move |token| async move {
                let now = session.scheduler.now();
                session
                    .commit(&token, move |state| {
                        let stored = state.profiles.append(valid.into_record(system, now));
                        info!(id = %stored.id, primary = stored.is_primary, "Own profile created");
                        state.onboarding.form.clear();
                        Route::Chat
                    })
                    .await
            },
        ))
    }
}
