//! services/session/src/app/profiles.rs
//!
//! The profile management view: list, create, edit, delete and re-designate
//! the primary profile. A submission runs validate, then the simulated save,
//! then store mutation, notification and draft reset, in that order.

use crate::app::deferred::Deferred;
use crate::app::state::{Session, ViewScope};
use crate::app::toaster::Toaster;
use lemuria_core::domain::{AstrologySystem, ProfileDraft, ProfileField, ProfileRecord, Severity};
use lemuria_core::ports::{CoreError, CoreResult};
use lemuria_core::validation::{validate, ValidationErrors};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happened when the form was submitted.
#[derive(Debug)]
pub enum SubmitOutcome<T> {
    /// The draft failed validation; nothing was scheduled.
    Rejected(ValidationErrors),
    /// A previous submission is still in flight; this one was ignored.
    AlreadyPending,
    /// The save was scheduled.
    Scheduled(Deferred<T>),
}

impl<T> SubmitOutcome<T> {
    pub fn into_deferred(self) -> Option<Deferred<T>> {
        match self {
            SubmitOutcome::Scheduled(deferred) => Some(deferred),
            _ => None,
        }
    }
}

pub struct ProfilesView {
    session: Session,
    toaster: Toaster,
    scope: ViewScope,
}

impl ProfilesView {
    /// Mounts the view. Any form state left behind by a torn-down view is discarded.
    pub async fn mount(session: Session) -> Self {
        {
            let mut state = session.lock().await;
            state.profile_form.clear();
            state.profile_form.is_open = false;
        }
        let toaster = session.toaster();
        let scope = session.scope();
        Self {
            session,
            toaster,
            scope,
        }
    }

    /// Tears the view down; pending saves are cancelled.
    pub fn unmount(self) {
        self.scope.teardown();
    }

    pub async fn profiles(&self) -> Vec<ProfileRecord> {
        self.session.lock().await.profiles.list()
    }

    /// Opens an empty creation form.
    pub async fn open_create(&self) {
        let mut state = self.session.lock().await;
        if state.profile_form.in_flight {
            return;
        }
        state.profile_form.clear();
        state.profile_form.is_open = true;
    }

    /// Opens the form pre-filled with an existing profile.
    pub async fn open_edit(&self, id: Uuid) -> CoreResult<()> {
        let mut state = self.session.lock().await;
        if state.profile_form.in_flight {
            return Ok(());
        }
        let profile = state
            .profiles
            .get(id)
            .ok_or(CoreError::NotFound { kind: "profile", id })?;
        let draft = ProfileDraft {
            name: profile.name.clone(),
            gender: profile.gender.as_str().to_string(),
            date_of_birth: profile.date_of_birth.clone(),
            time_of_birth: profile.time_of_birth.clone(),
            place_of_birth: profile.place_of_birth.clone(),
        };
        let form = &mut state.profile_form;
        form.clear();
        form.draft = draft;
        form.editing = Some(id);
        form.is_open = true;
        Ok(())
    }

    /// Closes the form and discards the draft. Ignored while a save is in flight.
    pub async fn cancel(&self) -> bool {
        let mut state = self.session.lock().await;
        if state.profile_form.in_flight {
            return false;
        }
        state.profile_form.clear();
        state.profile_form.is_open = false;
        true
    }

    pub async fn edit_field(&self, field: ProfileField, value: impl Into<String>) {
        self.session.lock().await.profile_form.edit(field, value);
    }

    /// Validates the draft and, if valid, schedules the simulated save.
    pub async fn submit(&self) -> SubmitOutcome<CoreResult<ProfileRecord>> {
        let (valid, editing) = {
            let mut state = self.session.lock().await;
            let form = &mut state.profile_form;
            if form.in_flight {
                debug!("Profile submission ignored; one is already in flight");
                return SubmitOutcome::AlreadyPending;
            }
            match validate(&form.draft) {
                Ok(valid) => {
                    form.errors = ValidationErrors::default();
                    form.in_flight = true;
                    (valid, form.editing)
                }
                Err(errors) => {
                    info!(failures = errors.len(), "Profile draft rejected");
                    form.reject(&errors);
                    return SubmitOutcome::Rejected(errors);
                }
            }
        };

        let session = self.session.clone();
        let toaster = self.toaster.clone();
        let deferred = Deferred::spawn(
            self.session.scheduler.clone(),
            self.session.config.profile_submit_delay,
            self.scope.token(),
            move |token| async move {
                let now = session.scheduler.now();
                session
                    .commit(&token, move |state| {
                        let result = match editing {
                            None => {
                                let record = valid.into_record(AstrologySystem::Western, now);
                                let stored = state.profiles.append(record).clone();
                                info!(id = %stored.id, primary = stored.is_primary, "Profile created");
                                toaster.push(
                                    state,
                                    "Profile Created!",
                                    Some(format!(
                                        "{}'s profile has been added successfully.",
                                        stored.name
                                    )),
                                    Severity::Normal,
                                );
                                Ok(stored)
                            }
                            Some(id) => match state.profiles.apply_edit(id, valid) {
                                Ok(updated) => {
                                    let updated = updated.clone();
                                    info!(%id, "Profile updated");
                                    toaster.push(
                                        state,
                                        "Profile Updated",
                                        Some(format!("{}'s profile has been updated.", updated.name)),
                                        Severity::Normal,
                                    );
                                    Ok(updated)
                                }
                                Err(err) => {
                                    warn!(%id, "Edited profile disappeared before saving");
                                    toaster.push(
                                        state,
                                        "Update Failed",
                                        Some("This profile no longer exists.".to_string()),
                                        Severity::Destructive,
                                    );
                                    Err(err)
                                }
                            },
                        };
                        state.profile_form.clear();
                        state.profile_form.is_open = false;
                        result
                    })
                    .await
            },
        );
        SubmitOutcome::Scheduled(deferred)
    }

    /// Deletes a profile. The primary profile is refused with a destructive notification.
    pub async fn delete(&self, id: Uuid) -> CoreResult<ProfileRecord> {
        let mut state = self.session.lock().await;
        match state.profiles.remove(id) {
            Ok(removed) => {
                info!(%id, "Profile deleted");
                self.toaster.push(
                    &mut state,
                    "Profile Deleted",
                    Some("The profile has been removed successfully.".to_string()),
                    Severity::Normal,
                );
                Ok(removed)
            }
            Err(err @ CoreError::ProtectedEntity { .. }) => {
                warn!(%id, "Refused to delete the primary profile");
                self.toaster.push(
                    &mut state,
                    "Cannot Delete",
                    Some("You cannot delete your main profile.".to_string()),
                    Severity::Destructive,
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn designate_primary(&self, id: Uuid) -> CoreResult<()> {
        self.session.lock().await.profiles.designate_primary(id)?;
        info!(%id, "Primary profile changed");
        Ok(())
    }
}
