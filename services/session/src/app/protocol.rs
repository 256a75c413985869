//! services/session/src/app/protocol.rs
//!
//! Defines the JSON-lines protocol between an external view layer and a session.
//! Every line is one serde-tagged object.

use crate::app::chat::{date_label, needs_date_separator, preview, MessagePreview};
use crate::app::state::{OnboardingState, Preferences, ProfileForm, Route, SessionState};
use chrono::{DateTime, Utc};
use lemuria_core::domain::{
    AstrologySystem, ChatMessage, Notification, ProfileDraft, ProfileField, ProfileRecord,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Commands Sent FROM the View Layer TO the Session
//=========================================================================================

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Opens an empty profile form.
    AddProfile,
    /// Opens the profile form pre-filled from an existing profile.
    EditProfile { id: Uuid },
    EditDraftField { field: ProfileField, value: String },
    SubmitProfile,
    CancelProfile,
    DeleteProfile { id: Uuid },
    DesignatePrimary { id: Uuid },
    SendMessage { content: String },
    ToggleMessage { id: Uuid },
    Dismiss { id: Uuid },
    /// Changes the preferred astrology system in settings.
    SelectSystem { system: AstrologySystem },
    SetDailyInsights { enabled: bool },
    SetPlanetaryAlerts { enabled: bool },
    SignOut,
    /// Picks the astrology system on the onboarding screen.
    ChooseSystem { system: AstrologySystem },
    ConfirmSystem,
    EditOnboardingField { field: ProfileField, value: String },
    SubmitOnboardingProfile,
    /// Lets `millis` of scheduler time pass before the next command.
    Wait { millis: u64 },
    Snapshot,
}

//=========================================================================================
// Events Sent FROM the Session TO the View Layer
//=========================================================================================

#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The full renderable state, sent after every command.
    Snapshot(Snapshot),
    /// A deferred operation finished and the host should show `route`.
    Navigate { route: Route },
    /// A command failed or could not be parsed. The session stays usable.
    Error { message: String },
}

#[derive(Serialize, Debug, Clone)]
pub struct Snapshot {
    pub profiles: Vec<RenderedProfile>,
    pub messages: Vec<RenderedMessage>,
    pub notifications: Vec<Notification>,
    pub form: FormSnapshot,
    pub onboarding: OnboardingSnapshot,
    pub preferences: Preferences,
    pub awaiting_reply: bool,
    pub is_signing_out: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct RenderedProfile {
    #[serde(flatten)]
    pub profile: ProfileRecord,
    /// e.g. "May 15, 1990 at 14:30".
    pub birth_summary: String,
}

impl From<&ProfileRecord> for RenderedProfile {
    fn from(profile: &ProfileRecord) -> Self {
        Self {
            birth_summary: profile.birth_summary(),
            profile: profile.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RenderedMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub preview: MessagePreview,
    /// Label of the date separator drawn above this message, if any.
    pub date_separator: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: ProfileField,
    pub message: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct FormSnapshot {
    pub is_open: bool,
    pub in_flight: bool,
    pub editing: Option<Uuid>,
    pub draft: ProfileDraft,
    /// Only the first failing field is shown, even when several failed.
    pub error: Option<FieldError>,
}

impl From<&ProfileForm> for FormSnapshot {
    fn from(form: &ProfileForm) -> Self {
        Self {
            is_open: form.is_open,
            in_flight: form.in_flight,
            editing: form.editing,
            draft: form.draft.clone(),
            error: form.visible_error().map(|err| FieldError {
                field: err.field,
                message: err.message().to_string(),
            }),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct OnboardingSnapshot {
    pub selected_system: Option<AstrologySystem>,
    pub is_saving_system: bool,
    pub form: FormSnapshot,
}

impl From<&OnboardingState> for OnboardingSnapshot {
    fn from(onboarding: &OnboardingState) -> Self {
        Self {
            selected_system: onboarding.selected_system,
            is_saving_system: onboarding.is_saving_system,
            form: FormSnapshot::from(&onboarding.form),
        }
    }
}

impl Snapshot {
    pub fn capture(state: &SessionState, now: DateTime<Utc>) -> Self {
        let mut previous: Option<&ChatMessage> = None;
        let messages = state
            .messages
            .iter()
            .map(|message| {
                let date_separator = needs_date_separator(message, previous)
                    .then(|| date_label(message.timestamp, now));
                previous = Some(message);
                RenderedMessage {
                    message: message.clone(),
                    preview: preview(message),
                    date_separator,
                }
            })
            .collect();

        Self {
            profiles: state.profiles.iter().map(RenderedProfile::from).collect(),
            messages,
            notifications: state.notifications.list(),
            form: FormSnapshot::from(&state.profile_form),
            onboarding: OnboardingSnapshot::from(&state.onboarding),
            preferences: state.preferences.clone(),
            awaiting_reply: state.awaiting_reply,
            is_signing_out: state.is_signing_out,
        }
    }
}
