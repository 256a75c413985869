//! crates/lemuria_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry no behavior beyond small accessors; the stores and the
//! validator own the rules.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Enumerations
//=========================================================================================

/// The gender options offered by the profile form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub const ALL: [Gender; 4] = [
        Gender::Male,
        Gender::Female,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    /// The form value of this option, as submitted by the select control.
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer-not-to-say",
        }
    }

    /// Parses a form value. Only the four exact option values are recognized.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == value)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The astrology tradition a profile (or the user's preference) follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AstrologySystem {
    #[default]
    Western,
    Vedic,
}

impl AstrologySystem {
    /// Display label, e.g. "Western Astrology".
    pub fn label(self) -> &'static str {
        match self {
            AstrologySystem::Western => "Western Astrology",
            AstrologySystem::Vedic => "Vedic Astrology",
        }
    }
}

/// How a notification is styled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Destructive,
}

//=========================================================================================
// Entities
//=========================================================================================

/// A birth profile. Exactly one profile in a non-empty collection is primary.
///
/// An id of `Uuid::nil()` means "not yet assigned"; the store assigns one on append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub date_of_birth: String,
    pub time_of_birth: String,
    pub place_of_birth: String,
    pub astrology_system: AstrologySystem,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// The birth date as a calendar date, if the stored text is an ISO date.
    pub fn birth_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_of_birth, "%Y-%m-%d").ok()
    }

    /// The birth time, if the stored text is `HH:MM`.
    pub fn birth_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.time_of_birth, "%H:%M").ok()
    }

    /// "May 15, 1990 at 14:30", falling back to the raw text for unparseable dates.
    pub fn birth_summary(&self) -> String {
        let date = self
            .birth_date()
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| self.date_of_birth.clone());
        let time = self
            .birth_time()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| self.time_of_birth.clone());
        format!("{} at {}", date, time)
    }
}

/// One entry of the chat log. Insertion order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub content: String,
    pub is_from_user: bool,
    pub timestamp: DateTime<Utc>,
    pub is_expanded: bool,
}

impl ChatMessage {
    /// Creates an unsaved message (nil id, collapsed).
    pub fn new(content: impl Into<String>, is_from_user: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::nil(),
            content: content.into(),
            is_from_user,
            timestamp,
            is_expanded: false,
        }
    }
}

/// A transient, dismissible status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Form Draft
//=========================================================================================

/// The fields of the profile form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Gender,
    DateOfBirth,
    TimeOfBirth,
    PlaceOfBirth,
}

impl ProfileField {
    pub const ALL: [ProfileField; 5] = [
        ProfileField::Name,
        ProfileField::Gender,
        ProfileField::DateOfBirth,
        ProfileField::TimeOfBirth,
        ProfileField::PlaceOfBirth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Gender => "gender",
            ProfileField::DateOfBirth => "date_of_birth",
            ProfileField::TimeOfBirth => "time_of_birth",
            ProfileField::PlaceOfBirth => "place_of_birth",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated profile form input, alive only while a create/edit form is open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub name: String,
    pub gender: String,
    pub date_of_birth: String,
    pub time_of_birth: String,
    pub place_of_birth: String,
}

impl ProfileDraft {
    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Gender => &self.gender,
            ProfileField::DateOfBirth => &self.date_of_birth,
            ProfileField::TimeOfBirth => &self.time_of_birth,
            ProfileField::PlaceOfBirth => &self.place_of_birth,
        }
    }

    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        let slot = match field {
            ProfileField::Name => &mut self.name,
            ProfileField::Gender => &mut self.gender,
            ProfileField::DateOfBirth => &mut self.date_of_birth,
            ProfileField::TimeOfBirth => &mut self.time_of_birth,
            ProfileField::PlaceOfBirth => &mut self.place_of_birth,
        };
        *slot = value.into();
    }
}
