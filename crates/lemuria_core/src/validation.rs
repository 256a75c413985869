//! crates/lemuria_core/src/validation.rs
//!
//! Validation of the profile form. Every field is checked independently and the
//! full set of failures is returned; deciding how many of them to show is left
//! to the presentation layer.

use crate::domain::{AstrologySystem, Gender, ProfileDraft, ProfileField, ProfileRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PLACE_LEN: usize = 2;

//=========================================================================================
// Error Types
//=========================================================================================

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationReason {
    TooShort { min: usize },
    Required,
}

/// A rejected field together with the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: ProfileField,
    pub reason: ValidationReason,
}

impl ValidationError {
    /// The message shown next to the offending field.
    pub fn message(&self) -> &'static str {
        match self.field {
            ProfileField::Name => "Name must be at least 2 characters",
            ProfileField::Gender => "Please select your gender",
            ProfileField::DateOfBirth => "Date of birth is required",
            ProfileField::TimeOfBirth => "Time of birth is required",
            ProfileField::PlaceOfBirth => "Place of birth must be at least 2 characters",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message())
    }
}

impl std::error::Error for ValidationError {}

/// At most one error per field, iterated in form display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<ProfileField, ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: ProfileField) -> Option<&ValidationError> {
        self.0.get(&field)
    }

    /// The failure of the earliest field in display order.
    pub fn first(&self) -> Option<&ValidationError> {
        self.0.values().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.values()
    }

    /// Drops the error for one field, e.g. once the user edits it again.
    pub fn clear(&mut self, field: ProfileField) -> Option<ValidationError> {
        self.0.remove(&field)
    }

    /// Keeps only the earliest failure, dropping the rest.
    pub fn only_first(&self) -> ValidationErrors {
        let mut kept = ValidationErrors::default();
        if let Some(err) = self.first() {
            kept.insert(err.clone());
        }
        kept
    }

    /// Field name to message, the shape a form renderer consumes.
    pub fn messages(&self) -> BTreeMap<ProfileField, String> {
        self.0
            .iter()
            .map(|(field, err)| (*field, err.message().to_string()))
            .collect()
    }

    fn insert(&mut self, error: ValidationError) {
        self.0.entry(error.field).or_insert(error);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

//=========================================================================================
// Validated Output
//=========================================================================================

/// A draft that passed every rule, with the gender already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub name: String,
    pub gender: Gender,
    pub date_of_birth: String,
    pub time_of_birth: String,
    pub place_of_birth: String,
}

impl ValidProfile {
    /// Builds an unsaved, non-primary record; the store assigns id and primary flag.
    pub fn into_record(self, system: AstrologySystem, created_at: DateTime<Utc>) -> ProfileRecord {
        ProfileRecord {
            id: Uuid::nil(),
            name: self.name,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            time_of_birth: self.time_of_birth,
            place_of_birth: self.place_of_birth,
            astrology_system: system,
            is_primary: false,
            created_at,
        }
    }
}

//=========================================================================================
// Rules
//=========================================================================================

/// Validates a draft. Pure; the draft is not modified.
pub fn validate(draft: &ProfileDraft) -> Result<ValidProfile, ValidationErrors> {
    let errors = check(draft);
    if !errors.is_empty() {
        return Err(errors);
    }
    match Gender::parse(&draft.gender) {
        Some(gender) => Ok(ValidProfile {
            name: draft.name.clone(),
            gender,
            date_of_birth: draft.date_of_birth.clone(),
            time_of_birth: draft.time_of_birth.clone(),
            place_of_birth: draft.place_of_birth.clone(),
        }),
        // `check` already rejects unknown genders.
        None => Err(errors),
    }
}

/// Computes the full error set for a draft; empty means valid.
pub fn check(draft: &ProfileDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    for field in ProfileField::ALL {
        if let Some(reason) = check_field(field, draft.get(field)) {
            errors.insert(ValidationError { field, reason });
        }
    }
    errors
}

/// Applies the rule of one field to its raw value.
pub fn check_field(field: ProfileField, value: &str) -> Option<ValidationReason> {
    match field {
        ProfileField::Name => min_len(value, MIN_NAME_LEN),
        ProfileField::Gender => Gender::parse(value)
            .is_none()
            .then_some(ValidationReason::Required),
        ProfileField::DateOfBirth | ProfileField::TimeOfBirth => {
            value.is_empty().then_some(ValidationReason::Required)
        }
        ProfileField::PlaceOfBirth => min_len(value, MIN_PLACE_LEN),
    }
}

fn min_len(value: &str, min: usize) -> Option<ValidationReason> {
    (value.chars().count() < min).then_some(ValidationReason::TooShort { min })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> ProfileDraft {
        ProfileDraft {
            name: "Alice".to_string(),
            gender: "female".to_string(),
            date_of_birth: "1990-01-01".to_string(),
            time_of_birth: "10:00".to_string(),
            place_of_birth: "Paris".to_string(),
        }
    }

    #[test]
    fn complete_draft_is_valid() {
        let valid = validate(&complete_draft()).expect("draft should validate");
        assert_eq!(valid.gender, Gender::Female);
        assert_eq!(valid.name, "Alice");
    }

    #[test]
    fn short_name_fails_alone() {
        let draft = ProfileDraft {
            name: "A".to_string(),
            gender: "male".to_string(),
            date_of_birth: "1990-01-01".to_string(),
            time_of_birth: "10:00".to_string(),
            place_of_birth: "NY".to_string(),
        };
        let errors = validate(&draft).unwrap_err();
        assert_eq!(errors.len(), 1);
        let err = errors.get(ProfileField::Name).unwrap();
        assert_eq!(err.reason, ValidationReason::TooShort { min: 2 });
        assert_eq!(err.message(), "Name must be at least 2 characters");
    }

    #[test]
    fn empty_draft_reports_every_field_in_order() {
        let errors = check(&ProfileDraft::default());
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ProfileField::ALL.to_vec());
        assert_eq!(errors.first().unwrap().field, ProfileField::Name);
        assert_eq!(
            errors.get(ProfileField::Gender).unwrap().reason,
            ValidationReason::Required
        );
    }

    #[test]
    fn unknown_gender_is_required() {
        let mut draft = complete_draft();
        draft.gender = "unknown".to_string();
        let errors = check(&draft);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().message(), "Please select your gender");
    }

    #[test]
    fn dates_are_only_checked_for_presence() {
        let mut draft = complete_draft();
        draft.date_of_birth = "not-a-date".to_string();
        draft.time_of_birth = "x".to_string();
        assert!(check(&draft).is_empty());

        draft.time_of_birth.clear();
        let errors = check(&draft);
        assert_eq!(errors.first().unwrap().field, ProfileField::TimeOfBirth);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut draft = complete_draft();
        draft.name = "Zoë".to_string();
        draft.place_of_birth = "é".to_string();
        let errors = check(&draft);
        assert!(errors.get(ProfileField::Name).is_none());
        assert!(errors.get(ProfileField::PlaceOfBirth).is_some());
    }

    #[test]
    fn valid_iff_each_field_passes_its_rule() {
        let values = ["", "a", "ab", "male", "1990-01-01"];
        for name in values {
            for gender in values {
                for place in values {
                    let draft = ProfileDraft {
                        name: name.to_string(),
                        gender: gender.to_string(),
                        date_of_birth: "1990-01-01".to_string(),
                        time_of_birth: "10:00".to_string(),
                        place_of_birth: place.to_string(),
                    };
                    let expected = name.chars().count() >= 2
                        && Gender::parse(gender).is_some()
                        && place.chars().count() >= 2;
                    assert_eq!(validate(&draft).is_ok(), expected, "{:?}", draft);
                }
            }
        }
    }

    #[test]
    fn clearing_a_field_removes_only_its_error() {
        let mut errors = check(&ProfileDraft::default());
        errors.clear(ProfileField::Name);
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.first().unwrap().field, ProfileField::Gender);
        assert!(errors.messages().contains_key(&ProfileField::PlaceOfBirth));
    }

    #[test]
    fn only_first_keeps_the_earliest_failure() {
        let mut draft = ProfileDraft::default();
        draft.name = "Jo".to_string();
        let kept = check(&draft).only_first();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.first().unwrap().field, ProfileField::Gender);
        assert!(ValidationErrors::default().only_first().is_empty());
    }
}
