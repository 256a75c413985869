pub mod domain;
pub mod notifications;
pub mod ports;
pub mod store;
pub mod validation;

pub use domain::{
    AstrologySystem, ChatMessage, Gender, Notification, ProfileDraft, ProfileField, ProfileRecord,
    Severity,
};
pub use notifications::NotificationQueue;
pub use ports::{AssistantService, CoreError, CoreResult, Scheduler};
pub use store::{ChatStore, Entity, EntityListStore, MessageFlag, ProfileStore, Toggle};
pub use validation::{validate, ValidProfile, ValidationError, ValidationErrors, ValidationReason};
