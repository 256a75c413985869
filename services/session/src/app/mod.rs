//! services/session/src/app/mod.rs
//!
//! The session layer: state shared by the views, the views themselves, and the
//! line protocol that drives them.

pub mod chat;
pub mod deferred;
pub mod driver;
pub mod onboarding;
pub mod profiles;
pub mod protocol;
pub mod settings;
pub mod state;
pub mod toaster;

pub use deferred::{Deferred, DeferredOutcome};
pub use driver::run;
pub use state::{Route, Session, SessionState, ViewScope};
