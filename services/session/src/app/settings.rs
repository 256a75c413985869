//! services/session/src/app/settings.rs
//!
//! Preferences and the simulated sign-out.

use crate::app::deferred::Deferred;
use crate::app::state::{Preferences, Route, Session, ViewScope};
use crate::app::toaster::Toaster;
use lemuria_core::domain::{AstrologySystem, Severity};
use tracing::{debug, info};

pub struct SettingsView {
    session: Session,
    toaster: Toaster,
    scope: ViewScope,
}

impl SettingsView {
    pub async fn mount(session: Session) -> Self {
        session.lock().await.is_signing_out = false;
        let toaster = session.toaster();
        let scope = session.scope();
        Self {
            session,
            toaster,
            scope,
        }
    }

    pub fn unmount(self) {
        self.scope.teardown();
    }

    pub async fn preferences(&self) -> Preferences {
        self.session.lock().await.preferences.clone()
    }

    pub async fn set_astrology_system(&self, system: AstrologySystem) {
        self.session.lock().await.preferences.astrology_system = system;
        info!(?system, "Preferred astrology system changed");
    }

    pub async fn set_daily_insights(&self, enabled: bool) {
        self.session.lock().await.preferences.daily_insights = enabled;
    }

    pub async fn set_planetary_alerts(&self, enabled: bool) {
        self.session.lock().await.preferences.planetary_alerts = enabled;
    }

    /// Starts the simulated sign-out. A second request while one is pending is ignored.
    pub async fn sign_out(&self) -> Option<Deferred<Route>> {
        {
            let mut state = self.session.lock().await;
            if state.is_signing_out {
                debug!("Sign-out already in progress");
                return None;
            }
            state.is_signing_out = true;
        }

        let session = self.session.clone();
        let toaster = self.toaster.clone();
        Some(Deferred::spawn(
            self.session.scheduler.clone(),
            self.session.config.sign_out_delay,
            self.scope.token(),
            move |token| async move {
                session
                    .commit(&token, move |state| {
                        toaster.push(
                            state,
                            "Signed Out",
                            Some("You have been successfully signed out of Lemuria.".to_string()),
                            Severity::Normal,
                        );
                        state.is_signing_out = false;
                        info!("Signed out");
                        Route::Landing
                    })
                    .await
            },
        ))
    }
}
