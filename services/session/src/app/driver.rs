//! services/session/src/app/driver.rs
//!
//! The control loop for a headless session. It reads one JSON command per line,
//! dispatches it to the mounted views, and answers with a snapshot line.

use crate::app::{
    chat::ChatView,
    deferred::{Deferred, DeferredOutcome},
    onboarding::OnboardingView,
    profiles::{ProfilesView, SubmitOutcome},
    protocol::{Command, Event, Snapshot},
    settings::SettingsView,
    state::{Route, Session},
    toaster::Toaster,
};
use crate::error::{SessionError, SessionResult};
use futures::StreamExt;
use std::{sync::Arc, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, error, info, warn};

type SharedWriter<W> = Arc<Mutex<W>>;

/// Runs the session until `reader` reaches end of input, then closes it.
pub async fn run<R, W>(session: Session, reader: R, writer: W) -> SessionResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = Arc::new(Mutex::new(writer));
    let host = Host {
        profiles: ProfilesView::mount(session.clone()).await,
        chat: ChatView::mount(session.clone()).await,
        settings: SettingsView::mount(session.clone()).await,
        onboarding: OnboardingView::mount(session.clone()).await,
        toaster: session.toaster(),
        session: session.clone(),
        writer: writer.clone(),
    };
    info!("Session driver started");

    let mut lines = FramedRead::new(reader, LinesCodec::new());
    while let Some(line) = lines.next().await {
        let line = line.map_err(|e| SessionError::Internal(format!("read failed: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Command>(&line) {
            Ok(command) => {
                debug!(?command, "Received command");
                if let Err(e) = host.dispatch(command).await {
                    warn!("Command failed: {}", e);
                    send_event(&writer, &Event::Error { message: e.to_string() }).await?;
                }
            }
            Err(e) => {
                warn!("Malformed command: {}", e);
                send_event(&writer, &Event::Error {
                    message: format!("Malformed command: {}", e),
                })
                .await?;
            }
        }

        let snapshot = {
            let state = session.lock().await;
            Snapshot::capture(&state, session.scheduler.now())
        };
        send_event(&writer, &Event::Snapshot(snapshot)).await?;
    }

    info!("Input closed, shutting the session down");
    host.profiles.unmount();
    host.chat.unmount();
    host.settings.unmount();
    host.onboarding.unmount();
    session.close();
    Ok(())
}

struct Host<W> {
    session: Session,
    profiles: ProfilesView,
    chat: ChatView,
    settings: SettingsView,
    onboarding: OnboardingView,
    toaster: Toaster,
    writer: SharedWriter<W>,
}

impl<W> Host<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn dispatch(&self, command: Command) -> SessionResult<()> {
        match command {
            Command::AddProfile => self.profiles.open_create().await,
            Command::EditProfile { id } => self.profiles.open_edit(id).await?,
            Command::EditDraftField { field, value } => {
                self.profiles.edit_field(field, value).await
            }
            Command::SubmitProfile => match self.profiles.submit().await {
                SubmitOutcome::Rejected(errors) => {
                    debug!("Profile rejected: {}", errors);
                }
                SubmitOutcome::AlreadyPending => {
                    debug!("Profile save already pending");
                }
                // The save completes in the background and shows up in a later snapshot.
                SubmitOutcome::Scheduled(_) => {}
            },
            Command::CancelProfile => {
                if !self.profiles.cancel().await {
                    debug!("Cancel ignored while a save is in flight");
                }
            }
            Command::DeleteProfile { id } => {
                self.profiles.delete(id).await?;
            }
            Command::DesignatePrimary { id } => self.profiles.designate_primary(id).await?,
            Command::SendMessage { content } => {
                self.chat.send(&content).await;
            }
            Command::ToggleMessage { id } => {
                self.chat.toggle_expanded(id).await;
            }
            Command::Dismiss { id } => {
                self.toaster.dismiss(id).await;
            }
            Command::SelectSystem { system } => self.settings.set_astrology_system(system).await,
            Command::SetDailyInsights { enabled } => self.settings.set_daily_insights(enabled).await,
            Command::SetPlanetaryAlerts { enabled } => {
                self.settings.set_planetary_alerts(enabled).await
            }
            Command::SignOut => {
                if let Some(pending) = self.settings.sign_out().await {
                    self.forward_route(pending);
                }
            }
            Command::ChooseSystem { system } => self.onboarding.select_system(system).await,
            Command::ConfirmSystem => match self.onboarding.confirm_system().await {
                Some(pending) => self.forward_route(pending),
                None => debug!("Nothing to confirm, or a save is in progress"),
            },
            Command::EditOnboardingField { field, value } => {
                self.onboarding.edit_field(field, value).await
            }
            Command::SubmitOnboardingProfile => match self.onboarding.submit_profile().await {
                SubmitOutcome::Rejected(errors) => debug!("Own profile rejected: {}", errors),
                SubmitOutcome::AlreadyPending => debug!("Own profile save already pending"),
                SubmitOutcome::Scheduled(pending) => self.forward_route(pending),
            },
            Command::Wait { millis } => {
                self.session
                    .scheduler
                    .sleep(Duration::from_millis(millis))
                    .await
            }
            Command::Snapshot => {}
        }
        Ok(())
    }

    /// Emits a navigate event once `pending` resolves. Cancelled work emits nothing.
    fn forward_route(&self, pending: Deferred<Route>) {
        let writer = self.writer.clone();
        tokio::spawn(async move {
            match pending.wait().await {
                Ok(DeferredOutcome::Completed(route)) => {
                    if let Err(e) = send_event(&writer, &Event::Navigate { route }).await {
                        error!("Failed to send navigate event: {}", e);
                    }
                }
                Ok(DeferredOutcome::Cancelled) => debug!("Navigation dropped; work was cancelled"),
                Err(e) => error!("Deferred navigation failed: {}", e),
            }
        });
    }
}

async fn send_event<W>(writer: &SharedWriter<W>, event: &Event) -> SessionResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(event)?;
    json.push('\n');
    let mut writer = writer.lock().await;
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
