//! Application Context
//!
//! The one object a front end holds: session, sync engine, and the task
//! that feeds auth events into the session. Nothing here is global; pass
//! the `QuestApp` (or its parts) to whatever needs it.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::auth::IdentityProvider;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::reminder::{Clock, NotificationScheduler, ReminderScheduler};
use crate::repository::DocumentStore;
use crate::session::SessionBinding;
use crate::sync::SyncEngine;

pub struct QuestApp {
    config: AppConfig,
    session: Arc<SessionBinding>,
    engine: Arc<SyncEngine>,
    session_task: Mutex<Option<JoinHandle<()>>>,
}

impl QuestApp {
    /// Wire everything up and start following auth events.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        config: AppConfig,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        init_logging(&config)?;

        let events = identity.auth_state_changes();
        let session = Arc::new(SessionBinding::new(identity));

        let reminders = ReminderScheduler::new(notifier, clock, config.reminder_policy());
        let engine = Arc::new(SyncEngine::new(store, reminders).with_session(session.subscribe()));
        session.attach(Arc::clone(&engine));

        let session_task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.run(events).await }
        });

        tracing::info!(app = %config.app_name, "application started");
        Ok(Self {
            config,
            session,
            engine,
            session_task: Mutex::new(Some(session_task)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionBinding> {
        &self.session
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Stop following auth events and drop all subscriptions
    pub async fn shutdown(&self) {
        let task = self
            .session_task
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
        self.engine.unbind().await;
        tracing::info!("application stopped");
    }
}

/// Install the rolling file logger when a log directory is configured
fn init_logging(config: &AppConfig) -> Result<(), AppError> {
    let Some(log_dir) = &config.log_dir else {
        return Ok(());
    };

    match rolling_logger::init_logger(log_dir, &config.app_name) {
        Ok(()) => {
            let _ = rolling_logger::info("Logger initialized");
            Ok(())
        }
        Err(rolling_logger::LoggerError::AlreadyInitialized) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
