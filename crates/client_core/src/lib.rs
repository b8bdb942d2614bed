use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex as SyncMutex, MutexGuard, PoisonError,
    },
};

use chrono::Utc;
use migrator_shared::{
    domain::{Format, MigrationFormats, MigrationResult},
    error::MigrationError,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod presenter;
pub mod progress;
pub mod selection;
pub mod sink;
pub mod transport;

pub use presenter::{ResultPresenter, SaveRequest};
pub use progress::ProgressAnimation;
pub use selection::{FileSelection, SelectedFile, SelectionManager, SelectionOrigin};
pub use sink::{DirectorySink, DownloadSink};
pub use transport::{ConversionService, HttpConversionService, MigrationRequest, UploadOutcome};

pub const NO_FILE_NOTICE: &str = "Please select a file first";
pub const NO_RESULT_NOTICE: &str = "No migration result available";
pub const NO_MIGRATED_FILE_NOTICE: &str = "No migrated file available for download";
pub const IN_FLIGHT_NOTICE: &str = "A migration is already in progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    Submitting,
    AnimatingProgress,
    Completed,
    Failed,
}

impl ControllerPhase {
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            ControllerPhase::Submitting | ControllerPhase::AnimatingProgress
        )
    }
}

/// Derived state the UI renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerView {
    pub phase: ControllerPhase,
    pub submit_enabled: bool,
    pub progress_visible: bool,
    pub progress_percent: u8,
    pub selected_file_name: Option<String>,
    pub formats: MigrationFormats,
    pub has_result: bool,
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    SelectionChanged {
        file_name: String,
        inferred_source_format: Option<Format>,
    },
    SubmitStarted {
        file_name: String,
        formats: MigrationFormats,
    },
    Progress(u8),
    Completed(MigrationResult),
    /// Blocking user-visible message, the equivalent of an alert.
    Notification(String),
    ReportSaved(PathBuf),
    MigratedFileSaved(PathBuf),
}

struct ControllerState {
    selection: SelectionManager,
    presenter: ResultPresenter,
}

/// Fails the in-flight migration if `submit` is dropped before it settles.
struct InFlightGuard<'a> {
    controller: &'a MigrationController,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(controller: &'a MigrationController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("migration abandoned before completion");
            self.controller.set_phase(ControllerPhase::Failed);
            self.controller.progress.store(0, Ordering::SeqCst);
        }
    }
}

/// Drives one migration at a time from file selection to downloads.
pub struct MigrationController {
    service: Arc<dyn ConversionService>,
    sink: Arc<dyn DownloadSink>,
    animation: ProgressAnimation,
    inner: Mutex<ControllerState>,
    // Never held across an await, so it can be reset from `Drop`.
    phase: SyncMutex<ControllerPhase>,
    progress: AtomicU8,
    events: broadcast::Sender<ControllerEvent>,
}

impl MigrationController {
    pub fn new_with_dependencies(
        service: Arc<dyn ConversionService>,
        sink: Arc<dyn DownloadSink>,
        animation: ProgressAnimation,
        formats: MigrationFormats,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            service,
            sink,
            animation,
            inner: Mutex::new(ControllerState {
                selection: SelectionManager::new(formats),
                presenter: ResultPresenter::default(),
            }),
            phase: SyncMutex::new(ControllerPhase::Idle),
            progress: AtomicU8::new(0),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    fn phase_slot(&self) -> MutexGuard<'_, ControllerPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn phase(&self) -> ControllerPhase {
        *self.phase_slot()
    }

    fn set_phase(&self, phase: ControllerPhase) {
        *self.phase_slot() = phase;
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }

    fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "user notification");
        self.emit(ControllerEvent::Notification(message));
    }

    pub async fn select_file(&self, file: SelectedFile, origin: SelectionOrigin) -> FileSelection {
        let selection = {
            let mut state = self.inner.lock().await;
            state.selection.select_file(file, origin).clone()
        };
        self.emit(ControllerEvent::SelectionChanged {
            file_name: selection.file.name.clone(),
            inferred_source_format: selection.inferred_source_format,
        });
        selection
    }

    pub async fn set_source_format(&self, format: Format) {
        self.inner.lock().await.selection.set_source_format(format);
    }

    pub async fn set_target_format(&self, format: Format) {
        self.inner.lock().await.selection.set_target_format(format);
    }

    pub async fn formats(&self) -> MigrationFormats {
        self.inner.lock().await.selection.formats()
    }

    pub async fn last_result(&self) -> Option<MigrationResult> {
        self.inner.lock().await.presenter.last_result().cloned()
    }

    pub async fn view(&self) -> ControllerView {
        let state = self.inner.lock().await;
        let phase = self.phase();
        let in_flight = phase.is_in_flight();
        ControllerView {
            phase,
            submit_enabled: state.selection.current().is_some() && !in_flight,
            progress_visible: in_flight,
            progress_percent: if in_flight {
                self.progress.load(Ordering::SeqCst)
            } else {
                0
            },
            selected_file_name: state.selection.selected_file_name().map(str::to_string),
            formats: state.selection.formats(),
            has_result: state.presenter.last_result().is_some(),
        }
    }

    /// Uploads the current selection with the current selector values. The progress
    /// reveal starts only after the response is parsed, and the result is published
    /// only after the reveal reaches 100.
    pub async fn submit(&self) -> Result<MigrationResult, MigrationError> {
        let request = {
            let state = self.inner.lock().await;
            if self.phase().is_in_flight() {
                drop(state);
                self.notify(IN_FLIGHT_NOTICE);
                return Err(MigrationError::state("migration already in flight"));
            }
            let Some(file) = state.selection.current().map(|s| s.file.clone()) else {
                drop(state);
                self.notify(NO_FILE_NOTICE);
                return Err(MigrationError::validation("no file selected"));
            };
            let formats = state.selection.formats();
            let request = MigrationRequest {
                file,
                source_format: formats.source,
                target_format: formats.target,
            };
            self.set_phase(ControllerPhase::Submitting);
            self.progress.store(0, Ordering::SeqCst);
            request
        };
        let guard = InFlightGuard::new(self);

        self.emit(ControllerEvent::SubmitStarted {
            file_name: request.file.name.clone(),
            formats: MigrationFormats {
                source: request.source_format,
                target: request.target_format,
            },
        });
        self.emit(ControllerEvent::Progress(0));

        let outcome = self.run_migration(request).await;
        guard.disarm();
        match outcome {
            Ok(result) => Ok(result),
            Err(err) => {
                self.set_phase(ControllerPhase::Failed);
                self.progress.store(0, Ordering::SeqCst);
                self.notify(format!("Error uploading file: {err}"));
                Err(err)
            }
        }
    }

    async fn run_migration(
        &self,
        request: MigrationRequest,
    ) -> Result<MigrationResult, MigrationError> {
        let outcome = self.service.upload(request).await?;
        let status = outcome.status;
        let response = outcome.response;
        info!(
            status,
            file = %response.file,
            migrated_file = %response.migrated_file,
            "server response"
        );

        // Reject malformed bodies before the reveal starts.
        let mut result = response.into_result(status, Utc::now())?;

        self.set_phase(ControllerPhase::AnimatingProgress);
        self.animation
            .run(|value| {
                self.progress.store(value, Ordering::SeqCst);
                self.emit(ControllerEvent::Progress(value));
            })
            .await;

        result.completed_at = Utc::now();
        {
            let mut state = self.inner.lock().await;
            state.presenter.publish(result.clone());
            self.set_phase(ControllerPhase::Completed);
        }
        self.progress.store(0, Ordering::SeqCst);
        info!(file = %result.original_file_name, "migration complete");
        self.emit(ControllerEvent::Completed(result.clone()));
        Ok(result)
    }

    /// Saves a locally generated report for the last result.
    pub async fn download_report(&self) -> Result<PathBuf, MigrationError> {
        let request = self.inner.lock().await.presenter.report_request(Utc::now());
        let request = request.inspect_err(|_| self.notify(NO_RESULT_NOTICE))?;
        let path = self.save(request).await?;
        self.emit(ControllerEvent::ReportSaved(path.clone()));
        Ok(path)
    }

    /// Fetches the converted file through the retrieval endpoint and saves it.
    pub async fn download_migrated_file(&self) -> Result<PathBuf, MigrationError> {
        let request = self
            .inner
            .lock()
            .await
            .presenter
            .migrated_file_request(Utc::now(), |reference| {
                self.service.migrated_file_url(reference)
            });
        let request = request.inspect_err(|_| self.notify(NO_MIGRATED_FILE_NOTICE))?;
        let path = self.save(request).await?;
        self.emit(ControllerEvent::MigratedFileSaved(path.clone()));
        Ok(path)
    }

    async fn save(&self, request: SaveRequest) -> Result<PathBuf, MigrationError> {
        let file_name = request.file_name().to_string();
        self.sink.save(request).await.inspect_err(|err| {
            self.notify(format!("Error downloading {file_name}: {err}"));
        })
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
