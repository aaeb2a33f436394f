//! Application Coordinator
//!
//! Wires the camera feed, recognizer, toast notifier and navigation together
//! and manages the lifecycle of a scan session: start from the entry form,
//! run the scan loop, end and hand the results to the results screen.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::capture::{CameraFeed, CameraStatus};
use crate::config::AppConfig;
use crate::error::ScanError;
use crate::notify::Notifier;
use crate::scanner::ScanOrchestrator;
use crate::shared::{Navigator, ResultsPayload, SessionAccumulator, SessionInput};
use crate::vision::TextRecognizer;

/// Main application coordinator
pub struct ScanApp {
    config: AppConfig,
    camera: Arc<CameraFeed>,
    recognizer: Arc<dyn TextRecognizer>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ScanApp {
    pub fn new(
        config: AppConfig,
        camera: Arc<CameraFeed>,
        recognizer: Arc<dyn TextRecognizer>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            camera,
            recognizer,
            notifier,
            navigator,
        }
    }

    /// Validate the entry form and start scanning. Must be called inside a
    /// tokio runtime.
    pub fn start_session(&self, input: SessionInput) -> Result<ScanSession, ScanError> {
        let status = self.camera.status();
        if status != CameraStatus::Ready {
            return Err(ScanError::CameraUnavailable(status));
        }

        let template = input.template;
        let accumulator = SessionAccumulator::new(input)?;
        let range = accumulator.range();
        let session = Arc::new(RwLock::new(accumulator));

        let orchestrator = Arc::new(ScanOrchestrator::new(
            self.camera.clone(),
            self.recognizer.clone(),
            self.notifier.clone(),
            session.clone(),
            self.config.scan.clone(),
        ));
        orchestrator.set_layout(self.config.layout.viewport, self.config.layout.region_for(template));

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let span = info_span!("scan_session", %id, %template);
        span.in_scope(|| info!("Session started, accepting {}..={}", range.start, range.end));

        self.camera.set_active(true);
        let scan_loop = tokio::spawn(orchestrator.clone().run(cancel.clone()).instrument(span));

        Ok(ScanSession {
            id,
            orchestrator,
            session,
            cancel,
            scan_loop,
            camera: self.camera.clone(),
            navigator: self.navigator.clone(),
        })
    }
}

/// A running scan session
pub struct ScanSession {
    id: Uuid,
    orchestrator: Arc<ScanOrchestrator>,
    session: Arc<RwLock<SessionAccumulator>>,
    cancel: CancellationToken,
    scan_loop: JoinHandle<()>,
    camera: Arc<CameraFeed>,
    navigator: Arc<dyn Navigator>,
}

impl ScanSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop honoring ticks and wait for the in-flight cycle, if any, to
    /// finish its toasts and commit.
    pub async fn stop_scanning(&self) {
        self.cancel.cancel();
        self.camera.set_active(false);
        self.orchestrator.wait_idle().await;
    }

    /// Stop scanning and hand the results to the results screen.
    ///
    /// A cycle still in flight finishes on its own, but anything it would
    /// commit after this point is dropped.
    pub async fn end(self) -> ResultsPayload {
        self.cancel.cancel();
        self.camera.set_active(false);
        if let Err(e) = self.scan_loop.await {
            tracing::error!("Scan loop task failed: {}", e);
        }

        let payload = {
            let mut session = self.session.write();
            if session.accepted().is_empty() {
                warn!(session = %self.id, "Session ended without any scanned labels");
            }
            session.finish()
        };
        info!(
            session = %self.id,
            "Session ended with {} value(s)",
            payload.accepted_values.len()
        );
        self.navigator.navigate_to_results(payload.clone());
        payload
    }
}
