//! Scan Orchestrator
//!
//! Turns camera frames into accepted label values. A rate-limited tick
//! samples the camera feed; when no cycle is in flight it starts one, which
//! runs recognition, filters and classifies the blocks with the session's
//! template strategy, paces the toasts, and finally commits the new values.
//!
//! ```text
//!   Idle --tick, camera active, frame tall enough, flag free--> Processing
//!   Processing --last toast pause elapsed (or cycle aborted)--> Idle
//! ```
//!
//! Ticks that land while a cycle is in flight are dropped, never queued.

pub mod busy;

pub use busy::{BusyFlag, BusyGuard, FrameGeometryCell, ScanLayout};

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::analysis::{CycleContext, CycleDecision, LabelValidator, ScanStrategy, SkipReason};
use crate::capture::{CameraFeed, CapturedFrame};
use crate::config::ScanSettings;
use crate::notify::{NotificationSequencer, Notifier};
use crate::shared::state::SessionAccumulator;
use crate::vision::{FrameGeometry, GeometryMatcher, Rect, TextRecognizer};

/// A cycle that has claimed the busy flag but not yet run
#[derive(Debug)]
pub struct PendingCycle {
    frame: Arc<CapturedFrame>,
    guard: BusyGuard,
}

/// What a single tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// Camera paused; nothing sampled
    Inactive,
    /// No frame delivered yet
    NoFrame,
    /// A cycle is already in flight; tick dropped
    Busy,
    /// Frame too short to trust
    FrameTooSmall { height: u32 },
    /// Busy flag claimed; run the cycle with [`ScanOrchestrator::process`]
    Started(PendingCycle),
}

/// How a processing cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The recognizer returned nothing
    NoBlocks,
    /// The recognizer failed; cycle skipped
    RecognitionFailed,
    /// The strategy found nothing to announce
    Skipped(SkipReason),
    /// Toasts shown; `new` values were committed to the session
    Notified { new: Vec<String>, duplicates: Vec<String> },
}

pub struct ScanOrchestrator {
    camera: Arc<CameraFeed>,
    recognizer: Arc<dyn TextRecognizer>,
    notifier: Arc<dyn Notifier>,
    session: Arc<RwLock<SessionAccumulator>>,
    validator: LabelValidator,
    strategy: ScanStrategy,
    settings: ScanSettings,
    layout: RwLock<ScanLayout>,
    frame_geometry: FrameGeometryCell,
    busy: BusyFlag,
}

impl ScanOrchestrator {
    pub fn new(
        camera: Arc<CameraFeed>,
        recognizer: Arc<dyn TextRecognizer>,
        notifier: Arc<dyn Notifier>,
        session: Arc<RwLock<SessionAccumulator>>,
        settings: ScanSettings,
    ) -> Self {
        let (template, range) = {
            let session = session.read();
            (session.input().template, session.range())
        };

        Self {
            camera,
            recognizer,
            notifier,
            session,
            validator: LabelValidator::new(template, range),
            strategy: ScanStrategy::for_template(template, settings.abf_min_matches),
            settings,
            layout: RwLock::new(ScanLayout::default()),
            frame_geometry: FrameGeometryCell::default(),
            busy: BusyFlag::new(),
        }
    }

    /// Record the measured preview and scan box rectangles
    pub fn set_layout(&self, viewport: Rect, scan_region: Rect) {
        *self.layout.write() = ScanLayout {
            viewport: Some(viewport),
            scan_region: Some(scan_region),
        };
        debug!("Layout set: viewport {:?}, scan region {:?}", viewport, scan_region);
    }

    pub fn layout(&self) -> ScanLayout {
        *self.layout.read()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Wait until no cycle is in flight
    pub async fn wait_idle(&self) {
        self.busy.wait_idle().await;
    }

    /// Sample the camera once and claim the busy flag if a cycle may start
    pub fn tick(&self) -> TickOutcome {
        if !self.camera.is_active() {
            return TickOutcome::Inactive;
        }
        let Some(frame) = self.camera.latest_frame() else {
            return TickOutcome::NoFrame;
        };

        // Geometry tracks the camera even when the cycle is skipped
        let (width, height) = frame.dimensions();
        self.frame_geometry.set(FrameGeometry::new(width, height));

        if height < self.settings.min_frame_height {
            return TickOutcome::FrameTooSmall { height };
        }

        match self.busy.try_acquire() {
            Some(guard) => TickOutcome::Started(PendingCycle { frame, guard }),
            None => TickOutcome::Busy,
        }
    }

    /// Run one claimed cycle to completion. The busy flag is released when
    /// this returns, whatever the outcome.
    pub async fn process(&self, cycle: PendingCycle) -> CycleOutcome {
        let PendingCycle { frame, guard } = cycle;

        let outcome = self.run_cycle(frame).await;
        drop(guard);
        outcome
    }

    async fn run_cycle(&self, frame: Arc<CapturedFrame>) -> CycleOutcome {
        let frame_id = frame.frame_id;
        let captured_at = frame.timestamp;
        let recognizer = Arc::clone(&self.recognizer);
        let blocks = match tokio::task::spawn_blocking(move || recognizer.scan(&frame)).await {
            Ok(Ok(blocks)) => blocks,
            Ok(Err(e)) => {
                warn!("Recognition failed on frame {}: {:#}", frame_id, e);
                return CycleOutcome::RecognitionFailed;
            }
            Err(e) => {
                error!("Recognition task aborted on frame {}: {}", frame_id, e);
                return CycleOutcome::RecognitionFailed;
            }
        };

        trace!(
            "Frame {}: {} block(s), {:?} after capture",
            frame_id,
            blocks.len(),
            captured_at.elapsed()
        );
        if blocks.is_empty() {
            return CycleOutcome::NoBlocks;
        }

        let layout = self.layout();
        // Geometry recorded by the most recent tick
        let matcher = GeometryMatcher::new(layout.scan_region, layout.viewport, self.frame_geometry.get());
        let block_count = blocks.len();

        let decision = {
            let session = self.session.read();
            let ctx = CycleContext {
                validator: &self.validator,
                geometry: &matcher,
                accepted: session.accepted(),
            };
            self.strategy.handle(blocks, &ctx)
        };

        let entries = match decision {
            CycleDecision::Skip(reason) => {
                debug!("Frame {}: {} block(s), skipped ({:?})", frame_id, block_count, reason);
                return CycleOutcome::Skipped(reason);
            }
            CycleDecision::Notify(entries) => entries,
        };

        let (new, duplicates): (Vec<_>, Vec<_>) = entries.iter().partition(|e| e.is_new());
        let new: Vec<String> = new.into_iter().map(|e| e.value.clone()).collect();
        let duplicates: Vec<String> = duplicates.into_iter().map(|e| e.value.clone()).collect();

        let mut sequencer = NotificationSequencer::new(self.settings.notify_pacing());
        sequencer.notify_all(self.notifier.as_ref(), entries).await;

        let (added, total) = {
            let mut session = self.session.write();
            let added = session.commit(new.iter().cloned());
            (added, session.accepted().len())
        };
        info!(
            "Frame {}: {} new, {} duplicate, {} committed ({} total)",
            frame_id,
            new.len(),
            duplicates.len(),
            added,
            total
        );

        CycleOutcome::Notified { new, duplicates }
    }

    /// Tick until `cancel` fires. Each started cycle runs on its own task so
    /// that later ticks can observe the busy flag and be dropped.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Scan loop started ({:?} strategy)", self.strategy);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => match self.tick() {
                    TickOutcome::Started(cycle) => {
                        let this = Arc::clone(&self);
                        tokio::spawn(async move {
                            let outcome = this.process(cycle).await;
                            trace!("Cycle finished: {:?}", outcome);
                        });
                    }
                    TickOutcome::Busy => debug!("Tick dropped, cycle in flight"),
                    TickOutcome::FrameTooSmall { height } => debug!("Frame height {} below minimum", height),
                    TickOutcome::Inactive | TickOutcome::NoFrame => {}
                },
            }
        }

        info!("Scan loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TemplateType;
    use crate::notify::{Toast, ToastChannel, ToastKind};
    use crate::shared::state::SessionInput;
    use crate::vision::ocr::BoundingBox;
    use crate::vision::replay::ReplayFrame;
    use crate::vision::{ReplayRecognizer, TextBlock};
    use anyhow::anyhow;
    use crossbeam_channel::Receiver;
    use std::time::Duration;

    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn scan(&self, _frame: &CapturedFrame) -> anyhow::Result<Vec<TextBlock>> {
            Err(anyhow!("engine not loaded"))
        }
    }

    struct Harness {
        orchestrator: Arc<ScanOrchestrator>,
        camera: Arc<CameraFeed>,
        session: Arc<RwLock<SessionAccumulator>>,
        toasts: Receiver<Toast>,
    }

    impl Harness {
        fn accepted(&self) -> Vec<String> {
            self.session.read().accepted().to_vec()
        }

        fn toasts(&self) -> Vec<Toast> {
            self.toasts.try_iter().collect()
        }

        /// Deliver frame `frame_id` and run one full cycle
        async fn cycle(&self, frame_id: u64) -> CycleOutcome {
            self.camera.push_frame(CapturedFrame::new(frame_id, 400, 800));
            match self.orchestrator.tick() {
                TickOutcome::Started(cycle) => self.orchestrator.process(cycle).await,
                other => panic!("cycle did not start: {:?}", other),
            }
        }
    }

    /// Frame 400x800 shown in a 400x800 viewport: frame and display coordinates coincide.
    /// Scan region spans x 50..350, y 300..400.
    fn harness(
        template: TemplateType,
        start: &str,
        end: &str,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Harness {
        let camera = Arc::new(CameraFeed::ready());
        camera.set_active(true);
        let (notifier, toasts) = ToastChannel::new();
        let session = Arc::new(RwLock::new(
            SessionAccumulator::new(SessionInput::new(start, end, template)).unwrap(),
        ));

        let orchestrator = Arc::new(ScanOrchestrator::new(
            camera.clone(),
            recognizer,
            Arc::new(notifier),
            session.clone(),
            ScanSettings::default(),
        ));
        orchestrator.set_layout(
            Rect::new(0.0, 0.0, 400.0, 800.0),
            Rect::new(50.0, 300.0, 300.0, 100.0),
        );

        Harness {
            orchestrator,
            camera,
            session,
            toasts,
        }
    }

    fn inside(text: &str, x: f32) -> TextBlock {
        TextBlock::new(text, BoundingBox::new(x, 330.0, 40.0, 20.0))
    }

    fn per_frame(frames: Vec<Vec<TextBlock>>) -> Arc<dyn TextRecognizer> {
        let script = crate::vision::ReplayScript {
            camera: crate::capture::CameraStatus::Ready,
            frames: frames
                .into_iter()
                .map(|blocks| ReplayFrame::new(400, 800, 1000, blocks))
                .collect(),
        };
        Arc::new(ReplayRecognizer::new(&script))
    }

    #[tokio::test(start_paused = true)]
    async fn test_polyboard_new_value_accepted() {
        let h = harness(TemplateType::Polyboard, "100", "105", per_frame(vec![vec![inside("*102*", 180.0)]]));
        assert!(!h.orchestrator.is_busy());

        let outcome = h.cycle(0).await;

        assert_eq!(
            outcome,
            CycleOutcome::Notified { new: vec!["102".to_string()], duplicates: vec![] }
        );
        assert_eq!(h.accepted(), vec!["102"]);
        assert_eq!(
            h.toasts(),
            vec![Toast { kind: ToastKind::Success, message: "Scanned 102".to_string() }]
        );
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polyboard_second_cycle_is_duplicate() {
        let block = inside("*102*", 180.0);
        let h = harness(
            TemplateType::Polyboard,
            "100",
            "105",
            per_frame(vec![vec![block.clone()], vec![block]]),
        );

        h.cycle(0).await;
        let outcome = h.cycle(1).await;

        assert_eq!(
            outcome,
            CycleOutcome::Notified { new: vec![], duplicates: vec!["102".to_string()] }
        );
        assert_eq!(h.accepted(), vec!["102"]);
        let toasts = h.toasts();
        assert_eq!(toasts.len(), 2);
        assert_eq!(
            toasts[1],
            Toast { kind: ToastKind::Info, message: "102 already scanned".to_string() }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_abf_single_block_is_ignored() {
        let h = harness(TemplateType::Abf, "200", "300", per_frame(vec![vec![inside("250", 180.0)]]));

        let outcome = h.cycle(0).await;

        assert_eq!(
            outcome,
            CycleOutcome::Skipped(SkipReason::InsufficientConfidence { found: 1, required: 2 })
        );
        assert!(h.accepted().is_empty());
        assert!(h.toasts().is_empty());
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abf_two_blocks_accept_exactly_one() {
        // Region center is (200, 350); "251" sits on it, "250" is off to the left
        let h = harness(
            TemplateType::Abf,
            "200",
            "300",
            per_frame(vec![vec![inside("250", 60.0), inside("251", 180.0)]]),
        );

        let outcome = h.cycle(0).await;

        assert_eq!(
            outcome,
            CycleOutcome::Notified { new: vec!["251".to_string()], duplicates: vec![] }
        );
        assert_eq!(h.accepted(), vec!["251"]);
        assert_eq!(h.toasts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_spans_notifications() {
        let h = harness(
            TemplateType::Polyboard,
            "100",
            "105",
            per_frame(vec![vec![inside("*101*", 60.0), inside("*102*", 180.0)]]),
        );
        h.camera.push_frame(CapturedFrame::new(0, 400, 800));

        let TickOutcome::Started(cycle) = h.orchestrator.tick() else {
            panic!("cycle did not start");
        };
        let orchestrator = h.orchestrator.clone();
        let running = tokio::spawn(async move { orchestrator.process(cycle).await });

        // Mid-way through the toasts the flag is still held and ticks are dropped
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(h.orchestrator.is_busy());
        assert!(matches!(h.orchestrator.tick(), TickOutcome::Busy));
        assert!(h.accepted().is_empty());

        running.await.unwrap();
        assert!(!h.orchestrator.is_busy());
        assert_eq!(h.accepted(), vec!["101", "102"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_blocks_resets_busy() {
        let h = harness(TemplateType::Polyboard, "100", "105", per_frame(vec![vec![]]));

        assert_eq!(h.cycle(0).await, CycleOutcome::NoBlocks);
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recognizer_failure_skips_cycle() {
        let h = harness(TemplateType::Polyboard, "100", "105", Arc::new(FailingRecognizer));

        assert_eq!(h.cycle(0).await, CycleOutcome::RecognitionFailed);
        assert!(!h.orchestrator.is_busy());
        assert!(h.toasts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unset_layout_matches_nothing() {
        let camera = Arc::new(CameraFeed::ready());
        camera.set_active(true);
        let (notifier, toasts) = ToastChannel::new();
        let session = Arc::new(RwLock::new(
            SessionAccumulator::new(SessionInput::new("100", "105", TemplateType::Polyboard)).unwrap(),
        ));
        let orchestrator = ScanOrchestrator::new(
            camera.clone(),
            per_frame(vec![vec![inside("*102*", 180.0)]]),
            Arc::new(notifier),
            session.clone(),
            ScanSettings::default(),
        );
        camera.push_frame(CapturedFrame::new(0, 400, 800));

        let TickOutcome::Started(cycle) = orchestrator.tick() else {
            panic!("cycle did not start");
        };
        assert_eq!(orchestrator.process(cycle).await, CycleOutcome::Skipped(SkipReason::NoMatches));
        assert!(session.read().accepted().is_empty());
        assert_eq!(toasts.try_iter().count(), 0);
    }

    #[test]
    fn test_tick_gates() {
        let h = harness(TemplateType::Polyboard, "100", "105", per_frame(vec![]));

        assert!(matches!(h.orchestrator.tick(), TickOutcome::NoFrame));

        h.camera.push_frame(CapturedFrame::new(0, 640, 120));
        assert!(matches!(h.orchestrator.tick(), TickOutcome::FrameTooSmall { height: 120 }));
        // Geometry is tracked even when the frame is rejected
        assert_eq!(h.orchestrator.frame_geometry.get(), Some(FrameGeometry::new(640, 120)));
        assert!(!h.orchestrator.is_busy());

        h.camera.set_active(false);
        h.camera.push_frame(CapturedFrame::new(1, 400, 800));
        assert!(matches!(h.orchestrator.tick(), TickOutcome::Inactive));
    }

    #[test]
    fn test_busy_tick_still_updates_geometry() {
        let h = harness(TemplateType::Polyboard, "100", "105", per_frame(vec![]));
        h.camera.push_frame(CapturedFrame::new(0, 400, 800));
        let first = h.orchestrator.tick();
        assert!(matches!(first, TickOutcome::Started(_)));

        h.camera.push_frame(CapturedFrame::new(1, 800, 1600));
        assert!(matches!(h.orchestrator.tick(), TickOutcome::Busy));
        assert_eq!(h.orchestrator.frame_geometry.get(), Some(FrameGeometry::new(800, 1600)));

        drop(first);
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_rate_limits_and_stops() {
        let recognizer = Arc::new(ReplayRecognizer::repeating(vec![inside("*103*", 180.0)], 1));
        let h = harness(TemplateType::Polyboard, "100", "105", recognizer);
        h.camera.push_frame(CapturedFrame::new(0, 400, 800));

        let cancel = CancellationToken::new();
        let scan_loop = tokio::spawn(h.orchestrator.clone().run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(5500)).await;
        cancel.cancel();
        scan_loop.await.unwrap();

        // Same label every tick: one acceptance, the rest duplicates. Six ticks
        // fit in the window; a tick landing as a cycle finishes may be dropped.
        assert_eq!(h.accepted(), vec!["103"]);
        let toasts = h.toasts();
        assert!((3..=6).contains(&toasts.len()), "got {} toasts", toasts.len());
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert!(toasts[1..].iter().all(|t| t.kind == ToastKind::Info));
    }
}
