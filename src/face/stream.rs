use crate::domain::{FaceBox, FaceSample, Frame};
use crate::face::crop::{crop_face, primary_face};
use crate::face::{FaceDetector, SampleThrottle};
use crate::verification::VerificationEvent;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{oneshot, watch};
use tokio::task::{self, JoinError};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, trace, warn};

pub type SampleSender = watch::Sender<Option<Arc<FaceSample>>>;

/// Runs face detection on every camera frame and emits throttled face samples.
pub struct FaceStream {
    detector: Option<Box<dyn FaceDetector>>,
    throttle: SampleThrottle,
    padding: f32,
    events: Sender<VerificationEvent>,
    samples: SampleSender,
    face_present: bool,
}

#[derive(Error, Debug)]
enum FaceStreamError {
    #[error("face detector panicked: {0}")]
    DetectorLost(#[from] JoinError),
    #[error(transparent)]
    SessionClosed(#[from] SendError<VerificationEvent>),
}

impl FaceStream {
    pub fn new(detector: Box<dyn FaceDetector>, sample_interval: Duration, padding: f32, events: Sender<VerificationEvent>, samples: SampleSender) -> Self {
        FaceStream {
            detector: Some(detector),
            throttle: SampleThrottle::new(sample_interval),
            padding,
            events,
            samples,
            face_present: false,
        }
    }

    /// Consumes frames until `shutdown` fires (or its sender is dropped), the frame
    /// source ends or the session stops listening. Releases the detector on the way out.
    #[instrument(skip_all)]
    pub async fn run<S>(mut self, mut frames: S, mut shutdown: oneshot::Receiver<()>)
    where
        S: Stream<Item = Frame> + Send + Unpin,
    {
        info!("📷 Starting face stream...");
        loop {
            let frame = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("📷 Face stream stop requested");
                    break;
                }
                frame = frames.next() => match frame {
                    Some(frame) => frame,
                    None => {
                        warn!("📷 Camera frame source ended");
                        break;
                    }
                },
            };

            match self.process(frame).await {
                Ok(()) => {}
                Err(FaceStreamError::SessionClosed(_)) => {
                    debug!("📷 Verification session is gone, stopping face stream");
                    break;
                }
                Err(e) => {
                    error!("❌ {}", e);
                    break;
                }
            }
        }

        // Without a camera there is no face, whatever the last frame showed
        if self.face_present && self.events.send(VerificationEvent::FaceDetected(false)).await.is_ok() {
            self.face_present = false;
        }

        if let Some(mut detector) = self.detector.take() {
            detector.release();
        }
        info!("📷 Face stream stopped, detector released");
    }

    async fn process(&mut self, frame: Frame) -> Result<(), FaceStreamError> {
        let faces = self.detect(&frame).await?;
        self.events.send(VerificationEvent::FaceDetected(!faces.is_empty())).await?;
        self.face_present = !faces.is_empty();

        let now = Instant::now();
        if faces.is_empty() || !self.throttle.is_ready(now) {
            return Ok(());
        }

        let Some(sample) = primary_face(&faces).and_then(|face| crop_face(&frame, face, self.padding)) else {
            trace!("📷 Primary face crop is empty, no sample emitted");
            return Ok(());
        };

        self.throttle.mark_emitted(now);
        let captured_at = sample.captured_at;
        debug!(width = sample.width, height = sample.height, "📷 Emitting face sample");
        self.samples.send_replace(Some(Arc::new(sample)));
        self.events.send(VerificationEvent::FaceSampled { captured_at }).await?;

        Ok(())
    }

    /// Runs the detector on the blocking pool so camera delivery never waits on it.
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, FaceStreamError> {
        let Some(mut detector) = self.detector.take() else {
            return Ok(Vec::new());
        };

        let frame = frame.clone();
        let (detector, result) = task::spawn_blocking(move || {
            let result = detector.detect(&frame);
            (detector, result)
        })
        .await?;
        self.detector = Some(detector);

        Ok(result.unwrap_or_else(|e| {
            warn!("⚠️ Face detection failed: {}", e);
            Vec::new()
        }))
    }
}
