use crate::domain::{FaceSample, FaceValidationResult};
use crate::face::FaceRecognizer;
use crate::verification::VerificationEvent;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

pub type SampleReceiver = watch::Receiver<Option<Arc<FaceSample>>>;

/// Matches face samples against the enrolled reference, always working on the newest sample.
#[derive(Debug)]
pub struct FaceValidator {
    recognizer: Arc<dyn FaceRecognizer>,
    reference: Option<Arc<[f32]>>,
    threshold: f32,
    events: Sender<VerificationEvent>,
}

impl FaceValidator {
    pub fn new(recognizer: Arc<dyn FaceRecognizer>, reference: Option<Arc<[f32]>>, threshold: f32, events: Sender<VerificationEvent>) -> Self {
        FaceValidator {
            recognizer,
            reference,
            threshold,
            events,
        }
    }

    #[instrument(skip_all)]
    pub async fn run(self, mut samples: SampleReceiver) {
        let Some(reference) = self.reference.clone() else {
            info!("🧑 No enrolled face embedding, identity check bypassed");
            let _ = self.events.send(VerificationEvent::FaceValidated(FaceValidationResult::bypassed())).await;
            return;
        };

        let mut next: Option<Arc<FaceSample>> = None;
        loop {
            let sample = match next.take() {
                Some(sample) => sample,
                None => {
                    if samples.changed().await.is_err() {
                        break;
                    }
                    let Some(sample) = samples.borrow_and_update().clone() else {
                        continue;
                    };
                    sample
                }
            };

            if self.events.send(VerificationEvent::FaceValidationStarted).await.is_err() {
                break;
            }

            tokio::select! {
                biased;
                changed = samples.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!("🧑 A newer face sample preempts the running match");
                    next = samples.borrow_and_update().clone();
                }
                result = self.recognizer.similarity(&sample, &reference) => match result {
                    Ok(similarity) => {
                        let result = FaceValidationResult::scored(similarity, self.threshold);
                        debug!(similarity = result.similarity, is_match = result.is_match, "🧑 Face sample matched");
                        if self.events.send(VerificationEvent::FaceValidated(result)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("⚠️ Could not match face sample: {}", e);
                        if self.events.send(VerificationEvent::FaceValidationFailed).await.is_err() {
                            break;
                        }
                    }
                },
            }
        }
        debug!("🧑 Face validator stopped");
    }
}
