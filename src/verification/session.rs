use crate::api::AttendanceApi;
use crate::app_config::AppConfig;
use crate::domain::{AttendanceAction, EmployeeProfile, Frame, SubmissionReceipt};
use crate::face::{FaceDetector, FaceRecognizer, FaceStream, FaceValidator};
use crate::location::LocationProvider;
use crate::verification::events::VerificationEvent;
use crate::verification::store::{StateSnapshot, VerificationStore};
use crate::verification::{VerificationError, VerificationState};
use futures::Stream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{self, Sender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, instrument};

/// The external capabilities a session talks to.
#[derive(Debug, Clone)]
pub struct SessionDependencies {
    pub location: LocationProvider,
    pub recognizer: Arc<dyn FaceRecognizer>,
    pub attendance_api: Arc<dyn AttendanceApi>,
}

/// One on-site verification, from opening the attendance screen until it closes.
///
/// The session owns the store, the face stream, the face validator and any in-flight
/// location request. Closing or dropping it stops all of them.
#[derive(Debug)]
pub struct VerificationSession {
    events_tx: Sender<VerificationEvent>,
    notifier_rx: watch::Receiver<StateSnapshot>,
    location: LocationProvider,
    next_request_id: AtomicU64,
    location_task: Mutex<Option<JoinHandle<()>>>,
    stream_shutdown: Option<oneshot::Sender<()>>,
    stream_task: Option<JoinHandle<()>>,
    validator_task: Option<JoinHandle<()>>,
    store_task: Option<JoinHandle<()>>,
}

impl VerificationSession {
    /// Starts a session and requests the first location fix. Must be called within a tokio runtime.
    #[instrument(skip_all, fields(employee_id = %profile.id, action = %action))]
    pub fn start<S>(
        profile: &EmployeeProfile,
        action: AttendanceAction,
        frames: S,
        detector: Box<dyn FaceDetector>,
        dependencies: SessionDependencies,
        config: &AppConfig,
    ) -> Self
    where
        S: Stream<Item = Frame> + Send + Unpin + 'static,
    {
        info!("🔓 Opening verification session...");
        let verification = config.verification();
        let reference = profile.reference_embedding().map(Arc::<[f32]>::from);
        let state = VerificationState::new(action, profile.office.clone(), reference.is_some());

        let (events_tx, events_rx) = mpsc::channel::<VerificationEvent>(config.core().store_buffer_size());
        let store = VerificationStore::new(state, events_rx, &events_tx, dependencies.attendance_api);
        let notifier_rx = store.notifier();
        let store_task = tokio::spawn(store.listen());

        let (samples_tx, samples_rx) = watch::channel(None);
        let (stream_shutdown, shutdown_rx) = oneshot::channel();
        let stream = FaceStream::new(detector, verification.sample_interval(), verification.crop_padding(), events_tx.clone(), samples_tx);
        let stream_task = tokio::spawn(stream.run(frames, shutdown_rx));

        let validator = FaceValidator::new(dependencies.recognizer, reference, verification.match_threshold(), events_tx.clone());
        let validator_task = tokio::spawn(validator.run(samples_rx));

        let session = VerificationSession {
            events_tx,
            notifier_rx,
            location: dependencies.location,
            next_request_id: AtomicU64::new(0),
            location_task: Mutex::new(None),
            stream_shutdown: Some(stream_shutdown),
            stream_task: Some(stream_task),
            validator_task: Some(validator_task),
            store_task: Some(store_task),
        };
        session.request_location();

        info!("🔓 Opening verification session... OK");
        session
    }

    /// The latest published state.
    pub fn snapshot(&self) -> StateSnapshot {
        self.notifier_rx.borrow().clone()
    }

    pub fn can_submit(&self) -> bool {
        self.notifier_rx.borrow().can_submit()
    }

    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.notifier_rx.clone()
    }

    pub fn updates(&self) -> WatchStream<StateSnapshot> {
        WatchStream::new(self.notifier_rx.clone())
    }

    /// Abandons any running location request and starts a new one.
    pub fn retry_location(&self) {
        info!("📍 Retrying location...");
        self.request_location();
    }

    fn request_location(&self) {
        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut location_task = self.location_task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = location_task.take() {
            previous.abort();
        }

        let events_tx = self.events_tx.clone();
        let location = self.location.clone();
        *location_task = Some(tokio::spawn(async move {
            if events_tx.send(VerificationEvent::LocationRequested { request_id }).await.is_err() {
                return;
            }
            let position = location.get_current_location().await;
            let _ = events_tx.send(VerificationEvent::LocationResolved { request_id, position }).await;
        }));
    }

    /// Sends the attendance action if, and only if, the gate is open when the store handles the request.
    ///
    /// A failure leaves the accumulated verification state untouched, so the caller may retry at once.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmissionReceipt, VerificationError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.events_tx
            .send(VerificationEvent::SubmitRequested { reply: reply_tx })
            .await
            .map_err(|_| VerificationError::SessionClosed)?;

        reply_rx.await.map_err(|_| VerificationError::SessionClosed)?
    }

    /// Stops every producer, releases the detector and shuts the store down.
    #[instrument(skip_all)]
    pub async fn close(mut self) {
        info!("🔒 Closing verification session...");
        if let Some(location_task) = self.location_task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            location_task.abort();
        }

        if let Some(stream_shutdown) = self.stream_shutdown.take() {
            let _ = stream_shutdown.send(());
        }
        if let Some(stream_task) = self.stream_task.take() {
            let _ = stream_task.await;
        }

        if let Some(validator_task) = self.validator_task.take() {
            validator_task.abort();
            let _ = validator_task.await;
        }

        if let Some(store_task) = self.store_task.take() {
            store_task.abort();
            let _ = store_task.await;
        }
        info!("🔒 Closing verification session... OK");
    }
}

impl Drop for VerificationSession {
    fn drop(&mut self) {
        if let Some(location_task) = self.location_task.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            location_task.abort();
        }
        // Dropping the shutdown sender stops the stream, which then releases its detector
        if self.stream_shutdown.take().is_some() {
            debug!("🔒 Verification session dropped without close");
        }
        if let Some(validator_task) = self.validator_task.take() {
            validator_task.abort();
        }
        if let Some(store_task) = self.store_task.take() {
            store_task.abort();
        }
    }
}
