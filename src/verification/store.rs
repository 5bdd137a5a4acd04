use crate::api::AttendanceApi;
use crate::verification::events::{SubmissionResult, VerificationEvent};
use crate::verification::{VerificationError, VerificationState};
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, Sender, WeakSender};
use tokio::sync::oneshot;
use tokio::sync::watch::{self, Receiver as WatchReceiver, Sender as WatchSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

pub type StateSnapshot = Arc<VerificationState>;

/// Single writer of a session's [`VerificationState`].
///
/// Producers send [`VerificationEvent`]s; readers observe immutable snapshots through [`VerificationStore::notifier`].
#[derive(Debug)]
pub struct VerificationStore {
    state: VerificationState,
    rx: Receiver<VerificationEvent>,
    tx: WeakSender<VerificationEvent>,
    notifier_tx: WatchSender<StateSnapshot>,
    notifier_rx: WatchReceiver<StateSnapshot>,
    attendance_api: Arc<dyn AttendanceApi>,
    pending_reply: Option<oneshot::Sender<SubmissionResult>>,
    submission: Option<JoinHandle<()>>,
}

impl VerificationStore {
    pub fn new(state: VerificationState, rx: Receiver<VerificationEvent>, tx: &Sender<VerificationEvent>, attendance_api: Arc<dyn AttendanceApi>) -> Self {
        let (notifier_tx, notifier_rx) = watch::channel::<StateSnapshot>(Arc::new(state.clone()));

        VerificationStore {
            state,
            rx,
            tx: tx.downgrade(),
            notifier_tx,
            notifier_rx,
            attendance_api,
            pending_reply: None,
            submission: None,
        }
    }

    pub fn notifier(&self) -> WatchReceiver<StateSnapshot> {
        self.notifier_rx.clone()
    }

    /// Applies events until every sender is gone.
    #[instrument(skip(self))]
    pub async fn listen(mut self) {
        while let Some(event) = self.rx.recv().await {
            trace!("🔵 Received event: {:?}", event);
            if self.reduce(event) {
                self.publish();
            }
        }
        debug!("🔵 Event queue closed, verification store stopped");
    }

    fn publish(&self) {
        self.notifier_tx.send_replace(Arc::new(self.state.clone()));
    }

    fn reduce(&mut self, event: VerificationEvent) -> bool {
        match event {
            VerificationEvent::LocationRequested { request_id } => {
                let applied = self.state.location_requested(request_id);
                if !applied {
                    debug!(request_id, "🔵 Ignoring superseded location request");
                }
                applied
            }
            VerificationEvent::LocationResolved { request_id, position } => {
                let applied = self.state.location_resolved(request_id, position);
                if !applied {
                    debug!(request_id, "🔵 Discarding stale location result");
                    return false;
                }

                let location = &self.state.location;
                match location.position {
                    Some(_) => info!(
                        request_id,
                        distance_m = location.distance_m,
                        within_radius = location.within_radius,
                        "📍 Location resolved against '{}'",
                        location.office.display_name()
                    ),
                    None => warn!(request_id, "📍 Location unavailable"),
                }
                true
            }
            VerificationEvent::FaceDetected(detected) => self.state.face_detected(detected),
            VerificationEvent::FaceSampled { captured_at } => self.state.face_sampled(captured_at),
            VerificationEvent::FaceValidationStarted => self.state.face_validation_started(),
            VerificationEvent::FaceValidationFailed => self.state.face_validation_failed(),
            VerificationEvent::FaceValidated(result) => self.state.face_validated(result),
            VerificationEvent::SubmitRequested { reply } => self.start_submission(reply),
            VerificationEvent::SubmissionFinished(result) => {
                self.state.submission_finished(&result);
                self.submission = None;
                match &result {
                    Ok(_) => info!("🟢 Attendance {} recorded", self.state.action),
                    Err(e) => warn!("⚠️ Attendance {} failed: {}", self.state.action, e),
                }
                // Callers awaiting the reply should find the outcome already published
                self.publish();
                if let Some(reply) = self.pending_reply.take() {
                    let _ = reply.send(result);
                }
                false
            }
        }
    }

    /// Re-checks the gate here, so concurrent submit requests cannot both pass.
    fn start_submission(&mut self, reply: oneshot::Sender<SubmissionResult>) -> bool {
        if let Some(reason) = self.state.blocking_reasons().into_iter().next() {
            debug!("🔵 Submission refused: {}", reason);
            let _ = reply.send(Err(reason));
            return false;
        }

        let (Some(position), Some(tx)) = (self.state.location.position, self.tx.upgrade()) else {
            let _ = reply.send(Err(VerificationError::SessionClosed));
            return false;
        };

        self.state.submission_started();
        self.pending_reply = Some(reply);

        let action = self.state.action;
        let attendance_api = self.attendance_api.clone();
        self.submission = Some(tokio::spawn(async move {
            let result = match attendance_api.submit(action, position.latitude, position.longitude).await {
                Ok(receipt) if receipt.success => Ok(receipt),
                Ok(receipt) => Err(VerificationError::SubmissionRejected(
                    receipt.message.unwrap_or_else(|| "attendance was not accepted".to_string()),
                )),
                Err(e) => Err(VerificationError::from(e)),
            };
            // A closed session discards the late result
            let _ = tx.send(VerificationEvent::SubmissionFinished(result)).await;
        }));
        true
    }
}

impl Drop for VerificationStore {
    fn drop(&mut self) {
        if let Some(submission) = self.submission.take() {
            submission.abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::domain::{AttendanceAction, AttendanceStatus, FaceValidationResult, OfficeGeofence, SubmissionReceipt};
    use crate::verification::state::tests::{OFFICE, ready_state};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::sync::Mutex;
    use std::time::Duration;
    use test_log::test;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone)]
    pub(crate) enum Reply {
        Accept,
        Refuse(&'static str),
        Reject(&'static str),
    }

    /// Attendance API that answers with scripted replies after `delay`, recording every call.
    #[derive(Debug)]
    pub(crate) struct ScriptedAttendanceApi {
        replies: Mutex<Vec<Reply>>,
        delay: Duration,
        pub calls: Mutex<Vec<(AttendanceAction, f64, f64)>>,
    }

    impl ScriptedAttendanceApi {
        pub(crate) fn new(replies: Vec<Reply>, delay: Duration) -> Self {
            ScriptedAttendanceApi {
                replies: Mutex::new(replies),
                delay,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl AttendanceApi for ScriptedAttendanceApi {
        async fn submit(&self, action: AttendanceAction, latitude: f64, longitude: f64) -> Result<SubmissionReceipt, ApiError> {
            self.calls.lock().unwrap().push((action, latitude, longitude));
            let reply = {
                let mut replies = self.replies.lock().unwrap();
                if replies.is_empty() { Reply::Accept } else { replies.remove(0) }
            };
            tokio::time::sleep(self.delay).await;

            match reply {
                Reply::Accept => Ok(SubmissionReceipt {
                    success: true,
                    timestamp: None,
                    message: Some("OK".to_string()),
                }),
                Reply::Refuse(message) => Ok(SubmissionReceipt {
                    success: false,
                    timestamp: None,
                    message: Some(message.to_string()),
                }),
                Reply::Reject(message) => Err(ApiError::Rejected {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    message: message.to_string(),
                }),
            }
        }

        async fn today(&self) -> Result<AttendanceStatus, ApiError> {
            Ok(AttendanceStatus::default())
        }
    }

    struct Harness {
        tx: mpsc::Sender<VerificationEvent>,
        notifier: WatchReceiver<StateSnapshot>,
        api: Arc<ScriptedAttendanceApi>,
        handle: JoinHandle<()>,
    }

    fn start(state: VerificationState, api: ScriptedAttendanceApi) -> Harness {
        let api = Arc::new(api);
        let (tx, rx) = mpsc::channel(16);
        let store = VerificationStore::new(state, rx, &tx, api.clone());
        let notifier = store.notifier();
        let handle = tokio::spawn(store.listen());
        Harness { tx, notifier, api, handle }
    }

    async fn submit(tx: &mpsc::Sender<VerificationEvent>) -> SubmissionResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(VerificationEvent::SubmitRequested { reply: reply_tx }).await.unwrap();
        reply_rx.await.unwrap_or(Err(VerificationError::SessionClosed))
    }

    #[test(tokio::test)]
    async fn publishes_a_snapshot_for_every_change() {
        let state = VerificationState::new(AttendanceAction::CheckIn, OfficeGeofence::new(Some(OFFICE), 100, None), false);
        let mut harness = start(state, ScriptedAttendanceApi::new(vec![], Duration::ZERO));

        harness.tx.send(VerificationEvent::LocationRequested { request_id: 1 }).await.unwrap();
        harness.tx.send(VerificationEvent::LocationResolved { request_id: 1, position: Some(OFFICE) }).await.unwrap();
        harness.tx.send(VerificationEvent::FaceDetected(true)).await.unwrap();
        harness.tx.send(VerificationEvent::FaceValidated(FaceValidationResult::bypassed())).await.unwrap();

        harness.notifier.wait_for(|snapshot| snapshot.can_submit()).await.unwrap();
        let snapshot = harness.notifier.borrow().clone();
        assert_eq!(snapshot.location.distance_m, Some(0.0));
        assert!(snapshot.face.detected);
    }

    #[test(tokio::test)]
    async fn refuses_to_submit_while_the_gate_is_closed() {
        let mut state = ready_state(true);
        state.face_detected(false);
        let harness = start(state, ScriptedAttendanceApi::new(vec![], Duration::ZERO));

        let result = submit(&harness.tx).await;

        assert_eq!(result, Err(VerificationError::FaceNotDetected));
        assert_eq!(harness.api.call_count(), 0);
    }

    #[test(tokio::test)]
    async fn submits_the_action_and_position() {
        let harness = start(ready_state(true), ScriptedAttendanceApi::new(vec![Reply::Accept], Duration::ZERO));

        let result = submit(&harness.tx).await;

        assert!(result.is_ok());
        let calls = harness.api.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(AttendanceAction::CheckIn, -6.175592, 106.827153)]);
        let snapshot = harness.notifier.borrow().clone();
        assert!(!snapshot.is_submitting);
        assert!(snapshot.receipt.is_some());
    }

    #[test(tokio::test)]
    async fn a_recorded_action_is_never_sent_twice() {
        let harness = start(ready_state(true), ScriptedAttendanceApi::new(vec![Reply::Accept, Reply::Accept], Duration::ZERO));

        assert!(submit(&harness.tx).await.is_ok());
        let second = submit(&harness.tx).await;

        assert_eq!(second, Err(VerificationError::AlreadySubmitted));
        assert_eq!(harness.api.call_count(), 1);
        assert!(!harness.notifier.borrow().can_submit());
    }

    #[test(tokio::test(start_paused = true))]
    async fn a_second_submit_is_refused_while_the_first_is_in_flight() {
        let harness = start(ready_state(false), ScriptedAttendanceApi::new(vec![Reply::Accept], Duration::from_secs(2)));

        let (first, second) = tokio::join!(submit(&harness.tx), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            submit(&harness.tx).await
        });

        assert!(first.is_ok());
        assert_eq!(second, Err(VerificationError::SubmissionInProgress));
        assert_eq!(harness.api.call_count(), 1);
    }

    #[test(tokio::test)]
    async fn unsuccessful_receipts_and_rejections_are_retryable() {
        let harness = start(
            ready_state(true),
            ScriptedAttendanceApi::new(vec![Reply::Refuse("Already checked in"), Reply::Reject("Outside radius"), Reply::Accept], Duration::ZERO),
        );

        assert_eq!(submit(&harness.tx).await, Err(VerificationError::SubmissionRejected("Already checked in".to_string())));
        assert_eq!(submit(&harness.tx).await, Err(VerificationError::SubmissionRejected("Outside radius".to_string())));
        let snapshot = harness.notifier.borrow().clone();
        assert!(snapshot.can_submit());
        assert_eq!(snapshot.submission_error, Some(VerificationError::SubmissionRejected("Outside radius".to_string())));

        assert!(submit(&harness.tx).await.is_ok());
        assert_eq!(harness.notifier.borrow().submission_error, None);
    }

    #[test(tokio::test)]
    async fn stops_once_every_sender_is_dropped() {
        let harness = start(ready_state(false), ScriptedAttendanceApi::new(vec![], Duration::ZERO));

        drop(harness.tx);

        tokio::time::timeout(Duration::from_secs(1), harness.handle).await.unwrap().unwrap();
    }
}
