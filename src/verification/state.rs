use crate::domain::{AttendanceAction, FaceValidationResult, GeoPosition, OfficeGeofence, SubmissionReceipt};
use crate::geofence;
use crate::verification::VerificationError;
use crate::verification::events::SubmissionResult;
use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationPhase {
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceMatchStatus {
    Idle,
    Validating,
    Matched,
    Mismatched,
    Bypassed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocationState {
    pub loading: bool,
    pub position: Option<GeoPosition>,
    pub office: OfficeGeofence,
    pub distance_m: Option<f64>,
    pub within_radius: bool,
    pub error: Option<VerificationError>,
    request_id: u64,
}

impl LocationState {
    fn new(office: OfficeGeofence) -> Self {
        LocationState {
            loading: false,
            position: None,
            office,
            distance_m: None,
            within_radius: false,
            error: None,
            request_id: 0,
        }
    }

    pub fn phase(&self) -> LocationPhase {
        match (self.loading, &self.position, &self.error) {
            (true, _, _) => LocationPhase::Loading,
            (false, _, Some(_)) => LocationPhase::Error,
            (false, Some(_), None) => LocationPhase::Ready,
            (false, None, None) => LocationPhase::Idle,
        }
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceDetectionState {
    pub detected: bool,
    pub last_sample_at: Option<DateTime<Utc>>,
}

/// Everything known about one verification session. Only the store mutates it.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationState {
    pub action: AttendanceAction,
    pub location: LocationState,
    pub face: FaceDetectionState,
    pub has_reference_embedding: bool,
    pub validating: bool,
    pub validation: Option<FaceValidationResult>,
    pub is_submitting: bool,
    pub receipt: Option<SubmissionReceipt>,
    pub submission_error: Option<VerificationError>,
}

impl VerificationState {
    pub fn new(action: AttendanceAction, office: OfficeGeofence, has_reference_embedding: bool) -> Self {
        VerificationState {
            action,
            location: LocationState::new(office),
            face: FaceDetectionState::default(),
            has_reference_embedding,
            validating: false,
            validation: None,
            is_submitting: false,
            receipt: None,
            submission_error: None,
        }
    }

    /// Whether the attendance action may be sent right now.
    pub fn can_submit(&self) -> bool {
        self.blocking_reasons().is_empty()
    }

    /// Why the submission gate is closed, in display order. Empty when it is open.
    pub fn blocking_reasons(&self) -> Vec<VerificationError> {
        let mut reasons = Vec::new();

        if !self.face.detected {
            reasons.push(VerificationError::FaceNotDetected);
        }

        if self.has_reference_embedding {
            match &self.validation {
                Some(validation) if validation.is_match => {}
                Some(validation) if validation.has_reference_embedding => reasons.push(VerificationError::FaceMismatch {
                    similarity: validation.similarity,
                }),
                _ => reasons.push(VerificationError::FaceNotValidated),
            }
        }

        if let Some(reason) = self.location_blocking_reason() {
            reasons.push(reason);
        }

        if self.is_submitting {
            reasons.push(VerificationError::SubmissionInProgress);
        }

        if self.receipt.is_some() {
            reasons.push(VerificationError::AlreadySubmitted);
        }

        reasons
    }

    fn location_blocking_reason(&self) -> Option<VerificationError> {
        let location = &self.location;
        if location.loading {
            return Some(VerificationError::LocationPending);
        }
        if let Some(error) = &location.error {
            return Some(error.clone());
        }
        if location.position.is_none() {
            return Some(VerificationError::LocationPending);
        }
        if location.office.center.is_none() {
            return Some(VerificationError::GeofenceUnknown);
        }
        if !location.within_radius {
            return Some(VerificationError::OutsideGeofence {
                distance_m: location.distance_m.unwrap_or_default(),
                radius_m: location.office.radius_m,
            });
        }
        None
    }

    pub fn face_match_status(&self) -> FaceMatchStatus {
        if !self.has_reference_embedding {
            return FaceMatchStatus::Bypassed;
        }
        if self.validating {
            return FaceMatchStatus::Validating;
        }
        match &self.validation {
            None => FaceMatchStatus::Idle,
            Some(validation) if validation.is_match => FaceMatchStatus::Matched,
            Some(_) => FaceMatchStatus::Mismatched,
        }
    }

    /// Starts tracking a location request. Requests older than the current one are ignored.
    pub(crate) fn location_requested(&mut self, request_id: u64) -> bool {
        if request_id <= self.location.request_id {
            return false;
        }

        let location = &mut self.location;
        location.request_id = request_id;
        location.loading = true;
        location.position = None;
        location.distance_m = None;
        location.within_radius = false;
        location.error = None;
        true
    }

    /// Applies a location result. Results for any request but the current one are discarded.
    pub(crate) fn location_resolved(&mut self, request_id: u64, position: Option<GeoPosition>) -> bool {
        if request_id != self.location.request_id || !self.location.loading {
            return false;
        }

        let location = &mut self.location;
        location.loading = false;
        match position {
            Some(position) => {
                let evaluation = geofence::evaluate(&position, &location.office);
                location.position = Some(position);
                location.distance_m = evaluation.distance_m;
                location.within_radius = evaluation.within_radius;
                location.error = None;
            }
            None => {
                location.position = None;
                location.distance_m = None;
                location.within_radius = false;
                location.error = Some(VerificationError::LocationUnavailable);
            }
        }
        true
    }

    /// A face that reappears has to be matched again before the gate reopens.
    pub(crate) fn face_detected(&mut self, detected: bool) -> bool {
        let changed = self.face.detected != detected;
        self.face.detected = detected;
        if changed && detected && self.has_reference_embedding {
            self.validation = None;
        }
        changed
    }

    pub(crate) fn face_sampled(&mut self, captured_at: DateTime<Utc>) -> bool {
        self.face.last_sample_at = Some(captured_at);
        true
    }

    pub(crate) fn face_validation_started(&mut self) -> bool {
        let changed = !self.validating;
        self.validating = true;
        changed
    }

    /// The recognizer gave no verdict; the previous result stands.
    pub(crate) fn face_validation_failed(&mut self) -> bool {
        let changed = self.validating;
        self.validating = false;
        changed
    }

    pub(crate) fn face_validated(&mut self, result: FaceValidationResult) -> bool {
        self.validating = false;
        if !result.has_reference_embedding {
            self.has_reference_embedding = false;
        }
        self.validation = Some(result);
        true
    }

    pub(crate) fn submission_started(&mut self) {
        self.is_submitting = true;
        self.submission_error = None;
    }

    /// Records the outcome. Location and face state are kept so a failed submission can be retried.
    pub(crate) fn submission_finished(&mut self, result: &SubmissionResult) {
        self.is_submitting = false;
        match result {
            Ok(receipt) => {
                self.receipt = Some(receipt.clone());
                self.submission_error = None;
            }
            Err(error) => self.submission_error = Some(error.clone()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    pub(crate) const OFFICE: GeoPosition = GeoPosition {
        latitude: -6.175392,
        longitude: 106.827153,
    };
    const NEARBY: GeoPosition = GeoPosition {
        latitude: -6.175592,
        longitude: 106.827153,
    };
    const FAR_AWAY: GeoPosition = GeoPosition {
        latitude: -6.185392,
        longitude: 106.827153,
    };

    fn office() -> OfficeGeofence {
        OfficeGeofence::new(Some(OFFICE), 100, Some("Head Office".to_string()))
    }

    /// A state in which every condition of the gate holds.
    pub(crate) fn ready_state(has_reference_embedding: bool) -> VerificationState {
        let mut state = VerificationState::new(AttendanceAction::CheckIn, office(), has_reference_embedding);
        state.location_requested(1);
        state.location_resolved(1, Some(NEARBY));
        state.face_detected(true);
        if has_reference_embedding {
            state.face_validated(FaceValidationResult::scored(0.93, 0.8));
        }
        state
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn gate_opens_when_every_condition_holds(#[case] has_reference_embedding: bool) {
        let state = ready_state(has_reference_embedding);

        assert!(state.blocking_reasons().is_empty());
        assert!(state.can_submit());
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn gate_is_closed_while_submitting(#[case] has_reference_embedding: bool) {
        let mut state = ready_state(has_reference_embedding);

        state.submission_started();

        assert!(!state.can_submit());
        assert_eq!(state.blocking_reasons(), vec![VerificationError::SubmissionInProgress]);
    }

    #[test]
    fn gate_is_closed_without_a_face_even_with_a_valid_location() {
        let mut state = ready_state(false);

        state.face_detected(false);

        assert_eq!(state.location.phase(), LocationPhase::Ready);
        assert!(state.location.within_radius);
        assert!(!state.can_submit());
        assert_eq!(state.blocking_reasons(), vec![VerificationError::FaceNotDetected]);
    }

    #[test]
    fn a_low_similarity_blocks_with_a_mismatch() {
        let mut state = ready_state(true);

        state.face_validated(FaceValidationResult::scored(0.42, 0.8));

        assert_eq!(state.face_match_status(), FaceMatchStatus::Mismatched);
        assert_eq!(state.blocking_reasons(), vec![VerificationError::FaceMismatch { similarity: 0.42 }]);
    }

    #[test]
    fn an_enrolled_face_must_be_validated_first() {
        let mut state = VerificationState::new(AttendanceAction::CheckIn, office(), true);
        state.location_requested(1);
        state.location_resolved(1, Some(NEARBY));
        state.face_detected(true);

        assert_eq!(state.face_match_status(), FaceMatchStatus::Idle);
        assert_eq!(state.blocking_reasons(), vec![VerificationError::FaceNotValidated]);

        state.face_validation_started();
        assert_eq!(state.face_match_status(), FaceMatchStatus::Validating);
    }

    #[test]
    fn a_bypass_result_lifts_the_identity_requirement() {
        let mut state = VerificationState::new(AttendanceAction::CheckIn, office(), true);
        state.location_requested(1);
        state.location_resolved(1, Some(NEARBY));
        state.face_detected(true);

        state.face_validated(FaceValidationResult::bypassed());

        assert_eq!(state.face_match_status(), FaceMatchStatus::Bypassed);
        assert!(state.can_submit());
    }

    #[test]
    fn a_position_outside_the_radius_blocks() {
        let mut state = ready_state(false);

        state.location_requested(2);
        state.location_resolved(2, Some(FAR_AWAY));

        assert!(!state.location.within_radius);
        assert!(matches!(
            state.blocking_reasons().as_slice(),
            [VerificationError::OutsideGeofence { radius_m: 100, .. }]
        ));
    }

    #[test]
    fn an_unknown_office_is_within_radius_but_still_blocks() {
        let mut state = VerificationState::new(AttendanceAction::CheckIn, OfficeGeofence::default(), false);
        state.face_detected(true);
        state.location_requested(1);
        state.location_resolved(1, Some(NEARBY));

        assert!(state.location.within_radius);
        assert_eq!(state.location.distance_m, None);
        assert_eq!(state.blocking_reasons(), vec![VerificationError::GeofenceUnknown]);
    }

    #[test]
    fn a_failed_fetch_records_location_unavailable() {
        let mut state = ready_state(false);

        state.location_requested(2);
        assert_eq!(state.location.phase(), LocationPhase::Loading);
        assert_eq!(state.blocking_reasons(), vec![VerificationError::LocationPending]);

        state.location_resolved(2, None);
        assert_eq!(state.location.phase(), LocationPhase::Error);
        assert_eq!(state.blocking_reasons(), vec![VerificationError::LocationUnavailable]);
    }

    #[test]
    fn stale_location_results_are_discarded() {
        let mut state = VerificationState::new(AttendanceAction::CheckIn, office(), false);
        state.location_requested(1);
        state.location_requested(2);

        assert!(!state.location_resolved(1, Some(NEARBY)));
        assert!(!state.location_requested(1));
        assert_eq!(state.location.phase(), LocationPhase::Loading);
        assert_eq!(state.location.request_id(), 2);

        assert!(state.location_resolved(2, Some(NEARBY)));
        assert_eq!(state.location.phase(), LocationPhase::Ready);
        assert!(!state.location_resolved(2, Some(FAR_AWAY)));
    }

    #[test]
    fn a_failed_submission_keeps_the_accumulated_state() {
        let mut state = ready_state(true);
        state.submission_started();

        state.submission_finished(&Err(VerificationError::SubmissionNetworkError("timeout".to_string())));

        assert!(state.can_submit());
        assert_eq!(state.location.position, Some(NEARBY));
        assert!(state.validation.is_some_and(|v| v.is_match));
        assert_eq!(state.submission_error, Some(VerificationError::SubmissionNetworkError("timeout".to_string())));
    }

    #[test]
    fn a_recorded_check_in_closes_the_gate_for_good() {
        let mut state = ready_state(true);
        state.submission_started();

        state.submission_finished(&Ok(SubmissionReceipt {
            success: true,
            timestamp: None,
            message: None,
        }));

        assert!(!state.can_submit());
        assert_eq!(state.blocking_reasons(), vec![VerificationError::AlreadySubmitted]);
    }

    #[test]
    fn a_reappearing_face_must_be_matched_again() {
        let mut state = ready_state(true);

        state.face_detected(false);
        state.face_detected(true);

        assert_eq!(state.validation, None);
        assert_eq!(state.face_match_status(), FaceMatchStatus::Idle);
        assert_eq!(state.blocking_reasons(), vec![VerificationError::FaceNotValidated]);
    }

    #[test]
    fn a_reappearing_face_keeps_the_bypass() {
        let mut state = ready_state(false);
        state.face_validated(FaceValidationResult::bypassed());

        state.face_detected(false);
        state.face_detected(true);

        assert_eq!(state.face_match_status(), FaceMatchStatus::Bypassed);
        assert!(state.can_submit());
    }

    #[test]
    fn a_failed_match_stops_validating_and_keeps_the_previous_verdict() {
        let mut state = ready_state(true);
        state.face_validation_started();

        assert!(state.face_validation_failed());

        assert_eq!(state.face_match_status(), FaceMatchStatus::Matched);
        assert!(!state.face_validation_failed());
    }

    #[test]
    fn repeated_detection_values_do_not_count_as_changes() {
        let mut state = VerificationState::new(AttendanceAction::CheckOut, office(), false);

        assert!(state.face_detected(true));
        assert!(!state.face_detected(true));
        assert!(state.face_detected(false));
    }
}
