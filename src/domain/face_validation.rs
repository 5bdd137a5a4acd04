/// Outcome of matching one face sample against the enrolled reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceValidationResult {
    pub similarity: f32,
    pub is_match: bool,
    pub has_reference_embedding: bool,
}

impl FaceValidationResult {
    pub fn scored(similarity: f32, threshold: f32) -> Self {
        let similarity = if similarity.is_nan() { 0.0 } else { similarity.clamp(0.0, 1.0) };
        FaceValidationResult {
            similarity,
            is_match: similarity >= threshold,
            has_reference_embedding: true,
        }
    }

    /// No reference embedding is enrolled, so there is nothing to match against.
    pub fn bypassed() -> Self {
        FaceValidationResult {
            similarity: 0.0,
            is_match: false,
            has_reference_embedding: false,
        }
    }
}
