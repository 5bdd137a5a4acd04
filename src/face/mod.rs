mod crop;
mod detector;
mod recognizer;
mod stream;
mod throttle;
mod validator;

pub use crop::{DEFAULT_CROP_PADDING, crop_face, primary_face};
pub use detector::{DetectorError, FaceDetector};
pub use recognizer::{FaceRecognizer, RecognizerError};
pub use stream::{FaceStream, SampleSender};
pub use throttle::{DEFAULT_SAMPLE_INTERVAL, SampleThrottle};
pub use validator::{FaceValidator, SampleReceiver};

#[cfg(test)]
pub(crate) use stream::tests::{PixelDetector, frame as test_frame};
#[cfg(test)]
pub(crate) use validator::tests::ByteRecognizer;
