use crate::domain::{FaceBox, FaceSample, Frame, Rotation};
use tracing::warn;

pub const DEFAULT_CROP_PADDING: f32 = 0.2;

/// The largest detected face.
pub fn primary_face(faces: &[FaceBox]) -> Option<&FaceBox> {
    faces.iter().max_by(|a, b| a.area().total_cmp(&b.area()))
}

/// Crops `face` out of `frame`, padded by `padding` of the box size on every side.
///
/// The box is clamped to the upright image and the crop is returned upright. Returns
/// `None` when the clamped box has no area.
pub fn crop_face(frame: &Frame, face: &FaceBox, padding: f32) -> Option<FaceSample> {
    if ![face.x, face.y, face.width, face.height].iter().all(|v| v.is_finite()) {
        return None;
    }

    let (upright_width, upright_height) = frame.upright_size();
    let pad_x = face.width.abs() * padding;
    let pad_y = face.height.abs() * padding;

    let left = (face.x - pad_x).floor().max(0.0);
    let top = (face.y - pad_y).floor().max(0.0);
    let right = (face.x + face.width + pad_x).ceil().min(upright_width as f32);
    let bottom = (face.y + face.height + pad_y).ceil().min(upright_height as f32);

    if right <= left || bottom <= top {
        return None;
    }

    let (left, top, right, bottom) = (left as u32, top as u32, right as u32, bottom as u32);
    let channels = frame.channels as usize;
    let expected_len = frame.width as usize * frame.height as usize * channels;
    if channels == 0 || frame.data.len() < expected_len {
        warn!(len = frame.data.len(), expected_len, "⚠️ Frame buffer does not match its dimensions, skipping crop");
        return None;
    }

    let width = right - left;
    let height = bottom - top;
    let mut data = Vec::with_capacity(width as usize * height as usize * channels);
    for upright_y in top..bottom {
        for upright_x in left..right {
            let (x, y) = raw_coordinates(frame, upright_x, upright_y);
            let offset = (y as usize * frame.width as usize + x as usize) * channels;
            data.extend_from_slice(&frame.data[offset..offset + channels]);
        }
    }

    Some(FaceSample {
        width,
        height,
        channels: frame.channels,
        data,
        captured_at: frame.captured_at,
    })
}

/// Maps an upright pixel back onto the raw sensor buffer.
fn raw_coordinates(frame: &Frame, upright_x: u32, upright_y: u32) -> (u32, u32) {
    match frame.rotation {
        Rotation::Deg0 => (upright_x, upright_y),
        Rotation::Deg90 => (upright_y, frame.height - 1 - upright_x),
        Rotation::Deg180 => (frame.width - 1 - upright_x, frame.height - 1 - upright_y),
        Rotation::Deg270 => (frame.width - 1 - upright_y, upright_x),
    }
}
