use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Clockwise rotation that has to be applied to a raw sensor buffer to make it upright.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Rotation> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// A raw camera frame, row-major with `channels` bytes per pixel.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub rotation: Rotation,
    pub data: Arc<[u8]>,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(width: u32, height: u32, channels: u8, rotation: Rotation, data: impl Into<Arc<[u8]>>, captured_at: DateTime<Utc>) -> Self {
        Frame {
            width,
            height,
            channels,
            rotation,
            data: data.into(),
            captured_at,
        }
    }

    /// Dimensions of the frame once the rotation is applied.
    pub fn upright_size(&self) -> (u32, u32) {
        if self.rotation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Bounding box reported by a detector, in upright pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        FaceBox { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// An upright crop of the primary face, handed to the recognizer and then dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceSample {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}
