/// Number of landmarks in the 33-point body schema the estimators emit.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// One estimated anatomical point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    /// Position in the estimator's landmark schema.
    pub index: u32,
    /// Horizontal position, normalized 0..1 to frame width.
    pub x: f32,
    /// Vertical position, normalized 0..1 to frame height.
    pub y: f32,
    /// Relative depth. Only meaningful against other landmarks of the same pose.
    pub z: f32,
    /// Estimator's visibility confidence. Not forwarded.
    pub visibility: f32,
}

impl Landmark {
    pub fn new(index: u32, x: f32, y: f32, z: f32) -> Self {
        Self {
            index,
            x,
            y,
            z,
            visibility: 1.0,
        }
    }

    /// Pixel position within a frame of the given size.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        ((self.x * width as f32) as i32, (self.y * height as f32) as i32)
    }
}

/// Landmarks of one person in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    pub landmarks: Vec<Landmark>,
    /// Presence confidence of the pose as a whole.
    pub score: f32,
}

impl Pose {
    pub fn new(landmarks: Vec<Landmark>, score: f32) -> Self {
        Self { landmarks, score }
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn landmark(&self, index: u32) -> Option<&Landmark> {
        self.landmarks.iter().find(|lm| lm.index == index)
    }
}
