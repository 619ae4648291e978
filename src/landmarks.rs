//! Landmark allow-list.
//!
//! Only seven landmarks of the body schema leave the process: the head and the
//! three joints of each arm. `KEY_LANDMARKS` is the single source of truth for
//! which indices are forwarded and what they are called on the wire.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};

use crate::detect::Landmark;

/// Forwarded landmark indices and their wire names, ascending by index.
pub const KEY_LANDMARKS: [(u32, &str); 7] = [
    (0, "Head"),
    (11, "L.Shoulder"),
    (12, "R.Shoulder"),
    (13, "L.Elbow"),
    (14, "R.Elbow"),
    (15, "L.Wrist"),
    (16, "R.Wrist"),
];

/// Wire name of a forwarded landmark, or `None` for indices that are not
/// forwarded.
pub fn label_for(index: u32) -> Option<&'static str> {
    KEY_LANDMARKS
        .binary_search_by_key(&index, |&(key, _)| key)
        .ok()
        .map(|pos| KEY_LANDMARKS[pos].1)
}

/// A forwarded landmark: estimator coordinates plus its wire name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledLandmark {
    pub index: u32,
    pub name: Cow<'static, str>,
    #[serde(deserialize_with = "nullable_coordinate")]
    pub x: f32,
    #[serde(deserialize_with = "nullable_coordinate")]
    pub y: f32,
    #[serde(deserialize_with = "nullable_coordinate")]
    pub z: f32,
}

impl LabeledLandmark {
    fn from_landmark(landmark: &Landmark, name: &'static str) -> Self {
        Self {
            index: landmark.index,
            name: Cow::Borrowed(name),
            x: landmark.x,
            y: landmark.y,
            z: landmark.z,
        }
    }
}

/// Restrict a pose's landmarks to the allow-list and attach their names.
///
/// Coordinates are copied unchanged. The result is ordered by ascending index
/// regardless of input order; indices outside the allow-list are dropped.
pub fn filter_landmarks(landmarks: &[Landmark]) -> Vec<LabeledLandmark> {
    let mut labeled: Vec<LabeledLandmark> = landmarks
        .iter()
        .filter_map(|lm| label_for(lm.index).map(|name| LabeledLandmark::from_landmark(lm, name)))
        .collect();
    labeled.sort_by_key(|lm| lm.index);
    labeled
}

/// Non-finite coordinates serialize as JSON `null`; read them back as NaN.
fn nullable_coordinate<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
}
