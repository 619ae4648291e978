//! Pose envelope: the JSON record sent once per frame.
//!
//! Wire format:
//!
//! ```text
//! {"pose": [{"index": 0, "name": "Head", "x": 0.5, "y": 0.2, "z": -0.3}, ...]}
//! ```
//!
//! Entries are ordered by ascending index and there are at most seven of them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::detect::Pose;
use crate::landmarks::{filter_landmarks, LabeledLandmark, KEY_LANDMARKS};

/// The per-frame record forwarded to the listener.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseEnvelope {
    pub pose: Vec<LabeledLandmark>,
}

impl PoseEnvelope {
    /// Wrap an already filtered landmark list.
    pub fn new(pose: Vec<LabeledLandmark>) -> Self {
        Self { pose }
    }

    /// Filter a detected pose and wrap the result.
    pub fn from_pose(pose: &Pose) -> Self {
        Self::new(filter_landmarks(&pose.landmarks))
    }

    /// UTF-8 JSON payload for one datagram.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("serialize pose envelope")
    }

    /// Decode a datagram payload.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("decode pose envelope")
    }

    pub fn len(&self) -> usize {
        self.pose.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pose.is_empty()
    }

    /// Coordinates of the landmark with the given wire name.
    pub fn position_of(&self, name: &str) -> Option<[f32; 3]> {
        self.pose
            .iter()
            .find(|lm| lm.name == name)
            .map(|lm| [lm.x, lm.y, lm.z])
    }

    /// True when every allow-listed landmark is present. Listeners that drive
    /// an avatar need the full set before applying a pose.
    pub fn is_complete(&self) -> bool {
        KEY_LANDMARKS
            .iter()
            .all(|(_, name)| self.position_of(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Landmark;

    fn full_pose() -> Pose {
        let landmarks = (0..33)
            .map(|i| Landmark::new(i, 0.01 * i as f32, 0.02 * i as f32, -0.003 * i as f32))
            .collect();
        Pose::new(landmarks, 0.9)
    }

    #[test]
    fn envelope_has_single_pose_key() -> Result<()> {
        let envelope = PoseEnvelope::from_pose(&full_pose());
        let value: serde_json::Value = serde_json::from_slice(&envelope.to_json_bytes()?)?;
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        let entries = object["pose"].as_array().unwrap();
        assert_eq!(entries.len(), 7);
        let first = entries[0].as_object().unwrap();
        let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["index", "name", "x", "y", "z"]);
        assert_eq!(first["name"], "Head");
        Ok(())
    }

    #[test]
    fn decoded_payload_matches_filtered_input() -> Result<()> {
        let pose = full_pose();
        let filtered = filter_landmarks(&pose.landmarks);
        let envelope = PoseEnvelope::new(filtered.clone());

        let decoded = PoseEnvelope::from_json_bytes(&envelope.to_json_bytes()?)?;
        assert_eq!(decoded.pose, filtered);
        assert!(decoded.is_complete());
        Ok(())
    }

    #[test]
    fn empty_envelope_serializes_empty_array() -> Result<()> {
        let envelope = PoseEnvelope::default();
        assert_eq!(envelope.to_json_bytes()?, br#"{"pose":[]}"#.to_vec());
        assert!(!envelope.is_complete());
        Ok(())
    }

    #[test]
    fn non_finite_coordinates_travel_as_null() -> Result<()> {
        let pose = Pose::new(vec![Landmark::new(0, f32::NAN, 0.5, f32::INFINITY)], 0.9);
        let bytes = PoseEnvelope::from_pose(&pose).to_json_bytes()?;
        let text = std::str::from_utf8(&bytes)?;
        assert!(text.contains(r#""x":null"#), "{}", text);

        let decoded = PoseEnvelope::from_json_bytes(&bytes)?;
        assert!(decoded.pose[0].x.is_nan());
        assert_eq!(decoded.pose[0].y, 0.5);
        assert!(decoded.pose[0].z.is_nan());
        Ok(())
    }

    #[test]
    fn position_lookup_by_name() {
        let pose = full_pose();
        let wrist = pose.landmark(15).copied().unwrap();
        let envelope = PoseEnvelope::from_pose(&pose);
        assert_eq!(envelope.position_of("L.Wrist"), Some([wrist.x, wrist.y, wrist.z]));
        assert_eq!(envelope.position_of("Nose"), None);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(PoseEnvelope::from_json_bytes(b"{\"pose\": 3}").is_err());
        assert!(PoseEnvelope::from_json_bytes(b"not json").is_err());
    }
}
