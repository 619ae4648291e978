//! Annotation model for the operator view.
//!
//! Presenters draw from `Annotations`; building them is pure so the layout can
//! be tested without a display.

use crate::detect::Pose;
use crate::landmarks::filter_landmarks;

/// Landmark pairs joined by a bone in the 33-landmark body schema.
pub const POSE_CONNECTIONS: [(u32, u32); 35] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    (11, 23),
    (12, 24),
    (23, 24),
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

/// Static legend: text, baseline y, font scale, stroke thickness.
const LEGEND: [(&str, i32, f64, i32); 5] = [
    ("Landmark Guide:", 30, 0.7, 2),
    ("#0: Head/Nose", 60, 0.6, 1),
    ("#11,12: Shoulders", 80, 0.6, 1),
    ("#13,14: Elbows", 100, 0.6, 1),
    ("#15,16: Wrists", 120, 0.6, 1),
];
const LEGEND_X: i32 = 10;

const LABEL_SCALE: f64 = 0.5;

/// One line of overlay text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Pixel the text hangs from. Backdropped labels sit just above it.
    pub anchor: (i32, i32),
    pub scale: f64,
    pub thickness: i32,
    /// Draw a filled black box behind the text.
    pub backdrop: bool,
}

/// Everything a presenter draws on top of one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotations {
    pub joints: Vec<(i32, i32)>,
    pub bones: Vec<((i32, i32), (i32, i32))>,
    pub labels: Vec<TextLine>,
    pub legend: Vec<TextLine>,
}

impl Annotations {
    pub fn has_pose(&self) -> bool {
        !self.joints.is_empty()
    }
}

/// Lay out the overlay for a frame of the given size.
///
/// Without a pose only the legend is drawn.
pub fn annotate(width: u32, height: u32, pose: Option<&Pose>) -> Annotations {
    let mut annotations = Annotations {
        legend: legend(),
        ..Annotations::default()
    };
    let Some(pose) = pose else {
        return annotations;
    };

    annotations.joints = pose
        .landmarks
        .iter()
        .map(|lm| lm.to_pixel(width, height))
        .collect();
    annotations.bones = POSE_CONNECTIONS
        .iter()
        .filter_map(|&(a, b)| {
            let a = pose.landmark(a)?.to_pixel(width, height);
            let b = pose.landmark(b)?.to_pixel(width, height);
            Some((a, b))
        })
        .collect();
    annotations.labels = filter_landmarks(&pose.landmarks)
        .iter()
        .map(|lm| TextLine {
            text: format!(
                "{}#{} x:{:.2} y:{:.2} z:{:.2}",
                lm.name, lm.index, lm.x, lm.y, lm.z
            ),
            anchor: (
                (lm.x * width as f32) as i32,
                (lm.y * height as f32) as i32,
            ),
            scale: LABEL_SCALE,
            thickness: 1,
            backdrop: true,
        })
        .collect();
    annotations
}

/// The fixed legend describing the forwarded landmarks.
pub fn legend() -> Vec<TextLine> {
    LEGEND
        .iter()
        .map(|&(text, y, scale, thickness)| TextLine {
            text: text.to_string(),
            anchor: (LEGEND_X, y),
            scale,
            thickness,
            backdrop: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Landmark;

    #[test]
    fn no_pose_draws_only_the_legend() {
        let annotations = annotate(640, 480, None);
        assert!(!annotations.has_pose());
        assert!(annotations.bones.is_empty());
        assert!(annotations.labels.is_empty());
        let texts: Vec<&str> = annotations.legend.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Landmark Guide:",
                "#0: Head/Nose",
                "#11,12: Shoulders",
                "#13,14: Elbows",
                "#15,16: Wrists"
            ]
        );
    }

    #[test]
    fn labels_cover_forwarded_landmarks_only() {
        let pose = Pose::new(
            vec![
                Landmark::new(0, 0.5, 0.25, -0.3),
                Landmark::new(5, 0.4, 0.2, 0.0),
                Landmark::new(11, 0.6, 0.5, 0.13),
            ],
            0.9,
        );
        let annotations = annotate(200, 100, Some(&pose));
        assert_eq!(annotations.joints, vec![(100, 25), (80, 20), (120, 50)]);
        assert_eq!(annotations.labels.len(), 2);
        assert_eq!(annotations.labels[0].text, "Head#0 x:0.50 y:0.25 z:-0.30");
        assert_eq!(annotations.labels[0].anchor, (100, 25));
        assert!(annotations.labels[0].backdrop);
        assert_eq!(annotations.labels[1].text, "L.Shoulder#11 x:0.60 y:0.50 z:0.13");
    }

    #[test]
    fn bones_need_both_ends() {
        let pose = Pose::new(
            vec![
                Landmark::new(11, 0.5, 0.5, 0.0),
                Landmark::new(13, 0.5, 0.75, 0.0),
                Landmark::new(14, 0.25, 0.75, 0.0),
            ],
            0.9,
        );
        let annotations = annotate(100, 100, Some(&pose));
        assert_eq!(annotations.bones, vec![((50, 50), (50, 75))]);
    }
}
