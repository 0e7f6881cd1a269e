//! Pose feature extraction
//!
//! This module turns the raw body landmarks of a single detected pose into a
//! fixed-length normalized feature vector for the external posture
//! classifier. The normalization makes the vector invariant to translation
//! (offsets cancel against the shoulder midpoint) and, for the coordinate
//! values, to uniform scaling (both numerator and shoulder distance scale by
//! the same factor).

use crate::types::{Landmark, PoseFeatureVector, FEATURE_LEN};

/// Index of the left shoulder landmark
pub const LEFT_SHOULDER: usize = 11;
/// Index of the right shoulder landmark
pub const RIGHT_SHOULDER: usize = 12;
/// Last landmark index included in the feature vector (inclusive)
pub const LAST_FEATURE_INDEX: usize = 23;
/// Minimum landmark count for a usable sample
pub const MIN_LANDMARKS: usize = 24;

/// Floor applied to a zero shoulder distance so coincident shoulders cannot
/// divide by zero or propagate NaN
const SHOULDER_DIST_FLOOR: f64 = 1e-6;

/// Extractor from raw landmarks to the normalized 52-value feature vector
pub struct PoseFeatureExtractor;

impl PoseFeatureExtractor {
    /// Extract the feature vector for one pose sample.
    ///
    /// Returns `None` when the landmark list is too short to contain the
    /// upper-body points, or (defensively) when the output would not have
    /// exactly [`FEATURE_LEN`] values. Both are routine drop conditions, not
    /// errors: the subject may simply be out of frame.
    pub fn extract(landmarks: &[Landmark]) -> Option<PoseFeatureVector> {
        if landmarks.len() < MIN_LANDMARKS {
            return None;
        }

        let left = landmarks[LEFT_SHOULDER];
        let right = landmarks[RIGHT_SHOULDER];

        let mid_x = (left.x + right.x) / 2.0;
        let mid_y = (left.y + right.y) / 2.0;
        let mid_z = (left.z + right.z) / 2.0;

        let mut shoulder_dist = euclidean(&left, &right);
        if shoulder_dist == 0.0 {
            shoulder_dist = SHOULDER_DIST_FLOOR;
        }

        let mut features = Vec::with_capacity(FEATURE_LEN);
        for landmark in &landmarks[LEFT_SHOULDER..=LAST_FEATURE_INDEX] {
            features.push((landmark.x - mid_x) / shoulder_dist);
            features.push((landmark.y - mid_y) / shoulder_dist);
            features.push((landmark.z - mid_z) / shoulder_dist);
            features.push(landmark.visibility_or_zero());
        }

        PoseFeatureVector::from_vec(features)
    }
}

fn euclidean(a: &Landmark, b: &Landmark) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// 30 landmarks with shoulders at (0,0,0) and (0.1,0,0)
    fn make_test_landmarks() -> Vec<Landmark> {
        let mut landmarks = Vec::new();
        for i in 0..30 {
            let t = i as f64;
            landmarks.push(Landmark::with_visibility(
                t * 0.01,
                t * 0.02,
                t * -0.005,
                (t / 30.0).min(1.0),
            ));
        }
        landmarks[LEFT_SHOULDER] = Landmark::with_visibility(0.0, 0.0, 0.0, 0.9);
        landmarks[RIGHT_SHOULDER] = Landmark::with_visibility(0.1, 0.0, 0.0, 0.8);
        landmarks
    }

    #[test]
    fn test_extract_returns_52_values() {
        let vector = PoseFeatureExtractor::extract(&make_test_landmarks()).unwrap();
        assert_eq!(vector.len(), FEATURE_LEN);
    }

    #[test]
    fn test_short_landmark_list_is_rejected() {
        let landmarks = make_test_landmarks();
        assert!(PoseFeatureExtractor::extract(&landmarks[..23]).is_none());
        assert!(PoseFeatureExtractor::extract(&[]).is_none());

        // Exactly MIN_LANDMARKS entries is enough
        assert!(PoseFeatureExtractor::extract(&landmarks[..MIN_LANDMARKS]).is_some());
    }

    #[test]
    fn test_translation_invariance() {
        let landmarks = make_test_landmarks();
        let translated: Vec<Landmark> = landmarks
            .iter()
            .map(|lm| Landmark {
                x: lm.x + 3.7,
                y: lm.y - 1.2,
                z: lm.z + 0.5,
                visibility: lm.visibility,
            })
            .collect();

        let base = PoseFeatureExtractor::extract(&landmarks).unwrap();
        let shifted = PoseFeatureExtractor::extract(&translated).unwrap();

        for (a, b) in base.as_slice().iter().zip(shifted.as_slice()) {
            assert!((a - b).abs() < 1e-9, "expected {a}, got {b}");
        }
    }

    #[test]
    fn test_scale_invariance_of_coordinates() {
        let landmarks = make_test_landmarks();
        let scaled: Vec<Landmark> = landmarks
            .iter()
            .map(|lm| Landmark {
                x: lm.x * 4.0,
                y: lm.y * 4.0,
                z: lm.z * 4.0,
                visibility: lm.visibility,
            })
            .collect();

        let base = PoseFeatureExtractor::extract(&landmarks).unwrap();
        let rescaled = PoseFeatureExtractor::extract(&scaled).unwrap();

        for (group, (a, b)) in base
            .as_slice()
            .iter()
            .zip(rescaled.as_slice())
            .enumerate()
        {
            // Three normalized coordinates then one visibility, per landmark
            assert!(
                (a - b).abs() < 1e-9,
                "value {group} changed under scaling: {a} vs {b}"
            );
        }
    }

    #[test]
    fn test_coincident_shoulders_produce_finite_values() {
        let mut landmarks = make_test_landmarks();
        landmarks[RIGHT_SHOULDER] = landmarks[LEFT_SHOULDER];

        let vector = PoseFeatureExtractor::extract(&landmarks).unwrap();
        assert!(vector.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_known_shoulder_geometry() {
        let landmarks = make_test_landmarks();

        // Shoulders at (0,0,0) and (0.1,0,0): midpoint (0.05,0,0), distance 0.1.
        // Landmark 11 normalizes to (-0.5, 0, 0) with its own visibility.
        let vector = PoseFeatureExtractor::extract(&landmarks).unwrap();
        let first = &vector.as_slice()[..4];
        assert!((first[0] + 0.5).abs() < 1e-9);
        assert!((first[1]).abs() < 1e-9);
        assert!((first[2]).abs() < 1e-9);
        assert_eq!(first[3], 0.9);
    }

    #[test]
    fn test_missing_visibility_becomes_zero() {
        let mut landmarks = make_test_landmarks();
        landmarks[13].visibility = None;

        let vector = PoseFeatureExtractor::extract(&landmarks).unwrap();
        // Landmark 13 is the third feature group; visibility is its 4th value
        assert_eq!(vector.as_slice()[2 * 4 + 3], 0.0);
    }
}
