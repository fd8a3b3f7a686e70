//! Face landmark geometry: eye aspect ratio and nose-tip gaze offset

use serde::{Deserialize, Serialize};

use crate::AttentionError;

/// Number of points in a full face mesh
pub const MESH_POINTS: usize = 468;

/// Left eye contour: outer corner, two upper lids, inner corner, two lower lids
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
/// Right eye contour, same ordering as [`LEFT_EYE`]
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

pub const NOSE_TIP: usize = 1;
pub const LEFT_CHEEK: usize = 234;
pub const RIGHT_CHEEK: usize = 454;
pub const FOREHEAD: usize = 10;
pub const CHIN: usize = 152;

const MIN_EXTENT: f64 = 1e-6;

/// Single landmark in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar distance (depth is ignored)
    pub fn distance(&self, other: &Keypoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Nose-tip offset from the face centre, normalised by face size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeOffset {
    pub horizontal: f64,
    pub vertical: f64,
}

impl GazeOffset {
    pub fn magnitude(&self) -> f64 {
        (self.horizontal.powi(2) + self.vertical.powi(2)).sqrt()
    }
}

/// One frame of face-mesh keypoints from the landmark model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub keypoints: Vec<Keypoint>,
}

/// Scalar features extracted from one frame; nothing else is retained
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceReading {
    pub eye_aspect_ratio: f64,
    pub gaze_offset: GazeOffset,
}

impl FaceLandmarks {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Extract EAR and gaze offset, rejecting partial or degenerate meshes
    pub fn read(&self) -> Result<FaceReading, AttentionError> {
        if self.keypoints.len() < MESH_POINTS {
            return Err(AttentionError::InsufficientLandmarks {
                expected: MESH_POINTS,
                actual: self.keypoints.len(),
            });
        }

        let left = self.eye_ratio(&LEFT_EYE)?;
        let right = self.eye_ratio(&RIGHT_EYE)?;

        Ok(FaceReading {
            eye_aspect_ratio: (left + right) / 2.0,
            gaze_offset: self.gaze_offset()?,
        })
    }

    fn point(&self, index: usize) -> Result<Keypoint, AttentionError> {
        let p = self
            .keypoints
            .get(index)
            .copied()
            .ok_or(AttentionError::InsufficientLandmarks {
                expected: MESH_POINTS,
                actual: self.keypoints.len(),
            })?;
        if p.is_finite() {
            Ok(p)
        } else {
            Err(AttentionError::NonFinite(index))
        }
    }

    /// (|p2-p6| + |p3-p5|) / (2 |p1-p4|)
    fn eye_ratio(&self, contour: &[usize; 6]) -> Result<f64, AttentionError> {
        let [p1, p2, p3, p4, p5, p6] = [
            self.point(contour[0])?,
            self.point(contour[1])?,
            self.point(contour[2])?,
            self.point(contour[3])?,
            self.point(contour[4])?,
            self.point(contour[5])?,
        ];

        let horizontal = p1.distance(&p4);
        if horizontal < MIN_EXTENT {
            return Err(AttentionError::DegenerateFace("eye width"));
        }

        Ok((p2.distance(&p6) + p3.distance(&p5)) / (2.0 * horizontal))
    }

    fn gaze_offset(&self) -> Result<GazeOffset, AttentionError> {
        let nose = self.point(NOSE_TIP)?;
        let left = self.point(LEFT_CHEEK)?;
        let right = self.point(RIGHT_CHEEK)?;
        let top = self.point(FOREHEAD)?;
        let bottom = self.point(CHIN)?;

        let width = left.distance(&right);
        let height = top.distance(&bottom);
        if width < MIN_EXTENT || height < MIN_EXTENT {
            return Err(AttentionError::DegenerateFace("face extent"));
        }

        let center_x = (left.x + right.x) / 2.0;
        let center_y = (left.y + right.y) / 2.0;

        Ok(GazeOffset {
            horizontal: (nose.x - center_x) / width,
            vertical: (nose.y - center_y) / height,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Frontal face in a 320x240 frame with the nose offset by `(dx, dy)`
    /// (fractions of face width/height) and eyes at the given EAR.
    pub fn face(ear: f64, dx: f64, dy: f64) -> FaceLandmarks {
        let mut points = vec![Keypoint::new(160.0, 120.0); MESH_POINTS];

        points[LEFT_CHEEK] = Keypoint::new(110.0, 120.0);
        points[RIGHT_CHEEK] = Keypoint::new(210.0, 120.0);
        points[FOREHEAD] = Keypoint::new(160.0, 60.0);
        points[CHIN] = Keypoint::new(160.0, 180.0);
        points[NOSE_TIP] = Keypoint::new(160.0 + dx * 100.0, 120.0 + dy * 120.0);

        place_eye(&mut points, &LEFT_EYE, 130.0, 100.0, ear);
        place_eye(&mut points, &RIGHT_EYE, 190.0, 100.0, ear);

        FaceLandmarks::new(points)
    }

    fn place_eye(points: &mut [Keypoint], contour: &[usize; 6], cx: f64, cy: f64, ear: f64) {
        let half_width = 10.0;
        // Both lid pairs open by the same amount: EAR = gap / width
        let half_gap = ear * 2.0 * half_width / 2.0;
        points[contour[0]] = Keypoint::new(cx - half_width, cy);
        points[contour[3]] = Keypoint::new(cx + half_width, cy);
        points[contour[1]] = Keypoint::new(cx - 3.0, cy - half_gap);
        points[contour[5]] = Keypoint::new(cx - 3.0, cy + half_gap);
        points[contour[2]] = Keypoint::new(cx + 3.0, cy - half_gap);
        points[contour[4]] = Keypoint::new(cx + 3.0, cy + half_gap);
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::face;
    use super::*;

    #[test]
    fn test_eye_aspect_ratio() {
        let reading = face(0.32, 0.0, 0.0).read().unwrap();
        assert!((reading.eye_aspect_ratio - 0.32).abs() < 1e-9);
    }

    #[test]
    fn test_centered_nose_has_no_offset() {
        let reading = face(0.3, 0.0, 0.0).read().unwrap();
        assert!(reading.gaze_offset.magnitude() < 1e-9);
    }

    #[test]
    fn test_offset_normalised_by_face_size() {
        let reading = face(0.3, 0.3, -0.4).read().unwrap();
        assert!((reading.gaze_offset.horizontal - 0.3).abs() < 1e-9);
        assert!((reading.gaze_offset.vertical + 0.4).abs() < 1e-9);
        assert!((reading.gaze_offset.magnitude() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_partial_mesh_rejected() {
        let partial = FaceLandmarks::new(vec![Keypoint::default(); 100]);
        assert!(matches!(
            partial.read(),
            Err(AttentionError::InsufficientLandmarks { actual: 100, .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut landmarks = face(0.3, 0.0, 0.0);
        landmarks.keypoints[NOSE_TIP].x = f64::NAN;
        assert!(matches!(landmarks.read(), Err(AttentionError::NonFinite(NOSE_TIP))));
    }

    #[test]
    fn test_collapsed_face_rejected() {
        let landmarks = FaceLandmarks::new(vec![Keypoint::new(5.0, 5.0); MESH_POINTS]);
        assert!(matches!(landmarks.read(), Err(AttentionError::DegenerateFace(_))));
    }
}
