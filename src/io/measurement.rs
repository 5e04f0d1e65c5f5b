use crate::types::{ShadowError, ShadowMeasurement, ShadowResult};
use serde::{Deserialize, Serialize};

/// A 2-D point in image or display space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point in the same space
    pub fn distance_to(&self, other: &ImagePoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Size of the displayed image versus its natural pixel size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFrame {
    pub display_width: f64,
    pub display_height: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

impl ImageFrame {
    pub fn new(display_width: f64, display_height: f64, natural_width: f64, natural_height: f64) -> Self {
        Self {
            display_width,
            display_height,
            natural_width,
            natural_height,
        }
    }

    /// Frame where display and image pixels coincide
    pub fn identity(width: f64, height: f64) -> Self {
        Self::new(width, height, width, height)
    }

    /// Convert a clicked display-space point into image pixels
    pub fn to_image_pixels(&self, point: ImagePoint) -> ShadowResult<ImagePoint> {
        let sizes = [
            self.display_width,
            self.display_height,
            self.natural_width,
            self.natural_height,
        ];
        if sizes.iter().any(|s| !(*s > 0.0) || !s.is_finite()) {
            return Err(ShadowError::InvalidMeasurement(format!(
                "image frame {}x{} (natural {}x{}) must have positive size",
                self.display_width, self.display_height, self.natural_width, self.natural_height
            )));
        }

        Ok(ImagePoint {
            x: point.x * self.natural_width / self.display_width,
            y: point.y * self.natural_height / self.display_height,
        })
    }
}

/// The three points a user marks on a photo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowMarkers {
    pub object_base: ImagePoint,
    pub object_top: ImagePoint,
    pub shadow_tip: ImagePoint,
}

impl ShadowMarkers {
    pub fn new(object_base: ImagePoint, object_top: ImagePoint, shadow_tip: ImagePoint) -> Self {
        Self {
            object_base,
            object_top,
            shadow_tip,
        }
    }

    /// Map display-space markers into image pixels
    pub fn from_display(
        object_base: ImagePoint,
        object_top: ImagePoint,
        shadow_tip: ImagePoint,
        frame: &ImageFrame,
    ) -> ShadowResult<Self> {
        Ok(Self {
            object_base: frame.to_image_pixels(object_base)?,
            object_top: frame.to_image_pixels(object_top)?,
            shadow_tip: frame.to_image_pixels(shadow_tip)?,
        })
    }

    pub fn measurement(&self) -> ShadowMeasurement {
        extract_measurement(self.object_base, self.object_top, self.shadow_tip)
    }
}

/// Object height and shadow length from three marked points.
///
/// No validation here; the scanner rejects non-positive magnitudes.
pub fn extract_measurement(
    object_base: ImagePoint,
    object_top: ImagePoint,
    shadow_tip: ImagePoint,
) -> ShadowMeasurement {
    ShadowMeasurement {
        object_height: object_top.distance_to(&object_base),
        shadow_length: shadow_tip.distance_to(&object_base),
    }
}
