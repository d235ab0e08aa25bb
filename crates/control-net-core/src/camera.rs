//! Camera contract consumed by control points.
//!
//! Control points never implement projections themselves. They drive a
//! per-image [`Camera`] through three coordinate systems:
//!
//! - image (sample, line) pixels,
//! - distorted and undistorted focal-plane coordinates (millimeters for
//!   optical cameras, slant range / doppler for radar),
//! - body-fixed ground coordinates ([`SurfacePoint`]).
//!
//! Cameras are stateful: [`Camera::set_image`] moves the camera to the time
//! and look direction of a pixel, and [`GroundMap::get_xy`] projects relative
//! to that state.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use nalgebra::{Point2, Vector3};
use serde::{Deserialize, Serialize};

use crate::{ParseError, SurfacePoint};

/// Shared, mutable handle to a camera. Many measures on the same image share
/// one camera instance.
pub type CameraHandle = Rc<RefCell<dyn Camera>>;

/// Sensor geometry family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraType {
    Framing,
    PushFrame,
    LineScan,
    Radar,
    Point,
    /// Community Sensor Model: no physical focal plane, works in sample/line.
    Csm,
}

impl CameraType {
    /// Framing cameras have one exposure time, so their geometry does not
    /// depend on the image position.
    #[inline]
    pub fn is_time_dependent(self) -> bool {
        !matches!(self, Self::Framing)
    }
}

impl fmt::Display for CameraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Framing => "Framing",
            Self::PushFrame => "PushFrame",
            Self::LineScan => "LineScan",
            Self::Radar => "Radar",
            Self::Point => "Point",
            Self::Csm => "Csm",
        })
    }
}

impl FromStr for CameraType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "framing" => Ok(Self::Framing),
            "pushframe" => Ok(Self::PushFrame),
            "linescan" => Ok(Self::LineScan),
            "radar" => Ok(Self::Radar),
            "point" => Ok(Self::Point),
            "csm" => Ok(Self::Csm),
            _ => Err(ParseError::CameraType(s.to_string())),
        }
    }
}

/// Lens distortion between distorted and undistorted focal-plane coordinates.
pub trait DistortionMap {
    /// Distorted focal plane (x, y) -> undistorted focal plane.
    fn undistort(&self, x: f64, y: f64) -> Option<Point2<f64>>;

    /// Undistorted focal plane (ux, uy) -> distorted focal plane.
    fn distort(&self, ux: f64, uy: f64) -> Option<Point2<f64>>;
}

/// Affine map between the focal plane and detector pixels.
pub trait FocalPlaneMap {
    /// Focal plane (x, y) -> detector (sample, line).
    fn focal_plane_to_detector(&self, x: f64, y: f64) -> Option<Point2<f64>>;

    /// Detector (sample, line) -> focal plane (x, y).
    fn detector_to_focal_plane(&self, sample: f64, line: f64) -> Option<Point2<f64>>;
}

/// Ground-to-focal-plane projection at the camera's current state.
pub trait GroundMap {
    /// Project `point` to undistorted focal-plane coordinates.
    ///
    /// With `back_of_planet_test` set, points occluded by the body fail.
    fn get_xy(&self, point: &SurfacePoint, back_of_planet_test: bool) -> Option<Point2<f64>>;
}

/// A per-image sensor model.
pub trait Camera {
    fn camera_type(&self) -> CameraType;

    /// Move the camera to image position `(sample, line)`.
    ///
    /// Returns `false` when the pixel does not intersect the target body.
    /// Time-dependent state (attitude, ephemeris) is updated either way.
    fn set_image(&mut self, sample: f64, line: f64) -> bool;

    /// Body-fixed intersection of the last successful [`Camera::set_image`],
    /// in kilometers.
    fn coordinate(&self) -> Vector3<f64>;

    /// Project a ground point directly into image (sample, line).
    fn ground_to_image(&mut self, point: &SurfacePoint) -> Option<Point2<f64>>;

    fn distortion_map(&self) -> &dyn DistortionMap;

    fn focal_plane_map(&self) -> &dyn FocalPlaneMap;

    fn ground_map(&self) -> &dyn GroundMap;

    /// Image (sample, line) -> undistorted focal plane through the focal
    /// plane and distortion maps.
    fn image_to_undistorted_focal_plane(&self, sample: f64, line: f64) -> Option<Point2<f64>> {
        let fp = self.focal_plane_map().detector_to_focal_plane(sample, line)?;
        self.distortion_map().undistort(fp.x, fp.y)
    }

    /// Undistorted focal plane -> detector (sample, line), applying lens
    /// distortion on the way.
    fn undistorted_focal_plane_to_detector(&self, ux: f64, uy: f64) -> Option<Point2<f64>> {
        let fp = self.distortion_map().distort(ux, uy)?;
        self.focal_plane_map().focal_plane_to_detector(fp.x, fp.y)
    }
}
