//! Per-sensor projection rules used by the a-priori and residual routines.
//!
//! Optical cameras compare measured and computed positions on the focal
//! plane and convert both to detector pixels. Radar cameras only have a
//! (slant range, doppler) focal plane, so the line residual is scaled from
//! doppler by probing a neighbouring image line. CSM sensors skip the focal
//! plane and work in sample/line directly.

use control_net_core::{Camera, CameraType, SurfacePoint};
use nalgebra::{Point2, Vector2};

use crate::{ComputeSettings, ControlError, ControlMeasure};

/// Why a strategy could not produce a residual.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionFailure {
    /// A focal-plane value was missing or could not be mapped to the
    /// detector. `stage` is `"measured"` or `"computed"`.
    FocalPlane { stage: &'static str },
    /// The neighbouring radar line gave no usable doppler difference.
    RadarLineScale,
}

impl ProjectionFailure {
    pub(crate) fn with_context(self, point_id: &str, serial: &str) -> ControlError {
        match self {
            Self::FocalPlane { stage } => ControlError::FocalPlaneConversion {
                point_id: point_id.to_string(),
                serial: serial.to_string(),
                stage,
            },
            Self::RadarLineScale => ControlError::RadarLineScale {
                point_id: point_id.to_string(),
                serial: serial.to_string(),
            },
        }
    }
}

/// How a sensor family turns ground and image coordinates into residuals.
pub trait ProjectionStrategy {
    /// Focal-plane position of the measure's image coordinate.
    fn measured_focal_plane(
        &self,
        camera: &dyn Camera,
        measure: &ControlMeasure,
    ) -> Option<Point2<f64>>;

    /// Focal-plane position of `point` as seen from the measure's image.
    fn computed_focal_plane(
        &self,
        camera: &mut dyn Camera,
        measure: &ControlMeasure,
        point: &SurfacePoint,
        settings: &ComputeSettings,
    ) -> Option<Point2<f64>>;

    /// Measured minus computed position in pixels.
    ///
    /// Expects [`ProjectionStrategy::computed_focal_plane`] to have been
    /// stored on the measure.
    fn residual(
        &self,
        camera: &mut dyn Camera,
        measure: &ControlMeasure,
        settings: &ComputeSettings,
    ) -> Result<Vector2<f64>, ProjectionFailure>;
}

/// Strategy for `camera_type`.
pub fn projection_for(camera_type: CameraType) -> &'static dyn ProjectionStrategy {
    match camera_type {
        CameraType::Radar => &RadarProjection,
        CameraType::Csm => &CsmProjection,
        CameraType::Framing | CameraType::PushFrame | CameraType::LineScan | CameraType::Point => {
            &FocalPlaneProjection
        }
    }
}

/// Framing, push-frame, line-scan and point cameras.
#[derive(Clone, Copy, Debug, Default)]
pub struct FocalPlaneProjection;

/// Synthetic-aperture radar.
#[derive(Clone, Copy, Debug, Default)]
pub struct RadarProjection;

/// Community Sensor Model cameras.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsmProjection;

fn ground_to_focal_plane(
    camera: &mut dyn Camera,
    measure: &ControlMeasure,
    point: &SurfacePoint,
    settings: &ComputeSettings,
) -> Option<Point2<f64>> {
    // time-dependent sensors must look from the measured pixel first
    if camera.camera_type().is_time_dependent() {
        camera.set_image(measure.sample(), measure.line());
    }
    camera
        .ground_map()
        .get_xy(point, settings.back_of_planet_test)
}

impl ProjectionStrategy for FocalPlaneProjection {
    fn measured_focal_plane(
        &self,
        camera: &dyn Camera,
        measure: &ControlMeasure,
    ) -> Option<Point2<f64>> {
        camera.image_to_undistorted_focal_plane(measure.sample(), measure.line())
    }

    fn computed_focal_plane(
        &self,
        camera: &mut dyn Camera,
        measure: &ControlMeasure,
        point: &SurfacePoint,
        settings: &ComputeSettings,
    ) -> Option<Point2<f64>> {
        ground_to_focal_plane(camera, measure, point, settings)
    }

    fn residual(
        &self,
        camera: &mut dyn Camera,
        measure: &ControlMeasure,
        _settings: &ComputeSettings,
    ) -> Result<Vector2<f64>, ProjectionFailure> {
        let to_detector = |fp: Option<Point2<f64>>, stage: &'static str| {
            fp.and_then(|p| camera.focal_plane_map().focal_plane_to_detector(p.x, p.y))
                .ok_or(ProjectionFailure::FocalPlane { stage })
        };
        let computed = to_detector(measure.focal_plane_computed(), "computed")?;
        let measured = to_detector(measure.focal_plane_measured(), "measured")?;
        Ok(measured - computed)
    }
}

impl ProjectionStrategy for RadarProjection {
    fn measured_focal_plane(
        &self,
        camera: &dyn Camera,
        measure: &ControlMeasure,
    ) -> Option<Point2<f64>> {
        camera.image_to_undistorted_focal_plane(measure.sample(), measure.line())
    }

    fn computed_focal_plane(
        &self,
        camera: &mut dyn Camera,
        measure: &ControlMeasure,
        point: &SurfacePoint,
        settings: &ComputeSettings,
    ) -> Option<Point2<f64>> {
        ground_to_focal_plane(camera, measure, point, settings)
    }

    /// The focal-plane y of a radar camera is doppler shift, which maps to
    /// image lines only locally. The scale is measured by stepping
    /// `radar_line_probe` lines towards the computed doppler and projecting
    /// the ground point seen there.
    fn residual(
        &self,
        camera: &mut dyn Camera,
        measure: &ControlMeasure,
        settings: &ComputeSettings,
    ) -> Result<Vector2<f64>, ProjectionFailure> {
        let computed = measure
            .focal_plane_computed()
            .ok_or(ProjectionFailure::FocalPlane { stage: "computed" })?;
        let (sample, line) = (measure.sample(), measure.line());

        let probe = settings.radar_line_probe.abs();
        let delta = if computed.y < 0.0 { -probe } else { probe };

        let probed = camera.set_image(sample, line + delta);
        let neighbour = SurfacePoint::from_rectangular_km(camera.coordinate());
        camera.set_image(sample, line);
        if !probed {
            return Err(ProjectionFailure::RadarLineScale);
        }

        let neighbour_xy = camera
            .ground_map()
            .get_xy(&neighbour, false)
            .ok_or(ProjectionFailure::RadarLineScale)?;
        if neighbour_xy.y.abs() <= f64::EPSILON {
            return Err(ProjectionFailure::RadarLineScale);
        }

        let lines_per_doppler = delta / neighbour_xy.y;
        let computed_line = line + computed.y * lines_per_doppler;
        let computed_sample = camera
            .undistorted_focal_plane_to_detector(computed.x, computed.y)
            .ok_or(ProjectionFailure::FocalPlane { stage: "computed" })?
            .x;

        Ok(Vector2::new(sample - computed_sample, line - computed_line))
    }
}

impl ProjectionStrategy for CsmProjection {
    /// CSM sensors have no focal plane; the image coordinate stands in.
    fn measured_focal_plane(
        &self,
        _camera: &dyn Camera,
        measure: &ControlMeasure,
    ) -> Option<Point2<f64>> {
        Some(measure.coordinate())
    }

    fn computed_focal_plane(
        &self,
        camera: &mut dyn Camera,
        measure: &ControlMeasure,
        point: &SurfacePoint,
        _settings: &ComputeSettings,
    ) -> Option<Point2<f64>> {
        camera.set_image(measure.sample(), measure.line());
        camera.ground_to_image(point)
    }

    fn residual(
        &self,
        _camera: &mut dyn Camera,
        measure: &ControlMeasure,
        _settings: &ComputeSettings,
    ) -> Result<Vector2<f64>, ProjectionFailure> {
        let computed = measure
            .focal_plane_computed()
            .ok_or(ProjectionFailure::FocalPlane { stage: "computed" })?;
        Ok(measure.coordinate() - computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_keep_their_blame() {
        let fp = ProjectionFailure::FocalPlane { stage: "measured" }.with_context("P1", "S1");
        assert!(fp.is_programmer());
        assert!(fp.to_string().contains("measured"));

        let radar = ProjectionFailure::RadarLineScale.with_context("P1", "S1");
        assert!(radar.is_user());
    }
}
