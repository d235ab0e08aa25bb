//! Build a three-image tie point over a spherical body, estimate its ground
//! coordinates and print per-measure residuals as JSON.
//!
//! ```text
//! cargo run -p control-net --example apriori_demo -- [settings.json]
//! ```

use std::cell::RefCell;
use std::{env, fs};
use std::rc::Rc;

use control_net::{
    Camera, CameraHandle, CameraType, ComputeSettings, ControlMeasure, ControlPoint,
    DistortionMap, FocalPlaneMap, GroundMap, MeasureType, SurfacePoint,
};
use nalgebra::{Point2, Vector3};
use serde::Serialize;

const RADIUS_KM: f64 = 1737.4;

/// Nadir-looking framing camera above `(lat, lon)` with a distortion-free
/// tangent-plane projection.
struct NadirCamera {
    center: Vector3<f64>,
    east: Vector3<f64>,
    north: Vector3<f64>,
    pixel_km: f64,
    look: Vector3<f64>,
}

impl NadirCamera {
    fn new(lat_deg: f64, lon_deg: f64, pixel_km: f64) -> Self {
        let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
        let up = Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());
        let east = Vector3::new(-lon.sin(), lon.cos(), 0.0);
        let north = up.cross(&east);
        Self {
            center: up * RADIUS_KM,
            east,
            north,
            pixel_km,
            look: up * RADIUS_KM,
        }
    }
}

impl Camera for NadirCamera {
    fn camera_type(&self) -> CameraType {
        CameraType::Framing
    }

    fn set_image(&mut self, sample: f64, line: f64) -> bool {
        let Some(fp) = self.detector_to_focal_plane(sample, line) else {
            return false;
        };
        let tangent = self.center + self.east * fp.x + self.north * fp.y;
        self.look = tangent.normalize() * RADIUS_KM;
        true
    }

    fn coordinate(&self) -> Vector3<f64> {
        self.look
    }

    fn ground_to_image(&mut self, point: &SurfacePoint) -> Option<Point2<f64>> {
        let xy = self.get_xy(point, false)?;
        self.focal_plane_to_detector(xy.x, xy.y)
    }

    fn distortion_map(&self) -> &dyn DistortionMap {
        self
    }

    fn focal_plane_map(&self) -> &dyn FocalPlaneMap {
        self
    }

    fn ground_map(&self) -> &dyn GroundMap {
        self
    }
}

impl DistortionMap for NadirCamera {
    fn undistort(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(x, y))
    }

    fn distort(&self, ux: f64, uy: f64) -> Option<Point2<f64>> {
        Some(Point2::new(ux, uy))
    }
}

impl FocalPlaneMap for NadirCamera {
    fn focal_plane_to_detector(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(x / self.pixel_km + 512.0, 512.0 - y / self.pixel_km))
    }

    fn detector_to_focal_plane(&self, sample: f64, line: f64) -> Option<Point2<f64>> {
        Some(Point2::new(
            (sample - 512.0) * self.pixel_km,
            (512.0 - line) * self.pixel_km,
        ))
    }
}

impl GroundMap for NadirCamera {
    fn get_xy(&self, point: &SurfacePoint, back_of_planet_test: bool) -> Option<Point2<f64>> {
        let p = point.rectangular_km()?;
        let up = self.center.normalize();
        let height = p.dot(&up);
        if back_of_planet_test && height <= 0.0 {
            return None;
        }
        // project along the radial through the tangent plane
        let on_plane = p * (RADIUS_KM / height);
        let offset = on_plane - self.center;
        Some(Point2::new(offset.dot(&self.east), offset.dot(&self.north)))
    }
}

#[derive(Serialize)]
struct MeasureReport {
    serial: String,
    sample: f64,
    line: f64,
    sample_residual: Option<f64>,
    line_residual: Option<f64>,
}

#[derive(Serialize)]
struct PointReport {
    id: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_m: Option<f64>,
    residual_rms: Option<f64>,
    measures: Vec<MeasureReport>,
}

fn load_settings() -> Result<ComputeSettings, Box<dyn std::error::Error>> {
    match env::args().nth(1) {
        Some(path) => Ok(ComputeSettings::from_json(&fs::read_to_string(path)?)?),
        None => Ok(ComputeSettings::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    control_net::init_from_env()?;
    let settings = load_settings()?;
    log::info!("settings: {}", settings.to_json()?);

    let mut point = ControlPoint::new("tie_0001");
    let views = [
        ("LRO/2009-07-01T00:00:00", 10.00, 20.00, 530.0, 498.0),
        ("LRO/2009-07-02T00:00:00", 10.02, 20.01, 501.5, 519.3),
        ("LRO/2009-07-03T00:00:00", 9.98, 19.99, 558.6, 477.2),
    ];
    for (serial, lat, lon, sample, line) in views {
        let camera: CameraHandle = Rc::new(RefCell::new(NadirCamera::new(lat, lon, 0.0005)));
        let mut measure = ControlMeasure::new(serial);
        measure.set_coordinate_with_type(sample, line, MeasureType::Manual);
        measure.set_camera(Some(camera));
        point.add(measure)?;
    }

    point.compute_apriori_with(&settings)?;
    point.compute_residuals_with(&settings)?;

    let ground = point.adjusted_surface_point();
    let report = PointReport {
        id: point.id().to_string(),
        latitude: ground.latitude(),
        longitude: ground.longitude(),
        radius_m: ground.local_radius(),
        residual_rms: point.residual_rms(),
        measures: point
            .measures(false)
            .map(|m| MeasureReport {
                serial: m.cube_serial_number().to_string(),
                sample: m.sample(),
                line: m.line(),
                sample_residual: m.sample_residual(),
                line_residual: m.line_residual(),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
