#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use control_net::{
    Camera, CameraHandle, CameraType, ControlMeasure, ControlNetwork, ControlPoint,
    CoordinateType, DistortionMap, FocalPlaneMap, GroundMap, MeasureModification,
    PointModification, SurfacePoint,
};
use nalgebra::{Point2, Vector3};

/// Route crate logs through the test harness; `RUST_LOG=debug` to see them.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn shared<C: Camera + 'static>(camera: C) -> (Rc<RefCell<C>>, CameraHandle) {
    let concrete = Rc::new(RefCell::new(camera));
    let handle: CameraHandle = concrete.clone();
    (concrete, handle)
}

pub fn measure_on(serial: &str, sample: f64, line: f64, camera: &CameraHandle) -> ControlMeasure {
    let mut m = ControlMeasure::new(serial);
    m.set_coordinate(sample, line);
    m.set_camera(Some(camera.clone()));
    m
}

/// Camera whose pixel rays always hit the same ground point.
pub struct FixedCamera {
    pub hit: Option<Vector3<f64>>,
}

impl FixedCamera {
    pub fn hitting(x_km: f64, y_km: f64, z_km: f64) -> Self {
        Self {
            hit: Some(Vector3::new(x_km, y_km, z_km)),
        }
    }

    pub fn missing() -> Self {
        Self { hit: None }
    }
}

impl Camera for FixedCamera {
    fn camera_type(&self) -> CameraType {
        CameraType::Framing
    }
    fn set_image(&mut self, _: f64, _: f64) -> bool {
        self.hit.is_some()
    }
    fn coordinate(&self) -> Vector3<f64> {
        self.hit.unwrap_or_else(Vector3::zeros)
    }
    fn ground_to_image(&mut self, _: &SurfacePoint) -> Option<Point2<f64>> {
        None
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

impl DistortionMap for FixedCamera {
    fn undistort(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(x, y))
    }
    fn distort(&self, ux: f64, uy: f64) -> Option<Point2<f64>> {
        Some(Point2::new(ux, uy))
    }
}

impl FocalPlaneMap for FixedCamera {
    fn focal_plane_to_detector(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(x * 100.0, y * 100.0))
    }
    fn detector_to_focal_plane(&self, sample: f64, line: f64) -> Option<Point2<f64>> {
        Some(Point2::new(sample / 100.0, line / 100.0))
    }
}

impl GroundMap for FixedCamera {
    fn get_xy(&self, _: &SurfacePoint, _: bool) -> Option<Point2<f64>> {
        None
    }
}

/// Orthographic view of the +X face of a body.
///
/// Pixel `(s, l)` sits at focal plane `((s - 500) * 0.01, (l - 500) * 0.01)`
/// mm and looks at body-fixed `(radius, fp.x, fp.y)` km. The ground map can
/// be biased along x to fake a misregistered image.
pub struct PlaneCamera {
    pub camera_type: CameraType,
    pub radius_km: f64,
    pub bias_mm: f64,
    pub set_image_calls: usize,
    look: Point2<f64>,
}

impl PlaneCamera {
    pub const PITCH: f64 = 0.01;
    pub const CENTER: f64 = 500.0;

    pub fn new(camera_type: CameraType) -> Self {
        Self {
            camera_type,
            radius_km: 1000.0,
            bias_mm: 0.0,
            set_image_calls: 0,
            look: Point2::origin(),
        }
    }

    pub fn biased(camera_type: CameraType, bias_mm: f64) -> Self {
        Self {
            bias_mm,
            ..Self::new(camera_type)
        }
    }

    fn in_image(sample: f64, line: f64) -> bool {
        (0.0..=1000.0).contains(&sample) && (0.0..=1000.0).contains(&line)
    }
}

impl Camera for PlaneCamera {
    fn camera_type(&self) -> CameraType {
        self.camera_type
    }
    fn set_image(&mut self, sample: f64, line: f64) -> bool {
        self.set_image_calls += 1;
        self.look = Point2::new(
            (sample - Self::CENTER) * Self::PITCH,
            (line - Self::CENTER) * Self::PITCH,
        );
        Self::in_image(sample, line)
    }
    fn coordinate(&self) -> Vector3<f64> {
        Vector3::new(self.radius_km, self.look.x, self.look.y)
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

impl DistortionMap for PlaneCamera {
    fn undistort(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(x, y))
    }
    fn distort(&self, ux: f64, uy: f64) -> Option<Point2<f64>> {
        Some(Point2::new(ux, uy))
    }
}

impl FocalPlaneMap for PlaneCamera {
    fn focal_plane_to_detector(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(
            x / Self::PITCH + Self::CENTER,
            y / Self::PITCH + Self::CENTER,
        ))
    }
    fn detector_to_focal_plane(&self, sample: f64, line: f64) -> Option<Point2<f64>> {
        Some(Point2::new(
            (sample - Self::CENTER) * Self::PITCH,
            (line - Self::CENTER) * Self::PITCH,
        ))
    }
}

impl GroundMap for PlaneCamera {
    fn get_xy(&self, point: &SurfacePoint, back_of_planet_test: bool) -> Option<Point2<f64>> {
        let p = point.rectangular_km()?;
        if back_of_planet_test && p.x <= 0.0 {
            return None;
        }
        Some(Point2::new(p.y + self.bias_mm, p.z))
    }
}

/// Radar stub: line `l` images the body-fixed slice `z = l * 0.01` km.
///
/// Focal-plane x is range (`y` km, 1 mm per km), focal-plane y is doppler,
/// `k * d + c * d * d` for the z offset `d` from the current line's slice.
pub struct RadarStub {
    pub doppler_per_km: f64,
    pub doppler_curvature: f64,
    sample: f64,
    line: f64,
}

impl RadarStub {
    pub const LINE_SPACING_KM: f64 = 0.01;

    pub fn new(doppler_per_km: f64) -> Self {
        Self::curved(doppler_per_km, 0.0)
    }

    pub fn curved(doppler_per_km: f64, doppler_curvature: f64) -> Self {
        Self {
            doppler_per_km,
            doppler_curvature,
            sample: 0.0,
            line: 0.0,
        }
    }

    pub fn current_line(&self) -> f64 {
        self.line
    }
}

impl Camera for RadarStub {
    fn camera_type(&self) -> CameraType {
        CameraType::Radar
    }
    fn set_image(&mut self, sample: f64, line: f64) -> bool {
        self.sample = sample;
        self.line = line;
        true
    }
    fn coordinate(&self) -> Vector3<f64> {
        let range_km = (self.sample - PlaneCamera::CENTER) * PlaneCamera::PITCH;
        Vector3::new(1000.0, range_km, self.line * Self::LINE_SPACING_KM)
    }
    fn ground_to_image(&mut self, _: &SurfacePoint) -> Option<Point2<f64>> {
        None
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

impl DistortionMap for RadarStub {
    fn undistort(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(x, y))
    }
    fn distort(&self, ux: f64, uy: f64) -> Option<Point2<f64>> {
        Some(Point2::new(ux, uy))
    }
}

impl FocalPlaneMap for RadarStub {
    fn focal_plane_to_detector(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(
            x / PlaneCamera::PITCH + PlaneCamera::CENTER,
            y / PlaneCamera::PITCH + PlaneCamera::CENTER,
        ))
    }
    fn detector_to_focal_plane(&self, sample: f64, line: f64) -> Option<Point2<f64>> {
        Some(Point2::new(
            (sample - PlaneCamera::CENTER) * PlaneCamera::PITCH,
            (line - PlaneCamera::CENTER) * PlaneCamera::PITCH,
        ))
    }
}

impl GroundMap for RadarStub {
    fn get_xy(&self, point: &SurfacePoint, _: bool) -> Option<Point2<f64>> {
        let p = point.rectangular_km()?;
        let d = p.z - self.line * Self::LINE_SPACING_KM;
        Some(Point2::new(
            p.y,
            d * self.doppler_per_km + d * d * self.doppler_curvature,
        ))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    MeasureAdded(String),
    MeasureDeleted(String),
    MeasureModified(String, MeasureModification),
    MeasureIgnored(String),
    MeasureUnIgnored(String),
    PointModified(String, PointModification),
    PointIgnored(String),
    PointUnIgnored(String),
    PointRenamed { old: String, new: String },
    StructureModified,
}

/// Network that records every callback.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub coord_type: CoordinateType,
}

impl Recorder {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn with_coord_type(coord_type: CoordinateType) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            events: Vec::new(),
            coord_type,
        }))
    }

    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl ControlNetwork for Recorder {
    fn measure_added(&mut self, measure: &ControlMeasure) {
        self.events
            .push(Event::MeasureAdded(measure.cube_serial_number().to_string()));
    }
    fn measure_deleted(&mut self, measure: &ControlMeasure) {
        self.events
            .push(Event::MeasureDeleted(measure.cube_serial_number().to_string()));
    }
    fn measure_modified(&mut self, measure: &ControlMeasure, change: MeasureModification) {
        self.events.push(Event::MeasureModified(
            measure.cube_serial_number().to_string(),
            change,
        ));
    }
    fn measure_ignored(&mut self, measure: &ControlMeasure) {
        self.events
            .push(Event::MeasureIgnored(measure.cube_serial_number().to_string()));
    }
    fn measure_un_ignored(&mut self, measure: &ControlMeasure) {
        self.events
            .push(Event::MeasureUnIgnored(measure.cube_serial_number().to_string()));
    }
    fn point_modified(&mut self, point: &ControlPoint, change: PointModification) {
        self.events
            .push(Event::PointModified(point.id().to_string(), change));
    }
    fn point_ignored(&mut self, point: &ControlPoint) {
        self.events.push(Event::PointIgnored(point.id().to_string()));
    }
    fn point_un_ignored(&mut self, point: &ControlPoint) {
        self.events.push(Event::PointUnIgnored(point.id().to_string()));
    }
    fn update_point_reference(&mut self, point: &ControlPoint, old_id: &str) {
        self.events.push(Event::PointRenamed {
            old: old_id.to_string(),
            new: point.id().to_string(),
        });
    }
    fn network_structure_modified(&mut self) {
        self.events.push(Event::StructureModified);
    }
    fn coord_type(&self) -> CoordinateType {
        self.coord_type
    }
}
