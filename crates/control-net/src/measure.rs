//! A single image observation of a control point.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use control_net_core::CameraHandle;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::{ControlError, MeasureStatus};

/// How a measure's image coordinate was obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasureType {
    #[default]
    Candidate,
    Manual,
    RegisteredPixel,
    RegisteredSubPixel,
}

impl MeasureType {
    /// Anything but a candidate has been looked at.
    #[inline]
    pub fn is_measured(self) -> bool {
        self != Self::Candidate
    }

    #[inline]
    pub fn is_registered(self) -> bool {
        matches!(self, Self::RegisteredPixel | Self::RegisteredSubPixel)
    }
}

impl fmt::Display for MeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Candidate => "Candidate",
            Self::Manual => "Manual",
            Self::RegisteredPixel => "RegisteredPixel",
            Self::RegisteredSubPixel => "RegisteredSubPixel",
        })
    }
}

impl FromStr for MeasureType {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "candidate" => Ok(Self::Candidate),
            "manual" => Ok(Self::Manual),
            "registeredpixel" => Ok(Self::RegisteredPixel),
            "registeredsubpixel" => Ok(Self::RegisteredSubPixel),
            _ => Err(ControlError::UnknownMeasureType(s.to_string())),
        }
    }
}

/// An observation of one control point in one image, keyed by the image's
/// cube serial number.
///
/// Standalone measures are edited directly. Once added to a
/// [`ControlPoint`](crate::ControlPoint) they are edited through
/// [`MeasureMut`](crate::MeasureMut), which keeps the point and its network
/// informed.
#[derive(Clone, Default)]
pub struct ControlMeasure {
    serial_number: String,
    measure_type: MeasureType,
    chooser_name: Option<String>,
    date_time: Option<String>,
    edit_lock: bool,
    // set while this is the reference measure of an edit-locked point
    held_by_point: bool,
    ignore: bool,
    jigsaw_rejected: bool,
    sample: f64,
    line: f64,
    apriori_sample: Option<f64>,
    apriori_line: Option<f64>,
    sample_sigma: Option<f64>,
    line_sigma: Option<f64>,
    diameter: Option<f64>,
    residual: Option<Vector2<f64>>,
    focal_plane_measured: Option<Point2<f64>>,
    focal_plane_computed: Option<Point2<f64>>,
    camera: Option<CameraHandle>,
    parent_point_id: Option<String>,
}

impl ControlMeasure {
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            ..Self::default()
        }
    }

    pub fn cube_serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn measure_type(&self) -> MeasureType {
        self.measure_type
    }

    pub fn chooser_name(&self) -> Option<&str> {
        self.chooser_name.as_deref()
    }

    pub fn date_time(&self) -> Option<&str> {
        self.date_time.as_deref()
    }

    /// Own lock, or implicitly locked as the reference of a locked point.
    pub fn is_edit_locked(&self) -> bool {
        self.edit_lock || self.held_by_point
    }

    /// The measure's own lock flag, ignoring its point.
    pub fn own_edit_lock(&self) -> bool {
        self.edit_lock
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn is_rejected(&self) -> bool {
        self.jigsaw_rejected
    }

    pub fn is_measured(&self) -> bool {
        self.measure_type.is_measured()
    }

    pub fn is_registered(&self) -> bool {
        self.measure_type.is_registered()
    }

    pub fn sample(&self) -> f64 {
        self.sample
    }

    pub fn line(&self) -> f64 {
        self.line
    }

    pub fn coordinate(&self) -> Point2<f64> {
        Point2::new(self.sample, self.line)
    }

    pub fn apriori_sample(&self) -> Option<f64> {
        self.apriori_sample
    }

    pub fn apriori_line(&self) -> Option<f64> {
        self.apriori_line
    }

    pub fn sample_sigma(&self) -> Option<f64> {
        self.sample_sigma
    }

    pub fn line_sigma(&self) -> Option<f64> {
        self.line_sigma
    }

    pub fn diameter(&self) -> Option<f64> {
        self.diameter
    }

    /// Measured minus computed image coordinate, in pixels.
    pub fn residual(&self) -> Option<Vector2<f64>> {
        self.residual
    }

    pub fn sample_residual(&self) -> Option<f64> {
        self.residual.map(|r| r.x)
    }

    pub fn line_residual(&self) -> Option<f64> {
        self.residual.map(|r| r.y)
    }

    pub fn residual_magnitude(&self) -> Option<f64> {
        self.residual.map(|r| r.norm())
    }

    /// Distance moved from the a-priori sample, if one was recorded.
    pub fn sample_shift(&self) -> Option<f64> {
        self.apriori_sample.map(|a| self.sample - a)
    }

    pub fn line_shift(&self) -> Option<f64> {
        self.apriori_line.map(|a| self.line - a)
    }

    pub fn pixel_shift(&self) -> Option<f64> {
        Some(self.sample_shift()?.hypot(self.line_shift()?))
    }

    pub fn focal_plane_measured(&self) -> Option<Point2<f64>> {
        self.focal_plane_measured
    }

    pub fn focal_plane_computed(&self) -> Option<Point2<f64>> {
        self.focal_plane_computed
    }

    pub fn camera(&self) -> Option<&CameraHandle> {
        self.camera.as_ref()
    }

    /// Id of the containing point.
    pub fn point_id(&self) -> Result<&str, ControlError> {
        self.parent_point_id
            .as_deref()
            .ok_or_else(|| ControlError::NoContainingPoint {
                serial: self.serial_number.clone(),
            })
    }

    pub fn has_containing_point(&self) -> bool {
        self.parent_point_id.is_some()
    }

    /// Change the serial number. Only meaningful before the measure joins a
    /// point, which keys measures by serial.
    pub fn set_cube_serial_number(&mut self, serial_number: impl Into<String>) -> MeasureStatus {
        self.guarded(|m| m.serial_number = serial_number.into())
    }

    pub fn set_coordinate(&mut self, sample: f64, line: f64) -> MeasureStatus {
        self.guarded(|m| {
            m.sample = sample;
            m.line = line;
        })
    }

    pub fn set_coordinate_with_type(
        &mut self,
        sample: f64,
        line: f64,
        measure_type: MeasureType,
    ) -> MeasureStatus {
        self.guarded(|m| {
            m.sample = sample;
            m.line = line;
            m.measure_type = measure_type;
        })
    }

    pub fn set_type(&mut self, measure_type: MeasureType) -> MeasureStatus {
        self.guarded(|m| m.measure_type = measure_type)
    }

    pub fn set_apriori_sample(&mut self, sample: Option<f64>) -> MeasureStatus {
        self.guarded(|m| m.apriori_sample = sample)
    }

    pub fn set_apriori_line(&mut self, line: Option<f64>) -> MeasureStatus {
        self.guarded(|m| m.apriori_line = line)
    }

    pub fn set_sample_sigma(&mut self, sigma: Option<f64>) -> MeasureStatus {
        self.guarded(|m| m.sample_sigma = sigma)
    }

    pub fn set_line_sigma(&mut self, sigma: Option<f64>) -> MeasureStatus {
        self.guarded(|m| m.line_sigma = sigma)
    }

    pub fn set_diameter(&mut self, diameter: Option<f64>) -> MeasureStatus {
        self.guarded(|m| m.diameter = diameter)
    }

    pub fn set_chooser_name(&mut self, name: impl Into<String>) -> MeasureStatus {
        if self.is_edit_locked() {
            return MeasureStatus::MeasureLocked;
        }
        self.chooser_name = Some(name.into());
        MeasureStatus::Success
    }

    pub fn set_date_time(&mut self, date_time: impl Into<String>) -> MeasureStatus {
        if self.is_edit_locked() {
            return MeasureStatus::MeasureLocked;
        }
        self.date_time = Some(date_time.into());
        MeasureStatus::Success
    }

    /// Never blocked by the lock itself.
    pub fn set_edit_lock(&mut self, lock: bool) -> MeasureStatus {
        self.edit_lock = lock;
        MeasureStatus::Success
    }

    pub fn set_ignored(&mut self, ignore: bool) -> MeasureStatus {
        self.guarded(|m| m.ignore = ignore)
    }

    /// Bundle-adjustment outlier flag; not subject to the edit lock.
    pub fn set_rejected(&mut self, rejected: bool) -> MeasureStatus {
        self.jigsaw_rejected = rejected;
        MeasureStatus::Success
    }

    /// Computed values are written by the residual routines regardless of
    /// the edit lock.
    pub fn set_residual(&mut self, sample_residual: f64, line_residual: f64) -> MeasureStatus {
        self.residual = Some(Vector2::new(sample_residual, line_residual));
        MeasureStatus::Success
    }

    pub fn clear_residual(&mut self) {
        self.residual = None;
    }

    pub fn set_focal_plane_measured(&mut self, x: f64, y: f64) -> MeasureStatus {
        self.focal_plane_measured = Some(Point2::new(x, y));
        MeasureStatus::Success
    }

    pub fn set_focal_plane_computed(&mut self, x: f64, y: f64) -> MeasureStatus {
        self.focal_plane_computed = Some(Point2::new(x, y));
        MeasureStatus::Success
    }

    pub fn set_camera(&mut self, camera: Option<CameraHandle>) {
        self.camera = camera;
    }

    fn guarded(&mut self, edit: impl FnOnce(&mut Self)) -> MeasureStatus {
        if self.is_edit_locked() {
            return MeasureStatus::MeasureLocked;
        }
        edit(self);
        self.measure_modified();
        MeasureStatus::Success
    }

    /// Any data edit invalidates the last-modified stamp.
    pub(crate) fn measure_modified(&mut self) {
        self.date_time = None;
    }

    pub(crate) fn attach_to(&mut self, point_id: &str) {
        self.parent_point_id = Some(point_id.to_string());
    }

    pub(crate) fn set_held_by_point(&mut self, held: bool) {
        self.held_by_point = held;
    }

    pub(crate) fn set_ignored_unchecked(&mut self, ignore: bool) {
        self.ignore = ignore;
        self.measure_modified();
    }
}

/// Equality over the observation data; camera and containing point are not
/// compared.
impl PartialEq for ControlMeasure {
    fn eq(&self, other: &Self) -> bool {
        self.serial_number == other.serial_number
            && self.measure_type == other.measure_type
            && self.chooser_name == other.chooser_name
            && self.date_time == other.date_time
            && self.edit_lock == other.edit_lock
            && self.ignore == other.ignore
            && self.jigsaw_rejected == other.jigsaw_rejected
            && self.sample == other.sample
            && self.line == other.line
            && self.apriori_sample == other.apriori_sample
            && self.apriori_line == other.apriori_line
            && self.sample_sigma == other.sample_sigma
            && self.line_sigma == other.line_sigma
            && self.diameter == other.diameter
            && self.residual == other.residual
            && self.focal_plane_measured == other.focal_plane_measured
            && self.focal_plane_computed == other.focal_plane_computed
    }
}

impl fmt::Debug for ControlMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlMeasure")
            .field("serial_number", &self.serial_number)
            .field("point", &self.parent_point_id)
            .field("type", &self.measure_type)
            .field("sample", &self.sample)
            .field("line", &self.line)
            .field("edit_lock", &self.edit_lock)
            .field("ignore", &self.ignore)
            .field("rejected", &self.jigsaw_rejected)
            .field("residual", &self.residual)
            .field("camera", &self.camera.as_ref().map(Rc::as_ptr))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_lock_blocks_edits_but_not_unlocking() {
        let mut m = ControlMeasure::new("S1");
        assert_eq!(m.set_coordinate(10.0, 20.0), MeasureStatus::Success);
        m.set_edit_lock(true);
        assert_eq!(m.set_coordinate(11.0, 21.0), MeasureStatus::MeasureLocked);
        assert_eq!(m.set_ignored(true), MeasureStatus::MeasureLocked);
        assert_eq!(m.coordinate(), Point2::new(10.0, 20.0));
        assert!(!m.is_ignored());

        assert_eq!(m.set_rejected(true), MeasureStatus::Success);
        assert_eq!(m.set_edit_lock(false), MeasureStatus::Success);
        assert_eq!(m.set_ignored(true), MeasureStatus::Success);
    }

    #[test]
    fn edits_clear_the_modified_stamp() {
        let mut m = ControlMeasure::new("S1");
        m.set_date_time("2024-01-01T00:00:00");
        m.set_type(MeasureType::Manual);
        assert_eq!(m.date_time(), None);
        assert!(m.is_measured());
        assert!(!m.is_registered());
    }

    #[test]
    fn standalone_measure_has_no_point() {
        let m = ControlMeasure::new("S1");
        let err = m.point_id().unwrap_err();
        assert!(err.is_user());
    }

    #[test]
    fn shifts_need_apriori_values() {
        let mut m = ControlMeasure::new("S1");
        m.set_coordinate(13.0, 24.0);
        assert_eq!(m.pixel_shift(), None);
        m.set_apriori_sample(Some(10.0));
        m.set_apriori_line(Some(20.0));
        assert_eq!(m.pixel_shift(), Some(5.0));
    }

    #[test]
    fn equality_ignores_camera_and_parent() {
        let mut a = ControlMeasure::new("S1");
        a.set_coordinate(1.0, 2.0);
        let mut b = a.clone();
        b.attach_to("P1");
        assert_eq!(a, b);
        b.set_residual(0.5, 0.5);
        assert_ne!(a, b);
    }

    #[test]
    fn measure_type_names_parse() {
        assert_eq!(
            "registeredsubpixel".parse::<MeasureType>(),
            Ok(MeasureType::RegisteredSubPixel)
        );
        assert!("Guess".parse::<MeasureType>().is_err());
    }
}
