//! Control points.
//!
//! A [`ControlPoint`] is one ground feature observed in several images. It
//! owns its [`ControlMeasure`]s keyed by cube serial number, keeps them in
//! insertion order, and designates one of them as the reference measure.
//!
//! Reference selection:
//! - the first measure added becomes the reference;
//! - a later, non-ignored measure replaces an ignored reference, unless the
//!   reference was chosen explicitly or the point is edit-locked;
//! - an explicit choice via [`ControlPoint::set_ref_measure`] sticks until
//!   that measure is deleted, at which point the first remaining measure
//!   takes over and the choice becomes implicit again.
//!
//! While a point is edit-locked, its attributes and its reference measure
//! are read-only; every blocked setter returns [`Status::PointLocked`] and
//! changes nothing.

mod apriori;
mod measure_mut;
mod residuals;
mod types;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use control_net_core::{CoordinateType, SurfacePoint};

use crate::network::{with_network, NetworkLink};
use crate::{
    ControlError, ControlMeasure, ControlNetwork, MeasureStatus, NetworkHandle, PointModification,
    Status,
};

pub use measure_mut::MeasureMut;
pub use types::{PointType, RadiusSource, SurfacePointSource};

use types::ConstraintStatus;

pub struct ControlPoint {
    id: String,
    point_type: PointType,
    chooser_name: Option<String>,
    date_time: Option<String>,
    edit_lock: bool,
    ignore: bool,
    jigsaw_rejected: bool,
    reference_explicitly_set: bool,
    constraint_status: ConstraintStatus,
    apriori_surface_point_source: SurfacePointSource,
    apriori_surface_point_source_file: Option<String>,
    apriori_radius_source: RadiusSource,
    apriori_radius_source_file: Option<String>,
    apriori_surface_point: SurfacePoint,
    adjusted_surface_point: SurfacePoint,
    number_of_rejected_measures: usize,
    measures: HashMap<String, ControlMeasure>,
    cube_serials: Vec<String>,
    reference: Option<String>,
    network: Option<NetworkLink>,
}

impl ControlPoint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            point_type: PointType::default(),
            chooser_name: None,
            date_time: None,
            edit_lock: false,
            ignore: false,
            jigsaw_rejected: false,
            reference_explicitly_set: false,
            constraint_status: ConstraintStatus::default(),
            apriori_surface_point_source: SurfacePointSource::None,
            apriori_surface_point_source_file: None,
            apriori_radius_source: RadiusSource::None,
            apriori_radius_source_file: None,
            apriori_surface_point: SurfacePoint::new(),
            adjusted_surface_point: SurfacePoint::new(),
            number_of_rejected_measures: 0,
            measures: HashMap::new(),
            cube_serials: Vec::new(),
            reference: None,
            network: None,
        }
    }

    // ---- network link -------------------------------------------------

    /// Link this point to `network`. The point never keeps the network alive.
    pub fn attach_network<N: ControlNetwork + 'static>(&mut self, network: &Rc<RefCell<N>>) {
        let handle: NetworkHandle = network.clone();
        self.network = Some(Rc::downgrade(&handle));
    }

    pub fn detach_network(&mut self) {
        self.network = None;
    }

    pub fn network(&self) -> Option<NetworkHandle> {
        self.network.as_ref().and_then(|link| link.upgrade())
    }

    pub fn has_network(&self) -> bool {
        self.network().is_some()
    }

    /// The owning network, for operations that cannot run detached.
    pub fn require_network(&self) -> Result<NetworkHandle, ControlError> {
        self.network().ok_or_else(|| ControlError::NetworkDetached {
            point_id: self.id.clone(),
        })
    }

    /// Coordinate system of the owning network, latitudinal when detached.
    pub fn coord_type(&self) -> CoordinateType {
        let Some(network) = self.network() else {
            return CoordinateType::default();
        };
        let coord_type = network
            .try_borrow()
            .map(|net| net.coord_type())
            .unwrap_or_default();
        coord_type
    }

    fn notify(&self, f: impl FnOnce(&mut dyn ControlNetwork)) {
        with_network(self.network.as_ref(), f);
    }

    fn notify_point(&self, change: PointModification) {
        with_network(self.network.as_ref(), |net| net.point_modified(self, change));
    }

    // ---- measures -----------------------------------------------------

    /// Take ownership of `measure`.
    ///
    /// Fails with [`ControlError::DuplicateSerial`] when a measure on the same
    /// cube already exists. Adding is allowed on an edit-locked point.
    pub fn add(&mut self, mut measure: ControlMeasure) -> Result<(), ControlError> {
        let serial = measure.cube_serial_number().to_string();
        if self.measures.contains_key(&serial) {
            return Err(ControlError::DuplicateSerial {
                point_id: self.id.clone(),
                serial,
            });
        }

        let promote = match self.reference.as_ref().and_then(|r| self.measures.get(r)) {
            None => true,
            Some(current) => {
                current.is_ignored()
                    && !measure.is_ignored()
                    && !self.reference_explicitly_set
                    && !self.edit_lock
            }
        };
        if promote {
            self.reference = Some(serial.clone());
        }

        self.point_modified();
        measure.attach_to(&self.id);
        self.measures.insert(serial.clone(), measure);
        self.cube_serials.push(serial.clone());
        self.sync_reference_lock();

        log::trace!("added measure [{}] to control point [{}]", serial, self.id);
        if let Some(added) = self.measures.get(&serial) {
            self.notify(|net| {
                net.measure_added(added);
                net.network_structure_modified();
            });
        }
        Ok(())
    }

    /// Remove the measure on cube `serial`.
    ///
    /// An edit-locked measure (including the reference of a locked point) is
    /// kept and [`MeasureStatus::MeasureLocked`] returned.
    pub fn delete(&mut self, serial: &str) -> Result<MeasureStatus, ControlError> {
        let Some(measure) = self.measures.get(serial) else {
            return Err(ControlError::MeasureNotFound {
                point_id: self.id.clone(),
                serial: serial.to_string(),
            });
        };
        if measure.is_edit_locked() {
            return Ok(MeasureStatus::MeasureLocked);
        }

        let structural = !self.ignore && !measure.is_ignored();
        self.notify(|net| {
            net.measure_deleted(measure);
            if structural {
                net.network_structure_modified();
            }
        });

        self.measures.remove(serial);
        self.cube_serials.retain(|s| s != serial);
        if self.reference.as_deref() == Some(serial) {
            self.reference = self.cube_serials.first().cloned();
            self.reference_explicitly_set = false;
        }
        self.point_modified();
        self.sync_reference_lock();

        log::trace!("deleted measure [{}] from control point [{}]", serial, self.id);
        Ok(MeasureStatus::Success)
    }

    pub fn delete_at(&mut self, index: usize) -> Result<MeasureStatus, ControlError> {
        let serial = self.serial_at(index)?.to_string();
        self.delete(&serial)
    }

    /// Remove `measure`, located by its serial number.
    pub fn delete_measure(&mut self, measure: &ControlMeasure) -> Result<MeasureStatus, ControlError> {
        let serial = measure.cube_serial_number().to_string();
        self.delete(&serial)
    }

    pub fn measure(&self, serial: &str) -> Result<&ControlMeasure, ControlError> {
        self.measures
            .get(serial)
            .ok_or_else(|| ControlError::MeasureNotFound {
                point_id: self.id.clone(),
                serial: serial.to_string(),
            })
    }

    pub fn measure_at(&self, index: usize) -> Result<&ControlMeasure, ControlError> {
        let serial = self.serial_at(index)?;
        self.measure(serial)
    }

    /// Edit the measure on cube `serial` through its point.
    pub fn measure_mut(&mut self, serial: &str) -> Result<MeasureMut<'_>, ControlError> {
        let Some(measure) = self.measures.get_mut(serial) else {
            return Err(ControlError::MeasureNotFound {
                point_id: self.id.clone(),
                serial: serial.to_string(),
            });
        };
        Ok(MeasureMut::new(measure, self.network.as_ref(), self.ignore))
    }

    pub fn measure_mut_at(&mut self, index: usize) -> Result<MeasureMut<'_>, ControlError> {
        let serial = self.serial_at(index)?.to_string();
        self.measure_mut(&serial)
    }

    /// Measures in insertion order.
    pub fn measures(&self, exclude_ignored: bool) -> impl Iterator<Item = &ControlMeasure> + '_ {
        self.cube_serials
            .iter()
            .filter_map(|serial| self.measures.get(serial))
            .filter(move |m| !(exclude_ignored && m.is_ignored()))
    }

    pub fn cube_serial_numbers(&self) -> &[String] {
        &self.cube_serials
    }

    pub fn has_serial_number(&self, serial: &str) -> bool {
        self.measures.contains_key(serial)
    }

    pub fn index_of(&self, serial: &str) -> Option<usize> {
        self.cube_serials.iter().position(|s| s == serial)
    }

    pub fn num_measures(&self) -> usize {
        self.cube_serials.len()
    }

    pub fn num_valid_measures(&self) -> usize {
        self.measures(true).count()
    }

    pub fn num_locked_measures(&self) -> usize {
        self.measures(false).filter(|m| m.is_edit_locked()).count()
    }

    fn serial_at(&self, index: usize) -> Result<&str, ControlError> {
        self.cube_serials
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| ControlError::IndexOutOfRange {
                point_id: self.id.clone(),
                index,
                len: self.cube_serials.len(),
            })
    }

    // ---- reference measure --------------------------------------------

    pub fn reference_serial(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn ref_measure(&self) -> Result<&ControlMeasure, ControlError> {
        self.reference
            .as_ref()
            .and_then(|serial| self.measures.get(serial))
            .ok_or_else(|| ControlError::NoMeasures {
                point_id: self.id.clone(),
            })
    }

    pub fn index_of_ref_measure(&self) -> Result<usize, ControlError> {
        self.reference
            .as_deref()
            .and_then(|serial| self.index_of(serial))
            .ok_or_else(|| ControlError::NoMeasures {
                point_id: self.id.clone(),
            })
    }

    pub fn is_reference_explicit(&self) -> bool {
        self.reference_explicitly_set
    }

    pub fn is_reference(&self, serial: &str) -> bool {
        self.reference.as_deref() == Some(serial)
    }

    /// Explicitly choose the reference measure.
    ///
    /// The lock is checked before the serial, so a locked point reports
    /// [`Status::PointLocked`] even for unknown serials.
    pub fn set_ref_measure(&mut self, serial: &str) -> Result<Status, ControlError> {
        if self.edit_lock {
            return Ok(Status::PointLocked);
        }
        if !self.measures.contains_key(serial) {
            return Err(ControlError::MeasureNotFound {
                point_id: self.id.clone(),
                serial: serial.to_string(),
            });
        }
        self.set_explicit_reference(serial.to_string());
        Ok(Status::Success)
    }

    pub fn set_ref_measure_at(&mut self, index: usize) -> Result<Status, ControlError> {
        if self.edit_lock {
            return Ok(Status::PointLocked);
        }
        let serial = self.serial_at(index)?.to_string();
        self.set_explicit_reference(serial);
        Ok(Status::Success)
    }

    fn set_explicit_reference(&mut self, serial: String) {
        let changed = self.reference.as_deref() != Some(serial.as_str());
        self.reference = Some(serial);
        self.reference_explicitly_set = true;
        if changed {
            self.sync_reference_lock();
            self.notify(|net| net.network_structure_modified());
        }
    }

    /// Recompute which measure inherits the point's edit lock.
    fn sync_reference_lock(&mut self) {
        let locked = self.edit_lock;
        let reference = self.reference.as_deref();
        for (serial, measure) in self.measures.iter_mut() {
            measure.set_held_by_point(locked && reference == Some(serial.as_str()));
        }
    }

    // ---- attributes ---------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn point_type(&self) -> PointType {
        self.point_type
    }

    pub fn is_free(&self) -> bool {
        self.point_type == PointType::Free
    }

    pub fn is_fixed(&self) -> bool {
        self.point_type == PointType::Fixed
    }

    pub fn is_constrained(&self) -> bool {
        self.point_type == PointType::Constrained
    }

    pub fn chooser_name(&self) -> Option<&str> {
        self.chooser_name.as_deref()
    }

    pub fn date_time(&self) -> Option<&str> {
        self.date_time.as_deref()
    }

    pub fn is_edit_locked(&self) -> bool {
        self.edit_lock
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    /// Ignored points and points with fewer than two usable measures take
    /// no part in an adjustment.
    pub fn is_valid(&self) -> bool {
        !self.ignore && self.num_valid_measures() >= 2
    }

    pub fn is_rejected(&self) -> bool {
        self.jigsaw_rejected
    }

    pub fn apriori_surface_point(&self) -> &SurfacePoint {
        &self.apriori_surface_point
    }

    pub fn adjusted_surface_point(&self) -> &SurfacePoint {
        &self.adjusted_surface_point
    }

    /// Adjusted coordinates when available, otherwise a-priori.
    pub fn best_surface_point(&self) -> &SurfacePoint {
        if self.adjusted_surface_point.is_valid() {
            &self.adjusted_surface_point
        } else {
            &self.apriori_surface_point
        }
    }

    pub fn has_apriori_coordinates(&self) -> bool {
        self.apriori_surface_point.is_valid()
    }

    pub fn apriori_surface_point_source(&self) -> SurfacePointSource {
        self.apriori_surface_point_source
    }

    pub fn apriori_surface_point_source_file(&self) -> Option<&str> {
        self.apriori_surface_point_source_file.as_deref()
    }

    pub fn apriori_radius_source(&self) -> RadiusSource {
        self.apriori_radius_source
    }

    pub fn apriori_radius_source_file(&self) -> Option<&str> {
        self.apriori_radius_source_file.as_deref()
    }

    // constraint bits only mean something on non-free points
    fn constraints(&self) -> ConstraintStatus {
        if self.is_free() {
            ConstraintStatus::default()
        } else {
            self.constraint_status
        }
    }

    pub fn is_coord1_constrained(&self) -> bool {
        self.constraints().test(0)
    }

    pub fn is_coord2_constrained(&self) -> bool {
        self.constraints().test(1)
    }

    pub fn is_coord3_constrained(&self) -> bool {
        self.constraints().test(2)
    }

    pub fn number_of_constrained_coordinates(&self) -> usize {
        self.constraints().count()
    }

    pub fn has_constrained_coordinates(&self) -> bool {
        self.number_of_constrained_coordinates() > 0
    }

    // ---- setters ------------------------------------------------------

    fn guarded(&mut self, edit: impl FnOnce(&mut Self)) -> Status {
        if self.edit_lock {
            return Status::PointLocked;
        }
        edit(self);
        self.point_modified();
        Status::Success
    }

    /// Any data edit invalidates the last-modified stamp.
    fn point_modified(&mut self) {
        self.date_time = None;
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> Status {
        if self.edit_lock {
            return Status::PointLocked;
        }
        let old_id = std::mem::replace(&mut self.id, id.into());
        for measure in self.measures.values_mut() {
            measure.attach_to(&self.id);
        }
        self.point_modified();
        self.notify(|net| net.update_point_reference(self, &old_id));
        Status::Success
    }

    pub fn set_type(&mut self, point_type: PointType) -> Status {
        if self.edit_lock {
            return Status::PointLocked;
        }
        let old = self.point_type;
        self.point_modified();
        self.point_type = point_type;
        if old != point_type {
            self.notify_point(PointModification::Type {
                old,
                new: point_type,
            });
        }
        Status::Success
    }

    pub fn set_chooser_name(&mut self, name: impl Into<String>) -> Status {
        if self.edit_lock {
            return Status::PointLocked;
        }
        self.chooser_name = Some(name.into());
        Status::Success
    }

    pub fn set_date_time(&mut self, date_time: impl Into<String>) -> Status {
        if self.edit_lock {
            return Status::PointLocked;
        }
        self.date_time = Some(date_time.into());
        Status::Success
    }

    /// Never blocked by the lock itself.
    pub fn set_edit_lock(&mut self, lock: bool) -> Status {
        let old = self.edit_lock;
        self.edit_lock = lock;
        self.sync_reference_lock();
        if old != lock {
            self.notify_point(PointModification::EditLock { old, new: lock });
        }
        Status::Success
    }

    pub fn set_ignored(&mut self, ignore: bool) -> Status {
        if self.edit_lock {
            return Status::PointLocked;
        }
        let old = self.ignore;
        if old == ignore {
            return Status::Success;
        }
        self.ignore = ignore;
        self.point_modified();
        self.notify(|net| {
            if ignore {
                net.point_ignored(self);
            } else {
                net.point_un_ignored(self);
            }
            net.point_modified(self, PointModification::Ignored { old, new: ignore });
        });
        Status::Success
    }

    /// Bundle-adjustment outlier flag; not subject to the edit lock.
    pub fn set_rejected(&mut self, rejected: bool) -> Status {
        let old = self.jigsaw_rejected;
        self.jigsaw_rejected = rejected;
        if old != rejected {
            self.notify_point(PointModification::Rejected { old, new: rejected });
        }
        Status::Success
    }

    /// Replace the a-priori coordinates.
    ///
    /// Every coordinate that carries a sigma in the network's coordinate
    /// system becomes constrained. Existing constraints are kept.
    pub fn set_apriori_surface_point(&mut self, point: SurfacePoint) -> Status {
        let coord_type = self.coord_type();
        if self.edit_lock {
            return Status::PointLocked;
        }
        for index in 0..3 {
            if point.coord_sigma(coord_type, index).is_some() {
                self.constraint_status.set(index);
            }
        }
        self.point_modified();
        self.apriori_surface_point = point;
        Status::Success
    }

    /// Adjusted coordinates are solver output and bypass the edit lock.
    pub fn set_adjusted_surface_point(&mut self, point: SurfacePoint) -> Status {
        self.point_modified();
        self.adjusted_surface_point = point;
        Status::Success
    }

    pub fn set_apriori_surface_point_source(&mut self, source: SurfacePointSource) -> Status {
        self.guarded(|p| p.apriori_surface_point_source = source)
    }

    pub fn set_apriori_surface_point_source_file(&mut self, file: impl Into<String>) -> Status {
        self.guarded(|p| p.apriori_surface_point_source_file = Some(file.into()))
    }

    pub fn set_apriori_radius_source(&mut self, source: RadiusSource) -> Status {
        self.guarded(|p| p.apriori_radius_source = source)
    }

    pub fn set_apriori_radius_source_file(&mut self, file: impl Into<String>) -> Status {
        self.guarded(|p| p.apriori_radius_source_file = Some(file.into()))
    }

    /// Forget the a-priori coordinates, their sources and constraints.
    pub fn reset_apriori(&mut self) -> Status {
        self.guarded(|p| {
            p.apriori_surface_point = SurfacePoint::new();
            p.apriori_surface_point_source = SurfacePointSource::None;
            p.apriori_surface_point_source_file = None;
            p.apriori_radius_source = RadiusSource::None;
            p.apriori_radius_source_file = None;
            p.constraint_status = ConstraintStatus::default();
        })
    }

    // ---- bundle-adjustment bookkeeping --------------------------------

    pub fn number_of_rejected_measures(&self) -> usize {
        self.number_of_rejected_measures
    }

    pub fn set_number_of_rejected_measures(&mut self, count: usize) {
        self.number_of_rejected_measures = count;
    }

    pub fn zero_number_of_rejected_measures(&mut self) {
        self.number_of_rejected_measures = 0;
    }

    /// Clear outlier flags on the point and all of its measures.
    pub fn clear_jigsaw_rejected(&mut self) {
        for measure in self.measures.values_mut() {
            measure.set_rejected(false);
        }
        self.number_of_rejected_measures = 0;
        self.set_rejected(false);
    }

    /// Residuals of measures that take part in an adjustment.
    fn used_residuals(&self) -> impl Iterator<Item = nalgebra::Vector2<f64>> + '_ {
        self.measures(true)
            .filter(|m| !m.is_rejected())
            .filter_map(ControlMeasure::residual)
    }

    fn rms(values: impl Iterator<Item = f64>) -> Option<f64> {
        let (n, sum_sq) = values.fold((0usize, 0.0), |(n, s), v| (n + 1, s + v * v));
        (n > 0).then(|| (sum_sq / n as f64).sqrt())
    }

    pub fn sample_residual_rms(&self) -> Option<f64> {
        Self::rms(self.used_residuals().map(|r| r.x))
    }

    pub fn line_residual_rms(&self) -> Option<f64> {
        Self::rms(self.used_residuals().map(|r| r.y))
    }

    /// RMS over both sample and line components.
    pub fn residual_rms(&self) -> Option<f64> {
        Self::rms(self.used_residuals().flat_map(|r| [r.x, r.y]))
    }
}

/// A detached copy: measures are cloned, the network link is not.
impl Clone for ControlPoint {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            point_type: self.point_type,
            chooser_name: self.chooser_name.clone(),
            date_time: self.date_time.clone(),
            edit_lock: self.edit_lock,
            ignore: self.ignore,
            jigsaw_rejected: self.jigsaw_rejected,
            reference_explicitly_set: self.reference_explicitly_set,
            constraint_status: self.constraint_status,
            apriori_surface_point_source: self.apriori_surface_point_source,
            apriori_surface_point_source_file: self.apriori_surface_point_source_file.clone(),
            apriori_radius_source: self.apriori_radius_source,
            apriori_radius_source_file: self.apriori_radius_source_file.clone(),
            apriori_surface_point: self.apriori_surface_point,
            adjusted_surface_point: self.adjusted_surface_point,
            number_of_rejected_measures: self.number_of_rejected_measures,
            measures: self.measures.clone(),
            cube_serials: self.cube_serials.clone(),
            reference: self.reference.clone(),
            network: None,
        }
    }
}

impl PartialEq for ControlPoint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.point_type == other.point_type
            && self.chooser_name == other.chooser_name
            && self.date_time == other.date_time
            && self.edit_lock == other.edit_lock
            && self.ignore == other.ignore
            && self.jigsaw_rejected == other.jigsaw_rejected
            && self.reference_explicitly_set == other.reference_explicitly_set
            && self.constraint_status == other.constraint_status
            && self.apriori_surface_point_source == other.apriori_surface_point_source
            && self.apriori_surface_point_source_file == other.apriori_surface_point_source_file
            && self.apriori_radius_source == other.apriori_radius_source
            && self.apriori_radius_source_file == other.apriori_radius_source_file
            && self.apriori_surface_point == other.apriori_surface_point
            && self.adjusted_surface_point == other.adjusted_surface_point
            && self.reference == other.reference
            && self.cube_serials == other.cube_serials
            && self.measures(false).eq(other.measures(false))
    }
}

impl fmt::Debug for ControlPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPoint")
            .field("id", &self.id)
            .field("type", &self.point_type)
            .field("edit_lock", &self.edit_lock)
            .field("ignore", &self.ignore)
            .field("reference", &self.reference)
            .field("explicit_reference", &self.reference_explicitly_set)
            .field("measures", &self.measures(false).collect::<Vec<_>>())
            .field("attached", &self.has_network())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_with(serials: &[&str]) -> ControlPoint {
        let mut p = ControlPoint::new("P1");
        for s in serials {
            p.add(ControlMeasure::new(*s)).unwrap();
        }
        p
    }

    #[test]
    fn first_measure_becomes_reference() {
        let p = point_with(&["A", "B"]);
        assert_eq!(p.reference_serial(), Some("A"));
        assert!(!p.is_reference_explicit());
        assert_eq!(p.measure("B").unwrap().point_id().unwrap(), "P1");
    }

    #[test]
    fn duplicate_serial_is_rejected() {
        let mut p = point_with(&["A"]);
        let err = p.add(ControlMeasure::new("A")).unwrap_err();
        assert!(matches!(err, ControlError::DuplicateSerial { .. }));
        assert_eq!(p.num_measures(), 1);
    }

    #[test]
    fn deleting_reference_promotes_first_remaining() {
        let mut p = point_with(&["A", "B", "C"]);
        p.set_ref_measure("C").unwrap();
        assert_eq!(p.delete("C").unwrap(), MeasureStatus::Success);
        assert_eq!(p.reference_serial(), Some("A"));
        assert!(!p.is_reference_explicit());

        p.delete_at(0).unwrap();
        p.delete("B").unwrap();
        assert_eq!(p.reference_serial(), None);
        assert!(p.ref_measure().unwrap_err().is_programmer());
    }

    #[test]
    fn unknown_measure_is_a_programmer_error() {
        let mut p = point_with(&["A"]);
        assert!(p.delete("Z").unwrap_err().is_programmer());
        assert!(matches!(
            p.delete_at(3),
            Err(ControlError::IndexOutOfRange { index: 3, len: 1, .. })
        ));
    }

    #[test]
    fn locked_point_protects_reference_only() {
        let mut p = point_with(&["A", "B"]);
        p.set_edit_lock(true);
        assert!(p.measure("A").unwrap().is_edit_locked());
        assert!(!p.measure("B").unwrap().is_edit_locked());
        assert_eq!(p.delete("A").unwrap(), MeasureStatus::MeasureLocked);
        assert_eq!(p.delete("B").unwrap(), MeasureStatus::Success);

        p.set_edit_lock(false);
        assert!(!p.measure("A").unwrap().is_edit_locked());
    }

    #[test]
    fn locked_setters_have_no_side_effects() {
        let mut p = point_with(&["A", "B"]);
        p.set_date_time("2020-01-01T00:00:00");
        p.set_edit_lock(true);

        assert_eq!(p.set_id("Q"), Status::PointLocked);
        assert_eq!(p.set_type(PointType::Fixed), Status::PointLocked);
        assert_eq!(p.set_ignored(true), Status::PointLocked);
        assert_eq!(p.set_ref_measure("B"), Ok(Status::PointLocked));
        assert_eq!(p.reset_apriori(), Status::PointLocked);
        assert_eq!(p.set_ref_measure("missing"), Ok(Status::PointLocked));

        assert_eq!(p.id(), "P1");
        assert_eq!(p.point_type(), PointType::Free);
        assert!(!p.is_ignored());
        assert_eq!(p.reference_serial(), Some("A"));
        assert_eq!(p.date_time(), Some("2020-01-01T00:00:00"));
    }

    #[test]
    fn constraints_are_hidden_on_free_points() {
        let mut p = ControlPoint::new("P1");
        // on the equator and prime meridian the radius variance stays exactly zero
        let mut sp = SurfacePoint::from_spherical(0.0, 0.0, 1_737_400.0);
        assert!(sp.set_spherical_sigmas_distance(50.0, 50.0, 0.0));
        p.set_apriori_surface_point(sp);
        assert_eq!(p.number_of_constrained_coordinates(), 0);

        p.set_type(PointType::Constrained);
        assert_eq!(p.number_of_constrained_coordinates(), 2);
        assert!(p.is_coord1_constrained() && p.is_coord2_constrained());
        assert!(!p.is_coord3_constrained());

        p.set_apriori_surface_point(SurfacePoint::from_spherical(10.0, 20.0, 1_737_400.0));
        assert_eq!(p.number_of_constrained_coordinates(), 2);

        p.reset_apriori();
        assert_eq!(p.number_of_constrained_coordinates(), 0);
        assert!(!p.has_apriori_coordinates());
    }

    #[test]
    fn rename_follows_into_measures() {
        let mut p = point_with(&["A"]);
        p.set_id("P2");
        assert_eq!(p.measure("A").unwrap().point_id().unwrap(), "P2");
    }

    #[test]
    fn clone_is_detached_and_equal() {
        let mut p = point_with(&["A", "B"]);
        p.set_ref_measure("B").unwrap();
        let q = p.clone();
        assert_eq!(p, q);
        assert!(!q.has_network());
        assert_eq!(q.reference_serial(), Some("B"));
        assert!(q.is_reference_explicit());
    }

    #[test]
    fn residual_rms_skips_rejected_and_ignored() {
        let mut p = point_with(&["A", "B", "C"]);
        p.measure_mut("A").unwrap().set_residual(3.0, 4.0);
        p.measure_mut("B").unwrap().set_residual(100.0, 100.0);
        p.measure_mut("B").unwrap().set_rejected(true);
        p.measure_mut("C").unwrap().set_residual(50.0, 50.0);
        p.measure_mut("C").unwrap().set_ignored(true);

        assert_eq!(p.sample_residual_rms(), Some(3.0));
        assert_eq!(p.line_residual_rms(), Some(4.0));

        p.set_number_of_rejected_measures(1);
        p.set_edit_lock(true);
        p.set_rejected(true);
        p.clear_jigsaw_rejected();
        assert!(!p.measure("B").unwrap().is_rejected());
        assert!(!p.is_rejected());
        assert_eq!(p.number_of_rejected_measures(), 0);
    }

    #[test]
    fn repeated_ignore_keeps_the_date_stamp() {
        let mut p = point_with(&["A"]);
        p.set_date_time("2022-03-04T05:06:07");
        assert_eq!(p.set_ignored(false), Status::Success);
        assert_eq!(p.date_time(), Some("2022-03-04T05:06:07"));

        assert_eq!(p.set_ignored(true), Status::Success);
        assert_eq!(p.date_time(), None);
        p.set_date_time("2022-03-04T05:06:07");
        p.set_ignored(true);
        assert_eq!(p.date_time(), Some("2022-03-04T05:06:07"));
    }

    #[test]
    fn detached_point_cannot_require_network() {
        let p = ControlPoint::new("P1");
        assert!(matches!(
            p.require_network(),
            Err(ControlError::NetworkDetached { .. })
        ));
        assert_eq!(p.coord_type(), CoordinateType::Latitudinal);
    }
}
