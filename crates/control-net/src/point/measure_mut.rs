use std::ops::Deref;

use control_net_core::CameraHandle;

use crate::network::{with_network, NetworkLink};
use crate::{ControlMeasure, MeasureModification, MeasureStatus, MeasureType};

/// Mutable access to a measure owned by a [`ControlPoint`](crate::ControlPoint).
///
/// Reads go through `Deref`. Writes go through the methods below so that the
/// point's edit lock and the network stay in the loop.
pub struct MeasureMut<'a> {
    measure: &'a mut ControlMeasure,
    network: Option<&'a NetworkLink>,
    point_ignored: bool,
}

impl<'a> MeasureMut<'a> {
    pub(super) fn new(
        measure: &'a mut ControlMeasure,
        network: Option<&'a NetworkLink>,
        point_ignored: bool,
    ) -> Self {
        Self {
            measure,
            network,
            point_ignored,
        }
    }

    fn inner(&mut self) -> &mut ControlMeasure {
        self.measure
    }

    /// Ignore or un-ignore the measure.
    ///
    /// The network hears about every accepted call, and about structural
    /// changes only when the flag actually flips on a point that is itself
    /// in use.
    pub fn set_ignored(&mut self, ignore: bool) -> MeasureStatus {
        if self.measure.is_edit_locked() {
            return MeasureStatus::MeasureLocked;
        }
        let old = self.measure.is_ignored();
        self.measure.set_ignored_unchecked(ignore);

        let measure = &*self.measure;
        let point_ignored = self.point_ignored;
        with_network(self.network, |net| {
            net.measure_modified(measure, MeasureModification::Ignored { old, new: ignore });
            if old != ignore && !point_ignored {
                if ignore {
                    net.measure_ignored(measure);
                } else {
                    net.measure_un_ignored(measure);
                }
                net.network_structure_modified();
            }
        });
        MeasureStatus::Success
    }

    pub fn set_coordinate(&mut self, sample: f64, line: f64) -> MeasureStatus {
        self.inner().set_coordinate(sample, line)
    }

    pub fn set_coordinate_with_type(
        &mut self,
        sample: f64,
        line: f64,
        measure_type: MeasureType,
    ) -> MeasureStatus {
        self.inner().set_coordinate_with_type(sample, line, measure_type)
    }

    pub fn set_type(&mut self, measure_type: MeasureType) -> MeasureStatus {
        self.inner().set_type(measure_type)
    }

    pub fn set_apriori_sample(&mut self, sample: Option<f64>) -> MeasureStatus {
        self.inner().set_apriori_sample(sample)
    }

    pub fn set_apriori_line(&mut self, line: Option<f64>) -> MeasureStatus {
        self.inner().set_apriori_line(line)
    }

    pub fn set_sample_sigma(&mut self, sigma: Option<f64>) -> MeasureStatus {
        self.inner().set_sample_sigma(sigma)
    }

    pub fn set_line_sigma(&mut self, sigma: Option<f64>) -> MeasureStatus {
        self.inner().set_line_sigma(sigma)
    }

    pub fn set_diameter(&mut self, diameter: Option<f64>) -> MeasureStatus {
        self.inner().set_diameter(diameter)
    }

    pub fn set_chooser_name(&mut self, name: impl Into<String>) -> MeasureStatus {
        self.inner().set_chooser_name(name)
    }

    pub fn set_date_time(&mut self, date_time: impl Into<String>) -> MeasureStatus {
        self.inner().set_date_time(date_time)
    }

    pub fn set_edit_lock(&mut self, lock: bool) -> MeasureStatus {
        self.inner().set_edit_lock(lock)
    }

    pub fn set_rejected(&mut self, rejected: bool) -> MeasureStatus {
        self.inner().set_rejected(rejected)
    }

    pub fn set_residual(&mut self, sample_residual: f64, line_residual: f64) -> MeasureStatus {
        self.inner().set_residual(sample_residual, line_residual)
    }

    pub fn set_focal_plane_measured(&mut self, x: f64, y: f64) -> MeasureStatus {
        self.inner().set_focal_plane_measured(x, y)
    }

    pub fn set_focal_plane_computed(&mut self, x: f64, y: f64) -> MeasureStatus {
        self.inner().set_focal_plane_computed(x, y)
    }

    pub fn set_camera(&mut self, camera: Option<CameraHandle>) {
        self.inner().set_camera(camera);
    }
}

impl Deref for MeasureMut<'_> {
    type Target = ControlMeasure;

    fn deref(&self) -> &ControlMeasure {
        self.measure
    }
}

#[cfg(test)]
mod tests {
    use crate::{ControlMeasure, ControlPoint, MeasureStatus};

    #[test]
    fn reference_of_locked_point_cannot_be_edited() {
        let mut p = ControlPoint::new("P1");
        p.add(ControlMeasure::new("A")).unwrap();
        p.add(ControlMeasure::new("B")).unwrap();
        p.set_edit_lock(true);

        let mut reference = p.measure_mut("A").unwrap();
        assert_eq!(reference.set_coordinate(1.0, 1.0), MeasureStatus::MeasureLocked);
        assert_eq!(reference.set_ignored(true), MeasureStatus::MeasureLocked);
        assert_eq!(reference.set_residual(0.1, 0.2), MeasureStatus::Success);
        assert!(!reference.is_ignored());

        let mut other = p.measure_mut_at(1).unwrap();
        assert_eq!(other.set_coordinate(5.0, 6.0), MeasureStatus::Success);
        assert_eq!(other.sample(), 5.0);
    }

    #[test]
    fn ignoring_a_measure_keeps_the_reference() {
        let mut p = ControlPoint::new("P1");
        p.add(ControlMeasure::new("A")).unwrap();
        p.add(ControlMeasure::new("B")).unwrap();
        assert_eq!(p.measure_mut("A").unwrap().set_ignored(true), MeasureStatus::Success);
        assert_eq!(p.reference_serial(), Some("A"));
        assert_eq!(p.num_valid_measures(), 1);
    }
}
