use nalgebra::Vector3;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::projection::projection_for;
use crate::{ComputeSettings, ControlError, ControlPoint, PointType, Status};

use super::{RadiusSource, SurfacePointSource};

impl ControlPoint {
    /// [`ControlPoint::compute_apriori_with`] using default settings.
    pub fn compute_apriori(&mut self) -> Result<Status, ControlError> {
        self.compute_apriori_with(&ComputeSettings::default())
    }

    /// Estimate a-priori ground coordinates and seed the adjusted point.
    ///
    /// Fixed, constrained and pinned points keep their existing a-priori
    /// coordinates, and their measures may miss the body. Free points are
    /// placed at the average body intersection of their measures, pushed out
    /// to the average intersection radius. Every measure's measured
    /// focal-plane position is refreshed on the way, for all point types.
    ///
    /// Ignored points return [`Status::Failure`]. Errors are
    /// [`ControlError::MissingApriori`], [`ControlError::MissingCamera`] and
    /// [`ControlError::NoProjectingMeasures`].
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, settings), fields(point = %self.id)))]
    pub fn compute_apriori_with(
        &mut self,
        settings: &ComputeSettings,
    ) -> Result<Status, ControlError> {
        self.point_modified();
        if self.ignore {
            return Ok(Status::Failure);
        }

        let anchored = self.point_type != PointType::Free || settings.is_pinned(&self.id);
        if anchored && !self.apriori_surface_point.is_valid() {
            return Err(ControlError::MissingApriori {
                point_id: self.id.clone(),
            });
        }

        // every live measure needs a camera before any of them is touched
        if let Some(serial) = self.cube_serials.iter().find(|serial| {
            self.measures
                .get(*serial)
                .is_some_and(|m| !m.is_ignored() && m.camera().is_none())
        }) {
            return Err(ControlError::MissingCamera {
                point_id: self.id.clone(),
                serial: serial.clone(),
            });
        }

        let mut sum_km = Vector3::zeros();
        let mut sum_r2 = 0.0;
        let mut good = 0usize;
        let mut attempted = 0usize;

        for serial in &self.cube_serials {
            let Some(measure) = self.measures.get_mut(serial) else {
                continue;
            };
            if measure.is_ignored() {
                continue;
            }
            let Some(camera) = measure.camera().cloned() else {
                continue;
            };
            let mut camera = camera.borrow_mut();
            let strategy = projection_for(camera.camera_type());
            attempted += 1;

            if camera.set_image(measure.sample(), measure.line()) {
                let p = camera.coordinate();
                sum_km += p;
                sum_r2 += p.norm_squared();
                good += 1;
            } else {
                log::debug!(
                    "measure [{}] of control point [{}] misses the body",
                    serial,
                    self.id
                );
            }

            if let Some(fp) = strategy.measured_focal_plane(&*camera, measure) {
                measure.set_focal_plane_measured(fp.x, fp.y);
            }
        }

        if anchored {
            self.adjusted_surface_point = self.apriori_surface_point;
            return Ok(Status::Success);
        }

        if good == 0 {
            log::warn!(
                "control point [{}]: none of {} measures project to the body",
                self.id,
                attempted
            );
            return Err(ControlError::NoProjectingMeasures {
                point_id: self.id.clone(),
            });
        }

        if self.number_of_constrained_coordinates() == 0 {
            let n = good as f64;
            let avg = sum_km / n;
            let avg_r2 = sum_r2 / n;
            let avg_norm2 = avg.norm_squared();
            // averaging pulls the point inside the body; push it back out
            let scale = if avg_norm2 > 0.0 {
                (avg_r2 / avg_norm2).sqrt()
            } else {
                1.0
            };
            self.apriori_surface_point.set_rectangular_km(avg * scale);
            self.apriori_surface_point_source = SurfacePointSource::AverageOfMeasures;
            self.apriori_radius_source = RadiusSource::AverageOfMeasures;
        }

        log::debug!(
            "control point [{}]: a-priori from {}/{} measures",
            self.id,
            good,
            attempted
        );
        self.adjusted_surface_point = self.apriori_surface_point;
        Ok(Status::Success)
    }
}
