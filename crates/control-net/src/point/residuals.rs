#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::projection::projection_for;
use crate::{ComputeSettings, ControlError, ControlPoint, Status};

impl ControlPoint {
    /// [`ControlPoint::compute_residuals_millimeters_with`] using default
    /// settings.
    pub fn compute_residuals_millimeters(&mut self) -> Result<Status, ControlError> {
        self.compute_residuals_millimeters_with(&ComputeSettings::default())
    }

    /// Project the adjusted ground point into every non-ignored measure's
    /// image and store the result as the measure's computed focal-plane
    /// position.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, settings), fields(point = %self.id)))]
    pub fn compute_residuals_millimeters_with(
        &mut self,
        settings: &ComputeSettings,
    ) -> Result<Status, ControlError> {
        if self.ignore {
            return Ok(Status::Failure);
        }
        self.point_modified();

        let ground = self.adjusted_surface_point;
        for serial in &self.cube_serials {
            let Some(measure) = self.measures.get_mut(serial) else {
                continue;
            };
            if measure.is_ignored() {
                continue;
            }
            let Some(camera) = measure.camera().cloned() else {
                return Err(ControlError::MissingCamera {
                    point_id: self.id.clone(),
                    serial: serial.clone(),
                });
            };
            let mut camera = camera.borrow_mut();
            let strategy = projection_for(camera.camera_type());

            let Some(fp) = strategy.computed_focal_plane(&mut *camera, measure, &ground, settings)
            else {
                return Err(ControlError::DoesNotMapIntoImage {
                    point_id: self.id.clone(),
                    serial: serial.clone(),
                });
            };
            measure.set_focal_plane_computed(fp.x, fp.y);
        }
        Ok(Status::Success)
    }

    /// [`ControlPoint::compute_residuals_with`] using default settings.
    pub fn compute_residuals(&mut self) -> Result<Status, ControlError> {
        self.compute_residuals_with(&ComputeSettings::default())
    }

    /// Compute per-measure residuals in pixels (measured minus computed).
    ///
    /// Runs [`ControlPoint::compute_residuals_millimeters_with`] first, then
    /// converts through each camera's projection strategy.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, settings), fields(point = %self.id)))]
    pub fn compute_residuals_with(
        &mut self,
        settings: &ComputeSettings,
    ) -> Result<Status, ControlError> {
        if self.ignore {
            return Ok(Status::Failure);
        }
        self.compute_residuals_millimeters_with(settings)?;

        for serial in &self.cube_serials {
            let Some(measure) = self.measures.get_mut(serial) else {
                continue;
            };
            if measure.is_ignored() {
                continue;
            }
            let Some(camera) = measure.camera().cloned() else {
                return Err(ControlError::MissingCamera {
                    point_id: self.id.clone(),
                    serial: serial.clone(),
                });
            };
            let mut camera = camera.borrow_mut();
            let strategy = projection_for(camera.camera_type());

            let residual = strategy
                .residual(&mut *camera, measure, settings)
                .map_err(|failure| failure.with_context(&self.id, serial))?;
            log::trace!(
                "control point [{}], measure [{}]: residual ({:.4}, {:.4})",
                self.id,
                serial,
                residual.x,
                residual.y
            );
            measure.set_residual(residual.x, residual.y);
        }

        if let Some(rms) = self.residual_rms() {
            log::debug!("control point [{}]: residual rms {:.4} px", self.id, rms);
        }
        Ok(Status::Success)
    }
}
