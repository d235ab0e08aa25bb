//! Tunables for the a-priori and residual computations.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("radar_line_probe must be finite and non-zero, got {0}")]
    InvalidRadarProbe(f64),
}

fn default_radar_line_probe() -> f64 {
    1.0
}

fn default_pinned_id_marker() -> Option<String> {
    Some("Lidar".to_string())
}

/// Settings shared by [`ControlPoint::compute_apriori_with`] and the residual
/// routines.
///
/// [`ControlPoint::compute_apriori_with`]: crate::ControlPoint::compute_apriori_with
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputeSettings {
    /// Reject ground points hidden behind the body when projecting.
    #[serde(default)]
    pub back_of_planet_test: bool,
    /// Line offset used to probe the adjacent radar line when scaling
    /// doppler shift to image lines.
    #[serde(default = "default_radar_line_probe")]
    pub radar_line_probe: f64,
    /// Points whose id contains this marker keep their a-priori coordinates
    /// as if they were fixed.
    #[serde(default = "default_pinned_id_marker")]
    pub pinned_id_marker: Option<String>,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            back_of_planet_test: false,
            radar_line_probe: default_radar_line_probe(),
            pinned_id_marker: default_pinned_id_marker(),
        }
    }
}

impl ComputeSettings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.radar_line_probe.is_finite() || self.radar_line_probe == 0.0 {
            return Err(SettingsError::InvalidRadarProbe(self.radar_line_probe));
        }
        Ok(())
    }

    /// `true` if `point_id` marks an externally pinned point.
    pub fn is_pinned(&self, point_id: &str) -> bool {
        self.pinned_id_marker
            .as_deref()
            .is_some_and(|marker| !marker.is_empty() && point_id.contains(marker))
    }
}
