//! Control points and measures for photogrammetric bundle adjustment.
//!
//! A control network ties images together through ground features. Each
//! [`ControlPoint`] is one such feature; each [`ControlMeasure`] records
//! where it appears in one image. This crate manages the point/measure
//! bookkeeping (reference measure, edit locks, ignore flags, network
//! notifications) and the two geometric routines a bundle adjuster needs:
//! initial ground coordinates ([`ControlPoint::compute_apriori`]) and image
//! residuals ([`ControlPoint::compute_residuals`]).
//!
//! ## Quickstart
//!
//! ```
//! use control_net::{ControlMeasure, ControlPoint, MeasureStatus, Status};
//!
//! let mut point = ControlPoint::new("tie_0001");
//! point.add(ControlMeasure::new("cube-A")).unwrap();
//! point.add(ControlMeasure::new("cube-B")).unwrap();
//! assert_eq!(point.reference_serial(), Some("cube-A"));
//!
//! point.set_edit_lock(true);
//! assert_eq!(point.set_ignored(true), Status::PointLocked);
//! assert_eq!(point.delete("cube-A").unwrap(), MeasureStatus::MeasureLocked);
//! ```
//!
//! Camera models are supplied by the caller through the
//! [`control_net_core::Camera`] trait.

mod error;
mod measure;
mod network;
mod point;
mod projection;
mod settings;

pub use error::{ControlError, ErrorKind, MeasureStatus, Status};
pub use measure::{ControlMeasure, MeasureType};
pub use network::{ControlNetwork, MeasureModification, NetworkHandle, PointModification};
pub use point::{ControlPoint, MeasureMut, PointType, RadiusSource, SurfacePointSource};
pub use projection::{
    projection_for, CsmProjection, FocalPlaneProjection, ProjectionFailure, ProjectionStrategy,
    RadarProjection,
};
pub use settings::{ComputeSettings, SettingsError};

pub use control_net_core::{
    init_from_env, init_with_level, Camera, CameraHandle, CameraType, CoordinateType,
    DistortionMap, FocalPlaneMap, GroundMap, SurfacePoint, LOG_LEVEL_ENV,
};

#[cfg(feature = "tracing")]
pub use control_net_core::{init_tracing, TracingFormat};
