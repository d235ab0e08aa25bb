//! Core geometric types for photogrammetric control networks.
//!
//! This crate is intentionally small. It holds the body-fixed
//! [`SurfacePoint`] value type and the [`Camera`] contract that control
//! points project through. Concrete camera models live elsewhere.

mod camera;
mod error;
mod logger;
mod surface_point;

pub use camera::{Camera, CameraHandle, CameraType, DistortionMap, FocalPlaneMap, GroundMap};
pub use error::ParseError;
pub use surface_point::{CoordinateType, SurfacePoint};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, TracingFormat};

pub use logger::{init_from_env, init_with_level, LOG_LEVEL_ENV};
