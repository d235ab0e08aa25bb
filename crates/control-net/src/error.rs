//! Error taxonomy and routine status codes.
//!
//! Two channels are kept apart on purpose: [`Status`] / [`MeasureStatus`] are
//! ordinary return values the caller branches on (edit locks, ignored
//! points), while [`ControlError`] reports contract violations and data
//! problems the caller is expected to catch per point.

/// Outcome of a point-level setter or computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Failure,
    Success,
    PointLocked,
}

/// Outcome of a measure-level setter or deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeasureStatus {
    Success,
    MeasureLocked,
}

/// Who is at fault for a [`ControlError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The calling code broke a contract.
    Programmer,
    /// The data or workflow is unusable as given.
    User,
}

/// Errors raised by control points and measures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error("serial number [{serial}] is not unique, a measure with it already exists in control point [{point_id}]")]
    DuplicateSerial { point_id: String, serial: String },
    #[error("control point [{point_id}] has no measure with serial number [{serial}]")]
    MeasureNotFound { point_id: String, serial: String },
    #[error("index {index} is out of range for control point [{point_id}] with {len} measures")]
    IndexOutOfRange {
        point_id: String,
        index: usize,
        len: usize,
    },
    #[error("invalid point type enumeration [{0}]")]
    InvalidPointType(i32),
    #[error("control point [{point_id}] has no measures")]
    NoMeasures { point_id: String },
    #[error("camera must be set on measure [{serial}] of control point [{point_id}] before projecting")]
    MissingCamera { point_id: String, serial: String },
    #[error("focal plane conversion of the {stage} coordinate failed for control point [{point_id}], measure [{serial}]")]
    FocalPlaneConversion {
        point_id: String,
        serial: String,
        stage: &'static str,
    },
    #[error("control point [{point_id}] is not attached to a network")]
    NetworkDetached { point_id: String },
    #[error("control point [{point_id}] is fixed or constrained and requires a-priori coordinates")]
    MissingApriori { point_id: String },
    #[error("control point [{point_id}] has no measures which project to the body")]
    NoProjectingMeasures { point_id: String },
    #[error("control point [{point_id}] does not map into the image of measure [{serial}]")]
    DoesNotMapIntoImage { point_id: String, serial: String },
    #[error("cannot derive the radar doppler-to-line scale for control point [{point_id}], measure [{serial}]")]
    RadarLineScale { point_id: String, serial: String },
    #[error("unknown point type [{0}]")]
    UnknownPointType(String),
    #[error("unknown {kind} source [{value}]")]
    UnknownSource { kind: &'static str, value: String },
    #[error("unknown measure type [{0}]")]
    UnknownMeasureType(String),
    #[error("measure [{serial}] has no containing point")]
    NoContainingPoint { serial: String },
}

impl ControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateSerial { .. }
            | Self::MeasureNotFound { .. }
            | Self::IndexOutOfRange { .. }
            | Self::InvalidPointType(_)
            | Self::NoMeasures { .. }
            | Self::MissingCamera { .. }
            | Self::FocalPlaneConversion { .. }
            | Self::NetworkDetached { .. } => ErrorKind::Programmer,
            Self::MissingApriori { .. }
            | Self::NoProjectingMeasures { .. }
            | Self::DoesNotMapIntoImage { .. }
            | Self::RadarLineScale { .. }
            | Self::UnknownPointType(_)
            | Self::UnknownSource { .. }
            | Self::UnknownMeasureType(_)
            | Self::NoContainingPoint { .. } => ErrorKind::User,
        }
    }

    #[inline]
    pub fn is_programmer(&self) -> bool {
        self.kind() == ErrorKind::Programmer
    }

    #[inline]
    pub fn is_user(&self) -> bool {
        self.kind() == ErrorKind::User
    }
}
