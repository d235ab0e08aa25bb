/// Failure to parse one of the core enumerations from its name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown coordinate type [{0}]")]
    CoordinateType(String),
    #[error("unknown camera type [{0}]")]
    CameraType(String),
}
