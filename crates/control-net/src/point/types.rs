use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ControlError;

/// How strongly a point's ground coordinates are held during adjustment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointType {
    /// Held at its a-priori coordinates.
    Fixed = 0,
    /// Free to move within a-priori sigmas.
    Constrained = 1,
    /// Coordinates solved from the measures alone.
    #[default]
    Free = 2,
}

impl PointType {
    pub const ALL: [PointType; 3] = [Self::Fixed, Self::Constrained, Self::Free];
}

impl TryFrom<i32> for PointType {
    type Error = ControlError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Fixed),
            1 => Ok(Self::Constrained),
            2 => Ok(Self::Free),
            other => Err(ControlError::InvalidPointType(other)),
        }
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fixed => "Fixed",
            Self::Constrained => "Constrained",
            Self::Free => "Free",
        })
    }
}

impl FromStr for PointType {
    type Err = ControlError;

    /// Accepts the legacy names `Ground` and `Tie` as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "ground" => Ok(Self::Fixed),
            "constrained" => Ok(Self::Constrained),
            "free" | "tie" => Ok(Self::Free),
            _ => Err(ControlError::UnknownPointType(s.to_string())),
        }
    }
}

/// Where a point's a-priori ground coordinate came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfacePointSource {
    #[default]
    None,
    User,
    AverageOfMeasures,
    Reference,
    Basemap,
    BundleSolution,
}

impl fmt::Display for SurfacePointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::User => "User",
            Self::AverageOfMeasures => "AverageOfMeasures",
            Self::Reference => "Reference",
            Self::Basemap => "Basemap",
            Self::BundleSolution => "BundleSolution",
        })
    }
}

impl FromStr for SurfacePointSource {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "user" => Ok(Self::User),
            "averageofmeasures" => Ok(Self::AverageOfMeasures),
            "reference" => Ok(Self::Reference),
            "basemap" => Ok(Self::Basemap),
            "bundlesolution" => Ok(Self::BundleSolution),
            _ => Err(ControlError::UnknownSource {
                kind: "surface point",
                value: s.to_string(),
            }),
        }
    }
}

/// Where a point's a-priori radius came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadiusSource {
    #[default]
    None,
    User,
    AverageOfMeasures,
    Ellipsoid,
    #[serde(rename = "DEM")]
    Dem,
    BundleSolution,
}

impl fmt::Display for RadiusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::User => "User",
            Self::AverageOfMeasures => "AverageOfMeasures",
            Self::Ellipsoid => "Ellipsoid",
            Self::Dem => "DEM",
            Self::BundleSolution => "BundleSolution",
        })
    }
}

impl FromStr for RadiusSource {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "user" => Ok(Self::User),
            "averageofmeasures" => Ok(Self::AverageOfMeasures),
            "ellipsoid" => Ok(Self::Ellipsoid),
            "dem" => Ok(Self::Dem),
            "bundlesolution" => Ok(Self::BundleSolution),
            _ => Err(ControlError::UnknownSource {
                kind: "radius",
                value: s.to_string(),
            }),
        }
    }
}

/// Which a-priori coordinates carry a sigma, by coordinate index.
///
/// Bits are set when sigmas are supplied and never cleared by later
/// a-priori updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct ConstraintStatus(u8);

impl ConstraintStatus {
    #[inline]
    pub(crate) fn set(&mut self, index: usize) {
        debug_assert!(index < 3);
        self.0 |= 1 << index;
    }

    #[inline]
    pub(crate) fn test(self, index: usize) -> bool {
        self.0 & (1 << index) != 0
    }

    #[inline]
    pub(crate) fn count(self) -> usize {
        self.0.count_ones() as usize
    }
}
