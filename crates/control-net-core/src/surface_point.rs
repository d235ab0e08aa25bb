//! Body-fixed 3-D surface coordinates with optional uncertainty.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Which coordinate triple a network uses when talking about point sigmas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateType {
    /// Latitude, longitude, local radius.
    #[default]
    Latitudinal,
    /// Body-fixed X, Y, Z.
    Rectangular,
}

impl fmt::Display for CoordinateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Latitudinal => "Latitudinal",
            Self::Rectangular => "Rectangular",
        })
    }
}

impl FromStr for CoordinateType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latitudinal" => Ok(Self::Latitudinal),
            "rectangular" => Ok(Self::Rectangular),
            _ => Err(ParseError::CoordinateType(s.to_string())),
        }
    }
}

/// A point on (or near) a target body in body-fixed rectangular coordinates.
///
/// Positions are stored in meters. The covariance, when present, is the 3x3
/// rectangular covariance in m². A default-constructed point is *invalid*:
/// it carries no position and every accessor returns `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    position: Option<Vector3<f64>>,
    covariance: Option<Matrix3<f64>>,
}

impl SurfacePoint {
    /// An invalid (unset) point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from body-fixed rectangular coordinates in meters.
    pub fn from_rectangular(x: f64, y: f64, z: f64) -> Self {
        let mut sp = Self::new();
        sp.set_rectangular(x, y, z);
        sp
    }

    /// Build from body-fixed rectangular coordinates in kilometers.
    pub fn from_rectangular_km(p: Vector3<f64>) -> Self {
        let m = p * 1000.0;
        Self::from_rectangular(m.x, m.y, m.z)
    }

    /// Build from planetocentric latitude / positive-east longitude (degrees)
    /// and local radius (meters).
    pub fn from_spherical(lat_deg: f64, lon_deg: f64, radius_m: f64) -> Self {
        let mut sp = Self::new();
        sp.set_spherical(lat_deg, lon_deg, radius_m);
        sp
    }

    /// Replace the position, keeping any covariance.
    pub fn set_rectangular(&mut self, x: f64, y: f64, z: f64) {
        let p = Vector3::new(x, y, z);
        self.position = p.iter().all(|v| v.is_finite()).then_some(p);
    }

    pub fn set_rectangular_km(&mut self, p: Vector3<f64>) {
        let m = p * 1000.0;
        self.set_rectangular(m.x, m.y, m.z);
    }

    pub fn set_spherical(&mut self, lat_deg: f64, lon_deg: f64, radius_m: f64) {
        let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
        self.set_rectangular(
            radius_m * lat.cos() * lon.cos(),
            radius_m * lat.cos() * lon.sin(),
            radius_m * lat.sin(),
        );
    }

    /// `true` once a finite position has been set.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.position.is_some()
    }

    /// Body-fixed position in meters.
    #[inline]
    pub fn rectangular(&self) -> Option<Vector3<f64>> {
        self.position
    }

    /// Body-fixed position in kilometers.
    pub fn rectangular_km(&self) -> Option<Vector3<f64>> {
        self.position.map(|p| p / 1000.0)
    }

    pub fn x(&self) -> Option<f64> {
        self.position.map(|p| p.x)
    }

    pub fn y(&self) -> Option<f64> {
        self.position.map(|p| p.y)
    }

    pub fn z(&self) -> Option<f64> {
        self.position.map(|p| p.z)
    }

    /// Planetocentric latitude in degrees.
    pub fn latitude(&self) -> Option<f64> {
        let p = self.position?;
        let rho = p.x.hypot(p.y);
        Some(p.z.atan2(rho).to_degrees())
    }

    /// Positive-east longitude in degrees, in `[0, 360)`.
    pub fn longitude(&self) -> Option<f64> {
        let p = self.position?;
        let lon = p.y.atan2(p.x).to_degrees();
        Some(if lon < 0.0 { lon + 360.0 } else { lon })
    }

    /// Distance from the body center in meters.
    pub fn local_radius(&self) -> Option<f64> {
        self.position.map(|p| p.norm())
    }

    /// Rectangular covariance in m².
    #[inline]
    pub fn rectangular_covariance(&self) -> Option<Matrix3<f64>> {
        self.covariance
    }

    pub fn set_rectangular_covariance(&mut self, covariance: Matrix3<f64>) {
        self.covariance = Some(covariance);
    }

    pub fn clear_covariance(&mut self) {
        self.covariance = None;
    }

    /// Covariance of (latitude rad, longitude rad, radius m).
    pub fn spherical_covariance(&self) -> Option<Matrix3<f64>> {
        let j = spherical_from_rectangular_jacobian(self.position?)?;
        let c = self.covariance?;
        Some(j * c * j.transpose())
    }

    /// Set the covariance from (latitude rad, longitude rad, radius m) terms.
    ///
    /// Requires a valid position; returns `false` and leaves the point
    /// untouched otherwise.
    pub fn set_spherical_covariance(&mut self, covariance: Matrix3<f64>) -> bool {
        let Some(p) = self.position else {
            return false;
        };
        let a = rectangular_from_spherical_jacobian(p);
        self.covariance = Some(a * covariance * a.transpose());
        true
    }

    /// Diagonal rectangular covariance from per-axis sigmas in meters.
    pub fn set_rectangular_sigmas(&mut self, x_sigma: f64, y_sigma: f64, z_sigma: f64) {
        self.covariance = Some(Matrix3::from_diagonal(&Vector3::new(
            x_sigma * x_sigma,
            y_sigma * y_sigma,
            z_sigma * z_sigma,
        )));
    }

    /// Spherical sigmas given as ground distances in meters.
    ///
    /// Latitude and longitude sigmas are converted to angles using the local
    /// radius (and `cos(lat)` for longitude).
    pub fn set_spherical_sigmas_distance(
        &mut self,
        lat_sigma_m: f64,
        lon_sigma_m: f64,
        radius_sigma_m: f64,
    ) -> bool {
        let (Some(lat), Some(r)) = (self.latitude(), self.local_radius()) else {
            return false;
        };
        if r <= 0.0 {
            return false;
        }
        let cos_lat = lat.to_radians().cos();
        let lat_rad = lat_sigma_m / r;
        let lon_rad = if cos_lat.abs() > f64::EPSILON {
            lon_sigma_m / (r * cos_lat)
        } else {
            0.0
        };
        let diag = Vector3::new(
            lat_rad * lat_rad,
            lon_rad * lon_rad,
            radius_sigma_m * radius_sigma_m,
        );
        self.set_spherical_covariance(Matrix3::from_diagonal(&diag))
    }

    pub fn x_sigma(&self) -> Option<f64> {
        positive_sqrt(self.covariance?[(0, 0)])
    }

    pub fn y_sigma(&self) -> Option<f64> {
        positive_sqrt(self.covariance?[(1, 1)])
    }

    pub fn z_sigma(&self) -> Option<f64> {
        positive_sqrt(self.covariance?[(2, 2)])
    }

    /// Latitude sigma as a ground distance in meters.
    pub fn lat_sigma_distance(&self) -> Option<f64> {
        let s = positive_sqrt(self.spherical_covariance()?[(0, 0)])?;
        Some(s * self.local_radius()?)
    }

    /// Longitude sigma as a ground distance in meters.
    pub fn lon_sigma_distance(&self) -> Option<f64> {
        let s = positive_sqrt(self.spherical_covariance()?[(1, 1)])?;
        let cos_lat = self.latitude()?.to_radians().cos();
        Some(s * self.local_radius()? * cos_lat)
    }

    pub fn local_radius_sigma(&self) -> Option<f64> {
        positive_sqrt(self.spherical_covariance()?[(2, 2)])
    }

    /// Sigma of coordinate `index` (0..3) in the given coordinate system.
    pub fn coord_sigma(&self, coord_type: CoordinateType, index: usize) -> Option<f64> {
        match (coord_type, index) {
            (CoordinateType::Latitudinal, 0) => self.lat_sigma_distance(),
            (CoordinateType::Latitudinal, 1) => self.lon_sigma_distance(),
            (CoordinateType::Latitudinal, 2) => self.local_radius_sigma(),
            (CoordinateType::Rectangular, 0) => self.x_sigma(),
            (CoordinateType::Rectangular, 1) => self.y_sigma(),
            (CoordinateType::Rectangular, 2) => self.z_sigma(),
            _ => None,
        }
    }
}

fn positive_sqrt(variance: f64) -> Option<f64> {
    (variance.is_finite() && variance > 0.0).then(|| variance.sqrt())
}

/// d(lat, lon, r) / d(x, y, z). Undefined on the polar axis.
fn spherical_from_rectangular_jacobian(p: Vector3<f64>) -> Option<Matrix3<f64>> {
    let rho2 = p.x * p.x + p.y * p.y;
    let rho = rho2.sqrt();
    let r2 = rho2 + p.z * p.z;
    let r = r2.sqrt();
    if rho < 1e-12 || r < 1e-12 {
        return None;
    }

    Some(Matrix3::new(
        -p.x * p.z / (r2 * rho),
        -p.y * p.z / (r2 * rho),
        rho / r2, //
        -p.y / rho2,
        p.x / rho2,
        0.0, //
        p.x / r,
        p.y / r,
        p.z / r,
    ))
}

/// d(x, y, z) / d(lat, lon, r).
fn rectangular_from_spherical_jacobian(p: Vector3<f64>) -> Matrix3<f64> {
    let r = p.norm();
    let lat = p.z.atan2(p.x.hypot(p.y));
    let lon = p.y.atan2(p.x);
    let (slat, clat) = lat.sin_cos();
    let (slon, clon) = lon.sin_cos();

    Matrix3::new(
        -r * slat * clon,
        -r * clat * slon,
        clat * clon, //
        -r * slat * slon,
        r * clat * clon,
        clat * slon, //
        r * clat,
        0.0,
        slat,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unset_point_is_invalid() {
        let sp = SurfacePoint::new();
        assert!(!sp.is_valid());
        assert!(sp.latitude().is_none());
        assert!(sp.x_sigma().is_none());
    }

    #[test]
    fn non_finite_coordinates_leave_point_invalid() {
        let sp = SurfacePoint::from_rectangular(f64::NAN, 0.0, 1.0);
        assert!(!sp.is_valid());
    }

    #[test]
    fn spherical_and_rectangular_agree() {
        let sp = SurfacePoint::from_spherical(30.0, 270.0, 1_737_400.0);
        assert_relative_eq!(sp.latitude().unwrap(), 30.0, epsilon = 1e-9);
        assert_relative_eq!(sp.longitude().unwrap(), 270.0, epsilon = 1e-9);
        assert_relative_eq!(sp.local_radius().unwrap(), 1_737_400.0, epsilon = 1e-6);
        assert!(sp.x().unwrap().abs() < 1e-6);
        assert!(sp.y().unwrap() < 0.0);
    }

    #[test]
    fn kilometer_helpers_scale_by_one_thousand() {
        let sp = SurfacePoint::from_rectangular_km(Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(sp.x().unwrap(), 1000.0);
        assert_relative_eq!(sp.rectangular_km().unwrap(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn spherical_covariance_survives_conversion() {
        let mut sp = SurfacePoint::from_spherical(12.0, 45.0, 3_390_000.0);
        let lat_var = (5.0e-6_f64).powi(2);
        let lon_var = (7.0e-6_f64).powi(2);
        let rad_var = 25.0_f64.powi(2);
        let sph = Matrix3::from_diagonal(&Vector3::new(lat_var, lon_var, rad_var));
        assert!(sp.set_spherical_covariance(sph));

        let back = sp.spherical_covariance().unwrap();
        assert_relative_eq!(back[(0, 0)], lat_var, max_relative = 1e-6);
        assert_relative_eq!(back[(1, 1)], lon_var, max_relative = 1e-6);
        assert_relative_eq!(back[(2, 2)], rad_var, max_relative = 1e-6);
        assert!(back[(0, 1)].abs() < 1e-18);
    }

    #[test]
    fn distance_sigmas_are_recovered() {
        let mut sp = SurfacePoint::from_spherical(-20.0, 100.0, 1_000_000.0);
        assert!(sp.set_spherical_sigmas_distance(10.0, 20.0, 30.0));
        assert_relative_eq!(sp.lat_sigma_distance().unwrap(), 10.0, max_relative = 1e-6);
        assert_relative_eq!(sp.lon_sigma_distance().unwrap(), 20.0, max_relative = 1e-6);
        assert_relative_eq!(sp.local_radius_sigma().unwrap(), 30.0, max_relative = 1e-6);
        assert_eq!(
            sp.coord_sigma(CoordinateType::Latitudinal, 2),
            sp.local_radius_sigma()
        );
    }

    #[test]
    fn rectangular_sigmas_populate_diagonal() {
        let mut sp = SurfacePoint::from_rectangular(1.0, 2.0, 3.0);
        sp.set_rectangular_sigmas(1.0, 0.0, 3.0);
        assert_eq!(sp.x_sigma(), Some(1.0));
        assert_eq!(sp.y_sigma(), None);
        assert_eq!(sp.coord_sigma(CoordinateType::Rectangular, 2), Some(3.0));
        assert_eq!(sp.coord_sigma(CoordinateType::Rectangular, 3), None);
    }

    #[test]
    fn coordinate_type_parses_from_name() {
        assert_eq!(
            "rectangular".parse::<CoordinateType>().unwrap(),
            CoordinateType::Rectangular
        );
        assert!("polar".parse::<CoordinateType>().is_err());
    }
}
