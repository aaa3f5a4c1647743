//! # Geographic Projection
//!
//! Maps world block coordinates on the X/Z plane to longitude/latitude and
//! back. TERRA only consumes projections through [`GeographicProjection`];
//! [`EquirectangularProjection`] is the reference implementation used by
//! the default configuration and the tests.

use std::fmt::Debug;

use terra_core::Bounds2d;

use crate::error::{DatasetError, DatasetResult};

/// Projection between world coordinates and geographic coordinates.
pub trait GeographicProjection: Send + Sync + Debug {
    /// Converts world `(x, z)` to `(longitude, latitude)` in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::OutOfProjectionDomain`] if the point has no
    /// geographic equivalent.
    fn to_geo(&self, x: f64, z: f64) -> DatasetResult<(f64, f64)>;

    /// Converts `(longitude, latitude)` in degrees to world `(x, z)`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::OutOfProjectionDomain`] if the coordinates are
    /// not valid for this projection.
    fn from_geo(&self, lon: f64, lat: f64) -> DatasetResult<(f64, f64)>;

    /// World-space box covering the whole projected globe.
    fn bounds(&self) -> Bounds2d;
}

/// Longitude/latitude extent of a world-space box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    /// Western edge.
    pub lon_min: f64,
    /// Eastern edge.
    pub lon_max: f64,
    /// Southern edge.
    pub lat_min: f64,
    /// Northern edge.
    pub lat_max: f64,
}

/// Projects the four corners of `bounds` and returns their geographic extent.
///
/// # Errors
///
/// Fails if any corner is outside the projection domain.
pub fn geo_bounds(projection: &dyn GeographicProjection, bounds: &Bounds2d) -> DatasetResult<GeoBounds> {
    let corners = [
        (bounds.min_x(), bounds.min_z()),
        (bounds.max_x(), bounds.min_z()),
        (bounds.min_x(), bounds.max_z()),
        (bounds.max_x(), bounds.max_z()),
    ];

    let mut out = GeoBounds {
        lon_min: f64::INFINITY,
        lon_max: f64::NEG_INFINITY,
        lat_min: f64::INFINITY,
        lat_max: f64::NEG_INFINITY,
    };
    for (x, z) in corners {
        let (lon, lat) = projection.to_geo(x, z)?;
        out.lon_min = out.lon_min.min(lon);
        out.lon_max = out.lon_max.max(lon);
        out.lat_min = out.lat_min.min(lat);
        out.lat_max = out.lat_max.max(lat);
    }
    Ok(out)
}

/// Plate carrée: one degree is `scale` blocks on both axes.
///
/// Longitude grows with X; latitude grows towards negative Z (north).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquirectangularProjection {
    scale: f64,
}

impl EquirectangularProjection {
    /// Creates a projection with `scale` blocks per degree.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidConfig`] if `scale` is not a positive
    /// finite number.
    pub fn new(scale: f64) -> DatasetResult<Self> {
        if scale.is_finite() && scale > 0.0 {
            Ok(Self { scale })
        } else {
            Err(DatasetError::InvalidConfig(format!("projection scale must be positive, got {scale}")))
        }
    }

    /// Blocks per degree.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }
}

impl GeographicProjection for EquirectangularProjection {
    fn to_geo(&self, x: f64, z: f64) -> DatasetResult<(f64, f64)> {
        let lon = x / self.scale;
        // + 0.0 normalizes -0.0 so expanded URLs never print "-0"
        let lat = -z / self.scale + 0.0;
        if (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat) {
            Ok((lon, lat))
        } else {
            Err(DatasetError::OutOfProjectionDomain { x, z })
        }
    }

    fn from_geo(&self, lon: f64, lat: f64) -> DatasetResult<(f64, f64)> {
        if (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat) {
            Ok((lon * self.scale, -lat * self.scale + 0.0))
        } else {
            Err(DatasetError::OutOfProjectionDomain { x: lon, z: lat })
        }
    }

    fn bounds(&self) -> Bounds2d {
        Bounds2d::of(
            -180.0 * self.scale,
            180.0 * self.scale,
            -90.0 * self.scale,
            90.0 * self.scale,
        )
    }
}
