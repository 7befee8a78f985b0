use std::f64::consts::PI;

use super::{CoordinateProjector, LatLon, UtmZone};
use crate::error::{ProjectionError, Result};
use crate::math::Point2;

const K0: f64 = 0.9996;
/// WGS84 semi-major axis (meters).
const R: f64 = 6_378_137.0;
/// WGS84 first eccentricity squared.
const E: f64 = 0.006_694_38;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

const MIN_LATITUDE: f64 = -80.0;
const MAX_LATITUDE: f64 = 84.0;
const BANDS: &[u8; 21] = b"CDEFGHJKLMNPQRSTUVWXX";

/// Series coefficients derived from the ellipsoid.
#[derive(Debug, Clone, Copy)]
struct Series {
    e_p2: f64,
    m: [f64; 4],
    p: [f64; 4],
}

impl Series {
    fn wgs84() -> Self {
        let e2 = E * E;
        let e3 = e2 * E;
        let sqrt_e = (1.0 - E).sqrt();
        let n = (1.0 - sqrt_e) / (1.0 + sqrt_e);
        let (n2, n3, n4, n5) = (n * n, n.powi(3), n.powi(4), n.powi(5));
        Self {
            e_p2: E / (1.0 - E),
            m: [
                1.0 - E / 4.0 - 3.0 * e2 / 64.0 - 5.0 * e3 / 256.0,
                3.0 * E / 8.0 + 3.0 * e2 / 32.0 + 45.0 * e3 / 1024.0,
                15.0 * e2 / 256.0 + 45.0 * e3 / 1024.0,
                35.0 * e3 / 3072.0,
            ],
            p: [
                3.0 / 2.0 * n - 27.0 / 32.0 * n3 + 269.0 / 512.0 * n5,
                21.0 / 16.0 * n2 - 55.0 / 32.0 * n4,
                151.0 / 96.0 * n3 - 417.0 / 128.0 * n5,
                1097.0 / 512.0 * n4,
            ],
        }
    }
}

/// Universal Transverse Mercator on the WGS84 ellipsoid.
///
/// Zone numbers follow the standard 6° layout with the Norway (32V) and
/// Svalbard (31X/33X/35X/37X) exceptions. Valid for latitudes in
/// `[-80, 84]`.
#[derive(Debug, Clone, Copy)]
pub struct UtmProjector {
    series: Series,
}

impl Default for UtmProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtmProjector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            series: Series::wgs84(),
        }
    }
}

fn check_range(p: LatLon) -> Result<()> {
    let in_range = (MIN_LATITUDE..=MAX_LATITUDE).contains(&p.latitude)
        && (-180.0..=180.0).contains(&p.longitude);
    if in_range {
        Ok(())
    } else {
        Err(ProjectionError::OutOfRange {
            latitude: p.latitude,
            longitude: p.longitude,
        }
        .into())
    }
}

fn central_longitude(zone: u8) -> f64 {
    (f64::from(zone) - 1.0) * 6.0 - 180.0 + 3.0
}

/// Wraps an angle in radians into `[-PI, PI)`.
fn wrap_angle(value: f64) -> f64 {
    (value + PI).rem_euclid(2.0 * PI) - PI
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn zone_number(latitude: f64, longitude: f64) -> u8 {
    if (56.0..64.0).contains(&latitude) && (3.0..12.0).contains(&longitude) {
        return 32;
    }
    if (72.0..=84.0).contains(&latitude) && longitude >= 0.0 {
        if longitude < 9.0 {
            return 31;
        } else if longitude < 21.0 {
            return 33;
        } else if longitude < 33.0 {
            return 35;
        } else if longitude < 42.0 {
            return 37;
        }
    }
    (((longitude + 180.0) / 6.0).floor() as i64).rem_euclid(60) as u8 + 1
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn band_letter(latitude: f64) -> char {
    let index = ((latitude + 80.0).floor() as usize) >> 3;
    char::from(BANDS[index.min(BANDS.len() - 1)])
}

impl CoordinateProjector for UtmProjector {
    fn zone_of(&self, p: LatLon) -> Result<UtmZone> {
        check_range(p)?;
        Ok(UtmZone {
            number: zone_number(p.latitude, p.longitude),
            band: band_letter(p.latitude),
        })
    }

    fn project(&self, p: LatLon, zone: UtmZone) -> Result<Point2> {
        check_range(p)?;
        let s = &self.series;

        let lat = p.latitude.to_radians();
        let (lat_sin, lat_cos) = lat.sin_cos();
        let lat_tan = lat_sin / lat_cos;
        let lat_tan2 = lat_tan * lat_tan;
        let lat_tan4 = lat_tan2 * lat_tan2;

        let lon = p.longitude.to_radians();
        let central = central_longitude(zone.number).to_radians();

        let n = R / (1.0 - E * lat_sin * lat_sin).sqrt();
        let c = s.e_p2 * lat_cos * lat_cos;

        let a = lat_cos * wrap_angle(lon - central);
        let (a2, a3, a4, a5, a6) = (a * a, a.powi(3), a.powi(4), a.powi(5), a.powi(6));

        let m = R
            * (s.m[0] * lat - s.m[1] * (2.0 * lat).sin() + s.m[2] * (4.0 * lat).sin()
                - s.m[3] * (6.0 * lat).sin());

        let easting = K0
            * n
            * (a + a3 / 6.0 * (1.0 - lat_tan2 + c)
                + a5 / 120.0 * (5.0 - 18.0 * lat_tan2 + lat_tan4 + 72.0 * c - 58.0 * s.e_p2))
            + FALSE_EASTING;

        let mut northing = K0
            * (m + n
                * lat_tan
                * (a2 / 2.0
                    + a4 / 24.0 * (5.0 - lat_tan2 + 9.0 * c + 4.0 * c * c)
                    + a6 / 720.0
                        * (61.0 - 58.0 * lat_tan2 + lat_tan4 + 600.0 * c - 330.0 * s.e_p2)));
        if !zone.is_northern() {
            northing += FALSE_NORTHING_SOUTH;
        }

        Ok(Point2::new(easting, northing))
    }

    fn unproject(&self, p: &Point2, zone: UtmZone) -> Result<LatLon> {
        let s = &self.series;

        let x = p.x - FALSE_EASTING;
        let mut y = p.y;
        if !zone.is_northern() {
            y -= FALSE_NORTHING_SOUTH;
        }

        let mu = y / K0 / (R * s.m[0]);
        let p_rad = mu
            + s.p[0] * (2.0 * mu).sin()
            + s.p[1] * (4.0 * mu).sin()
            + s.p[2] * (6.0 * mu).sin()
            + s.p[3] * (8.0 * mu).sin();

        let (p_sin, p_cos) = p_rad.sin_cos();
        let p_tan = p_sin / p_cos;
        let p_tan2 = p_tan * p_tan;
        let p_tan4 = p_tan2 * p_tan2;

        let ep_sin = 1.0 - E * p_sin * p_sin;
        let n = R / ep_sin.sqrt();
        let r = (1.0 - E) / ep_sin;

        let c = s.e_p2 * p_cos * p_cos;
        let c2 = c * c;

        let d = x / (n * K0);
        let (d2, d3, d4, d5, d6) = (d * d, d.powi(3), d.powi(4), d.powi(5), d.powi(6));

        let latitude = p_rad
            - (p_tan / r)
                * (d2 / 2.0 - d4 / 24.0 * (5.0 + 3.0 * p_tan2 + 10.0 * c - 4.0 * c2 - 9.0 * s.e_p2)
                    + d6 / 720.0
                        * (61.0 + 90.0 * p_tan2 + 298.0 * c + 45.0 * p_tan4
                            - 252.0 * s.e_p2
                            - 3.0 * c2));

        let longitude = (d - d3 / 6.0 * (1.0 + 2.0 * p_tan2 + c)
            + d5 / 120.0 * (5.0 - 2.0 * c + 28.0 * p_tan2 - 3.0 * c2 + 8.0 * s.e_p2 + 24.0 * p_tan4))
            / p_cos;
        let longitude = wrap_angle(longitude + central_longitude(zone.number).to_radians());

        let result = LatLon::new(latitude.to_degrees(), longitude.to_degrees());
        check_range(result)?;
        Ok(result)
    }
}
