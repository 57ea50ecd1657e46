//! Z-order geohash cells used to partition the geo index table.
//!
//! A point is quantized to 32 bits of longitude and 32 bits of latitude, and
//! the bits are interleaved (longitude first) into a 64-bit geohash. The
//! partition ("hash key") of a point is the geohash's leading
//! `5 * hash_key_length` bits, the same precision as a base-32 geohash string
//! of `hash_key_length` characters. With the default length of 5 a cell is
//! roughly 4.9 km by 4.9 km at the equator.
//!
//! Cells narrow towards the poles, so away from the equator neighbouring
//! cells of a latitude row are merged: a row whose equator-side edge is at
//! latitude `φ` drops the low `floor(log2(1 / cos φ))` longitude bits of its
//! keys. A merged cell is keyed by its first fine cell, and its east-west
//! width stays between half and all of the equatorial cell width.
//!
//! A radius query covers the circle's bounding box with hash key cells, reads
//! every cell, and filters the candidates by great-circle distance.
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::GeoPoint;

/// Hash key length the handlers are deployed with.
pub const DEFAULT_HASH_KEY_LENGTH: u8 = 5;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Upper bound on the number of partitions a single radius query may read.
pub const MAX_COVERING_CELLS: usize = 4096;

/// Longest supported hash key. Any search up to
/// [`MAX_SEARCH_RADIUS_METERS`](crate::service::MAX_SEARCH_RADIUS_METERS)
/// stays within [`MAX_COVERING_CELLS`] at this length or shorter.
pub const MAX_HASH_KEY_LENGTH: u8 = 5;

/// Compute the 64-bit interleaved geohash of a point.
pub fn encode(point: GeoPoint) -> u64 {
    let lat = quantize(point.latitude, -90.0, 90.0);
    let lng = quantize(point.longitude, -180.0, 180.0);

    let mut code = 0u64;
    for bit in (0..32).rev() {
        code = (code << 1) | u64::from((lng >> bit) & 1);
        code = (code << 1) | u64::from((lat >> bit) & 1);
    }
    code
}

/// Partition key of a geohash for the given hash key length.
pub fn hash_key(geohash: u64, hash_key_length: u8) -> Result<u64> {
    let bits = key_bits(hash_key_length)?;
    let (lng_bits, lat_bits) = split_bits(bits);
    let (lng, lat) = deinterleave(geohash >> (64 - bits), lng_bits, lat_bits);
    let shift = longitude_shift(lat, lng_bits, lat_bits);
    Ok(interleave((lng >> shift) << shift, lat, lng_bits, lat_bits))
}

/// Hash keys of every cell that may contain a point within `radius_meters`
/// of `center`, sorted ascending.
pub fn covering_hash_keys(
    center: GeoPoint,
    radius_meters: f64,
    hash_key_length: u8,
) -> Result<Vec<u64>> {
    let bits = key_bits(hash_key_length)?;
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err(Error::InvalidRadius { radius_meters });
    }
    let (lng_bits, lat_bits) = split_bits(bits);

    let delta_lat = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    let min_lat = (center.latitude - delta_lat).max(-90.0);
    let max_lat = (center.latitude + delta_lat).min(90.0);

    let widest_lat = min_lat.abs().max(max_lat.abs());
    let lng_ranges = if widest_lat >= 90.0 {
        vec![(-180.0, 180.0)]
    } else {
        let delta_lng = delta_lat / widest_lat.to_radians().cos();
        if delta_lng >= 180.0 {
            vec![(-180.0, 180.0)]
        } else {
            split_longitude_range(center.longitude - delta_lng, center.longitude + delta_lng)
        }
    };

    let lat_first = cell_index(min_lat, -90.0, 90.0, lat_bits);
    let lat_last = cell_index(max_lat, -90.0, 90.0, lat_bits);
    let lng_spans: Vec<(u64, u64)> = lng_ranges
        .iter()
        .map(|&(lo, hi)| {
            (
                cell_index(lo, -180.0, 180.0, lng_bits),
                cell_index(hi, -180.0, 180.0, lng_bits),
            )
        })
        .collect();

    let rows: Vec<(u64, u32)> = (lat_first..=lat_last)
        .map(|lat| (lat, longitude_shift(lat, lng_bits, lat_bits)))
        .collect();
    let cells: u64 = rows
        .iter()
        .map(|&(_, shift)| {
            lng_spans
                .iter()
                .map(|&(lo, hi)| (hi >> shift) - (lo >> shift) + 1)
                .sum::<u64>()
        })
        .sum();
    let cells = usize::try_from(cells).unwrap_or(usize::MAX);
    if cells > MAX_COVERING_CELLS {
        return Err(Error::QueryTooBroad {
            radius_meters,
            cells,
            limit: MAX_COVERING_CELLS,
        });
    }

    let mut keys = BTreeSet::new();
    for &(lat, shift) in &rows {
        for &(lng_first, lng_last) in &lng_spans {
            for lng in (lng_first >> shift)..=(lng_last >> shift) {
                keys.insert(interleave(lng << shift, lat, lng_bits, lat_bits));
            }
        }
    }
    Ok(keys.into_iter().collect())
}

/// Great-circle distance between two points in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

fn key_bits(hash_key_length: u8) -> Result<u32> {
    if hash_key_length == 0 || hash_key_length > MAX_HASH_KEY_LENGTH {
        return Err(Error::InvalidHashKeyLength {
            length: hash_key_length,
        });
    }
    Ok(u32::from(hash_key_length) * 5)
}

/// Longitude and latitude bit counts of a key of `bits` bits.
fn split_bits(bits: u32) -> (u32, u32) {
    (bits.div_ceil(2), bits / 2)
}

/// Number of low longitude bits merged away in latitude row `lat`.
fn longitude_shift(lat: u64, lng_bits: u32, lat_bits: u32) -> u32 {
    let height = 180.0 / (1u64 << lat_bits) as f64;
    let south = -90.0 + lat as f64 * height;
    let north = south + height;
    let equator_side = if south < 0.0 && north > 0.0 {
        0.0
    } else {
        south.abs().min(north.abs())
    };
    let widening = 1.0 / equator_side.to_radians().cos();
    (widening.log2().floor().max(0.0) as u32).min(lng_bits)
}

fn quantize(value: f64, min: f64, max: f64) -> u32 {
    let scaled = ((value - min) / (max - min) * 4_294_967_296.0).floor();
    scaled.clamp(0.0, f64::from(u32::MAX)) as u32
}

fn cell_index(value: f64, min: f64, max: f64, bits: u32) -> u64 {
    let cells = 1u64 << bits;
    let scaled = ((value - min) / (max - min) * cells as f64).floor();
    scaled.clamp(0.0, (cells - 1) as f64) as u64
}

/// Interleave cell indices the same way [`encode`] interleaves point bits.
fn interleave(lng: u64, lat: u64, lng_bits: u32, lat_bits: u32) -> u64 {
    let mut key = 0u64;
    for bit in 0..(lng_bits + lat_bits) {
        let source = if bit % 2 == 0 {
            (lng >> (lng_bits - 1 - bit / 2)) & 1
        } else {
            (lat >> (lat_bits - 1 - bit / 2)) & 1
        };
        key = (key << 1) | source;
    }
    key
}

/// Inverse of [`interleave`].
fn deinterleave(key: u64, lng_bits: u32, lat_bits: u32) -> (u64, u64) {
    let total = lng_bits + lat_bits;
    let (mut lng, mut lat) = (0u64, 0u64);
    for bit in 0..total {
        let value = (key >> (total - 1 - bit)) & 1;
        if bit % 2 == 0 {
            lng = (lng << 1) | value;
        } else {
            lat = (lat << 1) | value;
        }
    }
    (lng, lat)
}

/// Split a longitude interval that may cross the antimeridian.
fn split_longitude_range(lo: f64, hi: f64) -> Vec<(f64, f64)> {
    if lo < -180.0 {
        vec![(lo + 360.0, 180.0), (-180.0, hi)]
    } else if hi > 180.0 {
        vec![(lo, 180.0), (-180.0, hi - 360.0)]
    } else {
        vec![(lo, hi)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MAX_SEARCH_RADIUS_METERS;

    fn springfield() -> GeoPoint {
        GeoPoint::new(39.78, -89.65)
    }

    #[test]
    fn encode_orders_extremes() {
        assert_eq!(encode(GeoPoint::new(-90.0, -180.0)), 0);
        assert_eq!(encode(GeoPoint::new(90.0, 180.0)), u64::MAX);
    }

    #[test]
    fn hash_key_has_expected_width() {
        let key = hash_key(encode(springfield()), 5).unwrap();
        assert!(key < (1 << 25));
    }

    #[test]
    fn hash_key_rejects_bad_lengths() {
        assert!(matches!(
            hash_key(0, 0),
            Err(Error::InvalidHashKeyLength { length: 0 })
        ));
        assert!(hash_key(0, MAX_HASH_KEY_LENGTH + 1).is_err());
        assert!(hash_key(0, MAX_HASH_KEY_LENGTH).is_ok());
    }

    #[test]
    fn hash_key_is_geohash_prefix_at_mid_latitudes() {
        let geohash = encode(springfield());
        assert_eq!(hash_key(geohash, 5).unwrap(), geohash >> 39);
    }

    #[test]
    fn hash_key_merges_cells_near_the_pole() {
        let a = hash_key(encode(GeoPoint::new(89.99, 1.0)), 5).unwrap();
        let b = hash_key(encode(GeoPoint::new(89.99, 40.0)), 5).unwrap();
        let c = hash_key(encode(GeoPoint::new(89.99, -100.0)), 5).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let south = hash_key(encode(GeoPoint::new(-89.99, 1.0)), 5).unwrap();
        assert_eq!(
            south,
            hash_key(encode(GeoPoint::new(-89.99, 40.0)), 5).unwrap()
        );
    }

    #[test]
    fn covering_cells_include_center_cell() {
        let center = springfield();
        let own = hash_key(encode(center), 5).unwrap();
        let keys = covering_hash_keys(center, 1000.0, 5).unwrap();
        assert!(keys.contains(&own));
    }

    #[test]
    fn covering_cells_include_points_on_the_circle() {
        let center = springfield();
        let radius = 5000.0;
        let keys = covering_hash_keys(center, radius, 5).unwrap();
        let delta = (radius / EARTH_RADIUS_METERS).to_degrees() * 0.99;
        let lng_delta = delta / center.latitude.to_radians().cos();
        for point in [
            GeoPoint::new(center.latitude + delta, center.longitude),
            GeoPoint::new(center.latitude - delta, center.longitude),
            GeoPoint::new(center.latitude, center.longitude + lng_delta),
            GeoPoint::new(center.latitude, center.longitude - lng_delta),
        ] {
            let key = hash_key(encode(point), 5).unwrap();
            assert!(keys.contains(&key), "missing cell for {point:?}");
        }
    }

    #[test]
    fn covering_cells_wrap_the_antimeridian() {
        let center = GeoPoint::new(0.0, 179.99);
        let keys = covering_hash_keys(center, 5000.0, 5).unwrap();
        let west = hash_key(encode(GeoPoint::new(0.0, -179.99)), 5).unwrap();
        assert!(keys.contains(&west));
    }

    #[test]
    fn covering_cells_near_pole_span_all_longitudes() {
        let keys = covering_hash_keys(GeoPoint::new(89.99, 0.0), 5000.0, 2).unwrap();
        let far_side = hash_key(encode(GeoPoint::new(89.99, 179.0)), 2).unwrap();
        assert!(keys.contains(&far_side));
    }

    #[test]
    fn covering_cells_reject_huge_radius() {
        let err = covering_hash_keys(springfield(), 2_000_000.0, 5).unwrap_err();
        assert!(matches!(err, Error::QueryTooBroad { .. }));
    }

    #[test]
    fn covering_cells_reject_invalid_radius() {
        for radius in [-1000.0, 0.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    covering_hash_keys(springfield(), radius, 5),
                    Err(Error::InvalidRadius { .. })
                ),
                "radius {radius}"
            );
        }
    }

    /// Point `meters` away from `from` along the initial `bearing` in degrees.
    fn destination(from: GeoPoint, bearing: f64, meters: f64) -> GeoPoint {
        let d = meters / EARTH_RADIUS_METERS;
        let lat1 = from.latitude.to_radians();
        let lng1 = from.longitude.to_radians();
        let theta = bearing.to_radians();
        let sin_lat2 = lat1.sin() * d.cos() + lat1.cos() * d.sin() * theta.cos();
        let lat2 = sin_lat2.asin();
        let y = theta.sin() * d.sin() * lat1.cos();
        let x = d.cos() - lat1.sin() * sin_lat2;
        let lng2 = (lng1 + y.atan2(x)).to_degrees();
        let lng2 = (lng2 + 540.0).rem_euclid(360.0) - 180.0;
        GeoPoint::new(lat2.to_degrees(), lng2)
    }

    #[test]
    fn covering_cells_contain_the_circle_everywhere() {
        let radius = MAX_SEARCH_RADIUS_METERS;
        for center in [
            springfield(),
            GeoPoint::new(0.0, 179.9),
            GeoPoint::new(85.0, 10.0),
            GeoPoint::new(89.6, -45.0),
            GeoPoint::new(89.99, 10.0),
            GeoPoint::new(-88.0, -179.95),
        ] {
            let keys = covering_hash_keys(center, radius, 5).unwrap();
            for bearing in (0..360).step_by(15) {
                for fraction in [0.25, 0.6, 0.99] {
                    let point = destination(center, f64::from(bearing), radius * fraction);
                    let key = hash_key(encode(point), 5).unwrap();
                    assert!(
                        keys.contains(&key),
                        "center {center:?} misses {point:?} at bearing {bearing}"
                    );
                }
            }
        }
    }

    #[test]
    fn largest_search_fits_the_cell_budget_at_any_latitude() {
        let mut latitudes: Vec<f64> = (-180..=180).map(|half| f64::from(half) / 2.0).collect();
        latitudes.extend([89.407, 89.55, 89.857, 89.99, -89.407, -89.99]);
        for latitude in latitudes {
            for longitude in [0.0, 179.9, -179.9] {
                let center = GeoPoint::new(latitude, longitude);
                for length in 1..=MAX_HASH_KEY_LENGTH {
                    let result = covering_hash_keys(center, MAX_SEARCH_RADIUS_METERS, length);
                    assert!(result.is_ok(), "{center:?} at length {length}: {result:?}");
                }
            }
        }
    }

    #[test]
    fn haversine_known_distance() {
        // Springfield, IL to Chicago, IL is roughly 289 km.
        let chicago = GeoPoint::new(41.8781, -87.6298);
        let d = haversine_meters(springfield(), chicago);
        assert!((280_000.0..300_000.0).contains(&d), "distance was {d}");
        assert_eq!(haversine_meters(chicago, chicago), 0.0);
    }
}
