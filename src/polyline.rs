//! Polyline representation for route geometries.
//!
//! Route geometry arrives from the directions service as an encoded polyline
//! carrying three channels per point: latitude, longitude and elevation.
//! Each channel is scaled to an integer (1e5 for latitude/longitude, 1e2 for
//! elevation), delta-encoded against the previous point and written as a
//! sequence of 5-bit chunks offset by 63, as in Google's polyline algorithm.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::haversine::Point;

/// Scale factor for latitude and longitude.
pub const LAT_LNG_FACTOR: f64 = 1e5;

/// Scale factor for elevation.
pub const ELEVATION_FACTOR: f64 = 1e2;

const CHUNK_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
const MAX_SHIFT: u32 = 60;

/// Largest magnitude a scaled channel value may have when encoding.
///
/// Keeps every delta exactly representable and within what [`decode`]
/// accepts.
pub const MAX_SCALED_VALUE: i64 = 1 << 52;

/// A decoded point of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub elevation: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }

    pub fn lat_lng(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// The channel a value belongs to within one encoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Latitude,
    Longitude,
    Elevation,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Latitude => "latitude",
            Channel::Longitude => "longitude",
            Channel::Elevation => "elevation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended inside a value or before a record was complete.
    Truncated { offset: usize, channel: Channel },
    /// Byte outside the `?`..=`~` alphabet.
    InvalidCharacter { offset: usize, byte: u8 },
    /// A value or a running total does not fit in 64 bits.
    Overflow { offset: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { offset, channel } => {
                write!(f, "polyline truncated at byte {} while reading {}", offset, channel)
            }
            DecodeError::InvalidCharacter { offset, byte } => {
                write!(f, "invalid polyline byte 0x{:02x} at offset {}", byte, offset)
            }
            DecodeError::Overflow { offset } => {
                write!(f, "polyline value overflows at byte {}", offset)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A NaN or infinite component.
    NonFinite { index: usize, channel: Channel },
    /// The scaled value exceeds [`MAX_SCALED_VALUE`].
    OutOfRange { index: usize, channel: Channel },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::NonFinite { index, channel } => {
                write!(f, "coordinate {} {} is not finite", index, channel)
            }
            EncodeError::OutOfRange { index, channel } => {
                write!(f, "coordinate {} {} is outside the encodable range", index, channel)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Decode an elevation-aware polyline into coordinates.
///
/// An empty string yields an empty sequence. Malformed input is reported
/// as a [`DecodeError`]; the decoder never reads past the end of `encoded`.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::with_capacity(bytes.len() / 6);
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut ele: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, &mut index, bytes, Channel::Latitude)?;
        lng = accumulate(lng, &mut index, bytes, Channel::Longitude)?;
        ele = accumulate(ele, &mut index, bytes, Channel::Elevation)?;

        coordinates.push(Coordinate {
            latitude: lat as f64 / LAT_LNG_FACTOR,
            longitude: lng as f64 / LAT_LNG_FACTOR,
            elevation: ele as f64 / ELEVATION_FACTOR,
        });
    }

    Ok(coordinates)
}

/// Latitude/longitude pairs for drawing the route on a map.
pub fn to_map_coordinates(encoded: &str) -> Result<Vec<[f64; 2]>, DecodeError> {
    Ok(decode(encoded)?.iter().map(Coordinate::lat_lng).collect())
}

/// Full coordinates for an elevation chart.
pub fn to_elevation_profile(encoded: &str) -> Result<Vec<Coordinate>, DecodeError> {
    decode(encoded)
}

/// Encode coordinates in the elevation-aware polyline format.
///
/// Each channel is rounded to its precision before delta encoding.
/// Non-finite components and values whose scaled magnitude exceeds
/// [`MAX_SCALED_VALUE`] are rejected, so every encoded string decodes.
pub fn encode(coordinates: &[Coordinate]) -> Result<String, EncodeError> {
    let mut encoded = String::with_capacity(coordinates.len() * 12);
    let mut previous = [0i64; 3];

    for (index, coordinate) in coordinates.iter().enumerate() {
        let scaled = [
            scale(coordinate.latitude, LAT_LNG_FACTOR, index, Channel::Latitude)?,
            scale(coordinate.longitude, LAT_LNG_FACTOR, index, Channel::Longitude)?,
            scale(coordinate.elevation, ELEVATION_FACTOR, index, Channel::Elevation)?,
        ];
        for (value, prev) in scaled.iter().zip(previous.iter_mut()) {
            write_value(value - *prev, &mut encoded);
            *prev = *value;
        }
    }

    Ok(encoded)
}

fn scale(value: f64, factor: f64, index: usize, channel: Channel) -> Result<i64, EncodeError> {
    if !value.is_finite() {
        return Err(EncodeError::NonFinite { index, channel });
    }
    let scaled = (value * factor).round();
    if scaled.abs() > MAX_SCALED_VALUE as f64 {
        return Err(EncodeError::OutOfRange { index, channel });
    }
    Ok(scaled as i64)
}

fn accumulate(total: i64, index: &mut usize, bytes: &[u8], channel: Channel) -> Result<i64, DecodeError> {
    let start = *index;
    let delta = read_value(bytes, index, channel)?;
    total
        .checked_add(delta)
        .ok_or(DecodeError::Overflow { offset: start })
}

/// Reads one signed value starting at `index`, advancing past it.
fn read_value(bytes: &[u8], index: &mut usize, channel: Channel) -> Result<i64, DecodeError> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let offset = *index;
        let byte = *bytes
            .get(offset)
            .ok_or(DecodeError::Truncated { offset, channel })?;
        if !(CHUNK_OFFSET..=b'~').contains(&byte) {
            return Err(DecodeError::InvalidCharacter { offset, byte });
        }
        if shift >= MAX_SHIFT {
            return Err(DecodeError::Overflow { offset });
        }
        *index += 1;

        let chunk = i64::from(byte - CHUNK_OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    if result & 1 != 0 {
        Ok(!(result >> 1))
    } else {
        Ok(result >> 1)
    }
}

fn write_value(value: i64, out: &mut String) {
    let mut bits = (if value < 0 { !(value << 1) } else { value << 1 }) as u64;
    while bits >= CONTINUATION_BIT as u64 {
        let chunk = (CONTINUATION_BIT as u64 | (bits & CHUNK_MASK as u64)) as u8;
        out.push(char::from(chunk + CHUNK_OFFSET));
        bits >>= 5;
    }
    out.push(char::from(bits as u8 + CHUNK_OFFSET));
}

/// A polyline representing a route geometry as decoded coordinates.
///
/// Encoding to/from the compact polyline format happens at the boundary
/// (when receiving from the directions service or handing geometry to a map).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinates.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    pub fn decode(encoded: &str) -> Result<Self, DecodeError> {
        decode(encoded).map(Self::new)
    }

    pub fn encode(&self) -> Result<String, EncodeError> {
        encode(&self.points)
    }

    /// Returns a reference to the coordinates.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinates.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn lat_lngs(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(Coordinate::lat_lng).collect()
    }

    /// The coordinates without elevation, for distance calculations.
    pub fn route_points(&self) -> Vec<Point> {
        self.points.iter().map(Coordinate::point).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
