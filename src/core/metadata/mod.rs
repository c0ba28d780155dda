//! # Metadata Module
//!
//! Extracts the EXIF fields shown on the review card.
//!
//! ## Extracted Fields
//! - Date taken (DateTimeOriginal)
//! - Image dimensions (width x height)
//! - GPS position (decimal degrees)
//! - Image description
//!
//! Files without EXIF (most PNGs, screenshots) yield an empty
//! [`PhotoMetadata`]; the media index then falls back to file-system
//! timestamps and decoded dimensions.

use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Extracted photo metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    /// Original capture time, Unix millis
    pub date_taken: Option<i64>,
    /// Image width in pixels
    pub width: Option<u32>,
    /// Image height in pixels
    pub height: Option<u32>,
    /// Latitude, longitude in decimal degrees
    pub location: Option<[f64; 2]>,
    /// Free-text description embedded by the camera or an editor
    pub description: Option<String>,
}

impl PhotoMetadata {
    /// Check if any metadata was extracted
    pub fn has_data(&self) -> bool {
        self.date_taken.is_some()
            || self.width.is_some()
            || self.height.is_some()
            || self.location.is_some()
            || self.description.is_some()
    }

    /// Get dimensions as a formatted string
    pub fn dimensions_display(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }
}

/// Extract EXIF metadata from a photo file
pub fn extract_metadata(path: &Path) -> PhotoMetadata {
    let mut metadata = PhotoMetadata::default();

    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return metadata,
    };

    let mut bufreader = BufReader::new(&file);
    let exif_reader = match Reader::new().read_from_container(&mut bufreader) {
        Ok(r) => r,
        Err(_) => return metadata,
    };

    if let Some(field) = exif_reader.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
        if let Some(s) = get_string_value(&field.value) {
            // EXIF date format: "YYYY:MM:DD HH:MM:SS"
            if let Ok(naive) = NaiveDateTime::parse_from_str(&s, "%Y:%m:%d %H:%M:%S") {
                metadata.date_taken = Some(naive.and_utc().timestamp_millis());
            }
        }
    }

    // Prefer actual pixel dimensions
    if let Some(field) = exif_reader.get_field(Tag::PixelXDimension, In::PRIMARY) {
        metadata.width = get_u32_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::PixelYDimension, In::PRIMARY) {
        metadata.height = get_u32_value(&field.value);
    }
    if metadata.width.is_none() {
        if let Some(field) = exif_reader.get_field(Tag::ImageWidth, In::PRIMARY) {
            metadata.width = get_u32_value(&field.value);
        }
    }
    if metadata.height.is_none() {
        if let Some(field) = exif_reader.get_field(Tag::ImageLength, In::PRIMARY) {
            metadata.height = get_u32_value(&field.value);
        }
    }

    if let Some(field) = exif_reader.get_field(Tag::ImageDescription, In::PRIMARY) {
        metadata.description = get_string_value(&field.value);
    }

    metadata.location = read_gps(&exif_reader);

    metadata
}

fn read_gps(exif: &Exif) -> Option<[f64; 2]> {
    let lat = exif
        .get_field(Tag::GPSLatitude, In::PRIMARY)
        .and_then(|f| dms_to_degrees(&f.value))?;
    let lon = exif
        .get_field(Tag::GPSLongitude, In::PRIMARY)
        .and_then(|f| dms_to_degrees(&f.value))?;

    let lat_ref = exif
        .get_field(Tag::GPSLatitudeRef, In::PRIMARY)
        .and_then(|f| get_string_value(&f.value));
    let lon_ref = exif
        .get_field(Tag::GPSLongitudeRef, In::PRIMARY)
        .and_then(|f| get_string_value(&f.value));

    Some([
        apply_hemisphere(lat, lat_ref.as_deref(), "S"),
        apply_hemisphere(lon, lon_ref.as_deref(), "W"),
    ])
}

/// Convert a degrees/minutes/seconds rational triple to decimal degrees
fn dms_to_degrees(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(parts) if parts.len() >= 3 => {
            let degrees = parts[0].to_f64();
            let minutes = parts[1].to_f64();
            let seconds = parts[2].to_f64();
            Some(degrees + minutes / 60.0 + seconds / 3600.0)
        }
        _ => None,
    }
}

fn apply_hemisphere(value: f64, reference: Option<&str>, negative: &str) -> f64 {
    match reference {
        Some(r) if r.eq_ignore_ascii_case(negative) => -value,
        _ => value,
    }
}

/// Helper to extract u32 from various EXIF value types
fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::Rational;

    #[test]
    fn metadata_default_has_no_data() {
        let meta = PhotoMetadata::default();
        assert!(!meta.has_data());
    }

    #[test]
    fn metadata_with_location_has_data() {
        let meta = PhotoMetadata {
            location: Some([48.85, 2.35]),
            ..Default::default()
        };
        assert!(meta.has_data());
    }

    #[test]
    fn dimensions_display_format() {
        let meta = PhotoMetadata {
            width: Some(4032),
            height: Some(3024),
            ..Default::default()
        };
        assert_eq!(meta.dimensions_display(), Some("4032x3024".to_string()));
    }

    #[test]
    fn dms_converts_to_decimal() {
        let value = Value::Rational(vec![
            Rational { num: 51, denom: 1 },
            Rational { num: 30, denom: 1 },
            Rational { num: 36, denom: 1 },
        ]);
        let degrees = dms_to_degrees(&value).unwrap();
        assert!((degrees - 51.51).abs() < 1e-9);
    }

    #[test]
    fn southern_and_western_hemispheres_are_negative() {
        assert_eq!(apply_hemisphere(33.9, Some("S"), "S"), -33.9);
        assert_eq!(apply_hemisphere(151.2, Some("E"), "W"), 151.2);
        assert_eq!(apply_hemisphere(0.5, None, "W"), 0.5);
    }

    #[test]
    fn extract_from_nonexistent_returns_default() {
        let meta = extract_metadata(Path::new("/nonexistent/file.jpg"));
        assert!(!meta.has_data());
    }
}
