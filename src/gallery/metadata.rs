use super::{ExifFields, ImageMetadata};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rexif::{ExifEntry, ExifTag, TagValue};
use std::path::Path;
use tracing::{debug, trace};

/// Best-effort metadata for a stored image. Never fails: every probe that cannot
/// produce a value simply leaves its field empty.
pub fn extract_metadata(image_path: &Path) -> ImageMetadata {
    let (width, height) = match read_dimensions(image_path) {
        Some((w, h)) => (Some(w), Some(h)),
        None => (None, None),
    };

    ImageMetadata {
        width,
        height,
        exif: extract_exif_fields(image_path),
    }
}

fn read_dimensions(image_path: &Path) -> Option<(u32, u32)> {
    // Header-only probe; the format comes from the bytes, not the extension
    let reader = image::ImageReader::open(image_path)
        .and_then(|reader| reader.with_guessed_format())
        .ok()?;

    match reader.into_dimensions() {
        Ok(dimensions) => Some(dimensions),
        Err(e) => {
            debug!("Could not read dimensions of {}: {}", image_path.display(), e);
            None
        }
    }
}

fn extract_exif_fields(image_path: &Path) -> Option<ExifFields> {
    let exif_data = match rexif::parse_file(image_path) {
        Ok(exif_data) => exif_data,
        Err(e) => {
            trace!("No EXIF data for {}: {}", image_path.display(), e);
            return None;
        }
    };

    let entries = &exif_data.entries;
    let (latitude, longitude) = match extract_location(entries) {
        Some((lat, lon)) => (Some(format!("{:.6}", lat)), Some(format!("{:.6}", lon))),
        None => (None, None),
    };

    let fields = ExifFields {
        date_time: extract_capture_date(entries),
        camera_model: ascii_field(entries, ExifTag::Model),
        camera_make: ascii_field(entries, ExifTag::Make),
        latitude,
        longitude,
    };

    if fields.is_empty() { None } else { Some(fields) }
}

fn find_entry(entries: &[ExifEntry], tag: ExifTag) -> Option<&ExifEntry> {
    entries.iter().find(|e| e.tag == tag)
}

fn ascii_field(entries: &[ExifEntry], tag: ExifTag) -> Option<String> {
    let entry = find_entry(entries, tag)?;
    let value = clean_ascii(&entry.value_more_readable);
    if value.is_empty() { None } else { Some(value) }
}

fn clean_ascii(raw: &str) -> String {
    raw.trim_matches(char::from(0)).trim().to_string()
}

fn extract_capture_date(entries: &[ExifEntry]) -> Option<String> {
    // Try different date fields in order of preference
    let date_fields = [
        ExifTag::DateTimeOriginal,
        ExifTag::DateTimeDigitized,
        ExifTag::DateTime,
    ];

    date_fields.iter().find_map(|field| {
        let entry = find_entry(entries, field.clone())?;
        let date = parse_exif_datetime(&clean_ascii(&entry.value_more_readable))?;
        trace!("Found capture date in {:?}: {}", field, date);
        Some(date.to_rfc3339_opts(SecondsFormat::Secs, false))
    })
}

/// EXIF stores local wall-clock time without a zone; it is taken as UTC.
pub(crate) fn parse_exif_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
    let datetime_formats = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    for format in &datetime_formats {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(datetime_str, format) {
            return Some(naive_dt.and_utc());
        }
    }

    let date_formats = ["%Y:%m:%d", "%Y-%m-%d", "%Y/%m/%d"];
    for format in &date_formats {
        if let Ok(naive_date) = NaiveDate::parse_from_str(datetime_str, format) {
            return naive_date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

fn extract_location(entries: &[ExifEntry]) -> Option<(f64, f64)> {
    let latitude = dms_to_degrees(&find_entry(entries, ExifTag::GPSLatitude)?.value)?;
    let longitude = dms_to_degrees(&find_entry(entries, ExifTag::GPSLongitude)?.value)?;
    let lat_ref = hemisphere(find_entry(entries, ExifTag::GPSLatitudeRef)?)?;
    let lon_ref = hemisphere(find_entry(entries, ExifTag::GPSLongitudeRef)?)?;

    let latitude = if lat_ref == 'S' { -latitude } else { latitude };
    let longitude = if lon_ref == 'W' { -longitude } else { longitude };

    Some((latitude, longitude))
}

fn hemisphere(entry: &ExifEntry) -> Option<char> {
    let raw = match &entry.value {
        TagValue::Ascii(s) => clean_ascii(s),
        _ => clean_ascii(&entry.value_more_readable),
    };
    raw.chars().next().map(|c| c.to_ascii_uppercase())
}

/// Degrees, minutes and seconds rationals folded into decimal degrees.
pub(crate) fn dms_to_degrees(value: &TagValue) -> Option<f64> {
    let TagValue::URational(parts) = value else {
        return None;
    };
    if parts.len() < 3 {
        return None;
    }

    let mut components = [0.0f64; 3];
    for (slot, part) in components.iter_mut().zip(parts.iter()) {
        if part.denominator == 0 {
            return None;
        }
        *slot = part.numerator as f64 / part.denominator as f64;
    }

    Some(components[0] + components[1] / 60.0 + components[2] / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn encode(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    enum Value<'a> {
        Ascii(&'a str),
        Long(u32),
        Rationals(&'a [(u32, u32)]),
    }

    // Little-endian TIFF IFD with its out-of-line data appended after the entries.
    fn write_ifd(out: &mut Vec<u8>, entries: &[(u16, Value)]) {
        let start = out.len();
        let data_start = start + 2 + entries.len() * 12 + 4;
        let mut data = Vec::new();

        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, value) in entries {
            let (kind, count, payload) = match value {
                Value::Ascii(s) => {
                    let mut bytes = s.as_bytes().to_vec();
                    bytes.push(0);
                    (2u16, bytes.len() as u32, bytes)
                }
                Value::Long(v) => (4u16, 1, v.to_le_bytes().to_vec()),
                Value::Rationals(parts) => {
                    let mut bytes = Vec::new();
                    for (num, den) in parts.iter() {
                        bytes.extend_from_slice(&num.to_le_bytes());
                        bytes.extend_from_slice(&den.to_le_bytes());
                    }
                    (5u16, parts.len() as u32, bytes)
                }
            };
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&kind.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            if payload.len() <= 4 {
                let mut inline = payload.clone();
                inline.resize(4, 0);
                out.extend_from_slice(&inline);
            } else {
                let offset = (data_start + data.len()) as u32;
                out.extend_from_slice(&offset.to_le_bytes());
                data.extend_from_slice(&payload);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
            }
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&data);
    }

    fn ifd_len(entries: &[(u16, Value)]) -> usize {
        let mut scratch = vec![0u8; 0];
        write_ifd(&mut scratch, entries);
        scratch.len()
    }

    fn jpeg_with_exif(include_gps: bool) -> Vec<u8> {
        let mut tiff = b"II\x2a\x00\x08\x00\x00\x00".to_vec();

        let mut ifd0 = vec![
            (0x010f, Value::Ascii("Canon")),
            (0x0110, Value::Ascii("Canon EOS 5D")),
            (0x0132, Value::Ascii("2021:06:15 14:30:00")),
        ];
        let gps = [
            (0x0001, Value::Ascii("N")),
            (0x0002, Value::Rationals(&[(48, 1), (51, 1), (2958, 100)])),
            (0x0003, Value::Ascii("W")),
            (0x0004, Value::Rationals(&[(2, 1), (17, 1), (402, 10)])),
        ];

        if include_gps {
            // IFD0 length is the same whatever the pointer value is
            ifd0.push((0x8825, Value::Long(0)));
            let gps_offset = (8 + ifd_len(&ifd0)) as u32;
            ifd0.pop();
            ifd0.push((0x8825, Value::Long(gps_offset)));
            write_ifd(&mut tiff, &ifd0);
            assert_eq!(tiff.len() as u32, gps_offset);
            write_ifd(&mut tiff, &gps);
        } else {
            write_ifd(&mut tiff, &ifd0);
        }

        let mut app1 = b"Exif\x00\x00".to_vec();
        app1.extend_from_slice(&tiff);

        let jpeg = encode(ImageFormat::Jpeg, 40, 30);
        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xff, 0xe1]);
        out.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_png_without_exif_has_dimensions_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain.png");
        std::fs::write(&path, encode(ImageFormat::Png, 64, 48)).unwrap();

        let metadata = extract_metadata(&path);
        assert_eq!(metadata.width, Some(64));
        assert_eq!(metadata.height, Some(48));
        assert!(metadata.exif.is_none());
    }

    #[test]
    fn test_dimensions_ignore_misleading_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("actually_png.jpg");
        std::fs::write(&path, encode(ImageFormat::Png, 20, 10)).unwrap();

        let metadata = extract_metadata(&path);
        assert_eq!(metadata.width, Some(20));
        assert_eq!(metadata.height, Some(10));
    }

    #[test]
    fn test_corrupt_file_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert_eq!(extract_metadata(&path), ImageMetadata::default());
    }

    #[test]
    fn test_missing_file_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let metadata = extract_metadata(&temp_dir.path().join("gone.png"));
        assert_eq!(metadata, ImageMetadata::default());
    }

    #[test]
    fn test_jpeg_exif_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("camera.jpg");
        std::fs::write(&path, jpeg_with_exif(true)).unwrap();

        let metadata = extract_metadata(&path);
        assert_eq!(metadata.width, Some(40));
        assert_eq!(metadata.height, Some(30));

        let exif = metadata.exif.expect("exif block should decode");
        assert_eq!(exif.camera_make.as_deref(), Some("Canon"));
        assert_eq!(exif.camera_model.as_deref(), Some("Canon EOS 5D"));
        assert_eq!(exif.date_time.as_deref(), Some("2021-06-15T14:30:00+00:00"));
        assert_eq!(exif.latitude.as_deref(), Some("48.858217"));
        assert_eq!(exif.longitude.as_deref(), Some("-2.294500"));
    }

    #[test]
    fn test_partial_exif_without_gps() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no_gps.jpg");
        std::fs::write(&path, jpeg_with_exif(false)).unwrap();

        let exif = extract_metadata(&path).exif.expect("exif block should decode");
        assert_eq!(exif.camera_make.as_deref(), Some("Canon"));
        assert!(exif.latitude.is_none());
        assert!(exif.longitude.is_none());
    }

    #[test]
    fn test_parse_exif_datetime_formats() {
        let expected = "2005-07-30T07:22:46+00:00";
        for input in ["2005:07:30 07:22:46", "2005-07-30 07:22:46", "2005/07/30 07:22:46"] {
            let parsed = parse_exif_datetime(input).unwrap();
            assert_eq!(parsed.to_rfc3339_opts(SecondsFormat::Secs, false), expected);
        }

        let date_only = parse_exif_datetime("2005:07:30").unwrap();
        assert_eq!(
            date_only.to_rfc3339_opts(SecondsFormat::Secs, false),
            "2005-07-30T00:00:00+00:00"
        );

        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_none());
        assert!(parse_exif_datetime("").is_none());
    }

    #[test]
    fn test_dms_to_degrees() {
        let value = TagValue::URational(vec![
            rexif::URational { numerator: 51, denominator: 1 },
            rexif::URational { numerator: 30, denominator: 1 },
            rexif::URational { numerator: 4560, denominator: 100 },
        ]);
        let degrees = dms_to_degrees(&value).unwrap();
        assert!((degrees - 51.512667).abs() < 1e-6);

        let zero_den = TagValue::URational(vec![
            rexif::URational { numerator: 1, denominator: 0 },
            rexif::URational { numerator: 0, denominator: 1 },
            rexif::URational { numerator: 0, denominator: 1 },
        ]);
        assert!(dms_to_degrees(&zero_den).is_none());
        assert!(dms_to_degrees(&TagValue::Ascii("N".to_string())).is_none());
    }
}
