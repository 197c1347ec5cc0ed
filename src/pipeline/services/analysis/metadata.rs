use super::core::ForensicAnalyzer;
use crate::common::LoadedImage;
use crate::error::AnalyzerError;
use crate::pipeline::domain::{Finding, Sector};
use exif::{In, Tag, Value};
use image::ImageFormat;
use std::io::Cursor;

const ABSENT_SCORE: f32 = 0.4;
const CLEAN_SCORE: f32 = 1.0;
const FLAGGED_SCORE: f32 = 0.6;
const SUSPICIOUS_MARKER: &str = "Unknown";

/// Capture fields the analyzer cares about, pulled out of EXIF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    pub timestamp: Option<String>,
}

/// Scores embedded capture metadata. Metadata is read from the original
/// container bytes because decoding to RGB drops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataAnalyzer;

impl MetadataAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// `Ok(None)` means the container carries no metadata at all.
    pub fn read(&self, image: &LoadedImage) -> Result<Option<CaptureMetadata>, AnalyzerError> {
        if !image.format().is_some_and(carries_exif) {
            return Ok(None);
        }

        let mut cursor = Cursor::new(image.raw_bytes());
        let exif = match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let text = |tag: Tag| {
            exif.get_field(tag, In::PRIMARY)
                .map(|field| field_text(&field.value, || field.display_value().to_string()))
        };

        Ok(Some(CaptureMetadata {
            make: text(Tag::Make),
            model: text(Tag::Model),
            timestamp: text(Tag::DateTimeOriginal).or_else(|| text(Tag::DateTime)),
        }))
    }

    pub fn score(&self, metadata: Option<&CaptureMetadata>) -> Finding {
        let Some(metadata) = metadata else {
            return Finding::new(ABSENT_SCORE, "No metadata (possible editing)");
        };

        let mut flags = Vec::new();
        for (name, value) in [("Make", &metadata.make), ("Model", &metadata.model)] {
            if let Some(value) = value.as_deref().filter(|v| v.contains(SUSPICIOUS_MARKER)) {
                flags.push(format!("Suspicious {}: {}", name, value));
            }
        }
        if metadata.timestamp.is_none() {
            flags.push("Missing timestamp".to_string());
        }

        if flags.is_empty() {
            Finding::new(CLEAN_SCORE, "OK")
        } else {
            Finding::new(FLAGGED_SCORE, flags.join(", "))
        }
    }
}

impl ForensicAnalyzer for MetadataAnalyzer {
    fn sector(&self) -> Sector {
        Sector::Metadata
    }

    fn analyze(&self, image: &LoadedImage) -> Result<Finding, AnalyzerError> {
        let metadata = self.read(image)?;
        Ok(self.score(metadata.as_ref()))
    }
}

// Containers the EXIF reader understands. Anything else has nowhere to keep EXIF.
fn carries_exif(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Tiff | ImageFormat::WebP
    )
}

fn field_text(value: &Value, fallback: impl FnOnce() -> String) -> String {
    match value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|part| String::from_utf8_lossy(part).trim_end_matches('\0').trim().to_string())
            .collect::<Vec<_>>()
            .join(" "),
        _ => fallback(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use uuid::Uuid;

    fn jpeg_bytes() -> Vec<u8> {
        let rgb = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(16, 16, Rgb([90, 120, 150]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    /// Little-endian TIFF with IFD0 holding the given ASCII tags, sorted by tag id.
    fn tiff_with_ascii(tags: &[(u16, &str)]) -> Vec<u8> {
        let header_len = 8;
        let ifd_len = 2 + 12 * tags.len() + 4;
        let mut tiff = vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        let mut data = Vec::new();

        tiff.extend_from_slice(&(tags.len() as u16).to_le_bytes());
        for (tag, text) in tags {
            let mut value = text.as_bytes().to_vec();
            value.push(0);
            tiff.extend_from_slice(&tag.to_le_bytes());
            tiff.extend_from_slice(&2u16.to_le_bytes());
            tiff.extend_from_slice(&(value.len() as u32).to_le_bytes());
            if value.len() <= 4 {
                value.resize(4, 0);
                tiff.extend_from_slice(&value);
            } else {
                let offset = (header_len + ifd_len + data.len()) as u32;
                tiff.extend_from_slice(&offset.to_le_bytes());
                data.extend_from_slice(&value);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
            }
        }
        tiff.extend_from_slice(&0u32.to_le_bytes());
        tiff.extend_from_slice(&data);
        tiff
    }

    /// JPEG with an APP1 Exif segment right after SOI.
    pub(crate) fn jpeg_with_exif(tags: &[(u16, &str)]) -> Vec<u8> {
        let tiff = tiff_with_ascii(tags);
        let jpeg = jpeg_bytes();
        let segment_len = (2 + 6 + tiff.len()) as u16;

        let mut bytes = jpeg[..2].to_vec();
        bytes.extend_from_slice(&[0xFF, 0xE1]);
        bytes.extend_from_slice(&segment_len.to_be_bytes());
        bytes.extend_from_slice(b"Exif\0\0");
        bytes.extend_from_slice(&tiff);
        bytes.extend_from_slice(&jpeg[2..]);
        bytes
    }

    fn loaded(bytes: Vec<u8>) -> LoadedImage {
        crate::common::ImageLoader::new()
            .load(Uuid::new_v4(), bytes)
            .unwrap()
    }

    const MAKE: u16 = 0x010F;
    const MODEL: u16 = 0x0110;
    const DATE_TIME: u16 = 0x0132;

    #[test]
    fn no_metadata_scores_point_four() {
        let finding = MetadataAnalyzer::new().analyze(&loaded(jpeg_bytes())).unwrap();
        assert_eq!(finding.score, 0.4);
        assert!(finding.reason.to_lowercase().contains("no metadata"));
    }

    #[test]
    fn pixels_without_container_have_no_metadata() {
        let rgb = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(4, 4, Rgb([0, 0, 0]));
        let finding = MetadataAnalyzer::new()
            .analyze(&LoadedImage::from_rgb(rgb))
            .unwrap();
        assert_eq!(finding.score, 0.4);
    }

    #[test]
    fn unknown_make_is_flagged() {
        let bytes = jpeg_with_exif(&[
            (MAKE, "Unknown"),
            (MODEL, "Cam"),
            (DATE_TIME, "2024:05:01 10:00:00"),
        ]);
        let finding = MetadataAnalyzer::new().analyze(&loaded(bytes)).unwrap();
        assert_eq!(finding.score, 0.6);
        assert_eq!(finding.reason, "Suspicious Make: Unknown");
    }

    #[test]
    fn complete_metadata_is_clean() {
        let bytes = jpeg_with_exif(&[
            (MAKE, "Canon"),
            (MODEL, "EOS 5D"),
            (DATE_TIME, "2024:05:01 10:00:00"),
        ]);
        let analyzer = MetadataAnalyzer::new();
        let image = loaded(bytes);

        let metadata = analyzer.read(&image).unwrap().unwrap();
        assert_eq!(metadata.make.as_deref(), Some("Canon"));
        assert_eq!(metadata.model.as_deref(), Some("EOS 5D"));

        let finding = analyzer.analyze(&image).unwrap();
        assert_eq!(finding.score, 1.0);
        assert_eq!(finding.reason, "OK");
    }

    #[test]
    fn missing_timestamp_is_flagged() {
        let metadata = CaptureMetadata {
            make: Some("Nikon".to_string()),
            model: Some("Unknown Z".to_string()),
            timestamp: None,
        };
        let finding = MetadataAnalyzer::new().score(Some(&metadata));
        assert_eq!(finding.score, 0.6);
        assert_eq!(finding.reason, "Suspicious Model: Unknown Z, Missing timestamp");
    }

    /// JPEG whose APP1 Exif segment carries a TIFF header with a bad byte order mark.
    pub(crate) fn jpeg_with_malformed_exif() -> Vec<u8> {
        let jpeg = jpeg_bytes();
        let mut bytes = jpeg[..2].to_vec();
        bytes.extend_from_slice(&[0xFF, 0xE1, 0x00, 0x10]);
        bytes.extend_from_slice(b"Exif\0\0");
        bytes.extend_from_slice(&[0x58, 0x58, 0x00, 0x2A, 0, 0, 0, 8]);
        bytes.extend_from_slice(&jpeg[2..]);
        bytes
    }

    #[test]
    fn malformed_exif_is_an_error() {
        let result = MetadataAnalyzer::new().analyze(&loaded(jpeg_with_malformed_exif()));
        assert!(matches!(result, Err(AnalyzerError::Metadata(_))));
    }
}
