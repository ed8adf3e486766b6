//! Valores compartidos por la detección, los extractores y la limpieza.

/// Bytes iniciales que se inspeccionan para clasificar un archivo.
pub const SNIFF_WINDOW: usize = 64 * 1024;

pub const EMPTY_MIME: &str = "application/x-empty";
pub const TEXT_MIME: &str = "text/plain";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";
pub const PDF_MIME: &str = "application/pdf";
pub const SVG_MIME: &str = "image/svg+xml";
pub const WORDPROCESSING_MARKER: &str = "wordprocessingml";

pub const UNKNOWN_VALUE: &str = "Unknown";
pub const NO_GPS_DATA: &str = "No GPS data found";
pub const UNSUPPORTED_NOTE: &str = "File type not supported";

pub const JPEG_QUALITY: u8 = 95;
pub const CLEANED_SUFFIX: &str = "_cleaned";
pub const DEFAULT_IMAGE_STEM: &str = "image";

pub const AUDIO_TEMP_PREFIX: &str = "filelens-audio-";

pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const CP_NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";
pub const CORE_PROPERTIES_PART: &str = "docProps/core.xml";
