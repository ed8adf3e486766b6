//! Extracción de propiedades básicas, etiquetas EXIF y GPS de imágenes.

use super::gps::gps_from_exif;
use super::report::{GpsField, ImageSection};
use crate::error::ExtractError;
use exif::{Exif, Field, In, Tag, Value};
use image::{ColorType, ImageFormat, ImageReader};
use log::{debug, warn};
use std::io::Cursor;

/// Contenedores en los que el lector EXIF sabe buscar etiquetas. AVIF comparte
/// la estructura ISOBMFF de HEIF y guarda el EXIF en el mismo tipo de ítem.
const EXIF_CONTAINERS: [&str; 7] = [
    "image/jpeg",
    "image/tiff",
    "image/png",
    "image/webp",
    "image/heif",
    "image/heic",
    "image/avif",
];

fn carries_exif(mime: &str) -> bool {
    EXIF_CONTAINERS.contains(&mime)
}

struct ImageProperties {
    format: String,
    width: u32,
    height: u32,
    mode: String,
}

/// Devuelve la sección de imagen; los fallos del códec y del EXIF quedan
/// registrados por separado y nunca se anulan entre sí.
pub fn extract_image_metadata(bytes: &[u8], mime: &str) -> ImageSection {
    let mut section = ImageSection::default();

    match read_properties(bytes) {
        Ok(properties) => {
            section.format = Some(properties.format);
            section.size = Some([properties.width, properties.height]);
            section.mode = Some(properties.mode);
        }
        Err(error) => {
            warn!("no se pudieron leer las propiedades de la imagen: {error}");
            section.image_error = Some(error.to_string());
        }
    }

    if let Err(error) = read_exif(bytes, mime, &mut section) {
        warn!("no se pudo leer el bloque EXIF: {error}");
        section.exif_error = Some(error.to_string());
    }

    section
}

fn read_properties(bytes: &[u8]) -> Result<ImageProperties, ExtractError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or(ExtractError::UnknownImageFormat)?;
    let image = reader.decode()?;

    Ok(ImageProperties {
        format: format_name(format),
        width: image.width(),
        height: image.height(),
        mode: color_mode(image.color()),
    })
}

fn read_exif(bytes: &[u8], mime: &str, section: &mut ImageSection) -> Result<(), ExtractError> {
    if !carries_exif(mime) {
        debug!("{mime} no admite bloques EXIF; se omite la lectura de etiquetas");
        return Ok(());
    }

    let mut reader = exif::Reader::new();
    reader.continue_on_error(true);
    let exif = match reader.read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(()),
        Err(error) => {
            let mut problems = Vec::new();
            let exif = error.distill_partial_result(|errors| problems = errors)?;
            let message = problems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            warn!("EXIF leído parcialmente: {message}");
            section.exif_error = Some(message);
            exif
        }
    };

    apply_exif(&exif, section);
    Ok(())
}

fn apply_exif(exif: &Exif, section: &mut ImageSection) {
    for field in exif.fields() {
        section.raw_exif.insert(
            exif_key(field),
            field.display_value().with_unit(exif).to_string(),
        );
    }

    let make = primary_text(exif, Tag::Make);
    let model = primary_text(exif, Tag::Model);
    let taken_on = primary_text(exif, Tag::DateTimeOriginal);

    section.presence_report.camera_info = make.is_some() || model.is_some();
    section.presence_report.timestamp = taken_on.is_some();

    if let Some(make) = make {
        section.camera_make = make;
    }
    if let Some(model) = model {
        section.camera_model = model;
    }
    if let Some(taken_on) = taken_on {
        section.datetime_original = taken_on;
    }
    if let Some(software) = primary_text(exif, Tag::Software) {
        section.software = software;
    }

    if let Some(coordinate) = gps_from_exif(exif) {
        section.gps = GpsField::Coordinates(coordinate);
        section.presence_report.gps_data = true;
    }
}

fn exif_key(field: &Field) -> String {
    match field.ifd_num {
        In::PRIMARY => field.tag.to_string(),
        In::THUMBNAIL => format!("Thumbnail {}", field.tag),
        other => format!("IFD{} {}", other.index(), field.tag),
    }
}

fn primary_text(exif: &Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY).and_then(ascii_text)
}

/// Primer valor ASCII no vacío del campo, sin relleno NUL.
pub(crate) fn ascii_text(field: &Field) -> Option<String> {
    let Value::Ascii(values) = &field.value else {
        return None;
    };
    values
        .iter()
        .map(|value| {
            String::from_utf8_lossy(value)
                .trim_matches(char::from(0))
                .trim()
                .to_string()
        })
        .find(|value| !value.is_empty())
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Ico => "ICO".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

fn color_mode(color: ColorType) -> String {
    match color {
        ColorType::L8 => "L".to_string(),
        ColorType::La8 => "LA".to_string(),
        ColorType::Rgb8 => "RGB".to_string(),
        ColorType::Rgba8 => "RGBA".to_string(),
        ColorType::L16 => "I;16".to_string(),
        ColorType::La16 => "LA;16".to_string(),
        ColorType::Rgb16 => "RGB;16".to_string(),
        ColorType::Rgba16 => "RGBA;16".to_string(),
        ColorType::Rgb32F => "RGB;F".to_string(),
        ColorType::Rgba32F => "RGBA;F".to_string(),
        other => format!("{other:?}"),
    }
}
