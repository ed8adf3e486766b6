//! Limpieza de metadata en imágenes mediante re-codificación completa.
//!
//! Solo se conservan los píxeles: cualquier segmento auxiliar (EXIF, XMP,
//! textos PNG, perfiles) desaparece porque nunca se copia al archivo nuevo.

mod image;
mod utils;

use crate::constants::JPEG_QUALITY;
use crate::error::StripError;
use crate::sniff::{SniffedType, sniff};
use log::{debug, info};

pub use self::image::CleanFormat;

/// Imagen limpia lista para entregarse al usuario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanedImage {
    pub bytes: Vec<u8>,
    /// MIME del formato con el que se codificó la salida.
    pub mime: String,
    /// Nombre sugerido: el original con el sufijo `_cleaned`.
    pub file_name: String,
}

/// Opciones de re-codificación.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripOptions {
    /// Calidad JPEG entre 1 y 100.
    pub jpeg_quality: u8,
    /// Tablas Huffman calculadas para cada imagen en lugar de las estándar.
    pub optimize_jpeg_tables: bool,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: JPEG_QUALITY,
            optimize_jpeg_tables: true,
        }
    }
}

/// Re-codifica la imagen sin metadata. El búfer de entrada no se modifica.
///
/// El llamador debe descartar antes las entradas que no sean imágenes; aquí
/// un contenido no decodificable simplemente falla.
pub fn strip_image_metadata(bytes: &[u8]) -> Result<Vec<u8>, StripError> {
    strip_image_metadata_with(bytes, &StripOptions::default())
}

pub fn strip_image_metadata_with(
    bytes: &[u8],
    options: &StripOptions,
) -> Result<Vec<u8>, StripError> {
    image::reencode(bytes, options).map(|reencoded| reencoded.bytes)
}

/// Valida el tipo, limpia la imagen y calcula el nombre sugerido.
pub fn clean_image(bytes: &[u8], original_name: Option<&str>) -> Result<CleanedImage, StripError> {
    clean_image_with(bytes, original_name, &StripOptions::default())
}

pub fn clean_image_with(
    bytes: &[u8],
    original_name: Option<&str>,
    options: &StripOptions,
) -> Result<CleanedImage, StripError> {
    let sniffed = sniff(bytes);
    if sniffed.kind != SniffedType::Image {
        debug!("se rechaza la limpieza de {}", sniffed.mime);
        return Err(StripError::NotAnImage(sniffed.mime));
    }

    let reencoded = image::reencode(bytes, options)?;
    let file_name = utils::cleaned_file_name(original_name, reencoded.source, reencoded.format);
    info!(
        "imagen limpia como {} ({} -> {} bytes)",
        file_name,
        bytes.len(),
        reencoded.bytes.len()
    );

    Ok(CleanedImage {
        bytes: reencoded.bytes,
        mime: reencoded.format.mime().to_string(),
        file_name,
    })
}
