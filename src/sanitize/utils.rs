//! Nombres sugeridos para las copias limpias.

use super::image::CleanFormat;
use crate::constants::{CLEANED_SUFFIX, DEFAULT_IMAGE_STEM};
use image::ImageFormat;
use std::path::Path;

/// Inserta `_cleaned` antes de la extensión.
///
/// Se conserva la extensión original cuando la salida mantiene el formato de
/// origen; si la imagen cambió a JPEG o no había extensión se usa la del
/// formato codificado. Los componentes de directorio se descartan.
pub fn cleaned_file_name(
    original_name: Option<&str>,
    source: ImageFormat,
    format: CleanFormat,
) -> String {
    let path = Path::new(original_name.unwrap_or_default());
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_STEM.to_string());

    let extension = match path.extension() {
        Some(extension) if source == format.image_format() => {
            extension.to_string_lossy().into_owned()
        }
        _ => format.extension().to_string(),
    };

    format!("{stem}{CLEANED_SUFFIX}.{extension}")
}
