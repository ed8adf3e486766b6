//! Tipos de error de la biblioteca.
//!
//! `ExtractError` nunca sale de un extractor: se convierte en el campo
//! `*_error` de su sección. `StripError` es el único fallo que se propaga.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("No se pudo decodificar la imagen: {0}")]
    Image(#[from] image::ImageError),

    #[error("Formato de imagen no reconocido")]
    UnknownImageFormat,

    #[error("EXIF inválido: {0}")]
    Exif(#[from] exif::Error),

    #[error("PDF ilegible: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Contenedor ZIP inválido: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML inválido: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("{0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StripError {
    #[error("Solo se admite la limpieza de imágenes (tipo detectado: {0})")]
    NotAnImage(String),

    #[error("No se pudo leer la imagen: {0}")]
    Read(#[source] std::io::Error),

    #[error("Formato de imagen no reconocido")]
    UnrecognizedFormat,

    #[error("No se pudo decodificar la imagen: {0}")]
    Decode(#[source] image::ImageError),

    #[error("No se pudo guardar la imagen limpia: {0}")]
    Encode(#[source] image::ImageError),

    #[error("No se pudo codificar el JPEG limpio: {0}")]
    JpegEncode(#[source] jpeg_encoder::EncodingError),

    #[error("Dimensiones {0}x{1} fuera del límite de JPEG (65535)")]
    DimensionsTooLarge(u32, u32),

    #[error("La verificación indicó que la metadata no se eliminó correctamente")]
    MetadataRemains,

    #[error("Error verificando metadata EXIF: {0}")]
    Verify(#[source] exif::Error),
}
