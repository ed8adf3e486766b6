//! FileLens Scrub: detección de tipo por contenido, reporte normalizado de
//! metadata y limpieza de imágenes para redistribución sin datos privados.
//!
//! La biblioteca no mantiene estado entre llamadas; cada operación recibe un
//! búfer prestado y devuelve un resultado nuevo.

pub mod constants;
pub mod error;
pub mod metadata;
pub mod sanitize;
pub mod sniff;

pub use error::{ExtractError, StripError};
pub use metadata::extract_metadata;
pub use metadata::report::MetadataReport;
pub use sanitize::{
    CleanedImage, StripOptions, clean_image, clean_image_with, strip_image_metadata,
    strip_image_metadata_with,
};
pub use sniff::{SniffedType, sniff, sniff_mime};

#[cfg(test)]
mod test_support;
