//! Política de re-codificación por formato de origen.

use crate::error::StripError;
use crate::sanitize::StripOptions;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat, ImageReader};
use jpeg_encoder::{ColorType, Encoder};
use log::debug;
use std::io::Cursor;

/// Formatos en los que se entrega una imagen limpia.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CleanFormat {
    Jpeg,
    Png,
}

impl CleanFormat {
    /// PNG conserva su formato; todo lo demás termina en JPEG.
    pub fn for_source(source: ImageFormat) -> Self {
        match source {
            ImageFormat::Png => CleanFormat::Png,
            _ => CleanFormat::Jpeg,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            CleanFormat::Jpeg => "image/jpeg",
            CleanFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            CleanFormat::Jpeg => "jpg",
            CleanFormat::Png => "png",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            CleanFormat::Jpeg => ImageFormat::Jpeg,
            CleanFormat::Png => ImageFormat::Png,
        }
    }
}

pub struct Reencoded {
    pub bytes: Vec<u8>,
    pub source: ImageFormat,
    pub format: CleanFormat,
}

pub fn reencode(bytes: &[u8], options: &StripOptions) -> Result<Reencoded, StripError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(StripError::Read)?;
    let source = reader.format().ok_or(StripError::UnrecognizedFormat)?;
    let image = reader.decode().map_err(StripError::Decode)?;

    let format = CleanFormat::for_source(source);
    debug!("re-codificando {source:?} ({:?}) como {format:?}", image.color());

    let mut output = Vec::new();
    match format {
        CleanFormat::Jpeg => write_jpeg(jpeg_compatible(image), options, &mut output)?,
        CleanFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut output,
                CompressionType::Best,
                FilterType::Adaptive,
            );
            image
                .write_with_encoder(encoder)
                .map_err(StripError::Encode)?;
        }
    }

    verify_clean(&output)?;
    Ok(Reencoded {
        bytes: output,
        source,
        format,
    })
}

/// JPEG solo admite gris u RGB de 8 bits; alfa y paleta se aplanan a RGB.
fn jpeg_compatible(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
        DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Codifica gris o RGB de 8 bits; con `optimize_jpeg_tables` las tablas
/// Huffman se calculan a partir de los coeficientes de la propia imagen.
fn write_jpeg(
    image: DynamicImage,
    options: &StripOptions,
    output: &mut Vec<u8>,
) -> Result<(), StripError> {
    let (width, height) = (image.width(), image.height());
    let (Ok(jpeg_width), Ok(jpeg_height)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(StripError::DimensionsTooLarge(width, height));
    };
    let (data, color) = match image {
        DynamicImage::ImageLuma8(buffer) => (buffer.into_raw(), ColorType::Luma),
        other => (other.into_rgb8().into_raw(), ColorType::Rgb),
    };

    let mut encoder = Encoder::new(output, options.jpeg_quality.clamp(1, 100));
    encoder.set_optimized_huffman_tables(options.optimize_jpeg_tables);
    encoder
        .encode(&data, jpeg_width, jpeg_height, color)
        .map_err(StripError::JpegEncode)
}

/// Comprueba que la salida carece de campos EXIF residuales.
pub fn verify_clean(bytes: &[u8]) -> Result<(), StripError> {
    match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) if exif.fields().next().is_none() => Ok(()),
        Ok(_) => Err(StripError::MetadataRemains),
        Err(exif::Error::NotFound(_))
        | Err(exif::Error::BlankValue(_))
        | Err(exif::Error::InvalidFormat(_)) => Ok(()),
        Err(other) => Err(StripError::Verify(other)),
    }
}
