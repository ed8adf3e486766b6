//! Extracción de metadata para imágenes, PDFs, documentos Word y audio.
//!
//! El tipo se detecta una sola vez por contenido y el resultado decide qué
//! extractor atiende el búfer. Los fallos internos de cada extractor quedan
//! dentro de su sección; esta capa nunca devuelve error.

pub mod audio;
pub mod docx;
pub mod gps;
pub mod image;
pub mod pdf;
pub mod report;

use crate::constants::UNSUPPORTED_NOTE;
use crate::sniff::{SniffedType, sniff};
use log::debug;
use report::{ImageSummary, MetadataReport, ReportSection};

pub fn extract_metadata(bytes: &[u8]) -> MetadataReport {
    let sniffed = sniff(bytes);
    debug!("{} bytes detectados como {} ({:?})", bytes.len(), sniffed.mime, sniffed.kind);

    let mut summary = None;
    let section = match sniffed.kind {
        SniffedType::Image => {
            let section = image::extract_image_metadata(bytes, &sniffed.mime);
            summary = Some(ImageSummary::from_section(&section));
            ReportSection::Image(section)
        }
        SniffedType::Pdf => ReportSection::Pdf(pdf::extract_pdf_metadata(bytes)),
        SniffedType::WordDocument => ReportSection::Docx(docx::extract_docx_metadata(bytes)),
        SniffedType::Audio => {
            ReportSection::Audio(audio::extract_audio_metadata(bytes, &sniffed.mime))
        }
        SniffedType::Unknown => ReportSection::Note(UNSUPPORTED_NOTE.to_string()),
    };

    MetadataReport {
        mime: sniffed.mime,
        kind: sniffed.kind,
        section,
        summary,
    }
}
