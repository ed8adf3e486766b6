//! Detección del tipo MIME a partir del contenido, sin consultar nombres ni extensiones.

use crate::constants::{
    EMPTY_MIME, OCTET_STREAM_MIME, PDF_MIME, SNIFF_WINDOW, SVG_MIME, TEXT_MIME,
    WORDPROCESSING_MARKER,
};
use infer::Infer;
use serde::Serialize;

/// Categoría que decide qué extractor atiende un archivo.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SniffedType {
    Image,
    Pdf,
    WordDocument,
    Audio,
    #[default]
    Unknown,
}

impl SniffedType {
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            SniffedType::Image
        } else if mime == PDF_MIME {
            SniffedType::Pdf
        } else if mime.contains(WORDPROCESSING_MARKER) {
            SniffedType::WordDocument
        } else if mime.starts_with("audio/") {
            SniffedType::Audio
        } else {
            SniffedType::Unknown
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sniffed {
    pub mime: String,
    pub kind: SniffedType,
}

/// Clasifica el búfer una sola vez; el resultado acompaña al búfer por el resto del flujo.
pub fn sniff(bytes: &[u8]) -> Sniffed {
    let mime = sniff_mime(bytes);
    let kind = SniffedType::from_mime(&mime);
    Sniffed { mime, kind }
}

/// Detecta el tipo MIME inspeccionando como máximo los primeros 64 KiB.
pub fn sniff_mime(bytes: &[u8]) -> String {
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    if window.is_empty() {
        return EMPTY_MIME.to_string();
    }

    let infer = Infer::new();
    let inferred = infer.get(window).map(|kind| kind.mime_type());
    if let Some(mime) = inferred
        && !mime.starts_with("text/")
    {
        return mime.to_string();
    }

    // infer reporta XML o HTML genéricos; un documento con raíz <svg> es una imagen.
    if !looks_like_text(window) {
        return inferred.unwrap_or(OCTET_STREAM_MIME).to_string();
    }
    if looks_like_svg(window) {
        return SVG_MIME.to_string();
    }
    inferred.unwrap_or(TEXT_MIME).to_string()
}

fn looks_like_text(window: &[u8]) -> bool {
    if window.contains(&0) {
        return false;
    }
    match std::str::from_utf8(window) {
        Ok(_) => true,
        // Un carácter multibyte cortado por el límite de la ventana sigue siendo texto.
        Err(error) => error.error_len().is_none(),
    }
}

/// Salta BOM, declaración XML, comentarios y DOCTYPE y comprueba que la raíz sea `<svg`.
fn looks_like_svg(window: &[u8]) -> bool {
    let text = match std::str::from_utf8(window) {
        Ok(text) => text,
        Err(error) => match std::str::from_utf8(&window[..error.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
    };

    let mut rest = text.trim_start_matches('\u{feff}').trim_start();
    loop {
        let skipped = if let Some(after) = rest.strip_prefix("<?") {
            after.split_once("?>")
        } else if let Some(after) = rest.strip_prefix("<!--") {
            after.split_once("-->")
        } else if let Some(after) = rest.strip_prefix("<!") {
            skip_doctype(after)
        } else {
            break;
        };
        match skipped {
            Some((_, tail)) => rest = tail.trim_start(),
            None => return false,
        }
    }

    rest.strip_prefix("<svg").is_some_and(|tail| {
        tail.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/')
    })
}

/// Un DOCTYPE con subconjunto interno `[...]` termina en `]>`.
fn skip_doctype(after: &str) -> Option<(&str, &str)> {
    match (after.find('['), after.find('>')) {
        (Some(open), Some(close)) if open < close => after.split_once("]>"),
        _ => after.split_once('>'),
    }
}
