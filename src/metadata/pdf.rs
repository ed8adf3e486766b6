//! Extracción de metadata en PDFs mediante lectura del diccionario Info.

use super::report::{AttributeMap, AttributeValue, PdfSection};
use crate::error::ExtractError;
use chrono::{FixedOffset, NaiveDate, TimeZone};
use log::warn;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// Anidamiento máximo de arreglos y referencias dentro de un valor del diccionario Info.
const MAX_VALUE_DEPTH: usize = 32;

pub fn extract_pdf_metadata(bytes: &[u8]) -> PdfSection {
    let mut section = PdfSection::default();
    if let Err(error) = read_pdf(bytes, &mut section) {
        warn!("no se pudo leer la metadata del PDF: {error}");
        section.pdf_error = Some(error.to_string());
    }
    section
}

fn read_pdf(bytes: &[u8], section: &mut PdfSection) -> Result<(), ExtractError> {
    let doc = Document::load_mem(bytes)?;
    section.num_pages = Some(doc.get_pages().len());

    let mut info = AttributeMap::new();
    if let Ok(info_ref) = doc.trailer.get(b"Info")
        && let Some(dict) = deref_dictionary(&doc, info_ref)
    {
        for (key, value) in dict.iter() {
            let mut visiting = HashSet::new();
            if let Some(value) = object_to_value(&doc, value, &mut visiting, 0) {
                info.insert(String::from_utf8_lossy(key).into_owned(), value);
            }
        }
    }
    section.document_info = Some(info);
    Ok(())
}

fn deref_dictionary<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(reference) => doc.get_dictionary(*reference).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Las referencias ya abiertas en la ruta actual se omiten, así un ciclo
/// `4 0 R -> [4 0 R]` termina en lugar de recursar sin fin.
fn object_to_value(
    doc: &Document,
    obj: &Object,
    visiting: &mut HashSet<ObjectId>,
    depth: usize,
) -> Option<AttributeValue> {
    if depth > MAX_VALUE_DEPTH {
        return None;
    }
    match obj {
        Object::String(bytes, _) => {
            let text = decode_text_string(bytes);
            Some(AttributeValue::Text(normalize_pdf_date(&text).unwrap_or(text)))
        }
        Object::Name(name) => Some(AttributeValue::Text(
            String::from_utf8_lossy(name).trim().to_string(),
        )),
        Object::Integer(value) => Some(AttributeValue::Integer(*value)),
        Object::Real(value) => Some(AttributeValue::Float(f64::from(*value))),
        Object::Boolean(value) => Some(AttributeValue::Bool(*value)),
        Object::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| object_to_value(doc, item, visiting, depth + 1))
                .map(|value| match value {
                    AttributeValue::Text(text) => text,
                    AttributeValue::Integer(value) => value.to_string(),
                    AttributeValue::Float(value) => value.to_string(),
                    AttributeValue::Bool(value) => value.to_string(),
                })
                .collect();
            Some(AttributeValue::Text(parts.join(", ")))
        }
        Object::Reference(reference) => {
            if !visiting.insert(*reference) {
                return None;
            }
            let value = doc
                .get_object(*reference)
                .ok()
                .and_then(|inner| object_to_value(doc, inner, visiting, depth + 1));
            visiting.remove(reference);
            value
        }
        _ => None,
    }
}

/// Cadenas de texto PDF: UTF-16BE con BOM, UTF-8 con BOM o PDFDocEncoding.
fn decode_text_string(bytes: &[u8]) -> String {
    let text = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(utf8).into_owned()
    } else {
        // Aproximación Latin-1 de PDFDocEncoding.
        bytes.iter().map(|&byte| char::from(byte)).collect()
    };
    text.trim_matches(char::from(0)).trim().to_string()
}

/// Convierte `D:YYYYMMDDHHmmSSOHH'mm'` a RFC 3339; sin zona horaria queda como hora local ISO.
fn normalize_pdf_date(raw: &str) -> Option<String> {
    let body = raw.trim().strip_prefix("D:")?;
    let digits: String = body.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return None;
    }

    let part = |start: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + 2) {
            Some(value) => value.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[0..4].parse().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, part(4, 1)?, part(6, 1)?)?.and_hms_opt(
        part(8, 0)?,
        part(10, 0)?,
        part(12, 0)?,
    )?;

    match parse_pdf_offset(&body[digits.len()..]) {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|datetime| datetime.to_rfc3339()),
        None => Some(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
    }
}

fn parse_pdf_offset(rest: &str) -> Option<FixedOffset> {
    let mut chars = rest.chars();
    let sign = match chars.next()? {
        'Z' => return FixedOffset::east_opt(0),
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits: String = chars.filter(char::is_ascii_digit).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = digits
        .get(2..4)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
