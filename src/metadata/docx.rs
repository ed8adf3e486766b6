//! Lectura de propiedades principales en documentos Word empaquetados en ZIP.

use super::report::DocxSection;
use crate::constants::{CORE_PROPERTIES_PART, CP_NS, DC_NS, DCTERMS_NS, MAIN_DOCUMENT_PART};
use crate::error::ExtractError;
use chrono::DateTime;
use log::{debug, warn};
use std::io::{Cursor, Read};
use xmltree::{Element, XMLNode};
use zip::ZipArchive;
use zip::result::ZipError;

pub fn extract_docx_metadata(bytes: &[u8]) -> DocxSection {
    let mut section = DocxSection::default();
    if let Err(error) = read_docx(bytes, &mut section) {
        warn!("no se pudo leer la metadata del documento: {error}");
        section.docx_error = Some(error.to_string());
    }
    section
}

fn read_docx(bytes: &[u8], section: &mut DocxSection) -> Result<(), ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    if archive.index_for_name(MAIN_DOCUMENT_PART).is_none() {
        return Err(ExtractError::Malformed(format!(
            "El paquete no contiene {MAIN_DOCUMENT_PART}"
        )));
    }

    let contents = match archive.by_name(CORE_PROPERTIES_PART) {
        Ok(mut core_file) => {
            let mut contents = String::new();
            core_file.read_to_string(&mut contents)?;
            contents
        }
        Err(ZipError::FileNotFound) => {
            debug!("documento sin {CORE_PROPERTIES_PART}");
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    };

    let root = Element::parse(contents.as_bytes())?;
    section.author = find_child_text(&root, "creator", DC_NS);
    section.title = find_child_text(&root, "title", DC_NS);
    section.created = find_child_text(&root, "created", DCTERMS_NS).map(normalize_timestamp);
    section.modified = find_child_text(&root, "modified", DCTERMS_NS).map(normalize_timestamp);
    section.last_modified_by = find_child_text(&root, "lastModifiedBy", CP_NS);
    section.subject = find_child_text(&root, "subject", DC_NS);
    section.keywords = find_child_text(&root, "keywords", CP_NS);
    section.revision = find_child_text(&root, "revision", CP_NS);
    Ok(())
}

fn find_child_text(root: &Element, local_name: &str, namespace: &str) -> Option<String> {
    root.children.iter().find_map(|node| match node {
        XMLNode::Element(child)
            if child.name == local_name && child.namespace.as_deref() == Some(namespace) =>
        {
            Some(element_text_content(child))
        }
        _ => None,
    })
}

fn element_text_content(element: &Element) -> String {
    let mut content = String::new();
    for node in &element.children {
        if let XMLNode::Text(text) = node {
            content.push_str(text);
        }
    }
    content.trim().to_string()
}

/// Las fechas W3CDTF válidas se reescriben en RFC 3339; el resto se conserva tal cual.
fn normalize_timestamp(raw: String) -> String {
    DateTime::parse_from_rfc3339(&raw)
        .map(|datetime| datetime.to_rfc3339())
        .unwrap_or(raw)
}
