//! Modelos compartidos para reportar metadata de manera consistente.

use crate::constants::{NO_GPS_DATA, UNKNOWN_VALUE};
use crate::sniff::SniffedType;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Valor primitivo tal como lo entrega el decodificador del formato.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: AttributeValue,
}

/// Secuencia clave/valor con las etiquetas crudas de un formato.
///
/// Las claves son únicas: insertar una clave existente reemplaza su valor.
/// Se serializa como un objeto JSON respetando el orden de inserción.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<Attribute>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Attribute { key, value }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PresenceReport {
    pub gps_data: bool,
    pub camera_info: bool,
    pub timestamp: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GpsCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Coordenadas derivadas o el marcador literal cuando faltan datos GPS.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GpsField {
    Coordinates(GpsCoordinate),
    #[default]
    NotFound,
}

impl GpsField {
    pub fn coordinates(&self) -> Option<GpsCoordinate> {
        match self {
            GpsField::Coordinates(coordinate) => Some(*coordinate),
            GpsField::NotFound => None,
        }
    }
}

impl Serialize for GpsField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GpsField::Coordinates(coordinate) => coordinate.serialize(serializer),
            GpsField::NotFound => serializer.serialize_str(NO_GPS_DATA),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_error: Option<String>,
    pub raw_exif: AttributeMap,
    pub camera_make: String,
    pub camera_model: String,
    pub datetime_original: String,
    pub software: String,
    pub gps: GpsField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif_error: Option<String>,
    pub presence_report: PresenceReport,
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            format: None,
            size: None,
            mode: None,
            image_error: None,
            raw_exif: AttributeMap::new(),
            camera_make: UNKNOWN_VALUE.to_string(),
            camera_model: UNKNOWN_VALUE.to_string(),
            datetime_original: UNKNOWN_VALUE.to_string(),
            software: UNKNOWN_VALUE.to_string(),
            gps: GpsField::NotFound,
            exif_error: None,
            presence_report: PresenceReport::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PdfSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_info: Option<AttributeMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DocxSection {
    pub author: Option<String>,
    pub title: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub last_modified_by: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docx_error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AudioSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<AttributeMap>,
    /// Duración en segundos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_error: Option<String>,
}

/// Resumen legible que acompaña a las imágenes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageSummary {
    #[serde(rename = "Camera")]
    pub camera: String,
    #[serde(rename = "Taken On")]
    pub taken_on: String,
    #[serde(rename = "Software")]
    pub software: String,
    #[serde(rename = "GPS")]
    pub gps: GpsField,
}

impl ImageSummary {
    pub fn from_section(section: &ImageSection) -> Self {
        Self {
            camera: format!("{} {}", section.camera_make, section.camera_model),
            taken_on: section.datetime_original.clone(),
            software: section.software.clone(),
            gps: section.gps,
        }
    }
}

/// Única sección poblada del reporte, nombrada según el formato.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Image(ImageSection),
    Pdf(PdfSection),
    Docx(DocxSection),
    Audio(AudioSection),
    Note(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetadataReport {
    pub mime: String,
    #[serde(skip)]
    pub kind: SniffedType,
    #[serde(flatten)]
    pub section: ReportSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ImageSummary>,
}

impl MetadataReport {
    pub fn image(&self) -> Option<&ImageSection> {
        match &self.section {
            ReportSection::Image(section) => Some(section),
            _ => None,
        }
    }

    pub fn pdf(&self) -> Option<&PdfSection> {
        match &self.section {
            ReportSection::Pdf(section) => Some(section),
            _ => None,
        }
    }

    pub fn docx(&self) -> Option<&DocxSection> {
        match &self.section {
            ReportSection::Docx(section) => Some(section),
            _ => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioSection> {
        match &self.section {
            ReportSection::Audio(section) => Some(section),
            _ => None,
        }
    }

    pub fn note(&self) -> Option<&str> {
        match &self.section {
            ReportSection::Note(note) => Some(note),
            _ => None,
        }
    }
}
