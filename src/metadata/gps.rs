//! Conversión de coordenadas GPS EXIF (grados, minutos, segundos) a grados decimales.

use super::image::ascii_text;
use super::report::GpsCoordinate;
use exif::{Exif, Field, In, Rational, Tag, Value};

/// Calcula `d + m/60 + s/3600`; `None` si la tripleta está mal formada.
pub fn to_decimal_degrees(components: &[Rational]) -> Option<f64> {
    let [degrees, minutes, seconds] = components else {
        return None;
    };
    let value = ratio(degrees) + ratio(minutes) / 60.0 + ratio(seconds) / 3600.0;
    value.is_finite().then_some(value)
}

/// Positivo solo si la referencia de hemisferio coincide exactamente con `positive`.
pub fn signed_coordinate(value: f64, reference: &str, positive: &str) -> f64 {
    if reference == positive { value } else { -value }
}

/// Requiere los cuatro campos crudos (latitud, su referencia, longitud, su referencia).
pub fn gps_from_exif(exif: &Exif) -> Option<GpsCoordinate> {
    let latitude = rationals(exif.get_field(Tag::GPSLatitude, In::PRIMARY)?)?;
    let latitude_ref = ascii_text(exif.get_field(Tag::GPSLatitudeRef, In::PRIMARY)?)?;
    let longitude = rationals(exif.get_field(Tag::GPSLongitude, In::PRIMARY)?)?;
    let longitude_ref = ascii_text(exif.get_field(Tag::GPSLongitudeRef, In::PRIMARY)?)?;

    Some(GpsCoordinate {
        latitude: signed_coordinate(to_decimal_degrees(latitude)?, &latitude_ref, "N"),
        longitude: signed_coordinate(to_decimal_degrees(longitude)?, &longitude_ref, "E"),
    })
}

fn ratio(value: &Rational) -> f64 {
    f64::from(value.num) / f64::from(value.denom)
}

fn rationals(field: &Field) -> Option<&[Rational]> {
    match &field.value {
        Value::Rational(values) => Some(values),
        _ => None,
    }
}
