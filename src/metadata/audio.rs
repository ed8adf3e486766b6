//! Extracción de etiquetas y duración para audio.
//!
//! Los lectores trabajan sobre un archivo temporal con búsqueda aleatoria; el
//! archivo vive solo durante la llamada y se elimina al soltarse, también
//! cuando la lectura falla a mitad de camino.

use super::report::{AttributeMap, AttributeValue, AudioSection};
use crate::constants::AUDIO_TEMP_PREFIX;
use crate::error::ExtractError;
use log::{debug, warn};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Ventana en la que se busca la primera trama MPEG tras la etiqueta ID3.
const MPEG_SYNC_WINDOW: usize = 64 * 1024;
/// Tope para el átomo moov de un M4A.
const MP4_MOOV_LIMIT: u64 = 8 * 1024 * 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AudioFormat {
    Mp3,
    Flac,
    Wav,
    Ogg,
    Mp4,
}

impl AudioFormat {
    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "audio/mpeg" | "audio/mp3" => Some(AudioFormat::Mp3),
            "audio/x-flac" | "audio/flac" => Some(AudioFormat::Flac),
            "audio/x-wav" | "audio/wav" | "audio/wave" => Some(AudioFormat::Wav),
            "audio/ogg" | "audio/opus" | "audio/vorbis" => Some(AudioFormat::Ogg),
            "audio/m4a" | "audio/mp4" | "audio/x-m4a" => Some(AudioFormat::Mp4),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => ".mp3",
            AudioFormat::Flac => ".flac",
            AudioFormat::Wav => ".wav",
            AudioFormat::Ogg => ".ogg",
            AudioFormat::Mp4 => ".m4a",
        }
    }
}

pub fn extract_audio_metadata(bytes: &[u8], mime: &str) -> AudioSection {
    extract_audio_metadata_in(bytes, mime, &std::env::temp_dir())
}

fn extract_audio_metadata_in(bytes: &[u8], mime: &str, scratch_dir: &Path) -> AudioSection {
    let mut section = AudioSection::default();
    let Some(format) = AudioFormat::from_mime(mime) else {
        debug!("{mime} no tiene lector de etiquetas");
        return section;
    };

    if let Err(error) = read_audio(bytes, format, scratch_dir, &mut section) {
        warn!("no se pudo leer la metadata de audio: {error}");
        section.audio_error = Some(error.to_string());
    }
    section
}

fn read_audio(
    bytes: &[u8],
    format: AudioFormat,
    scratch_dir: &Path,
    section: &mut AudioSection,
) -> Result<(), ExtractError> {
    let mut temp = tempfile::Builder::new()
        .prefix(AUDIO_TEMP_PREFIX)
        .suffix(format.extension())
        .tempfile_in(scratch_dir)?;
    debug!("audio materializado en {}", temp.path().display());
    temp.write_all(bytes)?;
    temp.flush()?;

    let mut file = temp.reopen()?;
    section.tags = Some(AttributeMap::new());
    match format {
        AudioFormat::Mp3 => read_mp3(&mut file, section),
        AudioFormat::Flac => read_flac(&mut file, section),
        AudioFormat::Wav => read_wav(&mut file, section),
        AudioFormat::Ogg => read_ogg(&mut file, section),
        AudioFormat::Mp4 => read_mp4(&mut file, section),
    }
}

fn push_tag(section: &mut AudioSection, key: impl Into<String>, value: impl Into<AttributeValue>) {
    section
        .tags
        .get_or_insert_with(AttributeMap::new)
        .insert(key, value);
}

/// Lee exactamente `size` bytes sin reservar más de lo que el archivo contiene;
/// un tamaño declarado mayor que el resto del archivo es un bloque truncado.
fn read_payload<R: Read>(reader: &mut R, size: u64) -> Result<Vec<u8>, ExtractError> {
    let mut payload = Vec::new();
    Read::by_ref(reader).take(size).read_to_end(&mut payload)?;
    if (payload.len() as u64) < size {
        return Err(ExtractError::Malformed(format!(
            "Bloque truncado: se esperaban {size} bytes y hay {}",
            payload.len()
        )));
    }
    Ok(payload)
}

/// Los campos repetidos (p. ej. varios ARTIST) se acumulan separados por `; `.
fn push_joined_tag(section: &mut AudioSection, key: String, value: String) {
    let tags = section.tags.get_or_insert_with(AttributeMap::new);
    let joined = match tags.text(&key) {
        Some(existing) => format!("{existing}; {value}"),
        None => value,
    };
    tags.insert(key, joined);
}

// === MP3 ===

struct Id3Header {
    major: u8,
    extended: bool,
    tag_size: u64,
    total_size: u64,
}

fn read_mp3(file: &mut File, section: &mut AudioSection) -> Result<(), ExtractError> {
    let file_size = file.metadata()?.len();

    let audio_offset = match read_id3_header(file)? {
        Some(header) => {
            let tag_data = read_payload(file, header.tag_size)?;
            parse_id3_frames(&tag_data, &header, section);
            header.total_size
        }
        None => 0,
    };

    file.seek(SeekFrom::Start(audio_offset))?;
    let mut window = Vec::with_capacity(MPEG_SYNC_WINDOW);
    Read::by_ref(file)
        .take(MPEG_SYNC_WINDOW as u64)
        .read_to_end(&mut window)?;

    let (position, frame) = find_mpeg_frame(&window)
        .ok_or_else(|| ExtractError::Malformed("No se encontró una trama MPEG".to_string()))?;

    let frames = find_bytes(&window[position..], b"Xing")
        .or_else(|| find_bytes(&window[position..], b"Info"))
        .and_then(|idx| parse_xing_frames(&window[position..], idx));

    section.length = match (frames, frame.sample_rate) {
        (Some(frames), Some(rate)) => {
            Some(f64::from(frames) * f64::from(frame.samples_per_frame) / f64::from(rate))
        }
        _ => frame.bitrate_kbps.map(|bitrate| {
            let audio_size = file_size.saturating_sub(audio_offset + position as u64);
            (audio_size as f64 * 8.0) / (f64::from(bitrate) * 1000.0)
        }),
    };
    Ok(())
}

fn read_id3_header(file: &mut File) -> Result<Option<Id3Header>, ExtractError> {
    let mut header = [0_u8; 10];
    if file.read_exact(&mut header).is_err() || &header[0..3] != b"ID3" {
        file.seek(SeekFrom::Start(0))?;
        return Ok(None);
    }
    let major = header[3];
    let flags = header[5];
    let tag_size = u64::from(synchsafe_to_u32(&header[6..10]));
    let footer = if major >= 4 && flags & 0x10 != 0 { 10 } else { 0 };
    Ok(Some(Id3Header {
        major,
        extended: flags & 0x40 != 0,
        tag_size,
        total_size: 10 + tag_size + footer,
    }))
}

fn parse_id3_frames(tag_data: &[u8], header: &Id3Header, section: &mut AudioSection) {
    let major = header.major;
    let (id_len, header_len) = if major == 2 { (3, 6) } else { (4, 10) };
    let mut offset = if header.extended {
        extended_header_len(tag_data, major)
    } else {
        0
    };

    while offset + header_len <= tag_data.len() {
        let frame_id = &tag_data[offset..offset + id_len];
        if frame_id.iter().all(|b| *b == 0) {
            break;
        }
        let size_bytes = &tag_data[offset + id_len..offset + header_len];
        let frame_size = match major {
            2 => (usize::from(size_bytes[0]) << 16)
                | (usize::from(size_bytes[1]) << 8)
                | usize::from(size_bytes[2]),
            3 => u32::from_be_bytes([size_bytes[0], size_bytes[1], size_bytes[2], size_bytes[3]])
                as usize,
            _ => synchsafe_to_u32(&size_bytes[0..4]) as usize,
        };
        let frame_start = offset + header_len;
        let frame_end = frame_start + frame_size;
        if frame_end > tag_data.len() {
            break;
        }

        let id = String::from_utf8_lossy(frame_id).into_owned();
        let frame = &tag_data[frame_start..frame_end];
        if let Some((key, value)) = decode_id3_frame(&id, frame) {
            push_tag(section, key, value);
        }
        offset = frame_end;
    }
}

/// En v2.3 el tamaño declarado excluye sus propios cuatro bytes; en v2.4 los incluye.
fn extended_header_len(tag_data: &[u8], major: u8) -> usize {
    if tag_data.len() < 4 || major < 3 {
        return 0;
    }
    match major {
        3 => 4 + u32::from_be_bytes([tag_data[0], tag_data[1], tag_data[2], tag_data[3]]) as usize,
        _ => synchsafe_to_u32(&tag_data[0..4]) as usize,
    }
}

fn decode_id3_frame(id: &str, frame: &[u8]) -> Option<(String, String)> {
    match id {
        "TXXX" | "TXX" => {
            let (&encoding, rest) = frame.split_first()?;
            let (description, value) = split_terminated(rest, encoding);
            Some((
                format!("{id}:{}", decode_id3_text(encoding, description)),
                decode_id3_text(encoding, value),
            ))
        }
        "COMM" | "COM" | "USLT" | "ULT" => {
            if frame.len() < 4 {
                return None;
            }
            let encoding = frame[0];
            let language = String::from_utf8_lossy(&frame[1..4]).into_owned();
            let (description, value) = split_terminated(&frame[4..], encoding);
            Some((
                format!("{id}:{}:{language}", decode_id3_text(encoding, description)),
                decode_id3_text(encoding, value),
            ))
        }
        "APIC" | "PIC" => {
            let (&encoding, rest) = frame.split_first()?;
            let (mime, rest) = split_terminated(rest, 0);
            let description = rest
                .split_first()
                .map(|(_, rest)| split_terminated(rest, encoding).0)
                .map(|description| decode_id3_text(encoding, description))
                .unwrap_or_default();
            Some((
                format!("{id}:{description}"),
                format!("{} ({} bytes)", String::from_utf8_lossy(mime), frame.len()),
            ))
        }
        _ if id.starts_with('T') => {
            let (&encoding, rest) = frame.split_first()?;
            Some((id.to_string(), decode_id3_text(encoding, rest)))
        }
        _ if id.starts_with('W') => Some((
            id.to_string(),
            String::from_utf8_lossy(frame)
                .trim_matches(char::from(0))
                .to_string(),
        )),
        _ => Some((id.to_string(), format!("{} bytes", frame.len()))),
    }
}

/// Separa un campo terminado en NUL (uno o dos bytes según la codificación).
fn split_terminated(data: &[u8], encoding: u8) -> (&[u8], &[u8]) {
    if matches!(encoding, 1 | 2) {
        let mut idx = 0;
        while idx + 1 < data.len() {
            if data[idx] == 0 && data[idx + 1] == 0 {
                return (&data[..idx], &data[idx + 2..]);
            }
            idx += 2;
        }
        (data, &[])
    } else {
        match data.iter().position(|b| *b == 0) {
            Some(idx) => (&data[..idx], &data[idx + 1..]),
            None => (data, &[]),
        }
    }
}

fn decode_id3_text(encoding: u8, data: &[u8]) -> String {
    let text = match encoding {
        1 => decode_utf16(data, data.starts_with(&[0xFF, 0xFE])),
        2 => decode_utf16(data, false),
        3 => String::from_utf8_lossy(data).into_owned(),
        _ => data.iter().map(|&byte| char::from(byte)).collect(),
    };
    let text = text.trim_start_matches('\u{feff}');
    text.trim_end_matches(char::from(0))
        .replace(char::from(0), "/")
        .trim()
        .to_string()
}

fn decode_utf16(data: &[u8], little_endian: bool) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|chunk| {
            if little_endian {
                u16::from_le_bytes([chunk[0], chunk[1]])
            } else {
                u16::from_be_bytes([chunk[0], chunk[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

struct MpegFrame {
    bitrate_kbps: Option<u32>,
    sample_rate: Option<u32>,
    samples_per_frame: u32,
}

fn find_mpeg_frame(window: &[u8]) -> Option<(usize, MpegFrame)> {
    window.windows(4).enumerate().find_map(|(idx, bytes)| {
        if bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
            return None;
        }
        let header = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        parse_mpeg_header(header).map(|frame| (idx, frame))
    })
}

fn parse_mpeg_header(header: u32) -> Option<MpegFrame> {
    let version_bits = (header >> 19) & 0x3;
    let layer_bits = (header >> 17) & 0x3;
    let bitrate_index = (header >> 12) & 0xF;
    let sample_index = (header >> 10) & 0x3;
    if version_bits == 0b01 || layer_bits == 0 || bitrate_index == 0xF || sample_index == 0x3 {
        return None;
    }

    let sample_rate = match version_bits {
        0b11 => mp3_sample_rate(sample_index, 44100, 48000, 32000),
        0b10 => mp3_sample_rate(sample_index, 22050, 24000, 16000),
        _ => mp3_sample_rate(sample_index, 11025, 12000, 8000),
    };
    let samples_per_frame = match (layer_bits, version_bits) {
        (0b11, _) => 384,
        (0b01, 0b11) | (0b10, _) => 1152,
        _ => 576,
    };

    Some(MpegFrame {
        bitrate_kbps: mp3_bitrate(layer_bits, version_bits, bitrate_index),
        sample_rate,
        samples_per_frame,
    })
}

fn mp3_sample_rate(index: u32, a: u32, b: u32, c: u32) -> Option<u32> {
    match index {
        0 => Some(a),
        1 => Some(b),
        2 => Some(c),
        _ => None,
    }
}

fn mp3_bitrate(layer_bits: u32, version_bits: u32, index: u32) -> Option<u32> {
    if index == 0 || index == 0xF {
        return None;
    }
    let table = match (version_bits, layer_bits) {
        (0b11, 0b01) => [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
        (0b11, 0b10) => [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
        (0b11, 0b11) => [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
        (_, 0b11) => [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
        _ => [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
    };
    Some(table[index as usize])
}

fn parse_xing_frames(data: &[u8], idx: usize) -> Option<u32> {
    let flags = data.get(idx + 4..idx + 8)?;
    if flags[3] & 0x1 == 0 {
        return None;
    }
    let frames = data.get(idx + 8..idx + 12)?;
    Some(u32::from_be_bytes([frames[0], frames[1], frames[2], frames[3]]))
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn synchsafe_to_u32(bytes: &[u8]) -> u32 {
    let mut value = 0_u32;
    for &b in bytes {
        value = (value << 7) | (u32::from(b) & 0x7F);
    }
    value
}

// === FLAC ===

fn read_flac(file: &mut File, section: &mut AudioSection) -> Result<(), ExtractError> {
    let mut signature = [0_u8; 4];
    file.read_exact(&mut signature)?;
    if &signature != b"fLaC" {
        return Err(ExtractError::Malformed("Firma FLAC ausente".to_string()));
    }

    let mut is_last = false;
    while !is_last {
        let mut header = [0_u8; 4];
        file.read_exact(&mut header)?;
        is_last = header[0] & 0x80 != 0;
        let block_type = header[0] & 0x7F;
        let length =
            (u64::from(header[1]) << 16) | (u64::from(header[2]) << 8) | u64::from(header[3]);

        match block_type {
            0 | 4 => {
                let payload = read_payload(file, length)?;
                if block_type == 0 {
                    section.length = flac_duration(&payload);
                } else {
                    parse_vorbis_comments(&payload, section);
                }
            }
            _ => {
                file.seek(SeekFrom::Current(length as i64))?;
            }
        }
    }
    Ok(())
}

fn flac_duration(streaminfo: &[u8]) -> Option<f64> {
    if streaminfo.len() < 18 {
        return None;
    }
    let sample_rate = (u32::from(streaminfo[10]) << 12)
        | (u32::from(streaminfo[11]) << 4)
        | (u32::from(streaminfo[12]) >> 4);
    let total_samples = ((u64::from(streaminfo[13]) & 0x0F) << 32)
        | (u64::from(streaminfo[14]) << 24)
        | (u64::from(streaminfo[15]) << 16)
        | (u64::from(streaminfo[16]) << 8)
        | u64::from(streaminfo[17]);
    (sample_rate > 0).then(|| total_samples as f64 / f64::from(sample_rate))
}

fn parse_vorbis_comments(payload: &[u8], section: &mut AudioSection) {
    let mut cursor = payload;
    let vendor_len = read_u32_le(&mut cursor) as usize;
    if cursor.len() < vendor_len {
        return;
    }
    cursor = &cursor[vendor_len..];

    let count = read_u32_le(&mut cursor);
    for _ in 0..count {
        let len = read_u32_le(&mut cursor) as usize;
        if cursor.len() < len {
            break;
        }
        let entry = String::from_utf8_lossy(&cursor[..len]).into_owned();
        cursor = &cursor[len..];
        if let Some((key, value)) = entry.split_once('=') {
            push_joined_tag(section, key.to_string(), value.to_string());
        }
    }
}

fn read_u32_le(cursor: &mut &[u8]) -> u32 {
    if cursor.len() < 4 {
        *cursor = &[];
        return 0;
    }
    let value = u32::from_le_bytes([cursor[0], cursor[1], cursor[2], cursor[3]]);
    *cursor = &cursor[4..];
    value
}

// === WAV ===

fn read_wav(file: &mut File, section: &mut AudioSection) -> Result<(), ExtractError> {
    let mut header = [0_u8; 12];
    file.read_exact(&mut header)?;
    if &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        return Err(ExtractError::Malformed("Encabezado RIFF/WAVE ausente".to_string()));
    }

    let mut byte_rate = None;
    let mut data_size = None;
    loop {
        let mut chunk_header = [0_u8; 8];
        if file.read_exact(&mut chunk_header).is_err() {
            break;
        }
        let size = u32::from_le_bytes([
            chunk_header[4],
            chunk_header[5],
            chunk_header[6],
            chunk_header[7],
        ]);

        match &chunk_header[0..4] {
            b"fmt " => {
                let payload = read_payload(file, u64::from(size))?;
                if payload.len() >= 12 {
                    byte_rate = Some(u32::from_le_bytes([
                        payload[8],
                        payload[9],
                        payload[10],
                        payload[11],
                    ]));
                }
            }
            b"LIST" => {
                let payload = read_payload(file, u64::from(size))?;
                if let Some(info) = payload.strip_prefix(b"INFO") {
                    parse_riff_info(info, section);
                }
            }
            b"data" => {
                data_size = Some(size);
                file.seek(SeekFrom::Current(i64::from(size)))?;
            }
            _ => {
                file.seek(SeekFrom::Current(i64::from(size)))?;
            }
        }
        if size % 2 == 1 {
            file.seek(SeekFrom::Current(1))?;
        }
    }

    if let (Some(rate), Some(size)) = (byte_rate, data_size)
        && rate > 0
    {
        section.length = Some(f64::from(size) / f64::from(rate));
    }
    Ok(())
}

fn parse_riff_info(mut data: &[u8], section: &mut AudioSection) {
    while data.len() >= 8 {
        let id = String::from_utf8_lossy(&data[0..4]).into_owned();
        let size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let end = 8 + size;
        if end > data.len() {
            break;
        }
        let value = String::from_utf8_lossy(&data[8..end])
            .trim_matches(char::from(0))
            .trim()
            .to_string();
        push_tag(section, id, value);
        let padded = end + size % 2;
        data = data.get(padded..).unwrap_or_default();
    }
}

// === OGG ===

fn read_ogg(file: &mut File, section: &mut AudioSection) -> Result<(), ExtractError> {
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    if !data.starts_with(b"OggS") {
        return Err(ExtractError::Malformed("Página OGG inicial ausente".to_string()));
    }

    let mut sample_rate = None;
    let mut pre_skip = 0_u64;
    let mut last_granule = None;
    let mut packet = Vec::new();
    let mut packets_seen = 0;
    let mut offset = 0;

    while offset + 27 <= data.len() && &data[offset..offset + 4] == b"OggS" {
        let mut granule_bytes = [0_u8; 8];
        granule_bytes.copy_from_slice(&data[offset + 6..offset + 14]);
        let granule = u64::from_le_bytes(granule_bytes);
        if granule != u64::MAX {
            last_granule = Some(granule);
        }

        let segments = usize::from(data[offset + 26]);
        let table_start = offset + 27;
        let table_end = table_start + segments;
        if table_end > data.len() {
            return Err(ExtractError::Malformed("Página OGG truncada".to_string()));
        }

        let mut cursor = table_end;
        for &lacing in &data[table_start..table_end] {
            let end = cursor + usize::from(lacing);
            if end > data.len() {
                return Err(ExtractError::Malformed("Página OGG truncada".to_string()));
            }
            // Solo interesan los encabezados de identificación y comentarios.
            if packets_seen < 2 {
                packet.extend_from_slice(&data[cursor..end]);
                if lacing < 255 {
                    handle_ogg_header(&packet, section, &mut sample_rate, &mut pre_skip);
                    packet.clear();
                    packets_seen += 1;
                }
            }
            cursor = end;
        }
        offset = cursor;
    }

    if let (Some(rate), Some(granule)) = (sample_rate, last_granule)
        && rate > 0
    {
        section.length = Some(granule.saturating_sub(pre_skip) as f64 / f64::from(rate));
    }
    Ok(())
}

fn handle_ogg_header(
    packet: &[u8],
    section: &mut AudioSection,
    sample_rate: &mut Option<u32>,
    pre_skip: &mut u64,
) {
    if packet.starts_with(b"OpusHead") {
        *sample_rate = Some(48_000);
        if let Some(bytes) = packet.get(10..12) {
            *pre_skip = u64::from(u16::from_le_bytes([bytes[0], bytes[1]]));
        }
    } else if let Some(comments) = packet.strip_prefix(b"OpusTags") {
        parse_vorbis_comments(comments, section);
    } else if packet.len() > 7 && packet[0] == 0x01 && &packet[1..7] == b"vorbis" {
        *sample_rate = packet
            .get(12..16)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]));
    } else if packet.len() > 7 && packet[0] == 0x03 && &packet[1..7] == b"vorbis" {
        parse_vorbis_comments(&packet[7..], section);
    }
}

// === MP4 / M4A ===

struct BoxHeader {
    kind: [u8; 4],
    header_len: u64,
    payload_size: u64,
}

fn read_mp4(file: &mut File, section: &mut AudioSection) -> Result<(), ExtractError> {
    let file_size = file.metadata()?.len();
    let mut position = 0_u64;
    while file_size.saturating_sub(position) >= 8 {
        file.seek(SeekFrom::Start(position))?;
        let header = read_box_header(file, file_size - position)?;
        if &header.kind == b"moov" {
            if header.payload_size > MP4_MOOV_LIMIT {
                return Err(ExtractError::Malformed(format!(
                    "Átomo moov demasiado grande ({} bytes)",
                    header.payload_size
                )));
            }
            let moov = read_payload(file, header.payload_size)?;
            parse_moov(&moov, section);
            return Ok(());
        }
        position = position
            .saturating_add(header.header_len)
            .saturating_add(header.payload_size);
    }
    Err(ExtractError::Malformed("No se encontró el átomo moov".to_string()))
}

/// Tamaño 1 trae un largesize de 64 bits; tamaño 0 se extiende hasta el final del archivo.
fn read_box_header<R: Read>(reader: &mut R, remaining: u64) -> Result<BoxHeader, ExtractError> {
    let mut raw = [0_u8; 8];
    reader.read_exact(&mut raw)?;
    let size = u64::from(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]));
    let kind = [raw[4], raw[5], raw[6], raw[7]];
    let (header_len, total) = match size {
        0 => (8, remaining),
        1 => {
            let mut large = [0_u8; 8];
            reader.read_exact(&mut large)?;
            (16, u64::from_be_bytes(large))
        }
        _ => (8, size),
    };
    if total < header_len {
        return Err(ExtractError::Malformed(format!("Tamaño de átomo inválido: {total}")));
    }
    Ok(BoxHeader {
        kind,
        header_len,
        payload_size: total - header_len,
    })
}

/// Átomos hijos dentro de un búfer; se detiene en el primero que no cabe.
fn child_boxes(data: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut rest = data;
    std::iter::from_fn(move || {
        if rest.len() < 8 {
            return None;
        }
        let size = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let kind = [rest[4], rest[5], rest[6], rest[7]];
        let (header_len, total) = match size {
            0 => (8, rest.len()),
            1 => {
                let large: [u8; 8] = rest.get(8..16)?.try_into().ok()?;
                (16, usize::try_from(u64::from_be_bytes(large)).ok()?)
            }
            _ => (8, size),
        };
        if total < header_len || total > rest.len() {
            return None;
        }
        let (current, tail) = rest.split_at(total);
        rest = tail;
        Some((kind, &current[header_len..]))
    })
}

fn parse_moov(moov: &[u8], section: &mut AudioSection) {
    for (kind, payload) in child_boxes(moov) {
        match &kind {
            b"mvhd" => section.length = mvhd_duration(payload),
            b"meta" => parse_meta(payload, section),
            b"udta" => {
                for (kind, payload) in child_boxes(payload) {
                    if &kind == b"meta" {
                        parse_meta(payload, section);
                    }
                }
            }
            _ => {}
        }
    }
}

fn mvhd_duration(payload: &[u8]) -> Option<f64> {
    let (timescale, duration) = match payload.first()? {
        1 => {
            let duration: [u8; 8] = payload.get(24..32)?.try_into().ok()?;
            (be_u32(payload.get(20..24)?), u64::from_be_bytes(duration))
        }
        _ => (
            be_u32(payload.get(12..16)?),
            u64::from(be_u32(payload.get(16..20)?)),
        ),
    };
    (timescale > 0).then(|| duration as f64 / f64::from(timescale))
}

/// `meta` es un full box: versión y flags ocupan los primeros cuatro bytes.
fn parse_meta(payload: &[u8], section: &mut AudioSection) {
    let Some(children) = payload.get(4..) else {
        return;
    };
    for (kind, ilst) in child_boxes(children) {
        if &kind == b"ilst" {
            parse_ilst(ilst, section);
        }
    }
}

fn parse_ilst(ilst: &[u8], section: &mut AudioSection) {
    for (kind, item) in child_boxes(ilst) {
        let mut mean = String::new();
        let mut name = String::new();
        let mut values = Vec::new();
        for (child, payload) in child_boxes(item) {
            let text = || String::from_utf8_lossy(payload.get(4..).unwrap_or_default()).into_owned();
            match &child {
                b"mean" => mean = text(),
                b"name" => name = text(),
                b"data" => values.extend(decode_mp4_data(&kind, payload)),
                _ => {}
            }
        }

        let key = if &kind == b"----" {
            format!("----:{mean}:{name}")
        } else {
            kind.iter().map(|&byte| char::from(byte)).collect()
        };
        for value in values {
            push_joined_tag(section, key.clone(), value);
        }
    }
}

/// Cuerpo de un átomo `data`: tipo (4 bytes), locale (4 bytes) y el valor.
fn decode_mp4_data(kind: &[u8; 4], payload: &[u8]) -> Option<String> {
    let type_code = be_u32(payload.get(0..4)?) & 0x00FF_FFFF;
    let value = payload.get(8..)?;
    match (kind, type_code) {
        (b"trkn" | b"disk", _) if value.len() >= 6 => {
            let number = u16::from_be_bytes([value[2], value[3]]);
            let total = u16::from_be_bytes([value[4], value[5]]);
            Some(if total > 0 {
                format!("{number}/{total}")
            } else {
                number.to_string()
            })
        }
        (_, 1) => Some(
            String::from_utf8_lossy(value)
                .trim_matches(char::from(0))
                .to_string(),
        ),
        (_, 2) => Some(decode_utf16(value, false)),
        (_, 21) => mp4_integer(value, true),
        (_, 22) => mp4_integer(value, false),
        _ => Some(format!("{} bytes", value.len())),
    }
}

fn mp4_integer(value: &[u8], signed: bool) -> Option<String> {
    let text = match (value.len(), signed) {
        (1, true) => i8::from_be_bytes([value[0]]).to_string(),
        (1, false) => value[0].to_string(),
        (2, true) => i16::from_be_bytes([value[0], value[1]]).to_string(),
        (2, false) => u16::from_be_bytes([value[0], value[1]]).to_string(),
        (4, true) => i32::from_be_bytes(value.try_into().ok()?).to_string(),
        (4, false) => u32::from_be_bytes(value.try_into().ok()?).to_string(),
        (8, true) => i64::from_be_bytes(value.try_into().ok()?).to_string(),
        (8, false) => u64::from_be_bytes(value.try_into().ok()?).to_string(),
        _ => return Some(format!("{} bytes", value.len())),
    };
    Some(text)
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
