//! Generadores de archivos de prueba construidos en memoria.

use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Document, Object, StringFormat, dictionary};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SAMPLE_CORE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
                   xmlns:dc="http://purl.org/dc/elements/1.1/"
                   xmlns:dcterms="http://purl.org/dc/terms/"
                   xmlns:dcmitype="http://purl.org/dc/dcmitype/"
                   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:creator>Autor Prueba</dc:creator>
    <cp:lastModifiedBy>Editor Prueba</cp:lastModifiedBy>
    <dcterms:created xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:created>
    <dcterms:modified xsi:type="dcterms:W3CDTF">2024-02-01T00:00:00Z</dcterms:modified>
    <dc:title>Documento Demo</dc:title>
    <dc:subject>Asunto Demo</dc:subject>
    <cp:revision>6</cp:revision>
</cp:coreProperties>
"#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>
"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>
"#;

const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:body>
        <w:p><w:r><w:t>Documento de prueba</w:t></w:r></w:p>
    </w:body>
</w:document>
"#;

// === Imágenes ===

pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    }))
}

pub fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x + y) % 2 == 0 { 255 } else { 0 };
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            64,
            alpha,
        ])
    }))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .expect("la imagen de prueba debería codificarse");
    buffer.into_inner()
}

pub fn encode_jpeg(image: &DynamicImage) -> Vec<u8> {
    encode(&DynamicImage::ImageRgb8(image.to_rgb8()), ImageFormat::Jpeg)
}

pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

pub fn encode_gif(image: &DynamicImage) -> Vec<u8> {
    encode(&DynamicImage::ImageRgba8(image.to_rgba8()), ImageFormat::Gif)
}

// === EXIF ===

fn ascii_field(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn dms_field(tag: Tag, degrees: u32, minutes: u32, seconds: u32) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(vec![
            Rational { num: degrees, denom: 1 },
            Rational { num: minutes, denom: 1 },
            Rational { num: seconds, denom: 1 },
        ]),
    }
}

pub fn camera_fields() -> Vec<Field> {
    vec![
        ascii_field(Tag::Make, "Canon"),
        ascii_field(Tag::Model, "EOS 5D"),
        ascii_field(Tag::Software, "FileLens Test"),
        ascii_field(Tag::DateTimeOriginal, "2024:05:01 10:20:30"),
    ]
}

/// 40°26'46" y 79°58'56" con las referencias indicadas.
pub fn gps_fields(latitude_ref: &str, longitude_ref: &str) -> Vec<Field> {
    vec![
        ascii_field(Tag::GPSLatitudeRef, latitude_ref),
        dms_field(Tag::GPSLatitude, 40, 26, 46),
        ascii_field(Tag::GPSLongitudeRef, longitude_ref),
        dms_field(Tag::GPSLongitude, 79, 58, 56),
    ]
}

/// Bloque TIFF con los campos dados, listo para un segmento APP1 o un chunk eXIf.
pub fn exif_tiff(fields: &[Field]) -> Vec<u8> {
    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut buffer = Cursor::new(Vec::new());
    writer
        .write(&mut buffer, false)
        .expect("el bloque EXIF de prueba debería escribirse");
    buffer.into_inner()
}

pub fn jpeg_with_exif(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    jpeg_with_app1(jpeg, &[b"Exif\0\0".as_slice(), tiff].concat())
}

/// Inserta un segmento APP1 justo después del marcador SOI.
pub fn jpeg_with_app1(jpeg: &[u8], payload: &[u8]) -> Vec<u8> {
    let length = u16::try_from(payload.len() + 2).expect("segmento APP1 demasiado grande");
    let mut output = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    output.extend_from_slice(&jpeg[..2]);
    output.extend_from_slice(&[0xFF, 0xE1]);
    output.extend_from_slice(&length.to_be_bytes());
    output.extend_from_slice(payload);
    output.extend_from_slice(&jpeg[2..]);
    output
}

// === PNG ===

const PNG_SIGNATURE_LEN: usize = 8;

/// PNG RGBA con un chunk tEXt y un chunk eXIf con el bloque TIFF dado.
pub fn png_with_metadata(image: &DynamicImage, tiff: &[u8]) -> Vec<u8> {
    let pixels = image.to_rgba8();
    let mut buffer = Vec::new();
    let mut encoder = png::Encoder::new(&mut buffer, pixels.width(), pixels.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder
        .add_text_chunk("Comment".to_string(), "secreto".to_string())
        .expect("el chunk tEXt debería aceptarse");

    let mut writer = encoder
        .write_header()
        .expect("el encabezado PNG debería escribirse");
    writer
        .write_chunk(png::chunk::ChunkType(*b"eXIf"), tiff)
        .expect("el chunk eXIf debería escribirse");
    writer
        .write_image_data(pixels.as_raw())
        .expect("los píxeles deberían escribirse");
    writer.finish().expect("el PNG debería cerrarse");
    buffer
}

pub fn png_chunk_types(png: &[u8]) -> Vec<String> {
    let mut kinds = Vec::new();
    let mut offset = PNG_SIGNATURE_LEN;
    while offset + 8 <= png.len() {
        let length = u32::from_be_bytes([
            png[offset],
            png[offset + 1],
            png[offset + 2],
            png[offset + 3],
        ]) as usize;
        kinds.push(String::from_utf8_lossy(&png[offset + 4..offset + 8]).into_owned());
        offset += 12 + length;
    }
    kinds
}

// === PDF y DOCX ===

/// PDF de dos páginas con un diccionario Info de tipos mixtos.
pub fn sample_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..2)
        .map(|_| {
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0_i64.into(), 0_i64.into(), 595_i64.into(), 842_i64.into()],
            }))
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2_i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Informe trimestral"),
        "Author" => Object::String(vec![0xFE, 0xFF, 0x00, b'H', 0x00, b'i'], StringFormat::Hexadecimal),
        "CreationDate" => Object::string_literal("D:20240101120000+01'00'"),
        "Revision" => 7_i64,
        "Trapped" => false,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .expect("el PDF de prueba debería guardarse");
    buffer
}

/// PDF de una página cuyo Info contiene un arreglo que se referencia a sí mismo
/// y otro que repite la misma referencia dos veces.
pub fn cyclic_info_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0_i64.into(), 0_i64.into(), 200_i64.into(), 200_i64.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1_i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });

    let loop_id = doc.new_object_id();
    doc.objects
        .insert(loop_id, Object::Array(vec![Object::Reference(loop_id)]));
    let word_id = doc.add_object(Object::string_literal("uno"));
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Ciclo"),
        "Loop" => loop_id,
        "Shared" => vec![Object::Reference(word_id), Object::Reference(word_id)],
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .expect("el PDF de prueba debería guardarse");
    buffer
}

/// Paquete Word mínimo; `word/document.xml` va primero para que la detección lo reconozca.
pub fn build_docx(core_xml: Option<&str>) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<'_, ()>::default().compression_method(CompressionMethod::Stored);

    let mut parts = vec![
        ("word/document.xml", DOCUMENT_XML),
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS_XML),
    ];
    if let Some(core_xml) = core_xml {
        parts.push(("docProps/core.xml", core_xml));
    }

    for (name, contents) in parts {
        writer
            .start_file(name, options)
            .expect("la entrada ZIP debería crearse");
        writer
            .write_all(contents.as_bytes())
            .expect("la entrada ZIP debería escribirse");
    }
    writer
        .finish()
        .expect("el ZIP de prueba debería cerrarse")
        .into_inner()
}

// === Audio ===

fn id3_frame(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut frame = id.to_vec();
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(payload);
    frame
}

fn synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// ID3v2.3 seguido de una trama MPEG-1 Layer III a 128 kbps y 16000 bytes de audio.
pub fn sample_mp3() -> Vec<u8> {
    let mut title = vec![1, 0xFF, 0xFE];
    for unit in "Canción de prueba".encode_utf16() {
        title.extend_from_slice(&unit.to_le_bytes());
    }

    let mut frames = id3_frame(b"TIT2", &title);
    frames.extend(id3_frame(b"TPE1", &[&[3_u8][..], "Artista Demo".as_bytes()].concat()));
    frames.extend(id3_frame(b"COMM", &[&[0_u8][..], b"spa\0", b"grabado en casa"].concat()));

    let mut mp3 = b"ID3".to_vec();
    mp3.extend_from_slice(&[3, 0, 0]);
    mp3.extend_from_slice(&synchsafe(frames.len() as u32));
    mp3.extend(frames);

    let mut audio = vec![0_u8; 16_000];
    audio[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
    mp3.extend(audio);
    mp3
}

/// PCM 8 kHz mono de 8 bits con medio segundo de silencio y un título INFO.
pub fn sample_wav() -> Vec<u8> {
    let mut fmt = Vec::new();
    fmt.extend_from_slice(&1_u16.to_le_bytes());
    fmt.extend_from_slice(&1_u16.to_le_bytes());
    fmt.extend_from_slice(&8000_u32.to_le_bytes());
    fmt.extend_from_slice(&8000_u32.to_le_bytes());
    fmt.extend_from_slice(&1_u16.to_le_bytes());
    fmt.extend_from_slice(&8_u16.to_le_bytes());

    let mut info = b"INFO".to_vec();
    info.extend_from_slice(b"INAM");
    info.extend_from_slice(&7_u32.to_le_bytes());
    info.extend_from_slice(b"Prueba\0\0");

    let mut body = b"WAVE".to_vec();
    for (id, payload) in [
        (b"fmt ", fmt),
        (b"LIST", info),
        (b"data", vec![0x80_u8; 4000]),
    ] {
        body.extend_from_slice(id);
        body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        body.extend(payload);
    }

    let mut wav = b"RIFF".to_vec();
    wav.extend_from_slice(&(body.len() as u32).to_le_bytes());
    wav.extend(body);
    wav
}

fn vorbis_comment_block(vendor: &str, comments: &[&str]) -> Vec<u8> {
    let mut block = (vendor.len() as u32).to_le_bytes().to_vec();
    block.extend_from_slice(vendor.as_bytes());
    block.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        block.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        block.extend_from_slice(comment.as_bytes());
    }
    block
}

/// 44.1 kHz estéreo de 16 bits con 88200 muestras; termina en el bloque de comentarios.
pub fn sample_flac() -> Vec<u8> {
    let mut streaminfo = Vec::with_capacity(34);
    streaminfo.extend_from_slice(&4096_u16.to_be_bytes());
    streaminfo.extend_from_slice(&4096_u16.to_be_bytes());
    streaminfo.extend_from_slice(&[0; 6]);
    let packed: u64 = (44_100_u64 << 44) | (1 << 41) | (15 << 36) | 88_200;
    streaminfo.extend_from_slice(&packed.to_be_bytes());
    streaminfo.extend_from_slice(&[0; 16]);

    let comments = vorbis_comment_block(
        "FileLens",
        &["TITLE=Pista FLAC", "ARTIST=Uno", "ARTIST=Dos"],
    );

    let mut flac = b"fLaC".to_vec();
    flac.push(0x00);
    flac.extend_from_slice(&(streaminfo.len() as u32).to_be_bytes()[1..]);
    flac.extend(streaminfo);
    flac.push(0x84);
    flac.extend_from_slice(&(comments.len() as u32).to_be_bytes()[1..]);
    flac.extend(comments);
    flac
}

fn ogg_page(header_type: u8, granule: u64, sequence: u32, packet: &[u8]) -> Vec<u8> {
    let mut page = b"OggS".to_vec();
    page.push(0);
    page.push(header_type);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&0x5EED_u32.to_le_bytes());
    page.extend_from_slice(&sequence.to_le_bytes());
    page.extend_from_slice(&[0; 4]);
    page.push(1);
    page.push(u8::try_from(packet.len()).expect("paquete de prueba demasiado grande"));
    page.extend_from_slice(packet);
    page
}

/// Opus con pre-skip de 312 y granule final 48312: exactamente un segundo.
pub fn sample_opus() -> Vec<u8> {
    let mut head = b"OpusHead".to_vec();
    head.extend_from_slice(&[1, 2]);
    head.extend_from_slice(&312_u16.to_le_bytes());
    head.extend_from_slice(&48_000_u32.to_le_bytes());
    head.extend_from_slice(&[0, 0, 0]);

    let mut tags = b"OpusTags".to_vec();
    tags.extend(vorbis_comment_block("FileLens", &["ALBUM=Opus Demo"]));

    let mut ogg = ogg_page(0x02, 0, 0, &head);
    ogg.extend(ogg_page(0x00, 0, 1, &tags));
    ogg.extend(ogg_page(0x04, 48_312, 2, &[0xFC, 0, 0, 0]));
    ogg
}

fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut atom = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    atom.extend_from_slice(kind);
    atom.extend_from_slice(payload);
    atom
}

fn mp4_data(type_code: u32, value: &[u8]) -> Vec<u8> {
    let mut payload = type_code.to_be_bytes().to_vec();
    payload.extend_from_slice(&[0; 4]);
    payload.extend_from_slice(value);
    mp4_box(b"data", &payload)
}

/// M4A con mvhd de tres segundos y una lista de etiquetas estilo iTunes.
pub fn sample_m4a() -> Vec<u8> {
    let mut mvhd = vec![0_u8; 12];
    mvhd.extend_from_slice(&1000_u32.to_be_bytes());
    mvhd.extend_from_slice(&3000_u32.to_be_bytes());
    mvhd.extend_from_slice(&[0; 80]);

    let mut freeform = mp4_box(b"mean", b"\0\0\0\0com.apple.iTunes");
    freeform.extend(mp4_box(b"name", b"\0\0\0\0MOOD"));
    freeform.extend(mp4_data(1, b"tranquilo"));

    let mut ilst = mp4_box(b"\xA9nam", &mp4_data(1, "Tema M4A".as_bytes()));
    ilst.extend(mp4_box(b"\xA9ART", &mp4_data(1, b"Banda")));
    ilst.extend(mp4_box(b"trkn", &mp4_data(0, &[0, 0, 0, 3, 0, 10, 0, 0])));
    ilst.extend(mp4_box(b"----", &freeform));

    let mut meta = vec![0_u8; 4];
    meta.extend(mp4_box(b"ilst", &ilst));
    let udta = mp4_box(b"meta", &meta);

    let mut moov = mp4_box(b"mvhd", &mvhd);
    moov.extend(mp4_box(b"udta", &udta));

    let mut m4a = mp4_box(b"ftyp", b"M4A \0\0\0\0M4A isom");
    m4a.extend(mp4_box(b"mdat", &[0_u8; 64]));
    m4a.extend(mp4_box(b"moov", &moov));
    m4a
}
