//! Fonts for the holder name.
//!
//! Text is set in WinAnsi (Windows-1252) so the same byte string drives both
//! measuring and drawing. Characters outside it are replaced with `?`.

use std::sync::LazyLock;

use bytes::Bytes;
use domains::FontSource;
use lopdf::{dictionary, Document, Encoding, Object, ObjectId, Stream};
use tracing::warn;
use ttf_parser::{name_id, Face};

const FIRST_CHAR: u8 = 0x20;
const REPLACEMENT: u8 = b'?';
const BUILT_IN_NAME: &str = "Helvetica-Bold";
const FALLBACK_POSTSCRIPT_NAME: &str = "BadgeDisplay";

/// Helvetica-Bold advance widths for 0x20..=0xFF in WinAnsi, 1000 units/em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 224] = [
    // 0x20
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0x30
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    // 0x40
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    // 0x50
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    // 0x60
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    // 0x70
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 350,
    // 0x80
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    // 0x90
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667,
    // 0xA0
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    // 0xB0
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // 0xC0
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    // 0xD0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // 0xE0
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    // 0xF0
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// The WinAnsi code table lopdf reads `/WinAnsiEncoding` fonts with, so
/// measuring and drawing agree with how the document is decoded.
static WIN_ANSI: LazyLock<[Option<u16>; 256]> = LazyLock::new(|| {
    let font = dictionary! { "Type" => "Font", "Encoding" => "WinAnsiEncoding" };
    match font.get_font_encoding(&Document::new()) {
        Ok(Encoding::OneByteEncoding(table)) => *table,
        _ => [None; 256],
    }
});

fn win_ansi_byte(ch: char) -> Option<u8> {
    let unit = u16::try_from(u32::from(ch)).ok()?;
    WIN_ANSI
        .iter()
        .position(|&code| code == Some(unit))
        .and_then(|byte| u8::try_from(byte).ok())
}

fn win_ansi_char(byte: u8) -> Option<char> {
    WIN_ANSI[usize::from(byte)].and_then(|unit| char::from_u32(u32::from(unit)))
}

/// Encodes `text` as WinAnsi, replacing anything unencodable with `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| win_ansi_byte(ch).unwrap_or(REPLACEMENT))
        .collect()
}

/// A TrueType/OpenType program prepared for embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    program: Bytes,
    postscript_name: String,
    widths: [u16; 224],
    ascent: i64,
    descent: i64,
    cap_height: i64,
    bbox: [i64; 4],
    italic_angle: f32,
}

impl EmbeddedFont {
    fn parse(program: Bytes) -> Result<Self, ttf_parser::FaceParsingError> {
        let face = Face::parse(&program, 0)?;
        let upem = f64::from(face.units_per_em().max(1));
        let scale = |v: i16| (f64::from(v) * 1000.0 / upem).round() as i64;

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| name.chars().filter(|c| c.is_ascii_graphic()).collect::<String>())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_POSTSCRIPT_NAME.to_string());

        let advance = |ch: char| {
            face.glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .map(|adv| (f64::from(adv) * 1000.0 / upem).round() as u16)
        };
        let fallback = advance(char::from(REPLACEMENT)).unwrap_or(0);

        let mut widths = [0u16; 224];
        for (i, slot) in widths.iter_mut().enumerate() {
            let byte = FIRST_CHAR + i as u8;
            *slot = win_ansi_char(byte).and_then(advance).unwrap_or(fallback);
        }

        let bb = face.global_bounding_box();
        Ok(Self {
            postscript_name,
            widths,
            ascent: scale(face.ascender()),
            descent: scale(face.descender()),
            cap_height: scale(face.capital_height().unwrap_or_else(|| face.ascender())),
            bbox: [scale(bb.x_min), scale(bb.y_min), scale(bb.x_max), scale(bb.y_max)],
            italic_angle: face.italic_angle(),
            program,
        })
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }
}

/// The font the name is drawn in, with its metrics.
#[derive(Debug, Clone)]
pub enum PdfFont {
    BuiltIn,
    Embedded(EmbeddedFont),
}

impl PdfFont {
    /// Loads the selected source. An unparseable program degrades to the
    /// built-in font; the flag reports whether the embedded font made it.
    pub fn load(source: &FontSource) -> (PdfFont, bool) {
        match source {
            FontSource::BuiltIn => (PdfFont::BuiltIn, false),
            FontSource::Embedded(program) => match EmbeddedFont::parse(program.clone()) {
                Ok(font) => (PdfFont::Embedded(font), true),
                Err(e) => {
                    warn!(error = %e, "display font unreadable, using built-in bold sans");
                    (PdfFont::BuiltIn, false)
                }
            },
        }
    }

    fn widths(&self) -> &[u16; 224] {
        match self {
            PdfFont::BuiltIn => &HELVETICA_BOLD_WIDTHS,
            PdfFont::Embedded(font) => &font.widths,
        }
    }

    /// Advance width of one encoded byte in 1000 units/em.
    pub fn width_of_byte(&self, byte: u8) -> u16 {
        let byte = if byte < FIRST_CHAR { REPLACEMENT } else { byte };
        self.widths()[usize::from(byte - FIRST_CHAR)]
    }

    /// Width in points of WinAnsi-encoded `text` set at `size`.
    pub fn width_of_text_at_size(&self, text: &[u8], size: f64) -> f64 {
        let units: u32 = text.iter().map(|&b| u32::from(self.width_of_byte(b))).sum();
        f64::from(units) * size / 1000.0
    }

    /// Writes the font objects into `doc`, returning the font dictionary id.
    pub fn add_to(&self, doc: &mut Document) -> ObjectId {
        match self {
            PdfFont::BuiltIn => doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => BUILT_IN_NAME,
                "Encoding" => "WinAnsiEncoding",
            }),
            PdfFont::Embedded(font) => {
                let file_id = doc.add_object(Stream::new(
                    dictionary! { "Length1" => font.program.len() as i64 },
                    font.program.to_vec(),
                ));
                let descriptor_id = doc.add_object(dictionary! {
                    "Type" => "FontDescriptor",
                    "FontName" => font.postscript_name.as_str(),
                    // Nonsymbolic
                    "Flags" => 32,
                    "FontBBox" => font.bbox.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
                    "ItalicAngle" => Object::Real(font.italic_angle),
                    "Ascent" => font.ascent,
                    "Descent" => font.descent,
                    "CapHeight" => font.cap_height,
                    "StemV" => 80,
                    "FontFile2" => file_id,
                });
                doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "TrueType",
                    "BaseFont" => font.postscript_name.as_str(),
                    "FirstChar" => i64::from(FIRST_CHAR),
                    "LastChar" => 255,
                    "Widths" => font.widths.iter().map(|&w| Object::Integer(i64::from(w))).collect::<Vec<_>>(),
                    "FontDescriptor" => descriptor_id,
                    "Encoding" => "WinAnsiEncoding",
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_latin1_and_cp1252_extras() {
        assert_eq!(encode_win_ansi("Jane Doe"), b"Jane Doe".to_vec());
        assert_eq!(encode_win_ansi("Zoë"), vec![b'Z', b'o', 0xEB]);
        assert_eq!(encode_win_ansi("€ – Œ"), vec![0x80, b' ', 0x96, b' ', 0x8C]);
    }

    #[test]
    fn encoded_text_reads_back_through_the_win_ansi_font_encoding() {
        let font = dictionary! { "Type" => "Font", "Encoding" => "WinAnsiEncoding" };
        let doc = Document::new();
        let encoding = font.get_font_encoding(&doc).unwrap();

        let text = "Zoë – Œuvre 5 €";
        assert_eq!(encoding.bytes_to_string(&encode_win_ansi(text)).unwrap(), text);
    }

    #[test]
    fn unencodable_characters_become_question_marks() {
        assert_eq!(encode_win_ansi("李 A"), b"? A".to_vec());
        assert_eq!(encode_win_ansi("a\tb"), b"a?b".to_vec());
    }

    #[test]
    fn built_in_widths_are_glyph_metrics_not_character_counts() {
        let font = PdfFont::BuiltIn;
        assert_eq!(font.width_of_byte(b'W'), 944);
        assert_eq!(font.width_of_byte(b'i'), 278);
        assert!(font.width_of_text_at_size(b"WWW", 24.0) > font.width_of_text_at_size(b"iii", 24.0));

        // J a n e _ D o e = 556+556+611+556+278+722+611+556
        let width = font.width_of_text_at_size(b"Jane Doe", 24.0);
        assert!((width - 106.704).abs() < 1e-9);
    }

    #[test]
    fn unreadable_program_falls_back_to_built_in() {
        let (font, embedded) = PdfFont::load(&FontSource::Embedded(Bytes::from_static(b"not a font")));
        assert!(matches!(font, PdfFont::BuiltIn));
        assert!(!embedded);
    }

    #[test]
    fn built_in_font_object_uses_win_ansi() {
        let mut doc = Document::with_version("1.5");
        let id = PdfFont::BuiltIn.add_to(&mut doc);
        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica-Bold");
        assert_eq!(dict.get(b"Encoding").unwrap().as_name().unwrap(), b"WinAnsiEncoding");
    }

    #[test]
    fn embedded_widths_come_from_the_font_program() {
        let program = Bytes::from_static(include_bytes!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/DejaVuSansCondensed-Bold.ttf"
        )));
        let (font, embedded) = PdfFont::load(&FontSource::Embedded(program));
        assert!(embedded);
        let PdfFont::Embedded(ref embedded_font) = font else {
            panic!("expected the embedded font");
        };
        assert_eq!(embedded_font.postscript_name(), "DejaVuSansCondensed-Bold");

        // Advance widths scaled from 2048 units/em.
        assert_eq!(font.width_of_byte(b'W'), 993);
        assert_eq!(font.width_of_byte(0xEB), 610);
        assert_ne!(font.width_of_byte(b'W'), PdfFont::BuiltIn.width_of_byte(b'W'));
    }
}
