//! Font faces, fallback and shaping.
//!
//! A [`FontBook`] is an ordered fallback list of faces. Text is cut into
//! runs by the first face that has a glyph for each character, and every
//! run is shaped with rustybuzz so Bengali conjuncts and vowel signs come
//! out the way the face intends.
//!
//! ```text
//! "রহিম Rahim"
//!   ├─ রহিম   → Noto Serif Bengali (system or --font)
//!   ├─ " "    → first face with a space
//!   └─ Rahim  → Noto Sans (bundled)
//! ```
//!
//! Noto Sans Regular and Bold are always present (OFL, from the `notosans`
//! crate), so Latin text and digits look the same on every machine. A
//! character no face covers is kept as a [`MissingGlyph`] and painted as a
//! box showing its code point, which keeps different texts visibly
//! different even without a Bengali face.

use crate::error::FontError;
use rustybuzz::ttf_parser;
use rustybuzz::{Direction, UnicodeBuffer};
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Families tried, in order, when looking for a Bengali face on the system.
pub const BENGALI_FAMILIES: &[&str] = &[
    "Noto Serif Bengali",
    "Noto Sans Bengali",
    "Kalpurush",
    "SolaimanLipi",
    "Siyam Rupali",
    "Lohit Bengali",
    "Mukti Narrow",
    "Hind Siliguri",
];

/// Weight from which a face counts as bold.
const BOLD_WEIGHT: u16 = 600;

#[derive(Clone)]
enum FaceData {
    Static(&'static [u8]),
    Shared(Arc<[u8]>),
}

impl FaceData {
    fn bytes(&self) -> &[u8] {
        match self {
            FaceData::Static(b) => b,
            FaceData::Shared(b) => b,
        }
    }
}

/// One face: font bytes, the face index inside them, and its weight class.
///
/// Cloning shares the bytes.
#[derive(Clone)]
pub struct FontFace {
    name: Arc<str>,
    data: FaceData,
    index: u32,
    bold: bool,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("bold", &self.bold)
            .field("bytes", &self.data.bytes().len())
            .finish()
    }
}

impl PartialEq for FontFace {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.index == other.index
            && self.bold == other.bold
            && std::ptr::eq(self.data.bytes(), other.data.bytes())
    }
}

impl FontFace {
    fn bundled(name: &str, data: &'static [u8], bold: bool) -> Self {
        Self {
            name: name.into(),
            data: FaceData::Static(data),
            index: 0,
            bold,
        }
    }

    /// Wrap face `index` of `data`, checking that it parses.
    pub fn from_bytes(name: &str, data: Vec<u8>, index: u32) -> Result<Self, FontError> {
        Self::from_shared(name, data.into(), index)
    }

    fn from_shared(name: &str, data: Arc<[u8]>, index: u32) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(&data, index).map_err(|e| FontError::Unsupported {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let bold = face.is_bold() || face.weight().to_number() >= BOLD_WEIGHT;
        Ok(Self {
            name: name.into(),
            data: FaceData::Shared(data),
            index,
            bold,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw bytes of the font file the face lives in.
    pub fn bytes(&self) -> &[u8] {
        self.data.bytes()
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    fn shaper(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(self.bytes(), self.index)
    }
}

/// A glyph placed relative to the start of the shaped text, in CSS px.
/// `y` grows upwards from the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub id: u16,
    pub x: f32,
    pub y: f32,
}

/// Consecutive glyphs from one face at one size.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub face: FontFace,
    /// Font size (em) in CSS px.
    pub size: f32,
    pub glyphs: Vec<PlacedGlyph>,
}

/// A character no face in the book can draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissingGlyph {
    pub ch: char,
    /// Left edge relative to the start of the shaped text, in CSS px.
    pub x: f32,
    /// Advance reserved for the code point box.
    pub width: f32,
}

/// Result of shaping one piece of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedText {
    pub runs: Vec<GlyphRun>,
    pub missing: Vec<MissingGlyph>,
    /// Total advance in CSS px.
    pub width: f32,
}

impl ShapedText {
    pub fn glyph_count(&self) -> usize {
        self.runs.iter().map(|r| r.glyphs.len()).sum()
    }
}

/// Vertical metrics of the primary face, in em.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl LineMetrics {
    const FALLBACK: LineMetrics = LineMetrics {
        ascent: 0.8,
        descent: 0.2,
    };
}

/// Ordered list of faces used to shape and draw text.
#[derive(Debug, Clone, PartialEq)]
pub struct FontBook {
    faces: Vec<FontFace>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::bundled()
    }
}

impl FontBook {
    /// Only the bundled Noto Sans faces. Layout with this book is identical
    /// on every machine.
    pub fn bundled() -> Self {
        Self {
            faces: vec![
                FontFace::bundled("Noto Sans", notosans::REGULAR_TTF, false),
                FontFace::bundled("Noto Sans Bold", notosans::BOLD_TTF, true),
            ],
        }
    }

    /// The first Bengali family installed on this system (see
    /// [`BENGALI_FAMILIES`]), ahead of the bundled faces.
    pub fn discover() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!("Font database holds {} system faces", db.len());

        let mut book = Self::bundled();
        for &family in BENGALI_FAMILIES {
            let mut found = Vec::new();
            for (weight, want_bold) in [(fontdb::Weight::NORMAL, false), (fontdb::Weight::BOLD, true)] {
                let query = fontdb::Query {
                    families: &[fontdb::Family::Name(family)],
                    weight,
                    ..fontdb::Query::default()
                };
                let Some(id) = db.query(&query) else {
                    continue;
                };
                let is_bold = db
                    .face(id)
                    .is_some_and(|info| info.weight.0 >= BOLD_WEIGHT);
                if is_bold != want_bold {
                    continue;
                }
                match db.with_face_data(id, |data, index| {
                    FontFace::from_bytes(family, data.to_vec(), index)
                }) {
                    Some(Ok(face)) => found.push(face),
                    Some(Err(e)) => warn!("Skipping system font: {}", e),
                    None => warn!("System font '{}' could not be read", family),
                }
            }
            if !found.is_empty() {
                info!("Using system font '{}' for Bengali text", family);
                book.faces.splice(0..0, found);
                return book;
            }
        }
        warn!("No Bengali system font found; Bengali text is drawn as code point boxes");
        book
    }

    /// Put every face in the font file at `path` ahead of the current faces.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| FontError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
        let data: Arc<[u8]> = data.into();

        let mut faces = Vec::new();
        for index in 0..count {
            faces.push(FontFace::from_shared(&name, Arc::clone(&data), index)?);
        }
        info!("Loaded {} face(s) from {}", faces.len(), path.display());
        self.faces.splice(0..0, faces);
        Ok(self)
    }

    /// Put `face` ahead of the current faces.
    pub fn with_face(mut self, face: FontFace) -> Self {
        self.faces.insert(0, face);
        self
    }

    pub fn faces(&self) -> &[FontFace] {
        &self.faces
    }

    /// Faces in lookup order for one weight: matching weight first, the
    /// rest after, each group in book order.
    fn chain(&self, bold: bool) -> Vec<&FontFace> {
        let (mut chain, rest): (Vec<_>, Vec<_>) =
            self.faces.iter().partition(|f| f.bold == bold);
        chain.extend(rest);
        chain
    }

    /// Ascent and descent of the first face for this weight.
    pub fn metrics(&self, bold: bool) -> LineMetrics {
        self.chain(bold)
            .first()
            .and_then(|face| ttf_parser::Face::parse(face.bytes(), face.index).ok())
            .map(|face| {
                let upem = f32::from(face.units_per_em());
                LineMetrics {
                    ascent: f32::from(face.ascender()) / upem,
                    descent: -f32::from(face.descender()) / upem,
                }
            })
            .unwrap_or(LineMetrics::FALLBACK)
    }

    /// Parse the fallback chain for one weight, ready to shape many strings.
    pub fn shaper(&self, bold: bool) -> Shaper<'_> {
        let chain = self.chain(bold);
        let faces = chain.iter().map(|face| face.shaper()).collect();
        Shaper { chain, faces }
    }

    /// Advance of `text` in CSS px.
    pub fn measure(&self, text: &str, size: f32, bold: bool) -> f32 {
        self.shaper(bold).shape(text, size).width
    }

    /// Shape `text` left to right at `size` CSS px.
    pub fn shape(&self, text: &str, size: f32, bold: bool) -> ShapedText {
        self.shaper(bold).shape(text, size)
    }
}

/// A parsed fallback chain. Building one parses every layout table of every
/// face, so keep it around while shaping a batch of words.
pub struct Shaper<'a> {
    chain: Vec<&'a FontFace>,
    faces: Vec<Option<rustybuzz::Face<'a>>>,
}

impl Shaper<'_> {
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        self.shape(text, size).width
    }

    /// Shape `text` left to right at `size` CSS px.
    pub fn shape(&self, text: &str, size: f32) -> ShapedText {
        let mut out = ShapedText::default();
        let mut pen = 0.0;
        for (range, face) in segments(text, &self.faces) {
            let piece = &text[range];
            match face.and_then(|i| self.faces[i].as_ref().map(|f| (i, f))) {
                Some((i, shaper)) => {
                    let (run, advance) = shape_run(shaper, self.chain[i], piece, size, pen);
                    out.runs.push(run);
                    pen += advance;
                }
                None => {
                    for ch in piece.chars() {
                        let width = missing_advance(ch, size);
                        out.missing.push(MissingGlyph { ch, x: pen, width });
                        pen += width;
                    }
                }
            }
        }
        out.width = pen;
        out
    }
}

/// Marks and joiners that belong to the cluster before them.
fn continues_cluster(ch: char) -> bool {
    matches!(
        ch,
        '\u{0300}'..='\u{036F}'
            | '\u{0981}'..='\u{0983}'
            | '\u{09BC}'
            | '\u{09BE}'..='\u{09D7}'
            | '\u{09E2}'
            | '\u{09E3}'
            | '\u{200C}'
            | '\u{200D}'
    )
}

fn covers(shaper: &Option<rustybuzz::Face<'_>>, ch: char) -> bool {
    shaper.as_ref().is_some_and(|s| s.glyph_index(ch).is_some())
}

/// Split `text` into byte ranges, each tagged with the index of the face
/// that draws it (`None`: no face has the glyphs).
fn segments(text: &str, shapers: &[Option<rustybuzz::Face<'_>>]) -> Vec<(Range<usize>, Option<usize>)> {
    let mut out: Vec<(Range<usize>, Option<usize>)> = Vec::new();
    for (at, ch) in text.char_indices() {
        let end = at + ch.len_utf8();
        let current = out.last().map(|(_, face)| *face);
        let face = match current {
            Some(Some(i)) if continues_cluster(ch) && covers(&shapers[i], ch) => Some(i),
            _ => shapers.iter().position(|s| covers(s, ch)),
        };
        match out.last_mut() {
            Some((range, last)) if *last == face => range.end = end,
            _ => out.push((at..end, face)),
        }
    }
    out
}

fn shape_run(
    shaper: &rustybuzz::Face<'_>,
    face: &FontFace,
    text: &str,
    size: f32,
    start: f32,
) -> (GlyphRun, f32) {
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();
    buffer.set_direction(Direction::LeftToRight);
    let output = rustybuzz::shape(shaper, &[], buffer);

    let scale = size / shaper.units_per_em().max(1) as f32;
    let mut pen = 0.0;
    let glyphs = output
        .glyph_infos()
        .iter()
        .zip(output.glyph_positions())
        .map(|(info, pos)| {
            let glyph = PlacedGlyph {
                id: u16::try_from(info.glyph_id).unwrap_or(0),
                x: start + pen + pos.x_offset as f32 * scale,
                y: pos.y_offset as f32 * scale,
            };
            pen += pos.x_advance as f32 * scale;
            glyph
        })
        .collect();

    let run = GlyphRun {
        face: face.clone(),
        size,
        glyphs,
    };
    (run, pen)
}

/// Advance of the code point box for `ch`: two rows of two hex digits, or
/// two rows of three above U+FFFF.
pub fn missing_advance(ch: char, size: f32) -> f32 {
    if u32::from(ch) > 0xFFFF {
        size
    } else {
        size * 0.7
    }
}
