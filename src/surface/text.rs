//! Text wrapping and painting over shaped glyphs.
//!
//! Words are shaped once through the page's [`FontBook`] while wrapping;
//! the same shaped glyphs are then placed when painting, so what is
//! measured is exactly what is drawn. Characters the book cannot draw show
//! up as code point boxes.

use super::display::{Color, DisplayList, Rect};
use super::font::{FontBook, MissingGlyph, ShapedText, Shaper};

/// How a run of text looks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in CSS px.
    pub size: f32,
    pub bold: bool,
    pub color: Color,
    /// Line height as a multiple of `size`.
    pub line_height: f32,
}

impl TextStyle {
    pub const fn new(size: f32, color: Color) -> Self {
        Self {
            size,
            bold: false,
            color,
            line_height: 1.5,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn line_height(mut self, lh: f32) -> Self {
        self.line_height = lh;
        self
    }

    pub fn line_px(&self) -> f32 {
        self.size * self.line_height
    }
}

/// Horizontal alignment of wrapped lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Justify,
}

/// A piece of a paragraph. `\n` inside `text` forces a line break.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// Hex digits of a code point box, top row and bottom row.
type CodeRows = (ShapedText, ShapedText);

#[derive(Debug, Clone, PartialEq)]
struct Word {
    shaped: ShapedText,
    /// One entry per `shaped.missing`.
    code_rows: Vec<CodeRows>,
}

impl Word {
    fn shape(shaper: &Shaper<'_>, text: &str, size: f32) -> Self {
        let shaped = shaper.shape(text, size);
        let code_rows = shaped
            .missing
            .iter()
            .map(|m| {
                let hex = code_point_hex(m.ch);
                let (top, bottom) = hex.split_at(hex.len() / 2);
                let digit_size = size * CODE_DIGIT_EM;
                (shaper.shape(top, digit_size), shaper.shape(bottom, digit_size))
            })
            .collect();
        Self { shaped, code_rows }
    }

    fn width(&self) -> f32 {
        self.shaped.width
    }
}

/// Size of the digits inside a code point box, in em of the text.
const CODE_DIGIT_EM: f32 = 0.3;

fn code_point_hex(ch: char) -> String {
    let code = u32::from(ch);
    if code > 0xFFFF {
        format!("{code:06X}")
    } else {
        format!("{code:04X}")
    }
}

/// One wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    words: Vec<Word>,
    /// Width of one space at the line's style.
    space: f32,
    /// Left offset inside the text box (used around a drop cap).
    pub indent: f32,
    /// Width available to this line.
    pub available: f32,
    /// The line ends a paragraph or a forced break; never justified.
    pub last: bool,
}

impl Line {
    fn new(space: f32, indent: f32, available: f32) -> Self {
        Self {
            words: Vec::new(),
            space,
            indent,
            available,
            last: false,
        }
    }

    /// Natural width with single spaces between words.
    pub fn width(&self) -> f32 {
        let ink: f32 = self.words.iter().map(Word::width).sum();
        ink + self.space * self.words.len().saturating_sub(1) as f32
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

/// Lines whose index is below `lines` get `offset` px of left indent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Indent {
    pub lines: usize,
    pub offset: f32,
}

/// Greedy word wrap of `spans` into `max_width`.
pub fn wrap(
    fonts: &FontBook,
    spans: &[Span],
    style: &TextStyle,
    max_width: f32,
    indent: Indent,
) -> Vec<Line> {
    let plain = fonts.shaper(style.bold);
    let emphasis = spans
        .iter()
        .any(|span| span.bold && !style.bold)
        .then(|| fonts.shaper(true));
    let space = plain.measure(" ", style.size);
    let slot = |index: usize| {
        if index < indent.lines {
            (indent.offset, (max_width - indent.offset).max(0.0))
        } else {
            (0.0, max_width)
        }
    };

    let mut lines = Vec::new();
    let (x, w) = slot(0);
    let mut current = Line::new(space, x, w);

    for span in spans {
        let shaper = match &emphasis {
            Some(bold) if span.bold => bold,
            _ => &plain,
        };
        for (i, segment) in span.text.split('\n').enumerate() {
            if i > 0 {
                current.last = true;
                lines.push(current);
                let (x, w) = slot(lines.len());
                current = Line::new(space, x, w);
            }
            for text in segment.split_whitespace() {
                let word = Word::shape(shaper, text, style.size);
                let needed = if current.words.is_empty() {
                    word.width()
                } else {
                    current.width() + space + word.width()
                };
                if needed > current.available && !current.words.is_empty() {
                    lines.push(current);
                    let (x, w) = slot(lines.len());
                    current = Line::new(space, x, w);
                }
                current.words.push(word);
            }
        }
    }
    current.last = true;
    lines.push(current);
    lines.retain(|l| !l.words.is_empty() || l.last);
    lines
}

/// Baseline offset from the top of a line box, centring the primary face's
/// ascent + descent in it.
fn baseline_offset(fonts: &FontBook, style: &TextStyle) -> f32 {
    let m = fonts.metrics(style.bold);
    let content = (m.ascent + m.descent) * style.size;
    (style.line_px() - content) / 2.0 + m.ascent * style.size
}

/// Paint `lines` into `list` with their top at `y`. Returns the height used.
pub fn paint(
    list: &mut DisplayList,
    fonts: &FontBook,
    lines: &[Line],
    style: &TextStyle,
    align: Align,
    x: f32,
    y: f32,
) -> f32 {
    let line_px = style.line_px();
    let baseline = baseline_offset(fonts, style);

    for (row, line) in lines.iter().enumerate() {
        let space = line.space;
        let natural = line.width();
        let gaps = line.word_count().saturating_sub(1);
        let (mut cursor, gap) = match align {
            Align::Left => (line.indent, space),
            Align::Center => (line.indent + (line.available - natural).max(0.0) / 2.0, space),
            Align::Justify if !line.last && gaps > 0 => (
                line.indent,
                space + (line.available - natural).max(0.0) / gaps as f32,
            ),
            Align::Justify => (line.indent, space),
        };
        let base = y + row as f32 * line_px + baseline;
        for word in &line.words {
            let left = x + cursor;
            for run in &word.shaped.runs {
                list.glyphs(left, base, run.clone(), style.color);
            }
            for (missing, rows) in word.shaped.missing.iter().zip(&word.code_rows) {
                paint_code_box(list, missing, rows, left, base, style.size, style.color);
            }
            cursor += word.width() + gap;
        }
    }
    lines.len() as f32 * line_px
}

/// A box with the code point in hex, for a character no face draws.
fn paint_code_box(
    list: &mut DisplayList,
    missing: &MissingGlyph,
    rows: &CodeRows,
    x: f32,
    baseline: f32,
    size: f32,
    color: Color,
) {
    let pad = size * 0.06;
    let rect = Rect::new(
        x + missing.x + pad,
        baseline - size * 0.74,
        (missing.width - 2.0 * pad).max(0.0),
        size * 0.84,
    );
    list.stroke(rect, color, (size * 0.04).max(0.5));

    for (row, digits) in [&rows.0, &rows.1].into_iter().enumerate() {
        let left = rect.x + (rect.width - digits.width) / 2.0;
        let row_baseline = rect.y + rect.height * (0.45 + 0.42 * row as f32);
        for run in &digits.runs {
            list.glyphs(left, row_baseline, run.clone(), color);
        }
    }
}

/// Wrap and paint in one go. Returns the height used.
pub fn paint_spans(
    list: &mut DisplayList,
    fonts: &FontBook,
    spans: &[Span],
    style: &TextStyle,
    align: Align,
    area: Rect,
) -> f32 {
    let lines = wrap(fonts, spans, style, area.width, Indent::default());
    paint(list, fonts, &lines, style, align, area.x, area.y)
}
