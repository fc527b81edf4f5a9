//! The vintage front page.
//!
//! Lays out masthead, dateline, headline, photo frame, a balanced
//! multi-column story and a footer pinned to the bottom of the page. Sizes
//! follow the same three viewport breakpoints the page uses on screen:
//!
//! | Viewport     | Padding | Masthead | Headline | Photo | Columns |
//! |--------------|---------|----------|----------|-------|---------|
//! | < 640 px     | 16      | 48       | 28       | 192   | 1       |
//! | 640 – 767 px | 24      | 60       | 36       | 224   | 2       |
//! | ≥ 768 px     | 32      | 72       | 42       | 256   | 3       |

use super::display::{Color, DisplayList, DrawOp, Rect};
use super::font::FontBook;
use super::text::{self, Align, Indent, Line, Span, TextStyle};
use super::{Geometry, Surface};
use crate::config::REFERENCE_WIDTH_PX;
use crate::raster::RasterImage;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Longest headline the page accepts, in characters.
pub const MAX_HEADLINE_CHARS: usize = 30;

/// The page never lays out shorter than this, in CSS px.
pub const MIN_PAGE_HEIGHT: f32 = 700.0;

const PAPER: Color = Color::rgb(0xf0, 0xf0, 0xeb);
const INK: Color = Color::BLACK;
const SUB_INK: Color = Color::rgb(0x1f, 0x29, 0x37);
const BODY_INK: Color = Color::rgb(0x11, 0x11, 0x11);
const CAPTION_INK: Color = Color::rgb(0x33, 0x33, 0x33);
const FRAME_FILL: Color = Color::rgb(0xe5, 0xe5, 0xe5);
const PLACEHOLDER_INK: Color = Color::rgb(0x9c, 0xa3, 0xaf);

const MASTHEAD: &str = "বিজয় বার্তা";
const SUB_MASTHEAD: &str = "দ্য ন্যাশনাল ডেইলি | স্বাধীন বাংলা প্রেস";
const DEFAULT_HEADLINE: &str = "বাংলার আকাশে আজ স্বাধীনতার সূর্য";
const DEFAULT_COUNTRY: &str = "বাংলাদেশ";
const DEFAULT_CITY: &str = "ঢাকা";
const DEFAULT_REPORTER: &str = "আমাদের প্রতিনিধি";
const NO_PHOTO: &str = "ছবি নির্বাচন করা হয়নি";
const HISTORICAL_DATELINE: &str = "বৃহস্পতিবার, ১৬ই ডিসেম্বর, ১৯৭১";
const HISTORICAL_YEAR: i32 = 1971;

const WEEKDAYS: [&str; 7] = [
    "রবিবার",
    "সোমবার",
    "মঙ্গলবার",
    "বুধবার",
    "বৃহস্পতিবার",
    "শুক্রবার",
    "শনিবার",
];

const MONTHS: [&str; 12] = [
    "জানুয়ারি",
    "ফেব্রুয়ারি",
    "মার্চ",
    "এপ্রিল",
    "মে",
    "জুন",
    "জুলাই",
    "আগস্ট",
    "সেপ্টেম্বর",
    "অক্টোবর",
    "নভেম্বর",
    "ডিসেম্বর",
];

/// Which edition date the page prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateMode {
    /// 16 December 1971.
    #[default]
    Historical,
    /// Today's date.
    Current,
}

/// Rewrite ASCII digits as Bengali digits.
pub fn bengali_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => char::from_u32(0x09E6 + d).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// The date printed in the dateline bar.
pub fn dateline(mode: DateMode, today: NaiveDate) -> String {
    match mode {
        DateMode::Historical => HISTORICAL_DATELINE.to_string(),
        DateMode::Current => format!(
            "{}, {} {}, {}",
            WEEKDAYS[today.weekday().num_days_from_sunday() as usize],
            bengali_digits(&today.day().to_string()),
            MONTHS[today.month0() as usize],
            bengali_digits(&today.year().to_string()),
        ),
    }
}

/// The year quoted in the lead story.
pub fn edition_year(mode: DateMode, today: NaiveDate) -> String {
    let year = match mode {
        DateMode::Historical => HISTORICAL_YEAR,
        DateMode::Current => today.year(),
    };
    bengali_digits(&year.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breakpoint {
    Base,
    Sm,
    Md,
}

impl Breakpoint {
    fn for_viewport(width: f32) -> Self {
        if width >= 768.0 {
            Breakpoint::Md
        } else if width >= 640.0 {
            Breakpoint::Sm
        } else {
            Breakpoint::Base
        }
    }

    fn pick<T>(self, base: T, sm: T, md: T) -> T {
        match self {
            Breakpoint::Base => base,
            Breakpoint::Sm => sm,
            Breakpoint::Md => md,
        }
    }
}

/// The newspaper front page.
///
/// Content setters never touch geometry and geometry setters never touch
/// content; capture relies on that split.
#[derive(Debug, Clone)]
pub struct NewspaperSurface {
    headline: String,
    reporter: Option<String>,
    location: Option<String>,
    date_mode: DateMode,
    photo: Option<RasterImage>,
    geometry: Geometry,
    container_width: f32,
    viewport_width: f32,
    today: NaiveDate,
    fonts: FontBook,
}

impl Default for NewspaperSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl NewspaperSurface {
    /// An empty page on a desktop-sized viewport, dated today.
    pub fn new() -> Self {
        Self {
            headline: String::new(),
            reporter: None,
            location: None,
            date_mode: DateMode::default(),
            photo: None,
            geometry: Geometry::default(),
            container_width: REFERENCE_WIDTH_PX,
            viewport_width: 1280.0,
            today: Local::now().date_naive(),
            fonts: FontBook::bundled(),
        }
    }

    /// Set the viewport width that drives the responsive breakpoints.
    pub fn with_viewport(mut self, width: f32) -> Self {
        self.viewport_width = width.max(0.0);
        self
    }

    /// Set the width the page's container offers when no width is pinned.
    pub fn with_container_width(mut self, width: f32) -> Self {
        self.container_width = width.max(0.0);
        self
    }

    /// Fix the date used by [`DateMode::Current`].
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Shape and draw text with `fonts` instead of the bundled faces.
    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Set the headline, keeping at most [`MAX_HEADLINE_CHARS`] characters.
    pub fn set_headline(&mut self, headline: &str) {
        self.headline = headline.trim().chars().take(MAX_HEADLINE_CHARS).collect();
    }

    pub fn set_reporter(&mut self, reporter: Option<&str>) {
        self.reporter = non_blank(reporter);
    }

    pub fn set_location(&mut self, location: Option<&str>) {
        self.location = non_blank(location);
    }

    pub fn set_date_mode(&mut self, mode: DateMode) {
        self.date_mode = mode;
    }

    /// Replace the embedded photo. The previous one is dropped.
    pub fn set_photo(&mut self, photo: Option<RasterImage>) {
        self.photo = photo;
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn reporter(&self) -> Option<&str> {
        self.reporter.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn date_mode(&self) -> DateMode {
        self.date_mode
    }

    pub fn photo(&self) -> Option<&RasterImage> {
        self.photo.as_ref()
    }

    /// Border-box width at the current geometry.
    pub fn layout_width(&self) -> f32 {
        self.geometry
            .width
            .unwrap_or_else(|| self.container_width.min(REFERENCE_WIDTH_PX))
            .max(0.0)
    }

    fn lead_paragraphs(&self) -> Vec<Vec<Span>> {
        let city = self.location.as_deref().unwrap_or(DEFAULT_CITY);
        let reporter = self.reporter.as_deref().unwrap_or(DEFAULT_REPORTER);
        let year = edition_year(self.date_mode, self.today);
        vec![
            vec![Span::plain(format!(
                "জ ১৬ই ডিসেম্বর, {year}। মহান বিজয় দিবস। দীর্ঘ ৯ মাস রক্তক্ষয়ী যুদ্ধের পর \
                 অর্জিত হয়েছে এই স্বাধীনতা। আজ বাংলার আকাশ-বাতাস বিজয়ের গানে মুখরিত।"
            ))],
            vec![
                Span::bold(format!("নিজস্ব সংবাদদাতা, {city}:")),
                Span::plain(
                    " আজ ভোর থেকেই রাজপথে মানুষের ঢল। হাতে লাল-সবুজের পতাকা, মুখে \
                     \"জয় বাংলা\" স্লোগান।\n\n",
                ),
                Span::bold(reporter),
                Span::plain(" জানান, নতুন প্রজন্ম মুক্তিযুদ্ধের চেতনায় দেশ গড়ার শপথ নিয়েছে।"),
            ],
            vec![
                Span::plain(
                    "৩০ লাখ শহীদের রক্তে কেনা এই স্বাধীনতা। পাকিস্তানি হানাদার বাহিনীর \
                     আত্মসমর্পণের মধ্য দিয়ে আজ বিশ্বের মানচিত্রে জন্ম নিল এক নতুন রাষ্ট্র -",
                ),
                Span::bold(" বাংলাদেশ"),
                Span::plain("।"),
            ],
            vec![Span::plain(
                "শহরের প্রতিটি কোণায় এখন উৎসবের আমেজ। স্মৃতিসৌধে ফুল দিয়ে শ্রদ্ধা জানাচ্ছেন \
                 সর্বস্তরের মানুষ।",
            )],
        ]
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Surface for NewspaperSurface {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    fn layout(&self) -> DisplayList {
        let width = self.layout_width();
        let bp = Breakpoint::for_viewport(self.viewport_width);
        let pad = bp.pick(16.0, 24.0, 32.0);
        let inner = (width - 2.0 * pad).max(0.0);

        let mut list = DisplayList::new(width, 0.0);
        // Paper fill; its height is patched once the page height is known.
        list.fill(Rect::new(0.0, 0.0, width, 0.0), PAPER);

        let mut y = pad;

        // ── Masthead ─────────────────────────────────────────────────────
        let masthead = TextStyle::new(bp.pick(48.0, 60.0, 72.0), INK)
            .bold()
            .line_height(0.9);
        y += text::paint_spans(
            &mut list,
            &self.fonts,
            &[Span::plain(MASTHEAD)],
            &masthead,
            Align::Center,
            Rect::new(pad, y, inner, 0.0),
        );
        y += 4.0;
        let sub = TextStyle::new(bp.pick(10.0, 12.0, 12.0), SUB_INK).bold();
        y += text::paint_spans(
            &mut list,
            &self.fonts,
            &[Span::plain(SUB_MASTHEAD)],
            &sub,
            Align::Center,
            Rect::new(pad, y, inner, 0.0),
        );
        y += 8.0;
        list.fill(Rect::new(pad, y, inner, 4.0), INK);
        y += 4.0 + 4.0;

        // ── Dateline bar ─────────────────────────────────────────────────
        let dateline_style = TextStyle::new(bp.pick(10.0, 11.0, 11.0), INK).bold();
        let items = [
            format!(
                "{DEFAULT_CITY}, {}",
                self.location.as_deref().unwrap_or(DEFAULT_COUNTRY)
            ),
            dateline(self.date_mode, self.today),
            "মূল্য: ১০ পয়সা".to_string(),
            "রেজিঃ ডিএ-১১৭".to_string(),
        ];
        y += 4.0;
        y += paint_flex_row(
            &mut list,
            &self.fonts,
            &items,
            &dateline_style,
            Rect::new(pad, y, inner, 0.0),
            8.0,
        );
        y += 4.0;
        list.fill(Rect::new(pad, y, inner, 1.0), INK);
        y += 1.0 + 16.0;

        // ── Headline ─────────────────────────────────────────────────────
        let headline_style = TextStyle::new(bp.pick(28.0, 36.0, 42.0), INK)
            .bold()
            .line_height(1.2);
        let headline = if self.headline.is_empty() {
            DEFAULT_HEADLINE
        } else {
            self.headline.as_str()
        };
        y += text::paint_spans(
            &mut list,
            &self.fonts,
            &[Span::plain(headline)],
            &headline_style,
            Align::Center,
            Rect::new(pad, y, inner, 0.0),
        );
        y += 16.0;

        // ── Photo frame ──────────────────────────────────────────────────
        let photo_height = bp.pick(192.0, 224.0, 256.0);
        let frame = Rect::new(pad, y, inner, photo_height + 10.0);
        list.fill(frame, Color::WHITE);
        list.stroke(frame, INK, 1.0);
        let slot = frame.inset(5.0);
        list.fill(slot, FRAME_FILL);
        match &self.photo {
            Some(photo) => list.image(slot, photo.clone()),
            None => {
                let placeholder = TextStyle::new(14.0, PLACEHOLDER_INK);
                let top = slot.y + (slot.height - placeholder.line_px()) / 2.0;
                text::paint_spans(
                    &mut list,
                    &self.fonts,
                    &[Span::plain(NO_PHOTO)],
                    &placeholder,
                    Align::Center,
                    Rect::new(slot.x, top, slot.width, 0.0),
                );
            }
        }
        y += frame.height + 4.0;
        let caption = TextStyle::new(bp.pick(10.0, 11.0, 11.0), CAPTION_INK).bold();
        y += text::paint_spans(
            &mut list,
            &self.fonts,
            &[Span::plain(format!(
                "চিত্র: {} থেকে পাঠানো বিশেষ আলোকচিত্র - মুক্তিযোদ্ধা জনতার উল্লাস।",
                self.location.as_deref().unwrap_or(DEFAULT_CITY)
            ))],
            &caption,
            Align::Center,
            Rect::new(pad, y, inner, 0.0),
        );
        y += 16.0;

        // ── Story columns ────────────────────────────────────────────────
        let columns = bp.pick(1, 2, 3);
        y += paint_columns(&mut list, &self.fonts, &self.lead_paragraphs(), columns, pad, y, inner);

        // ── Footer, pinned to the bottom ─────────────────────────────────
        let footer_height = footer_height(&self.fonts, inner);
        let height = (y + 16.0 + footer_height + pad).max(MIN_PAGE_HEIGHT);
        paint_footer(&mut list, &self.fonts, pad, height - pad - footer_height, inner);

        list.height = height;
        list.ops[0] = DrawOp::Fill {
            rect: Rect::new(0.0, 0.0, width, height),
            color: PAPER,
        };
        list
    }

    fn suggested_name(&self) -> Option<&str> {
        self.reporter.as_deref()
    }
}

/// Lay items out like a wrapping `justify-between` flex row. Returns the height used.
fn paint_flex_row(
    list: &mut DisplayList,
    fonts: &FontBook,
    items: &[String],
    style: &TextStyle,
    area: Rect,
    gap: f32,
) -> f32 {
    let Rect { x, y, width, .. } = area;
    let widths: Vec<f32> = items
        .iter()
        .map(|s| fonts.measure(s, style.size, style.bold).min(width))
        .collect();

    let mut rows: Vec<Vec<usize>> = vec![Vec::new()];
    let mut used = 0.0;
    for (i, w) in widths.iter().enumerate() {
        let row_len = rows.last().map_or(0, Vec::len);
        let needed = if row_len == 0 { *w } else { used + gap + w };
        if needed > width && row_len > 0 {
            rows.push(vec![i]);
            used = *w;
        } else {
            if let Some(row) = rows.last_mut() {
                row.push(i);
            }
            used = needed;
        }
    }

    let mut top = y;
    for (r, row) in rows.iter().enumerate() {
        let ink: f32 = row.iter().map(|&i| widths[i]).sum();
        let spacing = if row.len() > 1 {
            (width - ink).max(0.0) / (row.len() - 1) as f32
        } else {
            0.0
        };
        let mut cursor = x;
        let mut row_height: f32 = 0.0;
        for &i in row {
            let h = text::paint_spans(
                list,
                fonts,
                &[Span::plain(items[i].as_str())],
                style,
                Align::Left,
                // Room for rounding between the whole item and its words.
                Rect::new(cursor, top, widths[i] + 1.0, 0.0),
            );
            row_height = row_height.max(h);
            cursor += widths[i] + spacing;
        }
        top += row_height;
        if r + 1 < rows.len() {
            top += gap;
        }
    }
    top - y
}

enum Row {
    Line(Line),
    DropCap(Line),
    Gap(f32),
}

/// Balanced multi-column story with a drop cap and column rules.
/// Returns the height used.
fn paint_columns(
    list: &mut DisplayList,
    fonts: &FontBook,
    paragraphs: &[Vec<Span>],
    columns: usize,
    x: f32,
    y: f32,
    width: f32,
) -> f32 {
    const GAP: f32 = 20.0;
    const PARAGRAPH_GAP: f32 = 12.0;
    let body = TextStyle::new(12.0, BODY_INK);
    let drop_cap = TextStyle::new(42.0, INK).bold().line_height(0.8);
    let columns = columns.max(1);
    let column_width = ((width - GAP * (columns - 1) as f32) / columns as f32).max(0.0);

    let cap_width = fonts.measure("আ", drop_cap.size, true) + 4.0;
    let cap_lines = (drop_cap.line_px() / body.line_px()).ceil() as usize;

    let mut rows = Vec::new();
    for (p, spans) in paragraphs.iter().enumerate() {
        let indent = if p == 0 {
            Indent {
                lines: cap_lines,
                offset: cap_width,
            }
        } else {
            Indent::default()
        };
        for (i, line) in text::wrap(fonts, spans, &body, column_width, indent)
            .into_iter()
            .enumerate()
        {
            if p == 0 && i == 0 {
                rows.push(Row::DropCap(line));
            } else {
                rows.push(Row::Line(line));
            }
        }
        if p + 1 < paragraphs.len() {
            rows.push(Row::Gap(PARAGRAPH_GAP));
        }
    }

    let row_height = |row: &Row| match row {
        Row::Line(_) | Row::DropCap(_) => body.line_px(),
        Row::Gap(h) => *h,
    };
    let total: f32 = rows.iter().map(row_height).sum();
    let target = total / columns as f32;

    let mut column = 0;
    let mut column_y = 0.0;
    let mut tallest: f32 = 0.0;
    for row in &rows {
        let h = row_height(row);
        if column_y > 0.0 && column_y + h > target + 0.5 && column + 1 < columns {
            column += 1;
            column_y = 0.0;
        }
        // Gaps never open a column.
        if column_y == 0.0 && matches!(row, Row::Gap(_)) {
            continue;
        }
        let cx = x + column as f32 * (column_width + GAP);
        match row {
            Row::Line(line) => {
                text::paint(list, fonts, std::slice::from_ref(line), &body, Align::Justify, cx, y + column_y);
            }
            Row::DropCap(line) => {
                text::paint_spans(
                    list,
                    fonts,
                    &[Span::plain("আ")],
                    &drop_cap,
                    Align::Left,
                    Rect::new(cx, y + column_y - 2.0, cap_width, 0.0),
                );
                text::paint(list, fonts, std::slice::from_ref(line), &body, Align::Justify, cx, y + column_y);
            }
            Row::Gap(_) => {}
        }
        column_y += h;
        tallest = tallest.max(column_y);
    }

    for c in 1..columns {
        let rule_x = x + c as f32 * (column_width + GAP) - GAP / 2.0;
        list.fill(Rect::new(rule_x, y, 1.0, tallest), INK);
    }
    tallest
}

const FOOTER_LEFT: [(&str, f32); 2] = [
    ("নগর সংস্করণ", 10.0),
    ("স্বাধীন বাংলা প্রেস কর্তৃক মুদ্রিত ও প্রকাশিত", 9.0),
];
const FOOTER_BADGE: &str = "বাংলাদেশ চিরজীবী হোক";

fn footer_parts(fonts: &FontBook, inner: f32) -> (f32, f32, f32, f32, bool) {
    let left_width = FOOTER_LEFT
        .iter()
        .map(|(s, size)| fonts.measure(s, *size, false))
        .fold(0.0f32, f32::max);
    let left_height: f32 = FOOTER_LEFT.iter().map(|(_, size)| size * 1.5).sum();
    let badge_width = fonts.measure(FOOTER_BADGE, 10.0, true) + 16.0 + 2.0;
    let badge_height = 15.0 + 8.0 + 2.0;
    let stacked = left_width + 8.0 + badge_width > inner;
    (left_width, left_height, badge_width, badge_height, stacked)
}

fn footer_height(fonts: &FontBook, inner: f32) -> f32 {
    let (_, left_height, _, badge_height, stacked) = footer_parts(fonts, inner);
    let content = if stacked {
        left_height + 8.0 + badge_height
    } else {
        left_height.max(badge_height)
    };
    4.0 + 16.0 + content
}

fn paint_footer(list: &mut DisplayList, fonts: &FontBook, x: f32, y: f32, inner: f32) {
    let (_, left_height, badge_width, badge_height, stacked) = footer_parts(fonts, inner);
    list.fill(Rect::new(x, y, inner, 4.0), INK);
    let top = y + 4.0 + 16.0;

    let mut line_y = top;
    for (i, (s, size)) in FOOTER_LEFT.iter().enumerate() {
        let style = if i == 0 {
            TextStyle::new(*size, INK).bold()
        } else {
            TextStyle::new(*size, INK)
        };
        line_y += text::paint_spans(
            list,
            fonts,
            &[Span::plain(*s)],
            &style,
            Align::Left,
            Rect::new(x, line_y, inner, 0.0),
        );
    }

    let (badge_x, badge_y) = if stacked {
        (x, top + left_height + 8.0)
    } else {
        (x + inner - badge_width, top + (left_height - badge_height).max(0.0) / 2.0)
    };
    let badge = Rect::new(badge_x, badge_y, badge_width.min(inner), badge_height);
    list.stroke(badge, INK, 1.0);
    text::paint_spans(
        list,
        fonts,
        &[Span::plain(FOOTER_BADGE)],
        &TextStyle::new(10.0, INK).bold(),
        Align::Left,
        Rect::new(badge.x + 9.0, badge.y + 5.0, (badge.width - 18.0).max(1.0), 0.0),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ImageOrigin;
    use crate::surface::Transform;
    use image::{Rgba, RgbaImage};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn page() -> NewspaperSurface {
        NewspaperSurface::new().with_today(day(2025, 12, 16))
    }

    fn photo() -> RasterImage {
        RasterImage::new(
            RgbaImage::from_pixel(8, 6, Rgba([90, 90, 90, 255])),
            ImageOrigin::Local,
        )
        .unwrap()
    }

    #[test]
    fn digits_become_bengali() {
        assert_eq!(bengali_digits("1971"), "১৯৭১");
        assert_eq!(bengali_digits("a-0"), "a-০");
    }

    #[test]
    fn dateline_by_mode() {
        let today = day(2025, 12, 16);
        assert_eq!(
            dateline(DateMode::Historical, today),
            "বৃহস্পতিবার, ১৬ই ডিসেম্বর, ১৯৭১"
        );
        assert_eq!(
            dateline(DateMode::Current, today),
            "মঙ্গলবার, ১৬ ডিসেম্বর, ২০২৫"
        );
        assert_eq!(edition_year(DateMode::Historical, today), "১৯৭১");
        assert_eq!(edition_year(DateMode::Current, today), "২০২৫");
    }

    #[test]
    fn headline_is_capped() {
        let mut p = page();
        p.set_headline(&"ক".repeat(40));
        assert_eq!(p.headline().chars().count(), MAX_HEADLINE_CHARS);
    }

    #[test]
    fn blank_reporter_is_absent() {
        let mut p = page();
        p.set_reporter(Some("   "));
        assert_eq!(p.reporter(), None);
        assert_eq!(p.suggested_name(), None);
        p.set_reporter(Some(" Rahim "));
        assert_eq!(p.suggested_name(), Some("Rahim"));
    }

    #[test]
    fn layout_has_minimum_height_and_paper_first() {
        let list = page().layout();
        assert_eq!(list.width, REFERENCE_WIDTH_PX);
        assert!(list.height >= MIN_PAGE_HEIGHT);
        match &list.ops[0] {
            DrawOp::Fill { rect, color } => {
                assert_eq!(*color, PAPER);
                assert_eq!(rect.height, list.height);
            }
            other => panic!("unexpected first op {other:?}"),
        }
    }

    #[test]
    fn placeholder_without_photo_image_with_photo() {
        let mut p = page();
        assert_eq!(p.layout().images().count(), 0);
        p.set_photo(Some(photo()));
        assert_eq!(p.layout().images().count(), 1);
        p.set_photo(None);
        assert_eq!(p.layout().images().count(), 0);
    }

    #[test]
    fn width_follows_container_unless_pinned() {
        let mut p = page().with_container_width(358.0).with_viewport(390.0);
        assert_eq!(p.layout().width, 358.0);
        p.set_geometry(Geometry {
            transform: Some(Transform::Identity),
            width: Some(550.0),
            margin: Some(0.0),
        });
        assert_eq!(p.layout().width, 550.0);
    }

    #[test]
    fn layout_is_deterministic() {
        let mut p = page();
        p.set_headline("বিজয়");
        p.set_location(Some("চট্টগ্রাম"));
        let a = p.layout();
        let b = p.layout();
        assert_eq!(a.ops.len(), b.ops.len());
        assert_eq!(a.height, b.height);
    }

    #[test]
    fn text_is_drawn_as_glyphs_from_the_page_fonts() {
        let italic = crate::surface::font::FontFace::from_bytes(
            "Italic",
            notosans::ITALIC_TTF.to_vec(),
            0,
        )
        .unwrap();
        let mut p = page().with_fonts(FontBook::bundled().with_face(italic));
        p.set_reporter(Some("Karim"));
        let faces: Vec<String> = p
            .layout()
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Glyphs { run, .. } => Some(run.face.name().to_string()),
                _ => None,
            })
            .collect();
        assert!(faces.iter().any(|f| f == "Italic"));
        assert!(faces.iter().any(|f| f == "Noto Sans Bold"));
    }

    #[test]
    fn headline_text_reaches_the_display_list() {
        let glyphs = |headline: &str| {
            let mut p = page();
            p.set_headline(headline);
            p.layout()
                .ops
                .into_iter()
                .filter_map(|op| match op {
                    DrawOp::Glyphs { run, .. } => Some(run.glyphs),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };
        assert_ne!(glyphs("Karim"), glyphs("Rahim"));
    }

    #[test]
    fn everything_stays_inside_the_page() {
        for viewport in [390.0, 700.0, 1280.0] {
            let mut p = page().with_viewport(viewport);
            p.set_reporter(Some("Rahim"));
            let list = p.layout();
            for op in &list.ops {
                let bottom = match op {
                    DrawOp::Fill { rect, .. }
                    | DrawOp::Stroke { rect, .. }
                    | DrawOp::Image { rect, .. } => rect.bottom(),
                    DrawOp::Glyphs { baseline, .. } => *baseline,
                };
                assert!(bottom <= list.height + 0.01, "{op:?} overflows at {viewport}");
            }
        }
    }
}
