//! PDF Report Module
//!
//! Lays out an inspection verdict on A4 pages:
//! - branded header (optional logo, banner, orange rule) and page footer
//! - title block: project, standard, inspector, date
//! - findings: sanitized report text, word-wrapped
//! - photo annex: one captioned photo per block, paginating as needed
//!
//! Unreadable photos are skipped; they never fail the document.

use super::sanitize::{encode_latin1, sanitize_report_text};
use crate::ai::vision::{load_image_blocking, ImageInput, PreparedImage};
use crate::inspection::RequestInfo;
use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::path::PathBuf;
use thiserror::Error;

/// A4 in points
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;

const MARGIN: f32 = 28.0;
const CONTENT_TOP: f32 = PAGE_HEIGHT - 100.0;
const CONTENT_BOTTOM: f32 = 56.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const BODY_SIZE: f32 = 11.0;
const BODY_LEADING: f32 = 17.0;
const BANNER_HEIGHT: f32 = 20.0;

/// 100 mm photos, 25 mm logo
const PHOTO_WIDTH: f32 = 283.0;
const LOGO_WIDTH: f32 = 71.0;

const SAFETY_ORANGE: Rgb = (1.0, 0.435, 0.0);
const LIGHT_ORANGE: Rgb = (1.0, 0.9, 0.784);
const DARK_GREY: Rgb = (0.2, 0.2, 0.2);
const BLACK: Rgb = (0.0, 0.0, 0.0);
const WHITE: Rgb = (1.0, 1.0, 1.0);

const BRAND_BANNER: &str = "VIG.IA - INDUSTRIAL INTELLIGENCE";
const TITLE: &str = "TECHNICAL INSPECTION VERDICT";

type Rgb = (f32, f32, f32);

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    fn resource(self) -> Object {
        let name: &[u8] = match self {
            Font::Regular => b"F1",
            Font::Bold => b"F2",
            Font::Oblique => b"F3",
        };
        Object::Name(name.to_vec())
    }

    /// Width factor over the regular face
    fn weight(self) -> f32 {
        match self {
            Font::Bold => 1.06,
            _ => 1.0,
        }
    }
}

/// Renders inspection reports to PDF bytes
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    logo_path: Option<PathBuf>,
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header logo; a missing or unreadable file just omits it
    pub fn with_logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = Some(path.into());
        self
    }

    /// Render a report document
    pub fn render(
        &self,
        info: &RequestInfo,
        report_text: &str,
        images: &[ImageInput],
    ) -> Result<Vec<u8>, ReportError> {
        let logo = self.logo_path.as_ref().and_then(|path| {
            load_image_blocking(&ImageInput::Path(path.clone()))
                .map_err(|e| tracing::warn!("[ReportRenderer] Logo skipped: {}", e))
                .ok()
        });

        let photos: Vec<PreparedImage> = images
            .iter()
            .filter_map(|input| match load_image_blocking(input) {
                Ok(img) => Some(img),
                Err(e) => {
                    tracing::warn!("[ReportRenderer] Photo {} skipped: {}", input.describe(), e);
                    None
                }
            })
            .collect();

        let mut layout = Layout::new(logo.as_ref().map(|l| scaled_height(l, LOGO_WIDTH)));

        layout.title_block(info);
        layout.banner(" VIG.IA ANALYSIS RESULTS", DARK_GREY, WHITE);
        layout.paragraphs(&sanitize_report_text(report_text));

        if !photos.is_empty() {
            layout.gap(BODY_LEADING);
            layout.banner(" ANALYSED VISUAL EVIDENCE", LIGHT_ORANGE, BLACK);
            for (index, photo) in photos.iter().enumerate() {
                layout.photo(index + 1, photo);
            }
        }

        let pages = layout.finish();
        tracing::debug!(
            pages = pages.len(),
            photos = photos.len(),
            "[ReportRenderer] Laid out report"
        );

        build_document(pages, &photos, logo.as_ref())
    }

    /// Render on the blocking pool; decoding and JPEG encoding are CPU-bound
    pub async fn render_async(
        &self,
        info: RequestInfo,
        report_text: String,
        images: Vec<ImageInput>,
    ) -> Result<Vec<u8>, ReportError> {
        let renderer = self.clone();

        tokio::task::spawn_blocking(move || renderer.render(&info, &report_text, &images))
            .await
            .map_err(|e| ReportError::Task(e.to_string()))?
    }
}

/// Page-by-page operation streams with a moving cursor
struct Layout {
    finished: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
    logo_height: Option<f32>,
}

impl Layout {
    fn new(logo_height: Option<f32>) -> Self {
        let mut layout = Self {
            finished: Vec::new(),
            current: Vec::new(),
            y: CONTENT_TOP,
            logo_height,
        };
        layout.decorate_page();
        layout
    }

    fn page_number(&self) -> usize {
        self.finished.len() + 1
    }

    fn new_page(&mut self) {
        let done = std::mem::take(&mut self.current);
        self.finished.push(done);
        self.y = CONTENT_TOP;
        self.decorate_page();
    }

    /// Header and footer for the current page
    fn decorate_page(&mut self) {
        if let Some(height) = self.logo_height {
            self.current.extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        LOGO_WIDTH.into(),
                        0.into(),
                        0.into(),
                        height.into(),
                        MARGIN.into(),
                        (PAGE_HEIGHT - 23.0 - height).into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Logo".to_vec())]),
                Operation::new("Q", vec![]),
            ]);
        }

        self.text(
            Font::Bold,
            12.0,
            MARGIN + 85.0,
            PAGE_HEIGHT - 45.0,
            BRAND_BANNER.as_bytes().to_vec(),
            BLACK,
        );

        let rule_y = PAGE_HEIGHT - 79.0;
        self.current.extend([
            Operation::new("q", vec![]),
            color_op("RG", SAFETY_ORANGE),
            Operation::new("w", vec![2.8_f32.into()]),
            Operation::new("m", vec![MARGIN.into(), rule_y.into()]),
            Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), rule_y.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);

        let footer = format!("Report generated by VIG.IA | Page {}", self.page_number());
        let bytes = footer.into_bytes();
        let x = (PAGE_WIDTH - text_width(&bytes, 8.0, Font::Oblique)) / 2.0;
        self.text(Font::Oblique, 8.0, x, 30.0, bytes, (0.5, 0.5, 0.5));
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < CONTENT_BOTTOM {
            self.new_page();
        }
    }

    fn gap(&mut self, amount: f32) {
        self.y -= amount;
    }

    fn text(&mut self, font: Font, size: f32, x: f32, y: f32, bytes: Vec<u8>, color: Rgb) {
        self.current.extend([
            color_op("rg", color),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(bytes)]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Centered line at the cursor, then advance by `leading`
    fn centered(&mut self, font: Font, size: f32, text: &str, leading: f32) {
        self.ensure_space(leading);
        let bytes = encode_latin1(text);
        let x = ((PAGE_WIDTH - text_width(&bytes, size, font)) / 2.0).max(MARGIN);
        let baseline = self.y - size;
        self.text(font, size, x, baseline, bytes, BLACK);
        self.y -= leading;
    }

    fn title_block(&mut self, info: &RequestInfo) {
        let date = Local::now().format("%d/%m/%Y");

        self.centered(Font::Bold, 16.0, TITLE, 28.0);
        self.centered(
            Font::Regular,
            10.0,
            &format!("Project: {} | Standard: {}", info.project, info.standard),
            17.0,
        );
        self.centered(
            Font::Regular,
            10.0,
            &format!("Inspector: {} | Date: {}", info.inspector, date),
            17.0,
        );
        self.gap(28.0);
    }

    /// Full-width filled heading bar
    fn banner(&mut self, label: &str, fill: Rgb, ink: Rgb) {
        self.ensure_space(BANNER_HEIGHT + BODY_LEADING * 2.0);

        let bottom = self.y - BANNER_HEIGHT;
        self.current.extend([
            Operation::new("q", vec![]),
            color_op("rg", fill),
            Operation::new(
                "re",
                vec![
                    MARGIN.into(),
                    bottom.into(),
                    CONTENT_WIDTH.into(),
                    BANNER_HEIGHT.into(),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
        self.text(Font::Bold, 11.0, MARGIN + 2.0, bottom + 6.0, encode_latin1(label), ink);

        self.y = bottom - 14.0;
    }

    /// Body text; `\n` separates paragraphs, blank lines are kept
    fn paragraphs(&mut self, text: &[u8]) {
        for paragraph in text.split(|b| *b == b'\n') {
            let lines = wrap_line(paragraph, BODY_SIZE, CONTENT_WIDTH);
            if lines.is_empty() {
                self.ensure_space(BODY_LEADING);
                self.y -= BODY_LEADING;
                continue;
            }
            for line in lines {
                self.ensure_space(BODY_LEADING);
                let baseline = self.y - BODY_SIZE;
                self.text(Font::Regular, BODY_SIZE, MARGIN, baseline, line, BLACK);
                self.y -= BODY_LEADING;
            }
        }
    }

    /// Captioned, centered photo; starts a new page when it does not fit
    fn photo(&mut self, number: usize, photo: &PreparedImage) {
        let caption = 16.0;
        let max_height = CONTENT_TOP - CONTENT_BOTTOM - caption - 12.0;

        let mut width = PHOTO_WIDTH;
        let mut height = scaled_height(photo, width);
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }

        self.ensure_space(caption + height + 12.0);

        let label = format!("Photo {}", number);
        self.text(Font::Bold, 10.0, MARGIN, self.y - 10.0, label.into_bytes(), BLACK);
        self.y -= caption;

        let x = (PAGE_WIDTH - width) / 2.0;
        let bottom = self.y - height;
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    x.into(),
                    bottom.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(photo_resource(number).into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.y = bottom - 12.0;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        let last = std::mem::take(&mut self.current);
        self.finished.push(last);
        self.finished
    }
}

fn color_op(operator: &str, (r, g, b): Rgb) -> Operation {
    Operation::new(operator, vec![r.into(), g.into(), b.into()])
}

fn photo_resource(number: usize) -> String {
    format!("Im{}", number)
}

fn scaled_height(image: &PreparedImage, width: f32) -> f32 {
    width * image.height as f32 / image.width.max(1) as f32
}

/// Approximate Helvetica advance widths, in em
fn glyph_width(byte: u8) -> f32 {
    match byte {
        b' ' => 0.278,
        b'i' | b'j' | b'l' | b'.' | b',' | b':' | b';' | b'\'' | b'|' | b'!' => 0.24,
        b'f' | b't' | b'r' | b'I' | b'(' | b')' | b'-' | b'/' => 0.33,
        b'm' | b'w' => 0.83,
        b'M' | b'W' => 0.9,
        b'0'..=b'9' => 0.556,
        b'A'..=b'Z' => 0.68,
        b'a'..=b'z' => 0.54,
        0xC0..=0xDE => 0.68,
        0xDF..=0xFF => 0.54,
        _ => 0.58,
    }
}

fn text_width(bytes: &[u8], size: f32, font: Font) -> f32 {
    bytes.iter().map(|b| glyph_width(*b)).sum::<f32>() * size * font.weight()
}

/// Greedy word wrap; words wider than a line are split
fn wrap_line(line: &[u8], size: f32, max_width: f32) -> Vec<Vec<u8>> {
    let space = glyph_width(b' ') * size;
    let mut lines = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut current_width = 0.0;

    for word in line.split(|b| *b == b' ').filter(|w| !w.is_empty()) {
        let mut word = word;
        let mut word_width = text_width(word, size, Font::Regular);

        let needed = if current.is_empty() { word_width } else { current_width + space + word_width };
        if needed <= max_width {
            if !current.is_empty() {
                current.push(b' ');
                current_width += space;
            }
            current.extend_from_slice(word);
            current_width += word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }

        while word_width > max_width {
            let mut split = 0;
            let mut width = 0.0;
            while split < word.len() {
                let w = glyph_width(word[split]) * size;
                if width + w > max_width && split > 0 {
                    break;
                }
                width += w;
                split += 1;
            }
            lines.push(word[..split].to_vec());
            word = &word[split..];
            word_width = text_width(word, size, Font::Regular);
        }

        current.extend_from_slice(word);
        current_width = word_width;
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn image_stream(image: &PreparedImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        image.jpeg.clone(),
    )
    .with_compression(false)
}

fn build_document(
    pages: Vec<Vec<Operation>>,
    photos: &[PreparedImage],
    logo: Option<&PreparedImage>,
) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for (key, base_font) in [
        ("F1", "Helvetica"),
        ("F2", "Helvetica-Bold"),
        ("F3", "Helvetica-Oblique"),
    ] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base_font,
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(key, font_id);
    }

    let mut xobjects = Dictionary::new();
    for (index, photo) in photos.iter().enumerate() {
        let image_id = doc.add_object(image_stream(photo));
        xobjects.set(photo_resource(index + 1), image_id);
    }
    if let Some(logo) = logo {
        let logo_id = doc.add_object(image_stream(logo));
        xobjects.set("Logo", logo_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(lopdf::Error::from)?;
    Ok(buffer)
}
