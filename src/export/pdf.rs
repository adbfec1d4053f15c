//! PDF rendering of a [`PrintDocument`] with `lopdf`.
//!
//! Layout is a single flowing column: text is wrapped using an average glyph
//! width for Helvetica, and a new page starts whenever the next item would
//! cross the bottom margin. Images are embedded at their native pixel size
//! and scaled down on the page, which keeps them sharp when printed.

use image::{Rgb, RgbImage, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use super::ExportError;
use super::document::{ApprovalRow, Block, CaptionedImage, PrintDocument, SummaryItem, Table};
use crate::capture::ImagePayload;

#[derive(Debug, Clone, Copy)]
pub struct PdfSettings {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub image_max_height: f32,
}

impl Default for PdfSettings {
    /// A4 portrait, half-inch margin.
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 36.0,
            image_max_height: 240.0,
        }
    }
}

const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 9.5;
const LEADING: f32 = 1.35;
// Approximate Helvetica advance width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.52;
// CSS pixels to points.
const PX_TO_PT: f32 = 0.75;

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

/// Encode text for a WinAnsi Type1 font; characters outside Latin-1 become '?'.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' => b'-',
            '\u{2018}' | '\u{2019}' => b'\'',
            '\u{201C}' | '\u{201D}' => b'"',
            c if (c as u32) < 0x100 && !c.is_control() => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap to at most `max_chars` per line; long words are split.
pub(crate) fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = if line.is_empty() { word.chars().count() } else { line.chars().count() + 1 + word.chars().count() };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// DeviceRGB has no alpha, so composite over the white page. Canvas
/// signatures are transparent everywhere except the ink.
fn flatten_on_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

struct PdfWriter {
    doc: Document,
    settings: PdfSettings,
    pages_id: ObjectId,
    fonts_id: ObjectId,
    pages: Vec<ObjectId>,
    ops: Vec<Operation>,
    xobjects: Dictionary,
    image_seq: usize,
    y: f32,
}

impl PdfWriter {
    fn new(settings: PdfSettings) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let fonts_id = doc.add_object(dictionary! {
            "F1" => regular,
            "F2" => bold,
        });
        Self {
            doc,
            settings,
            pages_id,
            fonts_id,
            pages: Vec::new(),
            ops: Vec::new(),
            xobjects: Dictionary::new(),
            image_seq: 0,
            y: settings.page_height - settings.margin,
        }
    }

    fn left(&self) -> f32 {
        self.settings.margin
    }

    fn usable_width(&self) -> f32 {
        self.settings.page_width - 2.0 * self.settings.margin
    }

    fn chars_per_width(width: f32, size: f32) -> usize {
        (width / (size * GLYPH_WIDTH)).floor().max(1.0) as usize
    }

    fn ensure_space(&mut self, needed: f32) -> Result<(), ExportError> {
        if self.y - needed < self.settings.margin && !self.ops.is_empty() {
            self.finish_page()?;
        }
        Ok(())
    }

    fn finish_page(&mut self) -> Result<(), ExportError> {
        let content = Content { operations: std::mem::take(&mut self.ops) };
        let bytes = content
            .encode()
            .map_err(|e| ExportError::Render(format!("content encoding failed: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, bytes));

        let resources = dictionary! {
            "Font" => self.fonts_id,
            "XObject" => std::mem::take(&mut self.xobjects),
        };
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.pages.push(page_id);
        self.y = self.settings.page_height - self.settings.margin;
        Ok(())
    }

    fn draw_text(&mut self, text: &str, font: Font, size: f32, x: f32) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Tf", vec![font.resource().into(), real(size)]));
        self.ops.push(Operation::new("Td", vec![real(x), real(self.y)]));
        self.ops.push(Operation::new("Tj", vec![Object::string_literal(encode_text(text))]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn line(&mut self, text: &str, font: Font, size: f32, x: f32) -> Result<(), ExportError> {
        let height = size * LEADING;
        self.ensure_space(height)?;
        self.y -= height;
        self.draw_text(text, font, size, x);
        Ok(())
    }

    fn paragraph(&mut self, text: &str, font: Font, size: f32) -> Result<(), ExportError> {
        let max = Self::chars_per_width(self.usable_width(), size);
        for line in wrap(text, max) {
            let x = self.left();
            self.line(&line, font, size, x)?;
        }
        Ok(())
    }

    fn gap(&mut self, amount: f32) {
        self.y -= amount;
    }

    fn rule(&mut self) {
        let (x1, x2) = (self.left(), self.left() + self.usable_width());
        self.ops.push(Operation::new("w", vec![real(0.5)]));
        self.ops.push(Operation::new("m", vec![real(x1), real(self.y)]));
        self.ops.push(Operation::new("l", vec![real(x2), real(self.y)]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn title_block(&mut self, doc: &PrintDocument) -> Result<(), ExportError> {
        let x = self.left();
        self.line(&doc.title, Font::Bold, TITLE_SIZE, x)?;
        self.line(&doc.organisation, Font::Regular, 11.0, x)?;
        self.gap(4.0);
        let site = if doc.site_name.trim().is_empty() { "-" } else { doc.site_name.as_str() };
        self.line(&format!("Site: {site}"), Font::Regular, BODY_SIZE, x)?;
        self.line(&format!("Survey date: {}", doc.date), Font::Regular, BODY_SIZE, x)?;
        self.line(&format!("Generated: {}", doc.generated_at), Font::Regular, BODY_SIZE, x)?;
        self.gap(6.0);
        self.rule();
        self.gap(8.0);
        Ok(())
    }

    fn heading(&mut self, text: &str) -> Result<(), ExportError> {
        // Keep a heading together with at least a couple of body lines.
        self.ensure_space(HEADING_SIZE * LEADING + 3.0 * BODY_SIZE * LEADING)?;
        self.gap(6.0);
        let x = self.left();
        self.line(text, Font::Bold, HEADING_SIZE, x)?;
        self.gap(2.0);
        Ok(())
    }

    fn summary(&mut self, items: &[SummaryItem]) -> Result<(), ExportError> {
        let label_width = self.usable_width() * 0.38;
        let value_x = self.left() + label_width + 6.0;
        let value_chars = Self::chars_per_width(self.usable_width() - label_width - 6.0, BODY_SIZE);
        let label_chars = Self::chars_per_width(label_width, BODY_SIZE);
        for item in items {
            let lines = wrap(if item.value.is_empty() { "-" } else { &item.value }, value_chars);
            for (i, text) in lines.iter().enumerate() {
                let height = BODY_SIZE * LEADING;
                self.ensure_space(height)?;
                self.y -= height;
                if i == 0 {
                    let x = self.left();
                    self.draw_text(&truncate(&item.label, label_chars), Font::Bold, BODY_SIZE, x);
                }
                self.draw_text(text, Font::Regular, BODY_SIZE, value_x);
            }
        }
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<(), ExportError> {
        let cols = table.headers.len().max(1);
        let col_width = self.usable_width() / cols as f32;
        let cell_chars = Self::chars_per_width(col_width - 4.0, BODY_SIZE);
        let height = BODY_SIZE * LEADING;

        self.ensure_space(2.0 * height + 12.0)?;
        let x = self.left();
        self.line(&table.caption, Font::Bold, BODY_SIZE + 1.0, x)?;

        self.ensure_space(height)?;
        self.y -= height;
        for (c, header) in table.headers.iter().enumerate() {
            let x = self.left() + c as f32 * col_width;
            self.draw_text(&truncate(header, cell_chars), Font::Bold, BODY_SIZE, x);
        }
        self.gap(3.0);
        self.rule();

        for row in &table.rows {
            self.ensure_space(height)?;
            self.y -= height;
            for (c, cell) in row.iter().take(cols).enumerate() {
                let x = self.left() + c as f32 * col_width;
                let text = if cell.is_empty() { "-" } else { cell.as_str() };
                self.draw_text(&truncate(text, cell_chars), Font::Regular, BODY_SIZE, x);
            }
        }
        self.gap(6.0);
        Ok(())
    }

    fn image(&mut self, image: &CaptionedImage) -> Result<(), ExportError> {
        let decoded = ImagePayload::parse(&image.source)
            .and_then(|payload| payload.decode())
            .map_err(|e| e.to_string())
            .and_then(|bytes| image::load_from_memory(&bytes).map_err(|e| e.to_string()));

        let rgb = match decoded {
            Ok(img) => flatten_on_white(&img.to_rgba8()),
            Err(reason) => {
                if !image.source.starts_with("data:") {
                    log::warn!("Export: skipping external image '{}'", image.caption);
                    return self.paragraph(&format!("{}: external image not embedded", image.caption), Font::Regular, BODY_SIZE);
                }
                log::warn!("Export: could not decode '{}': {}", image.caption, reason);
                return self.paragraph(&format!("{}: image could not be decoded", image.caption), Font::Regular, BODY_SIZE);
            }
        };

        let (px_w, px_h) = rgb.dimensions();
        if px_w == 0 || px_h == 0 {
            return Ok(());
        }

        let mut width = (px_w as f32 * PX_TO_PT).min(self.usable_width());
        let mut height = width * px_h as f32 / px_w as f32;
        if height > self.settings.image_max_height {
            height = self.settings.image_max_height;
            width = height * px_w as f32 / px_h as f32;
        }

        let caption_height = BODY_SIZE * LEADING;
        self.ensure_space(height + caption_height + 6.0)?;

        self.image_seq += 1;
        let name = format!("Im{}", self.image_seq);
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => px_w as i64,
                "Height" => px_h as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb.into_raw(),
        );
        let image_id = self.doc.add_object(stream);
        self.xobjects.set(name.as_str(), image_id);

        self.y -= height;
        let x = self.left();
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![real(width), real(0.0), real(0.0), real(height), real(x), real(self.y)],
        ));
        self.ops.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.ops.push(Operation::new("Q", vec![]));

        self.line(&image.caption, Font::Regular, BODY_SIZE - 1.0, x)?;
        self.gap(6.0);
        Ok(())
    }

    fn gallery(&mut self, title: &str, images: &[CaptionedImage]) -> Result<(), ExportError> {
        self.heading(title)?;
        for image in images {
            self.image(image)?;
        }
        Ok(())
    }

    fn approvals(&mut self, rows: &[ApprovalRow], signatures: &[CaptionedImage]) -> Result<(), ExportError> {
        self.heading("Approvals")?;
        let table = Table::new(
            "Sign-off",
            &["Role", "Name", "Date", "Accepted", "Comments"],
            rows.iter()
                .map(|r| {
                    vec![
                        r.role.clone(),
                        r.name.clone(),
                        r.date.clone(),
                        if r.accepted { "Yes".to_string() } else { "No".to_string() },
                        r.comments.clone(),
                    ]
                })
                .collect(),
        );
        self.table(&table)?;
        for signature in signatures {
            self.image(signature)?;
        }
        Ok(())
    }

    fn finish(mut self, title: &str) -> Result<Vec<u8>, ExportError> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.finish_page()?;
        }

        let kids: Vec<Object> = self.pages.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(self.settings.page_width),
                real(self.settings.page_height),
            ],
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_text(title)),
            "Producer" => Object::string_literal("fieldops"),
        });
        self.doc.trailer.set("Info", info_id);

        self.doc.compress();
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| ExportError::Render(format!("pdf write failed: {e}")))?;
        Ok(out)
    }
}

/// Render `doc` to PDF bytes.
pub fn render_pdf(doc: &PrintDocument, settings: &PdfSettings) -> Result<Vec<u8>, ExportError> {
    let mut writer = PdfWriter::new(*settings);
    writer.title_block(doc)?;

    for block in &doc.blocks {
        match block {
            Block::Heading(text) => writer.heading(text)?,
            Block::Summary(items) => writer.summary(items)?,
            Block::Table(table) => writer.table(table)?,
            Block::Gallery { title, images } => writer.gallery(title, images)?,
            Block::Approvals { rows, signatures } => writer.approvals(rows, signatures)?,
        }
    }

    let title = format!("{} - {}", doc.title, doc.site_name);
    writer.finish(&title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width_and_splits_long_words() {
        let lines = wrap("the quick brown fox jumps", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps");

        let lines = wrap("abcdefghijkl", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long cell value", 8), "a lon...");
    }

    #[test]
    fn flatten_blends_transparency_over_white() {
        let mut img = RgbaImage::from_pixel(2, 1, image::Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        let flat = flatten_on_white(&img);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [0, 0, 0]);

        let half = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 128]));
        assert_eq!(flatten_on_white(&half).get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn encode_text_replaces_non_latin1() {
        assert_eq!(encode_text("A\u{2014}B \u{263A}"), b"A-B ?".to_vec());
    }
}
