//! Printable document model, built purely from form data.

use chrono::Local;
use serde_json::Value;

use crate::forms::FormDefinition;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub caption: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(caption: &str, headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            caption: caption.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionedImage {
    pub caption: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalRow {
    pub role: String,
    pub name: String,
    pub date: String,
    pub accepted: bool,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Summary(Vec<SummaryItem>),
    Table(Table),
    Gallery { title: String, images: Vec<CaptionedImage> },
    Approvals { rows: Vec<ApprovalRow>, signatures: Vec<CaptionedImage> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintDocument {
    pub title: String,
    pub organisation: String,
    pub site_name: String,
    pub date: String,
    pub generated_at: String,
    pub blocks: Vec<Block>,
}

impl PrintDocument {
    pub fn has_gallery(&self, title: &str) -> bool {
        self.blocks
            .iter()
            .any(|b| matches!(b, Block::Gallery { title: t, .. } if t == title))
    }

    pub fn has_approvals(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::Approvals { .. }))
    }
}

pub const PHOTO_GALLERY: &str = "Photo Gallery";
pub const DRAWINGS_GALLERY: &str = "Drawings";

/// `siteName` -> `Site Name`.
pub fn humanize(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

fn display_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("data:") => Some("Captured".to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Key/value summary of every scalar field at the top level and one level of
/// nesting. Arrays are left to the section tables and galleries.
pub fn summarize(doc: &Value) -> Vec<SummaryItem> {
    let mut items = Vec::new();
    let Some(root) = doc.as_object() else {
        return items;
    };

    for (key, value) in root {
        if let Some(text) = display_scalar(value) {
            items.push(SummaryItem { label: humanize(key), value: text });
        } else if let Value::Object(group) = value {
            for (child, inner) in group {
                if let Some(text) = display_scalar(inner) {
                    items.push(SummaryItem {
                        label: format!("{} / {}", humanize(key), humanize(child)),
                        value: text,
                    });
                }
            }
        }
    }
    items
}

fn gallery<'a>(collections: impl Iterator<Item = crate::forms::ImageCollection<'a>>) -> Vec<CaptionedImage> {
    let mut images = Vec::new();
    for collection in collections {
        for (i, src) in collection.images.iter().enumerate() {
            images.push(CaptionedImage {
                caption: format!("{} #{}", collection.label, i + 1),
                source: (*src).to_string(),
            });
        }
    }
    images
}

/// Assemble the printable document for `form`.
pub fn build_document<F: FormDefinition>(form: &F, organisation: &str) -> PrintDocument {
    let mut blocks = Vec::new();

    let doc = serde_json::to_value(form).unwrap_or(Value::Null);
    blocks.push(Block::Heading("Data Summary".to_string()));
    blocks.push(Block::Summary(summarize(&doc)));

    let tables = form.section_tables();
    for section in F::sections() {
        let mut section_tables = tables.iter().filter(|t| t.section == section.id).peekable();
        if section_tables.peek().is_none() {
            continue;
        }
        blocks.push(Block::Heading(section.title.to_string()));
        for t in section_tables {
            blocks.push(Block::Table(t.table.clone()));
        }
    }

    let photos = gallery(form.photo_collections().into_iter());
    if !photos.is_empty() {
        blocks.push(Block::Gallery { title: PHOTO_GALLERY.to_string(), images: photos });
    }

    let drawings = gallery(form.drawing_collections().into_iter());
    if !drawings.is_empty() {
        blocks.push(Block::Gallery { title: DRAWINGS_GALLERY.to_string(), images: drawings });
    }

    let approvals = form.approvals();
    if approvals.iter().any(|(_, a)| !a.is_blank()) {
        let rows = approvals
            .iter()
            .map(|(role, a)| ApprovalRow {
                role: role.to_string(),
                name: a.name.clone(),
                date: a.date.clone(),
                accepted: a.accepted,
                comments: a.comments.clone(),
            })
            .collect();
        let signatures = approvals
            .iter()
            .filter(|(_, a)| !a.signature.trim().is_empty())
            .map(|(role, a)| CaptionedImage {
                caption: format!("{role} signature"),
                source: a.signature.clone(),
            })
            .collect();
        blocks.push(Block::Approvals { rows, signatures });
    }

    PrintDocument {
        title: F::title().to_string(),
        organisation: organisation.to_string(),
        site_name: form.site_name().to_string(),
        date: form.date().to_string(),
        generated_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        blocks,
    }
}

/// Download filename derived from the site name.
pub fn export_filename(site_name: &str, kind: &str, extension: &str) -> String {
    let mut stem: String = site_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    while stem.contains("__") {
        stem = stem.replace("__", "_");
    }
    let stem = stem.trim_matches('_');
    let stem = if stem.is_empty() { "untitled" } else { stem };
    format!("{stem}_{kind}.{extension}")
}
