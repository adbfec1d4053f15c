use askama::Template;

use super::ExportError;
use super::document::{ApprovalRow, Block, CaptionedImage, PrintDocument, SummaryItem, Table};

/// One block flattened for the template, which cannot match on enums.
pub struct HtmlBlock {
    pub kind: &'static str,
    pub title: String,
    pub summary: Vec<SummaryItem>,
    pub tables: Vec<Table>,
    pub images: Vec<CaptionedImage>,
    pub approvals: Vec<ApprovalRow>,
}

impl HtmlBlock {
    fn empty(kind: &'static str, title: String) -> Self {
        Self {
            kind,
            title,
            summary: Vec::new(),
            tables: Vec::new(),
            images: Vec::new(),
            approvals: Vec::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "export/print.html")]
pub struct PrintTemplate {
    pub doc_title: String,
    pub organisation: String,
    pub site_name: String,
    pub date: String,
    pub generated_at: String,
    pub blocks: Vec<HtmlBlock>,
}

impl From<&PrintDocument> for PrintTemplate {
    fn from(doc: &PrintDocument) -> Self {
        let blocks = doc
            .blocks
            .iter()
            .map(|block| match block {
                Block::Heading(text) => HtmlBlock::empty("heading", text.clone()),
                Block::Summary(items) => HtmlBlock {
                    summary: items.clone(),
                    ..HtmlBlock::empty("summary", String::new())
                },
                Block::Table(table) => HtmlBlock {
                    tables: vec![table.clone()],
                    ..HtmlBlock::empty("table", table.caption.clone())
                },
                Block::Gallery { title, images } => HtmlBlock {
                    images: images.clone(),
                    ..HtmlBlock::empty("gallery", title.clone())
                },
                Block::Approvals { rows, signatures } => HtmlBlock {
                    approvals: rows.clone(),
                    images: signatures.clone(),
                    ..HtmlBlock::empty("approvals", "Approvals".to_string())
                },
            })
            .collect();

        Self {
            doc_title: doc.title.clone(),
            organisation: doc.organisation.clone(),
            site_name: doc.site_name.clone(),
            date: doc.date.clone(),
            generated_at: doc.generated_at.clone(),
            blocks,
        }
    }
}

/// Print-friendly HTML rendition of `doc`.
pub fn render_html(doc: &PrintDocument) -> Result<String, ExportError> {
    Ok(PrintTemplate::from(doc).render()?)
}
