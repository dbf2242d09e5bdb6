//! Statement PDF writer built on lopdf.
//!
//! Pages use the Courier standard fonts so no font files are embedded and
//! column positions can be computed from character counts. Coordinates are
//! whole points and nothing time-dependent is written, so identical
//! statements produce identical bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::ReportError;

use super::statement::{Statement, COLUMNS};
use super::Result;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 54;

const COL_DATE: i64 = 72;
const COL_PATIENT: i64 = 162;
const COL_COST_RIGHT: i64 = 540;
const TOTAL_LABEL_RIGHT: i64 = 440;

const ROW_HEIGHT: i64 = 16;
/// Room for the total row and the footer block.
const FOOTER_HEIGHT: i64 = 110;

/// Longest patient name printed before truncation.
const PATIENT_CHARS: usize = 40;

#[derive(Debug, Clone, Copy)]
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

/// Content operations of one page.
struct PageBuilder {
    operations: Vec<Operation>,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    fn text(&mut self, font: Font, size: i64, x: i64, y: i64, text: &str) {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_text(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn centered(&mut self, font: Font, size: i64, y: i64, text: &str) {
        let x = ((PAGE_WIDTH - text_width(text, size)) / 2).max(MARGIN);
        self.text(font, size, x, y, text);
    }

    fn right_aligned(&mut self, font: Font, size: i64, right: i64, y: i64, text: &str) {
        self.text(font, size, right - text_width(text, size), y, text);
    }

    fn rule(&mut self, y: i64, width: i64) {
        self.operations.extend([
            Operation::new("w", vec![width.into()]),
            Operation::new("m", vec![COL_DATE.into(), y.into()]),
            Operation::new("l", vec![COL_COST_RIGHT.into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    fn table_header(&mut self, y: i64) {
        self.text(Font::Bold, 10, COL_DATE, y, COLUMNS[0]);
        self.text(Font::Bold, 10, COL_PATIENT, y, COLUMNS[1]);
        self.right_aligned(Font::Bold, 10, COL_COST_RIGHT, y, COLUMNS[2]);
        self.rule(y - 6, 1);
    }

    fn encode(self) -> Result<Vec<u8>> {
        Content {
            operations: self.operations,
        }
        .encode()
        .map_err(|e| ReportError::Pdf(e.to_string()))
    }
}

/// Courier advance width is 600/1000 em.
fn text_width(text: &str, size: i64) -> i64 {
    text.chars().count() as i64 * size * 600 / 1000
}

/// WinAnsi bytes for a string; characters outside Latin-1 become `?`.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => b'?',
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Lay out every page of the statement.
fn layout_pages(statement: &Statement) -> Vec<PageBuilder> {
    let mut pages = Vec::new();
    let mut page = PageBuilder::new();

    let mut y = PAGE_HEIGHT - MARGIN - 16;
    page.centered(Font::Bold, 16, y, &statement.lab_name);
    y -= 18;
    page.centered(Font::Regular, 10, y, &statement.contact_line());
    y -= 28;
    page.centered(Font::Bold, 12, y, &statement.title());
    y -= 32;
    page.table_header(y);
    y -= 22;

    for row in &statement.rows {
        if y < MARGIN + ROW_HEIGHT {
            pages.push(page);
            page = PageBuilder::new();
            y = PAGE_HEIGHT - MARGIN - 12;
            page.text(
                Font::Regular,
                9,
                COL_DATE,
                y,
                &format!("{} (continued)", statement.title()),
            );
            y -= 24;
            page.table_header(y);
            y -= 22;
        }

        page.text(Font::Regular, 10, COL_DATE, y, &row.date_due);
        page.text(
            Font::Regular,
            10,
            COL_PATIENT,
            y,
            &truncate(&row.patient_name, PATIENT_CHARS),
        );
        page.right_aligned(Font::Regular, 10, COL_COST_RIGHT, y, &row.total_cost);
        y -= ROW_HEIGHT;
    }

    if y - FOOTER_HEIGHT < MARGIN {
        pages.push(page);
        page = PageBuilder::new();
        y = PAGE_HEIGHT - MARGIN - 12;
    }

    page.rule(y + ROW_HEIGHT - 6, 1);
    y -= 4;
    page.right_aligned(Font::Bold, 10, TOTAL_LABEL_RIGHT, y, "TOTAL:");
    page.right_aligned(Font::Bold, 10, COL_COST_RIGHT, y, &statement.total_display());
    y -= 40;
    page.centered(Font::Bold, 11, y, "THANK YOU");
    y -= 16;
    page.centered(Font::Regular, 10, y, &statement.questions_line());
    y -= 24;
    page.centered(Font::Regular, 10, y, &statement.payment_due_line());

    pages.push(page);
    pages
}

/// Write a statement as PDF bytes.
pub fn write_pdf(statement: &Statement) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in layout_pages(statement) {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let page_count = kids.len() as i64;

    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(PAGE_WIDTH),
        Object::Integer(PAGE_HEIGHT),
    ];
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => media_box,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    debug!(
        "Rendered statement {} with {} rows on {} pages ({} bytes)",
        statement.label,
        statement.rows.len(),
        page_count,
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger::{LedgerRecord, MonthLabel};
    use crate::report::StatementRenderer;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn statement(rows: u32) -> Statement {
        let records: Vec<_> = (0..rows)
            .map(|i| {
                LedgerRecord::new(
                    NaiveDate::from_ymd_opt(2024, 3, 1 + i % 28).unwrap(),
                    format!("Patient {}", i),
                    Decimal::new(10_000 + i as i64, 2),
                )
            })
            .collect();
        StatementRenderer::default()
            .with_dentist(Some("DR. SMITH".to_string()))
            .build(&MonthLabel::parse("2024-03").unwrap(), &records)
            .unwrap()
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_single_page_statement() {
        let bytes = write_pdf(&statement(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_output_is_deterministic() {
        let s = statement(5);
        assert_eq!(write_pdf(&s).unwrap(), write_pdf(&s).unwrap());
    }

    #[test]
    fn test_long_statement_paginates() {
        let bytes = write_pdf(&statement(90)).unwrap();
        assert!(page_count(&bytes) >= 2);
    }

    #[test]
    fn test_text_is_readable_back() {
        let bytes = write_pdf(&statement(2)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("TOTAL:"));
        assert!(text.contains("Patient 1"));
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("Jos\u{e9}"), b"Jos\xe9".to_vec());
        assert_eq!(encode_text("\u{4e2d}x"), b"?x".to_vec());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long patient name", 10), "a very ...");
    }
}
