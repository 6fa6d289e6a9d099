//! # PDF Documents
//!
//! The downloadable report and the printable receipt as PDF. Same inputs as
//! [`crate::render`]; only the output medium differs.
//!
//! ```text
//!   Report  ──► render_report_pdf  ──► A4 pages, "Halaman i dari n" footer
//!   Receipt ──► render_receipt_pdf ──► one 80mm strip, height fits the items
//! ```
//!
//! Text is set in the PDF base fonts (Helvetica), so nothing is embedded
//! and the output stays small.

use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfLayerReference, PdfPageIndex, Point,
};
use thiserror::Error;

use crate::money::Money;
use crate::render::{Receipt, StoreInfo};
use crate::types::{LedgerTransaction, Report};

const A4_WIDTH: f32 = 210.0;
const A4_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const TOP: f32 = 20.0;
/// Rows stop this far above the bottom edge; the footer lives below.
const BOTTOM: f32 = 20.0;

const RECEIPT_WIDTH: f32 = 80.0;
const RECEIPT_MARGIN: f32 = 4.0;

const DESCRIPTION_CHARS: usize = 35;
const MENU_CHARS: usize = 15;

#[derive(Debug, Error)]
#[error("PDF rendering failed: {0}")]
pub struct PdfError(String);

impl From<printpdf::Error> for PdfError {
    fn from(err: printpdf::Error) -> Self {
        PdfError(err.to_string())
    }
}

// =============================================================================
// Report
// =============================================================================

/// Financial report as an A4 PDF.
pub fn render_report_pdf(report: &Report, store: &StoreInfo) -> Result<Vec<u8>, PdfError> {
    let (sheet, _) = layout_report(report, store)?;
    sheet.finish_with_page_numbers()
}

fn layout_report(report: &Report, store: &StoreInfo) -> Result<(Sheet, usize), PdfError> {
    let mut sheet = Sheet::new("Laporan Keuangan", A4_WIDTH, A4_HEIGHT)?;
    let (income, expense) = report.partition();

    sheet.text(MARGIN, 18.0, true, &store.name);
    sheet.advance(9.0);
    sheet.text(MARGIN, 14.0, true, "Laporan Keuangan");
    sheet.advance(7.0);
    sheet.text(
        MARGIN,
        10.0,
        false,
        &format!("Periode: {}", report.date_range.period_label()),
    );
    sheet.advance(12.0);

    sheet.text(MARGIN, 12.0, true, "Ringkasan");
    sheet.advance(8.0);
    for line in [
        format!("Total Pemasukan: {}", Money::from_rupiah(report.total_income)),
        format!("Total Pengeluaran: {}", Money::from_rupiah(report.total_expense)),
        format!("Laba Bersih: {}", Money::from_rupiah(report.net)),
        format!("Total Item Terjual: {} item", report.total_sales),
    ] {
        sheet.text(MARGIN, 10.0, false, &line);
        sheet.advance(6.0);
    }
    sheet.advance(6.0);

    ledger_section(&mut sheet, "Pemasukan", &income);
    ledger_section(&mut sheet, "Pengeluaran", &expense);

    let columns = [
        (0.0, "Tanggal"),
        (25.0, "Menu"),
        (55.0, "Ukuran"),
        (80.0, "Qty"),
        (95.0, "Total"),
    ];
    section_header(&mut sheet, "Detail Penjualan", &columns);
    if report.sales.is_empty() {
        sheet.text(MARGIN, 8.0, false, "Tidak ada penjualan");
        sheet.advance(6.0);
    }
    for item in &report.sales {
        sheet.ensure_room(6.0);
        let cells = [
            short_date(item.date),
            truncate(&item.menu_name, MENU_CHARS),
            item.size_name.clone(),
            item.quantity.to_string(),
            item.line_total().to_string(),
        ];
        for ((offset, _), cell) in columns.iter().zip(cells.iter()) {
            sheet.text(MARGIN + offset, 8.0, false, cell);
        }
        sheet.advance(6.0);
    }

    let pages = sheet.pages.len();
    Ok((sheet, pages))
}

fn ledger_section(sheet: &mut Sheet, title: &str, entries: &[&LedgerTransaction]) {
    let columns = [(0.0, "Tanggal"), (25.0, "Deskripsi"), (100.0, "Jumlah")];
    section_header(sheet, title, &columns);

    if entries.is_empty() {
        sheet.text(MARGIN, 8.0, false, "Tidak ada data");
        sheet.advance(6.0);
    }
    for entry in entries {
        sheet.ensure_room(6.0);
        sheet.text(MARGIN, 8.0, false, &short_date(entry.date));
        sheet.text(
            MARGIN + 25.0,
            8.0,
            false,
            &truncate(&entry.description, DESCRIPTION_CHARS),
        );
        sheet.text(MARGIN + 100.0, 8.0, false, &entry.amount().to_string());
        sheet.advance(6.0);
    }
    sheet.advance(8.0);
}

/// Section title, bold column labels and a rule. Starts a new page when the
/// header and at least one row would not fit.
fn section_header(sheet: &mut Sheet, title: &str, columns: &[(f32, &str)]) {
    sheet.ensure_room(24.0);
    sheet.text(MARGIN, 12.0, true, title);
    sheet.advance(8.0);
    for (offset, label) in columns {
        sheet.text(MARGIN + offset, 8.0, true, label);
    }
    sheet.advance(5.0);
    sheet.rule(MARGIN, A4_WIDTH - MARGIN);
    sheet.advance(5.0);
}

// =============================================================================
// Receipt
// =============================================================================

/// Receipt on a single 80mm-wide page.
pub fn render_receipt_pdf(receipt: &Receipt, store: &StoreInfo) -> Result<Vec<u8>, PdfError> {
    let extra_lines = usize::from(store.address.is_some()) + usize::from(store.footer.is_some());
    let height = 50.0 + 9.0 * receipt.items.len() as f32 + 5.0 * extra_lines as f32;

    let mut sheet = Sheet::new("Struk", RECEIPT_WIDTH, height)?;
    let left = RECEIPT_MARGIN;
    let amount_x = RECEIPT_WIDTH - RECEIPT_MARGIN - 24.0;

    sheet.y = 8.0;
    sheet.text(left, 12.0, true, &store.name);
    sheet.advance(5.0);
    if let Some(address) = &store.address {
        sheet.text(left, 7.0, false, address);
        sheet.advance(5.0);
    }
    sheet.text(
        left,
        8.0,
        false,
        &receipt.date.format("%d/%m/%Y %H:%M").to_string(),
    );
    sheet.advance(4.0);
    sheet.text(left, 8.0, false, &format!("Pembeli: {}", receipt.buyer_name));
    sheet.advance(3.0);
    sheet.rule(left, RECEIPT_WIDTH - RECEIPT_MARGIN);
    sheet.advance(5.0);

    for item in &receipt.items {
        sheet.text(
            left,
            8.0,
            false,
            &format!("{} ({})", item.menu_name, item.size_name),
        );
        sheet.advance(4.0);
        sheet.text(
            left + 2.0,
            8.0,
            false,
            &format!("{} x {}", item.quantity, item.price()),
        );
        sheet.text(amount_x, 8.0, false, &item.line_total().to_string());
        sheet.advance(5.0);
    }

    sheet.rule(left, RECEIPT_WIDTH - RECEIPT_MARGIN);
    sheet.advance(5.0);
    sheet.text(left, 9.0, true, "TOTAL");
    sheet.text(amount_x, 9.0, true, &receipt.total.to_string());
    sheet.advance(8.0);
    if let Some(footer) = &store.footer {
        sheet.text(left, 8.0, false, footer);
    }

    sheet.finish()
}

// =============================================================================
// Sheet
// =============================================================================

/// A document plus a write cursor measured in mm from the top of the
/// current page.
struct Sheet {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    width: f32,
    height: f32,
    y: f32,
}

impl Sheet {
    fn new(title: &str, width: f32, height: f32) -> Result<Self, PdfError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(width), Mm(height), "content");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        Ok(Sheet {
            doc,
            pages: vec![(page, layer)],
            regular,
            bold,
            width,
            height,
            y: TOP,
        })
    }

    fn layer(&self, index: usize) -> PdfLayerReference {
        let (page, layer) = self.pages[index];
        self.doc.get_page(page).get_layer(layer)
    }

    fn current(&self) -> PdfLayerReference {
        self.layer(self.pages.len() - 1)
    }

    fn text(&self, x: f32, size: f32, bold: bool, text: &str) {
        let font = if bold { &self.bold } else { &self.regular };
        self.current()
            .use_text(text, size, Mm(x), Mm(self.height - self.y), font);
    }

    fn rule(&self, from_x: f32, to_x: f32) {
        let y = Mm(self.height - self.y);
        let layer = self.current();
        layer.set_outline_thickness(0.5);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(from_x), y), false),
                (Point::new(Mm(to_x), y), false),
            ],
            is_closed: false,
        });
    }

    fn advance(&mut self, mm: f32) {
        self.y += mm;
    }

    /// Moves to a fresh page unless `mm` more fits above the bottom margin.
    fn ensure_room(&mut self, mm: f32) {
        if self.y + mm > self.height - BOTTOM {
            let (page, layer) = self
                .doc
                .add_page(Mm(self.width), Mm(self.height), "content");
            self.pages.push((page, layer));
            self.y = TOP;
        }
    }

    fn finish_with_page_numbers(self) -> Result<Vec<u8>, PdfError> {
        let total = self.pages.len();
        for index in 0..total {
            self.layer(index).use_text(
                format!("Halaman {} dari {}", index + 1, total),
                8.0,
                Mm(self.width / 2.0 - 12.0),
                Mm(10.0),
                &self.regular,
            );
        }
        self.finish()
    }

    fn finish(self) -> Result<Vec<u8>, PdfError> {
        Ok(self.doc.save_to_bytes()?)
    }
}

fn short_date(instant: DateTime<Utc>) -> String {
    instant.format("%d/%m/%Y").to_string()
}

/// Cuts to `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
