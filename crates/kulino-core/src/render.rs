//! # Printable Documents
//!
//! Receipts and financial reports as self-contained HTML (ready for the
//! browser's print dialog) plus a fixed-width text receipt for thermal
//! printers. PDF output lives in [`crate::pdf`]. Everything here is a pure function of its arguments: callers
//! resolve the sale or report first and pass it in.
//!
//! ```text
//!   SaleDetail ──► Receipt::from_sale ──┬──► render_receipt_html
//!                                       └──► render_receipt_text
//!   Report ─────────────────────────────────► render_report_html
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{LedgerTransaction, Report, SaleDetail, SaleItem};
use crate::DEFAULT_STORE_NAME;

/// Narrowest text receipt we will lay out.
pub const MIN_TEXT_WIDTH: usize = 24;

/// Widest text receipt: an 80mm printer's line at its smallest font.
pub const MAX_TEXT_WIDTH: usize = 80;

// =============================================================================
// Inputs
// =============================================================================

/// Store identity printed on every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreInfo {
    pub name: String,
    pub address: Option<String>,
    /// Closing line on receipts.
    pub footer: Option<String>,
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: DEFAULT_STORE_NAME.to_string(),
            address: None,
            footer: Some("Terima kasih!".to_string()),
        }
    }
}

/// A resolved sale, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub sale_id: String,
    pub buyer_name: String,
    pub date: DateTime<Utc>,
    pub items: Vec<SaleItem>,
    pub total: Money,
}

impl Receipt {
    pub fn from_sale(sale: &SaleDetail) -> Self {
        Receipt {
            sale_id: sale.header.id.clone(),
            buyer_name: sale.header.buyer_name.clone(),
            date: sale.header.date,
            items: sale.items.clone(),
            total: sale.header.total(),
        }
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// 80mm receipt page.
pub fn render_receipt_html(receipt: &Receipt, store: &StoreInfo) -> String {
    let mut rows = String::new();
    for item in &receipt.items {
        rows.push_str(&format!(
            "<tr><td>{} ({})<br><small>{} x {}</small></td><td class=\"num\">{}</td></tr>\n",
            esc(&item.menu_name),
            esc(&item.size_name),
            item.quantity,
            item.price(),
            item.line_total(),
        ));
    }

    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>\n", esc(&store.name)));
    if let Some(address) = &store.address {
        body.push_str(&format!("<p class=\"center\">{}</p>\n", esc(address)));
    }
    body.push_str(&format!(
        "<p>Tanggal: {}<br>Pembeli: {}</p>\n",
        format_timestamp(receipt.date),
        esc(&receipt.buyer_name)
    ));
    body.push_str("<table>\n");
    body.push_str(&rows);
    body.push_str(&format!(
        "<tr class=\"total\"><td>TOTAL</td><td class=\"num\">{}</td></tr>\n",
        receipt.total
    ));
    body.push_str("</table>\n");
    if let Some(footer) = &store.footer {
        body.push_str(&format!("<p class=\"center\">{}</p>\n", esc(footer)));
    }

    html_shell(
        &format!("Struk {}", esc(&receipt.buyer_name)),
        RECEIPT_CSS,
        &body,
    )
}

/// Fixed-width receipt for thermal printers. `width` is in characters and is
/// clamped to `MIN_TEXT_WIDTH..=MAX_TEXT_WIDTH`.
///
/// ## Example
/// ```text
/// ================================
///          Kulino Ngemil
/// ================================
/// 05/03/2024 10:15
/// Pembeli: Sari
/// --------------------------------
/// Keripik (Besar)
///   2 x Rp 15.000        Rp 30.000
/// --------------------------------
/// TOTAL                  Rp 30.000
/// ```
pub fn render_receipt_text(receipt: &Receipt, store: &StoreInfo, width: usize) -> String {
    let width = width.clamp(MIN_TEXT_WIDTH, MAX_TEXT_WIDTH);
    let rule = |c: char| c.to_string().repeat(width);

    let mut out = Vec::new();
    out.push(rule('='));
    out.push(center(&store.name, width));
    if let Some(address) = &store.address {
        out.push(center(address, width));
    }
    out.push(rule('='));
    out.push(format_timestamp(receipt.date));
    out.push(format!("Pembeli: {}", receipt.buyer_name));
    out.push(rule('-'));
    for item in &receipt.items {
        out.push(format!("{} ({})", item.menu_name, item.size_name));
        out.push(spread(
            &format!("  {} x {}", item.quantity, item.price()),
            &item.line_total().to_string(),
            width,
        ));
    }
    out.push(rule('-'));
    out.push(spread("TOTAL", &receipt.total.to_string(), width));
    if let Some(footer) = &store.footer {
        out.push(String::new());
        out.push(center(footer, width));
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

// =============================================================================
// Report
// =============================================================================

/// Financial report for the period in `report.date_range`.
pub fn render_report_html(report: &Report, store: &StoreInfo) -> String {
    let (income, expense) = report.partition();

    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>\n", esc(&store.name)));
    body.push_str("<h2>Laporan Keuangan</h2>\n");
    body.push_str(&format!(
        "<p>Periode: {}</p>\n",
        esc(&report.date_range.period_label())
    ));

    body.push_str("<table class=\"summary\">\n");
    for (label, value) in [
        ("Total Pemasukan", Money::from_rupiah(report.total_income).to_string()),
        ("Total Pengeluaran", Money::from_rupiah(report.total_expense).to_string()),
        ("Laba Bersih", Money::from_rupiah(report.net).to_string()),
        ("Item Terjual", report.total_sales.to_string()),
    ] {
        body.push_str(&format!(
            "<tr><th>{}</th><td class=\"num\">{}</td></tr>\n",
            label, value
        ));
    }
    body.push_str("</table>\n");

    body.push_str(&ledger_table("Pemasukan", &income));
    body.push_str(&ledger_table("Pengeluaran", &expense));

    body.push_str("<h3>Penjualan</h3>\n");
    if report.sales.is_empty() {
        body.push_str("<p class=\"empty\">Tidak ada penjualan</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Tanggal</th><th>Menu</th><th>Ukuran</th>\
             <th>Jumlah</th><th>Harga</th><th>Total</th></tr>\n",
        );
        for item in &report.sales {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
                format_timestamp(item.date),
                esc(&item.menu_name),
                esc(&item.size_name),
                item.quantity,
                item.price(),
                item.line_total(),
            ));
        }
        body.push_str("</table>\n");
    }

    html_shell("Laporan Keuangan", REPORT_CSS, &body)
}

fn ledger_table(title: &str, entries: &[&LedgerTransaction]) -> String {
    let mut out = format!("<h3>{}</h3>\n", title);
    if entries.is_empty() {
        out.push_str("<p class=\"empty\">Tidak ada data</p>\n");
        return out;
    }

    out.push_str("<table>\n<tr><th>Tanggal</th><th>Keterangan</th><th>Jumlah</th></tr>\n");
    let mut subtotal = Money::zero();
    for entry in entries {
        subtotal += entry.amount();
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>\n",
            format_timestamp(entry.date),
            esc(&entry.description),
            entry.amount(),
        ));
    }
    out.push_str(&format!(
        "<tr class=\"total\"><td colspan=\"2\">Subtotal</td><td class=\"num\">{}</td></tr>\n",
        subtotal
    ));
    out.push_str("</table>\n");
    out
}

// =============================================================================
// Helpers
// =============================================================================

const RECEIPT_CSS: &str = "body{font-family:monospace;width:80mm;margin:0 auto;font-size:12px}\
h1{text-align:center;font-size:16px}.center{text-align:center}\
table{width:100%;border-collapse:collapse}.num{text-align:right}\
.total td{border-top:1px dashed #000;font-weight:bold}";

const REPORT_CSS: &str = "body{font-family:sans-serif;margin:2em}\
table{width:100%;border-collapse:collapse;margin-bottom:1.5em}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
.num{text-align:right}.total td{font-weight:bold}.summary{width:auto}\
.empty{color:#777}";

fn html_shell(title: &str, css: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        title, css, body
    )
}

/// Minimal HTML escaping for text nodes and attribute values.
fn esc(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%d/%m/%Y %H:%M").to_string()
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((width - len) / 2), text)
}

fn spread(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = width.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

// =============================================================================
// Unit Tests
// =============================================================================
