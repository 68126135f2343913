//! # Ticket Exporter
//!
//! Turns a finalized [`Sale`] into a printable A6 receipt.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ticket Export                                    │
//! │                                                                         │
//! │   Sale ──► Ticket::from_sale() ──► Vec<TicketPage> ──► to_pdf()        │
//! │            (layout, pagination)     (positioned text)   (PDF 1.4 bytes) │
//! │                                                                         │
//! │   A6 page (297.64 × 419.53 pt)                                          │
//! │   ┌──────────────────────────┐                                          │
//! │   │ TICKET            14pt   │  y = 20                                  │
//! │   │                          │  +30                                     │
//! │   │ Date: 2026-10-19 14:03   │  10pt                                    │
//! │   │                          │  +20                                     │
//! │   │ Zelda (2) - $119.98      │  10pt, +20 per line                      │
//! │   │ Tetris (1) - $9.99       │                                          │
//! │   │                          │  +10                                     │
//! │   │ Total: $129.97    12pt   │                                          │
//! │   └──────────────────────────┘                                          │
//! │   Lines that would cross the bottom margin start a new page.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Layout and rendering are pure functions of their inputs. Nothing here
//! touches the filesystem or the clock.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::types::Sale;

// =============================================================================
// Page Geometry
// =============================================================================

/// A6 width in PDF points.
pub const PAGE_WIDTH: f32 = 297.64;

/// A6 height in PDF points.
pub const PAGE_HEIGHT: f32 = 419.53;

const MARGIN: f32 = 20.0;
const TITLE_ADVANCE: f32 = 30.0;
const LINE_ADVANCE: f32 = 20.0;
const TOTAL_GAP: f32 = 10.0;

const TITLE_FONT_SIZE: f32 = 14.0;
const BODY_FONT_SIZE: f32 = 10.0;
const TOTAL_FONT_SIZE: f32 = 12.0;

// =============================================================================
// Configuration
// =============================================================================

/// Store-level settings that shape every ticket.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Heading printed on the first line.
    pub title: String,

    /// Goes into the PDF document information dictionary.
    pub store_name: String,

    /// Prefix for every amount, e.g. `$` or `S/ `.
    pub currency_symbol: String,

    /// Offset used to print the sale date in store-local time.
    pub utc_offset: FixedOffset,
}

impl Default for TicketConfig {
    fn default() -> Self {
        TicketConfig {
            title: "TICKET".to_string(),
            store_name: "Level 99 Game Store".to_string(),
            currency_symbol: "$".to_string(),
            utc_offset: Utc.fix(),
        }
    }
}

// =============================================================================
// Layout Types
// =============================================================================

/// One positioned line of text.
///
/// `y` is the baseline measured from the top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketLine {
    pub text: String,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
}

/// One A6 page of the ticket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketPage {
    pub lines: Vec<TicketLine>,
}

/// A laid-out ticket, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pages: Vec<TicketPage>,
    document_title: String,
    created_at: DateTime<Utc>,
}

struct Layout {
    pages: Vec<TicketPage>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Layout {
            pages: vec![TicketPage::default()],
            y: MARGIN,
        }
    }

    /// Places a line at the cursor, breaking to a new page first if the
    /// baseline would fall inside the bottom margin.
    fn place(&mut self, text: String, font_size: f32) {
        if self.y > PAGE_HEIGHT - MARGIN {
            self.pages.push(TicketPage::default());
            self.y = MARGIN;
        }

        if let Some(page) = self.pages.last_mut() {
            page.lines.push(TicketLine {
                text,
                font_size,
                x: MARGIN,
                y: self.y,
            });
        }
    }

    fn advance(&mut self, by: f32) {
        self.y += by;
    }
}

impl Ticket {
    /// Lays out `sale` onto as many A6 pages as it needs.
    pub fn from_sale(sale: &Sale, config: &TicketConfig) -> Self {
        let symbol = config.currency_symbol.as_str();
        let mut layout = Layout::new();

        layout.place(config.title.clone(), TITLE_FONT_SIZE);
        layout.advance(TITLE_ADVANCE);

        let local = sale.timestamp.with_timezone(&config.utc_offset);
        layout.place(
            format!("Date: {}", local.format("%Y-%m-%d %H:%M")),
            BODY_FONT_SIZE,
        );
        layout.advance(LINE_ADVANCE);

        for line in &sale.items {
            layout.place(
                format!(
                    "{} ({}) - {}",
                    line.product.name,
                    line.quantity,
                    line.line_total().format_with(symbol)
                ),
                BODY_FONT_SIZE,
            );
            layout.advance(LINE_ADVANCE);
        }

        layout.advance(TOTAL_GAP);
        layout.place(
            format!("Total: {}", sale.total.format_with(symbol)),
            TOTAL_FONT_SIZE,
        );

        Ticket {
            pages: layout.pages,
            document_title: format!("{} ticket", config.store_name),
            created_at: sale.timestamp,
        }
    }

    /// Download name for a ticket exported at `exported_at`.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use level99_core::Ticket;
    ///
    /// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    /// assert_eq!(Ticket::filename(at), "ticket_1700000000123.pdf");
    /// ```
    pub fn filename(exported_at: DateTime<Utc>) -> String {
        format!("ticket_{}.pdf", exported_at.timestamp_millis())
    }

    pub fn pages(&self) -> &[TicketPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every line's text, in print order across pages.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|page| page.lines.iter().map(|line| line.text.as_str()))
    }

    /// Renders the ticket as a PDF 1.4 document.
    ///
    /// ## Object Layout
    /// ```text
    /// 1 0 obj  Catalog
    /// 2 0 obj  Pages (Kids = every page object)
    /// 3 0 obj  Font  (Type1 Helvetica, WinAnsiEncoding)
    /// 4 0 obj  Info
    /// 5 0 obj  Page 1      6 0 obj  Page 1 content stream
    /// 7 0 obj  Page 2      8 0 obj  Page 2 content stream
    /// ...
    /// ```
    pub fn to_pdf(&self) -> Vec<u8> {
        let mut pdf = PdfWriter::new();
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| 5 + 2 * i).collect();

        pdf.object(1, b"<< /Type /Catalog /Pages 2 0 R >>");

        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        pdf.object(
            2,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 {:.2} {:.2}] >>",
                kids,
                page_ids.len(),
                PAGE_WIDTH,
                PAGE_HEIGHT
            )
            .as_bytes(),
        );

        pdf.object(
            3,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );

        let mut info = b"<< /Title (".to_vec();
        info.extend(encode_text(&self.document_title));
        info.extend(
            format!(
                ") /Producer (level99) /CreationDate (D:{}Z) >>",
                self.created_at.format("%Y%m%d%H%M%S")
            )
            .as_bytes(),
        );
        pdf.object(4, &info);

        for (page, &page_id) in self.pages.iter().zip(&page_ids) {
            let content_id = page_id + 1;
            pdf.object(
                page_id,
                format!(
                    "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                    content_id
                )
                .as_bytes(),
            );
            pdf.stream(content_id, &page_content(page));
        }

        pdf.finish(1, 4)
    }
}

// =============================================================================
// PDF Encoding
// =============================================================================

/// Text-drawing operators for one page.
fn page_content(page: &TicketPage) -> Vec<u8> {
    let mut out = Vec::new();
    for line in &page.lines {
        out.extend(
            format!(
                "BT /F1 {:.0} Tf {:.2} {:.2} Td (",
                line.font_size,
                line.x,
                PAGE_HEIGHT - line.y
            )
            .as_bytes(),
        );
        out.extend(encode_text(&line.text));
        out.extend(b") Tj ET\n");
    }
    out
}

/// Encodes `text` for a PDF literal string in WinAnsi.
///
/// Latin-1 characters map to their own byte; anything outside that range
/// prints as `?`. Parentheses and backslashes are escaped.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            ' '..='~' => out.push(ch as u8),
            '\u{A0}'..='\u{FF}' => out.push(ch as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Minimal PDF serializer that tracks object offsets for the xref table.
///
/// Objects must be written in id order starting at 1.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        // The binary comment marks the file as 8-bit for transfer tools.
        buf.extend(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        PdfWriter {
            buf,
            offsets: Vec::new(),
        }
    }

    fn begin(&mut self, id: usize) {
        debug_assert_eq!(id, self.offsets.len() + 1);
        self.offsets.push(self.buf.len());
        self.buf.extend(format!("{} 0 obj\n", id).as_bytes());
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.begin(id);
        self.buf.extend(body);
        self.buf.extend(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, data: &[u8]) {
        self.begin(id);
        self.buf
            .extend(format!("<< /Length {} >>\nstream\n", data.len()).as_bytes());
        self.buf.extend(data);
        self.buf.extend(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_at = self.buf.len();
        let size = self.offsets.len() + 1;

        self.buf
            .extend(format!("xref\n0 {}\n0000000000 65535 f \n", size).as_bytes());
        for offset in &self.offsets {
            self.buf
                .extend(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        self.buf.extend(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                size, root, info, xref_at
            )
            .as_bytes(),
        );
        self.buf
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::money::Money;
    use crate::types::{CartLine, Product};

    fn sale_with(lines: Vec<(&str, i64, i64)>) -> Sale {
        let items: Vec<CartLine> = lines
            .into_iter()
            .enumerate()
            .map(|(i, (name, cents, quantity))| CartLine {
                product: Product::new(i as i64 + 1, name, Money::from_cents(cents), None),
                quantity,
            })
            .collect();
        let total = items.iter().map(CartLine::line_total).sum();
        Sale {
            items,
            total,
            timestamp: Utc.with_ymd_and_hms(2026, 10, 19, 18, 30, 0).unwrap(),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_layout_lines() {
        let sale = sale_with(vec![("Zelda", 5999, 2), ("Tetris", 999, 1)]);
        let ticket = Ticket::from_sale(&sale, &TicketConfig::default());

        let texts: Vec<&str> = ticket.texts().collect();
        assert_eq!(
            texts,
            vec![
                "TICKET",
                "Date: 2026-10-19 18:30",
                "Zelda (2) - $119.98",
                "Tetris (1) - $9.99",
                "Total: $129.97",
            ]
        );
        assert_eq!(ticket.page_count(), 1);

        let lines = &ticket.pages()[0].lines;
        assert_eq!(lines[0].font_size, TITLE_FONT_SIZE);
        assert_eq!(lines[0].y, 20.0);
        assert_eq!(lines[1].y, 50.0);
        assert_eq!(lines[2].y, 70.0);
        assert_eq!(lines[4].font_size, TOTAL_FONT_SIZE);
        assert_eq!(lines[4].y, 120.0);
    }

    #[test]
    fn test_date_uses_configured_offset() {
        let sale = sale_with(vec![("Doom", 100, 1)]);
        let config = TicketConfig {
            utc_offset: FixedOffset::west_opt(5 * 3600).unwrap(),
            currency_symbol: "S/ ".to_string(),
            ..TicketConfig::default()
        };
        let ticket = Ticket::from_sale(&sale, &config);

        let texts: Vec<&str> = ticket.texts().collect();
        assert_eq!(texts[1], "Date: 2026-10-19 13:30");
        assert_eq!(texts[2], "Doom (1) - S/ 1.00");
    }

    #[test]
    fn test_long_sale_paginates() {
        let items: Vec<(&str, i64, i64)> = (0..40).map(|_| ("Cartridge", 500, 1)).collect();
        let sale = sale_with(items);
        let ticket = Ticket::from_sale(&sale, &TicketConfig::default());

        assert!(ticket.page_count() >= 2);
        assert_eq!(ticket.texts().count(), 40 + 3);
        for page in ticket.pages() {
            assert!(!page.lines.is_empty());
            for line in &page.lines {
                assert!(line.y >= MARGIN && line.y <= PAGE_HEIGHT - MARGIN);
            }
        }
        assert_eq!(ticket.texts().last(), Some("Total: $200.00"));
    }

    #[test]
    fn test_filename_uses_millis() {
        let at = Utc.timestamp_millis_opt(1_760_898_600_042).unwrap();
        assert_eq!(Ticket::filename(at), "ticket_1760898600042.pdf");
    }

    #[test]
    fn test_encode_text_escapes_and_replaces() {
        assert_eq!(encode_text("Zelda (Deluxe)"), b"Zelda \\(Deluxe\\)".to_vec());
        assert_eq!(encode_text("a\\b"), b"a\\\\b".to_vec());
        assert_eq!(encode_text("Pokémon"), b"Pok\xE9mon".to_vec());
        assert_eq!(encode_text("ゼルダ"), b"???".to_vec());
    }

    #[test]
    fn test_pdf_structure() {
        let sale = sale_with(vec![("Zelda", 5999, 2)]);
        let pdf = Ticket::from_sale(&sale, &TicketConfig::default()).to_pdf();

        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(contains(&pdf, b"/BaseFont /Helvetica"));
        assert!(contains(&pdf, b"(Zelda \\(2\\) - $119.98) Tj"));
        assert!(contains(&pdf, b"/Count 1"));
    }

    #[test]
    fn test_pdf_xref_offsets_point_at_objects() {
        let items: Vec<(&str, i64, i64)> = (0..40).map(|_| ("Cartridge", 500, 1)).collect();
        let ticket = Ticket::from_sale(&sale_with(items), &TicketConfig::default());
        let pdf = ticket.to_pdf();

        let marker = b"startxref\n";
        let startxref = pdf
            .windows(marker.len())
            .rposition(|w| w == marker)
            .unwrap()
            + marker.len();
        let trailer = std::str::from_utf8(&pdf[startxref..]).unwrap();
        let xref_at: usize = trailer.lines().next().unwrap().parse().unwrap();

        let xref = std::str::from_utf8(&pdf[xref_at..]).unwrap();
        assert!(xref.starts_with("xref\n"));

        let object_count = 4 + 2 * ticket.page_count();
        let entries: Vec<&str> = xref.lines().skip(3).take(object_count).collect();
        assert_eq!(entries.len(), object_count);
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let header = format!("{} 0 obj\n", i + 1);
            assert!(pdf[offset..].starts_with(header.as_bytes()), "object {}", i + 1);
        }
    }
}
