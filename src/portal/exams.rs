//! The member exam table.
//!
//! Column layout, left to right: exam code, period, city, result (text and
//! optional link), status, then any number of action cells holding links.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Header text of the code column; rows repeating it are skipped.
pub const HEADER_CODE_LABEL: &str = "Kode Ujian";

/// Action labels that are never reported (matched case-insensitively as substrings).
pub const ACTION_DENYLIST: [&str; 3] = ["detail", "cetak undangan", "cetak kartu ujian"];

#[allow(clippy::expect_used)]
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("row selector must parse"));

#[allow(clippy::expect_used)]
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector must parse"));

/// The result column of an exam row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRef {
    /// Visible result text, e.g. `Lulus` or `-`.
    pub text: String,
    /// Absolute link to the result document, if published.
    pub link: Option<String>,
}

/// A link offered in the action columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamAction {
    /// Visible label.
    pub text: String,
    /// Absolute target URL.
    pub link: String,
}

/// One row of the exam table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRecord {
    /// Exam code, e.g. `A20-2025-III`.
    pub code: String,
    /// Exam period as shown in the table.
    pub period: String,
    /// Exam city.
    pub city: String,
    /// Result column text and its document link, if published.
    pub result: ResultRef,
    /// Registration or exam status.
    pub status: String,
    /// Row actions minus the denylisted ones.
    pub actions: Vec<ExamAction>,
}

/// Parses every exam row in `html`; links resolve against `page_url`.
///
/// Rows without data cells, with an empty code, or repeating the header are
/// skipped. Missing trailing columns read as empty text.
#[must_use]
pub fn parse_exam_table(html: &str, page_url: &Url) -> Vec<ExamRecord> {
    let document = Html::parse_document(html);
    let records: Vec<ExamRecord> = document
        .select(&ROW_SELECTOR)
        .filter_map(|row| parse_row(row, page_url))
        .collect();
    debug!(url = %page_url, rows = records.len(), "exam table parsed");
    records
}

fn parse_row(row: ElementRef<'_>, page_url: &Url) -> Option<ExamRecord> {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| cell.value().name() == "td")
        .collect();

    let code = cell_text(cells.first());
    if code.is_empty() || code.eq_ignore_ascii_case(HEADER_CODE_LABEL) {
        return None;
    }

    let result = ResultRef {
        text: cell_text(cells.get(3)),
        link: cells
            .get(3)
            .and_then(|cell| cell.select(&LINK_SELECTOR).next())
            .and_then(|anchor| resolve_href(anchor, page_url)),
    };

    let actions = cells
        .iter()
        .skip(5)
        .flat_map(|cell| cell.select(&LINK_SELECTOR))
        .filter_map(|anchor| {
            let text = element_text(anchor);
            if text.is_empty() || is_denied(&text) {
                return None;
            }
            Some(ExamAction {
                link: resolve_href(anchor, page_url)?,
                text,
            })
        })
        .collect();

    Some(ExamRecord {
        code,
        period: cell_text(cells.get(1)),
        city: cell_text(cells.get(2)),
        result,
        status: cell_text(cells.get(4)),
        actions,
    })
}

fn is_denied(label: &str) -> bool {
    let label = label.to_lowercase();
    ACTION_DENYLIST.iter().any(|denied| label.contains(denied))
}

fn cell_text(cell: Option<&ElementRef<'_>>) -> String {
    cell.map(|cell| element_text(*cell)).unwrap_or_default()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_href(anchor: ElementRef<'_>, page_url: &Url) -> Option<String> {
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    page_url.join(href).ok().map(String::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        <table class="table">
          <thead>
            <tr><th>Kode Ujian</th><th>Periode</th><th>Kota</th><th>Hasil</th><th>Status</th><th>Aksi</th></tr>
          </thead>
          <tbody>
            <tr>
              <td>KODE UJIAN</td><td>Periode</td><td>Kota</td><td>Hasil</td><td>Status</td><td></td>
            </tr>
            <tr>
              <td> A20-2025-III </td>
              <td>Periode III 2025</td>
              <td>Jakarta</td>
              <td><a href="/peserta/hasil/881.pdf">Lihat  Hasil</a></td>
              <td>Selesai</td>
              <td>
                <a href="/peserta/detail/881">Detail</a>
                <a href="/peserta/undangan/881">Cetak Undangan</a>
                <a href="/peserta/kartu/881">CETAK KARTU UJIAN</a>
                <a href="/peserta/sertifikat/881">Unduh Sertifikat</a>
              </td>
              <td><a href="https://cdn.example/pembahasan.pdf">Pembahasan</a></td>
            </tr>
            <tr>
              <td>A30-2025-III</td><td>Periode III 2025</td><td>Bandung</td><td>-</td><td>Terdaftar</td>
            </tr>
            <tr><td></td><td>kosong</td></tr>
          </tbody>
        </table>"#;

    fn page() -> Url {
        Url::parse("https://portal.example/peserta/ujian").unwrap()
    }

    #[test]
    fn test_parses_rows_and_skips_header_and_empty() {
        let records = parse_exam_table(TABLE, &page());
        let codes: Vec<_> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["A20-2025-III", "A30-2025-III"]);
    }

    #[test]
    fn test_result_column_text_and_link() {
        let records = parse_exam_table(TABLE, &page());
        assert_eq!(
            records[0].result,
            ResultRef {
                text: "Lihat Hasil".to_string(),
                link: Some("https://portal.example/peserta/hasil/881.pdf".to_string()),
            }
        );
        assert_eq!(records[0].period, "Periode III 2025");
        assert_eq!(records[0].city, "Jakarta");
        assert_eq!(records[0].status, "Selesai");

        assert_eq!(records[1].result.text, "-");
        assert_eq!(records[1].result.link, None);
    }

    #[test]
    fn test_actions_exclude_denylist_case_insensitively() {
        let records = parse_exam_table(TABLE, &page());
        assert_eq!(
            records[0].actions,
            vec![
                ExamAction {
                    text: "Unduh Sertifikat".to_string(),
                    link: "https://portal.example/peserta/sertifikat/881".to_string(),
                },
                ExamAction {
                    text: "Pembahasan".to_string(),
                    link: "https://cdn.example/pembahasan.pdf".to_string(),
                },
            ]
        );
        assert!(records[1].actions.is_empty());
    }

    #[test]
    fn test_no_table_is_empty() {
        assert!(parse_exam_table("<p>Belum ada ujian</p>", &page()).is_empty());
    }

    #[test]
    fn test_denylist_matches_substrings() {
        assert!(is_denied("Lihat Detail Ujian"));
        assert!(!is_denied("Sertifikat"));
    }
}
