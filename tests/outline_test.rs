//! End-to-end tests: synthetic PDFs through the full outline pipeline.

mod common;

use common::{build_pdf, line, report_pdf};
use pdfoutline::parser::read_lines_from_bytes;
use pdfoutline::{
    extract_outline_from_bytes, schema, HeadingLevel, JsonFormat, OutlineConfig, OutlineEntry,
    Outliner,
};

fn entry(level: HeadingLevel, text: &str, page: u32) -> OutlineEntry {
    OutlineEntry {
        level,
        text: text.to_string(),
        page,
    }
}

#[test]
fn test_raw_lines_from_pdf() {
    let lines = read_lines_from_bytes(&report_pdf(), 0).unwrap();

    let cover = &lines[0];
    assert_eq!(cover.page, 0);
    assert_eq!(cover.spans[0].text, "Annual Research Report");
    assert!((cover.max_size() - 24.0).abs() < 0.01);
    assert!(cover.is_bold());

    let pages: Vec<u32> = lines.iter().map(|l| l.page).collect();
    assert_eq!(pages.first(), Some(&0));
    assert_eq!(pages.last(), Some(&3));
    assert_eq!(lines.len(), 1 + 8 + 3 * 10);
}

#[test]
fn test_report_outline() {
    let outline = extract_outline_from_bytes(&report_pdf()).unwrap();

    assert_eq!(outline.title, "Annual Research Report");
    assert_eq!(
        outline.outline,
        vec![
            entry(HeadingLevel::H1, "Background and Motivation", 1),
            entry(HeadingLevel::H2, "Prior Work Survey", 1),
            entry(HeadingLevel::H1, "Methods Overview", 2),
            entry(HeadingLevel::H2, "Data Collection Process", 2),
            entry(HeadingLevel::H1, "Results and Discussion", 3),
            entry(HeadingLevel::H2, "Limitations Noted", 3),
        ]
    );
    assert!(schema::validate(&outline).is_ok());
}

#[test]
fn test_one_based_pages() {
    let outliner = Outliner::new(OutlineConfig::new().one_based_pages()).unwrap();
    let outline = outliner.extract_bytes(&report_pdf()).unwrap();

    assert_eq!(outline.title, "Annual Research Report");
    let pages: Vec<u32> = outline.outline.iter().map(|e| e.page).collect();
    assert_eq!(pages, [2, 2, 3, 3, 4, 4]);
}

#[test]
fn test_document_without_text() {
    let outline = extract_outline_from_bytes(&build_pdf(&[vec![], vec![]])).unwrap();
    assert!(outline.is_empty());
    assert_eq!(
        outline.to_json(JsonFormat::Compact).unwrap(),
        r#"{"title":"","outline":[]}"#
    );
}

#[test]
fn test_form_outline_is_empty() {
    let pdf = build_pdf(&[vec![
        line("Name:", 12.0),
        line("Designation", 12.0),
        line("Date", 11.0),
        line("S.No", 10.0),
        line("Signature", 10.0),
    ]]);
    let outline = extract_outline_from_bytes(&pdf).unwrap();
    assert_eq!(outline.title, "");
    assert!(outline.outline.iter().all(|e| e.text == "Designation"));
}

#[test]
fn test_running_header_dropped() {
    let page = |heading: &'static str| {
        vec![
            line("Quarterly Briefing", 14.0),
            line(heading, 18.0),
            line("Plain paragraph text", 10.0),
        ]
    };
    let pdf = build_pdf(&[page("Market Summary"), page("Revenue Outlook"), page("Risk Factors")]);
    let outline = extract_outline_from_bytes(&pdf).unwrap();

    assert!(outline.outline.iter().all(|e| e.text != "Quarterly Briefing"));
    assert!(outline.outline.iter().any(|e| e.text == "Revenue Outlook"));
}

#[test]
fn test_output_is_deterministic() {
    let pdf = report_pdf();
    let first = extract_outline_from_bytes(&pdf).unwrap().to_json(JsonFormat::Pretty).unwrap();
    let second = extract_outline_from_bytes(&pdf).unwrap().to_json(JsonFormat::Pretty).unwrap();
    assert_eq!(first, second);
}
