//! Synthetic PDF builder shared by the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// One line of text placed on a page.
pub struct TextLine {
    pub text: &'static str,
    pub size: f32,
    pub font: &'static str,
}

pub fn line(text: &'static str, size: f32) -> TextLine {
    TextLine {
        text,
        size,
        font: "F1",
    }
}

pub fn bold(text: &'static str, size: f32) -> TextLine {
    TextLine {
        text,
        size,
        font: "F2",
    }
}

/// Build a PDF whose pages hold the given lines, top to bottom.
pub fn build_pdf(pages: &[Vec<TextLine>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let heavy = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => heavy,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        let mut y = 760.0;
        for l in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(l.font.as_bytes().to_vec()), Object::Real(l.size)],
            ));
            operations.push(Operation::new("Td", vec![Object::Real(72.0), Object::Real(y)]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(l.text)]));
            operations.push(Operation::new("ET", vec![]));
            y -= l.size * 2.0;
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A report with a cover title, three chapters and repeated body text.
pub fn report_pdf() -> Vec<u8> {
    let body = || (0..8).map(|_| line("Body text that fills the page with ordinary prose", 10.0));

    let mut cover = vec![bold("Annual Research Report", 24.0)];
    cover.extend(body());

    let chapter = |title: &'static str, section: &'static str| {
        let mut page = vec![bold(title, 16.0), line(section, 12.0)];
        page.extend(body());
        page
    };

    build_pdf(&[
        cover,
        chapter("Background and Motivation", "Prior Work Survey"),
        chapter("Methods Overview", "Data Collection Process"),
        chapter("Results and Discussion", "Limitations Noted"),
    ])
}
