#![allow(dead_code)]

use ecd_report_server::layout::FieldPosition;
use ecd_report_server::pdf::GeneratedDocument;
use ecd_report_server::record::InspectionRecord;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::PathBuf;

/// Build a minimal two-page A4 template.
///
/// Page one inherits its resources from the page tree, page two carries its
/// own, so both lookup paths of the filler are exercised.
pub fn two_page_template() -> Vec<u8> {
    template_with_pages(2)
}

pub fn template_with_pages(count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let shared_resources = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in 0..count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![20.into(), 20.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Template page {}", page + 1))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if page % 2 == 1 {
            page_dict.set("Resources", dictionary! { "Font" => dictionary! { "F1" => font_id } });
        }
        kids.push(doc.add_object(page_dict).into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count as i64,
        "Resources" => shared_resources,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(595), Object::Integer(842)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Two-page template whose first page keeps `/Contents` as a reference to an
/// array of streams instead of a direct stream reference.
pub fn template_with_indirect_contents() -> Vec<u8> {
    let mut doc = Document::load_mem(&two_page_template()).unwrap();
    let page_id = doc.get_pages()[&1];
    let stream_ref = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().clone();
    let array_id = doc.add_object(Object::Array(vec![stream_ref]));
    doc.get_object_mut(page_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Contents", Object::Reference(array_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A piece of text drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnText {
    pub position: FieldPosition,
    pub text: String,
}

/// Every `Tj` on the given page (1-based) with the `Td` position preceding it.
pub fn drawn_text(pdf: &[u8], page_number: u32) -> Vec<DrawnText> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&page_number];
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();

    let mut position = FieldPosition::new(0.0, 0.0);
    let mut drawn = Vec::new();
    for operation in content.operations {
        match operation.operator.as_str() {
            "Td" => {
                position = FieldPosition::new(
                    operation.operands[0].as_float().unwrap(),
                    operation.operands[1].as_float().unwrap(),
                );
            }
            "Tj" => {
                let bytes = operation.operands[0].as_str().unwrap();
                drawn.push(DrawnText {
                    position,
                    text: String::from_utf8_lossy(bytes).into_owned(),
                });
            }
            _ => {}
        }
    }
    drawn
}

/// Text drawn exactly at `(x, y)`.
pub fn text_at(drawn: &[DrawnText], x: f32, y: f32) -> Vec<String> {
    drawn
        .iter()
        .filter(|d| d.position == FieldPosition::new(x, y))
        .map(|d| d.text.clone())
        .collect()
}

pub fn record(pairs: &[(&str, &str)]) -> InspectionRecord {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

pub fn fake_document(index: usize, filename: &str) -> GeneratedDocument {
    GeneratedDocument {
        index,
        filename: filename.to_string(),
        path: PathBuf::from("generated_pdfs").join(filename),
        pdf: b"%PDF-1.5".to_vec(),
    }
}
