//! Template filler.
//!
//! Loads the two-page report template with lopdf, appends one content stream
//! per page holding the record's text, and writes the result to the output
//! directory. The template's own content is wrapped in `q`/`Q` so whatever
//! graphics state it leaves behind cannot affect the stamped text.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lazy_static::lazy_static;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use regex::Regex;

use super::font::TimesRoman;
use super::{GeneratedDocument, Generator, GeneratorError};
use crate::layout::{wrap_text, FieldPosition, PageLayout, TemplateLayout};
use crate::record::InspectionRecord;
use crate::summary::build_summary;

/// Resource name the stamped text refers to.
const FONT_RESOURCE: &str = "FInspection";

/// Parent-chain depth searched for inherited page resources.
const MAX_INHERITANCE_DEPTH: usize = 16;

lazy_static! {
    static ref UNSAFE_FILE_CHARS: Regex =
        Regex::new(r"[^A-Za-z0-9_-]").expect("file name pattern is valid");
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    UNSAFE_FILE_CHARS.replace_all(name, "_").into_owned()
}

/// File stem for a record: the sanitized owner name, or `entry_<index>`.
pub fn output_file_stem(record: &InspectionRecord, index: usize) -> String {
    match record.owner_name() {
        Some(owner) => sanitize_file_stem(owner),
        None => format!("entry_{}", index),
    }
}

/// Fills the report template for each record and writes it to disk.
pub struct PdfFormFiller {
    template_path: PathBuf,
    output_dir: PathBuf,
    layout: Arc<TemplateLayout>,
    font: TimesRoman,
}

impl PdfFormFiller {
    pub fn new(
        template_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        layout: Arc<TemplateLayout>,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            output_dir: output_dir.into(),
            layout,
            font: TimesRoman,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Stamp `record` onto the template and return the serialized document.
    pub fn fill_bytes(
        &self,
        template: &[u8],
        record: &InspectionRecord,
    ) -> Result<Vec<u8>, GeneratorError> {
        let mut doc = Document::load_mem(template)?;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.len() < 2 {
            return Err(GeneratorError::MissingPage {
                expected: 2,
                found: pages.len(),
            });
        }
        let (first_page, second_page) = (pages[0], pages[1]);

        let font_id = doc.add_object(Object::Dictionary(TimesRoman::dictionary()));

        let page_one = self.page_one_text(record);
        stamp_page(&mut doc, first_page, font_id, self.layout.font_size, &page_one)?;

        let page_two = layout_text(&self.layout.page_two, record);
        stamp_page(&mut doc, second_page, font_id, self.layout.font_size, &page_two)?;

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| GeneratorError::Serialize(e.to_string()))?;
        Ok(output)
    }

    /// Owner name, wrapped summary lines and the page-one fields, in draw order.
    fn page_one_text(&self, record: &InspectionRecord) -> Vec<(FieldPosition, String)> {
        let layout = &self.layout;
        let mut items = vec![(
            layout.owner_name,
            record.value_or_default(crate::record::OWNER_NAME_FIELD).to_string(),
        )];

        let summary = build_summary(record);
        let lines = wrap_text(&summary, &self.font, layout.font_size, layout.summary.max_width);
        log::debug!("Summary wrapped into {} line(s)", lines.len());

        let mut y = layout.summary.y;
        for line in lines {
            items.push((FieldPosition::new(layout.summary.x, y), line));
            y -= layout.summary.line_height;
        }

        items.extend(layout_text(&layout.page_one, record));
        items
    }
}

impl Generator for PdfFormFiller {
    fn generate(
        &self,
        record: &InspectionRecord,
        index: usize,
    ) -> Result<GeneratedDocument, GeneratorError> {
        let template = fs::read(&self.template_path).map_err(GeneratorError::TemplateIo)?;
        let pdf = self.fill_bytes(&template, record)?;

        let filename = format!("{}.pdf", output_file_stem(record, index));
        fs::create_dir_all(&self.output_dir).map_err(GeneratorError::OutputDir)?;
        let path = self.output_dir.join(&filename);
        fs::write(&path, &pdf).map_err(GeneratorError::WritePdf)?;

        log::debug!("Wrote {} ({} bytes)", path.display(), pdf.len());

        Ok(GeneratedDocument {
            index,
            filename,
            path,
            pdf,
        })
    }
}

/// Every field of a page layout paired with its value, once per position.
fn layout_text(layout: &PageLayout, record: &InspectionRecord) -> Vec<(FieldPosition, String)> {
    layout
        .iter()
        .flat_map(|(label, placement)| {
            let value = record.value_or_default(label);
            placement
                .positions()
                .iter()
                .map(move |position| (*position, value.to_string()))
        })
        .collect()
}

fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    font_size: f32,
    items: &[(FieldPosition, String)],
) -> Result<(), GeneratorError> {
    register_font(doc, page_id, font_id)?;

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "rg",
            vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        ),
    ];
    for (position, text) in items {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_RESOURCE.as_bytes().to_vec()),
                Object::Real(font_size),
            ],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(position.x), Object::Real(position.y)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(TimesRoman::encode(text), StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    operations.push(Operation::new("Q", vec![]));

    let overlay = Content { operations }.encode()?;
    append_page_content(doc, page_id, overlay)
}

/// Make `font_id` available to the page as [`FONT_RESOURCE`].
///
/// The page gets its own resource dictionary (a copy of the inherited or
/// referenced one) so other pages sharing the original are left untouched.
fn register_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<(), GeneratorError> {
    let mut resources = match find_resources(doc, page_id)? {
        Some(Object::Reference(id)) => doc.get_dictionary(id)?.clone(),
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id)?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// The page's `/Resources`, looking up the page tree when it is inherited.
fn find_resources(doc: &Document, page_id: ObjectId) -> Result<Option<Object>, GeneratorError> {
    let mut node = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return Ok(Some(resources.clone()));
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node = doc.get_dictionary(*parent_id)?,
            _ => break,
        }
    }
    Ok(None)
}

/// Wrap the existing page content in `q`/`Q` and append `overlay` after it.
fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    overlay: Vec<u8>,
) -> Result<(), GeneratorError> {
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        // An indirect /Contents may point at a stream or at an array of streams.
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if !existing.is_empty() {
        let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        contents.push(Object::Reference(save));
        contents.extend(existing);
        contents.push(Object::Reference(restore));
    }
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));
    contents.push(Object::Reference(overlay_id));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}
