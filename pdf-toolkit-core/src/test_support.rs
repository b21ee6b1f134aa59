//! In-memory documents for unit tests

use crate::objects::{Dictionary, Object, Stream};
use crate::Document;

/// Document with `page_count` pages, each showing `(Page N)` with a font
/// shared through the page tree root's `/Resources`.
pub fn sample_document(title: &str, page_count: usize) -> Document {
    let contents: Vec<String> = (1..=page_count)
        .map(|number| format!("BT /F1 12 Tf 72 720 Td (Page {number}) Tj ET"))
        .collect();
    let mut doc = document_with_contents(&contents);

    let mut info = Dictionary::new();
    info.set("Title", Object::String(title.as_bytes().to_vec()));
    let info_id = doc.add_object(info);
    doc.trailer_mut().set("Info", info_id);

    doc
}

/// One page per entry of `contents`, with font `/F1` (Helvetica, no
/// widths) shared through the page tree root's `/Resources`
pub fn document_with_contents(contents: &[impl AsRef<str>]) -> Document {
    let mut doc = Document::new();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name("Font".to_string()));
    font.set("Subtype", Object::Name("Type1".to_string()));
    font.set("BaseFont", Object::Name("Helvetica".to_string()));
    let font_id = doc.add_object(font);

    let mut fonts = Dictionary::new();
    fonts.set("F1", font_id);
    let mut resources = Dictionary::new();
    resources.set("Font", fonts);

    let pages_root = doc.pages_root_id().unwrap();
    let root = doc.get_mut(pages_root).and_then(Object::as_dict_mut).unwrap();
    root.set("Resources", resources);
    root.set(
        "MediaBox",
        Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
    );

    for content in contents {
        let mut stream = Stream::new(Dictionary::new(), Vec::new());
        stream.set_data(content.as_ref().as_bytes().to_vec());
        let content_id = doc.add_object(stream);

        let mut page = Dictionary::new();
        page.set("Type", Object::Name("Page".to_string()));
        page.set("Contents", content_id);
        let page_id = doc.add_object(page);
        doc.append_page(page_id).unwrap();
    }

    doc
}

/// The first literal string shown on page `index`
pub fn page_text_marker(doc: &Document, index: usize) -> String {
    let content = doc.page_contents(doc.page_ids()[index]).unwrap();
    let text = String::from_utf8_lossy(&content);
    let start = text.find('(').unwrap() + 1;
    let end = text[start..].find(')').unwrap() + start;
    text[start..end].to_string()
}
