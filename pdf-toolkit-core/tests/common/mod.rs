//! Hand-assembled PDF fixtures with correct cross-reference offsets

#![allow(dead_code)]

use std::collections::BTreeMap;

/// Build a PDF from `(object number, body)` pairs with a classic xref
/// table. `trailer_extra` lands in the trailer next to `/Size`.
pub fn build_pdf(objects: &[(u32, Vec<u8>)], trailer_extra: &str) -> Vec<u8> {
    let mut content = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = BTreeMap::new();

    for (number, body) in objects {
        offsets.insert(*number, content.len());
        content.extend_from_slice(format!("{number} 0 obj\n").as_bytes());
        content.extend_from_slice(body);
        content.extend_from_slice(b"\nendobj\n");
    }

    let size = offsets.keys().max().map_or(1, |max| max + 1);
    let xref_start = content.len();
    let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
    for number in 1..size {
        match offsets.get(&number) {
            Some(offset) => xref.push_str(&format!("{offset:010} 00000 n \n")),
            None => xref.push_str("0000000000 00001 f \n"),
        }
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {size} {trailer_extra} >>\nstartxref\n{xref_start}\n%%EOF\n"
    ));

    content.extend_from_slice(xref.as_bytes());
    content
}

/// Stream object body with a correct `/Length`
pub fn stream_body(dict_entries: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!("<< {dict_entries} /Length {} >>\nstream\n", data.len()).into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

/// One page per content stream, all sharing Helvetica as `/F1`.
///
/// Objects: 1 catalog, 2 page tree, 3 font, then a page and its content
/// stream for each entry.
pub fn text_pdf(contents: &[&str]) -> Vec<u8> {
    let page_ids: Vec<u32> = (0..contents.len() as u32).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (
            2,
            format!(
                "<< /Type /Pages /Kids [{kids}] /Count {} /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> >>",
                contents.len()
            )
            .into_bytes(),
        ),
        (
            3,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec(),
        ),
    ];
    for (content, page_id) in contents.iter().zip(&page_ids) {
        objects.push((
            *page_id,
            format!(
                "<< /Type /Page /Parent 2 0 R /Contents {} 0 R >>",
                page_id + 1
            )
            .into_bytes(),
        ));
        objects.push((page_id + 1, stream_body("", content.as_bytes())));
    }

    build_pdf(&objects, "/Root 1 0 R")
}

/// Single page whose `/XObject` resources hold the given image streams,
/// named `/Im1`, `/Im2`, ...
pub fn image_pdf(images: &[Vec<u8>]) -> Vec<u8> {
    let names = (0..images.len())
        .map(|i| format!("/Im{} {} 0 R", i + 1, 4 + i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec()),
        (
            3,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /XObject << {names} >> >> >>"
            )
            .into_bytes(),
        ),
    ];
    for (index, image) in images.iter().enumerate() {
        objects.push((4 + index as u32, image.clone()));
    }

    build_pdf(&objects, "/Root 1 0 R")
}

/// Contents of a JPEG with start and end markers only
pub const JPEG_STUB: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9,
];

pub const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Literal strings of the content stream of page `index`, in order
pub fn shown_strings(document: &pdf_toolkit::Document, index: usize) -> Vec<String> {
    let content = document
        .page_contents(document.page_ids()[index])
        .unwrap();
    let text = String::from_utf8_lossy(&content).into_owned();

    let mut strings = Vec::new();
    let mut rest = text.as_str();
    while let Some(start) = rest.find('(') {
        let Some(len) = rest[start + 1..].find(')') else {
            break;
        };
        strings.push(rest[start + 1..start + 1 + len].to_string());
        rest = &rest[start + 1 + len + 1..];
    }
    strings
}
