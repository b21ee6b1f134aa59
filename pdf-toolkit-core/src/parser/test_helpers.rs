//! Helper functions for creating valid test PDFs with correct offsets

/// Build a PDF from `(object number, body)` pairs with a classic xref table.
///
/// `trailer_extra` is spliced into the trailer dictionary next to `/Size`.
pub fn build_pdf(objects: &[(u32, &str)], trailer_extra: &str) -> Vec<u8> {
    let owned: Vec<(u32, Vec<u8>)> = objects
        .iter()
        .map(|(n, body)| (*n, body.as_bytes().to_vec()))
        .collect();
    build_pdf_bytes(&owned, trailer_extra)
}

/// Same as [`build_pdf`] for bodies holding binary stream data
pub fn build_pdf_bytes(objects: &[(u32, Vec<u8>)], trailer_extra: &str) -> Vec<u8> {
    let mut content = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = std::collections::BTreeMap::new();

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

/// One-page document whose page lives in an object stream, indexed by a
/// cross-reference stream (object 5).
pub fn xref_stream_pdf() -> Vec<u8> {
    let mut content = b"%PDF-1.7\n".to_vec();
    let mut offsets = [0usize; 6];

    let objects: [(usize, Vec<u8>); 3] = [
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec()),
        (4, {
            let header = b"3 0 ";
            let page = b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] >>";
            let mut data = header.to_vec();
            data.extend_from_slice(page);
            stream_body(&format!("/Type /ObjStm /N 1 /First {}", header.len()), &data)
        }),
    ];

    for (number, body) in &objects {
        offsets[*number] = content.len();
        content.extend_from_slice(format!("{number} 0 obj\n").as_bytes());
        content.extend_from_slice(body);
        content.extend_from_slice(b"\nendobj\n");
    }

    offsets[5] = content.len();
    let mut rows = Vec::new();
    let mut row = |kind: u8, field2: u32, field3: u16| {
        rows.push(kind);
        rows.extend_from_slice(&field2.to_be_bytes());
        rows.extend_from_slice(&field3.to_be_bytes());
    };
    row(0, 0, 65535);
    row(1, offsets[1] as u32, 0);
    row(1, offsets[2] as u32, 0);
    row(2, 4, 0);
    row(1, offsets[4] as u32, 0);
    row(1, offsets[5] as u32, 0);

    content.extend_from_slice(b"5 0 obj\n");
    content.extend_from_slice(&stream_body(
        "/Type /XRef /Size 6 /W [1 4 2] /Index [0 6] /Root 1 0 R",
        &rows,
    ));
    content.extend_from_slice(b"\nendobj\n");
    content.extend_from_slice(format!("startxref\n{}\n%%EOF\n", offsets[5]).as_bytes());
    content
}
