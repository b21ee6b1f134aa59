//! Table and image extraction on assembled documents

mod common;

use common::{build_pdf, image_pdf, stream_body, text_pdf, JPEG_STUB, PNG_SIGNATURE};
use pdf_toolkit::text::SeparatorMode;
use pdf_toolkit::{
    extract_images, extract_images_with_options, extract_tables, extract_tables_with_options,
    protect, ExtractImagesOptions, ImageFormat, ParseError, ParseOptions, PdfError, TableOptions,
};
use pretty_assertions::assert_eq;

fn cells(rows: &[pdf_toolkit::TableRow]) -> Vec<Vec<&str>> {
    rows.iter()
        .map(|row| row.cells.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn test_two_columns_make_two_cells() {
    let pdf = text_pdf(&["BT /F1 10 Tf 72 700 Td (Region) Tj 150 0 Td (Total) Tj ET"]);
    let rows = extract_tables(&pdf).unwrap();

    assert_eq!(cells(&rows), vec![vec!["Region", "Total"]]);
    assert!(rows[0].is_header());
}

#[test]
fn test_numeric_row_is_not_a_header() {
    let pdf = text_pdf(&[
        "BT /F1 10 Tf 72 700 Td (City) Tj 150 0 Td (Population) Tj ET \
         BT /F1 10 Tf 72 686 Td (12) Tj 150 0 Td (3400) Tj ET",
    ]);
    let rows = extract_tables(&pdf).unwrap();

    assert_eq!(cells(&rows), vec![vec!["City", "Population"], vec!["12", "3400"]]);
    assert!(rows[0].is_header());
    assert!(!rows[1].is_header());
}

#[test]
fn test_prose_is_not_a_table() {
    let pdf = text_pdf(&["BT /F1 10 Tf 72 700 Td (A single line of running text) Tj ET"]);
    assert!(extract_tables(&pdf).unwrap().is_empty());
}

#[test]
fn test_tables_on_separate_pages_are_separated() {
    let pdf = text_pdf(&[
        "BT /F1 10 Tf 72 700 Td (Key) Tj 150 0 Td (Value) Tj ET",
        "BT /F1 10 Tf 72 700 Td (Other) Tj 150 0 Td (Thing) Tj ET",
    ]);

    let rows = extract_tables(&pdf).unwrap();
    assert_eq!(
        cells(&rows),
        vec![vec!["Key", "Value"], vec![], vec!["Other", "Thing"]]
    );

    let options = TableOptions::default().with_separator(SeparatorMode::None);
    let rows = extract_tables_with_options(&pdf, ParseOptions::default(), options).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_tables_of_protected_document() {
    let pdf = text_pdf(&["BT /F1 10 Tf 72 700 Td (Left) Tj 150 0 Td (Right) Tj ET"]);
    let locked = protect(&pdf, "pw").unwrap();

    assert!(extract_tables(&locked).unwrap_err().is_wrong_password());
    let rows =
        extract_tables_with_options(&locked, ParseOptions::default().with_password("pw"), TableOptions::default())
            .unwrap();
    assert_eq!(cells(&rows), vec![vec!["Left", "Right"]]);
}

#[test]
fn test_jpeg_passes_through_unchanged() {
    let jpeg = stream_body(
        "/Type /XObject /Subtype /Image /Width 4 /Height 4 /ColorSpace /DeviceRGB \
         /BitsPerComponent 8 /Filter /DCTDecode",
        JPEG_STUB,
    );
    let images = extract_images(&image_pdf(&[jpeg])).unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].format, ImageFormat::Jpeg);
    assert_eq!(images[0].file_name(), "image_1.jpg");
    assert_eq!(images[0].data, JPEG_STUB);
    assert!(images[0].data.starts_with(&[0xFF, 0xD8]));
}

#[test]
fn test_raw_samples_become_png() {
    let gray = stream_body(
        "/Type /XObject /Subtype /Image /Width 2 /Height 2 /ColorSpace /DeviceGray \
         /BitsPerComponent 8",
        &[0, 255, 255, 0],
    );
    let images = extract_images(&image_pdf(&[gray])).unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].format, ImageFormat::Png);
    assert_eq!((images[0].width, images[0].height), (2, 2));
    assert!(images[0].data.starts_with(PNG_SIGNATURE));
    assert_eq!(images[0].file_name(), "image_1.png");
}

#[test]
fn test_undecodable_image_is_skipped() {
    let broken = stream_body(
        "/Type /XObject /Subtype /Image /Width 2 /Height 2 /ColorSpace /DeviceRGB \
         /BitsPerComponent 8 /Filter /FlateDecode",
        b"definitely not zlib",
    );
    let jpeg = stream_body(
        "/Type /XObject /Subtype /Image /Width 4 /Height 4 /Filter /DCTDecode",
        JPEG_STUB,
    );
    let images = extract_images(&image_pdf(&[broken, jpeg])).unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].index, 1);
    assert_eq!(images[0].format, ImageFormat::Jpeg);
}

#[test]
fn test_oversized_image_is_skipped() {
    let oversized = stream_body(
        "/Type /XObject /Subtype /Image /Width 4294967295 /Height 4294967295 \
         /ColorSpace /DeviceCMYK /BitsPerComponent 16",
        &[0; 32],
    );
    let jpeg = stream_body(
        "/Type /XObject /Subtype /Image /Width 4 /Height 4 /Filter /DCTDecode",
        JPEG_STUB,
    );
    let images = extract_images(&image_pdf(&[oversized, jpeg])).unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].format, ImageFormat::Jpeg);
}

#[test]
fn test_min_size_filters_small_images() {
    let small = stream_body(
        "/Type /XObject /Subtype /Image /Width 2 /Height 2 /Filter /DCTDecode",
        JPEG_STUB,
    );
    let options = ExtractImagesOptions::default().with_min_size(3);
    let images =
        extract_images_with_options(&image_pdf(&[small]), ParseOptions::default(), options).unwrap();
    assert!(images.is_empty());
}

#[test]
fn test_dangling_reference_is_reported() {
    let pdf = build_pdf(
        &[
            (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
            (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec()),
            (3, b"<< /Type /Page /Parent 2 0 R /Contents 7 0 R >>".to_vec()),
        ],
        "/Root 1 0 R",
    );
    assert!(matches!(
        extract_tables(&pdf),
        Err(PdfError::Parse(ParseError::DanglingReference {
            number: 7,
            generation: 0
        }))
    ));
}

#[test]
fn test_broken_startxref_still_extracts() {
    let mut pdf = text_pdf(&["BT /F1 10 Tf 72 700 Td (Still) Tj 150 0 Td (Here) Tj ET"]);
    let pos = pdf.windows(9).rposition(|w| w == b"startxref").unwrap();
    pdf.truncate(pos);
    pdf.extend_from_slice(b"startxref\n123456789\n%%EOF\n");

    let rows = extract_tables(&pdf).unwrap();
    assert_eq!(cells(&rows), vec![vec!["Still", "Here"]]);

    let strict = extract_tables_with_options(&pdf, ParseOptions::strict(), TableOptions::default());
    assert!(matches!(strict, Err(PdfError::Parse(ParseError::BrokenXref(_)))));
}

#[test]
fn test_missing_stream_length_is_tolerated() {
    let pdf = build_pdf(
        &[
            (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
            (
                2,
                b"<< /Type /Pages /Kids [3 0 R] /Count 1 \
                  /Resources << /Font << /F1 5 0 R >> >> >>"
                    .to_vec(),
            ),
            (3, b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>".to_vec()),
            (
                4,
                b"<< >>\nstream\nBT /F1 10 Tf 72 700 Td (No) Tj 150 0 Td (Length) Tj ET\nendstream"
                    .to_vec(),
            ),
            (5, b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec()),
        ],
        "/Root 1 0 R",
    );

    let rows = extract_tables(&pdf).unwrap();
    assert_eq!(cells(&rows), vec![vec!["No", "Length"]]);
}

#[test]
fn test_indirect_decode_parms_are_applied() {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let content = b"BT /F1 10 Tf 72 700 Td (Item) Tj 150 0 Td (Qty) Tj ET";
    // One PNG Sub row: each byte stored as the difference to its left neighbour
    let mut row = vec![1u8];
    row.extend(content.iter().scan(0u8, |left, &byte| {
        let delta = byte.wrapping_sub(*left);
        *left = byte;
        Some(delta)
    }));
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&row).unwrap();
    let compressed = encoder.finish().unwrap();

    let pdf = build_pdf(
        &[
            (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
            (
                2,
                b"<< /Type /Pages /Kids [3 0 R] /Count 1 \
                  /Resources << /Font << /F1 5 0 R >> >> >>"
                    .to_vec(),
            ),
            (3, b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>".to_vec()),
            (4, stream_body("/Filter /FlateDecode /DecodeParms 6 0 R", &compressed)),
            (5, b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec()),
            (
                6,
                format!("<< /Predictor 11 /Columns {} >>", content.len()).into_bytes(),
            ),
        ],
        "/Root 1 0 R",
    );

    let rows = extract_tables(&pdf).unwrap();
    assert_eq!(cells(&rows), vec![vec!["Item", "Qty"]]);
}
