use crate::document::Document;
use crate::encryption::ObjectEncryptor;
use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::BTreeMap;
use std::io::Write;

/// Trailer keys carried over from the source document
const TRAILER_KEYS: [&str; 3] = ["Root", "Info", "ID"];

pub struct PdfWriter<W: Write> {
    writer: W,
    xref_positions: BTreeMap<ObjectId, u64>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: BTreeMap::new(),
            current_position: 0,
        }
    }

    /// Write `document` as a complete file with a classic cross-reference
    /// table. Encrypted documents get their strings and streams encrypted
    /// and an `/Encrypt` dictionary appended.
    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        self.write_header(document)?;

        let encryptor = document
            .encryption()
            .map(|encryption| ObjectEncryptor::new(&encryption.key, &encryption.state));

        for (&id, object) in document.objects() {
            match &encryptor {
                Some(encryptor) => {
                    let mut encrypted = object.clone();
                    encryptor.encrypt(id, &mut encrypted)?;
                    self.write_object(id, &encrypted)?;
                }
                None => self.write_object(id, object)?,
            }
        }

        let mut trailer = Dictionary::new();
        for key in TRAILER_KEYS {
            if let Some(value) = document.trailer().get(key) {
                trailer.set(key, value.clone());
            }
        }

        if let Some(encryption) = document.encryption() {
            let encrypt_id = ObjectId::new(document.max_object_number() + 1, 0);
            self.write_object(encrypt_id, &Object::Dictionary(encryption.state.to_dict()))?;
            trailer.set("Encrypt", encrypt_id);

            // Key derivation is bound to the first /ID element
            let id = Object::String(encryption.state.file_id.clone());
            trailer.set("ID", Object::Array(vec![id.clone(), id]));
        }

        let max_obj_num = self
            .xref_positions
            .keys()
            .map(ObjectId::number)
            .max()
            .unwrap_or(0);
        trailer.set("Size", i64::from(max_obj_num) + 1);

        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(&trailer, xref_position)?;

        self.writer.flush()?;
        Ok(())
    }

    fn write_header(&mut self, document: &Document) -> Result<()> {
        self.write_bytes(format!("%PDF-{}\n", document.version()).as_bytes())?;
        // Binary comment to ensure file is treated as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }

    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()> {
        self.xref_positions.insert(id, self.current_position);

        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;

        self.write_object_value(object)?;

        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }

    fn write_object_value(&mut self, object: &Object) -> Result<()> {
        match object {
            Object::Null => self.write_bytes(b"null")?,
            Object::Boolean(b) => self.write_bytes(if *b { b"true" } else { b"false" })?,
            Object::Integer(i) => self.write_bytes(i.to_string().as_bytes())?,
            Object::Real(f) => self.write_bytes(format_real(*f).as_bytes())?,
            Object::String(s) => self.write_bytes(&encode_string(s))?,
            Object::Name(n) => self.write_bytes(&encode_name(n))?,
            Object::Array(arr) => {
                self.write_bytes(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        self.write_bytes(b" ")?;
                    }
                    self.write_object_value(obj)?;
                }
                self.write_bytes(b"]")?;
            }
            Object::Dictionary(dict) => self.write_dictionary(dict)?,
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.data.len() as i64);
                self.write_dictionary(&dict)?;
                self.write_bytes(b"\nstream\n")?;
                self.write_bytes(&stream.data)?;
                self.write_bytes(b"\nendstream")?;
            }
            Object::Reference(id) => {
                let ref_str = format!("{} {} R", id.number(), id.generation());
                self.write_bytes(ref_str.as_bytes())?;
            }
        }
        Ok(())
    }

    fn write_dictionary(&mut self, dict: &Dictionary) -> Result<()> {
        self.write_bytes(b"<<")?;
        for (key, value) in dict.iter() {
            self.write_bytes(b"\n")?;
            self.write_bytes(&encode_name(key))?;
            self.write_bytes(b" ")?;
            self.write_object_value(value)?;
        }
        self.write_bytes(b"\n>>")?;
        Ok(())
    }

    /// One subsection per run of consecutive object numbers
    fn write_xref(&mut self) -> Result<()> {
        self.write_bytes(b"xref\n")?;
        self.write_bytes(b"0 1\n0000000000 65535 f \n")?;

        let entries: Vec<(ObjectId, u64)> = self
            .xref_positions
            .iter()
            .map(|(id, pos)| (*id, *pos))
            .collect();

        let mut start = 0;
        while start < entries.len() {
            let mut end = start + 1;
            while end < entries.len()
                && entries[end].0.number() == entries[end - 1].0.number() + 1
            {
                end += 1;
            }

            let header = format!("{} {}\n", entries[start].0.number(), end - start);
            self.write_bytes(header.as_bytes())?;
            for (id, position) in &entries[start..end] {
                let entry = format!("{:010} {:05} n \n", position, id.generation());
                self.write_bytes(entry.as_bytes())?;
            }
            start = end;
        }

        Ok(())
    }

    fn write_trailer(&mut self, trailer: &Dictionary, xref_position: u64) -> Result<()> {
        self.write_bytes(b"trailer\n")?;
        self.write_dictionary(trailer)?;
        self.write_bytes(b"\nstartxref\n")?;
        self.write_bytes(xref_position.to_string().as_bytes())?;
        self.write_bytes(b"\n%%EOF\n")?;

        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

/// Reals without exponent, trailing zeros trimmed
fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let text = format!("{value:.6}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Literal string when the bytes are printable text, hex string otherwise
fn encode_string(bytes: &[u8]) -> Vec<u8> {
    let printable = bytes
        .iter()
        .all(|&b| (0x20..0x7F).contains(&b) || matches!(b, b'\n' | b'\r' | b'\t'));

    if !printable {
        let mut out = Vec::with_capacity(bytes.len() * 2 + 2);
        out.push(b'<');
        for byte in bytes {
            out.extend_from_slice(format!("{byte:02X}").as_bytes());
        }
        out.push(b'>');
        return out;
    }

    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => out.extend_from_slice(&[b'\\', byte]),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\t' => out.extend_from_slice(b"\\t"),
            _ => out.push(byte),
        }
    }
    out.push(b')');
    out
}

/// `/Name` with delimiters, whitespace, `#` and non-ASCII bytes escaped
fn encode_name(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len() + 1);
    out.push(b'/');
    for &byte in name.as_bytes() {
        let regular = (0x21..0x7F).contains(&byte)
            && !matches!(
                byte,
                b'#' | b'/' | b'%' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}'
            );
        if regular {
            out.push(byte);
        } else {
            out.extend_from_slice(format!("#{byte:02X}").as_bytes());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Stream;
    use crate::parser::{ParseOptions, PdfReader};
    use pretty_assertions::assert_eq;

    fn write(document: &Document) -> Vec<u8> {
        let mut buffer = Vec::new();
        PdfWriter::new_with_writer(&mut buffer)
            .write_document(document)
            .unwrap();
        buffer
    }

    fn value(object: &Object) -> String {
        let mut buffer = Vec::new();
        PdfWriter::new_with_writer(&mut buffer)
            .write_object_value(object)
            .unwrap();
        String::from_utf8_lossy(&buffer).into_owned()
    }

    #[test]
    fn test_write_header() {
        let output = write(&Document::new());
        assert!(output.starts_with(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n"));
        assert!(output.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_write_object_values() {
        assert_eq!(value(&Object::Null), "null");
        assert_eq!(value(&Object::Boolean(true)), "true");
        assert_eq!(value(&Object::Integer(-42)), "-42");
        assert_eq!(value(&Object::Real(1.5)), "1.5");
        assert_eq!(value(&Object::Real(2.0)), "2");
        assert_eq!(value(&Object::Real(-0.0000001)), "0");
        assert_eq!(value(&Object::Reference(ObjectId::new(5, 2))), "5 2 R");
        assert_eq!(
            value(&Object::Array(vec![1.into(), Object::Name("A".to_string())])),
            "[1 /A]"
        );
    }

    #[test]
    fn test_write_special_characters_in_strings() {
        assert_eq!(value(&Object::String(b"a(b)c\\".to_vec())), "(a\\(b\\)c\\\\)");
        assert_eq!(value(&Object::String(b"line\n".to_vec())), "(line\\n)");
        assert_eq!(value(&Object::String(vec![0x00, 0xFF])), "<00FF>");
    }

    #[test]
    fn test_write_names_with_special_chars() {
        assert_eq!(value(&Object::Name("Name With Space".to_string())), "/Name#20With#20Space");
        assert_eq!(value(&Object::Name("A#B".to_string())), "/A#23B");
    }

    #[test]
    fn test_stream_length_is_rewritten() {
        let mut dict = Dictionary::new();
        dict.set("Length", 999i64);
        let output = value(&Object::Stream(Stream::new(dict, b"abc".to_vec())));
        assert_eq!(output, "<<\n/Length 3\n>>\nstream\nabc\nendstream");
    }

    #[test]
    fn test_xref_subsections() {
        let mut doc = Document::new();
        doc.set_object(ObjectId::new(5, 0), 1i64);
        let output = String::from_utf8_lossy(&write(&doc)).into_owned();

        assert!(output.contains("xref\n0 1\n0000000000 65535 f \n1 2\n"));
        assert!(output.contains("\n5 1\n"));
        assert!(output.contains("/Size 6"));
    }

    #[test]
    fn test_written_document_reparses() {
        let mut doc = Document::new();
        let mut stream = Stream::new(Dictionary::new(), Vec::new());
        stream.set_data(b"BT ET".to_vec());
        let content = doc.add_object(stream);
        let mut page = Dictionary::new();
        page.set("Type", Object::Name("Page".to_string()));
        page.set("Contents", content);
        page.set("Note", Object::String(b"(nested) \\ text".to_vec()));
        let page_id = doc.add_object(page);
        doc.append_page(page_id).unwrap();

        let bytes = write(&doc);
        let reparsed = PdfReader::new(&bytes, ParseOptions::strict()).parse().unwrap();
        assert_eq!(reparsed.page_count(), 1);
        assert_eq!(reparsed.objects(), doc.objects());
    }
}
