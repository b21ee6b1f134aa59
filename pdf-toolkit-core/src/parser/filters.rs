//! PDF Stream Filters
//!
//! Handles decompression and decoding of PDF streams according to ISO 32000-1
//! Section 7.4. Image codecs (JPEG, JPEG 2000, JBIG2, CCITT) are not decoded:
//! decoding stops in front of them and the result is tagged with the codec so
//! callers can keep the native bytes.

use crate::objects::{Dictionary, Stream};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Errors raised while decoding one stream
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Corrupt {filter} data: {message}")]
    Corrupt { filter: String, message: String },

    #[error("Unsupported image layout: {0}")]
    UnsupportedImage(String),
}

impl CodecError {
    fn corrupt(filter: &str, message: impl Into<String>) -> Self {
        CodecError::Corrupt {
            filter: filter.to_string(),
            message: message.into(),
        }
    }
}

/// Supported PDF filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// ASCII hex decode
    ASCIIHexDecode,

    /// ASCII 85 decode
    ASCII85Decode,

    /// LZW decode
    LZWDecode,

    /// Flate decode (zlib/deflate compression)
    FlateDecode,

    /// Run length decode
    RunLengthDecode,

    /// CCITT fax decode
    CCITTFaxDecode,

    /// JBIG2 decode
    JBIG2Decode,

    /// DCT decode (JPEG)
    DCTDecode,

    /// JPX decode (JPEG 2000)
    JPXDecode,

    /// Crypt filter; decryption happens when the document is loaded
    Crypt,
}

impl Filter {
    /// Parse filter from name, including the abbreviations allowed in inline images
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ASCIIHexDecode" | "AHx" => Some(Filter::ASCIIHexDecode),
            "ASCII85Decode" | "A85" => Some(Filter::ASCII85Decode),
            "LZWDecode" | "LZW" => Some(Filter::LZWDecode),
            "FlateDecode" | "Fl" => Some(Filter::FlateDecode),
            "RunLengthDecode" | "RL" => Some(Filter::RunLengthDecode),
            "CCITTFaxDecode" | "CCF" => Some(Filter::CCITTFaxDecode),
            "JBIG2Decode" => Some(Filter::JBIG2Decode),
            "DCTDecode" | "DCT" => Some(Filter::DCTDecode),
            "JPXDecode" => Some(Filter::JPXDecode),
            "Crypt" => Some(Filter::Crypt),
            _ => None,
        }
    }

    fn native_codec(self) -> Option<NativeCodec> {
        match self {
            Filter::DCTDecode => Some(NativeCodec::Jpeg),
            Filter::JPXDecode => Some(NativeCodec::Jpeg2000),
            Filter::JBIG2Decode => Some(NativeCodec::Jbig2),
            Filter::CCITTFaxDecode => Some(NativeCodec::CcittFax),
            _ => None,
        }
    }
}

/// Image codecs whose bytes are handed over untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCodec {
    Jpeg,
    Jpeg2000,
    Jbig2,
    CcittFax,
}

/// Output of [`decode_stream`]
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub data: Vec<u8>,
    /// Set when decoding stopped in front of an image codec
    pub native: Option<NativeCodec>,
}

/// Decode stream data according to its filter chain.
pub fn decode_stream(stream: &Stream) -> Result<Decoded, CodecError> {
    let filters = stream.filters();
    let params = stream.decode_params();

    let mut data = stream.data.clone();
    for (name, params) in filters.iter().zip(params.iter()) {
        let filter =
            Filter::from_name(name).ok_or_else(|| CodecError::UnsupportedFilter(name.clone()))?;

        if let Some(native) = filter.native_codec() {
            return Ok(Decoded {
                data,
                native: Some(native),
            });
        }

        data = apply_filter(&data, filter, params.as_ref())?;
    }

    Ok(Decoded { data, native: None })
}

/// Decode a stream that must end up as plain bytes (content streams,
/// object streams, cross-reference streams).
pub fn decode_to_bytes(stream: &Stream) -> Result<Vec<u8>, CodecError> {
    let decoded = decode_stream(stream)?;
    match decoded.native {
        None => Ok(decoded.data),
        Some(native) => Err(CodecError::UnsupportedFilter(format!("{native:?}"))),
    }
}

/// Apply a single filter to data
fn apply_filter(
    data: &[u8],
    filter: Filter,
    params: Option<&Dictionary>,
) -> Result<Vec<u8>, CodecError> {
    match filter {
        Filter::FlateDecode => apply_predictor(decode_flate(data)?, params),
        Filter::LZWDecode => apply_predictor(decode_lzw(data, params)?, params),
        Filter::ASCIIHexDecode => decode_ascii_hex(data),
        Filter::ASCII85Decode => decode_ascii85(data),
        Filter::RunLengthDecode => Ok(decode_run_length(data)),
        Filter::Crypt => Ok(data.to_vec()),
        other => Err(CodecError::UnsupportedFilter(format!("{other:?}"))),
    }
}

fn decode_flate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    match decoder.read_to_end(&mut result) {
        Ok(_) => Ok(result),
        // Truncated streams are common; keep what inflated cleanly
        Err(e) if !result.is_empty() => {
            tracing::warn!("FlateDecode stopped early ({}), keeping {} bytes", e, result.len());
            Ok(result)
        }
        Err(e) => Err(CodecError::corrupt("FlateDecode", e.to_string())),
    }
}

fn decode_lzw(data: &[u8], params: Option<&Dictionary>) -> Result<Vec<u8>, CodecError> {
    use weezl::{decode::Decoder, BitOrder};

    let early_change = params
        .and_then(|p| p.get_integer("EarlyChange"))
        .unwrap_or(1);
    let mut decoder = if early_change == 0 {
        Decoder::new(BitOrder::Msb, 8)
    } else {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    };

    decoder
        .decode(data)
        .map_err(|e| CodecError::corrupt("LZWDecode", e.to_string()))
}

fn decode_ascii_hex(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &ch in data {
        if ch == b'>' {
            break;
        }
        if ch.is_ascii_whitespace() {
            continue;
        }
        let value = hex_digit_value(ch).ok_or_else(|| {
            CodecError::corrupt("ASCIIHexDecode", format!("invalid character 0x{ch:02X}"))
        })?;
        match high.take() {
            Some(h) => result.push((h << 4) | value),
            None => high = Some(value),
        }
    }

    if let Some(h) = high {
        result.push(h << 4);
    }

    Ok(result)
}

fn hex_digit_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

fn decode_ascii85(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut result = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut count = 0;

    let body = data.strip_prefix(b"<~").unwrap_or(data);
    for &ch in body {
        match ch {
            b'~' => break,
            b'z' if count == 0 => result.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group[count] = ch - b'!';
                count += 1;
                if count == 5 {
                    result.extend_from_slice(&ascii85_group(&group)?);
                    count = 0;
                }
            }
            _ if ch.is_ascii_whitespace() => {}
            _ => {
                return Err(CodecError::corrupt(
                    "ASCII85Decode",
                    format!("invalid character 0x{ch:02X}"),
                ))
            }
        }
    }

    match count {
        0 => {}
        1 => return Err(CodecError::corrupt("ASCII85Decode", "dangling final character")),
        _ => {
            for slot in group.iter_mut().skip(count) {
                *slot = b'u' - b'!';
            }
            let bytes = ascii85_group(&group)?;
            result.extend_from_slice(&bytes[..count - 1]);
        }
    }

    Ok(result)
}

fn ascii85_group(group: &[u8; 5]) -> Result<[u8; 4], CodecError> {
    let value = group
        .iter()
        .try_fold(0u64, |acc, &digit| Some(acc * 85 + u64::from(digit)))
        .filter(|&v| v <= u64::from(u32::MAX))
        .ok_or_else(|| CodecError::corrupt("ASCII85Decode", "group out of range"))?;
    Ok((value as u32).to_be_bytes())
}

fn decode_run_length(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() * 2);
    let mut i = 0;

    while i < data.len() {
        let length = data[i];
        i += 1;
        match length {
            128 => break,
            0..=127 => {
                let end = (i + length as usize + 1).min(data.len());
                result.extend_from_slice(&data[i..end]);
                i = end;
            }
            _ => {
                if let Some(&byte) = data.get(i) {
                    result.extend(std::iter::repeat(byte).take(257 - length as usize));
                }
                i += 1;
            }
        }
    }

    result
}

/// Undo PNG (10-15) or TIFF (2) prediction described by `/DecodeParms`
fn apply_predictor(data: Vec<u8>, params: Option<&Dictionary>) -> Result<Vec<u8>, CodecError> {
    let Some(params) = params else {
        return Ok(data);
    };
    let predictor = params.get_integer("Predictor").unwrap_or(1);
    if predictor <= 1 {
        return Ok(data);
    }

    let colors = params.get_integer("Colors").unwrap_or(1).clamp(1, 32) as usize;
    let bits = params.get_integer("BitsPerComponent").unwrap_or(8).clamp(1, 16) as usize;
    let columns = params.get_integer("Columns").unwrap_or(1).max(1) as usize;

    if data.is_empty() {
        return Ok(data);
    }

    let bytes_per_pixel = (colors * bits).div_ceil(8).max(1);
    let row_length = (colors * bits)
        .checked_mul(columns)
        .map(|row_bits| row_bits.div_ceil(8))
        .filter(|&len| len <= data.len())
        .ok_or_else(|| {
            CodecError::corrupt(
                "Predictor",
                format!("/Columns {columns} exceeds the {} decoded bytes", data.len()),
            )
        })?;

    match predictor {
        2 => tiff_predictor(data, bits, bytes_per_pixel, row_length),
        10..=15 => png_predictor(&data, bytes_per_pixel, row_length),
        other => Err(CodecError::UnsupportedFilter(format!("Predictor {other}"))),
    }
}

fn tiff_predictor(
    mut data: Vec<u8>,
    bits: usize,
    bytes_per_pixel: usize,
    row_length: usize,
) -> Result<Vec<u8>, CodecError> {
    if bits != 8 {
        return Err(CodecError::UnsupportedFilter(format!(
            "TIFF predictor with {bits} bits per component"
        )));
    }
    for row in data.chunks_mut(row_length) {
        for i in bytes_per_pixel..row.len() {
            row[i] = row[i].wrapping_add(row[i - bytes_per_pixel]);
        }
    }
    Ok(data)
}

fn png_predictor(
    data: &[u8],
    bytes_per_pixel: usize,
    row_length: usize,
) -> Result<Vec<u8>, CodecError> {
    let mut result = Vec::with_capacity(data.len());
    let mut previous = vec![0u8; row_length];

    for chunk in data.chunks(row_length + 1) {
        let (&filter_type, encoded) = chunk
            .split_first()
            .ok_or_else(|| CodecError::corrupt("Predictor", "empty row"))?;
        let mut row = encoded.to_vec();
        row.resize(row_length, 0);

        for i in 0..row_length {
            let left = if i >= bytes_per_pixel { row[i - bytes_per_pixel] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bytes_per_pixel { previous[i - bytes_per_pixel] } else { 0 };

            row[i] = match filter_type {
                0 => row[i],
                1 => row[i].wrapping_add(left),
                2 => row[i].wrapping_add(up),
                3 => row[i].wrapping_add(((u16::from(left) + u16::from(up)) / 2) as u8),
                4 => row[i].wrapping_add(paeth(left, up, up_left)),
                other => {
                    return Err(CodecError::corrupt(
                        "Predictor",
                        format!("unknown PNG row filter {other}"),
                    ))
                }
            };
        }

        result.extend_from_slice(&row[..encoded.len().min(row_length)]);
        previous = row;
    }

    Ok(result)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
