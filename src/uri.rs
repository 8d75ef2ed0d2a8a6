use crate::error::{Error, Result};

/// `decodeURIComponent`: every `%XX` escape is decoded, multi-byte escapes
/// must form valid UTF-8.
pub fn decode_uri_component(src: &str) -> Result<String> {
    let bytes = src.as_bytes();
    let mut out = String::with_capacity(src.len());
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            let ch = src[i..]
                .chars()
                .next()
                .ok_or_else(|| malformed(src))?;
            out.push(ch);
            i += ch.len_utf8();
            continue;
        }

        let first = parse_percent_byte(src, i)?;
        if first < 0x80 {
            out.push(first as char);
            i += 3;
            continue;
        }

        let len = utf8_sequence_len(first).ok_or_else(|| malformed(src))?;
        let mut raw_end = i + 3;
        let mut chunk = Vec::with_capacity(len);
        chunk.push(first);
        for _ in 1..len {
            if raw_end >= bytes.len() || bytes[raw_end] != b'%' {
                return Err(malformed(src));
            }
            chunk.push(parse_percent_byte(src, raw_end)?);
            raw_end += 3;
        }
        let decoded = std::str::from_utf8(&chunk).map_err(|_| malformed(src))?;
        out.push_str(decoded);
        i = raw_end;
    }

    Ok(out)
}

fn malformed(src: &str) -> Error {
    Error::MalformedUri(src.chars().take(40).collect())
}

fn parse_percent_byte(src: &str, offset: usize) -> Result<u8> {
    let bytes = src.as_bytes();
    if offset + 2 >= bytes.len() || bytes[offset] != b'%' {
        return Err(malformed(src));
    }
    let hi = from_hex_digit(bytes[offset + 1]).ok_or_else(|| malformed(src))?;
    let lo = from_hex_digit(bytes[offset + 2]).ok_or_else(|| malformed(src))?;
    Ok((hi << 4) | lo)
}

fn utf8_sequence_len(first: u8) -> Option<usize> {
    match first {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

fn from_hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
