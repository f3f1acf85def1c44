//! Byte transforms without a crate of their own: ROT13 and uuencode.

use jsonkit_core::Error;

/// Rotate ASCII letters by 13 places. Other bytes pass through.
pub fn rot13(input: &[u8]) -> Vec<u8> {
    input
        .iter()
        .map(|&b| match b {
            b'a'..=b'z' => (b - b'a' + 13) % 26 + b'a',
            b'A'..=b'Z' => (b - b'A' + 13) % 26 + b'A',
            _ => b,
        })
        .collect()
}

const UU_LINE: usize = 45;

fn uu_char(v: u8) -> u8 {
    if v == 0 {
        b'`'
    } else {
        v + 32
    }
}

fn uu_value(c: u8) -> u8 {
    c.wrapping_sub(32) & 0x3f
}

/// Encode bytes as a uuencode body: 45-byte lines led by a length character
/// and closed by a "`" line.
pub fn uuencode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() * 4 / 3 + input.len() / UU_LINE * 2 + 4);
    for line in input.chunks(UU_LINE) {
        out.push(uu_char(line.len() as u8));
        for group in line.chunks(3) {
            let b0 = group[0];
            let b1 = group.get(1).copied().unwrap_or(0);
            let b2 = group.get(2).copied().unwrap_or(0);
            out.push(uu_char(b0 >> 2));
            out.push(uu_char(((b0 << 4) | (b1 >> 4)) & 0x3f));
            out.push(uu_char(((b1 << 2) | (b2 >> 6)) & 0x3f));
            out.push(uu_char(b2 & 0x3f));
        }
        out.push(b'\n');
    }
    out.extend_from_slice(b"`\n");
    out
}

/// Decode a uuencode body produced by [`uuencode`].
pub fn uudecode(input: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(input.len() * 3 / 4);
    for line in input.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let Some((&len_char, body)) = line.split_first() else {
            continue;
        };
        let len = uu_value(len_char) as usize;
        if len == 0 {
            break;
        }
        if body.len() < len.div_ceil(3) * 4 {
            return Err(Error::decode("uu", "line shorter than its length prefix"));
        }
        let mut decoded = Vec::with_capacity(len + 2);
        for group in body.chunks(4).take(len.div_ceil(3)) {
            let c: Vec<u8> = group.iter().map(|&c| uu_value(c)).collect();
            decoded.push((c[0] << 2) | (c[1] >> 4));
            decoded.push((c[1] << 4) | (c[2] >> 2));
            decoded.push((c[2] << 6) | c[3]);
        }
        decoded.truncate(len);
        out.extend_from_slice(&decoded);
    }
    Ok(out)
}
