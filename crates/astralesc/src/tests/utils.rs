use crate::{EscapingReader, Utf16Units};

/// Reference rendering of an attribute value: every supplementary
/// character as a decimal reference.
pub(crate) fn escape_value(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if u32::from(c) > 0xFFFF {
                format!("&#{};", u32::from(c))
            } else {
                c.to_string()
            }
        })
        .collect()
}

/// Drains `reader` using buffers whose sizes cycle through `sizes`.
pub(crate) fn read_in_chunks(reader: &mut EscapingReader, sizes: &[usize]) -> Vec<u16> {
    let mut out = Vec::new();
    let mut buf = vec![0u16; sizes.iter().copied().max().unwrap_or(1).max(1)];
    let mut turn = 0;
    loop {
        let size = sizes.get(turn % sizes.len().max(1)).copied().unwrap_or(1).max(1);
        turn += 1;
        match reader.read(&mut buf[..size]).unwrap() {
            Some(n) => out.extend_from_slice(&buf[..n]),
            None => return out,
        }
    }
}

pub(crate) fn reader_over(units: Vec<u16>) -> EscapingReader {
    EscapingReader::from_character_stream(Utf16Units::new(units.into_iter()))
}
