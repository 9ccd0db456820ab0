/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

/// Windows-1252 mappings for the 0x80..0x9f range; the rest of the code
/// page is identical to Latin-1.
const CP1252_C1: [char; 32] = [
    '\u{20ac}', '\u{0081}', '\u{201a}', '\u{0192}', '\u{201e}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02c6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008d}', '\u{017d}', '\u{008f}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02dc}', '\u{2122}', '\u{0161}', '\u{203a}', '\u{0153}', '\u{009d}', '\u{017e}', '\u{0178}',
];

pub fn decode_string8(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&byte| byte != 0)
        .map(|&byte| match byte {
            0x80..=0x9f => CP1252_C1[(byte - 0x80) as usize],
            _ => byte as char,
        })
        .collect()
}

pub fn encode_string8(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|ch| match ch {
            '\0'..='\u{7f}' | '\u{a0}'..='\u{ff}' => ch as u8,
            _ => CP1252_C1
                .iter()
                .position(|&c1| c1 == ch)
                .map_or(b'?', |pos| 0x80 + pos as u8),
        })
        .collect()
}

pub fn decode_utf16_le(bytes: &[u8]) -> Option<String> {
    if bytes.len() & 1 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16(&units).ok()
}

pub fn encode_utf16_le(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(value.len() * 2);
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string8_round_trip() {
        let decoded = decode_string8(b"caf\xe9 \x93ok\x94\0trailer");
        assert_eq!(decoded, "café \u{201c}ok\u{201d}");
        assert_eq!(encode_string8(&decoded), b"caf\xe9 \x93ok\x94");
        assert_eq!(encode_string8("snowman \u{2603}"), b"snowman ?");
    }

    #[test]
    fn utf16_round_trip() {
        let encoded = encode_utf16_le("Tâches 📅");
        assert_eq!(decode_utf16_le(&encoded).unwrap(), "Tâches 📅");
        assert_eq!(decode_utf16_le(&[0x41]), None);
        assert_eq!(decode_utf16_le(&[0x41, 0x00, 0x00, 0x00, 0x42, 0x00]).unwrap(), "A");
    }
}
