//! Z-string text codec: the 5-bit Z-character stream, three alphabet
//! shifts, abbreviation escapes, and the 10-bit ZSCII escape.

use crate::memory::Memory;

const ALPHABET_A0: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";
const ALPHABET_A1: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHABET_A2: &[u8; 26] = b" \r0123456789.,!?_#'\"/\\-:()";

fn alphabet_char(alphabet: u8, zchar: u8) -> char {
    let table: &[u8; 26] = match alphabet {
        0 => ALPHABET_A0,
        1 => ALPHABET_A1,
        _ => ALPHABET_A2,
    };
    table[(zchar - 6) as usize] as char
}

/// Unpack a 16-bit Z-string word into its three 5-bit Z-characters.
fn split_zchars(word: u16) -> [u8; 3] {
    [
        ((word >> 10) & 0x1F) as u8,
        ((word >> 5) & 0x1F) as u8,
        (word & 0x1F) as u8,
    ]
}

/// Decode a Z-string starting at `addr`. Returns the decoded text and the
/// byte length consumed (so callers like `print` can advance PC past it).
pub fn decode_string(memory: &Memory, addr: u32) -> Result<(String, u32), String> {
    let words = memory
        .get_zstring_words(addr)
        .map_err(|e| e.to_string())?;
    let len = (words.len() as u32) * 2;
    let text = decode_words(memory, &words, 0)?;
    Ok((text, len))
}

/// Decode a Z-string at a packed address (used by `print_paddr`/object
/// short names/abbreviation lookups).
pub fn decode_string_at_packed(memory: &Memory, packed: u16) -> Result<String, String> {
    let addr = memory.unpack_string(packed);
    decode_string(memory, addr).map(|(s, _)| s)
}

/// Decode a sequence of Z-string words. `depth` bounds abbreviation
/// recursion: an abbreviation body may not itself reference another
/// abbreviation (depth 1).
fn decode_words(memory: &Memory, words: &[u16], depth: u8) -> Result<String, String> {
    let mut zchars = Vec::with_capacity(words.len() * 3);
    for &word in words {
        zchars.extend_from_slice(&split_zchars(word));
    }

    let mut out = String::new();
    // `alphabet` is the locked (V1 shift-lock) alphabet; `shift` is a
    // one-character-only override set by Z-char 4/5, consumed by the very
    // next Z-char regardless of what that character turns out to be.
    let alphabet: u8 = 0;
    let mut shift: Option<u8> = None;
    let mut abbrev_shift: Option<u8> = None;
    let mut pending_zscii: Option<u8> = None; // high half of a 10-bit escape

    let mut i = 0;
    while i < zchars.len() {
        let zc = zchars[i];
        i += 1;

        if let Some(high) = pending_zscii {
            let code = ((high as u16) << 5) | zc as u16;
            if (32..=126).contains(&code) {
                out.push(code as u8 as char);
            } else {
                out.push('?');
            }
            pending_zscii = None;
            continue;
        }

        if let Some(shift_code) = abbrev_shift {
            abbrev_shift = None;
            if depth >= 1 {
                return Err("abbreviation recursion bound (depth 1) exceeded".to_string());
            }
            let abbrev_num = (shift_code - 1) as u32 * 32 + zc as u32;
            let table_addr = memory.header.abbrev_table as u32 + abbrev_num * 2;
            let word_addr = memory.get_word(table_addr).map_err(|e| e.to_string())?;
            let byte_addr = word_addr as u32 * 2;
            let words = memory
                .get_zstring_words(byte_addr)
                .map_err(|e| e.to_string())?;
            out.push_str(&decode_words(memory, &words, depth + 1)?);
            continue;
        }

        let effective_alphabet = shift.take().unwrap_or(alphabet);

        match zc {
            0 => out.push(' '),
            1 | 2 | 3 => abbrev_shift = Some(zc),
            4 => shift = Some(1),
            5 => shift = Some(2),
            6 if effective_alphabet == 2 => {
                if i < zchars.len() {
                    let high = zchars[i];
                    i += 1;
                    pending_zscii = Some(high);
                }
            }
            7 if effective_alphabet == 2 => out.push('\n'),
            _ => out.push(alphabet_char(effective_alphabet, zc)),
        }
    }
    Ok(out)
}

/// Encode `text` (lowercased) into `num_zchars` Z-characters packed 3 per
/// word, padded with Z-char 5, the inverse of `decode` for plain A0/A2
/// text with no abbreviations. Used by the dictionary and by the
/// `encode_text` opcode.
pub fn encode(text: &str, num_zchars: usize) -> Vec<u16> {
    let lower = text.to_lowercase();
    let mut zchars: Vec<u8> = Vec::with_capacity(num_zchars);
    for ch in lower.chars() {
        if zchars.len() >= num_zchars {
            break;
        }
        if let Some(pos) = ALPHABET_A0.iter().position(|&c| c as char == ch) {
            zchars.push(pos as u8 + 6);
        } else if ch == ' ' {
            zchars.push(0);
        } else if let Some(pos) = ALPHABET_A2.iter().position(|&c| c as char == ch) {
            zchars.push(5);
            if zchars.len() < num_zchars {
                zchars.push(pos as u8 + 6);
            }
        } else {
            zchars.push(5); // unknown char -> pad
        }
    }
    while zchars.len() < num_zchars {
        zchars.push(5);
    }
    zchars.truncate(num_zchars);

    let mut words = Vec::with_capacity(num_zchars.div_ceil(3));
    for chunk in zchars.chunks(3) {
        let a = chunk[0] as u16;
        let b = *chunk.get(1).unwrap_or(&5) as u16;
        let c = *chunk.get(2).unwrap_or(&5) as u16;
        words.push((a << 10) | (b << 5) | c);
    }
    if let Some(last) = words.last_mut() {
        *last |= 0x8000;
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(words: &[u16], abbrev_table: u16) -> Memory {
        let mut bytes = vec![0u8; 256];
        bytes[0] = 3;
        bytes[0x0E] = 0x00;
        bytes[0x0F] = 0x40;
        bytes[0x18] = (abbrev_table >> 8) as u8;
        bytes[0x19] = (abbrev_table & 0xFF) as u8;
        let start = 0x40;
        for (i, w) in words.iter().enumerate() {
            bytes[start + i * 2] = (w >> 8) as u8;
            bytes[start + i * 2 + 1] = (w & 0xFF) as u8;
        }
        Memory::load(bytes).unwrap()
    }

    #[test]
    fn decodes_hello() {
        // "hello" packed as two Z-string words: zchars [13,10,17,17,20,5].
        let mem = memory_with(&[0x3551, 0xC685], 0x300);
        let (text, len) = decode_string(&mem, 0x40).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(len, 4);
    }

    #[test]
    fn encode_then_decode_round_trips_plain_text() {
        let encoded = encode("hello", 6);
        assert_eq!(encoded.len(), 2);
        let mut bytes = vec![0u8; 256];
        bytes[0] = 3;
        bytes[0x0F] = 0x40;
        for (i, w) in encoded.iter().enumerate() {
            bytes[0x40 + i * 2] = (w >> 8) as u8;
            bytes[0x40 + i * 2 + 1] = (w & 0xFF) as u8;
        }
        let mem = Memory::load(bytes).unwrap();
        let (text, _) = decode_string(&mem, 0x40).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn newline_in_a2_decodes_correctly() {
        // Z-chars: shift-to-A2(5), newline(7), trailing shift-to-A2 pad.
        let word = (5u16 << 10) | (7u16 << 5) | 5;
        let mem = memory_with(&[word | 0x8000], 0x300);
        let (text, _) = decode_string(&mem, 0x40).unwrap();
        assert_eq!(text, "\n");
    }
}
