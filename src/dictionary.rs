//! Dictionary lookup and the input tokenizer.

use crate::memory::Memory;
use crate::text;

/// Z-chars encoded per dictionary entry: 6 in V1-3 (2 words), 9 in V4+
/// (3 words).
fn entry_zchars(version: u8) -> usize {
    if version <= 3 {
        6
    } else {
        9
    }
}

/// Read the header-declared separator characters (the bytes after the
/// count byte at the start of the dictionary table).
pub fn separators(memory: &Memory, dict_addr: u32) -> Result<Vec<u8>, String> {
    let count = memory.get_byte(dict_addr).map_err(|e| e.to_string())?;
    let mut seps = Vec::with_capacity(count as usize);
    for i in 0..count as u32 {
        seps.push(memory.get_byte(dict_addr + 1 + i).map_err(|e| e.to_string())?);
    }
    Ok(seps)
}

struct DictLayout {
    entry_start: u32,
    entry_length: u8,
    entry_count: i16,
}

fn layout(memory: &Memory, dict_addr: u32) -> Result<DictLayout, String> {
    let sep_count = memory.get_byte(dict_addr).map_err(|e| e.to_string())? as u32;
    let entry_length = memory
        .get_byte(dict_addr + 1 + sep_count)
        .map_err(|e| e.to_string())?;
    let entry_count = memory
        .get_word(dict_addr + 2 + sep_count)
        .map_err(|e| e.to_string())? as i16;
    Ok(DictLayout {
        entry_start: dict_addr + 4 + sep_count,
        entry_length,
        entry_count,
    })
}

/// Binary-search the dictionary for `word`, returning its entry address or
/// 0 if not found. Entries are sorted lexicographically by their encoded
/// Z-chars; a negative `entry_count` (used by some V6 dictionaries for
/// unsorted tables) falls back to linear search.
pub fn lookup(memory: &Memory, dict_addr: u32, version: u8, word: &str) -> Result<u16, String> {
    let layout = layout(memory, dict_addr)?;
    let zchars = entry_zchars(version);
    let words_per_entry = zchars / 3;
    let target = text::encode(word, zchars);

    let read_entry_words = |entry_addr: u32| -> Result<Vec<u16>, String> {
        let mut words = Vec::with_capacity(words_per_entry);
        for i in 0..words_per_entry as u32 {
            words.push(
                memory
                    .get_word(entry_addr + i * 2)
                    .map_err(|e| e.to_string())?,
            );
        }
        Ok(words)
    };

    if layout.entry_count < 0 {
        let count = (-layout.entry_count) as u32;
        for i in 0..count {
            let addr = layout.entry_start + i * layout.entry_length as u32;
            if read_entry_words(addr)? == target {
                return Ok(addr as u16);
            }
        }
        return Ok(0);
    }

    let count = layout.entry_count as u32;
    let (mut lo, mut hi) = (0i64, count as i64 - 1);
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let addr = layout.entry_start + mid as u32 * layout.entry_length as u32;
        let entry = read_entry_words(addr)?;
        match entry.cmp(&target) {
            std::cmp::Ordering::Equal => return Ok(addr as u16),
            std::cmp::Ordering::Less => lo = mid + 1,
            std::cmp::Ordering::Greater => hi = mid - 1,
        }
    }
    Ok(0)
}

fn is_separator(ch: u8, seps: &[u8]) -> bool {
    ch == b' ' || seps.contains(&ch)
}

/// Split `text` into `(word, start_offset)` tokens on whitespace and the
/// dictionary's separator characters; separators are themselves emitted
/// as one-character tokens (matching the Z-machine tokenizer, which
/// reports e.g. a comma as its own word so games can grammar-match on it).
fn split_tokens(text: &str, seps: &[u8]) -> Vec<(String, usize)> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut word_start: Option<usize> = None;
    while i < bytes.len() {
        let ch = bytes[i];
        if is_separator(ch, seps) {
            if let Some(start) = word_start.take() {
                tokens.push((text[start..i].to_string(), start));
            }
            if ch != b' ' {
                tokens.push(((ch as char).to_string(), i));
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
        i += 1;
    }
    if let Some(start) = word_start {
        tokens.push((text[start..].to_string(), start));
    }
    tokens
}

/// Tokenize the text at `text_buf` into the parse buffer at `parse_buf`,
/// per §4.4/§6.5. `text_offset`/`text_len` describe where the already-read
/// input text lives within `text_buf` (version-dependent layout).
pub fn tokenize(
    memory: &mut Memory,
    text_buf: u32,
    parse_buf: u32,
    dict_addr: u32,
    skip_unknown_flag: bool,
) -> Result<(), String> {
    let version = memory.header.version;
    let (text_offset, len_offset) = if version <= 4 { (1u32, None) } else { (2u32, Some(1u32)) };

    let text_len = match len_offset {
        Some(off) => memory.get_byte(text_buf + off).map_err(|e| e.to_string())? as usize,
        None => {
            // V1-4: null-terminated.
            let mut len = 0usize;
            loop {
                let b = memory
                    .get_byte(text_buf + text_offset + len as u32)
                    .map_err(|e| e.to_string())?;
                if b == 0 {
                    break;
                }
                len += 1;
            }
            len
        }
    };

    let mut chars = Vec::with_capacity(text_len);
    for i in 0..text_len as u32 {
        chars.push(
            memory
                .get_byte(text_buf + text_offset + i)
                .map_err(|e| e.to_string())?,
        );
    }
    let text = String::from_utf8_lossy(&chars).to_string();

    let seps = separators(memory, dict_addr)?;
    let tokens = split_tokens(&text, &seps);

    let max_tokens = memory.get_byte(parse_buf).map_err(|e| e.to_string())? as usize;
    let write_count = tokens.len().min(max_tokens);
    memory
        .set_byte(parse_buf + 1, write_count as u8)
        .map_err(|e| e.to_string())?;

    for (i, (word, offset)) in tokens.iter().take(write_count).enumerate() {
        let entry_addr = parse_buf + 2 + i as u32 * 4;
        let dict_entry = lookup(memory, dict_addr, version, word)?;
        if dict_entry == 0 && skip_unknown_flag {
            // Leave this entry's word_addr untouched; only the length and
            // position are refreshed.
            memory
                .set_byte(entry_addr + 2, word.len() as u8)
                .map_err(|e| e.to_string())?;
            memory
                .set_byte(entry_addr + 3, (*offset as u32 + text_offset) as u8)
                .map_err(|e| e.to_string())?;
            continue;
        }
        memory
            .set_word(entry_addr, dict_entry)
            .map_err(|e| e.to_string())?;
        memory
            .set_byte(entry_addr + 2, word.len() as u8)
            .map_err(|e| e.to_string())?;
        memory
            .set_byte(entry_addr + 3, (*offset as u32 + text_offset) as u8)
            .map_err(|e| e.to_string())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v3_memory_with_dict(words: &[&str]) -> (Memory, u32) {
        let mut bytes = vec![0u8; 1024];
        bytes[0] = 3;
        bytes[0x0E] = 0x04;
        bytes[0x0F] = 0x00;
        let dict_addr = 0x100u32;
        bytes[dict_addr as usize] = 0; // no separators
        bytes[dict_addr as usize + 1] = 4; // entry length (2 words + 2 data bytes)
        let mut sorted: Vec<&str> = words.to_vec();
        sorted.sort();
        bytes[dict_addr as usize + 2] = 0;
        bytes[dict_addr as usize + 3] = sorted.len() as u8;
        let entry_start = dict_addr + 4;
        for (i, w) in sorted.iter().enumerate() {
            let enc = text::encode(w, 6);
            let base = entry_start + i as u32 * 4;
            bytes[base as usize] = (enc[0] >> 8) as u8;
            bytes[base as usize + 1] = (enc[0] & 0xFF) as u8;
            bytes[base as usize + 2] = (enc[1] >> 8) as u8;
            bytes[base as usize + 3] = (enc[1] & 0xFF) as u8;
        }
        (Memory::load(bytes).unwrap(), dict_addr)
    }

    #[test]
    fn lookup_finds_known_word() {
        let (mem, dict_addr) = v3_memory_with_dict(&["look", "take", "go"]);
        let addr = lookup(&mem, dict_addr, 3, "take").unwrap();
        assert_ne!(addr, 0);
    }

    #[test]
    fn lookup_returns_zero_for_unknown_word() {
        let (mem, dict_addr) = v3_memory_with_dict(&["look", "take", "go"]);
        let addr = lookup(&mem, dict_addr, 3, "xyzzy").unwrap();
        assert_eq!(addr, 0);
    }

    #[test]
    fn tokenize_splits_on_whitespace_and_writes_parse_buffer() {
        let (mut mem, dict_addr) = v3_memory_with_dict(&["look", "take", "go"]);
        let text_buf = 0x200u32;
        let parse_buf = 0x220u32;
        mem.force_set_byte(text_buf, 20);
        let text = b"take go\0";
        for (i, b) in text.iter().enumerate() {
            mem.force_set_byte(text_buf + 1 + i as u32, *b);
        }
        mem.force_set_byte(parse_buf, 4); // max tokens

        tokenize(&mut mem, text_buf, parse_buf, dict_addr, false).unwrap();

        assert_eq!(mem.get_byte(parse_buf + 1).unwrap(), 2);
        let first_addr = mem.get_word(parse_buf + 2).unwrap();
        assert_ne!(first_addr, 0);
        assert_eq!(mem.get_byte(parse_buf + 2 + 2).unwrap(), 4); // "take".len()
        assert_eq!(mem.get_byte(parse_buf + 2 + 3).unwrap(), 1); // 1-based position
    }

    #[test]
    fn skip_unknown_flag_leaves_word_addr_untouched() {
        let (mut mem, dict_addr) = v3_memory_with_dict(&["look"]);
        let text_buf = 0x200u32;
        let parse_buf = 0x220u32;
        mem.force_set_byte(text_buf, 20);
        let text = b"xyzzy\0";
        for (i, b) in text.iter().enumerate() {
            mem.force_set_byte(text_buf + 1 + i as u32, *b);
        }
        mem.force_set_byte(parse_buf, 4);
        mem.force_set_byte(parse_buf + 2, 0xAB); // sentinel word_addr high byte
        mem.force_set_byte(parse_buf + 3, 0xCD);

        tokenize(&mut mem, text_buf, parse_buf, dict_addr, true).unwrap();

        assert_eq!(mem.get_byte(parse_buf + 2).unwrap(), 0xAB);
        assert_eq!(mem.get_byte(parse_buf + 3).unwrap(), 0xCD);
    }
}
