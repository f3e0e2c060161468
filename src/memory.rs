//! Big-endian byte/word addressed memory, dynamic/static/high partitions,
//! and packed-address unpacking.
//!
//! Grounded on the original engine's inline `VM::read_byte`/`write_byte`
//! helpers, generalized into its own owner type per the redesign (memory
//! is the GameState's exclusive responsibility; nothing else mutates it).

use crate::error::{LoadError, MemoryError};
use crate::header::Header;

pub struct Memory {
    bytes: Vec<u8>,
    pub header: Header,
}

impl Memory {
    /// Load a story image, transparently unwrapping an outer Blorb (IFF
    /// FORM/IFRS) container if present.
    pub fn load(raw: Vec<u8>) -> Result<Memory, LoadError> {
        let bytes = match extract_blorb_exec(&raw)? {
            Some(story) => story,
            None => raw,
        };
        let header = Header::new(&bytes)?;
        Ok(Memory { bytes, header })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get_byte(&self, addr: u32) -> Result<u8, MemoryError> {
        self.bytes.get(addr as usize).copied().ok_or(MemoryError {
            message: "read past end of memory".to_string(),
            addr,
        })
    }

    pub fn get_word(&self, addr: u32) -> Result<u16, MemoryError> {
        let hi = self.get_byte(addr)?;
        let lo = self.get_byte(addr + 1)?;
        Ok(((hi as u16) << 8) | lo as u16)
    }

    pub fn set_byte(&mut self, addr: u32, value: u8) -> Result<(), MemoryError> {
        if addr as usize >= self.header.base_static_mem as usize {
            return Err(MemoryError {
                message: "write to read-only (static/high) memory".to_string(),
                addr,
            });
        }
        let slot = self.bytes.get_mut(addr as usize).ok_or(MemoryError {
            message: "write past end of memory".to_string(),
            addr,
        })?;
        *slot = value;
        Ok(())
    }

    pub fn set_word(&mut self, addr: u32, value: u16) -> Result<(), MemoryError> {
        self.set_byte(addr, (value >> 8) as u8)?;
        self.set_byte(addr + 1, (value & 0xFF) as u8)
    }

    /// Force a write even into static/high memory. Used only by save/restore
    /// to reinstall a snapshot, and by `restart` to reload dynamic memory
    /// from the original image.
    pub fn force_set_byte(&mut self, addr: u32, value: u8) {
        if let Some(slot) = self.bytes.get_mut(addr as usize) {
            *slot = value;
        }
    }

    /// Read a Z-string's raw 16-bit words starting at `addr`, stopping
    /// after (and including) the first word with its top bit set.
    pub fn get_zstring_words(&self, addr: u32) -> Result<Vec<u16>, MemoryError> {
        let mut words = Vec::new();
        let mut cur = addr;
        loop {
            let word = self.get_word(cur)?;
            words.push(word);
            if word & 0x8000 != 0 {
                return Ok(words);
            }
            cur += 2;
            if (cur - addr) > 2 * 4096 {
                return Err(MemoryError {
                    message: "z-string has no terminator within a sane bound".to_string(),
                    addr,
                });
            }
        }
    }

    pub fn unpack_routine(&self, packed: u16) -> u32 {
        match self.header.version {
            1..=3 => packed as u32 * 2,
            4 | 5 => packed as u32 * 4,
            6 | 7 => packed as u32 * 4 + 8 * self.header.routine_offset as u32,
            _ => packed as u32 * 8,
        }
    }

    pub fn unpack_string(&self, packed: u16) -> u32 {
        match self.header.version {
            1..=3 => packed as u32 * 2,
            4 | 5 => packed as u32 * 4,
            6 | 7 => packed as u32 * 4 + 8 * self.header.string_offset as u32,
            _ => packed as u32 * 8,
        }
    }

    /// `copy_table` semantics: copy `len` bytes from `src` to `dst`,
    /// direction-safe (so overlapping forward copies behave like memmove),
    /// or zero-fill `dst` for `-len` bytes when `len` is negative.
    pub fn copy_block(&mut self, src: u32, dst: u32, len: i16) -> Result<(), MemoryError> {
        if len == 0 {
            return Ok(());
        }
        if len < 0 {
            let count = (-len) as u32;
            for i in 0..count {
                self.set_byte(dst + i, 0)?;
            }
            return Ok(());
        }
        let count = len as u32;
        if dst > src {
            // Copy backward so overlapping forward overlap doesn't clobber
            // source bytes before they're read.
            for i in (0..count).rev() {
                let b = self.get_byte(src + i)?;
                self.set_byte(dst + i, b)?;
            }
        } else {
            for i in 0..count {
                let b = self.get_byte(src + i)?;
                self.set_byte(dst + i, b)?;
            }
        }
        Ok(())
    }

    /// Sum of bytes from 0x40 to file-length, modulo 2^16.
    pub fn checksum(&self) -> u16 {
        let end = self.header.len_file.min(self.bytes.len());
        let mut sum: u32 = 0;
        if end > 0x40 {
            for b in &self.bytes[0x40..end] {
                sum = sum.wrapping_add(*b as u32);
            }
        }
        (sum & 0xFFFF) as u16
    }
}

/// Scan an IFF FORM/IFRS Blorb container for the `RIdx` resource index and
/// return the bytes of the `Exec` resource (usage `Exec`, number 0), or
/// `None` if `raw` is not a Blorb container at all.
fn extract_blorb_exec(raw: &[u8]) -> Result<Option<Vec<u8>>, LoadError> {
    if raw.len() < 12 || &raw[0..4] != b"FORM" || &raw[8..12] != b"IFRS" {
        return Ok(None);
    }

    let mut offset = 12usize;
    let mut ridx: Option<Vec<(u32, u32, u32)>> = None; // (usage, number, start)
    while offset + 8 <= raw.len() {
        let chunk_type = &raw[offset..offset + 4];
        let chunk_len = u32::from_be_bytes(raw[offset + 4..offset + 8].try_into().unwrap()) as usize;
        let data_start = offset + 8;
        let data_end = data_start + chunk_len;
        if data_end > raw.len() {
            break;
        }
        if chunk_type == b"RIdx" {
            let data = &raw[data_start..data_end];
            let count = u32::from_be_bytes(data[0..4].try_into().unwrap()) as usize;
            let mut entries = Vec::with_capacity(count);
            for i in 0..count {
                let base = 4 + i * 12;
                if base + 12 > data.len() {
                    break;
                }
                let usage = u32::from_be_bytes(data[base..base + 4].try_into().unwrap());
                let number = u32::from_be_bytes(data[base + 4..base + 8].try_into().unwrap());
                let start = u32::from_be_bytes(data[base + 8..base + 12].try_into().unwrap());
                entries.push((usage, number, start));
            }
            ridx = Some(entries);
        }
        offset = data_end + (chunk_len % 2);
    }

    let entries = match ridx {
        Some(e) => e,
        None => return Err(LoadError::new("Blorb container has no RIdx chunk")),
    };

    let exec_usage = u32::from_be_bytes(*b"Exec");
    let (_, _, start) = entries
        .iter()
        .find(|(usage, number, _)| *usage == exec_usage && *number == 0)
        .ok_or_else(|| LoadError::new("Blorb container has no Exec resource"))?;

    let chunk_start = *start as usize;
    if chunk_start + 8 > raw.len() {
        return Err(LoadError::new("Blorb Exec resource offset out of range"));
    }
    let chunk_len =
        u32::from_be_bytes(raw[chunk_start + 4..chunk_start + 8].try_into().unwrap()) as usize;
    let data_start = chunk_start + 8;
    let data_end = data_start + chunk_len;
    if data_end > raw.len() {
        return Err(LoadError::new("Blorb Exec resource length out of range"));
    }
    Ok(Some(raw[data_start..data_end].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_image() -> Vec<u8> {
        let mut bytes = vec![0u8; 128];
        bytes[0] = 3;
        bytes[0x0E] = 0x00;
        bytes[0x0F] = 0x40; // static base = 0x40
        bytes
    }

    #[test]
    fn rejects_write_into_static_memory() {
        let mut mem = Memory::load(minimal_image()).unwrap();
        assert!(mem.set_byte(0x40, 1).is_err());
        assert!(mem.set_byte(0x3F, 1).is_ok());
    }

    #[test]
    fn get_byte_never_fails_within_bounds() {
        let mem = Memory::load(minimal_image()).unwrap();
        for addr in 0..mem.len() as u32 {
            assert!(mem.get_byte(addr).is_ok());
        }
        assert!(mem.get_byte(mem.len() as u32).is_err());
    }

    #[test]
    fn word_read_is_big_endian() {
        let mut mem = Memory::load(minimal_image()).unwrap();
        mem.force_set_byte(0x20, 0x12);
        mem.force_set_byte(0x21, 0x34);
        assert_eq!(mem.get_word(0x20).unwrap(), 0x1234);
    }

    #[test]
    fn unpack_routine_uses_version_factor() {
        let mem = Memory::load(minimal_image()).unwrap();
        assert_eq!(mem.unpack_routine(0x10), 0x20); // v3: *2
    }

    #[test]
    fn copy_block_zero_fills_on_negative_length() {
        let mut mem = Memory::load(minimal_image()).unwrap();
        mem.force_set_byte(0x10, 0xFF);
        mem.copy_block(0, 0x10, -1).unwrap();
        assert_eq!(mem.get_byte(0x10).unwrap(), 0);
    }

    #[test]
    fn non_blorb_image_passes_through_unchanged() {
        let image = minimal_image();
        let mem = Memory::load(image.clone()).unwrap();
        assert_eq!(mem.as_slice(), &image[..]);
    }
}
