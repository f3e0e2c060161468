//! Story file header (the first 64 bytes of every Z-machine image).

use crate::error::LoadError;
use std::fmt;

fn word_at(bytes: &[u8], offset: usize) -> u16 {
    ((bytes[offset] as u16) << 8) | bytes[offset + 1] as u16
}

#[derive(Debug, Clone)]
pub struct Header {
    pub version: u8,
    pub flags1: u8,
    pub release: u16,
    pub base_high_mem: u16,
    pub initial_pc: u16,
    pub dictionary: u16,
    pub object_table_addr: u16,
    pub global_variables: u16,
    pub base_static_mem: u16,
    pub flags2: u16,
    pub serial: String,
    pub abbrev_table: u16,
    pub len_file: usize,
    pub checksum_file: u16,
    pub interpreter_number_and_version: u16,
    pub standard_revision_number: u16,
    /// V6/7 only (0x28): routine-address offset for packed routine unpacking.
    pub routine_offset: u16,
    /// V6/7 only (0x2A): string-address offset for packed string unpacking.
    pub string_offset: u16,
    /// V5+ only (0x2E): address of the terminating-characters table.
    pub terminating_chars_table: u16,
    /// V5+ only (0x34): address of a custom alphabet table, or 0 for the default.
    pub alphabet_table: u16,
    /// V5+ only (0x36): address of the header extension table.
    pub header_extension_table: u16,
}

impl Header {
    pub fn new(bytes: &[u8]) -> Result<Header, LoadError> {
        if bytes.len() < 64 {
            return Err(LoadError::new(format!(
                "story image too small: {} bytes, need at least 64",
                bytes.len()
            )));
        }
        let version = bytes[0];
        if !(1..=8).contains(&version) {
            return Err(LoadError::new(format!(
                "unsupported Z-machine version {version}"
            )));
        }
        let base_static_mem = word_at(bytes, 0x0E);
        if (base_static_mem as usize) < 64 {
            return Err(LoadError::new(format!(
                "static memory base {base_static_mem:#06x} is inside the header"
            )));
        }

        let len_word = word_at(bytes, 0x1A) as usize;
        let len_file = match version {
            1..=3 => len_word * 2,
            4 | 5 => len_word * 4,
            _ => len_word * 8,
        };

        let mut serial = String::with_capacity(6);
        for b in &bytes[0x12..0x18] {
            serial.push(*b as char);
        }

        Ok(Header {
            version,
            flags1: bytes[0x01],
            release: word_at(bytes, 0x02),
            base_high_mem: word_at(bytes, 0x04),
            initial_pc: word_at(bytes, 0x06),
            dictionary: word_at(bytes, 0x08),
            object_table_addr: word_at(bytes, 0x0A),
            global_variables: word_at(bytes, 0x0C),
            base_static_mem,
            flags2: word_at(bytes, 0x10),
            serial,
            abbrev_table: word_at(bytes, 0x18),
            len_file,
            checksum_file: word_at(bytes, 0x1C),
            interpreter_number_and_version: word_at(bytes, 0x1E),
            standard_revision_number: word_at(bytes, 0x32),
            routine_offset: word_at(bytes, 0x28),
            string_offset: word_at(bytes, 0x2A),
            terminating_chars_table: word_at(bytes, 0x2E),
            alphabet_table: word_at(bytes, 0x34),
            header_extension_table: word_at(bytes, 0x36),
        })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Z-code version:           {}\n\
             Release number:           {}\n\
             Serial number:            {}\n\
             Size of resident memory:  {:#06x}\n\
             Start PC:                 {:#06x}\n\
             Dictionary address:       {:#06x}\n\
             Object table address:     {:#06x}\n\
             Global variables address: {:#06x}\n\
             Size of dynamic memory:   {:#06x}\n\
             Abbreviations address:    {:#06x}\n\
             File size:                {:#06x}\n\
             Checksum:                 {:#06x}\n",
            self.version,
            self.release,
            self.serial,
            self.base_high_mem,
            self.initial_pc,
            self.dictionary,
            self.object_table_addr,
            self.global_variables,
            self.base_static_mem,
            self.abbrev_table,
            self.len_file,
            self.checksum_file,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_v3_header() -> Vec<u8> {
        let mut bytes = vec![0u8; 64];
        bytes[0] = 3; // version
        bytes[0x0E] = 0x10; // static base high byte -> 0x1000
        bytes[0x06] = 0x10; // initial pc
        bytes
    }

    #[test]
    fn rejects_too_small_image() {
        let err = Header::new(&[0u8; 10]).unwrap_err();
        assert!(err.message.contains("too small"));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = minimal_v3_header();
        bytes[0] = 9;
        assert!(Header::new(&bytes).is_err());
    }

    #[test]
    fn rejects_static_base_inside_header() {
        let mut bytes = minimal_v3_header();
        bytes[0x0E] = 0;
        bytes[0x0F] = 32;
        assert!(Header::new(&bytes).is_err());
    }

    #[test]
    fn parses_v3_header_fields() {
        let bytes = minimal_v3_header();
        let header = Header::new(&bytes).unwrap();
        assert_eq!(header.version, 3);
        assert_eq!(header.base_static_mem, 0x1000);
        assert_eq!(header.initial_pc, 0x1000);
    }
}
