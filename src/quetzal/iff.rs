//! IFF (Interchange File Format) container handling for Quetzal saves.
//!
//! Pure byte (de)serialization only - the `Storage` port hands snapshots
//! around as `Vec<u8>`, never as file paths, so there's no `std::fs` here.

/// An IFF file: a FORM container holding a sequence of typed chunks.
pub struct IffFile {
    /// Form type - "IFZS" for Quetzal.
    pub form_type: [u8; 4],
    pub chunks: Vec<IffChunk>,
}

pub struct IffChunk {
    pub chunk_type: [u8; 4],
    pub data: Vec<u8>,
}

impl Default for IffFile {
    fn default() -> Self {
        Self::new()
    }
}

impl IffFile {
    pub fn new() -> Self {
        IffFile {
            form_type: *b"IFZS",
            chunks: Vec::new(),
        }
    }

    pub fn add_chunk(&mut self, chunk_type: [u8; 4], data: Vec<u8>) {
        self.chunks.push(IffChunk { chunk_type, data });
    }

    pub fn find_chunk(&self, chunk_type: &[u8; 4]) -> Option<&IffChunk> {
        self.chunks.iter().find(|c| &c.chunk_type == chunk_type)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let total_size = 4 + self
            .chunks
            .iter()
            .map(|c| 8 + c.data.len() + (c.data.len() % 2))
            .sum::<usize>();

        let mut out = Vec::with_capacity(8 + total_size);
        out.extend_from_slice(b"FORM");
        out.extend_from_slice(&(total_size as u32).to_be_bytes());
        out.extend_from_slice(&self.form_type);

        for chunk in &self.chunks {
            out.extend_from_slice(&chunk.chunk_type);
            out.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
            out.extend_from_slice(&chunk.data);
            if chunk.data.len() % 2 == 1 {
                out.push(0);
            }
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < 12 || &bytes[0..4] != b"FORM" {
            return Err("not an IFF FORM container".to_string());
        }
        let mut form_type = [0u8; 4];
        form_type.copy_from_slice(&bytes[8..12]);

        let mut iff = IffFile {
            form_type,
            chunks: Vec::new(),
        };

        let mut offset = 12;
        while offset + 8 <= bytes.len() {
            let mut chunk_type = [0u8; 4];
            chunk_type.copy_from_slice(&bytes[offset..offset + 4]);
            let size =
                u32::from_be_bytes(bytes[offset + 4..offset + 8].try_into().unwrap()) as usize;
            offset += 8;
            if offset + size > bytes.len() {
                return Err("chunk data runs past end of buffer".to_string());
            }
            let data = bytes[offset..offset + size].to_vec();
            offset += size;
            if size % 2 == 1 {
                offset += 1;
            }
            iff.chunks.push(IffChunk { chunk_type, data });
        }

        Ok(iff)
    }
}
