//! Precompiled shader container (`.pcsh`)
//!
//! Holds one payload per (backend, stage) pair so a game ships shaders for
//! every backend and picks the right one at runtime.
//!
//! Layout, little endian:
//!
//! ```text
//! u32 magic = 0x48534350 ("PCSH")
//! u32 version = 1
//! u32 count
//! count x {
//!     u8  key = backend << 4 | stage
//!     7-bit varint length, UTF-8 entry point
//!     u32 length, payload bytes
//! }
//! ```
//!
//! Keys with unknown backend or stage values are kept as-is and written
//! back unchanged.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::graphics_device::{ShaderAttachment, ShaderStage};

pub const PCSH_MAGIC: u32 = 0x4853_4350;
pub const PCSH_VERSION: u32 = 1;

/// Largest entry point length accepted when loading
const MAX_ENTRY_POINT_LEN: usize = 1024;

/// One (backend, stage) entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderRecord {
    key: u8,
    pub entry_point: String,
    pub payload: Vec<u8>,
}

impl ShaderRecord {
    pub fn key(&self) -> u8 {
        self.key
    }

    pub fn backend_nibble(&self) -> u8 {
        self.key >> 4
    }

    pub fn stage_nibble(&self) -> u8 {
        self.key & 0x0F
    }

    /// `None` for reserved backend values
    pub fn backend(&self) -> Option<Backend> {
        Backend::from_nibble(self.backend_nibble())
    }

    pub fn stage(&self) -> Option<ShaderStage> {
        ShaderStage::from_nibble(self.stage_nibble())
    }
}

/// In-memory precompiled shader container, records in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecompiledShader {
    records: Vec<ShaderRecord>,
}

fn make_key(backend: u8, stage: u8) -> Result<u8> {
    if backend > 0x0F || stage > 0x0F {
        return Err(Error::InvalidResource(format!(
            "Backend {} / stage {} do not fit in a record key",
            backend, stage
        )));
    }
    Ok(backend << 4 | stage)
}

impl PrecompiledShader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a payload; a second payload for the same pair is rejected
    pub fn add(
        &mut self,
        backend: Backend,
        stage: ShaderStage,
        entry_point: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Result<()> {
        self.add_raw(backend.nibble(), stage.nibble(), entry_point, payload)
    }

    /// Add a payload under raw nibble values (reserved backends included)
    pub fn add_raw(
        &mut self,
        backend: u8,
        stage: u8,
        entry_point: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let key = make_key(backend, stage)?;
        if self.records.iter().any(|r| r.key == key) {
            return Err(Error::InvalidResource(format!(
                "Container already holds a payload for backend {} stage {}",
                backend, stage
            )));
        }
        self.records.push(ShaderRecord {
            key,
            entry_point: entry_point.into(),
            payload: payload.into(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ShaderRecord> {
        self.records.iter()
    }

    pub fn contains(&self, backend: Backend, stage: ShaderStage) -> bool {
        let key = backend.nibble() << 4 | stage.nibble();
        self.records.iter().any(|r| r.key == key)
    }

    /// Entry point and payload for a pair
    pub fn get_source(&self, backend: Backend, stage: ShaderStage) -> Result<(&str, &[u8])> {
        let key = backend.nibble() << 4 | stage.nibble();
        self.records
            .iter()
            .find(|r| r.key == key)
            .map(|r| (r.entry_point.as_str(), r.payload.as_slice()))
            .ok_or(Error::ShaderNotPresent {
                backend: backend.nibble(),
                stage: stage.nibble(),
            })
    }

    /// Attachments ready for `GraphicsDevice::create_shader`
    ///
    /// The vertex stage must be present; the pixel stage is optional.
    pub fn attachments(&self, backend: Backend) -> Result<Vec<ShaderAttachment>> {
        let mut attachments = Vec::with_capacity(2);
        for &stage in ShaderStage::all() {
            match self.get_source(backend, stage) {
                Ok((entry_point, payload)) => {
                    attachments.push(ShaderAttachment::new(stage, payload, entry_point));
                }
                Err(e) if stage == ShaderStage::Vertex => return Err(e),
                Err(_) => {}
            }
        }
        Ok(attachments)
    }

    // ===== SERIALIZATION =====

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let count = u32::try_from(self.records.len())
            .map_err(|_| Error::InvalidResource("Too many records for one container".to_string()))?;

        writer.write_all(&PCSH_MAGIC.to_le_bytes())?;
        writer.write_all(&PCSH_VERSION.to_le_bytes())?;
        writer.write_all(&count.to_le_bytes())?;

        for record in &self.records {
            let payload_len = u32::try_from(record.payload.len()).map_err(|_| {
                Error::InvalidResource("Shader payload larger than 4 GiB".to_string())
            })?;

            writer.write_all(&[record.key])?;
            write_varint(&mut writer, record.entry_point.len() as u32)?;
            writer.write_all(record.entry_point.as_bytes())?;
            writer.write_all(&payload_len.to_le_bytes())?;
            writer.write_all(&record.payload)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::read_from(BufReader::new(file))
    }

    /// Parse a container; fails fast on the first malformed field
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor { bytes, pos: 0 };

        let magic = cursor.read_u32("magic")?;
        if magic != PCSH_MAGIC {
            return Err(Error::InvalidContainer(format!(
                "Bad magic {:#010x}, not a PCSH file",
                magic
            )));
        }

        // Later versions keep the record layout; version 0 was never written
        let version = cursor.read_u32("version")?;
        if version == 0 {
            return Err(Error::InvalidContainer("Container version 0 is invalid".to_string()));
        }
        if version > PCSH_VERSION {
            crate::sprout_warn!(
                "sprout::precompiled_shader",
                "Container version {} is newer than {}, reading it as version {}",
                version,
                PCSH_VERSION,
                PCSH_VERSION
            );
        }

        let count = cursor.read_u32("record count")?;
        let mut container = PrecompiledShader::new();

        for index in 0..count {
            let key = cursor.read_u8("record key")?;

            let name_len = cursor.read_varint()? as usize;
            if name_len > MAX_ENTRY_POINT_LEN {
                return Err(Error::InvalidContainer(format!(
                    "Record {} entry point length {} is implausible",
                    index, name_len
                )));
            }
            let name_bytes = cursor.read_bytes(name_len, "entry point")?;
            let entry_point = std::str::from_utf8(name_bytes)
                .map_err(|e| {
                    Error::InvalidContainer(format!("Record {} entry point is not UTF-8: {}", index, e))
                })?
                .to_string();

            let payload_len = cursor.read_u32("payload length")? as usize;
            let payload = cursor.read_bytes(payload_len, "payload")?.to_vec();

            if container.records.iter().any(|r| r.key == key) {
                return Err(Error::InvalidContainer(format!(
                    "Record {} repeats key {:#04x}",
                    index, key
                )));
            }
            container.records.push(ShaderRecord { key, entry_point, payload });
        }

        Ok(container)
    }
}

// ===== BINARY HELPERS =====

/// 7-bit variable-length integer, low groups first, high bit = continuation
fn write_varint<W: Write>(writer: &mut W, mut value: u32) -> Result<()> {
    while value >= 0x80 {
        writer.write_all(&[(value as u8) | 0x80])?;
        value >>= 7;
    }
    writer.write_all(&[value as u8])?;
    Ok(())
}

struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(Error::InvalidContainer(format!(
                "Truncated {} at offset {} (need {} bytes, {} left)",
                what,
                self.pos,
                len,
                self.bytes.len() - self.pos
            ))),
        }
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.read_bytes(1, what)?[0])
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        let b = self.read_bytes(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_varint(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        for group in 0..5 {
            let byte = self.read_u8("entry point length")?;
            value |= ((byte & 0x7F) as u32) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::InvalidContainer(
            "Entry point length prefix is longer than 5 bytes".to_string(),
        ))
    }
}

#[cfg(test)]
#[path = "precompiled_shader_tests.rs"]
mod tests;
