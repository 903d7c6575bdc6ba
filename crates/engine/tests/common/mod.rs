#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use save_engine::{
    BackupPolicy, ByteReader, ByteWriter, CodecRegistry, EngineConfig, EntityError, EntityHandle,
    FileHeader, Persistent, SaveContext,
};
use tempfile::TempDir;

pub fn context(dir: &TempDir) -> SaveContext {
    SaveContext::new(EngineConfig::new(dir.path()).with_backup(BackupPolicy::disabled()))
}

pub fn shared<E: Persistent + 'static>(entity: E) -> Rc<RefCell<E>> {
    Rc::new(RefCell::new(entity))
}

pub fn handle<E: Persistent + 'static>(entity: &Rc<RefCell<E>>) -> EntityHandle {
    entity.clone()
}

/// Hand-built save file, for layouts the engine would never write itself.
pub fn raw_save(frames: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    FileHeader::new(frames.len() as i32)
        .write_to(&mut out)
        .expect("write header");
    for (identity, payload) in frames {
        assert!(identity.len() < 0x80);
        out.push(identity.len() as u8);
        out.extend_from_slice(identity.as_bytes());
        out.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        out.extend_from_slice(payload);
    }
    out
}

/// Every restore call an entity received: `Some(payload-derived value)` when
/// data was found, `None` when defaulted.
pub type RestoreLog = Vec<Option<i32>>;

/// Entity holding a single gold counter.
#[derive(Debug)]
pub struct Purse {
    pub id: String,
    pub gold: i32,
    pub restores: RestoreLog,
}

impl Purse {
    pub const DEFAULT_GOLD: i32 = -1;

    pub fn new(id: &str, gold: i32) -> Self {
        Self {
            id: id.to_string(),
            gold,
            restores: Vec::new(),
        }
    }
}

impl Persistent for Purse {
    fn identity(&self) -> &str {
        &self.id
    }

    fn serialize(&self, sink: &mut ByteWriter<'_>, _: &CodecRegistry) -> Result<(), EntityError> {
        sink.write_i32(self.gold);
        Ok(())
    }

    fn restore(
        &mut self,
        source: Option<&mut ByteReader<'_>>,
        _: &CodecRegistry,
    ) -> Result<(), EntityError> {
        match source {
            Some(source) => {
                self.gold = source.read_i32()?;
                self.restores.push(Some(self.gold));
            }
            None => {
                self.gold = Self::DEFAULT_GOLD;
                self.restores.push(None);
            }
        }
        Ok(())
    }
}

/// Writes two values but reads back only the first.
#[derive(Debug)]
pub struct ShortReader {
    pub id: String,
    pub first: u32,
    pub second: u32,
}

impl Persistent for ShortReader {
    fn identity(&self) -> &str {
        &self.id
    }

    fn serialize(&self, sink: &mut ByteWriter<'_>, _: &CodecRegistry) -> Result<(), EntityError> {
        sink.write_u32(self.first);
        sink.write_u32(self.second);
        Ok(())
    }

    fn restore(
        &mut self,
        source: Option<&mut ByteReader<'_>>,
        _: &CodecRegistry,
    ) -> Result<(), EntityError> {
        if let Some(source) = source {
            self.first = source.read_u32()?;
        }
        Ok(())
    }
}

/// Writes one value and tries to read three.
#[derive(Debug)]
pub struct OverReader {
    pub id: String,
    pub value: u16,
    pub extra: Option<u64>,
}

impl Persistent for OverReader {
    fn identity(&self) -> &str {
        &self.id
    }

    fn serialize(&self, sink: &mut ByteWriter<'_>, _: &CodecRegistry) -> Result<(), EntityError> {
        sink.write_u16(self.value);
        Ok(())
    }

    fn restore(
        &mut self,
        source: Option<&mut ByteReader<'_>>,
        _: &CodecRegistry,
    ) -> Result<(), EntityError> {
        let Some(source) = source else {
            return Ok(());
        };
        self.value = source.read_u16()?;
        self.extra = Some(source.read_u64()?);
        Ok(())
    }
}

/// How a [`Faulty`] entity misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    SerializeError,
    SerializePanic,
    RestoreError,
    RestorePanic,
}

/// Fails in one chosen way after writing a partial payload.
#[derive(Debug)]
pub struct Faulty {
    pub id: String,
    pub fault: Fault,
    pub restore_calls: usize,
}

impl Faulty {
    pub fn new(id: &str, fault: Fault) -> Self {
        Self {
            id: id.to_string(),
            fault,
            restore_calls: 0,
        }
    }
}

impl Persistent for Faulty {
    fn identity(&self) -> &str {
        &self.id
    }

    fn serialize(&self, sink: &mut ByteWriter<'_>, _: &CodecRegistry) -> Result<(), EntityError> {
        sink.write_u32(0xDEAD_BEEF);
        match self.fault {
            Fault::SerializeError => Err("disk of holding is full".into()),
            Fault::SerializePanic => panic!("serializer exploded"),
            _ => Ok(()),
        }
    }

    fn restore(
        &mut self,
        source: Option<&mut ByteReader<'_>>,
        _: &CodecRegistry,
    ) -> Result<(), EntityError> {
        self.restore_calls += 1;
        if let Some(source) = source {
            source.read_u32()?;
        }
        match self.fault {
            Fault::RestoreError => Err("cannot restore".into()),
            Fault::RestorePanic => panic!("restorer exploded"),
            _ => Ok(()),
        }
    }
}

/// Opaque byte blob of arbitrary size.
#[derive(Debug)]
pub struct Blob {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(id: &str, bytes: Vec<u8>) -> Self {
        Self {
            id: id.to_string(),
            bytes,
        }
    }
}

impl Persistent for Blob {
    fn identity(&self) -> &str {
        &self.id
    }

    fn serialize(&self, sink: &mut ByteWriter<'_>, _: &CodecRegistry) -> Result<(), EntityError> {
        sink.write_raw(&self.bytes);
        Ok(())
    }

    fn restore(
        &mut self,
        source: Option<&mut ByteReader<'_>>,
        _: &CodecRegistry,
    ) -> Result<(), EntityError> {
        self.bytes = match source {
            Some(source) => source.read_raw(source.remaining())?.to_vec(),
            None => Vec::new(),
        };
        Ok(())
    }
}
