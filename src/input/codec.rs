//! Binary wire form of an input definition
//!
//! File layout:
//!
//! ```text
//! +------------------+
//! | Magic "IDEF"     | (4 bytes)
//! +------------------+
//! | Format Version   | (u8)
//! +------------------+
//! | Body Length      | (u32 LE)
//! +------------------+
//! | Body             | (variable)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Body:
//!
//! ```text
//! name
//! frame_count (u32) { name, row_label, inverse_enabled (u8), cache_type,
//!                     cache_size (u32), time_quantum }
//! field_count (u32) { name, primary_key (u8), action_count (u32)
//!                     { frame, destination, map_len (u32) { key, row (u64) },
//!                       has_row_id (u8) [row_id (u64)] } }
//! ```
//!
//! Strings are length-prefixed (u32 LE) UTF-8. Value map entries are written
//! in key order, so encoding is deterministic. Checksum is CRC32 over every
//! byte before it.
//!
//! The codec is pure: no I/O, no validation beyond well-formedness.

use std::collections::BTreeMap;

use crc32fast::Hasher;

use super::errors::DecodeError;

/// Magic bytes opening every persisted definition.
pub const MAGIC: [u8; 4] = *b"IDEF";

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 4 + 1 + 4;
const CHECKSUM_LEN: usize = 4;

/// Wire form of a whole definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireSchema {
    pub name: String,
    pub frames: Vec<WireFrame>,
    pub fields: Vec<WireField>,
}

/// Wire form of a frame and its options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireFrame {
    pub name: String,
    pub row_label: String,
    pub inverse_enabled: bool,
    pub cache_size: u32,
    pub cache_type: String,
    pub time_quantum: String,
}

/// Wire form of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireField {
    pub name: String,
    pub primary_key: bool,
    pub actions: Vec<WireAction>,
}

/// Wire form of an action. The destination stays a raw string so that
/// unknown literals surface as validation errors, not decode errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireAction {
    pub frame: String,
    pub value_destination: String,
    pub value_map: BTreeMap<String, u64>,
    pub row_id: Option<u64>,
}

fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_bool(buf: &mut Vec<u8>, value: bool) {
    buf.push(u8::from(value));
}

fn put_str(buf: &mut Vec<u8>, value: &str) {
    put_u32(buf, value.len() as u32);
    buf.extend_from_slice(value.as_bytes());
}

fn serialize_body(schema: &WireSchema) -> Vec<u8> {
    let mut buf = Vec::new();

    put_str(&mut buf, &schema.name);

    put_u32(&mut buf, schema.frames.len() as u32);
    for frame in &schema.frames {
        put_str(&mut buf, &frame.name);
        put_str(&mut buf, &frame.row_label);
        put_bool(&mut buf, frame.inverse_enabled);
        put_str(&mut buf, &frame.cache_type);
        put_u32(&mut buf, frame.cache_size);
        put_str(&mut buf, &frame.time_quantum);
    }

    put_u32(&mut buf, schema.fields.len() as u32);
    for field in &schema.fields {
        put_str(&mut buf, &field.name);
        put_bool(&mut buf, field.primary_key);
        put_u32(&mut buf, field.actions.len() as u32);
        for action in &field.actions {
            put_str(&mut buf, &action.frame);
            put_str(&mut buf, &action.value_destination);
            put_u32(&mut buf, action.value_map.len() as u32);
            for (key, row) in &action.value_map {
                put_str(&mut buf, key);
                put_u64(&mut buf, *row);
            }
            match action.row_id {
                Some(row_id) => {
                    put_bool(&mut buf, true);
                    put_u64(&mut buf, row_id);
                }
                None => put_bool(&mut buf, false),
            }
        }
    }

    buf
}

/// Encodes a schema into its persisted byte form.
pub fn encode(schema: &WireSchema) -> Vec<u8> {
    let body = serialize_body(schema);

    let mut out = Vec::with_capacity(HEADER_LEN + body.len() + CHECKSUM_LEN);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    put_u32(&mut out, body.len() as u32);
    out.extend_from_slice(&body);

    let checksum = compute_checksum(&out);
    put_u32(&mut out, checksum);
    out
}

/// Decodes persisted bytes, verifying framing and checksum.
pub fn decode(data: &[u8]) -> Result<WireSchema, DecodeError> {
    if data.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(DecodeError::Truncated {
            offset: 0,
            needed: HEADER_LEN + CHECKSUM_LEN,
            available: data.len(),
        });
    }

    let magic = [data[0], data[1], data[2], data[3]];
    if magic != MAGIC {
        return Err(DecodeError::BadMagic { found: magic });
    }
    if data[4] != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(data[4]));
    }

    let body_len = u32::from_le_bytes([data[5], data[6], data[7], data[8]]) as usize;
    let total = HEADER_LEN + body_len + CHECKSUM_LEN;
    if data.len() < total {
        return Err(DecodeError::Truncated {
            offset: 0,
            needed: total,
            available: data.len(),
        });
    }
    if data.len() > total {
        return Err(DecodeError::TrailingBytes(data.len() - total));
    }

    let checksum_offset = HEADER_LEN + body_len;
    let stored = u32::from_le_bytes([
        data[checksum_offset],
        data[checksum_offset + 1],
        data[checksum_offset + 2],
        data[checksum_offset + 3],
    ]);
    let computed = compute_checksum(&data[..checksum_offset]);
    if computed != stored {
        return Err(DecodeError::ChecksumMismatch { computed, stored });
    }

    let mut reader = BodyReader::new(&data[HEADER_LEN..checksum_offset], HEADER_LEN);
    let schema = reader.read_schema()?;
    if reader.remaining() != 0 {
        return Err(DecodeError::LengthMismatch {
            declared: body_len,
            actual: body_len - reader.remaining(),
        });
    }
    Ok(schema)
}

/// Sequential reader over a body slice. `base` is the body's offset in the
/// whole payload, so errors point at absolute positions.
struct BodyReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> BodyReader<'a> {
    fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::Truncated {
                offset: self.base + self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let data = self.data;
        let slice = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let offset = self.base + self.pos;
        match self.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidFlag { offset, value }),
        }
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u32()? as usize;
        let offset = self.base + self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    fn read_schema(&mut self) -> Result<WireSchema, DecodeError> {
        let name = self.read_string()?;

        let frame_count = self.read_u32()?;
        let mut frames = Vec::new();
        for _ in 0..frame_count {
            frames.push(WireFrame {
                name: self.read_string()?,
                row_label: self.read_string()?,
                inverse_enabled: self.read_bool()?,
                cache_type: self.read_string()?,
                cache_size: self.read_u32()?,
                time_quantum: self.read_string()?,
            });
        }

        let field_count = self.read_u32()?;
        let mut fields = Vec::new();
        for _ in 0..field_count {
            fields.push(self.read_field()?);
        }

        Ok(WireSchema {
            name,
            frames,
            fields,
        })
    }

    fn read_field(&mut self) -> Result<WireField, DecodeError> {
        let name = self.read_string()?;
        let primary_key = self.read_bool()?;

        let action_count = self.read_u32()?;
        let mut actions = Vec::new();
        for _ in 0..action_count {
            let frame = self.read_string()?;
            let value_destination = self.read_string()?;

            let map_len = self.read_u32()?;
            let mut value_map = BTreeMap::new();
            for _ in 0..map_len {
                let key = self.read_string()?;
                let row = self.read_u64()?;
                value_map.insert(key, row);
            }

            let row_id = if self.read_bool()? {
                Some(self.read_u64()?)
            } else {
                None
            };

            actions.push(WireAction {
                frame,
                value_destination,
                value_map,
                row_id,
            });
        }

        Ok(WireField {
            name,
            primary_key,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> WireSchema {
        let mut value_map = BTreeMap::new();
        value_map.insert("a".to_string(), 1);
        value_map.insert("b".to_string(), 2);

        WireSchema {
            name: "events".into(),
            frames: vec![WireFrame {
                name: "kind".into(),
                row_label: "rowID".into(),
                inverse_enabled: true,
                cache_size: 50_000,
                cache_type: "ranked".into(),
                time_quantum: "YMDH".into(),
            }],
            fields: vec![
                WireField {
                    name: "id".into(),
                    primary_key: true,
                    actions: vec![],
                },
                WireField {
                    name: "kind".into(),
                    primary_key: false,
                    actions: vec![
                        WireAction {
                            frame: "kind".into(),
                            value_destination: "mapping".into(),
                            value_map,
                            row_id: None,
                        },
                        WireAction {
                            frame: "kind".into(),
                            value_destination: "single-row-boolean".into(),
                            value_map: BTreeMap::new(),
                            row_id: Some(0),
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_roundtrip() {
        let schema = sample_schema();
        let bytes = encode(&schema);
        assert_eq!(decode(&bytes).unwrap(), schema);
    }

    #[test]
    fn test_empty_schema_roundtrip() {
        let schema = WireSchema::default();
        assert_eq!(decode(&encode(&schema)).unwrap(), schema);
    }

    #[test]
    fn test_row_id_zero_distinct_from_absent() {
        let schema = sample_schema();
        let decoded = decode(&encode(&schema)).unwrap();
        assert_eq!(decoded.fields[1].actions[0].row_id, None);
        assert_eq!(decoded.fields[1].actions[1].row_id, Some(0));
    }

    #[test]
    fn test_deterministic_encoding() {
        let schema = sample_schema();
        assert_eq!(encode(&schema), encode(&schema.clone()));
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode(&sample_schema());
        assert_eq!(&bytes[..4], b"IDEF");
        assert_eq!(bytes[4], FORMAT_VERSION);
        let body_len = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]) as usize;
        assert_eq!(bytes.len(), HEADER_LEN + body_len + CHECKSUM_LEN);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut bytes = encode(&sample_schema());
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_truncated_payload() {
        let bytes = encode(&sample_schema());
        for len in [0, 3, HEADER_LEN, bytes.len() - 1] {
            let err = decode(&bytes[..len]).unwrap_err();
            assert!(matches!(err, DecodeError::Truncated { .. }), "len {len}: {err}");
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode(&sample_schema());
        bytes.push(0);
        assert_eq!(decode(&bytes).unwrap_err(), DecodeError::TrailingBytes(1));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut bytes = encode(&sample_schema());
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes).unwrap_err(), DecodeError::BadMagic { .. }));

        let mut bytes = encode(&sample_schema());
        bytes[4] = 2;
        assert_eq!(decode(&bytes).unwrap_err(), DecodeError::UnsupportedVersion(2));
    }

    /// Re-frames a hand-built body with a valid header and checksum.
    fn frame_body(body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        put_u32(&mut out, body.len() as u32);
        out.extend_from_slice(body);
        let checksum = compute_checksum(&out);
        put_u32(&mut out, checksum);
        out
    }

    #[test]
    fn test_invalid_flag_byte() {
        let mut body = Vec::new();
        put_str(&mut body, "d");
        put_u32(&mut body, 0);
        put_u32(&mut body, 1);
        put_str(&mut body, "f");
        body.push(7);
        put_u32(&mut body, 0);

        let err = decode(&frame_body(&body)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFlag { value: 7, .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut body = Vec::new();
        put_u32(&mut body, 2);
        body.extend_from_slice(&[0xC3, 0x28]);
        put_u32(&mut body, 0);
        put_u32(&mut body, 0);

        let err = decode(&frame_body(&body)).unwrap_err();
        assert_eq!(err, DecodeError::InvalidUtf8 { offset: HEADER_LEN + 4 });
    }

    #[test]
    fn test_declared_count_beyond_body() {
        let mut body = Vec::new();
        put_str(&mut body, "d");
        put_u32(&mut body, 1_000_000);

        let err = decode(&frame_body(&body)).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn test_unconsumed_body_bytes() {
        let mut body = serialize_body(&WireSchema::default());
        body.push(0);

        let err = decode(&frame_body(&body)).unwrap_err();
        assert!(matches!(err, DecodeError::LengthMismatch { .. }));
    }
}
