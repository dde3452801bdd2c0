//! Byte-order aware binary cursor primitives shared by the WKB and TWKB codecs.
//!
//! Fixed-width values honour the selected [`ByteOrder`] regardless of host
//! endianness. Variable-length integers are unsigned LEB128 (7 payload bits
//! per byte, least significant group first) with zig-zag mapping for signed
//! values.

use crate::error::{GeometryError, Result};

/// Longest LEB128 encoding of a `u64`.
const MAX_VARINT_BYTES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    BigEndian,
    #[default]
    LittleEndian,
}

impl ByteOrder {
    /// WKB byte-order marker: `0x00` big endian, `0x01` little endian.
    pub const fn marker(self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0x00,
            ByteOrder::LittleEndian => 0x01,
        }
    }

    pub fn from_marker(marker: u8) -> Result<Self> {
        match marker {
            0x00 => Ok(ByteOrder::BigEndian),
            0x01 => Ok(ByteOrder::LittleEndian),
            other => Err(GeometryError::unsupported(format!(
                "invalid byte order marker 0x{other:02x}"
            ))),
        }
    }
}

/// Map a signed integer onto an unsigned one so small magnitudes stay short.
///
/// # Example
///
/// ```
/// use geowire_core::binary::{zigzag_decode, zigzag_encode};
///
/// assert_eq!(zigzag_encode(0), 0);
/// assert_eq!(zigzag_encode(-1), 1);
/// assert_eq!(zigzag_encode(1), 2);
/// assert_eq!(zigzag_decode(3), -2);
/// ```
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Forward-only reader over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            pos: 0,
            order,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrow the next `n` bytes, failing if the buffer is shorter.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(GeometryError::TruncatedData {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let data: &'a [u8] = self.data;
        let bytes = &data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_ne_bytes(self.read_array::<1>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_array::<4>()?;
        Ok(match self.order {
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
        })
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.read_array::<8>()?;
        Ok(match self.order {
            ByteOrder::BigEndian => f64::from_be_bytes(bytes),
            ByteOrder::LittleEndian => f64::from_le_bytes(bytes),
        })
    }

    /// Unsigned LEB128 varint. Byte order does not apply.
    pub fn read_uvarint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_u8()?;
            let payload = u64::from(byte & 0x7f);
            if i == MAX_VARINT_BYTES - 1 && payload > 1 {
                return Err(GeometryError::unsupported("varint overflows 64 bits"));
            }
            value |= payload << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(GeometryError::unsupported("varint longer than 10 bytes"))
    }

    pub fn read_svarint(&mut self) -> Result<i64> {
        Ok(zigzag_decode(self.read_uvarint()?))
    }
}

/// Append-only writer into an owned buffer.
#[derive(Debug, Clone, Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
    order: ByteOrder,
}

impl BinaryWriter {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buf: Vec::new(),
            order,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.extend_from_slice(&value.to_ne_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        match self.order {
            ByteOrder::BigEndian => self.buf.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.buf.extend_from_slice(&value.to_le_bytes()),
        }
    }

    pub fn write_f64(&mut self, value: f64) {
        match self.order {
            ByteOrder::BigEndian => self.buf.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.buf.extend_from_slice(&value.to_le_bytes()),
        }
    }

    pub fn write_uvarint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn write_svarint(&mut self, value: i64) {
        self.write_uvarint(zigzag_encode(value));
    }
}
