//! Flat backing byte store
//!
//! Primitive little-endian integer access at arbitrary byte offsets. Offsets are
//! not checked: reading or writing past the end of the store is a contract
//! violation and panics like any out-of-bounds slice access.

/// The single byte array every other component is built on
#[derive(Clone)]
pub struct ByteStore {
    bytes: Vec<u8>,
}

impl ByteStore {
    /// Create a zero-filled store of `size` bytes
    pub fn new(size: usize) -> Self {
        ByteStore {
            bytes: vec![0u8; size],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn read_u8(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    #[inline]
    pub fn write_u8(&mut self, offset: usize, value: u8) {
        self.bytes[offset] = value;
    }

    #[inline]
    pub fn read_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    #[inline]
    pub fn write_u16(&mut self, offset: usize, value: u16) {
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn read_u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ])
    }

    #[inline]
    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.bytes[offset..offset + len]
    }

    /// Copy `data` into the store at `offset`
    pub fn copy_in(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Move `len` bytes from `src` to `dst` (ranges may overlap)
    pub fn copy_within(&mut self, src: usize, dst: usize, len: usize) {
        self.bytes.copy_within(src..src + len, dst);
    }

    /// Zero `len` bytes starting at `offset`
    pub fn fill_zero(&mut self, offset: usize, len: usize) {
        self.bytes[offset..offset + len].fill(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for ByteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStore")
            .field("len", &self.bytes.len())
            .finish()
    }
}
