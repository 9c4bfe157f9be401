use bytes::{Buf, BufMut};
use commonware_codec::{Error, ReadExt, Write};

/// Write a string as length-prefixed UTF-8 bytes.
pub fn write_string(s: &str, writer: &mut impl BufMut) {
    let bytes = s.as_bytes();
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

/// Read a length-prefixed UTF-8 string of at most `max_len` bytes.
pub fn read_string(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("String", "too long"));
    }
    let bytes = read_bytes(reader, len)?;
    String::from_utf8(bytes).map_err(|_| Error::Invalid("String", "invalid UTF-8"))
}

pub fn string_encode_size(s: &str) -> usize {
    4 + s.len()
}

/// Read exactly `len` raw bytes.
pub fn read_bytes(reader: &mut impl Buf, len: usize) -> Result<Vec<u8>, Error> {
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    Ok(bytes)
}

/// Read a fixed-width byte array.
pub fn read_array<const N: usize>(reader: &mut impl Buf) -> Result<[u8; N], Error> {
    if reader.remaining() < N {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = [0u8; N];
    reader.copy_to_slice(&mut bytes);
    Ok(bytes)
}
