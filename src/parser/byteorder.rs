use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};

use crate::dataset::Endianness;

macro_rules! endian_stream_reader {
    ($name:ident, $method:ident, $ty:ty) => {
        #[inline]
        pub fn $name<R: Read + ?Sized>(reader: &mut R, endian: Endianness) -> io::Result<$ty> {
            match endian {
                Endianness::Little => reader.$method::<LittleEndian>(),
                Endianness::Big => reader.$method::<BigEndian>(),
            }
        }
    };
}

macro_rules! endian_slice_reader {
    ($name:ident, $method:ident, $ty:ty) => {
        /// # Panics
        ///
        /// Panics if `bytes` is shorter than the value being read.
        #[inline]
        #[must_use]
        pub fn $name(endian: Endianness, bytes: &[u8]) -> $ty {
            match endian {
                Endianness::Little => LittleEndian::$method(bytes),
                Endianness::Big => BigEndian::$method(bytes),
            }
        }
    };
}

endian_stream_reader!(read_u16, read_u16, u16);
endian_stream_reader!(read_u32, read_u32, u32);
endian_stream_reader!(read_i32, read_i32, i32);
endian_stream_reader!(read_u64, read_u64, u64);

endian_slice_reader!(slice_i16, read_i16, i16);
endian_slice_reader!(slice_i32, read_i32, i32);
endian_slice_reader!(slice_u64, read_u64, u64);
endian_slice_reader!(slice_f32, read_f32, f32);
endian_slice_reader!(slice_f64, read_f64, f64);

/// Reads an unsigned integer stored in `width` bytes.
///
/// # Errors
///
/// Returns an error on short reads or when `width` is not 1, 2, 4 or 8.
pub fn read_uint<R: Read + ?Sized>(
    reader: &mut R,
    endian: Endianness,
    width: usize,
) -> io::Result<u64> {
    match width {
        1 => reader.read_u8().map(u64::from),
        2 => read_u16(reader, endian).map(u64::from),
        4 => read_u32(reader, endian).map(u64::from),
        8 => read_u64(reader, endian),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported integer width {other}"),
        )),
    }
}

/// Reads exactly `len` bytes into a fresh buffer.
///
/// # Errors
///
/// Returns an error on short reads.
pub fn read_bytes<R: Read + ?Sized>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads a fixed-size marker, returning `None` if the stream ends first.
///
/// # Errors
///
/// Returns an error for I/O failures other than end of stream.
pub fn read_marker<R: Read + ?Sized, const N: usize>(
    reader: &mut R,
) -> io::Result<Option<[u8; N]>> {
    let mut buf = [0u8; N];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(Some(buf)),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(err),
    }
}

/// Moves the cursor forward by `count` bytes.
///
/// # Errors
///
/// Returns an error if the seek fails.
pub fn skip<R: Seek + ?Sized>(reader: &mut R, count: i64) -> io::Result<()> {
    reader.seek(SeekFrom::Current(count)).map(|_| ())
}
