use core::{
    any::type_name,
    ops::{Add, Rem, Sub},
};

use zerocopy::FromBytes;

use crate::ReadError;

/// Read a `T` from the start of `data`.
pub fn read<T: FromBytes + Copy>(data: &[u8]) -> Result<T, ReadError> {
    T::read_from_prefix(data)
        .map_err(|_| ReadError(type_name::<T>().to_string()))
        .map(|(value, _)| value)
}

/// Read a `T` at `offset` in `data`, failing instead of panicking when the offset is out of range.
pub fn read_at<T: FromBytes + Copy>(data: &[u8], offset: u64) -> Result<T, ReadError> {
    let tail = usize::try_from(offset).ok().and_then(|offset| data.get(offset..));
    match tail {
        Some(tail) => read::<T>(tail),
        None => Err(ReadError(format!("{} at {:#x} outside of {:#x} bytes", type_name::<T>(), offset, data.len()))),
    }
}

pub fn aligned_to<T: Add<Output = T> + Sub<Output = T> + Rem<Output = T> + Eq + Copy + Default>(
    value: T, alignment: T,
) -> T {
    if alignment == T::default() || value % alignment == T::default() {
        return value;
    }
    value + alignment - (value % alignment)
}

/// Zero-pad `data` to a multiple of `alignment` bytes.
pub fn pad_to(data: &mut Vec<u8>, alignment: usize) {
    let len = aligned_to(data.len(), alignment);
    data.resize(len, 0);
}

/// Encode a string as null-terminated UTF-16 for wide Windows APIs.
#[cfg(windows)]
pub fn to_wide<S: AsRef<str>>(string: S) -> Vec<u16> {
    string.as_ref().encode_utf16().chain(core::iter::once(0)).collect()
}

/// Decode UTF-16 units, replacing invalid sequences.
pub fn from_wide(data: &[u16]) -> String { String::from_utf16_lossy(data) }

/// Compare two UTF-16 strings ignoring ASCII case, as resource lookups do.
pub fn wide_eq_ignore_ascii_case(a: &[u16], b: &[u16]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&a, &b)| ascii_upper(a) == ascii_upper(b))
}

pub fn ascii_upper(c: u16) -> u16 {
    if (b'a' as u16..=b'z' as u16).contains(&c) {
        c - 0x20
    } else {
        c
    }
}
