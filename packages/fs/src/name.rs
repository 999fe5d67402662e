//! Fixed-width file names.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{FsError, Result};

/// Bytes reserved for a name in a directory slot, including the terminator.
pub const NAME_MAX: usize = 12;

/// A file name as stored in a directory slot: up to 11 printable ASCII
/// characters, NUL padded.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct FileName {
    bytes: [u8; NAME_MAX],
}

impl FileName {
    /// The name as a string slice, or `None` if the slot does not hold a
    /// valid name (an erased or corrupted slot).
    pub fn as_str(&self) -> Option<&str> {
        let len = self.bytes.iter().position(|&b| b == 0)?;
        let name = std::str::from_utf8(&self.bytes[..len]).ok()?;
        is_valid(name).then_some(name)
    }
}

impl TryFrom<&str> for FileName {
    type Error = FsError;

    fn try_from(value: &str) -> Result<Self> {
        if !is_valid(value) {
            return Err(FsError::InvalidName(value.to_string()));
        }
        let mut bytes = [0u8; NAME_MAX];
        bytes[..value.len()].copy_from_slice(value.as_bytes());
        Ok(Self { bytes })
    }
}

impl std::fmt::Debug for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_str() {
            Some(name) => write!(f, "{:?}", name),
            None => write!(f, "<invalid {:02x?}>", self.bytes),
        }
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str().unwrap_or("?"))
    }
}

fn is_valid(name: &str) -> bool {
    !name.is_empty() && name.len() < NAME_MAX && name.bytes().all(|b| b.is_ascii_graphic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_round_trip() {
        for name in ["a", "blink", "prog_01.bin", "12345678901"] {
            let file_name = FileName::try_from(name).unwrap();
            assert_eq!(file_name.as_str(), Some(name));
        }
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "123456789012", "two words", "tab\there", "é"] {
            assert!(
                matches!(FileName::try_from(name), Err(FsError::InvalidName(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn erased_slot_is_not_a_name() {
        let erased = FileName::read_from_bytes(&[0xFF; NAME_MAX]).unwrap();
        assert_eq!(erased.as_str(), None);

        let unterminated = FileName::read_from_bytes(b"abcdefghijkl").unwrap();
        assert_eq!(unterminated.as_str(), None);
    }

    #[test]
    fn persisted_bytes_are_nul_padded() {
        let name = FileName::try_from("ab").unwrap();
        assert_eq!(name.as_bytes(), b"ab\0\0\0\0\0\0\0\0\0\0");
    }
}
