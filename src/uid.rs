//! Application entity titles and unique identifiers.
//!
//! Both are plain ASCII text fields with the padding and length rules laid
//! out in PS3.8 and PS3.5: an AE title is at most 16 bytes, space-padded to
//! even length on the wire; a UID is a dot-separated run of digits, at most
//! 64 characters, null-padded to even length only when it appears inside an
//! encoded dataset (never inside a PDU sub-item, where the length field
//! already carries odd lengths).

use std::borrow::Cow;
use std::fmt;

use snafu::{ensure, Snafu};

/// Maximum length, in bytes, of an application entity title field.
pub const AE_TITLE_MAX_LEN: usize = 16;

/// Maximum length, in characters, of a unique identifier.
pub const UID_MAX_LEN: usize = 64;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum InvalidAeTitleError {
    #[snafu(display("AE title is empty"))]
    Empty,
    #[snafu(display("AE title `{value}` is longer than {AE_TITLE_MAX_LEN} bytes"))]
    TooLong { value: String },
    #[snafu(display("AE title `{value}` contains non-printable ASCII"))]
    NotPrintableAscii { value: String },
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum InvalidUidError {
    #[snafu(display("UID is empty"))]
    Empty,
    #[snafu(display("UID `{value}` is longer than {UID_MAX_LEN} characters"))]
    TooLong { value: String },
    #[snafu(display("UID `{value}` contains a character other than digits and dots"))]
    InvalidCharacter { value: String },
}

/// A validated application entity title.
///
/// An `AeTitle` is always non-empty, printable ASCII, and no more than
/// [`AE_TITLE_MAX_LEN`] bytes once trailing padding is trimmed.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct AeTitle(String);

impl AeTitle {
    /// Validate and build an AE title from user-supplied text, trimming
    /// trailing spaces and NULs (the padding bytes used on the wire).
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidAeTitleError> {
        let value = value.into();
        let trimmed = value
            .trim_end_matches(|c: char| c == ' ' || c == '\0')
            .to_string();
        ensure!(!trimmed.is_empty(), EmptySnafu);
        ensure!(
            trimmed.len() <= AE_TITLE_MAX_LEN,
            TooLongSnafu { value: trimmed }
        );
        ensure!(
            trimmed.bytes().all(|b| (0x20..=0x7e).contains(&b)),
            NotPrintableAsciiSnafu { value: trimmed }
        );
        Ok(AeTitle(trimmed))
    }

    /// The title text, without padding.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The title encoded as a fixed 16-byte, space-padded field, as it is
    /// written in an A-ASSOCIATE-RQ/AC PDU.
    pub fn to_padded_field(&self) -> [u8; AE_TITLE_MAX_LEN] {
        let mut field = [b' '; AE_TITLE_MAX_LEN];
        field[..self.0.len()].copy_from_slice(self.0.as_bytes());
        field
    }
}

impl fmt::Display for AeTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AeTitle {
    type Err = InvalidAeTitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AeTitle::new(s)
    }
}

/// A validated unique identifier (UID).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Uid(String);

impl Uid {
    /// Validate and build a UID from user-supplied text, trimming the
    /// trailing NUL padding byte used when a UID is embedded in a dataset.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidUidError> {
        let value = trim_uid(Cow::Owned(value.into())).into_owned();
        ensure!(!value.is_empty(), EmptySnafu);
        ensure!(value.len() <= UID_MAX_LEN, TooLongSnafu { value });
        ensure!(
            value.bytes().all(|b| b.is_ascii_digit() || b == b'.'),
            InvalidCharacterSnafu { value }
        );
        Ok(Uid(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The UID as it should be embedded in an encoded dataset: null-padded
    /// to even length. PDU sub-items never pad this way, they simply declare
    /// an odd length.
    pub fn to_dataset_padded(&self) -> Cow<str> {
        if self.0.len() % 2 == 0 {
            Cow::Borrowed(&self.0)
        } else {
            Cow::Owned(format!("{}\0", self.0))
        }
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Uid {
    type Err = InvalidUidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uid::new(s)
    }
}

/// Strip the trailing NUL padding byte (and any stray whitespace around it)
/// from a UID read off the wire.
pub(crate) fn trim_uid(uid: Cow<str>) -> Cow<str> {
    if uid.ends_with('\0') || uid.ends_with(' ') {
        Cow::Owned(
            uid.trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
                .to_string(),
        )
    } else {
        uid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_uid_padding() {
        assert_eq!(trim_uid(Cow::from("1.2.3.4")), "1.2.3.4");
        assert_eq!(trim_uid(Cow::from("1.2.3.4\0")), "1.2.3.4");
        assert_eq!(trim_uid(Cow::from("1.2.3.45\0")), "1.2.3.45");
    }

    #[test]
    fn validates_ae_title() {
        assert_eq!(AeTitle::new("STORE_SCP").unwrap().as_str(), "STORE_SCP");
        assert_eq!(AeTitle::new("STORE_SCP      ").unwrap().as_str(), "STORE_SCP");
        assert!(AeTitle::new("").is_err());
        assert!(AeTitle::new("THIS_TITLE_IS_WAY_TOO_LONG").is_err());
    }

    #[test]
    fn validates_uid() {
        assert_eq!(Uid::new("1.2.840.10008.1.1").unwrap().as_str(), "1.2.840.10008.1.1");
        assert!(Uid::new("not-a-uid").is_err());
        assert!(Uid::new("").is_err());
    }

    #[test]
    fn pads_uid_for_dataset_embedding() {
        let uid = Uid::new("1.2.3").unwrap();
        assert_eq!(uid.to_dataset_padded(), "1.2.3\0");
        let uid = Uid::new("1.2.34").unwrap();
        assert_eq!(uid.to_dataset_padded(), "1.2.34");
    }
}
