use std::fmt;

use super::error::{RecordError, RecordResult};

/// Maximum length of the username column in bytes
pub const COLUMN_USERNAME_SIZE: usize = 32;
/// Maximum length of the email column in bytes
pub const COLUMN_EMAIL_SIZE: usize = 255;

pub const ID_SIZE: usize = size_of::<u32>();
/// Text columns reserve one extra byte for a NUL terminator
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized size of every row
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A row of the single fixed-schema table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    /// Create a row, checking both text columns against their bounds
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> RecordResult<Self> {
        let username = username.into();
        let email = email.into();

        check_column("username", &username, COLUMN_USERNAME_SIZE)?;
        check_column("email", &email, COLUMN_EMAIL_SIZE)?;

        Ok(Self {
            id,
            username,
            email,
        })
    }

    /// Serialize this row into `dest`, which must be exactly `ROW_SIZE` bytes
    pub fn serialize_into(&self, dest: &mut [u8]) -> RecordResult<()> {
        if dest.len() != ROW_SIZE {
            return Err(RecordError::InvalidRowSize {
                expected: ROW_SIZE,
                actual: dest.len(),
            });
        }
        check_column("username", &self.username, COLUMN_USERNAME_SIZE)?;
        check_column("email", &self.email, COLUMN_EMAIL_SIZE)?;

        dest.fill(0);
        dest[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        dest[USERNAME_OFFSET..USERNAME_OFFSET + self.username.len()]
            .copy_from_slice(self.username.as_bytes());
        dest[EMAIL_OFFSET..EMAIL_OFFSET + self.email.len()].copy_from_slice(self.email.as_bytes());
        Ok(())
    }

    /// Serialize this row into a fresh buffer
    pub fn serialize(&self) -> RecordResult<[u8; ROW_SIZE]> {
        let mut buf = [0u8; ROW_SIZE];
        self.serialize_into(&mut buf)?;
        Ok(buf)
    }

    /// Deserialize a row from its fixed-width form
    pub fn deserialize(data: &[u8]) -> RecordResult<Self> {
        if data.len() != ROW_SIZE {
            return Err(RecordError::InvalidRowSize {
                expected: ROW_SIZE,
                actual: data.len(),
            });
        }

        let id = u32::from_le_bytes([
            data[ID_OFFSET],
            data[ID_OFFSET + 1],
            data[ID_OFFSET + 2],
            data[ID_OFFSET + 3],
        ]);
        let username = read_text("username", &data[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE])?;
        let email = read_text("email", &data[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE])?;

        Ok(Self {
            id,
            username,
            email,
        })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn check_column(column: &'static str, value: &str, max: usize) -> RecordResult<()> {
    // NUL terminates a column on disk
    if let Some(position) = value.bytes().position(|b| b == 0) {
        return Err(RecordError::EmbeddedNul { column, position });
    }
    if value.len() > max {
        return Err(RecordError::StringTooLong {
            column,
            max,
            actual: value.len(),
        });
    }
    Ok(())
}

/// Read a NUL-padded text column
fn read_text(column: &str, bytes: &[u8]) -> RecordResult<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8(bytes[..end].to_vec())
        .map_err(|e| RecordError::Deserialization(format!("column {}: {}", column, e)))
}
