mod error;
mod row;

pub use error::{RecordError, RecordResult};
pub use row::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE,
    ROW_SIZE, Row, USERNAME_OFFSET, USERNAME_SIZE,
};
