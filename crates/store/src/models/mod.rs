mod document;

pub(crate) use self::document::{DocumentRow, timestamp};
