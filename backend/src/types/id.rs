//! Typed ID wrappers for compile-time type safety.
//!
//! User ids are database-assigned integers. They travel over HTTP as JSON
//! numbers and inside tokens as decimal strings.

use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    Database, Decode, Encode, Type,
};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps a raw database id.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// SQLx integration for reading from database
impl<'r, DB: Database> Decode<'r, DB> for UserId
where
    i64: Decode<'r, DB>,
{
    fn decode(value: <DB as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
        i64::decode(value).map(Self)
    }
}

// SQLx integration for writing to database
impl<'q, DB: Database> Encode<'q, DB> for UserId
where
    i64: Encode<'q, DB>,
{
    fn encode_by_ref(
        &self,
        buf: &mut <DB as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        self.0.encode_by_ref(buf)
    }
}

impl<DB: Database> Type<DB> for UserId
where
    i64: Type<DB>,
{
    fn type_info() -> <DB as Database>::TypeInfo {
        i64::type_info()
    }

    fn compatible(ty: &<DB as Database>::TypeInfo) -> bool {
        i64::compatible(ty)
    }
}
