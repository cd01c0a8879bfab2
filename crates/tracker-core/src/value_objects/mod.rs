//! Value objects - immutable types that represent domain concepts

mod inviter_key;
mod snowflake;

pub use inviter_key::InviterKey;
pub use snowflake::{Snowflake, SnowflakeParseError};
