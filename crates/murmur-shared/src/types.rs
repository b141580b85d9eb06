use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// User identity = store-assigned serial id
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_parse() {
        assert_eq!(" 42 ".parse::<UserId>().unwrap(), UserId(42));
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn test_ids_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&UserId(7)).unwrap(), "7");
        let id: MessageId = serde_json::from_str("12").unwrap();
        assert_eq!(id, MessageId(12));
    }
}
