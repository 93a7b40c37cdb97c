use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Optional narrowing for a user search.
///
/// `None` means "do not filter on this"; a present text value always filters,
/// even when it is empty. A blank `term`, as sent by an untouched form field,
/// counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub query: Option<String>,
    pub program: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub term: Option<i32>,
}

impl SearchCriteria {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_term(mut self, term: i32) -> Self {
        self.term = Some(term);
        self
    }
}

/// Query-string number that treats `key=` like a missing key.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(de::Error::custom),
    }
}
