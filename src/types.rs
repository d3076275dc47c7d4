use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two catalog domains watched independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Vod,
    Series,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Vod, ContentKind::Series];

    pub fn as_str(&self) -> &'static str {
        match self { ContentKind::Vod => "vod", ContentKind::Series => "series" }
    }

    /// Human label used in announcements and logs.
    pub fn label(&self) -> &'static str {
        match self { ContentKind::Vod => "film", ContentKind::Series => "series" }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vod" | "film" | "films" | "movie" | "movies" => Ok(ContentKind::Vod),
            "series" | "show" | "shows" => Ok(ContentKind::Series),
            other => Err(format!("unknown content kind `{}` (expected vod or series)", other)),
        }
    }
}

/// Opaque catalog token. Panels hand out both numeric and string ids, and the
/// persisted form keeps whichever one was received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    /// Only numbers above `i64::MAX` land here.
    UInt(u64),
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(n) => write!(f, "{}", n),
            Identifier::UInt(n) => write!(f, "{}", n),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self { Identifier::Int(n) }
}

impl From<u64> for Identifier {
    fn from(n: u64) -> Self { i64::try_from(n).map(Identifier::Int).unwrap_or(Identifier::UInt(n)) }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self { Identifier::Text(s.to_string()) }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self { Identifier::Text(s) }
}

/// Identifiers already announced for one kind.
pub type SeenSet = HashSet<Identifier>;

/// Identifiers currently visible in the catalog for one kind.
pub type FetchResult = HashSet<Identifier>;

/// Sorted copy of a set, used wherever output has to be deterministic.
pub fn sorted_ids(set: &HashSet<Identifier>) -> Vec<Identifier> {
    let mut v: Vec<Identifier> = set.iter().cloned().collect();
    v.sort();
    v
}
