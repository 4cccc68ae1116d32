use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AnalyticsError;

/// Letter grades ordered best to worst. The discriminant is the rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    AStar = 0,
    A = 1,
    B = 2,
    C = 3,
    D = 4,
    E = 5,
    U = 6,
}

impl Grade {
    pub const SCALE: [Grade; 7] = [
        Grade::AStar,
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::E,
        Grade::U,
    ];

    /// Zero-based position on the scale, 0 = best.
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn from_rank(rank: usize) -> Option<Grade> {
        Self::SCALE.get(rank).copied()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Grade::AStar => "A*",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::U => "U",
        }
    }
}

/// Rank lookup on a raw symbol.
pub fn rank(symbol: &str) -> Result<usize, AnalyticsError> {
    symbol.parse::<Grade>().map(Grade::rank)
}

impl FromStr for Grade {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SCALE
            .iter()
            .copied()
            .find(|grade| grade.symbol() == s.trim())
            .ok_or_else(|| AnalyticsError::InvalidGrade(s.to_string()))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        symbol.parse().map_err(serde::de::Error::custom)
    }
}
