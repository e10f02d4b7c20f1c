//! Protocol revisions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named protocol version gating opcode availability and gas costs.
///
/// Variants are ordered, so `rev >= Revision::Berlin` reads as "Berlin or later".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Revision {
    /// Frontier
    Frontier = 0,
    /// Homestead
    Homestead = 1,
    /// Tangerine Whistle (EIP-150)
    TangerineWhistle = 2,
    /// Spurious Dragon (EIP-158)
    SpuriousDragon = 3,
    /// Byzantium
    Byzantium = 4,
    /// Constantinople
    Constantinople = 5,
    /// Petersburg
    Petersburg = 6,
    /// Istanbul
    Istanbul = 7,
    /// Berlin
    Berlin = 8,
    /// London
    London = 9,
    /// Paris (The Merge)
    Paris = 10,
    /// Shanghai
    Shanghai = 11,
    /// Cancun
    Cancun = 12,
}

/// Error parsing a revision name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown revision: {0}")]
pub struct UnknownRevision(pub String);

impl Revision {
    /// Number of revisions
    pub const COUNT: usize = 13;

    /// The most recent revision
    pub const LATEST: Revision = Revision::Cancun;

    /// All revisions in order
    pub const ALL: [Revision; Self::COUNT] = [
        Revision::Frontier,
        Revision::Homestead,
        Revision::TangerineWhistle,
        Revision::SpuriousDragon,
        Revision::Byzantium,
        Revision::Constantinople,
        Revision::Petersburg,
        Revision::Istanbul,
        Revision::Berlin,
        Revision::London,
        Revision::Paris,
        Revision::Shanghai,
        Revision::Cancun,
    ];

    /// Revision name
    pub const fn name(self) -> &'static str {
        match self {
            Revision::Frontier => "Frontier",
            Revision::Homestead => "Homestead",
            Revision::TangerineWhistle => "Tangerine Whistle",
            Revision::SpuriousDragon => "Spurious Dragon",
            Revision::Byzantium => "Byzantium",
            Revision::Constantinople => "Constantinople",
            Revision::Petersburg => "Petersburg",
            Revision::Istanbul => "Istanbul",
            Revision::Berlin => "Berlin",
            Revision::London => "London",
            Revision::Paris => "Paris",
            Revision::Shanghai => "Shanghai",
            Revision::Cancun => "Cancun",
        }
    }

    /// Position in `ALL`, usable in const contexts
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Revision {
    type Err = UnknownRevision;

    /// Case-insensitive; spaces, dashes and underscores are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Revision::ALL
            .iter()
            .copied()
            .find(|rev| {
                let name: String = rev
                    .name()
                    .chars()
                    .filter(|c| *c != ' ')
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                name == wanted
            })
            .ok_or_else(|| UnknownRevision(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Revision::Frontier < Revision::Homestead);
        assert!(Revision::Berlin >= Revision::Berlin);
        assert!(Revision::Cancun > Revision::Shanghai);
        assert_eq!(Revision::LATEST, *Revision::ALL.last().unwrap());
    }

    #[test]
    fn test_index_matches_all() {
        for (i, rev) in Revision::ALL.iter().enumerate() {
            assert_eq!(rev.index(), i);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("berlin".parse::<Revision>().unwrap(), Revision::Berlin);
        assert_eq!("Tangerine Whistle".parse::<Revision>().unwrap(), Revision::TangerineWhistle);
        assert_eq!("spurious_dragon".parse::<Revision>().unwrap(), Revision::SpuriousDragon);
        assert_eq!("CANCUN".parse::<Revision>().unwrap(), Revision::Cancun);
        assert!("prague".parse::<Revision>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for rev in Revision::ALL {
            assert_eq!(rev.to_string().parse::<Revision>().unwrap(), rev);
        }
    }
}
