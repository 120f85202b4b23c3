//! Standards catalog
//!
//! Static mapping from inspection discipline to the technical standards that
//! apply to it. Pure lookup, fixed at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inspection specialty
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discipline {
    /// Tanks and pressure vessels
    Mechanical,
    WeldingStructure,
    CorrosionCoatings,
    ElectricalPower,
    SafetyHse,
}

/// Catalog order; drives `list_disciplines`.
const CATALOG: &[(Discipline, &[&str])] = &[
    (Discipline::Mechanical, &["API 653", "API 510", "API 570"]),
    (Discipline::WeldingStructure, &["ASME IX", "AWS D1.1", "API 1104"]),
    (Discipline::CorrosionCoatings, &["NACE SP0188", "SSPC-PA2", "ISO 8501"]),
    (Discipline::ElectricalPower, &["NFPA 70B", "NETA MTS", "IEEE 43"]),
    (Discipline::SafetyHse, &["OSHA 1910", "ISO 45001"]),
];

impl Discipline {
    /// Every discipline, in catalog order
    pub const ALL: [Discipline; 5] = [
        Discipline::Mechanical,
        Discipline::WeldingStructure,
        Discipline::CorrosionCoatings,
        Discipline::ElectricalPower,
        Discipline::SafetyHse,
    ];

    /// Catalog key, as persisted in records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mechanical => "MECHANICAL",
            Self::WeldingStructure => "WELDING_STRUCTURE",
            Self::CorrosionCoatings => "CORROSION_COATINGS",
            Self::ElectricalPower => "ELECTRICAL_POWER",
            Self::SafetyHse => "SAFETY_HSE",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mechanical => "Mechanical (Tanks/Vessels)",
            Self::WeldingStructure => "Welding and Structure",
            Self::CorrosionCoatings => "Corrosion and Coatings",
            Self::ElectricalPower => "Electrical and Power",
            Self::SafetyHse => "Safety (HSE)",
        }
    }

    /// Parse a catalog key. Case and surrounding whitespace are ignored;
    /// spaces and hyphens are accepted in place of underscores.
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_uppercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|d| d.as_str() == key)
    }

    /// Standards applicable to this discipline, in catalog order
    pub fn standards(&self) -> &'static [&'static str] {
        CATALOG
            .iter()
            .find(|(d, _)| d == self)
            .map(|(_, standards)| *standards)
            .unwrap_or(&[])
    }

    /// Whether `standard` belongs to this discipline's set
    pub fn covers(&self, standard: &str) -> bool {
        self.standards().iter().any(|s| *s == standard)
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered catalog keys
pub fn list_disciplines() -> Vec<&'static str> {
    CATALOG.iter().map(|(d, _)| d.as_str()).collect()
}

/// Standards for a discipline key; empty when the key is unknown
pub fn list_standards(discipline: &str) -> &'static [&'static str] {
    Discipline::parse(discipline)
        .map(|d| d.standards())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_discipline_has_standards() {
        for key in list_disciplines() {
            let standards = list_standards(key);
            assert!(!standards.is_empty(), "{} should have standards", key);
            assert!((2..=3).contains(&standards.len()));
        }
    }

    #[test]
    fn test_catalog_order() {
        assert_eq!(
            list_disciplines(),
            vec![
                "MECHANICAL",
                "WELDING_STRUCTURE",
                "CORROSION_COATINGS",
                "ELECTRICAL_POWER",
                "SAFETY_HSE"
            ]
        );
        assert_eq!(list_standards("MECHANICAL")[0], "API 653");
    }

    #[test]
    fn test_unknown_discipline_is_empty() {
        assert!(list_standards("PLUMBING").is_empty());
        assert!(list_standards("").is_empty());
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!(Discipline::parse(" mechanical "), Some(Discipline::Mechanical));
        assert_eq!(Discipline::parse("safety-hse"), Some(Discipline::SafetyHse));
        assert_eq!(Discipline::parse("welding structure"), Some(Discipline::WeldingStructure));
        assert_eq!(Discipline::parse("nope"), None);
    }

    #[test]
    fn test_covers() {
        assert!(Discipline::ElectricalPower.covers("IEEE 43"));
        assert!(!Discipline::ElectricalPower.covers("API 653"));
    }
}
