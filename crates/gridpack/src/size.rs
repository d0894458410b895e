//! Widget size classes and their footprint/weight table.
//!
//! Every size maps to a footprint in cells, a weight counted against the
//! grid's score budget, and an [`OriginRule`] restricting which top-left
//! cells are legal for that size.

use serde::{Deserialize, Serialize};

use crate::{CellPos, Footprint};

/// The fixed enumeration of widget sizes.
///
/// Both naming schemes in use are accepted on input (`tiny`/`verySmall`,
/// `big`/`large`); output always uses the first name of each pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetSize {
    #[serde(alias = "tiny", alias = "very_small")]
    VerySmall,
    Small,
    Medium,
    #[serde(alias = "large")]
    Big,
}

impl WidgetSize {
    /// All sizes, smallest first.
    pub const ALL: [Self; 4] = [Self::VerySmall, Self::Small, Self::Medium, Self::Big];

    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VerySmall => "verySmall",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Big => "big",
        }
    }
}

impl std::fmt::Display for WidgetSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which top-left cells a size may occupy, beyond plain bounding-box fit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OriginRule {
    /// Any in-bounds origin.
    #[default]
    Any,
    /// Origin row must be a multiple of `rows` and column a multiple of `cols`.
    Stride { rows: u16, cols: u16 },
    /// Origin must be one of the listed cells.
    Only { origins: Vec<CellPos> },
}

impl OriginRule {
    /// Whether `origin` satisfies the rule.
    #[must_use]
    pub fn allows(&self, origin: CellPos) -> bool {
        match self {
            Self::Any => true,
            Self::Stride { rows, cols } => {
                *rows != 0 && *cols != 0 && origin.row % rows == 0 && origin.col % cols == 0
            }
            Self::Only { origins } => origins.contains(&origin),
        }
    }
}

/// Footprint, weight and origin rule for one size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSpec {
    pub footprint: Footprint,
    pub weight: u32,
    #[serde(default)]
    pub origin: OriginRule,
}

impl SizeSpec {
    /// A size with no origin restriction.
    #[must_use]
    pub const fn new(width: u16, height: u16, weight: u32) -> Self {
        Self {
            footprint: Footprint::new(width, height),
            weight,
            origin: OriginRule::Any,
        }
    }

    /// Replace the origin rule.
    #[must_use]
    pub fn with_origin(mut self, origin: OriginRule) -> Self {
        self.origin = origin;
        self
    }
}

/// Size-to-footprint/weight table.
///
/// One entry per [`WidgetSize`], so lookups are total: an unknown size key
/// cannot be expressed once the table is constructed or deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeTable {
    #[serde(alias = "tiny")]
    pub very_small: SizeSpec,
    pub small: SizeSpec,
    pub medium: SizeSpec,
    #[serde(alias = "large")]
    pub big: SizeSpec,
}

impl SizeTable {
    /// Single-plane table: 1×1/10, 1×2/20, 2×2/40, 2×4/80, no origin rules.
    #[must_use]
    pub fn single_plane() -> Self {
        Self {
            very_small: SizeSpec::new(1, 1, 10),
            small: SizeSpec::new(1, 2, 20),
            medium: SizeSpec::new(2, 2, 40),
            big: SizeSpec::new(2, 4, 80),
        }
    }

    /// Multi-plane table: same footprints, with slot rules.
    ///
    /// `small` starts on even rows, `medium` at row 0 or 2 of column 0, and
    /// `big` only at the grid origin.
    #[must_use]
    pub fn multi_plane() -> Self {
        let base = Self::single_plane();
        Self {
            very_small: base.very_small,
            small: base
                .small
                .with_origin(OriginRule::Stride { rows: 2, cols: 1 }),
            medium: base.medium.with_origin(OriginRule::Only {
                origins: vec![CellPos::new(0, 0), CellPos::new(2, 0)],
            }),
            big: base.big.with_origin(OriginRule::Only {
                origins: vec![CellPos::ORIGIN],
            }),
        }
    }

    /// Look up the spec for a size.
    #[must_use]
    pub const fn spec(&self, size: WidgetSize) -> &SizeSpec {
        match size {
            WidgetSize::VerySmall => &self.very_small,
            WidgetSize::Small => &self.small,
            WidgetSize::Medium => &self.medium,
            WidgetSize::Big => &self.big,
        }
    }

    #[must_use]
    pub const fn footprint(&self, size: WidgetSize) -> Footprint {
        self.spec(size).footprint
    }

    #[must_use]
    pub const fn weight(&self, size: WidgetSize) -> u32 {
        self.spec(size).weight
    }

    /// Iterate `(size, spec)` pairs, smallest first.
    pub fn iter(&self) -> impl Iterator<Item = (WidgetSize, &SizeSpec)> + '_ {
        WidgetSize::ALL.into_iter().map(|size| (size, self.spec(size)))
    }
}

impl Default for SizeTable {
    fn default() -> Self {
        Self::single_plane()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_plane_table_matches_reference_values() {
        let table = SizeTable::single_plane();
        assert_eq!(table.footprint(WidgetSize::VerySmall), Footprint::new(1, 1));
        assert_eq!(table.footprint(WidgetSize::Small), Footprint::new(1, 2));
        assert_eq!(table.footprint(WidgetSize::Medium), Footprint::new(2, 2));
        assert_eq!(table.footprint(WidgetSize::Big), Footprint::new(2, 4));
        let weights: Vec<u32> = table.iter().map(|(_, spec)| spec.weight).collect();
        assert_eq!(weights, vec![10, 20, 40, 80]);
    }

    #[test]
    fn stride_rule_checks_both_axes() {
        let rule = OriginRule::Stride { rows: 2, cols: 1 };
        assert!(rule.allows(CellPos::new(0, 1)));
        assert!(rule.allows(CellPos::new(2, 0)));
        assert!(!rule.allows(CellPos::new(1, 0)));
        assert!(!OriginRule::Stride { rows: 0, cols: 1 }.allows(CellPos::ORIGIN));
    }

    #[test]
    fn multi_plane_rules() {
        let table = SizeTable::multi_plane();
        assert!(table.spec(WidgetSize::VerySmall).origin.allows(CellPos::new(3, 1)));
        assert!(!table.spec(WidgetSize::Small).origin.allows(CellPos::new(1, 0)));
        assert!(table.spec(WidgetSize::Medium).origin.allows(CellPos::new(2, 0)));
        assert!(!table.spec(WidgetSize::Medium).origin.allows(CellPos::new(1, 0)));
        assert!(!table.spec(WidgetSize::Big).origin.allows(CellPos::new(2, 0)));
    }

    #[test]
    fn size_aliases_deserialize() {
        let tiny: WidgetSize = serde_json::from_str("\"tiny\"").unwrap();
        let large: WidgetSize = serde_json::from_str("\"large\"").unwrap();
        assert_eq!(tiny, WidgetSize::VerySmall);
        assert_eq!(large, WidgetSize::Big);
        assert_eq!(
            serde_json::to_string(&WidgetSize::VerySmall).unwrap(),
            "\"verySmall\""
        );
    }

    #[test]
    fn unknown_size_is_rejected_by_serde() {
        assert!(serde_json::from_str::<WidgetSize>("\"huge\"").is_err());
    }

    #[test]
    fn origin_rule_serde_shape() {
        let rule = OriginRule::Stride { rows: 2, cols: 1 };
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"kind":"stride","rows":2,"cols":1}"#);
        let spec: SizeSpec =
            serde_json::from_str(r#"{"footprint":{"width":1,"height":1},"weight":10}"#).unwrap();
        assert_eq!(spec.origin, OriginRule::Any);
    }
}
