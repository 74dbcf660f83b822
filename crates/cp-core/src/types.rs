//! Core type definitions for Cleanplaats
//!
//! The sort-mode table maps the user-facing presets onto the
//! `sortBy`/`sortOrder` pair understood by the marketplace search protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Sort Modes
// =============================================================================

/// Sort preset chosen in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Site default ordering ("best match")
    #[default]
    Standard,
    DateNewOld,
    DateOldNew,
    PriceLowHigh,
    PriceHighLow,
    Distance,
}

impl SortMode {
    /// All sort modes in panel order.
    pub const ALL: [SortMode; 6] = [
        SortMode::Standard,
        SortMode::DateNewOld,
        SortMode::DateOldNew,
        SortMode::PriceLowHigh,
        SortMode::PriceHighLow,
        SortMode::Distance,
    ];

    /// Parse from the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "date_new_old" => Some(Self::DateNewOld),
            "date_old_new" => Some(Self::DateOldNew),
            "price_low_high" => Some(Self::PriceLowHigh),
            "price_high_low" => Some(Self::PriceHighLow),
            "distance" => Some(Self::Distance),
            _ => None,
        }
    }

    /// Persisted string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::DateNewOld => "date_new_old",
            Self::DateOldNew => "date_old_new",
            Self::PriceLowHigh => "price_low_high",
            Self::PriceHighLow => "price_high_low",
            Self::Distance => "distance",
        }
    }

    /// Dutch label shown in the settings panel.
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standaard",
            Self::DateNewOld => "Datum (nieuw-oud)",
            Self::DateOldNew => "Datum (oud-nieuw)",
            Self::PriceLowHigh => "Prijs (laag-hoog)",
            Self::PriceHighLow => "Prijs (hoog-laag)",
            Self::Distance => "Afstand",
        }
    }

    /// Look up the table entry for this mode.
    #[inline]
    pub fn keys(self) -> SortKeys {
        SORT_MODES[self as usize].1
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort key understood by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortBy {
    Optimized,
    SortIndex,
    Price,
    Location,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimized => "OPTIMIZED",
            Self::SortIndex => "SORT_INDEX",
            Self::Price => "PRICE",
            Self::Location => "LOCATION",
        }
    }
}

/// Sort direction understood by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Increasing,
    Decreasing,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "INCREASING",
            Self::Decreasing => "DECREASING",
        }
    }
}

/// A `(sortBy, sortOrder)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKeys {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// Fixed mapping from sort preset to marketplace keys.
/// Indexed by `SortMode as usize`.
pub const SORT_MODES: [(SortMode, SortKeys); 6] = [
    (SortMode::Standard, SortKeys { sort_by: SortBy::Optimized, sort_order: SortOrder::Decreasing }),
    (SortMode::DateNewOld, SortKeys { sort_by: SortBy::SortIndex, sort_order: SortOrder::Decreasing }),
    (SortMode::DateOldNew, SortKeys { sort_by: SortBy::SortIndex, sort_order: SortOrder::Increasing }),
    (SortMode::PriceLowHigh, SortKeys { sort_by: SortBy::Price, sort_order: SortOrder::Increasing }),
    (SortMode::PriceHighLow, SortKeys { sort_by: SortBy::Price, sort_order: SortOrder::Decreasing }),
    (SortMode::Distance, SortKeys { sort_by: SortBy::Location, sort_order: SortOrder::Increasing }),
];

/// Whether a raw `sortBy` value is one this extension could have written.
pub fn is_known_sort_by(value: &str) -> bool {
    SORT_MODES.iter().any(|(_, keys)| keys.sort_by.as_str() == value)
}

// =============================================================================
// Hide Reasons
// =============================================================================

/// Why a listing was hidden. Stored as the hidden-marker value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HideReason {
    TopAd,
    Dagtopper,
    Promoted,
    OpvalSticker,
    BlacklistedSeller,
    BlacklistedTerm,
}

impl HideReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopAd => "top-ad",
            Self::Dagtopper => "dagtopper",
            Self::Promoted => "promoted",
            Self::OpvalSticker => "opval-sticker",
            Self::BlacklistedSeller => "blacklisted-seller",
            Self::BlacklistedTerm => "blacklisted-term",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "top-ad" => Some(Self::TopAd),
            "dagtopper" => Some(Self::Dagtopper),
            "promoted" => Some(Self::Promoted),
            "opval-sticker" => Some(Self::OpvalSticker),
            "blacklisted-seller" => Some(Self::BlacklistedSeller),
            "blacklisted-term" => Some(Self::BlacklistedTerm),
            _ => None,
        }
    }
}

// =============================================================================
// Filter Categories
// =============================================================================

bitflags::bitflags! {
    /// Optional listing filters, one bit per panel toggle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FilterSet: u8 {
        /// "Topadvertentie" priority label
        const TOP_ADS = 1 << 0;
        /// "Dagtopper" priority label
        const DAGTOPPERS = 1 << 1;
        /// Company listings with a "Bezoek website" link
        const PROMOTED = 1 << 2;
        /// Eye-catching sticker listings
        const OPVAL_STICKERS = 1 << 3;

        const ALL = Self::TOP_ADS.bits()
            | Self::DAGTOPPERS.bits()
            | Self::PROMOTED.bits()
            | Self::OPVAL_STICKERS.bits();
    }
}
