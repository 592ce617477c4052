// ============================================================================
// squish-core/src/encoding/ladder.rs
// ============================================================================
//
// QUALITY LADDER: Ordered Table of Encoding Presets
//
// The ladder is a fixed, process-wide table of five presets ordered from the
// highest visual quality to the lowest. Callers cap the search with a
// maximum tier; the ladder is then the sub-sequence from that tier down to
// the last entry. Along the table scale, frame rate and bitrate all strictly
// decrease.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named quality tiers, highest quality first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Ultra,
    High,
    Medium,
    Low,
    Minimum,
}

impl QualityTier {
    /// All tiers in ladder order.
    pub const ALL: [QualityTier; 5] = [
        QualityTier::Ultra,
        QualityTier::High,
        QualityTier::Medium,
        QualityTier::Low,
        QualityTier::Minimum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Ultra => "ultra",
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
            QualityTier::Minimum => "minimum",
        }
    }

    /// Parses a tier name, falling back to `High` for unknown names.
    pub fn parse_or_default(name: &str) -> QualityTier {
        name.parse().unwrap_or_else(|_| {
            log::warn!("Unknown quality tier '{}', starting the ladder at 'high'", name);
            QualityTier::High
        })
    }

    /// The preset for this tier.
    pub fn preset(self) -> &'static QualityPreset {
        &LADDER[self as usize]
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ultra" => Ok(QualityTier::Ultra),
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            "minimum" => Ok(QualityTier::Minimum),
            other => Err(format!("unknown quality tier '{other}'")),
        }
    }
}

/// One encoding preset: a scale factor applied to the native resolution, a
/// sampling frame rate and a target bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityPreset {
    pub name: QualityTier,
    /// Fraction of the native resolution, within (0, 1]
    pub scale: f64,
    pub frame_rate: u32,
    pub bitrate_kbps: u32,
}

/// The ladder, highest quality first. Indexed by `QualityTier as usize`.
pub static LADDER: [QualityPreset; 5] = [
    QualityPreset { name: QualityTier::Ultra, scale: 1.0, frame_rate: 30, bitrate_kbps: 4000 },
    QualityPreset { name: QualityTier::High, scale: 0.75, frame_rate: 25, bitrate_kbps: 2500 },
    QualityPreset { name: QualityTier::Medium, scale: 0.5, frame_rate: 24, bitrate_kbps: 1200 },
    QualityPreset { name: QualityTier::Low, scale: 0.4, frame_rate: 20, bitrate_kbps: 700 },
    QualityPreset { name: QualityTier::Minimum, scale: 0.3, frame_rate: 15, bitrate_kbps: 400 },
];

/// Presets from `max_quality` down to the lowest tier, highest quality first.
pub fn levels_for(max_quality: QualityTier) -> &'static [QualityPreset] {
    &LADDER[max_quality as usize..]
}

/// Like [`levels_for`], but takes a tier name. Unknown names start at `high`.
pub fn levels_for_name(max_quality: &str) -> &'static [QualityPreset] {
    levels_for(QualityTier::parse_or_default(max_quality))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_tier() {
        for tier in QualityTier::ALL {
            assert_eq!(tier.preset().name, tier);
        }
    }

    #[test]
    fn test_ladder_strictly_decreases() {
        for pair in LADDER.windows(2) {
            assert!(pair[0].scale > pair[1].scale);
            assert!(pair[0].frame_rate > pair[1].frame_rate);
            assert!(pair[0].bitrate_kbps > pair[1].bitrate_kbps);
        }
        for preset in &LADDER {
            assert!(preset.scale > 0.0 && preset.scale <= 1.0);
            assert!(preset.frame_rate > 0 && preset.bitrate_kbps > 0);
        }
    }

    #[test]
    fn test_levels_for_slices_from_ceiling() {
        let high = levels_for(QualityTier::High);
        assert_eq!(high.len(), 4);
        assert_eq!(high[0].name, QualityTier::High);
        assert_eq!(high.last().map(|p| p.name), Some(QualityTier::Minimum));

        assert_eq!(levels_for(QualityTier::Ultra).len(), 5);
        assert_eq!(levels_for(QualityTier::Minimum).len(), 1);
    }

    #[test]
    fn test_every_sub_ladder_is_monotonic() {
        for tier in QualityTier::ALL {
            let ladder = levels_for(tier);
            for i in 0..ladder.len() {
                for j in i + 1..ladder.len() {
                    assert!(ladder[i].bitrate_kbps >= ladder[j].bitrate_kbps);
                    assert!(ladder[i].scale >= ladder[j].scale);
                }
            }
        }
    }

    #[test]
    fn test_unknown_name_starts_at_high() {
        assert_eq!(levels_for_name("LOW")[0].name, QualityTier::Low);
        assert_eq!(levels_for_name("cinematic")[0].name, QualityTier::High);
        assert_eq!(levels_for_name("")[0].name, QualityTier::High);
    }
}
