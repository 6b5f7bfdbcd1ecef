// Closed sound identifiers for the asset registry
//
// The original design keyed decoded buffers by free-form strings; a typo'd
// key would silently miss at runtime. These enums make every lookup a
// compile-time-checked member of a closed set.

use std::path::Path;

use crate::config::AssetPaths;

/// A one-shot cue played at a phase boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    Inhale,
    Exhale,
    Hold,
    Finish,
}

impl CueKind {
    /// The registry slot holding this cue's decoded samples.
    pub fn asset(self) -> SoundAsset {
        match self {
            CueKind::Inhale => SoundAsset::Inhale,
            CueKind::Exhale => SoundAsset::Exhale,
            CueKind::Hold => SoundAsset::Hold,
            CueKind::Finish => SoundAsset::Finish,
        }
    }
}

/// Every sound the engine can load: the four cues plus the ambience loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundAsset {
    Inhale,
    Exhale,
    Hold,
    Finish,
    Ambience,
}

impl SoundAsset {
    /// All assets, in registry-slot order.
    pub const ALL: [SoundAsset; 5] = [
        SoundAsset::Inhale,
        SoundAsset::Exhale,
        SoundAsset::Hold,
        SoundAsset::Finish,
        SoundAsset::Ambience,
    ];

    /// Registry slot index.
    pub fn index(self) -> usize {
        match self {
            SoundAsset::Inhale => 0,
            SoundAsset::Exhale => 1,
            SoundAsset::Hold => 2,
            SoundAsset::Finish => 3,
            SoundAsset::Ambience => 4,
        }
    }

    /// Human-readable name for logs.
    pub fn label(self) -> &'static str {
        match self {
            SoundAsset::Inhale => "inhale",
            SoundAsset::Exhale => "exhale",
            SoundAsset::Hold => "hold",
            SoundAsset::Finish => "finish",
            SoundAsset::Ambience => "ambience",
        }
    }

    /// Resolve this asset's configured file location.
    pub fn path<'a>(self, paths: &'a AssetPaths) -> &'a Path {
        match self {
            SoundAsset::Inhale => &paths.inhale,
            SoundAsset::Exhale => &paths.exhale,
            SoundAsset::Hold => &paths.hold,
            SoundAsset::Finish => &paths.finish,
            SoundAsset::Ambience => &paths.ambience,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_distinct_and_dense() {
        let mut seen = [false; SoundAsset::ALL.len()];
        for asset in SoundAsset::ALL {
            let idx = asset.index();
            assert!(idx < SoundAsset::ALL.len());
            assert!(!seen[idx], "duplicate index for {:?}", asset);
            seen[idx] = true;
        }
    }

    #[test]
    fn test_cue_to_asset_mapping() {
        assert_eq!(CueKind::Inhale.asset(), SoundAsset::Inhale);
        assert_eq!(CueKind::Exhale.asset(), SoundAsset::Exhale);
        assert_eq!(CueKind::Hold.asset(), SoundAsset::Hold);
        assert_eq!(CueKind::Finish.asset(), SoundAsset::Finish);
    }

    #[test]
    fn test_asset_paths_resolve() {
        let paths = AssetPaths::default();
        assert!(SoundAsset::Hold.path(&paths).ends_with("hold.wav"));
        assert!(SoundAsset::Ambience.path(&paths).ends_with("ambience.wav"));
    }
}
