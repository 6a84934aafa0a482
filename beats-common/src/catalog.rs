use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Kind of purchasable catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "beat")]
    Beat,
    #[serde(rename = "soundpack")]
    SoundPack,
}

impl ItemKind {
    /// Wire name used by the API (`item_type` fields).
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Beat => "beat",
            ItemKind::SoundPack => "soundpack",
        }
    }

    /// Parse a wire name. Unknown names return None rather than failing the
    /// surrounding record.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beat" => Some(ItemKind::Beat),
            "soundpack" => Some(ItemKind::SoundPack),
            _ => None,
        }
    }
}

/// The producer credited on a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Producer {
    pub name: String,
}

/// A purchasable beat or sound pack.
///
/// Text fields are never absent: the fetch layer coerces missing values to
/// empty strings so one malformed record cannot take down the whole view.
/// The `previewing` flag is UI-only state owned by [`crate::CatalogView`];
/// it is never persisted server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    pub genre: String,
    pub price: f64,
    /// Tempo in BPM. None for sound packs.
    pub bpm: Option<f64>,
    /// Number of sounds in a pack. None for beats.
    pub sound_count: Option<f64>,
    /// Musical key, e.g. "C# minor". Beats only.
    pub musical_key: Option<String>,
    pub preview_url: Option<String>,
    pub cover_url: Option<String>,
    pub producer: Option<Producer>,
    pub popularity: u32,
    pub created_at: DateTime<Utc>,
    pub previewing: bool,
}

impl CatalogItem {
    /// The secondary numeric attribute used for range filtering and tempo
    /// sorting: BPM for beats, sound count for packs.
    pub fn range_attr(&self) -> Option<f64> {
        match self.kind {
            ItemKind::Beat => self.bpm,
            ItemKind::SoundPack => self.sound_count,
        }
    }

    pub fn producer_name(&self) -> &str {
        self.producer.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }
}
