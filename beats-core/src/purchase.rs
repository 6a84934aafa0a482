//! Checkout handoff and purchase history.

use serde::{Deserialize, Serialize};

use beats_common::ItemKind;

use crate::client::{id_string, opt_id_string};

/// Deliverable requested at checkout. The server prices each tier; the
/// client only names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Mp3,
    Wav,
    Trackout,
    Exclusive,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Mp3 => "mp3",
            FileType::Wav => "wav",
            FileType::Trackout => "trackout",
            FileType::Exclusive => "exclusive",
        }
    }
}

/// What to buy and where the processor should send the user afterwards.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub kind: ItemKind,
    pub item_id: String,
    pub file_type: FileType,
    pub discount_code: Option<String>,
    pub callback_url: String,
}

impl PurchaseRequest {
    pub fn new(kind: ItemKind, item_id: impl Into<String>, file_type: FileType) -> Self {
        Self {
            kind,
            item_id: item_id.into(),
            file_type,
            discount_code: None,
            callback_url: String::new(),
        }
    }

    pub fn with_discount(mut self, code: impl Into<String>) -> Self {
        self.discount_code = Some(code.into());
        self
    }

    pub fn with_callback(mut self, url: impl Into<String>) -> Self {
        self.callback_url = url.into();
        self
    }
}

/// A checkout session opened with the payment processor. The user must be
/// sent to `payment_url` to pay; `reference` identifies the transaction
/// on return.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseSession {
    #[serde(default)]
    pub payment_url: String,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub reference: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub file_type: Option<FileType>,
    #[serde(default)]
    pub amount_usd: f64,
    #[serde(default)]
    pub amount_kes: Option<f64>,
    #[serde(default)]
    pub currency: String,
}

/// A completed purchase as listed in the user's history. Carries enough to
/// render the row without re-fetching the catalog item, which may have
/// been delisted since.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub item_type: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub item_id: Option<String>,
    #[serde(default)]
    pub item_title: String,
    #[serde(default)]
    pub item_cover: Option<String>,
    #[serde(default)]
    pub producer_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<FileType>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub purchased_at: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl PurchaseRecord {
    pub fn kind(&self) -> Option<ItemKind> {
        ItemKind::parse(&self.item_type)
    }
}
