//! HTTP client for the Beats by Baraju storefront API.
//!
//! All requests carry the configured timeout; authenticated endpoints fetch
//! a bearer token fresh per call from the injected [`TokenProvider`] and
//! fail with `Unauthenticated` before any traffic when none is present.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use beats_common::{CatalogItem, ItemKind, Producer};

use crate::auth::TokenProvider;
use crate::config::StoreConfig;
use crate::discounts::{Discount, DiscountValidation};
use crate::error::StoreError;
use crate::purchase::{PurchaseRecord, PurchaseRequest, PurchaseSession};

/// A server-side wishlist record linking the user to a catalog item.
/// The entry id is server-assigned and distinct from the item id; deletes
/// go by entry id, never item id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistEntry {
    pub id: String,
    pub kind: ItemKind,
    pub item_id: String,
}

/// Outcome of a wishlist add. `AlreadyExists` means the server had an entry
/// for this (type, id) pair already; the caller must re-fetch the
/// authoritative list since it has no local copy of that entry's id.
#[derive(Debug)]
pub enum WishlistAdd {
    Created(WishlistEntry),
    AlreadyExists,
}

pub struct StoreClient {
    api_url: String,
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

// -- Wire types (Deserialize only, defaults so one bad record cannot blank
// the catalog) --

#[derive(Debug, Deserialize)]
struct BeatDto {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    bpm: Option<f64>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    producer: Option<Producer>,
    #[serde(default)]
    popularity: Option<i64>,
    #[serde(default)]
    created_at: Option<String>,
}

impl BeatDto {
    fn into_item(self) -> CatalogItem {
        CatalogItem {
            id: self.id,
            kind: ItemKind::Beat,
            title: self.title,
            genre: self.genre,
            price: self.price,
            bpm: self.bpm,
            sound_count: None,
            musical_key: self.key,
            preview_url: self.preview_url,
            cover_url: self.cover_url,
            producer: self.producer,
            popularity: clamp_popularity(self.popularity),
            created_at: parse_timestamp_or_epoch(self.created_at.as_deref()),
            previewing: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SoundPackDto {
    #[serde(deserialize_with = "id_string")]
    id: String,
    // The server calls this field "name"; accept either spelling.
    #[serde(default, alias = "name")]
    title: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    price: f64,
    #[serde(default, alias = "sounds_count")]
    sound_count: Option<f64>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    producer: Option<Producer>,
    #[serde(default)]
    popularity: Option<i64>,
    #[serde(default)]
    created_at: Option<String>,
}

impl SoundPackDto {
    fn into_item(self) -> CatalogItem {
        CatalogItem {
            id: self.id,
            kind: ItemKind::SoundPack,
            title: self.title,
            genre: self.genre,
            price: self.price,
            bpm: None,
            sound_count: self.sound_count,
            musical_key: None,
            preview_url: self.preview_url,
            cover_url: self.cover_url,
            producer: self.producer,
            popularity: clamp_popularity(self.popularity),
            created_at: parse_timestamp_or_epoch(self.created_at.as_deref()),
            previewing: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WishlistEntryDto {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    item_type: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    item_id: Option<String>,
}

impl WishlistEntryDto {
    fn into_entry(self) -> Option<WishlistEntry> {
        Some(WishlistEntry {
            id: self.id,
            kind: ItemKind::parse(&self.item_type)?,
            item_id: self.item_id?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl StoreClient {
    pub fn new(config: StoreConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            http,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn bearer(&self) -> Result<String, StoreError> {
        self.tokens
            .bearer_token()
            .await
            .ok_or(StoreError::Unauthenticated)
    }

    /// Turn a non-2xx response into a `Server` error, reading the
    /// `{"error": ...}` body when there is one.
    async fn reject(resp: reqwest::Response) -> StoreError {
        let status = resp.status().as_u16();
        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error.or(b.message))
            .unwrap_or_default();
        StoreError::Server { status, message }
    }

    // -- Catalog --

    pub async fn fetch_beats(&self, genre: Option<&str>) -> Result<Vec<CatalogItem>, StoreError> {
        let path = match genre {
            Some(g) => format!("/beats?genre={}", urlencoding::encode(g)),
            None => "/beats".to_string(),
        };
        let resp = self.http.get(self.url(&path)).send().await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        let dtos: Vec<BeatDto> = resp.json().await?;
        debug!("fetched {} beats", dtos.len());
        Ok(dtos.into_iter().map(BeatDto::into_item).collect())
    }

    pub async fn fetch_sound_packs(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let resp = self.http.get(self.url("/soundpacks")).send().await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        let dtos: Vec<SoundPackDto> = resp.json().await?;
        debug!("fetched {} sound packs", dtos.len());
        Ok(dtos.into_iter().map(SoundPackDto::into_item).collect())
    }

    // -- Wishlist --

    /// Fetch the caller's wishlist. The server has answered both as a bare
    /// array and wrapped as `{"data": [...]}`; accept either shape.
    pub async fn fetch_wishlist(&self) -> Result<Vec<WishlistEntry>, StoreError> {
        let token = self.bearer().await?;
        let resp = self
            .http
            .get(self.url("/wishlist"))
            .bearer_auth(&token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        let value: serde_json::Value = resp.json().await?;
        parse_wishlist_payload(&value)
    }

    pub async fn add_wishlist(
        &self,
        kind: ItemKind,
        item_id: &str,
    ) -> Result<WishlistAdd, StoreError> {
        let token = self.bearer().await?;
        let resp = self
            .http
            .post(self.url("/wishlist"))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "item_type": kind.as_str(),
                "item_id": id_value(item_id),
            }))
            .send()
            .await?;
        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        parse_add_response(status, body)
    }

    /// Delete a wishlist entry by its server-assigned entry id.
    pub async fn remove_wishlist(&self, entry_id: &str) -> Result<(), StoreError> {
        let token = self.bearer().await?;
        let resp = self
            .http
            .delete(self.url(&format!("/wishlist/{}", urlencoding::encode(entry_id))))
            .bearer_auth(&token)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::reject(resp).await)
        }
    }

    // -- Discounts --

    pub async fn active_discounts(&self) -> Result<Vec<Discount>, StoreError> {
        let resp = self.http.get(self.url("/discounts/active")).send().await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        let discounts: Vec<Discount> = resp.json().await?;
        Ok(discounts)
    }

    /// Validate a discount code against a specific item. An invalid code is
    /// not an error: the server answers 400 with `{"valid": false, ...}`
    /// and that is returned as a (negative) validation result.
    pub async fn validate_discount(
        &self,
        code: &str,
        kind: ItemKind,
        item_id: &str,
    ) -> Result<DiscountValidation, StoreError> {
        let token = self.bearer().await?;
        let resp = self
            .http
            .post(self.url("/discounts/validate"))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "code": code,
                "item_type": kind.as_str(),
                "item_id": id_value(item_id),
            }))
            .send()
            .await?;
        let status = resp.status();
        let value: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        if value.get("valid").is_some() {
            return serde_json::from_value(value).map_err(|_| StoreError::Parse);
        }
        Err(StoreError::Server {
            status: status.as_u16(),
            message: body_message(&value).unwrap_or_default(),
        })
    }

    // -- Purchases --

    /// Initiate a purchase. On success the caller must redirect the user to
    /// [`PurchaseSession::payment_url`]; payment itself happens with the
    /// external processor. On failure nothing has been handed off and the
    /// caller stays where it is.
    pub async fn initiate_purchase(
        &self,
        request: &PurchaseRequest,
    ) -> Result<PurchaseSession, StoreError> {
        let token = self.bearer().await?;
        let mut body = serde_json::json!({
            "item_type": request.kind.as_str(),
            "item_id": id_value(&request.item_id),
            "file_type": request.file_type.as_str(),
            "callback_url": request.callback_url,
        });
        if let Some(code) = &request.discount_code {
            body["discount_code"] = serde_json::Value::from(code.as_str());
        }
        let resp = self
            .http
            .post(self.url("/purchase"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        let session: PurchaseSession = resp.json().await.map_err(|_| StoreError::Parse)?;
        info!(
            "purchase initiated for {} {} (reference {})",
            request.kind.as_str(),
            request.item_id,
            session.reference
        );
        Ok(session)
    }

    pub async fn purchase_history(&self) -> Result<Vec<PurchaseRecord>, StoreError> {
        let token = self.bearer().await?;
        let resp = self
            .http
            .get(self.url("/purchases/history"))
            .bearer_auth(&token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        let records: Vec<PurchaseRecord> = resp.json().await?;
        Ok(records)
    }
}

// -- Payload helpers (factored out for testability) --

fn parse_wishlist_payload(value: &serde_json::Value) -> Result<Vec<WishlistEntry>, StoreError> {
    let arr = value
        .get("data")
        .and_then(|d| d.as_array())
        .or_else(|| value.as_array())
        .ok_or(StoreError::Parse)?;

    let mut entries = Vec::new();
    for item in arr {
        let dto: WishlistEntryDto =
            serde_json::from_value(item.clone()).map_err(|_| StoreError::Parse)?;
        match dto.into_entry() {
            Some(entry) => entries.push(entry),
            None => warn!("skipping wishlist entry with unrecognized item type"),
        }
    }
    Ok(entries)
}

fn parse_add_response(
    status: reqwest::StatusCode,
    body: serde_json::Value,
) -> Result<WishlistAdd, StoreError> {
    let message = body_message(&body).unwrap_or_default();
    // The server reports a duplicate either as 200 + message or as an error
    // body with the same text. Both mean: reconcile, don't fail.
    if message.eq_ignore_ascii_case("item already in wishlist") {
        return Ok(WishlistAdd::AlreadyExists);
    }
    if !status.is_success() {
        return Err(StoreError::Server {
            status: status.as_u16(),
            message,
        });
    }
    let entry_val = body.get("data").cloned().unwrap_or(body);
    let dto: WishlistEntryDto =
        serde_json::from_value(entry_val).map_err(|_| StoreError::Parse)?;
    dto.into_entry()
        .map(WishlistAdd::Created)
        .ok_or(StoreError::Parse)
}

fn body_message(value: &serde_json::Value) -> Option<String> {
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

/// Item ids are opaque: numeric ids go over the wire as numbers, anything
/// else as a string.
fn id_value(id: &str) -> serde_json::Value {
    match id.parse::<i64>() {
        Ok(n) => serde_json::Value::from(n),
        Err(_) => serde_json::Value::from(id),
    }
}

fn clamp_popularity(raw: Option<i64>) -> u32 {
    raw.unwrap_or(0).clamp(0, u32::MAX as i64) as u32
}

/// Parse a server timestamp: RFC 3339, or the server's naive ISO format
/// (no offset, assumed UTC). Unparseable values fall back to the epoch so
/// a bad record sorts last under "newest" instead of failing the fetch.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

fn parse_timestamp_or_epoch(s: Option<&str>) -> DateTime<Utc> {
    s.and_then(parse_timestamp).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Accept an id serialized as either a JSON number or a string.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(i64),
        Str(String),
    }
    Ok(match Id::deserialize(d)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

pub(crate) fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(i64),
        Str(String),
    }
    Ok(Option::<Id>::deserialize(d)?.map(|id| match id {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    }))
}
