//! Catalog items.

use serde::{Deserialize, Serialize};

use super::ItemId;

/// A single candidate (a track) as delivered by the catalog source.
///
/// Identity is `id`; every other field is display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub album_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, album_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image: String::new(),
            album_name: album_name.into(),
            preview_url: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}
