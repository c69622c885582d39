//! Serde-deserializable types matching the Google Books volumes API.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs. The API sends
//! explicit `null` as freely as it omits keys, so every field is optional.

use serde::Deserialize;

use super::{RemoteItem, RemoteResult};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiVolumesResponse {
  #[serde(default)]
  pub total_items: Option<u64>,
  // Absent when the search matched nothing
  #[serde(default)]
  pub items: Option<Vec<ApiVolume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVolume {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub volume_info: Option<ApiVolumeInfo>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiVolumeInfo {
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub authors: Option<Vec<Option<String>>>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub image_links: Option<ApiImageLinks>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiImageLinks {
  #[serde(default)]
  pub thumbnail: Option<String>,
  #[serde(default)]
  pub small_thumbnail: Option<String>,
}

impl ApiVolume {
  pub fn into_item(self) -> RemoteItem {
    let info = self.volume_info.unwrap_or_default();
    let thumbnail_url = info.image_links.and_then(|links| {
      let present = |url: Option<String>| url.filter(|u| !u.is_empty());
      present(links.thumbnail).or_else(|| present(links.small_thumbnail))
    });

    RemoteItem {
      id: self.id.unwrap_or_default(),
      title: info.title.unwrap_or_default(),
      authors: info.authors.unwrap_or_default().into_iter().flatten().collect(),
      description: info.description,
      thumbnail_url,
    }
  }
}

impl From<ApiVolumesResponse> for RemoteResult {
  fn from(response: ApiVolumesResponse) -> Self {
    Self {
      total_items: response.total_items.unwrap_or_default(),
      items: response
        .items
        .unwrap_or_default()
        .into_iter()
        .map(ApiVolume::into_item)
        .collect(),
    }
  }
}
