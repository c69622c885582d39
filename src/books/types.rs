use crate::catalog::RemoteItem;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const NO_DESCRIPTION: &str = "No description available";

/// A book as shown to the user. Built from a remote item or a cache row and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
  pub id: String,
  pub title: String,
  pub author: String,
  pub thumbnail_url: Option<String>,
  pub description: String,
}

impl Book {
  /// Map a remote catalog item, filling in placeholders for missing fields.
  pub fn from_remote(item: RemoteItem) -> Self {
    let title = if item.title.trim().is_empty() {
      UNKNOWN_TITLE.to_string()
    } else {
      item.title
    };

    let authors: Vec<&str> = item
      .authors
      .iter()
      .map(|a| a.trim())
      .filter(|a| !a.is_empty())
      .collect();
    let author = if authors.is_empty() {
      UNKNOWN_AUTHOR.to_string()
    } else {
      authors.join(", ")
    };

    let description = item
      .description
      .filter(|d| !d.trim().is_empty())
      .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    Self {
      id: item.id,
      title,
      author,
      thumbnail_url: item.thumbnail_url.as_deref().map(secure_thumbnail),
      description,
    }
  }
}

/// Upgrade an `http://` image link to `https://`. Idempotent.
pub fn secure_thumbnail(url: &str) -> String {
  match url.get(..7) {
    Some(scheme) if scheme.eq_ignore_ascii_case("http://") => format!("https://{}", &url[7..]),
    _ => url.to_string(),
  }
}
