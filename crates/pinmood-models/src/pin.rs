//! Pinterest account and pin models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A pin as returned by the Pinterest v5 API with
/// `fields=id,title,description,media`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Pin {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media block passed through untouched (image variants, video, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<serde_json::Value>,
}

/// One page of pins plus the cursor for the next page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PinPage {
    #[serde(default)]
    pub items: Vec<Pin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
}

impl PinPage {
    /// Cursor for the next page, if there is one.
    pub fn next_bookmark(&self) -> Option<&str> {
        self.bookmark.as_deref().filter(|b| !b.is_empty())
    }
}

/// Profile of the signed-in Pinterest user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct UserAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_without_bookmark_is_last() {
        let page: PinPage = serde_json::from_str(r#"{"items":[{"id":"1"}],"bookmark":null}"#).unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.next_bookmark().is_none());

        let page: PinPage = serde_json::from_str(r#"{"items":[],"bookmark":""}"#).unwrap();
        assert!(page.next_bookmark().is_none());
    }

    #[test]
    fn test_media_is_preserved() {
        let json = r#"{"id":"42","title":"Dusk","media":{"media_type":"image","images":{"600x":{"url":"https://i.pinimg.com/x.jpg"}}}}"#;
        let pin: Pin = serde_json::from_str(json).unwrap();
        assert_eq!(pin.title.as_deref(), Some("Dusk"));
        assert_eq!(pin.media.unwrap()["images"]["600x"]["url"], "https://i.pinimg.com/x.jpg");
    }
}
