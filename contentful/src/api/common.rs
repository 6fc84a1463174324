//! Types shared by every Content Management API entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";
pub const VERSION_HEADER: &str = "X-Contentful-Version";
pub const ORGANIZATION_HEADER: &str = "X-Contentful-Organization";
pub const RATE_LIMIT_RESET_HEADER: &str = "X-Contentful-RateLimit-Reset";

/// Metadata envelope attached to every entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sys_type: Option<String>,
    #[serde(default)]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_version: Option<i64>,
}

impl Sys {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Id of the owning space, empty if the response carried no space link
    pub fn space_id(&self) -> &str {
        self.space.as_ref().map_or("", |link| link.sys.id.as_str())
    }
}

/// Reference to another entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub sys: LinkSys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSys {
    pub id: String,
    #[serde(rename = "type")]
    pub sys_type: String,
    pub link_type: String,
}

impl Link {
    pub fn new(link_type: &str, id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                id: id.into(),
                sys_type: "Link".to_string(),
                link_type: link_type.to_string(),
            },
        }
    }
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub sys: ErrorSys,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorSys {
    pub id: String,
}

/// Escape a single path segment such as a space id or locale code
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Path of a collection inside a space, e.g. `/spaces/{space}/assets`
pub fn space_path(space_id: &str, collection: &str) -> String {
    format!("/spaces/{}/{}", segment(space_id), collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sys_reads_publish_and_archive_markers() {
        let sys: Sys = serde_json::from_str(
            r#"{
                "id": "a1",
                "type": "Asset",
                "version": 5,
                "space": {"sys": {"id": "space1", "type": "Link", "linkType": "Space"}},
                "publishedAt": "2024-03-01T10:00:00.000Z",
                "publishedVersion": 4
            }"#,
        )
        .unwrap();

        assert_eq!(sys.id, "a1");
        assert_eq!(sys.version, 5);
        assert_eq!(sys.space_id(), "space1");
        assert!(sys.is_published());
        assert!(!sys.is_archived());
        assert_eq!(sys.published_version, Some(4));
    }

    #[test]
    fn sys_without_space_has_empty_space_id() {
        assert_eq!(Sys::with_id("x").space_id(), "");
    }

    #[test]
    fn link_serializes_with_link_type() {
        let json = serde_json::to_value(Link::new("Upload", "up1")).unwrap();
        assert_eq!(json["sys"]["type"], "Link");
        assert_eq!(json["sys"]["linkType"], "Upload");
        assert_eq!(json["sys"]["id"], "up1");
    }

    #[test]
    fn path_segments_are_escaped() {
        assert_eq!(space_path("my space", "assets"), "/spaces/my%20space/assets");
    }
}
