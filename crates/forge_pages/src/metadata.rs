//! Page metadata and page kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The device/layout class a page is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Mobile-first page.
    #[default]
    H5,
    /// Management console layout.
    Admin,
    /// Desktop layout.
    Pc,
}

impl PageKind {
    /// Wire name of the kind (`h5`, `admin`, `pc`).
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::H5 => "h5",
            PageKind::Admin => "admin",
            PageKind::Pc => "pc",
        }
    }

    /// Title used when neither the caller nor the model provides one.
    pub fn default_title(&self) -> &'static str {
        match self {
            PageKind::H5 => "Mobile Page",
            PageKind::Admin => "Admin Console",
            PageKind::Pc => "Desktop Page",
        }
    }

    /// Human label used in generated descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            PageKind::H5 => "mobile",
            PageKind::Admin => "admin console",
            PageKind::Pc => "desktop",
        }
    }
}

impl std::str::FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h5" => Ok(PageKind::H5),
            "admin" => Ok(PageKind::Admin),
            "pc" => Ok(PageKind::Pc),
            other => Err(format!("unknown page kind: {other}")),
        }
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata record persisted as `page.json` next to the page files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetadata {
    pub id: String,
    pub title: String,
    #[serde(rename = "pageType")]
    pub kind: PageKind,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl PageMetadata {
    /// Create a fresh record with both timestamps set to now.
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: PageKind) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            created_at: now,
            updated_at: now,
            description: Some(format!("A generated {} page", kind.label())),
            tags: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [PageKind::H5, PageKind::Admin, PageKind::Pc] {
            let parsed: PageKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("desktop".parse::<PageKind>().is_err());
    }

    #[test]
    fn test_metadata_wire_field_names() {
        let meta = PageMetadata::new("page-1", "Landing", PageKind::Pc);
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["pageType"], "pc");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("tags").is_none());
    }

    #[test]
    fn test_default_titles() {
        assert_eq!(PageKind::H5.default_title(), "Mobile Page");
        assert_eq!(PageKind::Admin.default_title(), "Admin Console");
        assert_eq!(PageKind::Pc.default_title(), "Desktop Page");
    }
}
