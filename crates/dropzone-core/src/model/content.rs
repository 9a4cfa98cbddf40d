//! Content-type tagging and the type → presentation/action mapping table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed set of drop content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Private document download.
    Document,
    /// Cheat sheet download.
    Cheatsheet,
    /// Repository reachable through an external link.
    Repository,
    /// Anything the service labels with an unknown code.
    Other,
}

/// Actions a content type allows a view to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermittedActions {
    /// A file download may be requested.
    pub download: bool,
    /// An external link may be opened.
    pub external_open: bool,
}

/// Presentation and action entry for one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentProfile {
    /// Short glyph shown beside the drop.
    pub icon: &'static str,
    /// Human-readable type label.
    pub label: &'static str,
    /// Actions the type allows.
    pub actions: PermittedActions,
}

const DOCUMENT: ContentProfile = ContentProfile {
    icon: "📄",
    label: "Private Document",
    actions: PermittedActions {
        download: true,
        external_open: false,
    },
};

const CHEATSHEET: ContentProfile = ContentProfile {
    icon: "📋",
    label: "Cheat Sheet",
    actions: PermittedActions {
        download: true,
        external_open: false,
    },
};

const REPOSITORY: ContentProfile = ContentProfile {
    icon: "📦",
    label: "GitHub Repository",
    actions: PermittedActions {
        download: false,
        external_open: true,
    },
};

const OTHER: ContentProfile = ContentProfile {
    icon: "📁",
    label: "Resource",
    actions: PermittedActions {
        download: false,
        external_open: false,
    },
};

impl ContentType {
    /// Parse the service's wire code. Unknown codes map to [`ContentType::Other`].
    #[must_use]
    pub fn from_wire(code: &str) -> Self {
        match code.trim() {
            "doc" | "document" => Self::Document,
            "cheatsheet" => Self::Cheatsheet,
            "repo" | "repository" => Self::Repository,
            _ => Self::Other,
        }
    }

    /// Wire code used by the service.
    #[must_use]
    pub const fn wire_code(self) -> &'static str {
        match self {
            Self::Document => "doc",
            Self::Cheatsheet => "cheatsheet",
            Self::Repository => "repo",
            Self::Other => "other",
        }
    }

    /// Mapping-table entry for this type.
    #[must_use]
    pub const fn profile(self) -> &'static ContentProfile {
        match self {
            Self::Document => &DOCUMENT,
            Self::Cheatsheet => &CHEATSHEET,
            Self::Repository => &REPOSITORY,
            Self::Other => &OTHER,
        }
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_code())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&code))
    }
}
