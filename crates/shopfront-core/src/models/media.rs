//! References to stored media (product images, avatars).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    /// Identifier in the media store, used for deletion.
    pub public_id: String,
    pub url: String,
    #[serde(default)]
    pub kind: MediaKind,
}
