//! Profile document types
//!
//! These mirror the documents held by the remote store. Field names
//! serialize in camelCase to stay compatible with existing documents.

use serde::{Deserialize, Serialize};

/// An authenticated account, as handed over by the auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Account {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Category of a saved place
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlaceKind {
    Home,
    Work,
    School,
    Other,
}

/// UI theme preference stored on the profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// A user's saved place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePlace {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PlaceKind,
    pub address: String,
}

/// The full profile document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: String,
    /// Noise tolerance in dB-equivalent units, always within [30, 100]
    pub noise_sensitivity: i32,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub favorites: Vec<FavoritePlace>,
}

impl UserProfile {
    /// The profile a brand-new user starts with
    pub fn default_for(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            email: None,
            display_name: "Traveler".to_string(),
            noise_sensitivity: 70,
            age: String::new(),
            theme: Theme::Light,
            favorites: Self::default_favorites(),
        }
    }

    /// Placeholder favorites seeded onto new profiles
    pub fn default_favorites() -> Vec<FavoritePlace> {
        vec![
            FavoritePlace {
                id: "1".to_string(),
                name: "Home".to_string(),
                kind: PlaceKind::Home,
                address: "Set your home address".to_string(),
            },
            FavoritePlace {
                id: "2".to_string(),
                name: "Work".to_string(),
                kind: PlaceKind::Work,
                address: "Set your work address".to_string(),
            },
        ]
    }
}

/// Partial profile update
///
/// Absent fields leave the stored document untouched. This is the payload
/// for best-effort remote updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_sensitivity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Vec<FavoritePlace>>,
}
