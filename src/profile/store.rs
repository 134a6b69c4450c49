use crate::error::ProfileError;
use crate::profile::types::{ProfilePatch, UserProfile};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for profile document store implementations
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for `uid`; `Ok(None)` means no document exists
    fn fetch<'a>(
        &'a self,
        uid: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserProfile>, ProfileError>> + Send + 'a>>;

    /// Create the document for a new user
    fn create<'a>(
        &'a self,
        profile: &'a UserProfile,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProfileError>> + Send + 'a>>;

    /// Apply a partial update to an existing document
    fn update<'a>(
        &'a self,
        uid: &'a str,
        patch: &'a ProfilePatch,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProfileError>> + Send + 'a>>;
}

/// REST-backed profile store
///
/// Talks to a document store exposing `/users/{uid}` with GET, PUT, and
/// PATCH. 404 on fetch means the document does not exist yet; 401 and 403
/// surface as permission errors so callers can fall back to the local cache.
pub struct RestProfileStore {
    client: Client,
    endpoint: String,
}

impl RestProfileStore {
    /// Create a new REST store
    ///
    /// # Arguments
    /// * `endpoint` - Store base URL (e.g., "https://store.example.com/v1")
    pub fn new(endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }

    /// Format the document URL for a user
    fn document_url(&self, uid: &str) -> String {
        format!("{}/users/{}", self.endpoint.trim_end_matches('/'), uid)
    }

    /// Map a non-success status to a ProfileError
    fn status_error(status: StatusCode, body: String) -> ProfileError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ProfileError::PermissionDenied(format!("store returned {}: {}", status, body))
        } else {
            ProfileError::StoreError(format!("store returned {}: {}", status, body))
        }
    }
}

impl ProfileStore for RestProfileStore {
    fn fetch<'a>(
        &'a self,
        uid: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserProfile>, ProfileError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self.client.get(self.document_url(uid)).send().await?;

            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(Self::status_error(status, body));
            }

            let profile: UserProfile = response.json().await.map_err(|e| {
                ProfileError::InvalidResponse(format!("Failed to parse profile document: {}", e))
            })?;

            Ok(Some(profile))
        })
    }

    fn create<'a>(
        &'a self,
        profile: &'a UserProfile,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProfileError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .put(self.document_url(&profile.uid))
                .json(profile)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(Self::status_error(status, body));
            }

            Ok(())
        })
    }

    fn update<'a>(
        &'a self,
        uid: &'a str,
        patch: &'a ProfilePatch,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProfileError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .patch(self.document_url(uid))
                .json(patch)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(Self::status_error(status, body));
            }

            Ok(())
        })
    }
}

/// Apply a patch to a profile in place
pub(crate) fn apply_patch(profile: &mut UserProfile, patch: &ProfilePatch) {
    if let Some(ref display_name) = patch.display_name {
        profile.display_name = display_name.clone();
    }
    if let Some(noise_sensitivity) = patch.noise_sensitivity {
        profile.noise_sensitivity = noise_sensitivity;
    }
    if let Some(ref age) = patch.age {
        profile.age = age.clone();
    }
    if let Some(theme) = patch.theme {
        profile.theme = theme;
    }
    if let Some(ref favorites) = patch.favorites {
        profile.favorites = favorites.clone();
    }
}

/// In-memory profile store for testing and offline development
///
/// Tracks call counts and can be switched into a failing mode to exercise
/// the local-fallback paths.
#[derive(Debug, Default)]
pub struct MockProfileStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
    failing: Mutex<bool>,
    fetch_calls: Mutex<usize>,
    create_calls: Mutex<usize>,
    update_calls: Mutex<usize>,
}

impl MockProfileStore {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store pre-populated with one profile
    pub fn with_profile(profile: UserProfile) -> Self {
        let store = Self::new();
        store
            .profiles
            .lock()
            .unwrap()
            .insert(profile.uid.clone(), profile);
        store
    }

    /// Create a mock store whose every operation fails with a permission error
    pub fn failing() -> Self {
        let store = Self::new();
        *store.failing.lock().unwrap() = true;
        store
    }

    /// Switch the failing mode on or off
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Stored document for `uid`, if any
    pub fn stored(&self, uid: &str) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(uid).cloned()
    }

    pub fn fetch_calls(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }

    pub fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }

    pub fn update_calls(&self) -> usize {
        *self.update_calls.lock().unwrap()
    }

    fn check_failing(&self) -> Result<(), ProfileError> {
        if *self.failing.lock().unwrap() {
            Err(ProfileError::PermissionDenied(
                "mock store is in failing mode".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl ProfileStore for MockProfileStore {
    fn fetch<'a>(
        &'a self,
        uid: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserProfile>, ProfileError>> + Send + 'a>> {
        Box::pin(async move {
            *self.fetch_calls.lock().unwrap() += 1;
            self.check_failing()?;
            Ok(self.profiles.lock().unwrap().get(uid).cloned())
        })
    }

    fn create<'a>(
        &'a self,
        profile: &'a UserProfile,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProfileError>> + Send + 'a>> {
        Box::pin(async move {
            *self.create_calls.lock().unwrap() += 1;
            self.check_failing()?;
            self.profiles
                .lock()
                .unwrap()
                .insert(profile.uid.clone(), profile.clone());
            Ok(())
        })
    }

    fn update<'a>(
        &'a self,
        uid: &'a str,
        patch: &'a ProfilePatch,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProfileError>> + Send + 'a>> {
        Box::pin(async move {
            *self.update_calls.lock().unwrap() += 1;
            self.check_failing()?;
            let mut profiles = self.profiles.lock().unwrap();
            match profiles.get_mut(uid) {
                Some(profile) => {
                    apply_patch(profile, patch);
                    Ok(())
                }
                None => Err(ProfileError::StoreError(format!(
                    "no document for uid {}",
                    uid
                ))),
            }
        })
    }
}
