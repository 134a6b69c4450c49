use crate::profile::cache::ProfileCache;
use crate::profile::store::ProfileStore;
use crate::profile::types::{Account, FavoritePlace, PlaceKind, ProfilePatch, Theme, UserProfile};
use crate::simulator::noise::clamp_level;
use chrono::Utc;
use log::{error, info, warn};
use std::sync::{Arc, Mutex};

/// Partial update for a single favorite place
#[derive(Debug, Clone, Default)]
pub struct FavoriteUpdate {
    pub name: Option<String>,
    pub kind: Option<PlaceKind>,
    pub address: Option<String>,
}

/// Profile synchronization between the remote store and the local cache
///
/// Writes are optimistic: the in-memory profile and the local cache are
/// updated first and always, then the remote store is patched best-effort.
/// A rejected or unreachable store never fails a local operation; it only
/// leaves a log line. Reads prefer the store and fall back to the cache.
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    cache: ProfileCache,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>, cache: ProfileCache) -> Self {
        Self { store, cache }
    }

    /// Load the profile for a logging-in account, creating it if needed
    ///
    /// Tries the remote store first: an existing document is merged over the
    /// defaults and written through to the cache; a missing document is
    /// created remotely from the defaults. When the store rejects or is
    /// unreachable, the cached copy is used, or the defaults (which are then
    /// cached) if none exists. This never fails: some profile always comes
    /// back.
    pub async fn fetch_or_create(&self, account: &Account) -> UserProfile {
        let defaults = Self::default_profile(account);

        match self.remote_login(&defaults).await {
            Ok(profile) => {
                if let Err(e) = self.cache.save(&profile) {
                    warn!("Failed to cache profile for {}: {}", profile.uid, e);
                }
                profile
            }
            Err(e) => {
                warn!(
                    "Profile store unavailable for {}, using local fallback: {}",
                    account.uid, e
                );
                match self.cache.load(&account.uid) {
                    Ok(Some(local)) => {
                        info!("Loaded profile for {} from local cache", account.uid);
                        local
                    }
                    Ok(None) | Err(_) => {
                        info!("No local profile for {}, using defaults", account.uid);
                        if let Err(e) = self.cache.save(&defaults) {
                            warn!("Failed to cache default profile: {}", e);
                        }
                        defaults
                    }
                }
            }
        }
    }

    /// Update name, sensitivity, and age with optimistic local apply
    ///
    /// Sensitivity is clamped to [30, 100] before it is stored anywhere.
    pub async fn update_profile(
        &self,
        profile: &Arc<Mutex<UserProfile>>,
        name: &str,
        sensitivity: i32,
        age: &str,
    ) {
        let sensitivity = clamp_level(sensitivity);
        let (uid, snapshot) = {
            let mut profile = profile.lock().unwrap();
            profile.display_name = name.to_string();
            profile.noise_sensitivity = sensitivity;
            profile.age = age.to_string();
            (profile.uid.clone(), profile.clone())
        };

        self.save_local(&snapshot);

        let patch = ProfilePatch {
            display_name: Some(name.to_string()),
            noise_sensitivity: Some(sensitivity),
            age: Some(age.to_string()),
            ..Default::default()
        };
        self.patch_remote(&uid, &patch).await;
    }

    /// Switch the stored theme
    pub async fn set_theme(&self, profile: &Arc<Mutex<UserProfile>>, theme: Theme) {
        let (uid, snapshot) = {
            let mut profile = profile.lock().unwrap();
            profile.theme = theme;
            (profile.uid.clone(), profile.clone())
        };

        self.save_local(&snapshot);

        let patch = ProfilePatch {
            theme: Some(theme),
            ..Default::default()
        };
        self.patch_remote(&uid, &patch).await;
    }

    /// Add a favorite place; the id is minted from the current epoch millis
    pub async fn add_favorite(
        &self,
        profile: &Arc<Mutex<UserProfile>>,
        name: &str,
        kind: PlaceKind,
        address: &str,
    ) -> FavoritePlace {
        let favorite = FavoritePlace {
            id: Utc::now().timestamp_millis().to_string(),
            name: name.to_string(),
            kind,
            address: address.to_string(),
        };

        let (uid, snapshot) = {
            let mut profile = profile.lock().unwrap();
            profile.favorites.push(favorite.clone());
            (profile.uid.clone(), profile.clone())
        };

        self.save_local(&snapshot);
        self.patch_favorites(&uid, snapshot.favorites.clone()).await;
        favorite
    }

    /// Apply a partial update to the favorite with the given id
    ///
    /// A non-matching id leaves the profile untouched (and still syncs the
    /// unchanged list, matching the store's last-write-wins semantics).
    pub async fn update_favorite(
        &self,
        profile: &Arc<Mutex<UserProfile>>,
        id: &str,
        update: FavoriteUpdate,
    ) {
        let (uid, snapshot) = {
            let mut profile = profile.lock().unwrap();
            if let Some(favorite) = profile.favorites.iter_mut().find(|f| f.id == id) {
                if let Some(name) = update.name {
                    favorite.name = name;
                }
                if let Some(kind) = update.kind {
                    favorite.kind = kind;
                }
                if let Some(address) = update.address {
                    favorite.address = address;
                }
            }
            (profile.uid.clone(), profile.clone())
        };

        self.save_local(&snapshot);
        self.patch_favorites(&uid, snapshot.favorites.clone()).await;
    }

    /// The defaults a brand-new account starts from
    fn default_profile(account: &Account) -> UserProfile {
        let mut profile = UserProfile::default_for(&account.uid);
        profile.email = account.email.clone();
        if let Some(ref display_name) = account.display_name {
            profile.display_name = display_name.clone();
        }
        profile
    }

    /// Remote half of login: fetch-and-merge, or create from defaults
    async fn remote_login(
        &self,
        defaults: &UserProfile,
    ) -> Result<UserProfile, crate::error::ProfileError> {
        match self.store.fetch(&defaults.uid).await? {
            Some(remote) => Ok(Self::merge_with_defaults(remote, defaults)),
            None => {
                self.store.create(defaults).await?;
                info!("Created remote profile for new user {}", defaults.uid);
                Ok(defaults.clone())
            }
        }
    }

    /// Merge a fetched document over the defaults
    ///
    /// Remote fields win; an empty favorites list is replaced by the default
    /// placeholders so the UI never shows an empty favorites screen.
    fn merge_with_defaults(mut remote: UserProfile, defaults: &UserProfile) -> UserProfile {
        if remote.uid.is_empty() {
            remote.uid = defaults.uid.clone();
        }
        if remote.favorites.is_empty() {
            remote.favorites = defaults.favorites.clone();
        }
        remote
    }

    /// Always-on local write; failures are logged, never surfaced
    fn save_local(&self, profile: &UserProfile) {
        if let Err(e) = self.cache.save(profile) {
            error!("Local profile save failed for {}: {}", profile.uid, e);
        }
    }

    /// Best-effort remote patch; failures are logged, never surfaced
    async fn patch_remote(&self, uid: &str, patch: &ProfilePatch) {
        if let Err(e) = self.store.update(uid, patch).await {
            error!("Profile store sync failed for {}, data saved locally: {}", uid, e);
        }
    }

    async fn patch_favorites(&self, uid: &str, favorites: Vec<FavoritePlace>) {
        let patch = ProfilePatch {
            favorites: Some(favorites),
            ..Default::default()
        };
        self.patch_remote(uid, &patch).await;
    }
}
