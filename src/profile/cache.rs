use crate::error::ProfileError;
use crate::profile::types::UserProfile;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Local file-backed profile cache
///
/// One JSON document per user under the cache directory. This is the
/// fallback used when the remote store rejects or is unreachable, and every
/// successful remote read or local update writes through here.
#[derive(Debug, Clone)]
pub struct ProfileCache {
    dir: PathBuf,
}

impl ProfileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the cached document for `uid`
    fn document_path(&self, uid: &str) -> PathBuf {
        self.dir.join(format!("mimo_user_{}.json", uid))
    }

    /// Persist a profile, creating the cache directory if needed
    pub fn save(&self, profile: &UserProfile) -> Result<(), ProfileError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.document_path(&profile.uid);
        let json = serde_json::to_string_pretty(profile)?;
        fs::write(&path, json)?;
        debug!("Cached profile for {} at {}", profile.uid, path.display());
        Ok(())
    }

    /// Load the cached profile for `uid`
    ///
    /// Returns `Ok(None)` when no document exists. A document that exists
    /// but fails to parse is treated as absent, with a warning, so a
    /// corrupted cache never blocks login.
    pub fn load(&self, uid: &str) -> Result<Option<UserProfile>, ProfileError> {
        let path = self.document_path(uid);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)?;
        match serde_json::from_str(&json) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(
                    "Discarding unreadable cached profile {}: {}",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Remove the cached document for `uid`, if present
    pub fn remove(&self, uid: &str) -> Result<(), ProfileError> {
        let path = self.document_path(uid);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = ProfileCache::new(dir.path());
        let profile = UserProfile::default_for("user-1");

        cache.save(&profile).unwrap();
        let loaded = cache.load("user-1").unwrap();
        assert_eq!(loaded, Some(profile));
    }

    #[test]
    fn test_load_missing_profile() {
        let dir = TempDir::new().unwrap();
        let cache = ProfileCache::new(dir.path());
        assert_eq!(cache.load("ghost").unwrap(), None);
    }

    #[test]
    fn test_load_corrupted_document_returns_none() {
        let dir = TempDir::new().unwrap();
        let cache = ProfileCache::new(dir.path());
        fs::write(dir.path().join("mimo_user_bad.json"), "not json").unwrap();

        assert_eq!(cache.load("bad").unwrap(), None);
    }

    #[test]
    fn test_save_creates_cache_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("cache");
        let cache = ProfileCache::new(&nested);

        cache.save(&UserProfile::default_for("user-1")).unwrap();
        assert!(nested.exists());
        assert_eq!(cache.dir(), nested.as_path());
        assert!(cache.dir().join("mimo_user_user-1.json").is_file());
    }

    #[test]
    fn test_remove_cached_profile() {
        let dir = TempDir::new().unwrap();
        let cache = ProfileCache::new(dir.path());
        let profile = UserProfile::default_for("user-1");

        cache.save(&profile).unwrap();
        cache.remove("user-1").unwrap();
        assert_eq!(cache.load("user-1").unwrap(), None);

        // Removing an absent document is fine
        cache.remove("user-1").unwrap();
    }

    #[test]
    fn test_documents_are_per_user() {
        let dir = TempDir::new().unwrap();
        let cache = ProfileCache::new(dir.path());

        let mut first = UserProfile::default_for("user-1");
        first.noise_sensitivity = 40;
        let mut second = UserProfile::default_for("user-2");
        second.noise_sensitivity = 90;

        cache.save(&first).unwrap();
        cache.save(&second).unwrap();

        assert_eq!(cache.load("user-1").unwrap().unwrap().noise_sensitivity, 40);
        assert_eq!(cache.load("user-2").unwrap().unwrap().noise_sensitivity, 90);
    }
}
