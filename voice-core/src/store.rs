//! # Profile Store Module
//!
//! Persists saved voice profiles as one JSON array under a single namespaced
//! key, most recent first. Every mutation reads the whole collection, changes
//! it and writes the whole collection back; there are no partial updates.
//! A single writer is assumed.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::VoiceError;
use crate::profile::VoiceProfile;

/// Storage key holding the saved profile collection.
pub const PROFILES_KEY: &str = "voiceprint_profiles";

/// A durable string key-value store with whole-value reads and writes.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, VoiceError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), VoiceError>;
}

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// crash mid-write leaves the previous collection intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, VoiceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), VoiceError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));

        let mut file = fs::File::create(&staging)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&staging, &target)?;
        Ok(())
    }
}

/// In-memory store, used when nothing should touch the disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, VoiceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), VoiceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The ordered collection of saved voice profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore<B: KeyValueStore> {
    backend: B,
}

impl<B: KeyValueStore> ProfileStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All saved profiles, most recent first. A missing key is an empty collection.
    pub fn load(&self) -> Result<Vec<VoiceProfile>, VoiceError> {
        match self.backend.read(PROFILES_KEY)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(&data)?),
            _ => Ok(Vec::new()),
        }
    }

    fn write_all(&mut self, profiles: &[VoiceProfile]) -> Result<(), VoiceError> {
        let data = serde_json::to_string(profiles)?;
        self.backend.write(PROFILES_KEY, &data)
    }

    pub fn find(&self, id: u64) -> Result<Option<VoiceProfile>, VoiceError> {
        Ok(self.load()?.into_iter().find(|p| p.id == id))
    }

    /// An id derived from `now_ms` that no saved profile uses yet.
    pub fn next_id(&self, now_ms: u64) -> Result<u64, VoiceError> {
        let newest = self.load()?.iter().map(|p| p.id).max();
        match newest {
            Some(max) if max >= now_ms => max.checked_add(1).ok_or(VoiceError::IdsExhausted(max)),
            _ => Ok(now_ms),
        }
    }

    /// Prepends a profile and rewrites the collection.
    pub fn save(&mut self, profile: VoiceProfile) -> Result<(), VoiceError> {
        let mut profiles = self.load()?;
        log::info!("saving profile '{}' ({})", profile.name, profile.id);
        profiles.insert(0, profile);
        self.write_all(&profiles)
    }

    /// Deletes the profile with `id` once `confirm` agrees.
    ///
    /// # Returns
    /// * `Ok(Some(profile))` - The removed profile
    /// * `Ok(None)` - The user declined; nothing was written
    /// * `Err(VoiceError::UnknownProfile)` - No profile has this id
    pub fn delete(
        &mut self,
        id: u64,
        confirm: impl FnOnce(&VoiceProfile) -> bool,
    ) -> Result<Option<VoiceProfile>, VoiceError> {
        let mut profiles = self.load()?;
        let index = profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or(VoiceError::UnknownProfile(id))?;

        if !confirm(&profiles[index]) {
            log::info!("delete of profile {id} declined");
            return Ok(None);
        }

        let removed = profiles.remove(index);
        self.write_all(&profiles)?;
        log::info!("deleted profile '{}' ({})", removed.name, removed.id);
        Ok(Some(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::record_profile;
    use crate::session::SessionStats;
    use tempfile::tempdir;

    fn profile(id: u64, name: &str) -> VoiceProfile {
        record_profile(&SessionStats::new(4), name, id, format!("t{id}"))
    }

    #[test]
    fn missing_key_is_empty() {
        let store = ProfileStore::new(MemoryStore::default());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn saves_most_recent_first() {
        let mut store = ProfileStore::new(MemoryStore::default());
        store.save(profile(1, "first")).unwrap();
        store.save(profile(2, "second")).unwrap();
        let names: Vec<_> = store.load().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn declined_delete_is_a_no_op() {
        let mut store = ProfileStore::new(MemoryStore::default());
        store.save(profile(1, "keep")).unwrap();
        let before = store.backend().read(PROFILES_KEY).unwrap();

        assert_eq!(store.delete(1, |_| false).unwrap(), None);
        assert_eq!(store.backend().read(PROFILES_KEY).unwrap(), before);
    }

    #[test]
    fn confirmed_delete_removes_only_that_profile() {
        let mut store = ProfileStore::new(MemoryStore::default());
        store.save(profile(1, "a")).unwrap();
        store.save(profile(2, "b")).unwrap();
        store.save(profile(3, "c")).unwrap();

        let removed = store.delete(2, |p| p.name == "b").unwrap().unwrap();
        assert_eq!(removed.id, 2);
        let ids: Vec<_> = store.load().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn deleting_unknown_id_fails() {
        let mut store = ProfileStore::new(MemoryStore::default());
        assert!(matches!(
            store.delete(9, |_| true),
            Err(VoiceError::UnknownProfile(9))
        ));
    }

    #[test]
    fn next_id_never_collides() {
        let mut store = ProfileStore::new(MemoryStore::default());
        assert_eq!(store.next_id(500).unwrap(), 500);
        store.save(profile(500, "a")).unwrap();
        assert_eq!(store.next_id(500).unwrap(), 501);
        assert_eq!(store.next_id(900).unwrap(), 900);
    }

    #[test]
    fn next_id_errors_past_largest_id() {
        let mut store = ProfileStore::new(MemoryStore::default());
        store.save(profile(u64::MAX, "edited")).unwrap();
        assert!(matches!(
            store.next_id(500),
            Err(VoiceError::IdsExhausted(u64::MAX))
        ));
    }

    #[test]
    fn file_store_round_trips_collection() {
        let dir = tempdir().unwrap();
        let mut store = ProfileStore::new(FileStore::new(dir.path().join("nested")));
        store.save(profile(1, "disk")).unwrap();

        let reopened = ProfileStore::new(FileStore::new(dir.path().join("nested")));
        let loaded = reopened.load().unwrap();
        assert_eq!(loaded, vec![profile(1, "disk")]);
        assert!(dir.path().join("nested").join("voiceprint_profiles.json").exists());
    }

    #[test]
    fn corrupt_collection_is_reported() {
        let mut backend = MemoryStore::default();
        backend.write(PROFILES_KEY, "{not json").unwrap();
        let store = ProfileStore::new(backend);
        assert!(matches!(store.load(), Err(VoiceError::Json(_))));
    }
}
