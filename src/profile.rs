//! Per-account progress and the profile store seam
//!
//! The simulation only ever sees a [`Session`]; loading and saving go through
//! [`ProfileStore`] so the storage backend stays outside the core.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cosmetics equipped on a fresh account
pub const DEFAULT_EQUIPPED: [(&str, &str); 2] = [("alex", "alex_grey"), ("van", "van_blue")];

/// Persistent per-account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Coin balance
    #[serde(default)]
    pub coins: u64,
    /// Best total score
    #[serde(default)]
    pub highscore: u64,
    /// Purchased item ids
    #[serde(default)]
    pub owned: BTreeSet<String>,
    /// Equipped cosmetic per category
    #[serde(default)]
    pub equipped: BTreeMap<String, String>,
    /// Whether this account is logged in
    #[serde(default, rename = "session_active")]
    pub session_active: bool,
    /// Account fields owned by the auth layer (password hash etc.), carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            coins: 0,
            highscore: 0,
            owned: BTreeSet::new(),
            equipped: DEFAULT_EQUIPPED
                .iter()
                .map(|(cat, id)| (cat.to_string(), id.to_string()))
                .collect(),
            session_active: false,
            extra: BTreeMap::new(),
        }
    }
}

impl Profile {
    pub fn owns(&self, item_id: &str) -> bool {
        self.owned.contains(item_id)
    }

    /// Equipped item id for a cosmetic category
    pub fn equipped_in(&self, category: &str) -> Option<&str> {
        self.equipped.get(category).map(String::as_str)
    }

    /// Add coins to the balance
    pub fn credit(&mut self, coins: u64) {
        self.coins = self.coins.saturating_add(coins);
    }

    /// Record a finished run's score. Returns true on a new high score.
    pub fn record_score(&mut self, score: u64) -> bool {
        if score > self.highscore {
            self.highscore = score;
            true
        } else {
            false
        }
    }
}

/// Logged-in account context threaded through the controller and simulators
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub username: String,
    pub profile: Profile,
}

impl Session {
    pub fn new(username: impl Into<String>, profile: Profile) -> Self {
        Self {
            username: username.into(),
            profile,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no account named {0:?}")]
    NotFound(String),
    #[error("account {0:?} already exists")]
    AlreadyExists(String),
    #[error("profile storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage backend for profiles
pub trait ProfileStore {
    /// Load an existing account
    fn load(&mut self, username: &str) -> Result<Profile, ProfileError>;
    /// Persist an account
    fn save(&mut self, username: &str, profile: &Profile) -> Result<(), ProfileError>;
    /// Create a new account with default progress
    fn create(&mut self, username: &str) -> Result<Profile, ProfileError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: HashMap<String, Profile>,
    /// Make every save fail (for exercising failure paths)
    pub fail_saves: bool,
    /// Number of successful saves
    pub saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a profile directly
    pub fn insert(&mut self, username: &str, profile: Profile) {
        self.profiles.insert(username.to_string(), profile);
    }

    pub fn get(&self, username: &str) -> Option<&Profile> {
        self.profiles.get(username)
    }
}

impl ProfileStore for MemoryStore {
    fn load(&mut self, username: &str) -> Result<Profile, ProfileError> {
        self.profiles
            .get(username)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(username.to_string()))
    }

    fn save(&mut self, username: &str, profile: &Profile) -> Result<(), ProfileError> {
        if self.fail_saves {
            return Err(ProfileError::Io(std::io::Error::other("save disabled")));
        }
        self.profiles.insert(username.to_string(), profile.clone());
        self.saves += 1;
        Ok(())
    }

    fn create(&mut self, username: &str) -> Result<Profile, ProfileError> {
        if self.profiles.contains_key(username) {
            return Err(ProfileError::AlreadyExists(username.to_string()));
        }
        let profile = Profile::default();
        self.profiles.insert(username.to_string(), profile.clone());
        Ok(profile)
    }
}

/// On-disk document: every account plus the last logged-in user
#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: BTreeMap<String, Profile>,
    #[serde(default)]
    current_user: Option<String>,
}

/// Single JSON file holding all accounts
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: UsersFile,
}

impl JsonFileStore {
    /// Open (or start) the store at `path`.
    ///
    /// A file that fails to parse is moved aside to `<path>.bak` and the store
    /// starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProfileError> {
        let path = path.into();
        let data = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<UsersFile>(&json) {
                Ok(data) => {
                    log::info!("Loaded {} accounts from {}", data.users.len(), path.display());
                    data
                }
                Err(e) => {
                    log::warn!("Corrupt profile file {}: {}", path.display(), e);
                    let backup = backup_path(&path);
                    if let Err(e) = std::fs::rename(&path, &backup) {
                        log::warn!("Could not move corrupt file aside: {}", e);
                    }
                    UsersFile::default()
                }
            }
        } else {
            UsersFile::default()
        };
        Ok(Self { path, data })
    }

    /// Account whose session was still active when the file was last written
    pub fn current_user(&self) -> Option<&str> {
        let name = self.data.current_user.as_deref()?;
        let profile = self.data.users.get(name)?;
        profile.session_active.then_some(name)
    }

    fn flush(&self) -> Result<(), ProfileError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

impl ProfileStore for JsonFileStore {
    fn load(&mut self, username: &str) -> Result<Profile, ProfileError> {
        self.data
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(username.to_string()))
    }

    fn save(&mut self, username: &str, profile: &Profile) -> Result<(), ProfileError> {
        self.data.users.insert(username.to_string(), profile.clone());
        if profile.session_active {
            self.data.current_user = Some(username.to_string());
        } else if self.data.current_user.as_deref() == Some(username) {
            self.data.current_user = None;
        }
        self.flush()?;
        log::debug!("Saved profile for {}", username);
        Ok(())
    }

    fn create(&mut self, username: &str) -> Result<Profile, ProfileError> {
        if self.data.users.contains_key(username) {
            return Err(ProfileError::AlreadyExists(username.to_string()));
        }
        let profile = Profile::default();
        self.data.users.insert(username.to_string(), profile.clone());
        self.flush()?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("van_snatcher_{}_{}.json", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn test_default_profile_equips_starter_cosmetics() {
        let profile = Profile::default();
        assert_eq!(profile.equipped_in("alex"), Some("alex_grey"));
        assert_eq!(profile.equipped_in("van"), Some("van_blue"));
        assert_eq!(profile.coins, 0);
    }

    #[test]
    fn test_record_score_keeps_max() {
        let mut profile = Profile::default();
        assert!(profile.record_score(40));
        assert!(!profile.record_score(10));
        assert_eq!(profile.highscore, 40);
    }

    #[test]
    fn test_memory_store_create_twice() {
        let mut store = MemoryStore::new();
        store.create("alex").unwrap();
        assert!(matches!(store.create("alex"), Err(ProfileError::AlreadyExists(_))));
        assert!(matches!(store.load("nobody"), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn test_reads_users_file_and_keeps_auth_fields() {
        let json = r#"{
            "users": {
                "alex": {
                    "pw_hash": "ab", "pw_salt": "cd",
                    "coins": 120, "highscore": 77,
                    "owned": ["mask"],
                    "equipped": {"alex": "alex_red", "van": "van_blue"},
                    "multiplier": 1.0,
                    "session_active": true
                }
            },
            "current_user": "alex"
        }"#;
        let path = temp_path("layout");
        std::fs::write(&path, json).unwrap();

        let mut store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.current_user(), Some("alex"));
        let profile = store.load("alex").unwrap();
        assert_eq!(profile.coins, 120);
        assert!(profile.owns("mask"));
        assert_eq!(profile.extra.get("pw_hash"), Some(&serde_json::json!("ab")));

        store.save("alex", &profile).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("pw_salt"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_moved_aside() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{not json").unwrap();
        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.current_user().is_none());
        assert!(backup_path(&path).exists());
        store.create("fresh").unwrap();
        assert!(store.load("fresh").is_ok());
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(backup_path(&path));
    }

    #[test]
    fn test_logout_clears_current_user() {
        let path = temp_path("logout");
        let mut store = JsonFileStore::open(&path).unwrap();
        let mut profile = store.create("sam").unwrap();
        profile.session_active = true;
        store.save("sam", &profile).unwrap();
        assert_eq!(store.current_user(), Some("sam"));
        profile.session_active = false;
        store.save("sam", &profile).unwrap();
        assert_eq!(store.current_user(), None);
        let _ = std::fs::remove_file(&path);
    }
}
