//! Connection profile store.
//!
//! Profiles live in one JSON array on disk. Every operation re-reads the
//! file, so edits made by hand show up without a restart. Writers inside
//! this process are serialized; readers never wait, so a read racing an
//! activation may see either the old or the new active profile.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use common::errors::{AppError, AppResult};
use common::models::{ConnectionProfile, CreateConnectionRequest};
use common::utils::IdGenerator;
use tokio::sync::Mutex;

/// JSON-file backed store of [`ConnectionProfile`]s.
pub struct ProfileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all profiles in stored order. A missing or blank file is empty.
    pub async fn load_profiles(&self) -> AppResult<Vec<ConnectionProfile>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_error("read", &self.path, e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| storage_error("parse", &self.path, e))
    }

    /// Replaces the stored array. Writes a sibling temp file and renames it
    /// over the target so readers never see a half-written file.
    pub async fn save_profiles(&self, profiles: &[ConnectionProfile]) -> AppResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| storage_error("create directory for", &self.path, e))?;
        }

        let body = serde_json::to_vec_pretty(profiles)
            .map_err(|e| storage_error("serialize", &self.path, e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| storage_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error("replace", &self.path, e))
    }

    /// The profile marked active, if any. The first one wins should a
    /// hand-edited file mark several.
    pub async fn active_profile(&self) -> AppResult<Option<ConnectionProfile>> {
        Ok(self.load_profiles().await?.into_iter().find(|p| p.is_active))
    }

    pub async fn get(&self, id: &str) -> AppResult<ConnectionProfile> {
        self.load_profiles()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::ConnectionNotFound(id.to_string()))
    }

    pub async fn count(&self) -> AppResult<usize> {
        Ok(self.load_profiles().await?.len())
    }

    /// Validates and appends a new inactive profile.
    pub async fn create(&self, req: CreateConnectionRequest) -> AppResult<ConnectionProfile> {
        let db_type = req.check()?;
        let _guard = self.write_lock.lock().await;

        let mut profiles = self.load_profiles().await?;
        ensure_unique_name(&profiles, req.name.trim(), None)?;

        let profile = req.into_profile(db_type, IdGenerator::profile_id(), Utc::now());
        profiles.push(profile.clone());
        self.save_profiles(&profiles).await?;
        Ok(profile)
    }

    /// Replaces the descriptive fields of `id`. Activation state is kept.
    pub async fn update(&self, id: &str, req: CreateConnectionRequest) -> AppResult<ConnectionProfile> {
        let db_type = req.check()?;
        let _guard = self.write_lock.lock().await;

        let mut profiles = self.load_profiles().await?;
        let index = profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::ConnectionNotFound(id.to_string()))?;
        ensure_unique_name(&profiles, req.name.trim(), Some(id))?;

        let profile = &mut profiles[index];
        req.apply_to(db_type, profile);
        profile.updated_at = Some(Utc::now());
        let updated = profile.clone();
        self.save_profiles(&profiles).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut profiles = self.load_profiles().await?;
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        if profiles.len() == before {
            return Err(AppError::ConnectionNotFound(id.to_string()));
        }
        self.save_profiles(&profiles).await
    }

    /// Marks `id` as the only active profile. An unknown id leaves the
    /// store untouched.
    pub async fn activate(&self, id: &str) -> AppResult<ConnectionProfile> {
        let _guard = self.write_lock.lock().await;

        let mut profiles = self.load_profiles().await?;
        if !profiles.iter().any(|p| p.id == id) {
            return Err(AppError::ConnectionNotFound(id.to_string()));
        }

        let now = Utc::now();
        let mut activated = None;
        for profile in &mut profiles {
            profile.is_active = profile.id == id;
            if profile.is_active {
                profile.activated_at = Some(now);
                activated = Some(profile.clone());
            }
        }
        self.save_profiles(&profiles).await?;
        activated.ok_or_else(|| AppError::ConnectionNotFound(id.to_string()))
    }
}

fn ensure_unique_name(profiles: &[ConnectionProfile], name: &str, except: Option<&str>) -> AppResult<()> {
    let taken = profiles
        .iter()
        .any(|p| p.name == name && Some(p.id.as_str()) != except);
    if taken {
        Err(AppError::DuplicateName(name.to_string()))
    } else {
        Ok(())
    }
}

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> AppError {
    tracing::error!(path = %path.display(), error = %err, "failed to {action} profile store");
    AppError::Storage(format!("failed to {action} {}: {err}", path.display()))
}
