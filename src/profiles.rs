//! Named credential profiles and the process-wide active selection.

use crate::{config, errors::{AppError, AppResult}};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub struct ProfileStore {
    active: RwLock<Option<String>>,
    credentials_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

impl ProfileStore {
    pub fn new(cfg: &config::Aws) -> Self {
        let credentials_file = cfg
            .credentials_file
            .clone()
            .or_else(|| shared_file("AWS_SHARED_CREDENTIALS_FILE", "credentials"));
        let config_file = cfg.config_file.clone().or_else(|| shared_file("AWS_CONFIG_FILE", "config"));
        Self::with_files(credentials_file, config_file, cfg.profile.clone())
    }

    pub fn with_files(
        credentials_file: Option<PathBuf>,
        config_file: Option<PathBuf>,
        initial: Option<String>,
    ) -> Self {
        Self { active: RwLock::new(initial), credentials_file, config_file }
    }

    /// Profile names from both shared files, deduplicated and sorted.
    pub fn discover(&self) -> AppResult<Vec<String>> {
        let mut names = BTreeSet::new();
        for path in [&self.credentials_file, &self.config_file].into_iter().flatten() {
            names.extend(read_sections(path)?);
        }
        Ok(names.into_iter().collect())
    }

    pub fn exists(&self, name: &str) -> AppResult<bool> {
        Ok(self.discover()?.iter().any(|n| n == name))
    }

    pub fn active(&self) -> Option<String> {
        self.active.read().clone()
    }

    /// Replaces the active profile. Unknown names leave the selection untouched.
    pub fn set(&self, name: &str) -> AppResult<()> {
        if !self.exists(name)? {
            return Err(AppError::ProfileNotFound(name.to_string()));
        }
        *self.active.write() = Some(name.to_string());
        Ok(())
    }

    /// Profile for a single call: an explicit request wins over the active selection.
    pub fn resolve(&self, requested: Option<&str>) -> AppResult<Option<String>> {
        match requested {
            Some(name) if self.exists(name)? => Ok(Some(name.to_string())),
            Some(name) => Err(AppError::ProfileNotFound(name.to_string())),
            None => Ok(self.active()),
        }
    }
}

fn shared_file(env_key: &str, file: &str) -> Option<PathBuf> {
    match std::env::var_os(env_key) {
        Some(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => dirs::home_dir().map(|h| h.join(".aws").join(file)),
    }
}

fn read_sections(path: &Path) -> AppResult<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(section_names(&raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(AppError::Internal(format!("reading {}: {e}", path.display()))),
    }
}

fn section_names(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .map(|section| {
            let section = section.trim();
            section.strip_prefix("profile ").map(str::trim).unwrap_or(section).to_string()
        })
        .filter(|name| !name.is_empty() && !name.starts_with("sso-session ") && !name.starts_with("services "))
        .collect()
}
