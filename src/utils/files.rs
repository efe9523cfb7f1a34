//! File helpers
//!
//! Storing generated templates and turning a drafted name into a safe file name

use crate::utils::error::AppResult;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Where accepted templates are written
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, name: &str, content: &str) -> AppResult<()>;
}

/// Stores files in a directory
#[derive(Debug, Clone)]
pub struct DirFileStore {
    dir: PathBuf,
}

impl DirFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileStore for DirFileStore {
    async fn store(&self, name: &str, content: &str) -> AppResult<()> {
        let path = self.dir.join(name);
        tokio::fs::write(&path, content).await?;
        info!("Stored template at {}", path.display());
        Ok(())
    }
}

/// Random template name, `terraform-<8 hex chars>.tf`
pub fn random_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("terraform-{}.tf", &id[..8])
}

/// Use the drafted name when it is a plain `.tf` file name, otherwise a random one
pub fn file_name_from_draft(draft: &str) -> String {
    let name = draft.trim().trim_matches(|c| c == '`' || c == '"' || c == '\'');

    let plain = !name.is_empty()
        && name.ends_with(".tf")
        && name.len() > ".tf".len()
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_whitespace)
        && !name.starts_with('.');

    if plain {
        name.to_string()
    } else {
        random_name()
    }
}
