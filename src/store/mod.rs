//! Durable client-local storage for group-inscription drafts.
//!
//! Write-once / read-back / explicit-delete key-value contract: a draft
//! survives full navigation under `group-inscription-{cacheKey}` until
//! the flow confirms, cancels, or expires it. Nothing here ages out on
//! its own.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::group::{GroupForm, GroupInscriptionDraft};

/// File-name namespace for persisted drafts.
const DRAFT_PREFIX: &str = "group-inscription-";

/// File holding transient upload-form state for resume.
const FORM_RESUME_FILE: &str = "form-resume.json";

pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create draft directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn draft_path(&self, cache_key: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.json", DRAFT_PREFIX, sanitize_key(cache_key)))
    }

    pub fn save_draft(&self, draft: &GroupInscriptionDraft) -> Result<()> {
        let path = self.draft_path(&draft.cache_key);
        let contents = serde_json::to_string_pretty(draft)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to persist draft {}", draft.cache_key))?;
        debug!(cache_key = %draft.cache_key, "group draft persisted");
        Ok(())
    }

    /// Load a draft by its cache key. Absent is a normal outcome
    /// (already confirmed, another device, storage cleared) and maps to
    /// `Ok(None)`.
    pub fn load_draft(&self, cache_key: &str) -> Result<Option<GroupInscriptionDraft>> {
        let path = self.draft_path(cache_key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read draft {}", cache_key))?;
        let draft = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse draft {}", cache_key))?;
        Ok(Some(draft))
    }

    pub fn remove_draft(&self, cache_key: &str) -> Result<()> {
        let path = self.draft_path(cache_key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove draft {}", cache_key))?;
            debug!(cache_key, "group draft removed");
        }
        Ok(())
    }

    // ===== Form resume state =====

    pub fn save_form_state(&self, form: &GroupForm) -> Result<()> {
        let path = self.dir.join(FORM_RESUME_FILE);
        let contents = serde_json::to_string_pretty(form)?;
        std::fs::write(&path, contents).context("Failed to persist form state")?;
        Ok(())
    }

    pub fn load_form_state(&self) -> Result<Option<GroupForm>> {
        let path = self.dir.join(FORM_RESUME_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read form state")?;
        let form = serde_json::from_str(&contents).context("Failed to parse form state")?;
        Ok(Some(form))
    }

    pub fn clear_form_state(&self) -> Result<()> {
        let path = self.dir.join(FORM_RESUME_FILE);
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to clear form state")?;
        }
        Ok(())
    }
}

/// Cache keys are opaque server strings; keep file names to a safe
/// alphabet.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupItem;

    fn sample_draft(cache_key: &str) -> GroupInscriptionDraft {
        GroupInscriptionDraft {
            cache_key: cache_key.to_string(),
            total: 100.0,
            unit_value: 50.0,
            items: vec![
                GroupItem {
                    name: "Ana Lima".to_string(),
                    birth_date: Some("2010-04-02".to_string()),
                    gender: Some("F".to_string()),
                    type_description: "Normal".to_string(),
                    value: 50.0,
                },
                GroupItem {
                    name: "Bruno Costa".to_string(),
                    birth_date: Some("2011-11-19".to_string()),
                    gender: Some("M".to_string()),
                    type_description: "Normal".to_string(),
                    value: 50.0,
                },
            ],
        }
    }

    #[test]
    fn test_draft_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DraftStore::new(dir.path().to_path_buf()).expect("store");
        let draft = sample_draft("X");

        store.save_draft(&draft).expect("save");
        let loaded = store.load_draft("X").expect("load");
        assert_eq!(loaded, Some(draft));
    }

    #[test]
    fn test_unknown_key_is_none_not_a_crash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DraftStore::new(dir.path().to_path_buf()).expect("store");
        assert_eq!(store.load_draft("missing").expect("load"), None);
        // Hostile keys stay inside the store directory
        assert_eq!(store.load_draft("../../etc/passwd").expect("load"), None);
    }

    #[test]
    fn test_remove_draft() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DraftStore::new(dir.path().to_path_buf()).expect("store");
        store.save_draft(&sample_draft("Y")).expect("save");

        store.remove_draft("Y").expect("remove");
        assert_eq!(store.load_draft("Y").expect("load"), None);
        // Removing twice is fine
        store.remove_draft("Y").expect("remove again");
    }

    #[test]
    fn test_form_state_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DraftStore::new(dir.path().to_path_buf()).expect("store");
        assert_eq!(store.load_form_state().expect("load"), None);

        let form = GroupForm {
            responsible: "Maria Souza".to_string(),
            phone: "(11) 99999-8888".to_string(),
            event_id: 7,
        };
        store.save_form_state(&form).expect("save");
        assert_eq!(store.load_form_state().expect("load"), Some(form));

        store.clear_form_state().expect("clear");
        assert_eq!(store.load_form_state().expect("load"), None);
    }
}
