//! Upload / review / confirm state machine for group inscriptions.
//!
//! ```text
//! Idle -submit-> Uploading -ok-> DraftPersisted
//!                          -validation error-> Idle (batch surfaced, new file required)
//! DraftPersisted -load-> AwaitingConfirmation (30-minute deadline starts)
//! AwaitingConfirmation -confirm ok-> Confirmed (draft purged)
//!                      -confirm err-> AwaitingConfirmation (draft retained)
//!                      -cancel-> Idle (draft purged)
//!                      -deadline-> Expired (draft purged, exactly once)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, ValidationBatch};
use crate::store::DraftStore;
use crate::utils::format::{format_phone, is_masked_phone, is_valid_responsible, title_case_name};

use super::draft::{GroupConfirmation, GroupInscriptionDraft};

/// Confirmation deadline in minutes. Fixed when the review screen loads
/// the draft; user activity does not extend it. The server expires the
/// same draft independently - this timer is for UX, not correctness.
const CONFIRMATION_DEADLINE_MINUTES: i64 = 30;

/// Upload-form input as typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupForm {
    pub responsible: String,
    pub phone: String,
    #[serde(rename = "eventId")]
    pub event_id: i64,
}

impl GroupForm {
    /// Validate and normalize: responsible becomes title case, phone is
    /// masked to `(XX) XXXXX-XXXX`.
    pub fn normalized(&self) -> Result<GroupForm, FlowError> {
        if !is_valid_responsible(&self.responsible) {
            return Err(FlowError::InvalidResponsible);
        }
        let phone = format_phone(&self.phone);
        if !is_masked_phone(&phone) {
            return Err(FlowError::InvalidPhone);
        }
        Ok(GroupForm {
            responsible: title_case_name(&self.responsible),
            phone,
            event_id: self.event_id,
        })
    }
}

/// Spreadsheet attached to the upload.
#[derive(Debug, Clone)]
pub struct SpreadsheetFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Uploading,
    DraftPersisted {
        cache_key: String,
    },
    AwaitingConfirmation {
        cache_key: String,
        expires_at: DateTime<Utc>,
    },
    Confirming {
        cache_key: String,
        expires_at: DateTime<Utc>,
    },
    Confirmed {
        inscription_id: i64,
        payment_enabled: bool,
    },
    Expired,
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Responsible name must contain only letters and spaces")]
    InvalidResponsible,

    #[error("Phone must match the format (XX) XXXXX-XXXX")]
    InvalidPhone,

    #[error("A spreadsheet file is required")]
    MissingFile,

    /// Row-level rejections; the whole file must be replaced and
    /// re-validated.
    #[error("{0}")]
    Validation(ValidationBatch),

    /// No persisted draft for the requested key - treat as expired and
    /// redirect, never fabricate an empty draft.
    #[error("No draft found for this confirmation key")]
    StaleDraft,

    #[error("The confirmation deadline has passed")]
    Expired,

    #[error("Operation not valid in the current state")]
    InvalidState,

    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct GroupInscriptionFlow {
    api: ApiClient,
    store: Arc<DraftStore>,
    state: FlowState,
}

impl GroupInscriptionFlow {
    pub fn new(api: ApiClient, store: Arc<DraftStore>) -> Self {
        Self {
            api,
            store,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Validate the form, upload the spreadsheet, and persist the priced
    /// draft the server returns. The file is consumed: after a
    /// validation batch the operator attaches a corrected file and
    /// submits again.
    pub async fn submit(
        &mut self,
        form: &GroupForm,
        file: SpreadsheetFile,
    ) -> Result<GroupInscriptionDraft, FlowError> {
        if file.bytes.is_empty() {
            return Err(FlowError::MissingFile);
        }
        let form = form.normalized()?;

        self.state = FlowState::Uploading;
        let outcome = self
            .api
            .upload_group_inscription(
                &form.responsible,
                &form.phone,
                form.event_id,
                &file.file_name,
                file.bytes,
            )
            .await;
        self.apply_upload_outcome(outcome)
    }

    // Transition for the upload result, split from `submit` so the state
    // machine is exercisable without a server.
    fn apply_upload_outcome(
        &mut self,
        outcome: Result<GroupInscriptionDraft, ApiError>,
    ) -> Result<GroupInscriptionDraft, FlowError> {
        match outcome {
            Ok(draft) => {
                if draft.cache_key.is_empty() {
                    self.state = FlowState::Idle;
                    return Err(FlowError::Api(ApiError::InvalidResponse(
                        "Upload response missing cacheKey".to_string(),
                    )));
                }
                if let Err(err) = self.store.save_draft(&draft) {
                    self.state = FlowState::Idle;
                    return Err(err.into());
                }
                info!(
                    cache_key = %draft.cache_key,
                    participants = draft.items.len(),
                    "group draft persisted"
                );
                self.state = FlowState::DraftPersisted {
                    cache_key: draft.cache_key.clone(),
                };
                Ok(draft)
            }
            Err(ApiError::Validation(batch)) => {
                // All-or-nothing: no row is applied until the whole file passes.
                warn!(rows = batch.errors.len(), "spreadsheet failed validation");
                self.state = FlowState::Idle;
                Err(FlowError::Validation(batch))
            }
            Err(err) => {
                self.state = FlowState::Idle;
                Err(FlowError::Api(err))
            }
        }
    }

    /// Load a persisted draft for the review screen and start the
    /// deadline. An absent draft (already confirmed, storage cleared,
    /// another device) is an error the caller redirects on.
    pub fn load(&mut self, cache_key: &str) -> Result<GroupInscriptionDraft, FlowError> {
        match self.store.load_draft(cache_key)? {
            Some(draft) => {
                let expires_at = Utc::now() + Duration::minutes(CONFIRMATION_DEADLINE_MINUTES);
                self.state = FlowState::AwaitingConfirmation {
                    cache_key: cache_key.to_string(),
                    expires_at,
                };
                Ok(draft)
            }
            None => {
                warn!(cache_key, "no persisted draft for confirmation key");
                Err(FlowError::StaleDraft)
            }
        }
    }

    /// Finalize the inscription. Only the cache key travels; the server
    /// owns the priced items. Success purges the local draft before
    /// reporting, so a back-navigation cannot re-confirm; failure keeps
    /// the draft for a retry.
    pub async fn confirm(&mut self) -> Result<GroupConfirmation, FlowError> {
        if self.check_expiry() {
            return Err(FlowError::Expired);
        }
        let (cache_key, expires_at) = match &self.state {
            FlowState::AwaitingConfirmation {
                cache_key,
                expires_at,
            } => (cache_key.clone(), *expires_at),
            _ => return Err(FlowError::InvalidState),
        };

        self.state = FlowState::Confirming {
            cache_key: cache_key.clone(),
            expires_at,
        };
        let outcome = self.api.confirm_group_inscription(&cache_key).await;
        self.apply_confirm_outcome(outcome)
    }

    fn apply_confirm_outcome(
        &mut self,
        outcome: Result<GroupConfirmation, ApiError>,
    ) -> Result<GroupConfirmation, FlowError> {
        let (cache_key, expires_at) = match &self.state {
            FlowState::Confirming {
                cache_key,
                expires_at,
            } => (cache_key.clone(), *expires_at),
            _ => return Err(FlowError::InvalidState),
        };
        match outcome {
            Ok(confirmation) => {
                if let Err(err) = self.store.remove_draft(&cache_key) {
                    warn!(cache_key = %cache_key, error = %err, "failed to purge confirmed draft");
                }
                info!(
                    inscription_id = confirmation.inscription_id,
                    "group inscription confirmed"
                );
                self.state = FlowState::Confirmed {
                    inscription_id: confirmation.inscription_id,
                    payment_enabled: confirmation.payment_enabled,
                };
                Ok(confirmation)
            }
            Err(err) => {
                // Draft retained; the operator may retry.
                self.state = FlowState::AwaitingConfirmation {
                    cache_key,
                    expires_at,
                };
                Err(FlowError::Api(err))
            }
        }
    }

    /// Abandon the draft. Local purge only; any server-side copy expires
    /// on its own.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        if let Some(cache_key) = self.current_cache_key() {
            self.store.remove_draft(&cache_key)?;
        }
        self.state = FlowState::Idle;
        Ok(())
    }

    /// Returns true exactly once, at the transition into Expired. The
    /// draft is purged on that transition; callers navigate away and
    /// notify the operator.
    pub fn check_expiry(&mut self) -> bool {
        let expired = match &self.state {
            FlowState::AwaitingConfirmation { expires_at, .. } => Utc::now() >= *expires_at,
            _ => false,
        };
        if !expired {
            return false;
        }
        if let Some(cache_key) = self.current_cache_key() {
            if let Err(err) = self.store.remove_draft(&cache_key) {
                warn!(cache_key = %cache_key, error = %err, "failed to purge expired draft");
            }
            info!(cache_key = %cache_key, "confirmation deadline elapsed, draft purged");
        }
        self.state = FlowState::Expired;
        true
    }

    /// Whole minutes left before the deadline, clamped at zero. Feeds
    /// the one-minute-resolution countdown display.
    pub fn minutes_remaining(&self) -> Option<i64> {
        match &self.state {
            FlowState::AwaitingConfirmation { expires_at, .. }
            | FlowState::Confirming { expires_at, .. } => {
                Some((*expires_at - Utc::now()).num_minutes().max(0))
            }
            _ => None,
        }
    }

    fn current_cache_key(&self) -> Option<String> {
        match &self.state {
            FlowState::DraftPersisted { cache_key }
            | FlowState::AwaitingConfirmation { cache_key, .. }
            | FlowState::Confirming { cache_key, .. } => Some(cache_key.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
