//! Group inscription upload and confirmation flow.
//!
//! The one multi-step operation in the console: a responsible uploads a
//! participant spreadsheet, the server validates and prices it into a
//! draft keyed by an opaque cache key, the draft is held locally while
//! the operator reviews it, and a confirm (or cancel, or a 30-minute
//! deadline) resolves it.

pub mod draft;
pub mod flow;

pub use draft::{GroupConfirmation, GroupInscriptionDraft, GroupItem, TypeGroup};
pub use flow::{FlowError, FlowState, GroupForm, GroupInscriptionFlow, SpreadsheetFile};
