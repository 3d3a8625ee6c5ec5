//! Enrollment filename validation.
//!
//! Enrollment images must be named `<name>_<numeric id>.<jpg|jpeg|png>`
//! (extension case-insensitive). A bad filename is an expected condition
//! reported in the training summary, not a defect.

use thiserror::Error;

use crate::store::Identity;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Why a filename was rejected for enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("invalid file extension")]
    Extension,
    #[error("filename must contain exactly one underscore")]
    Separator,
    #[error("ID must be numeric")]
    NonNumericId,
}

/// Parse `filename` as a valid enrollment image name, returning the identity
/// it encodes.
pub fn validate_filename(filename: &str) -> Result<Identity, RejectReason> {
    let (stem, ext) = filename.rsplit_once('.').ok_or(RejectReason::Extension)?;
    if !ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    {
        return Err(RejectReason::Extension);
    }

    if stem.matches('_').count() != 1 {
        return Err(RejectReason::Separator);
    }
    let (name, id) = stem.split_once('_').ok_or(RejectReason::Separator)?;

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(RejectReason::NonNumericId);
    }

    Ok(Identity {
        name: name.to_string(),
        id: id.to_string(),
    })
}
