//! Privilege Gate
//!
//! Stops the bootstrap when the caller asked for root and the process does
//! not run with effective uid 0.

use crate::error::{PreflightError, Result};

/// Effective user id of the superuser
pub const ROOT_UID: u32 = 0;

/// Effective user id of the current process
#[cfg(unix)]
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() }
}

/// Platforms without uids never satisfy a root requirement
#[cfg(not(unix))]
pub fn effective_uid() -> u32 {
    u32::MAX
}

/// Whether the current process runs as root
pub fn is_root() -> bool {
    effective_uid() == ROOT_UID
}

/// Fail unless `effective_uid` is root, when root is required
pub fn check_privilege(required: bool, effective_uid: u32) -> Result<()> {
    if !required {
        return Ok(());
    }
    tracing::debug!(effective_uid, "checking root privilege");
    if effective_uid != ROOT_UID {
        return Err(PreflightError::validation(format!(
            "UID: {}. This script must be run as root.",
            effective_uid
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_required() {
        assert!(check_privilege(false, 1000).is_ok());
    }

    #[test]
    fn test_root_passes() {
        assert!(check_privilege(true, ROOT_UID).is_ok());
    }

    #[test]
    fn test_non_root_fails() {
        let err = check_privilege(true, 1000).unwrap_err();
        assert_eq!(err.to_string(), "UID: 1000. This script must be run as root.");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_is_root_matches_effective_uid() {
        assert_eq!(is_root(), effective_uid() == ROOT_UID);
    }
}
