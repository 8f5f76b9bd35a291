use crate::error::PersistError;
use crate::format::{
    HEADER_VERSION_CURRENT, SAVE_VERSION_CURRENT, SAVE_VERSION_U6, SAVE_VERSION_U8,
};

/// Which era of the game a save's version integers place it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameVersion {
    /// Pre-U6. Not supported.
    TooOld,
    /// U6 or U7. Not supported.
    U6U7,
    /// U8. Not supported.
    U8,
    Current,
}

pub fn classify(save_version: u32, header_version: u32) -> GameVersion {
    if save_version < SAVE_VERSION_U6 {
        GameVersion::TooOld
    } else if save_version < SAVE_VERSION_U8 {
        GameVersion::U6U7
    } else if save_version < SAVE_VERSION_CURRENT || header_version < HEADER_VERSION_CURRENT {
        GameVersion::U8
    } else {
        GameVersion::Current
    }
}

/// Reject saves from game versions this codec no longer reads or writes.
/// The error names the last package release that still handled them.
pub fn ensure_supported(save_version: u32, header_version: u32) -> Result<(), PersistError> {
    let last_release = match classify(save_version, header_version) {
        GameVersion::Current => return Ok(()),
        GameVersion::TooOld => "0.0.34",
        GameVersion::U6U7 => "0.1.20",
        GameVersion::U8 => "0.4.28",
    };
    Err(PersistError::UnsupportedVersion {
        version: save_version,
        last_release,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(classify(5, 0), GameVersion::TooOld);
        assert_eq!(classify(28, 14), GameVersion::TooOld);
        assert_eq!(classify(29, 14), GameVersion::U6U7);
        assert_eq!(classify(33, 14), GameVersion::U6U7);
        assert_eq!(classify(34, 13), GameVersion::U8);
        assert_eq!(classify(45, 14), GameVersion::U8);
        assert_eq!(classify(46, 13), GameVersion::U8);
        assert_eq!(classify(46, 14), GameVersion::Current);
        assert_eq!(classify(50, 15), GameVersion::Current);
    }

    #[test]
    fn test_ancient_save_names_last_release() {
        let err = ensure_supported(5, 6).unwrap_err();
        match &err {
            PersistError::UnsupportedVersion {
                version,
                last_release,
            } => {
                assert_eq!(*version, 5);
                assert_eq!(*last_release, "0.0.34");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("0.0.34"));
    }

    #[test]
    fn test_u8_save_names_last_release() {
        let err = ensure_supported(42, 13).unwrap_err();
        assert!(err.to_string().contains("0.4.28"));
    }

    #[test]
    fn test_current_save_accepted() {
        assert!(ensure_supported(46, 14).is_ok());
    }
}
