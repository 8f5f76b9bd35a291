use std::fmt;

/// 16 raw bytes. GUIDs have no textual form on disk; the hex form exists
/// only at the JSON boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 16]
    }

    /// Lowercase hex, 32 characters, no separators.
    pub fn to_hex(&self) -> String {
        use fmt::Write;
        let mut out = String::with_capacity(32);
        for byte in self.0 {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Identifies a scene object by level name and path name.
///
/// References are by-value lookups; resolving them against a parsed save is
/// a consumer concern, so cycles cannot exist at the codec level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ObjectReference {
    pub level_name: String,
    pub path_name: String,
}

impl ObjectReference {
    pub fn new(level_name: impl Into<String>, path_name: impl Into<String>) -> Self {
        Self {
            level_name: level_name.into(),
            path_name: path_name.into(),
        }
    }

    /// Both names empty; the format uses this as a null reference.
    pub fn is_null(&self) -> bool {
        self.level_name.is_empty() && self.path_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_hex_form() {
        let guid = Guid([
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x00, 0xff, 0x10, 0x20, 0x30, 0x40,
            0x50, 0x60,
        ]);
        assert_eq!(guid.to_hex(), "0123456789abcdef00ff102030405060");
    }

    #[test]
    fn test_zero_guid() {
        assert!(Guid::default().is_zero());
        assert!(!Guid([1; 16]).is_zero());
    }

    #[test]
    fn test_null_reference() {
        assert!(ObjectReference::default().is_null());
        assert!(!ObjectReference::new("Persistent_Level", "Foo.Bar").is_null());
    }
}
