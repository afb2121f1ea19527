//! Common Utilities Module
//!
//! Small path helpers shared by the converter.

use serde::Serializer;
use std::path::Path;

/// 安全地获取文件扩展名（小写）
///
/// Returns an empty string when the path has no (UTF-8) extension.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::get_extension_lowercase;
///
/// assert_eq!(get_extension_lowercase(Path::new("test.JPG")), "jpg");
/// assert_eq!(get_extension_lowercase(Path::new("dir.v2/noext")), "");
/// ```
pub fn get_extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// `serialize_with` for paths in JSON output; names that are not valid UTF-8
/// are written lossily instead of failing the whole document.
pub fn serialize_path_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_extension_lowercase() {
        assert_eq!(get_extension_lowercase(Path::new("a/b/c.PnG")), "png");
        assert_eq!(get_extension_lowercase(Path::new("archive.tar.GZ")), "gz");
        assert_eq!(get_extension_lowercase(Path::new(".hidden")), "");
        assert_eq!(get_extension_lowercase(Path::new("")), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_serialize_path_lossy() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        #[derive(serde::Serialize)]
        struct Named {
            #[serde(serialize_with = "serialize_path_lossy")]
            path: std::path::PathBuf,
        }

        let named = Named {
            path: Path::new("dir").join(OsStr::from_bytes(b"caf\xe9.png")),
        };
        let json = serde_json::to_string(&named).unwrap();
        assert_eq!(json, "{\"path\":\"dir/caf\u{fffd}.png\"}");
    }
}
