// Feed JSON export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use clientsync_recon::ClientFeedEntry;

use crate::error::IoError;

/// Serialize with a 4-space indent, the layout downstream consumers diff against.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the feed as a pretty-printed JSON array.
pub fn write_feed(path: &Path, feed: &[ClientFeedEntry]) -> Result<(), IoError> {
    let write_err = |message: String| IoError::Write { path: path.to_path_buf(), message };

    let text = to_pretty_string(feed).map_err(|e| write_err(e.to_string()))?;
    let file = File::create(path).map_err(|e| write_err(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes()).map_err(|e| write_err(e.to_string()))?;
    writer.flush().map_err(|e| write_err(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_four_space_indent() {
        let text = to_pretty_string(&serde_json::json!([{"id": "FACX-1"}])).unwrap();
        assert_eq!(text, "[\n    {\n        \"id\": \"FACX-1\"\n    }\n]");
    }

    #[test]
    fn test_empty_feed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.json");

        write_feed(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[]");
    }

    #[test]
    fn test_unwritable_path() {
        let err = write_feed(Path::new("/nonexistent/dir/feed.json"), &[]).unwrap_err();
        assert!(matches!(err, IoError::Write { .. }));
    }
}
