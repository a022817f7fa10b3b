//! JSON file helpers shared by every store that writes human-readable output.

use std::path::Path;

use serde::Serialize;

use crate::error::CorpusError;

/// Serialize `value` with a four-space indent, leaving non-ASCII text unescaped.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_pretty_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write `value` to `path` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem operation fails.
pub async fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CorpusError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = to_pretty_vec(value)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn four_space_indent_and_unescaped_text() {
        let mut map = BTreeMap::new();
        map.insert("1", "玉山銀行");
        let out = String::from_utf8(to_pretty_vec(&map).unwrap()).unwrap();
        assert_eq!(out, "{\n    \"1\": \"玉山銀行\"\n}");
    }

    #[tokio::test]
    async fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_pretty(&path, &vec![1, 2]).await.unwrap();
        let back: Vec<i32> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2]);
    }
}
