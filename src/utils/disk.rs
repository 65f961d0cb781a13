use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

/// Total bytes of regular files under `dir` for which `keep` returns true.
///
/// Engines delete files in the background (rolled logs, compacted tables), so
/// entries that vanish between listing and stat are skipped, as is a missing `dir`.
pub(crate) fn dir_bytes<F>(dir: &Path, keep: F) -> std::io::Result<u64>
where
    F: Fn(&Path) -> bool,
{
    let mut total = 0;
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if is_not_found(&e) => continue,
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() || !keep(entry.path()) {
            continue;
        }
        match entry.metadata() {
            Ok(m) => total += m.len(),
            Err(e) if is_not_found(&e) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}

fn is_not_found(e: &walkdir::Error) -> bool {
    e.io_error().map_or(false, |io| io.kind() == ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sums_matching_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("journals")).unwrap();
        fs::write(dir.path().join("000001.log"), [0u8; 10]).unwrap();
        fs::write(dir.path().join("journals/0"), [0u8; 5]).unwrap();
        fs::write(dir.path().join("000002.sst"), [0u8; 7]).unwrap();

        assert_eq!(dir_bytes(dir.path(), |_| true).unwrap(), 22);
        let logs = dir_bytes(dir.path(), |p| p.extension().map_or(false, |e| e == "log")).unwrap();
        assert_eq!(logs, 10);
    }

    #[test]
    fn test_vanished_dir_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("deleted-by-compaction");
        assert_eq!(dir_bytes(&gone, |_| true).unwrap(), 0);
    }
}
