use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const ROTATION_MARKER: &[u8] = b"--- valuecast log rotated, older runs removed ---\n";

/// Size limits for the report log file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate once the file grows past this many bytes
    pub max_bytes: u64,
    /// Tail kept after rotation, trimmed forward to a line boundary
    pub keep_bytes: u64,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            keep_bytes: 1024 * 1024,
        }
    }
}

impl RotationPolicy {
    /// Trim `path` to its most recent complete lines when it is oversized.
    ///
    /// Returns whether the file was rewritten. A missing file is not an error.
    pub fn apply(&self, path: &Path) -> io::Result<bool> {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if size <= self.max_bytes {
            return Ok(false);
        }

        let tail = read_tail(path, size, self.keep_bytes.min(size))?;
        let start = tail
            .iter()
            .position(|&b| b == b'\n')
            .map_or(tail.len(), |i| i + 1);

        let mut file = File::create(path)?;
        file.write_all(ROTATION_MARKER)?;
        file.write_all(&tail[start..])?;
        Ok(true)
    }
}

fn read_tail(path: &Path, size: u64, len: u64) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(size - len))?;
    let mut tail = Vec::with_capacity(len as usize);
    file.read_to_end(&mut tail)?;
    Ok(tail)
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("valuecast={level},valuecast_core=warn")))
}

/// Initialize logging to stderr, or to `log_file` when one is given.
///
/// Log files are trimmed with the default [`RotationPolicy`] before the run
/// appends to them. `RUST_LOG` overrides `level`.
pub fn init_logging(log_file: Option<&Path>, level: &str) -> color_eyre::Result<()> {
    let Some(log_path) = log_file else {
        tracing_subscriber::registry()
            .with(env_filter(level))
            .with(fmt::layer().with_writer(io::stderr).with_target(false))
            .init();
        return Ok(());
    };

    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let rotated = RotationPolicy::default().apply(log_path);
    if let Err(e) = &rotated {
        eprintln!("Warning: could not trim {}: {e}", log_path.display());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    tracing::info!(
        log_path = %log_path.display(),
        rotated = matches!(rotated, Ok(true)),
        "valuecast logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_policy() -> RotationPolicy {
        RotationPolicy {
            max_bytes: 64,
            keep_bytes: 20,
        }
    }

    #[test]
    fn test_small_log_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valuecast.log");
        fs::write(&path, "line one\nline two\n").unwrap();

        assert!(!small_policy().apply(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "line one\nline two\n");
    }

    #[test]
    fn test_oversized_log_keeps_whole_recent_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valuecast.log");
        let content: String = (0..10).map(|i| format!("run {i:02} done\n")).collect();
        fs::write(&path, &content).unwrap();

        assert!(small_policy().apply(&path).unwrap());
        let rotated = fs::read_to_string(&path).unwrap();
        let mut lines = rotated.lines();
        assert_eq!(
            lines.next().unwrap().as_bytes(),
            ROTATION_MARKER.trim_ascii_end()
        );
        // 12-byte lines: a 20-byte tail holds one complete line
        assert_eq!(lines.collect::<Vec<_>>(), vec!["run 09 done"]);
    }

    #[test]
    fn test_tail_without_newline_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valuecast.log");
        fs::write(&path, "x".repeat(100)).unwrap();

        assert!(small_policy().apply(&path).unwrap());
        assert_eq!(fs::read(&path).unwrap(), ROTATION_MARKER);
    }

    #[test]
    fn test_missing_log_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.log");
        assert!(!RotationPolicy::default().apply(&path).unwrap());
        assert!(!path.exists());
    }
}
