use std::env;
use std::fs::read_dir;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use log::error;

/// Searches each directory of the colon separated `search_path` for an
/// entry named `filename`. With `exec` set, entries without any execute
/// bit are skipped.
pub fn find_file_in_path(filename: &str, search_path: &str, exec: bool) -> Option<PathBuf> {
    for p in search_path.split(':').filter(|p| !p.is_empty()) {
        match read_dir(p) {
            Ok(list) => {
                for entry in list.flatten() {
                    if entry.file_name() != filename {
                        continue;
                    }

                    if exec {
                        let meta = match entry.metadata() {
                            Ok(x) => x,
                            Err(e) => {
                                error!("psh: metadata error: {:?}", e);
                                continue;
                            }
                        };
                        if meta.is_dir() || meta.permissions().mode() & 0o111 == 0 {
                            // not binary
                            continue;
                        }
                    }

                    return Some(entry.path());
                }
            }
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    continue;
                }
                error!("psh: fs read_dir error: {}: {}", p, e);
            }
        }
    }
    None
}

pub fn current_dir() -> String {
    match env::current_dir() {
        Ok(dir) => dir.to_string_lossy().to_string(),
        Err(e) => {
            error!("psh: env current_dir error: {}", e);
            String::new()
        }
    }
}
