use std::env;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use log::{debug, error};

/// 程序名带 `/` 时按路径直接使用，否则在 PATH 中查找。
pub fn resolve_program(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        return Some(PathBuf::from(name));
    }
    let env_path = match env::var("PATH") {
        Ok(x) => x,
        Err(e) => {
            error!("forksh: error with env PATH: {:?}", e);
            return None;
        }
    };
    find_file_in_path(name, &env_path)
}

/// 返回第一个同名且带可执行位的文件；只找到不可执行的同名文件时返回它，
/// 让 exec 报 EACCES。
pub fn find_file_in_path(filename: &str, env_path: &str) -> Option<PathBuf> {
    let mut fallback = None;
    for dir in env_path.split(':') {
        let dir = if dir.is_empty() { "." } else { dir };
        let candidate = PathBuf::from(dir).join(filename);
        match fs::metadata(&candidate) {
            Ok(meta) => {
                if !meta.is_file() {
                    continue;
                }
                if meta.permissions().mode() & 0o111 != 0 {
                    return Some(candidate);
                }
                debug!("forksh: {} 没有可执行权限", candidate.display());
                fallback.get_or_insert(candidate);
            }
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    continue;
                }
                error!("forksh: metadata error: {}: {}", candidate.display(), e);
            }
        }
    }
    fallback
}
