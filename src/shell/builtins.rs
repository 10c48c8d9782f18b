use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::mem::ManuallyDrop;
use std::os::fd::FromRawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use log::debug;

use crate::shell::executor::status::{FAILURE, SUCCESS};

const USAGE: i32 = 2;

/// 内建命令使用的三个标准流
pub struct Streams<'a> {
    pub stdin: &'a mut dyn Read,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// 直接在 fd 0/1/2 上读写，不经过 std 的缓冲和锁，
/// fork 之后的子进程里也能安全使用。
pub fn with_process_streams<T>(f: impl FnOnce(&mut Streams<'_>) -> T) -> T {
    // 这里只借用描述符，ManuallyDrop 保证不会关掉它们
    let stdin = ManuallyDrop::new(unsafe { File::from_raw_fd(libc::STDIN_FILENO) });
    let stdout = ManuallyDrop::new(unsafe { File::from_raw_fd(libc::STDOUT_FILENO) });
    let stderr = ManuallyDrop::new(unsafe { File::from_raw_fd(libc::STDERR_FILENO) });
    let (mut stdin, mut stdout, mut stderr) = (&*stdin, &*stdout, &*stderr);
    let mut streams = Streams {
        stdin: &mut stdin,
        stdout: &mut stdout,
        stderr: &mut stderr,
    };
    f(&mut streams)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Ls,
    Cat,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "ls" => Some(Builtin::Ls),
            "cat" => Some(Builtin::Cat),
            _ => None,
        }
    }

    /// `args` 不含命令名本身
    pub fn run(self, args: &[String], streams: &mut Streams<'_>) -> i32 {
        debug!("执行内建命令: {:?} {:?}", self, args);
        match self {
            Builtin::Cd => builtin_cd(args, streams),
            Builtin::Ls => builtin_ls(args, streams),
            Builtin::Cat => builtin_cat(args, streams),
        }
    }
}

fn report(streams: &mut Streams<'_>, message: std::fmt::Arguments<'_>) {
    log::warn!("{}", message);
    let _ = writeln!(streams.stderr, "error: {}", message);
}

fn builtin_cd(args: &[String], streams: &mut Streams<'_>) -> i32 {
    let Some(path) = args.first() else {
        return SUCCESS;
    };
    match std::env::set_current_dir(path) {
        Ok(()) => SUCCESS,
        Err(e) => {
            report(streams, format_args!("cd: {}: {}", path, e));
            FAILURE
        }
    }
}

fn builtin_ls(args: &[String], streams: &mut Streams<'_>) -> i32 {
    let dir = match args {
        [] => ".",
        [dir] => dir.as_str(),
        _ => {
            report(streams, format_args!("ls: usage: ls [dir]"));
            return USAGE;
        }
    };

    let mut names = match list_dir(Path::new(dir)) {
        Ok(names) => names,
        Err(e) => {
            report(streams, format_args!("ls: {}: {}", dir, e));
            return FAILURE;
        }
    };
    names.sort();

    let mut listing = Vec::new();
    for name in names {
        listing.extend_from_slice(&name);
        listing.push(b'\n');
    }
    match streams.stdout.write_all(&listing) {
        Ok(()) => SUCCESS,
        Err(e) => {
            report(streams, format_args!("ls: write error: {}", e));
            FAILURE
        }
    }
}

fn list_dir(dir: &Path) -> io::Result<Vec<Vec<u8>>> {
    fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().as_bytes().to_vec()))
        .collect()
}

fn builtin_cat(args: &[String], streams: &mut Streams<'_>) -> i32 {
    if args.is_empty() {
        return cat_stdin(streams);
    }

    let mut status = SUCCESS;
    for name in args {
        if name == "-" {
            if cat_stdin(streams) != SUCCESS {
                status = FAILURE;
            }
            continue;
        }
        // 打不开的文件报告后继续处理剩下的
        let mut file = match File::open(name) {
            Ok(file) => file,
            Err(e) => {
                report(streams, format_args!("cat: {}: {}", name, e));
                status = FAILURE;
                continue;
            }
        };
        if let Err(e) = io::copy(&mut file, streams.stdout) {
            report(streams, format_args!("cat: {}: {}", name, e));
            status = FAILURE;
        }
    }
    status
}

fn cat_stdin(streams: &mut Streams<'_>) -> i32 {
    match io::copy(streams.stdin, streams.stdout) {
        Ok(_) => SUCCESS,
        Err(e) => {
            report(streams, format_args!("cat: -: {}", e));
            FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Captured {
        status: i32,
        stdout: Vec<u8>,
        stderr: String,
    }

    #[allow(clippy::unwrap_used)]
    fn run(builtin: Builtin, args: &[&str], input: &[u8]) -> Captured {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut stdin = Cursor::new(input.to_vec());
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = builtin.run(
            &args,
            &mut Streams {
                stdin: &mut stdin,
                stdout: &mut stdout,
                stderr: &mut stderr,
            },
        );
        Captured {
            status,
            stdout,
            stderr: String::from_utf8(stderr).unwrap(),
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Builtin::lookup("cd"), Some(Builtin::Cd));
        assert_eq!(Builtin::lookup("ls"), Some(Builtin::Ls));
        assert_eq!(Builtin::lookup("cat"), Some(Builtin::Cat));
        assert_eq!(Builtin::lookup("CAT"), None);
        assert_eq!(Builtin::lookup("echo"), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_ls_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta", "Alpha", "beta", "10", "2"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("gamma")).unwrap();

        let out = run(Builtin::Ls, &[dir.path().to_str().unwrap()], b"");
        assert_eq!(out.status, 0);
        assert_eq!(
            String::from_utf8(out.stdout).unwrap(),
            "10\n2\nAlpha\nbeta\ngamma\nzeta\n"
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_ls_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(Builtin::Ls, &[dir.path().to_str().unwrap()], b"");
        assert_eq!(out.status, 0);
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_ls_missing_dir() {
        let out = run(Builtin::Ls, &["/definitely/not/a/dir"], b"");
        assert_eq!(out.status, 1);
        assert!(out.stderr.starts_with("error: ls: /definitely/not/a/dir"));
    }

    #[test]
    fn test_ls_too_many_operands() {
        let out = run(Builtin::Ls, &["a", "b"], b"");
        assert_eq!(out.status, 2);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_cat_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"first\n").unwrap();
        fs::write(&b, [0u8, 159, 146, 150, b'\n']).unwrap();

        let out = run(
            Builtin::Cat,
            &[a.to_str().unwrap(), b.to_str().unwrap()],
            b"",
        );
        assert_eq!(out.status, 0);
        assert_eq!(out.stdout, b"first\n\x00\x9f\x92\x96\n");
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_cat_missing_file_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, b"still here").unwrap();

        let out = run(
            Builtin::Cat,
            &["/definitely/not/a/file", a.to_str().unwrap()],
            b"",
        );
        assert_eq!(out.status, 1);
        assert_eq!(out.stdout, b"still here");
        assert!(out.stderr.starts_with("error: cat: /definitely/not/a/file"));
    }

    #[test]
    fn test_cat_without_operands_copies_stdin() {
        let out = run(Builtin::Cat, &[], b"hello");
        assert_eq!(out.status, 0);
        assert_eq!(out.stdout, b"hello");

        let out = run(Builtin::Cat, &["-"], b"dash");
        assert_eq!(out.stdout, b"dash");
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_cd_failures_and_noop() {
        let before = std::env::current_dir().unwrap();

        let out = run(Builtin::Cd, &[], b"");
        assert_eq!(out.status, 0);

        let out = run(Builtin::Cd, &["/definitely/not/a/dir"], b"");
        assert_eq!(out.status, 1);
        assert!(out.stderr.starts_with("error: cd: /definitely/not/a/dir"));

        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
