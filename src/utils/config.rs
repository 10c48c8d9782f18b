use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub config_dir: PathBuf,
    pub theme: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/forksh")
        } else {
            env::temp_dir().join("forksh")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from(env!("CARGO_PKG_NAME")),
            theme: String::from("default"),
            history_file: config_dir.join(".forksh_history"),
            editor_mode: String::from("vi"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
            config_dir,
        }
    }

    pub fn new() -> Self {
        // 优先加载 .env 文件
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();
        config.apply_env();

        // 日志此时还没初始化，失败直接写 stderr
        if let Err(e) = config.ensure_history_dir() {
            eprintln!(
                "无法创建历史记录目录 {}: {}",
                config.history_file.display(),
                e
            );
        }

        config
    }

    /// 确保历史文件所在目录存在
    fn ensure_history_dir(&self) -> io::Result<()> {
        match self.history_file.parent() {
            Some(parent) => fs::create_dir_all(parent),
            None => Ok(()),
        }
    }

    fn apply_env(&mut self) {
        if let Ok(theme) = env::var("FORKSH_THEME") {
            self.theme = theme;
        }

        if let Ok(editor) = env::var("FORKSH_EDITOR") {
            self.editor_mode = editor;
        }

        if let Ok(history) = env::var("FORKSH_HISTORY") {
            self.history_file = PathBuf::from(history);
        }

        if let Ok(level) = env::var("FORKSH_LOG_LEVEL") {
            self.logger_level = level;
        }

        if let Ok(dir) = env::var("FORKSH_LOG_DIR") {
            self.logger_dir = PathBuf::from(dir);
        }
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "emacs" => EditMode::Emacs,
            _ => EditMode::Vi,
        }
    }
}
