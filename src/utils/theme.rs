use colored::Colorize;

pub struct Theme {
    pub prompt: String,
    pub welcome_message: String,
    pub exit_message: String,
    pub status_style: Box<dyn Fn(String) -> String>,
    pub prompt_style: Box<dyn Fn(String) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt: String::from("forksh> "),
            welcome_message: String::from("welcome to forksh!"),
            exit_message: String::from("goodbye!"),
            status_style: Box::new(|s| s.bright_red().to_string()),
            prompt_style: Box::new(|s| s.bright_cyan().to_string()),
        }
    }
}

impl Theme {
    pub fn load_theme(theme_name: &str) -> Theme {
        match theme_name {
            "dark" => Theme {
                status_style: Box::new(|s| s.red().to_string()),
                prompt_style: Box::new(|s| s.bright_purple().to_string()),
                ..Theme::default()
            },
            _ => Theme::default(),
        }
    }

    /// 上一条命令失败时在提示符前带上退出码
    pub fn render_prompt(&self, last_status: i32) -> String {
        let prompt = (self.prompt_style)(self.prompt.clone());
        if last_status == 0 {
            prompt
        } else {
            format!("{} {}", (self.status_style)(format!("[{}]", last_status)), prompt)
        }
    }
}
