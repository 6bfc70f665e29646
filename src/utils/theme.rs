use colored::Colorize;

pub struct Theme {
    pub success_symbol: String,
    pub error_symbol: String,
    pub welcome_message: String,
    pub exit_message: String,
    pub prompt_style: Box<dyn Fn(&str) -> String>,
    pub error_style: Box<dyn Fn(String) -> String>,
    pub success_style: Box<dyn Fn(String) -> String>,
    pub debug_style: Box<dyn Fn(String) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            success_symbol: "✓".green().to_string(),
            error_symbol: "✗".red().to_string(),
            welcome_message: "psh - type `exit` to leave".bright_cyan().to_string(),
            exit_message: "bye".bright_blue().to_string(),
            prompt_style: Box::new(|s| s.bright_cyan().to_string()),
            error_style: Box::new(|s| s.bright_red().to_string()),
            success_style: Box::new(|s| s.green().to_string()),
            debug_style: Box::new(|s| s.dimmed().to_string()),
        }
    }
}

pub fn load_theme(theme_name: &str) -> Theme {
    match theme_name {
        "default" => Theme::default(),
        "dark" => Theme {
            success_symbol: "♦".bright_magenta().to_string(),
            error_symbol: "✗".red().to_string(),
            welcome_message: "psh - type `exit` to leave".bright_purple().to_string(),
            exit_message: "bye".bright_purple().to_string(),
            prompt_style: Box::new(|s| s.bright_purple().to_string()),
            error_style: Box::new(|s| s.red().to_string()),
            success_style: Box::new(|s| s.magenta().to_string()),
            debug_style: Box::new(|s| s.bright_black().to_string()),
        },
        _ => Theme::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_theme_falls_back() {
        colored::control::set_override(false);
        let theme = load_theme("neon");
        assert_eq!((theme.prompt_style)("psh> "), "psh> ");
        assert_eq!(theme.exit_message, "bye");
    }
}
