use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::LevelDef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: HashMap<String, ColorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub style: Vec<String>,
}

impl ColorConfig {
    fn new(foreground: &str, style: &[&str]) -> Self {
        Self {
            foreground: Some(foreground.to_string()),
            background: None,
            style: style.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct ThemeManager {
    themes: HashMap<String, Theme>,
    current_theme: String,
}

impl ThemeManager {
    pub fn new() -> Self {
        let mut manager = Self {
            themes: HashMap::new(),
            current_theme: "default".to_string(),
        };

        manager.load_default_themes();
        manager
    }

    pub fn set_theme(&mut self, theme_name: &str) -> bool {
        if self.themes.contains_key(theme_name) {
            self.current_theme = theme_name.to_string();
            true
        } else {
            false
        }
    }

    pub fn current_theme_name(&self) -> &str {
        &self.current_theme
    }

    pub fn get_current_theme(&self) -> Option<&Theme> {
        self.themes
            .get(&self.current_theme)
            .or_else(|| self.themes.get("default"))
    }

    pub fn apply_style(&self, text: &str, style_name: &str) -> String {
        match self
            .get_current_theme()
            .and_then(|theme| theme.colors.get(style_name))
        {
            Some(color_config) => paint(text, color_config),
            None => text.to_string(),
        }
    }

    pub fn style_tile(&self, text: &str, level: &LevelDef) -> String {
        let config = ColorConfig {
            foreground: Some(level.foreground.clone()),
            background: Some(level.background.clone()),
            style: vec!["bold".to_string()],
        };
        paint(text, &config)
    }

    pub fn list_themes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.themes.keys().cloned().collect();
        names.sort();
        names
    }

    fn load_default_themes(&mut self) {
        self.add_theme(
            "default",
            &[
                ("title", ColorConfig::new("cyan", &["bold"])),
                ("score", ColorConfig::new("yellow", &["bold"])),
                ("high_score", ColorConfig::new("magenta", &["bold"])),
                ("board_border", ColorConfig::new("bright_black", &[])),
                ("empty_cell", ColorConfig::new("bright_black", &["dimmed"])),
                ("game_over", ColorConfig::new("red", &["bold"])),
                ("error", ColorConfig::new("red", &["bold"])),
                ("success", ColorConfig::new("green", &["bold"])),
                ("warning", ColorConfig::new("yellow", &["bold"])),
                ("info", ColorConfig::new("blue", &[])),
                ("separator", ColorConfig::new("bright_black", &["dimmed"])),
            ],
        );

        self.add_theme(
            "dark",
            &[
                ("title", ColorConfig::new("bright_cyan", &["bold"])),
                ("score", ColorConfig::new("bright_yellow", &["bold"])),
                ("high_score", ColorConfig::new("bright_magenta", &["bold"])),
                ("board_border", ColorConfig::new("white", &[])),
                ("empty_cell", ColorConfig::new("bright_black", &[])),
                ("game_over", ColorConfig::new("bright_red", &["bold"])),
                ("error", ColorConfig::new("bright_red", &["bold"])),
                ("success", ColorConfig::new("bright_green", &["bold"])),
                ("warning", ColorConfig::new("bright_yellow", &["bold"])),
                ("info", ColorConfig::new("bright_blue", &[])),
                ("separator", ColorConfig::new("white", &["dimmed"])),
            ],
        );

        self.add_theme(
            "light",
            &[
                ("title", ColorConfig::new("blue", &["bold"])),
                ("score", ColorConfig::new("black", &["bold"])),
                ("high_score", ColorConfig::new("magenta", &["bold"])),
                ("board_border", ColorConfig::new("black", &[])),
                ("empty_cell", ColorConfig::new("bright_black", &[])),
                ("game_over", ColorConfig::new("red", &["bold", "underline"])),
                ("error", ColorConfig::new("red", &["bold"])),
                ("success", ColorConfig::new("green", &["bold"])),
                ("warning", ColorConfig::new("magenta", &["bold"])),
                ("info", ColorConfig::new("black", &[])),
                ("separator", ColorConfig::new("bright_black", &[])),
            ],
        );
    }

    fn add_theme(&mut self, name: &str, styles: &[(&str, ColorConfig)]) {
        let colors = styles
            .iter()
            .map(|(style, config)| (style.to_string(), config.clone()))
            .collect();

        self.themes.insert(
            name.to_string(),
            Theme {
                name: name.to_string(),
                colors,
            },
        );
    }
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new()
    }
}

fn paint(text: &str, color_config: &ColorConfig) -> String {
    let mut styled = text.normal();

    if let Some(color) = color_config.foreground.as_deref().and_then(parse_color) {
        styled = styled.color(color);
    }
    if let Some(color) = color_config.background.as_deref().and_then(parse_color) {
        styled = styled.on_color(color);
    }

    for style in &color_config.style {
        styled = match style.as_str() {
            "bold" => styled.bold(),
            "italic" => styled.italic(),
            "underline" => styled.underline(),
            "dimmed" => styled.dimmed(),
            _ => styled,
        };
    }

    styled.to_string()
}

fn parse_color(color_name: &str) -> Option<Color> {
    match color_name.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "bright_black" => Some(Color::BrightBlack),
        "bright_red" => Some(Color::BrightRed),
        "bright_green" => Some(Color::BrightGreen),
        "bright_yellow" => Some(Color::BrightYellow),
        "bright_blue" => Some(Color::BrightBlue),
        "bright_magenta" => Some(Color::BrightMagenta),
        "bright_cyan" => Some(Color::BrightCyan),
        "bright_white" => Some(Color::BrightWhite),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_manager_creation() {
        let manager = ThemeManager::new();
        assert_eq!(manager.current_theme_name(), "default");
        assert_eq!(manager.list_themes(), vec!["dark", "default", "light"]);
    }

    #[test]
    fn test_set_theme() {
        let mut manager = ThemeManager::new();

        assert!(manager.set_theme("dark"));
        assert_eq!(manager.current_theme_name(), "dark");

        assert!(!manager.set_theme("nonexistent"));
        assert_eq!(manager.current_theme_name(), "dark");
    }

    #[test]
    fn test_apply_style() {
        let manager = ThemeManager::new();

        let styled = manager.apply_style("Score", "score");
        assert!(styled.contains("Score"));

        let unstyled = manager.apply_style("Test", "nonexistent");
        assert_eq!(unstyled, "Test");
    }

    #[test]
    fn test_style_tile_keeps_text() {
        let manager = ThemeManager::new();
        let level = LevelDef::new(64, "red", "white");
        assert!(manager.style_tile("  64  ", &level).contains("64"));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("RED"), Some(Color::Red));
        assert_eq!(parse_color("bright_green"), Some(Color::BrightGreen));
        assert_eq!(parse_color("invalid"), None);
    }
}
