use console::Term;
use std::io::{self, Write};

use crate::core::{BoardSnapshot, LevelSequence};
use crate::ui::ThemeManager;

pub struct Display {
    term: Term,
    theme_manager: ThemeManager,
    cell_width: usize,
}

impl Display {
    pub fn new(theme_manager: ThemeManager, cell_width: usize) -> io::Result<Self> {
        Ok(Self {
            term: Term::stdout(),
            theme_manager,
            cell_width,
        })
    }

    pub fn clear_screen(&self) -> io::Result<()> {
        self.term.clear_screen()
    }

    pub fn show_title(&self, title: &str) -> io::Result<()> {
        let styled_title = self.theme_manager.apply_style(title, "title");
        writeln!(io::stdout(), "{}", styled_title)?;
        writeln!(io::stdout())?;
        Ok(())
    }

    pub fn board_lines(&self, snapshot: &BoardSnapshot, levels: &LevelSequence) -> Vec<String> {
        let border = format!(
            "+{}+",
            vec!["-".repeat(self.cell_width); snapshot.width].join("+")
        );
        let styled_border = self.theme_manager.apply_style(&border, "board_border");
        let bar = self.theme_manager.apply_style("|", "board_border");

        let mut lines = vec![styled_border.clone()];
        for row in snapshot.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| self.render_cell(*cell, levels))
                .collect();
            lines.push(format!("{}{}{}", bar, cells.join(&bar), bar));
            lines.push(styled_border.clone());
        }
        lines
    }

    fn render_cell(&self, level: Option<usize>, levels: &LevelSequence) -> String {
        match level.and_then(|level| levels.get(level).ok()) {
            Some(def) => {
                let text = format!("{:^width$}", def.value, width = self.cell_width);
                self.theme_manager.style_tile(&text, def)
            }
            None => {
                let text = format!("{:^width$}", ".", width = self.cell_width);
                self.theme_manager.apply_style(&text, "empty_cell")
            }
        }
    }

    pub fn show_board(&self, snapshot: &BoardSnapshot, levels: &LevelSequence) -> io::Result<()> {
        for line in self.board_lines(snapshot, levels) {
            writeln!(io::stdout(), "  {}", line)?;
        }
        writeln!(io::stdout())?;
        Ok(())
    }

    pub fn show_scores(&self, score: u64, high_score: u64, moves: u64) -> io::Result<()> {
        let score_text = self.theme_manager.apply_style(&format!("Score: {}", score), "score");
        let high_text = self
            .theme_manager
            .apply_style(&format!("Best: {}", high_score), "high_score");
        let moves_text = self.theme_manager.apply_style(&format!("Moves: {}", moves), "info");

        writeln!(io::stdout(), "  {}   {}   {}", score_text, high_text, moves_text)?;
        writeln!(io::stdout())?;
        Ok(())
    }

    pub fn show_controls(&self) -> io::Result<()> {
        self.show_message("  W/A/S/D or arrows to move, R to restart, Q to quit", "info")
    }

    pub fn show_game_over(&self, score: u64) -> io::Result<()> {
        let text = format!("  Game over! Final score: {}", score);
        self.show_message(&text, "game_over")
    }

    pub fn show_message(&self, message: &str, style: &str) -> io::Result<()> {
        let styled_message = self.theme_manager.apply_style(message, style);
        writeln!(io::stdout(), "{}", styled_message)?;
        Ok(())
    }

    pub fn show_error(&self, error: &str) -> io::Result<()> {
        self.show_message(&format!("Error: {}", error), "error")
    }

    pub fn show_success(&self, message: &str) -> io::Result<()> {
        self.show_message(message, "success")
    }

    pub fn show_info(&self, message: &str) -> io::Result<()> {
        self.show_message(message, "info")
    }

    pub fn show_separator(&self, width: usize) -> io::Result<()> {
        let separator = "═".repeat(width);
        self.show_message(&separator, "separator")
    }

    pub fn wait_for_enter(&self) -> io::Result<()> {
        self.show_info("Press Enter to continue...")?;
        self.term.read_line()?;
        Ok(())
    }

    pub fn set_theme(&mut self, theme_name: &str) -> bool {
        self.theme_manager.set_theme(theme_name)
    }

    pub fn get_available_themes(&self) -> Vec<String> {
        self.theme_manager.list_themes()
    }
}
