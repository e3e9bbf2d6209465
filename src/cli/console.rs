use colored::*;

/// Width of section banners and separators
pub const LINE_WIDTH: usize = 70;

/// Console handles all terminal output with colored formatting
pub struct Console {
    user_color: Color,
    assistant_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            user_color: Color::Cyan,
            assistant_color: Color::Green,
        }
    }

    /// Print a section header between two banner lines
    pub fn print_section(&self, title: &str) {
        println!();
        println!("{}", "=".repeat(LINE_WIDTH).bright_blue());
        println!("{}", title.bright_blue().bold());
        println!("{}", "=".repeat(LINE_WIDTH).bright_blue());
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(LINE_WIDTH).bright_black());
    }

    /// Print a user message with colored formatting
    pub fn print_user(&self, message: &str) {
        println!("{} {}", "User:".color(self.user_color).bold(), message);
    }

    /// Print a complete assistant message with colored formatting
    pub fn print_assistant(&self, message: &str) {
        println!(
            "{} {}",
            "Assistant:".color(self.assistant_color).bold(),
            message.color(self.assistant_color)
        );
    }

    /// Print a system message (errors, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Print a passed check
    pub fn print_ok(&self, message: &str) {
        println!("{} {}", "✅".green(), message);
    }

    /// Print a failed check
    pub fn print_failed(&self, message: &str) {
        println!("{} {}", "❌".red(), message.red());
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", "⚠️ ".yellow(), message.yellow());
    }

    /// Print an aligned `label: value` line
    pub fn print_field(&self, label: &str, value: &str) {
        println!("{:<18} {}", format!("{}:", label).bold(), value);
    }

    /// Print a plain line
    pub fn println(&self, line: &str) {
        println!("{}", line);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
