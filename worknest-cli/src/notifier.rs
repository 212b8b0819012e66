use owo_colors::OwoColorize;
use worknest_core::{Notice, NoticeLevel, Notifier};

/// Prints notices to stderr as they arrive.
#[derive(Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => eprintln!("  {}", notice.message.cyan()),
            NoticeLevel::Warning => eprintln!("  {} {}", "!".yellow(), notice.message.yellow()),
            NoticeLevel::Error => eprintln!("  {} {}", "x".red(), notice.message.red()),
        }
    }
}
