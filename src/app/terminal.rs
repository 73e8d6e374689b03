use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::DefaultTerminal;

/// Initialize the terminal for the application
pub fn init_terminal() -> color_eyre::Result<DefaultTerminal> {
    install_panic_hook();
    execute!(std::io::stdout(), EnterAlternateScreen, Hide)?;
    enable_raw_mode()?;

    let terminal =
        ratatui::Terminal::new(ratatui::backend::CrosstermBackend::new(std::io::stdout()))?;

    Ok(terminal)
}

/// Restore the terminal to its original state
pub fn restore_terminal() -> color_eyre::Result<()> {
    disable_raw_mode()?;
    execute!(std::io::stdout(), LeaveAlternateScreen, Show)?;
    Ok(())
}

/// Leave the alternate screen before the panic report is printed
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Err(e) = restore_terminal() {
            eprintln!("Failed to restore terminal: {}", e);
        }
        previous(info);
    }));
}
