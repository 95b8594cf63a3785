use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use blockcam_core::ansi::RESET;
use blockcam_core::{Color, TerminalGeometry};
use crossterm::{cursor, terminal};
use log::debug;

/// Terminal size in cells, or [`TerminalGeometry::FALLBACK`] when stdout is
/// not a terminal or the size cannot be read.
pub fn query_geometry() -> TerminalGeometry {
    if !io::stdout().is_terminal() {
        return TerminalGeometry::FALLBACK;
    }
    match terminal::size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => TerminalGeometry::new(cols, rows),
        Ok(_) => TerminalGeometry::FALLBACK,
        Err(e) => {
            debug!("terminal size query failed: {e}");
            TerminalGeometry::FALLBACK
        }
    }
}

/// Geometry available to a frame: every row ends in a newline, so the last
/// terminal row is left for the cursor or the output would scroll.
pub fn usable_geometry(queried: TerminalGeometry, cols: Option<u16>, rows: Option<u16>) -> TerminalGeometry {
    TerminalGeometry::new(
        cols.unwrap_or(queried.columns),
        rows.unwrap_or_else(|| queried.rows.saturating_sub(1).max(1)),
    )
}

/// Background the image is composited onto.
pub fn background_color(requested: Option<Color>) -> Color {
    requested.unwrap_or(Color::DEFAULT_BACKGROUND)
}

/// Set once the terminal has been restored, so the panic hook and the
/// guard's drop during unwinding do not both write.
static RESTORED: AtomicBool = AtomicBool::new(false);

/// Hides the cursor and clears the screen; restores the terminal on drop,
/// whichever way playback ends.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> anyhow::Result<Self> {
        console::save_mode();

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore(&mut io::stdout(), &RESTORED);
            original_hook(info);
        }));

        // On Windows this is also where crossterm turns on VT processing
        crossterm::execute!(
            io::stdout(),
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )
        .context("failed to prepare terminal")?;

        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore(&mut io::stdout(), &RESTORED);
    }
}

/// Resets colors, shows the cursor and puts back the saved console mode.
/// Only the first call for a given `restored` flag writes anything.
fn restore(out: &mut impl Write, restored: &AtomicBool) {
    if restored.swap(true, Ordering::SeqCst) {
        return;
    }
    let _ = out.write_all(RESET);
    let _ = crossterm::queue!(out, cursor::Show);
    let _ = out.flush();
    console::restore_mode();
}

/// Writes a newline when dropped. Created before anything can fail so that
/// every exit, including an error return or a panic, leaves the shell
/// prompt on a fresh line.
pub struct ExitNewline<W: Write> {
    out: W,
}

impl<W: Write> ExitNewline<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Drop for ExitNewline<W> {
    fn drop(&mut self) {
        let _ = self.out.write_all(b"\n");
        let _ = self.out.flush();
    }
}

#[cfg(windows)]
mod console {
    use std::sync::OnceLock;

    use crossterm_winapi::ConsoleMode;
    use log::debug;

    static SAVED_MODE: OnceLock<u32> = OnceLock::new();

    pub fn save_mode() {
        match ConsoleMode::new().and_then(|console| console.mode()) {
            Ok(mode) => {
                let _ = SAVED_MODE.set(mode);
            }
            Err(e) => debug!("console mode query failed: {e}"),
        }
    }

    pub fn restore_mode() {
        let Some(&mode) = SAVED_MODE.get() else {
            return;
        };
        if let Err(e) = ConsoleMode::new().and_then(|console| console.set_mode(mode)) {
            debug!("console mode restore failed: {e}");
        }
    }
}

#[cfg(not(windows))]
mod console {
    pub fn save_mode() {}

    pub fn restore_mode() {}
}
