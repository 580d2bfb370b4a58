use std::{
    collections::HashSet,
    fmt::Write as _,
    io::{self, IsTerminal, Write},
};

use app::{worker::ConsumerWorker, BoxFuture, FutureExt};
use ticker_grid::{changed_symbols, DisplayRow, PollState};
use tokio::sync::watch;
use tracing::{debug, warn};

const CELL_WIDTH: usize = 22;
const HEADER_LABELS: [&str; 4] = ["name:", "last:", "highestBid:", "percentChange:"];
const CLEAR: &str = "\x1b[2J\x1b[H";
const BANNER_ON: &str = "\x1b[41;97m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    About,
    Table(PollState),
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub columns: usize,
    pub ansi: bool,
}

fn fit(text: &str) -> String {
    let width = CELL_WIDTH - 1;
    if text.chars().count() > width {
        text.chars().take(width - 1).chain(['~']).collect()
    } else {
        text.to_string()
    }
}

fn cell_lines(row: &DisplayRow, changed: &HashSet<String>) -> [String; 4] {
    match row {
        DisplayRow::Header(_) => HEADER_LABELS.map(|label| format!("{label:>w$}", w = CELL_WIDTH - 1)),
        DisplayRow::Data(data) => {
            let marker = if changed.contains(&data.symbol) { "*" } else { "" };
            [
                format!("{marker}{}", data.symbol),
                data.record.last.clone(),
                data.record.highest_bid.clone(),
                data.record.percent_change.clone(),
            ]
        }
    }
}

fn render_grid(out: &mut String, rows: &[DisplayRow], changed: &HashSet<String>, columns: usize) {
    let columns = columns.max(1);
    let separator = "-".repeat(columns * (CELL_WIDTH + 1));

    for visual_row in rows.chunks(columns) {
        let cells = visual_row
            .iter()
            .map(|row| cell_lines(row, changed))
            .collect::<Vec<_>>();
        for line in 0..HEADER_LABELS.len() {
            let text = cells
                .iter()
                .map(|cell| format!("{:<w$}", fit(&cell[line]), w = CELL_WIDTH))
                .collect::<Vec<_>>()
                .join("|");
            let _ = writeln!(out, "{}", text.trim_end());
        }
        let _ = writeln!(out, "{separator}");
    }
}

fn render_banner(out: &mut String, banner: &str, options: RenderOptions) {
    if options.ansi {
        let _ = writeln!(out, "{BANNER_ON} {banner} {RESET}");
    } else {
        let _ = writeln!(out, "!! {banner} !!");
    }
}

/// Draws one frame. `changed` holds symbols to mark as freshly updated.
pub fn render_screen(screen: &Screen, changed: &HashSet<String>, options: RenderOptions) -> String {
    let mut out = String::new();
    match screen {
        Screen::About => {
            let _ = writeln!(out, "== About ==");
            let _ = writeln!(out);
            let _ = writeln!(out, "    [ Table ]    <Enter> to open");
            let _ = writeln!(out);
            let _ = writeln!(out, "q: quit");
        }
        Screen::Table(state) => {
            let _ = writeln!(out, "== Table ==");
            if let Some(banner) = state.banner() {
                render_banner(&mut out, banner, options);
            }
            match state {
                PollState::Idle | PollState::Loading => {
                    let _ = writeln!(out, "Loading...");
                }
                PollState::Ready { rows, .. } => render_grid(&mut out, rows, changed, options.columns),
                PollState::Failed { .. } => {}
            }
            let refreshing = matches!(state, PollState::Ready { refreshing: true, .. });
            let _ = writeln!(
                out,
                "b: back  q: quit{}",
                if refreshing { "  (refreshing)" } else { "" }
            );
        }
    }
    out
}

/// Redraws the terminal whenever the visible screen changes.
pub struct ScreenRenderer<W> {
    out: W,
    options: RenderOptions,
}

impl ScreenRenderer<io::Stdout> {
    pub fn stdout(columns: usize) -> Self {
        let ansi = io::stdout().is_terminal();
        Self::new(io::stdout(), RenderOptions { columns, ansi })
    }
}

impl<W: Write> ScreenRenderer<W> {
    pub fn new(out: W, options: RenderOptions) -> Self {
        Self { out, options }
    }

    fn draw(&mut self, frame: &str) -> io::Result<()> {
        if self.options.ansi {
            self.out.write_all(CLEAR.as_bytes())?;
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }
}

impl<'f, W> ConsumerWorker<'f, Screen> for ScreenRenderer<W>
where
    W: Write + Send + 'f,
{
    fn work(mut self: Box<Self>, mut state_rx: watch::Receiver<Option<Screen>>) -> BoxFuture<'f, ()> {
        async move {
            let mut previous_rows: Vec<DisplayRow> = Vec::new();
            while state_rx.changed().await.is_ok() {
                let Some(screen) = state_rx.borrow_and_update().clone() else {
                    continue;
                };

                let changed = match &screen {
                    Screen::Table(PollState::Ready { rows, .. }) => {
                        let changed = if previous_rows.is_empty() {
                            HashSet::new()
                        } else {
                            changed_symbols(&previous_rows, rows)
                        };
                        previous_rows = rows.clone();
                        changed
                    }
                    _ => {
                        previous_rows.clear();
                        HashSet::new()
                    }
                };
                debug!(changed = changed.len(), "Draw frame");

                let frame = render_screen(&screen, &changed, self.options);
                if let Err(e) = self.draw(&frame) {
                    warn!(?e, "Cannot draw frame");
                    break;
                }
            }
        }
        .boxed()
    }
}
