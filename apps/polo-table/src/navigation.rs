use app::{mpsc, worker::ProducerWorker, BoxFuture, FutureExt, SinkExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    About,
    Table,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::About => "About",
            Route::Table => "Table",
        }
    }
}

/// Screen stack. It is never empty: `About` is the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    stack: Vec<Route>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            stack: vec![Route::About],
        }
    }
}

impl Navigation {
    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::About)
    }

    /// About -> Table is the only forward transition.
    pub fn navigate(&mut self, route: Route) -> bool {
        match (self.current(), route) {
            (Route::About, Route::Table) => {
                self.stack.push(route);
                true
            }
            _ => false,
        }
    }

    pub fn back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Navigate(Route),
    Back,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        match line.trim().to_lowercase().as_str() {
            "" | "t" | "table" => Some(Command::Navigate(Route::Table)),
            "b" | "back" => Some(Command::Back),
            "q" | "quit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Turns input lines into navigation commands. EOF quits.
pub struct KeyboardInput<R> {
    reader: R,
}

impl KeyboardInput<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> KeyboardInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<'f, R> ProducerWorker<'f, Command> for KeyboardInput<R>
where
    R: AsyncBufRead + Unpin + Send + 'f,
{
    fn work(self: Box<Self>, mut state_tx: mpsc::Sender<Command>) -> BoxFuture<'f, ()> {
        async move {
            let mut lines = self.reader.lines();
            loop {
                let command = match lines.next_line().await {
                    Ok(Some(line)) => match Command::parse(&line) {
                        Some(command) => command,
                        None => {
                            warn!(?line, "Unknown command");
                            continue;
                        }
                    },
                    Ok(None) => Command::Quit,
                    Err(e) => {
                        warn!(?e, "Cannot read input, quit");
                        Command::Quit
                    }
                };

                info!(?command, "Got command");
                if state_tx.send(command).await.is_err() || command == Command::Quit {
                    break;
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use app::StreamExt;

    use super::*;

    #[test]
    fn starts_on_about() {
        assert_eq!(Navigation::default().current(), Route::About);
    }

    #[test]
    fn about_to_table_and_back() {
        let mut nav = Navigation::default();
        assert!(nav.navigate(Route::Table));
        assert_eq!(nav.current(), Route::Table);

        // already on Table
        assert!(!nav.navigate(Route::Table));
        assert!(!nav.navigate(Route::About));

        assert!(nav.back());
        assert_eq!(nav.current(), Route::About);
        assert!(!nav.back());
        assert_eq!(nav.current(), Route::About);
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse(""), Some(Command::Navigate(Route::Table)));
        assert_eq!(Command::parse(" Table \n"), Some(Command::Navigate(Route::Table)));
        assert_eq!(Command::parse("b"), Some(Command::Back));
        assert_eq!(Command::parse("QUIT"), Some(Command::Quit));
        assert_eq!(Command::parse("about"), None);
    }

    #[tokio::test]
    async fn keyboard_input_skips_unknown_and_quits_on_eof() {
        let input: &[u8] = b"t\nwhat\nb\n";
        let (tx, rx) = mpsc::channel(10);
        Box::new(KeyboardInput::new(input)).work(tx).await;

        let commands = rx.collect::<Vec<_>>().await;
        assert_eq!(
            commands,
            vec![
                Command::Navigate(Route::Table),
                Command::Back,
                Command::Quit
            ]
        );
    }

    #[tokio::test]
    async fn keyboard_input_stops_at_quit() {
        let input: &[u8] = b"q\nt\n";
        let (tx, rx) = mpsc::channel(10);
        Box::new(KeyboardInput::new(input)).work(tx).await;

        let commands = rx.collect::<Vec<_>>().await;
        assert_eq!(commands, vec![Command::Quit]);
    }
}
