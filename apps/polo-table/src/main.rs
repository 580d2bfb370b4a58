use std::collections::HashSet;

use anyhow::Context;
use app::{App, InjectedTo, Reduced};
use clap::Parser;
use navigation::{Command, KeyboardInput, Navigation, Route};
use poller::TablePoller;
use render::{render_screen, RenderOptions, Screen, ScreenRenderer};
use ticker_grid::{shape_for_grid, PollState};
use tracing::info;

use crate::config::Config;

mod config;
mod navigation;
mod poller;
mod render;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PoloTable {
    navigation: Navigation,
    table: PollState,
    quit: bool,
}

#[derive(Parser)]
struct Opts {
    #[arg(short, long)]
    config_file: Option<String>,

    /// Fetch the ticker once, print the grid and exit
    #[arg(long)]
    once: bool,

    /// Print rows as JSON instead of the grid
    #[arg(long, requires = "once")]
    json: bool,
}

impl InjectedTo<PoloTable> for Command {
    fn inject_to(self, mut state: PoloTable) -> PoloTable {
        match self {
            Command::Navigate(route) => {
                state.navigation.navigate(route);
            }
            Command::Back => {
                state.navigation.back();
            }
            Command::Quit => state.quit = true,
        }
        state
    }
}

impl InjectedTo<PoloTable> for PollState {
    fn inject_to(self, state: PoloTable) -> PoloTable {
        PoloTable {
            table: self,
            ..state
        }
    }
}

impl Reduced<Route> for PoloTable {
    fn reduce(&self) -> Route {
        self.navigation.current()
    }
}

impl Reduced<Screen> for PoloTable {
    fn reduce(&self) -> Screen {
        match self.navigation.current() {
            Route::About => Screen::About,
            Route::Table => Screen::Table(self.table.clone()),
        }
    }
}

async fn print_once(client: &poloniex::Client, config: &Config, json: bool) -> anyhow::Result<()> {
    let snapshot = client
        .fetch_ticker()
        .await
        .context("Cannot fetch ticker")?;
    let rows = shape_for_grid(snapshot, config.columns);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let screen = Screen::Table(PollState::Ready {
            rows,
            refreshing: false,
            stale: None,
        });
        let options = RenderOptions {
            columns: config.columns,
            ansi: false,
        };
        print!("{}", render_screen(&screen, &HashSet::new(), options));
    }
    Ok(())
}

async fn runner() -> anyhow::Result<()> {
    let cli_opts = Opts::parse();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = Config::load(cli_opts.config_file.as_deref())?;
    info!(?config, "Loaded config");
    let client = poloniex::Client::new(config.api_host.clone());

    if cli_opts.once {
        return print_once(&client, &config, cli_opts.json).await;
    }

    let app = App::build(PoloTable::default())
        .add_producer(KeyboardInput::stdin())
        .add_worker(TablePoller::new(client, config.poll_config()))
        .add_consumer(ScreenRenderer::stdout(config.columns))
        .build();

    info!("run app");
    app.run_until(|state| state.quit).await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    runner().await
}
