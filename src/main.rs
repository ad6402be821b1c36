use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trello_export::bridge::{spawn_broker, ApiConfigPayload, BridgeClient, BridgeRequest, Broker};
use trello_export::config::{prompt, Config};
use trello_export::feed::FeedDocument;
use trello_export::item::ScrapedItem;
use trello_export::pipeline::ExportPipeline;
use trello_export::store::{ApiCredentials, JsonFileStore, SettingsStore};
use trello_export::trello::rest::TrelloRest;
use trello_export::trello::BoardApi;
use trello_export::tui::{self, state::AppState};

const USAGE: &str = "\
usage: trello-export [--config PATH] <command>

commands:
  select <feed.json>    pick posts from a feed file and export them (default)
  export <items.json>   export a JSON array of items directly
  configure             set API key, token, board and list
  boards                list boards for the configured account
  lists <board-id>      list the lists of a board
  history               show exported post URLs";

enum Command {
    Select(PathBuf),
    Export(PathBuf),
    Configure,
    Boards,
    Lists(String),
    History,
}

fn parse_args(args: &[String]) -> Result<(PathBuf, Command)> {
    let mut config_path = PathBuf::from("config.toml");
    let mut rest: Vec<&str> = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().context("--config needs a path")?;
            config_path = PathBuf::from(path);
        } else {
            rest.push(arg);
        }
    }

    let command = match rest.as_slice() {
        ["select", feed] => Command::Select(PathBuf::from(feed)),
        [feed] if feed.ends_with(".json") => Command::Select(PathBuf::from(feed)),
        ["export", items] => Command::Export(PathBuf::from(items)),
        ["configure"] => Command::Configure,
        ["boards"] => Command::Boards,
        ["lists", board_id] => Command::Lists(board_id.to_string()),
        ["history"] => Command::History,
        _ => anyhow::bail!("{}", USAGE),
    };
    Ok((config_path, command))
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create("trello-export.log")?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trello_export=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, command) = parse_args(&args)?;

    let config = Config::load_or_default(&config_path)?;
    // Load saved keys from .env (real env vars take precedence)
    Config::load_env_file();

    let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::new(&config.storage.state_file));
    let api: Arc<dyn BoardApi> = Arc::new(
        TrelloRest::new(&config.trello.api_base, config.trello.request_timeout())
            .context("failed to set up Trello client")?,
    );

    match command {
        Command::Configure => return configure(api.as_ref(), store.as_ref()).await,
        Command::History => {
            let history = store.history()?;
            println!("  {} exported posts", history.len());
            for url in history {
                println!("  {}", url);
            }
            return Ok(());
        }
        _ => {}
    }

    let pipeline = ExportPipeline::new(api.clone(), store.clone(), config.export.clone());
    let (bridge, broker_handle) = spawn_broker(Broker::new(api, store, pipeline));

    let result = match command {
        Command::Select(feed_path) => {
            let page = FeedDocument::load(&feed_path, &config.feed.link_base)?;
            tracing::info!(feed = %feed_path.display(), posts = page.entries().len(), "feed loaded");
            tui::run_tui(AppState::new(feed_path, page), bridge.clone()).await
        }
        Command::Export(items_path) => export_file(&bridge, &items_path).await,
        Command::Boards => print_boards(&bridge).await,
        Command::Lists(board_id) => print_lists(&bridge, board_id).await,
        Command::Configure | Command::History => Ok(()),
    };

    // Dropping the last client lets the broker drain and stop.
    drop(bridge);
    if let Err(e) = broker_handle.await {
        tracing::error!(error = %e, "broker task failed");
    }
    result
}

async fn export_file(bridge: &BridgeClient, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items file: {}", path.display()))?;
    let mut tweets: Vec<ScrapedItem> =
        serde_json::from_str(&content).with_context(|| "Failed to parse items JSON")?;
    tweets.sort_by_key(|t| t.selection_order.unwrap_or(u32::MAX));

    println!("  Exporting {} posts to Trello...", tweets.len());
    let resp = bridge
        .send(BridgeRequest::ExportToTrello { tweets })
        .await
        .context("export service unavailable")?;
    if resp.success {
        println!("  {}", resp.message.unwrap_or_default());
        Ok(())
    } else {
        anyhow::bail!("{}", resp.error.unwrap_or_else(|| "Unknown error".to_string()))
    }
}

async fn print_boards(bridge: &BridgeClient) -> Result<()> {
    let resp = bridge.send(BridgeRequest::GetBoards).await?;
    if !resp.success {
        anyhow::bail!("{}", resp.error.unwrap_or_default());
    }
    for board in resp.boards.unwrap_or_default() {
        println!("  {}  {}", board.id, board.name);
    }
    Ok(())
}

async fn print_lists(bridge: &BridgeClient, board_id: String) -> Result<()> {
    let resp = bridge.send(BridgeRequest::GetLists { board_id }).await?;
    if !resp.success {
        anyhow::bail!("{}", resp.error.unwrap_or_default());
    }
    for list in resp.lists.unwrap_or_default() {
        println!("  {}  {}", list.id, list.name);
    }
    Ok(())
}

/// Interactive setup: credentials from env / .env / prompt, then board and
/// list picked by number.
async fn configure(api: &dyn BoardApi, store: &dyn SettingsStore) -> Result<()> {
    println!();
    println!("  Trello Export setup");
    println!("  ===================");
    println!();

    let creds = ApiCredentials {
        api_key: Config::trello_api_key()?,
        api_token: Config::trello_token()?,
    };

    println!("  Loading boards...");
    let boards = api.get_boards(&creds).await.context("Error loading boards")?;
    let boards: Vec<_> = boards.into_iter().filter(|b| !b.closed).collect();
    if boards.is_empty() {
        anyhow::bail!("no open boards found for this account");
    }
    for (i, board) in boards.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, board.name);
    }
    let board = &boards[pick("Board number", boards.len())?];

    println!("  Loading lists...");
    let lists = api
        .get_lists(&creds, &board.id)
        .await
        .context("Error loading lists")?;
    if lists.is_empty() {
        anyhow::bail!("board '{}' has no lists", board.name);
    }
    for (i, list) in lists.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, list.name);
    }
    let list = &lists[pick("List number", lists.len())?];

    let payload = ApiConfigPayload {
        api_key: creds.api_key,
        token: creds.api_token,
        board_id: board.id.clone(),
        todo_list_id: list.id.clone(),
    };
    store.save_config(payload.into())?;
    tracing::info!(board = %board.name, list = %list.name, "configuration saved");
    println!();
    println!("  Saved. Cards will go to '{}' / '{}'.", board.name, list.name);
    Ok(())
}

fn pick(label: &str, len: usize) -> Result<usize> {
    let raw = prompt(label)?;
    let n: usize = raw
        .parse()
        .with_context(|| format!("'{}' is not a number", raw))?;
    if n == 0 || n > len {
        anyhow::bail!("pick a number between 1 and {}", len);
    }
    Ok(n - 1)
}
