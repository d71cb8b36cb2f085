//! CLI entry point for the inventory database.
//!
//! # Usage
//! - `inventory_cli [--config <file>] [list]` prints every stored item.
//! - `inventory_cli [--config <file>] add <name> <price> <quantity>` records a
//!   new item and prints the refreshed list.
//!
//! Settings come from the TOML file given by `--config` or `INVENTORY_CONFIG`,
//! overlaid with `INVENTORY_*` variables (a `.env` file is honored).

use futures::StreamExt;
use inventory_core::{
    core_version, init_logging, load_config, CurrencyFormat, InventoryConfig,
    InventoryController, InventoryDatabase, Item, ItemsStream,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;

const ENV_CONFIG_PATH: &str = "INVENTORY_CONFIG";
const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, PartialEq)]
enum Command {
    List,
    Add {
        name: String,
        price: String,
        quantity: String,
    },
}

#[derive(Debug, PartialEq)]
struct Invocation {
    config_path: Option<PathBuf>,
    command: Command,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("inventory_cli: {err}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    dotenvy::dotenv().ok();

    let invocation = parse_args(std::env::args().skip(1))?;
    let config = resolve_config(invocation.config_path)?;
    if let Some(log_dir) = &config.logging.dir {
        init_logging(&config.logging.level, log_dir)?;
    }
    info!(
        "event=cli_start module=cli status=ok version={} db_path={}",
        core_version(),
        config.database.path().display()
    );

    let database = InventoryDatabase::get_database(&config.database)?;
    let controller = InventoryController::from_database(database);
    let mut items = controller.all_items();

    let current = next_snapshot(&mut items).await?;
    let listed = match invocation.command {
        Command::List => current,
        Command::Add {
            name,
            price,
            quantity,
        } => {
            if !controller.validate_entry(&name, &price, &quantity) {
                return Err("add: name, price and quantity must not be blank".into());
            }
            controller.add_new_item(&name, &price, &quantity)?;
            await_refresh(&mut items, REFRESH_TIMEOUT).await?
        }
    };

    print_items(&listed, &config.currency);
    Ok(())
}

async fn next_snapshot(items: &mut ItemsStream) -> CliResult<Vec<Item>> {
    match items.next().await {
        Some(snapshot) => Ok(snapshot?),
        None => Err("item stream closed unexpectedly".into()),
    }
}

/// Failed background writes are only logged, so the refresh is bounded.
async fn await_refresh(items: &mut ItemsStream, limit: Duration) -> CliResult<Vec<Item>> {
    match timeout(limit, next_snapshot(items)).await {
        Ok(snapshot) => snapshot,
        Err(_) => Err(format!(
            "item was not stored within {}s; check the log for the write error",
            limit.as_secs()
        )
        .into()),
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> CliResult<Invocation> {
    let mut args = args.into_iter().peekable();
    let mut config_path = None;
    if args.peek().map(String::as_str) == Some("--config") {
        args.next();
        let path = args.next().ok_or("--config needs a file path")?;
        config_path = Some(PathBuf::from(path));
    }

    let command = match args.next().as_deref() {
        None | Some("list") => Command::List,
        Some("add") => {
            let mut field = |label: &str| {
                args.next()
                    .ok_or_else(|| format!("add: missing {label}"))
            };
            Command::Add {
                name: field("name")?,
                price: field("price")?,
                quantity: field("quantity")?,
            }
        }
        Some(other) => return Err(format!("unknown command `{other}`").into()),
    };

    if let Some(extra) = args.next() {
        return Err(format!("unexpected argument `{extra}`").into());
    }
    Ok(Invocation {
        config_path,
        command,
    })
}

fn resolve_config(explicit: Option<PathBuf>) -> CliResult<InventoryConfig> {
    let from_env = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
    match explicit.or(from_env) {
        Some(path) => Ok(load_config(path)?),
        None => Ok(InventoryConfig::from_env()),
    }
}

fn print_items(items: &[Item], currency: &CurrencyFormat) {
    if items.is_empty() {
        println!("no items");
        return;
    }
    for item in items {
        println!(
            "{:>4}  {:<24} {:>12}  qty={}",
            item.id,
            item.name,
            item.formatted_price_with(currency),
            item.quantity_in_stock
        );
    }
}
