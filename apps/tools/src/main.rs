use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use shared::{domain::Amount, protocol::BoughtItemResource};
use shop_client::{
    countdown::cart_timer,
    filters::{format_money, pluralize, slugify, DEFAULT_SLUG_MAX_LEN},
    load_settings,
    reconcile::reconcile,
    refund::{RefundForm, RefundLine},
    CartTimer, Shop, ShopEvent,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Registration shop helpers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge a remote bought-item list (JSON file) into a local one.
    Reconcile {
        #[arg(long)]
        local: PathBuf,
        #[arg(long)]
        remote: PathBuf,
    },
    Countdown {
        /// Cart start time, RFC 3339.
        #[arg(long)]
        start: DateTime<Utc>,
        /// Cart timeout in minutes.
        #[arg(long)]
        timeout: u32,
    },
    Refund {
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long = "price", required = true)]
        prices: Vec<Amount>,
        #[arg(long)]
        custom: Option<Amount>,
    },
    Slug {
        text: String,
        #[arg(long, default_value_t = DEFAULT_SLUG_MAX_LEN)]
        max_len: usize,
    },
    /// Follow the configured event's cart until Ctrl-C.
    Watch,
}

fn read_bought_items(path: &PathBuf) -> Result<Vec<BoughtItemResource>> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid bought items in {}", path.display()))
}

async fn watch() -> Result<()> {
    let settings = load_settings();
    let shop = Shop::from_settings(&settings)?;
    let mut events = shop.subscribe_events();

    shop.initialize().await?;
    let state = shop.snapshot().await;
    info!(
        api = %settings.api_base_url,
        event_id = shop.event_id().0,
        items = state.items.len(),
        bought_items = state.order.bought_items.len(),
        "watching cart"
    );

    let countdown = shop.spawn_countdown(settings.countdown_tick());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ShopEvent::CountdownTick(left)) => info!("cart expires in {left}"),
                Ok(ShopEvent::CartExpired) => warn!("cart expired"),
                Ok(other) => info!(?other, "shop event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }
    countdown.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Reconcile { local, remote } => {
            let mut local = read_bought_items(&local)?;
            let remote = read_bought_items(&remote)?;
            for edit in reconcile(&mut local, remote) {
                println!("{edit:?}");
            }
            println!("{}", serde_json::to_string_pretty(&local)?);
        }
        Command::Countdown { start, timeout } => {
            match cart_timer(Some(start), Some(timeout), Utc::now()) {
                CartTimer::Running(left) => println!("{left}"),
                CartTimer::Expired => println!("expired"),
                CartTimer::Inactive => println!("no cart timeout"),
            }
        }
        Command::Refund {
            currency,
            prices,
            custom,
        } => {
            let lines = prices
                .into_iter()
                .map(|price| RefundLine {
                    checked: true,
                    ..RefundLine::new(price)
                })
                .collect();
            let form = RefundForm::new(lines, custom);
            let summary = form.summary(&currency);
            println!(
                "refund {} for {} item{}{}",
                format_money(form.amount(), &currency),
                summary.item_count,
                pluralize(summary.item_count),
                if summary.custom_mode {
                    format!(" (items total {})", summary.amount_text)
                } else {
                    String::new()
                }
            );
        }
        Command::Slug { text, max_len } => println!("{}", slugify(&text, max_len)),
        Command::Watch => watch().await?,
    }

    Ok(())
}
