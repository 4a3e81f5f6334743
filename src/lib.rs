pub mod cli;
pub mod core;
pub mod export;
pub mod ledger;
pub mod providers;
pub mod store;

use crate::cli::add::NewTransaction;
use crate::core::config::AppConfig;
use crate::core::session::Session;
use crate::ledger::LedgerState;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Summary,
    Add(NewTransaction),
    Export { output: PathBuf },
    Import { input: PathBuf },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Tally starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let session = Session::from_optional(config.user_id.as_deref());
    if !session.is_authenticated() {
        warn!("No user_id configured; running unauthenticated");
    }

    let store = store::open_store(&config)?;
    let mut ledger = LedgerState::new(config.balance_order);

    if let Some(notice) = cli::ui::with_spinner(
        "Fetching transactions...",
        ledger.fetch(store.as_ref(), &session),
    )
    .await
    {
        cli::ui::print_notice(&notice);
    }

    match command {
        AppCommand::Summary => cli::summary::run(&ledger),
        AppCommand::Add(new) => cli::add::run(&mut ledger, store.as_ref(), &session, new).await,
        AppCommand::Export { output } => cli::export::export(&ledger, &output),
        AppCommand::Import { input } => {
            cli::export::import(&mut ledger, store.as_ref(), &session, &input).await
        }
    }
}
