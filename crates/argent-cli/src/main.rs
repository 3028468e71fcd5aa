//! Interactive command-line access to the price service.
//!
//! Uses the same configuration, store, and acquisition source as the
//! server, so a session established here is picked up by the dashboard on
//! its next start and vice versa.

use std::io::Write as _;

use clap::{Parser, Subcommand};

use argent_service::PriceService;

#[derive(Debug, Parser)]
#[command(name = "argent-cli")]
#[command(about = "Silver price service command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Request an OTP, verify it, and store the session.
    Login,
    /// Run one refresh cycle against the vendor.
    Refresh,
    /// Print the current snapshot.
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = argent_core::load_app_config()?;
    let source = argent_service::build_source(&config)?;
    let store = argent_store::StateStore::new(config.state_path.clone());
    let service = PriceService::restore(source, store)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Login => login(&service).await?,
        Commands::Refresh => {
            let refreshed = service.refresh_now().await;
            println!("refreshed: {refreshed}");
        }
        Commands::Show => show(&service),
    }

    Ok(())
}

async fn login(service: &PriceService) -> anyhow::Result<()> {
    let mobile = prompt("Mobile: ")?;
    let mobile = mobile.trim();

    let message = service.begin_authentication(mobile).await?;
    println!("{message}");

    let code = prompt("Code: ")?;
    service.complete_authentication(mobile, code.trim()).await?;
    println!("ورود موفق");
    Ok(())
}

fn show(service: &PriceService) {
    let snapshot = service.current_snapshot();
    println!("fetched_at: {}", snapshot.fetched_at);
    println!("markup:     {}%", snapshot.markup_percent);
    println!("configured: {}", snapshot.configured);
    for entry in &snapshot.entries {
        let status = if entry.is_active { "active" } else { "inactive" };
        println!(
            "{:>12} buy / {:>12} sell  [{status}]  {}",
            entry.buy_price, entry.sell_price, entry.name
        );
    }
    if snapshot.entries.is_empty() {
        println!("(no prices yet — run `argent-cli login` then `argent-cli refresh`)");
    }
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}
