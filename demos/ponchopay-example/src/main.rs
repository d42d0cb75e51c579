//! Interactive walkthrough of the PonchoPay client.
//!
//! Initiates a £20.34 payment, prints the URL to pay it, waits for input and
//! then cancels the payment.
//!
//! The integration key, location URN and base URL for your account are shown at
//! `https://demo.ponchopay.com/provider/admin/settings/api-integration` (demo) or
//! `https://pay.ponchopay.com/provider/admin/settings/api-integration` (production).
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `PONCHOPAY_KEY`, `PONCHOPAY_URN`, `PONCHOPAY_BASE_URL`, `PONCHOPAY_EMAIL`
//! - `RUST_LOG` controls log verbosity

use clap::Parser;
use dotenvy::dotenv;
use ponchopay::Client;
use ponchopay::config::{BASE_URL_ENV, ClientConfig, KEY_ENV};
use ponchopay::request::{CancelPayment, InitiatePayment};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Amount in pence.
const AMOUNT: u64 = 2034;

#[derive(Parser, Debug)]
#[command(version, about = "Initiate and cancel a PonchoPay payment")]
struct Args {
    /// Integration key assigned to your account
    #[arg(long, env = KEY_ENV)]
    key: String,
    /// Location Unique Reference Number
    #[arg(long, env = "PONCHOPAY_URN")]
    urn: String,
    /// Email of the customer expected to pay
    #[arg(long, env = "PONCHOPAY_EMAIL", default_value = "tommy@server.com")]
    email: String,
    /// API host; the demo environment unless overridden
    #[arg(long, env = BASE_URL_ENV, default_value = "https://demo.ponchopay.com/")]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ClientConfig::new(args.key).with_base_url(args.base_url);
    let client = Client::from_config(&config)?;

    let metadata = serde_json::json!({ "order": rand::random_range(0..1000) }).to_string();
    let init = InitiatePayment::new(metadata, &args.urn, AMOUNT, args.email);
    let payment = client.initiate_payment(&init).await?;

    println!();
    println!("############################################################");
    println!("A payment has been generated. Please, go here to pay for it:");
    println!("{payment}");
    println!("############################################################");
    println!();

    println!("Type 'q' and press [Enter] to quit. Press [Enter] to cancel the payment");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    if line.trim() == "q" {
        println!("Quitting. Bye!");
        return Ok(());
    }

    let payment_id = payment.rsplit('/').next().unwrap_or_default();
    tracing::info!(payment_id, "Cancelling payment");
    client
        .cancel_payment(payment_id, &CancelPayment::new(&args.urn, "cancel@author.com"))
        .await?;

    println!();
    println!("The payment has been successfully canceled!");

    Ok(())
}
