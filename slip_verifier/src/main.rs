// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]

use std::{fs, path::PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use promptpay_qr::{decode, encode_with_profile};
use rust_decimal::Decimal;
use slip_core::{
    disambiguation::Disambiguator,
    manager::{context::memory::InMemoryContext, Manager},
    ManagerConfig,
};
use slip_receipt::{checks::CheckList, extraction::Reconciler, Context, SlipScan};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding the manager settings.
    #[arg(long, env = "SLIP_CONFIG")]
    config: Option<PathBuf>,

    /// Merchant name printed into payloads, overrides the config file.
    #[arg(long, env = "SLIP_MERCHANT_NAME")]
    merchant_name: Option<String>,

    /// Merchant city printed into payloads, overrides the config file.
    #[arg(long, env = "SLIP_MERCHANT_CITY")]
    merchant_city: Option<String>,

    /// Seed for the satang added to new orders.
    /// Defaults to a seed from the operating system.
    #[arg(long, env = "SLIP_RNG_SEED")]
    rng_seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a dynamic payment payload.
    Encode {
        #[arg(long)]
        account: String,
        /// Amount in baht, at most two decimals are kept.
        #[arg(long)]
        amount: Option<Decimal>,
    },
    /// Print the fields of a payment payload as JSON.
    Decode { payload: String },
    /// Reconcile a QR text and an OCR text into a slip observation.
    Analyze {
        #[arg(long)]
        qr: Option<String>,
        #[arg(long)]
        ocr: Option<String>,
    },
    /// Create an order and verify a slip paying it, in memory.
    Demo {
        #[arg(long, default_value = "ORD-DEMO")]
        order_id: String,
        #[arg(long)]
        amount: Decimal,
        /// OCR text to attach to the slip.
        #[arg(long)]
        ocr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger.
    // Set the log level by setting the RUST_LOG environment variable.
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    debug!("Settings: {:?}", args);

    let config = load_config(&args)?;

    match args.command {
        Command::Encode { account, amount } => {
            let payload = encode_with_profile(&account, amount, &config.merchant)?;
            println!("{payload}");
        }
        Command::Decode { payload } => {
            let decoded = decode(&payload);
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
        Command::Analyze { qr, ocr } => {
            let observation = Reconciler::default().reconcile(&SlipScan::new(qr, ocr));
            println!("{}", serde_json::to_string_pretty(&observation)?);
        }
        Command::Demo {
            order_id,
            amount,
            ocr,
        } => {
            let disambiguator = match args.rng_seed {
                Some(seed) => Disambiguator::from_seed(seed),
                None => Disambiguator::default(),
            };
            let manager = Manager::new(InMemoryContext::default(), CheckList::empty())
                .with_config(config)
                .with_disambiguator(disambiguator);

            let ticket = manager.create_order(&order_id, amount).await?;
            info!(
                "Order {} must be paid {} baht",
                ticket.order_id, ticket.final_amount
            );
            println!("{}", serde_json::to_string_pretty(&ticket)?);

            let scan = SlipScan::new(Some(ticket.payload), ocr);
            let verdict = manager.verify_slip(&Context::new(), &scan, None).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<ManagerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Reading config from {}", path.display());
            let raw = fs::read_to_string(path)
                .with_context(|| format!("cannot read config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => ManagerConfig::default(),
    };
    if let Some(name) = &args.merchant_name {
        config.merchant.name = name.clone();
    }
    if let Some(city) = &args.merchant_city {
        config.merchant.city = city.clone();
    }
    Ok(config)
}
