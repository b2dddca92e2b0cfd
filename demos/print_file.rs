//! Send a pre-encoded print job to a cat printer
//!
//! Run with: cargo run --example print_file -- <payload.bin> [device]
//!
//! `device` may be a MAC address, a macOS peripheral UUID or an advertised
//! name. Leave it out to use the first printer found.

use catprinter_ble::{PrinterConfig, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("catprinter_ble=info".parse().unwrap()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: print_file <payload.bin> [device]");
        std::process::exit(2);
    };
    let device = args.next();

    let payload = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    println!("Sending {} bytes from {}", payload.len(), path);
    println!("Make sure the printer is switched on and nearby.\n");

    catprinter_ble::run_with_config(payload, device.as_deref(), PrinterConfig::default())
        .await?;

    println!("\nDone!");
    Ok(())
}
