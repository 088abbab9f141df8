//! # Register Entry Point
//!
//! ```bash
//! # Provision a demo ledger first
//! cargo run -p stockbook-store --bin seed
//!
//! # Then start the console
//! cargo run -p stockbook-register --bin register
//! ```

use std::process::ExitCode;

use stockbook_register::{run, Options, USAGE};

#[tokio::main]
async fn main() -> ExitCode {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    if options.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    match run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("register: {}", e);
            ExitCode::FAILURE
        }
    }
}
