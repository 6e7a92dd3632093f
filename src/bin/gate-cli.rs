use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use clap::{Parser, Subcommand};
use rand::RngCore;
use serde_json::{json, Value};

use session_gate::clock::{Clock, SystemClock};
use session_gate::session::{Claims, TokenCodec};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Secret and session-token tooling for session-gate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random signing secret
    Secret {
        /// Number of random bytes
        #[arg(short, long, default_value_t = 32)]
        bytes: usize,
    },
    /// Sign a session token for the given claims
    Mint {
        #[arg(short, long, env = "SECRET_KEY", hide_env_values = true)]
        secret: String,

        /// Claims as a JSON object
        #[arg(short, long, default_value = "{}")]
        claims: String,

        /// Token lifetime in seconds
        #[arg(short, long, default_value_t = 1800)]
        lifetime: u64,
    },
    /// Verify a session token and print its claims
    Inspect {
        token: String,

        #[arg(short, long, env = "SECRET_KEY", hide_env_values = true)]
        secret: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Secret { bytes } => {
            let mut buf = vec![0u8; bytes];
            rand::thread_rng().fill_bytes(&mut buf);
            println!("{}", URL_SAFE_NO_PAD.encode(buf));
        }
        Commands::Mint {
            secret,
            claims,
            lifetime,
        } => {
            let codec = TokenCodec::new(&secret, Arc::new(SystemClock::new()))?;
            let claims: Claims = serde_json::from_str(&claims)?;
            println!("{}", codec.encode(&claims, Duration::from_secs(lifetime)));
        }
        Commands::Inspect { token, secret } => {
            let clock = Arc::new(SystemClock::new());
            let codec = TokenCodec::new(&secret, clock.clone())?;
            match codec.verify(&token) {
                Ok(session) => {
                    let report = json!({
                        "valid": true,
                        "iat": session.iat,
                        "exp": session.exp,
                        "remaining_secs": session.remaining_secs(clock.now_secs()),
                        "claims": Value::Object(session.user),
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
