//! tmkeys CLI application.
//!
//! Command-line front end for the keyring: create, inspect and delete keys,
//! change passphrases, sign envelopes, and move keys in and out.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tmkeys::config::{KeysConfig, HOME_ENV};
use tmkeys::crypto::keys::Algorithm;
use tmkeys::error::{KeysError, Result};
use tmkeys::storage::Info;
use tmkeys::tx::{Envelope, Signable};
use tmkeys::Manager;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "tmkeys")]
#[command(about = "Local keyring: encrypted keys and transaction signing", long_about = None)]
struct Cli {
    /// Key directory
    #[arg(long, global = true, env = HOME_ENV)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and store a new key
    New {
        name: String,

        /// Signature algorithm: ed25519 or secp256k1
        #[arg(long, default_value = "ed25519")]
        algo: String,
    },

    /// List all keys
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one key
    Show {
        name: String,

        #[arg(long)]
        json: bool,
    },

    /// Delete a key
    Delete { name: String },

    /// Change the passphrase of a key
    Update { name: String },

    /// Sign an envelope read as JSON from a file or stdin
    Sign {
        name: String,

        /// Envelope file (default: stdin)
        #[arg(long)]
        tx: Option<PathBuf>,
    },

    /// Export a key as ASCII armor
    Export {
        name: String,

        /// Export the encrypted private key instead of the public key
        #[arg(long)]
        private: bool,

        /// Optional output file (if not specified, prints to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Import an armored private key
    Import {
        name: String,

        /// Armored private key file
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the secret phrase of a key
    ExportPhrase { name: String },

    /// Restore a key from its secret phrase
    Recover { name: String },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = KeysConfig::new(cli.home.unwrap_or_else(KeysConfig::default_home));
    let manager = config.build()?;

    handle_command(&manager, cli.command)
}

fn prompt(message: &str) -> Result<Zeroizing<String>> {
    Ok(Zeroizing::new(rpassword::prompt_password(message)?))
}

fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    let passphrase = prompt("Enter passphrase to encrypt key: ")?;
    let repeated = prompt("Repeat passphrase: ")?;
    if passphrase != repeated {
        return Err(KeysError::ParseError("Passphrases do not match".to_string()));
    }
    Ok(passphrase)
}

fn print_info(info: &Info) {
    println!(
        "{:<20} {:<10} {:<40} {}",
        info.name,
        info.algorithm(),
        info.address,
        hex::encode_upper(info.public_key.raw_bytes())
    );
}

fn print_header() {
    println!("{:<20} {:<10} {:<40} Public Key", "Name", "Type", "Address");
    println!("{}", "-".repeat(100));
}

fn handle_command(manager: &Manager, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::New { name, algo } => {
            let algorithm: Algorithm = algo.parse()?;
            let passphrase = prompt_new_passphrase()?;

            let info = manager.create(&name, &passphrase, algorithm.name())?;

            println!("Generated and stored key: {}", info.name);
            println!("Address: {}", info.address);
            Ok(())
        }

        Commands::List { json } => {
            let infos = manager.list()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else if infos.is_empty() {
                println!("No keys found.");
            } else {
                print_header();
                for info in &infos {
                    print_info(info);
                }
            }
            Ok(())
        }

        Commands::Show { name, json } => {
            let info = manager.get(&name)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_header();
                print_info(&info);
            }
            Ok(())
        }

        Commands::Delete { name } => {
            manager.delete(&name)?;
            println!("Deleted key: {}", name);
            Ok(())
        }

        Commands::Update { name } => {
            let old = prompt("Enter current passphrase: ")?;
            let new = prompt_new_passphrase()?;

            manager.update(&name, &old, &new)?;
            println!("Updated passphrase for key: {}", name);
            Ok(())
        }

        Commands::Sign { name, tx } => {
            let json = match tx {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let mut envelope = Envelope::from_json(&json)?;
            let passphrase = prompt("Enter passphrase to decrypt key: ")?;

            manager.sign(&name, &passphrase, &mut envelope)?;
            envelope.signers()?;

            println!("{}", envelope.to_json()?);
            Ok(())
        }

        Commands::Export {
            name,
            private,
            output,
        } => {
            let armor = if private {
                let decrypt = prompt("Enter passphrase to decrypt key: ")?;
                let encrypt = prompt("Enter passphrase to encrypt the export: ")?;
                manager.export_priv_key_armor(&name, &decrypt, &encrypt)?
            } else {
                manager.export_pub_key_armor(&name)?
            };

            // Write to file or stdout
            if let Some(output_path) = output {
                fs::write(&output_path, armor.as_bytes())?;
                println!("Exported key '{}' to: {}", name, output_path.display());
            } else {
                print!("{}", armor);
            }
            Ok(())
        }

        Commands::Import { name, file } => {
            let armor = fs::read_to_string(&file)?;
            let passphrase = prompt("Enter passphrase of the export: ")?;

            let info = manager.import_priv_key_armor(&name, &armor, &passphrase)?;
            println!("Imported key: {}", info.name);
            println!("Address: {}", info.address);
            Ok(())
        }

        Commands::ExportPhrase { name } => {
            let passphrase = prompt("Enter passphrase to decrypt key: ")?;
            let phrase = manager.export_phrase(&name, &passphrase)?;

            println!("{}", phrase.as_str());
            Ok(())
        }

        Commands::Recover { name } => {
            let phrase = prompt("Enter secret phrase: ")?;
            let passphrase = prompt_new_passphrase()?;

            let info = manager.recover(&name, &passphrase, &phrase)?;
            println!("Recovered key: {}", info.name);
            println!("Address: {}", info.address);
            Ok(())
        }
    }
}
