//! Main entry point for the intent router CLI.
//!
//! The binary loads a router configuration and offers the operations around
//! it: hashing and signing intents, recovering signers, simulating an
//! execution against a JSON ledger state and cleaning up storage.

use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand};
use router_config::Config;
use std::path::PathBuf;

mod commands;
mod factory_registry;

use commands::SimulateOptions;

/// Command-line arguments for the router.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/router.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the EIP-712 digest of an intent
	Digest {
		/// JSON file holding the intent
		intent: PathBuf,
	},
	/// Sign an intent with the configured account
	Sign { intent: PathBuf },
	/// Recover the signer of an intent signature
	Recover {
		intent: PathBuf,
		/// 65-byte hex signature
		signature: String,
	},
	/// Execute an intent against a ledger state and print the outcome
	Simulate {
		/// JSON file holding the initial balances, allowances and permits
		#[arg(long)]
		genesis: PathBuf,
		#[arg(long)]
		intent: PathBuf,
		/// Executes as a delegated call when given
		#[arg(long)]
		signature: Option<String>,
		/// Submitting address, the intent account by default
		#[arg(long)]
		caller: Option<Address>,
		/// Native value attached to the call
		#[arg(long, default_value = "0")]
		value: U256,
	},
	/// Remove expired records from storage
	Cleanup,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	// Logs go to stderr so stdout stays machine readable
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.router.id);

	let output = match args.command {
		Command::Digest { intent } => {
			let intent = commands::load_intent(&intent).await?;
			serde_json::json!({ "digest": commands::digest(&config, &intent) })
		},
		Command::Sign { intent } => {
			let intent = commands::load_intent(&intent).await?;
			commands::sign(&config, &intent).await?
		},
		Command::Recover { intent, signature } => {
			let intent = commands::load_intent(&intent).await?;
			commands::recover(&config, &intent, &signature)?
		},
		Command::Simulate {
			genesis,
			intent,
			signature,
			caller,
			value,
		} => {
			let genesis = commands::load_genesis(&genesis).await?;
			let intent = commands::load_intent(&intent).await?;
			let options = SimulateOptions {
				signature,
				caller,
				value,
			};
			commands::simulate(config, &genesis, &intent, options).await?
		},
		Command::Cleanup => commands::cleanup(config).await?,
	};

	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::tempdir;

	#[test]
	fn test_args_default_values() {
		let args = Args::try_parse_from(["router", "cleanup"]).unwrap();

		assert_eq!(args.config, PathBuf::from("config/router.toml"));
		assert_eq!(args.log_level, "info");
		assert!(matches!(args.command, Command::Cleanup));
	}

	#[test]
	fn test_simulate_args() {
		let args = Args::try_parse_from([
			"router",
			"-c",
			"custom.toml",
			"simulate",
			"--genesis",
			"genesis.json",
			"--intent",
			"intent.json",
			"--caller",
			"0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
			"--value",
			"100",
		])
		.unwrap();

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		match args.command {
			Command::Simulate {
				caller,
				value,
				signature,
				..
			} => {
				assert_eq!(caller, Some(Address::repeat_byte(0xbb)));
				assert_eq!(value, U256::from(100));
				assert!(signature.is_none());
			},
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_recover_requires_signature() {
		assert!(Args::try_parse_from(["router", "recover", "intent.json"]).is_err());
	}

	#[tokio::test]
	async fn test_example_config_loads() {
		let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/router.toml");
		let config = Config::from_file(&path).await.unwrap();

		let router = factory_registry::build_router(
			config,
			router_ledger::shared(router_ledger::Ledger::new()),
		)
		.unwrap();
		assert!(!router.strategies().is_empty());
	}

	#[tokio::test]
	async fn test_demo_files_simulate() {
		let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
		let config = Config::from_file(root.join("config/router.toml")).await.unwrap();
		let genesis = commands::load_genesis(&root.join("demos/genesis.json"))
			.await
			.unwrap();
		let intent = commands::load_intent(&root.join("demos/intent.json"))
			.await
			.unwrap();

		let signed = commands::sign(&config, &intent).await.unwrap();
		let options = SimulateOptions {
			signature: signed["signature"].as_str().map(str::to_string),
			caller: Some(Address::repeat_byte(0xbb)),
			value: U256::ZERO,
		};
		let report = commands::simulate(config, &genesis, &intent, options)
			.await
			.unwrap();

		assert_eq!(report["receipt"]["outcome"]["actualInputDelta"], "0x32");
		assert_eq!(report["receipt"]["outcome"]["actualOutputDelta"], "0x32");
	}

	#[tokio::test]
	async fn test_digest_from_intent_file() {
		let temp_dir = tempdir().unwrap();
		let intent_path = temp_dir.path().join("intent.json");
		fs::write(
			&intent_path,
			r#"{
				"input": {
					"tokenAmount": {
						"token": "0x0101010101010101010101010101010101010101",
						"amount": "0x32",
						"amountType": "absolute"
					}
				},
				"output": {
					"token": "0x0202020202020202020202020202020202020202",
					"absoluteAmount": "0xa"
				},
				"swapDescription": {
					"swapType": "fixedInputs",
					"destination": "0x2020202020202020202020202020202020202020",
					"strategy": "0x2020202020202020202020202020202020202020"
				},
				"account": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
			}"#,
		)
		.unwrap();

		let intent = commands::load_intent(&intent_path).await.unwrap();
		let config = router_config::builders::ConfigBuilder::new().build();
		let first = commands::digest(&config, &intent);

		let mut salted = intent.clone();
		salted.salt = U256::from(1);
		assert_ne!(first, commands::digest(&config, &salted));
	}
}
