//! Handlers of the `router` subcommands.
//!
//! Each handler returns a JSON document which `main` prints; nothing here
//! writes to stdout directly.

use crate::factory_registry::{build_router, build_signer};
use alloy_primitives::{Address, Bytes, B256, U256};
use router_config::Config;
use router_core::{recover_signer, AuthorizationHasher};
use router_ledger::{shared, Ledger, LedgerGenesis};
use router_types::{CallContext, ExecutionIntent};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::path::Path;

type CommandResult<T> = Result<T, Box<dyn Error>>;

/// Reads a JSON-encoded intent.
pub async fn load_intent(path: &Path) -> CommandResult<ExecutionIntent> {
	let content = tokio::fs::read_to_string(path).await?;
	Ok(serde_json::from_str(&content)?)
}

/// Reads a JSON-encoded initial ledger state.
pub async fn load_genesis(path: &Path) -> CommandResult<LedgerGenesis> {
	let content = tokio::fs::read_to_string(path).await?;
	Ok(serde_json::from_str(&content)?)
}

fn parse_signature(signature: &str) -> CommandResult<Bytes> {
	Ok(signature.trim().parse::<Bytes>()?)
}

/// EIP-712 digest of `intent` under the configured domain.
pub fn digest(config: &Config, intent: &ExecutionIntent) -> B256 {
	AuthorizationHasher::new(config.eip712_domain()).digest(intent)
}

/// Signs `intent` with the configured account.
pub async fn sign(config: &Config, intent: &ExecutionIntent) -> CommandResult<Value> {
	let account = build_signer(config)?;
	let signer = account.get_address().await?;
	if signer != intent.account {
		tracing::warn!(signer = %signer, account = %intent.account, "Signer is not the intent account");
	}

	let digest = digest(config, intent);
	let signature = account.sign_digest(&digest).await?;
	Ok(json!({
		"digest": digest,
		"signer": signer,
		"signature": Bytes::copy_from_slice(&signature),
	}))
}

/// Recovers the address that produced `signature` over the intent digest.
pub fn recover(config: &Config, intent: &ExecutionIntent, signature: &str) -> CommandResult<Value> {
	let digest = digest(config, intent);
	let signature = parse_signature(signature)?;
	let signer = recover_signer(&digest, &signature)?;
	Ok(json!({
		"digest": digest,
		"signer": signer,
		"matchesAccount": signer == intent.account,
	}))
}

/// Options of a simulated execution.
#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
	/// Delegated execution when present.
	pub signature: Option<String>,
	/// Submitting address; defaults to the intent account.
	pub caller: Option<Address>,
	pub value: U256,
}

/// Executes `intent` against a ledger built from `genesis` and reports the
/// receipt together with the resulting holdings of every party involved.
pub async fn simulate(
	config: Config,
	genesis: &LedgerGenesis,
	intent: &ExecutionIntent,
	options: SimulateOptions,
) -> CommandResult<Value> {
	let router = build_router(config, shared(genesis.build()?))?;
	let call = CallContext::new(options.caller.unwrap_or(intent.account)).with_value(options.value);

	let receipt = match &options.signature {
		Some(signature) => {
			let signature = parse_signature(signature)?;
			router.execute_signed(call, intent, &signature).await?
		},
		None => router.execute(call, intent).await?,
	};

	let swap = &intent.swap_description;
	let mut parties = vec![
		intent.account,
		call.caller,
		router.address(),
		swap.strategy,
		swap.destination,
		swap.fee.beneficiary,
	];
	parties.retain(|party| *party != Address::ZERO);
	parties.sort();
	parties.dedup();

	let ledger = router.ledger();
	let ledger = ledger.lock().await;
	Ok(json!({
		"receipt": serde_json::to_value(&receipt)?,
		"balances": holdings(&ledger, &parties),
	}))
}

fn holdings(ledger: &Ledger, parties: &[Address]) -> Value {
	let mut balances = Map::new();
	for party in parties {
		let assets: Map<String, Value> = ledger
			.holdings(*party)
			.into_iter()
			.map(|(asset, amount)| (asset.to_string(), json!(amount.to_string())))
			.collect();
		balances.insert(party.to_string(), Value::Object(assets));
	}
	Value::Object(balances)
}

/// Removes expired records from the configured storage.
pub async fn cleanup(config: Config) -> CommandResult<Value> {
	let router = build_router(config, shared(Ledger::new()))?;
	let removed = router.cleanup_storage().await?;
	Ok(json!({ "removed": removed }))
}
