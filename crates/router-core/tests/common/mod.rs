#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use router_config::builders::{ConfigBuilder, DEV_PRIVATE_KEY};
use router_config::Config;
use router_core::{ExecutionError, Router, RouterBuilder, RouterFactories};
use router_ledger::{shared, Ledger};
use router_storage::StorageFactory;
use router_strategy::{
	StrategyCall, StrategyError, StrategyFactory, StrategyInterface, StrategyLedger,
};
use router_types::{
	AbsoluteTokenAmount, AmountType, CallContext, ConfigSchema, ExecutionIntent, Fee, Input,
	Permit, Schema, SwapDescription, SwapType, TokenAmount, ValidationError, DELIMITER,
	NATIVE_ASSET,
};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use tokio::sync::Notify;

pub const TOKEN_X: Address = Address::repeat_byte(0x01);
pub const TOKEN_Y: Address = Address::repeat_byte(0x02);
pub const ROUTER: Address = Address::repeat_byte(0x10);
pub const OWNER: Address = Address::repeat_byte(0x0a);
pub const POOL: Address = Address::repeat_byte(0x20);
pub const NATIVE_POOL: Address = Address::repeat_byte(0x21);
pub const GREEDY: Address = Address::repeat_byte(0x30);
pub const REENTRANT: Address = Address::repeat_byte(0x31);
pub const SHORT_DRY_RUN: Address = Address::repeat_byte(0x32);
pub const PADDED_DRY_RUN: Address = Address::repeat_byte(0x33);
pub const PAUSING: Address = Address::repeat_byte(0x34);
pub const RELAYER: Address = Address::repeat_byte(0xbb);
pub const BENEFICIARY: Address = Address::repeat_byte(0xfe);

pub fn signer() -> PrivateKeySigner {
	DEV_PRIVATE_KEY.parse().unwrap()
}

pub fn account() -> Address {
	signer().address()
}

/// Router at [`ROUTER`] with 1:1 pools for X -> Y and native -> Y.
pub fn config() -> Config {
	ConfigBuilder::new()
		.address(ROUTER)
		.owner(OWNER)
		.fixed_rate_strategy("pool", POOL, TOKEN_X, TOKEN_Y, DELIMITER)
		.fixed_rate_strategy("native_pool", NATIVE_POOL, NATIVE_ASSET, TOKEN_Y, DELIMITER)
		.build()
}

pub fn factories() -> RouterFactories<StorageFactory, StrategyFactory> {
	RouterFactories {
		storage_factories: router_storage::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
		strategy_factories: router_strategy::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
	}
}

pub fn build_router(
	config: Config,
	ledger: Ledger,
	extra: Vec<Box<dyn StrategyInterface>>,
) -> Arc<Router> {
	let mut builder = RouterBuilder::new(config).with_ledger(shared(ledger));
	for strategy in extra {
		builder = builder.with_strategy(strategy);
	}
	Arc::new(builder.build(factories()).unwrap())
}

/// The account holds X and native currency and has approved the router;
/// every pool holds Y inventory.
pub fn funded_ledger() -> Ledger {
	let mut ledger = Ledger::new();
	ledger.mint(TOKEN_X, account(), U256::from(1_000)).unwrap();
	ledger.mint(NATIVE_ASSET, account(), U256::from(1_000)).unwrap();
	ledger.mint(NATIVE_ASSET, RELAYER, U256::from(1_000)).unwrap();
	for pool in [POOL, NATIVE_POOL, GREEDY, REENTRANT, SHORT_DRY_RUN, PADDED_DRY_RUN, PAUSING] {
		ledger.mint(TOKEN_Y, pool, U256::from(1_000)).unwrap();
	}
	ledger.approve(TOKEN_X, account(), ROUTER, U256::from(1_000));
	ledger
}

pub fn encoded_amount(amount: u64) -> Bytes {
	Bytes::from(U256::from(amount).abi_encode())
}

pub fn absolute(token: Address, amount: u64) -> TokenAmount {
	TokenAmount {
		token,
		amount: U256::from(amount),
		amount_type: AmountType::Absolute,
	}
}

pub fn relative(token: Address, share: U256) -> TokenAmount {
	TokenAmount {
		token,
		amount: share,
		amount_type: AmountType::Relative,
	}
}

/// Intent swapping through `strategy`, which is also the destination.
/// The strategy call data and the required output are both `output`.
pub fn intent(
	input: TokenAmount,
	output: u64,
	swap_type: SwapType,
	strategy: Address,
) -> ExecutionIntent {
	ExecutionIntent {
		input: Input {
			token_amount: input,
			permit: Permit::default(),
		},
		output: AbsoluteTokenAmount {
			token: TOKEN_Y,
			absolute_amount: U256::from(output),
		},
		swap_description: SwapDescription {
			swap_type,
			fee: Fee::default(),
			destination: strategy,
			strategy,
			strategy_call_data: encoded_amount(output),
		},
		account: account(),
		salt: U256::ZERO,
	}
}

pub fn with_fee(mut intent: ExecutionIntent, share: U256) -> ExecutionIntent {
	intent.swap_description.fee = Fee {
		share,
		beneficiary: BENEFICIARY,
	};
	intent
}

pub fn sign(router: &Router, intent: &ExecutionIntent) -> [u8; 65] {
	signer()
		.sign_hash_sync(&router.digest(intent))
		.unwrap()
		.as_bytes()
}

pub fn relayer() -> CallContext {
	CallContext::new(RELAYER)
}

pub async fn snapshot(router: &Router) -> Ledger {
	router.ledger().lock().await.clone()
}

struct NoConfig;

impl ConfigSchema for NoConfig {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Pays 1:1 output but also pulls `extra` input through its own allowance.
pub struct GreedyStrategy {
	pub extra: U256,
}

#[async_trait]
impl StrategyInterface for GreedyStrategy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoConfig)
	}

	fn address(&self) -> Address {
		GREEDY
	}

	async fn execute(
		&self,
		ledger: &mut StrategyLedger<'_>,
		call: StrategyCall,
	) -> Result<(), StrategyError> {
		ledger.transfer_from(TOKEN_X, call.account, GREEDY, self.extra)?;
		ledger.transfer(TOKEN_Y, call.account, call.exact_input)
	}

	async fn exact_input_amount(
		&self,
		_ledger: &StrategyLedger<'_>,
		call_data: &Bytes,
	) -> Result<Bytes, StrategyError> {
		Ok(call_data.clone())
	}
}

/// Calls back into the router from inside its own invocation.
pub struct ReentrantStrategy {
	pub router: Arc<OnceLock<Weak<Router>>>,
	pub observed: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl StrategyInterface for ReentrantStrategy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoConfig)
	}

	fn address(&self) -> Address {
		REENTRANT
	}

	async fn execute(
		&self,
		ledger: &mut StrategyLedger<'_>,
		call: StrategyCall,
	) -> Result<(), StrategyError> {
		let router = self
			.router
			.get()
			.and_then(Weak::upgrade)
			.ok_or_else(|| StrategyError::Failed("router gone".into()))?;

		let inner = intent(absolute(TOKEN_X, 1), 1, SwapType::FixedInputs, POOL);
		let result: Result<_, ExecutionError> =
			router.execute(CallContext::new(call.account), &inner).await;
		if let Err(e) = result {
			*self.observed.lock().unwrap() = Some(e.to_string());
			return Err(StrategyError::Failed(e.to_string()));
		}
		ledger.transfer(TOKEN_Y, call.account, call.exact_input)
	}

	async fn exact_input_amount(
		&self,
		_ledger: &StrategyLedger<'_>,
		call_data: &Bytes,
	) -> Result<Bytes, StrategyError> {
		Ok(call_data.clone())
	}
}

/// Answers the dry run with a truncated amount.
pub struct ShortDryRunStrategy;

#[async_trait]
impl StrategyInterface for ShortDryRunStrategy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoConfig)
	}

	fn address(&self) -> Address {
		SHORT_DRY_RUN
	}

	async fn execute(
		&self,
		_ledger: &mut StrategyLedger<'_>,
		_call: StrategyCall,
	) -> Result<(), StrategyError> {
		Ok(())
	}

	async fn exact_input_amount(
		&self,
		_ledger: &StrategyLedger<'_>,
		call_data: &Bytes,
	) -> Result<Bytes, StrategyError> {
		Ok(call_data.slice(1..))
	}
}

/// Answers the dry run with the amount word followed by a second word, then
/// pays 1:1.
pub struct PaddedDryRunStrategy;

#[async_trait]
impl StrategyInterface for PaddedDryRunStrategy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoConfig)
	}

	fn address(&self) -> Address {
		PADDED_DRY_RUN
	}

	async fn execute(
		&self,
		ledger: &mut StrategyLedger<'_>,
		call: StrategyCall,
	) -> Result<(), StrategyError> {
		ledger.transfer(TOKEN_Y, call.account, call.exact_input)
	}

	async fn exact_input_amount(
		&self,
		_ledger: &StrategyLedger<'_>,
		call_data: &Bytes,
	) -> Result<Bytes, StrategyError> {
		let mut response = call_data.to_vec();
		response.extend_from_slice(&[0xff; 32]);
		Ok(Bytes::from(response))
	}
}

/// Pays 1:1 after signalling `entered` and waiting for `release`.
#[derive(Default)]
pub struct PausingStrategy {
	pub entered: Arc<Notify>,
	pub release: Arc<Notify>,
}

#[async_trait]
impl StrategyInterface for PausingStrategy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoConfig)
	}

	fn address(&self) -> Address {
		PAUSING
	}

	async fn execute(
		&self,
		ledger: &mut StrategyLedger<'_>,
		call: StrategyCall,
	) -> Result<(), StrategyError> {
		self.entered.notify_one();
		self.release.notified().await;
		ledger.transfer(TOKEN_Y, call.account, call.exact_input)
	}

	async fn exact_input_amount(
		&self,
		_ledger: &StrategyLedger<'_>,
		call_data: &Bytes,
	) -> Result<Bytes, StrategyError> {
		Ok(call_data.clone())
	}
}
