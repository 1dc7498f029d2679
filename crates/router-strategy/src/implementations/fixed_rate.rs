//! Strategy trading at a fixed rate against its own inventory.
//!
//! The strategy receives `input_token` and pays `output_token` from its own
//! balance at `rate` output units per input unit, scaled by 1e18. Call data
//! is the ABI-encoded `uint256` output the caller wants; for execution it
//! acts as a minimum, for the dry run it is the target.

use crate::{
	StrategyCall, StrategyError, StrategyFactory, StrategyInterface, StrategyLedger,
	StrategyRegistry,
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use router_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError, DELIMITER,
};

pub struct FixedRateStrategy {
	address: Address,
	input_token: Address,
	output_token: Address,
	rate: U256,
}

impl FixedRateStrategy {
	pub fn new(address: Address, input_token: Address, output_token: Address, rate: U256) -> Self {
		Self {
			address,
			input_token,
			output_token,
			rate,
		}
	}

	fn output_for(&self, input: U256) -> Result<U256, StrategyError> {
		input
			.checked_mul(self.rate)
			.map(|v| v / DELIMITER)
			.ok_or_else(|| StrategyError::Failed("output amount overflow".into()))
	}

	/// Smallest input whose output reaches `output`.
	fn input_for(&self, output: U256) -> Result<U256, StrategyError> {
		let scaled = output
			.checked_mul(DELIMITER)
			.ok_or_else(|| StrategyError::Failed("input amount overflow".into()))?;
		Ok(scaled.div_ceil(self.rate))
	}
}

fn decode_amount(call_data: &Bytes) -> Result<U256, StrategyError> {
	U256::abi_decode(call_data, true).map_err(|e| StrategyError::InvalidCallData(e.to_string()))
}

#[async_trait]
impl StrategyInterface for FixedRateStrategy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FixedRateSchema)
	}

	fn address(&self) -> Address {
		self.address
	}

	async fn execute(
		&self,
		ledger: &mut StrategyLedger<'_>,
		call: StrategyCall,
	) -> Result<(), StrategyError> {
		let minimum = if call.call_data.is_empty() {
			U256::ZERO
		} else {
			decode_amount(&call.call_data)?
		};

		// Only input that arrived since the last settlement pays for output.
		let received = ledger
			.balance_of(self.input_token, self.address)
			.saturating_sub(ledger.reserve(self.input_token));
		if received < call.exact_input {
			return Err(StrategyError::Failed(format!(
				"received {} of {}, expected {}",
				received, self.input_token, call.exact_input
			)));
		}

		let output = self.output_for(call.exact_input)?;
		if output < minimum {
			return Err(StrategyError::Failed(format!(
				"output {} below requested {}",
				output, minimum
			)));
		}

		tracing::debug!(
			strategy = %self.address,
			input_token = %self.input_token,
			input = %call.exact_input,
			received = %received,
			output = %output,
			"Fixed-rate swap"
		);
		ledger.transfer(self.output_token, call.account, output)?;
		ledger.sync_reserve(self.input_token);
		ledger.sync_reserve(self.output_token);
		Ok(())
	}

	async fn exact_input_amount(
		&self,
		_ledger: &StrategyLedger<'_>,
		call_data: &Bytes,
	) -> Result<Bytes, StrategyError> {
		let desired = decode_amount(call_data)?;
		let input = self.input_for(desired)?;
		Ok(Bytes::from(input.to_be_bytes::<32>().to_vec()))
	}
}

/// Configuration schema for FixedRateStrategy.
pub struct FixedRateSchema;

impl ConfigSchema for FixedRateSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("address", FieldType::Address),
				Field::new("input_token", FieldType::Address),
				Field::new("output_token", FieldType::Address),
				Field::new("rate", FieldType::Uint256).with_validator(|value| {
					match value.as_str().and_then(|s| s.parse::<U256>().ok()) {
						Some(rate) if !rate.is_zero() => Ok(()),
						_ => Err("rate must be greater than zero".to_string()),
					}
				}),
			],
			vec![Field::new("implementation", FieldType::String)],
		);
		schema.validate(config)
	}
}

fn parse_field<T: std::str::FromStr>(config: &toml::Value, name: &str) -> Result<T, StrategyError> {
	config
		.get(name)
		.and_then(|v| v.as_str())
		.and_then(|s| s.parse().ok())
		.ok_or_else(|| StrategyError::Configuration(format!("invalid '{}'", name)))
}

/// Factory function to create a fixed-rate strategy.
///
/// Configuration parameters:
/// - `address`: address intents use to select this strategy
/// - `input_token`, `output_token`: assets traded
/// - `rate`: output per input unit, 1e18 fixed point
pub fn create_strategy(config: &toml::Value) -> Result<Box<dyn StrategyInterface>, StrategyError> {
	FixedRateSchema
		.validate(config)
		.map_err(|e| StrategyError::Configuration(e.to_string()))?;

	Ok(Box::new(FixedRateStrategy::new(
		parse_field(config, "address")?,
		parse_field(config, "input_token")?,
		parse_field(config, "output_token")?,
		parse_field(config, "rate")?,
	)))
}

/// Registry for the fixed-rate strategy implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "fixed_rate";
	type Factory = StrategyFactory;

	fn factory() -> Self::Factory {
		create_strategy
	}
}

impl StrategyRegistry for Registry {}
