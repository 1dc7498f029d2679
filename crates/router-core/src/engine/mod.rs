//! The router: entry points and the execution pipeline.
//!
//! Every entry point runs under the re-entry guard. An execution works on a
//! copy of the ledger taken under the ledger lock; the copy replaces the
//! shared ledger only after every stage has passed and, for delegated
//! executions, the authorization has been marked used. Events and outcome
//! records are produced after that commit.

pub mod event_bus;
pub mod guard;

use crate::amount::resolve_absolute_amount;
use crate::auth::hasher::AuthorizationHasher;
use crate::auth::replay::ReplayGuard;
use crate::auth::signature::recover_signer;
use crate::fee::{exact_input_for_fixed_inputs, fee_amount, validate_fee};
use crate::permit::encode_permit_call;
use crate::ExecutionError;
use alloy_primitives::{Address, B256, U256};
use chrono::Utc;
use event_bus::EventBus;
use guard::ReentrancyGuard;
use router_ledger::{BalanceOracle, Ledger, SharedLedger};
use router_storage::{StorageError, StorageService};
use router_strategy::{StrategyCall, StrategyLedger, StrategyService};
use router_types::{
	is_native, truncate_id, CallContext, Eip712Domain, ExecutionIntent, ExecutionOutcome,
	ExecutionReceipt, RouterEvent, StorageKey, SwapType,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::instrument;
use uuid::Uuid;

/// Identity and protocol parameters of a router instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterParams {
	/// Identifier used in logs.
	pub id: String,
	/// Address of the router on the ledger.
	pub address: Address,
	/// Account allowed to recover stray assets.
	pub owner: Address,
	/// Upper bound of the fee share.
	pub fee_limit: U256,
}

/// Executes intents against a shared ledger.
///
/// One entry point runs at a time. Calls overlapping a running one fail with
/// [`ExecutionError::Busy`], or with [`ExecutionError::Reentrancy`] when they
/// come from inside it; callers retry or serialize submissions themselves.
pub struct Router {
	params: RouterParams,
	hasher: AuthorizationHasher,
	ledger: SharedLedger,
	strategies: StrategyService,
	storage: Arc<StorageService>,
	replay: ReplayGuard,
	event_bus: EventBus,
	guard: ReentrancyGuard,
}

impl Router {
	pub fn new(
		params: RouterParams,
		domain: Eip712Domain,
		ledger: SharedLedger,
		strategies: StrategyService,
		storage: Arc<StorageService>,
		event_bus: EventBus,
	) -> Self {
		Self {
			params,
			hasher: AuthorizationHasher::new(domain),
			ledger,
			strategies,
			replay: ReplayGuard::new(storage.clone()),
			storage,
			event_bus,
			guard: ReentrancyGuard::new(),
		}
	}

	pub fn id(&self) -> &str {
		&self.params.id
	}

	pub fn address(&self) -> Address {
		self.params.address
	}

	pub fn owner(&self) -> Address {
		self.params.owner
	}

	pub fn fee_limit(&self) -> U256 {
		self.params.fee_limit
	}

	pub fn domain(&self) -> &Eip712Domain {
		self.hasher.domain()
	}

	/// Signing digest of `intent` in this router's domain.
	pub fn digest(&self, intent: &ExecutionIntent) -> B256 {
		self.hasher.digest(intent)
	}

	/// Handle to the ledger the router executes against.
	pub fn ledger(&self) -> SharedLedger {
		self.ledger.clone()
	}

	/// Addresses of the registered strategies.
	pub fn strategies(&self) -> Vec<Address> {
		self.strategies.addresses()
	}

	pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
		self.event_bus.subscribe()
	}

	/// Whether `account` already consumed the authorization with `digest`.
	pub async fn is_used(&self, digest: &B256, account: &Address) -> Result<bool, ExecutionError> {
		self.replay.is_used(digest, account).await
	}

	/// Stored receipt of a committed execution.
	pub async fn receipt(&self, id: &Uuid) -> Result<Option<ExecutionReceipt>, ExecutionError> {
		match self
			.storage
			.retrieve(StorageKey::Outcomes.as_str(), &id.to_string())
			.await
		{
			Ok(receipt) => Ok(Some(receipt)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	/// Removes expired outcome records; replay marks never expire.
	pub async fn cleanup_storage(&self) -> Result<usize, ExecutionError> {
		Ok(self.storage.cleanup_expired().await?)
	}

	/// Executes an intent submitted by its own account.
	#[instrument(skip_all, fields(router = %self.params.id, account = %intent.account))]
	pub async fn execute(
		&self,
		call: CallContext,
		intent: &ExecutionIntent,
	) -> Result<ExecutionReceipt, ExecutionError> {
		let _entry = self.guard.enter()?;
		if call.caller != intent.account {
			return Err(ExecutionError::Unauthorized(call.caller));
		}

		let digest = self.hasher.digest(intent);
		self.guard.scope(self.run(call, intent, digest, false)).await
	}

	/// Executes an intent authorized by a signature of its account.
	///
	/// The signature and the replay set are checked before anything is
	/// moved; the authorization is marked used only when the execution commits.
	#[instrument(skip_all, fields(router = %self.params.id, account = %intent.account))]
	pub async fn execute_signed(
		&self,
		call: CallContext,
		intent: &ExecutionIntent,
		signature: &[u8],
	) -> Result<ExecutionReceipt, ExecutionError> {
		let _entry = self.guard.enter()?;

		let digest = self.hasher.digest(intent);
		let recovered = recover_signer(&digest, signature)?;
		if recovered != intent.account {
			return Err(ExecutionError::SignerMismatch {
				recovered,
				claimed: intent.account,
			});
		}
		if self.replay.is_used(&digest, &intent.account).await? {
			return Err(ExecutionError::ReplayError {
				digest,
				account: intent.account,
			});
		}

		self.guard.scope(self.run(call, intent, digest, true)).await
	}

	/// Sends the router's whole balance of `asset` to `beneficiary`. Owner only.
	#[instrument(skip_all, fields(router = %self.params.id, asset = %asset))]
	pub async fn return_lost_tokens(
		&self,
		caller: Address,
		asset: Address,
		beneficiary: Address,
	) -> Result<U256, ExecutionError> {
		let _entry = self.guard.enter()?;
		if caller != self.params.owner {
			return Err(ExecutionError::Unauthorized(caller));
		}
		if beneficiary == Address::ZERO {
			return Err(ExecutionError::ZeroBeneficiary);
		}

		let amount = {
			let mut ledger = self.ledger.lock().await;
			let amount = ledger.balance_of(asset, self.params.address);
			ledger.transfer(asset, self.params.address, beneficiary, amount)?;
			amount
		};

		tracing::info!(beneficiary = %beneficiary, amount = %amount, "Returned lost tokens");
		self.event_bus
			.publish(RouterEvent::TokensReturned {
				asset,
				beneficiary,
				amount,
			})
			.ok();
		Ok(amount)
	}

	async fn run(
		&self,
		call: CallContext,
		intent: &ExecutionIntent,
		digest: B256,
		delegated: bool,
	) -> Result<ExecutionReceipt, ExecutionError> {
		let mut shared = self.ledger.lock().await;
		let mut working = shared.clone();

		let outcome = match self.pipeline(&mut working, &call, intent).await {
			Ok(outcome) => outcome,
			Err(e) => {
				tracing::warn!(error = %e, "Execution rejected");
				return Err(e);
			},
		};

		if delegated {
			self.replay.mark_used(&digest, &intent.account).await?;
		}
		*shared = working;
		drop(shared);

		let receipt = ExecutionReceipt {
			id: Uuid::new_v4(),
			digest,
			delegated,
			executed_at: Utc::now(),
			outcome,
		};
		if let Err(e) = self
			.storage
			.store(
				StorageKey::Outcomes.as_str(),
				&receipt.id.to_string(),
				&receipt,
			)
			.await
		{
			tracing::warn!(error = %e, "Failed to store execution receipt");
		}

		tracing::info!(
			digest = %truncate_id(&digest.to_string()),
			input_delta = %receipt.outcome.actual_input_delta,
			output_delta = %receipt.outcome.actual_output_delta,
			delegated,
			"Executed"
		);
		self.event_bus
			.publish(RouterEvent::Executed(receipt.outcome.clone()))
			.ok();
		Ok(receipt)
	}

	async fn pipeline(
		&self,
		ledger: &mut Ledger,
		call: &CallContext,
		intent: &ExecutionIntent,
	) -> Result<ExecutionOutcome, ExecutionError> {
		let router = self.params.address;
		let swap = &intent.swap_description;
		let input_token = intent.input.token_amount.token;
		let native_input = is_native(&input_token);

		if !call.value.is_zero() {
			if !native_input {
				return Err(ExecutionError::UnexpectedValue(call.value));
			}
			ledger.transfer_native(call.caller, router, call.value)?;
		}

		validate_fee(&swap.fee, self.params.fee_limit)?;

		let absolute_input =
			resolve_absolute_amount(&*ledger, &intent.input.token_amount, intent.account)?;

		// Native input in flight is held by the router itself.
		let input_holder = if native_input { router } else { intent.account };
		let input_before = ledger.balance_of(input_token, input_holder);
		let output_before = ledger.balance_of(intent.output.token, intent.account);

		let strategy = self
			.strategies
			.get(&swap.strategy)
			.ok_or(ExecutionError::UnknownStrategy(swap.strategy))?;

		let exact_input = match swap.swap_type {
			SwapType::FixedInputs => exact_input_for_fixed_inputs(absolute_input, swap.fee.share)?,
			SwapType::FixedOutputs => {
				let scoped = StrategyLedger::new(&mut *ledger, swap.strategy);
				let response = strategy
					.exact_input_amount(&scoped, &swap.strategy_call_data)
					.await
					.map_err(|e| ExecutionError::Strategy(e.to_string()))?;
				// Trailing data after the first word is ignored.
				if response.len() < 32 {
					return Err(ExecutionError::BadDryRunResponse(response.len()));
				}
				U256::from_be_slice(&response[..32])
			},
			SwapType::None => return Err(ExecutionError::NoSwapType),
		};
		if exact_input > absolute_input {
			return Err(ExecutionError::ExactInputExceedsAbsolute {
				exact: exact_input,
				absolute: absolute_input,
			});
		}
		let fee = fee_amount(absolute_input, exact_input, swap)?;

		if native_input {
			if call.value < absolute_input {
				return Err(ExecutionError::InsufficientValue {
					sent: call.value,
					required: absolute_input,
				});
			}
			if !fee.is_zero() {
				ledger.transfer_native(router, swap.fee.beneficiary, fee)?;
			}
			ledger.transfer_native(router, swap.strategy, exact_input)?;
		} else {
			let allowance = ledger.allowance(input_token, intent.account, router);
			if allowance < absolute_input {
				let permit_call = encode_permit_call(&intent.input.permit)?;
				ledger.permit(input_token, &permit_call)?;
				tracing::debug!(
					permit_type = ?intent.input.permit.permit_type,
					allowance = %allowance,
					"Used permit for short allowance"
				);
			}
			if !fee.is_zero() {
				ledger.transfer_from(input_token, router, intent.account, swap.fee.beneficiary, fee)?;
			}
			ledger.transfer_from(input_token, router, intent.account, swap.destination, exact_input)?;
		}

		{
			let mut scoped = StrategyLedger::new(&mut *ledger, swap.strategy);
			strategy
				.execute(
					&mut scoped,
					StrategyCall {
						exact_input,
						call_data: swap.strategy_call_data.clone(),
						account: intent.account,
					},
				)
				.await
				.map_err(|e| ExecutionError::Strategy(e.to_string()))?;
		}

		let input_delta = input_before.saturating_sub(ledger.balance_of(input_token, input_holder));
		let output_delta = ledger
			.balance_of(intent.output.token, intent.account)
			.saturating_sub(output_before);

		if native_input {
			// Covers both unconsumed and over-sent value.
			let refund = call.value.saturating_sub(input_delta);
			if !refund.is_zero() {
				ledger.transfer_native(router, intent.account, refund)?;
			}
		}

		if input_delta > absolute_input {
			return Err(ExecutionError::InputDeltaExceedsAbsolute {
				delta: input_delta,
				absolute: absolute_input,
			});
		}
		if output_delta < intent.output.absolute_amount {
			return Err(ExecutionError::OutputBelowRequired {
				delta: output_delta,
				required: intent.output.absolute_amount,
			});
		}

		Ok(ExecutionOutcome {
			input_token,
			absolute_input_amount: absolute_input,
			actual_input_delta: input_delta,
			output_token: intent.output.token,
			absolute_output_amount: intent.output.absolute_amount,
			actual_output_delta: output_delta,
			swap_type: swap.swap_type,
			fee_share: swap.fee.share,
			fee_beneficiary: swap.fee.beneficiary,
			destination: swap.destination,
			strategy: swap.strategy,
			account: intent.account,
			caller: call.caller,
		})
	}
}
