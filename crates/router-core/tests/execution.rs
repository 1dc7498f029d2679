mod common;

use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::SolCall;
use common::*;
use router_core::ExecutionError;
use router_ledger::{BalanceOracle, LedgerError};
use router_types::standards::permit::IDaiPermit;
use router_types::{
	CallContext, Permit, PermitType, RouterEvent, SwapType, DELIMITER, NATIVE_ASSET,
};

#[tokio::test]
async fn test_direct_execution_by_account() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, POOL);

	let receipt = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap();
	assert!(!receipt.delegated);
	assert_eq!(receipt.outcome.caller, account());
	assert_eq!(receipt.outcome.actual_input_delta, U256::from(50));
	assert_eq!(receipt.outcome.actual_output_delta, U256::from(50));

	let ledger = snapshot(&router).await;
	assert_eq!(ledger.balance_of(TOKEN_X, account()), U256::from(950));
	assert_eq!(ledger.balance_of(TOKEN_X, POOL), U256::from(50));
	assert_eq!(ledger.balance_of(TOKEN_Y, account()), U256::from(50));
	assert_eq!(
		ledger.allowance(TOKEN_X, account(), ROUTER),
		U256::from(950)
	);
}

#[tokio::test]
async fn test_direct_execution_requires_account_as_caller() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let before = snapshot(&router).await;
	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, POOL);

	let err = router.execute(relayer(), &order).await.unwrap_err();
	assert!(matches!(err, ExecutionError::Unauthorized(caller) if caller == RELAYER));
	assert_eq!(snapshot(&router).await, before);
}

#[tokio::test]
async fn test_relative_full_balance() {
	let mut ledger = funded_ledger();
	ledger.approve(TOKEN_X, account(), ROUTER, U256::MAX);
	let router = build_router(config(), ledger, vec![]);

	let order = intent(relative(TOKEN_X, DELIMITER), 1_000, SwapType::FixedInputs, POOL);
	let receipt = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap();

	assert_eq!(receipt.outcome.absolute_input_amount, U256::from(1_000));
	let ledger = snapshot(&router).await;
	assert_eq!(ledger.balance_of(TOKEN_X, account()), U256::ZERO);
	assert_eq!(ledger.balance_of(TOKEN_Y, account()), U256::from(1_000));
}

#[tokio::test]
async fn test_relative_half_balance() {
	let mut ledger = router_ledger::Ledger::new();
	ledger.mint(TOKEN_X, account(), U256::from(100)).unwrap();
	ledger.mint(TOKEN_Y, POOL, U256::from(100)).unwrap();
	ledger.approve(TOKEN_X, account(), ROUTER, U256::MAX);
	let router = build_router(config(), ledger, vec![]);

	let order = intent(
		relative(TOKEN_X, DELIMITER / U256::from(2)),
		50,
		SwapType::FixedInputs,
		POOL,
	);
	let receipt = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap();
	assert_eq!(receipt.outcome.absolute_input_amount, U256::from(50));
	assert_eq!(
		snapshot(&router).await.balance_of(TOKEN_X, account()),
		U256::from(50)
	);
}

#[tokio::test]
async fn test_fixed_inputs_fee_is_residual() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let order = with_fee(
		intent(absolute(TOKEN_X, 101), 100, SwapType::FixedInputs, POOL),
		DELIMITER / U256::from(100),
	);

	let receipt = router.execute(CallContext::new(account()), &order).await.unwrap();
	assert_eq!(receipt.outcome.actual_input_delta, U256::from(101));
	assert_eq!(receipt.outcome.fee_beneficiary, BENEFICIARY);

	let ledger = snapshot(&router).await;
	assert_eq!(ledger.balance_of(TOKEN_X, BENEFICIARY), U256::from(1));
	assert_eq!(ledger.balance_of(TOKEN_X, POOL), U256::from(100));
	assert_eq!(ledger.balance_of(TOKEN_Y, account()), U256::from(100));
}

#[tokio::test]
async fn test_fixed_outputs_without_headroom_charges_no_fee() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let order = with_fee(
		intent(absolute(TOKEN_X, 100), 100, SwapType::FixedOutputs, POOL),
		DELIMITER / U256::from(100),
	);

	router.execute(CallContext::new(account()), &order).await.unwrap();
	let ledger = snapshot(&router).await;
	assert_eq!(ledger.balance_of(TOKEN_X, BENEFICIARY), U256::ZERO);
	assert_eq!(ledger.balance_of(TOKEN_X, POOL), U256::from(100));
}

#[tokio::test]
async fn test_fixed_outputs_fee_from_headroom() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let order = with_fee(
		intent(absolute(TOKEN_X, 300), 200, SwapType::FixedOutputs, POOL),
		DELIMITER / U256::from(100),
	);

	let receipt = router.execute(CallContext::new(account()), &order).await.unwrap();
	assert_eq!(receipt.outcome.actual_input_delta, U256::from(202));
	let ledger = snapshot(&router).await;
	assert_eq!(ledger.balance_of(TOKEN_X, BENEFICIARY), U256::from(2));
	assert_eq!(ledger.balance_of(TOKEN_X, account()), U256::from(798));
}

#[tokio::test]
async fn test_fee_share_above_limit_rejected() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let share = DELIMITER / U256::from(50);
	let order = with_fee(
		intent(absolute(TOKEN_X, 100), 10, SwapType::FixedInputs, POOL),
		share,
	);

	let err = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap_err();
	assert!(matches!(err, ExecutionError::FeeShareExceedsCap(s) if s == share));
}

#[tokio::test]
async fn test_native_input_refunds_unconsumed_value() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let order = intent(absolute(NATIVE_ASSET, 50), 40, SwapType::FixedOutputs, NATIVE_POOL);

	let receipt = router
		.execute(CallContext::new(account()).with_value(U256::from(50)), &order)
		.await
		.unwrap();
	assert_eq!(receipt.outcome.actual_input_delta, U256::from(40));

	let ledger = snapshot(&router).await;
	assert_eq!(ledger.balance_of(NATIVE_ASSET, account()), U256::from(960));
	assert_eq!(ledger.balance_of(NATIVE_ASSET, NATIVE_POOL), U256::from(40));
	assert_eq!(ledger.balance_of(NATIVE_ASSET, ROUTER), U256::ZERO);
	assert_eq!(ledger.balance_of(TOKEN_Y, account()), U256::from(40));
}

#[tokio::test]
async fn test_native_input_refunds_over_sent_value() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let order = intent(absolute(NATIVE_ASSET, 50), 40, SwapType::FixedOutputs, NATIVE_POOL);

	router
		.execute(CallContext::new(account()).with_value(U256::from(60)), &order)
		.await
		.unwrap();

	let ledger = snapshot(&router).await;
	assert_eq!(ledger.balance_of(NATIVE_ASSET, account()), U256::from(960));
	assert_eq!(ledger.balance_of(NATIVE_ASSET, ROUTER), U256::ZERO);
}

#[tokio::test]
async fn test_native_value_rules() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let before = snapshot(&router).await;

	let native = intent(absolute(NATIVE_ASSET, 50), 40, SwapType::FixedOutputs, NATIVE_POOL);
	let err = router
		.execute(CallContext::new(account()).with_value(U256::from(49)), &native)
		.await
		.unwrap_err();
	assert!(matches!(
		err,
		ExecutionError::InsufficientValue { sent, required }
			if sent == U256::from(49) && required == U256::from(50)
	));

	let token = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, POOL);
	let err = router
		.execute(CallContext::new(account()).with_value(U256::from(1)), &token)
		.await
		.unwrap_err();
	assert!(matches!(err, ExecutionError::UnexpectedValue(v) if v == U256::from(1)));

	let relative_native = intent(relative(NATIVE_ASSET, DELIMITER), 40, SwapType::FixedInputs, NATIVE_POOL);
	let err = router
		.execute(CallContext::new(account()), &relative_native)
		.await
		.unwrap_err();
	assert!(matches!(err, ExecutionError::BadAmountType { .. }));

	assert_eq!(snapshot(&router).await, before);
}

#[tokio::test]
async fn test_output_below_required_rolls_back() {
	let config = router_config::builders::ConfigBuilder::new()
		.address(ROUTER)
		.owner(OWNER)
		.fixed_rate_strategy("half", POOL, TOKEN_X, TOKEN_Y, DELIMITER / U256::from(2))
		.build();
	let router = build_router(config, funded_ledger(), vec![]);
	let before = snapshot(&router).await;

	// Empty call data: the pool pays half the input and checks no minimum.
	let mut order = intent(absolute(TOKEN_X, 50), 30, SwapType::FixedInputs, POOL);
	order.swap_description.strategy_call_data = Bytes::new();

	let err = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap_err();
	assert!(matches!(
		err,
		ExecutionError::OutputBelowRequired { delta, required }
			if delta == U256::from(25) && required == U256::from(30)
	));
	assert_eq!(snapshot(&router).await, before);
}

#[tokio::test]
async fn test_strategy_pulling_extra_input_rolls_back() {
	let mut ledger = funded_ledger();
	ledger.approve(TOKEN_X, account(), GREEDY, U256::MAX);
	let router = build_router(
		config(),
		ledger,
		vec![Box::new(GreedyStrategy {
			extra: U256::from(5),
		})],
	);
	let before = snapshot(&router).await;

	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, GREEDY);
	let err = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap_err();
	assert!(matches!(
		err,
		ExecutionError::InputDeltaExceedsAbsolute { delta, absolute }
			if delta == U256::from(55) && absolute == U256::from(50)
	));
	assert_eq!(snapshot(&router).await, before);
}

#[tokio::test]
async fn test_strategy_failure_rolls_back() {
	let mut ledger = funded_ledger();
	ledger.transfer(TOKEN_Y, POOL, OWNER, U256::from(995)).unwrap();
	let router = build_router(config(), ledger, vec![]);
	let before = snapshot(&router).await;

	// The pool holds 5 Y and cannot pay out 50.
	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, POOL);
	let err = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap_err();
	assert!(matches!(err, ExecutionError::Strategy(_)));
	assert_eq!(snapshot(&router).await, before);
}

#[tokio::test]
async fn test_unknown_strategy_and_swap_type() {
	let router = build_router(config(), funded_ledger(), vec![]);

	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, OWNER);
	assert!(matches!(
		router.execute(CallContext::new(account()), &order).await,
		Err(ExecutionError::UnknownStrategy(address)) if address == OWNER
	));

	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::None, POOL);
	assert!(matches!(
		router.execute(CallContext::new(account()), &order).await,
		Err(ExecutionError::NoSwapType)
	));
}

#[tokio::test]
async fn test_short_dry_run_response_rejected() {
	let router = build_router(
		config(),
		funded_ledger(),
		vec![Box::new(ShortDryRunStrategy)],
	);
	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedOutputs, SHORT_DRY_RUN);

	assert!(matches!(
		router.execute(CallContext::new(account()), &order).await,
		Err(ExecutionError::BadDryRunResponse(31))
	));
}

#[tokio::test]
async fn test_dry_run_trailing_bytes_ignored() {
	let router = build_router(
		config(),
		funded_ledger(),
		vec![Box::new(PaddedDryRunStrategy)],
	);
	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedOutputs, PADDED_DRY_RUN);

	let receipt = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap();
	assert_eq!(receipt.outcome.actual_input_delta, U256::from(10));
	assert_eq!(receipt.outcome.actual_output_delta, U256::from(10));
}

#[tokio::test]
async fn test_fixed_rate_requires_delivered_input() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let before = snapshot(&router).await;

	// Input goes back to the account instead of the pool.
	let mut order = intent(absolute(TOKEN_X, 500), 500, SwapType::FixedInputs, POOL);
	order.swap_description.destination = account();

	let err = router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap_err();
	assert!(matches!(err, ExecutionError::Strategy(_)));
	assert_eq!(snapshot(&router).await, before);
	assert_eq!(before.balance_of(TOKEN_Y, POOL), U256::from(1_000));
}

#[tokio::test]
async fn test_fixed_rate_does_not_pay_twice_for_one_deposit() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let order = intent(absolute(TOKEN_X, 50), 50, SwapType::FixedInputs, POOL);
	router
		.execute(CallContext::new(account()), &order)
		.await
		.unwrap();

	let mut replay = order.clone();
	replay.salt = U256::from(1);
	replay.swap_description.destination = account();
	let err = router
		.execute(CallContext::new(account()), &replay)
		.await
		.unwrap_err();
	assert!(matches!(err, ExecutionError::Strategy(_)));

	let ledger = snapshot(&router).await;
	assert_eq!(ledger.balance_of(TOKEN_Y, account()), U256::from(50));
	assert_eq!(ledger.balance_of(TOKEN_Y, POOL), U256::from(950));
}

#[tokio::test]
async fn test_concurrent_call_is_busy() {
	let pausing = PausingStrategy::default();
	let entered = pausing.entered.clone();
	let release = pausing.release.clone();
	let router = build_router(config(), funded_ledger(), vec![Box::new(pausing)]);

	let first = {
		let router = router.clone();
		let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, PAUSING);
		tokio::spawn(async move { router.execute(CallContext::new(account()), &order).await })
	};
	entered.notified().await;

	let second = intent(absolute(TOKEN_X, 20), 10, SwapType::FixedInputs, POOL);
	assert!(matches!(
		router.execute(CallContext::new(account()), &second).await,
		Err(ExecutionError::Busy)
	));

	release.notify_one();
	let receipt = first.await.unwrap().unwrap();
	assert_eq!(receipt.outcome.actual_output_delta, U256::from(50));

	// Free again once the first call is done.
	router
		.execute(CallContext::new(account()), &second)
		.await
		.unwrap();
}

#[tokio::test]
async fn test_dry_run_above_absolute_rejected() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let order = intent(absolute(TOKEN_X, 50), 60, SwapType::FixedOutputs, POOL);

	assert!(matches!(
		router.execute(CallContext::new(account()), &order).await,
		Err(ExecutionError::ExactInputExceedsAbsolute { exact, absolute })
			if exact == U256::from(60) && absolute == U256::from(50)
	));
}

fn dai_permit() -> Permit {
	let call = IDaiPermit::permitCall {
		holder: account(),
		spender: ROUTER,
		nonce: U256::ZERO,
		expiry: U256::MAX,
		allowed: true,
		v: 27,
		r: B256::repeat_byte(0x01),
		s: B256::repeat_byte(0x02),
	}
	.abi_encode();

	Permit {
		permit_type: PermitType::Dai,
		permit_call_data: Bytes::from(call[4..].to_vec()),
	}
}

#[tokio::test]
async fn test_permit_used_when_allowance_short() {
	let mut ledger = funded_ledger();
	ledger.approve(TOKEN_X, account(), ROUTER, U256::ZERO);
	ledger.enable_permit(TOKEN_X, PermitType::Dai);
	let router = build_router(config(), ledger, vec![]);

	let mut order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, POOL);
	order.input.permit = dai_permit();

	router.execute(CallContext::new(account()), &order).await.unwrap();
	let ledger = snapshot(&router).await;
	assert_eq!(ledger.allowance(TOKEN_X, account(), ROUTER), U256::MAX);
	assert_eq!(ledger.balance_of(TOKEN_X, POOL), U256::from(50));
}

#[tokio::test]
async fn test_permit_skipped_when_allowance_suffices() {
	let router = build_router(config(), funded_ledger(), vec![]);

	// Malformed payload for a scheme the asset does not support: calling it would fail.
	let mut order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, POOL);
	order.input.permit = Permit {
		permit_type: PermitType::Yearn,
		permit_call_data: Bytes::from_static(&[0xff; 3]),
	};

	router.execute(CallContext::new(account()), &order).await.unwrap();
	assert_eq!(
		snapshot(&router).await.allowance(TOKEN_X, account(), ROUTER),
		U256::from(950)
	);
}

#[tokio::test]
async fn test_short_allowance_without_permit() {
	let mut ledger = funded_ledger();
	ledger.approve(TOKEN_X, account(), ROUTER, U256::from(10));
	let router = build_router(config(), ledger, vec![]);
	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, POOL);

	assert!(matches!(
		router.execute(CallContext::new(account()), &order).await,
		Err(ExecutionError::NoPermitType)
	));

	let mut order = order;
	order.input.permit = dai_permit();
	assert!(matches!(
		router.execute(CallContext::new(account()), &order).await,
		Err(ExecutionError::Ledger(LedgerError::PermitNotSupported { .. }))
	));
}

#[tokio::test]
async fn test_outcome_published_and_stored() {
	let router = build_router(config(), funded_ledger(), vec![]);
	let mut events = router.subscribe();
	let order = intent(absolute(TOKEN_X, 50), 10, SwapType::FixedInputs, POOL);

	let receipt = router.execute(CallContext::new(account()), &order).await.unwrap();

	match events.try_recv().unwrap() {
		RouterEvent::Executed(outcome) => assert_eq!(outcome, receipt.outcome),
		other => panic!("unexpected event {:?}", other),
	}
	assert_eq!(router.receipt(&receipt.id).await.unwrap(), Some(receipt.clone()));
	assert_eq!(receipt.digest, router.digest(&order));
	assert_eq!(router.receipt(&uuid::Uuid::new_v4()).await.unwrap(), None);

	// Failed executions publish nothing.
	let bad = intent(absolute(TOKEN_X, 50), 10, SwapType::None, POOL);
	assert!(router.execute(CallContext::new(account()), &bad).await.is_err());
	assert!(events.try_recv().is_err());
}
