//! EIP-712 hashing of execution intents.
//!
//! Every record type contributes its own struct hash; a parent record encodes
//! its nested records by that hash, never by their raw fields, so records of
//! different shapes cannot collide.

use alloy_primitives::{keccak256, B256};
use router_types::utils::{compute_final_digest, Eip712AbiEncoder};
use router_types::{
	AbsoluteTokenAmount, Eip712Domain, ExecutionIntent, Fee, Input, Permit, SwapDescription,
	TokenAmount,
};

/// A record with an EIP-712 struct type.
pub trait TypedStruct {
	/// Type string of the record itself, e.g. `Fee(uint256 share,address beneficiary)`.
	const TYPE: &'static str;

	/// Type strings of every record referenced directly or transitively.
	fn referenced_types() -> Vec<&'static str> {
		Vec::new()
	}

	/// Appends one 32-byte word per member, in declaration order.
	fn encode_data(&self, enc: &mut Eip712AbiEncoder);

	/// The record's type string followed by referenced types sorted by name.
	fn encode_type() -> String {
		let mut referenced = Self::referenced_types();
		referenced.sort_by(|a, b| type_name(a).cmp(type_name(b)));
		referenced.dedup();

		let mut out = String::from(Self::TYPE);
		for ty in referenced {
			out.push_str(ty);
		}
		out
	}

	fn type_hash() -> B256 {
		keccak256(Self::encode_type().as_bytes())
	}

	fn struct_hash(&self) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&Self::type_hash());
		self.encode_data(&mut enc);
		keccak256(enc.finish())
	}
}

fn type_name(ty: &str) -> &str {
	ty.split('(').next().unwrap_or(ty)
}

impl TypedStruct for TokenAmount {
	const TYPE: &'static str = "TokenAmount(address token,uint256 amount,uint8 amountType)";

	fn encode_data(&self, enc: &mut Eip712AbiEncoder) {
		enc.push_address(&self.token);
		enc.push_u256(self.amount);
		enc.push_u8(self.amount_type.as_u8());
	}
}

impl TypedStruct for Permit {
	const TYPE: &'static str = "Permit(uint8 permitType,bytes permitCallData)";

	fn encode_data(&self, enc: &mut Eip712AbiEncoder) {
		enc.push_u8(self.permit_type.as_u8());
		enc.push_bytes(&self.permit_call_data);
	}
}

impl TypedStruct for Input {
	const TYPE: &'static str = "Input(TokenAmount tokenAmount,Permit permit)";

	fn referenced_types() -> Vec<&'static str> {
		vec![TokenAmount::TYPE, Permit::TYPE]
	}

	fn encode_data(&self, enc: &mut Eip712AbiEncoder) {
		enc.push_b256(&self.token_amount.struct_hash());
		enc.push_b256(&self.permit.struct_hash());
	}
}

impl TypedStruct for AbsoluteTokenAmount {
	const TYPE: &'static str = "AbsoluteTokenAmount(address token,uint256 absoluteAmount)";

	fn encode_data(&self, enc: &mut Eip712AbiEncoder) {
		enc.push_address(&self.token);
		enc.push_u256(self.absolute_amount);
	}
}

impl TypedStruct for Fee {
	const TYPE: &'static str = "Fee(uint256 share,address beneficiary)";

	fn encode_data(&self, enc: &mut Eip712AbiEncoder) {
		enc.push_u256(self.share);
		enc.push_address(&self.beneficiary);
	}
}

impl TypedStruct for SwapDescription {
	const TYPE: &'static str = "SwapDescription(uint8 swapType,Fee fee,address destination,address strategy,bytes strategyCallData)";

	fn referenced_types() -> Vec<&'static str> {
		vec![Fee::TYPE]
	}

	fn encode_data(&self, enc: &mut Eip712AbiEncoder) {
		enc.push_u8(self.swap_type.as_u8());
		enc.push_b256(&self.fee.struct_hash());
		enc.push_address(&self.destination);
		enc.push_address(&self.strategy);
		enc.push_bytes(&self.strategy_call_data);
	}
}

impl TypedStruct for ExecutionIntent {
	const TYPE: &'static str = "Execute(Input input,AbsoluteTokenAmount output,SwapDescription swapDescription,address account,uint256 salt)";

	fn referenced_types() -> Vec<&'static str> {
		let mut types = vec![Input::TYPE, AbsoluteTokenAmount::TYPE, SwapDescription::TYPE];
		types.extend(Input::referenced_types());
		types.extend(SwapDescription::referenced_types());
		types
	}

	fn encode_data(&self, enc: &mut Eip712AbiEncoder) {
		enc.push_b256(&self.input.struct_hash());
		enc.push_b256(&self.output.struct_hash());
		enc.push_b256(&self.swap_description.struct_hash());
		enc.push_address(&self.account);
		enc.push_u256(self.salt);
	}
}

/// Computes signing digests for one router's domain.
#[derive(Debug, Clone)]
pub struct AuthorizationHasher {
	domain: Eip712Domain,
	separator: B256,
}

impl AuthorizationHasher {
	pub fn new(domain: Eip712Domain) -> Self {
		let separator = domain.separator();
		Self { domain, separator }
	}

	pub fn domain(&self) -> &Eip712Domain {
		&self.domain
	}

	pub fn domain_separator(&self) -> B256 {
		self.separator
	}

	/// `keccak256(0x1901 || domainSeparator || structHash(intent))`.
	pub fn digest(&self, intent: &ExecutionIntent) -> B256 {
		compute_final_digest(&self.separator, &intent.struct_hash())
	}
}
