//! Decoded `wallet_sendCalls` parameters, as shown on the approval screen.

use alloy_primitives::{Address, Bytes, ChainId, U256};
use serde::{Deserialize, Serialize};
use url::Url;

/// A single call in a `wallet_sendCalls` bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// The call target.
    pub to: Address,
    /// The calldata.
    #[serde(default)]
    pub data: Option<Bytes>,
    /// The value sent with the call.
    #[serde(default)]
    pub value: Option<U256>,
}

/// Capabilities requested alongside a call bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCallsCapabilities {
    /// The token fees should be paid in.
    #[serde(default)]
    pub fee_token: Option<String>,
    /// A merchant RPC that sponsors the bundle.
    #[serde(default)]
    pub merchant_rpc_url: Option<Url>,
}

/// Parameters of `wallet_sendCalls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCallsParams {
    /// The calls to execute.
    pub calls: Vec<Call>,
    /// Requested capabilities.
    #[serde(default)]
    pub capabilities: Option<SendCallsCapabilities>,
    /// The chain to execute on. Hex quantity as per EIP-5792.
    #[serde(default, with = "quantity")]
    pub chain_id: Option<ChainId>,
    /// The account executing the calls.
    #[serde(default)]
    pub from: Option<Address>,
}

impl SendCallsParams {
    /// The fee token requested by the bundle, if any.
    pub fn fee_token(&self) -> Option<&str> {
        self.capabilities.as_ref()?.fee_token.as_deref()
    }

    /// The merchant RPC sponsoring the bundle, if any.
    pub fn merchant_rpc_url(&self) -> Option<&Url> {
        self.capabilities.as_ref()?.merchant_rpc_url.as_ref()
    }

    /// Sum of the value of all calls.
    pub fn total_value(&self) -> U256 {
        self.calls.iter().filter_map(|call| call.value).fold(U256::ZERO, |acc, v| acc + v)
    }
}

/// (De)serializes an optional chain id given either as a hex quantity or a plain number.
mod quantity {
    use alloy_primitives::{ChainId, U64};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Hex(U64),
        Number(u64),
    }

    pub(super) fn serialize<S: Serializer>(
        chain_id: &Option<ChainId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match chain_id {
            Some(id) => serializer.serialize_str(&format!("{id:#x}")),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ChainId>, D::Error> {
        Ok(Option::<Quantity>::deserialize(deserializer)?.map(|quantity| match quantity {
            Quantity::Hex(id) => id.to::<u64>(),
            Quantity::Number(id) => id,
        }))
    }
}
