//! [`Contract`] implementation over JSON-RPC.
//!
//! Reads go through `eth_call` against the latest block, writes through
//! `eth_sendTransaction` from the bound signer (the wallet signs), and
//! confirmation polls `eth_getTransactionReceipt`. Calldata and return data
//! are encoded from the [`InterfaceDescriptor`].

use agora_types::{Address, ProposalId, TxHash, U256};
use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::abi::InterfaceDescriptor;
use crate::adapter::{as_bool, as_uint, RawRecord};
use crate::contract::{methods, Contract, ContractConnector, Receipt};
use crate::error::ContractError;
use crate::transport::{from_hex, parse_quantity, to_hex, RpcTransport, MIN_POLL_INTERVAL};

/// Receipt fields this client reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptJson {
    #[serde(default)]
    block_number: Option<String>,
    /// `0x1` success, `0x0` revert. Absent on pre-Byzantium chains.
    #[serde(default)]
    status: Option<String>,
}

/// Contract handle bound to one signer.
pub struct RpcContract {
    transport: RpcTransport,
    address: Address,
    signer: Address,
    descriptor: Arc<InterfaceDescriptor>,
    receipt_poll: Duration,
}

impl RpcContract {
    pub fn new(
        transport: RpcTransport,
        address: Address,
        signer: Address,
        descriptor: Arc<InterfaceDescriptor>,
        receipt_poll: Duration,
    ) -> Self {
        Self {
            transport,
            address,
            signer,
            descriptor,
            receipt_poll,
        }
    }

    fn encode(&self, name: &str, args: &[DynSolValue]) -> Result<Vec<u8>, ContractError> {
        let function = self.descriptor.function(name)?;
        function
            .abi_encode_input(args)
            .map_err(|e| ContractError::Encode(format!("{name}: {e}")))
    }

    /// Call a read-only function and decode its outputs.
    async fn read(&self, name: &str, args: &[DynSolValue]) -> Result<RawRecord, ContractError> {
        let function = self.descriptor.function(name)?;
        let data = self.encode(name, args)?;
        let call = serde_json::json!({
            "from": self.signer.to_string(),
            "to": self.address.to_string(),
            "data": to_hex(&data),
        });
        let output: String = self
            .transport
            .request("eth_call", serde_json::json!([call, "latest"]))
            .await?;
        let bytes = from_hex(&output).map_err(ContractError::Decode)?;
        let values = function
            .abi_decode_output(&bytes, true)
            .map_err(|e| ContractError::Decode(format!("{name}: {e}")))?;
        Ok(RawRecord::from_outputs(function, values))
    }

    /// Ask the wallet to sign and broadcast a state-changing call.
    async fn send(&self, name: &str, args: &[DynSolValue]) -> Result<TxHash, ContractError> {
        let data = self.encode(name, args)?;
        let tx = serde_json::json!({
            "from": self.signer.to_string(),
            "to": self.address.to_string(),
            "data": to_hex(&data),
        });
        let hash: String = self
            .transport
            .request("eth_sendTransaction", serde_json::json!([tx]))
            .await?;
        let tx_hash = hash
            .parse::<TxHash>()
            .map_err(|e| ContractError::Decode(format!("transaction hash '{hash}': {e}")))?;
        info!(method = name, %tx_hash, "transaction submitted");
        Ok(tx_hash)
    }
}

fn uint_arg(id: ProposalId) -> DynSolValue {
    DynSolValue::Uint(U256::from(id.get()), 256)
}

#[async_trait]
impl Contract for RpcContract {
    async fn enroll_participant(&self) -> Result<TxHash, ContractError> {
        self.send(methods::ENROLL_PARTICIPANT, &[]).await
    }

    async fn submit_proposal(&self, description: &str) -> Result<TxHash, ContractError> {
        self.send(
            methods::SUBMIT_PROPOSAL,
            &[DynSolValue::String(description.to_string())],
        )
        .await
    }

    async fn cast_vote(&self, id: ProposalId, support: bool) -> Result<TxHash, ContractError> {
        self.send(
            methods::CAST_VOTE,
            &[uint_arg(id), DynSolValue::Bool(support)],
        )
        .await
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Receipt, ContractError> {
        loop {
            let receipt: Option<ReceiptJson> = self
                .transport
                .request(
                    "eth_getTransactionReceipt",
                    serde_json::json!([tx_hash.to_string()]),
                )
                .await?;
            let Some(receipt) = receipt else {
                debug!(%tx_hash, "receipt not yet available");
                tokio::time::sleep(self.receipt_poll).await;
                continue;
            };
            if receipt.status.as_deref() == Some("0x0") {
                return Err(ContractError::Reverted(tx_hash));
            }
            let block_number = receipt
                .block_number
                .as_deref()
                .map(parse_quantity)
                .transpose()
                .map_err(ContractError::Decode)?;
            info!(%tx_hash, ?block_number, "transaction confirmed");
            return Ok(Receipt {
                tx_hash,
                block_number,
            });
        }
    }

    async fn proposal_count(&self) -> Result<u64, ContractError> {
        let record = self.read(methods::PROPOSAL_COUNTER, &[]).await?;
        let count = record
            .at(0)
            .and_then(as_uint)
            .ok_or_else(|| ContractError::Decode("proposalCounter: expected uint".into()))?;
        u64::try_from(count)
            .map_err(|_| ContractError::Decode(format!("proposalCounter: {count} out of range")))
    }

    async fn proposal(&self, id: ProposalId) -> Result<RawRecord, ContractError> {
        self.read(methods::PROPOSALS, &[uint_arg(id)]).await
    }

    async fn is_registered(&self, account: Address) -> Result<Option<bool>, ContractError> {
        if !self.descriptor.supports(methods::IS_REGISTERED) {
            return Ok(None);
        }
        let record = self
            .read(methods::IS_REGISTERED, &[DynSolValue::Address(account)])
            .await?;
        record
            .at(0)
            .and_then(as_bool)
            .map(Some)
            .ok_or_else(|| ContractError::Decode("isRegistered: expected bool".into()))
    }
}

/// Binds [`RpcContract`] handles at the configured contract address.
pub struct RpcConnector {
    transport: RpcTransport,
    address: Option<Address>,
    descriptor: Arc<InterfaceDescriptor>,
    receipt_poll: Duration,
}

impl RpcConnector {
    /// `address` may be absent until configured; binding then fails.
    /// `receipt_poll` is raised to at least [`MIN_POLL_INTERVAL`].
    pub fn new(
        transport: RpcTransport,
        address: Option<Address>,
        descriptor: InterfaceDescriptor,
        receipt_poll: Duration,
    ) -> Self {
        Self {
            transport,
            address,
            descriptor: Arc::new(descriptor),
            receipt_poll: receipt_poll.max(MIN_POLL_INTERVAL),
        }
    }
}

impl ContractConnector for RpcConnector {
    fn bind(&self, signer: Address) -> Result<Arc<dyn Contract>, ContractError> {
        let address = self.address.ok_or_else(|| {
            ContractError::NotConfigured("contract address is not configured".into())
        })?;
        Ok(Arc::new(RpcContract::new(
            self.transport.clone(),
            address,
            signer,
            Arc::clone(&self.descriptor),
            self.receipt_poll,
        )))
    }
}
