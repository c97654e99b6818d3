//! Transaction hash type.

/// A 32-byte transaction hash as reported by the wallet provider.
pub type TxHash = alloy_primitives::B256;
