//! Boundary between decoded contract responses and the typed [`Proposal`].
//!
//! Contracts report a proposal either as named outputs or as a bare positional
//! tuple. [`normalize_proposal`] is the only place that knows both shapes.

use agora_types::{Proposal, ProposalId, U256};
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::{Function, Param};

/// One decoded output value with its declared name, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct RawField {
    pub name: Option<String>,
    pub value: DynSolValue,
}

/// A decoded contract response: ordered fields, optionally named.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<RawField>,
}

impl RawRecord {
    pub fn named<'a>(pairs: impl IntoIterator<Item = (&'a str, DynSolValue)>) -> Self {
        Self {
            fields: pairs
                .into_iter()
                .map(|(name, value)| RawField {
                    name: Some(name.to_string()),
                    value,
                })
                .collect(),
        }
    }

    pub fn positional(values: impl IntoIterator<Item = DynSolValue>) -> Self {
        Self {
            fields: values
                .into_iter()
                .map(|value| RawField { name: None, value })
                .collect(),
        }
    }

    /// Pair decoded outputs with the names the descriptor declares for them.
    ///
    /// A function returning a single struct is flattened into the struct's
    /// components.
    pub fn from_outputs(function: &Function, values: Vec<DynSolValue>) -> Self {
        if let ([param], [DynSolValue::Tuple(inner)]) =
            (function.outputs.as_slice(), values.as_slice())
        {
            if !param.components.is_empty() {
                return Self::zip(&param.components, inner.clone());
            }
        }
        Self::zip(&function.outputs, values)
    }

    fn zip(params: &[Param], values: Vec<DynSolValue>) -> Self {
        let fields = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| RawField {
                name: params
                    .get(i)
                    .map(|p| p.name.clone())
                    .filter(|name| !name.is_empty()),
                value,
            })
            .collect();
        Self { fields }
    }

    /// Value of the first field carrying this name.
    pub fn get(&self, name: &str) -> Option<&DynSolValue> {
        self.fields
            .iter()
            .find(|f| f.name.as_deref() == Some(name))
            .map(|f| &f.value)
    }

    /// Value at this position, named or not.
    pub fn at(&self, index: usize) -> Option<&DynSolValue> {
        self.fields.get(index).map(|f| &f.value)
    }

    pub fn fields(&self) -> &[RawField] {
        &self.fields
    }

    /// Look a field up by name, falling back to its position.
    fn lookup<T>(
        &self,
        name: &str,
        index: usize,
        pick: impl Fn(&DynSolValue) -> Option<T>,
    ) -> Option<T> {
        self.get(name)
            .and_then(&pick)
            .or_else(|| self.at(index).and_then(&pick))
    }
}

fn as_string(value: &DynSolValue) -> Option<String> {
    match value {
        DynSolValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

pub(crate) fn as_uint(value: &DynSolValue) -> Option<U256> {
    match value {
        DynSolValue::Uint(n, _) => Some(*n),
        _ => None,
    }
}

pub(crate) fn as_bool(value: &DynSolValue) -> Option<bool> {
    match value {
        DynSolValue::Bool(b) => Some(*b),
        _ => None,
    }
}

fn as_account(value: &DynSolValue) -> Option<String> {
    match value {
        DynSolValue::Address(a) => Some(a.to_string()),
        DynSolValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Normalize a `proposals(id)` response.
///
/// Positions: 0 description, 1 yes votes, 2 no votes, 3 active, 4 proposer.
/// Absent fields default to an empty description/proposer, zero tallies and
/// an active proposal.
pub fn normalize_proposal(id: ProposalId, record: &RawRecord) -> Proposal {
    Proposal {
        id,
        description: record
            .lookup("description", 0, as_string)
            .unwrap_or_default(),
        yes_votes: record.lookup("yesVotes", 1, as_uint).unwrap_or(U256::ZERO),
        no_votes: record.lookup("noVotes", 2, as_uint).unwrap_or(U256::ZERO),
        active: record.lookup("active", 3, as_bool).unwrap_or(true),
        proposer: record.lookup("proposer", 4, as_account).unwrap_or_default(),
    }
}
