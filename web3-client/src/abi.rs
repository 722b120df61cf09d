//! ABI utilities shared by every chain client
//!
//! These helpers provide:
//! - Parameter encoding/decoding against Solidity type strings
//! - Solidity-packed keccak hashing (`soliditySha3` semantics)
//! - A [`Contract`] handle binding an address to a JSON ABI

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier},
    json_abi::{Function, JsonAbi},
    primitives::{keccak256, Address},
};
use alloy_primitives::hex;
use serde_json::Value;

use crate::{
    error::{ClientError, ClientResult},
    models::{
        jsonrpc::{parse_hex_address, parse_hex_bytes},
        transaction::TransactionRequestConfig,
    },
};

/// Parse Solidity type strings such as `uint256` or `(address,bytes32[])`.
pub fn parse_types<S: AsRef<str>>(types: &[S]) -> ClientResult<Vec<DynSolType>> {
    types
        .iter()
        .map(|ty| {
            DynSolType::parse(ty.as_ref())
                .map_err(|e| ClientError::InvalidAbi(format!("{}: {e}", ty.as_ref())))
        })
        .collect()
}

/// Coerce a JSON value into a `DynSolValue` of type `ty`.
///
/// Strings and containers are built straight from the JSON structure; only
/// scalar leaves go through `DynSolType::coerce_str`.
pub fn coerce_value(ty: &DynSolType, value: &Value) -> ClientResult<DynSolValue> {
    let mismatch = || ClientError::InvalidInput(format!("Cannot coerce {value} to {ty}"));

    match (ty, value) {
        (DynSolType::String, Value::String(s)) => Ok(DynSolValue::String(s.clone())),
        (DynSolType::String, Value::Number(_) | Value::Bool(_)) => {
            Ok(DynSolValue::String(value.to_string()))
        }
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<ClientResult<Vec<_>>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(mismatch());
            }
            items
                .iter()
                .map(|item| coerce_value(inner, item))
                .collect::<ClientResult<Vec<_>>>()
                .map(DynSolValue::FixedArray)
        }
        // Tuples are given as JSON arrays
        (DynSolType::Tuple(types), Value::Array(items)) => {
            coerce_values(types, items).map(DynSolValue::Tuple)
        }
        (
            DynSolType::String
            | DynSolType::Array(_)
            | DynSolType::FixedArray(..)
            | DynSolType::Tuple(_),
            _,
        ) => Err(mismatch()),
        (_, Value::String(s)) => coerce_leaf(ty, s),
        (_, Value::Number(n)) => coerce_leaf(ty, &n.to_string()),
        (_, Value::Bool(b)) => coerce_leaf(ty, &b.to_string()),
        (_, Value::Null | Value::Array(_) | Value::Object(_)) => Err(mismatch()),
    }
}

fn coerce_leaf(ty: &DynSolType, literal: &str) -> ClientResult<DynSolValue> {
    ty.coerce_str(literal)
        .map_err(|e| ClientError::InvalidInput(format!("Cannot coerce {literal} to {ty}: {e}")))
}

fn coerce_values(types: &[DynSolType], params: &[Value]) -> ClientResult<Vec<DynSolValue>> {
    if types.len() != params.len() {
        return Err(ClientError::InvalidInput(format!(
            "Expected {} parameters, got {}",
            types.len(),
            params.len()
        )));
    }
    types.iter().zip(params).map(|(ty, value)| coerce_value(ty, value)).collect()
}

/// ABI-encode `params` against `types`, returning `0x` hex.
pub fn encode_parameters<S: AsRef<str>>(params: &[Value], types: &[S]) -> ClientResult<String> {
    let types = parse_types(types)?;
    let values = coerce_values(&types, params)?;
    let encoded = DynSolValue::Tuple(values).abi_encode_params();
    Ok(hex::encode_prefixed(encoded))
}

/// ABI-decode `0x` hex data against `types`.
pub fn decode_parameters<S: AsRef<str>>(data: &str, types: &[S]) -> ClientResult<Vec<DynSolValue>> {
    let types = parse_types(types)?;
    let bytes = parse_hex_bytes(data)?;
    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(&bytes)
        .map_err(|e| ClientError::InvalidAbi(format!("Failed to decode parameters: {e}")))?;

    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}

/// Infer the Solidity type of an untyped hash argument.
///
/// `0x` strings are bytes and decimal strings are numbers; any other string
/// is `string`. Non-negative numbers are `uint256`, negative ones `int256`.
fn infer_packed_value(value: &Value) -> ClientResult<DynSolValue> {
    let ty = match value {
        Value::String(s) if s.starts_with("0x") => DynSolType::Bytes,
        Value::String(s) if is_decimal(s) => {
            if s.starts_with('-') {
                DynSolType::Int(256)
            } else {
                DynSolType::Uint(256)
            }
        }
        Value::String(_) => DynSolType::String,
        Value::Number(n) if n.as_i64().is_some_and(|v| v < 0) => DynSolType::Int(256),
        Value::Number(_) => DynSolType::Uint(256),
        Value::Bool(_) => DynSolType::Bool,
        _ => {
            return Err(ClientError::InvalidInput(format!(
                "Cannot infer Solidity type of {value}"
            )))
        }
    };
    coerce_value(&ty, value)
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Keccak-256 of the Solidity-packed encoding of `values`, as `0x` hex.
///
/// Each value is either a bare JSON value whose type is inferred, or an
/// object `{"t": <type>, "v": <value>}` (`type`/`value` also accepted).
pub fn ethereum_sha3(values: &[Value]) -> ClientResult<String> {
    let mut packed = Vec::new();
    for value in values {
        let sol_value = match value {
            Value::Object(map) => {
                let ty = map
                    .get("t")
                    .or_else(|| map.get("type"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| ClientError::InvalidInput(format!("Missing type in {value}")))?;
                let inner = map
                    .get("v")
                    .or_else(|| map.get("value"))
                    .ok_or_else(|| ClientError::InvalidInput(format!("Missing value in {value}")))?;
                let ty = DynSolType::parse(ty)
                    .map_err(|e| ClientError::InvalidAbi(format!("{ty}: {e}")))?;
                coerce_value(&ty, inner)?
            }
            other => infer_packed_value(other)?,
        };
        packed.extend(sol_value.abi_encode_packed());
    }
    Ok(keccak256(packed).to_string())
}

/// Callable handle for a deployed contract
///
/// The handle only encodes and decodes; pass the configs it builds to a
/// chain client's `read` or `write`.
#[derive(Debug, Clone)]
pub struct Contract {
    address: Address,
    abi: JsonAbi,
}

impl Contract {
    /// Bind `address` to the JSON ABI in `abi`.
    pub fn new(address: &str, abi: &str) -> ClientResult<Self> {
        let address = parse_hex_address(address)?;
        let abi: JsonAbi =
            serde_json::from_str(abi).map_err(|e| ClientError::InvalidAbi(e.to_string()))?;
        Ok(Self { address, abi })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Find `name`, picking the overload whose input count matches `arity`.
    fn function(&self, name: &str, arity: Option<usize>) -> ClientResult<&Function> {
        let overloads = self
            .abi
            .function(name)
            .ok_or_else(|| ClientError::InvalidAbi(format!("Function {name} not found in ABI")))?;

        match arity {
            Some(n) => overloads.iter().find(|f| f.inputs.len() == n).ok_or_else(|| {
                ClientError::InvalidAbi(format!("No overload of {name} takes {n} arguments"))
            }),
            None => overloads
                .first()
                .ok_or_else(|| ClientError::InvalidAbi(format!("Function {name} not found in ABI"))),
        }
    }

    /// Encode a call to `name` (selector followed by the arguments).
    pub fn encode_call(&self, name: &str, args: &[Value]) -> ClientResult<Vec<u8>> {
        let function = self.function(name, Some(args.len()))?;
        let types = function
            .inputs
            .iter()
            .map(|param| {
                param
                    .resolve()
                    .map_err(|e| ClientError::InvalidAbi(format!("{}: {e}", param.ty)))
            })
            .collect::<ClientResult<Vec<_>>>()?;
        let values = coerce_values(&types, args)?;

        function
            .abi_encode_input(&values)
            .map_err(|e| ClientError::InvalidInput(format!("Failed to encode {name}: {e}")))
    }

    /// Decode the return data of a call to `name`.
    pub fn decode_output(&self, name: &str, data: &str) -> ClientResult<Vec<DynSolValue>> {
        let function = self.function(name, None)?;
        let bytes = parse_hex_bytes(data)?;
        function
            .abi_decode_output(&bytes, true)
            .map_err(|e| ClientError::InvalidAbi(format!("Failed to decode {name} output: {e}")))
    }

    /// Transaction config calling `name` on this contract.
    pub fn method(&self, name: &str, args: &[Value]) -> ClientResult<TransactionRequestConfig> {
        let data = self.encode_call(name, args)?;
        Ok(TransactionRequestConfig {
            to: Some(self.address.to_string()),
            data: Some(hex::encode_prefixed(data)),
            ..Default::default()
        })
    }
}
