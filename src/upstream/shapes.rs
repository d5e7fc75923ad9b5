//! Typed parse targets for each upstream payload shape.
//!
//! Every normalizer first checks that the body is a JSON object, then
//! deserializes into a small serde target. A missing or `null` collection is
//! a valid "no data" answer and yields an empty result set; anything else
//! that does not fit is a `MalformedResponse`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::upstream::endpoints::Endpoint;
use crate::upstream::error::{UpstreamError, UpstreamResult};
use crate::upstream::record::{align_columns, Record, ResultSet};

/// Field added to every option-chain record.
pub const INSTRUMENT_TYPE: &str = "instrumentType";

/// Option legs, in the order they are looked for.
const OPTION_LEGS: [&str; 2] = ["CE", "PE"];

/// `{"data": [...]}`
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: Option<Vec<T>>,
}

/// One element of the pre-open payload; only `metadata` is kept.
#[derive(Debug, Deserialize)]
struct PreOpenEntry {
    metadata: Record,
}

/// `{"records": {"data": [...]}}`
#[derive(Debug, Deserialize)]
struct OptionChainPayload {
    #[serde(default)]
    records: Option<DataEnvelope<Record>>,
}

fn parse<T: DeserializeOwned>(endpoint: Endpoint, body: Value) -> UpstreamResult<T> {
    if !body.is_object() {
        return Err(UpstreamError::malformed(
            endpoint.as_str(),
            format!("expected a JSON object, got {}", type_name(&body)),
        ));
    }
    serde_json::from_value(body)
        .map_err(|e| UpstreamError::malformed(endpoint.as_str(), e.to_string()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Pre-market: one record per element, equal to its `metadata` object.
pub fn pre_market_records(body: Value) -> UpstreamResult<ResultSet> {
    let envelope: DataEnvelope<PreOpenEntry> = parse(Endpoint::PreMarket, body)?;
    let rows = envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|entry| entry.metadata)
        .collect();
    Ok(align_columns(rows))
}

/// Live market: one record per element with the nested `meta` removed.
pub fn live_market_records(body: Value) -> UpstreamResult<ResultSet> {
    table_records(Endpoint::LiveMarket, body, &["meta"])
}

/// Equity history: `{"data": [...]}` rows kept as they are.
pub fn history_records(body: Value) -> UpstreamResult<ResultSet> {
    table_records(Endpoint::EquityHistory, body, &[])
}

fn table_records(endpoint: Endpoint, body: Value, drop: &[&str]) -> UpstreamResult<ResultSet> {
    let envelope: DataEnvelope<Record> = parse(endpoint, body)?;
    let rows = envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|mut row| {
            for field in drop {
                row.shift_remove(*field);
            }
            row
        })
        .collect();
    Ok(align_columns(rows))
}

/// Holiday: the list under whichever top-level key comes first.
pub fn holiday_records(body: Value) -> UpstreamResult<ResultSet> {
    let endpoint = Endpoint::Holiday;
    let map: Record = parse(endpoint, body)?;
    let first = match map.into_iter().next() {
        Some((_, value)) => value,
        None => return Ok(Vec::new()),
    };
    if first.is_null() {
        return Ok(Vec::new());
    }
    let rows: Vec<Record> = serde_json::from_value(first)
        .map_err(|e| UpstreamError::malformed(endpoint.as_str(), e.to_string()))?;
    Ok(align_columns(rows))
}

/// Option chain: one record per `CE`/`PE` leg present, tagged with
/// `instrumentType`. Legs keep the order they have in the payload.
pub fn option_chain_records(body: Value) -> UpstreamResult<ResultSet> {
    let endpoint = Endpoint::OptionChain;
    let payload: OptionChainPayload = parse(endpoint, body)?;
    let strikes = payload
        .records
        .and_then(|records| records.data)
        .unwrap_or_default();

    let mut rows = Vec::new();
    for strike in strikes {
        for (key, leg) in strike {
            if !OPTION_LEGS.contains(&key.as_str()) {
                continue;
            }
            let mut leg = match leg {
                Value::Object(leg) => leg,
                Value::Null => continue,
                other => {
                    return Err(UpstreamError::malformed(
                        endpoint.as_str(),
                        format!("{} leg is {}, expected an object", key, type_name(&other)),
                    ))
                }
            };
            leg.insert(INSTRUMENT_TYPE.to_string(), Value::String(key));
            rows.push(leg);
        }
    }
    Ok(align_columns(rows))
}

/// The `symbol` of each record, in order.
pub fn symbols(endpoint: Endpoint, records: &ResultSet) -> UpstreamResult<Vec<String>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| match record.get("symbol") {
            Some(Value::String(symbol)) => Ok(symbol.clone()),
            _ => Err(UpstreamError::malformed(
                endpoint.as_str(),
                format!("row {} has no string 'symbol' field", i),
            )),
        })
        .collect()
}
