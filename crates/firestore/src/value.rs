//! Firestore tagged-value wire format.
//!
//! The REST interface encodes every field as a single-key object naming one
//! of eleven value tags. This module models that encoding as a closed sum
//! type and converts it to and from plain `serde_json` data.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use std::collections::HashMap;
use thiserror::Error;

/// ワイヤ値の展開エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid integer value: {0}")]
    InvalidInteger(String),

    #[error("non-finite double value")]
    NonFiniteDouble,
}

/// 地理座標 (`geoPointValue` のペイロード)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// `arrayValue` のペイロード。空配列では `values` キー自体が省略される
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayPayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<WireValue>,
}

/// `mapValue` のペイロード。空マップでは `fields` キー自体が省略される
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPayload {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, WireValue>,
}

/// Firestore のタグ付き値。ワイヤ表現と 1:1 で対応する閉じた直和型
///
/// serde の外部タグ表現がそのまま REST の JSON (`{"stringValue": "…"}` など)
/// に一致する。int64 はワイヤ上では文字列で運ばれる点に注意。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireValue {
    #[serde(rename = "nullValue")]
    Null(()),

    #[serde(rename = "booleanValue")]
    Boolean(bool),

    #[serde(rename = "integerValue")]
    Integer(String),

    #[serde(rename = "doubleValue")]
    Double(f64),

    #[serde(rename = "timestampValue")]
    Timestamp(String),

    #[serde(rename = "stringValue")]
    Text(String),

    #[serde(rename = "bytesValue")]
    Bytes(String),

    #[serde(rename = "referenceValue")]
    Reference(String),

    #[serde(rename = "geoPointValue")]
    GeoPoint(LatLng),

    #[serde(rename = "arrayValue")]
    Array(ArrayPayload),

    #[serde(rename = "mapValue")]
    Map(MapPayload),
}

/// タグ付き値をプレーンな JSON 値へ再帰的に展開する
pub fn decode_value(value: &WireValue) -> Result<Value, DecodeError> {
    let decoded = match value {
        WireValue::Null(()) => Value::Null,
        WireValue::Boolean(flag) => Value::Bool(*flag),
        WireValue::Integer(raw) => {
            let parsed: i64 = raw
                .parse()
                .map_err(|_| DecodeError::InvalidInteger(raw.clone()))?;
            Value::Number(parsed.into())
        }
        WireValue::Double(float) => Number::from_f64(*float)
            .map(Value::Number)
            .ok_or(DecodeError::NonFiniteDouble)?,
        WireValue::Timestamp(text)
        | WireValue::Text(text)
        | WireValue::Bytes(text)
        | WireValue::Reference(text) => Value::String(text.clone()),
        WireValue::GeoPoint(point) => json!({
            "latitude": point.latitude,
            "longitude": point.longitude,
        }),
        WireValue::Array(array) => {
            let mut items = Vec::with_capacity(array.values.len());
            for item in &array.values {
                items.push(decode_value(item)?);
            }
            Value::Array(items)
        }
        WireValue::Map(map) => Value::Object(decode_fields(&map.fields)?),
    };

    Ok(decoded)
}

/// ドキュメントの `fields` マップ全体を展開する
pub fn decode_fields(fields: &HashMap<String, WireValue>) -> Result<Map<String, Value>, DecodeError> {
    let mut plain = Map::new();
    for (key, value) in fields {
        plain.insert(key.clone(), decode_value(value)?);
    }
    Ok(plain)
}

/// プレーンな JSON 値をタグ付き値へ畳み込む (書き込みパス用)
///
/// i64 で表現できる数値は `integerValue`、それ以外は `doubleValue` になる。
pub fn encode_value(value: &Value) -> WireValue {
    match value {
        Value::Null => WireValue::Null(()),
        Value::Bool(flag) => WireValue::Boolean(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => WireValue::Integer(integer.to_string()),
            None => WireValue::Double(number.as_f64().unwrap_or(0.0)),
        },
        Value::String(text) => WireValue::Text(text.clone()),
        Value::Array(items) => WireValue::Array(ArrayPayload {
            values: items.iter().map(encode_value).collect(),
        }),
        Value::Object(map) => WireValue::Map(MapPayload {
            fields: encode_fields(map),
        }),
    }
}

/// プレーンなオブジェクトを `fields` マップへ畳み込む
pub fn encode_fields(map: &Map<String, Value>) -> HashMap<String, WireValue> {
    map.iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}
