use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use telemetry_core::contract::Reading;
use tracing::debug;

use crate::adapters::reading_store::{ReadingQuery, ReadingStore, SortOrder};

type Item = HashMap<String, AttributeValue>;

const DEVICE_ID_ATTRIBUTE: &str = "deviceId";
const TIMESTAMP_ATTRIBUTE: &str = "timestamp";
const TEMP_ATTRIBUTE: &str = "temp";
const HUMIDITY_ATTRIBUTE: &str = "humidity";

pub struct DynamoReadingStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoReadingStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    async fn fetch_items(&self, query: &ReadingQuery) -> Result<Vec<Item>, String> {
        let page_limit = query
            .limit
            .map(|limit| {
                i32::try_from(limit).map_err(|_| format!("query limit {limit} exceeds i32"))
            })
            .transpose()?;

        let mut items = Vec::new();
        let mut exclusive_start_key: Option<Item> = None;
        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression(key_condition_expression(query))
                .expression_attribute_names("#device", DEVICE_ID_ATTRIBUTE)
                .expression_attribute_values(
                    ":device",
                    AttributeValue::S(query.device_id.clone()),
                )
                .scan_index_forward(query.order == SortOrder::Ascending)
                .set_limit(page_limit)
                .set_exclusive_start_key(exclusive_start_key.take());

            if let Some(window) = &query.window {
                request = request
                    .expression_attribute_names("#ts", TIMESTAMP_ATTRIBUTE)
                    .expression_attribute_values(
                        ":start",
                        AttributeValue::S(window.start().to_string()),
                    )
                    .expression_attribute_values(
                        ":end",
                        AttributeValue::S(window.end().to_string()),
                    );
            }

            let output = request
                .send()
                .await
                .map_err(|error| format!("failed to query readings table: {error}"))?;

            items.extend(output.items.unwrap_or_default());
            let limit_reached = query.limit.is_some_and(|limit| items.len() >= limit);
            match output.last_evaluated_key {
                Some(key) if !limit_reached => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        if let Some(limit) = query.limit {
            items.truncate(limit);
        }
        Ok(items)
    }
}

impl ReadingStore for DynamoReadingStore {
    fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<Reading>, String> {
        let items = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.fetch_items(query))
        })?;

        debug!(
            table = %self.table_name,
            device_id = %query.device_id,
            items = items.len(),
            "queried readings table"
        );
        items.iter().map(decode_reading).collect()
    }
}

pub fn key_condition_expression(query: &ReadingQuery) -> &'static str {
    if query.window.is_some() {
        "#device = :device AND #ts BETWEEN :start AND :end"
    } else {
        "#device = :device"
    }
}

/// Decodes a stored item, widening the store's decimal numbers to `f64`.
pub fn decode_reading(item: &Item) -> Result<Reading, String> {
    let device_id = match item.get(DEVICE_ID_ATTRIBUTE) {
        Some(AttributeValue::S(text)) => text.clone(),
        Some(_) => {
            return Err(format!(
                "reading attribute '{DEVICE_ID_ATTRIBUTE}' must be a string"
            ))
        }
        None => return Err(format!("reading is missing '{DEVICE_ID_ATTRIBUTE}'")),
    };

    Ok(Reading {
        device_id,
        timestamp_ms: numeric_attribute(item, TIMESTAMP_ATTRIBUTE)?,
        temp: finite_attribute(item, TEMP_ATTRIBUTE)?,
        humidity: finite_attribute(item, HUMIDITY_ATTRIBUTE)?,
    })
}

fn numeric_attribute<T: std::str::FromStr>(item: &Item, name: &str) -> Result<T, String> {
    let text = match item.get(name) {
        Some(AttributeValue::N(text)) | Some(AttributeValue::S(text)) => text,
        Some(_) => return Err(format!("reading attribute '{name}' must be numeric")),
        None => return Err(format!("reading is missing '{name}'")),
    };

    text.trim()
        .parse::<T>()
        .map_err(|_| format!("reading attribute '{name}' has non-numeric value '{text}'"))
}

// `f64::from_str` accepts "NaN" and "inf", which would poison the statistics.
fn finite_attribute(item: &Item, name: &str) -> Result<f64, String> {
    let value: f64 = numeric_attribute(item, name)?;
    if !value.is_finite() {
        return Err(format!("reading attribute '{name}' has non-finite value {value}"));
    }
    Ok(value)
}
