use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use telemetry_core::contract::{
    HistoryPoint, HistoryResponse, LatestReadingResponse, Reading, StatisticsResponse,
    ValidationError, NOT_FOUND_MESSAGE, NO_DATA_MESSAGE,
};
use telemetry_core::statistics::summarize_readings;
use telemetry_core::timestamp::iso_utc_from_millis;
use telemetry_core::window::{parse_hours, TimeWindow};
use thiserror::Error;
use tracing::{error, info};

use crate::adapters::reading_store::{ReadingQuery, ReadingStore, SortOrder};
use crate::config::HandlerConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// The subset of an API Gateway proxy event the router reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiGatewayRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(rename = "httpMethod", default)]
    pub http_method: Option<String>,
    #[serde(rename = "queryStringParameters", default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,
}

/// Per-invocation inputs that are not part of the request itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub stage_prefix: String,
    pub default_device_id: String,
    pub default_window_hours: i64,
    pub now_ms: i64,
}

impl QueryContext {
    pub fn from_config(config: &HandlerConfig, now_ms: i64) -> Self {
        Self {
            stage_prefix: config.stage_prefix.clone(),
            default_device_id: config.default_device_id.clone(),
            default_window_hours: config.default_window_hours,
            now_ms,
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("No data found")]
    NoData,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Store(String),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Latest,
    History,
    /// Served on `/status`; callers depend on that literal path.
    Statistics,
}

pub fn resolve_route(path: &str, method: &str) -> Option<Route> {
    match (path, method) {
        ("/latest", "GET") => Some(Route::Latest),
        ("/history", "GET") => Some(Route::History),
        ("/status", "GET") => Some(Route::Statistics),
        _ => None,
    }
}

pub fn strip_stage_prefix<'a>(path: &'a str, stage_prefix: &str) -> &'a str {
    if stage_prefix.is_empty() {
        return path;
    }
    path.strip_prefix(stage_prefix).unwrap_or(path)
}

/// Entry point for the API Lambda. Every outcome, including faults, is
/// returned as an HTTP-shaped response carrying the CORS header set.
pub fn handle_query_event(
    event: Value,
    context: &QueryContext,
    store: &dyn ReadingStore,
) -> ApiGatewayResponse {
    match dispatch(event, context, store) {
        Ok(response) => response,
        Err(QueryError::NoData) => error_response(404, NO_DATA_MESSAGE),
        Err(error) => {
            error!(error = %error, "query dispatch failed");
            error_response(500, &error.to_string())
        }
    }
}

fn dispatch(
    event: Value,
    context: &QueryContext,
    store: &dyn ReadingStore,
) -> Result<ApiGatewayResponse, QueryError> {
    let request: ApiGatewayRequest = serde_json::from_value(event)
        .map_err(|error| QueryError::MalformedRequest(error.to_string()))?;

    let raw_path = request.path.as_deref().unwrap_or("/");
    let path = strip_stage_prefix(raw_path, &context.stage_prefix);
    let method = request.http_method.as_deref().unwrap_or("GET");
    let params = request.query_string_parameters.unwrap_or_default();
    info!(path, method, params = ?params, "routing api request");

    match resolve_route(path, method) {
        Some(Route::Latest) => success_response(&latest_reading(&params, context, store)?),
        Some(Route::History) => success_response(&historical_data(&params, context, store)?),
        Some(Route::Statistics) => success_response(&statistics(&params, context, store)?),
        None => Ok(error_response(404, NOT_FOUND_MESSAGE)),
    }
}

pub fn latest_reading(
    params: &BTreeMap<String, String>,
    context: &QueryContext,
    store: &dyn ReadingStore,
) -> Result<LatestReadingResponse, QueryError> {
    let device_id = device_id_param(params, context);
    let readings = store
        .query_readings(&ReadingQuery {
            device_id: device_id.clone(),
            window: None,
            order: SortOrder::Descending,
            limit: Some(1),
        })
        .map_err(QueryError::Store)?;

    let reading = readings.into_iter().next().ok_or(QueryError::NoData)?;
    Ok(LatestReadingResponse {
        device_id,
        temperature: reading.temp,
        humidity: reading.humidity,
        timestamp: iso_utc_from_millis(reading.timestamp_ms)?,
        timestamp_ms: reading.timestamp_ms,
    })
}

pub fn historical_data(
    params: &BTreeMap<String, String>,
    context: &QueryContext,
    store: &dyn ReadingStore,
) -> Result<HistoryResponse, QueryError> {
    let device_id = device_id_param(params, context);
    let window = window_param(params, context)?.1;
    let readings = query_window(store, &device_id, &window)?;

    let data: Vec<HistoryPoint> = readings.iter().map(HistoryPoint::from).collect();
    Ok(HistoryResponse {
        device_id,
        count: data.len(),
        data,
        start_ms: window.start_ms,
        end_ms: window.end_ms,
    })
}

pub fn statistics(
    params: &BTreeMap<String, String>,
    context: &QueryContext,
    store: &dyn ReadingStore,
) -> Result<StatisticsResponse, QueryError> {
    let device_id = device_id_param(params, context);
    let (hours, window) = window_param(params, context)?;
    let readings = query_window(store, &device_id, &window)?;

    summarize_readings(&device_id, hours, &readings).ok_or(QueryError::NoData)
}

fn device_id_param(params: &BTreeMap<String, String>, context: &QueryContext) -> String {
    params
        .get("deviceId")
        .cloned()
        .unwrap_or_else(|| context.default_device_id.clone())
}

fn window_param(
    params: &BTreeMap<String, String>,
    context: &QueryContext,
) -> Result<(i64, TimeWindow), QueryError> {
    let hours = parse_hours(
        params.get("hours").map(String::as_str),
        context.default_window_hours,
    )?;
    Ok((hours, TimeWindow::trailing_hours(context.now_ms, hours)?))
}

fn query_window(
    store: &dyn ReadingStore,
    device_id: &str,
    window: &TimeWindow,
) -> Result<Vec<Reading>, QueryError> {
    if window.is_empty() {
        return Ok(Vec::new());
    }

    let readings = store
        .query_readings(&ReadingQuery {
            device_id: device_id.to_string(),
            window: Some(window.sort_key_range()?),
            order: SortOrder::Ascending,
            limit: None,
        })
        .map_err(QueryError::Store)?;
    info!(device_id, count = readings.len(), "window query returned readings");
    Ok(readings)
}

pub fn cors_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Headers": "Content-Type,X-Amz-Date,Authorization,X-Api-Key",
        "Access-Control-Allow-Methods": "GET,OPTIONS",
    })
}

fn success_response(payload: &impl Serialize) -> Result<ApiGatewayResponse, QueryError> {
    Ok(ApiGatewayResponse {
        status_code: 200,
        headers: cors_headers(),
        body: serde_json::to_string(payload)?,
    })
}

fn error_response(status_code: u16, message: &str) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: cors_headers(),
        body: json!({ "error": message }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use telemetry_core::timestamp::millis_from_iso_utc;

    use super::*;

    const NOW_MS: i64 = 1_700_000_000_000;
    const HOUR_MS: i64 = 3_600_000;

    /// Range-aware fake that mimics a key-condition query over string sort keys.
    struct InMemoryReadingStore {
        readings: Vec<Reading>,
        queries: Mutex<Vec<ReadingQuery>>,
        fail_with: Option<String>,
    }

    impl InMemoryReadingStore {
        fn new(readings: Vec<Reading>) -> Self {
            Self {
                readings,
                queries: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::new(Vec::new())
            }
        }

        fn queries(&self) -> Vec<ReadingQuery> {
            self.queries.lock().expect("poisoned mutex").clone()
        }
    }

    impl ReadingStore for InMemoryReadingStore {
        fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<Reading>, String> {
            self.queries
                .lock()
                .expect("poisoned mutex")
                .push(query.clone());
            if let Some(message) = &self.fail_with {
                return Err(message.clone());
            }

            let mut matched: Vec<Reading> = self
                .readings
                .iter()
                .filter(|reading| reading.device_id == query.device_id)
                .filter(|reading| match &query.window {
                    Some(range) => {
                        let key = reading.timestamp_ms.to_string();
                        range.start() <= key.as_str() && key.as_str() <= range.end()
                    }
                    None => true,
                })
                .cloned()
                .collect();
            matched.sort_by_key(|reading| reading.timestamp_ms);
            if query.order == SortOrder::Descending {
                matched.reverse();
            }
            if let Some(limit) = query.limit {
                matched.truncate(limit);
            }
            Ok(matched)
        }
    }

    fn reading(device_id: &str, timestamp_ms: i64, temp: f64, humidity: f64) -> Reading {
        Reading {
            device_id: device_id.to_string(),
            timestamp_ms,
            temp,
            humidity,
        }
    }

    fn context() -> QueryContext {
        QueryContext {
            stage_prefix: "/E_stage_API".to_string(),
            default_device_id: "1".to_string(),
            default_window_hours: 24,
            now_ms: NOW_MS,
        }
    }

    fn request(path: &str, params: Value) -> Value {
        json!({
            "path": path,
            "httpMethod": "GET",
            "queryStringParameters": params,
        })
    }

    fn body(response: &ApiGatewayResponse) -> Value {
        serde_json::from_str(&response.body).expect("body should be JSON")
    }

    fn sample_store() -> InMemoryReadingStore {
        InMemoryReadingStore::new(vec![
            reading("1", NOW_MS - 30 * HOUR_MS, 19.0, 35.0),
            reading("1", NOW_MS - 3 * HOUR_MS, 24.0, 40.0),
            reading("1", NOW_MS - 2 * HOUR_MS, 32.5, 60.0),
            reading("1", NOW_MS - HOUR_MS, 27.5, 50.0),
            reading("2", NOW_MS - HOUR_MS, 10.0, 90.0),
        ])
    }

    #[test]
    fn strips_stage_prefix_before_routing() {
        assert_eq!(strip_stage_prefix("/E_stage_API/latest", "/E_stage_API"), "/latest");
        assert_eq!(strip_stage_prefix("/latest", "/E_stage_API"), "/latest");
        assert_eq!(strip_stage_prefix("/latest", ""), "/latest");
    }

    #[test]
    fn only_get_routes_resolve() {
        assert_eq!(resolve_route("/latest", "GET"), Some(Route::Latest));
        assert_eq!(resolve_route("/history", "GET"), Some(Route::History));
        assert_eq!(resolve_route("/status", "GET"), Some(Route::Statistics));
        assert_eq!(resolve_route("/stats", "GET"), None);
        assert_eq!(resolve_route("/latest", "POST"), None);
    }

    #[test]
    fn unknown_route_returns_not_found_with_cors() {
        let store = sample_store();
        for event in [
            request("/bogus", Value::Null),
            json!({"path": "/latest", "httpMethod": "DELETE"}),
        ] {
            let response = handle_query_event(event, &context(), &store);
            assert_eq!(response.status_code, 404);
            assert_eq!(body(&response), json!({"error": "Not found"}));
            assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        }
        assert!(store.queries().is_empty());
    }

    #[test]
    fn latest_returns_most_recent_reading_with_iso_timestamp() {
        let store = sample_store();
        let response = handle_query_event(
            request("/E_stage_API/latest", Value::Null),
            &context(),
            &store,
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers["Content-Type"], "application/json");
        let payload = body(&response);
        assert_eq!(payload["deviceId"], "1");
        assert_eq!(payload["temperature"], 27.5);
        assert_eq!(payload["humidity"], 50.0);
        assert_eq!(payload["timestamp_ms"], NOW_MS - HOUR_MS);

        let iso = payload["timestamp"].as_str().expect("timestamp should be a string");
        assert!(iso.ends_with('Z'));
        assert_eq!(
            millis_from_iso_utc(iso).expect("iso should parse"),
            NOW_MS - HOUR_MS
        );

        let queries = store.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].order, SortOrder::Descending);
        assert_eq!(queries[0].limit, Some(1));
        assert!(queries[0].window.is_none());
    }

    #[test]
    fn latest_without_readings_is_not_found() {
        let store = sample_store();
        let response = handle_query_event(
            request("/latest", json!({"deviceId": "missing"})),
            &context(),
            &store,
        );

        assert_eq!(response.status_code, 404);
        assert_eq!(body(&response), json!({"error": "No data found"}));
    }

    #[test]
    fn history_returns_window_in_ascending_order() {
        let store = sample_store();
        let response = handle_query_event(
            request("/history", json!({"deviceId": "1", "hours": "24"})),
            &context(),
            &store,
        );

        assert_eq!(response.status_code, 200);
        let payload = body(&response);
        let start_ms = payload["start_ms"].as_i64().expect("start_ms should be set");
        let end_ms = payload["end_ms"].as_i64().expect("end_ms should be set");
        assert_eq!(end_ms, NOW_MS);
        assert_eq!(start_ms, NOW_MS - 24 * HOUR_MS);

        let data = payload["data"].as_array().expect("data should be an array");
        assert_eq!(payload["count"], data.len());
        assert_eq!(data.len(), 3);
        let timestamps: Vec<i64> = data
            .iter()
            .map(|point| point["timestamp"].as_i64().expect("timestamp should be an integer"))
            .collect();
        assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(timestamps.iter().all(|ts| (start_ms..=end_ms).contains(ts)));
        assert_eq!(data[0]["temperature"], 24.0);
        assert_eq!(data[0]["humidity"], 40.0);
    }

    #[test]
    fn history_without_readings_is_an_empty_success() {
        let store = sample_store();
        let response = handle_query_event(
            request("/history", json!({"deviceId": "nobody"})),
            &context(),
            &store,
        );

        assert_eq!(response.status_code, 200);
        let payload = body(&response);
        assert_eq!(payload["count"], 0);
        assert_eq!(payload["data"], json!([]));
    }

    #[test]
    fn negative_hours_skip_the_store() {
        let store = sample_store();
        let response = handle_query_event(
            request("/history", json!({"hours": "-2"})),
            &context(),
            &store,
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(body(&response)["count"], 0);
        assert!(store.queries().is_empty());
    }

    #[test]
    fn status_route_serves_window_statistics() {
        let store = sample_store();
        let response = handle_query_event(
            request("/E_stage_API/status", json!({"hours": "24"})),
            &context(),
            &store,
        );

        assert_eq!(response.status_code, 200);
        let payload = body(&response);
        assert_eq!(payload["deviceId"], "1");
        assert_eq!(payload["period_hours"], 24);
        assert_eq!(payload["dataPoints"], 3);
        assert_eq!(payload["temperature"]["min"], 24.0);
        assert_eq!(payload["temperature"]["max"], 32.5);
        assert_eq!(payload["temperature"]["current"], 27.5);
        assert_eq!(payload["humidity"]["min"], 40.0);
        assert_eq!(payload["humidity"]["max"], 60.0);
        assert_eq!(payload["humidity"]["avg"], 50.0);
        assert_eq!(payload["humidity"]["current"], 50.0);

        let avg = payload["temperature"]["avg"].as_f64().expect("avg should be a float");
        assert!((avg - 28.0).abs() < 1e-9);
    }

    #[test]
    fn statistics_without_readings_is_not_found() {
        let store = sample_store();
        let response = handle_query_event(
            request("/status", json!({"hours": "12", "deviceId": "3"})),
            &context(),
            &store,
        );

        assert_eq!(response.status_code, 404);
        assert_eq!(body(&response), json!({"error": "No data found"}));
    }

    #[test]
    fn malformed_hours_is_a_server_fault_with_message() {
        let store = sample_store();
        let response = handle_query_event(
            request("/history", json!({"hours": "abc"})),
            &context(),
            &store,
        );

        assert_eq!(response.status_code, 500);
        let message = body(&response)["error"]
            .as_str()
            .expect("error should be a string")
            .to_string();
        assert!(message.contains("'abc'"));
        assert_eq!(response.headers["Access-Control-Allow-Methods"], "GET,OPTIONS");
    }

    #[test]
    fn store_failure_is_reported_verbatim() {
        let store = InMemoryReadingStore::failing("ProvisionedThroughputExceededException");
        let response = handle_query_event(request("/latest", Value::Null), &context(), &store);

        assert_eq!(response.status_code, 500);
        assert_eq!(
            body(&response),
            json!({"error": "ProvisionedThroughputExceededException"})
        );
    }

    #[test]
    fn missing_path_and_method_default_to_root_get() {
        let store = sample_store();
        let response = handle_query_event(json!({}), &context(), &store);
        assert_eq!(response.status_code, 404);
        assert_eq!(body(&response), json!({"error": "Not found"}));
    }

    #[test]
    fn non_object_event_is_a_server_fault() {
        let store = sample_store();
        let response = handle_query_event(json!("not an event"), &context(), &store);
        assert_eq!(response.status_code, 500);
        assert!(body(&response)["error"]
            .as_str()
            .expect("error should be a string")
            .starts_with("malformed request"));
    }
}
