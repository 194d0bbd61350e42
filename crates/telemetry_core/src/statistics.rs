use crate::contract::{FieldStatistics, Reading, StatisticsResponse};

/// Aggregates one numeric series. `current` is the last value in the order
/// given, which for an ascending store query is the most recent reading.
pub fn summarize_field(values: &[f64]) -> Option<FieldStatistics> {
    let (&current, _) = values.split_last()?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &value in values {
        min = min.min(value);
        max = max.max(value);
        sum += value;
    }

    Some(FieldStatistics {
        min,
        max,
        avg: sum / values.len() as f64,
        current,
    })
}

/// Builds the statistics response, or `None` when the window held no readings.
pub fn summarize_readings(
    device_id: &str,
    period_hours: i64,
    readings: &[Reading],
) -> Option<StatisticsResponse> {
    let temperatures: Vec<f64> = readings.iter().map(|reading| reading.temp).collect();
    let humidities: Vec<f64> = readings.iter().map(|reading| reading.humidity).collect();

    Some(StatisticsResponse {
        device_id: device_id.to_string(),
        period_hours,
        temperature: summarize_field(&temperatures)?,
        humidity: summarize_field(&humidities)?,
        data_points: readings.len(),
    })
}
