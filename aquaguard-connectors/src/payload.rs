//! Pool monitoring API payloads
//!
//! Each sensor type posts to its own endpoint with a single value field:
//!
//! | Sensor           | Endpoint                          | Field                 | Decimals |
//! |------------------|-----------------------------------|-----------------------|----------|
//! | pH               | `/api/ph-readings`                | `ph_value`            | 2        |
//! | Ammonia          | `/api/ammonia-readings`           | `ammonia_ppm`         | 3        |
//! | Nitrite          | `/api/nitrite-readings`           | `nitrite_ppm`         | 3        |
//! | Nitrate          | `/api/nitrate-readings`           | `nitrate_ppm`         | 2        |
//! | Dissolved oxygen | `/api/dissolved-oxygen-readings`  | `do_ppm`              | 2        |
//! | ORP              | `/api/orp-readings`               | `orp_mv`              | 1        |
//! | Conductivity     | `/api/salinity-readings`          | `conductivity_us_cm`  | 1        |
//! | Salinity         | `/api/salinity-readings`          | `salinity_ppt`        | 2        |
//! | Turbidity        | `/api/turbidity-readings`         | `turbidity_ntu`       | 2        |
//! | Temperature      | `/api/temperature-readings`       | `temperature_celsius` | 1        |
//! | Organic load     | `/api/toc-readings`               | `toc_ppm`             | 2        |
//!
//! Quality metadata travels next to the API fields so downstream consumers
//! can discard low-confidence readings.

use aquaguard_core::alarm::AlarmKind;
use aquaguard_core::{AlarmEvent, Measurement, SensorKind};
use serde_json::{json, Map, Value};

/// Endpoint for alarms and unhealthy-sensor alerts
pub const ALERT_TOPIC: &str = "/api/alerts";

/// Where and how a sensor's value is posted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiField {
    pub endpoint: &'static str,
    pub field: &'static str,
    /// Decimal places the API column stores
    pub decimals: u8,
}

pub const fn api_field(kind: SensorKind) -> ApiField {
    let (endpoint, field, decimals) = match kind {
        SensorKind::Ph => ("/api/ph-readings", "ph_value", 2),
        SensorKind::Ammonia => ("/api/ammonia-readings", "ammonia_ppm", 3),
        SensorKind::Nitrite => ("/api/nitrite-readings", "nitrite_ppm", 3),
        SensorKind::Nitrate => ("/api/nitrate-readings", "nitrate_ppm", 2),
        SensorKind::DissolvedOxygen => ("/api/dissolved-oxygen-readings", "do_ppm", 2),
        SensorKind::Orp => ("/api/orp-readings", "orp_mv", 1),
        SensorKind::Conductivity => ("/api/salinity-readings", "conductivity_us_cm", 1),
        SensorKind::Salinity => ("/api/salinity-readings", "salinity_ppt", 2),
        SensorKind::Turbidity => ("/api/turbidity-readings", "turbidity_ntu", 2),
        SensorKind::Temperature => ("/api/temperature-readings", "temperature_celsius", 1),
        SensorKind::OrganicLoad => ("/api/toc-readings", "toc_ppm", 2),
    };

    ApiField {
        endpoint,
        field,
        decimals,
    }
}

/// Installation-level payload settings
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadConfig {
    pub pool_id: u32,
    /// Fixed note; defaults to one naming the probe
    pub notes: Option<String>,
    /// Attach score, flags and timestamp
    pub include_quality: bool,
}

impl PayloadConfig {
    pub fn for_pool(pool_id: u32) -> Self {
        Self {
            pool_id,
            ..Self::default()
        }
    }
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            pool_id: 1,
            notes: None,
            include_quality: true,
        }
    }
}

/// Round to the API's decimal scale; non-finite values become `null`
pub fn round_to(value: f32, decimals: u8) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }
    let scale = 10f64.powi(i32::from(decimals));
    json!((f64::from(value) * scale).round() / scale)
}

/// Body posted to the sensor's endpoint
pub fn measurement_body(measurement: &Measurement, config: &PayloadConfig) -> Value {
    let api = api_field(measurement.sensor);
    let notes = config
        .notes
        .clone()
        .unwrap_or_else(|| format!("Automated reading from {} probe", measurement.sensor.name()));

    let mut body = Map::new();
    body.insert("pool_id".into(), json!(config.pool_id));
    body.insert(api.field.into(), round_to(measurement.computed_value, api.decimals));
    body.insert("notes".into(), Value::String(notes));

    if let Some(split) = measurement.speciation {
        body.insert("free_ammonia_ppm".into(), round_to(split.free_ammonia, 4));
    }

    if config.include_quality {
        body.insert(
            "quality".into(),
            json!({
                "score": measurement.quality_score,
                "valid": measurement.valid,
                "calibrated": measurement.calibrated(),
                "flags": measurement.flags.bits(),
                "temperature_celsius": round_to(measurement.temperature, 1),
                "timestamp": measurement.timestamp,
            }),
        );
    }
    Value::Object(body)
}

/// Body posted to [`ALERT_TOPIC`]
pub fn alarm_body(alarm: &AlarmEvent, config: &PayloadConfig) -> Value {
    let api = api_field(alarm.sensor);
    let message = if alarm.kind == AlarmKind::Unhealthy {
        format!("{} probe unhealthy after {} failed cycles", alarm.sensor.name(), alarm.value)
    } else {
        format!(
            "{} {} alarm: {} {}",
            alarm.sensor.name(),
            alarm.kind.name(),
            round_to(alarm.value, api.decimals),
            alarm.sensor.unit()
        )
    };

    json!({
        "pool_id": config.pool_id,
        "sensor": alarm.sensor.name(),
        "alarm": alarm.kind.name(),
        "critical": alarm.kind.is_critical(),
        "value": round_to(alarm.value, api.decimals),
        "threshold": round_to(alarm.threshold, api.decimals),
        "timestamp": alarm.timestamp,
        "message": message,
    })
}
