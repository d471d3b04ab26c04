//! Data shapes returned by the path-insight backend.

use serde::{Deserialize, Serialize};

/// Parameters for starting a trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRequest {
    /// Site the trace runs on
    pub site_id: u32,

    /// Service VPN to inspect
    pub vpn_id: u32,

    /// Optional source subnet filter, e.g. `10.0.1.0/24`
    pub src_prefix: Option<String>,

    /// Optional destination subnet filter
    pub dst_prefix: Option<String>,

    /// Trace duration in minutes
    pub duration: u32,
}

impl TraceRequest {
    pub fn new(site_id: u32, vpn_id: u32) -> Self {
        Self {
            site_id,
            vpn_id,
            src_prefix: None,
            dst_prefix: None,
            duration: 60,
        }
    }
}

/// Identifier pair returned when a trace starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceHandle {
    /// Opaque trace identifier
    pub trace_id: u64,

    /// Epoch milliseconds; required by every follow-up query
    pub timestamp: i64,
}

/// Lifecycle state of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceState {
    Running,
    Stopped,
    /// Controller reported a state the client does not model
    Faulted,
}

impl<'de> Deserialize<'de> for TraceState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Controllers grow new states faster than clients; anything
        // unrecognized is treated as faulted rather than a decode error.
        let state = String::deserialize(deserializer)?;
        Ok(match state.as_str() {
            "running" => TraceState::Running,
            "stopped" => TraceState::Stopped,
            _ => TraceState::Faulted,
        })
    }
}

/// Entry time and state of an existing trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStatus {
    pub entry_time: i64,
    pub state: TraceState,
}

/// A WAN edge device as reported by the controller inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "system-ip")]
    pub system_ip: String,

    #[serde(rename = "host-name")]
    pub host_name: String,

    #[serde(rename = "site-id")]
    pub site_id: u32,

    pub reachability: String,

    #[serde(rename = "device-model", default)]
    pub device_model: Option<String>,
}

/// One observed flow within a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary {
    #[serde(rename = "flow-id")]
    pub flow_id: u64,

    #[serde(rename = "src-ip")]
    pub src_ip: String,

    #[serde(rename = "dst-ip")]
    pub dst_ip: String,

    #[serde(rename = "src-port")]
    pub src_port: u16,

    #[serde(rename = "dst-port")]
    pub dst_port: u16,

    pub protocol: String,

    #[serde(rename = "vpn-id")]
    pub vpn_id: u32,
}

/// Flows plus reported events for a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceReadout {
    pub flows: Vec<FlowSummary>,
    pub events: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_trace_state_maps_to_faulted() {
        let status: TraceStatus =
            serde_json::from_value(serde_json::json!({"entry_time": 1721910000000i64, "state": "dma-timeout"}))
                .unwrap();
        assert_eq!(status.state, TraceState::Faulted);
    }

    #[test]
    fn device_row_uses_controller_field_names() {
        let device: Device = serde_json::from_value(serde_json::json!({
            "system-ip": "10.10.1.11",
            "host-name": "site100-cedge1",
            "site-id": 100,
            "reachability": "reachable"
        }))
        .unwrap();
        assert_eq!(device.site_id, 100);
        assert_eq!(device.device_model, None);
    }
}
