//! Path-insight trace tools: start, status, flows, readout.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::nwpi::{FlowSummary, NwpiBackend, TraceRequest};

use super::{require_i64, require_u64, Tool};

/// Start a Network Wide Path Insight trace.
pub struct StartTrace {
    backend: Arc<dyn NwpiBackend>,
}

impl StartTrace {
    pub fn new(backend: Arc<dyn NwpiBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for StartTrace {
    fn name(&self) -> &str {
        "start_trace"
    }

    fn description(&self) -> &str {
        "Start a path-insight trace on a site and VPN. Optionally narrow it to source and destination subnets. Returns the trace_id and timestamp the user must be told about."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "site_id": {
                    "type": "integer",
                    "description": "Site to trace, confirmed against get_site_list"
                },
                "vpn_id": {
                    "type": "integer",
                    "description": "Service VPN to inspect"
                },
                "src_prefix": {
                    "type": "string",
                    "description": "Optional source subnet, e.g. 10.0.1.0/24"
                },
                "dst_prefix": {
                    "type": "string",
                    "description": "Optional destination subnet"
                }
            },
            "required": ["site_id", "vpn_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, AgentError> {
        let site_id = require_u64(&args, "site_id", self.name())? as u32;
        let vpn_id = require_u64(&args, "vpn_id", self.name())? as u32;

        let mut request = TraceRequest::new(site_id, vpn_id);
        request.src_prefix = args
            .get("src_prefix")
            .and_then(Value::as_str)
            .map(str::to_string);
        request.dst_prefix = args
            .get("dst_prefix")
            .and_then(Value::as_str)
            .map(str::to_string);

        let handle = self.backend.start_trace(request).await?;
        Ok(format!(
            "Trace started on site {site_id}, VPN {vpn_id}. trace_id: {}, timestamp: {}",
            handle.trace_id, handle.timestamp
        ))
    }
}

/// Fetch a trace's entry time and state.
pub struct GetEntryTimeAndState {
    backend: Arc<dyn NwpiBackend>,
}

impl GetEntryTimeAndState {
    pub fn new(backend: Arc<dyn NwpiBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetEntryTimeAndState {
    fn name(&self) -> &str {
        "get_entry_time_and_state"
    }

    fn description(&self) -> &str {
        "Retrieve the entry_time and state of a trace. Always call this first when the user asks about an existing trace; the entry_time is needed by every other trace query."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "trace_id": {
                    "type": "integer",
                    "description": "Trace identifier returned by start_trace"
                }
            },
            "required": ["trace_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, AgentError> {
        let trace_id = require_u64(&args, "trace_id", self.name())?;
        let status = self.backend.get_entry_time_and_state(trace_id).await?;

        let started = chrono::DateTime::from_timestamp_millis(status.entry_time)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "out-of-range".to_string());
        Ok(format!(
            "Trace {trace_id}: entry_time {} (started {started}), state {:?}",
            status.entry_time, status.state
        ))
    }
}

/// One row per flow observed by a trace.
pub struct GetFlowSummary {
    backend: Arc<dyn NwpiBackend>,
}

impl GetFlowSummary {
    pub fn new(backend: Arc<dyn NwpiBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetFlowSummary {
    fn name(&self) -> &str {
        "get_flow_summary"
    }

    fn description(&self) -> &str {
        "Summarize the flows observed by a trace, one row per flow. Requires the entry_time from get_entry_time_and_state."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "trace_id": { "type": "integer" },
                "entry_time": {
                    "type": "integer",
                    "description": "Epoch milliseconds from get_entry_time_and_state"
                }
            },
            "required": ["trace_id", "entry_time"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, AgentError> {
        let trace_id = require_u64(&args, "trace_id", self.name())?;
        let entry_time = require_i64(&args, "entry_time", self.name())?;

        let flows = self.backend.get_flow_summary(trace_id, entry_time).await?;
        if flows.is_empty() {
            return Ok(format!("Trace {trace_id} has observed no flows yet."));
        }
        Ok(render_flow_table(&flows))
    }
}

/// Hop-by-hop detail of a single flow.
pub struct GetFlowDetail {
    backend: Arc<dyn NwpiBackend>,
}

impl GetFlowDetail {
    pub fn new(backend: Arc<dyn NwpiBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetFlowDetail {
    fn name(&self) -> &str {
        "get_flow_detail"
    }

    fn description(&self) -> &str {
        "Retrieve hop-by-hop detail for one flow of a trace. Use the previously obtained entry_time and a flow_id from get_flow_summary."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "trace_id": { "type": "integer" },
                "entry_time": { "type": "integer" },
                "flow_id": { "type": "integer" }
            },
            "required": ["trace_id", "entry_time", "flow_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, AgentError> {
        let trace_id = require_u64(&args, "trace_id", self.name())?;
        let entry_time = require_i64(&args, "entry_time", self.name())?;
        let flow_id = require_u64(&args, "flow_id", self.name())?;

        let detail = self
            .backend
            .get_flow_detail(trace_id, entry_time, flow_id)
            .await?;
        serde_json::to_string_pretty(&detail)
            .map_err(|e| AgentError::Other(anyhow::Error::new(e).context("rendering flow detail")))
    }
}

/// Combined flows-plus-events readout.
pub struct TraceReadout {
    backend: Arc<dyn NwpiBackend>,
}

impl TraceReadout {
    pub fn new(backend: Arc<dyn NwpiBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for TraceReadout {
    fn name(&self) -> &str {
        "trace_readout"
    }

    fn description(&self) -> &str {
        "Full readout of a trace: observed flows and any reported events. Use this to check whether there are flows and whether any event was reported."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "trace_id": { "type": "integer" },
                "entry_time": { "type": "integer" }
            },
            "required": ["trace_id", "entry_time"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, AgentError> {
        let trace_id = require_u64(&args, "trace_id", self.name())?;
        let entry_time = require_i64(&args, "entry_time", self.name())?;

        let readout = self.backend.trace_readout(trace_id, entry_time).await?;

        let mut out = if readout.flows.is_empty() {
            format!("Trace {trace_id} has observed no flows.")
        } else {
            render_flow_table(&readout.flows)
        };
        if readout.events.is_empty() {
            out.push_str("\nNo events reported.");
        } else {
            out.push_str("\nReported events:");
            for event in &readout.events {
                out.push_str(&format!("\n- {event}"));
            }
        }
        Ok(out)
    }
}

/// Render flows one row per flow, header first.
fn render_flow_table(flows: &[FlowSummary]) -> String {
    let mut out = String::from("flow-id | vpn | protocol | src | dst");
    for flow in flows {
        out.push_str(&format!(
            "\n{} | {} | {} | {}:{} | {}:{}",
            flow.flow_id,
            flow.vpn_id,
            flow.protocol,
            flow.src_ip,
            flow.src_port,
            flow.dst_ip,
            flow.dst_port,
        ));
    }
    out
}
