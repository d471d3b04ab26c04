//! Network Wide Path Insight backend.
//!
//! [`NwpiBackend`] is the seam between the diagnostic tools and the SD-WAN
//! controller; [`VmanageClient`] is the production implementation over the
//! vManage REST API.

mod client;
mod types;

use async_trait::async_trait;

pub use client::VmanageClient;
pub use types::{
    Device, FlowSummary, TraceHandle, TraceReadout, TraceRequest, TraceState, TraceStatus,
};

use crate::error::AgentError;

/// Operations the diagnostic tools need from the controller.
#[async_trait]
pub trait NwpiBackend: Send + Sync {
    /// Site ids known to the controller, ascending, deduplicated.
    async fn get_site_list(&self) -> Result<Vec<u32>, AgentError>;

    /// Devices attached to one site.
    async fn get_device_details_from_site(&self, site_id: u32)
        -> Result<Vec<Device>, AgentError>;

    /// Start a path-insight trace; returns the trace id and its timestamp.
    async fn start_trace(&self, request: TraceRequest) -> Result<TraceHandle, AgentError>;

    /// Entry time and current state of a trace.
    async fn get_entry_time_and_state(&self, trace_id: u64) -> Result<TraceStatus, AgentError>;

    /// One row per flow observed by the trace.
    async fn get_flow_summary(
        &self,
        trace_id: u64,
        entry_time: i64,
    ) -> Result<Vec<FlowSummary>, AgentError>;

    /// Hop-by-hop detail for a single flow.
    async fn get_flow_detail(
        &self,
        trace_id: u64,
        entry_time: i64,
        flow_id: u64,
    ) -> Result<serde_json::Value, AgentError>;

    /// Combined readout: flows plus events reported by the trace.
    async fn trace_readout(
        &self,
        trace_id: u64,
        entry_time: i64,
    ) -> Result<TraceReadout, AgentError>;
}
