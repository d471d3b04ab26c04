//! Diagnostic tools exposed to the agent.
//!
//! The registry is a fixed, ordered, read-only list built once at startup;
//! every tool is a thin typed wrapper over the [`NwpiBackend`].

mod inventory;
mod trace;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::llm::ToolSchema;
use crate::nwpi::NwpiBackend;

pub use inventory::{GetDeviceDetailsFromSite, GetSiteList};
pub use trace::{GetEntryTimeAndState, GetFlowDetail, GetFlowSummary, StartTrace, TraceReadout};

/// A single named operation the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted arguments.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<String, AgentError>;
}

/// Fixed ordered collection of tools.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Register the diagnostic tool set against one backend.
    pub fn new(backend: Arc<dyn NwpiBackend>) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(StartTrace::new(backend.clone())),
            Arc::new(GetSiteList::new(backend.clone())),
            Arc::new(TraceReadout::new(backend.clone())),
            Arc::new(GetDeviceDetailsFromSite::new(backend.clone())),
            Arc::new(GetEntryTimeAndState::new(backend.clone())),
            Arc::new(GetFlowSummary::new(backend.clone())),
            Arc::new(GetFlowDetail::new(backend)),
        ];
        Self { tools }
    }

    /// Tool schemas in registration order, for the model.
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| ToolSchema::function(t.name(), t.description(), t.parameters_schema()))
            .collect()
    }

    /// All registered tools in registration order.
    pub fn list_tools(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(|t| t.as_ref()).collect()
    }

    /// Dispatch a call by tool name.
    pub async fn execute(&self, name: &str, args: Value) -> Result<String, AgentError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| AgentError::Validation(format!("no tool is named '{name}'")))?;
        tool.execute(args).await
    }
}

/// Extract a required integer argument.
fn require_u64(args: &Value, name: &str, tool: &str) -> Result<u64, AgentError> {
    args.get(name).and_then(Value::as_u64).ok_or_else(|| {
        AgentError::Validation(format!("'{name}' (integer) is required by {tool}"))
    })
}

/// Extract a required signed integer argument (epoch-millisecond timestamps).
fn require_i64(args: &Value, name: &str, tool: &str) -> Result<i64, AgentError> {
    args.get(name).and_then(Value::as_i64).ok_or_else(|| {
        AgentError::Validation(format!("'{name}' (integer) is required by {tool}"))
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::error::AgentError;
    use crate::nwpi::{
        Device, FlowSummary, NwpiBackend, TraceHandle, TraceReadout as Readout, TraceRequest,
        TraceState, TraceStatus,
    };

    /// Scripted backend for tool and executor tests.
    pub struct FakeBackend {
        pub started: Mutex<Vec<TraceRequest>>,
        pub fail_with: Mutex<Option<fn() -> AgentError>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self {
                started: Mutex::new(Vec::new()),
                fail_with: Mutex::new(None),
            }
        }

        fn maybe_fail(&self) -> Result<(), AgentError> {
            match *self.fail_with.lock().unwrap() {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }

        pub fn sample_device() -> Device {
            serde_json::from_value(json!({
                "system-ip": "10.10.1.11",
                "host-name": "site100-cedge1",
                "site-id": 100,
                "reachability": "reachable",
                "device-model": "vedge-C8000V"
            }))
            .unwrap()
        }

        pub fn sample_flow() -> FlowSummary {
            serde_json::from_value(json!({
                "flow-id": 7,
                "src-ip": "10.0.1.5",
                "dst-ip": "10.0.2.9",
                "src-port": 51234,
                "dst-port": 443,
                "protocol": "TCP",
                "vpn-id": 10
            }))
            .unwrap()
        }
    }

    #[async_trait]
    impl NwpiBackend for FakeBackend {
        async fn get_site_list(&self) -> Result<Vec<u32>, AgentError> {
            self.maybe_fail()?;
            Ok(vec![100, 200, 300])
        }

        async fn get_device_details_from_site(
            &self,
            site_id: u32,
        ) -> Result<Vec<Device>, AgentError> {
            self.maybe_fail()?;
            if site_id == 100 {
                Ok(vec![Self::sample_device()])
            } else {
                Err(AgentError::Lookup(format!("no devices exist at site {site_id}")))
            }
        }

        async fn start_trace(&self, request: TraceRequest) -> Result<TraceHandle, AgentError> {
            self.maybe_fail()?;
            self.started.lock().unwrap().push(request);
            Ok(TraceHandle {
                trace_id: 42,
                timestamp: 1721910000000,
            })
        }

        async fn get_entry_time_and_state(
            &self,
            _trace_id: u64,
        ) -> Result<TraceStatus, AgentError> {
            self.maybe_fail()?;
            Ok(TraceStatus {
                entry_time: 1721910000000,
                state: TraceState::Running,
            })
        }

        async fn get_flow_summary(
            &self,
            _trace_id: u64,
            _entry_time: i64,
        ) -> Result<Vec<FlowSummary>, AgentError> {
            self.maybe_fail()?;
            Ok(vec![Self::sample_flow()])
        }

        async fn get_flow_detail(
            &self,
            _trace_id: u64,
            _entry_time: i64,
            flow_id: u64,
        ) -> Result<Value, AgentError> {
            self.maybe_fail()?;
            Ok(json!([{"flow-id": flow_id, "hop": "site100-cedge1", "fwd-drop": 0}]))
        }

        async fn trace_readout(
            &self,
            _trace_id: u64,
            _entry_time: i64,
        ) -> Result<Readout, AgentError> {
            self.maybe_fail()?;
            Ok(Readout {
                flows: vec![Self::sample_flow()],
                events: vec!["sla-violation on bfd session".to_string()],
            })
        }
    }
}
