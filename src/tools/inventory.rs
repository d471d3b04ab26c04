//! Controller inventory tools: sites and devices.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::nwpi::NwpiBackend;

use super::{require_u64, Tool};

/// List the site ids available for tracing.
pub struct GetSiteList {
    backend: Arc<dyn NwpiBackend>,
}

impl GetSiteList {
    pub fn new(backend: Arc<dyn NwpiBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetSiteList {
    fn name(&self) -> &str {
        "get_site_list"
    }

    fn description(&self) -> &str {
        "List the site ids known to the SD-WAN controller. Use this to confirm the site the user named before starting a trace."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<String, AgentError> {
        let sites = self.backend.get_site_list().await?;
        let rendered = sites
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("Available sites: {rendered}"))
    }
}

/// List the WAN edge devices attached to one site.
pub struct GetDeviceDetailsFromSite {
    backend: Arc<dyn NwpiBackend>,
}

impl GetDeviceDetailsFromSite {
    pub fn new(backend: Arc<dyn NwpiBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetDeviceDetailsFromSite {
    fn name(&self) -> &str {
        "get_device_details_from_site"
    }

    fn description(&self) -> &str {
        "Retrieve the WAN edge devices of a site (system-ip, hostname, reachability). Call this before starting a trace on the site."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "site_id": {
                    "type": "integer",
                    "description": "Site id as returned by get_site_list"
                }
            },
            "required": ["site_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, AgentError> {
        let site_id = require_u64(&args, "site_id", self.name())? as u32;
        let devices = self.backend.get_device_details_from_site(site_id).await?;

        let mut out = format!("Devices at site {site_id}:");
        for device in &devices {
            out.push_str(&format!(
                "\n- {} ({}), model {}, {}",
                device.host_name,
                device.system_ip,
                device.device_model.as_deref().unwrap_or("unknown"),
                device.reachability,
            ));
        }
        Ok(out)
    }
}
