//! vManage REST client for path-insight traces.
//!
//! vManage authenticates with a form login (`j_security_check`) that yields a
//! `JSESSIONID` cookie, plus a CSRF token fetched from
//! `dataservice/client/token` that must accompany every mutating request.
//! The session is established lazily on first use and re-established when the
//! controller answers 401/403.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::VmanageConfig;
use crate::error::AgentError;

use super::types::{
    Device, FlowSummary, TraceHandle, TraceReadout, TraceRequest, TraceState, TraceStatus,
};
use super::NwpiBackend;

#[derive(Debug, Clone)]
struct Session {
    cookie: String,
    xsrf_token: String,
}

/// Client for the SD-WAN controller.
pub struct VmanageClient {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
    session: Mutex<Option<Session>>,
}

/// vManage wraps list responses in a `data` envelope.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

impl VmanageClient {
    pub fn new(config: &VmanageConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            // Lab controllers ship self-signed certificates.
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()
            .map_err(|e| AgentError::Other(anyhow::Error::new(e).context("building HTTP client")))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
            session: Mutex::new(None),
        })
    }

    async fn login(&self) -> Result<Session, AgentError> {
        info!("logging in to vManage at {}", self.base_url);

        let response = self
            .client
            .post(format!("{}/j_security_check", self.base_url))
            .form(&[
                ("j_username", self.username.as_str()),
                ("j_password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AgentError::from_transport("vManage login", e))?;

        let cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .filter(|v| v.starts_with("JSESSIONID"))
            .map(str::to_string)
            .ok_or_else(|| {
                AgentError::Connectivity("vManage login did not yield a session".to_string())
            })?;

        // A login failure comes back 200 with an HTML login page.
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::from_transport("vManage login", e))?;
        if body.contains("<html") {
            return Err(AgentError::Connectivity(
                "vManage rejected the credentials".to_string(),
            ));
        }

        let xsrf_token = self
            .client
            .get(format!("{}/dataservice/client/token", self.base_url))
            .header(reqwest::header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| AgentError::from_transport("vManage token fetch", e))?
            .text()
            .await
            .map_err(|e| AgentError::from_transport("vManage token fetch", e))?;

        Ok(Session { cookie, xsrf_token })
    }

    async fn session(&self) -> Result<Session, AgentError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        let session = self.login().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn drop_session(&self) {
        *self.session.lock().await = None;
    }

    /// Issue one authenticated request, re-logging-in once on auth expiry.
    async fn request(&self, method: reqwest::Method, path: &str, body: Option<&Value>) -> Result<Value, AgentError> {
        for relogin in [false, true] {
            if relogin {
                self.drop_session().await;
            }
            let session = self.session().await?;

            let url = format!("{}/dataservice/{}", self.base_url, path);
            debug!("vManage {} {}", method, url);

            let mut builder = self
                .client
                .request(method.clone(), &url)
                .header(reqwest::header::COOKIE, &session.cookie)
                .header("X-XSRF-TOKEN", &session.xsrf_token);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| AgentError::from_transport("vManage request", e))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                if relogin {
                    return Err(AgentError::Connectivity(
                        "vManage refused the session even after re-login".to_string(),
                    ));
                }
                continue;
            }
            if status == StatusCode::NOT_FOUND {
                return Err(AgentError::Lookup(format!(
                    "vManage has no resource at {path}"
                )));
            }
            if status.is_client_error() {
                let detail = response.text().await.unwrap_or_default();
                return Err(AgentError::Validation(format!(
                    "vManage rejected the request ({status}): {detail}"
                )));
            }
            if !status.is_success() {
                return Err(AgentError::Connectivity(format!(
                    "vManage answered {status} for {path}"
                )));
            }

            return response
                .json()
                .await
                .map_err(|e| AgentError::from_transport("decoding vManage response", e));
        }
        Err(AgentError::Connectivity(
            "vManage session could not be established".to_string(),
        ))
    }

    async fn get(&self, path: &str) -> Result<Value, AgentError> {
        self.request(reqwest::Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, AgentError> {
        self.request(reqwest::Method::POST, path, Some(body)).await
    }

    fn rows<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> Result<Vec<T>, AgentError> {
        let envelope: DataEnvelope<T> = serde_json::from_value(value)
            .map_err(|e| AgentError::Other(anyhow::Error::new(e).context(format!("decoding {what}"))))?;
        Ok(envelope.data)
    }
}

#[async_trait::async_trait]
impl NwpiBackend for VmanageClient {
    async fn get_site_list(&self) -> Result<Vec<u32>, AgentError> {
        let value = self.get("device").await?;
        let devices: Vec<Device> = Self::rows(value, "device inventory")?;

        let mut sites: Vec<u32> = devices.iter().map(|d| d.site_id).collect();
        sites.sort_unstable();
        sites.dedup();

        if sites.is_empty() {
            return Err(AgentError::Lookup(
                "the controller inventory reported no sites".to_string(),
            ));
        }
        Ok(sites)
    }

    async fn get_device_details_from_site(
        &self,
        site_id: u32,
    ) -> Result<Vec<Device>, AgentError> {
        let value = self.get("device").await?;
        let devices: Vec<Device> = Self::rows(value, "device inventory")?;

        let at_site: Vec<Device> = devices.into_iter().filter(|d| d.site_id == site_id).collect();
        if at_site.is_empty() {
            return Err(AgentError::Lookup(format!(
                "no devices exist at site {site_id}"
            )));
        }
        Ok(at_site)
    }

    async fn start_trace(&self, request: TraceRequest) -> Result<TraceHandle, AgentError> {
        let mut body = json!({
            "site-id": request.site_id,
            "vpn-id": request.vpn_id,
            "duration": request.duration,
        });
        if let Some(src) = &request.src_prefix {
            body["src-pfx"] = json!(src);
        }
        if let Some(dst) = &request.dst_prefix {
            body["dst-pfx"] = json!(dst);
        }

        let value = self.post("stream/device/nwpi/trace/start", &body).await?;

        let trace_id = value
            .get("trace-id")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                AgentError::Lookup("the controller returned an empty trace id".to_string())
            })?;
        let timestamp = value
            .get("entry_time")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                AgentError::Lookup("the controller returned no trace timestamp".to_string())
            })?;

        Ok(TraceHandle {
            trace_id,
            timestamp,
        })
    }

    async fn get_entry_time_and_state(&self, trace_id: u64) -> Result<TraceStatus, AgentError> {
        let value = self
            .get(&format!("stream/device/nwpi/traceHistory?trace-id={trace_id}"))
            .await?;
        let rows: Vec<Value> = Self::rows(value, "trace history")?;

        let row = rows.into_iter().next().ok_or_else(|| {
            AgentError::Lookup(format!("trace {trace_id} does not exist"))
        })?;

        let entry_time = row
            .get("entry_time")
            .and_then(Value::as_i64)
            .ok_or_else(|| AgentError::Lookup(format!("trace {trace_id} has no entry time")))?;
        let state = row
            .get("state")
            .cloned()
            .map(serde_json::from_value::<TraceState>)
            .transpose()
            .ok()
            .flatten()
            .unwrap_or(TraceState::Faulted);

        Ok(TraceStatus { entry_time, state })
    }

    async fn get_flow_summary(
        &self,
        trace_id: u64,
        entry_time: i64,
    ) -> Result<Vec<FlowSummary>, AgentError> {
        let value = self
            .get(&format!(
                "stream/device/nwpi/flowSummary?trace-id={trace_id}&timestamp={entry_time}"
            ))
            .await?;
        Self::rows(value, "flow summary")
    }

    async fn get_flow_detail(
        &self,
        trace_id: u64,
        entry_time: i64,
        flow_id: u64,
    ) -> Result<Value, AgentError> {
        let value = self
            .get(&format!(
                "stream/device/nwpi/flowDetail?trace-id={trace_id}&timestamp={entry_time}&flow-id={flow_id}"
            ))
            .await?;
        let rows: Vec<Value> = Self::rows(value, "flow detail")?;
        if rows.is_empty() {
            return Err(AgentError::Lookup(format!(
                "flow {flow_id} was not observed by trace {trace_id}"
            )));
        }
        Ok(Value::Array(rows))
    }

    async fn trace_readout(
        &self,
        trace_id: u64,
        entry_time: i64,
    ) -> Result<TraceReadout, AgentError> {
        let flows = self.get_flow_summary(trace_id, entry_time).await?;

        let value = self
            .get(&format!(
                "stream/device/nwpi/eventReadout?trace-id={trace_id}&timestamp={entry_time}"
            ))
            .await?;
        let rows: Vec<Value> = Self::rows(value, "event readout")?;
        let events = rows
            .into_iter()
            .filter_map(|row| {
                row.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect();

        Ok(TraceReadout { flows, events })
    }
}
