//! Persistence of requests on the logistics backend.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use quartermaster_core::types::id::RequestId;
use quartermaster_core::{AppError, AppResult, ErrorKind};
use quartermaster_entity::request::{NewRequest, Request, RequestStatus, RequestType, Transition};

use crate::context::SessionContext;
use crate::notification::service::ListResponse;
use crate::transport::ApiClient;

/// Request storage the lifecycle manager commits transitions to.
#[async_trait]
pub trait RequestBackend: Send + Sync {
    /// List requests of one type.
    async fn list(&self, ctx: &SessionContext, request_type: RequestType) -> AppResult<Vec<Request>>;

    /// Fetch the current server copy of one request.
    async fn fetch(
        &self,
        ctx: &SessionContext,
        request_type: RequestType,
        id: &RequestId,
    ) -> AppResult<Request>;

    /// Create a request in `pending`.
    async fn create(&self, ctx: &SessionContext, request: &NewRequest) -> AppResult<Request>;

    /// Persist `transition` of `current`. `planned` is the locally computed
    /// next version and may be used to fill fields the server omits.
    async fn commit(
        &self,
        ctx: &SessionContext,
        current: &Request,
        transition: &Transition,
        planned: &Request,
    ) -> AppResult<Request>;
}

/// Body of a status change on the generic request resource.
#[derive(Debug, Serialize)]
struct StatusPatch<'a> {
    status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// [`RequestBackend`] over the `requests/` and `repair-requests/` resources.
#[derive(Debug, Clone)]
pub struct HttpRequestBackend {
    client: ApiClient,
}

impl HttpRequestBackend {
    /// Creates a new request backend.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn collection(request_type: RequestType) -> &'static str {
        match request_type {
            RequestType::New => "requests/",
            RequestType::Repair => "repair-requests/",
        }
    }

    fn commit_path(current: &Request, transition: &Transition) -> String {
        let base = format!("{}{}/", Self::collection(current.request_type), current.id);
        match transition {
            Transition::MarkInProcess => format!("{base}mark_repair_in_process/"),
            Transition::MarkRepaired => format!("{base}mark_repaired/"),
            _ => base,
        }
    }

    fn commit_body(transition: &Transition, planned: &Request) -> Value {
        let patch = match transition {
            Transition::MarkInProcess | Transition::MarkRepaired => {
                return Value::Object(serde_json::Map::new());
            }
            Transition::Approve { .. } => StatusPatch {
                status: planned.status,
                quantity: Some(planned.quantity),
                reason: None,
            },
            Transition::Deny { reason } => StatusPatch {
                status: planned.status,
                quantity: None,
                reason: Some(reason.trim()),
            },
            Transition::MarkDamaged { description } => StatusPatch {
                status: planned.status,
                quantity: None,
                reason: Some(description.trim()),
            },
            Transition::Issue | Transition::Complete => StatusPatch {
                status: planned.status,
                quantity: None,
                reason: None,
            },
        };
        serde_json::to_value(patch).unwrap_or_default()
    }
}

/// Parse a request body, filling in `type` for endpoints that omit it.
fn parse_request(mut value: Value, request_type: RequestType) -> AppResult<Request> {
    if let Some(object) = value.as_object_mut() {
        object
            .entry("type")
            .or_insert_with(|| Value::String(request_type.as_str().to_string()));
    }
    let request: Request = serde_json::from_value(value).map_err(|e| {
        AppError::with_source(
            ErrorKind::MalformedPayload,
            format!("Unexpected {request_type} request payload"),
            e,
        )
    })?;
    if !request.status.applies_to(request.request_type) {
        return Err(AppError::malformed_payload(format!(
            "{} request {} reports status '{}'",
            request.request_type, request.id, request.status
        )));
    }
    Ok(request)
}

#[async_trait]
impl RequestBackend for HttpRequestBackend {
    async fn list(&self, ctx: &SessionContext, request_type: RequestType) -> AppResult<Vec<Request>> {
        let query: &[(&str, &str)] = match request_type {
            RequestType::New => &[("type", "new")],
            RequestType::Repair => &[],
        };
        let values: ListResponse<Value> = self
            .client
            .get(ctx, Self::collection(request_type), query)
            .await?;
        values
            .into_vec()
            .into_iter()
            .map(|v| parse_request(v, request_type))
            .collect()
    }

    async fn fetch(
        &self,
        ctx: &SessionContext,
        request_type: RequestType,
        id: &RequestId,
    ) -> AppResult<Request> {
        let path = format!("{}{id}/", Self::collection(request_type));
        let value: Value = self.client.get(ctx, &path, &[]).await?;
        parse_request(value, request_type)
    }

    async fn create(&self, ctx: &SessionContext, request: &NewRequest) -> AppResult<Request> {
        let value: Value = self
            .client
            .post(ctx, Self::collection(request.request_type), request)
            .await?;
        parse_request(value, request.request_type)
    }

    async fn commit(
        &self,
        ctx: &SessionContext,
        current: &Request,
        transition: &Transition,
        planned: &Request,
    ) -> AppResult<Request> {
        let path = Self::commit_path(current, transition);
        let body = Self::commit_body(transition, planned);
        let value: Value = self.client.patch(ctx, &path, &body).await?;

        // Action endpoints answer with a status blob rather than the resource
        match parse_request(value, current.request_type) {
            Ok(request) => Ok(request),
            Err(_) => {
                debug!(request_id = %current.id, action = transition.name(), "Re-fetching after commit");
                self.fetch(ctx, current.request_type, &current.id).await
            }
        }
    }
}
