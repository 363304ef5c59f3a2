use crate::error::RequestError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use url::Url;

/// Counter backing ids generated for requests that arrive without one.
static NEXT_GENERATED_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a request.
///
/// Requesters usually assign numeric ids, as in JSON-RPC. Ids generated on receipt are strings
/// prefixed with `remote-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// A numeric id.
    Number(u64),
    /// A string id.
    String(String),
}

impl RequestId {
    /// Generates a fresh id for a request that arrived without one.
    pub fn generate() -> Self {
        Self::String(format!("remote-{}", NEXT_GENERATED_ID.fetch_add(1, Ordering::Relaxed)))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::String(id) => f.write_str(id),
        }
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

/// A web origin in its ASCII serialization, e.g. `https://id.porto.sh`.
///
/// Origins are always derived from a [`Url`] so two origins compare equal exactly when scheme,
/// host and port match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin(String);

impl Origin {
    /// Returns the origin of `url`.
    pub fn from_url(url: &Url) -> Self {
        Self(url.origin().ascii_serialization())
    }

    /// Returns the origin as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the origin is opaque (e.g. `data:` urls), which never equals any other origin.
    pub fn is_opaque(&self) -> bool {
        self.0 == "null"
    }

    /// Whether two origins are the same. Opaque origins are never the same origin as anything.
    pub fn same_origin(&self, other: &Origin) -> bool {
        !self.is_opaque() && self == other
    }
}

impl std::str::FromStr for Origin {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_url(&Url::parse(s)?))
    }
}

impl TryFrom<String> for Origin {
    type Error = url::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A wallet request received from a requester.
///
/// `id`, `method` and `origin` are fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    method: String,
    #[serde(default)]
    params: Value,
    origin: Origin,
    /// The request exactly as it was received, echoed back in protocol messages.
    raw: Value,
}

impl Request {
    /// Creates a new [`Request`].
    ///
    /// Fails with [`RequestError::Malformed`] if the method is empty.
    pub fn new(
        id: Option<RequestId>,
        method: impl Into<String>,
        params: Value,
        origin: Origin,
        raw: Value,
    ) -> Result<Self, RequestError> {
        let method = method.into();
        if method.trim().is_empty() {
            return Err(RequestError::Malformed("missing method".into()));
        }
        if !(params.is_null() || params.is_array() || params.is_object()) {
            return Err(RequestError::Malformed(format!(
                "params for {method} must be an array or an object"
            )));
        }

        Ok(Self { id: id.unwrap_or_else(RequestId::generate), method, params, origin, raw })
    }

    /// The request id.
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// The wallet method, e.g. `wallet_sendCalls`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The method parameters.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// The origin of the requester.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The undecoded request.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Decodes the first positional parameter, which is where EIP-1193 methods carry their
    /// payload.
    pub fn decode_params<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        let param = match &self.params {
            Value::Array(params) => params.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };
        serde_json::from_value(param)
            .map_err(|err| RequestError::Malformed(format!("{}: {err}", self.method)))
    }
}

/// Status of a queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestStatus {
    /// Awaiting a human decision.
    Pending,
    /// Approved, the wallet is executing it.
    Responding,
}

/// A request held by the remote request queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// The request.
    pub request: Request,
    /// Where the request is in its lifecycle.
    pub status: RequestStatus,
}

impl QueuedRequest {
    /// Wraps a freshly received request.
    pub fn pending(request: Request) -> Self {
        Self { request, status: RequestStatus::Pending }
    }

    /// The id of the queued request.
    pub fn id(&self) -> &RequestId {
        self.request.id()
    }
}
