use servertag_core_types::RequestId;
use thiserror::Error;

/// Result type alias using ServerTagError
pub type Result<T> = std::result::Result<T, ServerTagError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and external API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    InvalidHostName,
    InvalidTagName,
    InvalidInput,
    InvalidConfig,

    // Lookup
    NotFound,

    // Storage boundary
    Conflict,
    Persistence,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidHostName => "ERR_INVALID_HOST_NAME",
            ExErrorKind::InvalidTagName => "ERR_INVALID_TAG_NAME",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// HTTP status the web layer reports for this kind
    pub fn http_status(&self) -> u16 {
        match self {
            ExErrorKind::InvalidHostName
            | ExErrorKind::InvalidTagName
            | ExErrorKind::InvalidInput => 400,
            ExErrorKind::NotFound => 404,
            ExErrorKind::Conflict => 409,
            ExErrorKind::InvalidConfig
            | ExErrorKind::Persistence
            | ExErrorKind::Io
            | ExErrorKind::Serialization
            | ExErrorKind::Internal => 500,
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// context (operation, entity, correlation ids) needed for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (host or tag name)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for ServerTag operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServerTagError {
    // ===== Validation Errors =====
    /// Host name does not match `[a-z0-9-]+`
    #[error("Invalid hostname specified: '{name}'")]
    InvalidHostName { name: String },

    /// Tag name does not match `[A-Za-z0-9\-_:]+`
    #[error("Invalid tag name specified: '{name}'")]
    InvalidTagName { name: String },

    /// Request origin did not name a client
    #[error("Client name may not be empty")]
    EmptyClient,

    /// An add request named no tags
    #[error("No tags specified")]
    EmptyTagList,

    /// Server configuration is unusable
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ===== Lookup Errors =====
    #[error("No such host: '{name}'")]
    HostNotFound { name: String },

    // ===== Storage Boundary Errors =====
    /// Stored version advanced since the host was read
    #[error("Version conflict on host '{host_name}': expected {expected:?}, found {actual:?}")]
    Conflict {
        host_name: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// The storage backend failed for a reason other than a version conflict
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    // ===== Generic Errors =====
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ServerTagError {
    /// Whether the calling workflow may retry by re-reading and re-applying
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServerTagError::Conflict { .. })
    }
}

impl From<ServerTagError> for ExError {
    fn from(err: ServerTagError) -> Self {
        let message = err.to_string();
        match err {
            ServerTagError::InvalidHostName { name } => ExError::new(ExErrorKind::InvalidHostName)
                .with_entity_id(name)
                .with_message(message),

            ServerTagError::InvalidTagName { name } => ExError::new(ExErrorKind::InvalidTagName)
                .with_entity_id(name)
                .with_message(message),

            ServerTagError::EmptyClient | ServerTagError::EmptyTagList => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }

            ServerTagError::InvalidConfig { .. } => ExError::new(ExErrorKind::InvalidConfig)
                .with_op("load_config")
                .with_message(message),

            ServerTagError::HostNotFound { name } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(name)
                .with_message(message),

            ServerTagError::Conflict { host_name, .. } => ExError::new(ExErrorKind::Conflict)
                .with_entity_id(host_name)
                .with_message(message),

            ServerTagError::Persistence { .. } => {
                ExError::new(ExErrorKind::Persistence).with_message(message)
            }

            ServerTagError::Io { path, .. } => ExError::new(ExErrorKind::Io)
                .with_entity_id(path)
                .with_message(message),

            ServerTagError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            ServerTagError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for ServerTagError {
    fn from(err: serde_json::Error) -> Self {
        ServerTagError::Serialization {
            message: err.to_string(),
        }
    }
}
