use crate::model::{EntityReference, ItemType, Location};
use geodelta_core_types::RequestId;
use thiserror::Error;

/// Result type alias using GeoDeltaError
pub type Result<T> = std::result::Result<T, GeoDeltaError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers and tests can match
/// on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdErrorKind {
    // Diff
    /// Comparing one before/after entity pair failed; wraps the cause
    ComparisonFailure,
    /// A relation claims a member that does not list it back (or vice versa)
    RelationConsistencyViolation,

    // Change application
    /// Relation-of-relation resolution did not converge
    RelationCycleOverflow,
    InvalidItemType,
    IllegalMemberMutation,

    // Structural/Validation
    InvalidInput,
    InvalidGeometry,
    DuplicateEntity,
    DanglingReference,
    NotFound,

    // Integration/IO
    Serialization,
    Io,
    Config,

    // Internal
    Internal,
}

impl GdErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            GdErrorKind::ComparisonFailure => "ERR_COMPARISON_FAILURE",
            GdErrorKind::RelationConsistencyViolation => "ERR_RELATION_CONSISTENCY_VIOLATION",
            GdErrorKind::RelationCycleOverflow => "ERR_RELATION_CYCLE_OVERFLOW",
            GdErrorKind::InvalidItemType => "ERR_INVALID_ITEM_TYPE",
            GdErrorKind::IllegalMemberMutation => "ERR_ILLEGAL_MEMBER_MUTATION",
            GdErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            GdErrorKind::InvalidGeometry => "ERR_INVALID_GEOMETRY",
            GdErrorKind::DuplicateEntity => "ERR_DUPLICATE_ENTITY",
            GdErrorKind::DanglingReference => "ERR_DANGLING_REFERENCE",
            GdErrorKind::NotFound => "ERR_NOT_FOUND",
            GdErrorKind::Serialization => "ERR_SERIALIZATION",
            GdErrorKind::Io => "ERR_IO",
            GdErrorKind::Config => "ERR_CONFIG",
            GdErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context: the operation that
/// failed, the entity it failed on, the counterpart entity for pairwise
/// comparisons, and the batch request id when raised under a run.
#[derive(Debug, Clone)]
pub struct GdError {
    kind: GdErrorKind,
    op: Option<String>,
    entity: Option<String>,
    counterpart: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<GdError>>,
}

impl GdError {
    /// Create a new error with the specified kind
    pub fn new(kind: GdErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            counterpart: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the entity this error is about
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Add the other side of a pairwise comparison
    pub fn with_counterpart(mut self, counterpart: impl Into<String>) -> Self {
        self.counterpart = Some(counterpart.into());
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

    /// Wrap an underlying error
    pub fn with_source(mut self, source: GdError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> GdErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn counterpart(&self) -> Option<&str> {
        self.counterpart.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the wrapped error, if any
    pub fn source_error(&self) -> Option<&GdError> {
        self.source.as_deref()
    }

    /// Walk the source chain down to the innermost error
    pub fn root_cause(&self) -> &GdError {
        let mut current = self;
        while let Some(next) = current.source.as_deref() {
            current = next;
        }
        current
    }
}

impl std::fmt::Display for GdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " (entity: {})", entity)?;
        }
        if let Some(counterpart) = &self.counterpart {
            write!(f, " (counterpart: {})", counterpart)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, ", caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for GdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Typed errors raised by the model, snapshot builder and change-set layers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoDeltaError {
    // ===== Snapshot construction =====
    /// The same (type, identifier) was added twice to one builder
    #[error("Duplicate {item_type} {identifier}")]
    DuplicateEntity { item_type: ItemType, identifier: i64 },

    /// A relation member does not exist in the snapshot being built
    #[error("Relation {relation} references missing member {member}")]
    DanglingReference {
        relation: i64,
        member: EntityReference,
    },

    /// An edge endpoint has no node at its location
    #[error("Edge {edge} has no node at its {end} location {location}")]
    MissingEdgeEndpoint {
        edge: i64,
        end: &'static str,
        location: Location,
    },

    /// Geometry is malformed or of the wrong kind for the item type
    #[error("Invalid geometry for {item_type} {identifier}: {reason}")]
    InvalidGeometry {
        item_type: ItemType,
        identifier: i64,
        reason: String,
    },

    // ===== Relation membership =====
    /// A parent relation does not list the entity that points back to it
    #[error("Relation {relation} does not contain member {member}")]
    RelationConsistencyViolation {
        relation: i64,
        member: EntityReference,
    },

    // ===== Change items =====
    /// An item type is not valid on this code path
    #[error("Invalid item type {item_type}: {reason}")]
    InvalidItemType { item_type: ItemType, reason: String },

    /// Geometry set on a relation change or members set on a simple change
    #[error("Cannot set {attempted} on {item_type} change {identifier}")]
    IllegalMemberMutation {
        item_type: ItemType,
        identifier: i64,
        attempted: &'static str,
    },

    /// Change score is NaN or outside [0, 1]
    #[error("Invalid score {score} for {item_type} change {identifier}")]
    InvalidScore {
        item_type: ItemType,
        identifier: i64,
        score: f64,
    },

    // ===== Generic =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<serde_json::Error> for GeoDeltaError {
    fn from(err: serde_json::Error) -> Self {
        GeoDeltaError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from GeoDeltaError to GdError
///
/// Entity-bearing variants keep their identity in the `entity` field.
impl From<GeoDeltaError> for GdError {
    fn from(err: GeoDeltaError) -> Self {
        let message = err.to_string();
        match err {
            GeoDeltaError::DuplicateEntity {
                item_type,
                identifier,
            } => GdError::new(GdErrorKind::DuplicateEntity)
                .with_entity(EntityReference::new(item_type, identifier).to_string())
                .with_message(message),

            GeoDeltaError::DanglingReference { relation, member } => {
                GdError::new(GdErrorKind::DanglingReference)
                    .with_entity(EntityReference::new(ItemType::Relation, relation).to_string())
                    .with_counterpart(member.to_string())
                    .with_message(message)
            }

            GeoDeltaError::MissingEdgeEndpoint { edge, .. } => {
                GdError::new(GdErrorKind::DanglingReference)
                    .with_entity(EntityReference::new(ItemType::Edge, edge).to_string())
                    .with_message(message)
            }

            GeoDeltaError::InvalidGeometry {
                item_type,
                identifier,
                ..
            } => GdError::new(GdErrorKind::InvalidGeometry)
                .with_entity(EntityReference::new(item_type, identifier).to_string())
                .with_message(message),

            GeoDeltaError::RelationConsistencyViolation { relation, member } => {
                GdError::new(GdErrorKind::RelationConsistencyViolation)
                    .with_entity(member.to_string())
                    .with_counterpart(EntityReference::new(ItemType::Relation, relation).to_string())
                    .with_message(message)
            }

            GeoDeltaError::InvalidItemType { .. } => {
                GdError::new(GdErrorKind::InvalidItemType).with_message(message)
            }

            GeoDeltaError::IllegalMemberMutation {
                item_type,
                identifier,
                ..
            } => GdError::new(GdErrorKind::IllegalMemberMutation)
                .with_entity(EntityReference::new(item_type, identifier).to_string())
                .with_message(message),

            GeoDeltaError::InvalidScore {
                item_type,
                identifier,
                ..
            } => GdError::new(GdErrorKind::InvalidInput)
                .with_entity(EntityReference::new(item_type, identifier).to_string())
                .with_message(message),

            GeoDeltaError::Serialization { .. } => {
                GdError::new(GdErrorKind::Serialization).with_message(message)
            }

            GeoDeltaError::Io { .. } => GdError::new(GdErrorKind::Io).with_message(message),

            GeoDeltaError::Internal { .. } => {
                GdError::new(GdErrorKind::Internal).with_message(message)
            }
        }
    }
}
