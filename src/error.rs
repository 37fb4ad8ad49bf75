use thiserror::Error;

use crate::construct::{ConstructRef, TopicId};
use crate::locator::Locator;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopicMapError {
    #[error("Model constraint violated by {reporter}: {message}")]
    ModelConstraint { reporter: ConstructRef, message: String },
    #[error("Identity constraint violated by {reporter}: {locator} already identifies {existing}")]
    IdentityConstraint {
        reporter: ConstructRef,
        existing: ConstructRef,
        locator: Locator,
    },
    #[error("Topic {topic} is in use and cannot be removed")]
    TopicInUse { topic: TopicId },
    #[error("A topic map is already bound to {locator}")]
    TopicMapExists { locator: Locator },
    #[error("Malformed IRI '{iri}': {reason}")]
    MalformedIri { iri: String, reason: String },
    #[error("Feature not recognized: {0}")]
    FeatureNotRecognized(String),
    #[error("Feature not supported: {0}")]
    FeatureNotSupported(String),
    #[error("'{lexical}' is not a valid literal of datatype {datatype}")]
    InvalidLiteral { lexical: String, datatype: Locator },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, TopicMapError>;

impl TopicMapError {
    pub(crate) fn model(reporter: impl Into<ConstructRef>, message: impl Into<String>) -> Self {
        Self::ModelConstraint {
            reporter: reporter.into(),
            message: message.into(),
        }
    }
    pub(crate) fn identity(
        reporter: impl Into<ConstructRef>,
        existing: impl Into<ConstructRef>,
        locator: &Locator,
    ) -> Self {
        Self::IdentityConstraint {
            reporter: reporter.into(),
            existing: existing.into(),
            locator: locator.clone(),
        }
    }
    /// True for every member of the model constraint family, which includes
    /// identity collisions and blocked topic removals.
    pub fn is_model_constraint(&self) -> bool {
        matches!(
            self,
            Self::ModelConstraint { .. } | Self::IdentityConstraint { .. } | Self::TopicInUse { .. }
        )
    }
    /// The construct that reported the violation, if any.
    pub fn reporter(&self) -> Option<ConstructRef> {
        match self {
            Self::ModelConstraint { reporter, .. } => Some(*reporter),
            Self::IdentityConstraint { reporter, .. } => Some(*reporter),
            Self::TopicInUse { topic } => Some(ConstructRef::Topic(*topic)),
            _ => None,
        }
    }
}

// Helper conversions
impl From<config::ConfigError> for TopicMapError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for TopicMapError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Lock(e.to_string())
    }
}
