use crate::scope::ScopeType;
use crate::types::ConversionError;
use std::error::Error;
use std::fmt;

/// Coarse classification of a decode failure, taken from the innermost
/// cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The payload does not have the shape the mapping expects.
    Shape,
    /// A discriminator value has no registered mapping.
    MappingNotFound,
    /// The mapping graph refers to something missing or inconsistent.
    Configuration,
    /// A constructor, factory or setter failed.
    Construction,
    Conversion,
    /// A scope was requested but no provider is registered for it.
    Scope,
    /// The nesting limit was reached.
    Depth,
}

/// Failure inside one decode call.
#[derive(Debug)]
pub enum DecodeError {
    /// Payload shape mismatch; `message` usually reads
    /// `expected: <template>`.
    Shape {
        message: String,
        cause: Option<Box<DecodeError>>,
    },
    MappingNotFound {
        discriminator: String,
    },
    BeanNotFound(String),
    FactoryNotFound(String),
    ClassNotFound(String),
    Construction {
        bean: String,
        cause: anyhow::Error,
    },
    InfiniteLoop(String),
    Conversion(ConversionError),
    ScopeNotFound(ScopeType),
    DepthExceeded(usize),
}

impl DecodeError {
    pub fn shape(message: impl Into<String>) -> Self {
        DecodeError::Shape {
            message: message.into(),
            cause: None,
        }
    }

    /// `expected: <template>` wrapping the failure that prompted it.
    pub fn expected(template: &str, cause: DecodeError) -> Self {
        DecodeError::Shape {
            message: format!("expected: {template}"),
            cause: Some(Box::new(cause)),
        }
    }

    /// The innermost error of the chain.
    #[must_use]
    pub fn root(&self) -> &DecodeError {
        match self {
            DecodeError::Shape {
                cause: Some(cause), ..
            } => cause.root(),
            DecodeError::Construction { cause, .. } => cause
                .chain()
                .filter_map(|e| e.downcast_ref::<DecodeError>())
                .last()
                .map_or(self, DecodeError::root),
            _ => self,
        }
    }

    /// Classification of this error alone, ignoring causes.
    #[must_use]
    pub fn own_kind(&self) -> ErrorKind {
        match self {
            DecodeError::Shape { .. } => ErrorKind::Shape,
            DecodeError::MappingNotFound { .. } => ErrorKind::MappingNotFound,
            DecodeError::BeanNotFound(_)
            | DecodeError::FactoryNotFound(_)
            | DecodeError::ClassNotFound(_)
            | DecodeError::InfiniteLoop(_) => ErrorKind::Configuration,
            DecodeError::Construction { .. } => ErrorKind::Construction,
            DecodeError::Conversion(_) => ErrorKind::Conversion,
            DecodeError::ScopeNotFound(_) => ErrorKind::Scope,
            DecodeError::DepthExceeded(_) => ErrorKind::Depth,
        }
    }

    /// Classification of the innermost cause.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.root().own_kind()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Shape { message, .. } => write!(f, "{message}"),
            DecodeError::MappingNotFound { discriminator } => {
                write!(f, "bean not found: {discriminator}")
            }
            DecodeError::BeanNotFound(name) => write!(f, "unknown bean: {name}"),
            DecodeError::FactoryNotFound(name) => write!(f, "bean factory not found: {name}"),
            DecodeError::ClassNotFound(name) => write!(f, "unknown class: {name}"),
            DecodeError::Construction { bean, .. } => write!(f, "create instance failed: {bean}"),
            DecodeError::InfiniteLoop(bean) => write!(f, "infinite loop detected: {bean}"),
            DecodeError::Conversion(e) => write!(f, "{e}"),
            DecodeError::ScopeNotFound(scope) => write!(f, "scope not registered: {scope}"),
            DecodeError::DepthExceeded(limit) => {
                write!(f, "maximum decode depth of {limit} exceeded")
            }
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeError::Shape {
                cause: Some(cause), ..
            } => Some(&**cause),
            DecodeError::Construction { cause, .. } => Some(&**cause),
            DecodeError::Conversion(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConversionError> for DecodeError {
    fn from(e: ConversionError) -> Self {
        DecodeError::Conversion(e)
    }
}

/// Wrap a failure as a shape error carrying `template`.
pub(crate) fn expecting<T>(template: &str, result: Result<T, DecodeError>) -> Result<T, DecodeError> {
    result.map_err(|cause| DecodeError::expected(template, cause))
}

/// The uniform failure returned by [`crate::decoder::BeanDecoder::decode`].
#[derive(Debug)]
pub struct BeanDecoderError {
    entity: String,
    cause: DecodeError,
}

impl BeanDecoderError {
    pub(crate) fn new(entity: impl Into<String>, cause: DecodeError) -> Self {
        Self {
            entity: entity.into(),
            cause,
        }
    }

    /// Label of the entity being decoded.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The error raised beneath the entry point.
    #[must_use]
    pub fn cause(&self) -> &DecodeError {
        &self.cause
    }

    /// Classification of the innermost cause.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    /// Every message of the cause chain, outermost first.
    #[must_use]
    pub fn chain_messages(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut next: Option<&(dyn Error + 'static)> = Some(&self.cause);
        while let Some(err) = next {
            messages.push(err.to_string());
            next = err.source();
        }
        messages
    }
}

impl fmt::Display for BeanDecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode {}", self.entity)
    }
}

impl Error for BeanDecoderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}
