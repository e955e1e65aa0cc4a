//! # Action Binding
//!
//! An action mapping lists the parameters of one controller action. Binding
//! decodes each parameter against the request payload and scopes, producing
//! the invocation arguments in order. The first failing parameter aborts
//! binding.

use crate::decoder::{BeanDecoder, BeanDecoderError};
use crate::instance::Instance;
use crate::mapping::Entity;
use crate::scope::Scopes;
use serde_json::Value;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ActionMapping {
    pub name: String,
    pub parameters: Vec<Entity>,
}

impl ActionMapping {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn parameter(mut self, entity: Entity) -> Self {
        self.parameters.push(entity);
        self
    }

    /// Decode every parameter in declaration order.
    pub fn bind(
        &self,
        decoder: &dyn BeanDecoder,
        payload: &Value,
        scopes: &Scopes,
    ) -> Result<Vec<Instance>, BindError> {
        let mut args = Vec::with_capacity(self.parameters.len());
        for (index, entity) in self.parameters.iter().enumerate() {
            let value = decoder
                .decode(entity, payload, scopes)
                .map_err(|source| BindError {
                    action: self.name.clone(),
                    index,
                    parameter: entity.label(),
                    source,
                })?;
            args.push(value);
        }
        debug!(action = %self.name, parameters = args.len(), "action parameters bound");
        Ok(args)
    }
}

/// A parameter of an action failed to decode.
#[derive(Debug)]
pub struct BindError {
    pub action: String,
    pub index: usize,
    pub parameter: String,
    pub source: BeanDecoderError,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action {}: parameter #{} ({}) could not be bound",
            self.action, self.index, self.parameter
        )
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
