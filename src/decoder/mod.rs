//! # Bean Decoder
//!
//! The decoder walks the mapping graph against a payload and builds the
//! described objects.
//!
//! ## Algorithm
//!
//! Each slot is resolved by the kind of its source:
//!
//! 1. **Null** slots produce [`Instance::Null`] without any lookup.
//! 2. **Meta** slots read a discriminator (from the payload or a scope),
//!    convert it, pick the registered dependency and decode that. A value
//!    without a registered mapping fails; a null discriminator gives null.
//! 3. **Mapping** slots decode a nested bean, either from the sub-object
//!    under the slot's parameter name or from the current payload.
//! 4. **Static** slots convert their constant.
//! 5. **Parameter** slots read a raw value by name from the payload or
//!    their scope and convert it. Collection types read whole sequences.
//!
//! Beans are built by invoking their constructor or factory with the decoded
//! arguments and then assigning every settable property. Collection and map
//! beans additionally decode their elements, either from a named member of
//! the payload object ("object mode") or from the payload itself ("simple
//! mode").
//!
//! A bean that declares no structure and finds no data decodes to null, as
//! does a bean whose constructor arguments all come out null.
//!
//! ## Errors
//!
//! Every failure reaches the caller as a [`BeanDecoderError`] whose
//! [`kind`](BeanDecoderError::kind) classifies the innermost cause. Shape
//! errors carry a template of the accepted payload, for instance:
//!
//! ```text
//! expected: { "<property>": <object | value>, ... }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use brutos::decoder::{BeanDecoder, JsonBeanDecoder};
//! use brutos::mapping::{Bean, ClassDef, Dependency, Entity, MappingGraph};
//! use brutos::scope::Scopes;
//! use brutos::types::{IntegerType, TextType};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let graph = MappingGraph::builder()
//!     .class(ClassDef::record("Person"))
//!     .bean(Bean::new("person", "Person")
//!         .property("name", Dependency::param("name", Arc::new(TextType)))
//!         .property("age", Dependency::param("age", Arc::new(IntegerType::default()))))
//!     .build()?;
//!
//! let decoder = JsonBeanDecoder::new(Arc::new(graph));
//! let person = decoder.decode(
//!     &Entity::mapping("person"),
//!     &json!({"name": "Ana", "age": "31"}),
//!     &Scopes::new(),
//! )?;
//! let person = person.as_object().unwrap();
//! assert_eq!(person.property("age").and_then(|v| v.as_i64()), Some(31));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod core;
mod error;
mod presence;

pub use error::{BeanDecoderError, DecodeError, ErrorKind};

use crate::ids::DecodeId;
use crate::instance::Instance;
use crate::mapping::{Entity, MappingGraph};
use crate::runtime_config::RuntimeConfig;
use crate::scope::Scopes;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Decodes one binding slot from a payload.
pub trait BeanDecoder: Send + Sync {
    fn decode(&self, entity: &Entity, data: &Value, scopes: &Scopes)
        -> Result<Instance, BeanDecoderError>;
}

/// [`BeanDecoder`] over JSON-shaped payloads (`serde_json::Value`).
#[derive(Debug, Clone)]
pub struct JsonBeanDecoder {
    graph: Arc<MappingGraph>,
    config: RuntimeConfig,
}

impl JsonBeanDecoder {
    /// Decoder configured from the environment.
    #[must_use]
    pub fn new(graph: Arc<MappingGraph>) -> Self {
        Self::with_config(graph, RuntimeConfig::from_env())
    }

    #[must_use]
    pub fn with_config(graph: Arc<MappingGraph>, config: RuntimeConfig) -> Self {
        Self { graph, config }
    }

    #[must_use]
    pub fn graph(&self) -> &MappingGraph {
        &self.graph
    }

    #[must_use]
    pub fn config(&self) -> RuntimeConfig {
        self.config
    }

    /// Decode the whole payload with the named bean.
    pub fn decode_bean(
        &self,
        bean: &str,
        data: &Value,
        scopes: &Scopes,
    ) -> Result<Instance, BeanDecoderError> {
        self.decode(&Entity::mapping(bean), data, scopes)
    }
}

impl BeanDecoder for JsonBeanDecoder {
    fn decode(
        &self,
        entity: &Entity,
        data: &Value,
        scopes: &Scopes,
    ) -> Result<Instance, BeanDecoderError> {
        let id = DecodeId::new();
        let label = entity.label();
        let span = debug_span!("decode", decode_id = %id, entity = %label);
        let _guard = span.enter();

        let mut walk = core::Walk::new(&self.graph, scopes, self.config.max_decode_depth);
        match walk.entity(entity, data) {
            Ok(value) => {
                debug!(result = %value, "decoded");
                Ok(value)
            }
            Err(cause) => {
                debug!(error = %cause, kind = ?cause.kind(), "decode failed");
                Err(BeanDecoderError::new(label, cause))
            }
        }
    }
}
