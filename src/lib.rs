//! # Brutos
//!
//! **Brutos** binds request payloads to constructed domain objects. A
//! declarative mapping graph describes classes, beans (how one object is
//! built and populated), nested beans, polymorphic dispatch and containers;
//! the decoder walks that graph against a JSON-shaped payload and request
//! scopes and produces dynamic [`Instance`] values.
//!
//! ## Architecture
//!
//! - **[`types`]** - target types and conversion of raw values
//! - **[`instance`]** - the dynamic object model produced by decoding
//! - **[`mapping`]** - classes, beans, dependencies, the validated graph and
//!   the YAML/JSON document loader
//! - **[`scope`]** - request, session, header and other value sources
//! - **[`decoder`]** - the recursive bean decoder
//! - **[`action`]** - binding every parameter of a controller action
//! - **[`payload`]** - JSON and form bodies into payload values
//! - **[`validator`]** - graph validation issues
//! - **[`logging`]**, **[`runtime_config`]**, **[`ids`]** - ambient plumbing
//! - **[`cli`]** - the `brutos` command-line tool
//!
//! ### Decode Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Action as ActionMapping
//!     participant Decoder as JsonBeanDecoder
//!     participant Graph as MappingGraph
//!     participant Scopes
//!     participant Types as Type
//!
//!     Caller->>Action: bind(decoder, payload, scopes)
//!     loop every parameter
//!         Action->>Decoder: decode(entity, payload, scopes)
//!         Decoder->>Graph: bean(name)
//!         Decoder->>Decoder: constructor args, properties, elements
//!         Decoder->>Scopes: get(name) for non-param slots
//!         Decoder->>Types: convert(raw)
//!         Decoder-->>Action: Instance
//!     end
//!     Action-->>Caller: Vec<Instance>
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brutos::decoder::JsonBeanDecoder;
//! use brutos::mapping::load::MappingDocument;
//! use brutos::scope::Scopes;
//! use brutos::types::TypeRegistry;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let graph = MappingDocument::from_yaml(r#"
//! classes: [{ name: Person }]
//! beans:
//!   - name: person
//!     class: Person
//!     properties:
//!       - { name: name, param: name }
//!       - { name: age, param: age, type: int }
//! "#)?
//! .into_graph(TypeRegistry::builtin())?;
//!
//! let decoder = JsonBeanDecoder::new(Arc::new(graph));
//! let person = decoder.decode_bean("person", &json!({"name": "Ana", "age": 31}), &Scopes::new())?;
//! assert_eq!(person.to_json()["age"], 31);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BRUTOS_MAX_DECODE_DEPTH` | `64` | maximum bean nesting per decode call |
//! | `BRUTOS_LOG_LEVEL` | `warn` | log level of the `brutos` binary |
//! | `BRUTOS_LOG_FORMAT` | `pretty` | `json` or `pretty` |

pub mod action;
pub mod cli;
pub mod decoder;
pub mod ids;
pub mod instance;
pub mod logging;
pub mod mapping;
pub mod payload;
pub mod runtime_config;
pub mod scope;
pub mod types;
pub mod validator;

pub use action::{ActionMapping, BindError};
pub use decoder::{BeanDecoder, BeanDecoderError, DecodeError, ErrorKind, JsonBeanDecoder};
pub use instance::{Instance, Object};
pub use mapping::load::{load_mapping, MappingDocument};
pub use mapping::{MappingError, MappingGraph};
pub use scope::{MapScope, Scope, ScopeType, Scopes};
