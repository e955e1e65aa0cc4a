#![allow(dead_code)]

use brutos::decoder::JsonBeanDecoder;
use brutos::mapping::{Bean, ClassDef, Dependency, MappingGraph};
use brutos::runtime_config::RuntimeConfig;
use brutos::types::{IntegerType, TextType, TypeRef};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub fn text() -> TypeRef {
    Arc::new(TextType)
}

pub fn int() -> TypeRef {
    Arc::new(IntegerType::default())
}

/// Decoder with default limits, independent of the environment.
pub fn decoder(graph: MappingGraph) -> JsonBeanDecoder {
    JsonBeanDecoder::with_config(Arc::new(graph), RuntimeConfig::default())
}

/// `person { name, age, address -> address { street, city } }`, hierarchical.
pub fn people_graph() -> MappingGraph {
    MappingGraph::builder()
        .class(ClassDef::record("Person"))
        .class(ClassDef::record("Address"))
        .bean(
            Bean::new("address", "Address")
                .property("street", Dependency::param("street", text()))
                .property("city", Dependency::param("city", text())),
        )
        .bean(
            Bean::new("person", "Person")
                .hierarchy(true)
                .property("name", Dependency::param("name", text()))
                .property("age", Dependency::param("age", int()))
                .property("address", Dependency::mapping("address", Some("address"))),
        )
        .build()
        .unwrap()
}

pub mod temp_files {
    use super::*;

    /// Creates a temporary file with the given extension; the file is
    /// removed when the handle drops.
    pub fn create_temp(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brutos_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp(content, "json")
    }

    pub fn path_of(file: &NamedTempFile) -> PathBuf {
        file.path().to_path_buf()
    }
}
