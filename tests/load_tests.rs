mod common;

use brutos::decoder::{BeanDecoder, JsonBeanDecoder};
use brutos::instance::Instance;
use brutos::mapping::load::{load_mapping, load_mapping_with, MappingDocument};
use brutos::runtime_config::RuntimeConfig;
use brutos::scope::{MapScope, ScopeType, Scopes};
use brutos::types::{FloatType, TypeRegistry};
use common::temp_files::{create_temp_json, create_temp_yaml, path_of};
use serde_json::json;
use std::sync::Arc;

const SHOP: &str = r#"
classes:
  - name: Order
  - name: Lines
    kind: list
  - name: Line
    constructor: [sku, quantity]
  - name: Customer
  - name: Company
beans:
  - name: order
    class: Order
    hierarchy: true
    properties:
      - { name: id, param: id, type: int }
      - { name: placed, param: placed, type: "date(dd/MM/yyyy)" }
      - { name: status, param: status, type: "enum(OPEN,PAID):string" }
      - { name: lines, mapping: lines, param: lines }
      - name: buyer
        param: buyer
        meta:
          param: buyer_type
          values:
            person: { mapping: customer, param: buyer }
            company: { mapping: company, param: buyer }
      - { name: channel, value: web, read_only: true }
      - { name: clerk, param: clerk, scope: session }
  - name: lines
    class: Lines
    element: { mapping: line }
  - name: line
    class: Line
    args:
      - { param: sku }
      - { param: quantity, type: int }
  - name: customer
    class: Customer
    properties:
      - { name: name, param: name }
  - name: company
    class: Company
    properties:
      - { name: vat, param: vat }
actions:
  - name: checkout
    parameters:
      - { mapping: order, param: order }
      - { nullable: true }
"#;

fn decoder_for(path: &std::path::Path) -> JsonBeanDecoder {
    let graph = load_mapping(path).unwrap();
    JsonBeanDecoder::with_config(Arc::new(graph), RuntimeConfig::default())
}

#[test]
fn test_document_drives_decoding() {
    let file = create_temp_yaml(SHOP);
    let decoder = decoder_for(&path_of(&file));
    let scopes = Scopes::new().with(ScopeType::Session, MapScope::new().with("clerk", json!("zoe")));

    let payload = json!({
        "id": "100",
        "placed": "05/02/2024",
        "status": "PAID",
        "lines": [{"sku": "A1", "quantity": "2"}, {"sku": "B2"}],
        "buyer_type": "company",
        "buyer": {"vat": "PT123"},
        "channel": "ignored"
    });
    let order = decoder.decode_bean("order", &payload, &scopes).unwrap();
    let order = order.as_object().unwrap();

    assert_eq!(order.property("id"), Some(&Instance::Int(100)));
    let placed = order.property("placed").map(Instance::to_string).unwrap();
    assert!(placed.starts_with("2024-02-05"), "{placed}");
    assert_eq!(order.property("status").and_then(Instance::as_str), Some("PAID"));
    assert_eq!(order.property("channel"), None);
    assert_eq!(order.property("clerk"), Some(&Instance::from("zoe")));

    let lines = order.property("lines").unwrap().as_object().unwrap();
    let lines = lines.elements().unwrap();
    assert_eq!(lines.len(), 2);
    let second = lines[1].as_object().unwrap();
    assert_eq!(second.property("sku"), Some(&Instance::from("B2")));
    assert_eq!(second.property("quantity"), Some(&Instance::Null));

    let buyer = order.property("buyer").unwrap().as_object().unwrap();
    assert_eq!(buyer.class(), "Company");
    assert_eq!(buyer.property("vat"), Some(&Instance::from("PT123")));
}

#[test]
fn test_document_action_binding() {
    let file = create_temp_yaml(SHOP);
    let graph = load_mapping(path_of(&file)).unwrap();
    let action = graph.action("checkout").unwrap().clone();
    let decoder = JsonBeanDecoder::with_config(Arc::new(graph), RuntimeConfig::default());
    let scopes = Scopes::new().with(ScopeType::Session, MapScope::new());

    let args = action
        .bind(&decoder, &json!({"order": {"id": 1}}), &scopes)
        .unwrap();
    assert_eq!(args.len(), 2);
    assert_eq!(
        args[0].as_object().and_then(|o| o.property("id")),
        Some(&Instance::Int(1))
    );
    assert!(args[1].is_null());
}

#[test]
fn test_json_document() {
    let file = create_temp_json(
        r#"{
            "classes": [{"name": "Point", "constructor": ["x", "y"]}],
            "beans": [{"name": "point", "class": "Point",
                       "args": [{"param": "x", "type": "int"}, {"param": "y", "type": "int"}]}]
        }"#,
    );
    let decoder = decoder_for(&path_of(&file));
    let point = decoder
        .decode(
            &brutos::mapping::Entity::mapping("point"),
            &json!({"x": 1, "y": 2}),
            &Scopes::new(),
        )
        .unwrap();
    assert_eq!(point.to_json(), json!({"@class": "Point", "x": 1, "y": 2}));
}

#[test]
fn test_custom_registry_types() {
    let mut types = TypeRegistry::with_builtins();
    types.register("money", Arc::new(FloatType));
    let file = create_temp_yaml(
        r#"
classes: [{ name: Price }]
beans:
  - name: price
    class: Price
    properties:
      - { name: amount, param: amount, type: money }
"#,
    );
    assert!(load_mapping(path_of(&file)).is_err());
    let graph = load_mapping_with(path_of(&file), &types).unwrap();
    assert!(graph.bean("price").is_some());
}

#[test]
fn test_unknown_document_fields_rejected() {
    let err = MappingDocument::from_yaml("beans: []\nroutes: []\n").unwrap_err();
    assert!(format!("{err:#}").contains("routes"));
}
