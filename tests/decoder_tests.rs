mod common;

use brutos::decoder::{BeanDecoder, ErrorKind, JsonBeanDecoder};
use brutos::instance::{Instance, Object};
use brutos::mapping::{Bean, ClassDef, Dependency, Entity, MappingGraph, MetaBean};
use brutos::runtime_config::RuntimeConfig;
use brutos::scope::{MapScope, ScopeType, Scopes};
use brutos::types::{CollectionType, EnumType, EnumerationType};
use common::{decoder, int, people_graph, text};
use serde_json::{json, Value};
use std::sync::Arc;

fn object(value: &Instance) -> &Object {
    value.as_object().expect("expected an object instance")
}

#[test]
fn test_bean_without_structure_decodes_to_null() {
    let graph = MappingGraph::builder()
        .class(ClassDef::record("Marker"))
        .bean(Bean::new("marker", "Marker"))
        .build()
        .unwrap();
    let decoder = decoder(graph);
    for payload in [json!({}), json!({"anything": 1})] {
        let value = decoder.decode_bean("marker", &payload, &Scopes::new()).unwrap();
        assert_eq!(value, Instance::Null);
    }
}

#[test]
fn test_constructor_arguments_all_null_suppress_instance() {
    let graph = MappingGraph::builder()
        .class(ClassDef::record("Point").with_constructor(["x", "y"]))
        .bean(
            Bean::new("point", "Point")
                .arg(Dependency::param("x", int()))
                .arg(Dependency::param("y", int())),
        )
        .build()
        .unwrap();
    let decoder = decoder(graph);
    let scopes = Scopes::new();

    let none = decoder.decode_bean("point", &json!({"z": 1}), &scopes).unwrap();
    assert!(none.is_null());

    let some = decoder.decode_bean("point", &json!({"y": "2"}), &scopes).unwrap();
    let point = object(&some);
    assert_eq!(point.property("x"), Some(&Instance::Null));
    assert_eq!(point.property("y"), Some(&Instance::Int(2)));
}

#[test]
fn test_explicit_null_argument_counts_as_present() {
    let graph = MappingGraph::builder()
        .class(ClassDef::record("Pair").with_constructor(["left", "right"]))
        .bean(
            Bean::new("pair", "Pair")
                .arg(Dependency::null(text()))
                .arg(Dependency::param("right", text())),
        )
        .build()
        .unwrap();
    let value = decoder(graph)
        .decode_bean("pair", &json!({}), &Scopes::new())
        .unwrap();
    assert_eq!(object(&value).class(), "Pair");
}

#[test]
fn test_properties_round_trip() {
    let decoder = decoder(people_graph());
    let scopes = Scopes::new();
    let payload = json!({
        "name": "Ana",
        "age": 31,
        "address": {"street": "Rua Augusta", "city": "Lisbon"}
    });

    let first = decoder.decode_bean("person", &payload, &scopes).unwrap();
    let mut encoded = first.to_json();
    strip_class_markers(&mut encoded);
    assert_eq!(encoded, payload);

    let second = decoder.decode_bean("person", &encoded, &scopes).unwrap();
    assert_eq!(first, second);
}

fn strip_class_markers(value: &mut Value) {
    if let Value::Object(members) = value {
        members.remove("@class");
        for member in members.values_mut() {
            strip_class_markers(member);
        }
    }
}

#[test]
fn test_sequence_payload_for_object_bean_is_shape_error() {
    let err = decoder(people_graph())
        .decode_bean("person", &json!([1, 2, 3]), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
    assert_eq!(err.entity(), "person");
    let messages = err.chain_messages();
    assert_eq!(messages[0], "failed to decode person");
    assert_eq!(
        messages[1],
        r#"expected: { "<property>": <object | value>, ... }"#
    );
    assert_eq!(messages[2], "expected a object");
}

fn pets_graph() -> MappingGraph {
    let kind = MetaBean::new("kind", text())
        .when("dog", Dependency::mapping("dog", Some("pet")))
        .when("cat", Dependency::mapping("cat", Some("pet")));
    MappingGraph::builder()
        .class(ClassDef::record("Dog"))
        .class(ClassDef::record("Cat"))
        .class(ClassDef::record("Owner"))
        .bean(Bean::new("dog", "Dog").property("bark", Dependency::param("sound", text())))
        .bean(Bean::new("cat", "Cat").property("meow", Dependency::param("sound", text())))
        .bean(
            Bean::new("owner", "Owner")
                .hierarchy(true)
                .property("pet", Dependency::meta(kind)),
        )
        .build()
        .unwrap()
}

#[test]
fn test_polymorphic_property_selects_mapping() {
    let decoder = decoder(pets_graph());
    let scopes = Scopes::new();

    let owner = decoder
        .decode_bean("owner", &json!({"kind": "cat", "pet": {"sound": "purr"}}), &scopes)
        .unwrap();
    let pet = object(object(&owner).property("pet").unwrap());
    assert_eq!(pet.class(), "Cat");
    assert_eq!(pet.property("meow"), Some(&Instance::from("purr")));

    let owner = decoder
        .decode_bean("owner", &json!({"pet": {"sound": "woof"}}), &scopes)
        .unwrap();
    assert_eq!(object(&owner).property("pet"), Some(&Instance::Null));
}

#[test]
fn test_polymorphic_unknown_discriminator() {
    let err = decoder(pets_graph())
        .decode_bean("owner", &json!({"kind": "fish", "pet": {}}), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MappingNotFound);
    assert!(err
        .chain_messages()
        .iter()
        .any(|m| m == "bean not found: fish"));
}

#[test]
fn test_polymorphic_entity_with_enum_discriminator() {
    let kinds = Arc::new(EnumType::new(["DOG", "CAT"], EnumerationType::Auto));
    let meta = MetaBean::new("kind", kinds)
        .when("DOG", Dependency::mapping("dog", None))
        .when("CAT", Dependency::mapping("cat", None));
    let graph = pets_graph();
    let decoder = decoder(graph);

    let value = decoder
        .decode(&Entity::meta(meta.clone()), &json!({"kind": 1, "sound": "purr"}), &Scopes::new())
        .unwrap();
    assert_eq!(object(&value).class(), "Cat");

    let value = decoder
        .decode(&Entity::meta(meta), &json!({"kind": "DOG", "sound": "woof"}), &Scopes::new())
        .unwrap();
    assert_eq!(object(&value).property("bark"), Some(&Instance::from("woof")));
}

#[test]
fn test_collection_object_mode() {
    let graph = MappingGraph::builder()
        .class(ClassDef::list("Basket"))
        .bean(
            Bean::collection("basket", "Basket", Dependency::param("items", int()))
                .property("prop", Dependency::param("prop", text())),
        )
        .build()
        .unwrap();
    let value = decoder(graph)
        .decode_bean("basket", &json!({"prop": "x", "items": [1, 2, 3]}), &Scopes::new())
        .unwrap();
    let basket = object(&value);
    assert_eq!(basket.property("prop"), Some(&Instance::from("x")));
    assert_eq!(
        basket.elements().unwrap(),
        &[Instance::Int(1), Instance::Int(2), Instance::Int(3)]
    );
}

#[test]
fn test_collection_object_mode_rejects_non_sequence_items() {
    let graph = MappingGraph::builder()
        .class(ClassDef::list("Basket"))
        .bean(Bean::collection("basket", "Basket", Dependency::param("items", int())))
        .build()
        .unwrap();
    let err = decoder(graph)
        .decode_bean("basket", &json!({"items": 5}), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
    let messages = err.chain_messages();
    assert!(messages[1].contains(r#""items": [ <object | value>, ... ]"#), "{messages:?}");
    assert_eq!(messages[2], "expected a collection");
}

#[test]
fn test_collection_simple_mode_of_beans() {
    let graph = MappingGraph::builder()
        .class(ClassDef::list("People"))
        .class(ClassDef::record("Person"))
        .bean(Bean::new("person", "Person").property("name", Dependency::param("name", text())))
        .bean(Bean::collection("people", "People", Dependency::mapping("person", None)))
        .build()
        .unwrap();
    let value = decoder(graph)
        .decode_bean("people", &json!([{"name": "Ana"}, {"name": "Bo"}]), &Scopes::new())
        .unwrap();
    let people = object(&value).elements().unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(object(&people[1]).property("name"), Some(&Instance::from("Bo")));
}

#[test]
fn test_nested_collections_in_simple_mode() {
    let graph = MappingGraph::builder()
        .class(ClassDef::list("Row"))
        .class(ClassDef::list("Matrix"))
        .bean(Bean::collection("row", "Row", Dependency::value(int())))
        .bean(Bean::collection("matrix", "Matrix", Dependency::mapping("row", None)))
        .build()
        .unwrap();
    let value = decoder(graph)
        .decode_bean("matrix", &json!([[1, 2], [3]]), &Scopes::new())
        .unwrap();
    let rows = object(&value).elements().unwrap();
    assert_eq!(object(&rows[0]).elements().unwrap(), &[Instance::Int(1), Instance::Int(2)]);
    assert_eq!(object(&rows[1]).elements().unwrap(), &[Instance::Int(3)]);
}

#[test]
fn test_map_simple_mode() {
    let graph = MappingGraph::builder()
        .class(ClassDef::map("Counts"))
        .bean(Bean::map("counts", "Counts", Dependency::value(text()), Dependency::value(int())))
        .build()
        .unwrap();
    let value = decoder(graph)
        .decode_bean("counts", &json!({"a": 1, "b": 2}), &Scopes::new())
        .unwrap();
    let entries = object(&value).entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.get(&Instance::from("a")), Some(&Instance::Int(1)));
    assert_eq!(entries.get(&Instance::from("b")), Some(&Instance::Int(2)));
}

#[test]
fn test_map_simple_mode_requires_object() {
    let graph = MappingGraph::builder()
        .class(ClassDef::map("Counts"))
        .bean(Bean::map("counts", "Counts", Dependency::value(text()), Dependency::value(int())))
        .build()
        .unwrap();
    let err = decoder(graph)
        .decode_bean("counts", &json!([1]), &Scopes::new())
        .unwrap_err();
    assert_eq!(
        err.chain_messages()[1],
        r#"expected: { "<key>": <object | value>, ... }"#
    );
}

fn prices_graph() -> MappingGraph {
    MappingGraph::builder()
        .class(ClassDef::map("Prices"))
        .bean(
            Bean::map(
                "prices",
                "Prices",
                Dependency::param("sku", text()),
                Dependency::param("prices", int()),
            )
            .property("currency", Dependency::param("currency", text())),
        )
        .build()
        .unwrap()
}

/// Messages of a shape failure: the template wrapper then the local reason.
fn shape_messages(decoder: &JsonBeanDecoder, bean: &str, payload: Value) -> Vec<String> {
    let err = decoder
        .decode_bean(bean, &payload, &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape, "{err}");
    err.chain_messages()
}

#[test]
fn test_map_object_mode() {
    let graph = prices_graph();
    let payload = json!({
        "currency": "EUR",
        "prices": [{"sku": "A1", "prices": 10}, {"sku": "B2", "prices": "20"}]
    });
    let value = decoder(graph)
        .decode_bean("prices", &payload, &Scopes::new())
        .unwrap();
    let prices = object(&value);
    assert_eq!(prices.property("currency"), Some(&Instance::from("EUR")));
    let entries = prices.entries().unwrap();
    assert_eq!(entries.get(&Instance::from("A1")), Some(&Instance::Int(10)));
    assert_eq!(entries.get(&Instance::from("B2")), Some(&Instance::Int(20)));
}

#[test]
fn test_map_object_mode_entry_shapes() {
    let decoder = decoder(prices_graph());
    let template = r#""prices": [ { "sku": <object | value>, "prices": <object | value> }, ... ]"#;

    let messages = shape_messages(&decoder, "prices", json!({"prices": [5]}));
    assert!(messages[1].contains(template), "{messages:?}");
    assert_eq!(messages[2], "expected a object");

    let messages = shape_messages(&decoder, "prices", json!({"prices": {"sku": "A1"}}));
    assert!(messages[1].contains(template), "{messages:?}");
    assert_eq!(messages[2], "expected a collection");
}

#[test]
fn test_missing_element_member_is_shape_error() {
    let prices = decoder(prices_graph());
    for payload in [json!({"currency": "EUR"}), json!({"currency": "EUR", "prices": null})] {
        let messages = shape_messages(&prices, "prices", payload);
        assert_eq!(messages[2], "expected a collection");
    }

    let graph = MappingGraph::builder()
        .class(ClassDef::list("Basket"))
        .bean(
            Bean::collection("basket", "Basket", Dependency::param("items", int()))
                .property("prop", Dependency::param("prop", text())),
        )
        .build()
        .unwrap();
    let messages = shape_messages(&decoder(graph), "basket", json!({"prop": "x"}));
    assert!(messages[1].contains(r#""items": [ <object | value>, ... ]"#), "{messages:?}");
    assert_eq!(messages[2], "expected a collection");
}

#[test]
fn test_suppressed_container_keeps_found_items() {
    let graph = MappingGraph::builder()
        .class(ClassDef::list("Basket").with_constructor(["owner"]))
        .class(ClassDef::list("Tags").with_constructor(["owner"]))
        .class(ClassDef::map("Prices").with_constructor(["currency"]))
        .class(ClassDef::map("Counts").with_constructor(["owner"]))
        .bean(
            Bean::collection("basket", "Basket", Dependency::param("items", int()))
                .arg(Dependency::param("owner", text())),
        )
        .bean(
            Bean::collection("tags", "Tags", Dependency::value(text()))
                .arg(Dependency::param("owner", text())),
        )
        .bean(
            Bean::map(
                "prices",
                "Prices",
                Dependency::param("sku", text()),
                Dependency::param("prices", int()),
            )
            .arg(Dependency::param("currency", text())),
        )
        .bean(
            Bean::map("counts", "Counts", Dependency::value(text()), Dependency::value(int()))
                .arg(Dependency::param("owner", text())),
        )
        .build()
        .unwrap();
    let decoder = decoder(graph);

    let messages = shape_messages(&decoder, "basket", json!({"items": [1, 2, 3]}));
    assert_eq!(messages[2], "expected a collection type");
    let messages = shape_messages(&decoder, "tags", json!(["a"]));
    assert_eq!(messages[1], "expected: [ <object | value>, ... ]");
    assert_eq!(messages[2], "expected a collection type");
    let messages = shape_messages(
        &decoder,
        "prices",
        json!({"prices": [{"sku": "A1", "prices": 1}]}),
    );
    assert_eq!(messages[2], "expected a map type");
    let messages = shape_messages(&decoder, "counts", json!({"a": 1}));
    assert_eq!(messages[2], "expected a map type");

    // Nothing was found at all, so the container is simply absent.
    let scopes = Scopes::new();
    for (bean, payload) in [
        ("basket", json!({"items": []})),
        ("tags", json!([])),
        ("prices", json!({"prices": []})),
        ("counts", json!({})),
    ] {
        let value = decoder.decode_bean(bean, &payload, &scopes).unwrap();
        assert!(value.is_null(), "{bean}: {value:?}");
    }

    let value = decoder
        .decode_bean("basket", &json!({"owner": "ana", "items": [1]}), &scopes)
        .unwrap();
    assert_eq!(object(&value).property("owner"), Some(&Instance::from("ana")));
    assert_eq!(object(&value).elements().unwrap(), &[Instance::Int(1)]);
}

#[test]
fn test_non_container_built_for_container_bean() {
    let graph = MappingGraph::builder()
        .class(ClassDef::list("Bag").factory("open", 1, |_, _| Ok(Object::record("Bag"))))
        .class(ClassDef::map("Ledger").factory("open", 1, |_, _| Ok(Object::list("Ledger"))))
        .bean(
            Bean::collection("bag", "Bag", Dependency::param("items", int()))
                .factory("open")
                .arg(Dependency::param("owner", text())),
        )
        .bean(
            Bean::map(
                "ledger",
                "Ledger",
                Dependency::param("sku", text()),
                Dependency::param("amounts", int()),
            )
            .factory("open")
            .arg(Dependency::param("owner", text())),
        )
        .build()
        .unwrap();
    let decoder = decoder(graph);

    let messages = shape_messages(&decoder, "bag", json!({"owner": "ana", "items": []}));
    assert_eq!(messages[2], "expected a collection type");

    let messages = shape_messages(&decoder, "ledger", json!({"owner": "ana", "amounts": []}));
    assert_eq!(messages[2], "expected a map type");
}

#[test]
fn test_factory_from_peer_bean() {
    let graph = MappingGraph::builder()
        .class(ClassDef::record("Garage").factory("build", 1, |garage, args| {
            let wheels = garage
                .and_then(Instance::as_object)
                .and_then(|g| g.property("wheels"))
                .cloned()
                .unwrap_or_default();
            Ok(Object::record("Car")
                .with_property("wheels", wheels)
                .with_property("color", args[0].clone()))
        }))
        .class(ClassDef::record("Car"))
        .bean(Bean::new("garage", "Garage").property("wheels", Dependency::param("wheels", int())))
        .bean(Bean::new("workshop", "Garage"))
        .bean(
            Bean::new("car", "Car")
                .factory_bean("build", "garage")
                .arg(Dependency::param("color", text())),
        )
        .bean(
            Bean::new("phantom", "Car")
                .factory_bean("build", "workshop")
                .arg(Dependency::param("color", text())),
        )
        .build()
        .unwrap();
    let decoder = decoder(graph);
    let scopes = Scopes::new();

    let car = decoder
        .decode_bean("car", &json!({"wheels": 4, "color": "red"}), &scopes)
        .unwrap();
    let car = object(&car);
    assert_eq!(car.class(), "Car");
    assert_eq!(car.property("wheels"), Some(&Instance::Int(4)));
    assert_eq!(car.property("color"), Some(&Instance::from("red")));

    // A peer decoding to null cannot build anything.
    let err = decoder
        .decode_bean("phantom", &json!({"color": "red"}), &scopes)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
    assert!(err
        .chain_messages()
        .iter()
        .any(|m| m == "factory bean workshop decoded to null"));
}

#[test]
fn test_static_factory() {
    let graph = MappingGraph::builder()
        .class(
            ClassDef::record("Money")
                .without_constructor()
                .factory("of", 2, |_, args| {
                    let cents = args[0].as_i64().unwrap_or(0) * 100;
                    Ok(Object::record("Money")
                        .with_property("cents", cents)
                        .with_property("currency", args[1].clone()))
                }),
        )
        .bean(
            Bean::new("price", "Money")
                .factory("of")
                .arg(Dependency::param("amount", int()))
                .arg(Dependency::fixed(json!("EUR"), text())),
        )
        .build()
        .unwrap();
    let value = decoder(graph)
        .decode_bean("price", &json!({"amount": "3"}), &Scopes::new())
        .unwrap();
    assert_eq!(object(&value).property("cents"), Some(&Instance::Int(300)));
    assert_eq!(object(&value).property("currency"), Some(&Instance::from("EUR")));
}

#[test]
fn test_container_factory_without_arguments_is_infinite_loop() {
    let graph = MappingGraph::builder()
        .class(ClassDef::list("Bag").factory("empty", 0, |_, _| Ok(Object::list("Bag"))))
        .bean(Bean::collection("bag", "Bag", Dependency::value(int())).factory("empty"))
        .build()
        .unwrap();
    let err = decoder(graph)
        .decode_bean("bag", &json!([1]), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err
        .chain_messages()
        .iter()
        .any(|m| m == "infinite loop detected: bag"));
}

fn chain_graph() -> MappingGraph {
    MappingGraph::builder()
        .class(ClassDef::record("Node"))
        .bean(
            Bean::new("node", "Node")
                .hierarchy(true)
                .property("value", Dependency::param("value", int()))
                .property("next", Dependency::mapping("node", Some("next"))),
        )
        .build()
        .unwrap()
}

fn nested(levels: usize) -> Value {
    (0..levels).fold(json!({"value": 0}), |inner, i| {
        json!({"value": i + 1, "next": inner})
    })
}

#[test]
fn test_self_referential_graph_within_depth() {
    let decoder = JsonBeanDecoder::with_config(
        Arc::new(chain_graph()),
        RuntimeConfig::default().with_max_decode_depth(8),
    );
    let value = decoder.decode_bean("node", &nested(6), &Scopes::new()).unwrap();
    let mut node = object(&value);
    let mut seen = 1;
    while let Some(Instance::Object(next)) = node.property("next") {
        node = next;
        seen += 1;
    }
    assert_eq!(seen, 7);
}

#[test]
fn test_depth_limit() {
    let decoder = JsonBeanDecoder::with_config(
        Arc::new(chain_graph()),
        RuntimeConfig::default().with_max_decode_depth(4),
    );
    let err = decoder
        .decode_bean("node", &nested(10), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Depth);
    assert!(err
        .chain_messages()
        .iter()
        .any(|m| m == "maximum decode depth of 4 exceeded"));
}

#[test]
fn test_scoped_values() {
    let graph = MappingGraph::builder()
        .class(ClassDef::record("Request"))
        .bean(
            Bean::new("request", "Request")
                .property("user", Dependency::param("user", text()).in_scope(ScopeType::Session))
                .property(
                    "roles",
                    Dependency::param("role", Arc::new(CollectionType::list(text())))
                        .in_scope(ScopeType::Header),
                )
                .property("body", Dependency::param("body", text())),
        )
        .build()
        .unwrap();
    let decoder = decoder(graph);
    let scopes = Scopes::new()
        .with(ScopeType::Session, MapScope::new().with("user", json!("ana")))
        .with(ScopeType::Header, MapScope::new().with("role", json!("admin")));

    let value = decoder
        .decode_bean("request", &json!({"body": "hi", "user": "mallory"}), &scopes)
        .unwrap();
    let request = object(&value);
    assert_eq!(request.property("user"), Some(&Instance::from("ana")));
    assert_eq!(
        request.property("roles"),
        Some(&Instance::List(vec![Instance::from("admin")]))
    );
    assert_eq!(request.property("body"), Some(&Instance::from("hi")));

    let err = decoder
        .decode_bean("request", &json!({}), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Scope);
}

#[test]
fn test_entity_param_and_static() {
    let decoder = decoder(people_graph());
    let scopes = Scopes::new();
    let payload = json!({"id": "42", "ids": [1, "2"]});

    let id = decoder
        .decode(&Entity::param("id", int()), &payload, &scopes)
        .unwrap();
    assert_eq!(id, Instance::Int(42));

    let ids = decoder
        .decode(
            &Entity::param("ids", Arc::new(CollectionType::list(int()))),
            &payload,
            &scopes,
        )
        .unwrap();
    assert_eq!(ids, Instance::List(vec![Instance::Int(1), Instance::Int(2)]));

    let fixed = decoder
        .decode(&Entity::fixed(json!("7"), int()), &payload, &scopes)
        .unwrap();
    assert_eq!(fixed, Instance::Int(7));

    let null = decoder
        .decode(&Entity::null(int()), &payload, &scopes)
        .unwrap();
    assert!(null.is_null());
}

#[test]
fn test_entity_mapping_named_sub_object() {
    let decoder = decoder(people_graph());
    let scopes = Scopes::new();
    let payload = json!({"owner": {"name": "Ana"}});

    let owner = decoder
        .decode(&Entity::mapping("person").named("owner"), &payload, &scopes)
        .unwrap();
    assert_eq!(object(&owner).property("name"), Some(&Instance::from("Ana")));

    let missing = decoder
        .decode(&Entity::mapping("person").named("tenant"), &payload, &scopes)
        .unwrap();
    assert!(missing.is_null());
}

#[test]
fn test_unknown_bean_is_configuration_error() {
    let err = decoder(people_graph())
        .decode_bean("ghost", &json!({}), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.cause().to_string(), "unknown bean: ghost");
}

#[test]
fn test_setter_failure_is_construction_error() {
    let graph = MappingGraph::builder()
        .class(ClassDef::record("Strict").setter(|object, name, value| {
            if value.is_null() {
                anyhow::bail!("{name} may not be null");
            }
            object.set_property(name, value);
            Ok(())
        }))
        .bean(Bean::new("strict", "Strict").property("code", Dependency::param("code", text())))
        .build()
        .unwrap();
    let err = decoder(graph)
        .decode_bean("strict", &json!({}), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
    let messages = err.chain_messages();
    assert!(messages.iter().any(|m| m == "create instance failed: strict"));
    assert!(messages.iter().any(|m| m == "cannot set property code"));
}

#[test]
fn test_decoder_is_shareable_across_threads() {
    let decoder = Arc::new(decoder(people_graph()));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let decoder = Arc::clone(&decoder);
            std::thread::spawn(move || {
                decoder
                    .decode_bean("person", &json!({"name": format!("p{i}"), "age": i}), &Scopes::new())
                    .unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let person = handle.join().unwrap();
        assert_eq!(object(&person).property("age"), Some(&Instance::Int(i as i64)));
    }
}
