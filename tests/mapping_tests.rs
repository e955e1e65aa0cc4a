mod common;

use brutos::mapping::{
    ActionMapping, Bean, ClassDef, Dependency, Entity, MappingGraph, MetaBean,
};
use brutos::validator::IssueKind;
use common::{int, people_graph, text};

#[test]
fn test_graph_lookup() {
    let graph = people_graph();
    assert_eq!(graph.bean("person").unwrap().class, "Person");
    assert!(graph.class("Address").is_some());
    let names: Vec<&str> = graph.beans().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["address", "person"]);
}

#[test]
fn test_every_issue_is_reported() {
    let err = MappingGraph::builder()
        .class(ClassDef::record("Person").with_constructor(["name"]))
        .class(ClassDef::record("Person"))
        .bean(Bean::new("person", "Person"))
        .bean(
            Bean::new("owner", "Owner")
                .property("pet", Dependency::mapping("pet", None))
                .property("pet", Dependency::param("pet", text())),
        )
        .action(ActionMapping::new("save").parameter(Entity::mapping("customer")))
        .build()
        .unwrap_err();

    let kinds: Vec<IssueKind> = err.issues().iter().map(|i| i.kind).collect();
    for expected in [
        IssueKind::DuplicateClass,
        IssueKind::ArityMismatch,
        IssueKind::DuplicateProperty,
        IssueKind::UnknownBean,
        IssueKind::UnknownClass,
    ] {
        assert!(kinds.contains(&expected), "missing {expected}: {kinds:?}");
    }
    let report = err.to_string();
    assert!(report.starts_with("mapping graph validation failed."));
    assert!(report.contains("[unknown_bean] action:save.parameter[0]: no bean named customer"));
}

#[test]
fn test_container_needs_matching_class() {
    let err = MappingGraph::builder()
        .class(ClassDef::record("Plain"))
        .bean(Bean::collection("items", "Plain", Dependency::value(int())))
        .build()
        .unwrap_err();
    assert_eq!(err.issues()[0].kind, IssueKind::CapabilityMismatch);
}

#[test]
fn test_factory_validation() {
    let err = MappingGraph::builder()
        .class(ClassDef::record("Car").factory("build", 1, |_, _| {
            Ok(brutos::instance::Object::record("Car"))
        }))
        .class(ClassDef::record("Shell").without_constructor())
        .bean(Bean::new("selfish", "Car").factory_bean("build", "selfish"))
        .bean(Bean::new("orphan", "Car").factory_bean("build", "nobody"))
        .bean(Bean::new("short", "Car").factory("build"))
        .bean(Bean::new("wrong", "Car").factory("assemble"))
        .bean(Bean::new("shell", "Shell"))
        .build()
        .unwrap_err();
    let kind_of = |location: &str| {
        err.issues()
            .iter()
            .find(|i| i.location == location)
            .map(|i| i.kind)
    };
    assert_eq!(kind_of("bean:selfish"), Some(IssueKind::SelfFactory));
    assert_eq!(kind_of("bean:orphan"), Some(IssueKind::UnknownFactoryBean));
    assert_eq!(kind_of("bean:short"), Some(IssueKind::ArityMismatch));
    assert_eq!(kind_of("bean:wrong"), Some(IssueKind::UnknownFactoryMethod));
    assert_eq!(kind_of("bean:shell"), Some(IssueKind::NoConstructor));
}

#[test]
fn test_meta_bean_targets_are_checked() {
    let err = MappingGraph::builder()
        .class(ClassDef::record("Home"))
        .bean(
            Bean::new("home", "Home")
                .property("pet", Dependency::meta(MetaBean::new("kind", text())))
                .property(
                    "guest",
                    Dependency::meta(
                        MetaBean::new("kind", text()).when("bird", Dependency::mapping("bird", None)),
                    ),
                ),
        )
        .build()
        .unwrap_err();
    let kinds: Vec<IssueKind> = err.issues().iter().map(|i| i.kind).collect();
    assert_eq!(kinds, [IssueKind::EmptyMetaBean, IssueKind::UnknownBean]);
    assert_eq!(err.issues()[1].location, "bean:home.property[guest].when[bird]");
}
