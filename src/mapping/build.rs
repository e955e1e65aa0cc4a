use super::types::{Bean, BeanKind, Dependency, DependencySource, EntitySource, Invoker, MetaBean};
use super::{ActionMapping, Capability, ClassDef, MappingError, MappingGraph};
use crate::validator::{IssueKind, ValidationIssue};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Collects classes, beans and actions and validates them into a
/// [`MappingGraph`].
#[derive(Debug, Default)]
pub struct MappingGraphBuilder {
    classes: Vec<ClassDef>,
    beans: Vec<Bean>,
    actions: Vec<ActionMapping>,
}

impl MappingGraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn class(mut self, class: ClassDef) -> Self {
        self.classes.push(class);
        self
    }

    #[must_use]
    pub fn bean(mut self, bean: Bean) -> Self {
        self.beans.push(bean);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ActionMapping) -> Self {
        self.actions.push(action);
        self
    }

    pub fn add_class(&mut self, class: ClassDef) {
        self.classes.push(class);
    }

    pub fn add_bean(&mut self, bean: Bean) {
        self.beans.push(bean);
    }

    pub fn add_action(&mut self, action: ActionMapping) {
        self.actions.push(action);
    }

    /// Validate everything and produce the graph.
    ///
    /// All issues are collected before failing.
    pub fn build(self) -> Result<MappingGraph, MappingError> {
        let mut issues = Vec::new();

        let mut classes = BTreeMap::new();
        for class in self.classes {
            if classes.contains_key(class.name()) {
                issues.push(ValidationIssue::new(
                    format!("class:{}", class.name()),
                    IssueKind::DuplicateClass,
                    "class declared more than once",
                ));
                continue;
            }
            classes.insert(class.name().to_string(), class);
        }

        let mut beans = BTreeMap::new();
        for bean in self.beans {
            if beans.contains_key(&bean.name) {
                issues.push(ValidationIssue::new(
                    format!("bean:{}", bean.name),
                    IssueKind::DuplicateBean,
                    "bean declared more than once",
                ));
                continue;
            }
            beans.insert(bean.name.clone(), bean);
        }

        let mut actions = BTreeMap::new();
        for action in self.actions {
            if actions.contains_key(&action.name) {
                issues.push(ValidationIssue::new(
                    format!("action:{}", action.name),
                    IssueKind::DuplicateAction,
                    "action declared more than once",
                ));
                continue;
            }
            actions.insert(action.name.clone(), action);
        }

        let graph = MappingGraph {
            classes,
            beans,
            actions,
        };
        let checker = Checker { graph: &graph };
        for bean in graph.beans.values() {
            checker.bean(bean, &mut issues);
        }
        for action in graph.actions.values() {
            checker.action(action, &mut issues);
        }

        if issues.is_empty() {
            debug!(
                classes = graph.classes.len(),
                beans = graph.beans.len(),
                actions = graph.actions.len(),
                "mapping graph built"
            );
            Ok(graph)
        } else {
            warn!(issues = issues.len(), "mapping graph rejected");
            Err(MappingError::Invalid(issues))
        }
    }
}

struct Checker<'g> {
    graph: &'g MappingGraph,
}

impl Checker<'_> {
    fn bean(&self, bean: &Bean, issues: &mut Vec<ValidationIssue>) {
        let location = format!("bean:{}", bean.name);

        let mut seen = HashSet::new();
        for property in &bean.properties {
            if !seen.insert(property.name.as_str()) {
                issues.push(ValidationIssue::new(
                    format!("{location}.property[{}]", property.name),
                    IssueKind::DuplicateProperty,
                    "property declared more than once",
                ));
            }
        }

        for (label, dependency) in bean.dependencies() {
            self.dependency(&format!("{location}.{label}"), dependency, issues);
        }

        let Some(class) = self.graph.class(&bean.class) else {
            issues.push(ValidationIssue::new(
                &location,
                IssueKind::UnknownClass,
                format!("no class named {}", bean.class),
            ));
            return;
        };

        let required = match bean.kind {
            BeanKind::Plain => None,
            BeanKind::Collection { .. } => Some(Capability::List),
            BeanKind::Map { .. } => Some(Capability::Map),
        };
        if let Some(required) = required {
            if class.capability() != required {
                issues.push(ValidationIssue::new(
                    &location,
                    IssueKind::CapabilityMismatch,
                    format!(
                        "class {} is a {} but the bean needs a {required}",
                        class.name(),
                        class.capability()
                    ),
                ));
            }
        }

        let declared = bean.constructor.args.len();
        match &bean.constructor.invoker {
            Invoker::Constructor => match class.constructor_arity() {
                None => issues.push(ValidationIssue::new(
                    &location,
                    IssueKind::NoConstructor,
                    format!("class {} has no constructor", class.name()),
                )),
                Some(arity) if arity != declared => issues.push(ValidationIssue::new(
                    &location,
                    IssueKind::ArityMismatch,
                    format!("constructor takes {arity} argument(s), {declared} declared"),
                )),
                Some(_) => {}
            },
            Invoker::Factory { method, bean: source } => {
                let factory_class = match source {
                    None => Some(class),
                    Some(source) if *source == bean.name => {
                        issues.push(ValidationIssue::new(
                            &location,
                            IssueKind::SelfFactory,
                            "bean names itself as its factory",
                        ));
                        None
                    }
                    Some(source) => match self.graph.bean(source) {
                        None => {
                            issues.push(ValidationIssue::new(
                                &location,
                                IssueKind::UnknownFactoryBean,
                                format!("no bean named {source}"),
                            ));
                            None
                        }
                        // A missing peer class is reported on the peer itself.
                        Some(peer) => self.graph.class(&peer.class),
                    },
                };
                if let Some(factory_class) = factory_class {
                    match factory_class.factory_method(method) {
                        None => issues.push(ValidationIssue::new(
                            &location,
                            IssueKind::UnknownFactoryMethod,
                            format!("class {} has no factory {method}", factory_class.name()),
                        )),
                        Some(f) if f.arity() != declared => issues.push(ValidationIssue::new(
                            &location,
                            IssueKind::ArityMismatch,
                            format!(
                                "factory {method} takes {} argument(s), {declared} declared",
                                f.arity()
                            ),
                        )),
                        Some(_) => {}
                    }
                }
            }
        }
    }

    fn action(&self, action: &ActionMapping, issues: &mut Vec<ValidationIssue>) {
        for (index, entity) in action.parameters.iter().enumerate() {
            let location = format!("action:{}.parameter[{index}]", action.name);
            match &entity.source {
                EntitySource::Mapping(bean) => self.bean_ref(&location, bean, issues),
                EntitySource::Meta(meta) => self.meta(&location, meta, issues),
                EntitySource::Nullable | EntitySource::Static(_) | EntitySource::Param => {}
            }
        }
    }

    fn dependency(&self, location: &str, dependency: &Dependency, issues: &mut Vec<ValidationIssue>) {
        match &dependency.source {
            DependencySource::Mapping(bean) => self.bean_ref(location, bean, issues),
            DependencySource::Meta(meta) => self.meta(location, meta, issues),
            DependencySource::Param | DependencySource::Static(_) | DependencySource::Nullable => {}
        }
    }

    fn meta(&self, location: &str, meta: &MetaBean, issues: &mut Vec<ValidationIssue>) {
        if meta.is_empty() {
            issues.push(ValidationIssue::new(
                location,
                IssueKind::EmptyMetaBean,
                format!("meta bean on {} maps no values", meta.name),
            ));
        }
        for (key, dependency) in meta.values() {
            self.dependency(&format!("{location}.when[{key}]"), dependency, issues);
        }
    }

    fn bean_ref(&self, location: &str, bean: &str, issues: &mut Vec<ValidationIssue>) {
        if self.graph.bean(bean).is_none() {
            issues.push(ValidationIssue::new(
                location,
                IssueKind::UnknownBean,
                format!("no bean named {bean}"),
            ));
        }
    }
}
