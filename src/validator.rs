use std::fmt;

/// What is wrong with one part of a mapping graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    DuplicateClass,
    DuplicateBean,
    DuplicateAction,
    DuplicateProperty,
    UnknownClass,
    UnknownBean,
    UnknownFactoryBean,
    UnknownFactoryMethod,
    SelfFactory,
    NoConstructor,
    ArityMismatch,
    CapabilityMismatch,
    EmptyMetaBean,
    UnknownType,
    InvalidDocument,
}

impl IssueKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::DuplicateClass => "duplicate_class",
            IssueKind::DuplicateBean => "duplicate_bean",
            IssueKind::DuplicateAction => "duplicate_action",
            IssueKind::DuplicateProperty => "duplicate_property",
            IssueKind::UnknownClass => "unknown_class",
            IssueKind::UnknownBean => "unknown_bean",
            IssueKind::UnknownFactoryBean => "unknown_factory_bean",
            IssueKind::UnknownFactoryMethod => "unknown_factory_method",
            IssueKind::SelfFactory => "self_factory",
            IssueKind::NoConstructor => "no_constructor",
            IssueKind::ArityMismatch => "arity_mismatch",
            IssueKind::CapabilityMismatch => "capability_mismatch",
            IssueKind::EmptyMetaBean => "empty_meta_bean",
            IssueKind::UnknownType => "unknown_type",
            IssueKind::InvalidDocument => "invalid_document",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending element, e.g. `bean:person.arg[0]`.
    pub location: String,
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        ValidationIssue {
            location: location.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Render a report of every issue, one per line.
#[must_use]
pub fn format_issues(issues: &[ValidationIssue]) -> String {
    let mut out = format!(
        "mapping graph validation failed. {} issue(s) found:\n",
        issues.len()
    );
    for issue in issues {
        out.push_str(&issue.to_string());
        out.push('\n');
    }
    out
}

pub fn print_issues(issues: &[ValidationIssue]) {
    eprintln!("\n{}", format_issues(issues));
}
