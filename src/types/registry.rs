use super::{
    AnyType, BeanType, BoolType, CharType, CollectionType, DateType, EnumType, EnumerationType,
    FloatType, IntegerType, TextType, TypeRef,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

static BUILTIN: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::with_builtins);

/// Name → type lookup used by the mapping loader and the CLI.
///
/// Plain names (`int`, `string`, ...) resolve through the table; composite
/// names are parsed:
///
/// - `bean(Class)`
/// - `date(pattern)`
/// - `enum(A,B,C)` with an optional `:ordinal` / `:string` / `:auto` suffix
/// - `list<T>` and `array<T>`, nested freely
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    named: HashMap<String, TypeRef>,
}

impl TypeRegistry {
    /// An empty registry. Composite names still resolve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry holding the built-in scalar names.
    #[must_use]
    pub fn builtin() -> &'static TypeRegistry {
        &BUILTIN
    }

    /// A fresh registry pre-populated with the built-in names.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let text: TypeRef = Arc::new(TextType);
        let long: TypeRef = Arc::new(IntegerType::default());
        let float: TypeRef = Arc::new(FloatType);
        let boolean: TypeRef = Arc::new(BoolType);
        registry.register("string", Arc::clone(&text));
        registry.register("text", text);
        registry.register("char", Arc::new(CharType));
        registry.register("int", Arc::clone(&long));
        registry.register("long", long);
        registry.register("int8", Arc::new(IntegerType::new(8)));
        registry.register("int16", Arc::new(IntegerType::new(16)));
        registry.register("int32", Arc::new(IntegerType::new(32)));
        registry.register("float", Arc::clone(&float));
        registry.register("double", float);
        registry.register("bool", Arc::clone(&boolean));
        registry.register("boolean", boolean);
        registry.register("any", Arc::new(AnyType));
        registry.register("date", Arc::new(DateType::default()));
        registry
    }

    /// Register (or replace) a named type.
    pub fn register(&mut self, name: impl Into<String>, ty: TypeRef) {
        self.named.insert(name.into(), ty);
    }

    /// Resolve a type name, `None` when the name is unknown or malformed.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<TypeRef> {
        let name = name.trim();
        if let Some(ty) = self.named.get(name) {
            return Some(Arc::clone(ty));
        }
        if let Some(inner) = strip_wrapped(name, "list<", '>') {
            return self
                .resolve(inner)
                .map(|el| Arc::new(CollectionType::list(el)) as TypeRef);
        }
        if let Some(inner) = strip_wrapped(name, "array<", '>') {
            return self
                .resolve(inner)
                .map(|el| Arc::new(CollectionType::array(el)) as TypeRef);
        }
        if let Some(class) = strip_wrapped(name, "bean(", ')') {
            let class = class.trim();
            return (!class.is_empty()).then(|| Arc::new(BeanType::new(class)) as TypeRef);
        }
        if let Some(pattern) = strip_wrapped(name, "date(", ')') {
            return Some(Arc::new(DateType::new(pattern)));
        }
        if name.starts_with("enum(") {
            return parse_enum(name);
        }
        None
    }
}

fn strip_wrapped<'a>(name: &'a str, open: &str, close: char) -> Option<&'a str> {
    name.strip_prefix(open)?.strip_suffix(close)
}

fn parse_enum(name: &str) -> Option<TypeRef> {
    let (body, mode) = match name.rsplit_once("):") {
        Some((body, mode)) => (format!("{body})"), mode.parse().ok()?),
        None => (name.to_string(), EnumerationType::default()),
    };
    let constants = strip_wrapped(&body, "enum(", ')')?;
    let constants: Vec<&str> = constants
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if constants.is_empty() {
        return None;
    }
    Some(Arc::new(EnumType::new(constants, mode)))
}
