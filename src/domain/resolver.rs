//! Type/Name Resolver.
//!
//! Upgrades a short Java identifier (a parameter type, a class name, or a
//! profiler-reported signature) to a best-effort fully-qualified name using
//! only lexical context. There is no semantic analysis here: the resolution
//! order below is the whole algorithm.
//!
//! 1. strip trailing `[]` markers (re-attached at the end)
//! 2. primitive keyword, returned as-is
//! 3. well-known standard type table
//! 4. already dotted, returned unchanged
//! 5. same-package candidate not declared in this compilation unit
//! 6. import whose last segment matches
//! 7. uppercase name with a known package, qualified with that package
//! 8. package inferred from the enclosing member's FQN
//! 9. uppercase name without a package, qualified with the fallback namespace
//! 10. anything else comes back trimmed but otherwise untouched

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

const BUILTIN_WELL_KNOWN: &[(&str, &str)] = &[
    // java.lang
    ("Boolean", "java.lang.Boolean"),
    ("Byte", "java.lang.Byte"),
    ("Character", "java.lang.Character"),
    ("Short", "java.lang.Short"),
    ("Integer", "java.lang.Integer"),
    ("Long", "java.lang.Long"),
    ("Float", "java.lang.Float"),
    ("Double", "java.lang.Double"),
    ("String", "java.lang.String"),
    ("Object", "java.lang.Object"),
    ("Class", "java.lang.Class"),
    ("ClassLoader", "java.lang.ClassLoader"),
    // java.util
    ("Collection", "java.util.Collection"),
    ("List", "java.util.List"),
    ("ArrayList", "java.util.ArrayList"),
    ("LinkedList", "java.util.LinkedList"),
    ("Map", "java.util.Map"),
    ("HashMap", "java.util.HashMap"),
    ("Set", "java.util.Set"),
    ("HashSet", "java.util.HashSet"),
    ("TreeSet", "java.util.TreeSet"),
    ("Iterator", "java.util.Iterator"),
    ("Optional", "java.util.Optional"),
    ("Date", "java.util.Date"),
    ("Calendar", "java.util.Calendar"),
    ("Locale", "java.util.Locale"),
    // java.time
    ("LocalDate", "java.time.LocalDate"),
    ("LocalDateTime", "java.time.LocalDateTime"),
    ("LocalTime", "java.time.LocalTime"),
    ("Instant", "java.time.Instant"),
    ("Duration", "java.time.Duration"),
    ("Period", "java.time.Period"),
    // Spring MVC binding
    ("BindingResult", "org.springframework.validation.BindingResult"),
    ("Errors", "org.springframework.validation.Errors"),
    ("Model", "org.springframework.ui.Model"),
    ("Page", "org.springframework.data.domain.Page"),
    (
        "RedirectAttributes",
        "org.springframework.web.servlet.mvc.support.RedirectAttributes",
    ),
    // Servlet
    ("HttpServletRequest", "javax.servlet.http.HttpServletRequest"),
    ("HttpServletResponse", "javax.servlet.http.HttpServletResponse"),
];

/// Immutable lookup data used by the resolver.
#[derive(Debug, Clone)]
pub struct ResolverTables {
    primitives: BTreeSet<String>,
    well_known: HashMap<String, String>,
    fallback_namespace: String,
}

impl Default for ResolverTables {
    fn default() -> Self {
        Self {
            primitives: PRIMITIVES.iter().map(|p| p.to_string()).collect(),
            well_known: BUILTIN_WELL_KNOWN
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fallback_namespace: "java.lang".to_string(),
        }
    }
}

impl ResolverTables {
    /// Add or replace well-known mappings (simple name -> FQN).
    pub fn with_well_known<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in entries {
            self.well_known.insert(k.into(), v.into());
        }
        self
    }

    pub fn with_fallback_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.fallback_namespace = namespace.into().trim_end_matches('.').to_string();
        self
    }

    pub fn is_primitive(&self, name: &str) -> bool {
        self.primitives.contains(name)
    }

    pub fn well_known(&self, name: &str) -> Option<&str> {
        self.well_known.get(name).map(String::as_str)
    }
}

/// Switches for the rules on which the historical analyzers disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Try `pkg.Name` before the import list (rule 5).
    pub prefer_same_package: bool,
    /// Infer a package from the enclosing member FQN (rule 8).
    pub infer_from_enclosing: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            prefer_same_package: true,
            infer_from_enclosing: true,
        }
    }
}

/// Lexical context of one compilation unit (or one profiler frame).
#[derive(Debug, Clone, Default)]
pub struct IdentifierContext {
    pub current_package: Option<String>,
    pub imports: Vec<String>,
    pub seen_types: HashSet<String>,
    /// A partially-qualified sibling member such as `com.acme.Owner.find`.
    pub enclosing_member: Option<String>,
}

impl IdentifierContext {
    pub fn in_package(package: impl Into<String>) -> Self {
        let package = package.into();
        Self {
            current_package: Some(package).filter(|p| !p.is_empty()),
            ..Self::default()
        }
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_seen_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seen_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_enclosing(mut self, member: impl Into<String>) -> Self {
        self.enclosing_member = Some(member.into());
        self
    }

    fn package(&self) -> Option<&str> {
        self.current_package.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    tables: ResolverTables,
    options: ResolverOptions,
}

impl TypeResolver {
    pub fn new(tables: ResolverTables, options: ResolverOptions) -> Self {
        Self { tables, options }
    }

    pub fn tables(&self) -> &ResolverTables {
        &self.tables
    }

    /// Resolve a simple name to a best-effort FQN. Never fails.
    pub fn resolve(&self, simple: &str, ctx: &IdentifierContext) -> String {
        let name = simple.trim();
        if name.is_empty() {
            return String::new();
        }
        let (base, dims) = split_array_marker(name);
        let marker = "[]".repeat(dims);

        if self.tables.is_primitive(base) {
            return format!("{base}{marker}");
        }
        if let Some(fqn) = self.tables.well_known(base) {
            return format!("{fqn}{marker}");
        }
        if base.contains('.') {
            return format!("{base}{marker}");
        }

        if self.options.prefer_same_package {
            if let Some(pkg) = ctx.package() {
                let candidate = format!("{pkg}.{base}");
                if !ctx.seen_types.contains(&candidate) {
                    return format!("{candidate}{marker}");
                }
            }
        }

        if let Some(import) = ctx
            .imports
            .iter()
            .find(|imp| imp.contains('.') && imp.rsplit('.').next() == Some(base))
        {
            return format!("{import}{marker}");
        }

        let uppercase = base.chars().next().is_some_and(char::is_uppercase);
        if uppercase {
            if let Some(pkg) = ctx.package() {
                return format!("{pkg}.{base}{marker}");
            }
        }

        if self.options.infer_from_enclosing {
            if let Some(pkg) = ctx.enclosing_member.as_deref().and_then(package_of_member) {
                return format!("{pkg}.{base}{marker}");
            }
        }

        if uppercase {
            return format!("{}.{base}{marker}", self.tables.fallback_namespace);
        }

        format!("{base}{marker}")
    }

    /// Parse and qualify a raw method label. Labels without a parameter list
    /// come back with whitespace normalized only.
    pub fn qualify_signature(&self, raw: &str, ctx: &IdentifierContext) -> String {
        match MethodSignature::parse(raw) {
            Some(sig) => sig.qualify(self, ctx),
            None => collapse_whitespace(raw),
        }
    }
}

/// Split `Foo[][]` into (`Foo`, 2). Whitespace between markers is tolerated.
fn split_array_marker(name: &str) -> (&str, usize) {
    let mut base = name;
    let mut dims = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped.trim_end();
        dims += 1;
    }
    (base, dims)
}

/// `com.acme.Owner.find` -> `com.acme`
fn package_of_member(member: &str) -> Option<&str> {
    let head = member.split('(').next().unwrap_or(member).trim();
    let mut parts = head.rsplitn(3, '.');
    let _method = parts.next()?;
    let _owner = parts.next()?;
    parts.next().filter(|p| !p.is_empty())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A method label split into its name and raw parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<String>,
}

impl MethodSignature {
    /// Parse `name (A, b.C[], Map<K, V>)`. Returns `None` unless the label
    /// has the shape `name(...)`.
    pub fn parse(raw: &str) -> Option<Self> {
        let label = collapse_whitespace(raw);
        if !label.ends_with(')') {
            return None;
        }
        let open = label.find('(')?;
        let name = label[..open].trim();
        if name.is_empty() {
            return None;
        }
        let inner = &label[open + 1..label.len() - 1];
        let params = split_params(inner)
            .into_iter()
            .map(|p| normalize_param(&p))
            .filter(|p| !p.is_empty())
            .collect();
        Some(Self {
            name: name.to_string(),
            params,
        })
    }

    /// `name(p1,p2)` with each parameter run through the resolver.
    pub fn qualify(&self, resolver: &TypeResolver, ctx: &IdentifierContext) -> String {
        let params: Vec<String> = self.params.iter().map(|p| resolver.resolve(p, ctx)).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// Split a parameter list on top-level commas only.
fn split_params(inner: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => out.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    out.push(current);
    out
}

/// Reduce a declared or reported parameter to its erased type:
/// annotations and `final` dropped, generics erased, varargs turned into
/// arrays, and a trailing parameter name removed.
fn normalize_param(param: &str) -> String {
    let erased = erase_generics(param).replace("...", "[]");
    let tokens: Vec<&str> = erased
        .split_whitespace()
        .filter(|t| !t.starts_with('@') && *t != "final")
        .collect();
    let type_tokens = match tokens.as_slice() {
        [] => return String::new(),
        [single] => vec![*single],
        [rest @ .., last] if !last.starts_with('[') => rest.to_vec(),
        all => all.to_vec(),
    };
    type_tokens.concat()
}

fn erase_generics(s: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Decode the parameter part of a JVM method descriptor, e.g.
/// `(Ljava/lang/String;I[J)V` -> `["java.lang.String", "int", "long[]"]`.
pub fn decode_descriptor_params(descriptor: &str) -> Option<Vec<String>> {
    let start = descriptor.find('(')?;
    let end = descriptor[start..].find(')')? + start;
    let mut chars = descriptor[start + 1..end].chars();
    let mut params = Vec::new();
    let mut dims = 0;
    while let Some(c) = chars.next() {
        let base = match c {
            '[' => {
                dims += 1;
                continue;
            }
            'Z' => "boolean".to_string(),
            'B' => "byte".to_string(),
            'C' => "char".to_string(),
            'S' => "short".to_string(),
            'I' => "int".to_string(),
            'J' => "long".to_string(),
            'F' => "float".to_string(),
            'D' => "double".to_string(),
            'L' => {
                let class: String = chars.by_ref().take_while(|&c| c != ';').collect();
                if class.is_empty() {
                    return None;
                }
                class.replace(['/', '$'], ".")
            }
            _ => return None,
        };
        params.push(format!("{base}{}", "[]".repeat(dims)));
        dims = 0;
    }
    if dims > 0 {
        return None;
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TypeResolver {
        TypeResolver::default()
    }

    #[test]
    fn test_primitives_and_arrays() {
        let ctx = IdentifierContext::in_package("com.acme");
        assert_eq!(resolver().resolve("int", &ctx), "int");
        assert_eq!(resolver().resolve("long[]", &ctx), "long[]");
        assert_eq!(resolver().resolve("byte [] []", &ctx), "byte[][]");
    }

    #[test]
    fn test_well_known_table() {
        let ctx = IdentifierContext::in_package("com.acme");
        assert_eq!(resolver().resolve("String[]", &ctx), "java.lang.String[]");
        assert_eq!(resolver().resolve(" Locale ", &ctx), "java.util.Locale");
        assert_eq!(
            resolver().resolve("BindingResult", &ctx),
            "org.springframework.validation.BindingResult"
        );
    }

    #[test]
    fn test_same_package_preferred_over_import() {
        let ctx = IdentifierContext::in_package("com.acme.web")
            .with_imports(["com.acme.model.Owner"]);
        assert_eq!(resolver().resolve("Owner", &ctx), "com.acme.web.Owner");
    }

    #[test]
    fn test_import_used_when_same_package_candidate_is_seen() {
        let ctx = IdentifierContext::in_package("com.acme.web")
            .with_imports(["com.acme.model.Owner"])
            .with_seen_types(["com.acme.web.Owner"]);
        assert_eq!(resolver().resolve("Owner", &ctx), "com.acme.model.Owner");
    }

    #[test]
    fn test_imports_first_when_same_package_disabled() {
        let r = TypeResolver::new(
            ResolverTables::default(),
            ResolverOptions {
                prefer_same_package: false,
                infer_from_enclosing: true,
            },
        );
        let ctx = IdentifierContext::in_package("com.acme.web")
            .with_imports(["com.acme.model.Pet"]);
        assert_eq!(r.resolve("Pet", &ctx), "com.acme.model.Pet");
        assert_eq!(r.resolve("Visit", &ctx), "com.acme.web.Visit");
    }

    #[test]
    fn test_enclosing_member_inference() {
        let ctx = IdentifierContext::default().with_enclosing("com.acme.owner.OwnerController.find");
        assert_eq!(resolver().resolve("Owner", &ctx), "com.acme.owner.Owner");
        assert_eq!(resolver().resolve("Owner[]", &ctx), "com.acme.owner.Owner[]");
    }

    #[test]
    fn test_enclosing_inference_can_be_disabled() {
        let r = TypeResolver::new(
            ResolverTables::default(),
            ResolverOptions {
                prefer_same_package: true,
                infer_from_enclosing: false,
            },
        );
        let ctx = IdentifierContext::default().with_enclosing("com.acme.owner.OwnerController.find");
        assert_eq!(r.resolve("Owner", &ctx), "java.lang.Owner");
    }

    #[test]
    fn test_fallbacks() {
        let no_pkg = IdentifierContext::default();
        assert_eq!(resolver().resolve("Widget", &no_pkg), "java.lang.Widget");
        assert_eq!(resolver().resolve("var", &no_pkg), "var");
        assert_eq!(resolver().resolve("", &no_pkg), "");
        assert_eq!(resolver().resolve("   ", &no_pkg), "");
    }

    #[test]
    fn test_configured_tables() {
        let tables = ResolverTables::default()
            .with_well_known([("Pageable", "org.springframework.data.domain.Pageable")])
            .with_fallback_namespace("org.unknown.");
        let r = TypeResolver::new(tables, ResolverOptions::default());
        let ctx = IdentifierContext::default();
        assert_eq!(r.resolve("Pageable", &ctx), "org.springframework.data.domain.Pageable");
        assert_eq!(r.resolve("Thing", &ctx), "org.unknown.Thing");
    }

    #[test]
    fn test_signature_parse_and_qualify() {
        let sig = MethodSignature::parse("processFindForm (Owner,  BindingResult, Map<String, Pet>)").unwrap();
        assert_eq!(sig.name, "processFindForm");
        assert_eq!(sig.params, vec!["Owner", "BindingResult", "Map"]);

        let ctx = IdentifierContext::in_package("com.acme.owner");
        assert_eq!(
            sig.qualify(&resolver(), &ctx),
            "processFindForm(com.acme.owner.Owner,org.springframework.validation.BindingResult,java.util.Map)"
        );
    }

    #[test]
    fn test_signature_declared_params() {
        let sig = MethodSignature::parse("run(@Valid final Owner owner, String... names, int[] ids)").unwrap();
        assert_eq!(sig.params, vec!["Owner", "String[]", "int[]"]);
        assert_eq!(MethodSignature::parse("noParens"), None);
        assert_eq!(MethodSignature::parse("empty()").unwrap().params, Vec::<String>::new());
    }

    #[test]
    fn test_descriptor_decoding() {
        assert_eq!(
            decode_descriptor_params("(Ljava/lang/String;I[J)V").unwrap(),
            vec!["java.lang.String", "int", "long[]"]
        );
        assert_eq!(
            decode_descriptor_params("([[Lcom/acme/Owner$Pet;)Z").unwrap(),
            vec!["com.acme.Owner.Pet[][]"]
        );
        assert_eq!(decode_descriptor_params("()V").unwrap(), Vec::<String>::new());
        assert_eq!(decode_descriptor_params("(Q)V"), None);
    }
}
