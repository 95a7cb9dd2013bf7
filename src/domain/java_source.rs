//! Java Source Scanning
//!
//! Line-oriented, regex-based extraction of what the probes need from a Java
//! file: package, imports, declared types and method boundaries. Method
//! boundaries come from a declaration-line pattern: a method runs from its
//! declaration line to the line before the next declaration, or to the
//! closing brace of its type. Types are tracked by brace depth so nested
//! types own their own members.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::domain::resolver::{IdentifierContext, MethodSignature, TypeResolver};

const NOT_A_RETURN_TYPE: &[&str] = &[
    "return", "new", "else", "throw", "case", "if", "while", "for", "switch", "catch", "do",
    "yield", "assert", "public", "protected", "private", "static", "final", "abstract",
    "synchronized", "native", "default", "strictfp",
];

fn package_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*package\s+([\w.]+)\s*;").expect("valid regex"))
}

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*import\s+(static\s+)?([\w.]+(?:\.\*)?)\s*;").expect("valid regex"))
}

fn type_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?:public|protected|private|abstract|static|final|sealed|non-sealed|strictfp)\s+)*(?:class|interface|enum|record)\s+(\w+)",
        )
        .expect("valid regex")
    })
}

fn method_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?:public|protected|private|static|final|abstract|synchronized|native|default|strictfp)\s+)*(?:<[^>]*>\s+)?([\w.$]+(?:<[^()]*>)?(?:\[\])*)\s+(\w+)\s*\(([^)]*)",
        )
        .expect("valid regex")
    })
}

fn path_package_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[\\/])((?:org|com|net|io|edu)(?:[\\/]\w+)*)[\\/](\w+)\.java$").expect("valid regex")
    })
}

fn maven_layout_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"src[\\/]main[\\/]java[\\/](.*)[\\/](\w+)\.java$").expect("valid regex"))
}

fn constructor_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(?:public|protected|private)\s+)?(?:<[^>]*>\s+)?(\w+)\s*\(([^)]*)")
            .expect("valid regex")
    })
}

/// A declared type. `path` is the dotted chain of enclosing types
/// (`Outer.Inner`); `end_line` is the line holding its closing brace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub path: String,
    pub line: usize,
    pub end_line: usize,
}

impl TypeDecl {
    pub fn contains(&self, line: usize) -> bool {
        self.line <= line && line <= self.end_line
    }
}

/// A method's declaration and the line range attributed to it (1-based,
/// inclusive). Constructors are spans named after their type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpan {
    pub name: String,
    pub params: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
}

impl MethodSpan {
    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

#[derive(Debug, Clone, Default)]
pub struct JavaUnit {
    pub package: Option<String>,
    pub imports: Vec<String>,
    pub types: Vec<TypeDecl>,
    pub methods: Vec<MethodSpan>,
}

/// A type whose body has not been closed yet.
struct OpenType {
    index: usize,
    depth_before: i64,
    opened: bool,
}

struct OpenMethod {
    name: String,
    params: Vec<String>,
    start_line: usize,
    owner: Option<usize>,
}

impl OpenMethod {
    fn close(self, end_line: usize) -> MethodSpan {
        MethodSpan {
            name: self.name,
            params: self.params,
            start_line: self.start_line,
            end_line: end_line.max(self.start_line),
        }
    }
}

impl JavaUnit {
    pub fn parse(source: &str) -> Self {
        let mut unit = JavaUnit::default();
        let lines: Vec<&str> = source.lines().collect();
        let mut open_types: Vec<OpenType> = Vec::new();
        let mut method: Option<OpenMethod> = None;
        let mut depth = 0i64;
        let mut in_comment = false;

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            let depth_before = depth;
            depth += brace_delta(line, &mut in_comment);

            if unit.package.is_none() {
                if let Some(caps) = package_re().captures(line) {
                    unit.package = Some(caps[1].to_string());
                    continue;
                }
            }
            if let Some(caps) = import_re().captures(line) {
                if caps.get(1).is_none() {
                    unit.imports.push(caps[2].to_string());
                }
                continue;
            }

            if let Some(caps) = type_decl_re().captures(line) {
                if let Some(open) = method.take() {
                    unit.methods.push(open.close(line_no - 1));
                }
                let name = caps[1].to_string();
                let path = match open_types.last() {
                    Some(outer) => format!("{}.{name}", unit.types[outer.index].path),
                    None => name.clone(),
                };
                unit.types.push(TypeDecl {
                    name,
                    path,
                    line: line_no,
                    end_line: lines.len(),
                });
                open_types.push(OpenType {
                    index: unit.types.len() - 1,
                    depth_before,
                    opened: false,
                });
            } else {
                let enclosing = open_types.last().map(|t| unit.types[t.index].name.as_str());
                if let Some((name, params)) = method_declaration(line, enclosing) {
                    if let Some(open) = method.take() {
                        unit.methods.push(open.close(line_no - 1));
                    }
                    method = Some(OpenMethod {
                        name,
                        params,
                        start_line: line_no,
                        owner: open_types.last().map(|t| t.index),
                    });
                }
            }

            // close every type whose body ended on this line
            if let Some(top) = open_types.last_mut() {
                if depth > top.depth_before {
                    top.opened = true;
                }
            }
            while let Some(top) = open_types.last() {
                if !(top.opened && depth <= top.depth_before) {
                    break;
                }
                unit.types[top.index].end_line = line_no;
                if method.as_ref().is_some_and(|m| m.owner == Some(top.index)) {
                    if let Some(open) = method.take() {
                        unit.methods.push(open.close(line_no));
                    }
                }
                open_types.pop();
                if let Some(outer) = open_types.last_mut() {
                    outer.opened = outer.opened || depth > outer.depth_before;
                }
            }
        }

        if let Some(open) = method {
            unit.methods.push(open.close(lines.len()));
        }
        unit
    }

    /// The method whose span covers `line` (1-based).
    pub fn method_at(&self, line: usize) -> Option<&MethodSpan> {
        self.methods.iter().find(|m| m.contains(line))
    }

    /// Dotted path (`Outer.Inner`) of the innermost type open at `line`.
    pub fn owner_of(&self, line: usize) -> Option<&str> {
        self.types
            .iter()
            .filter(|t| t.contains(line))
            .max_by_key(|t| t.line)
            .map(|t| t.path.as_str())
    }

    /// Dotted path of the type declared as `name`, if this file declares it.
    pub fn type_path(&self, name: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.path.as_str())
    }

    pub fn qualify_type(&self, simple: &str) -> String {
        match self.package.as_deref() {
            Some(pkg) => format!("{pkg}.{simple}"),
            None => simple.to_string(),
        }
    }

    pub fn context(&self) -> IdentifierContext {
        IdentifierContext::in_package(self.package.clone().unwrap_or_default())
            .with_imports(self.imports.iter().cloned())
            .with_seen_types(self.types.iter().map(|t| self.qualify_type(&t.name)))
    }

    /// `pkg.Owner.method(resolved params)` for one span.
    pub fn method_fqn(
        &self,
        span: &MethodSpan,
        owner: &str,
        resolver: &TypeResolver,
        ctx: &IdentifierContext,
    ) -> String {
        let signature = MethodSignature {
            name: span.name.clone(),
            params: span.params.clone(),
        };
        format!("{}.{}", self.qualify_type(owner), signature.qualify(resolver, ctx))
    }
}

/// Net `{` minus `}` on a line, ignoring literals and comments.
fn brace_delta(line: &str, in_comment: &mut bool) -> i64 {
    let mut delta = 0;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if *in_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_comment = false;
            }
            continue;
        }
        match c {
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_comment = true;
            }
            '"' | '\'' => {
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == c {
                        break;
                    }
                }
            }
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

fn method_declaration(line: &str, enclosing: Option<&str>) -> Option<(String, Vec<String>)> {
    let trimmed = line.trim_end();
    if trimmed.ends_with(';') {
        return None;
    }
    let (name, raw_params) = match constructor_decl_re()
        .captures(line)
        .filter(|caps| enclosing == Some(&caps[1]))
    {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => {
            let caps = method_decl_re().captures(line)?;
            if NOT_A_RETURN_TYPE.contains(&caps.get(1)?.as_str()) {
                return None;
            }
            (caps[2].to_string(), caps[3].to_string())
        }
    };
    let params = MethodSignature::parse(&format!("{name}({raw_params})"))
        .map(|sig| sig.params)
        .unwrap_or_default();
    Some((name, params))
}

/// Derive `(package, class)` from a source path such as
/// `src/main/java/org/acme/owner/Owner.java`.
pub fn package_and_class_from_path(rel_path: &str) -> (String, String) {
    let class = Path::new(rel_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let package_path = if let Some(caps) = path_package_re().captures(rel_path) {
        caps[1].to_string()
    } else if let Some(caps) = maven_layout_re().captures(rel_path) {
        caps[1].to_string()
    } else {
        Path::new(rel_path)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default()
    };

    let package = package_path
        .replace(['/', '\\'], ".")
        .trim_matches('.')
        .to_string();
    (package, class)
}
