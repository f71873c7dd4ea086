//! Placeholder substitution
//!
//! Rendering is a single left-to-right pass: substituted text is never
//! re-scanned, and the output is checked for leftover markers afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::ServerIdentity;
use crate::error::{ConfigError, Result, TemplateError};
use crate::template::placeholder::{Placeholder, PlaceholderKind};

/// Crate name generated projects depend on for the runtime
pub const RUNTIME_CRATE: &str = env!("CARGO_PKG_NAME");

/// Where a generated project gets the runtime crate from
///
/// The runtime is not on a registry, so the manifest always names a
/// path or git source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeSource {
    Path(PathBuf),
    Git(String),
}

impl RuntimeSource {
    /// The source tree this binary was built from
    pub fn local() -> Self {
        RuntimeSource::Path(PathBuf::from(env!("CARGO_MANIFEST_DIR")))
    }

    /// A local checkout; must exist, and is made absolute so the
    /// manifest resolves from any output directory
    pub fn path(path: &Path) -> Result<Self> {
        let path = std::fs::canonicalize(path).map_err(|e| ConfigError::InvalidValue {
            field: "runtime path".to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(RuntimeSource::Path(path))
    }

    pub fn git(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                field: "runtime git url".to_string(),
            }
            .into());
        }
        Ok(RuntimeSource::Git(url))
    }

    /// Inline TOML table for the manifest's dependency entry
    pub fn dependency(&self) -> String {
        match self {
            RuntimeSource::Path(path) => {
                format!("{{ path = {} }}", toml_string(&path.to_string_lossy()))
            }
            RuntimeSource::Git(url) => format!("{{ git = {} }}", toml_string(url)),
        }
    }
}

/// JSON string escapes are valid in TOML basic strings
fn toml_string(value: &str) -> String {
    Value::from(value).to_string()
}

/// Values substituted into templates
#[derive(Debug, Clone)]
pub struct TemplateContext {
    identity: ServerIdentity,
    runtime_dependency: String,
    snippets: BTreeMap<Placeholder, String>,
}

impl TemplateContext {
    /// Create a context for `identity`, validating it first
    ///
    /// Identity values land inside Rust and TOML string literals, so on top
    /// of [`ServerIdentity::validate`] they must be single-line and free of
    /// quotes and backslashes, and the version must be `MAJOR.MINOR.PATCH`.
    pub fn new(identity: ServerIdentity) -> Result<Self> {
        identity.validate()?;
        check_literal_safe("version", &identity.version)?;
        check_literal_safe("description", &identity.description)?;
        check_literal_safe("author", &identity.author)?;
        check_version(&identity.version)?;
        if identity.name == RUNTIME_CRATE {
            return Err(ConfigError::InvalidName {
                name: identity.name,
                message: "clashes with the runtime crate generated projects depend on".to_string(),
            }
            .into());
        }

        Ok(Self {
            identity,
            runtime_dependency: RuntimeSource::local().dependency(),
            snippets: BTreeMap::new(),
        })
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    /// Point generated manifests at `source` instead of this build's tree
    pub fn set_runtime(&mut self, source: RuntimeSource) {
        self.runtime_dependency = source.dependency();
    }

    /// Set the snippet for an injection point
    pub fn set_snippet(&mut self, placeholder: Placeholder, snippet: impl Into<String>) -> Result<()> {
        if placeholder.kind() != PlaceholderKind::Injection {
            return Err(TemplateError::InvalidSnippets {
                message: format!("{} is set by the generator, not an injection point", placeholder),
            }
            .into());
        }
        self.snippets.insert(placeholder, snippet.into());
        Ok(())
    }

    /// Load snippets from a JSON object mapping token names to snippet text
    pub fn load_snippets(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        self.apply_snippets(&value)
    }

    /// Apply snippets from a parsed JSON object
    pub fn apply_snippets(&mut self, value: &Value) -> Result<()> {
        let object = value.as_object().ok_or_else(|| TemplateError::InvalidSnippets {
            message: "expected a JSON object of token names to snippet text".to_string(),
        })?;

        for (key, snippet) in object {
            let placeholder =
                Placeholder::from_name(key).ok_or_else(|| TemplateError::InvalidSnippets {
                    message: format!("unknown placeholder '{}'", key),
                })?;
            let snippet = match snippet {
                Value::String(s) => s.clone(),
                Value::Array(lines) => lines
                    .iter()
                    .map(|line| {
                        line.as_str().map(str::to_string).ok_or_else(|| {
                            TemplateError::InvalidSnippets {
                                message: format!("'{}' must contain only strings", key),
                            }
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?
                    .join("\n"),
                _ => {
                    return Err(TemplateError::InvalidSnippets {
                        message: format!("'{}' must be a string or an array of lines", key),
                    }
                    .into())
                }
            };
            self.set_snippet(placeholder, snippet)?;
        }

        Ok(())
    }

    /// Replacement text for a placeholder
    pub fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::ServerName => self.identity.name.as_str(),
            Placeholder::Version => self.identity.version.as_str(),
            Placeholder::Description => self.identity.description.as_str(),
            Placeholder::Author => self.identity.author.as_str(),
            Placeholder::RuntimeDependency => self.runtime_dependency.as_str(),
            other => self.snippets.get(&other).map(String::as_str).unwrap_or(""),
        }
    }

    /// Substitute every placeholder in `template`
    pub fn render(&self, template: &str) -> Result<String> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;
        let mut consumed = 0;

        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            match marker_name(after) {
                Some(name) => {
                    let placeholder = Placeholder::from_name(name).ok_or_else(|| {
                        TemplateError::UnknownPlaceholder {
                            name: name.to_string(),
                            offset: consumed + start,
                        }
                    })?;
                    output.push_str(self.value(placeholder));
                    let len = 2 + name.len() + 2;
                    consumed += start + len;
                    rest = &rest[start + len..];
                }
                None => {
                    // Not a marker, e.g. an escaped brace in generated code
                    output.push('{');
                    consumed += start + 1;
                    rest = &rest[start + 1..];
                }
            }
        }
        output.push_str(rest);

        if let Some(name) = find_marker(&output) {
            return Err(TemplateError::ResidualPlaceholder {
                name: name.to_string(),
            }
            .into());
        }

        Ok(output)
    }
}

fn check_literal_safe(field: &str, value: &str) -> Result<()> {
    if value.chars().any(|c| c == '"' || c == '\\' || c.is_control()) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: "must be a single line without quotes or backslashes".to_string(),
        }
        .into());
    }
    Ok(())
}

fn check_version(version: &str) -> Result<()> {
    let core = version.split(['-', '+']).next().unwrap_or_default();
    let parts: Vec<&str> = core.split('.').collect();
    let numeric = |p: &&str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());

    if parts.len() != 3 || !parts.iter().all(numeric) {
        return Err(ConfigError::InvalidValue {
            field: "version".to_string(),
            message: format!("'{}' is not MAJOR.MINOR.PATCH", version),
        }
        .into());
    }
    Ok(())
}

/// Name of the marker starting right after `{{`, if the text forms one
fn marker_name(after_open: &str) -> Option<&str> {
    let end = after_open.find("}}")?;
    let name = &after_open[..end];
    is_marker_name(name).then_some(name)
}

fn is_marker_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// First `{{NAME}}` marker in `text`
pub fn find_marker(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        if let Some(name) = marker_name(after) {
            return Some(name);
        }
        rest = &rest[start + 1..];
    }
    None
}

/// Every distinct placeholder referenced by `template`, in order of first use
pub fn placeholders_in(template: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        if let Some(p) = marker_name(after).and_then(Placeholder::from_name) {
            if !found.contains(&p) {
                found.push(p);
            }
        }
        rest = &rest[start + 1..];
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> TemplateContext {
        TemplateContext::new(
            ServerIdentity::new("notes", "1.0.0")
                .with_description("Keeps notes")
                .with_author("Grace"),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_values_unsafe_in_literals() {
        let base = ServerIdentity::new("notes", "1.0.0");
        for identity in [
            base.clone().with_description("say \"hi\""),
            base.clone().with_author("a\\b"),
            base.clone().with_description("two\nlines"),
            ServerIdentity::new("notes", "1.0"),
            ServerIdentity::new("notes", "v1.0.0"),
        ] {
            assert!(TemplateContext::new(identity).is_err());
        }
        assert!(TemplateContext::new(ServerIdentity::new("notes", "1.2.3-beta.1")).is_ok());
    }

    #[test]
    fn test_rejects_runtime_crate_name() {
        assert!(TemplateContext::new(ServerIdentity::new(RUNTIME_CRATE, "1.0.0")).is_err());
    }

    #[test]
    fn test_runtime_dependency_defaults_to_local_tree() {
        let out = context().render("rt = {{RUNTIME_DEPENDENCY}}").unwrap();
        let expected = format!("rt = {{ path = {} }}", toml_string(env!("CARGO_MANIFEST_DIR")));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_runtime_dependency_sources() {
        let mut ctx = context();
        ctx.set_runtime(RuntimeSource::git("https://example.com/rt.git").unwrap());
        assert_eq!(
            ctx.value(Placeholder::RuntimeDependency),
            "{ git = \"https://example.com/rt.git\" }"
        );

        assert_eq!(
            RuntimeSource::Path(PathBuf::from("C:\\rt \"x\"")).dependency(),
            "{ path = \"C:\\\\rt \\\"x\\\"\" }"
        );
        assert!(RuntimeSource::git(" ").is_err());
    }

    #[test]
    fn test_runtime_path_is_made_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let source = RuntimeSource::path(dir.path()).unwrap();
        let RuntimeSource::Path(path) = source else {
            panic!("expected a path source");
        };
        assert!(path.is_absolute());
        assert!(RuntimeSource::path(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_substitutes_identity() {
        let out = context()
            .render("{{SERVER_NAME}} v{{VERSION}} by {{AUTHOR}}: {{DESCRIPTION}}")
            .unwrap();
        assert_eq!(out, "notes v1.0.0 by Grace: Keeps notes");
    }

    #[test]
    fn test_injection_defaults_to_empty() {
        let out = context().render("a[{{ADDITIONAL_TOOLS}}]b").unwrap();
        assert_eq!(out, "a[]b");
    }

    #[test]
    fn test_snippet_substitution() {
        let mut ctx = context();
        ctx.set_snippet(Placeholder::AdditionalToolCases, "\"x\" => x(),").unwrap();
        let out = ctx.render("match n { {{ADDITIONAL_TOOL_CASES}} }").unwrap();
        assert_eq!(out, "match n { \"x\" => x(), }");
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = context().render("hello {{NOT_A_TOKEN}}").unwrap_err();
        assert!(err.to_string().contains("Unknown placeholder {{NOT_A_TOKEN}} at byte 6"));
    }

    #[test]
    fn test_non_marker_braces_survive() {
        let out = context().render("format!(\"{{}}\") {{ lower }} {{SERVER_NAME}}").unwrap();
        assert_eq!(out, "format!(\"{{}}\") {{ lower }} notes");
    }

    #[test]
    fn test_marker_inside_extra_braces() {
        let out = context().render("{{{SERVER_NAME}}}").unwrap();
        assert_eq!(out, "{notes}");
    }

    #[test]
    fn test_snippet_is_not_rescanned_but_residue_is_caught() {
        let mut ctx = context();
        ctx.set_snippet(Placeholder::AdditionalTools, "{{AUTHOR}}").unwrap();
        let err = ctx.render("{{ADDITIONAL_TOOLS}}").unwrap_err();
        assert!(err.to_string().contains("Residual placeholder {{AUTHOR}}"));
    }

    #[test]
    fn test_identity_not_settable_as_snippet() {
        assert!(context().set_snippet(Placeholder::ServerName, "x").is_err());
    }

    #[test]
    fn test_apply_snippets() {
        let mut ctx = context();
        ctx.apply_snippets(&json!({
            "{{ADDITIONAL_PROMPTS}}": "prompt_a(),",
            "ADDITIONAL_PROMPT_CASES": ["\"a\" => a(),", "\"b\" => b(),"]
        }))
        .unwrap();
        assert_eq!(ctx.value(Placeholder::AdditionalPrompts), "prompt_a(),");
        assert_eq!(
            ctx.value(Placeholder::AdditionalPromptCases),
            "\"a\" => a(),\n\"b\" => b(),"
        );
    }

    #[test]
    fn test_apply_snippets_rejects_bad_input() {
        let mut ctx = context();
        assert!(ctx.apply_snippets(&json!(["x"])).is_err());
        assert!(ctx.apply_snippets(&json!({"BOGUS": "x"})).is_err());
        assert!(ctx.apply_snippets(&json!({"ADDITIONAL_TOOLS": 3})).is_err());
        assert!(ctx.apply_snippets(&json!({"VERSION": "2"})).is_err());
        assert!(ctx.apply_snippets(&json!({"RUNTIME_DEPENDENCY": "x"})).is_err());
    }

    #[test]
    fn test_placeholders_in() {
        let found = placeholders_in("{{VERSION}} {{SERVER_NAME}} {{VERSION}} {{x}}");
        assert_eq!(found, vec![Placeholder::Version, Placeholder::ServerName]);
    }

    #[test]
    fn test_find_marker() {
        assert_eq!(find_marker("a {{ b }} {{C_1}}"), Some("C_1"));
        assert_eq!(find_marker("nothing {{here"), None);
    }
}
