//! Placeholder tokens
//!
//! Every `{{TOKEN}}` a bundled template may contain.

use std::fmt;

/// What a token stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Part of the server identity, always substituted
    Identity,

    /// Code injection point, empty unless a snippet is supplied
    Injection,

    /// Computed by the generator, such as the runtime dependency source
    Generated,
}

/// Category an injection point extends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Tool,
    Prompt,
    Resource,
}

/// A template placeholder token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Placeholder {
    ServerName,
    Version,
    Description,
    Author,
    RuntimeDependency,
    AdditionalTools,
    AdditionalToolHandlerFunctions,
    AdditionalToolCases,
    AdditionalToolHandlers,
    AdditionalPrompts,
    AdditionalPromptHandlerFunctions,
    AdditionalPromptCases,
    AdditionalPromptHandlers,
    AdditionalResources,
    AdditionalResourceHandlerFunctions,
    AdditionalResourceCases,
    AdditionalResourceHandlers,
}

impl Placeholder {
    pub const ALL: [Placeholder; 17] = [
        Placeholder::ServerName,
        Placeholder::Version,
        Placeholder::Description,
        Placeholder::Author,
        Placeholder::RuntimeDependency,
        Placeholder::AdditionalTools,
        Placeholder::AdditionalToolHandlerFunctions,
        Placeholder::AdditionalToolCases,
        Placeholder::AdditionalToolHandlers,
        Placeholder::AdditionalPrompts,
        Placeholder::AdditionalPromptHandlerFunctions,
        Placeholder::AdditionalPromptCases,
        Placeholder::AdditionalPromptHandlers,
        Placeholder::AdditionalResources,
        Placeholder::AdditionalResourceHandlerFunctions,
        Placeholder::AdditionalResourceCases,
        Placeholder::AdditionalResourceHandlers,
    ];

    /// Token name without braces
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::ServerName => "SERVER_NAME",
            Placeholder::Version => "VERSION",
            Placeholder::Description => "DESCRIPTION",
            Placeholder::Author => "AUTHOR",
            Placeholder::RuntimeDependency => "RUNTIME_DEPENDENCY",
            Placeholder::AdditionalTools => "ADDITIONAL_TOOLS",
            Placeholder::AdditionalToolHandlerFunctions => "ADDITIONAL_TOOL_HANDLER_FUNCTIONS",
            Placeholder::AdditionalToolCases => "ADDITIONAL_TOOL_CASES",
            Placeholder::AdditionalToolHandlers => "ADDITIONAL_TOOL_HANDLERS",
            Placeholder::AdditionalPrompts => "ADDITIONAL_PROMPTS",
            Placeholder::AdditionalPromptHandlerFunctions => "ADDITIONAL_PROMPT_HANDLER_FUNCTIONS",
            Placeholder::AdditionalPromptCases => "ADDITIONAL_PROMPT_CASES",
            Placeholder::AdditionalPromptHandlers => "ADDITIONAL_PROMPT_HANDLERS",
            Placeholder::AdditionalResources => "ADDITIONAL_RESOURCES",
            Placeholder::AdditionalResourceHandlerFunctions => {
                "ADDITIONAL_RESOURCE_HANDLER_FUNCTIONS"
            }
            Placeholder::AdditionalResourceCases => "ADDITIONAL_RESOURCE_CASES",
            Placeholder::AdditionalResourceHandlers => "ADDITIONAL_RESOURCE_HANDLERS",
        }
    }

    /// Token as it appears in a template
    pub fn marker(self) -> String {
        format!("{{{{{}}}}}", self.name())
    }

    /// Look up a token by name, with or without surrounding braces
    pub fn from_name(name: &str) -> Option<Placeholder> {
        let name = name.trim();
        let name = name
            .strip_prefix("{{")
            .and_then(|n| n.strip_suffix("}}"))
            .unwrap_or(name);
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn kind(self) -> PlaceholderKind {
        match self {
            Placeholder::ServerName
            | Placeholder::Version
            | Placeholder::Description
            | Placeholder::Author => PlaceholderKind::Identity,
            Placeholder::RuntimeDependency => PlaceholderKind::Generated,
            _ => PlaceholderKind::Injection,
        }
    }

    pub fn category(self) -> Option<Category> {
        use Placeholder::*;
        match self {
            AdditionalTools | AdditionalToolHandlerFunctions | AdditionalToolCases
            | AdditionalToolHandlers => Some(Category::Tool),
            AdditionalPrompts | AdditionalPromptHandlerFunctions | AdditionalPromptCases
            | AdditionalPromptHandlers => Some(Category::Prompt),
            AdditionalResources | AdditionalResourceHandlerFunctions | AdditionalResourceCases
            | AdditionalResourceHandlers => Some(Category::Resource),
            ServerName | Version | Description | Author | RuntimeDependency => None,
        }
    }

    /// One-line description for `placeholders` output
    pub fn description(self) -> &'static str {
        use Placeholder::*;
        match self {
            ServerName => "Server name; crate name, binary name and resource URI scheme",
            Version => "Server version",
            Description => "Human-readable server description",
            Author => "Author shown in the info resource and Cargo.toml",
            RuntimeDependency => "Path or git source of the runtime crate in Cargo.toml",
            AdditionalTools => "Extra tool descriptors appended to the tool list",
            AdditionalPrompts => "Extra prompt descriptors appended to the prompt list",
            AdditionalResources => "Extra resource descriptors appended to the resource list",
            AdditionalToolHandlerFunctions
            | AdditionalPromptHandlerFunctions
            | AdditionalResourceHandlerFunctions => "Handler functions defined at module level",
            AdditionalToolCases | AdditionalPromptCases | AdditionalResourceCases => {
                "Dispatch arms routing a name to a handler function"
            }
            AdditionalToolHandlers | AdditionalPromptHandlers | AdditionalResourceHandlers => {
                "Dispatch arms with inline handler bodies"
            }
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}}}}}", self.name())
    }
}
