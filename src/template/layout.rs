//! Bundled template layouts
//!
//! Each layout is a fixed set of files rendered into a new server project.

use std::fmt;
use std::str::FromStr;

use crate::error::TemplateError;

const CARGO_TOML: &str = include_str!("../../templates/shared/Cargo.toml.tmpl");
const README: &str = include_str!("../../templates/shared/README.md.tmpl");
const FULL_MAIN: &str = include_str!("../../templates/full/main.rs.tmpl");
const STARTER_MAIN: &str = include_str!("../../templates/starter/main.rs.tmpl");

/// A template file and the project-relative path it renders to
#[derive(Debug, Clone, Copy)]
pub struct TemplateFile {
    pub path: &'static str,
    pub source: &'static str,
}

const FULL_FILES: &[TemplateFile] = &[
    TemplateFile {
        path: "Cargo.toml",
        source: CARGO_TOML,
    },
    TemplateFile {
        path: "src/main.rs",
        source: FULL_MAIN,
    },
    TemplateFile {
        path: "README.md",
        source: README,
    },
];

const STARTER_FILES: &[TemplateFile] = &[
    TemplateFile {
        path: "Cargo.toml",
        source: CARGO_TOML,
    },
    TemplateFile {
        path: "src/main.rs",
        source: STARTER_MAIN,
    },
    TemplateFile {
        path: "README.md",
        source: README,
    },
];

/// Project layout to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Tools, prompts and resources with every injection point
    #[default]
    Full,

    /// Single echo tool with inline dispatch arms
    Starter,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::Full, Layout::Starter];

    pub fn name(self) -> &'static str {
        match self {
            Layout::Full => "full",
            Layout::Starter => "starter",
        }
    }

    pub fn files(self) -> &'static [TemplateFile] {
        match self {
            Layout::Full => FULL_FILES,
            Layout::Starter => STARTER_FILES,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layout {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layout::ALL
            .into_iter()
            .find(|layout| layout.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TemplateError::UnknownLayout {
                name: s.to_string(),
            })
    }
}
