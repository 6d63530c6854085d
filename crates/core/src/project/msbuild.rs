use crate::error::{Result, ScopeError};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectProperties {
    pub assembly_name: Option<String>,
    pub root_namespace: Option<String>,
}

impl ProjectProperties {
    /// Assembly name, defaulting to the project file stem like the build system does.
    pub fn assembly_name_or_stem(&self, project_path: &Path) -> String {
        self.assembly_name.clone().unwrap_or_else(|| {
            project_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

pub fn read_project_properties(path: &Path) -> Result<ProjectProperties> {
    let contents = std::fs::read_to_string(path)?;
    parse_project_properties(path, &contents)
}

pub fn parse_project_properties(path: &Path, contents: &str) -> Result<ProjectProperties> {
    let doc = roxmltree::Document::parse(contents).map_err(|source| ScopeError::Xml {
        path: path.to_path_buf(),
        source,
    })?;

    let project = doc.root_element();
    Ok(ProjectProperties {
        assembly_name: last_property(&project, "AssemblyName"),
        root_namespace: last_property(&project, "RootNamespace"),
    })
}

/// Value of the last non-empty `<name>` across all top-level property groups.
///
/// Property names compare case-insensitively; later groups override earlier ones.
fn last_property(project: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    project
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "PropertyGroup")
        .flat_map(|group| group.children().filter(|n| n.is_element()))
        .filter(|prop| prop.tag_name().name().eq_ignore_ascii_case(name))
        .filter_map(|prop| prop.text().map(str::trim).filter(|t| !t.is_empty()))
        .last()
        .map(str::to_string)
}
