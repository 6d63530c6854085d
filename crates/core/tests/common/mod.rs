#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CSHARP_PROJECT_GUID: &str = "FAE04EC0-301F-11D3-BF4B-00C04F79EFBC";

/// A throwaway source tree of solutions, projects and C# files.
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("fixture path has a parent")).expect("create dirs");
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    /// A solution whose project entries point at `projects` (paths relative to the solution).
    pub fn solution(&self, relative: &str, projects: &[&str]) -> PathBuf {
        let mut text = String::from(
            "\u{feff}\nMicrosoft Visual Studio Solution File, Format Version 12.00\n# Visual Studio Version 17\n",
        );
        for (i, project) in projects.iter().enumerate() {
            let name = Path::new(&project.replace('\\', "/"))
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            text.push_str(&format!(
                "Project(\"{{{CSHARP_PROJECT_GUID}}}\") = \"{name}\", \"{project}\", \"{{11111111-2222-3333-4444-{i:012}}}\"\nEndProject\n"
            ));
        }
        text.push_str("Global\nEndGlobal\n");
        self.write(relative, &text)
    }

    pub fn project(&self, relative: &str, root_namespace: Option<&str>) -> PathBuf {
        let properties = root_namespace
            .map(|ns| format!("<RootNamespace>{ns}</RootNamespace>"))
            .unwrap_or_default();
        self.write(
            relative,
            &format!(
                "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <TargetFramework>net8.0</TargetFramework>\n    {properties}\n  </PropertyGroup>\n</Project>\n"
            ),
        )
    }
}

pub fn file_names(paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect()
}
