use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const DEFAULT_WORKFLOWS_SUBDIR: &str = "Workflows";

/// Flow definition files found in an unpacked solution.
#[derive(Debug, Default)]
pub struct WorkflowFiles {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

pub struct WorkflowDiscovery {
    solution_dir: PathBuf,
    workflows_subdir: String,
}

impl WorkflowDiscovery {
    pub fn new(solution_dir: impl Into<PathBuf>) -> Self {
        Self {
            solution_dir: solution_dir.into(),
            workflows_subdir: DEFAULT_WORKFLOWS_SUBDIR.to_string(),
        }
    }

    pub fn with_workflows_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.workflows_subdir = subdir.into();
        self
    }

    pub fn workflows_dir(&self) -> PathBuf {
        self.solution_dir.join(&self.workflows_subdir)
    }

    /// Top-level `*.json` files of the workflows directory, sorted by name.
    pub fn scan(&self) -> WorkflowFiles {
        let workflows_dir = self.workflows_dir();
        let mut found = WorkflowFiles::default();

        if !workflows_dir.is_dir() {
            found.warnings.push(format!(
                "The workflows directory '{}' does not exist in the solution.",
                workflows_dir.display()
            ));
            return found;
        }

        info!("Scanning workflows in: {}", workflows_dir.display());

        found.files = WalkDir::new(&workflows_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_json(e.path()))
            .map(|e| e.into_path())
            .collect();

        debug!("Found {} workflow files", found.files.len());

        if found.files.is_empty() {
            found
                .warnings
                .push("No workflow JSON files found in the workflows directory.".to_string());
        }

        found
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
