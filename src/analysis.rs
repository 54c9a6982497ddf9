use crate::discovery::{WorkflowDiscovery, DEFAULT_WORKFLOWS_SUBDIR};
use crate::document::WorkflowDocument;
use crate::error::AnalysisError;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One of the flow analyzers (trigger, action or field dependency).
pub trait DefinitionAnalyzer: Sync {
    type Match: Send;

    /// Short description of the request, used in logs.
    fn describe(&self) -> String;

    /// Set when the request names an event or verb nobody knows; the scan is
    /// then skipped and the message reported as a warning.
    fn vocabulary_warning(&self) -> Option<String> {
        None
    }

    /// Matches in a single definition, in discovery order.
    fn analyze_document(&self, document: &WorkflowDocument, file_name: &str) -> Vec<Self::Match>;
}

/// Outcome of scanning a set of definition files.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis<T> {
    pub matches: Vec<T>,
    pub warnings: Vec<String>,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

impl<T> Analysis<T> {
    fn empty(warnings: Vec<String>) -> Self {
        Self {
            matches: Vec::new(),
            warnings,
            files_scanned: 0,
            files_skipped: 0,
        }
    }
}

pub struct FlowScanner {
    parallel: bool,
    workflows_subdir: String,
}

impl FlowScanner {
    pub fn new() -> Self {
        Self {
            parallel: true,
            workflows_subdir: DEFAULT_WORKFLOWS_SUBDIR.to_string(),
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_workflows_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.workflows_subdir = subdir.into();
        self
    }

    /// Analyze every flow in an unpacked solution directory.
    pub fn scan_solution<A: DefinitionAnalyzer>(
        &self,
        analyzer: &A,
        solution_dir: &Path,
    ) -> Result<Analysis<A::Match>, AnalysisError> {
        if solution_dir.as_os_str().is_empty() {
            return Err(AnalysisError::InvalidArgument {
                name: "Solution directory",
            });
        }
        if !solution_dir.is_dir() {
            return Err(AnalysisError::DirectoryNotFound(solution_dir.to_path_buf()));
        }

        if let Some(warning) = analyzer.vocabulary_warning() {
            warn!("{}", warning);
            return Ok(Analysis::empty(vec![warning]));
        }

        let found = WorkflowDiscovery::new(solution_dir)
            .with_workflows_subdir(self.workflows_subdir.clone())
            .scan();
        for warning in &found.warnings {
            warn!("{}", warning);
        }

        if found.files.is_empty() {
            return Ok(Analysis::empty(found.warnings));
        }

        let mut analysis = self.scan_files(analyzer, &found.files);
        analysis.warnings.splice(0..0, found.warnings);
        Ok(analysis)
    }

    /// Analyze an explicit list of definition files.
    ///
    /// A file that cannot be read or parsed is reported and skipped. Matches
    /// keep file order even when files are processed in parallel.
    pub fn scan_files<A: DefinitionAnalyzer>(
        &self,
        analyzer: &A,
        files: &[PathBuf],
    ) -> Analysis<A::Match> {
        if let Some(warning) = analyzer.vocabulary_warning() {
            warn!("{}", warning);
            return Analysis::empty(vec![warning]);
        }

        if files.is_empty() {
            let warning = "No workflow JSON files to analyze.".to_string();
            warn!("{}", warning);
            return Analysis::empty(vec![warning]);
        }

        info!("Analyzing {} flows for {}", files.len(), analyzer.describe());

        let outcomes: Vec<Result<Vec<A::Match>, AnalysisError>> = if self.parallel {
            files.par_iter().map(|path| analyze_file(analyzer, path)).collect()
        } else {
            files.iter().map(|path| analyze_file(analyzer, path)).collect()
        };

        let mut analysis = Analysis::empty(Vec::new());
        for outcome in outcomes {
            match outcome {
                Ok(mut matches) => {
                    analysis.files_scanned += 1;
                    analysis.matches.append(&mut matches);
                }
                Err(e) => {
                    let warning = e.to_string();
                    warn!("{}", warning);
                    analysis.files_skipped += 1;
                    analysis.warnings.push(warning);
                }
            }
        }

        debug!(
            "{} matches in {} files ({} skipped)",
            analysis.matches.len(),
            analysis.files_scanned,
            analysis.files_skipped
        );

        analysis
    }
}

impl Default for FlowScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn analyze_file<A: DefinitionAnalyzer>(
    analyzer: &A,
    path: &Path,
) -> Result<Vec<A::Match>, AnalysisError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let content = fs::read_to_string(path).map_err(|source| AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    // Solution exports often save definitions with a UTF-8 byte order mark.
    let text = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let document = WorkflowDocument::parse(text).map_err(|source| AnalysisError::Parse {
        file: file_name.clone(),
        source,
    })?;

    debug!("Analyzing {}", file_name);
    Ok(analyzer.analyze_document(&document, &file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionOperationAnalyzer;
    use crate::fields::{AnalysisScope, FieldDependencyAnalyzer};
    use crate::triggers::TriggerEventAnalyzer;
    use serde_json::Value;
    use std::fs;

    /// Reports every top-level action name.
    struct ActionNames {
        unknown_vocabulary: bool,
    }

    impl DefinitionAnalyzer for ActionNames {
        type Match = (String, String);

        fn describe(&self) -> String {
            "action names".to_string()
        }

        fn vocabulary_warning(&self) -> Option<String> {
            self.unknown_vocabulary.then(|| "unknown verb".to_string())
        }

        fn analyze_document(&self, document: &WorkflowDocument, file_name: &str) -> Vec<Self::Match> {
            document
                .actions()
                .map(|actions| {
                    actions
                        .keys()
                        .map(|name| (file_name.to_string(), name.clone()))
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    fn flow_with_actions(names: &[&str]) -> String {
        let actions: serde_json::Map<String, Value> = names
            .iter()
            .map(|name| (name.to_string(), serde_json::json!({ "type": "Compose" })))
            .collect();
        serde_json::json!({ "properties": { "definition": { "actions": actions } } }).to_string()
    }

    fn solution_with(files: &[(&str, String)]) -> tempfile::TempDir {
        let solution = tempfile::tempdir().unwrap();
        let workflows = solution.path().join("Workflows");
        fs::create_dir(&workflows).unwrap();
        for (name, content) in files {
            fs::write(workflows.join(name), content).unwrap();
        }
        solution
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let analyzer = ActionNames { unknown_vocabulary: false };
        let result = FlowScanner::new().scan_solution(&analyzer, Path::new("/no/such/solution/dir"));
        assert!(matches!(result, Err(AnalysisError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_malformed_file_is_isolated() {
        let solution = solution_with(&[
            ("a-broken.json", "{ \"properties\": ".to_string()),
            ("b-valid.json", flow_with_actions(&["Compose_1", "Compose_2"])),
        ]);
        let analyzer = ActionNames { unknown_vocabulary: false };

        for parallel in [true, false] {
            let analysis = FlowScanner::new()
                .with_parallel(parallel)
                .scan_solution(&analyzer, solution.path())
                .unwrap();
            assert_eq!(analysis.matches.len(), 2);
            assert!(analysis.matches.iter().all(|(file, _)| file == "b-valid.json"));
            assert_eq!(analysis.files_scanned, 1);
            assert_eq!(analysis.files_skipped, 1);
            assert_eq!(analysis.warnings.len(), 1);
            assert!(analysis.warnings[0].contains("a-broken.json"));
        }
    }

    #[test]
    fn test_parallel_scan_keeps_file_order() {
        let files: Vec<(String, String)> = (0..20)
            .map(|i| (format!("flow-{:02}.json", i), flow_with_actions(&["First", "Second"])))
            .collect();
        let refs: Vec<(&str, String)> = files.iter().map(|(n, c)| (n.as_str(), c.clone())).collect();
        let solution = solution_with(&refs);

        let analysis = FlowScanner::new()
            .scan_solution(&ActionNames { unknown_vocabulary: false }, solution.path())
            .unwrap();
        let expected: Vec<(String, String)> = (0..20)
            .flat_map(|i| {
                let file = format!("flow-{:02}.json", i);
                vec![(file.clone(), "First".to_string()), (file, "Second".to_string())]
            })
            .collect();
        assert_eq!(analysis.matches, expected);
    }

    #[test]
    fn test_empty_workflows_directory() {
        let solution = solution_with(&[]);
        let analysis = FlowScanner::new()
            .scan_solution(&ActionNames { unknown_vocabulary: false }, solution.path())
            .unwrap();
        assert!(analysis.matches.is_empty());
        assert_eq!(analysis.warnings.len(), 1);
        assert!(analysis.warnings[0].contains("No workflow JSON files"));
    }

    #[test]
    fn test_unknown_vocabulary_skips_scan() {
        let solution = solution_with(&[("flow.json", flow_with_actions(&["Compose"]))]);
        let analysis = FlowScanner::new()
            .scan_solution(&ActionNames { unknown_vocabulary: true }, solution.path())
            .unwrap();
        assert!(analysis.matches.is_empty());
        assert_eq!(analysis.warnings, vec!["unknown verb".to_string()]);
        assert_eq!(analysis.files_scanned, 0);
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let solution = solution_with(&[(
            "bom.json",
            format!("\u{feff}{}", flow_with_actions(&["Compose"])),
        )]);
        let analysis = FlowScanner::new()
            .scan_solution(&ActionNames { unknown_vocabulary: false }, solution.path())
            .unwrap();
        assert_eq!(analysis.matches, vec![("bom.json".to_string(), "Compose".to_string())]);
        assert_eq!(analysis.files_skipped, 0);
        assert!(analysis.warnings.is_empty());
    }

    fn contact_flow() -> String {
        serde_json::json!({
            "properties": { "definition": {
                "triggers": {
                    "When_a_contact_changes": {
                        "type": "OpenApiConnectionWebhook",
                        "inputs": { "parameters": {
                            "subscriptionRequest/entityname": "contacts",
                            "subscriptionRequest/message": 3,
                            "subscriptionRequest/scope": 4,
                            "subscriptionRequest/filteringattributes": "emailaddress1"
                        } }
                    }
                },
                "actions": {
                    "Add_a_new_row": {
                        "type": "OpenApiConnection",
                        "inputs": {
                            "host": { "operationId": "CreateRecord" },
                            "parameters": { "entityName": "contacts", "item/emailaddress1": "a@b.c" }
                        }
                    }
                }
            } }
        })
        .to_string()
    }

    fn assert_isolates_malformed_file<A: DefinitionAnalyzer>(analyzer: &A)
    where
        A::Match: std::fmt::Debug,
    {
        let solution = solution_with(&[
            ("a-broken.json", "{ \"properties\": ".to_string()),
            ("b-contact.json", contact_flow()),
        ]);
        let analysis = FlowScanner::new().scan_solution(analyzer, solution.path()).unwrap();
        assert_eq!(analysis.matches.len(), 1, "{:?}", analysis.matches);
        assert_eq!(analysis.files_skipped, 1);
        assert_eq!(analysis.warnings.len(), 1);
        assert!(analysis.warnings[0].starts_with("could not parse JSON file 'a-broken.json'"));
    }

    fn assert_empty_workflows_yields_nothing<A: DefinitionAnalyzer>(analyzer: &A) {
        let solution = solution_with(&[]);
        let analysis = FlowScanner::new().scan_solution(analyzer, solution.path()).unwrap();
        assert!(analysis.matches.is_empty());
        assert_eq!(analysis.files_scanned, 0);
    }

    #[test]
    fn test_trigger_analyzer_over_solution() {
        let analyzer = TriggerEventAnalyzer::new("contact", "Update").unwrap();
        assert_isolates_malformed_file(&analyzer);
        assert_empty_workflows_yields_nothing(&analyzer);
    }

    #[test]
    fn test_action_analyzer_over_solution() {
        let analyzer = ActionOperationAnalyzer::new("contact", "create").unwrap();
        assert_isolates_malformed_file(&analyzer);
        assert_empty_workflows_yields_nothing(&analyzer);
    }

    #[test]
    fn test_field_analyzer_over_solution() {
        let analyzer = FieldDependencyAnalyzer::new("contact", "emailaddress1")
            .unwrap()
            .with_scope(AnalysisScope::ActionsOnly);
        assert_isolates_malformed_file(&analyzer);
        assert_empty_workflows_yields_nothing(&analyzer);
    }

    #[test]
    fn test_scan_files_with_no_files() {
        let analysis = FlowScanner::new().scan_files(&ActionNames { unknown_vocabulary: false }, &[]);
        assert!(analysis.matches.is_empty());
        assert_eq!(analysis.warnings.len(), 1);
    }
}
