/// Parser configuration
///
/// Defaults follow the GMS2 project conventions.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Extension of source code files
    pub source_extension: String,
    /// Extension of per-asset descriptor files
    pub descriptor_extension: String,
    /// Extension of the project descriptor at the root
    pub project_extension: String,
    /// Top-level directories that never hold assets or source
    pub exclude_directories: Vec<String>,
    /// Cap on bytes read from a single source file
    pub max_source_bytes: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            source_extension: "gml".into(),
            descriptor_extension: "yy".into(),
            project_extension: "yyp".into(),
            exclude_directories: vec![
                "options", "datafiles", "configs", "folders", "temp", ".git", ".vscode",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            max_source_bytes: 1024 * 1024,
        }
    }
}

impl ParserConfig {
    /// Whether a top-level directory is skipped entirely
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        dir_name.starts_with('.')
            || self
                .exclude_directories
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(dir_name))
    }
}
