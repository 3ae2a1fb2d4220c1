use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One line of `flexload resolve` output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedSymbol {
    pub symbol: String,
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolvedSymbol {
    pub fn is_resolved(&self) -> bool {
        self.path.is_some()
    }
}

/// Merged registry state printed by `flexload map`.
#[derive(Debug, Clone, Serialize)]
pub struct MapOutput {
    pub roots: Vec<PathBuf>,
    pub search_path: Vec<PathBuf>,
    pub namespaces: BTreeMap<String, Vec<PathBuf>>,
    pub class_map: BTreeMap<String, PathBuf>,
}

pub fn render_resolved(results: &[ResolvedSymbol], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(results)?);
    }

    let mut out = String::new();
    for result in results {
        let target = match (&result.path, &result.error) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(err)) => format!("INVALID ({err})"),
            (None, None) => "NOT FOUND".to_string(),
        };
        out.push_str(&format!("{}\t{target}\n", result.symbol));
    }
    Ok(out)
}
