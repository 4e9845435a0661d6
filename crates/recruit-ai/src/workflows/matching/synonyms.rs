use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

/// Canonical skill names and the aliases that collapse onto them.
const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
    ("javascript", &["js", "ecmascript", "es6", "java script"]),
    ("typescript", &["ts", "type script"]),
    ("nodejs", &["node", "node.js", "node js"]),
    ("react", &["reactjs", "react.js"]),
    ("postgresql", &["postgres", "psql", "pg"]),
    ("kubernetes", &["k8s", "kube"]),
    ("golang", &["go", "go lang"]),
    ("python", &["py", "python3"]),
    ("csharp", &["c#", "c sharp", ".net", "dotnet"]),
    ("cplusplus", &["c++", "cpp"]),
    ("aws", &["amazon web services"]),
    ("gcp", &["google cloud", "google cloud platform"]),
    ("machine learning", &["ml"]),
    ("continuous integration", &["ci", "ci/cd"]),
];

/// Explicit equivalence table used to normalize skill and keyword tokens.
///
/// Lookups are case-folded and whitespace-collapsed; unknown tokens normalize to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillSynonymTable {
    aliases: HashMap<String, String>,
}

impl SkillSynonymTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut table = Self::empty();
        for (canonical, aliases) in DEFAULT_SYNONYMS {
            for alias in *aliases {
                table.insert(canonical, alias);
            }
        }
        table
    }

    /// Load `canonical,alias` rows on top of the built-in table.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SynonymTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SynonymTableError> {
        let mut table = Self::with_defaults();
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        for (index, row) in csv_reader.deserialize::<SynonymRow>().enumerate() {
            let row = row?;
            if row.canonical.is_empty() || row.alias.is_empty() {
                return Err(SynonymTableError::EmptyEntry { row: index + 1 });
            }
            table.insert(&row.canonical, &row.alias);
        }

        Ok(table)
    }

    pub fn insert(&mut self, canonical: &str, alias: &str) {
        let canonical = fold(canonical);
        self.aliases.insert(fold(alias), canonical.clone());
        self.aliases.insert(canonical.clone(), canonical);
    }

    pub fn normalize(&self, raw: &str) -> String {
        let folded = fold(raw);
        match self.aliases.get(&folded) {
            Some(canonical) => canonical.clone(),
            None => folded,
        }
    }

    pub fn equivalent(&self, left: &str, right: &str) -> bool {
        self.normalize(left) == self.normalize(right)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn fold(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Deserialize)]
struct SynonymRow {
    canonical: String,
    alias: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SynonymTableError {
    #[error("failed to read synonym table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid synonym CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("synonym row {row} has an empty canonical name or alias")]
    EmptyEntry { row: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_collapse_common_aliases() {
        let table = SkillSynonymTable::with_defaults();
        assert_eq!(table.normalize("JS"), "javascript");
        assert_eq!(table.normalize("  JavaScript "), "javascript");
        assert!(table.equivalent("k8s", "Kubernetes"));
        assert_eq!(table.normalize("Rust"), "rust");
    }

    #[test]
    fn csv_rows_extend_the_defaults() {
        let csv = "canonical,alias\nspring,spring boot\nterraform,tf\n";
        let table = SkillSynonymTable::from_reader(csv.as_bytes()).expect("valid csv");
        assert!(table.equivalent("Spring Boot", "spring"));
        assert!(table.equivalent("TF", "Terraform"));
        assert!(table.equivalent("js", "javascript"));
    }

    #[test]
    fn csv_rejects_blank_entries() {
        let csv = "canonical,alias\nterraform,\n";
        match SkillSynonymTable::from_reader(csv.as_bytes()) {
            Err(SynonymTableError::EmptyEntry { row }) => assert_eq!(row, 1),
            other => panic!("expected empty entry error, got {other:?}"),
        }
    }
}
