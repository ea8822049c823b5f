//! collection of configuration documents ([Body] and path to source file)
//!
//! [Documents] keeps every loaded body together with the path it was read from and assigns each one a numeric
//! index. Once added those indices are stable (removal is not possible).
use crate::{lower::TraversalSource, spec::DecodeSpec};
use hcl::{Body, Traversal};
use std::path::{Path, PathBuf};

/// File extensions picked up by [Documents::load_directory]
pub const EXTENSIONS: &[&str] = &["tf", "hcl"];

#[derive(Default, Debug)]
pub struct Documents {
    sources: Vec<Source>,
    bodies: Vec<Body>,
}

impl Documents {
    /// Inserts a document, returns its index
    pub fn insert(&mut self, document: Body, path: impl Into<Source>) -> usize {
        let index = self.bodies.len();
        self.sources.push(path.into());
        self.bodies.push(document);
        index
    }

    pub fn get(&self, index: usize) -> Option<SourceBody> {
        let body = self.bodies.get(index)?;
        Some((index, &self.sources[index], body))
    }

    pub fn bodies(&self) -> impl Iterator<Item = SourceBody> {
        self.sources
            .iter()
            .zip(&self.bodies)
            .enumerate()
            .map(|(index, (source, body))| (index, source, body))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl Documents {
    pub fn load_file(&mut self, file_path: &Path) -> Result<usize, LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let body = hcl_edit::parser::parse_body(&file_contents)?;

        Ok(self.insert(body.into(), file_path))
    }

    /// Loads every `.tf` and `.hcl` file of a directory (not recursive) in file name order
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];

        for dir_entry in std::fs::read_dir(dir_path)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let file_path = dir_entry.path();
            let is_config_file = file_path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| EXTENSIONS.contains(&ext));
            if is_config_file {
                file_paths.push(file_path);
            }
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound(dir_path.to_path_buf()));
        }

        file_paths.sort();
        for file_path in &file_paths {
            self.load_file(file_path)?;
        }

        Ok(())
    }
}

impl TraversalSource for Documents {
    fn traversals(&self, spec: &DecodeSpec) -> Vec<Traversal> {
        let mut traversals = vec![];

        for (index, source, body) in self.bodies() {
            let _span = tracing::trace_span!("document", index, source = ?source).entered();
            traversals.extend(body.traversals(spec));
        }

        traversals
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No .tf or .hcl files found in directory {0}")]
    NoFilesFound(PathBuf),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
}

impl From<Body> for Documents {
    fn from(value: Body) -> Self {
        let mut documents = Documents::default();
        documents.insert(value, None);
        documents
    }
}

/// Utility macro to create [Documents]
///
/// Create from a single document
/// ```
/// # use hclref::documents;
/// documents!("attribute = var.value");
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use hclref::documents;
/// documents! {
///   "one.tf" => "attribute_one = var.one",
///   "two.tf" => "attribute_two = var.two"
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use hclref::documents;
/// documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! documents {
    // single document without source
    { $expr:expr } => {
        $crate::documents::Documents::from(::hcl::parse($expr).expect("body must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::documents::Documents::default();
        $(
            docs.insert(
                ::hcl::parse($expr).expect("body must parse"),
                Some(::std::path::PathBuf::from($source)),
            );
        )+

        docs
    }};
}

pub type Source = Option<PathBuf>;
pub type SourceBody<'a> = (usize, &'a Source, &'a Body);
