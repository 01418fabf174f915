//! Server-side page rendering.
//!
//! # Data Flow
//! ```text
//! templates_dir/
//!     *.page.html     renderable pages, each extends a layout
//!     *.layout.html   page skeletons
//!     *.partial.html  fragments pulled in with {% include %}
//!     → Views::load (parse everything once at startup)
//!     → Views::render(page, TemplateData) → HTML
//! ```

pub mod data;
pub mod filters;

use minijinja::Environment;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use data::{PageContext, TemplateData, VERSION};

const PAGE_SUFFIX: &str = ".page.html";
const SUPPORT_SUFFIXES: [&str; 2] = [".layout.html", ".partial.html"];

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("failed to read templates from {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no page templates found in {}", .0.display())]
    NoPages(PathBuf),
    #[error("the template {0} does not exist")]
    UnknownPage(String),
    #[error("template error")]
    Template(#[from] minijinja::Error),
}

/// Compiled templates plus the set of page names that may be rendered.
#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
    pages: BTreeSet<String>,
}

impl Views {
    /// Parse every template in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ViewError> {
        let io_error = |source| ViewError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut env = Environment::new();
        filters::register(&mut env);
        let mut pages = BTreeSet::new();

        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let is_page = name.ends_with(PAGE_SUFFIX);
            if !is_page && !SUPPORT_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                continue;
            }

            let name = name.to_string();
            let source = fs::read_to_string(&path).map_err(|source| ViewError::Io {
                path: path.clone(),
                source,
            })?;
            env.add_template_owned(name.clone(), source)?;
            if is_page {
                pages.insert(name);
            }
        }

        if pages.is_empty() {
            return Err(ViewError::NoPages(dir.to_path_buf()));
        }

        tracing::debug!(pages = ?pages, "Templates loaded");
        Ok(Self { env, pages })
    }

    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(String::as_str)
    }

    pub fn render<D: Serialize>(&self, page: &str, data: &D) -> Result<String, ViewError> {
        if !self.pages.contains(page) {
            return Err(ViewError::UnknownPage(page.to_string()));
        }
        Ok(self.env.get_template(page)?.render(data)?)
    }
}
