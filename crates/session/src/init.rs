use crate::template::{self, render_roadmap, TemplateVariant};
use crate::Result;
use chrono::Local;
use roadmapper_store::{git, paths};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub variant: TemplateVariant,
    /// Run `git init` when `root` is not already a repository.
    pub init_git: bool,
    /// Defaults to the directory name.
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub created: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub git_initialized: bool,
}

/// Lays out the roadmapper skeleton in `root`. Existing files are kept.
pub fn init_project(root: &Path, options: &InitOptions) -> Result<InitReport> {
    std::fs::create_dir_all(paths::reference_dir(root))?;
    std::fs::create_dir_all(paths::archive_dir(root))?;

    let project_name = options.project_name.clone().unwrap_or_else(|| {
        root.canonicalize()
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Project".to_string())
    });

    let mut report = InitReport::default();
    let roadmap = render_roadmap(
        template::roadmap_template(options.variant),
        &project_name,
        Local::now().date_naive(),
    );
    write_new(&paths::roadmap_file(root), &roadmap, &mut report)?;
    write_new(
        &paths::session_template_file(root),
        template::session_template(options.variant),
        &mut report,
    )?;

    if options.init_git && git::status_short(root).is_none() {
        report.git_initialized = git::init_repository(root);
        if !report.git_initialized {
            log::warn!("git init failed in {}; continuing without a repository", root.display());
        }
    }
    Ok(report)
}

fn write_new(path: &Path, content: &str, report: &mut InitReport) -> Result<()> {
    if path.exists() {
        log::debug!("{} already exists, skipping", path.display());
        report.skipped.push(path.to_path_buf());
        return Ok(());
    }
    std::fs::write(path, content)?;
    report.created.push(path.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn creates_layout_once() {
        let temp = tempdir().unwrap();
        let options = InitOptions {
            project_name: Some("Widget".to_string()),
            ..InitOptions::default()
        };
        let report = init_project(temp.path(), &options).unwrap();
        assert_eq!(
            report.created,
            vec![
                paths::roadmap_file(temp.path()),
                paths::session_template_file(temp.path()),
            ]
        );
        assert!(paths::archive_dir(temp.path()).is_dir());
        assert!(!report.git_initialized);
        let roadmap = fs::read_to_string(paths::roadmap_file(temp.path())).unwrap();
        assert!(roadmap.contains("**Living Roadmap** for Widget"));

        fs::write(paths::roadmap_file(temp.path()), "mine").unwrap();
        let again = init_project(temp.path(), &options).unwrap();
        assert!(again.created.is_empty());
        assert_eq!(again.skipped.len(), 2);
        assert_eq!(fs::read_to_string(paths::roadmap_file(temp.path())).unwrap(), "mine");
    }

    #[test]
    fn initialized_directory_is_a_project_root() {
        let temp = tempdir().unwrap();
        init_project(temp.path(), &InitOptions::default()).unwrap();
        let root = temp.path().canonicalize().unwrap();
        assert_eq!(paths::resolve_project_root(Some(&root)), Some(root.clone()));
    }
}
