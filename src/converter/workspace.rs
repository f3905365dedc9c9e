//! Per-request job directories.
//!
//! Every upload gets its own `job-XXXX/` directory under the work root with
//! `input/` and `output/` inside, so two requests never share an output path.
//! The directory is removed when its [`ConversionJob`] is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::TempDir;
use uuid::Uuid;

use super::ConversionRequest;

#[derive(Debug, Clone)]
pub struct JobWorkspace {
    root: PathBuf,
    keep_files: bool,
}

impl JobWorkspace {
    /// A relative `root` is resolved against the current directory here, so
    /// job paths handed to the converter are always absolute.
    pub fn new(root: impl Into<PathBuf>, keep_files: bool) -> Self {
        let root = root.into();
        let root = match std::path::absolute(&root) {
            Ok(absolute) => absolute,
            Err(e) => {
                warn!("Could not resolve work dir {}: {}", root.display(), e);
                root
            }
        };
        Self { root, keep_files }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    pub fn create_job(&self) -> io::Result<ConversionJob> {
        self.ensure_root()?;
        let dir = tempfile::Builder::new()
            .prefix("job-")
            .tempdir_in(&self.root)?;
        fs::create_dir(dir.path().join("input"))?;
        fs::create_dir(dir.path().join("output"))?;

        let job = ConversionJob {
            id: Uuid::new_v4(),
            dir: Some(dir),
            keep_files: self.keep_files,
        };
        debug!("[job {}] created at {}", job.id, job.path().display());
        Ok(job)
    }
}

/// Scoped job directory. Removed on drop unless the workspace keeps files.
#[derive(Debug)]
pub struct ConversionJob {
    id: Uuid,
    dir: Option<TempDir>,
    keep_files: bool,
}

impl ConversionJob {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        // Only `Drop` takes the directory out.
        self.dir.as_ref().map(TempDir::path).unwrap_or_else(|| Path::new(""))
    }

    pub fn input_dir(&self) -> PathBuf {
        self.path().join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("output")
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.path().join("profile")
    }

    /// Request for converting `input_path` into this job's output directory.
    pub fn request(&self, input_path: impl Into<PathBuf>, isolate_profile: bool) -> ConversionRequest {
        let request = ConversionRequest::new(input_path, self.output_dir());
        if isolate_profile {
            request.with_profile_dir(self.profile_dir())
        } else {
            request
        }
    }
}

impl Drop for ConversionJob {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        if self.keep_files {
            let kept = dir.keep();
            info!("[job {}] keeping job files at {}", self.id, kept.display());
            return;
        }

        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!("[job {}] removed {}", self.id, path.display()),
            Err(e) => warn!("[job {}] failed to remove {}: {}", self.id, path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterInvoker;
    use tempfile::tempdir;

    #[test]
    fn test_jobs_get_distinct_directories() {
        let root = tempdir().unwrap();
        let workspace = JobWorkspace::new(root.path(), false);

        let a = workspace.create_job().unwrap();
        let b = workspace.create_job().unwrap();

        assert_ne!(a.path(), b.path());
        assert_ne!(a.output_dir(), b.output_dir());
        assert_ne!(a.id(), b.id());
        assert!(a.input_dir().is_dir());
        assert!(a.output_dir().is_dir());
        assert!(a.path().starts_with(root.path()));
    }

    #[test]
    fn test_job_directory_removed_on_drop() {
        let root = tempdir().unwrap();
        let workspace = JobWorkspace::new(root.path(), false);

        let job = workspace.create_job().unwrap();
        let path = job.path().to_path_buf();
        fs::write(job.input_dir().join("report.docx"), b"data").unwrap();
        fs::write(job.output_dir().join("report.pdf"), b"%PDF-").unwrap();
        drop(job);

        assert!(!path.exists());
    }

    #[test]
    fn test_job_directory_kept_when_configured() {
        let root = tempdir().unwrap();
        let workspace = JobWorkspace::new(root.path(), true);

        let job = workspace.create_job().unwrap();
        let path = job.path().to_path_buf();
        drop(job);

        assert!(path.exists());
    }

    #[test]
    fn test_create_job_creates_missing_root() {
        let parent = tempdir().unwrap();
        let workspace = JobWorkspace::new(parent.path().join("nested").join("work"), false);
        let job = workspace.create_job().unwrap();
        assert!(job.path().starts_with(workspace.root()));
    }

    #[test]
    fn test_relative_root_resolved_against_current_dir() {
        let workspace = JobWorkspace::new(Path::new("office-pdf-work"), false);
        assert!(workspace.root().is_absolute());
        assert_eq!(
            workspace.root(),
            std::env::current_dir().unwrap().join("office-pdf-work")
        );
    }

    #[test]
    fn test_relative_root_profile_points_inside_the_job() {
        let workspace = JobWorkspace::new(Path::new("work"), false);
        let profile = workspace.root().join("job-abc").join("profile");
        let args = ConverterInvoker::command_args(
            Path::new("/in/report.docx"),
            Path::new("/out"),
            Some(&profile),
        );
        let arg = args[2].to_string_lossy();
        assert_ne!(arg, "-env:UserInstallation=file:///work/job-abc/profile");
        assert!(arg.starts_with("-env:UserInstallation=file:///"));
        assert!(arg.ends_with("/work/job-abc/profile"));
    }

    #[test]
    fn test_request_uses_job_directories() {
        let root = tempdir().unwrap();
        let workspace = JobWorkspace::new(root.path(), false);
        let job = workspace.create_job().unwrap();
        let input = job.input_dir().join("slides.pptx");

        let isolated = job.request(&input, true);
        assert_eq!(isolated.input_path, input);
        assert_eq!(isolated.output_dir, job.output_dir());
        assert_eq!(isolated.profile_dir, Some(job.profile_dir()));

        let shared = job.request(&input, false);
        assert!(shared.profile_dir.is_none());
    }
}
