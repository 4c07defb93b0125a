//! Git integration layer for hookforge
//!
//! Repository discovery, the branch and message facts hooks skip on, and
//! hook file management, all through git2.

use anyhow::{Context, Result};
use git2::Repository;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker line written into every hook shim hookforge installs
pub const HOOK_MARKER: &str = "# installed by hookforge";

pub struct GitOperations {
    repo: Repository,
}

impl GitOperations {
    /// Open the repository at exactly `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open Git repository")?;

        Ok(Self { repo })
    }

    /// Discover the repository containing `path`
    pub fn discover_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path).context("No Git repository found")?;

        Ok(Self { repo })
    }

    /// Get the current branch name
    pub fn current_branch(&self) -> Result<String> {
        let head = self.repo.head().context("Failed to get HEAD reference")?;

        let branch_name = head.shorthand().context("Failed to get branch name")?;

        Ok(branch_name.to_string())
    }

    /// Message of the commit HEAD points at
    pub fn last_commit_message(&self) -> Result<String> {
        let commit = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .context("Repository has no commits")?;

        Ok(commit.message().unwrap_or_default().to_string())
    }

    /// The `.git` directory
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Working directory, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Hooks directory, honouring `core.hooksPath`
    pub fn hooks_dir(&self) -> PathBuf {
        let configured = self
            .repo
            .config()
            .and_then(|config| config.get_path("core.hooksPath"))
            .ok();

        match configured {
            Some(path) if path.is_absolute() => path,
            Some(path) => self.workdir().unwrap_or(self.git_dir()).join(path),
            None => self.git_dir().join("hooks"),
        }
    }

    /// Install a git hook
    pub fn install_hook(&self, hook_name: &str, hook_content: &str) -> Result<PathBuf> {
        let hooks_dir = self.hooks_dir();
        let hook_path = hooks_dir.join(hook_name);

        fs::create_dir_all(&hooks_dir).context("Failed to create hooks directory")?;

        fs::write(&hook_path, hook_content).context("Failed to write hook file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&hook_path)
                .context("Failed to get hook file metadata")?
                .permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&hook_path, perms)
                .context("Failed to set hook file permissions")?;
        }

        Ok(hook_path)
    }

    /// Remove a hook, but only one hookforge wrote
    pub fn remove_hook(&self, hook_name: &str) -> Result<bool> {
        if !self.is_managed_hook(hook_name) {
            return Ok(false);
        }

        let hook_path = self.hooks_dir().join(hook_name);
        fs::remove_file(&hook_path)
            .with_context(|| format!("Failed to remove {}", hook_path.display()))?;

        Ok(true)
    }

    pub fn hook_exists(&self, hook_name: &str) -> bool {
        self.hooks_dir().join(hook_name).exists()
    }

    /// Hook file exists and carries the hookforge marker
    pub fn is_managed_hook(&self, hook_name: &str) -> bool {
        fs::read_to_string(self.hooks_dir().join(hook_name))
            .map(|content| content.contains(HOOK_MARKER))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn commit(repo: &Repository, message: &str) {
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
            .unwrap();
    }

    #[test]
    fn test_last_commit_message_and_branch() {
        let (dir, repo) = init_repo();
        let git = GitOperations::discover_from(dir.path()).unwrap();
        assert!(git.last_commit_message().is_err());

        commit(&repo, "chore: initial [skip hooks]\n");
        let branch = repo.head().unwrap().shorthand().unwrap().to_string();

        assert_eq!(git.last_commit_message().unwrap(), "chore: initial [skip hooks]\n");
        assert_eq!(git.current_branch().unwrap(), branch);
    }

    #[test]
    fn test_install_and_remove_managed_hook() {
        let (dir, _repo) = init_repo();
        let git = GitOperations::open(dir.path()).unwrap();

        let content = format!("#!/bin/sh\n{HOOK_MARKER}\nexit 0\n");
        let path = git.install_hook("pre-commit", &content).unwrap();
        assert!(path.ends_with("hooks/pre-commit"));
        assert!(git.hook_exists("pre-commit"));
        assert!(git.is_managed_hook("pre-commit"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        assert!(git.remove_hook("pre-commit").unwrap());
        assert!(!git.hook_exists("pre-commit"));
    }

    #[test]
    fn test_foreign_hook_is_left_alone() {
        let (dir, _repo) = init_repo();
        let git = GitOperations::open(dir.path()).unwrap();
        git.install_hook("pre-push", "#!/bin/sh\necho mine\n").unwrap();

        assert!(!git.remove_hook("pre-push").unwrap());
        assert!(git.hook_exists("pre-push"));
    }
}
