//! Thin wrappers around the system `git` command.
//!
//! Using the `git` binary means SSH keys, credential helpers and anything in
//! `~/.gitconfig` apply exactly as they do on the command line. Every wrapper
//! turns a spawn failure or a non-zero exit into [`Error::GitCommand`], except
//! the probes (`commit_exists`, `branch_exists`, ...) which answer `false`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use regex::Regex;

use crate::error::{Error, Result};

/// Author, message, timestamp and changed paths of a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub author: String,
    pub message: String,
    pub timestamp: i64,
    pub changed_files: Vec<String>,
}

fn output(dir: Option<&Path>, args: &[&str]) -> std::io::Result<Output> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    cmd.output()
}

fn describe(dir: Option<&Path>) -> String {
    dir.map(|d| d.display().to_string())
        .unwrap_or_else(|| ".".to_string())
}

/// Run git and return stdout, failing on a non-zero exit.
fn run_bytes(dir: Option<&Path>, target: &str, args: &[&str]) -> Result<Vec<u8>> {
    let result = output(dir, args).map_err(|e| Error::GitCommand {
        command: args.join(" "),
        target: target.to_string(),
        stderr: e.to_string(),
    })?;

    if !result.status.success() {
        return Err(Error::GitCommand {
            command: args.join(" "),
            target: target.to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }
    Ok(result.stdout)
}

fn run_in(repo: &Path, args: &[&str]) -> Result<String> {
    let stdout = run_bytes(Some(repo), &describe(Some(repo)), args)?;
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

/// Run git and report only whether it exited successfully.
fn succeeds(repo: &Path, args: &[&str]) -> bool {
    output(Some(repo), args)
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn prepare_destination(dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Resolve a reference to a full commit id.
pub fn resolve_ref(repo: &Path, reference: &str) -> Result<String> {
    let id = run_in(repo, &["rev-parse", "--verify", "-q", reference])?;
    Ok(id.trim().to_string())
}

/// Name of the branch `reference` is on, e.g. `master` for `HEAD`.
pub fn current_branch(repo: &Path, reference: &str) -> Result<String> {
    let branch = run_in(repo, &["rev-parse", "--verify", "--abbrev-ref", reference])?;
    Ok(branch.trim().to_string())
}

/// URL of the named remote.
pub fn remote_url(repo: &Path, remote: &str) -> Result<String> {
    let key = format!("remote.{}.url", remote);
    let url = run_in(repo, &["config", "--get", &key])?;
    Ok(url.trim().to_string())
}

pub fn set_remote_url(repo: &Path, remote: &str, url: &str) -> Result<()> {
    run_in(repo, &["remote", "set-url", remote, url])?;
    Ok(())
}

pub fn set_config(repo: &Path, key: &str, value: &str) -> Result<()> {
    run_in(repo, &["config", key, value])?;
    Ok(())
}

/// List the heads advertised by a remote, keyed by branch name.
pub fn list_remote_heads(url: &str, pattern: &str) -> Result<BTreeMap<String, String>> {
    let stdout = run_bytes(None, url, &["ls-remote", "--heads", url, pattern])?;
    Ok(parse_ls_remote(&String::from_utf8_lossy(&stdout)))
}

/// Parse `git ls-remote --heads` output (`<hash>\t<ref>` per line).
pub fn parse_ls_remote(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let (hash, reference) = line.split_once('\t')?;
            let branch = reference.trim().strip_prefix("refs/heads/")?;
            Some((branch.to_string(), hash.trim().to_string()))
        })
        .collect()
}

/// Create a bare mirror of `url` at `dest`.
pub fn clone_mirror(url: &str, dest: &Path) -> Result<()> {
    prepare_destination(dest)?;
    let dest_str = dest.to_string_lossy();
    run_bytes(None, url, &["clone", "-q", "--mirror", url, &dest_str])?;
    Ok(())
}

/// Clone `url` into `dest` with a working tree.
///
/// With `no_checkout` the working tree is left empty.
pub fn clone(url: &str, dest: &Path, branch: Option<&str>, no_checkout: bool) -> Result<()> {
    prepare_destination(dest)?;
    let dest_str = dest.to_string_lossy();
    let mut args = vec!["clone", "-q"];
    if no_checkout {
        args.push("-n");
    }
    if let Some(branch) = branch {
        args.extend(["-b", branch]);
    }
    args.extend([url, &*dest_str]);
    run_bytes(None, url, &args)?;
    Ok(())
}

/// Fetch from the default remote, pruning refs that vanished upstream.
pub fn fetch_prune(repo: &Path) -> Result<()> {
    run_in(repo, &["fetch", "-q", "-n", "-p"])?;
    Ok(())
}

pub fn fetch(repo: &Path) -> Result<()> {
    run_in(repo, &["fetch", "-q"])?;
    Ok(())
}

/// Whether `id` names a commit object in the repository.
///
/// Tags, trees and blobs count as absent, as does any failure of the probe.
pub fn commit_exists(repo: &Path, id: &str) -> bool {
    match output(Some(repo), &["cat-file", "-t", id]) {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim() == "commit",
        _ => false,
    }
}

/// Commits reachable from `to` but not from `from`, oldest first.
pub fn log_range(repo: &Path, from: &str, to: &str) -> Result<Vec<String>> {
    let exclude = format!("^{}", from);
    let stdout = run_in(
        repo,
        &["log", "--reverse", "--format=%H", to, &exclude, "--"],
    )?;
    Ok(stdout.split_whitespace().map(str::to_string).collect())
}

/// Content of `filename` as of commit `id`, without touching the working tree.
pub fn read_file_at_commit(repo: &Path, id: &str, filename: &str) -> Result<Vec<u8>> {
    let object = format!("{}:{}", id, filename);
    run_bytes(Some(repo), &describe(Some(repo)), &["show", &object])
}

/// Author, message, timestamp and changed paths of one commit.
pub fn commit_metadata(repo: &Path, id: &str) -> Result<CommitMetadata> {
    let header = run_in(
        repo,
        &["log", "--no-walk", "--format=%aN <%aE>%x00%ct%x00%s%n%b", id, "--"],
    )?;
    let mut parts = header.splitn(3, '\0');
    let author = parts.next().unwrap_or_default().to_string();
    let timestamp_text = parts.next().unwrap_or_default().trim();
    let timestamp = timestamp_text.parse().map_err(|_| Error::GitCommand {
        command: format!("log --no-walk {}", id),
        target: describe(Some(repo)),
        stderr: format!("unexpected commit timestamp '{}'", timestamp_text),
    })?;
    let message = parts.next().unwrap_or_default().trim_end().to_string();

    let files = run_in(
        repo,
        &["diff-tree", "--no-commit-id", "--name-only", "-r", "--root", id],
    )?;
    let changed_files = files
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Ok(CommitMetadata {
        author,
        message,
        timestamp,
        changed_files,
    })
}

/// Whether a local (`refs/heads`) or remote-tracking (`refs/remotes/origin`)
/// branch exists.
pub fn branch_exists(repo: &Path, branch: &str, remote: bool) -> bool {
    let reference = if remote {
        format!("refs/remotes/origin/{}", branch)
    } else {
        format!("refs/heads/{}", branch)
    };
    succeeds(repo, &["show-ref", "-q", "--verify", &reference])
}

/// Whether the index differs from `HEAD`.
///
/// A repository without any commit on the current branch reports `true`.
pub fn has_staged_changes(repo: &Path) -> bool {
    !succeeds(repo, &["diff-index", "--cached", "--quiet", "HEAD", "--"])
}

/// Whether the working tree differs from `HEAD`.
pub fn has_unstaged_changes(repo: &Path) -> Result<bool> {
    run_in(
        repo,
        &["update-index", "-q", "--ignore-submodules", "--refresh"],
    )?;
    Ok(!succeeds(repo, &["diff-index", "--quiet", "HEAD", "--"]))
}

pub fn checkout(repo: &Path, revision: &str, force: bool) -> Result<()> {
    let mut args = vec!["checkout", "-q"];
    if force {
        args.push("-f");
    }
    args.push(revision);
    run_in(repo, &args)?;
    Ok(())
}

/// Start `branch` with no history and an empty index.
pub fn checkout_orphan(repo: &Path, branch: &str) -> Result<()> {
    run_in(repo, &["checkout", "-q", "-f", "--orphan", branch])?;
    run_in(
        repo,
        &["rm", "-r", "-q", "--cached", "--ignore-unmatch", "--", "."],
    )?;
    Ok(())
}

/// Check out `branch`, forcing it to the state of `origin/<branch>`.
pub fn reset_to_remote(repo: &Path, branch: &str) -> Result<()> {
    let upstream = format!("origin/{}", branch);
    run_in(repo, &["checkout", "-q", "-f", "-B", branch, &upstream])?;
    run_in(repo, &["reset", "--hard", "-q", &upstream])?;
    Ok(())
}

pub fn reset_hard(repo: &Path, reference: &str) -> Result<()> {
    run_in(repo, &["reset", "--hard", "-q", reference])?;
    Ok(())
}

pub fn add(repo: &Path, path: &str) -> Result<()> {
    run_in(repo, &["add", "--", path])?;
    Ok(())
}

pub fn commit(repo: &Path, message: &str) -> Result<()> {
    run_in(repo, &["commit", "-q", "-m", message])?;
    Ok(())
}

pub fn push(repo: &Path, remote: &str, branch: &str) -> Result<()> {
    run_in(repo, &["push", "-q", remote, branch])?;
    Ok(())
}

pub fn pull_ff_only(repo: &Path) -> Result<()> {
    run_in(repo, &["pull", "-q", "--ff-only"])?;
    Ok(())
}

pub fn submodule_update(repo: &Path) -> Result<()> {
    run_in(repo, &["submodule", "--quiet", "update", "--init", "--recursive"])?;
    Ok(())
}

/// Remove untracked and ignored files, keeping the given directories.
pub fn clean(repo: &Path, excludes: &[String]) -> Result<()> {
    let patterns: Vec<String> = excludes
        .iter()
        .map(|exclude| format!("{}/", exclude))
        .collect();
    let mut args = vec!["clean", "-q", "-d", "-f", "-f", "-x"];
    for pattern in &patterns {
        args.push("-e");
        args.push(pattern);
    }
    run_in(repo, &args)?;
    Ok(())
}

/// The directory name `git clone` would choose for `url`.
pub fn humanish_name(url: &str) -> Result<String> {
    let trailing_slash = Regex::new(r"/$")?;
    let git_suffix = Regex::new(r":*/*\.git$")?;
    let leading_path = Regex::new(r".*[/:]")?;

    let name = trailing_slash.replace(url, "");
    let name = git_suffix.replace(&name, "");
    let name = leading_path.replace(&name, "");
    Ok(name.into_owned())
}
