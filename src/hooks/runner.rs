//! Generic runner shared by pre-commit and pre-push.
//!
//! A run is: skip predicates, resolve every check, then execute enabled
//! checks in order. A critical failure aborts the remaining checks; a
//! non-critical failure is recorded and the run continues. Everything after
//! the enabled test is bounded by the hook timeout.

use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::checks::{Check, CheckContext, CheckRegistry};
use super::errors::HookError;
use super::{HookContext, HookKind};
use crate::cli::Output;
use crate::config::{CheckDescriptor, EffectiveConfig};
use crate::shared::glob::BranchMatcher;
use crate::shared::patterns::compile_optional;

/// When a hook bypasses its checks
#[derive(Debug, Clone, Default)]
pub enum SkipRule {
    #[default]
    Never,
    /// Skip when the last commit message matches
    MessagePattern(Regex),
    /// Skip when the current branch matches any glob
    Branches(BranchMatcher),
}

/// A hook's run list with its limits, independent of where it came from
#[derive(Debug, Clone)]
pub struct HookSpec {
    pub kind: HookKind,
    pub enabled: bool,
    pub skip: SkipRule,
    pub checks: Vec<CheckDescriptor>,
    /// `None` runs without a limit
    pub timeout: Option<Duration>,
    pub parallel: bool,
    pub auto_fix: bool,
    pub verbose: bool,
}

impl HookSpec {
    pub fn pre_commit(config: &EffectiveConfig) -> Result<Self, HookError> {
        let section = &config.pre_commit;
        let skip = match section.skip_pattern.as_deref() {
            Some(pattern) => SkipRule::MessagePattern(compile_optional(Some(pattern)).map_err(
                |source| HookError::Pattern {
                    hook: HookKind::PreCommit,
                    source,
                },
            )?),
            None => SkipRule::Never,
        };

        Ok(Self::from_section(
            HookKind::PreCommit,
            config,
            section.enabled,
            skip,
            &section.checks,
            section.timeout,
        ))
    }

    pub fn pre_push(config: &EffectiveConfig) -> Result<Self, HookError> {
        let section = &config.pre_push;
        let skip = if section.skip_branches.is_empty() {
            SkipRule::Never
        } else {
            SkipRule::Branches(BranchMatcher::new(&section.skip_branches).map_err(|e| {
                HookError::Branches {
                    hook: HookKind::PrePush,
                    message: format!("{e:#}"),
                }
            })?)
        };

        Ok(Self::from_section(
            HookKind::PrePush,
            config,
            section.enabled,
            skip,
            &section.checks,
            section.timeout,
        ))
    }

    fn from_section(
        kind: HookKind,
        config: &EffectiveConfig,
        enabled: bool,
        skip: SkipRule,
        checks: &[CheckDescriptor],
        timeout_ms: u64,
    ) -> Self {
        Self {
            kind,
            enabled,
            skip,
            checks: checks.to_vec(),
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            parallel: config.general.parallel,
            auto_fix: config.general.auto_fix,
            verbose: config.general.verbose,
        }
    }
}

/// Why a run did not execute its checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    MessageMatched { pattern: String },
    BranchMatched { branch: String, pattern: String },
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub critical: bool,
    pub error: Option<String>,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct HookReport {
    pub kind: HookKind,
    pub results: Vec<CheckResult>,
    pub skipped: Option<SkipReason>,
    /// A critical failure stopped the run early
    pub aborted: bool,
}

impl HookReport {
    fn skipped(kind: HookKind, reason: SkipReason) -> Self {
        Self {
            kind,
            results: Vec::new(),
            skipped: Some(reason),
            aborted: false,
        }
    }

    /// No critical check failed
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed || !r.critical)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

pub struct HookRunner<'a> {
    registry: &'a CheckRegistry,
    output: &'a Output,
    root: PathBuf,
    args: Vec<String>,
}

impl<'a> HookRunner<'a> {
    pub fn new(registry: &'a CheckRegistry, output: &'a Output, root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            output,
            root: root.into(),
            args: Vec::new(),
        }
    }

    /// Arguments git passed to the hook
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub async fn run(&self, spec: &HookSpec, ctx: &HookContext) -> Result<HookReport, HookError> {
        if !spec.enabled {
            self.output.info(&format!("{} hook is disabled", spec.kind));
            return Ok(HookReport::skipped(spec.kind, SkipReason::Disabled));
        }

        let work = self.run_checks(spec, ctx);
        let report = match spec.timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| HookError::Timeout {
                    hook: spec.kind,
                    after: limit,
                })??,
            None => work.await?,
        };

        self.summarize(&report);
        Ok(report)
    }

    async fn run_checks(
        &self,
        spec: &HookSpec,
        ctx: &HookContext,
    ) -> Result<HookReport, HookError> {
        if let Some(reason) = skip_reason(&spec.skip, ctx) {
            match &reason {
                SkipReason::MessageMatched { pattern } => self.output.info(&format!(
                    "Skipping {}: last commit message matches {pattern}",
                    spec.kind
                )),
                SkipReason::BranchMatched { branch, pattern } => self.output.info(&format!(
                    "Skipping {}: branch '{branch}' matches {pattern}",
                    spec.kind
                )),
                SkipReason::Disabled => {}
            }
            return Ok(HookReport::skipped(spec.kind, reason));
        }

        let resolved = self.resolve_all(spec)?;

        if spec.parallel && resolved.len() > 1 {
            self.output.debug("Parallel execution requested; checks run sequentially");
        }

        let mut report = HookReport {
            kind: spec.kind,
            results: Vec::with_capacity(resolved.len()),
            skipped: None,
            aborted: false,
        };

        for (descriptor, check) in resolved {
            let result = self.run_one(spec, descriptor, check.as_ref()).await;
            let abort = !result.passed && result.critical;
            report.results.push(result);

            if abort {
                report.aborted = true;
                break;
            }
        }

        Ok(report)
    }

    /// Enabled checks paired with their implementation, or the first unknown name
    fn resolve_all<'s>(
        &self,
        spec: &'s HookSpec,
    ) -> Result<Vec<(&'s CheckDescriptor, Arc<dyn Check>)>, HookError> {
        spec.checks
            .iter()
            .filter(|descriptor| descriptor.enabled)
            .map(|descriptor| match self.registry.resolve(descriptor) {
                Some(check) => Ok((descriptor, check)),
                None => Err(HookError::UnknownCheck {
                    hook: spec.kind,
                    name: descriptor.name.clone(),
                    known: self.registry.names().join(", "),
                }),
            })
            .collect()
    }

    async fn run_one(
        &self,
        spec: &HookSpec,
        descriptor: &CheckDescriptor,
        check: &dyn Check,
    ) -> CheckResult {
        let label = format!("{} ({})", descriptor.name, check.describe(descriptor));
        self.output.debug(&format!("Running {label}"));
        let spinner = self.output.spinner(&label);

        let ctx = CheckContext {
            root: &self.root,
            descriptor,
            args: &self.args,
            auto_fix: spec.auto_fix,
            verbose: spec.verbose,
        };
        let started = Instant::now();
        let outcome = check.run(&ctx).await;
        let duration = started.elapsed();
        spinner.finish_and_clear();

        tracing::info!(
            hook = %spec.kind,
            check = %descriptor.name,
            passed = outcome.is_ok(),
            duration_ms = duration.as_millis() as u64,
            "check finished"
        );

        match outcome {
            Ok(()) => {
                self.output.success(&format!(
                    "{} ({}ms)",
                    descriptor.name,
                    duration.as_millis()
                ));
                CheckResult {
                    name: descriptor.name.clone(),
                    passed: true,
                    critical: descriptor.critical,
                    error: None,
                    duration,
                }
            }
            Err(e) => {
                let message = format!("{e:#}");
                if descriptor.critical {
                    self.output.error(&format!("{} failed", descriptor.name));
                } else {
                    self.output.warning(&format!("{} failed (non-critical)", descriptor.name));
                }
                self.output.detail(&message);
                CheckResult {
                    name: descriptor.name.clone(),
                    passed: false,
                    critical: descriptor.critical,
                    error: Some(message),
                    duration,
                }
            }
        }
    }

    fn summarize(&self, report: &HookReport) {
        if report.skipped.is_some() {
            return;
        }

        let passed = report.results.iter().filter(|r| r.passed).count();
        let failed = report.results.len() - passed;
        let summary = format!("{}: {passed} passed, {failed} failed", report.kind);

        if report.passed() {
            self.output.success(&summary);
        } else {
            self.output.error(&summary);
            if report.aborted {
                self.output.error("Stopped at the first critical failure");
            }
        }
    }
}

fn skip_reason(rule: &SkipRule, ctx: &HookContext) -> Option<SkipReason> {
    match rule {
        SkipRule::Never => None,
        SkipRule::MessagePattern(pattern) => ctx
            .commit_message
            .as_deref()
            .filter(|message| pattern.is_match(message))
            .map(|_| SkipReason::MessageMatched {
                pattern: pattern.as_str().to_string(),
            }),
        SkipRule::Branches(matcher) => {
            let branch = ctx.branch.as_deref()?;
            matcher
                .first_match(branch)
                .map(|pattern| SkipReason::BranchMatched {
                    branch: branch.to_string(),
                    pattern: pattern.to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts invocations and fails when told to
    #[derive(Clone)]
    struct FakeCheck {
        calls: Arc<AtomicUsize>,
        fail: bool,
        delay: Duration,
    }

    impl FakeCheck {
        fn new(fail: bool) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                fail,
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Check for FakeCheck {
        fn describe(&self, _descriptor: &CheckDescriptor) -> String {
            "fake".to_string()
        }

        async fn run(&self, _ctx: &CheckContext<'_>) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                bail!("fake failure");
            }
            Ok(())
        }
    }

    fn spec(kind: HookKind, checks: Vec<CheckDescriptor>) -> HookSpec {
        HookSpec {
            kind,
            enabled: true,
            skip: SkipRule::Never,
            checks,
            timeout: Some(Duration::from_secs(5)),
            parallel: false,
            auto_fix: false,
            verbose: false,
        }
    }

    fn quiet() -> Output {
        Output::new(false, true)
    }

    #[tokio::test]
    async fn test_disabled_hook_runs_nothing() {
        let a = FakeCheck::new(false);
        let mut registry = CheckRegistry::new();
        registry.register("a", a.clone());
        let output = quiet();
        let runner = HookRunner::new(&registry, &output, ".");

        let mut spec = spec(HookKind::PreCommit, vec![CheckDescriptor::new("a")]);
        spec.enabled = false;
        let report = runner.run(&spec, &HookContext::default()).await.unwrap();

        assert!(report.passed());
        assert_eq!(report.skipped, Some(SkipReason::Disabled));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_critical_failure_aborts() {
        let a = FakeCheck::new(true);
        let b = FakeCheck::new(false);
        let mut registry = CheckRegistry::new();
        registry.register("a", a.clone());
        registry.register("b", b.clone());
        let output = quiet();
        let runner = HookRunner::new(&registry, &output, ".");

        let spec = spec(
            HookKind::PreCommit,
            vec![CheckDescriptor::new("a"), CheckDescriptor::new("b")],
        );
        let report = runner.run(&spec, &HookContext::default()).await.unwrap();

        assert!(!report.passed());
        assert!(report.aborted);
        assert_eq!(report.results.len(), 1);
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_critical_failure_continues() {
        let a = FakeCheck::new(true);
        let b = FakeCheck::new(false);
        let mut registry = CheckRegistry::new();
        registry.register("a", a.clone());
        registry.register("b", b.clone());
        let output = quiet();
        let runner = HookRunner::new(&registry, &output, ".");

        let spec = spec(
            HookKind::PrePush,
            vec![CheckDescriptor::new("a").non_critical(), CheckDescriptor::new("b")],
        );
        let report = runner.run(&spec, &HookContext::default()).await.unwrap();

        assert!(report.passed());
        assert!(!report.aborted);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_disabled_check_is_skipped() {
        let a = FakeCheck::new(true);
        let mut registry = CheckRegistry::new();
        registry.register("a", a.clone());
        let output = quiet();
        let runner = HookRunner::new(&registry, &output, ".");

        let spec = spec(HookKind::PreCommit, vec![CheckDescriptor::new("a").disabled()]);
        let report = runner.run(&spec, &HookContext::default()).await.unwrap();

        assert!(report.passed());
        assert!(report.results.is_empty());
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_skip_pattern_matches_last_message() {
        let a = FakeCheck::new(true);
        let mut registry = CheckRegistry::new();
        registry.register("a", a.clone());
        let output = quiet();
        let runner = HookRunner::new(&registry, &output, ".");

        let mut spec = spec(HookKind::PreCommit, vec![CheckDescriptor::new("a")]);
        spec.skip = SkipRule::MessagePattern(Regex::new(r"\[skip hooks\]").unwrap());
        let ctx = HookContext {
            commit_message: Some("chore: bump [skip hooks]".to_string()),
            branch: None,
        };
        let report = runner.run(&spec, &ctx).await.unwrap();

        assert!(matches!(report.skipped, Some(SkipReason::MessageMatched { .. })));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_skip_branches_glob() {
        let a = FakeCheck::new(false);
        let mut registry = CheckRegistry::new();
        registry.register("a", a.clone());
        let output = quiet();
        let runner = HookRunner::new(&registry, &output, ".");

        let mut spec = spec(HookKind::PrePush, vec![CheckDescriptor::new("a")]);
        spec.skip = SkipRule::Branches(BranchMatcher::new(&["release/*".to_string()]).unwrap());

        let on_release = HookContext {
            commit_message: None,
            branch: Some("release/1.2".to_string()),
        };
        let report = runner.run(&spec, &on_release).await.unwrap();
        assert_eq!(
            report.skipped,
            Some(SkipReason::BranchMatched {
                branch: "release/1.2".to_string(),
                pattern: "release/*".to_string(),
            })
        );
        assert_eq!(a.calls(), 0);

        let on_main = HookContext {
            commit_message: None,
            branch: Some("main".to_string()),
        };
        let report = runner.run(&spec, &on_main).await.unwrap();
        assert!(report.skipped.is_none());
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_check_fails_before_running() {
        let a = FakeCheck::new(false);
        let mut registry = CheckRegistry::new();
        registry.register("a", a.clone());
        let output = quiet();
        let runner = HookRunner::new(&registry, &output, ".");

        let spec = spec(
            HookKind::PreCommit,
            vec![CheckDescriptor::new("a"), CheckDescriptor::new("mystery")],
        );
        let err = runner.run(&spec, &HookContext::default()).await.unwrap_err();

        assert!(matches!(err, HookError::UnknownCheck { ref name, .. } if name == "mystery"));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_error() {
        let mut slow = FakeCheck::new(false);
        slow.delay = Duration::from_secs(10);
        let mut registry = CheckRegistry::new();
        registry.register("slow", slow);
        let output = quiet();
        let runner = HookRunner::new(&registry, &output, ".");

        let mut spec = spec(HookKind::PrePush, vec![CheckDescriptor::new("slow")]);
        spec.timeout = Some(Duration::from_millis(50));
        let err = runner.run(&spec, &HookContext::default()).await.unwrap_err();

        assert!(matches!(err, HookError::Timeout { hook: HookKind::PrePush, .. }));
    }

    #[tokio::test]
    async fn test_ad_hoc_command_check() {
        let registry = CheckRegistry::new();
        let output = quiet();
        let dir = tempfile::TempDir::new().unwrap();
        let runner = HookRunner::new(&registry, &output, dir.path());

        let spec = spec(
            HookKind::PreCommit,
            vec![
                CheckDescriptor::new("ok").with_command("true"),
                CheckDescriptor::new("bad").with_command("exit 2"),
            ],
        );
        let report = runner.run(&spec, &HookContext::default()).await.unwrap();

        assert!(!report.passed());
        assert_eq!(report.results[0].name, "ok");
        assert!(report.results[1].error.as_deref().unwrap().contains("exited with 2"));
    }

    #[test]
    fn test_spec_from_config() {
        let mut config = EffectiveConfig::default();
        config.pre_commit.timeout = 0;
        config.pre_commit.skip_pattern = Some("/^wip/i".to_string());
        config.pre_push.skip_branches = vec!["hotfix/*".to_string()];

        let pre_commit = HookSpec::pre_commit(&config).unwrap();
        assert!(pre_commit.timeout.is_none());
        assert!(
            matches!(pre_commit.skip, SkipRule::MessagePattern(ref re) if re.is_match("WIP stuff"))
        );

        let pre_push = HookSpec::pre_push(&config).unwrap();
        assert_eq!(pre_push.timeout, Some(Duration::from_millis(300_000)));
        assert!(matches!(pre_push.skip, SkipRule::Branches(_)));

        config.pre_commit.skip_pattern = Some("(unclosed".to_string());
        assert!(matches!(
            HookSpec::pre_commit(&config),
            Err(HookError::Pattern { hook: HookKind::PreCommit, .. })
        ));
    }
}
