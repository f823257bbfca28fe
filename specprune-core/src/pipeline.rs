//! The prune-then-merge pipeline, extracted from the CLI.
//!
//! One run is one transaction: the primary spec is loaded, pruned, folded
//! with every fragment in order, and persisted at most once at the end. Any
//! failure returns before the sink is touched.

use crate::ports::{DescriptorSink, DescriptorSource};
use crate::settings::RunSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use serde::Serialize;
use specprune_edit::{EditError, MergeReport, PruneReport, merge_document, prune_document};
use specprune_spec::{Document, SpecError};
use std::fmt;
use tracing::{debug, info};

/// Error type for pipeline results. Exit code 2 = unparsable spec, 1 = anything else.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    Usage(String),
    #[error("{0:#}")]
    Parse(anyhow::Error),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Parse(_) => 2,
            ToolError::Usage(_) | ToolError::Internal(_) => 1,
        }
    }

    /// Sort an error into parse failures and everything else.
    pub fn classify(err: anyhow::Error) -> Self {
        let parse_failure = err.chain().any(|cause| {
            cause
                .downcast_ref::<SpecError>()
                .is_some_and(SpecError::is_parse_failure)
                || cause
                    .downcast_ref::<EditError>()
                    .is_some_and(EditError::is_parse_failure)
        });
        if parse_failure {
            ToolError::Parse(err)
        } else {
            ToolError::Internal(err)
        }
    }
}

/// Progress of folding fragments into the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Idle,
    /// Parsing fragment `i`.
    Loading(usize),
    /// Folding fragment `i` into the primary.
    Merging(usize),
    Done,
}

impl MergeState {
    /// Leave `Idle` for the first fragment, or finish straight away.
    pub fn start(total: usize) -> Self {
        if total == 0 {
            MergeState::Done
        } else {
            MergeState::Loading(0)
        }
    }

    pub fn loaded(self) -> Self {
        match self {
            MergeState::Loading(i) => MergeState::Merging(i),
            other => other,
        }
    }

    pub fn folded(self, total: usize) -> Self {
        match self {
            MergeState::Merging(i) if i + 1 < total => MergeState::Loading(i + 1),
            MergeState::Merging(_) => MergeState::Done,
            other => other,
        }
    }
}

/// One progress line, in the order the edits happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    RemovedSection {
        section: String,
    },
    DroppedLine {
        line: String,
    },
    MergedSection {
        source: Utf8PathBuf,
        section: String,
        index: usize,
    },
    AppendedLine {
        source: Utf8PathBuf,
        line: String,
    },
    CarriedDefinition {
        source: Utf8PathBuf,
        line: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RemovedSection { section } => write!(f, "Removing section: '%{section}'"),
            Notice::DroppedLine { line } => write!(f, "Removing line: '{line}'"),
            Notice::MergedSection {
                source,
                section,
                index,
            } => write!(
                f,
                "Merging section: '%{section}' from {source} at position {index}"
            ),
            Notice::AppendedLine { source, line } => {
                write!(f, "Appending line from {source}: '{line}'")
            }
            Notice::CarriedDefinition { source, line } => {
                write!(f, "Carrying definition from {source}: '{line}'")
            }
        }
    }
}

fn prune_notices(report: &PruneReport) -> impl Iterator<Item = Notice> + '_ {
    let sections = report.removed_sections.iter().map(|id| Notice::RemovedSection {
        section: id.to_string(),
    });
    let lines = report
        .dropped_lines
        .iter()
        .map(|line| Notice::DroppedLine { line: line.clone() });
    sections.chain(lines)
}

fn merge_notices<'a>(
    source: &'a Utf8Path,
    report: &'a MergeReport,
) -> impl Iterator<Item = Notice> + 'a {
    let definitions = report
        .definitions
        .iter()
        .map(move |line| Notice::CarriedDefinition {
            source: source.to_path_buf(),
            line: line.clone(),
        });
    let sections = report.inserted.iter().map(move |merged| Notice::MergedSection {
        source: source.to_path_buf(),
        section: merged.id.to_string(),
        index: merged.index,
    });
    let lines = report
        .appended_lines
        .iter()
        .map(move |line| Notice::AppendedLine {
            source: source.to_path_buf(),
            line: line.clone(),
        });
    definitions.chain(sections).chain(lines)
}

/// Outcome of [`run`].
#[derive(Debug)]
pub struct RunOutcome {
    pub primary: Document,
    pub notices: Vec<Notice>,
    pub prune: PruneReport,
    pub merges: Vec<(Utf8PathBuf, MergeReport)>,
    /// Unified diff of the primary; empty when nothing changed.
    pub patch: String,
    pub changed: bool,
    pub written: bool,
}

impl RunOutcome {
    pub fn report(&self, settings: &RunSettings) -> RunReport {
        RunReport {
            primary: settings.primary.clone(),
            secondaries: settings.secondaries.clone(),
            dry_run: settings.dry_run,
            written: self.written,
            counts: RunCounts {
                sections_removed: self.prune.removed_sections.len(),
                lines_dropped: self.prune.dropped_lines.len(),
                sections_merged: self.merges.iter().map(|(_, m)| m.inserted.len()).sum(),
                install_lines_appended: self
                    .merges
                    .iter()
                    .map(|(_, m)| m.appended_lines.len())
                    .sum(),
                definitions_carried: self.merges.iter().map(|(_, m)| m.definitions.len()).sum(),
            },
            notices: self.notices.clone(),
        }
    }
}

/// Machine-readable summary of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub primary: Utf8PathBuf,
    pub secondaries: Vec<Utf8PathBuf>,
    pub dry_run: bool,
    pub written: bool,
    pub counts: RunCounts,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub sections_removed: usize,
    pub lines_dropped: usize,
    pub sections_merged: usize,
    pub install_lines_appended: usize,
    pub definitions_carried: usize,
}

impl RunReport {
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serialize run report")
    }
}

/// Prune the primary spec, fold every fragment into it, and save it once.
///
/// Nothing is saved on a dry run or when the rendered text is unchanged.
pub fn run(
    settings: &RunSettings,
    source: &dyn DescriptorSource,
    sink: &dyn DescriptorSink,
) -> Result<RunOutcome, ToolError> {
    let plan = settings
        .prune_plan()
        .context("invalid prune configuration")?;

    let mut primary = source
        .load(&settings.primary, &settings.macros)
        .map_err(ToolError::classify)?;
    let before = primary.render();

    let prune = prune_document(&mut primary, &plan)
        .with_context(|| format!("prune {}", settings.primary))
        .map_err(ToolError::classify)?;
    let mut notices: Vec<Notice> = prune_notices(&prune).collect();

    let total = settings.secondaries.len();
    let mut merges = Vec::with_capacity(total);
    let mut state = MergeState::start(total);
    while let MergeState::Loading(i) = state {
        let path = &settings.secondaries[i];
        debug!(?state, fragment = %path, "loading fragment");
        let fragment = source
            .load(path, &settings.macros)
            .map_err(ToolError::classify)?;

        state = state.loaded();
        debug!(?state, fragment = %path, "merging fragment");
        let report = merge_document(&mut primary, &fragment, &settings.insertion)
            .with_context(|| format!("merge {} into {}", path, settings.primary))
            .map_err(ToolError::classify)?;
        notices.extend(merge_notices(path, &report));
        merges.push((path.clone(), report));

        state = state.folded(total);
    }

    let after = primary.render();
    let changed = after != before;
    let patch = render_patch(&settings.primary, &before, &after);

    let written = if settings.dry_run {
        info!(primary = %settings.primary, "dry run; not saving");
        false
    } else if !changed {
        info!(primary = %settings.primary, "primary unchanged; not saving");
        false
    } else {
        sink.save(&primary)?;
        info!(primary = %settings.primary, "saved primary");
        true
    };

    Ok(RunOutcome {
        primary,
        notices,
        prune,
        merges,
        patch,
        changed,
        written,
    })
}

/// Unified diff between two renderings of the spec at `path`.
pub fn render_patch(path: &Utf8Path, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let patch = diffy::create_patch(before, after);
    let body = PatchFormatter::new().fmt_patch(&patch).to_string();

    let mut out = format!("--- a/{0}\n+++ b/{0}\n", path);
    for line in body
        .lines()
        .skip_while(|l| l.starts_with("--- ") || l.starts_with("+++ "))
    {
        out.push_str(line);
        out.push('\n');
    }
    out
}
