//! Clap-free settings for the prune/merge pipeline.

use camino::Utf8PathBuf;
use specprune_edit::{EditResult, InsertionPoint, PrunePlan};
use specprune_spec::MacroTable;

/// Subpackages shipped downstream but not yet supported upstream.
pub const DEFAULT_PACKAGES: &[&str] = &[
    "multus",
    "low-latency",
    "gateway-api",
    "ai-model-serving",
    "cert-manager",
    "observability",
];

/// Section kinds removed for each unsupported subpackage.
pub const DEFAULT_SECTION_KINDS: &[&str] = &["package", "description", "files", "preun", "post"];

/// Install-line substrings removed on top of the package names.
pub const DEFAULT_EXTRA_INSTALL_KEYWORDS: &[&str] = &[
    "lib/tuned",
    "05-high-performance-runtime.conf",
    "microshift-baseline",
    "microshift-tuned",
];

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub primary: Utf8PathBuf,
    pub secondaries: Vec<Utf8PathBuf>,

    // Pruning
    pub packages: Vec<String>,
    pub section_kinds: Vec<String>,
    pub extra_install_keywords: Vec<String>,

    // Parsing
    pub macros: MacroTable,

    // Merging
    pub insertion: InsertionPoint,

    // Persistence
    pub dry_run: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            primary: Utf8PathBuf::from("packaging/rpm/microshift.spec"),
            secondaries: Vec::new(),
            packages: to_strings(DEFAULT_PACKAGES),
            section_kinds: to_strings(DEFAULT_SECTION_KINDS),
            extra_install_keywords: to_strings(DEFAULT_EXTRA_INSTALL_KEYWORDS),
            macros: MacroTable::bootstrap(),
            insertion: InsertionPoint::default(),
            dry_run: false,
        }
    }
}

impl RunSettings {
    pub fn new(primary: impl Into<Utf8PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            ..Self::default()
        }
    }

    /// Validate the pruning lists into a plan.
    pub fn prune_plan(&self) -> EditResult<PrunePlan> {
        PrunePlan::new(
            &self.packages,
            &self.section_kinds,
            &self.extra_install_keywords,
        )
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
