//! Dashboard configuration.
//!
//! Reads `trendscope.toml` from the current directory or the path in the
//! `TRENDSCOPE_CONFIG` env var. YAML and JSON files are accepted as well,
//! chosen by file extension. Every field has a default, so an empty file is a
//! valid configuration that reproduces the stock `data/input/` layout.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

pub const CONFIG_ENV_VAR: &str = "TRENDSCOPE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "trendscope.toml";

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

// ── Domains and views ────────────────────────────────────────────────────────

/// Which filing data set a count view reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Patent,
    Paper,
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "patent" | "patents" => Ok(Domain::Patent),
            "paper" | "papers" => Ok(Domain::Paper),
            other => Err(format!("unknown domain '{other}' (expected patent or paper)")),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Patent => write!(f, "patent"),
            Domain::Paper => write!(f, "paper"),
        }
    }
}

/// Breakdown shown by a count view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Monthly,
    Country,
    Company,
    Industry,
}

impl View {
    /// Grouped views carry a country/company/industry column next to the
    /// technical element.
    pub fn is_grouped(self) -> bool {
        !matches!(self, View::Monthly)
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(View::Monthly),
            "country" => Ok(View::Country),
            "company" => Ok(View::Company),
            "industry" => Ok(View::Industry),
            other => Err(format!(
                "unknown view '{other}' (expected monthly, country, company or industry)"
            )),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Monthly => "monthly",
            View::Country => "country",
            View::Company => "company",
            View::Industry => "industry",
        };
        f.write_str(name)
    }
}

// ── Data files ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory the file names below are resolved against.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_patent_files")]
    pub patent: ViewFiles,

    #[serde(default = "default_paper_files")]
    pub paper: ViewFiles,

    /// Technical difficulty ratings.
    #[serde(default = "default_difficulty_file")]
    pub difficulty: String,
}

/// One file name per view of a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewFiles {
    pub monthly: String,
    pub country: String,
    pub company: String,
    pub industry: String,
}

fn default_root() -> PathBuf { PathBuf::from("data/input") }
fn default_difficulty_file() -> String { "ecosystem_analysis_result_eng.csv".to_string() }

fn default_patent_files() -> ViewFiles {
    ViewFiles {
        monthly: "combined_patent_counts_by_month_with_flags.csv".to_string(),
        country: "patent_country_merged_file_with_flags.csv".to_string(),
        company: "company_patents_merged_file_with_flags.csv".to_string(),
        industry: "industry_patents_merged_file_with_flags.csv".to_string(),
    }
}

fn default_paper_files() -> ViewFiles {
    ViewFiles {
        monthly: "combined_paper_counts_by_month_with_flags.csv".to_string(),
        country: "paper_country_merged_file_with_flags.csv".to_string(),
        company: "paper_company_merged_file_with_flags.csv".to_string(),
        industry: "paper_industry_merged_file_with_flags.csv".to_string(),
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            patent: default_patent_files(),
            paper: default_paper_files(),
            difficulty: default_difficulty_file(),
        }
    }
}

impl ViewFiles {
    pub fn file_for(&self, view: View) -> &str {
        match view {
            View::Monthly => &self.monthly,
            View::Country => &self.country,
            View::Company => &self.company,
            View::Industry => &self.industry,
        }
    }
}

impl DataConfig {
    /// Path of the count file backing `(domain, view)`.
    pub fn path_for(&self, domain: Domain, view: View) -> PathBuf {
        let files = match domain {
            Domain::Patent => &self.patent,
            Domain::Paper => &self.paper,
        };
        self.root.join(files.file_for(view))
    }

    pub fn difficulty_path(&self) -> PathBuf {
        self.root.join(&self.difficulty)
    }
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Composite score weights. Renormalised to sum to 1.0 by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_trl_weight")]
    pub trl_weight: f64,

    #[serde(default = "default_technical_weight")]
    pub technical_weight: f64,

    #[serde(default = "default_social_weight")]
    pub social_weight: f64,
}

fn default_trl_weight()       -> f64 { 0.35 }
fn default_technical_weight() -> f64 { 0.50 }
fn default_social_weight()    -> f64 { 0.20 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            trl_weight: default_trl_weight(),
            technical_weight: default_technical_weight(),
            social_weight: default_social_weight(),
        }
    }
}

// ── Display ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{other}' (expected table, json or csv)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Show raw count lines.
    #[serde(default = "bool_true")]
    pub show_raw: bool,

    /// Overlay the 6-period moving average.
    #[serde(default = "bool_true")]
    pub show_moving_average: bool,

    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

fn bool_true() -> bool { true }
fn default_format() -> OutputFormat { OutputFormat::Table }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_raw: true,
            show_moving_average: true,
            format: default_format(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────────────────

impl DashboardConfig {
    /// Load configuration from `trendscope.toml`.
    /// Checks the TRENDSCOPE_CONFIG env var first, then the current directory.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&path).exists() {
            return Err(TrendError::Config(format!(
                "config file not found: {path}\n\
                 Copy trendscope.example.toml to trendscope.toml and edit it."
            )));
        }

        Self::load_from(Path::new(&path))
    }

    /// Load from an explicit file; the format follows the extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config: Self = match extension.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| TrendError::Config(format!("{}: {e}", path.display())))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| TrendError::Config(format!("{}: {e}", path.display())))?,
            _ => toml::from_str(&content)
                .map_err(|e| TrendError::Config(format!("{}: {e}", path.display())))?,
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded dashboard configuration");
        Ok(config)
    }

    /// Reject weights that cannot be renormalised.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        let weights = [s.trl_weight, s.technical_weight, s.social_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(TrendError::Config(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(TrendError::Config(
                "at least one scoring weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
