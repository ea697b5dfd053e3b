//! Shared fixtures for trendscope tests.
//!
//! The CSV fixtures mirror the column layouts of the real input files: the
//! monthly file uses `category`, grouped files use `Technical_elements` with
//! a country/company/industry column, and the difficulty file carries base
//! `_tech` ratings plus `_industry`/`_company` variants.

use std::path::{Path, PathBuf};

pub use pretty_assertions::{assert_eq, assert_ne};

pub const MONTHLY_CSV: &str = "\
year_month,category,items,ma_6,conversion_flag
2023-01,AI,10,8.5,False
2023-02,AI,5,7.0,True
2023-01,Robotics,3,2.0,False
2023-02,Robotics,4,3.5,False
2023-03,AI,6,7.2,False
";

pub const COUNTRY_CSV: &str = "\
year_month,Technical_elements,Country,items,ma_6,conversion_flag
2023-01,AI,US,4,3.0,False
2023-01,AI,JP,2,1.5,False
2023-02,AI,US,6,4.0,True
2023-02,AI,JP,1,1.2,False
2023-01,Robotics,US,9,8.0,False
bad-date,AI,JP,3,1.0,False
";

pub const COMPANY_CSV: &str = "\
year_month,technical_elements,company,items,ma_6,conversion_flag
2023-01,AI,Acme,1,,False
2023-02,AI,Acme,2,1.5,True
2023-01,AI,Globex,5,4.0,False
";

pub const DIFFICULTY_CSV: &str = "\
technology,industry,company,TRL_tech,Technical_Feasibility_tech,Social_Feasibility_tech,TRL_industry,Technical_Feasibility_industry,Social_Feasibility_industry,TRL_company,Technical_Feasibility_company,Social_Feasibility_company,Composite_Score_Comment_industry,TRL_Comment_tech
AI,Automotive,Acme,9,5,1,9,5,1,5,3,3,mature supply chain,field proven
AI,Healthcare,Globex,5,3,3,1,1,5,7,4,2,regulatory hurdles,lab prototypes
Robotics,Automotive,Acme,1,1,5,5,3,3,5,3,3,,
Robotics,Logistics,Initech,7,4,2,7,4,2,1,1,5,warehouse pilots,pilot lines
";

/// A temporary directory holding fixture files. Removed on drop.
pub struct FixtureDir {
    dir: tempfile::TempDir,
}

impl FixtureDir {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the directory and return its path.
    pub fn write(&self, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write the stock fixture set under the default file names used by the
    /// dashboard configuration.
    pub fn with_default_layout() -> anyhow::Result<Self> {
        let fixtures = Self::new()?;
        fixtures.write("combined_patent_counts_by_month_with_flags.csv", MONTHLY_CSV)?;
        fixtures.write("patent_country_merged_file_with_flags.csv", COUNTRY_CSV)?;
        fixtures.write("company_patents_merged_file_with_flags.csv", COMPANY_CSV)?;
        fixtures.write("ecosystem_analysis_result_eng.csv", DIFFICULTY_CSV)?;
        Ok(fixtures)
    }
}

/// Approximate float comparison for scores.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
