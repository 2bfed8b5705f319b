use crate::domain::reference::{ImageTypePriority, NotAvailableLots, ReferenceData, Yard, YardTable};
use crate::domain::table::Quoting;
use crate::utils::error::{RecordsError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub paths: PathsConfig,
    pub yards: Vec<YardConfig>,
    pub lots: LotsConfig,
    pub images: ImagesConfig,
    pub burial_status: BurialStatusConfig,
    pub tables: TablesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: String,
    pub images_dir: String,
    pub reports_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YardConfig {
    pub code: String,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LotsConfig {
    /// Lots held at "Not Available" for physical reasons.
    pub not_available: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub type_priority: Vec<String>,
    pub orphan_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BurialStatusConfig {
    pub cremations: Vec<String>,
    pub vaults: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub plots: Quoting,
    pub lots: Quoting,
    pub occupants: Quoting,
    pub veterans: Quoting,
    pub available_lots: Quoting,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            yards: default_yards(),
            lots: LotsConfig::default(),
            images: ImagesConfig::default(),
            burial_status: BurialStatusConfig::default(),
            tables: TablesConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            images_dir: "Monument Images".to_string(),
            reports_dir: "reports".to_string(),
        }
    }
}

impl Default for LotsConfig {
    fn default() -> Self {
        Self {
            not_available: vec!["OYK1-L1".to_string(), "UTB25-L1".to_string()],
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            type_priority: ["F", "B", "P", "V"].iter().map(|s| s.to_string()).collect(),
            orphan_extensions: ["jpg", "jpeg", "png", "gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            plots: Quoting::All,
            lots: Quoting::Necessary,
            occupants: Quoting::Necessary,
            veterans: Quoting::Necessary,
            available_lots: Quoting::Necessary,
        }
    }
}

fn default_yards() -> Vec<YardConfig> {
    [
        ("CY", "OICA Church Yard"),
        ("IT", "OICA Intervale Terrace"),
        ("NY", "OICA New Yard"),
        ("OY", "OICA Old Yard"),
        ("UT", "OICA Upper Terrace"),
    ]
    .iter()
    .map(|(code, folder)| YardConfig {
        code: code.to_string(),
        folder: folder.to_string(),
    })
    .collect()
}

impl RecordsConfig {
    /// Load the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RecordsError::MissingInput {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replace `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RecordsError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("paths.data_dir", &self.paths.data_dir)?;
        validation::validate_path("paths.images_dir", &self.paths.images_dir)?;
        validation::validate_path("paths.reports_dir", &self.paths.reports_dir)?;

        if self.yards.is_empty() {
            return Err(RecordsError::ConfigError {
                message: "at least one [[yards]] entry is required".to_string(),
            });
        }
        for yard in &self.yards {
            validation::validate_yard_code("yards.code", &yard.code)?;
            validation::validate_non_empty_string("yards.folder", &yard.folder)?;
        }
        validation::validate_unique("yards.code", self.yards.iter().map(|y| y.code.as_str()))?;
        validation::validate_unique("yards.folder", self.yards.iter().map(|y| y.folder.as_str()))?;

        for letter in &self.images.type_priority {
            validation::validate_allowed("images.type_priority", letter, &["F", "B", "P", "V"])?;
        }
        validation::validate_unique(
            "images.type_priority",
            self.images.type_priority.iter().map(String::as_str),
        )?;

        for lot in &self.lots.not_available {
            validation::validate_non_empty_string("lots.not_available", lot)?;
        }

        Ok(())
    }

    /// Resolve the configured directories against `root`.
    pub fn data_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.data_dir)
    }

    pub fn images_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.images_dir)
    }

    pub fn reports_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.reports_dir)
    }

    pub fn reference_data(&self) -> ReferenceData {
        ReferenceData {
            yards: YardTable::new(
                self.yards
                    .iter()
                    .map(|y| Yard {
                        code: y.code.clone(),
                        folder: y.folder.clone(),
                    })
                    .collect(),
            ),
            not_available: NotAvailableLots::new(self.lots.not_available.iter().cloned()),
            image_types: ImageTypePriority::new(
                self.images
                    .type_priority
                    .iter()
                    .filter_map(|s| s.chars().next())
                    .collect(),
            ),
        }
    }

    /// Lower-cased extensions (without the dot) counted as images by the orphan scan.
    pub fn orphan_extensions(&self) -> Vec<String> {
        self.images
            .orphan_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect()
    }
}

impl Validate for RecordsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
