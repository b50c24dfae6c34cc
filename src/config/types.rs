use serde::Deserialize;

/// Default manifest location (JavaScript tree of area assignments)
pub const DEFAULT_MANIFEST_URL: &str = "https://www.cec.gov.tw/pc/zh_TW/js/treeP1.js";

/// Default results page template; `{id}` is replaced by the area identifier
pub const DEFAULT_PAGE_URL_TEMPLATE: &str = "https://www.cec.gov.tw/pc/zh_TW/P1/n{id}.html";

/// Placeholder substituted into the page template
pub const ID_PLACEHOLDER: &str = "{id}";

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 30;

/// Main configuration structure for Tally-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the manifest and the per-area pages live
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// URL of the area manifest
    #[serde(rename = "manifest-url", default = "default_manifest_url")]
    pub manifest_url: String,

    /// Results page URL with a single `{id}` placeholder
    #[serde(rename = "page-url-template", default = "default_page_url_template")]
    pub page_url_template: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            page_url_template: default_page_url_template(),
        }
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Number of concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Selectors locating the results table on each page
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    #[serde(rename = "row-selector", default = "default_row_selector")]
    pub row_selector: String,

    #[serde(rename = "cell-selector", default = "default_cell_selector")]
    pub cell_selector: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            row_selector: default_row_selector(),
            cell_selector: default_cell_selector(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// File to write; stdout when absent
    #[serde(default)]
    pub path: Option<String>,

    /// Column labels of the header row
    #[serde(default = "default_header")]
    pub header: Vec<String>,

    /// Sort rows by submission order before rendering
    #[serde(default)]
    pub ordered: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            header: default_header(),
            ordered: false,
        }
    }
}

fn default_manifest_url() -> String {
    DEFAULT_MANIFEST_URL.to_string()
}

fn default_page_url_template() -> String {
    DEFAULT_PAGE_URL_TEMPLATE.to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_user_agent() -> String {
    format!("tally-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_row_selector() -> String {
    "#divContent .trT".to_string()
}

fn default_cell_selector() -> String {
    "td".to_string()
}

fn default_header() -> Vec<String> {
    ["縣市", "鄉鎮市區", "號次", "總統/副總統", "得票數", "得票率%"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
