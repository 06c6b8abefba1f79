use confique::Config as _;
use std::sync::OnceLock;

#[derive(confique::Config)]
pub struct Config {
    /// Maximum hop depth for foreign-key join suggestions.
    #[config(env = "SQLSENSE_FK_MAX_DEPTH", default = 2)]
    pub fk_max_depth: usize,
    /// Deadline applied to each async stage, in milliseconds.
    #[config(env = "SQLSENSE_STAGE_TIMEOUT_MS", default = 5000)]
    pub stage_timeout_ms: u64,
    /// Prefix insert text with the schema when the user has not typed one.
    #[config(env = "SQLSENSE_SHOW_SCHEMA", default = false)]
    pub show_schema: bool,
    /// Offer keyword items in keyword contexts.
    #[config(env = "SQLSENSE_KEYWORD_ITEMS", default = true)]
    pub keyword_items: bool,
    /// Offer user-defined snippet items in keyword contexts.
    #[config(env = "SQLSENSE_SNIPPET_ITEMS", default = true)]
    pub snippet_items: bool,
    /// Emit LSP snippet placeholders for procedure parameters.
    #[config(env = "SQLSENSE_PROCEDURE_PLACEHOLDERS", default = false)]
    pub procedure_placeholders: bool,
}

pub fn config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(|| {
        Config::builder()
            .env()
            .load()
            .expect("Failed to load one or more value configuration from the current environment")
    })
}
