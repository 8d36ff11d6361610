use crate::adapters::http::page;
use crate::adapters::proj::ProjRegistry;
use crate::config::AppConfig;
use crate::core::convert::Converter;
use crate::utils::error::Result;

pub struct AppState {
    pub config: AppConfig,
    pub converter: Converter<ProjRegistry>,
    pub page: String,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let converter = Converter::with_max_rows(ProjRegistry::new(), config.max_rows);
        let page = page::render(&config)?;
        Ok(Self {
            config,
            converter,
            page,
        })
    }
}
