use meridian_application::config::Config;
use meridian_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use meridian_domain::repositories::market_data::MarketDataRepository;
use meridian_infrastructure::artifacts::{FilesystemArtifactReader, FilesystemArtifactWriter};
use meridian_infrastructure::market_data::CsvMarketDataRepository;

pub struct EngineDeps {
    pub market_data: Box<dyn MarketDataRepository>,
    pub artifacts: Box<dyn ArtifactWriter>,
}

pub struct ReportingDeps {
    pub reader: Box<dyn ArtifactReader>,
    pub writer: Box<dyn ArtifactWriter>,
}

pub fn build_engine_deps(config: &Config) -> EngineDeps {
    EngineDeps {
        market_data: build_market_data_repo(config),
        artifacts: Box::new(FilesystemArtifactWriter::new()),
    }
}

pub fn build_market_data_repo(config: &Config) -> Box<dyn MarketDataRepository> {
    Box::new(CsvMarketDataRepository::new(&config.data.ohlcv_csv))
}

pub fn build_reporting_deps() -> ReportingDeps {
    ReportingDeps {
        reader: Box::new(FilesystemArtifactReader::new()),
        writer: Box::new(FilesystemArtifactWriter::new()),
    }
}
