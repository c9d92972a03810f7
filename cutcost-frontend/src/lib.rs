pub mod cli;
pub mod errors;
pub mod loader;
pub mod locale;

use std::io::{self, Write};
use std::path::PathBuf;

use cutcost_config::{AppConfig, FrontendMode};
use cutcost_core::currency::{CurrencyCatalog, CurrencyCode};
use cutcost_core::units::LengthUnit;
use cutcost_engine::session::{Event, Session, Tables};
use errors::FrontendError;
use loader::UploadLoader;
use tracing::{info, warn};

/// 启动参数，未给出的项取自配置文件。
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub files: Vec<PathBuf>,
    pub unit: Option<LengthUnit>,
    pub currency: Option<CurrencyCode>,
    pub price: Option<String>,
    pub locale: Option<String>,
    pub mode: Option<FrontendMode>,
}

/// 按启动参数与配置建立会话：检测语言区域、选定默认货币并应用初始选择。
pub fn build_session(options: &LaunchOptions, config: &AppConfig) -> Session {
    let preferred = options
        .locale
        .as_deref()
        .or(config.estimate.locale.as_deref());
    let tables = Tables {
        locale: locale::detect_locale(preferred),
        currencies: currency_catalog(config),
        ..Tables::default()
    };
    let currency = locale::default_currency(&tables.locale, &tables.currencies);
    let unit = options.unit.unwrap_or(config.estimate.default_unit);
    info!(locale = %tables.locale.tag(), %currency, %unit, "初始化估算会话");

    let mut session = Session::new(tables, unit, currency);
    if let Some(currency) = options.currency {
        if let Some(alert) = session.apply(Event::CurrencySelected(currency)) {
            warn!(%alert, "忽略指定的货币");
        }
    }
    if let Some(price) = &options.price {
        session.apply(Event::PriceEdited(price.clone()));
    }
    session
}

fn currency_catalog(config: &AppConfig) -> CurrencyCatalog {
    let Some(codes) = &config.estimate.currencies else {
        return CurrencyCatalog::standard();
    };
    CurrencyCatalog::restricted(codes).unwrap_or_else(|| {
        warn!("配置的可选货币为空，提供全部货币");
        CurrencyCatalog::standard()
    })
}

/// 按模式运行终端前端。
pub fn run(options: LaunchOptions, config: &AppConfig) -> Result<(), FrontendError> {
    let mode = options.mode.unwrap_or(config.frontend.default_mode);
    info!(?mode, files = options.files.len(), "启动切割费用估算前端");

    let mut session = build_session(&options, config);
    let loader = UploadLoader::new(config.measurement.svg_flatten_tolerance);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match mode {
        FrontendMode::Report => cli::run_report(&mut session, &loader, &options.files, &mut out),
        FrontendMode::Interactive => {
            if let Some(alert) = cli::preload(&mut session, &loader, &options.files) {
                writeln!(out, "提示: {alert}")?;
            }
            let bus = cli::interactive_bus(loader);
            let stdin = io::stdin();
            cli::run_interactive(&mut session, &bus, stdin.lock(), &mut out)
        }
    }
}
