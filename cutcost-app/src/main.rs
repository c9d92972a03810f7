use std::path::PathBuf;

use clap::Parser;
use cutcost_config::{AppConfig, ConfigError, FrontendMode};
use cutcost_core::currency::CurrencyCode;
use cutcost_core::units::LengthUnit;
use cutcost_frontend::LaunchOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 测量 DXF / SVG 图纸的切割长度并估算费用。
#[derive(Debug, Parser)]
#[command(name = "cutcost", version)]
struct Cli {
    /// 图纸文件（.dxf / .svg），多个时只处理第一个
    files: Vec<PathBuf>,
    /// 显示单位：mm、cm、m、in、ft
    #[arg(short, long)]
    unit: Option<LengthUnit>,
    /// 货币代码，如 USD、EUR
    #[arg(short, long)]
    currency: Option<CurrencyCode>,
    /// 每单位长度的单价
    #[arg(short, long, allow_hyphen_values = true)]
    price: Option<String>,
    /// 覆盖系统语言区域，如 de-DE
    #[arg(long)]
    locale: Option<String>,
    /// 指定配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    /// 进入交互模式
    #[arg(long, conflicts_with = "report")]
    interactive: bool,
    /// 一次性输出结果
    #[arg(long)]
    report: bool,
}

impl Cli {
    fn mode(&self) -> Option<FrontendMode> {
        if self.interactive {
            Some(FrontendMode::Interactive)
        } else if self.report {
            Some(FrontendMode::Report)
        } else {
            None
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let explicit = cli.config.is_some();
    let loaded = load_configuration(cli.config.clone());
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config);
    // 日志初始化之后再报告配置回退
    if let Err(err) = &loaded {
        report_config_fallback(err, explicit);
    }
    info!("启动切割费用估算");

    let options = LaunchOptions {
        mode: cli.mode(),
        files: cli.files,
        unit: cli.unit,
        currency: cli.currency,
        price: cli.price,
        locale: cli.locale,
    };
    if let Err(err) = cutcost_frontend::run(options, &config) {
        error!(error = %err, "估算失败");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn report_config_fallback(err: &ConfigError, explicit: bool) {
    if explicit {
        warn!(error = %err, "加载指定配置失败，使用默认配置");
        return;
    }
    match err {
        ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
            warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
        }
        ConfigError::Context { .. } => {
            warn!(error = %err, "加载默认配置失败，使用内建默认值");
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // 标准输出留给报告
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
