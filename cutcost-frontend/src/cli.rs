use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use cutcost_core::units::LengthUnit;
use cutcost_engine::command::{
    CommandBus, CommandContext, CommandHandler, CommandRequest, CommandResponse,
};
use cutcost_engine::errors::EngineError;
use cutcost_engine::session::{Phase, Session};
use cutcost_io::display_name;
use tracing::{debug, info};

use crate::errors::FrontendError;
use crate::loader::{UploadLoader, select_upload};

/// 交互模式下的 `load <path>` 命令。
pub struct LoadCommand {
    loader: UploadLoader,
}

impl LoadCommand {
    pub fn new(loader: UploadLoader) -> Self {
        Self { loader }
    }
}

impl CommandHandler for LoadCommand {
    fn name(&self) -> &'static str {
        "load"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if request.raw_args.is_empty() {
            return EngineError::MissingArgument("load").into();
        }
        // 路径中可能含空格
        let path = PathBuf::from(&request.raw_args);
        match context.session.apply(self.loader.load_event(&path)) {
            Some(alert) => CommandResponse::err(alert.to_string()),
            None => CommandResponse::ok(format!("已加载 {}", display_name(&path))),
        }
    }
}

/// 构建交互模式使用的命令总线。
pub fn interactive_bus(loader: UploadLoader) -> CommandBus {
    let mut bus = CommandBus::new();
    bus.register(LoadCommand::new(loader));
    bus
}

/// 打印当前状态：空闲提示、零长度警告或长度与费用。
pub fn render_view<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    let view = session.view();
    let state = session.state();

    if let Some(upload) = state.upload() {
        writeln!(out, "文件: {} ({})", upload.file_name, upload.kind)?;
        writeln!(
            out,
            "图元: 已统计 {} 个, 忽略 {} 个",
            upload.report.measured, upload.report.skipped
        )?;
    }

    match view.phase {
        Phase::Idle => {
            writeln!(out, "尚未上传图纸，支持 .dxf 与 .svg 文件。")?;
        }
        Phase::ZeroLength => {
            if let Some(warning) = view.warning {
                writeln!(out, "警告: {warning}")?;
            }
        }
        Phase::Measured => {
            if let Some(length) = &view.length_text {
                writeln!(out, "长度: {length}")?;
            }
            writeln!(out, "货币: {}", view.currency)?;
            if state.price().is_empty() {
                writeln!(out, "单价: 未填写（每 {}）", view.unit)?;
            } else {
                writeln!(out, "单价: {} / {}", state.price(), view.unit)?;
            }
            if let Some(cost) = &view.cost_text {
                writeln!(out, "费用: {cost}")?;
            }
        }
    }
    Ok(())
}

pub fn render_help<W: Write>(out: &mut W, session: &Session, bus: &CommandBus) -> io::Result<()> {
    let mut commands: Vec<&str> = bus.available_commands().copied().collect();
    commands.extend(["show", "help", "quit"]);
    commands.sort_unstable();
    writeln!(out, "支持的命令: {}", commands.join(", "))?;

    let units: Vec<String> = LengthUnit::ALL
        .iter()
        .map(|unit| format!("{}({})", unit.symbol(), unit.label()))
        .collect();
    writeln!(out, "可选单位: {}", units.join(" "))?;

    let currencies: Vec<String> = session
        .tables()
        .currencies
        .options()
        .iter()
        .map(|option| format!("{} {}", option.code, option.name))
        .collect();
    writeln!(out, "可选货币: {}", currencies.join(", "))?;
    Ok(())
}

/// 若命令行给出了文件，先处理第一个；被拒绝时返回提示内容。
pub fn preload(
    session: &mut Session,
    loader: &UploadLoader,
    files: &[PathBuf],
) -> Option<String> {
    let path: &Path = select_upload(files)?;
    session
        .apply(loader.load_event(path))
        .map(|alert| alert.to_string())
}

/// 一次性输出测量与报价结果。
pub fn run_report<W: Write>(
    session: &mut Session,
    loader: &UploadLoader,
    files: &[PathBuf],
    out: &mut W,
) -> Result<(), FrontendError> {
    if let Some(alert) = preload(session, loader, files) {
        writeln!(out, "提示: {alert}")?;
        return Err(FrontendError::Rejected(alert));
    }
    render_view(out, session)?;
    Ok(())
}

/// 逐行读取命令直到 `quit` 或输入结束。
pub fn run_interactive<R: BufRead, W: Write>(
    session: &mut Session,
    bus: &CommandBus,
    mut input: R,
    out: &mut W,
) -> Result<(), FrontendError> {
    info!("进入交互模式");
    writeln!(out, "切割费用估算，输入 help 查看命令。")?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let Some(request) = CommandRequest::parse(&line) else {
            continue;
        };
        debug!(command = %request.name, args = ?request.args, "执行交互命令");

        match request.name.as_str() {
            "quit" | "exit" => break,
            "help" => render_help(out, session, bus)?,
            "show" => render_view(out, session)?,
            _ => {
                let mut context = CommandContext {
                    session: &mut *session,
                };
                let response = bus.dispatch(&request, &mut context);
                if let Some(message) = &response.message {
                    if response.success {
                        writeln!(out, "{message}")?;
                    } else {
                        writeln!(out, "提示: {message}")?;
                    }
                }
                if response.success && request.name == "load" {
                    render_view(out, session)?;
                }
            }
        }
    }

    info!("退出交互模式");
    Ok(())
}

#[cfg(test)]
mod tests {
    use cutcost_core::currency::CurrencyCode;
    use cutcost_engine::session::Tables;

    use super::*;

    fn session() -> Session {
        Session::new(Tables::default(), LengthUnit::Centimeter, CurrencyCode::Usd)
    }

    fn rendered(session: &Session) -> String {
        let mut out = Vec::new();
        render_view(&mut out, session).expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn idle_view_prompts_for_upload() {
        let text = rendered(&session());
        assert!(text.contains("尚未上传图纸"));
        assert!(!text.contains("费用"));
    }

    #[test]
    fn report_without_files_renders_idle() {
        let mut session = session();
        let mut out = Vec::new();
        run_report(&mut session, &UploadLoader::default(), &[], &mut out).expect("report");
        assert!(String::from_utf8(out).unwrap().contains("尚未上传图纸"));
    }

    #[test]
    fn report_rejects_unsupported_extension() {
        let mut session = session();
        let mut out = Vec::new();
        let err = run_report(
            &mut session,
            &UploadLoader::default(),
            &[PathBuf::from("drawing.png")],
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, FrontendError::Rejected(_)));
        assert!(String::from_utf8(out).unwrap().contains("drawing.png"));
        assert_eq!(session.view().phase, Phase::Idle);
    }

    #[test]
    fn interactive_help_lists_all_commands() {
        let mut session = session();
        let bus = interactive_bus(UploadLoader::default());
        let mut out = Vec::new();
        run_interactive(&mut session, &bus, "help\nquit\n".as_bytes(), &mut out).expect("run");

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(
            "支持的命令: currency, help, load, price, quit, remove, show, unit"
        ));
        assert!(text.contains("JPY Japanese Yen"));
    }

    #[test]
    fn interactive_load_without_path_reports_missing_argument() {
        let mut session = session();
        let bus = interactive_bus(UploadLoader::default());
        let mut out = Vec::new();
        run_interactive(&mut session, &bus, "load\n".as_bytes(), &mut out).expect("run");
        assert!(String::from_utf8(out).unwrap().contains("提示: command `load` requires an argument"));
    }
}
