use std::collections::HashMap;

use cutcost_core::currency::CurrencyCode;
use cutcost_core::units::LengthUnit;

use crate::errors::EngineError;
use crate::session::{Event, Session};

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
    /// 命令名之后的原始文本，仅去掉首尾空白，内部空白保持不变。
    pub raw_args: String,
}

impl CommandRequest {
    /// 按空白拆分一行输入；空行返回 `None`。
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let name_end = line.find(char::is_whitespace).unwrap_or(line.len());
        let (name, rest) = line.split_at(name_end);
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_ascii_lowercase(),
            args: rest.split_whitespace().map(str::to_string).collect(),
            raw_args: rest.trim().to_string(),
        })
    }

    fn first_arg(&self, command: &'static str) -> Result<&str, EngineError> {
        self.args
            .first()
            .map(String::as_str)
            .ok_or(EngineError::MissingArgument(command))
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    fn from_event(session: &mut Session, event: Event, done: impl Into<String>) -> Self {
        match session.apply(event) {
            Some(alert) => Self::err(alert.to_string()),
            None => Self::ok(done),
        }
    }
}

impl From<EngineError> for CommandResponse {
    fn from(error: EngineError) -> Self {
        CommandResponse::err(error.to_string())
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub session: &'a mut Session,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(UnitCommand);
        bus.register(CurrencyCommand);
        bus.register(PriceCommand);
        bus.register(RemoveCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

struct UnitCommand;

impl CommandHandler for UnitCommand {
    fn name(&self) -> &'static str {
        "unit"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let unit = match request.first_arg("unit").and_then(|raw| {
            raw.parse::<LengthUnit>()
                .map_err(|err| EngineError::InvalidArgument {
                    command: "unit",
                    message: err.to_string(),
                })
        }) {
            Ok(unit) => unit,
            Err(err) => return err.into(),
        };
        CommandResponse::from_event(
            context.session,
            Event::UnitSelected(unit),
            format!("单位已切换为 {}（{}）", unit.symbol(), unit.label()),
        )
    }
}

struct CurrencyCommand;

impl CommandHandler for CurrencyCommand {
    fn name(&self) -> &'static str {
        "currency"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let currency = match request.first_arg("currency").and_then(|raw| {
            raw.parse::<CurrencyCode>()
                .map_err(|err| EngineError::InvalidArgument {
                    command: "currency",
                    message: err.to_string(),
                })
        }) {
            Ok(currency) => currency,
            Err(err) => return err.into(),
        };
        CommandResponse::from_event(
            context.session,
            Event::CurrencySelected(currency),
            format!("货币已切换为 {currency}"),
        )
    }
}

struct PriceCommand;

impl CommandHandler for PriceCommand {
    fn name(&self) -> &'static str {
        "price"
    }

    /// 不带参数时清空单价。
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let price = request.raw_args.clone();
        let message = if price.is_empty() {
            "单价已清空".to_string()
        } else {
            format!("单价已设为 {price}")
        };
        CommandResponse::from_event(context.session, Event::PriceEdited(price), message)
    }
}

struct RemoveCommand;

impl CommandHandler for RemoveCommand {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        CommandResponse::from_event(context.session, Event::FileRemoved, "已移除上传文件")
    }
}
