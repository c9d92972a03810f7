pub mod command;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum EngineError {
        #[error("command `{0}` requires an argument")]
        MissingArgument(&'static str),
        #[error("invalid argument for `{command}`: {message}")]
        InvalidArgument {
            command: &'static str,
            message: String,
        },
    }
}

pub mod session {
    use std::fmt;

    use cutcost_core::currency::{CurrencyCatalog, CurrencyCode, format_amount};
    use cutcost_core::drawing::{Drawing, DrawingKind};
    use cutcost_core::estimate::estimate_cost;
    use cutcost_core::locale::Locale;
    use cutcost_core::measure::MeasureReport;
    use cutcost_core::units::{ConversionTable, LengthUnit};
    use tracing::{debug, info, warn};

    /// 测得长度为 0 时显示的提示，说明两条单位假设。
    pub const ZERO_LENGTH_WARNING: &str = "未测得任何切割长度。请检查图纸：SVG 仅统计 <path> 元素，像素按 96 PPI 换算；DXF 仅统计 LINE 与 LWPOLYLINE，图纸单位按毫米解释。";

    /// 启动时注入的只读数据：单位换算表、货币目录与显示用的语言区域。
    #[derive(Debug, Clone, Default)]
    pub struct Tables {
        pub units: ConversionTable,
        pub currencies: CurrencyCatalog,
        pub locale: Locale,
    }

    /// 当前已处理的上传文件。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Upload {
        pub file_name: String,
        pub kind: DrawingKind,
        pub report: MeasureReport,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Phase {
        /// 尚未上传文件，或文件已移除。
        Idle,
        /// 上传成功但长度为 0，只显示单位假设提示。
        ZeroLength,
        /// 长度为正，显示单位、货币、单价控件与结果。
        Measured,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RejectReason {
        UnsupportedExtension,
        Unreadable(String),
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum Event {
        FileLoaded { file_name: String, drawing: Drawing },
        FileRejected { file_name: String, reason: RejectReason },
        FileRemoved,
        UnitSelected(LengthUnit),
        CurrencySelected(CurrencyCode),
        PriceEdited(String),
    }

    /// 需要提示给用户的消息；产生提示的事件不会改变状态。
    #[derive(Debug, Clone, PartialEq)]
    pub enum Alert {
        UnsupportedFile { file_name: String },
        UnreadableFile { file_name: String, reason: String },
        UnavailableCurrency(CurrencyCode),
    }

    impl fmt::Display for Alert {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Alert::UnsupportedFile { file_name } => {
                    write!(f, "不支持的文件类型：{file_name}（仅接受 .dxf 与 .svg）")
                }
                Alert::UnreadableFile { file_name, reason } => {
                    write!(f, "无法读取文件 {file_name}：{reason}")
                }
                Alert::UnavailableCurrency(code) => write!(f, "货币 {code} 不在可选列表中"),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct EstimatorState {
        upload: Option<Upload>,
        unit: LengthUnit,
        currency: CurrencyCode,
        price: String,
    }

    impl EstimatorState {
        pub fn new(unit: LengthUnit, currency: CurrencyCode) -> Self {
            Self {
                upload: None,
                unit,
                currency,
                price: String::new(),
            }
        }

        #[inline]
        pub fn upload(&self) -> Option<&Upload> {
            self.upload.as_ref()
        }

        /// 以厘米表示的测量长度；未处理任何文件时为 `None`。
        #[inline]
        pub fn length_cm(&self) -> Option<f64> {
            self.upload.as_ref().map(|upload| upload.report.length_cm)
        }

        #[inline]
        pub fn unit(&self) -> LengthUnit {
            self.unit
        }

        #[inline]
        pub fn currency(&self) -> CurrencyCode {
            self.currency
        }

        #[inline]
        pub fn price(&self) -> &str {
            &self.price
        }

        pub fn phase(&self) -> Phase {
            match self.length_cm() {
                None => Phase::Idle,
                Some(length) if length > 0.0 => Phase::Measured,
                Some(_) => Phase::ZeroLength,
            }
        }

        /// 生成展示用的视图数据，只有 `Measured` 阶段才给出长度与金额。
        pub fn view(&self, tables: &Tables) -> EstimateView {
            let phase = self.phase();
            let mut view = EstimateView {
                phase,
                file_name: self.upload.as_ref().map(|upload| upload.file_name.clone()),
                unit: self.unit,
                currency: self.currency,
                length: None,
                length_text: None,
                cost: None,
                cost_text: None,
                warning: None,
            };

            match phase {
                Phase::Idle => {}
                Phase::ZeroLength => view.warning = Some(ZERO_LENGTH_WARNING),
                Phase::Measured => {
                    let length_cm = self.length_cm();
                    let length = length_cm.map(|cm| tables.units.convert(cm, self.unit));
                    view.length = length;
                    view.length_text = length.map(|value| format!("{value:.2} {}", self.unit));
                    view.cost = estimate_cost(length_cm, self.unit, &self.price, &tables.units);
                    view.cost_text = view
                        .cost
                        .map(|amount| format_amount(amount, self.currency, &tables.locale));
                }
            }
            view
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct EstimateView {
        pub phase: Phase,
        pub file_name: Option<String>,
        pub unit: LengthUnit,
        pub currency: CurrencyCode,
        pub length: Option<f64>,
        pub length_text: Option<String>,
        pub cost: Option<f64>,
        pub cost_text: Option<String>,
        pub warning: Option<&'static str>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct Transition {
        pub state: EstimatorState,
        pub alert: Option<Alert>,
    }

    impl Transition {
        fn to(state: EstimatorState) -> Self {
            Self { state, alert: None }
        }

        fn rejected(state: &EstimatorState, alert: Alert) -> Self {
            Self {
                state: state.clone(),
                alert: Some(alert),
            }
        }
    }

    /// 纯状态转移：`(state, event) -> state`，不执行任何 I/O。
    pub fn reduce(state: &EstimatorState, event: Event, tables: &Tables) -> Transition {
        match event {
            Event::FileLoaded { file_name, drawing } => {
                let report = drawing.measure();
                let kind = drawing.kind();
                info!(
                    file_name = %file_name,
                    %kind,
                    length_cm = report.length_cm,
                    measured = report.measured,
                    skipped = report.skipped,
                    "图纸测量完成"
                );
                Transition::to(EstimatorState {
                    upload: Some(Upload {
                        file_name,
                        kind,
                        report,
                    }),
                    ..state.clone()
                })
            }
            Event::FileRejected { file_name, reason } => {
                warn!(file_name = %file_name, ?reason, "上传文件被拒绝");
                let alert = match reason {
                    RejectReason::UnsupportedExtension => Alert::UnsupportedFile { file_name },
                    RejectReason::Unreadable(reason) => Alert::UnreadableFile { file_name, reason },
                };
                Transition::rejected(state, alert)
            }
            Event::FileRemoved => {
                debug!("移除上传文件");
                Transition::to(EstimatorState {
                    upload: None,
                    ..state.clone()
                })
            }
            Event::UnitSelected(unit) => Transition::to(EstimatorState {
                unit,
                ..state.clone()
            }),
            Event::CurrencySelected(currency) => {
                if tables.currencies.find(currency).is_none() {
                    return Transition::rejected(state, Alert::UnavailableCurrency(currency));
                }
                Transition::to(EstimatorState {
                    currency,
                    ..state.clone()
                })
            }
            Event::PriceEdited(price) => Transition::to(EstimatorState {
                price,
                ..state.clone()
            }),
        }
    }

    /// 持有注入表与当前状态，供前端逐个派发事件。
    #[derive(Debug, Clone)]
    pub struct Session {
        tables: Tables,
        state: EstimatorState,
    }

    impl Session {
        pub fn new(tables: Tables, unit: LengthUnit, currency: CurrencyCode) -> Self {
            Self {
                tables,
                state: EstimatorState::new(unit, currency),
            }
        }

        /// 应用事件并返回可能产生的提示。
        pub fn apply(&mut self, event: Event) -> Option<Alert> {
            let transition = reduce(&self.state, event, &self.tables);
            self.state = transition.state;
            transition.alert
        }

        #[inline]
        pub fn state(&self) -> &EstimatorState {
            &self.state
        }

        #[inline]
        pub fn tables(&self) -> &Tables {
            &self.tables
        }

        pub fn view(&self) -> EstimateView {
            self.state.view(&self.tables)
        }
    }

}
