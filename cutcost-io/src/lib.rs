mod dxf;
mod svg;

use std::fs;
use std::path::{Path, PathBuf};

use cutcost_core::drawing::{Drawing, DrawingKind, DxfDrawing, SvgDrawing};
use thiserror::Error;
use tracing::debug;

pub use svg::DEFAULT_FLATTEN_TOLERANCE;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("unsupported file type {file_name:?}: only .dxf and .svg are accepted")]
    UnsupportedExtension { file_name: String },
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

/// 图纸读取接口：`load` 从磁盘读取，`parse_str` 解析已读入内存的文本。
pub trait DrawingLoader {
    fn parse_str(&self, content: &str) -> Result<Drawing, IoError>;

    fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        let data = read_text(path)?;
        self.parse_str(&data)
    }
}

/// 按扩展名识别格式，不支持的扩展名返回 [`IoError::UnsupportedExtension`]。
pub fn detect_kind(file_name: &str) -> Result<DrawingKind, IoError> {
    DrawingKind::from_file_name(file_name).ok_or_else(|| IoError::UnsupportedExtension {
        file_name: file_name.to_string(),
    })
}

fn read_text(path: &Path) -> Result<String, IoError> {
    // DXF 可能带有非 UTF-8 的代码页文本，按有损方式解码
    let bytes = fs::read(path).map_err(|source| IoError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Debug, Clone)]
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str) -> Result<DxfDrawing, IoError> {
        dxf::parse(content).map_err(IoError::from)
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingLoader for DxfFacade {
    fn parse_str(&self, content: &str) -> Result<Drawing, IoError> {
        self.parse(content).map(Drawing::Dxf)
    }
}

#[derive(Debug, Clone)]
pub struct SvgFacade {
    tolerance: f32,
}

impl SvgFacade {
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_FLATTEN_TOLERANCE)
    }

    /// 自定义曲线展平容差（像素），非正数或非有限值回退到默认值。
    pub fn with_tolerance(tolerance: f32) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            DEFAULT_FLATTEN_TOLERANCE
        };
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn parse(&self, content: &str) -> Result<SvgDrawing, IoError> {
        svg::parse(content, self.tolerance).map_err(IoError::from)
    }
}

impl Default for SvgFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingLoader for SvgFacade {
    fn parse_str(&self, content: &str) -> Result<Drawing, IoError> {
        self.parse(content).map(Drawing::Svg)
    }
}

/// 上传入口：依据文件名扩展名一次性分派到 DXF 或 SVG 读取器。
#[derive(Debug, Clone, Default)]
pub struct DrawingFacade {
    dxf: DxfFacade,
    svg: SvgFacade,
}

impl DrawingFacade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_svg_tolerance(tolerance: f32) -> Self {
        Self {
            dxf: DxfFacade::new(),
            svg: SvgFacade::with_tolerance(tolerance),
        }
    }

    /// 解析已读入内存的文件内容；扩展名决定解析器。
    pub fn parse_named(&self, file_name: &str, content: &str) -> Result<Drawing, IoError> {
        let kind = detect_kind(file_name)?;
        debug!(file_name, %kind, bytes = content.len(), "解析上传文件");
        match kind {
            DrawingKind::Dxf => self.dxf.parse_str(content),
            DrawingKind::Svg => self.svg.parse_str(content),
        }
    }

    /// 先校验扩展名，再读取文件；扩展名不受支持时不会触碰磁盘。
    pub fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        let file_name = display_name(path);
        detect_kind(&file_name)?;
        let data = read_text(path)?;
        self.parse_named(&file_name, &data)
    }
}

/// 取路径的文件名部分用于扩展名判断与提示信息。
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[derive(Debug)]
pub(crate) enum ParseError {
    Unsupported { feature: String },
    Invalid { message: String },
}

impl ParseError {
    pub(crate) fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<ParseError> for IoError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Unsupported { feature } => IoError::UnsupportedFeature(feature),
            ParseError::Invalid { message } => IoError::InvalidDocument(message),
        }
    }
}
