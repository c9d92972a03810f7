use cutcost_core::drawing::{Subpath, SvgDrawing, SvgPath};
use cutcost_core::geometry::Point2;
use lyon::geom::{ArcFlags, SvgArc};
use lyon::math::{Angle, Point, point, vector};
use lyon::path::iterator::PathIterator;
use lyon::path::{Path, PathEvent};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::ParseError;

/// 曲线展平容差（像素）。
pub const DEFAULT_FLATTEN_TOLERANCE: f32 = 0.01;

/// 其余基本图形不参与计长，仅计数。
const IGNORED_SHAPES: &[&[u8]] = &[b"line", b"polyline", b"polygon", b"rect", b"circle", b"ellipse"];

pub(crate) fn parse(source: &str, tolerance: f32) -> Result<SvgDrawing, ParseError> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(true);

    let mut drawing = SvgDrawing::new();
    let mut saw_root = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                let name = element.local_name();
                let name = name.as_ref();
                if !saw_root {
                    if name != b"svg" {
                        return Err(ParseError::invalid(format!(
                            "根元素为 <{}>，期望 <svg>",
                            String::from_utf8_lossy(name)
                        )));
                    }
                    saw_root = true;
                }
                if name == b"path" {
                    drawing.add_path(read_path(&element, tolerance)?);
                } else if IGNORED_SHAPES.contains(&name) {
                    drawing.note_ignored_shape();
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(ParseError::invalid(format!(
                    "XML 解析失败（字节偏移 {}）：{err}",
                    reader.buffer_position()
                )));
            }
        }
    }

    debug!(
        paths = drawing.paths().len(),
        ignored = drawing.ignored_shapes(),
        "SVG 解析完成"
    );
    Ok(drawing)
}

fn read_path(element: &BytesStart<'_>, tolerance: f32) -> Result<SvgPath, ParseError> {
    let mut id = None;
    let mut data = None;
    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|err| ParseError::invalid(format!("<path> 属性解析失败：{err}")))?;
        let key = attribute.key.local_name();
        match key.as_ref() {
            b"d" | b"id" => {
                let value = attribute
                    .unescape_value()
                    .map_err(|err| ParseError::invalid(format!("<path> 属性值解码失败：{err}")))?
                    .into_owned();
                if key.as_ref() == b"d" {
                    data = Some(value);
                } else {
                    id = Some(value);
                }
            }
            _ => {}
        }
    }

    let Some(data) = data else {
        return Ok(SvgPath {
            id,
            subpaths: Vec::new(),
        });
    };

    let parsed = parse_path_data(&data);
    if let Some(message) = &parsed.error {
        // 与浏览器一致：保留出错位置之前的几何
        warn!(id = id.as_deref().unwrap_or("<无>"), error = %message, "路径数据有误，已截断");
    }
    let path = build_path(&parsed.segments);
    Ok(SvgPath {
        id,
        subpaths: flatten(&path, tolerance),
    })
}

fn flatten(path: &Path, tolerance: f32) -> Vec<Subpath> {
    let mut subpaths = Vec::new();
    let mut current: Vec<Point2> = Vec::new();
    for event in path.iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => {
                current.clear();
                current.push(to_point2(at));
            }
            PathEvent::Line { to, .. } => current.push(to_point2(to)),
            PathEvent::End { close, .. } => subpaths.push(Subpath {
                points: std::mem::take(&mut current),
                closed: close,
            }),
            PathEvent::Quadratic { .. } | PathEvent::Cubic { .. } => {}
        }
    }
    subpaths
}

#[inline]
fn to_point2(p: Point) -> Point2 {
    Point2::new(f64::from(p.x), f64::from(p.y))
}

/// 绝对坐标下的路径段，由路径数据解析得到。
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    MoveTo(Point),
    LineTo(Point),
    Quadratic {
        ctrl: Point,
        to: Point,
    },
    Cubic {
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
    },
    Arc {
        radii: (f32, f32),
        x_rotation: f32,
        large_arc: bool,
        sweep: bool,
        to: Point,
    },
    Close,
}

fn build_path(segments: &[Segment]) -> Path {
    let mut builder = Path::builder();
    let mut open = false;
    let mut current = point(0.0, 0.0);
    for segment in segments {
        if !open && !matches!(segment, Segment::MoveTo(_) | Segment::Close) {
            builder.begin(current);
            open = true;
        }
        match *segment {
            Segment::MoveTo(at) => {
                if open {
                    builder.end(false);
                }
                builder.begin(at);
                open = true;
                current = at;
            }
            Segment::LineTo(to) => {
                builder.line_to(to);
                current = to;
            }
            Segment::Quadratic { ctrl, to } => {
                builder.quadratic_bezier_to(ctrl, to);
                current = to;
            }
            Segment::Cubic { ctrl1, ctrl2, to } => {
                builder.cubic_bezier_to(ctrl1, ctrl2, to);
                current = to;
            }
            Segment::Arc {
                radii,
                x_rotation,
                large_arc,
                sweep,
                to,
            } => {
                let arc = SvgArc {
                    from: current,
                    to,
                    radii: vector(radii.0.abs(), radii.1.abs()),
                    x_rotation: Angle::degrees(x_rotation),
                    flags: ArcFlags { large_arc, sweep },
                };
                if arc.is_straight_line() {
                    builder.line_to(to);
                } else {
                    arc.to_arc().for_each_cubic_bezier(&mut |curve| {
                        builder.cubic_bezier_to(curve.ctrl1, curve.ctrl2, curve.to);
                    });
                }
                current = to;
            }
            Segment::Close => {
                if open {
                    builder.end(true);
                    open = false;
                }
            }
        }
    }
    if open {
        builder.end(false);
    }
    builder.build()
}

#[derive(Debug, Default)]
struct ParsedPathData {
    segments: Vec<Segment>,
    error: Option<String>,
}

/// 解析 SVG 路径数据（M/L/H/V/C/S/Q/T/A/Z 及其相对形式），遇到错误时停止，
/// 已解析部分保留。
fn parse_path_data(data: &str) -> ParsedPathData {
    let mut parser = PathDataParser::new(data);
    let error = parser.run().err();
    ParsedPathData {
        segments: parser.segments,
        error,
    }
}

struct PathDataParser<'a> {
    src: &'a [u8],
    pos: usize,
    segments: Vec<Segment>,
    current: Point,
    subpath_start: Point,
    // S/T 命令需要上一段的控制点来求反射
    last_cubic_ctrl: Option<Point>,
    last_quad_ctrl: Option<Point>,
    needs_move: bool,
}

impl<'a> PathDataParser<'a> {
    fn new(data: &'a str) -> Self {
        Self {
            src: data.as_bytes(),
            pos: 0,
            segments: Vec::new(),
            current: point(0.0, 0.0),
            subpath_start: point(0.0, 0.0),
            last_cubic_ctrl: None,
            last_quad_ctrl: None,
            needs_move: false,
        }
    }

    fn run(&mut self) -> Result<(), String> {
        let mut command: Option<u8> = None;
        loop {
            self.skip_separators();
            let Some(&byte) = self.src.get(self.pos) else {
                return Ok(());
            };

            let cmd = if byte.is_ascii_alphabetic() {
                self.pos += 1;
                byte
            } else {
                match command {
                    // moveto 之后的隐式坐标对按 lineto 处理
                    Some(b'M') => b'L',
                    Some(b'm') => b'l',
                    Some(b'Z' | b'z') | None => {
                        return Err(format!("位置 {} 处缺少命令字母", self.pos));
                    }
                    Some(previous) => previous,
                }
            };
            if command.is_none() && !matches!(cmd, b'M' | b'm') {
                return Err("路径数据必须以 moveto（M/m）开始".to_string());
            }
            self.execute(cmd)?;
            command = Some(cmd);
        }
    }

    fn execute(&mut self, cmd: u8) -> Result<(), String> {
        let relative = cmd.is_ascii_lowercase();
        let upper = cmd.to_ascii_uppercase();
        if upper != b'M' && upper != b'Z' && self.needs_move {
            self.segments.push(Segment::MoveTo(self.current));
            self.needs_move = false;
        }

        match upper {
            b'M' => {
                let to = self.read_point(relative)?;
                self.segments.push(Segment::MoveTo(to));
                self.current = to;
                self.subpath_start = to;
                self.needs_move = false;
                self.reset_controls();
            }
            b'L' => {
                let to = self.read_point(relative)?;
                self.line_to(to);
            }
            b'H' => {
                let x = self.number()?;
                let to = if relative {
                    self.offset(x, 0.0)?
                } else {
                    point(x, self.current.y)
                };
                self.line_to(to);
            }
            b'V' => {
                let y = self.number()?;
                let to = if relative {
                    self.offset(0.0, y)?
                } else {
                    point(self.current.x, y)
                };
                self.line_to(to);
            }
            b'C' => {
                let ctrl1 = self.read_point(relative)?;
                let ctrl2 = self.read_point(relative)?;
                let to = self.read_point(relative)?;
                self.cubic_to(ctrl1, ctrl2, to);
            }
            b'S' => {
                let ctrl1 = reflect(self.last_cubic_ctrl, self.current);
                let ctrl2 = self.read_point(relative)?;
                let to = self.read_point(relative)?;
                self.cubic_to(ctrl1, ctrl2, to);
            }
            b'Q' => {
                let ctrl = self.read_point(relative)?;
                let to = self.read_point(relative)?;
                self.quadratic_to(ctrl, to);
            }
            b'T' => {
                let ctrl = reflect(self.last_quad_ctrl, self.current);
                let to = self.read_point(relative)?;
                self.quadratic_to(ctrl, to);
            }
            b'A' => {
                let rx = self.number()?;
                let ry = self.number()?;
                let x_rotation = self.number()?;
                let large_arc = self.flag()?;
                let sweep = self.flag()?;
                let to = self.read_point(relative)?;
                check_arc(rx, ry, x_rotation, self.current, to)?;
                self.segments.push(Segment::Arc {
                    radii: (rx, ry),
                    x_rotation,
                    large_arc,
                    sweep,
                    to,
                });
                self.current = to;
                self.reset_controls();
            }
            b'Z' => {
                self.segments.push(Segment::Close);
                self.current = self.subpath_start;
                self.needs_move = true;
                self.reset_controls();
            }
            other => {
                return Err(format!("不支持的路径命令 '{}'", other as char));
            }
        }
        Ok(())
    }

    fn line_to(&mut self, to: Point) {
        self.segments.push(Segment::LineTo(to));
        self.current = to;
        self.reset_controls();
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.segments.push(Segment::Cubic { ctrl1, ctrl2, to });
        self.current = to;
        self.last_cubic_ctrl = Some(ctrl2);
        self.last_quad_ctrl = None;
    }

    fn quadratic_to(&mut self, ctrl: Point, to: Point) {
        self.segments.push(Segment::Quadratic { ctrl, to });
        self.current = to;
        self.last_quad_ctrl = Some(ctrl);
        self.last_cubic_ctrl = None;
    }

    fn reset_controls(&mut self) {
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    fn read_point(&mut self, relative: bool) -> Result<Point, String> {
        let x = self.number()?;
        let y = self.number()?;
        if relative {
            self.offset(x, y)
        } else {
            Ok(point(x, y))
        }
    }

    /// 相对坐标累加后仍须为有限值。
    fn offset(&self, dx: f32, dy: f32) -> Result<Point, String> {
        let to = point(self.current.x + dx, self.current.y + dy);
        if to.x.is_finite() && to.y.is_finite() {
            Ok(to)
        } else {
            Err(format!("位置 {} 处相对坐标溢出", self.pos))
        }
    }

    fn skip_separators(&mut self) {
        while let Some(&byte) = self.src.get(self.pos) {
            if byte.is_ascii_whitespace() || byte == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn flag(&mut self) -> Result<bool, String> {
        self.skip_separators();
        match self.src.get(self.pos) {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(format!("位置 {} 处期望圆弧标志 0 或 1", self.pos)),
        }
    }

    fn number(&mut self) -> Result<f32, String> {
        self.skip_separators();
        let start = self.pos;
        let mut end = start;
        if matches!(self.src.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let mut digits = 0;
        while matches!(self.src.get(end), Some(b) if b.is_ascii_digit()) {
            end += 1;
            digits += 1;
        }
        if self.src.get(end) == Some(&b'.') {
            end += 1;
            while matches!(self.src.get(end), Some(b) if b.is_ascii_digit()) {
                end += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return Err(format!("位置 {start} 处期望数字"));
        }
        if matches!(self.src.get(end), Some(b'e' | b'E')) {
            let mut cursor = end + 1;
            if matches!(self.src.get(cursor), Some(b'+' | b'-')) {
                cursor += 1;
            }
            let exponent_start = cursor;
            while matches!(self.src.get(cursor), Some(b) if b.is_ascii_digit()) {
                cursor += 1;
            }
            if cursor > exponent_start {
                end = cursor;
            }
        }

        let text = std::str::from_utf8(&self.src[start..end])
            .map_err(|_| format!("位置 {start} 处数字编码无效"))?;
        let value = text
            .parse::<f32>()
            .map_err(|_| format!("位置 {start} 处数字 \"{text}\" 无法解析"))?;
        if !value.is_finite() {
            return Err(format!("位置 {start} 处数字 \"{text}\" 超出范围"));
        }
        self.pos = end;
        Ok(value)
    }
}

// 圆弧换算会对半径与端点差求平方，平方溢出的输入无法展平
fn check_arc(rx: f32, ry: f32, x_rotation: f32, from: Point, to: Point) -> Result<(), String> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let values = [rx * rx, ry * ry, dx * dx + dy * dy, x_rotation];
    if values.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(format!("圆弧参数超出范围：半径 ({rx}, {ry})，终点 ({}, {})", to.x, to.y))
    }
}

fn reflect(ctrl: Option<Point>, around: Point) -> Point {
    match ctrl {
        Some(ctrl) => point(2.0 * around.x - ctrl.x, 2.0 * around.y - ctrl.y),
        None => around,
    }
}
