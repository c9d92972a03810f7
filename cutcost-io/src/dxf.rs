use cutcost_core::drawing::{DxfDrawing, DxfEntity, Line, LwPolyline};
use cutcost_core::geometry::Point3;
use tracing::debug;

use crate::ParseError;

const BINARY_SENTINEL: &str = "AutoCAD Binary DXF";

pub(crate) fn parse(source: &str) -> Result<DxfDrawing, ParseError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    if source.starts_with(BINARY_SENTINEL) {
        return Err(ParseError::unsupported("二进制 DXF 暂不支持，请另存为 ASCII DXF"));
    }
    DxfParser::new(source).parse()
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<DxfDrawing, ParseError> {
        let mut drawing = DxfDrawing::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(ParseError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| ParseError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(ParseError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.trim() {
                        "ENTITIES" => self.parse_entities(&mut drawing)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(ParseError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        debug!(entities = drawing.entities().len(), "DXF 解析完成");
        Ok(drawing)
    }

    fn skip_section(&mut self) -> Result<(), ParseError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(ParseError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, drawing: &mut DxfDrawing) -> Result<(), ParseError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(ParseError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(ParseError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            match value.trim() {
                "ENDSEC" => break,
                "LINE" => {
                    let line = self.parse_line()?;
                    drawing.add_entity(line);
                }
                "LWPOLYLINE" => {
                    let polyline = self.parse_lwpolyline()?;
                    drawing.add_entity(polyline);
                }
                // 旧式 POLYLINE 的顶点序列，随 POLYLINE 一并忽略
                "VERTEX" | "SEQEND" => self.skip_entity_body()?,
                other => {
                    self.skip_entity_body()?;
                    drawing.add_entity(DxfEntity::Unsupported {
                        kind: other.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn parse_line(&mut self) -> Result<DxfEntity, ParseError> {
        let mut layer = None;
        let mut start = CoordSlots::default();
        let mut end = CoordSlots::default();
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut start.x, &value, "LINE 起点 X（组码 10）")?,
                    20 => assign_coord(&mut start.y, &value, "LINE 起点 Y（组码 20）")?,
                    30 => assign_coord(&mut start.z, &value, "LINE 起点 Z（组码 30）")?,
                    11 => assign_coord(&mut end.x, &value, "LINE 终点 X（组码 11）")?,
                    21 => assign_coord(&mut end.y, &value, "LINE 终点 Y（组码 21）")?,
                    31 => assign_coord(&mut end.z, &value, "LINE 终点 Z（组码 31）")?,
                    _ => {}
                },
                None => return Err(ParseError::invalid("LINE 未正确结束")),
            }
        }

        Ok(DxfEntity::Line(Line {
            start: start.build("LINE 起点")?,
            end: end.build("LINE 终点")?,
            layer: layer.unwrap_or_else(|| "0".to_string()),
        }))
    }

    fn parse_lwpolyline(&mut self) -> Result<DxfEntity, ParseError> {
        let mut layer = None;
        let mut is_closed = false;
        let mut elevation = 0.0;
        let mut vertices: Vec<(f64, f64)> = Vec::new();
        let mut pending_x: Option<f64> = None;
        let mut pending_y: Option<f64> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    38 => elevation = parse_f64(&value, "LWPOLYLINE 标高")?,
                    70 => {
                        let flag = parse_i32(&value, "LWPOLYLINE 标志")?;
                        is_closed = flag & 0x01 == 0x01;
                    }
                    10 => {
                        let x = parse_f64(&value, "LWPOLYLINE 顶点 X")?;
                        if let Some(y) = pending_y.take() {
                            vertices.push((x, y));
                        } else if pending_x.replace(x).is_some() {
                            return Err(ParseError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 Y（组码 20）",
                            ));
                        }
                    }
                    20 => {
                        let y = parse_f64(&value, "LWPOLYLINE 顶点 Y")?;
                        if let Some(x) = pending_x.take() {
                            vertices.push((x, y));
                        } else if pending_y.replace(y).is_some() {
                            return Err(ParseError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 X（组码 10）",
                            ));
                        }
                    }
                    // bulge（组码 42）描述圆弧段，计长时按直线处理
                    _ => {}
                },
                None => return Err(ParseError::invalid("LWPOLYLINE 未正确结束")),
            }
        }

        if pending_x.is_some() || pending_y.is_some() {
            return Err(ParseError::invalid(
                "LWPOLYLINE 顶点坐标成对出现（组码 10/20），检测到不完整的顶点",
            ));
        }

        Ok(DxfEntity::LwPolyline(LwPolyline {
            vertices: vertices
                .into_iter()
                .map(|(x, y)| Point3::new(x, y, elevation))
                .collect(),
            is_closed,
            layer: layer.unwrap_or_else(|| "0".to_string()),
        }))
    }

    fn skip_entity_body(&mut self) -> Result<(), ParseError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct CoordSlots {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
}

impl CoordSlots {
    /// XY 同时缺失视为未给出该点；只给出其中之一属于结构错误。
    fn build(self, context: &str) -> Result<Option<Point3>, ParseError> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Ok(Some(Point3::new(x, y, self.z.unwrap_or(0.0)))),
            (None, None) => Ok(None),
            _ => Err(ParseError::invalid(format!("{context} 缺少完整的 XY 坐标"))),
        }
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, ParseError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        loop {
            let code_line = loop {
                match self.lines.next() {
                    Some(line) => {
                        self.line_number += 1;
                        // 文件尾部的空行不视为组码
                        if !line.trim().is_empty() {
                            break line;
                        }
                    }
                    None => return Ok(None),
                }
            };

            let value_line = match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    line
                }
                None => {
                    return Err(ParseError::invalid(format!(
                        "文件在第 {} 行结束，缺少与组码对应的值行",
                        self.line_number
                    )));
                }
            };

            let code = code_line.trim().parse::<i32>().map_err(|_| {
                ParseError::invalid(format!(
                    "第 {} 行的组码 \"{}\" 无法解析为整数",
                    self.line_number - 1,
                    code_line.trim()
                ))
            })?;
            if code == 999 {
                continue; // 注释
            }
            let value = value_line.trim_end_matches('\r').to_string();
            return Ok(Some((code, value)));
        }
    }

    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "DXF pair 只能回退一次");
        self.buffer = Some(pair);
    }
}

fn assign_coord(slot: &mut Option<f64>, raw: &str, context: &str) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(ParseError::invalid(format!("{context} 出现重复值")));
    }
    *slot = Some(parse_f64(raw, context)?);
    Ok(())
}

/// 只接受有限实数；`nan`、`inf` 等文本按无效坐标处理。
fn parse_f64(raw: &str, context: &str) -> Result<f64, ParseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i32(raw: &str, context: &str) -> Result<i32, ParseError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ParseError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_entities(body: &str) -> String {
        format!("0\nSECTION\n2\nENTITIES\n{body}0\nENDSEC\n0\nEOF\n")
    }

    #[test]
    fn parses_line_with_z() {
        let source = wrap_entities("0\nLINE\n8\nCUT\n10\n0\n20\n0\n30\n0\n11\n2\n21\n3\n31\n6\n");
        let drawing = parse(&source).expect("parse");
        let [DxfEntity::Line(line)] = drawing.entities() else {
            panic!("期望单个 LINE 实体，实际 {:?}", drawing.entities());
        };
        assert_eq!(line.layer, "CUT");
        assert_eq!(line.end, Some(Point3::new(2.0, 3.0, 6.0)));
        assert_eq!(drawing.entities()[0].length(), Some(7.0));
    }

    #[test]
    fn line_without_end_point_is_kept_but_unmeasured() {
        let source = wrap_entities("0\nLINE\n10\n1\n20\n1\n");
        let drawing = parse(&source).expect("parse");
        assert_eq!(drawing.entities().len(), 1);
        assert_eq!(drawing.entities()[0].length(), None);
    }

    #[test]
    fn line_with_half_a_point_is_invalid() {
        let source = wrap_entities("0\nLINE\n10\n1\n20\n1\n11\n5\n");
        let err = parse(&source).unwrap_err();
        assert!(matches!(err, ParseError::Invalid { ref message } if message.contains("终点")));
    }

    #[test]
    fn non_finite_coordinates_are_invalid() {
        for raw in ["nan", "NaN", "inf", "-infinity", "1e400"] {
            let source = wrap_entities(&format!(
                "0\nLINE\n10\n{raw}\n20\n0\n11\n1\n21\n1\n0\nLINE\n10\n0\n20\n0\n11\n30\n21\n40\n"
            ));
            let err = parse(&source).unwrap_err();
            assert!(
                matches!(err, ParseError::Invalid { ref message } if message.contains("LINE 起点 X")),
                "{raw}: {err:?}"
            );
        }

        let source = wrap_entities("0\nLWPOLYLINE\n38\ninf\n10\n0\n20\n0\n10\n1\n20\n1\n");
        assert!(matches!(parse(&source), Err(ParseError::Invalid { .. })));
    }

    #[test]
    fn duplicate_coordinate_is_invalid() {
        let source = wrap_entities("0\nLINE\n10\n1\n10\n2\n20\n1\n11\n5\n21\n5\n");
        assert!(matches!(parse(&source), Err(ParseError::Invalid { .. })));
    }

    #[test]
    fn lwpolyline_applies_elevation_and_closed_flag() {
        let source = wrap_entities(
            "0\nLWPOLYLINE\n8\n0\n90\n3\n70\n1\n38\n2.5\n10\n0\n20\n0\n10\n10\n20\n0\n42\n0.5\n10\n10\n20\n10\n",
        );
        let drawing = parse(&source).expect("parse");
        let [DxfEntity::LwPolyline(polyline)] = drawing.entities() else {
            panic!("期望单个 LWPOLYLINE 实体");
        };
        assert!(polyline.is_closed);
        assert_eq!(polyline.vertices.len(), 3);
        assert!(polyline.vertices.iter().all(|v| v.0.z == 2.5));
        assert_eq!(drawing.entities()[0].length(), Some(20.0));
    }

    #[test]
    fn lwpolyline_with_dangling_coordinate_is_invalid() {
        let source = wrap_entities("0\nLWPOLYLINE\n10\n0\n20\n0\n10\n5\n");
        assert!(matches!(parse(&source), Err(ParseError::Invalid { .. })));
    }

    #[test]
    fn other_entities_are_recorded_as_unsupported() {
        let source = wrap_entities(
            "0\nCIRCLE\n10\n0\n20\n0\n40\n5\n0\nPOLYLINE\n66\n1\n0\nVERTEX\n10\n0\n20\n0\n0\nSEQEND\n0\nARC\n10\n0\n20\n0\n40\n1\n50\n0\n51\n90\n",
        );
        let drawing = parse(&source).expect("parse");
        let kinds: Vec<&str> = drawing.entities().iter().map(|e| e.kind_name()).collect();
        assert_eq!(kinds, ["CIRCLE", "POLYLINE", "ARC"]);
    }

    #[test]
    fn header_section_and_comments_are_skipped() {
        let source = "999\nexported by test\n0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1015\n0\nENDSEC\n0\nSECTION\n2\nENTITIES\n0\nLINE\n10\n0\n20\n0\n11\n0\n21\n10\n0\nENDSEC\n0\nEOF\n\n";
        let drawing = parse(source).expect("parse");
        assert_eq!(drawing.entities().len(), 1);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let source = wrap_entities("0\nLINE\n10\n0\n20\n0\n11\n3\n21\n4\n").replace('\n', "\r\n");
        let drawing = parse(&source).expect("parse");
        assert_eq!(drawing.entities()[0].length(), Some(5.0));
    }

    #[test]
    fn truncated_entities_section_is_invalid() {
        let source = "0\nSECTION\n2\nENTITIES\n0\nLINE\n10\n0\n";
        assert!(matches!(parse(source), Err(ParseError::Invalid { .. })));
    }

    #[test]
    fn non_numeric_group_code_is_invalid() {
        let err = parse("abc\nSECTION\n").unwrap_err();
        assert!(matches!(err, ParseError::Invalid { ref message } if message.contains("组码")));
    }

    #[test]
    fn binary_dxf_is_unsupported() {
        let err = parse("AutoCAD Binary DXF\r\n\u{1a}\0").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn empty_input_yields_empty_drawing() {
        let drawing = parse("").expect("parse");
        assert!(drawing.entities().is_empty());
    }
}
