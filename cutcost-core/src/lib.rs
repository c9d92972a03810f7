pub mod geometry {
    use glam::{DVec2, DVec3};
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。SVG 路径展平后的顶点使用该类型。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 三维点。DXF 坐标可携带 Z 值，缺省为 0。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn from_xy(x: f64, y: f64) -> Self {
            Self::new(x, y, 0.0)
        }

        /// 欧氏距离。
        #[inline]
        pub fn distance(self, other: Point3) -> f64 {
            self.0.distance(other.0)
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 按顺序累加相邻顶点间距离，不补首尾闭合段。
    pub fn open_polyline_length(points: &[Point3]) -> f64 {
        points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }

    /// 平面折线长度；`closed` 为真时额外计入末点回到首点的线段。
    pub fn polyline_length_2d(points: &[Point2], closed: bool) -> f64 {
        let open: f64 = points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum();
        match (closed, points.first(), points.last()) {
            (true, Some(first), Some(last)) if points.len() > 1 => open + last.distance(*first),
            _ => open,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn pythagorean_distance() {
            let a = Point3::from_xy(0.0, 0.0);
            let b = Point3::from_xy(3.0, 4.0);
            assert!((a.distance(b) - 5.0).abs() < 1e-12);
        }

        #[test]
        fn distance_includes_z() {
            let a = Point3::new(0.0, 0.0, 0.0);
            let b = Point3::new(2.0, 3.0, 6.0);
            assert!((a.distance(b) - 7.0).abs() < 1e-12);
        }

        #[test]
        fn open_polyline_skips_closing_segment() {
            let square = [
                Point3::from_xy(0.0, 0.0),
                Point3::from_xy(10.0, 0.0),
                Point3::from_xy(10.0, 10.0),
                Point3::from_xy(0.0, 10.0),
            ];
            assert!((open_polyline_length(&square) - 30.0).abs() < 1e-12);
            assert_eq!(open_polyline_length(&square[..1]), 0.0);
            assert_eq!(open_polyline_length(&[]), 0.0);
        }

        #[test]
        fn closed_planar_polyline_adds_closing_segment() {
            let triangle = [
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 0.0),
                Point2::new(3.0, 4.0),
            ];
            assert!((polyline_length_2d(&triangle, false) - 7.0).abs() < 1e-12);
            assert!((polyline_length_2d(&triangle, true) - 12.0).abs() < 1e-12);
            assert_eq!(polyline_length_2d(&triangle[..1], true), 0.0);
        }
    }
}

pub mod units {
    use std::fmt;
    use std::str::FromStr;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    pub const CENTIMETERS_PER_INCH: f64 = 2.54;
    pub const CENTIMETERS_PER_FOOT: f64 = 30.48;

    /// 支持的长度单位。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum LengthUnit {
        #[serde(rename = "mm")]
        Millimeter,
        #[serde(rename = "cm")]
        Centimeter,
        #[serde(rename = "m")]
        Meter,
        #[serde(rename = "in")]
        Inch,
        #[serde(rename = "ft")]
        Foot,
    }

    impl LengthUnit {
        pub const ALL: [LengthUnit; 5] = [
            LengthUnit::Millimeter,
            LengthUnit::Centimeter,
            LengthUnit::Meter,
            LengthUnit::Inch,
            LengthUnit::Foot,
        ];

        pub fn symbol(self) -> &'static str {
            match self {
                LengthUnit::Millimeter => "mm",
                LengthUnit::Centimeter => "cm",
                LengthUnit::Meter => "m",
                LengthUnit::Inch => "in",
                LengthUnit::Foot => "ft",
            }
        }

        pub fn label(self) -> &'static str {
            match self {
                LengthUnit::Millimeter => "毫米",
                LengthUnit::Centimeter => "厘米",
                LengthUnit::Meter => "米",
                LengthUnit::Inch => "英寸",
                LengthUnit::Foot => "英尺",
            }
        }

        #[inline]
        fn index(self) -> usize {
            match self {
                LengthUnit::Millimeter => 0,
                LengthUnit::Centimeter => 1,
                LengthUnit::Meter => 2,
                LengthUnit::Inch => 3,
                LengthUnit::Foot => 4,
            }
        }
    }

    impl Default for LengthUnit {
        fn default() -> Self {
            LengthUnit::Centimeter
        }
    }

    impl fmt::Display for LengthUnit {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.symbol())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("未知的长度单位 \"{0}\"（可选：mm, cm, m, in, ft）")]
    pub struct UnknownUnit(pub String);

    impl FromStr for LengthUnit {
        type Err = UnknownUnit;

        fn from_str(raw: &str) -> Result<Self, Self::Err> {
            let wanted = raw.trim();
            LengthUnit::ALL
                .into_iter()
                .find(|unit| unit.symbol().eq_ignore_ascii_case(wanted))
                .ok_or_else(|| UnknownUnit(raw.to_string()))
        }
    }

    /// 厘米到各单位的乘法换算系数。启动时构建一次，之后只读。
    ///
    /// 不变量：`cm` 的系数恒为 1。
    #[derive(Debug, Clone, PartialEq)]
    pub struct ConversionTable {
        factors: [f64; 5],
    }

    impl ConversionTable {
        pub fn standard() -> Self {
            let mut factors = [0.0; 5];
            factors[LengthUnit::Millimeter.index()] = 10.0;
            factors[LengthUnit::Centimeter.index()] = 1.0;
            factors[LengthUnit::Meter.index()] = 0.01;
            factors[LengthUnit::Inch.index()] = 1.0 / CENTIMETERS_PER_INCH;
            factors[LengthUnit::Foot.index()] = 1.0 / CENTIMETERS_PER_FOOT;
            Self { factors }
        }

        #[inline]
        pub fn factor(&self, unit: LengthUnit) -> f64 {
            self.factors[unit.index()]
        }

        /// 将厘米长度换算到目标单位，不做舍入。
        #[inline]
        pub fn convert(&self, length_cm: f64, unit: LengthUnit) -> f64 {
            length_cm * self.factor(unit)
        }

        pub fn entries(&self) -> impl Iterator<Item = (LengthUnit, f64)> + '_ {
            LengthUnit::ALL
                .into_iter()
                .map(|unit| (unit, self.factor(unit)))
        }
    }

    impl Default for ConversionTable {
        fn default() -> Self {
            Self::standard()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn centimeter_factor_is_identity() {
            let table = ConversionTable::standard();
            assert_eq!(table.factor(LengthUnit::Centimeter), 1.0);
        }

        #[test]
        fn hundred_centimeters_in_every_unit() {
            let table = ConversionTable::standard();
            for (unit, factor) in table.entries() {
                assert!((table.convert(100.0, unit) - 100.0 * factor).abs() < 1e-12);
            }
            assert!((table.convert(100.0, LengthUnit::Millimeter) - 1000.0).abs() < 1e-9);
            assert!((table.convert(100.0, LengthUnit::Meter) - 1.0).abs() < 1e-12);
            assert!((table.convert(100.0, LengthUnit::Inch) - 39.37).abs() < 0.01);
            assert!((table.convert(100.0, LengthUnit::Foot) - 3.2808).abs() < 1e-4);
        }

        #[test]
        fn unit_symbols_parse_case_insensitively() {
            assert_eq!("MM".parse::<LengthUnit>().unwrap(), LengthUnit::Millimeter);
            assert_eq!(" ft ".parse::<LengthUnit>().unwrap(), LengthUnit::Foot);
            let err = "yard".parse::<LengthUnit>().unwrap_err();
            assert_eq!(err, UnknownUnit("yard".to_string()));
        }
    }
}

pub mod locale {
    use serde::{Deserialize, Serialize};

    const EURO_REGIONS: &[&str] = &[
        "AT", "BE", "CY", "DE", "EE", "ES", "FI", "FR", "GR", "HR", "IE", "IT", "LT", "LU", "LV",
        "MT", "NL", "PT", "SI", "SK",
    ];

    /// 语言区域标签（BCP 47 或 POSIX 形式均可，例如 `de-DE`、`en_US.UTF-8`）。
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Locale {
        language: String,
        region: Option<String>,
    }

    /// 货币符号相对数字的位置。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SymbolPlacement {
        /// `$1,234.50`
        Prefix,
        /// `€ 1.234,50`
        PrefixSpaced,
        /// `1.234,50 €`
        Suffix,
    }

    /// 与语言相关的数字书写习惯。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NumberStyle {
        pub decimal_separator: char,
        pub group_separator: char,
        pub placement: SymbolPlacement,
    }

    impl Locale {
        /// 解析语言区域标签；`C`、`POSIX` 或无法识别的标签返回 `None`。
        pub fn parse(tag: &str) -> Option<Self> {
            let base = tag
                .trim()
                .split(['.', '@'])
                .next()
                .unwrap_or_default();
            let mut parts = base.split(['-', '_']).filter(|part| !part.is_empty());

            let language = parts.next()?;
            if !(2..=3).contains(&language.len())
                || !language.chars().all(|ch| ch.is_ascii_alphabetic())
            {
                return None;
            }

            let mut region = None;
            for part in parts {
                let is_alpha_region =
                    part.len() == 2 && part.chars().all(|ch| ch.is_ascii_alphabetic());
                let is_numeric_region =
                    part.len() == 3 && part.chars().all(|ch| ch.is_ascii_digit());
                if is_alpha_region || is_numeric_region {
                    region = Some(part.to_ascii_uppercase());
                    break;
                }
                // 跳过 script 子标签（如 `zh-Hans-CN` 中的 `Hans`）
            }

            Some(Self {
                language: language.to_ascii_lowercase(),
                region,
            })
        }

        #[inline]
        pub fn language(&self) -> &str {
            &self.language
        }

        #[inline]
        pub fn region(&self) -> Option<&str> {
            self.region.as_deref()
        }

        pub fn tag(&self) -> String {
            match &self.region {
                Some(region) => format!("{}-{}", self.language, region),
                None => self.language.clone(),
            }
        }

        /// 地区本地货币的 ISO 代码；不限于目录中支持的六种。
        pub fn native_currency_code(&self) -> Option<&'static str> {
            let region = self.region.as_deref()?;
            if EURO_REGIONS.contains(&region) {
                return Some("EUR");
            }
            let code = match region {
                "US" => "USD",
                "GB" => "GBP",
                "CA" => "CAD",
                "AU" => "AUD",
                "JP" => "JPY",
                "CN" => "CNY",
                "TW" => "TWD",
                "HK" => "HKD",
                "CH" => "CHF",
                "IN" => "INR",
                "BR" => "BRL",
                "MX" => "MXN",
                "KR" => "KRW",
                "NZ" => "NZD",
                "SE" => "SEK",
                "NO" => "NOK",
                "DK" => "DKK",
                "PL" => "PLN",
                "CZ" => "CZK",
                "RU" => "RUB",
                _ => return None,
            };
            Some(code)
        }

        pub fn number_style(&self) -> NumberStyle {
            match self.language.as_str() {
                "de" | "es" | "it" | "pt" | "da" | "id" | "tr" | "el" | "hr" | "sl" => {
                    NumberStyle {
                        decimal_separator: ',',
                        group_separator: '.',
                        placement: SymbolPlacement::Suffix,
                    }
                }
                "nl" => NumberStyle {
                    decimal_separator: ',',
                    group_separator: '.',
                    placement: SymbolPlacement::PrefixSpaced,
                },
                "fr" | "ru" | "pl" | "sv" | "nb" | "no" | "fi" | "cs" | "sk" | "uk" | "hu" => {
                    NumberStyle {
                        decimal_separator: ',',
                        group_separator: '\u{a0}',
                        placement: SymbolPlacement::Suffix,
                    }
                }
                _ => NumberStyle {
                    decimal_separator: '.',
                    group_separator: ',',
                    placement: SymbolPlacement::Prefix,
                },
            }
        }
    }

    impl Default for Locale {
        fn default() -> Self {
            Self {
                language: "en".to_string(),
                region: Some("US".to_string()),
            }
        }
    }

}

pub mod currency {
    use std::fmt;
    use std::str::FromStr;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::locale::{Locale, SymbolPlacement};

    /// 支持的六种货币。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum CurrencyCode {
        Usd,
        Eur,
        Gbp,
        Cad,
        Aud,
        Jpy,
    }

    impl CurrencyCode {
        pub const ALL: [CurrencyCode; 6] = [
            CurrencyCode::Usd,
            CurrencyCode::Eur,
            CurrencyCode::Gbp,
            CurrencyCode::Cad,
            CurrencyCode::Aud,
            CurrencyCode::Jpy,
        ];

        pub fn code(self) -> &'static str {
            match self {
                CurrencyCode::Usd => "USD",
                CurrencyCode::Eur => "EUR",
                CurrencyCode::Gbp => "GBP",
                CurrencyCode::Cad => "CAD",
                CurrencyCode::Aud => "AUD",
                CurrencyCode::Jpy => "JPY",
            }
        }

        /// 小数位数（ISO 4217 minor unit）。
        pub fn minor_digits(self) -> usize {
            match self {
                CurrencyCode::Jpy => 0,
                _ => 2,
            }
        }

        pub fn symbol(self) -> &'static str {
            match self {
                CurrencyCode::Usd => "$",
                CurrencyCode::Eur => "€",
                CurrencyCode::Gbp => "£",
                CurrencyCode::Cad => "CA$",
                CurrencyCode::Aud => "A$",
                CurrencyCode::Jpy => "¥",
            }
        }

        /// 结合地区选择符号：本地货币与美元并存的地区使用 `$` / `US$` 区分。
        pub fn symbol_for(self, locale: &Locale) -> &'static str {
            match (self, locale.native_currency_code()) {
                (CurrencyCode::Cad, Some("CAD")) | (CurrencyCode::Aud, Some("AUD")) => "$",
                (CurrencyCode::Usd, Some("CAD" | "AUD")) => "US$",
                _ => self.symbol(),
            }
        }
    }

    impl fmt::Display for CurrencyCode {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.code())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("不支持的货币代码 \"{0}\"（可选：USD, EUR, GBP, CAD, AUD, JPY）")]
    pub struct UnknownCurrency(pub String);

    impl FromStr for CurrencyCode {
        type Err = UnknownCurrency;

        fn from_str(raw: &str) -> Result<Self, Self::Err> {
            let wanted = raw.trim();
            CurrencyCode::ALL
                .into_iter()
                .find(|code| code.code().eq_ignore_ascii_case(wanted))
                .ok_or_else(|| UnknownCurrency(raw.to_string()))
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CurrencyOption {
        pub code: CurrencyCode,
        pub name: &'static str,
    }

    /// 货币目录，顺序即下拉列表顺序；首项为默认货币。
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CurrencyCatalog {
        options: Vec<CurrencyOption>,
    }

    impl CurrencyCatalog {
        pub fn standard() -> Self {
            let names = [
                (CurrencyCode::Usd, "US Dollar"),
                (CurrencyCode::Eur, "Euro"),
                (CurrencyCode::Gbp, "British Pound"),
                (CurrencyCode::Cad, "Canadian Dollar"),
                (CurrencyCode::Aud, "Australian Dollar"),
                (CurrencyCode::Jpy, "Japanese Yen"),
            ];
            Self {
                options: names
                    .into_iter()
                    .map(|(code, name)| CurrencyOption { code, name })
                    .collect(),
            }
        }

        /// 仅保留给定代码，顺序沿用标准目录（首项即默认货币）。结果为空时返回 `None`。
        pub fn restricted(codes: &[CurrencyCode]) -> Option<Self> {
            let options: Vec<CurrencyOption> = Self::standard()
                .options
                .into_iter()
                .filter(|option| codes.contains(&option.code))
                .collect();
            if options.is_empty() {
                None
            } else {
                Some(Self { options })
            }
        }

        pub fn options(&self) -> &[CurrencyOption] {
            &self.options
        }

        pub fn default_option(&self) -> CurrencyOption {
            self.options[0]
        }

        pub fn find(&self, code: CurrencyCode) -> Option<&CurrencyOption> {
            self.options.iter().find(|option| option.code == code)
        }

        /// 以 ISO 代码字符串查找目录项，大小写不敏感。
        pub fn lookup(&self, code: &str) -> Option<&CurrencyOption> {
            let code = code.parse::<CurrencyCode>().ok()?;
            self.find(code)
        }
    }

    impl Default for CurrencyCatalog {
        fn default() -> Self {
            Self::standard()
        }
    }

    /// 按地区习惯格式化金额。NaN 原样显示为 `NaN`。
    pub fn format_amount(amount: f64, currency: CurrencyCode, locale: &Locale) -> String {
        let style = locale.number_style();
        let symbol = currency.symbol_for(locale);

        let body = if amount.is_nan() {
            "NaN".to_string()
        } else if amount.is_infinite() {
            "∞".to_string()
        } else {
            let digits = currency.minor_digits();
            let fixed = format!("{:.*}", digits, amount.abs());
            let (integer, fraction) = match fixed.split_once('.') {
                Some((integer, fraction)) => (integer, Some(fraction)),
                None => (fixed.as_str(), None),
            };
            let mut text = group_digits(integer, style.group_separator);
            if let Some(fraction) = fraction {
                text.push(style.decimal_separator);
                text.push_str(fraction);
            }
            text
        };

        let negative = amount < 0.0 && !rounds_to_zero(&body);
        let sign = if negative { "-" } else { "" };
        match style.placement {
            SymbolPlacement::Prefix => format!("{sign}{symbol}{body}"),
            SymbolPlacement::PrefixSpaced => format!("{symbol}\u{a0}{sign}{body}"),
            SymbolPlacement::Suffix => format!("{sign}{body}\u{a0}{symbol}"),
        }
    }

    fn group_digits(integer: &str, separator: char) -> String {
        let len = integer.len();
        let mut grouped = String::with_capacity(len + len / 3);
        for (index, ch) in integer.chars().enumerate() {
            if index > 0 && (len - index) % 3 == 0 {
                grouped.push(separator);
            }
            grouped.push(ch);
        }
        grouped
    }

    // 舍入后全为 0 的负数不显示负号
    fn rounds_to_zero(body: &str) -> bool {
        let mut digits = body.chars().filter(|ch| ch.is_ascii_digit()).peekable();
        digits.peek().is_some() && digits.all(|ch| ch == '0')
    }

}

pub mod drawing {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Point2, Point3, open_polyline_length, polyline_length_2d};

    /// 上传文件的格式，依据扩展名在上传时确定一次。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum DrawingKind {
        Svg,
        Dxf,
    }

    impl DrawingKind {
        pub fn extension(self) -> &'static str {
            match self {
                DrawingKind::Svg => "svg",
                DrawingKind::Dxf => "dxf",
            }
        }

        /// 大小写不敏感地按文件名后缀识别格式。
        pub fn from_file_name(name: &str) -> Option<Self> {
            let lower = name.to_ascii_lowercase();
            [DrawingKind::Dxf, DrawingKind::Svg]
                .into_iter()
                .find(|kind| {
                    lower
                        .strip_suffix(kind.extension())
                        .is_some_and(|stem| stem.ends_with('.'))
                })
        }
    }

    impl fmt::Display for DrawingKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                DrawingKind::Svg => f.write_str("SVG"),
                DrawingKind::Dxf => f.write_str("DXF"),
            }
        }
    }

    /// 解析后的图纸：SVG 路径集合或 DXF 实体列表。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Drawing {
        Svg(SvgDrawing),
        Dxf(DxfDrawing),
    }

    impl Drawing {
        pub fn kind(&self) -> DrawingKind {
            match self {
                Drawing::Svg(_) => DrawingKind::Svg,
                Drawing::Dxf(_) => DrawingKind::Dxf,
            }
        }
    }

    /// 展平后的子路径，坐标单位为 SVG 用户单位（像素）。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Subpath {
        pub points: Vec<Point2>,
        pub closed: bool,
    }

    impl Subpath {
        pub fn length(&self) -> f64 {
            polyline_length_2d(&self.points, self.closed)
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct SvgPath {
        pub id: Option<String>,
        pub subpaths: Vec<Subpath>,
    }

    impl SvgPath {
        /// 整条路径的遍历长度（像素）。
        pub fn length(&self) -> f64 {
            self.subpaths.iter().map(Subpath::length).sum()
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct SvgDrawing {
        paths: Vec<SvgPath>,
        ignored_shapes: usize,
    }

    impl SvgDrawing {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_path(&mut self, path: SvgPath) {
            self.paths.push(path);
        }

        /// 记录一个未计入长度的基本图形元素（line、rect、circle 等）。
        pub fn note_ignored_shape(&mut self) {
            self.ignored_shapes += 1;
        }

        pub fn paths(&self) -> &[SvgPath] {
            &self.paths
        }

        pub fn ignored_shapes(&self) -> usize {
            self.ignored_shapes
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Option<Point3>,
        pub end: Option<Point3>,
        pub layer: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LwPolyline {
        pub vertices: Vec<Point3>,
        pub is_closed: bool,
        pub layer: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum DxfEntity {
        Line(Line),
        LwPolyline(LwPolyline),
        /// ARC、CIRCLE、SPLINE 等暂不计长的实体，仅保留类型名。
        Unsupported { kind: String },
    }

    impl DxfEntity {
        pub fn kind_name(&self) -> &str {
            match self {
                DxfEntity::Line(_) => "LINE",
                DxfEntity::LwPolyline(_) => "LWPOLYLINE",
                DxfEntity::Unsupported { kind } => kind,
            }
        }

        /// 实体贡献的长度（图纸单位）。不参与计长的实体返回 `None`。
        ///
        /// LINE 需要起点与终点同时存在；LWPOLYLINE 按开放折线计算，
        /// 即使设置了闭合标志也不补闭合段。
        pub fn length(&self) -> Option<f64> {
            match self {
                DxfEntity::Line(Line {
                    start: Some(start),
                    end: Some(end),
                    ..
                }) => Some(start.distance(*end)),
                DxfEntity::Line(_) => None,
                DxfEntity::LwPolyline(polyline) => Some(open_polyline_length(&polyline.vertices)),
                DxfEntity::Unsupported { .. } => None,
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct DxfDrawing {
        entities: Vec<DxfEntity>,
    }

    impl DxfDrawing {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_entity(&mut self, entity: DxfEntity) {
            self.entities.push(entity);
        }

        pub fn entities(&self) -> &[DxfEntity] {
            &self.entities
        }
    }

}

pub mod measure {
    use serde::{Deserialize, Serialize};

    use crate::drawing::{Drawing, DxfDrawing, SvgDrawing};
    use crate::units::CENTIMETERS_PER_INCH;

    /// SVG 用户单位按 96 PPI 解释。
    pub const SVG_PIXELS_PER_INCH: f64 = 96.0;
    /// DXF 图纸单位按毫米解释。
    pub const DXF_UNITS_PER_CENTIMETER: f64 = 10.0;

    /// 单次测量结果。`measured` / `skipped` 统计参与与未参与计长的元素数量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct MeasureReport {
        pub length_cm: f64,
        pub measured: usize,
        pub skipped: usize,
    }

    impl MeasureReport {
        #[inline]
        pub fn is_zero(&self) -> bool {
            self.length_cm == 0.0
        }
    }

    #[inline]
    pub fn pixels_to_centimeters(px: f64) -> f64 {
        px * CENTIMETERS_PER_INCH / SVG_PIXELS_PER_INCH
    }

    #[inline]
    pub fn drawing_units_to_centimeters(units: f64) -> f64 {
        units / DXF_UNITS_PER_CENTIMETER
    }

    /// 所有 `<path>` 的长度之和（像素）。
    pub fn svg_length_px(drawing: &SvgDrawing) -> f64 {
        drawing.paths().iter().map(|path| path.length()).sum()
    }

    /// LINE 与 LWPOLYLINE 的长度之和（图纸单位）。
    pub fn dxf_length_units(drawing: &DxfDrawing) -> f64 {
        drawing
            .entities()
            .iter()
            .filter_map(|entity| entity.length())
            .sum()
    }

    pub fn measure_svg(drawing: &SvgDrawing) -> MeasureReport {
        MeasureReport {
            length_cm: pixels_to_centimeters(svg_length_px(drawing)),
            measured: drawing.paths().len(),
            skipped: drawing.ignored_shapes(),
        }
    }

    pub fn measure_dxf(drawing: &DxfDrawing) -> MeasureReport {
        let measured = drawing
            .entities()
            .iter()
            .filter(|entity| entity.length().is_some())
            .count();
        MeasureReport {
            length_cm: drawing_units_to_centimeters(dxf_length_units(drawing)),
            measured,
            skipped: drawing.entities().len() - measured,
        }
    }

    impl Drawing {
        pub fn measure(&self) -> MeasureReport {
            match self {
                Drawing::Svg(svg) => measure_svg(svg),
                Drawing::Dxf(dxf) => measure_dxf(dxf),
            }
        }
    }

}

pub mod estimate {
    use crate::units::{ConversionTable, LengthUnit};

    /// 单价输入框的解析结果。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum PriceInput {
        Empty,
        Value(f64),
        /// 非数字输入，参与计算时得到 NaN。
        Invalid,
    }

    impl PriceInput {
        /// 只有空字符串视为“未填写”；其余输入按前缀数字解析。
        pub fn parse(raw: &str) -> Self {
            if raw.is_empty() {
                return PriceInput::Empty;
            }
            match parse_decimal_prefix(raw) {
                Some(value) => PriceInput::Value(value),
                None => PriceInput::Invalid,
            }
        }

        pub fn as_multiplier(self) -> Option<f64> {
            match self {
                PriceInput::Empty => None,
                PriceInput::Value(value) => Some(value),
                PriceInput::Invalid => Some(f64::NAN),
            }
        }
    }

    /// 解析字符串开头的十进制数，忽略其后的多余字符（`"5abc"` → 5）。
    pub fn parse_decimal_prefix(raw: &str) -> Option<f64> {
        let text = raw.trim_start();
        let bytes = text.as_bytes();
        let mut end = 0;
        if matches!(bytes.first(), Some(b'+' | b'-')) {
            end = 1;
        }
        if text[end..].starts_with("Infinity") {
            let negative = bytes.first() == Some(&b'-');
            return Some(if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            });
        }

        let integer_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        let mut digits = end - integer_start;

        if end < bytes.len() && bytes[end] == b'.' {
            let fraction_start = end + 1;
            let mut cursor = fraction_start;
            while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
                cursor += 1;
            }
            if cursor > fraction_start {
                digits += cursor - fraction_start;
                end = cursor;
            }
        }
        if digits == 0 {
            return None;
        }

        if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
            let mut cursor = end + 1;
            if cursor < bytes.len() && matches!(bytes[cursor], b'+' | b'-') {
                cursor += 1;
            }
            let exponent_start = cursor;
            while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
                cursor += 1;
            }
            if cursor > exponent_start {
                end = cursor;
            }
        }

        text[..end].parse::<f64>().ok()
    }

    /// 成本 = 换算后的长度 × 单价。长度未知或单价为空时返回 `None`。
    pub fn estimate_cost(
        length_cm: Option<f64>,
        unit: LengthUnit,
        price: &str,
        table: &ConversionTable,
    ) -> Option<f64> {
        let length_cm = length_cm?;
        let multiplier = PriceInput::parse(price).as_multiplier()?;
        Some(table.convert(length_cm, unit) * multiplier)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn cost_of_ten_centimeters_at_five() {
            let table = ConversionTable::standard();
            let cost = estimate_cost(Some(10.0), LengthUnit::Centimeter, "5", &table);
            assert_eq!(cost, Some(50.0));
        }

        #[test]
        fn cost_uses_selected_unit() {
            let table = ConversionTable::standard();
            let cost = estimate_cost(Some(250.0), LengthUnit::Meter, "4", &table).unwrap();
            assert!((cost - 10.0).abs() < 1e-12);
        }

        #[test]
        fn cost_absent_without_length_or_price() {
            let table = ConversionTable::standard();
            assert_eq!(estimate_cost(None, LengthUnit::Centimeter, "5", &table), None);
            assert_eq!(estimate_cost(Some(10.0), LengthUnit::Centimeter, "", &table), None);
        }

        #[test]
        fn non_numeric_price_propagates_nan() {
            let table = ConversionTable::standard();
            let cost = estimate_cost(Some(10.0), LengthUnit::Centimeter, "abc", &table).unwrap();
            assert!(cost.is_nan());
            let blank = estimate_cost(Some(10.0), LengthUnit::Centimeter, " ", &table).unwrap();
            assert!(blank.is_nan());
        }

        #[test]
        fn negative_price_is_not_rejected() {
            let table = ConversionTable::standard();
            let cost = estimate_cost(Some(2.0), LengthUnit::Millimeter, "-1.5", &table);
            assert_eq!(cost, Some(-30.0));
        }

        #[test]
        fn prefix_parsing() {
            assert_eq!(parse_decimal_prefix("5abc"), Some(5.0));
            assert_eq!(parse_decimal_prefix("  .25"), Some(0.25));
            assert_eq!(parse_decimal_prefix("3."), Some(3.0));
            assert_eq!(parse_decimal_prefix("1e3x"), Some(1000.0));
            assert_eq!(parse_decimal_prefix("2e"), Some(2.0));
            assert_eq!(parse_decimal_prefix("-Infinity"), Some(f64::NEG_INFINITY));
            assert_eq!(parse_decimal_prefix("abc"), None);
            assert_eq!(parse_decimal_prefix("."), None);
            assert_eq!(parse_decimal_prefix("-"), None);
        }
    }
}
