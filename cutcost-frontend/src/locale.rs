use cutcost_core::currency::{CurrencyCatalog, CurrencyCode};
use cutcost_core::locale::Locale;
use tracing::{debug, warn};

/// 确定显示用的语言区域：显式指定优先，其次读取运行环境，失败时回退到 `en-US`。
pub fn detect_locale(preferred: Option<&str>) -> Locale {
    if let Some(tag) = preferred {
        match Locale::parse(tag) {
            Some(locale) => return locale,
            None => warn!(tag, "无法解析指定的语言区域，改用系统设置"),
        }
    }

    match sys_locale::get_locale() {
        Some(tag) => resolve_tag(&tag),
        None => {
            warn!("无法读取系统语言区域，使用默认设置");
            Locale::default()
        }
    }
}

fn resolve_tag(tag: &str) -> Locale {
    match Locale::parse(tag) {
        Some(locale) => {
            debug!(tag, "使用系统语言区域");
            locale
        }
        None => {
            warn!(tag, "系统语言区域无法解析，使用默认设置");
            Locale::default()
        }
    }
}

/// 取地区本币作为默认货币；不在目录中时取目录首项。
pub fn default_currency(locale: &Locale, catalog: &CurrencyCatalog) -> CurrencyCode {
    let native = locale
        .native_currency_code()
        .and_then(|code| catalog.lookup(code));
    match native {
        Some(option) => option.code,
        None => {
            let fallback = catalog.default_option().code;
            warn!(
                locale = %locale.tag(),
                fallback = %fallback,
                "地区本币不在可选货币中，使用默认货币"
            );
            fallback
        }
    }
}
