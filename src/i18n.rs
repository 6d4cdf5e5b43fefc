use std::collections::HashMap;

pub struct I18n {
    translations: HashMap<String, HashMap<String, String>>,
    current_lang: String,
}

impl I18n {
    pub fn new(lang: &str) -> Self {
        let mut translations = HashMap::new();

        // English
        let mut en = HashMap::new();
        // Console notes
        en.insert("pyenv_not_found".to_string(), "Error: '{0}' command not found. Make sure pyenv is installed and in your PATH.".to_string());
        en.insert("pyenv_versions_failed".to_string(), "Error: '{0} versions' failed (exit code: {1}).".to_string());
        en.insert("pyenv_versions_io".to_string(), "Error: could not run '{0} versions': {1}".to_string());
        en.insert("config_fallback".to_string(), "Warning: could not load config ({0}); using defaults.".to_string());
        en.insert("warning_interactive_failed".to_string(), "Warning: cannot start the interactive UI: {0}".to_string());

        // Log markers
        en.insert("running".to_string(), "Running:".to_string());
        en.insert("error_marker".to_string(), "Error:".to_string());

        // UI
        en.insert("title_versions".to_string(), "Python Version".to_string());
        en.insert("title_versions_filtered".to_string(), "Python Version (filter: {0})".to_string());
        en.insert("no_versions".to_string(), "No Python versions found".to_string());
        en.insert("no_matches".to_string(), "No matches found".to_string());
        en.insert("title_package".to_string(), "Package".to_string());
        en.insert("package_placeholder".to_string(), "Enter package name".to_string());
        en.insert("btn_search".to_string(), "Search Package".to_string());
        en.insert("btn_install".to_string(), "Install in Virtual Environment".to_string());
        en.insert("title_log".to_string(), "Output".to_string());
        en.insert("log_scrolled".to_string(), "scrolled, End to follow".to_string());
        en.insert("hint_bar".to_string(), "Tab=focus  Enter/F2=search  F3=install  PgUp/PgDn=scroll  Esc=quit".to_string());

        // 中文
        let mut zh = HashMap::new();
        zh.insert("pyenv_not_found".to_string(), "错误：未找到 '{0}' 命令，请确认已安装 pyenv 并已加入 PATH。".to_string());
        zh.insert("pyenv_versions_failed".to_string(), "错误：'{0} versions' 执行失败（退出码：{1}）。".to_string());
        zh.insert("pyenv_versions_io".to_string(), "错误：无法运行 '{0} versions'：{1}".to_string());
        zh.insert("config_fallback".to_string(), "警告：无法加载配置（{0}），使用默认配置。".to_string());
        zh.insert("warning_interactive_failed".to_string(), "警告：无法启动交互界面：{0}".to_string());

        zh.insert("running".to_string(), "执行：".to_string());
        zh.insert("error_marker".to_string(), "错误：".to_string());

        zh.insert("title_versions".to_string(), "Python 版本".to_string());
        zh.insert("title_versions_filtered".to_string(), "Python 版本（过滤：{0}）".to_string());
        zh.insert("no_versions".to_string(), "未找到 Python 版本".to_string());
        zh.insert("no_matches".to_string(), "没有匹配项".to_string());
        zh.insert("title_package".to_string(), "包名".to_string());
        zh.insert("package_placeholder".to_string(), "输入包名".to_string());
        zh.insert("btn_search".to_string(), "查询包".to_string());
        zh.insert("btn_install".to_string(), "安装到虚拟环境".to_string());
        zh.insert("title_log".to_string(), "输出".to_string());
        zh.insert("log_scrolled".to_string(), "已滚动，按 End 跟随".to_string());
        zh.insert("hint_bar".to_string(), "Tab=切换  Enter/F2=查询  F3=安装  PgUp/PgDn=滚动  Esc=退出".to_string());

        translations.insert("en".to_string(), en);
        translations.insert("zh".to_string(), zh);

        // 确定语言 - 支持多种语言代码格式
        let effective_lang = if lang.starts_with("zh") || lang == "cn" || lang == "chinese" {
            "zh"
        } else {
            "en"
        };

        Self {
            translations,
            current_lang: effective_lang.to_string(),
        }
    }

    pub fn t(&self, key: &str) -> String {
        if let Some(lang_map) = self.translations.get(&self.current_lang) {
            if let Some(value) = lang_map.get(key) {
                return value.clone();
            }
        }
        key.to_string()
    }

    pub fn t_format(&self, key: &str, args: &[&str]) -> String {
        let template = self.t(key);
        let mut result = template;
        for (i, arg) in args.iter().enumerate() {
            result = result.replace(&format!("{{{}}}", i), arg);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_language_from_locale() {
        assert_eq!(I18n::new("zh_CN").t("btn_search"), "查询包");
        assert_eq!(I18n::new("en_US").t("btn_search"), "Search Package");
        assert_eq!(I18n::new("fr_FR").t("btn_search"), "Search Package");
    }

    #[test]
    fn every_english_key_has_a_chinese_entry() {
        let i18n = I18n::new("en");
        let en = &i18n.translations["en"];
        let zh = &i18n.translations["zh"];
        for key in en.keys() {
            assert!(zh.contains_key(key), "missing zh entry for {key}");
        }
    }

    #[test]
    fn formats_positional_args() {
        let i18n = I18n::new("en");
        assert_eq!(
            i18n.t_format("pyenv_versions_failed", &["pyenv", "1"]),
            "Error: 'pyenv versions' failed (exit code: 1)."
        );
        assert_eq!(i18n.t("unknown_key"), "unknown_key");
    }
}
