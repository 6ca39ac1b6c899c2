use std::env;
use std::path::PathBuf;

use crate::editor::{Align, EditorOptions, LineBreak, StyleEdit};

/// Front end settings read from `STYLEDIT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub options: EditorOptions,
    pub align: Align,
    /// Log file for tracing output; logging stays off without one.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: EditorOptions {
                multiline: true,
                wrapping: true,
                ..EditorOptions::default()
            },
            align: Align::Left,
            log_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Missing or unparseable
    /// values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|value| parse_flag(&value))
                .unwrap_or(default)
        };
        let options = EditorOptions {
            multiline: flag("STYLEDIT_MULTILINE", defaults.options.multiline),
            wrapping: flag("STYLEDIT_WRAP", defaults.options.wrapping),
            password: flag("STYLEDIT_PASSWORD", defaults.options.password),
            read_only: flag("STYLEDIT_READ_ONLY", defaults.options.read_only),
            show_whitespace: flag("STYLEDIT_SHOW_WHITESPACE", defaults.options.show_whitespace),
            line_break: lookup("STYLEDIT_LINE_BREAK")
                .and_then(|value| parse_line_break(&value))
                .unwrap_or(defaults.options.line_break),
            ..defaults.options
        };
        Self {
            options,
            align: lookup("STYLEDIT_ALIGN")
                .and_then(|value| parse_align(&value))
                .unwrap_or(defaults.align),
            log_file: lookup("STYLEDIT_LOG")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Pushes the settings into `editor`.
    pub fn apply(&self, editor: &mut StyleEdit) {
        let options = &self.options;
        editor.set_multiline(options.multiline);
        editor.set_wrapping(options.wrapping);
        editor.set_password(options.password);
        editor.set_enabled(options.enabled);
        editor.set_read_only(options.read_only || !options.enabled);
        editor.set_show_whitespace(options.show_whitespace);
        editor.set_snap_line_breaks(options.snap_line_breaks);
        editor.set_line_break(options.line_break);
        editor.set_align(self.align);
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_align(value: &str) -> Option<Align> {
    match value.trim().to_ascii_lowercase().as_str() {
        "left" => Some(Align::Left),
        "right" => Some(Align::Right),
        "center" | "centre" => Some(Align::Center),
        _ => None,
    }
}

fn parse_line_break(value: &str) -> Option<LineBreak> {
    match value.trim().to_ascii_lowercase().as_str() {
        "crlf" => Some(LineBreak::CrLf),
        "lf" => Some(LineBreak::Lf),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::render::CellMetrics;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config(&[]);
        assert_eq!(config, Config::default());
        assert!(config.options.multiline);
        assert!(config.options.wrapping);
        assert_eq!(config.options.line_break, LineBreak::CrLf);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn reads_every_variable() {
        let config = config(&[
            ("STYLEDIT_MULTILINE", "no"),
            ("STYLEDIT_WRAP", "0"),
            ("STYLEDIT_ALIGN", "Center"),
            ("STYLEDIT_PASSWORD", "yes"),
            ("STYLEDIT_READ_ONLY", "true"),
            ("STYLEDIT_SHOW_WHITESPACE", "on"),
            ("STYLEDIT_LINE_BREAK", "lf"),
            ("STYLEDIT_LOG", "/tmp/styledit.log"),
        ]);
        assert!(!config.options.multiline);
        assert!(!config.options.wrapping);
        assert_eq!(config.align, Align::Center);
        assert!(config.options.password);
        assert!(config.options.read_only);
        assert!(config.options.show_whitespace);
        assert_eq!(config.options.line_break, LineBreak::Lf);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/styledit.log")));
    }

    #[test]
    fn garbage_values_fall_back() {
        let config = config(&[
            ("STYLEDIT_WRAP", "maybe"),
            ("STYLEDIT_ALIGN", "justify"),
            ("STYLEDIT_LINE_BREAK", "cr"),
            ("STYLEDIT_LOG", "  "),
        ]);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn apply_configures_editor() {
        let config = config(&[
            ("STYLEDIT_ALIGN", "right"),
            ("STYLEDIT_READ_ONLY", "1"),
            ("STYLEDIT_LINE_BREAK", "lf"),
        ]);
        let mut editor = StyleEdit::new(CellMetrics::terminal());
        config.apply(&mut editor);
        assert!(editor.options().multiline);
        assert!(editor.options().wrapping);
        assert!(editor.options().read_only);
        assert_eq!(editor.options().line_break, LineBreak::Lf);
        assert_eq!(editor.align(), Align::Right);
    }
}
