use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use super::collections::BTreeMap;
use super::geometry::Rect;
use crate::layout_engine::{NoFallbackBehavior, NodeTemplate, WorkspaceId};

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tiletree")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    /// Per-workspace overrides keyed by workspace id.
    #[serde(default)]
    pub workspaces: BTreeMap<WorkspaceId, WorkspaceSettings>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Run a full reindex after every window removal.
    #[serde(default = "no")]
    pub auto_reindex: bool,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub floating: FloatingSettings,
    #[serde(default)]
    pub resize: ResizeSettings,
    #[serde(default)]
    pub gaps: GapSettings,
    #[serde(default)]
    pub work_area: WorkAreaSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Tree every new workspace starts from.
    #[serde(default)]
    pub template: NodeTemplate,
    #[serde(default)]
    pub no_fallback_behavior: NoFallbackBehavior,
}

/// Size of windows that do not live in the tree.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FloatingSettings {
    #[serde(default = "default_floating_width")]
    pub width: i32,
    #[serde(default = "default_floating_height")]
    pub height: i32,
}

/// Fraction of the enclosing branch's total weight moved per resize step.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ResizeSettings {
    #[serde(default = "default_resize_delta")]
    pub horizontal_delta: f64,
    #[serde(default = "default_resize_delta")]
    pub vertical_delta: f64,
}

/// Gap configuration for window spacing
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    /// Outer gaps (space between windows and screen edges)
    #[serde(default)]
    pub outer: OuterGaps,
    /// Inner gaps (space between windows)
    #[serde(default)]
    pub inner: InnerGaps,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OuterGaps {
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub bottom: i32,
    #[serde(default)]
    pub right: i32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct InnerGaps {
    /// Gap between children of a horizontal branch
    #[serde(default)]
    pub horizontal: i32,
    /// Gap between children of a vertical branch
    #[serde(default)]
    pub vertical: i32,
}

/// Screen area handed to the layout until the host reports a real one.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkAreaSettings {
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub top: i32,
    #[serde(default = "default_work_area_width")]
    pub width: i32,
    #[serde(default = "default_work_area_height")]
    pub height: i32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub template: Option<NodeTemplate>,
    #[serde(default)]
    pub no_fallback_behavior: Option<NoFallbackBehavior>,
}

impl Default for FloatingSettings {
    fn default() -> Self {
        Self {
            width: default_floating_width(),
            height: default_floating_height(),
        }
    }
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            horizontal_delta: default_resize_delta(),
            vertical_delta: default_resize_delta(),
        }
    }
}

impl Default for WorkAreaSettings {
    fn default() -> Self {
        Self {
            left: 0,
            top: 0,
            width: default_work_area_width(),
            height: default_work_area_height(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.layout.validate());
        issues.extend(self.floating.validate());
        issues.extend(self.resize.validate());
        issues.extend(self.gaps.validate());
        issues.extend(self.work_area.validate());

        issues
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        self.template.validate().into_iter().map(|issue| format!("layout.template {issue}")).collect()
    }
}

impl FloatingSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.width <= 0 || self.height <= 0 {
            issues.push(format!(
                "floating size must be positive, got {}x{}",
                self.width, self.height
            ));
        }

        issues
    }
}

impl ResizeSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (name, delta) in [
            ("horizontal_delta", self.horizontal_delta),
            ("vertical_delta", self.vertical_delta),
        ] {
            if !(delta > 0.0 && delta <= 1.0) {
                issues.push(format!("resize.{name} must be in (0, 1], got {delta}"));
            }
        }

        issues
    }
}

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.outer.validate());
        issues.extend(self.inner.validate());

        issues
    }
}

impl OuterGaps {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (name, value) in [
            ("top", self.top),
            ("left", self.left),
            ("bottom", self.bottom),
            ("right", self.right),
        ] {
            if value < 0 {
                issues.push(format!("outer gap {name} must be non-negative, got {value}"));
            }
        }

        issues
    }
}

impl InnerGaps {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.horizontal < 0 {
            issues.push(format!(
                "inner gap horizontal must be non-negative, got {}",
                self.horizontal
            ));
        }
        if self.vertical < 0 {
            issues.push(format!(
                "inner gap vertical must be non-negative, got {}",
                self.vertical
            ));
        }

        issues
    }
}

impl WorkAreaSettings {
    pub fn rect(&self) -> Rect { Rect::from_size(self.left, self.top, self.width, self.height) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.width <= 0 || self.height <= 0 {
            issues.push(format!(
                "work_area size must be positive, got {}x{}",
                self.width, self.height
            ));
        }

        issues
    }
}

impl WorkspaceSettings {
    pub fn validate(&self) -> Vec<String> {
        self.template
            .as_ref()
            .map(|t| t.validate().into_iter().map(|issue| format!("template {issue}")).collect())
            .unwrap_or_default()
    }
}

fn no() -> bool { false }

fn default_floating_width() -> i32 { 800 }

fn default_floating_height() -> i32 { 600 }

fn default_resize_delta() -> f64 { 0.1 }

fn default_work_area_width() -> i32 { 1920 }

fn default_work_area_height() -> i32 { 1080 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default() -> Config {
        Self::parse(include_str!("../../tiletree.default.toml"))
            .expect("bundled default config must parse")
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate();

        for (id, workspace) in &self.workspaces {
            for issue in workspace.validate() {
                issues.push(format!("workspaces[{id}] {issue}"));
            }
        }

        issues
    }

    /// Settings for one workspace, with its overrides applied.
    pub fn workspace(&self, id: &WorkspaceId) -> ResolvedWorkspace<'_> {
        let overrides = self.workspaces.get(id);
        ResolvedWorkspace {
            name: overrides.and_then(|w| w.name.clone()).unwrap_or_else(|| id.to_string()),
            template: overrides
                .and_then(|w| w.template.as_ref())
                .unwrap_or(&self.settings.layout.template),
            no_fallback_behavior: overrides
                .and_then(|w| w.no_fallback_behavior)
                .unwrap_or(self.settings.layout.no_fallback_behavior),
        }
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<Config>(buf) {
            Ok(config) => Ok(config),
            Err(e) => bail!("{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWorkspace<'a> {
    pub name: String,
    pub template: &'a NodeTemplate,
    pub no_fallback_behavior: NoFallbackBehavior,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::layout_engine::TemplateKind;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        let issues = config.validate();
        assert!(issues.is_empty(), "Expected no issues, got: {:?}", issues);
        assert_eq!(config.settings.layout.template, NodeTemplate::fibonacci());
        assert_eq!(config.settings.resize.horizontal_delta, 0.1);
        assert!(!config.settings.auto_reindex);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.workspaces.is_empty());
        assert_eq!(config.settings.floating.width, 800);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(Config::parse("[settings]\nanimate = true").is_err());
        assert!(Config::parse("[settings.gaps.outer]\nmiddle = 3").is_err());
    }

    #[test]
    fn test_bad_condition_fails_to_load() {
        let err = Config::parse(
            r#"
            [settings.layout.template]
            type = "fallback"
            condition = "len >< 2"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("len >< 2"), "{err}");
    }

    #[test]
    fn test_validate_collects_issues() {
        let mut config = Config::parse("").unwrap();
        config.settings.floating.width = 0;
        config.settings.resize.vertical_delta = 1.5;
        config.settings.gaps.outer.left = -1;
        config.settings.gaps.inner.vertical = -2;
        config.workspaces.insert(WorkspaceId::from("bad"), WorkspaceSettings {
            template: Some(NodeTemplate::leaf(1)),
            ..Default::default()
        });
        let issues = config.validate();
        assert_eq!(issues.len(), 5, "{issues:?}");
        assert!(issues.last().unwrap().starts_with("workspaces[bad]"));
    }

    #[test]
    fn test_workspace_overrides() {
        let config = Config::parse(
            r#"
            [workspaces.code]
            name = "Code"
            no_fallback_behavior = "unmanaged"

            [workspaces.code.template]
            type = "vertical"

            [[workspaces.code.template.children]]
            type = "leaf"

            [[workspaces.code.template.children]]
            type = "fallback"
            priority = 2
            "#,
        )
        .unwrap();

        let code = config.workspace(&WorkspaceId::from("code"));
        assert_eq!(code.name, "Code");
        assert_eq!(code.template.kind, TemplateKind::Vertical);
        assert_eq!(code.no_fallback_behavior, NoFallbackBehavior::Unmanaged);

        let other = config.workspace(&WorkspaceId::from("other"));
        assert_eq!(other.name, "other");
        assert_eq!(other.template, &NodeTemplate::fibonacci());
        assert_eq!(other.no_fallback_behavior, NoFallbackBehavior::Float);
    }

    #[test]
    fn test_read_and_save_round_trip_through_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[settings]\nauto_reindex = true\n[settings.gaps.inner]\nhorizontal = 8")
            .unwrap();
        let config = Config::read(file.path()).unwrap();
        assert!(config.settings.auto_reindex);
        assert_eq!(config.settings.gaps.inner.horizontal, 8);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        config.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), config);
    }
}
