//! Serializer: JSON, YAML and Markdown-template output.

pub mod template;

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::errors::{ConvertError, ConvertResult};
pub use template::{reindent, Template, TemplateError};

/// Posture report template bundled with the crate.
pub const DEFAULT_POSTURE_TEMPLATE: &str = include_str!("../../templates/posture.md");

/// Where the Markdown template comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    #[default]
    Default,
    Path(PathBuf),
}

impl TemplateSource {
    pub fn from_override(path: Option<PathBuf>) -> Self {
        path.map_or(TemplateSource::Default, TemplateSource::Path)
    }
}

/// Serializer configuration, passed in explicitly at construction.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    pub template: TemplateSource,
}

/// Output format of a rendered record tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
}

impl OutputFormat {
    /// Select a format from an output path's extension.
    /// Unknown extensions select nothing.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Some(OutputFormat::Json),
            Some("yaml" | "yml") => Some(OutputFormat::Yaml),
            Some("md") => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Pretty JSON, two-space indent, fields in declaration order.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> ConvertResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Block-style YAML.
pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> ConvertResult<Vec<u8>> {
    Ok(serde_yaml::to_string(value)?.into_bytes())
}

/// Renders records through a Markdown template.
#[derive(Debug, Clone)]
pub struct Renderer {
    template: Template,
}

impl Renderer {
    /// Load and parse the configured template.
    pub fn new(config: &RenderConfig) -> ConvertResult<Self> {
        let template = match &config.template {
            TemplateSource::Default => Template::parse("posture.md", DEFAULT_POSTURE_TEMPLATE)?,
            TemplateSource::Path(path) => {
                let source = std::fs::read_to_string(path).map_err(|source| ConvertError::Read {
                    path: path.clone(),
                    source,
                })?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                Template::parse(&name, &source)?
            }
        };
        tracing::debug!(template = template.name(), "loaded report template");
        Ok(Self { template })
    }

    pub fn render<T: Serialize>(&self, value: &T) -> ConvertResult<Vec<u8>> {
        Ok(self.template.render(value)?.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            OutputFormat::from_extension(Path::new("report.json")),
            Some(OutputFormat::Json)
        );
        assert_eq!(
            OutputFormat::from_extension(Path::new("report.MD")),
            Some(OutputFormat::Markdown)
        );
        assert_eq!(OutputFormat::from_extension(Path::new("report.txt")), None);
        assert_eq!(OutputFormat::from_extension(Path::new("report")), None);
    }

    #[test]
    fn test_json_is_two_space_indented() {
        #[derive(Serialize)]
        struct Rec {
            b: u8,
            a: Vec<u8>,
        }
        let out = String::from_utf8(to_json_pretty(&Rec { b: 1, a: vec![2] }).unwrap()).unwrap();
        assert_eq!(out, "{\n  \"b\": 1,\n  \"a\": [\n    2\n  ]\n}\n");
    }

    #[test]
    fn test_default_template_parses() {
        assert!(Renderer::new(&RenderConfig::default()).is_ok());
    }

    #[test]
    fn test_override_template() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "# {{{{ .catalog_title }}}}").unwrap();
        let config = RenderConfig {
            template: TemplateSource::Path(file.path().to_path_buf()),
        };
        let renderer = Renderer::new(&config).unwrap();
        let out = renderer
            .render(&serde_json::json!({"catalog_title": "Cat"}))
            .unwrap();
        assert_eq!(out, b"# Cat");
    }

    #[test]
    fn test_missing_override_is_read_error() {
        let config = RenderConfig {
            template: TemplateSource::Path(PathBuf::from("/nonexistent/template.md")),
        };
        let err = Renderer::new(&config).unwrap_err();
        assert!(matches!(err, ConvertError::Read { .. }));
    }

    #[test]
    fn test_broken_override_is_template_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{{{ range .x }}}}").unwrap();
        let config = RenderConfig {
            template: TemplateSource::Path(file.path().to_path_buf()),
        };
        let err = Renderer::new(&config).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
