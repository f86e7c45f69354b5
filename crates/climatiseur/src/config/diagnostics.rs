use std::ops::Range;
use std::path::PathBuf;

/// Source information for where a diagnostic came from
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub file_path: PathBuf,
    pub content: String,
}

/// A diagnostic message that can be either a warning or an error
#[derive(Debug, Clone)]
pub enum Diagnostic {
    Warning(ValidationError),
    Error(Error),
}

/// Error messages that indicate problems with the config
#[derive(Debug, Clone)]
pub enum Error {
    Load(LoadError),
    Validation(ValidationError),
}

/// A problem with one field, optionally pointing at its location
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field_path: String,
    pub message: String,
    pub span: Option<Range<usize>>,
    pub source: Option<SourceInfo>,
}

/// Error type for config loading failures (IO and TOML syntax errors)
#[derive(Debug, Clone)]
pub enum LoadError {
    Io {
        path: PathBuf,
        error: String,
    },
    Parse {
        path: PathBuf,
        message: String,
        span: Option<Range<usize>>,
        content: String,
    },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, error } => {
                write!(f, "Failed to read '{}': {}", path.display(), error)
            }
            LoadError::Parse { path, message, .. } => {
                write!(f, "Failed to parse '{}': {}", path.display(), message.trim_end())
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// A collection of diagnostics (warnings and/or errors)
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_diagnostics(&self.0))
    }
}

impl std::error::Error for Diagnostics {}

impl Diagnostic {
    /// Returns true if this diagnostic is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Diagnostic::Error(_))
    }

    /// Returns true if this diagnostic is a warning
    pub fn is_warning(&self) -> bool {
        matches!(self, Diagnostic::Warning(_))
    }
}

/// Format all diagnostics for display using Ariadne
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    use ariadne::ReportKind;

    let mut output = Vec::new();

    for diagnostic in diagnostics {
        match diagnostic {
            Diagnostic::Warning(warning) => {
                write_field_report(&mut output, ReportKind::Warning, warning);
            }
            Diagnostic::Error(Error::Validation(error)) => {
                write_field_report(&mut output, ReportKind::Error, error);
            }
            Diagnostic::Error(Error::Load(LoadError::Parse {
                path,
                message,
                span: Some(span),
                content,
            })) => {
                write_spanned_report(
                    &mut output,
                    ReportKind::Error,
                    "Failed to parse config file",
                    path,
                    content,
                    span.clone(),
                    message.trim_end(),
                );
            }
            Diagnostic::Error(Error::Load(load_error)) => {
                use std::io::Write;
                writeln!(&mut output, "\x1b[31mError\x1b[0m: {}", load_error).ok();
                writeln!(&mut output).ok();
            }
        }
    }

    String::from_utf8_lossy(&output).to_string()
}

fn write_field_report(output: &mut Vec<u8>, kind: ariadne::ReportKind, error: &ValidationError) {
    let heading = match kind {
        ariadne::ReportKind::Warning => "Warning",
        _ => "Validation error",
    };

    if let (Some(span), Some(source)) = (&error.span, &error.source) {
        write_spanned_report(
            output,
            kind,
            &format!("{} in '{}'", heading, error.field_path),
            &source.file_path,
            &source.content,
            span.clone(),
            &error.message,
        );
        return;
    }

    // Format manually since ariadne doesn't render notes well without source
    use std::io::Write;
    let file_path = error
        .source
        .as_ref()
        .map(|s| s.file_path.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string());
    let colour = match kind {
        ariadne::ReportKind::Warning => "\x1b[33m",
        _ => "\x1b[31m",
    };
    let title = match kind {
        ariadne::ReportKind::Warning => "Warning",
        _ => "Error",
    };

    writeln!(
        output,
        "{}{}\x1b[0m: {} in '{}'",
        colour, title, heading, error.field_path
    )
    .ok();
    writeln!(output, "  ┌─ {}:1:1", file_path).ok();
    writeln!(output, "  │").ok();
    writeln!(output, "  = {}", error.message).ok();
    writeln!(output).ok();
}

fn write_spanned_report(
    output: &mut Vec<u8>,
    kind: ariadne::ReportKind,
    message: &str,
    file_path: &std::path::Path,
    content: &str,
    span: Range<usize>,
    label: &str,
) {
    use ariadne::Color;
    use ariadne::Label;
    use ariadne::Report;
    use ariadne::Source;

    let colour = match kind {
        ariadne::ReportKind::Warning => Color::Yellow,
        _ => Color::Red,
    };

    let file_id = file_path.to_string_lossy().to_string();
    let report = Report::build(kind, (file_id.clone(), span.clone()))
        .with_message(message)
        .with_label(
            Label::new((file_id.clone(), span))
                .with_message(label)
                .with_color(colour),
        )
        .finish();

    report
        .write((file_id, Source::from(content.to_string())), &mut *output)
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strip ANSI escape sequences so assertions are stable and readable.
    fn strip_ansi(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c2 in chars.by_ref() {
                    if c2 == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_diagnostic_is_error() {
        let error = Diagnostic::Error(Error::Validation(ValidationError {
            field_path: "sender".to_string(),
            message: "sender is required".to_string(),
            span: None,
            source: None,
        }));
        assert!(error.is_error());
        assert!(!error.is_warning());
    }

    #[test]
    fn test_diagnostics_has_errors() {
        let warning = Diagnostic::Warning(ValidationError {
            field_path: "portals".to_string(),
            message: "'Front Door' is listed more than once".to_string(),
            span: None,
            source: None,
        });
        assert!(!Diagnostics(vec![warning.clone()]).has_errors());
        assert!(warning.is_warning());
    }

    #[test]
    fn test_format_validation_error_without_span() {
        let diagnostics = vec![Diagnostic::Error(Error::Validation(ValidationError {
            field_path: "mail.host".to_string(),
            message: "mail.host is required".to_string(),
            span: None,
            source: Some(SourceInfo {
                file_path: PathBuf::from("/tmp/climatiseur.toml"),
                content: String::new(),
            }),
        }))];

        let output = strip_ansi(&format_diagnostics(&diagnostics));
        insta::assert_snapshot!(output, @r"
        Error: Validation error in 'mail.host'
          ┌─ /tmp/climatiseur.toml:1:1
          │
          = mail.host is required
        ");
    }

    #[test]
    fn test_format_validation_error_with_span() {
        let content = "[check]\nthreshold = -1.0\n";
        let diagnostics = vec![Diagnostic::Error(Error::Validation(ValidationError {
            field_path: "check.threshold".to_string(),
            message: "threshold must be a non-negative number".to_string(),
            span: Some(20..24),
            source: Some(SourceInfo {
                file_path: PathBuf::from("/tmp/climatiseur.toml"),
                content: content.to_string(),
            }),
        }))];

        let output = strip_ansi(&format_diagnostics(&diagnostics));
        assert!(output.contains("Validation error in 'check.threshold'"));
        assert!(output.contains("/tmp/climatiseur.toml:2:13"));
        assert!(output.contains("threshold must be a non-negative number"));
    }

    #[test]
    fn test_load_error_display_io() {
        let error = LoadError::Io {
            path: PathBuf::from("/tmp/climatiseur.toml"),
            error: "file not found".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Failed to read"));
        assert!(display.contains("/tmp/climatiseur.toml"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_format_io_error() {
        let diagnostics = vec![Diagnostic::Error(Error::Load(LoadError::Io {
            path: PathBuf::from("/tmp/missing.toml"),
            error: "No such file or directory (os error 2)".to_string(),
        }))];

        let output = strip_ansi(&format_diagnostics(&diagnostics));
        assert_eq!(
            output,
            "Error: Failed to read '/tmp/missing.toml': No such file or directory (os error 2)\n\n"
        );
    }
}
