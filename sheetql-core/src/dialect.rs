use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Workbook file formats, each with its own driver profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileVersion {
    Csv,
    #[serde(rename = "pre_excel_2007", alias = "xls")]
    PreExcel2007,
    #[serde(rename = "excel_2007", alias = "xlsx")]
    Excel2007,
}

impl FileVersion {
    /// Detect the version from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                Error::Configuration(format!("'{}' has no file extension", path.display()))
            })?;
        match extension.as_str() {
            "csv" => Ok(FileVersion::Csv),
            "xls" => Ok(FileVersion::PreExcel2007),
            "xlsx" | "xlsm" | "xlsb" => Ok(FileVersion::Excel2007),
            other => Err(Error::Configuration(format!(
                "unsupported workbook extension '.{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileVersion::Csv => write!(f, "csv"),
            FileVersion::PreExcel2007 => write!(f, "pre_excel_2007"),
            FileVersion::Excel2007 => write!(f, "excel_2007"),
        }
    }
}

impl FromStr for FileVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileVersion::Csv),
            "pre_excel_2007" | "xls" => Ok(FileVersion::PreExcel2007),
            "excel_2007" | "xlsx" => Ok(FileVersion::Excel2007),
            other => Err(Error::Configuration(format!("unknown file version '{}'", other))),
        }
    }
}

/// Path of a workbook plus the format it is read as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub version: FileVersion,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let version = FileVersion::from_path(&path)?;
        Ok(Self { path, version })
    }

    pub fn with_version(path: impl Into<PathBuf>, version: FileVersion) -> Self {
        Self {
            path: path.into(),
            version,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierQuoting {
    /// `[Name]`, with `]` doubled.
    Brackets,
    /// `"Name"`, with `"` doubled.
    DoubleQuotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// `SELECT TOP n ...`
    Top,
    /// `... LIMIT n`
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetReference {
    /// Excel drivers address a worksheet as `Name$`.
    WorksheetSuffix,
    /// Text drivers address the file itself.
    Plain,
}

/// How wildcard characters inside a `LIKE` pattern are neutralised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeEscape {
    /// `[%]`, `[_]`, `[[]` character classes.
    Brackets,
    /// Backslash prefix plus an `ESCAPE '\'` clause.
    Backslash,
}

impl LikeEscape {
    pub fn escape(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for ch in text.chars() {
            match (self, ch) {
                (LikeEscape::Brackets, '%' | '_' | '[' | '#' | '*' | '?') => {
                    escaped.push('[');
                    escaped.push(ch);
                    escaped.push(']');
                }
                (LikeEscape::Backslash, '%' | '_' | '\\') => {
                    escaped.push('\\');
                    escaped.push(ch);
                }
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Trailing clause required after `LIKE ?`, if any.
    pub fn clause(&self) -> &'static str {
        match self {
            LikeEscape::Brackets => "",
            LikeEscape::Backslash => " ESCAPE '\\'",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataSourceTarget {
    File,
    Directory,
}

/// Identifier quoting, clause syntax and connection template for one
/// driver/file-version combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectProfile {
    pub name: &'static str,
    pub quoting: IdentifierQuoting,
    pub limit_style: LimitStyle,
    pub sheet_reference: SheetReference,
    pub like_escape: LikeEscape,
    /// Function used to fold case for case-insensitive matching.
    pub upper_function: &'static str,
    /// Whether `INSTR(start, haystack, needle, 0)` binary comparison is available.
    pub supports_instr: bool,
    connection_template: Option<&'static str>,
    data_source: DataSourceTarget,
}

impl DialectProfile {
    pub fn for_version(version: FileVersion) -> Self {
        match version {
            FileVersion::Csv => Self {
                name: "jet-text",
                sheet_reference: SheetReference::Plain,
                connection_template: Some(
                    "Provider=Microsoft.Jet.OLEDB.4.0;Data Source={path};Extended Properties=\"text;HDR=Yes;FMT=Delimited;\"",
                ),
                data_source: DataSourceTarget::Directory,
                ..Self::jet()
            },
            FileVersion::PreExcel2007 => Self {
                name: "jet-excel8",
                connection_template: Some(
                    "Provider=Microsoft.Jet.OLEDB.4.0;Data Source={path};Extended Properties=\"Excel 8.0;HDR=YES;\"",
                ),
                ..Self::jet()
            },
            FileVersion::Excel2007 => Self {
                name: "ace-excel12",
                connection_template: Some(
                    "Provider=Microsoft.ACE.OLEDB.12.0;Data Source={path};Extended Properties=\"Excel 12.0 Xml;HDR=YES\"",
                ),
                ..Self::jet()
            },
        }
    }

    fn jet() -> Self {
        Self {
            name: "jet",
            quoting: IdentifierQuoting::Brackets,
            limit_style: LimitStyle::Top,
            sheet_reference: SheetReference::WorksheetSuffix,
            like_escape: LikeEscape::Brackets,
            upper_function: "UCASE",
            supports_instr: true,
            connection_template: None,
            data_source: DataSourceTarget::File,
        }
    }

    /// Double-quoted identifiers and a trailing `LIMIT`, for drivers that
    /// speak standard SQL over worksheet files.
    pub fn ansi() -> Self {
        Self {
            name: "ansi",
            quoting: IdentifierQuoting::DoubleQuotes,
            limit_style: LimitStyle::Limit,
            sheet_reference: SheetReference::Plain,
            like_escape: LikeEscape::Backslash,
            upper_function: "UPPER",
            supports_instr: false,
            connection_template: None,
            data_source: DataSourceTarget::File,
        }
    }

    pub fn quote_identifier(&self, name: &str) -> String {
        match self.quoting {
            IdentifierQuoting::Brackets => format!("[{}]", name.replace(']', "]]")),
            IdentifierQuoting::DoubleQuotes => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    pub fn worksheet_reference(&self, worksheet: &str) -> String {
        match self.sheet_reference {
            SheetReference::WorksheetSuffix if !worksheet.ends_with('$') => {
                self.quote_identifier(&format!("{}$", worksheet))
            }
            _ => self.quote_identifier(worksheet),
        }
    }

    /// Connection string for the driver, if this profile has one.
    pub fn connection_string(&self, path: &Path) -> Option<String> {
        let template = self.connection_template?;
        let source = match self.data_source {
            DataSourceTarget::File => path.to_path_buf(),
            DataSourceTarget::Directory => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        Some(template.replace("{path}", &source.display().to_string()))
    }
}

impl Default for DialectProfile {
    fn default() -> Self {
        Self::for_version(FileVersion::Excel2007)
    }
}
