//! MATLAB command synthesis and input validation
//!
//! Every string that reaches the engine through a synthesized command is
//! built here: variable and function names must be valid MATLAB
//! identifiers, file paths and free-text arguments are single-quote
//! escaped and rejected when they carry control characters. Nothing else
//! in the crate concatenates user input into engine code.

use crate::error::{MatlabMcpError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// MATLAB identifiers: letter followed by letters/digits/underscores,
/// bounded by namelengthmax (63)
static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,62}$").expect("identifier regex"));

/// Help topics additionally allow dots and slashes (package paths,
/// class/method references)
static HELP_TOPIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_./]*$").expect("help topic regex"));

/// Simple variable listing: names only, space separated
pub const SIMPLE_WORKSPACE_COMMAND: &str = "disp(strjoin(who, ' '));";

/// Detailed variable listing: per-variable class/size/bytes, JSON encoded
/// by the engine itself
pub const DETAILED_WORKSPACE_SCRIPT: &str = "\
ws = evalin('base', 'whos');
result = struct();
for i = 1:length(ws)
    info = struct();
    info.class = ws(i).class;
    info.size = ws(i).size;
    info.bytes = ws(i).bytes;
    result.(ws(i).name) = info;
end
disp(jsonencode(result));
";

/// Version and platform introspection
pub const VERSION_SCRIPT: &str = "\
v = version;
c = computer;
fprintf('Version: %s\\nComputer: %s\\n', v, c);
";

/// Installed toolbox listing, one `Name Version` line per product
pub const TOOLBOX_LIST_SCRIPT: &str = "\
tb = ver;
for i = 1:numel(tb)
    fprintf('%s %s\\n', tb(i).Name, tb(i).Version);
end
";

/// Installed toolbox inventory as JSON (resource form)
pub const TOOLBOX_JSON_SCRIPT: &str = "\
tb = ver;
toolboxes = struct();
for i = 1:numel(tb)
    info = struct('name', tb(i).Name, 'version', tb(i).Version, 'release', tb(i).Release, 'date', tb(i).Date);
    toolboxes(i).info = info;
end
disp(jsonencode(toolboxes));
";

/// Session environment snapshot as JSON (resource form)
pub const SESSION_INFO_SCRIPT: &str = "\
info = struct();
info.version = version;
info.computer = computer;
info.hostname = getenv('HOSTNAME');
info.user = getenv('USER');
try
    info.pid = feature('getpid');
catch
    info.pid = 0;
end
disp(jsonencode(info));
";

/// Figure output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureFormat {
    Png,
    Jpg,
    Svg,
    Pdf,
    Fig,
}

impl FigureFormat {
    /// Raster formats take a DPI parameter in the print directive
    pub fn is_raster(self) -> bool {
        matches!(self, FigureFormat::Png | FigureFormat::Jpg)
    }

    /// Driver name for the print directive
    fn driver(self) -> &'static str {
        match self {
            FigureFormat::Png => "png",
            FigureFormat::Jpg => "jpeg",
            FigureFormat::Svg => "svg",
            FigureFormat::Pdf => "pdf",
            FigureFormat::Fig => "fig",
        }
    }

    /// File extension for auto-generated paths
    pub fn extension(self) -> &'static str {
        match self {
            FigureFormat::Jpg => "jpg",
            other => other.driver(),
        }
    }
}

impl FromStr for FigureFormat {
    type Err = MatlabMcpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(FigureFormat::Png),
            "jpg" | "jpeg" => Ok(FigureFormat::Jpg),
            "svg" => Ok(FigureFormat::Svg),
            "pdf" => Ok(FigureFormat::Pdf),
            "fig" => Ok(FigureFormat::Fig),
            other => Err(MatlabMcpError::InvalidOperation(format!(
                "Unsupported format: {other}"
            ))),
        }
    }
}

impl fmt::Display for FigureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Tabular/structured data formats for import/export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Txt,
    Xlsx,
    Json,
}

impl DataFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Txt => "txt",
            DataFormat::Xlsx => "xlsx",
            DataFormat::Json => "json",
        }
    }
}

impl FromStr for DataFormat {
    type Err = MatlabMcpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "txt" => Ok(DataFormat::Txt),
            "xlsx" => Ok(DataFormat::Xlsx),
            "json" => Ok(DataFormat::Json),
            other => Err(MatlabMcpError::InvalidOperation(format!(
                "Unsupported format: {other}"
            ))),
        }
    }
}

/// Help lookup operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpOp {
    Help,
    Lookfor,
    Which,
}

impl FromStr for HelpOp {
    type Err = MatlabMcpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "help" => Ok(HelpOp::Help),
            "lookfor" => Ok(HelpOp::Lookfor),
            "which" => Ok(HelpOp::Which),
            other => Err(MatlabMcpError::InvalidOperation(format!(
                "Unknown help operation: {other}"
            ))),
        }
    }
}

/// Validate a MATLAB identifier (variable or function name)
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(MatlabMcpError::InvalidOperation(format!(
            "Invalid MATLAB identifier: '{name}'"
        )))
    }
}

/// Quote free text for embedding in a single-quoted MATLAB string.
///
/// Quotes are doubled per MATLAB escaping; control characters are rejected
/// outright since they cannot appear inside a quoted literal and would
/// otherwise smuggle extra statements into the command stream.
pub fn quote_text(text: &str) -> Result<String> {
    if text.chars().any(|c| c.is_control()) {
        return Err(MatlabMcpError::InvalidOperation(
            "Argument contains control characters".to_string(),
        ));
    }
    Ok(format!("'{}'", text.replace('\'', "''")))
}

/// Quote a filesystem path for embedding in a command
pub fn quote_path(path: &str) -> Result<String> {
    if path.trim().is_empty() {
        return Err(MatlabMcpError::InvalidOperation(
            "Path must not be empty".to_string(),
        ));
    }
    quote_text(path)
}

/// Derive the `imported_<stem>` variable name for a data import.
///
/// Non-alphanumeric characters in the file stem collapse to underscores so
/// the result is always a valid identifier.
pub fn import_variable_name(path: &str) -> Result<String> {
    let stem = std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if stem.is_empty() {
        return Err(MatlabMcpError::InvalidOperation(format!(
            "Cannot derive a variable name from '{path}'"
        )));
    }
    let sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let name = format!("imported_{sanitized}");
    validate_identifier(&name)?;
    Ok(name)
}

/// Build the save command for a figure: print directive with DPI for
/// raster formats, without for vector formats, saveas for the native
/// `.fig` format
pub fn save_figure_command(
    fig_num: Option<i64>,
    path: &str,
    format: FigureFormat,
    dpi: u32,
) -> Result<String> {
    let handle = match fig_num {
        Some(n) => format!("figure({n})"),
        None => "gcf".to_string(),
    };
    let path = quote_path(path)?;

    let command = match format {
        FigureFormat::Fig => format!("saveas({handle}, {path}, 'fig');"),
        fmt if fmt.is_raster() => {
            format!("print({handle}, {path}, '-d{}', '-r{dpi}');", fmt.driver())
        }
        fmt => format!("print({handle}, {path}, '-d{}');", fmt.driver()),
    };
    Ok(command)
}

/// Build the close command for all figures or a specific list
pub fn close_figures_command(fig_nums: Option<&[i64]>) -> String {
    match fig_nums {
        None => "close all;".to_string(),
        Some(nums) => nums
            .iter()
            .map(|n| format!("close({n});"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Build the load directive for a MAT file, optionally scoped to one
/// variable
pub fn load_mat_command(path: &str, var: Option<&str>) -> Result<String> {
    let path = quote_path(path)?;
    match var {
        Some(name) => {
            validate_identifier(name)?;
            Ok(format!("load({path}, '{name}');"))
        }
        None => Ok(format!("load({path});")),
    }
}

/// Build the save directive for a MAT file, optionally scoped to named
/// variables
pub fn save_mat_command(path: &str, variables: Option<&[String]>) -> Result<String> {
    let path = quote_path(path)?;
    match variables {
        Some(vars) if !vars.is_empty() => {
            for name in vars {
                validate_identifier(name)?;
            }
            let list = vars
                .iter()
                .map(|v| format!("'{v}'"))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!("save({path}, {list});"))
        }
        _ => Ok(format!("save({path});")),
    }
}

/// Build the import directive for a data file and the workspace variable
/// it lands in
pub fn import_data_command(path: &str, format: DataFormat) -> Result<(String, String)> {
    let var_name = import_variable_name(path)?;
    let quoted = quote_path(path)?;
    let command = match format {
        DataFormat::Csv | DataFormat::Txt | DataFormat::Xlsx => {
            format!("{var_name} = readtable({quoted});")
        }
        DataFormat::Json => format!("{var_name} = jsondecode(fileread({quoted}));"),
    };
    Ok((command, var_name))
}

/// Build the export directive for a workspace variable
pub fn export_data_command(var: &str, path: &str, format: DataFormat) -> Result<String> {
    validate_identifier(var)?;
    let quoted = quote_path(path)?;
    let command = match format {
        DataFormat::Csv | DataFormat::Txt | DataFormat::Xlsx => {
            format!("writetable({var}, {quoted});")
        }
        DataFormat::Json => format!(
            "fid = fopen({quoted}, 'w'); fprintf(fid, '%s', jsonencode({var})); fclose(fid);"
        ),
    };
    Ok(command)
}

/// Build the clear directive for one variable
pub fn clear_variable_command(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("clear {name};"))
}

/// Clear directive for the whole workspace
pub const CLEAR_ALL_COMMAND: &str = "clear;";

/// Build the toolbox availability probe; absence is detected by the fixed
/// "not found" line in the output
pub fn check_toolbox_script(name: &str) -> Result<String> {
    let quoted = quote_text(name)?;
    // The unquoted copy lands inside fprintf format strings, so quotes in
    // the name must be gone by the time it is interpolated there.
    let display = name.replace('\'', "''");
    Ok(format!(
        "tb = ver({quoted});\n\
         if isempty(tb)\n\
         \x20   fprintf('Toolbox not found: {display}\\n');\n\
         else\n\
         \x20   fprintf('Toolbox available: %s %s\\n', tb.Name, tb.Version);\n\
         end\n"
    ))
}

/// Fixed substring marking an unavailable toolbox in the probe output
pub const TOOLBOX_NOT_FOUND_MARKER: &str = "not found";

/// Build a help/search/locate command
pub fn help_command(name: &str, op: HelpOp) -> Result<String> {
    if !HELP_TOPIC_RE.is_match(name) {
        return Err(MatlabMcpError::InvalidOperation(format!(
            "Invalid help topic: '{name}'"
        )));
    }
    Ok(match op {
        HelpOp::Help => format!("help {name}"),
        HelpOp::Lookfor => format!("lookfor {name}"),
        HelpOp::Which => format!("which -all {name}"),
    })
}
