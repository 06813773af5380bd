//! Common test utilities: an in-memory fake MATLAB engine
//!
//! `FakeBackend`/`FakeEngine` stand in for the vendor engine in
//! integration tests. The fake keeps a real workspace map and interprets
//! exactly the command shapes the session shim synthesizes (assignments,
//! listings, clear, file I/O directives), so round-trip properties can be
//! exercised without a MATLAB installation.

use async_trait::async_trait;
use matlab_mcp_core::engine::api::{EngineBackend, EngineHandle, EvalStreams};
use matlab_mcp_core::{MatlabMcpError, MatlabSession, Result, ServerConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Workspace = Arc<Mutex<BTreeMap<String, Value>>>;

static ASSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]\w*)\s*=\s*(.+)$").unwrap());
static READTABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^readtable\('([^']+)'\)$").unwrap());
static JSONREAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^jsondecode\(fileread\('([^']+)'\)\)$").unwrap());
static WRITETABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^writetable\((\w+),\s*'([^']+)'\)$").unwrap());
static JSON_EXPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"fopen\('([^']+)'.*jsonencode\((\w+)\)").unwrap());
static LOAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^load\('([^']+)'(?:,\s*'(\w+)')?\)$").unwrap());
static SAVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^save\('([^']+)'(.*)\)$").unwrap());
static QUOTED_PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']+)'").unwrap());
static VER_CHECK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^tb = ver\('([^']*)'\);").unwrap());
static CLEAR_ONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^clear\s+([A-Za-z]\w*)$").unwrap());
static DISP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^disp\('([^']*)'\)$").unwrap());

/// Toolboxes the fake engine reports as installed
const INSTALLED_TOOLBOXES: &[&str] = &["MATLAB", "Simulink", "Signal Processing Toolbox"];

#[derive(Default)]
pub struct FakeBackendInner {
    /// Shared sessions by name, each pointing at a live workspace
    pub shared: Mutex<BTreeMap<String, Workspace>>,

    /// How many engine processes were started
    pub start_calls: AtomicUsize,
}

/// Engine backend whose handles are in-memory fakes
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub inner: Arc<FakeBackendInner>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_count(&self) -> usize {
        self.inner.start_calls.load(Ordering::SeqCst)
    }

    /// Pre-register a shared session with its own workspace
    pub fn register_shared(&self, name: &str) -> Workspace {
        let workspace: Workspace = Arc::new(Mutex::new(BTreeMap::new()));
        self.inner
            .shared
            .lock()
            .unwrap()
            .insert(name.to_string(), workspace.clone());
        workspace
    }
}

#[async_trait]
impl EngineBackend for FakeBackend {
    async fn start(&self, _desktop: bool) -> Result<Box<dyn EngineHandle>> {
        self.inner.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeEngine {
            workspace: Arc::new(Mutex::new(BTreeMap::new())),
            backend: self.inner.clone(),
            name: None,
            alive: true,
        }))
    }

    async fn find_sessions(&self) -> Result<Vec<String>> {
        Ok(self.inner.shared.lock().unwrap().keys().cloned().collect())
    }

    async fn connect<'a>(&self, name: Option<&'a str>) -> Result<Box<dyn EngineHandle>> {
        let shared = self.inner.shared.lock().unwrap();
        let (name, workspace) = match name {
            Some(n) => {
                let ws = shared.get(n).ok_or_else(|| {
                    MatlabMcpError::Connection(format!("Session '{n}' not found"))
                })?;
                (n.to_string(), ws.clone())
            }
            None => {
                let (n, ws) = shared.iter().next().ok_or_else(|| {
                    MatlabMcpError::Connection("No shared sessions available".to_string())
                })?;
                (n.clone(), ws.clone())
            }
        };
        Ok(Box::new(FakeEngine {
            workspace,
            backend: self.inner.clone(),
            name: Some(name),
            alive: true,
        }))
    }
}

/// In-memory engine handle with a live workspace
pub struct FakeEngine {
    workspace: Workspace,
    backend: Arc<FakeBackendInner>,
    name: Option<String>,
    alive: bool,
}

impl FakeEngine {
    fn check_alive(&self) -> Result<()> {
        if self.alive {
            Ok(())
        } else {
            Err(MatlabMcpError::Engine(
                "MATLAB process terminated unexpectedly".to_string(),
            ))
        }
    }

    /// Interpret one evaluation: whole-script forms first, then
    /// statement-by-statement
    fn interpret(&mut self, code: &str) -> (String, String) {
        let trimmed = code.trim();

        // Whole-script introspection forms synthesized by the shim
        if trimmed == "disp(strjoin(who, ' '));" {
            let names: Vec<String> = self.workspace.lock().unwrap().keys().cloned().collect();
            return (format!("{}\n", names.join(" ")), String::new());
        }
        if trimmed.contains("evalin('base', 'whos')") {
            let ws = self.workspace.lock().unwrap();
            let mut detail = Map::new();
            for (name, value) in ws.iter() {
                detail.insert(name.clone(), describe_value(value));
            }
            return (
                format!("{}\n", Value::Object(detail)),
                String::new(),
            );
        }
        if trimmed.contains("v = version;") && trimmed.contains("c = computer;") {
            return (
                "Version: 9.14.0.2206163 (R2023a)\nComputer: GLNXA64\n".to_string(),
                String::new(),
            );
        }
        if trimmed.contains("toolboxes = struct()") {
            let inventory: Vec<Value> = INSTALLED_TOOLBOXES
                .iter()
                .map(|name| {
                    json!({"info": {"name": name, "version": "9.2", "release": "(R2023a)", "date": "19-Nov-2022"}})
                })
                .collect();
            return (format!("{}\n", Value::Array(inventory)), String::new());
        }
        if trimmed.contains("tb = ver;") {
            let listing: String = INSTALLED_TOOLBOXES
                .iter()
                .map(|name| format!("{name} 9.2\n"))
                .collect();
            return (listing, String::new());
        }
        if let Some(caps) = VER_CHECK_RE.captures(trimmed) {
            let name = caps[1].replace("''", "'");
            let line = if INSTALLED_TOOLBOXES.contains(&name.as_str()) {
                format!("Toolbox available: {name} 9.2\n")
            } else {
                format!("Toolbox not found: {name}\n")
            };
            return (line, String::new());
        }
        if trimmed.contains("info.pid = feature('getpid')") {
            return (
                format!(
                    "{}\n",
                    json!({
                        "version": "9.14.0.2206163 (R2023a)",
                        "computer": "GLNXA64",
                        "hostname": "testhost",
                        "user": "tester",
                        "pid": 4242
                    })
                ),
                String::new(),
            );
        }
        if let Some(caps) = JSON_EXPORT_RE.captures(trimmed) {
            let path = caps[1].replace("''", "'");
            let var = caps[2].to_string();
            let ws = self.workspace.lock().unwrap();
            return match ws.get(&var) {
                Some(value) => match std::fs::write(&path, value.to_string()) {
                    Ok(()) => (String::new(), String::new()),
                    Err(e) => (String::new(), format!("Unable to write '{path}': {e}")),
                },
                None => (
                    String::new(),
                    format!("Unrecognized function or variable '{var}'."),
                ),
            };
        }
        if trimmed.starts_with("help ") || trimmed.starts_with("lookfor ") {
            let topic = trimmed.split_whitespace().nth(1).unwrap_or("");
            return (
                format!(" {}  Reference documentation stub.\n", topic.to_uppercase()),
                String::new(),
            );
        }
        if trimmed.starts_with("which ") {
            let topic = trimmed.split_whitespace().last().unwrap_or("");
            return (
                format!("/opt/matlab/toolbox/matlab/{topic}.m\n"),
                String::new(),
            );
        }
        if trimmed.starts_with("print(") || trimmed.starts_with("saveas(") {
            let Some(caps) = QUOTED_PATH_RE.captures(trimmed) else {
                return (String::new(), "Invalid print directive".to_string());
            };
            let path = caps[1].to_string();
            return match std::fs::write(&path, b"figure-bytes") {
                Ok(()) => (String::new(), String::new()),
                Err(e) => (String::new(), format!("Unable to write '{path}': {e}")),
            };
        }

        // Statement-wise interpretation
        let mut stdout = String::new();
        for statement in trimmed.split([';', '\n']) {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            match self.run_statement(statement) {
                Ok(out) => stdout.push_str(&out),
                Err(err) => return (stdout, err),
            }
        }
        (stdout, String::new())
    }

    fn run_statement(&mut self, statement: &str) -> std::result::Result<String, String> {
        if statement == "clear" {
            self.workspace.lock().unwrap().clear();
            return Ok(String::new());
        }
        if let Some(caps) = CLEAR_ONE_RE.captures(statement) {
            self.workspace.lock().unwrap().remove(&caps[1]);
            return Ok(String::new());
        }
        if statement == "close all" || statement.starts_with("close(") {
            return Ok(String::new());
        }
        if let Some(caps) = DISP_RE.captures(statement) {
            return Ok(format!("{}\n", &caps[1]));
        }
        if let Some(caps) = LOAD_RE.captures(statement) {
            let path = caps[1].to_string();
            let content = std::fs::read_to_string(&path)
                .map_err(|_| format!("Error using load\nUnable to find file '{path}'."))?;
            let saved: BTreeMap<String, Value> = serde_json::from_str(&content)
                .map_err(|_| format!("Error using load\nUnable to read file '{path}'."))?;
            let mut ws = self.workspace.lock().unwrap();
            match caps.get(2) {
                Some(var) => {
                    let name = var.as_str();
                    let value = saved
                        .get(name)
                        .ok_or_else(|| format!("Variable '{name}' not found in file."))?;
                    ws.insert(name.to_string(), value.clone());
                }
                None => ws.extend(saved),
            }
            return Ok(String::new());
        }
        if let Some(caps) = SAVE_RE.captures(statement) {
            let path = caps[1].to_string();
            let ws = self.workspace.lock().unwrap();
            let selected: BTreeMap<String, Value> = if caps[2].trim().is_empty() {
                ws.clone()
            } else {
                let mut subset = BTreeMap::new();
                for name in QUOTED_PATH_RE.captures_iter(&caps[2]) {
                    let name = name[1].to_string();
                    let value = ws
                        .get(&name)
                        .ok_or_else(|| format!("Variable '{name}' not found."))?;
                    subset.insert(name, value.clone());
                }
                subset
            };
            let json = serde_json::to_string(&selected).map_err(|e| e.to_string())?;
            std::fs::write(&path, json).map_err(|e| format!("Unable to write '{path}': {e}"))?;
            return Ok(String::new());
        }
        if let Some(caps) = WRITETABLE_RE.captures(statement) {
            let var = caps[1].to_string();
            let path = caps[2].to_string();
            let ws = self.workspace.lock().unwrap();
            let value = ws
                .get(&var)
                .ok_or_else(|| format!("Unrecognized function or variable '{var}'."))?;
            let csv = encode_csv(value).ok_or_else(|| {
                format!("Error using writetable\nVariable '{var}' is not tabular.")
            })?;
            std::fs::write(&path, csv).map_err(|e| format!("Unable to write '{path}': {e}"))?;
            return Ok(String::new());
        }
        if let Some(caps) = ASSIGN_RE.captures(statement) {
            let name = caps[1].to_string();
            let expr = caps[2].trim().to_string();
            let value = self.eval_expression(&expr)?;
            self.workspace.lock().unwrap().insert(name, value);
            return Ok(String::new());
        }
        if statement.starts_with("error('") {
            let msg = QUOTED_PATH_RE
                .captures(statement)
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| "error".to_string());
            return Err(msg);
        }
        Err(format!("Unrecognized function or variable '{statement}'."))
    }

    fn eval_expression(&self, expr: &str) -> std::result::Result<Value, String> {
        if let Ok(n) = expr.parse::<f64>() {
            return serde_json::Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| format!("Invalid number '{expr}'"));
        }
        if let Some(caps) = READTABLE_RE.captures(expr) {
            let path = caps[1].to_string();
            let content = std::fs::read_to_string(&path)
                .map_err(|_| format!("Error using readtable\nUnable to open file '{path}'."))?;
            return decode_csv(&content)
                .ok_or_else(|| format!("Error using readtable\nUnable to parse '{path}'."));
        }
        if let Some(caps) = JSONREAD_RE.captures(expr) {
            let path = caps[1].to_string();
            let content = std::fs::read_to_string(&path)
                .map_err(|_| format!("Unable to open file '{path}'."))?;
            return serde_json::from_str(&content)
                .map_err(|_| format!("Error using jsondecode\nInvalid JSON in '{path}'."));
        }
        if expr.starts_with('\'') && expr.ends_with('\'') && expr.len() >= 2 {
            return Ok(Value::String(expr[1..expr.len() - 1].replace("''", "'")));
        }
        Err(format!("Undefined function or variable '{expr}'."))
    }
}

#[async_trait]
impl EngineHandle for FakeEngine {
    async fn evaluate(&mut self, code: &str) -> Result<EvalStreams> {
        self.check_alive()?;
        let (stdout, stderr) = self.interpret(code);
        Ok(EvalStreams { stdout, stderr })
    }

    async fn get_variable(&mut self, name: &str) -> Result<Value> {
        self.check_alive()?;
        self.workspace
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| MatlabMcpError::Execution(format!("Undefined variable '{name}'.")))
    }

    async fn set_variable(&mut self, name: &str, value: &Value) -> Result<()> {
        self.check_alive()?;
        self.workspace
            .lock()
            .unwrap()
            .insert(name.to_string(), value.clone());
        Ok(())
    }

    async fn call_function(
        &mut self,
        name: &str,
        args: &[Value],
        nargout: usize,
    ) -> Result<Vec<Value>> {
        self.check_alive()?;
        let numbers: Vec<f64> = args.iter().flat_map(flatten_numbers).collect();
        let result = match name {
            "mean" => {
                if numbers.is_empty() {
                    return Err(MatlabMcpError::Execution("mean of empty input".to_string()));
                }
                json!(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
            "sum" => json!(numbers.iter().sum::<f64>()),
            "numel" => json!(numbers.len()),
            other => {
                return Err(MatlabMcpError::Execution(format!(
                    "Undefined function '{other}'."
                )))
            }
        };
        if nargout == 0 {
            Ok(Vec::new())
        } else {
            Ok(vec![result])
        }
    }

    async fn engine_name(&mut self) -> Result<Option<String>> {
        self.check_alive()?;
        Ok(self.name.clone())
    }

    async fn share<'a>(&mut self, name: Option<&'a str>) -> Result<String> {
        self.check_alive()?;
        let effective = name
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("MATLAB_{}", std::process::id()));
        self.backend
            .shared
            .lock()
            .unwrap()
            .insert(effective.clone(), self.workspace.clone());
        self.name = Some(effective.clone());
        Ok(effective)
    }

    async fn quit(&mut self) -> Result<()> {
        self.alive = false;
        Ok(())
    }
}

/// Per-variable detail record the way `whos` would describe it
fn describe_value(value: &Value) -> Value {
    let (class, count) = match value {
        Value::Number(_) => ("double", 1),
        Value::Bool(_) => ("logical", 1),
        Value::String(s) => ("char", s.len().max(1)),
        Value::Array(items) => ("double", items.len().max(1)),
        Value::Object(_) => ("struct", 1),
        Value::Null => ("double", 0),
    };
    json!({
        "class": class,
        "size": [1, count],
        "bytes": 8 * count
    })
}

/// Write a numeric matrix/vector as CSV with a header row
fn encode_csv(value: &Value) -> Option<String> {
    let rows: Vec<Vec<f64>> = match value {
        Value::Array(items) if items.iter().all(|v| v.is_array()) => items
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|cells| cells.iter().filter_map(|c| c.as_f64()).collect())
                    .unwrap_or_default()
            })
            .collect(),
        Value::Array(items) => vec![items.iter().filter_map(|c| c.as_f64()).collect()],
        _ => return None,
    };
    let width = rows.first()?.len();
    if width == 0 {
        return None;
    }

    let header: Vec<String> = (1..=width).map(|i| format!("v{i}")).collect();
    let mut csv = header.join(",");
    csv.push('\n');
    for row in rows {
        let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }
    Some(csv)
}

/// Read a CSV back into an array of row arrays
fn decode_csv(content: &str) -> Option<Value> {
    let mut lines = content.lines();
    lines.next()?; // header
    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row: Option<Vec<Value>> = line
            .split(',')
            .map(|cell| {
                cell.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
            })
            .collect();
        rows.push(Value::Array(row?));
    }
    Some(Value::Array(rows))
}

/// All numeric leaves of a JSON value, in order
pub fn flatten_numbers(value: &Value) -> Vec<f64> {
    match value {
        Value::Number(n) => n.as_f64().into_iter().collect(),
        Value::Array(items) => items.iter().flat_map(flatten_numbers).collect(),
        _ => Vec::new(),
    }
}

/// Session wired to a fresh fake backend
pub fn fake_session() -> (MatlabSession, FakeBackend) {
    let backend = FakeBackend::new();
    let session = MatlabSession::new(Arc::new(backend.clone()), ServerConfig::default());
    (session, backend)
}
