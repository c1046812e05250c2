//! In-process [`DataSourceDriver`] serving canned worksheets.
//!
//! The driver understands the statements this crate emits well enough to pick
//! the worksheet named in `FROM` and project the selected columns. It does not
//! evaluate `WHERE` or `ORDER BY`; rows come back in the order they were
//! added. Every executed [`StatementPlan`] is recorded so callers can inspect
//! exactly what would have been sent to a real driver.

use parking_lot::RwLock;
use sheetql_core::{
    DialectProfile, Error, FileIdentity, PhysicalSchema, Result, RowCursor, Value,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::driver::{Connection, DataSourceDriver};
use crate::emitter::StatementPlan;

/// Column headers and raw rows of one worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl MemorySheet {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

type SheetKey = (PathBuf, String);

#[derive(Default)]
struct DriverState {
    sheets: RwLock<HashMap<SheetKey, MemorySheet>>,
    executed: RwLock<Vec<StatementPlan>>,
    abort_after: RwLock<Option<usize>>,
    closed: AtomicBool,
}

/// Cloning shares the same sheets, history and close state.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    state: Arc<DriverState>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sheet` as worksheet `worksheet` of the file at `path`.
    /// For CSV files the worksheet name is the file name.
    pub fn add_sheet(&self, path: impl Into<PathBuf>, worksheet: impl Into<String>, sheet: MemorySheet) {
        let path = path.into();
        let worksheet = worksheet.into();
        info!(
            "Registered worksheet {} of {} ({} rows)",
            worksheet,
            path.display(),
            sheet.row_count()
        );
        self.state.sheets.write().insert((path, worksheet), sheet);
    }

    pub fn with_sheet(self, path: impl Into<PathBuf>, worksheet: impl Into<String>, sheet: MemorySheet) -> Self {
        self.add_sheet(path, worksheet, sheet);
        self
    }

    /// Plans executed so far, oldest first.
    pub fn executed(&self) -> Vec<StatementPlan> {
        self.state.executed.read().clone()
    }

    /// Close the driver. Open cursors fail with `ExecutionAborted` on their
    /// next read and further `open` calls fail.
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }

    /// Close the driver once a cursor has served `rows` rows.
    pub fn close_after_rows(&self, rows: usize) {
        *self.state.abort_after.write() = Some(rows);
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    fn has_file(&self, path: &Path) -> bool {
        self.state.sheets.read().keys().any(|(p, _)| p == path)
    }
}

impl DataSourceDriver for MemoryDriver {
    fn open(&self, file: &FileIdentity, dialect: &DialectProfile) -> Result<Box<dyn Connection>> {
        if self.is_closed() {
            return Err(Error::Connection("driver has been closed".to_string()));
        }
        if !self.has_file(&file.path) {
            return Err(Error::Connection(format!(
                "file not found: {}",
                file.path.display()
            )));
        }
        if let Some(connection_string) = dialect.connection_string(&file.path) {
            debug!("Opening {} with {}", file.path.display(), connection_string);
        }
        Ok(Box::new(MemoryConnection {
            state: self.state.clone(),
            path: file.path.clone(),
        }))
    }
}

struct MemoryConnection {
    state: Arc<DriverState>,
    path: PathBuf,
}

impl Connection for MemoryConnection {
    fn execute(&mut self, plan: &StatementPlan) -> Result<(PhysicalSchema, Box<dyn RowCursor + '_>)> {
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(Error::ExecutionAborted("connection closed".to_string()));
        }
        self.state.executed.write().push(plan.clone());

        let placeholders = plan.placeholder_count();
        if placeholders != plan.parameters.len() {
            return Err(Error::Execution(format!(
                "statement has {} placeholders but {} parameters were bound",
                placeholders,
                plan.parameters.len()
            )));
        }

        let select = parse_select(&plan.text)?;
        let sheets = self.state.sheets.read();
        let sheet = sheets
            .get(&(self.path.clone(), select.worksheet.clone()))
            .ok_or_else(|| {
                Error::Execution(format!(
                    "worksheet '{}' does not exist in {}",
                    select.worksheet,
                    self.path.display()
                ))
            })?;

        let (names, indices) = match select.columns {
            None => (sheet.columns.clone(), (0..sheet.columns.len()).collect::<Vec<_>>()),
            Some(columns) => {
                let mut names = Vec::with_capacity(columns.len());
                let mut indices = Vec::with_capacity(columns.len());
                for (column, alias) in columns {
                    let index = sheet
                        .columns
                        .iter()
                        .position(|c| *c == column)
                        .ok_or_else(|| {
                            Error::Execution(format!("no value given for column '{}'", column))
                        })?;
                    indices.push(index);
                    names.push(alias.unwrap_or(column));
                }
                (names, indices)
            }
        };

        let rows: Vec<Vec<Value>> = sheet
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        drop(sheets);

        let cursor = MemoryCursor {
            rows: rows.into_iter(),
            served: 0,
            abort_after: *self.state.abort_after.read(),
            state: self.state.clone(),
        };
        Ok((PhysicalSchema::new(names), Box::new(cursor)))
    }
}

struct MemoryCursor {
    rows: std::vec::IntoIter<Vec<Value>>,
    served: usize,
    abort_after: Option<usize>,
    state: Arc<DriverState>,
}

impl Iterator for MemoryCursor {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.abort_after == Some(self.served) {
            self.state.closed.store(true, Ordering::SeqCst);
        }
        if self.state.closed.load(Ordering::SeqCst) {
            return Some(Err(Error::ExecutionAborted(format!(
                "connection closed after {} rows",
                self.served
            ))));
        }
        let row = self.rows.next()?;
        self.served += 1;
        Some(Ok(row))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Symbol(char),
}

fn read_delimited(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, close: char) -> Result<String> {
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        if ch == close {
            if chars.peek() == Some(&close) {
                chars.next();
                out.push(close);
            } else {
                return Ok(out);
            }
        } else {
            out.push(ch);
        }
    }
    Err(Error::Execution(format!("unterminated {} in statement", close)))
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch == '[' {
            chars.next();
            tokens.push(Token::Quoted(read_delimited(&mut chars, ']')?));
        } else if ch == '"' {
            chars.next();
            tokens.push(Token::Quoted(read_delimited(&mut chars, '"')?));
        } else if ch == '\'' {
            chars.next();
            read_delimited(&mut chars, '\'')?;
            tokens.push(Token::Symbol('\''));
        } else if ch.is_alphanumeric() || matches!(ch, '_' | '$' | '.') {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || matches!(c, '_' | '$' | '.') {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Word(word));
        } else {
            chars.next();
            tokens.push(Token::Symbol(ch));
        }
    }
    Ok(tokens)
}

struct SelectTarget {
    /// `None` for `*`; otherwise (column, alias) pairs.
    columns: Option<Vec<(String, Option<String>)>>,
    worksheet: String,
}

fn is_keyword(token: Option<&Token>, keyword: &str) -> bool {
    matches!(token, Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
}

fn identifier(token: Option<&Token>) -> Option<String> {
    match token {
        Some(Token::Word(w)) | Some(Token::Quoted(w)) => Some(w.clone()),
        _ => None,
    }
}

fn parse_select(text: &str) -> Result<SelectTarget> {
    let malformed = || Error::Execution(format!("syntax error in statement: {}", text));
    let tokens = tokenize(text)?;
    let mut iter = tokens.iter().peekable();

    if !is_keyword(iter.next(), "SELECT") {
        return Err(malformed());
    }
    if is_keyword(iter.peek().copied(), "TOP") {
        iter.next();
        iter.next();
    }

    let columns = if iter.peek() == Some(&&Token::Symbol('*')) {
        iter.next();
        None
    } else {
        let mut columns = Vec::new();
        loop {
            let column = identifier(iter.next()).ok_or_else(malformed)?;
            let mut alias = None;
            if is_keyword(iter.peek().copied(), "AS") {
                iter.next();
                alias = Some(identifier(iter.next()).ok_or_else(malformed)?);
            }
            columns.push((column, alias));
            if iter.peek() == Some(&&Token::Symbol(',')) {
                iter.next();
            } else {
                break;
            }
        }
        Some(columns)
    };

    if !is_keyword(iter.next(), "FROM") {
        return Err(malformed());
    }
    let reference = identifier(iter.next()).ok_or_else(malformed)?;
    let worksheet = reference
        .strip_suffix('$')
        .map(str::to_string)
        .unwrap_or(reference);

    Ok(SelectTarget { columns, worksheet })
}
