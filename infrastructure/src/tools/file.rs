//! File system tools: read_file, write_file, list_directory

use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use strix_application::ports::tool::{Tool, ToolTask};
use strix_domain::{
    Arguments, ExecutionContext, ParamType, ToolDefinition, ToolError, ToolParameter,
};

/// Tool name constants
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const LIST_DIRECTORY: &str = "list_directory";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum entries returned by list_directory
const MAX_ENTRIES: usize = 1000;

#[derive(Debug, Deserialize)]
struct ReadFileParams {
    path: PathBuf,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
}

pub struct ReadFileTool {
    definition: ToolDefinition,
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self {
            definition: ToolDefinition::new(READ_FILE, "Read the contents of a file at the specified path")
                .with_parameter(
                    ToolParameter::new("path", "Path to the file to read", true)
                        .with_type(ParamType::Path),
                )
                .with_parameter(
                    ToolParameter::new("offset", "Line number to start reading from (0-indexed)", false)
                        .with_type(ParamType::Integer),
                )
                .with_parameter(
                    ToolParameter::new("limit", "Maximum number of lines to read", false)
                        .with_type(ParamType::Integer),
                ),
        }
    }
}

impl Tool for ReadFileTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn call(&self, args: Arguments, _context: ExecutionContext) -> ToolTask {
        Box::pin(async move {
            let params: ReadFileParams = args.parse()?;
            read_file(params).await
        })
    }
}

async fn read_file(params: ReadFileParams) -> Result<Value, ToolError> {
    let path = params.path.as_path();
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| io_error("read", path, e))?;
    if !metadata.is_file() {
        return Err(ToolError::execution(format!("'{}' is not a file", path.display())));
    }
    if metadata.len() > MAX_READ_SIZE {
        return Err(ToolError::execution(format!(
            "File too large ({} bytes, max {} bytes)",
            metadata.len(),
            MAX_READ_SIZE
        )));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| io_error("read", path, e))?;
    let content = String::from_utf8_lossy(&bytes);

    if params.offset.is_none() && params.limit.is_none() {
        return Ok(Value::String(content.into_owned()));
    }
    let offset = params.offset.unwrap_or(0);
    let lines = content.lines().skip(offset);
    let selected: Vec<&str> = match params.limit {
        Some(limit) => lines.take(limit).collect(),
        None => lines.collect(),
    };
    Ok(Value::String(selected.join("\n")))
}

#[derive(Debug, Deserialize)]
struct WriteFileParams {
    path: PathBuf,
    content: String,
    #[serde(default)]
    create_dirs: bool,
}

pub struct WriteFileTool {
    definition: ToolDefinition,
}

impl Default for WriteFileTool {
    fn default() -> Self {
        Self {
            definition: ToolDefinition::new(
                WRITE_FILE,
                "Write content to a file. Creates the file if it doesn't exist, or overwrites if it does.",
            )
            .with_parameter(
                ToolParameter::new("path", "Path to the file to write", true).with_type(ParamType::Path),
            )
            .with_parameter(
                ToolParameter::new("content", "Content to write to the file", true)
                    .with_type(ParamType::String),
            )
            .with_parameter(
                ToolParameter::new("create_dirs", "Create parent directories if they don't exist", false)
                    .with_type(ParamType::Boolean),
            ),
        }
    }
}

impl Tool for WriteFileTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn call(&self, args: Arguments, _context: ExecutionContext) -> ToolTask {
        Box::pin(async move {
            let params: WriteFileParams = args.parse()?;
            let path = params.path.as_path();
            if params.create_dirs {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| io_error("create", parent, e))?;
                }
            }
            tokio::fs::write(path, params.content.as_bytes())
                .await
                .map_err(|e| io_error("write", path, e))?;
            Ok(json!({
                "path": path.display().to_string(),
                "bytes_written": params.content.len(),
            }))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ListDirectoryParams {
    path: PathBuf,
    #[serde(default)]
    include_hidden: bool,
}

pub struct ListDirectoryTool {
    definition: ToolDefinition,
}

impl Default for ListDirectoryTool {
    fn default() -> Self {
        Self {
            definition: ToolDefinition::new(LIST_DIRECTORY, "List the entries of a directory")
                .with_parameter(
                    ToolParameter::new("path", "Directory to list", true).with_type(ParamType::Path),
                )
                .with_parameter(
                    ToolParameter::new("include_hidden", "Include dot-files", false)
                        .with_type(ParamType::Boolean),
                ),
        }
    }
}

impl Tool for ListDirectoryTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn call(&self, args: Arguments, _context: ExecutionContext) -> ToolTask {
        Box::pin(async move {
            let params: ListDirectoryParams = args.parse()?;
            list_directory(params).await
        })
    }
}

async fn list_directory(params: ListDirectoryParams) -> Result<Value, ToolError> {
    let path = params.path.as_path();
    let mut dir = tokio::fs::read_dir(path)
        .await
        .map_err(|e| io_error("list", path, e))?;

    let mut entries = Vec::new();
    let mut truncated = false;
    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| io_error("list", path, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !params.include_hidden && name.starts_with('.') {
            continue;
        }
        if entries.len() == MAX_ENTRIES {
            truncated = true;
            break;
        }
        let metadata = entry.metadata().await.ok();
        let kind = match &metadata {
            Some(m) if m.is_dir() => "directory",
            Some(m) if m.is_symlink() => "symlink",
            Some(_) => "file",
            None => "unknown",
        };
        entries.push(json!({
            "name": name,
            "type": kind,
            "size": metadata.map(|m| m.len()).unwrap_or(0),
        }));
    }
    entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

    Ok(json!({
        "path": path.display().to_string(),
        "entries": entries,
        "truncated": truncated,
    }))
}

fn io_error(action: &str, path: &Path, error: std::io::Error) -> ToolError {
    let reason = match error.kind() {
        std::io::ErrorKind::NotFound => "no such file or directory".to_string(),
        std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => error.to_string(),
    };
    ToolError::execution(format!("Failed to {} '{}': {}", action, path.display(), reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strix_domain::{ErrorKind, coerce_arguments};
    use tempfile::tempdir;

    async fn run(tool: &dyn Tool, args: Value) -> Result<Value, ToolError> {
        let raw = serde_json::from_value(args).unwrap();
        let args = coerce_arguments(tool.definition(), &raw)?;
        tool.call(args, ExecutionContext::default()).await
    }

    #[tokio::test]
    async fn test_read_file_with_line_window() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hosts");
        std::fs::write(&path, "a\nb\nc\nd\n").unwrap();

        let tool = ReadFileTool::default();
        let all = run(&tool, json!({"path": path})).await.unwrap();
        assert_eq!(all, json!("a\nb\nc\nd\n"));

        let window = run(&tool, json!({"path": path, "offset": "1", "limit": 2}))
            .await
            .unwrap();
        assert_eq!(window, json!("b\nc"));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_execution_error() {
        let dir = tempdir().unwrap();
        let err = run(&ReadFileTool::default(), json!({"path": dir.path().join("nope")}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExecutionError);
        assert!(err.message.contains("no such file"));
    }

    #[tokio::test]
    async fn test_read_directory_rejected() {
        let dir = tempdir().unwrap();
        let err = run(&ReadFileTool::default(), json!({"path": dir.path()}))
            .await
            .unwrap_err();
        assert!(err.message.contains("is not a file"));
    }

    #[tokio::test]
    async fn test_write_file_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");

        let out = run(
            &WriteFileTool::default(),
            json!({"path": path, "content": "hello", "create_dirs": "true"}),
        )
        .await
        .unwrap();
        assert_eq!(out["bytes_written"], json!(5));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_write_without_parent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing/out.txt");
        let err = run(&WriteFileTool::default(), json!({"path": path, "content": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExecutionError);
    }

    #[tokio::test]
    async fn test_list_directory_sorted_and_hides_dotfiles() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "bb").unwrap();
        std::fs::write(dir.path().join(".secret"), "").unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();

        let tool = ListDirectoryTool::default();
        let out = run(&tool, json!({"path": dir.path()})).await.unwrap();
        let entries = out["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], json!({"name": "a", "type": "directory", "size": entries[0]["size"]}));
        assert_eq!(entries[1]["name"], json!("b.txt"));
        assert_eq!(entries[1]["size"], json!(2));

        let out = run(&tool, json!({"path": dir.path(), "include_hidden": true}))
            .await
            .unwrap();
        assert_eq!(out["entries"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let err = run(&ReadFileTool::default(), json!({})).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArguments);
    }
}
