//! Remote file operations.
//!
//! All remote paths pass through the [`PathPolicy`](super::PathPolicy)
//! before they reach a command.

use log::{debug, info};
use serde::Serialize;
use std::path::Path;

use super::policy::{ls_options, shell_quote};
use super::{Cluster, ToolResponse};

/// Largest file `read` returns without a line limit.
pub const MAX_READ_BYTES: u64 = 1024 * 1024;

const DEFAULT_LS_OPTIONS: &str = "-la";
const HEREDOC_DELIMITER: &str = "MCPEOF";

#[derive(Debug, Serialize)]
pub struct ExistsReport {
    pub path: String,
    pub exists: bool,
}

/// Rewrites lines that would end the heredoc early.
pub fn escape_heredoc_body(content: &str) -> String {
    content
        .split('\n')
        .map(|line| {
            if line == "EOF" {
                "E_O_F"
            } else if line == HEREDOC_DELIMITER {
                "MCP_E_O_F"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Cluster {
    pub fn list_directory(&self, path: &str, options: Option<&str>) -> ToolResponse {
        let path = match self.allowed_path(path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };
        let options = match ls_options(options.unwrap_or(DEFAULT_LS_OPTIONS)) {
            Ok(o) => o,
            Err(e) => return e.into(),
        };

        ToolResponse::from_command(&self.run(&format!("ls {} {}", options, shell_quote(&path))))
    }

    /// Reads a file, refusing files over [`MAX_READ_BYTES`] unless only the
    /// last `lines` lines are requested.
    pub fn read_file(&self, path: &str, lines: Option<u32>) -> ToolResponse {
        let path = match self.allowed_path(path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };
        let quoted = shell_quote(&path);

        if let Some(lines) = lines {
            return ToolResponse::from_command(&self.run(&format!("tail -n {} {}", lines, quoted)));
        }

        let size_check = self.run(&format!("stat -c%s {} 2>/dev/null || echo \"0\"", quoted));
        let size: u64 = size_check.stdout.trim().parse().unwrap_or(0);
        debug!("{} is {} bytes", path, size);

        if size > MAX_READ_BYTES {
            return ToolResponse::error(format!(
                "File too large ({:.2} MB). Use 'lines' parameter to read partial content.",
                size as f64 / 1024.0 / 1024.0
            ));
        }

        ToolResponse::from_command(&self.run(&format!("cat {}", quoted)))
    }

    /// Replaces the file at `path` with `content` through a quoted heredoc.
    pub fn write_file(&self, path: &str, content: &str) -> ToolResponse {
        let path = match self.allowed_path(path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };

        let command = format!(
            "cat > {} << '{delim}'\n{}\n{delim}",
            shell_quote(&path),
            escape_heredoc_body(content),
            delim = HEREDOC_DELIMITER
        );
        let result = self.run(&command);
        if !result.is_success() {
            return ToolResponse::from_command(&result);
        }

        info!("Wrote {} bytes to {}", content.len(), path);
        ToolResponse::ok(format!(
            "File written successfully: {} ({} bytes)",
            path,
            content.len()
        ))
    }

    pub fn upload(&self, local_path: &Path, remote_path: &str) -> ToolResponse {
        let remote_path = match self.allowed_path(remote_path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };

        let outcome = self.transfer().upload(local_path, &remote_path);
        if outcome.success {
            ToolResponse::ok(format!(
                "File uploaded: {} -> {}",
                local_path.display(),
                remote_path
            ))
        } else {
            ToolResponse::error(format!("Upload failed: {}", outcome.diagnostic))
        }
    }

    pub fn download(&self, remote_path: &str, local_path: &Path) -> ToolResponse {
        let remote_path = match self.allowed_path(remote_path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };

        let outcome = self.transfer().download(&remote_path, local_path);
        if outcome.success {
            ToolResponse::ok(format!(
                "File downloaded: {} -> {}",
                remote_path,
                local_path.display()
            ))
        } else {
            ToolResponse::error(format!("Download failed: {}", outcome.diagnostic))
        }
    }

    /// True if a regular file exists at `path`. Disallowed paths and
    /// transport failures both read as absent.
    pub fn file_exists(&self, path: &str) -> bool {
        let Ok(path) = self.policy().check(path) else {
            return false;
        };
        let result = self.run(&format!("test -f {} && echo \"exists\"", shell_quote(&path)));
        result.is_success() && result.stdout.contains("exists")
    }

    pub fn exists(&self, path: &str) -> ToolResponse {
        let normalized = match self.allowed_path(path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };
        ToolResponse::json(&ExistsReport {
            exists: self.file_exists(&normalized),
            path: normalized,
        })
    }

    pub fn file_info(&self, path: &str) -> ToolResponse {
        let path = match self.allowed_path(path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };
        ToolResponse::from_command(&self.run(&format!("stat {}", shell_quote(&path))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heredoc_body_escapes_terminators() {
        let body = "line one\nEOF\n  EOF\nMCPEOF\nlast";
        assert_eq!(
            escape_heredoc_body(body),
            "line one\nE_O_F\n  EOF\nMCP_E_O_F\nlast"
        );
    }

    #[test]
    fn test_heredoc_body_unchanged_without_terminators() {
        let body = "#!/bin/bash\n#SBATCH --time=1:00:00\necho $HOME\n";
        assert_eq!(escape_heredoc_body(body), body);
    }
}
