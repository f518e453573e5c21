//! Preflight checks for host tool availability.
//!
//! Validates that required external tools exist before an operation
//! shells out to them. This prevents cryptic mid-build errors.
//!
//! # Example
//!
//! ```rust
//! use iso_staging::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("genisoimage") {
//!     println!("genisoimage not installed");
//! }
//!
//! let tools = &[("genisoimage", "genisoimage")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

/// Check if a command exists in PATH.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// External tools this crate shells out to.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("genisoimage", "genisoimage")];

/// Check that specific tools are available.
///
/// # Arguments
///
/// * `tools` - Slice of (command, package) tuples
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` with list of missing tools and their packages
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let mut missing = Vec::new();

    for (tool, package) in tools {
        if !command_exists(tool) {
            missing.push((*tool, *package));
        }
    }

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check that every tool in [`REQUIRED_TOOLS`] is available.
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        assert!(command_exists("ls"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_check_required_tools_success() {
        let tools = &[("ls", "coreutils"), ("cat", "coreutils")];
        assert!(check_required_tools(tools).is_ok());
    }

    #[test]
    fn test_check_required_tools_failure() {
        let tools = &[("nonexistent_command_xyz", "fake-package")];
        let err = check_required_tools(tools).unwrap_err();
        assert!(err.to_string().contains("nonexistent_command_xyz"));
        assert!(err.to_string().contains("fake-package"));
    }
}
