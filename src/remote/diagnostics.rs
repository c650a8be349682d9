//! Diagnostic utilities for connection failures.
//!
//! This module turns the stderr of a failed connection probe into an error
//! message with remediation steps. The session manager never performs an
//! interactive step itself, so the suggestions tell the user what to do out
//! of band before retrying.

use crate::remote::session::SessionIdentity;

/// Analyzes a failed connection probe and provides troubleshooting steps.
///
/// # Arguments
///
/// * `stderr` - The stderr of the probe (or a description of the failure)
/// * `identity` - The session that was being connected
///
/// # Returns
///
/// A multi-line message listing the failure and the suggested remediation
pub fn diagnose_connect_failure(stderr: &str, identity: &SessionIdentity) -> String {
    let lower = stderr.to_lowercase();
    let mut suggestions = Vec::new();

    // ssh binary itself missing
    if lower.contains("failed to start") {
        suggestions.push(format!(
            "• The ssh client could not be started ({})",
            identity.ssh_program.display()
        ));
        suggestions.push("• Install OpenSSH or check that ssh is on PATH".to_string());
    }

    // Credential problems
    if lower.contains("permission denied")
        || lower.contains("publickey")
        || lower.contains("no such identity")
        || lower.contains("identity file")
    {
        suggestions.push(format!(
            "• Ensure SSH key exists: {}",
            identity.identity_file.display()
        ));
        suggestions.push("• Verify the key has correct permissions (chmod 600)".to_string());
        suggestions.push(format!(
            "• Verify the public key is registered for {} on {}",
            identity.user, identity.host
        ));
    }

    // Second factor needed, which batch mode cannot answer
    if lower.contains("keyboard-interactive")
        || lower.contains("verification code")
        || lower.contains("duo")
        || lower.contains("passcode")
    {
        suggestions.push(format!(
            "• Complete the MFA prompt once in a terminal: ssh -p {} {}",
            identity.port,
            identity.destination()
        ));
        suggestions.push(
            "• The control master then stays open and later commands reuse it".to_string(),
        );
    }

    // Network problems
    if lower.contains("connection refused")
        || lower.contains("timed out")
        || lower.contains("no route to host")
        || lower.contains("network is unreachable")
        || lower.contains("could not resolve")
    {
        suggestions.push(format!("• Verify the host '{}' is reachable", identity.host));
        suggestions.push(format!(
            "• Check that SSH answers on port {} and that a VPN is active if required",
            identity.port
        ));
    }

    if lower.contains("host key") {
        suggestions.push(
            "• The host key changed; verify it and update ~/.ssh/known_hosts".to_string(),
        );
    }

    if suggestions.is_empty() {
        suggestions.push(format!(
            "• Ensure SSH key exists: {}",
            identity.identity_file.display()
        ));
        suggestions.push("• Complete MFA if prompted, then connect again".to_string());
        suggestions.push(format!(
            "• Test the connection manually: ssh -p {} {}",
            identity.port,
            identity.destination()
        ));
    }

    let reason = if stderr.trim().is_empty() {
        "no diagnostic output from ssh"
    } else {
        stderr.trim()
    };

    format!(
        "Connection to {} failed: {}\n\nTroubleshooting:\n{}",
        identity.connection_string(),
        reason,
        suggestions.join("\n")
    )
}
