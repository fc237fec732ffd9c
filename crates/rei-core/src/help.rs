use crate::policy::Policy;
use crate::types::{Role, Tool};

pub const COMMAND_PREFIX: &str = "/rei";

/// Render the command reference shown by `help`.
///
/// Every role sees the same text. Tools not open to every role carry the
/// list of roles that may run them.
pub fn render(policy: &Policy) -> String {
    let mut out = String::from("*REI Nationwide Commands*\n");
    for tool in Tool::all().iter().filter(|t| **t != Tool::Help) {
        out.push_str(&format!(
            "• `{COMMAND_PREFIX} {}` - {}",
            tool.usage(),
            tool.description()
        ));
        let roles = policy.roles_for(*tool);
        if roles.len() < Role::all().len() {
            let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
            out.push_str(&format!(" ({})", names.join(", ")));
        }
        out.push('\n');
    }
    out.push_str("\n*Examples:*\n");
    for example in Tool::all().iter().filter_map(|t| t.example()) {
        out.push_str(&format!("`{COMMAND_PREFIX} {example}`\n"));
    }
    out
}

/// One-line hint appended to unknown-command replies.
pub fn hint() -> String {
    format!("Use `{COMMAND_PREFIX} help` to see available commands.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_invocable_tool() {
        let text = render(&Policy::standard());
        for tool in Tool::all().iter().filter(|t| **t != Tool::Help) {
            assert!(text.contains(tool.usage()), "missing {tool}");
        }
    }

    #[test]
    fn annotates_restricted_tools() {
        let text = render(&Policy::standard());
        let skip_line = text
            .lines()
            .find(|l| l.contains("skip [address]"))
            .unwrap();
        assert!(skip_line.contains("(admin, manager, acquisitions)"));
        let lookup_line = text
            .lines()
            .find(|l| l.contains("lookup [address]"))
            .unwrap();
        assert!(!lookup_line.contains('('));
    }
}
