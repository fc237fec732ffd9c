use anyhow::Result;
use rei_core::policy::Policy;
use rei_core::types::{Role, Tool};
use serde_json::json;

use crate::output::{print_json, print_table};

pub fn run(json: bool) -> Result<()> {
    let policy = Policy::standard();

    if json {
        let table: serde_json::Map<String, serde_json::Value> = Role::all()
            .iter()
            .map(|r| (r.to_string(), json!(policy.allowed_tools(*r))))
            .collect();
        return print_json(&table);
    }

    let rows = Role::all()
        .iter()
        .map(|r| {
            let tools: Vec<&str> = policy.allowed_tools(*r).iter().map(|t| t.as_str()).collect();
            vec![r.to_string(), tools.join(", ")]
        })
        .collect();
    print_table(&["ROLE", "TOOLS"], rows);
    Ok(())
}

/// `help` is answered for every role, so it always reports allow.
pub fn check(role: &str, tool: &str, json: bool) -> Result<()> {
    let role: Role = role.parse()?;
    let tool: Tool = tool.parse()?;
    let allowed = tool == Tool::Help || Policy::standard().is_allowed(role, tool);

    if json {
        print_json(&json!({ "role": role, "tool": tool, "allowed": allowed }))
    } else {
        println!("{}: {role} -> {tool}", if allowed { "allow" } else { "deny" });
        Ok(())
    }
}
