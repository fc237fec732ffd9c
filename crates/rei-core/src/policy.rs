//! Role-based permission policy.
//!
//! The table is built once at startup and shared read-only. `admin` is not
//! listed in it: the lookup short-circuits for that role, so tools added later
//! are reachable by admins without touching the table.

use std::collections::{HashMap, HashSet};

use crate::types::{Role, Tool};

#[derive(Debug, Clone)]
pub struct Policy {
    rules: HashMap<Role, HashSet<Tool>>,
}

impl Policy {
    /// The fixed team role table.
    pub fn standard() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            Role::Manager,
            HashSet::from([
                Tool::Search,
                Tool::Buyers,
                Tool::Lookup,
                Tool::Skip,
                Tool::Ask,
                Tool::ActivityLog,
            ]),
        );
        rules.insert(
            Role::Acquisitions,
            HashSet::from([Tool::Search, Tool::Lookup, Tool::Skip]),
        );
        rules.insert(Role::Dispositions, HashSet::from([Tool::Buyers, Tool::Lookup]));
        rules.insert(
            Role::Member,
            HashSet::from([Tool::Search, Tool::Lookup, Tool::Ask]),
        );
        Self { rules }
    }

    /// A policy with an explicit table. Roles absent from `rules` are denied
    /// everything except the admin short-circuit.
    pub fn from_rules(rules: HashMap<Role, HashSet<Tool>>) -> Self {
        Self { rules }
    }

    pub fn is_allowed(&self, role: Role, tool: Tool) -> bool {
        if role == Role::Admin {
            return true;
        }
        self.rules
            .get(&role)
            .is_some_and(|tools| tools.contains(&tool))
    }

    /// Tools `role` may invoke, in declaration order.
    pub fn allowed_tools(&self, role: Role) -> Vec<Tool> {
        Tool::all()
            .iter()
            .copied()
            .filter(|t| *t != Tool::Help && self.is_allowed(role, *t))
            .collect()
    }

    /// Roles permitted to invoke `tool`, in declaration order.
    pub fn roles_for(&self, tool: Tool) -> Vec<Role> {
        Role::all()
            .iter()
            .copied()
            .filter(|r| self.is_allowed(*r, tool))
            .collect()
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(role: Role) -> &'static [Tool] {
        match role {
            Role::Admin => &[
                Tool::Lookup,
                Tool::Search,
                Tool::Buyers,
                Tool::Skip,
                Tool::Ask,
                Tool::ActivityLog,
            ],
            Role::Manager => &[
                Tool::Lookup,
                Tool::Search,
                Tool::Buyers,
                Tool::Skip,
                Tool::Ask,
                Tool::ActivityLog,
            ],
            Role::Acquisitions => &[Tool::Lookup, Tool::Search, Tool::Skip],
            Role::Dispositions => &[Tool::Lookup, Tool::Buyers],
            Role::Member => &[Tool::Lookup, Tool::Search, Tool::Ask],
        }
    }

    #[test]
    fn matches_role_table_for_every_pair() {
        let policy = Policy::standard();
        for role in Role::all() {
            for tool in Tool::all() {
                if *tool == Tool::Help && *role != Role::Admin {
                    assert!(!policy.is_allowed(*role, *tool));
                    continue;
                }
                let want = *role == Role::Admin || expected(*role).contains(tool);
                assert_eq!(
                    policy.is_allowed(*role, *tool),
                    want,
                    "role={role} tool={tool}"
                );
            }
        }
    }

    #[test]
    fn lookup_is_deterministic() {
        let policy = Policy::standard();
        for _ in 0..3 {
            assert!(!policy.is_allowed(Role::Member, Tool::Skip));
            assert!(policy.is_allowed(Role::Acquisitions, Tool::Skip));
        }
    }

    #[test]
    fn admin_allowed_even_with_empty_table() {
        let policy = Policy::from_rules(HashMap::new());
        for tool in Tool::all() {
            assert!(policy.is_allowed(Role::Admin, *tool));
        }
    }

    #[test]
    fn missing_rule_fails_closed() {
        let policy = Policy::from_rules(HashMap::new());
        for tool in Tool::all() {
            assert!(!policy.is_allowed(Role::Manager, *tool));
        }
    }

    #[test]
    fn every_tool_has_a_permitted_role() {
        let policy = Policy::standard();
        for tool in Tool::all() {
            assert!(!policy.roles_for(*tool).is_empty(), "{tool} unreachable");
        }
    }

    #[test]
    fn allowed_tools_lists_in_declaration_order() {
        let policy = Policy::standard();
        assert_eq!(
            policy.allowed_tools(Role::Dispositions),
            vec![Tool::Lookup, Tool::Buyers]
        );
        assert!(!policy.allowed_tools(Role::Admin).contains(&Tool::Help));
    }
}
