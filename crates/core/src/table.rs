//! The four migrated tables and the order they must be written in.

use std::fmt;

use crate::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Users,
    Characters,
    Campaigns,
    Sessions,
}

impl Table {
    /// Table name, identical in source and destination.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Characters => "characters",
            Self::Campaigns => "campaigns",
            Self::Sessions => "sessions",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table together with the tables its foreign keys point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub table: Table,
    pub depends_on: &'static [Table],
}

/// Foreign-key graph of the Aedelore schema, in preferred order.
pub const MIGRATION_PLAN: &[TableSpec] = &[
    TableSpec { table: Table::Users, depends_on: &[] },
    TableSpec { table: Table::Characters, depends_on: &[Table::Users] },
    TableSpec { table: Table::Campaigns, depends_on: &[Table::Users] },
    TableSpec { table: Table::Sessions, depends_on: &[Table::Campaigns, Table::Users] },
];

/// Order tables so every table comes after the tables it depends on.
///
/// Stable: among tables whose dependencies are satisfied, the one listed
/// first in `plan` goes first.
pub fn migration_order(plan: &[TableSpec]) -> Result<Vec<Table>> {
    for (i, spec) in plan.iter().enumerate() {
        if plan[..i].iter().any(|s| s.table == spec.table) {
            return Err(CoreError::DuplicateTable { table: spec.table });
        }
        if let Some(&dependency) =
            spec.depends_on.iter().find(|d| !plan.iter().any(|s| s.table == **d))
        {
            return Err(CoreError::UnknownDependency { table: spec.table, dependency });
        }
    }

    let mut ordered: Vec<Table> = Vec::with_capacity(plan.len());
    while ordered.len() < plan.len() {
        let next = plan.iter().find(|spec| {
            !ordered.contains(&spec.table)
                && spec.depends_on.iter().all(|d| ordered.contains(d))
        });
        match next {
            Some(spec) => ordered.push(spec.table),
            None => {
                let stuck = plan
                    .iter()
                    .find(|spec| !ordered.contains(&spec.table))
                    .map(|spec| spec.table);
                // Loop condition guarantees at least one table is left.
                return Err(CoreError::DependencyCycle(stuck.unwrap_or(Table::Users)));
            },
        }
    }
    Ok(ordered)
}
