use std::path::PathBuf;

use crate::{ModuleDescriptor, ModuleLocation, ModuleStatus};

struct StockProblem {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    module: &'static str,
    entry_point: &'static str,
    status: ModuleStatus,
    icon: &'static str,
}

const STOCK_PROBLEMS: &[StockProblem] = &[
    StockProblem {
        id: "p1",
        title: "Problem 1",
        description: "Planning of road and railway routes to be added.",
        module: "modules/nour",
        entry_point: "MainWindow",
        status: ModuleStatus::Complete,
        icon: "screenshots/problem1.png",
    },
    StockProblem {
        id: "p2",
        title: "Problem 2",
        description: "Assign connections without interference.",
        module: "modules/yosr",
        entry_point: "NetworkGUI",
        status: ModuleStatus::Complete,
        icon: "screenshots/problem2.png",
    },
    StockProblem {
        id: "p3",
        title: "Problem 3",
        description: "Optimization of fund transfers between banks/currencies.",
        module: "modules/nour_elhouda",
        entry_point: "MainWindow",
        status: ModuleStatus::Complete,
        icon: "screenshots/problem3.png",
    },
    StockProblem {
        id: "p4",
        title: "Problem 4",
        description: "Determine the minimal number of monitoring nodes required.",
        module: "modules/adem",
        entry_point: "MainWindow",
        status: ModuleStatus::Complete,
        icon: "screenshots/problem4.png",
    },
    StockProblem {
        id: "p5",
        title: "Problem 5",
        description: "Blending optimization with a minimal ingredient count.",
        module: "modules/slim",
        entry_point: "MainWindow",
        status: ModuleStatus::Incomplete,
        icon: "screenshots/problem5.png",
    },
    StockProblem {
        id: "hello",
        title: "Sample Problem",
        description: "Reference module showing the hosting contract.",
        module: "builtin:hello",
        entry_point: "HelloWindow",
        status: ModuleStatus::Complete,
        icon: "screenshots/hello.png",
    },
];

/// Descriptor table used when no descriptor file is configured.
///
/// Library locations are relative; callers anchor them at the dashboard's
/// install directory with [`ModuleLocation::rebased`].
pub fn stock_problems() -> Vec<ModuleDescriptor> {
    STOCK_PROBLEMS
        .iter()
        .map(|problem| {
            let location = problem
                .module
                .parse()
                .unwrap_or_else(|_| ModuleLocation::Library(PathBuf::from(problem.module)));
            ModuleDescriptor::new(problem.id, problem.title, location, problem.entry_point)
                .with_description(problem.description)
                .with_status(problem.status)
                .with_icon(problem.icon)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleRegistry;

    #[test]
    fn stock_table_has_unique_ids() {
        let registry = ModuleRegistry::from_descriptors(stock_problems()).unwrap();
        assert_eq!(registry.len(), STOCK_PROBLEMS.len());
        assert_eq!(
            registry.get("hello").unwrap().module_location,
            ModuleLocation::Builtin("hello".into())
        );
    }
}
