//! Hygiene: coding standards enforced at test time.
//!
//! Scans the library source tree (test files excluded) for patterns that
//! crash, silently drop errors, or bypass `tracing`. Each pattern has a
//! budget. A new occurrence means removing an old one first; budgets only
//! shrink.

use std::fs;
use std::path::Path;

struct Budget {
    pattern: &'static str,
    max: usize,
    why: &'static str,
}

const BUDGETS: &[Budget] = &[
    // Panics
    Budget { pattern: ".unwrap()", max: 0, why: "panics" },
    Budget { pattern: ".expect(", max: 0, why: "panics" },
    Budget { pattern: "panic!(", max: 0, why: "panics" },
    Budget { pattern: "unreachable!(", max: 0, why: "panics" },
    Budget { pattern: "todo!(", max: 0, why: "unfinished" },
    Budget { pattern: "unimplemented!(", max: 0, why: "unfinished" },
    // Silent loss
    Budget { pattern: "let _ =", max: 0, why: "discards a result unread" },
    Budget { pattern: ".ok()", max: 3, why: "drops an error" },
    // Output goes through tracing
    Budget { pattern: "println!(", max: 0, why: "bypasses tracing" },
    Budget { pattern: "eprintln!(", max: 0, why: "bypasses tracing" },
    Budget { pattern: "dbg!(", max: 0, why: "debug leftover" },
    // Structure
    Budget { pattern: "#[allow(dead_code)]", max: 0, why: "hides unused code" },
];

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect(Path::new("src"), &mut files);
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|f| {
            let count = f.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (f.path.clone(), count))
        })
        .collect()
}

#[test]
fn source_tree_is_found() {
    assert!(!source_files().is_empty(), "no sources under src/; run from the crate root");
}

#[test]
fn pattern_budgets() {
    let files = source_files();
    let mut failures = Vec::new();
    for budget in BUDGETS {
        let found = hits(&files, budget.pattern);
        let total: usize = found.iter().map(|(_, c)| c).sum();
        if total > budget.max {
            let detail: Vec<String> = found.iter().map(|(p, c)| format!("    {p}: {c}")).collect();
            failures.push(format!(
                "`{}` ({}) found {total}, max {}\n{}",
                budget.pattern,
                budget.why,
                budget.max,
                detail.join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "budgets exceeded:\n{}", failures.join("\n"));
}

#[test]
fn every_sibling_test_file_is_wired() {
    let Ok(entries) = fs::read_dir("src") else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(stem) = name.strip_suffix("_test.rs") else {
            continue;
        };
        let module = format!("src/{stem}.rs");
        let content = fs::read_to_string(&module).unwrap_or_default();
        assert!(
            content.contains(&format!("#[path = \"{name}\"]")),
            "{name} exists but {module} does not declare it"
        );
    }
}
