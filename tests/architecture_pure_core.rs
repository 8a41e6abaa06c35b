use std::fs;
use std::path::{Path, PathBuf};

/// Simulation and learning code; file and console I/O belongs to the
/// training, data and CLI layers.
const PURE_DIRS: &[&str] = &[
    "src/rl/core",
    "src/rl/features",
    "src/rl/environment",
    "src/rl/agent",
];

const FORBIDDEN: &[&str] = &["std::fs", "File::", "println!", "eprintln!", "csv::"];

fn collect_rust_files(root: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rust_files(&path, out);
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

/// Source before the first test module
fn non_test_source(content: &str) -> &str {
    content
        .find("#[cfg(test)]")
        .map(|idx| &content[..idx])
        .unwrap_or(content)
}

fn rust_files_under(dirs: &[&str]) -> (PathBuf, Vec<PathBuf>) {
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    for dir in dirs {
        collect_rust_files(&repo_root.join(dir), &mut files);
    }
    (repo_root, files)
}

#[test]
fn simulation_core_performs_no_io() {
    let (repo_root, files) = rust_files_under(PURE_DIRS);
    assert!(!files.is_empty());

    let mut offenders = Vec::new();
    for file in files {
        let rel = file
            .strip_prefix(&repo_root)
            .unwrap_or(&file)
            .to_string_lossy()
            .replace('\\', "/");
        let content = fs::read_to_string(&file).unwrap_or_default();
        for (idx, line) in non_test_source(&content).lines().enumerate() {
            if FORBIDDEN.iter().any(|pattern| line.contains(pattern)) {
                offenders.push(format!("{}:{}: {}", rel, idx + 1, line.trim()));
            }
        }
    }

    assert!(
        offenders.is_empty(),
        "I/O found in simulation core:\n{}",
        offenders.join("\n")
    );
}

#[test]
fn library_code_does_not_unwrap() {
    let (repo_root, mut files) = rust_files_under(&["src/rl"]);
    for single in ["src/cli.rs", "src/config.rs", "src/error.rs"] {
        files.push(repo_root.join(single));
    }

    let mut offenders = Vec::new();
    for file in files {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for (idx, line) in non_test_source(&content).lines().enumerate() {
            if line.contains(".unwrap()") || line.contains(".expect(") {
                offenders.push(format!("{}:{}: {}", file.display(), idx + 1, line.trim()));
            }
        }
    }

    assert!(
        offenders.is_empty(),
        "unwrap/expect in library code:\n{}",
        offenders.join("\n")
    );
}
