use std::path::{Path, PathBuf};

use crate::config::DirectoryConfig;
use crate::fs::{DirEntry, EntryKind, FileSystem, normalize_lexical};
use crate::links::verify::is_missing;
use crate::report::{PointerProblem, ValidationError, ValidationReport};
use crate::workspace::{display_relative, is_within};

/// A symlink found in a state directory together with its resolved target.
struct StateLink<'c> {
    state: &'c str,
    resolved: PathBuf,
}

/// Verifies that every catalog entry of `config` has exactly one valid
/// state symlink, and that the current pointer (if any) is usable.
///
/// Errors are reported in this order: current pointer, catalog entries
/// (missing or multiple links), then state-directory entries.
pub fn check_states(fs: &dyn FileSystem, root: &Path, config: &DirectoryConfig) -> ValidationReport {
    let mut report = ValidationReport::new();
    let catalog_dir = config.catalog_dir(root);
    let catalog_real = fs
        .canonicalize(&catalog_dir)
        .unwrap_or_else(|_| normalize_lexical(&catalog_dir));

    if let Some(pointer) = &config.current_pointer {
        if let Some(error) = check_current_pointer(fs, root, &catalog_real, config, pointer) {
            report.push(error);
        }
    }

    let mut links = Vec::new();
    let mut entry_errors = Vec::new();
    for (state, dir) in config.state_dirs(root) {
        let entries = match list_dir(fs, root, &dir) {
            Ok(entries) => entries,
            Err(error) => {
                entry_errors.push(error);
                continue;
            }
        };

        for entry in entries {
            if !config.matches_extension(&entry.path) {
                continue;
            }
            let shown = display_relative(root, &entry.path);
            if entry.kind != EntryKind::Symlink {
                entry_errors.push(ValidationError::NotASymlink {
                    link: shown,
                    type_name: config.type_name.clone(),
                });
                continue;
            }

            match fs.canonicalize(&entry.path) {
                Ok(resolved) => {
                    if !is_within(&resolved, &catalog_real) {
                        entry_errors.push(ValidationError::InvalidLink {
                            link: shown,
                            type_name: config.type_name.clone(),
                            resolved: resolved.display().to_string(),
                        });
                    }
                    links.push(StateLink { state, resolved });
                }
                Err(err) if is_missing(&err) => {
                    entry_errors.push(ValidationError::BrokenLink {
                        document: shown,
                        target: raw_target(fs, &entry.path),
                        resolved: dangling_target(fs, &entry.path),
                    });
                }
                Err(err) => {
                    entry_errors.push(ValidationError::ResolutionError {
                        document: shown,
                        target: raw_target(fs, &entry.path),
                        cause: err.to_string(),
                    });
                }
            }
        }
    }

    match list_dir(fs, root, &catalog_dir) {
        Ok(entries) => {
            for entry in entries {
                if !config.matches_extension(&entry.path) {
                    continue;
                }
                if entry.kind != EntryKind::File {
                    if entry.kind == EntryKind::Symlink {
                        tracing::debug!(
                            entry = %entry.path.display(),
                            "skipping symlink in catalog directory"
                        );
                    }
                    continue;
                }
                if entry
                    .file_name()
                    .is_some_and(|name| config.exempt.contains(name))
                {
                    continue;
                }
                report.checked += 1;
                if let Some(error) = check_entry(fs, root, &entry, &links) {
                    report.push(error);
                }
            }
        }
        Err(error) => report.push(error),
    }

    report.extend(entry_errors);
    tracing::info!(
        type_name = %config.type_name,
        entries = report.checked,
        state_links = links.len(),
        errors = report.errors.len(),
        "state check finished"
    );
    report.finalize()
}

fn check_entry(
    fs: &dyn FileSystem,
    root: &Path,
    entry: &DirEntry,
    links: &[StateLink<'_>],
) -> Option<ValidationError> {
    let shown = display_relative(root, &entry.path);
    let real = match fs.canonicalize(&entry.path) {
        Ok(real) => real,
        Err(err) => {
            return Some(ValidationError::ResolutionError {
                document: shown.clone(),
                target: shown,
                cause: err.to_string(),
            });
        }
    };

    // one state per link, in declaration order since links are gathered state by state
    let states: Vec<String> = links
        .iter()
        .filter(|link| link.resolved == real)
        .map(|link| link.state.to_string())
        .collect();

    match states.len() {
        0 => Some(ValidationError::MissingLink { entry: shown }),
        1 => None,
        _ => Some(ValidationError::MultipleLinks {
            entry: shown,
            states,
        }),
    }
}

fn check_current_pointer(
    fs: &dyn FileSystem,
    root: &Path,
    catalog_real: &Path,
    config: &DirectoryConfig,
    pointer: &Path,
) -> Option<ValidationError> {
    let path = root.join(pointer);
    let problem = match fs.entry_kind(&path) {
        Err(err) if is_missing(&err) => Some(PointerProblem::Missing),
        Err(err) => Some(PointerProblem::Unresolvable {
            cause: err.to_string(),
        }),
        Ok(EntryKind::Symlink) => match fs.canonicalize(&path) {
            Ok(resolved) if is_within(&resolved, catalog_real) => None,
            Ok(resolved) => Some(PointerProblem::OutsideCatalog {
                type_name: config.type_name.clone(),
                resolved: resolved.display().to_string(),
            }),
            Err(err) if is_missing(&err) => Some(PointerProblem::Broken {
                resolved: dangling_target(fs, &path),
            }),
            Err(err) => Some(PointerProblem::Unresolvable {
                cause: err.to_string(),
            }),
        },
        Ok(_) => Some(PointerProblem::NotASymlink),
    };

    problem.map(|problem| ValidationError::CurrentPointer {
        pointer: display_relative(root, &path),
        problem,
    })
}

/// Lists `dir`; a missing directory counts as empty.
fn list_dir(fs: &dyn FileSystem, root: &Path, dir: &Path) -> Result<Vec<DirEntry>, ValidationError> {
    match fs.read_dir(dir) {
        Ok(entries) => Ok(entries),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "directory missing; treating as empty");
            Ok(Vec::new())
        }
        Err(err) => {
            let shown = display_relative(root, dir);
            Err(ValidationError::ResolutionError {
                document: shown.clone(),
                target: shown,
                cause: err.to_string(),
            })
        }
    }
}

fn raw_target(fs: &dyn FileSystem, link: &Path) -> String {
    fs.read_link(link)
        .map(|target| target.display().to_string())
        .unwrap_or_default()
}

/// Where a dangling symlink points, collapsed lexically from its directory.
fn dangling_target(fs: &dyn FileSystem, link: &Path) -> String {
    let target = match fs.read_link(link) {
        Ok(target) => target,
        Err(_) => return link.display().to_string(),
    };
    let base = link.parent().unwrap_or_else(|| Path::new("/"));
    normalize_lexical(&base.join(target)).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeRegistry;
    use crate::fs::MemoryFileSystem;

    fn tasks() -> DirectoryConfig {
        TypeRegistry::builtin().get("tasks").unwrap().clone()
    }

    /// `a.md` active, `b.md` done, pointer at `a.md`.
    fn healthy_tasks() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/repo/.git")
            .add_file("/repo/tasks/a.md", "a")
            .add_file("/repo/tasks/b.md", "b")
            .add_symlink("/repo/tasks/active/a.md", "../a.md")
            .add_symlink("/repo/tasks/done/b.md", "../b.md")
            .add_symlink("/repo/CURRENT_TASK.md", "tasks/a.md");
        for state in ["new", "paused", "cancelled"] {
            fs.add_dir(format!("/repo/tasks/{state}"));
        }
        fs
    }

    fn run(fs: &MemoryFileSystem, config: &DirectoryConfig) -> ValidationReport {
        check_states(fs, Path::new("/repo"), config)
    }

    #[test]
    fn healthy_repository_has_no_errors() {
        let report = run(&healthy_tasks(), &tasks());
        assert!(report.is_ok(), "{}", report.render());
        assert_eq!(report.checked, 2);
    }

    #[test]
    fn duplicate_state_link_reports_multiple_links_in_declaration_order() {
        let fs = healthy_tasks();
        fs.add_symlink("/repo/tasks/new/b.md", "../b.md");

        let report = run(&fs, &tasks());
        assert_eq!(
            report.errors,
            vec![ValidationError::MultipleLinks {
                entry: "tasks/b.md".into(),
                states: vec!["new".into(), "done".into()],
            }]
        );
    }

    #[test]
    fn two_links_in_one_state_are_both_listed() {
        let fs = healthy_tasks();
        fs.add_symlink("/repo/tasks/active/alias.md", "../a.md");

        let report = run(&fs, &tasks());
        assert_eq!(
            report.errors,
            vec![ValidationError::MultipleLinks {
                entry: "tasks/a.md".into(),
                states: vec!["active".into(), "active".into()],
            }]
        );
        assert_eq!(
            report.render(),
            "tasks/a.md: Multiple links: linked in multiple states: active, active"
        );
    }

    #[test]
    fn catalog_symlinks_are_not_entries() {
        let fs = healthy_tasks();
        fs.add_symlink("/repo/tasks/shortcut.md", "a.md");

        let report = run(&fs, &tasks());
        assert!(report.is_ok(), "{}", report.render());
        assert_eq!(report.checked, 2);
    }

    #[test]
    fn unlinked_entry_reports_missing_link() {
        let fs = healthy_tasks();
        fs.add_file("/repo/tasks/c.md", "c");

        let report = run(&fs, &tasks());
        assert_eq!(
            report.errors,
            vec![ValidationError::MissingLink {
                entry: "tasks/c.md".into()
            }]
        );
    }

    #[test]
    fn plain_file_in_state_dir_is_not_a_symlink_and_not_counted() {
        let fs = healthy_tasks();
        fs.add_file("/repo/tasks/paused/a.md", "copy");

        let report = run(&fs, &tasks());
        assert_eq!(
            report.errors,
            vec![ValidationError::NotASymlink {
                link: "tasks/paused/a.md".into(),
                type_name: "tasks".into(),
            }]
        );
    }

    #[test]
    fn dangling_state_link_is_broken() {
        let fs = healthy_tasks();
        fs.add_symlink("/repo/tasks/active/broken.md", "../nonexistent.md");

        let report = run(&fs, &tasks());
        assert_eq!(
            report.errors,
            vec![ValidationError::BrokenLink {
                document: "tasks/active/broken.md".into(),
                target: "../nonexistent.md".into(),
                resolved: "/repo/tasks/nonexistent.md".into(),
            }]
        );
    }

    #[test]
    fn state_link_outside_catalog_is_invalid() {
        let fs = healthy_tasks();
        fs.add_file("/repo/notes/x.md", "x")
            .add_file("/repo/tasks-archive/y.md", "y")
            .add_symlink("/repo/tasks/done/x.md", "../../notes/x.md")
            .add_symlink("/repo/tasks/done/y.md", "../../tasks-archive/y.md");

        let report = run(&fs, &tasks());
        let categories: Vec<_> = report.errors.iter().map(ValidationError::category).collect();
        assert_eq!(categories, vec!["Invalid link", "Invalid link"]);
    }

    #[test]
    fn current_pointer_problems_are_reported_once() {
        let config = tasks();

        let fs = healthy_tasks();
        fs.remove("/repo/CURRENT_TASK.md");
        assert_eq!(
            run(&fs, &config).errors,
            vec![ValidationError::CurrentPointer {
                pointer: "CURRENT_TASK.md".into(),
                problem: PointerProblem::Missing,
            }]
        );

        fs.add_file("/repo/CURRENT_TASK.md", "not a link");
        assert_eq!(
            run(&fs, &config).errors,
            vec![ValidationError::CurrentPointer {
                pointer: "CURRENT_TASK.md".into(),
                problem: PointerProblem::NotASymlink,
            }]
        );

        fs.add_symlink("/repo/CURRENT_TASK.md", "tasks/zzz.md");
        assert_eq!(
            run(&fs, &config).errors,
            vec![ValidationError::CurrentPointer {
                pointer: "CURRENT_TASK.md".into(),
                problem: PointerProblem::Broken {
                    resolved: "/repo/tasks/zzz.md".into()
                },
            }]
        );

        fs.add_file("/repo/README.md", "readme")
            .add_symlink("/repo/CURRENT_TASK.md", "README.md");
        let errors = run(&fs, &config).errors;
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::CurrentPointer {
                problem: PointerProblem::OutsideCatalog { .. },
                ..
            }
        ));
    }

    #[test]
    fn pointer_may_target_entry_through_state_link() {
        let fs = healthy_tasks();
        fs.add_symlink("/repo/CURRENT_TASK.md", "tasks/active/a.md");
        assert!(run(&fs, &tasks()).is_ok());
    }

    #[test]
    fn exempt_files_and_other_extensions_are_ignored() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/repo/tweets/README.md", "about")
            .add_file("/repo/tweets/t1.md", "t1")
            .add_file("/repo/tweets/notes.txt", "scratch")
            .add_symlink("/repo/tweets/queued/t1.md", "../t1.md");
        let tweets = TypeRegistry::builtin().get("tweets").unwrap().clone();

        let report = run(&fs, &tweets);
        assert!(report.is_ok(), "{}", report.render());
        assert_eq!(report.checked, 1);
    }

    #[test]
    fn missing_directories_are_treated_as_empty() {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/repo/.git");
        let config = DirectoryConfig::new("bugs", &["open", "fixed"]);
        assert!(run(&fs, &config).is_ok());
    }

    #[test]
    fn errors_follow_pointer_entry_state_order() {
        let fs = healthy_tasks();
        fs.remove("/repo/CURRENT_TASK.md");
        fs.add_file("/repo/tasks/c.md", "c")
            .add_file("/repo/tasks/new/stray.md", "stray");

        let report = run(&fs, &tasks());
        let categories: Vec<_> = report.errors.iter().map(ValidationError::category).collect();
        assert_eq!(
            categories,
            vec!["Current pointer error", "Missing link", "Not a symlink"]
        );
    }
}
