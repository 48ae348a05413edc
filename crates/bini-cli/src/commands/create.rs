//! `bini create`: scaffold a new project.

use crate::cli::CreateArgs;
use crate::commands::templates::{self, Language, ProjectOptions, Styling};
use crate::commands::utils;
use crate::error::{Result, ResultExt, ScaffoldError};
use crate::plugins::MetaTagsPlugin;
use crate::ui;
use bini_router::RouterConfig;
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Execute the create command in the current directory.
pub async fn execute(args: CreateArgs) -> Result<()> {
    let cwd = utils::get_cwd()?;
    create_in(&cwd, &args).map(|_| ())
}

/// Create the project below `base` and return its directory.
///
/// # Process
///
/// 1. Resolve the target directory, removing it first under `--force`
/// 2. Write every template file
/// 3. Generate the router file from the new `src/app`
/// 4. Print next steps
pub fn create_in(base: &Path, args: &CreateArgs) -> Result<PathBuf> {
    let opts = ProjectOptions {
        name: args.name.clone(),
        language: if args.use_typescript() {
            Language::TypeScript
        } else {
            Language::JavaScript
        },
        styling: if args.tailwind {
            Styling::Tailwind
        } else if args.css_modules {
            Styling::CssModules
        } else {
            Styling::Plain
        },
        minimal: args.minimal,
    };

    let project_dir = base.join(&opts.name);
    if project_dir.exists() {
        if !args.force {
            return Err(ScaffoldError::DirectoryExists(PathBuf::from(&opts.name)).into());
        }
        safe_remove(&project_dir, base)?;
        ui::info(&format!("Removed existing directory {}", opts.name));
    }

    ui::info(&format!(
        "Creating {} ({}, {})",
        opts.name.bold(),
        match opts.language {
            Language::TypeScript => "TypeScript",
            Language::JavaScript => "JavaScript",
        },
        opts.styling.name()
    ));

    let files = templates::project_files(&opts);
    let progress = ui::ScaffoldProgress::new(files.len() as u64 + 1);

    for file in &files {
        let path = project_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }
        fs::write(&path, &file.contents).context(format!("Failed to write {}", file.path))?;
        progress.file_written(&file.path);
    }

    let mut router = RouterConfig::new(&project_dir);
    if opts.language == Language::TypeScript {
        router = router.with_router_file("src/App.tsx");
    }
    let (router_path, _) = bini_router::write_router(&router)?;
    let router_rel = router_path
        .strip_prefix(&project_dir)
        .unwrap_or(&router_path)
        .display()
        .to_string();
    progress.file_written(&router_rel);
    MetaTagsPlugin::new(&router).write()?;
    progress.finish();

    tracing::debug!("Wrote {} files to {}", files.len() + 1, project_dir.display());
    ui::success(&format!("Created {} files in {}", files.len() + 1, opts.name));
    print_next_steps(&opts.name);

    Ok(project_dir)
}

/// Remove an existing project directory for `--force`.
///
/// Only strict descendants of `base` are removed, and never a filesystem
/// root or a directory fewer than three components deep.
pub fn safe_remove(path: &Path, base: &Path) -> Result<()> {
    let refuse = |reason: &str| -> Result<()> {
        Err(ScaffoldError::UnsafeRemoval {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
        .into())
    };

    if path.components().any(|c| c == Component::ParentDir) {
        return refuse("path contains '..'");
    }
    if path == base {
        return refuse("it is the current directory");
    }
    if !path.starts_with(base) {
        return refuse("it is outside the current directory");
    }
    if path.parent().is_none() || path.components().count() < 3 {
        return refuse("it is too close to the filesystem root");
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        if path == home {
            return refuse("it is the home directory");
        }
    }

    fs::remove_dir_all(path).with_path(path)?;
    Ok(())
}

fn print_next_steps(name: &str) {
    eprintln!();
    eprintln!("{}", "Next steps:".bold());
    eprintln!("  {} {}", "cd".cyan(), name);
    eprintln!("  {}", "npm install".cyan());
    eprintln!("  {}", "npm run dev".cyan());
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(name: &str) -> CreateArgs {
        CreateArgs {
            name: name.to_string(),
            typescript: false,
            javascript: false,
            tailwind: false,
            css_modules: false,
            force: false,
            minimal: false,
        }
    }

    #[test]
    fn test_create_writes_router_from_pages() {
        let temp = TempDir::new().unwrap();
        let dir = create_in(temp.path(), &args("site")).unwrap();

        let router = fs::read_to_string(dir.join("src/App.jsx")).unwrap();
        assert!(router.contains(r#"<Route path="/" "#));
        assert!(dir.join("src/app/page.jsx").exists());
        assert!(dir.join("bini.config.json").exists());
    }

    #[test]
    fn test_create_fills_head_from_layout_metadata() {
        let temp = TempDir::new().unwrap();
        let dir = create_in(temp.path(), &args("meta-site")).unwrap();

        let html = fs::read_to_string(dir.join("index.html")).unwrap();
        assert!(html.contains("<title>Bini.js App</title>"));
        assert!(html.contains(r#"<meta name="viewport""#));
        assert!(html.contains("<!-- /BINI_META_TAGS -->"));
    }

    #[test]
    fn test_typescript_project_gets_tsx_router() {
        let temp = TempDir::new().unwrap();
        let mut a = args("ts-site");
        a.typescript = true;
        let dir = create_in(temp.path(), &a).unwrap();

        assert!(dir.join("src/App.tsx").exists());
        assert!(!dir.join("src/App.jsx").exists());
    }

    #[test]
    fn test_existing_directory_requires_force() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("taken")).unwrap();
        fs::write(temp.path().join("taken/stale.txt"), "old").unwrap();

        let err = create_in(temp.path(), &args("taken")).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let mut forced = args("taken");
        forced.force = true;
        let dir = create_in(temp.path(), &forced).unwrap();
        assert!(!dir.join("stale.txt").exists());
        assert!(dir.join("package.json").exists());
    }

    #[test]
    fn test_safe_remove_refusals() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();

        assert!(safe_remove(base, base).is_err());
        assert!(safe_remove(Path::new("/"), base).is_err());
        assert!(safe_remove(&base.join("../outside"), base).is_err());

        let inner = base.join("inner");
        fs::create_dir(&inner).unwrap();
        safe_remove(&inner, base).unwrap();
        assert!(!inner.exists());
    }
}
