//! Egg-style packaging lifecycle used by `extforge develop`.
//!
//! Writes `.egg-info` metadata into the source tree, namespace `-nspkg.pth`
//! and `easy-install.pth` entries into the install directory, and hands
//! package installation to the interpreter's `pip`. On a dry run every
//! step logs what it would do and writes nothing.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::manifest::{Project, MANIFEST_NAME};
use crate::ops::develop::Lifecycle;
use crate::util::fs::{display_relative, glob_files, read_to_string, write_string};
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Lifecycle operations for an egg-link based editable install.
#[derive(Debug)]
pub struct EggLifecycle<'a, R> {
    project: &'a Project,
    python: PathBuf,
    install_dir: PathBuf,
    dry_run: bool,
    runner: R,
}

impl<'a, R: CommandRunner> EggLifecycle<'a, R> {
    pub fn new(project: &'a Project, python: PathBuf, install_dir: PathBuf, runner: R) -> Self {
        EggLifecycle {
            project,
            python,
            install_dir,
            dry_run: false,
            runner,
        }
    }

    /// Log instead of writing or installing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if self.dry_run {
            tracing::info!("would write {}", path.display());
            return Ok(());
        }
        tracing::debug!("writing {}", path.display());
        write_string(path, contents)
    }

    fn pip_install<I, S>(&mut self, what: &str, specs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let cmd = ProcessBuilder::new(&self.python)
            .args(["-m", "pip", "install"])
            .args(specs)
            .cwd(self.project.root());

        if self.dry_run {
            tracing::info!("would run `{}`", cmd.display_command());
            return Ok(());
        }

        tracing::info!("Installing {}", what);
        let status = self
            .runner
            .run(&cmd)
            .with_context(|| format!("failed to run `{}`", cmd.display_command()))?;
        if !status.success() {
            bail!(
                "`{}` failed with exit code {:?}",
                cmd.display_command(),
                status.code()
            );
        }
        Ok(())
    }

    /// Top-level import names shipped by the distribution.
    fn top_level(&self) -> BTreeSet<String> {
        let manifest = self.project.manifest();
        manifest
            .package
            .packages
            .iter()
            .chain(manifest.extensions.iter().map(|e| &e.name))
            .filter_map(|name| name.split('.').next())
            .map(str::to_string)
            .collect()
    }

    /// Files recorded in `SOURCES.txt`, relative to the project root.
    fn sources(&self) -> Result<Vec<String>> {
        let root = self.project.root();
        let mut files = vec![MANIFEST_NAME.to_string()];

        for package in &self.project.manifest().package.packages {
            let init = self.project.package_dir(package).join("__init__.py");
            if init.is_file() {
                files.push(display_relative(root, &init));
            }
        }

        for (package, patterns) in &self.project.manifest().package_data {
            let dir = self.project.package_dir(package);
            for path in glob_files(&dir, patterns)? {
                files.push(display_relative(root, &path));
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

impl<R: CommandRunner> Lifecycle for EggLifecycle<'_, R> {
    fn regenerate_metadata(&mut self) -> Result<()> {
        let manifest = self.project.manifest();
        let dir = self.project.egg_info_dir();
        tracing::info!("Writing metadata to {}", dir.display());

        let pkg_info = format!(
            "Metadata-Version: 2.1\nName: {}\nVersion: {}\n",
            manifest.package.name, manifest.package.version
        );
        self.write(&dir.join("PKG-INFO"), &pkg_info)?;

        let requires = &manifest.package.install_requires;
        if !requires.is_empty() {
            self.write(&dir.join("requires.txt"), &lines(requires))?;
        }

        let top_level: Vec<String> = self.top_level().into_iter().collect();
        self.write(&dir.join("top_level.txt"), &lines(&top_level))?;

        let namespaces = &manifest.package.namespace_packages;
        if !namespaces.is_empty() {
            self.write(&dir.join("namespace_packages.txt"), &lines(namespaces))?;
        }

        self.write(&dir.join("dependency_links.txt"), "\n")?;

        let sources = self.sources()?;
        self.write(&dir.join("SOURCES.txt"), &lines(&sources))?;

        Ok(())
    }

    fn install_bootstrap(&mut self, source: &str) -> Result<()> {
        self.pip_install(source, [source])
    }

    fn install_namespaces(&mut self) -> Result<()> {
        let namespaces = &self.project.manifest().package.namespace_packages;
        if namespaces.is_empty() {
            return Ok(());
        }

        let root = self.project.package_root();
        let contents: String = namespaces
            .iter()
            .map(|pkg| nspkg_line(&root, pkg) + "\n")
            .collect();

        let path = self.install_dir.join(format!(
            "{}-nspkg.pth",
            self.project.manifest().filename_safe_name()
        ));
        tracing::info!("Installing {}", path.display());
        self.write(&path, &contents)
    }

    fn process_distribution(&mut self, install_deps: bool) -> Result<()> {
        let egg_path = self.project.package_root().display().to_string();
        let pth = self.install_dir.join("easy-install.pth");

        let existing = if pth.exists() {
            read_to_string(&pth)?
        } else {
            String::new()
        };
        if existing.lines().any(|line| line.trim() == egg_path) {
            tracing::debug!("{} already in {}", egg_path, pth.display());
        } else {
            tracing::info!("Adding {} to easy-install.pth file", self.project.manifest().package.name);
            let mut contents = existing;
            if !contents.is_empty() && !contents.ends_with('\n') {
                contents.push('\n');
            }
            contents.push_str(&egg_path);
            contents.push('\n');
            self.write(&pth, &contents)?;
        }

        let requires = self.project.manifest().package.install_requires.clone();
        if !install_deps {
            tracing::debug!("skipping dependency installation");
        } else if !requires.is_empty() {
            self.pip_install("dependencies", &requires)?;
        }

        Ok(())
    }
}

fn lines(items: &[String]) -> String {
    items.iter().map(|item| format!("{}\n", item)).collect()
}

/// Python `repr()` of a string.
fn py_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Python `repr()` of a tuple of strings.
fn py_tuple(items: &[&str]) -> String {
    let parts: Vec<String> = items.iter().map(|s| py_str(s)).collect();
    if parts.len() == 1 {
        format!("({},)", parts[0])
    } else {
        format!("({})", parts.join(", "))
    }
}

/// The `.pth` line that registers namespace package `pkg` under `root`.
fn nspkg_line(root: &Path, pkg: &str) -> String {
    let parts: Vec<&str> = pkg.split('.').collect();
    let root = py_str(&root.display().to_string());
    let pkg_repr = py_str(pkg);

    let mut stmts = vec![
        "import sys, types, os".to_string(),
        "has_mfs = sys.version_info > (3, 5)".to_string(),
        format!("p = os.path.join({}, *{})", root, py_tuple(&parts)),
        "importlib = has_mfs and __import__('importlib.util')".to_string(),
        "has_mfs and __import__('importlib.machinery')".to_string(),
        format!(
            "m = has_mfs and sys.modules.setdefault({pkg}, importlib.util.module_from_spec(\
             importlib.machinery.PathFinder.find_spec({pkg}, [os.path.dirname(p)])))",
            pkg = pkg_repr
        ),
        format!(
            "m = m or sys.modules.setdefault({pkg}, types.ModuleType({pkg}))",
            pkg = pkg_repr
        ),
        "mp = (m or []) and m.__dict__.setdefault('__path__',[])".to_string(),
        "(p not in mp) and mp.append(p)".to_string(),
    ];

    if let Some((parent, child)) = pkg.rsplit_once('.') {
        stmts.push(format!(
            "m and setattr(sys.modules[{}], {}, m)",
            py_str(parent),
            py_str(child)
        ));
    }

    stmts.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{manifests, MockRunner, ProjectFixture};
    use tempfile::TempDir;

    fn site(tmp: &TempDir) -> PathBuf {
        let site = tmp.path().join("site-packages");
        std::fs::create_dir_all(&site).unwrap();
        site
    }

    #[test]
    fn test_regenerate_metadata() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells").load(tmp.path());
        let mut lifecycle =
            EggLifecycle::new(&project, PathBuf::from("python3"), site(&tmp), MockRunner::new());

        lifecycle.regenerate_metadata().unwrap();

        let egg_info = project.egg_info_dir();
        let pkg_info = std::fs::read_to_string(egg_info.join("PKG-INFO")).unwrap();
        assert!(pkg_info.contains("Name: cells\n"));
        assert!(pkg_info.contains("Version: 1.0\n"));
        assert_eq!(
            std::fs::read_to_string(egg_info.join("requires.txt")).unwrap(),
            "numpy\n"
        );
        assert_eq!(
            std::fs::read_to_string(egg_info.join("top_level.txt")).unwrap(),
            "cells\n"
        );
        let sources = std::fs::read_to_string(egg_info.join("SOURCES.txt")).unwrap();
        assert!(sources.contains("cells/shaders/draw.glsl\n"));
        assert!(sources.contains("cells/__init__.py\n"));
        assert!(sources.contains("extforge.toml\n"));
        assert!(!egg_info.join("namespace_packages.txt").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells")
            .with_manifest(manifests::two_extensions("cells"))
            .load(tmp.path());
        let site = site(&tmp);
        let mut lifecycle =
            EggLifecycle::new(&project, PathBuf::from("python3"), site.clone(), MockRunner::new())
                .dry_run(true);

        lifecycle.regenerate_metadata().unwrap();
        lifecycle.install_bootstrap("setuptools").unwrap();
        lifecycle.install_namespaces().unwrap();
        lifecycle.process_distribution(true).unwrap();

        assert!(!project.egg_info_dir().exists());
        assert_eq!(std::fs::read_dir(&site).unwrap().count(), 0);
        assert!(lifecycle.runner().calls().is_empty());
    }

    #[test]
    fn test_easy_install_pth_appended_once() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells").load(tmp.path());
        let site = site(&tmp);
        std::fs::write(site.join("easy-install.pth"), "/other/project").unwrap();
        let mut lifecycle =
            EggLifecycle::new(&project, PathBuf::from("python3"), site.clone(), MockRunner::new());

        lifecycle.process_distribution(false).unwrap();
        lifecycle.process_distribution(false).unwrap();

        let pth = std::fs::read_to_string(site.join("easy-install.pth")).unwrap();
        let egg = project.package_root().display().to_string();
        assert_eq!(pth, format!("/other/project\n{}\n", egg));
        assert!(lifecycle.runner().calls().is_empty());
    }

    #[test]
    fn test_dependencies_installed_with_pip() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells").load(tmp.path());
        let mut lifecycle = EggLifecycle::new(
            &project,
            PathBuf::from("/usr/bin/python3"),
            site(&tmp),
            MockRunner::new(),
        );

        lifecycle.process_distribution(true).unwrap();

        assert_eq!(
            lifecycle.runner().calls(),
            &["/usr/bin/python3 -m pip install numpy"]
        );
    }

    #[test]
    fn test_failed_pip_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells").load(tmp.path());
        let mut runner = MockRunner::new();
        runner.fail_when("pip install", 1);
        let mut lifecycle =
            EggLifecycle::new(&project, PathBuf::from("python3"), site(&tmp), runner);

        assert!(lifecycle.install_bootstrap("./bootstrap").is_err());
    }

    #[test]
    fn test_namespace_pth() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells")
            .with_manifest(manifests::two_extensions("cells"))
            .load(tmp.path());
        let site = site(&tmp);
        let mut lifecycle =
            EggLifecycle::new(&project, PathBuf::from("python3"), site.clone(), MockRunner::new());

        lifecycle.install_namespaces().unwrap();

        let pth = std::fs::read_to_string(site.join("cells-nspkg.pth")).unwrap();
        assert_eq!(pth.lines().count(), 1);
        assert!(pth.starts_with("import sys, types, os;"));
        assert!(pth.contains("*('cells',))"));
    }

    #[test]
    fn test_nspkg_line_nested() {
        let line = nspkg_line(Path::new("/src"), "a.b");
        assert!(line.contains("p = os.path.join('/src', *('a', 'b'))"));
        assert!(line.ends_with("m and setattr(sys.modules['a'], 'b', m)"));
    }

    #[test]
    fn test_py_str_escapes() {
        assert_eq!(py_str(r"C:\src\it's"), r"'C:\\src\\it\'s'");
    }
}
