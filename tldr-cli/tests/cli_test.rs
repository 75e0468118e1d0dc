//! End-to-end tests for the `tldr` binary
//!
//! Every test points the binary at a private cache directory and a local
//! page mirror, so no network access is needed.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Fixture {
    temp_dir: TempDir,
}

impl Fixture {
    fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let mirror = temp_dir.path().join("mirror");
        write_page(&mirror, "pages/linux", "tar", TAR_PAGE)?;
        write_page(&mirror, "pages/common", "ls", "# ls\n\n> List directory contents.\n")?;

        let config = format!(
            "cache_dir: {}\narchive_url: {}\nplatform: linux\nlanguage: en\n",
            temp_dir.path().join("cache-dir").display(),
            mirror.display()
        );
        fs::write(temp_dir.path().join("config.yaml"), config)?;
        Ok(Self { temp_dir })
    }

    fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let config = self.config_path();
        let output = Command::new(env!("CARGO_BIN_EXE_tldr"))
            .arg("--config")
            .arg(&config)
            .args(args)
            .env_remove("RUST_LOG")
            .env("TMPDIR", self.temp_dir.path())
            .output()?;
        Ok(output)
    }
}

const TAR_PAGE: &str = "# tar

> Archiving utility.

- Extract an archive:

`tar xf {{source.tar}}`
";

fn write_page(mirror: &Path, folder: &str, name: &str, content: &str) -> Result<()> {
    let dir = mirror.join(folder);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{name}.md")), content)?;
    Ok(())
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_list_on_empty_cache_exits_with_code_2() -> Result<()> {
    let fixture = Fixture::new()?;

    let output = fixture.run(&["--list"])?;

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Local cache is empty"));
    assert!(!fixture.temp_dir.path().join("cache-dir/cache").exists());
    Ok(())
}

#[test]
fn test_lookup_refreshes_missing_cache() -> Result<()> {
    let fixture = Fixture::new()?;

    let output = fixture.run(&["tar"])?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("tar xf source.tar"));
    assert!(fixture
        .temp_dir
        .path()
        .join("cache-dir/cache/pages/linux/tar.md")
        .exists());
    Ok(())
}

#[test]
fn test_update_then_list() -> Result<()> {
    let fixture = Fixture::new()?;

    let update = fixture.run(&["--update"])?;
    assert!(update.status.success(), "stderr: {}", stderr(&update));

    let list = fixture.run(&["--list-all", "--single-column"])?;
    assert!(list.status.success());
    assert_eq!(stdout(&list), "ls\ntar\n");
    Ok(())
}

#[test]
fn test_markdown_output() -> Result<()> {
    let fixture = Fixture::new()?;

    let output = fixture.run(&["tar", "--markdown"])?;

    assert!(output.status.success());
    assert_eq!(stdout(&output), TAR_PAGE);
    Ok(())
}

#[test]
fn test_missing_page_exits_with_code_3() -> Result<()> {
    let fixture = Fixture::new()?;

    let output = fixture.run(&["no-such-command"])?;

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("https://github.com/tldr-pages/tldr"));
    Ok(())
}

#[test]
fn test_clear_cache_twice() -> Result<()> {
    let fixture = Fixture::new()?;
    assert!(fixture.run(&["--update"])?.status.success());

    for _ in 0..2 {
        let output = fixture.run(&["--clear-cache"])?;
        assert!(output.status.success());
        assert_eq!(stdout(&output), "Done\n");
    }
    assert!(!fixture.temp_dir.path().join("cache-dir/cache").exists());
    Ok(())
}

#[test]
fn test_render_local_file() -> Result<()> {
    let fixture = Fixture::new()?;
    let page = fixture.temp_dir.path().join("custom.md");
    fs::write(&page, "# custom\n\n> A local page.\n")?;

    let output = fixture.run(&["--render", page.to_str().unwrap()])?;

    assert!(output.status.success());
    assert!(stdout(&output).contains("A local page."));
    Ok(())
}

#[test]
fn test_markdown_and_random_example_conflict() -> Result<()> {
    let fixture = Fixture::new()?;

    let output = fixture.run(&["tar", "--markdown", "--random-example"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid options"));
    Ok(())
}

#[test]
fn test_update_then_list_all_in_one_run() -> Result<()> {
    let fixture = Fixture::new()?;

    let output = fixture.run(&["--update", "--list-all", "--single-column"])?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Local cache updated\nls\ntar\n");
    Ok(())
}

#[test]
fn test_update_then_render_in_one_run() -> Result<()> {
    let fixture = Fixture::new()?;
    let page = fixture.temp_dir.path().join("custom.md");
    fs::write(&page, "# custom\n\n> A local page.\n")?;

    let output = fixture.run(&["-u", "-f", page.to_str().unwrap()])?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("Local cache updated\n"));
    assert!(out.contains("A local page."));
    Ok(())
}
