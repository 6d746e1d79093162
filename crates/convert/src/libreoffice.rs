//! Headless LibreOffice converter.

use crate::locate::find_executable;
use crate::Converter;
use report_core::{ConverterSettings, DocumentFormat, Error, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Name of the PPTX written into the scratch directory.
const INPUT_NAME: &str = "report.pptx";

/// Combined stdout/stderr of the converter process.
const LOG_NAME: &str = "convert.log";

/// How often a running converter is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Converts PPTX to PDF with `soffice --headless --convert-to pdf`.
///
/// Every conversion gets its own scratch directory holding the input, the
/// output, the process log and a private LibreOffice profile. The directory
/// is removed when the conversion returns, whatever the outcome.
///
/// On unix the converter runs in its own process group, which is killed
/// once the launcher exits or times out.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    settings: ConverterSettings,
}

impl LibreOfficeConverter {
    pub fn new(settings: ConverterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConverterSettings {
        &self.settings
    }

    /// Resolve the executable this converter would run.
    pub fn executable(&self) -> Result<PathBuf> {
        find_executable(self.settings.executable.as_deref())
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("report-convert-");
        let dir = match &self.settings.work_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.map_err(|e| Error::ConversionFailed(format!("could not create scratch directory: {}", e)))
    }

    fn run(&self, program: &Path, scratch: &Path, input: &Path) -> Result<()> {
        let log_out = File::create(scratch.join(LOG_NAME))?;
        let log_err = log_out.try_clone()?;

        let mut command = Command::new(program);
        command
            .arg(format!(
                "-env:UserInstallation={}",
                file_url(&scratch.join("profile"))
            ))
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(scratch)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_out))
            .stderr(Stdio::from(log_err));

        // soffice is a launcher; the office process is its descendant.
        // A fresh process group lets one signal reach all of them.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|e| {
            Error::ConversionFailed(format!("could not start {}: {}", program.display(), e))
        })?;

        log::debug!("Started {} (pid {})", program.display(), child.id());

        let outcome = wait_with_timeout(&mut child, self.settings.timeout);
        // Leftover helpers must not outlive the scratch directory
        kill_process_group(child.id());

        match outcome? {
            Some(status) if status.success() => Ok(()),
            Some(status) => {
                let output = read_log(scratch);
                Err(Error::ConversionFailed(format!(
                    "{} exited with {}: {}",
                    program.display(),
                    status,
                    if output.is_empty() { "no output" } else { output.as_str() }
                )))
            }
            None => Err(Error::ConversionTimeout(self.settings.timeout)),
        }
    }
}

impl Converter for LibreOfficeConverter {
    fn name(&self) -> &str {
        "libreoffice"
    }

    fn convert(&self, pptx: &[u8]) -> Result<Vec<u8>> {
        let program = self.executable()?;
        let scratch = self.scratch_dir()?;
        let input = scratch.path().join(INPUT_NAME);
        fs::write(&input, pptx)?;

        let started = Instant::now();
        self.run(&program, scratch.path(), &input)?;

        // LibreOffice names the output after the input, with a .pdf extension
        let produced = input.with_extension("pdf");
        if !produced.exists() {
            return Err(Error::ConversionFailed(format!(
                "converted PDF not found after LibreOffice run: {}",
                read_log(scratch.path())
            )));
        }

        let pdf = fs::read(&produced)?;
        if DocumentFormat::from_magic(&pdf) != Some(DocumentFormat::Pdf) {
            return Err(Error::ConversionFailed(
                "converter output is not a PDF".to_string(),
            ));
        }

        log::debug!(
            "Converted {} bytes of PPTX to {} bytes of PDF in {:?}",
            pptx.len(),
            pdf.len(),
            started.elapsed()
        );

        Ok(pdf)
    }
}

/// Wait for `child` to exit, killing it once `timeout` has passed.
///
/// Returns `None` if the process was killed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            log::warn!("Converter pid {} exceeded {:?}, killing it", child.id(), timeout);
            kill_process_group(child.id());
            // The process may exit between try_wait and kill
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// SIGKILL every process in the group led by `pgid`.
#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg takes plain integers; a group with no members yields ESRCH.
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

/// Last lines of the converter log, for error messages.
fn read_log(scratch: &Path) -> String {
    let bytes = fs::read(scratch.join(LOG_NAME)).unwrap_or_default();
    let log = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = log.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(20);
    lines[start..].join("\n")
}

/// `file://` URL for a local path, as LibreOffice expects for `-env:` settings.
fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{}", path)
    } else {
        format!("file:///{}", path)
    }
}
