//! `--install` / `--uninstall`: manage the systemd unit running the service.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use onsleep_unix::systemctl::Systemctl;

use crate::errors::CliError;
use crate::UNIT_NAME;

pub const DEFAULT_UNIT_DIR: &str = "/etc/systemd/system";

#[derive(Debug, Clone)]
pub struct UnitInstaller {
    systemctl: Systemctl,
    unit_dir: PathBuf,
    exec_path: PathBuf,
    config_path: PathBuf,
}

impl UnitInstaller {
    pub fn new(
        systemctl: Systemctl,
        unit_dir: impl Into<PathBuf>,
        exec_path: impl Into<PathBuf>,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            systemctl,
            unit_dir: unit_dir.into(),
            exec_path: exec_path.into(),
            config_path: config_path.into(),
        }
    }

    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(UNIT_NAME)
    }

    pub fn render_unit(&self) -> String {
        render_unit(&self.exec_path, &self.config_path)
    }

    /// Write the unit, reload systemd and enable it at boot.
    pub fn install(&self) -> Result<(), CliError> {
        let path = self.unit_path();
        std::fs::create_dir_all(&self.unit_dir).map_err(|source| CliError::UnitWrite {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, self.render_unit()).map_err(|source| CliError::UnitWrite {
            path: path.clone(),
            source,
        })?;
        info!("Wrote {}", path.display());

        self.systemctl_checked(&["daemon-reload"])?;
        self.systemctl_checked(&["enable", UNIT_NAME])?;
        info!("Installed {}", UNIT_NAME);
        Ok(())
    }

    /// Stop and disable the unit, remove the file, reload systemd.
    ///
    /// A missing unit file is not an error.
    pub fn uninstall(&self) -> Result<(), CliError> {
        // The unit may already be stopped or disabled
        for command in [["stop", UNIT_NAME], ["disable", UNIT_NAME]] {
            if let Err(e) = self.systemctl_checked(&command) {
                warn!("{}", e);
            }
        }

        let path = self.unit_path();
        match std::fs::remove_file(&path) {
            Ok(()) => info!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(CliError::UnitRemove { path, source }),
        }

        self.systemctl_checked(&["daemon-reload"])?;
        info!("Uninstalled {}", UNIT_NAME);
        Ok(())
    }

    fn systemctl_checked(&self, args: &[&str]) -> Result<(), CliError> {
        let output = self.systemctl.run(args)?;
        if output.success() {
            Ok(())
        } else {
            Err(CliError::Systemctl {
                command: args.join(" "),
                code: output.code_or_signal(),
                message: output.error_line().to_string(),
            })
        }
    }
}

/// The unit file for `onsleep.service`.
pub fn render_unit(exec_path: &Path, config_path: &Path) -> String {
    format!(
        "[Unit]\n\
         Description=Stop audio services on lid close, restart them on lid open\n\
         After=sound.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         ExecStart={} --config {}\n\
         Restart=on-failure\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        exec_path.display(),
        config_path.display()
    )
}
