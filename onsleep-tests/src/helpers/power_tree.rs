//! Fake `/sys/class/power_supply` and `/proc/acpi/button/lid` trees

use onsleep_daemon::host::power::PowerPaths;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct FakePowerTree {
    dir: TempDir,
}

impl FakePowerTree {
    /// One battery, one mains adapter (`AC`) and one lid switch (`LID0`)
    pub fn new(mains_online: bool, lid_open: bool) -> std::io::Result<Self> {
        let dir = TempDir::new()?;
        let tree = Self { dir };

        let battery = tree.power_supply_root().join("BAT0");
        std::fs::create_dir_all(&battery)?;
        std::fs::write(battery.join("type"), "Battery\n")?;

        std::fs::create_dir_all(tree.power_supply_root().join("AC"))?;
        std::fs::write(tree.power_supply_root().join("AC/type"), "Mains\n")?;
        std::fs::create_dir_all(tree.lid_root().join("LID0"))?;

        tree.set_mains_online(mains_online)?;
        tree.set_lid_open(lid_open)?;
        Ok(tree)
    }

    pub fn paths(&self) -> PowerPaths {
        PowerPaths {
            power_supply_root: self.power_supply_root(),
            lid_root: self.lid_root(),
        }
    }

    pub fn set_mains_online(&self, online: bool) -> std::io::Result<()> {
        std::fs::write(
            self.power_supply_root().join("AC/online"),
            if online { "1\n" } else { "0\n" },
        )
    }

    pub fn set_lid_open(&self, open: bool) -> std::io::Result<()> {
        std::fs::write(
            self.lid_root().join("LID0/state"),
            format!("state:      {}\n", if open { "open" } else { "closed" }),
        )
    }

    fn power_supply_root(&self) -> PathBuf {
        self.dir.path().join("power_supply")
    }

    fn lid_root(&self) -> PathBuf {
        self.dir.path().join("lid")
    }
}
