/// Whether the current process runs with an effective UID of 0.
#[cfg(unix)]
pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}
