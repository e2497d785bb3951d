use nix::unistd::Uid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[error("для доступа к e-ink дисплею нужны права root (euid {euid}), запустите через sudo")]
    NotRoot { euid: u32 },
}

pub fn ensure_privileges() -> Result<(), PrivilegeError> {
    check_euid(Uid::effective().as_raw())
}

pub fn check_euid(euid: u32) -> Result<(), PrivilegeError> {
    if euid != 0 {
        return Err(PrivilegeError::NotRoot { euid });
    }
    Ok(())
}
