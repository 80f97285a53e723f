//! In-flight deposit guard

use crate::{Error, Result};
use std::cell::Cell;

/// Raises the in-flight flag for its lifetime
#[derive(Debug)]
pub struct ReentrancyGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> ReentrancyGuard<'a> {
    /// Raise `flag`, failing if it is already up
    pub fn enter(flag: &'a Cell<bool>) -> Result<Self> {
        if flag.replace(true) {
            return Err(Error::Reentrancy);
        }
        Ok(Self { flag })
    }

    /// Fail if a guard on `flag` is alive
    pub fn check(flag: &Cell<bool>) -> Result<()> {
        if flag.get() {
            return Err(Error::Reentrancy);
        }
        Ok(())
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_blocks_nested_entry() {
        let flag = Cell::new(false);
        {
            let _guard = ReentrancyGuard::enter(&flag).unwrap();
            assert!(matches!(ReentrancyGuard::enter(&flag), Err(Error::Reentrancy)));
            assert!(ReentrancyGuard::check(&flag).is_err());
            // a failed nested entry must not lower the flag
            assert!(flag.get());
        }
        assert!(!flag.get());
        assert!(ReentrancyGuard::check(&flag).is_ok());
    }
}
