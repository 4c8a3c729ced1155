use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::player::traits::AuthSignal;

/// Shared login flag. The auth layer flips it, the controller polls it.
#[derive(Debug, Clone, Default)]
pub struct SessionFlag {
    authenticated: Arc<AtomicBool>,
}

impl SessionFlag {
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated: Arc::new(AtomicBool::new(authenticated)),
        }
    }

    pub fn set(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }
}

impl AuthSignal for SessionFlag {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let flag = SessionFlag::new(true);
        let observer = flag.clone();
        flag.set(false);
        assert!(!observer.is_authenticated());
    }
}
