use crate::animation::{AnimationConfig, SkipPreference};
use crate::content::Site;
use crate::state::session::Protocol;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Shared, read-mostly server state.
#[derive(Debug)]
pub struct Registry {
    pub site: Site,
    pub animation: AnimationConfig,
    /// Skip preference for clients that did not store one
    pub default_skip: SkipPreference,
    online: RwLock<BTreeMap<Uuid, Protocol>>,
}

impl Registry {
    pub fn new(site: Site, animation: AnimationConfig, default_skip: SkipPreference) -> Self {
        Self {
            site,
            animation,
            default_skip,
            online: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn set_online(&self, id: Uuid, protocol: Protocol, online: bool) {
        let mut g = self.online.write();
        if online {
            g.insert(id, protocol);
        } else {
            g.remove(&id);
        }
    }

    /// Number of connected viewers per protocol: `(telnet, websocket)`.
    pub fn who(&self) -> (usize, usize) {
        let g = self.online.read();
        let telnet = g.values().filter(|p| **p == Protocol::Telnet).count();
        (telnet, g.len() - telnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_online_sessions() {
        let reg = Registry::new(Site::embedded().unwrap(), AnimationConfig::default(), SkipPreference::default());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        reg.set_online(a, Protocol::Telnet, true);
        reg.set_online(b, Protocol::WebSocket, true);
        assert_eq!(reg.who(), (1, 1));

        reg.set_online(a, Protocol::Telnet, false);
        assert_eq!(reg.who(), (0, 1));
    }
}
