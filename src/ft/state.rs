//! FT attempt state machine and the process-wide pending-attempts table.
//!
//! Grounded on `struct ft_info`, `ft_info_new`/`ft_info_destroy`,
//! `ft_info_find`, and the `info_list` singleton plus `ft_init`/`ft_exit`
//! in the original source. The source's pointer-identity linked list is
//! replaced with an indexed collection keyed on `(ifindex, aa)`, per the
//! Design Notes on the pending-attempts set.

use parking_lot::Mutex;
use rand_core::{OsRng, RngCore};

use crate::error::{Error, Result};
use crate::ft::ie::{FtElement, RsnElement};

/// Collaborator abstraction over `struct handshake_state`: the fields
/// and operations the FT core reads from or writes to during a
/// transition. Owned by the netdev layer in the original source.
pub trait HandshakeState {
    fn spa(&self) -> [u8; 6];
    fn aa(&self) -> [u8; 6];
    fn set_authenticator_address(&mut self, aa: [u8; 6]);
    fn kck(&self) -> Vec<u8>;
    fn mde(&self) -> [u8; 3];
    fn set_mde(&mut self, mde: [u8; 3]);
    fn r0khid(&self) -> Vec<u8>;
    fn r1khid(&self) -> [u8; 6];
    fn pmk_r0_name(&self) -> [u8; 16];
    fn pmk_r1_name(&self) -> [u8; 16];
    fn supplicant_ie(&self) -> Option<RsnElement>;
    fn set_supplicant_ie(&mut self, rsne: RsnElement);
    fn authenticator_ie(&self) -> Option<RsnElement>;
    fn set_authenticator_ie(&mut self, rsne: RsnElement);
    fn snonce(&self) -> [u8; 32];
    fn set_snonce(&mut self, snonce: [u8; 32]);
    fn anonce(&self) -> [u8; 32];
    fn set_anonce(&mut self, anonce: [u8; 32]);
    fn set_kh_ids(&mut self, r0khid: &[u8], r1khid: [u8; 6]);
    fn derive_ptk(&mut self);
    fn install_ptk(&mut self);
    fn install_gtk(&mut self, key_id: u8, key: &[u8], rsc: [u8; 8]);
    fn install_igtk(&mut self, key_id: u16, key: &[u8], ipn: [u8; 6]);
    fn decode_fte_key(&self, wrapped: &[u8]) -> Result<Vec<u8>>;
    fn supplicant_ocvc(&self) -> bool;
    fn oci(&self) -> Option<[u8; 5]>;
}

/// A scan-collaborator's view of the target BSS an FT transition moves
/// towards: its address, advertised MDE, operating frequency, and RSNE.
#[derive(Clone, Debug)]
pub struct TargetBss {
    pub addr: [u8; 6],
    pub mde: [u8; 3],
    pub frequency: u32,
    pub rsne: Option<RsnElement>,
}

/// A transition attempt's lifecycle stage, per the expanded state model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FtPhase {
    Init,
    SentAuthReq,
    GotAuthResp,
    HandshakeReady,
    Done,
    Failed,
}

/// One pending (or completed) FT transition attempt.
#[derive(Clone, Debug)]
pub struct FtInfo {
    pub ifindex: u32,
    pub spa: [u8; 6],
    pub aa: [u8; 6],
    pub snonce: [u8; 32],
    pub mde: [u8; 3],
    pub fte: Option<FtElement>,
    pub authenticator_ie: Option<RsnElement>,
    pub prev_bssid: [u8; 6],
    pub frequency: u32,
    pub ds_frequency: Option<u32>,
    pub onchannel: bool,
    pub phase: FtPhase,
    /// `None` while pending; `Some(Ok(()))` on success; `Some(Err(_))`
    /// once a validation failure, rejection, or timeout is recorded.
    pub status: Option<Result<()>>,
}

impl FtInfo {
    /// Start a new attempt towards `target`, generating a fresh SNonce.
    /// Grounded on `ft_info_new`.
    pub fn new(hs: &dyn HandshakeState, target: &TargetBss) -> Self {
        let mut snonce = [0u8; 32];
        OsRng.fill_bytes(&mut snonce);

        FtInfo {
            ifindex: 0,
            spa: hs.spa(),
            aa: target.addr,
            snonce,
            mde: target.mde,
            fte: None,
            authenticator_ie: target.rsne.clone(),
            prev_bssid: hs.aa(),
            frequency: target.frequency,
            ds_frequency: None,
            onchannel: false,
            phase: FtPhase::Init,
            status: None,
        }
    }
}

/// The process-wide set of pending FT attempts, replacing the source's
/// `info_list` linked list. Invariant: identical `(ifindex, aa)` pairs
/// never coexist.
pub struct FtRegistry {
    attempts: Vec<FtInfo>,
}

impl FtRegistry {
    pub fn new() -> Self {
        FtRegistry { attempts: Vec::new() }
    }

    /// Insert a new attempt, rejecting a duplicate `(ifindex, aa)` pair.
    pub fn insert(&mut self, info: FtInfo) -> Result<()> {
        if self.find(info.ifindex, Some(info.aa)).is_some() {
            return Err(Error::AlreadyPresent);
        }
        self.attempts.push(info);
        Ok(())
    }

    /// Find the first attempt on `ifindex`, optionally restricted to a
    /// specific `aa` (mirrors `ft_info_find`, where a `None` `aa` finds
    /// any attempt on the interface).
    pub fn find(&self, ifindex: u32, aa: Option<[u8; 6]>) -> Option<&FtInfo> {
        self.attempts
            .iter()
            .find(|i| i.ifindex == ifindex && aa.map_or(true, |a| i.aa == a))
    }

    pub fn find_mut(&mut self, ifindex: u32, aa: Option<[u8; 6]>) -> Option<&mut FtInfo> {
        self.attempts
            .iter_mut()
            .find(|i| i.ifindex == ifindex && aa.map_or(true, |a| i.aa == a))
    }

    /// Remove and return the attempt on `(ifindex, aa)`, if any.
    pub fn remove(&mut self, ifindex: u32, aa: [u8; 6]) -> Option<FtInfo> {
        let pos = self.attempts.iter().position(|i| i.ifindex == ifindex && i.aa == aa)?;
        Some(self.attempts.remove(pos))
    }

    /// Remove every attempt on `ifindex`. Grounded on
    /// `ft_clear_authentications`/`remove_ifindex`. Idempotent.
    pub fn clear_ifindex(&mut self, ifindex: u32) {
        self.attempts.retain(|i| i.ifindex != ifindex);
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }
}

impl Default for FtRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: Mutex<Option<FtRegistry>> = Mutex::new(None);

/// Construct the process-wide registry. Grounded on `ft_init`.
pub fn init() {
    *REGISTRY.lock() = Some(FtRegistry::new());
}

/// Tear down the process-wide registry, logging if attempts were still
/// pending. Grounded on `ft_exit`.
pub fn exit() {
    let mut guard = REGISTRY.lock();
    if let Some(registry) = guard.take() {
        if !registry.is_empty() {
            log::warn!("stale FT info objects found!");
        }
    }
}

/// Run `f` against the process-wide registry. Returns
/// [`Error::NotApplicable`] if [`init`] was never called.
pub fn with_registry<R>(f: impl FnOnce(&mut FtRegistry) -> R) -> Result<R> {
    let mut guard = REGISTRY.lock();
    let registry = guard.as_mut().ok_or(Error::NotApplicable)?;
    Ok(f(registry))
}

#[cfg(test)]
mod test {
    use super::*;

    struct TestHandshake {
        spa: [u8; 6],
        aa: [u8; 6],
    }

    impl HandshakeState for TestHandshake {
        fn spa(&self) -> [u8; 6] {
            self.spa
        }
        fn aa(&self) -> [u8; 6] {
            self.aa
        }
        fn set_authenticator_address(&mut self, aa: [u8; 6]) {
            self.aa = aa;
        }
        fn kck(&self) -> Vec<u8> {
            vec![0u8; 16]
        }
        fn mde(&self) -> [u8; 3] {
            [0; 3]
        }
        fn set_mde(&mut self, _mde: [u8; 3]) {}
        fn r0khid(&self) -> Vec<u8> {
            Vec::new()
        }
        fn r1khid(&self) -> [u8; 6] {
            [0; 6]
        }
        fn pmk_r0_name(&self) -> [u8; 16] {
            [0; 16]
        }
        fn pmk_r1_name(&self) -> [u8; 16] {
            [0; 16]
        }
        fn supplicant_ie(&self) -> Option<RsnElement> {
            None
        }
        fn set_supplicant_ie(&mut self, _rsne: RsnElement) {}
        fn authenticator_ie(&self) -> Option<RsnElement> {
            None
        }
        fn set_authenticator_ie(&mut self, _rsne: RsnElement) {}
        fn snonce(&self) -> [u8; 32] {
            [0; 32]
        }
        fn set_snonce(&mut self, _snonce: [u8; 32]) {}
        fn anonce(&self) -> [u8; 32] {
            [0; 32]
        }
        fn set_anonce(&mut self, _anonce: [u8; 32]) {}
        fn set_kh_ids(&mut self, _r0khid: &[u8], _r1khid: [u8; 6]) {}
        fn derive_ptk(&mut self) {}
        fn install_ptk(&mut self) {}
        fn install_gtk(&mut self, _key_id: u8, _key: &[u8], _rsc: [u8; 8]) {}
        fn install_igtk(&mut self, _key_id: u16, _key: &[u8], _ipn: [u8; 6]) {}
        fn decode_fte_key(&self, wrapped: &[u8]) -> Result<Vec<u8>> {
            Ok(wrapped.to_vec())
        }
        fn supplicant_ocvc(&self) -> bool {
            false
        }
        fn oci(&self) -> Option<[u8; 5]> {
            None
        }
    }

    fn target(addr: [u8; 6]) -> TargetBss {
        TargetBss { addr, mde: [1, 2, 3], frequency: 2412, rsne: None }
    }

    #[test]
    fn duplicate_ifindex_aa_pair_is_rejected() {
        let hs = TestHandshake { spa: [9u8; 6], aa: [0u8; 6] };
        let mut registry = FtRegistry::new();

        let mut a = FtInfo::new(&hs, &target([1u8; 6]));
        a.ifindex = 3;
        registry.insert(a).unwrap();

        let mut b = FtInfo::new(&hs, &target([1u8; 6]));
        b.ifindex = 3;
        assert_eq!(registry.insert(b), Err(Error::AlreadyPresent));
    }

    #[test]
    fn distinct_aa_on_same_ifindex_coexist() {
        let hs = TestHandshake { spa: [9u8; 6], aa: [0u8; 6] };
        let mut registry = FtRegistry::new();

        let mut a = FtInfo::new(&hs, &target([1u8; 6]));
        a.ifindex = 3;
        registry.insert(a).unwrap();

        let mut b = FtInfo::new(&hs, &target([2u8; 6]));
        b.ifindex = 3;
        registry.insert(b).unwrap();

        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clear_ifindex_removes_only_matching_attempts() {
        let hs = TestHandshake { spa: [9u8; 6], aa: [0u8; 6] };
        let mut registry = FtRegistry::new();

        let mut a = FtInfo::new(&hs, &target([1u8; 6]));
        a.ifindex = 3;
        registry.insert(a).unwrap();

        let mut b = FtInfo::new(&hs, &target([2u8; 6]));
        b.ifindex = 4;
        registry.insert(b).unwrap();

        registry.clear_ifindex(3);
        assert_eq!(registry.len(), 1);
        assert!(registry.find(4, None).is_some());
    }

    #[test]
    fn init_exit_round_trip_is_idempotent() {
        init();
        assert!(with_registry(|r| r.is_empty()).unwrap());
        exit();
        exit();
    }
}
