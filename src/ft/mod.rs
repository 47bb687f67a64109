//! Fast BSS Transition (802.11r): authentication request/response
//! construction and validation, (re)association handling, FT-over-DS
//! action frames, and the pending-attempts state machine.
//!
//! This module is organized the way the original `ft.c` is, split by
//! concern: 802.11 element codecs ([`ie`]), FTE MIC computation
//! ([`mic`]), the attempt state machine and collaborator traits
//! ([`state`]), and frame construction/validation ([`frame`]).

pub mod frame;
pub mod ie;
pub mod mic;
pub mod state;

pub use ie::{FtElement, GtkSubelem, IgtkSubelem, RsnElement};
pub use state::{exit, init, with_registry, FtInfo, FtPhase, FtRegistry, HandshakeState, TargetBss};

use crate::error::{Error, Result};

/// FT → frame transmitter collaborator. Frame-types used: `0x00b0`
/// (management auth), `0x00d0` (action). Grounded on `ft_tx_frame_func_t`.
pub trait FrameTransmitter {
    fn tx(&mut self, ifindex: u32, frame_type: u16, frequency: u32, dest: [u8; 6], body: &[u8]) -> Result<()>;
}

/// FT → radio-work scheduler collaborator. `insert` returns a work id;
/// `done` releases the slot. Grounded on `wiphy_radio_work_insert`/
/// `wiphy_radio_work_done`.
pub trait RadioWorkScheduler {
    fn insert(&mut self, ifindex: u32, priority: u8) -> u64;
    fn done(&mut self, ifindex: u32, work_id: u64);
}

/// FT → off-channel collaborator. Grounded on `offchannel_start`/
/// `offchannel_cancel`.
pub trait OffChannel {
    fn start(&mut self, wdev_id: u64, priority: u8, frequency: u32, dwell_ms: u32) -> u64;
    fn cancel(&mut self, wdev_id: u64, id: u64);
}

/// Begin an FT-over-Air transition towards `target`, inserting a new
/// attempt into the registry and sending the authentication request.
/// Grounded on `ft_authenticate`.
pub fn authenticate(
    hs: &dyn HandshakeState,
    tx: &mut dyn FrameTransmitter,
    ifindex: u32,
    target: &TargetBss,
) -> Result<()> {
    let mut info = FtInfo::new(hs, target);
    info.ifindex = ifindex;
    info.phase = FtPhase::SentAuthReq;

    let ies = frame::build_authenticate_ies(hs, &info)?;
    tx.tx(ifindex, 0x00b0, target.frequency, target.addr, &ies)?;

    with_registry(|r| r.insert(info))??;
    Ok(())
}

/// Begin an FT-over-DS transition towards `target`. Grounded on
/// `ft_action`.
pub fn action(
    hs: &dyn HandshakeState,
    tx: &mut dyn FrameTransmitter,
    ifindex: u32,
    ds_frequency: u32,
    target: &TargetBss,
) -> Result<()> {
    let mut info = FtInfo::new(hs, target);
    info.ifindex = ifindex;
    info.ds_frequency = Some(ds_frequency);
    info.phase = FtPhase::SentAuthReq;

    let body = frame::build_action_request(hs, &info)?;
    tx.tx(ifindex, 0x00d0, ds_frequency, target.addr, &body)?;

    with_registry(|r| r.insert(info))??;
    Ok(())
}

/// Process an incoming FT authentication response frame body (the IE
/// stream after the fixed auth header). Grounded on `__ft_rx_authenticate`.
pub fn rx_authenticate(hs: &dyn HandshakeState, ifindex: u32, status: u16, ies: &[u8]) -> Result<()> {
    with_registry(|registry| {
        let info = registry.find_mut(ifindex, None).ok_or(Error::NotFound)?;

        if status != 0 {
            info.status = Some(Err(Error::Rejected(status)));
            info.phase = FtPhase::Failed;
            log::warn!("FT auth rejected by {:02x?} with status={status}", info.aa);
            return Ok(());
        }

        match frame::parse_ies_response(hs, info, ies) {
            Ok(()) => {
                info.status = Some(Ok(()));
                info.phase = FtPhase::GotAuthResp;
            }
            Err(e) => {
                info.status = Some(Err(e.clone()));
                info.phase = FtPhase::Failed;
                log::warn!("FT auth response IEs rejected: {e}");
                return Err(e);
            }
        }
        Ok(())
    })?
}

/// Process an incoming FT-over-DS action response frame body. Grounded
/// on `__ft_rx_action`.
pub fn rx_action(hs: &dyn HandshakeState, ifindex: u32, body: &[u8]) -> Result<()> {
    with_registry(|registry| {
        let info = registry.find_mut(ifindex, None).ok_or(Error::NotFound)?;
        let (status, ies) = frame::parse_action_response_body(body, &info.spa)?;

        if status != 0 {
            info.status = Some(Err(Error::Rejected(status)));
            info.phase = FtPhase::Failed;
            return Ok(());
        }

        match frame::parse_ies_response(hs, info, ies) {
            Ok(()) => {
                info.status = Some(Ok(()));
                info.phase = FtPhase::GotAuthResp;
                Ok(())
            }
            Err(e) => {
                info.status = Some(Err(e.clone()));
                info.phase = FtPhase::Failed;
                Err(e)
            }
        }
    })?
}

/// Finalize the handshake for the attempt on `target` and clear every
/// other pending attempt on `ifindex`. Grounded on `ft_handshake_setup`.
///
/// Returns the built reassociation-request RSNE and FTE bytes on success.
pub fn handshake_setup(hs: &mut dyn HandshakeState, ifindex: u32, target: [u8; 6]) -> Result<(Vec<u8>, Vec<u8>)> {
    let info = with_registry(|r| r.remove(ifindex, target))?.ok_or(Error::NotFound)?;

    if let Some(Err(e)) = &info.status {
        with_registry(|r| r.clear_ifindex(ifindex))?;
        return Err(e.clone());
    }

    let result = frame::prepare_handshake(hs, &info);
    with_registry(|r| r.clear_ifindex(ifindex))?;
    result
}

/// Validate a (re)association response against the attempt that was
/// just finalized by [`handshake_setup`]. The caller retains `info` from
/// its own bookkeeping since the registry entry was already cleared.
pub fn rx_associate(hs: &mut dyn HandshakeState, info: &FtInfo, ies: &[u8]) -> Result<()> {
    frame::rx_associate(hs, info, ies)
}

/// Cancel every pending attempt on `ifindex`. Grounded on
/// `ft_clear_authentications`. Idempotent.
pub fn clear_authentications(ifindex: u32) -> Result<()> {
    with_registry(|r| r.clear_ifindex(ifindex))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ft::ie::RsnElement;

    struct NullHandshake;

    impl HandshakeState for NullHandshake {
        fn spa(&self) -> [u8; 6] {
            [1; 6]
        }
        fn aa(&self) -> [u8; 6] {
            [2; 6]
        }
        fn set_authenticator_address(&mut self, _aa: [u8; 6]) {}
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

    struct RecordingTx {
        sent: Vec<(u32, u16, u32, [u8; 6])>,
    }

    impl FrameTransmitter for RecordingTx {
        fn tx(&mut self, ifindex: u32, frame_type: u16, frequency: u32, dest: [u8; 6], _body: &[u8]) -> Result<()> {
            self.sent.push((ifindex, frame_type, frequency, dest));
            Ok(())
        }
    }

    fn fresh_registry_guard() {
        // Each test gets its own attempt(s) on a distinct ifindex so the
        // shared global registry doesn't need resetting between tests.
        init();
    }

    #[test]
    fn authenticate_inserts_one_attempt_and_sends_0x00b0() {
        fresh_registry_guard();
        let hs = NullHandshake;
        let mut tx = RecordingTx { sent: Vec::new() };
        let target = TargetBss { addr: [9; 6], mde: [0; 3], frequency: 5180, rsne: None };

        authenticate(&hs, &mut tx, 100, &target).unwrap();

        assert_eq!(tx.sent, vec![(100, 0x00b0, 5180, [9; 6])]);
        assert!(with_registry(|r| r.find(100, Some([9; 6])).is_some()).unwrap());

        clear_authentications(100).unwrap();
    }

    #[test]
    fn second_authenticate_on_same_ifindex_and_aa_is_rejected() {
        fresh_registry_guard();
        let hs = NullHandshake;
        let mut tx = RecordingTx { sent: Vec::new() };
        let target = TargetBss { addr: [8; 6], mde: [0; 3], frequency: 2412, rsne: None };

        authenticate(&hs, &mut tx, 200, &target).unwrap();
        assert!(authenticate(&hs, &mut tx, 200, &target).is_err());

        clear_authentications(200).unwrap();
    }

    #[test]
    fn rx_authenticate_with_nonzero_status_marks_attempt_failed() {
        fresh_registry_guard();
        let hs = NullHandshake;
        let mut tx = RecordingTx { sent: Vec::new() };
        let target = TargetBss { addr: [7; 6], mde: [0; 3], frequency: 2412, rsne: None };
        authenticate(&hs, &mut tx, 300, &target).unwrap();

        rx_authenticate(&hs, 300, 37, &[]).unwrap();

        let phase = with_registry(|r| r.find(300, Some([7; 6])).unwrap().phase).unwrap();
        assert_eq!(phase, FtPhase::Failed);

        clear_authentications(300).unwrap();
    }
}
