// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Media-independent handover (IEEE Std 802.21) link layer service access point.

mod ethernet;
mod quality;
mod wifi;

pub use {
    ethernet::EthernetLinkSap,
    quality::{LinkQualityTracker, SignalQualityRecord},
    wifi::WifiLinkSap,
};

use {
    crate::{client::Station, mac::SupportedRates, MacAddr},
    bitflags::bitflags,
    rand::Rng,
    std::{cell::RefCell, fmt, rc::Rc},
};

// IEEE Std 802.21-2008, Table F.1 (LINK_TYPE)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkType {
    WirelessGsm,
    WirelessGprs,
    WirelessEdge,
    Ethernet,
    WirelessOther,
    Wireless80211,
    WirelessCdma2000,
    WirelessUmts,
    Wireless80216,
}

impl LinkType {
    pub fn code(&self) -> u8 {
        match self {
            LinkType::WirelessGsm => 1,
            LinkType::WirelessGprs => 2,
            LinkType::WirelessEdge => 3,
            LinkType::Ethernet => 15,
            LinkType::WirelessOther => 18,
            LinkType::Wireless80211 => 19,
            LinkType::WirelessCdma2000 => 22,
            LinkType::WirelessUmts => 23,
            LinkType::Wireless80216 => 27,
        }
    }
}

/// Identifies one link between a device and a point of attachment (PoA).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinkIdentifier {
    pub link_type: LinkType,
    /// Address of the local interface.
    pub link_addr: MacAddr,
    /// Address of the point of attachment, e.g. the AP's BSSID.
    pub poa_addr: MacAddr,
}

impl LinkIdentifier {
    pub fn new(link_type: LinkType, link_addr: MacAddr, poa_addr: MacAddr) -> Self {
        Self { link_type, link_addr, poa_addr }
    }
}

/// Identifier of an MIH function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MihfId(pub String);

impl MihfId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        MihfId(format!("{:08x}@mih-local", rng.gen::<u32>()))
    }
}

impl fmt::Display for MihfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// IEEE Std 802.21-2008, Table F.3 (STATUS)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    UnspecifiedFailure,
    Rejected,
    AuthorizationFailure,
    NetworkError,
}

bitflags! {
    /// LINK_EVENT_LIST
    pub struct EventList: u32 {
        const LINK_DETECTED = 1 << 0;
        const LINK_UP = 1 << 1;
        const LINK_DOWN = 1 << 2;
        const LINK_PARAMETERS_REPORT = 1 << 3;
        const LINK_GOING_DOWN = 1 << 4;
        const LINK_HANDOVER_IMMINENT = 1 << 5;
        const LINK_HANDOVER_COMPLETE = 1 << 6;
        const LINK_PDU_TRANSMIT_STATUS = 1 << 7;
    }
}

bitflags! {
    /// LINK_CMD_LIST
    pub struct CommandList: u32 {
        const LINK_EVENT_SUBSCRIBE = 1 << 1;
        const LINK_EVENT_UNSUBSCRIBE = 1 << 2;
        const LINK_GET_PARAMETERS = 1 << 3;
        const LINK_CONFIGURE_THRESHOLDS = 1 << 4;
        const LINK_ACTION = 1 << 5;
    }
}

bitflags! {
    /// MIH_CAP_FLAG
    #[derive(Default)]
    pub struct MihCapabilityFlags: u8 {
        const EVENT_SERVICE = 1 << 1;
        const COMMAND_SERVICE = 1 << 2;
        const INFORMATION_SERVICE = 1 << 3;
    }
}

bitflags! {
    /// NET_CAPS
    #[derive(Default)]
    pub struct NetworkCapabilities: u32 {
        const SECURITY = 1 << 0;
        const QOS_CLASS_0 = 1 << 1;
        const INTERNET_ACCESS = 1 << 7;
        const EMERGENCY_SERVICES = 1 << 8;
        const MIH_CAPABILITY = 1 << 9;
    }
}

bitflags! {
    /// IP_MOB_MGMT
    pub struct MobilityManagementSupport: u16 {
        const MOBILE_IPV4_RFC3344 = 1 << 0;
        const MOBILE_IPV4_REGIONAL_REGISTRATION = 1 << 1;
        const MOBILE_IPV6_RFC3775 = 1 << 2;
        const HIERARCHICAL_MOBILE_IPV6 = 1 << 3;
        const LOW_LATENCY_HANDOFFS = 1 << 4;
        const MOBILE_IPV6_FAST_HANDOVERS = 1 << 5;
        const IKEV2_MOBILITY_MULTIHOMING = 1 << 6;
    }
}

// IEEE Std 802.21-2008, Table F.6 (LINK_DN_REASON)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkDownReason {
    ExplicitDisconnect = 0,
    PacketTimeout = 1,
    NoResource = 2,
    NoBroadcast = 3,
    AuthenticationFailure = 4,
    BillingFailure = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkParameterType {
    SignalStrength,
    Snr,
    DataRate,
    StationCount,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkConfigurationParameter {
    pub parameter_type: LinkParameterType,
    pub threshold: f64,
}

/// Description of a link seen in a beacon or probe response.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkDetectedInfo {
    pub link_id: LinkIdentifier,
    /// The advertised SSID.
    pub network_id: String,
    pub network_aux_id: String,
    /// In dBm.
    pub signal_strength: f64,
    /// In dB.
    pub snr: f64,
    pub supported_rates: SupportedRates,
    pub mih_capabilities: MihCapabilityFlags,
    pub network_capabilities: NetworkCapabilities,
    pub station_count: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkUpIndication {
    pub link_id: LinkIdentifier,
    pub old_access_router: Option<MacAddr>,
    pub new_access_router: MacAddr,
    pub ip_renewal: bool,
    pub mobility_support: MobilityManagementSupport,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkDownIndication {
    pub link_id: LinkIdentifier,
    pub old_access_router: MacAddr,
    pub reason: LinkDownReason,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CapabilityDiscoverConfirm {
    pub status: Status,
    pub events: EventList,
    pub commands: CommandList,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetParametersConfirm {
    pub status: Status,
    pub parameters: Vec<(LinkParameterType, f64)>,
}

impl Default for GetParametersConfirm {
    fn default() -> Self {
        GetParametersConfirm { status: Status::Success, parameters: vec![] }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfigureThresholdsConfirm {
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInformation {
    pub info: String,
}

/// Notifications a SAP forwards to the MIH function above it.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
    Detected { source: MihfId, info: LinkDetectedInfo, accepted: bool },
    Up(LinkUpIndication),
    Down(LinkDownIndication),
}

/// The link-layer side of the MIH function, implemented once per link technology.
pub trait LinkSap {
    fn link_identifier(&self) -> LinkIdentifier;
    fn set_link_identifier(&mut self, link_id: LinkIdentifier);
    fn mihf_id(&self) -> &MihfId;
    fn set_mihf_id(&mut self, mihf_id: MihfId);

    fn link_type(&self) -> LinkType {
        self.link_identifier().link_type
    }

    fn set_link_type(&mut self, link_type: LinkType) {
        let link_id = LinkIdentifier { link_type, ..self.link_identifier() };
        self.set_link_identifier(link_id);
    }

    fn link_address(&self) -> MacAddr {
        self.link_identifier().link_addr
    }

    fn set_link_address(&mut self, link_addr: MacAddr) {
        let link_id = LinkIdentifier { link_addr, ..self.link_identifier() };
        self.set_link_identifier(link_id);
    }

    fn poa_address(&self) -> MacAddr {
        self.link_identifier().poa_addr
    }

    fn set_poa_address(&mut self, poa_addr: MacAddr) {
        let link_id = LinkIdentifier { poa_addr, ..self.link_identifier() };
        self.set_link_identifier(link_id);
    }

    fn capability_discover(&self) -> CapabilityDiscoverConfirm;

    /// Parameter reports are not supported: the confirm never carries values.
    fn get_parameters(&self, _parameter_types: &[LinkParameterType]) -> GetParametersConfirm {
        GetParametersConfirm::default()
    }

    /// Threshold-triggered reports are not supported.
    fn configure_thresholds(
        &mut self,
        _parameters: &[LinkConfigurationParameter],
    ) -> ConfigureThresholdsConfirm {
        ConfigureThresholdsConfirm { status: Status::UnspecifiedFailure }
    }

    fn device_states(&self) -> DeviceInformation;

    /// Returns true if the station should switch to the detected link.
    fn link_detected(&mut self, source: &MihfId, info: LinkDetectedInfo) -> bool;
    fn link_up(&mut self, indication: LinkUpIndication);
    fn link_down(&mut self, indication: LinkDownIndication);
    /// Every loss of the point of attachment, including the repeated ones `link_down` stays
    /// quiet about.
    fn link_lost(&mut self, _poa_addr: MacAddr) {}
}

/// Binds `sap` to `station`: the SAP adopts the station's address and receives the station's
/// link-detected, link-up, link-down and link-lost notifications.
pub fn install<S: LinkSap + 'static>(sap: &Rc<RefCell<S>>, station: &mut Station) {
    let source = {
        let mut sap = sap.borrow_mut();
        if let Some(addr) = station.address() {
            sap.set_link_address(addr);
        }
        sap.mihf_id().clone()
    };

    let detected = Rc::clone(sap);
    station.register_link_detected(source, move |source, info| {
        detected.borrow_mut().link_detected(source, info)
    });
    let up = Rc::clone(sap);
    station.register_link_up(move |indication| up.borrow_mut().link_up(indication));
    let down = Rc::clone(sap);
    station.register_link_down(move |indication| down.borrow_mut().link_down(indication));
    let lost = Rc::clone(sap);
    station.register_link_lost(move |poa_addr| lost.borrow_mut().link_lost(poa_addr));
}
