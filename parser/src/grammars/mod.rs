//! Built-in command grammars.
//!
//! [`BUILTIN`] is the static registration list. Its order is the order in
//! which entry points are tested, so when two grammars could claim the same
//! line the earlier one wins.

pub mod common;

pub mod alarm_active;
pub mod arp;
pub mod bfd_session;
pub mod bgp_peer;
pub mod bgp_route;
pub mod bgp_routing_table;
pub mod bgp_vpnv4_routes;
pub mod clock;
pub mod cpu_usage;
pub mod current_config;
pub mod device;
pub mod elabel;
pub mod esn;
pub mod eth_trunk;
pub mod fan;
pub mod interface;
pub mod interface_brief;
pub mod ip_interface_brief;
pub mod ip_routing_table;
pub mod isis_peer;
pub mod lldp_neighbor_brief;
pub mod mac_address;
pub mod memory_usage;
pub mod mpls_ldp_session;
pub mod ntp_status;
pub mod ospf_peer_brief;
pub mod patch_info;
pub mod power;
pub mod startup;
pub mod stp_brief;
pub mod temperature;
pub mod transceiver;
pub mod users;
pub mod version;
pub mod vlan;
pub mod vpn_instance;
pub mod vrrp_brief;

use crate::registry::ParserFactory;

/// Every built-in grammar, in entry-point test order.
pub static BUILTIN: &[ParserFactory] = &[
    // system
    ParserFactory::of::<version::Version>(),
    ParserFactory::of::<device::Device>(),
    ParserFactory::of::<elabel::Elabel>(),
    // interfaces
    ParserFactory::of::<interface_brief::InterfaceBrief>(),
    ParserFactory::of::<ip_interface_brief::IpInterfaceBrief>(),
    ParserFactory::of::<interface::Interface>(),
    // layer 2
    ParserFactory::of::<arp::Arp>(),
    ParserFactory::of::<mac_address::MacAddress>(),
    ParserFactory::of::<vlan::Vlan>(),
    ParserFactory::of::<stp_brief::StpBrief>(),
    ParserFactory::of::<eth_trunk::EthTrunk>(),
    ParserFactory::of::<lldp_neighbor_brief::LldpNeighborBrief>(),
    ParserFactory::of::<alarm_active::AlarmActive>(),
    // routing
    ParserFactory::of::<bgp_peer::BgpPeer>(),
    ParserFactory::of::<bgp_routing_table::BgpRoutingTable>(),
    ParserFactory::of::<bgp_vpnv4_routes::BgpVpnv4Routes>(),
    ParserFactory::of::<ip_routing_table::IpRoutingTable>(),
    ParserFactory::of::<ospf_peer_brief::OspfPeerBrief>(),
    ParserFactory::of::<isis_peer::IsisPeer>(),
    ParserFactory::of::<mpls_ldp_session::MplsLdpSession>(),
    ParserFactory::of::<bfd_session::BfdSession>(),
    ParserFactory::of::<vrrp_brief::VrrpBrief>(),
    ParserFactory::of::<vpn_instance::VpnInstance>(),
    // health
    ParserFactory::of::<cpu_usage::CpuUsage>(),
    ParserFactory::of::<memory_usage::MemoryUsage>(),
    ParserFactory::of::<power::Power>(),
    ParserFactory::of::<fan::Fan>(),
    ParserFactory::of::<temperature::Temperature>(),
    ParserFactory::of::<transceiver::Transceiver>(),
    // management
    ParserFactory::of::<esn::Esn>(),
    ParserFactory::of::<clock::Clock>(),
    ParserFactory::of::<users::Users>(),
    ParserFactory::of::<patch_info::PatchInfo>(),
    ParserFactory::of::<startup::Startup>(),
    ParserFactory::of::<ntp_status::NtpStatus>(),
    ParserFactory::of::<current_config::CurrentConfig>(),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_grammar_is_registered_once() {
        assert_eq!(BUILTIN.len(), 36);
        let mut names: Vec<&str> = BUILTIN.iter().map(|factory| factory.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN.len());
    }

    #[test]
    fn test_routing_tables_outrank_defaults() {
        for name in ["bgp_peer", "bgp_routing_table", "bgp_vpnv4_routes"] {
            let factory = BUILTIN.iter().find(|factory| factory.name == name).unwrap();
            assert!(factory.priority < crate::grammar::DEFAULT_PRIORITY, "{name}");
        }
    }
}
