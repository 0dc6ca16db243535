//! Default values of the simulation.
//!
//! The radio parameters describe an 802.11 station transmitting at 20 dBm
//! with a -95 dBm sensitivity over a log-distance channel. The traffic
//! parameters describe a UDP client sending to port 5000.
use crate::time::{SimDelay, SimTime};
use std::net::Ipv4Addr;

/// Default transmission power, in dBm.
pub const DEFAULT_TX_POWER_DBM: f64 = 20.0;

/// Default receiver sensitivity, in dBm.
pub const DEFAULT_RX_SENSITIVITY_DBM: f64 = -95.0;

/// Path loss at [`DEFAULT_REFERENCE_DISTANCE_M`], in dB.
///
/// This is the free-space loss at 1m for a 5.15 GHz carrier.
pub const DEFAULT_REFERENCE_LOSS_DB: f64 = 46.6777;

/// Reference distance of the log-distance model, in meters.
pub const DEFAULT_REFERENCE_DISTANCE_M: f64 = 1.0;

/// Path loss exponent of the log-distance model.
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 3.0;

/// Initial time to live of a datagram.
///
/// A packet that is forwarded more times than this is silently dropped.
pub const DEFAULT_TTL: u8 = 64;

/// Size of the IPv4 (20 bytes) and UDP (8 bytes) headers.
///
/// The flow monitor accounts packets at the IP layer: every datagram weighs
/// its payload plus these headers.
///
/// ```
/// # use hopsim_core::defaults::*;
/// assert_eq!(IPV4_UDP_HEADER_BYTES, 28);
/// ```
pub const IPV4_UDP_HEADER_BYTES: u64 = 28;

/// IANA protocol number of UDP.
pub const UDP_PROTOCOL: u8 = 17;

/// Source port of the traffic generator (the first ephemeral port).
pub const DEFAULT_SOURCE_PORT: u16 = 49153;

/// Destination port of the traffic generator.
pub const DEFAULT_DESTINATION_PORT: u16 = 5000;

/// Upper bound on the number of datagrams a generator sends.
pub const DEFAULT_MAX_PACKETS: u64 = 2_000_000;

/// Network mask length used when assigning addresses.
pub const DEFAULT_PREFIX_LEN: u8 = 24;

/// Base network of the D2D sidelink scenario.
pub const SIDELINK_NETWORK: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 0);

/// Default packet interval of the D2D sidelink scenario, in microseconds.
pub const SIDELINK_INTERVAL_US: f64 = 100.0;

/// Application payload of the D2D sidelink scenario, in bytes.
pub const SIDELINK_PACKET_SIZE: u64 = 1400;

/// The D2D sidelink client sends from 4s to 12s.
pub const SIDELINK_CLIENT_START: SimTime = SimTime::from_secs(4);
pub const SIDELINK_CLIENT_STOP: SimTime = SimTime::from_secs(12);

/// Base network of the multi-hop scenario.
pub const MULTIHOP_NETWORK: Ipv4Addr = Ipv4Addr::new(10, 1, 0, 0);

/// Longest chain of the multi-hop scenario, in hops.
pub const MULTIHOP_MAX_HOPS: u32 = 3;

/// Distance between two consecutive nodes of the multi-hop chain, in meters.
pub const MULTIHOP_SPACING_M: f64 = 50.0;

/// Packet interval of the multi-hop scenario (5 kpps).
pub const MULTIHOP_INTERVAL: SimDelay = SimDelay::from_micros(200);

/// Application payload of the multi-hop scenario, in bytes.
pub const MULTIHOP_PACKET_SIZE: u64 = 1200;

/// The multi-hop client sends from 1s to 11s.
pub const MULTIHOP_CLIENT_START: SimTime = SimTime::from_secs(1);
pub const MULTIHOP_CLIENT_STOP: SimTime = SimTime::from_secs(11);

/// Time left to the in-flight packets once the client stopped.
///
/// The sidelink simulation stops at 14s, the multi-hop one at 13s.
pub const SIMULATION_DRAIN: SimDelay = SimDelay::from_secs(2);
