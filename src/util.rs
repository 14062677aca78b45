use std::net::{IpAddr, SocketAddr};

const MONITOR_PORT: &str = "MONITOR_PORT";

pub const DEFAULT_PORT: u16 = 8000;

pub fn get_port(default: u16) -> u16 {
    let port_from_env = std::env::var(MONITOR_PORT);
    port_from_env.map_or(default, |res| res.parse().unwrap_or(default))
}

const MONITOR_ADDR: &str = "MONITOR_ADDR";

pub fn get_addr(default: IpAddr) -> IpAddr {
    let addr_from_env = std::env::var(MONITOR_ADDR);
    addr_from_env.map_or(default, |res| res.parse().unwrap_or(default))
}

/// Apply `MONITOR_ADDR` / `MONITOR_PORT` on top of the configured address
pub fn resolve_bind(configured: SocketAddr) -> SocketAddr {
    SocketAddr::new(get_addr(configured.ip()), get_port(configured.port()))
}
