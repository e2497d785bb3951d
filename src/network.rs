use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterfaceUnavailable {
    #[error("не удалось получить адреса интерфейсов для {interface}: {source}")]
    Lookup {
        interface: String,
        source: std::io::Error,
    },
    #[error("у интерфейса {interface} нет IPv4-адреса")]
    NoAddress { interface: String },
}

pub fn local_ipv4(interface: &str) -> Result<Ipv4Addr, InterfaceUnavailable> {
    let interfaces = if_addrs::get_if_addrs().map_err(|source| InterfaceUnavailable::Lookup {
        interface: interface.to_string(),
        source,
    })?;
    select_ipv4(
        interfaces.iter().map(|iface| (iface.name.as_str(), iface.ip())),
        interface,
    )
}

/// First IPv4 address bound to `interface`.
pub fn select_ipv4<'a>(
    addrs: impl IntoIterator<Item = (&'a str, IpAddr)>,
    interface: &str,
) -> Result<Ipv4Addr, InterfaceUnavailable> {
    addrs
        .into_iter()
        .filter(|(name, _)| *name == interface)
        .find_map(|(_, ip)| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| InterfaceUnavailable::NoAddress {
            interface: interface.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn picks_ipv4_of_named_interface() {
        let addrs = [
            ("lo", IpAddr::V4(Ipv4Addr::LOCALHOST)),
            ("wlan0", IpAddr::V6(Ipv6Addr::LOCALHOST)),
            ("wlan0", IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42))),
        ];
        let ip = select_ipv4(addrs, "wlan0").expect("адрес wlan0");
        assert_eq!(ip, Ipv4Addr::new(192, 168, 1, 42));
    }

    #[test]
    fn interface_without_ipv4_is_unavailable() {
        let addrs = [
            ("lo", IpAddr::V4(Ipv4Addr::LOCALHOST)),
            ("wlan0", IpAddr::V6(Ipv6Addr::LOCALHOST)),
        ];
        let err = select_ipv4(addrs, "wlan0").expect_err("только IPv6");
        assert!(matches!(err, InterfaceUnavailable::NoAddress { interface } if interface == "wlan0"));
    }

    #[test]
    fn unknown_interface_is_unavailable() {
        let addrs: [(&str, IpAddr); 0] = [];
        assert!(select_ipv4(addrs, "eth9").is_err());
    }
}
