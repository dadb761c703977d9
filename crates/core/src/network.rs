//! IP ban lists and IP anonymization.
//!
//! Ban lists are configured as free text (`security.bannedIPs`): entries
//! separated by whitespace or commas, each either a single address or a
//! CIDR block.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A single ban rule: a network address and prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRule {
    network: IpAddr,
    prefix: u8,
}

impl IpRule {
    /// Parse `"10.0.0.1"`, `"10.0.0.0/8"`, `"2001:db8::/32"` and so on.
    ///
    /// Host bits below the prefix are cleared, so `10.1.2.3/8` matches the
    /// same range as `10.0.0.0/8`.
    #[must_use]
    pub fn parse(entry: &str) -> Option<Self> {
        let (addr, prefix) = match entry.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix.parse::<u8>().ok()?)),
            None => (entry, None),
        };
        let parsed = addr.parse::<IpAddr>().ok()?;
        let network = parsed.to_canonical();
        let max = max_prefix(network);
        let prefix = match prefix {
            // IPv4-mapped IPv6 block: its prefix counts the 96 mapping bits.
            Some(p) if parsed.is_ipv6() && network.is_ipv4() => match p.checked_sub(96) {
                Some(v4_prefix) => v4_prefix,
                None => return Self::block(parsed, p),
            },
            Some(p) => p,
            None => max,
        };
        Self::block(network, prefix)
    }

    fn block(network: IpAddr, prefix: u8) -> Option<Self> {
        (prefix <= max_prefix(network)).then(|| Self {
            network: mask(network, prefix),
            prefix,
        })
    }

    /// Whether `ip` falls within this rule.
    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        match (self.network, ip) {
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                mask(ip, self.prefix) == self.network
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for IpRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prefix == max_prefix(self.network) {
            write!(f, "{}", self.network)
        } else {
            write!(f, "{}/{}", self.network, self.prefix)
        }
    }
}

/// A parsed IP ban list.
///
/// ```
/// use faqbase_core::network::IpFilter;
///
/// let (filter, invalid) = IpFilter::parse("192.168.0.0/16, 10.0.0.7 bogus");
/// assert_eq!(invalid, vec!["bogus".to_string()]);
/// assert!(filter.is_banned("192.168.44.1".parse().unwrap()));
/// assert!(!filter.is_banned("10.0.0.8".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpFilter {
    rules: Vec<IpRule>,
}

impl IpFilter {
    /// Parse a ban list. Returns the filter and the entries that could not
    /// be parsed.
    #[must_use]
    pub fn parse(list: &str) -> (Self, Vec<String>) {
        let mut rules = Vec::new();
        let mut invalid = Vec::new();
        for entry in list
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|e| !e.is_empty())
        {
            match IpRule::parse(entry) {
                Some(rule) => rules.push(rule),
                None => invalid.push(entry.to_owned()),
            }
        }
        (Self { rules }, invalid)
    }

    /// Whether any rule matches `ip`.
    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.rules.iter().any(|rule| rule.contains(ip))
    }

    /// Alias of [`IpFilter::contains`] for ban lists.
    #[must_use]
    pub fn is_banned(&self, ip: IpAddr) -> bool {
        self.contains(ip)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn rules(&self) -> &[IpRule] {
        &self.rules
    }
}

/// Anonymize an address for storage.
///
/// IPv4 loses its last octet, IPv6 keeps only its first 48 bits.
/// IPv4-mapped IPv6 addresses are treated as IPv4.
#[must_use]
pub fn anonymize(ip: IpAddr) -> IpAddr {
    match ip.to_canonical() {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            IpAddr::V4(Ipv4Addr::new(a, b, c, 0))
        }
        IpAddr::V6(v6) => IpAddr::V6(Ipv6Addr::from(u128::from(v6) & !(u128::MAX >> 48))),
    }
}

const fn max_prefix(ip: IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(ip: IpAddr, prefix: u8) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => {
            let bits = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
            IpAddr::V4(Ipv4Addr::from(u32::from(v4) & bits))
        }
        IpAddr::V6(v6) => {
            let bits = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
            IpAddr::V6(Ipv6Addr::from(u128::from(v6) & bits))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_cidr_boundaries() {
        let (filter, invalid) = IpFilter::parse("10.10.0.0/24");
        assert!(invalid.is_empty());
        assert!(filter.is_banned(ip("10.10.0.0")));
        assert!(filter.is_banned(ip("10.10.0.255")));
        assert!(!filter.is_banned(ip("10.10.1.0")));
        assert!(!filter.is_banned(ip("10.9.255.255")));
    }

    #[test]
    fn test_single_address_is_exact() {
        let (filter, _) = IpFilter::parse("203.0.113.9");
        assert!(filter.is_banned(ip("203.0.113.9")));
        assert!(!filter.is_banned(ip("203.0.113.10")));
    }

    #[test]
    fn test_zero_prefix_matches_family_only() {
        let (filter, _) = IpFilter::parse("0.0.0.0/0");
        assert!(filter.is_banned(ip("8.8.8.8")));
        assert!(!filter.is_banned(ip("2001:db8::1")));
    }

    #[test]
    fn test_ipv6_block() {
        let (filter, _) = IpFilter::parse("2001:db8::/32");
        assert!(filter.is_banned(ip("2001:db8:ffff::1")));
        assert!(!filter.is_banned(ip("2001:db9::1")));
    }

    #[test]
    fn test_mapped_address_matches_ipv4_rule() {
        let (filter, _) = IpFilter::parse("192.0.2.0/24");
        assert!(filter.is_banned(ip("::ffff:192.0.2.77")));
    }

    #[test]
    fn test_mapped_cidr_prefix_is_converted() {
        let rule = IpRule::parse("::ffff:10.0.0.0/104").unwrap();
        assert_eq!(rule.to_string(), "10.0.0.0/8");
        assert!(rule.contains(ip("10.200.1.1")));
        assert!(rule.contains(ip("::ffff:10.200.1.1")));
        assert!(!rule.contains(ip("11.0.0.1")));

        assert_eq!(
            IpRule::parse("::ffff:192.0.2.9/128").unwrap().to_string(),
            "192.0.2.9"
        );
        assert!(IpRule::parse("::ffff:10.0.0.0/129").is_none());

        // Shorter than the mapping prefix stays an IPv6 block.
        let wide = IpRule::parse("::ffff:0.0.0.0/80").unwrap();
        assert_eq!(wide.to_string(), "::/80");
        assert!(wide.contains(ip("::1")));
    }

    #[test]
    fn test_invalid_entries_are_reported() {
        let (filter, invalid) = IpFilter::parse("1.2.3.4/33\n300.1.1.1, ::1/129 ;x 127.0.0.1");
        assert_eq!(invalid, vec!["1.2.3.4/33", "300.1.1.1", "::1/129", ";x"]);
        assert_eq!(filter.rules().len(), 1);
        assert!(filter.is_banned(ip("127.0.0.1")));
    }

    #[test]
    fn test_host_bits_are_cleared() {
        let rule = IpRule::parse("10.1.2.3/8").unwrap();
        assert_eq!(rule.to_string(), "10.0.0.0/8");
        assert_eq!(IpRule::parse("10.1.2.3").unwrap().to_string(), "10.1.2.3");
    }

    #[test]
    fn test_empty_list_bans_nothing() {
        let (filter, invalid) = IpFilter::parse("  ");
        assert!(filter.is_empty());
        assert!(invalid.is_empty());
        assert!(!filter.is_banned(ip("127.0.0.1")));
    }

    #[test]
    fn test_anonymize_ipv4() {
        assert_eq!(anonymize(ip("198.51.100.213")), ip("198.51.100.0"));
    }

    #[test]
    fn test_anonymize_ipv6_keeps_48_bits() {
        assert_eq!(
            anonymize(ip("2001:db8:abcd:1234:5678:9abc:def0:1234")),
            ip("2001:db8:abcd::")
        );
    }

    #[test]
    fn test_anonymize_mapped_ipv4() {
        assert_eq!(anonymize(ip("::ffff:192.0.2.77")), ip("192.0.2.0"));
    }
}
