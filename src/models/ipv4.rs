//! IPv4 address and CIDR notation utilities.
//!
//! Provides [`Ipv4Cidr`] for an address plus prefix length, along with the mask
//! arithmetic used to canonicalize subnets and test containment.

use crate::error::ReconcileError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 prefix (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use tunnel_netsettings::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32, ReconcileError> {
    if len > MAX_LENGTH {
        Err(ReconcileError::MalformedCidr(format!(
            "prefix length /{len} is too long"
        )))
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Convert a prefix length to a dotted-quad subnet mask, e.g. `24` -> `255.255.255.0`.
pub fn prefix_to_mask(len: u8) -> Result<String, ReconcileError> {
    Ok(Ipv4Addr::from(get_cidr_mask(len)?).to_string())
}

/// True when one of the two subnets covers the other.
///
/// The broader subnet (shorter prefix) is taken as the container regardless of
/// argument order. Equal prefixes only match when the networks are identical.
pub fn contains(a: &Ipv4Cidr, b: &Ipv4Cidr) -> bool {
    let (bigger, smaller) = if a.mask <= b.mask { (a, b) } else { (b, a) };
    bigger.covers(smaller)
}

/// IPv4 address with CIDR notation support.
///
/// Host bits are kept as given so the same type can carry an interface address
/// such as `10.126.126.5/24`; [`Ipv4Cidr::canonicalize`] zeroes them.
///
/// `==` and ordering compare the stored address, host bits included, so
/// `10.1.2.3/16 != 10.1.0.0/16`. Compare subnets as networks only after
/// canonicalizing both sides; every route goes through
/// [`crate::processing::de_duplicate_routes`], which does that.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct Ipv4Cidr {
    /// The IPv4 address.
    pub addr: Ipv4Addr,
    /// The prefix length (0-32).
    pub mask: u8,
}

impl Serialize for Ipv4Cidr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4Cidr {
    fn deserialize<D>(deserializer: D) -> Result<Ipv4Cidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4Cidr::new(&s).map_err(de::Error::custom)
    }
}

impl Ipv4Cidr {
    /// Parse `a.b.c.d/n`, or a bare `a.b.c.d` which means `/32`.
    pub fn new(addr_cidr: &str) -> Result<Ipv4Cidr, ReconcileError> {
        let addr_cidr = addr_cidr.trim();
        let (addr_part, mask_part) = match addr_cidr.split_once('/') {
            Some((addr, mask)) => (addr, Some(mask)),
            None => (addr_cidr, None),
        };

        let addr = Ipv4Addr::from_str(addr_part)
            .map_err(|_| ReconcileError::MalformedCidr(format!("invalid address in '{addr_cidr}'")))?;
        let mask = match mask_part {
            Some(m) => u8::from_str(m.trim()).map_err(|_| {
                ReconcileError::MalformedCidr(format!("invalid prefix length in '{addr_cidr}'"))
            })?,
            None => MAX_LENGTH,
        };
        Ipv4Cidr::from_parts(addr, mask)
    }

    /// Build from an address and prefix length, rejecting prefixes above 32.
    pub fn from_parts(addr: Ipv4Addr, mask: u8) -> Result<Ipv4Cidr, ReconcileError> {
        if mask > MAX_LENGTH {
            return Err(ReconcileError::MalformedCidr(format!(
                "prefix length /{mask} is too long for {addr}"
            )));
        }
        Ok(Ipv4Cidr { addr, mask })
    }

    /// Zero the host bits. Idempotent.
    pub fn canonicalize(&self) -> Ipv4Cidr {
        Ipv4Cidr {
            addr: self.lo(),
            mask: self.mask,
        }
    }

    /// Dotted-quad subnet mask for this prefix.
    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.mask_bits())
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & self.mask_bits())
    }

    #[cfg(test)]
    pub(crate) fn contains_addr(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & self.mask_bits() == u32::from(self.lo())
    }

    /// True iff `other` sits inside this network. Requires `self.mask <= other.mask`.
    fn covers(&self, other: &Ipv4Cidr) -> bool {
        if self.mask > other.mask {
            return false;
        }
        u32::from(other.lo()) & self.mask_bits() == u32::from(self.lo())
    }

    fn mask_bits(&self) -> u32 {
        // mask is validated on construction; fields are public though, so clamp.
        let len = self.mask.min(MAX_LENGTH);
        get_cidr_mask(len).unwrap_or(u32::MAX)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv4Cidr::new(s)
    }
}

impl std::fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}
