use crate::error::{CoreError, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

/// Resource kinds the policy engine accounts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    /// Key used in Kubernetes resource maps
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Memory => "memory",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource quantities for nodes and pods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceQuantities {
    /// CPU in millicores (1000 = 1 core)
    pub cpu_millicores: i64,
    /// Memory in bytes
    pub memory_bytes: i64,
}

impl ResourceQuantities {
    pub fn new(cpu_millicores: i64, memory_bytes: i64) -> Self {
        Self {
            cpu_millicores,
            memory_bytes,
        }
    }

    /// Parse CPU string into millicores (e.g., "2", "1000m", "0.5", "1e3")
    pub fn parse_cpu(s: &str) -> Result<i64> {
        parse_scaled(ResourceKind::Cpu, s.trim(), 1000)
    }

    /// Parse memory string into bytes (e.g., "128Mi", "1.5Gi", "1G", "1e9", "1024")
    pub fn parse_memory(s: &str) -> Result<i64> {
        parse_scaled(ResourceKind::Memory, s.trim(), 1)
    }

    /// Parse a single resource out of a resource map, `None` if absent
    pub fn parse_entry(
        resources: &BTreeMap<String, Quantity>,
        kind: ResourceKind,
    ) -> Result<Option<i64>> {
        resources
            .get(kind.as_str())
            .map(|q| match kind {
                ResourceKind::Cpu => Self::parse_cpu(&q.0),
                ResourceKind::Memory => Self::parse_memory(&q.0),
            })
            .transpose()
    }

    /// Get CPU and memory requests from a resource map (k8s-openapi format).
    ///
    /// An absent key is a request of zero; a present but malformed one is an error.
    pub fn from_k8s_resource_map(resources: &BTreeMap<String, Quantity>) -> Result<Self> {
        Ok(Self {
            cpu_millicores: Self::parse_entry(resources, ResourceKind::Cpu)?.unwrap_or(0),
            memory_bytes: Self::parse_entry(resources, ResourceKind::Memory)?.unwrap_or(0),
        })
    }

    /// Get a quantity by kind
    pub fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Cpu => self.cpu_millicores,
            ResourceKind::Memory => self.memory_bytes,
        }
    }

    /// Per-resource difference, may go negative on over-committed nodes
    pub fn saturating_sub(&self, other: &ResourceQuantities) -> Self {
        Self {
            cpu_millicores: self.cpu_millicores.saturating_sub(other.cpu_millicores),
            memory_bytes: self.memory_bytes.saturating_sub(other.memory_bytes),
        }
    }
}

/// Quantity suffixes as `(suffix, multiplier, power of ten)`
const SUFFIXES: [(&str, i128, i64); 13] = [
    ("Ki", 1 << 10, 0),
    ("Mi", 1 << 20, 0),
    ("Gi", 1 << 30, 0),
    ("Ti", 1 << 40, 0),
    ("Pi", 1 << 50, 0),
    ("Ei", 1 << 60, 0),
    ("m", 1, -3),
    ("k", 1, 3),
    ("M", 1, 6),
    ("G", 1, 9),
    ("T", 1, 12),
    ("P", 1, 15),
    ("E", 1, 18),
];

const OVERFLOW: &str = "quantity overflows i64";

/// Parse a Kubernetes quantity and return `ceil(quantity * scale)`.
///
/// Accepts a decimal mantissa with an optional decimal exponent (`1.5e3`) or
/// one binary/SI suffix. Arithmetic is exact in i128; fractional results round
/// up like `resource.Quantity::Value`.
fn parse_scaled(kind: ResourceKind, s: &str, scale: i128) -> Result<i64> {
    let invalid = |reason: &str| CoreError::invalid_quantity(kind.as_str(), s, reason);

    let (number, multiplier, suffix_power) = SUFFIXES
        .iter()
        .find_map(|(suffix, mult, power)| s.strip_suffix(suffix).map(|n| (n, *mult, *power)))
        .unwrap_or((s, 1, 0));

    let (mantissa, exponent) = match number.find(|c: char| c == 'e' || c == 'E') {
        Some(idx) => {
            let exponent = number[idx + 1..]
                .parse::<i32>()
                .map_err(|e| invalid(&format!("invalid exponent: {}", e)))?;
            (&number[..idx], i64::from(exponent))
        }
        None => (number, 0),
    };

    if mantissa.starts_with('-') {
        return Err(invalid("quantity must not be negative"));
    }
    let mantissa = mantissa.strip_prefix('+').unwrap_or(mantissa);
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (whole.is_empty() && fraction.is_empty())
        || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(invalid("expected a decimal number"));
    }

    let digits = format!("{}{}", whole, fraction)
        .parse::<i128>()
        .map_err(|_| invalid(OVERFLOW))?;
    if digits == 0 {
        return Ok(0);
    }

    let value = digits
        .checked_mul(multiplier)
        .and_then(|v| v.checked_mul(scale))
        .ok_or_else(|| invalid(OVERFLOW))?;

    let power = exponent + suffix_power - fraction.len() as i64;
    let value = if power >= 0 {
        u32::try_from(power)
            .ok()
            .and_then(|p| 10i128.checked_pow(p))
            .and_then(|factor| value.checked_mul(factor))
            .ok_or_else(|| invalid(OVERFLOW))?
    } else {
        match u32::try_from(-power).ok().and_then(|p| 10i128.checked_pow(p)) {
            Some(divisor) => value / divisor + i128::from(value % divisor != 0),
            // Smaller than one unit but not zero
            None => 1,
        }
    };

    i64::try_from(value).map_err(|_| invalid(OVERFLOW))
}

impl AddAssign for ResourceQuantities {
    fn add_assign(&mut self, rhs: Self) {
        self.cpu_millicores = self.cpu_millicores.saturating_add(rhs.cpu_millicores);
        self.memory_bytes = self.memory_bytes.saturating_add(rhs.memory_bytes);
    }
}
