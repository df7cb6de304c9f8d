use std::fmt;
use std::process;
use std::str::FromStr;

use crate::error::FacilityError;

/// Target triple of the host, `arch-vendor-os[-env]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTriple {
    pub arch: String,
    pub vendor: String,
    pub os: String,
    pub environment: Option<String>,
}

impl HostTriple {
    /// Triple describing the platform this binary was compiled for.
    pub fn native() -> Self {
        let vendor = if cfg!(target_vendor = "apple") {
            "apple"
        } else if cfg!(target_vendor = "pc") {
            "pc"
        } else {
            "unknown"
        };
        let environment = if cfg!(target_env = "gnu") {
            Some("gnu")
        } else if cfg!(target_env = "musl") {
            Some("musl")
        } else if cfg!(target_env = "msvc") {
            Some("msvc")
        } else {
            None
        };

        Self {
            arch: std::env::consts::ARCH.to_string(),
            vendor: vendor.to_string(),
            os: std::env::consts::OS.to_string(),
            environment: environment.map(str::to_string),
        }
    }
}

fn is_valid_component(component: &str) -> bool {
    !component.is_empty()
        && component
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl FromStr for HostTriple {
    type Err = FacilityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split('-').collect();
        if !(3..=4).contains(&parts.len()) || !parts.iter().all(|part| is_valid_component(part)) {
            return Err(FacilityError::InvalidTriple(value.to_string()));
        }

        Ok(Self {
            arch: parts[0].to_string(),
            vendor: parts[1].to_string(),
            os: parts[2].to_string(),
            environment: parts.get(3).map(|env| env.to_string()),
        })
    }
}

impl fmt::Display for HostTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.vendor, self.os)?;
        if let Some(env) = &self.environment {
            write!(f, "-{env}")?;
        }
        Ok(())
    }
}

/// Cached facts about the host the debugger runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    triple: HostTriple,
    process_id: u32,
}

impl HostInfo {
    pub(crate) const NAME: &'static str = "host info";

    pub(crate) fn resolve(triple_override: Option<&str>) -> Result<Self, FacilityError> {
        let triple = match triple_override {
            Some(value) => value.parse::<HostTriple>()?,
            None => HostTriple::native(),
        };

        Ok(Self {
            triple,
            process_id: process::id(),
        })
    }

    pub fn triple(&self) -> &HostTriple {
        &self.triple
    }

    pub fn process_id(&self) -> u32 {
        self.process_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_and_four_component_triples() {
        let triple: HostTriple = "aarch64-apple-darwin".parse().unwrap();
        assert_eq!(triple.arch, "aarch64");
        assert_eq!(triple.environment, None);

        let triple: HostTriple = "x86_64-unknown-linux-gnu".parse().unwrap();
        assert_eq!(triple.os, "linux");
        assert_eq!(triple.environment.as_deref(), Some("gnu"));
        assert_eq!(triple.to_string(), "x86_64-unknown-linux-gnu");
    }

    #[test]
    fn rejects_malformed_triples() {
        for value in ["x86_64", "x86_64--linux", "a-b-c-d-e", "x86 64-pc-linux"] {
            let err = value.parse::<HostTriple>().expect_err(value);
            assert!(matches!(err, FacilityError::InvalidTriple(v) if v == value));
        }
    }

    #[test]
    fn native_triple_round_trips_through_parser() {
        let native = HostTriple::native();
        let reparsed: HostTriple = native.to_string().parse().expect("native triple parses");
        assert_eq!(reparsed, native);
    }

    #[test]
    fn resolve_prefers_override() {
        let info = HostInfo::resolve(Some("riscv64-unknown-linux")).unwrap();
        assert_eq!(info.triple().arch, "riscv64");
        assert_eq!(info.process_id(), std::process::id());
    }
}
