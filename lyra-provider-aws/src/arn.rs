//! Amazon Resource Names

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static ARN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:[\w-]+:([a-zA-Z0-9\-])+:([a-z]{2}-(gov-)?[a-z]+-\d{1})?:(\d{12})?:(.*)$")
        .expect("ARN pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid ARN {value:?}: {reason}")]
pub struct ArnError {
    pub value: String,
    pub reason: &'static str,
}

/// A parsed ARN: `arn:<partition>:<service>:<region>:<account>:<resource>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    pub fn new(
        partition: impl Into<String>,
        service: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.into(),
            service: service.into(),
            region: region.into(),
            account_id: account_id.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

impl FromStr for Arn {
    type Err = ArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ArnError {
            value: s.to_string(),
            reason,
        };

        let mut parts = s.splitn(6, ':');
        if parts.next() != Some("arn") {
            return Err(err("missing 'arn:' prefix"));
        }
        let mut next = |reason| parts.next().ok_or_else(|| err(reason));
        let partition = next("missing partition")?;
        let service = next("missing service")?;
        let region = next("missing region")?;
        let account_id = next("missing account id")?;
        let resource = next("missing resource")?;

        if partition.is_empty() || service.is_empty() || resource.is_empty() {
            return Err(err("partition, service and resource must not be empty"));
        }

        Ok(Arn::new(partition, service, region, account_id, resource))
    }
}

/// Validate a string as an ARN (partition, service, region and account shapes)
pub fn validate(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    if ARN_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(format!("{:?} is not a valid ARN", value))
    }
}
