//! Liquid transfer records.

use std::fmt;

use mb_core::units::{Volume, in_ul};
use serde::{Deserialize, Serialize};

/// One pipetting step: move `volume` from `source` to `dest`.
///
/// Created when a balanced mixture is materialized and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferAction {
    source: String,
    dest: Option<String>,
    volume: Volume,
}

impl TransferAction {
    pub fn new(source: impl Into<String>, dest: Option<String>, volume: Volume) -> Self {
        Self {
            source: source.into(),
            dest,
            volume,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Destination location; `None` when the target was specified without one.
    pub fn dest(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn to_record(&self) -> TransferRecord {
        TransferRecord {
            source: self.source.clone(),
            dest: self.dest.clone(),
            volume_ul: in_ul(self.volume),
        }
    }
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Transfer Vol:{:4.3} ul {}-->{}>",
            in_ul(self.volume),
            self.source,
            self.dest.as_deref().unwrap_or("?")
        )
    }
}

/// Wire shape of a [`TransferAction`], volume in microlitres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    pub volume_ul: f64,
}
