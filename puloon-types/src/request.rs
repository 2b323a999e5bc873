//! Validated request parameters

use std::collections::HashSet;

use crate::cassette::Cassette;
use crate::error::{Error, Result};

/// Notes to dispense from each cassette in one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenseRequest {
    quantities: [u8; 4],
    timeout_secs: u8,
}

impl DispenseRequest {
    /// Maximum notes per transaction, across all cassettes
    pub const MAX_TOTAL: u16 = 40;

    /// Maximum per-note timeout in seconds
    pub const MAX_TIMEOUT_SECS: u8 = 9;

    /// Create a request, quantities indexed top to bottom
    ///
    /// # Errors
    ///
    /// Fails unless every quantity and the total lie within `1..=40` notes
    /// (individual cassettes may be `0`).
    ///
    /// # Examples
    ///
    /// ```
    /// use puloon_types::DispenseRequest;
    ///
    /// let request = DispenseRequest::new([5, 0, 2, 0]).unwrap();
    /// assert_eq!(request.total(), 7);
    ///
    /// assert!(DispenseRequest::new([0, 0, 0, 0]).is_err());
    /// assert!(DispenseRequest::new([30, 20, 0, 0]).is_err());
    /// ```
    pub fn new(quantities: [u8; 4]) -> Result<Self> {
        let total: u16 = quantities.iter().map(|&q| u16::from(q)).sum();

        if total == 0 || total > Self::MAX_TOTAL {
            return Err(Error::Validation(format!(
                "total quantity must be 1..={}, got {}",
                Self::MAX_TOTAL,
                total
            )));
        }

        Ok(Self {
            quantities,
            timeout_secs: 0,
        })
    }

    /// Request notes from a single cassette
    pub fn single(cassette: Cassette, quantity: u8) -> Result<Self> {
        let mut quantities = [0; 4];
        quantities[cassette.index()] = quantity;
        Self::new(quantities)
    }

    /// Set the timeout (`1..=9` seconds, `0` for the device default)
    pub fn with_timeout(mut self, secs: u8) -> Result<Self> {
        if secs > Self::MAX_TIMEOUT_SECS {
            return Err(Error::Validation(format!(
                "timeout must be 0..={} seconds, got {}",
                Self::MAX_TIMEOUT_SECS,
                secs
            )));
        }
        self.timeout_secs = secs;
        Ok(self)
    }

    /// Quantity requested from `cassette`
    pub fn quantity(&self, cassette: Cassette) -> u8 {
        self.quantities[cassette.index()]
    }

    /// Quantities, top to bottom
    pub fn quantities(&self) -> [u8; 4] {
        self.quantities
    }

    /// Total notes requested
    pub fn total(&self) -> u16 {
        self.quantities.iter().map(|&q| u16::from(q)).sum()
    }

    /// Timeout in seconds, `0` when unset
    pub fn timeout_secs(&self) -> u8 {
        self.timeout_secs
    }
}

/// Order in which cassettes are emptied during a dispense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenseOrder([Cassette; 4]);

impl DispenseOrder {
    /// Create an order; every cassette must appear exactly once
    pub fn new(order: [Cassette; 4]) -> Result<Self> {
        let unique: HashSet<Cassette> = order.iter().copied().collect();
        if unique.len() != order.len() {
            return Err(Error::Validation(format!(
                "dispense order must list each cassette once, got {:?}",
                order
            )));
        }
        Ok(Self(order))
    }

    /// Cassettes in pick order
    pub fn cassettes(&self) -> [Cassette; 4] {
        self.0
    }
}

impl Default for DispenseOrder {
    fn default() -> Self {
        Self(Cassette::ALL)
    }
}
