//! High-level dispenser interface

use std::time::Duration;

use tracing::{debug, info, warn};

use puloon_core::{Frame, Opcode, constants::RESET_SETTLE_TIME};
use puloon_transport::{Link, SerialLink};
use puloon_types::{Cassette, DispenseOrder, DispenseRequest};

use crate::commands::*;
use crate::engine::{ProtocolEngine, Timeouts};
use crate::error::Result;

/// Puloon LCDM-4000 dispenser
///
/// # Examples
///
/// ```no_run
/// use puloon::{Dispenser, DispenseRequest};
///
/// #[tokio::main]
/// async fn main() -> puloon::Result<()> {
///     let mut dispenser = Dispenser::serial("/dev/ttyUSB0");
///     dispenser.open().await?;
///
///     let status = dispenser.status().await?;
///     println!("Sensors: {:?}", status.sensors);
///
///     let result = dispenser.dispense(DispenseRequest::new([2, 0, 0, 0])?).await?;
///     println!("Dispensed {} notes", result.total_exit());
///
///     dispenser.close().await?;
///     Ok(())
/// }
/// ```
pub struct Dispenser {
    engine: ProtocolEngine,
}

impl Dispenser {
    /// Create a dispenser over any link
    pub fn new(link: impl Link + 'static) -> Self {
        Self {
            engine: ProtocolEngine::new(Box::new(link)),
        }
    }

    /// Create a dispenser on a serial port at the default line speed
    pub fn serial(path: impl Into<String>) -> Self {
        Self::new(SerialLink::new(path))
    }

    /// Set handshake timeouts
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.engine = self.engine.with_timeouts(timeouts);
        self
    }

    /// Check if the link is open
    pub fn is_open(&self) -> bool {
        self.engine.is_open()
    }

    /// Open the link
    pub async fn open(&mut self) -> Result<()> {
        info!("Opening dispenser on {}...", self.engine.link_mut().name());
        self.engine.open().await
    }

    /// Close the link
    pub async fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }

        info!("Closing dispenser on {}...", self.engine.link_mut().name());
        self.engine.close().await
    }

    /// Reset the dispenser by software
    ///
    /// The dispenser does not answer; this waits until it has finished
    /// reinitializing.
    pub async fn reset(&mut self) -> Result<()> {
        info!("Resetting dispenser");
        self.engine
            .send(&Frame::command(Opcode::Reset, Vec::new()))
            .await?;

        tokio::time::sleep(RESET_SETTLE_TIME).await;
        Ok(())
    }

    /// Read sensor states and cassette configuration
    pub async fn status(&mut self) -> Result<StatusResponse> {
        let status = self.engine.execute(&Status).await?;

        if !status.sensors.path_clear() {
            warn!("Note path blocked: {:?}", status.sensors);
        }

        Ok(status)
    }

    /// Move every note left in the path to the reject tray
    pub async fn purge(&mut self) -> Result<PurgeResponse> {
        info!("Purging");
        self.engine.execute(&Purge).await
    }

    /// Dispense notes to the exit
    ///
    /// # Errors
    ///
    /// A device error carries the response frame; notes may have moved, so
    /// check [`Dispenser::last_status`] before dispensing again.
    pub async fn dispense(&mut self, request: DispenseRequest) -> Result<DispenseResponse> {
        info!("Dispensing {:?}", request.quantities());
        let response = self.engine.execute(&Dispense(request)).await?;

        debug!(
            "Dispensed {} notes, {} rejected",
            response.total_exit(),
            response.total_rejected()
        );

        Ok(response)
    }

    /// Pick notes straight into the reject tray
    pub async fn test_dispense(&mut self, request: DispenseRequest) -> Result<DispenseResponse> {
        info!("Test dispensing {:?}", request.quantities());
        self.engine.execute(&TestDispense(request)).await
    }

    /// Result of the last purge, dispense or test dispense
    pub async fn last_status(&mut self) -> Result<LastStatusResponse> {
        self.engine.execute(&LastStatus).await
    }

    /// Pick five notes from `cassette` into the reject tray and measure them
    pub async fn sensor_diagnostics(
        &mut self,
        cassette: Cassette,
    ) -> Result<SensorDiagnosticsResponse> {
        info!("Running sensor diagnostics on {} cassette", cassette);
        self.engine.execute(&SensorDiagnostics(cassette)).await
    }

    /// Store opacity references, top to bottom; `0` keeps the current value
    pub async fn set_bill_opacities(&mut self, opacities: [u8; 4]) -> Result<()> {
        self.engine.execute(&SetBillOpacities(opacities)).await?;
        Ok(())
    }

    /// Read opacity references
    pub async fn get_bill_opacities(&mut self) -> Result<ReferenceValues> {
        self.engine.execute(&GetBillOpacities).await
    }

    /// Store the order cassettes are emptied in
    pub async fn set_dispense_order(&mut self, order: DispenseOrder) -> Result<()> {
        self.engine.execute(&SetDispenseOrder(order)).await?;
        Ok(())
    }

    /// Read the order cassettes are emptied in
    pub async fn get_dispense_order(&mut self) -> Result<DispenseOrder> {
        Ok(self.engine.execute(&GetDispenseOrder).await?.order)
    }

    /// Store length references, top to bottom; `0` keeps the current value
    pub async fn set_bill_lengths(&mut self, lengths: [u8; 4]) -> Result<()> {
        self.engine.execute(&SetBillLengths(lengths)).await?;
        Ok(())
    }

    /// Read length references
    pub async fn get_bill_lengths(&mut self) -> Result<ReferenceValues> {
        self.engine.execute(&GetBillLengths).await
    }

    /// Handshake timeouts in use
    pub fn timeouts(&self) -> Timeouts {
        self.engine.timeouts()
    }

    /// Time to wait after [`Dispenser::reset`] before the next command
    pub const fn reset_settle_time() -> Duration {
        RESET_SETTLE_TIME
    }
}
