//! LCDM-4000 command catalog
//!
//! Each command describes its payload; each response parses the body the
//! dispenser answers with. Counts and measurements travel biased by `0x20`,
//! cassette numbers and types by `0x30`.

use bytes::{BufMut, Bytes, BytesMut};

use puloon_core::{
    Bias, Command, Error, Opcode, Response, Result,
    bias::{decode_hex_pair, encode_hex_pair},
    constants::{CASSETTE_COUNT, dispense},
};
use puloon_types::{
    Cassette, CassetteCount, CassetteSlot, DispenseOrder, DispenseRequest, SensorFlags,
};

/// Layout checks in this module go through the core error type
fn field<T>(result: puloon_types::Result<T>) -> Result<T> {
    result.map_err(|e| Error::InvalidFrame(e.to_string()))
}

fn slot(type_byte: u8) -> Result<CassetteSlot> {
    field(CassetteSlot::from_type(Bias::Digit.decode(type_byte)?))
}

/// Parse four `(exit, reject, type)` triples
fn parse_counts(bytes: &[u8]) -> Result<[CassetteCount; CASSETTE_COUNT]> {
    let mut counts = [CassetteCount::default(); CASSETTE_COUNT];

    for (count, chunk) in counts.iter_mut().zip(bytes.chunks_exact(3)) {
        *count = CassetteCount {
            exit: Bias::Count.decode(chunk[0])?,
            rejected: Bias::Count.decode(chunk[1])?,
            present: slot(chunk[2])?.is_present(),
        };
    }

    Ok(counts)
}

fn parse_hex_values(bytes: &[u8]) -> Result<[u8; CASSETTE_COUNT]> {
    let mut values = [0; CASSETTE_COUNT];
    for (value, pair) in values.iter_mut().zip(bytes.chunks_exact(2)) {
        *value = decode_hex_pair([pair[0], pair[1]])?;
    }
    Ok(values)
}

fn hex_payload(values: &[u8; CASSETTE_COUNT]) -> Bytes {
    values.iter().flat_map(|&v| encode_hex_pair(v)).collect()
}

/// Reply carrying nothing but the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledged;

impl Response for Acknowledged {
    const BODY_LEN: usize = 1;

    fn parse_body(_body: &[u8]) -> Result<Self> {
        Ok(Self)
    }
}

// --- Status ---

/// Sensor states and cassette configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct Status;

/// Configuration of one cassette position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CassetteStatus {
    /// Raw STAT byte
    pub status: u8,
    pub slot: CassetteSlot,
    /// Thickness reference value
    pub opacity: u8,
    /// Length reference value
    pub length: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    /// Path sensors currently blocked
    pub sensors: SensorFlags,
    /// Cassettes, top to bottom
    pub cassettes: [CassetteStatus; CASSETTE_COUNT],
}

impl Command for Status {
    type Response = StatusResponse;
    const OPCODE: Opcode = Opcode::Status;
}

impl Response for StatusResponse {
    const BODY_LEN: usize = 2 + 4 * CASSETTE_COUNT;

    fn parse_body(body: &[u8]) -> Result<Self> {
        let mut cassettes = [CassetteStatus {
            status: 0,
            slot: CassetteSlot::Removed,
            opacity: 0,
            length: 0,
        }; CASSETTE_COUNT];

        for (cassette, chunk) in cassettes.iter_mut().zip(body[2..].chunks_exact(4)) {
            *cassette = CassetteStatus {
                status: chunk[0],
                slot: slot(chunk[1])?,
                opacity: Bias::Count.decode(chunk[2])?,
                length: Bias::Count.decode(chunk[3])?,
            };
        }

        Ok(Self {
            sensors: SensorFlags::from_disp(body[1]),
            cassettes,
        })
    }
}

// --- Purge ---

/// Clear the note path into the reject tray
#[derive(Debug, Clone, Copy, Default)]
pub struct Purge;

/// Notes moved by a purge, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeResponse {
    pub counts: [CassetteCount; CASSETTE_COUNT],
}

impl Command for Purge {
    type Response = PurgeResponse;
    const OPCODE: Opcode = Opcode::Purge;
}

impl Response for PurgeResponse {
    const BODY_LEN: usize = 2 + 3 * CASSETTE_COUNT;

    fn parse_body(body: &[u8]) -> Result<Self> {
        Ok(Self {
            counts: parse_counts(&body[2..])?,
        })
    }
}

// --- Dispense / test dispense ---

fn dispense_payload(request: &DispenseRequest) -> Bytes {
    let mut buf = BytesMut::with_capacity(6 + dispense::RESERVED_LEN);

    // Quantities are validated to at most 40, well inside the bias range
    for quantity in request.quantities() {
        buf.put_u8(Bias::Count.offset() + quantity);
    }

    match request.timeout_secs() {
        0 => {
            buf.put_u8(dispense::FILLER);
            buf.put_u8(dispense::FILLER);
        }
        secs => {
            buf.put_u8(dispense::TIMEOUT_MARKER);
            buf.put_u8(Bias::Digit.offset() + secs);
        }
    }

    buf.put_bytes(dispense::FILLER, dispense::RESERVED_LEN);
    buf.freeze()
}

/// Dispense notes to the exit
#[derive(Debug, Clone, Copy)]
pub struct Dispense(pub DispenseRequest);

/// Dispense notes straight into the reject tray
#[derive(Debug, Clone, Copy)]
pub struct TestDispense(pub DispenseRequest);

/// Notes moved by a dispense or test dispense, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenseResponse {
    pub counts: [CassetteCount; CASSETTE_COUNT],
}

impl DispenseResponse {
    /// Notes that reached the exit, all cassettes
    pub fn total_exit(&self) -> u16 {
        self.counts.iter().map(|c| u16::from(c.exit)).sum()
    }

    /// Notes diverted to the reject tray, all cassettes
    pub fn total_rejected(&self) -> u16 {
        self.counts.iter().map(|c| u16::from(c.rejected)).sum()
    }
}

impl Command for Dispense {
    type Response = DispenseResponse;
    const OPCODE: Opcode = Opcode::Dispense;

    fn payload(&self) -> Bytes {
        dispense_payload(&self.0)
    }
}

impl Command for TestDispense {
    type Response = DispenseResponse;
    const OPCODE: Opcode = Opcode::TestDispense;

    fn payload(&self) -> Bytes {
        dispense_payload(&self.0)
    }
}

impl Response for DispenseResponse {
    const BODY_LEN: usize = PurgeResponse::BODY_LEN + dispense::RESERVED_LEN;

    fn parse_body(body: &[u8]) -> Result<Self> {
        Ok(Self {
            counts: parse_counts(&body[2..PurgeResponse::BODY_LEN])?,
        })
    }
}

// --- Last status ---

/// Repeat the result of the last purge, dispense or test dispense
#[derive(Debug, Clone, Copy, Default)]
pub struct LastStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastStatusResponse {
    /// Opcode of the operation being reported
    pub last_opcode: u8,
    pub counts: [CassetteCount; CASSETTE_COUNT],
}

impl LastStatusResponse {
    /// Parse the reported opcode
    pub fn last_command(&self) -> Option<Opcode> {
        Opcode::try_from(self.last_opcode).ok()
    }
}

impl Command for LastStatus {
    type Response = LastStatusResponse;
    const OPCODE: Opcode = Opcode::LastStatus;
}

impl Response for LastStatusResponse {
    const BODY_LEN: usize = 3 + 3 * CASSETTE_COUNT;
    const ERROR_INDEX: usize = 1;

    fn parse_body(body: &[u8]) -> Result<Self> {
        Ok(Self {
            last_opcode: body[0],
            counts: parse_counts(&body[3..])?,
        })
    }
}

// --- Sensor diagnostics ---

/// Pick five notes from a cassette into the reject tray and measure the last
#[derive(Debug, Clone, Copy)]
pub struct SensorDiagnostics(pub Cassette);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDiagnosticsResponse {
    /// Opacity of the last picked note
    pub opacity: u8,
    /// Length of the last picked note
    pub length: u8,
    /// Diverter solenoid operation time in ms
    pub divert_ms: u8,
    /// Reject events
    pub rejected: u8,
}

impl Command for SensorDiagnostics {
    type Response = SensorDiagnosticsResponse;
    const OPCODE: Opcode = Opcode::SensorDiagnostics;

    fn payload(&self) -> Bytes {
        Bytes::copy_from_slice(&[Bias::Digit.offset() + self.0.number()])
    }
}

impl Response for SensorDiagnosticsResponse {
    const BODY_LEN: usize = 5;

    fn parse_body(body: &[u8]) -> Result<Self> {
        Ok(Self {
            opacity: Bias::Count.decode(body[1])?,
            length: Bias::Count.decode(body[2])?,
            divert_ms: Bias::Count.decode(body[3])?,
            rejected: Bias::Count.decode(body[4])?,
        })
    }
}

// --- Reference values ---

/// Store double-note opacity references, top to bottom (`0` keeps the current value)
#[derive(Debug, Clone, Copy)]
pub struct SetBillOpacities(pub [u8; CASSETTE_COUNT]);

/// Read the stored opacity references
#[derive(Debug, Clone, Copy, Default)]
pub struct GetBillOpacities;

/// Store double-note length references, top to bottom (`0` keeps the current value)
#[derive(Debug, Clone, Copy)]
pub struct SetBillLengths(pub [u8; CASSETTE_COUNT]);

/// Read the stored length references
#[derive(Debug, Clone, Copy, Default)]
pub struct GetBillLengths;

/// One reference value per cassette, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceValues(pub [u8; CASSETTE_COUNT]);

impl ReferenceValues {
    /// Value for `cassette`
    pub fn get(&self, cassette: Cassette) -> u8 {
        self.0[cassette.index()]
    }
}

impl Command for SetBillOpacities {
    type Response = Acknowledged;
    const OPCODE: Opcode = Opcode::SetBillOpacities;

    fn payload(&self) -> Bytes {
        hex_payload(&self.0)
    }
}

impl Command for GetBillOpacities {
    type Response = ReferenceValues;
    const OPCODE: Opcode = Opcode::GetBillOpacities;
}

impl Command for SetBillLengths {
    type Response = Acknowledged;
    const OPCODE: Opcode = Opcode::SetBillLengths;

    fn payload(&self) -> Bytes {
        hex_payload(&self.0)
    }
}

impl Command for GetBillLengths {
    type Response = ReferenceValues;
    const OPCODE: Opcode = Opcode::GetBillLengths;
}

impl Response for ReferenceValues {
    const BODY_LEN: usize = 1 + 2 * CASSETTE_COUNT;

    fn parse_body(body: &[u8]) -> Result<Self> {
        Ok(Self(parse_hex_values(&body[1..])?))
    }
}

// --- Dispense order ---

/// Store the order cassettes are emptied in
#[derive(Debug, Clone, Copy)]
pub struct SetDispenseOrder(pub DispenseOrder);

/// Read the stored dispense order
#[derive(Debug, Clone, Copy, Default)]
pub struct GetDispenseOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenseOrderResponse {
    pub order: DispenseOrder,
}

impl Command for SetDispenseOrder {
    type Response = Acknowledged;
    const OPCODE: Opcode = Opcode::SetDispenseOrder;

    fn payload(&self) -> Bytes {
        self.0
            .cassettes()
            .iter()
            .map(|c| Bias::Digit.offset() + c.number())
            .collect()
    }
}

impl Command for GetDispenseOrder {
    type Response = DispenseOrderResponse;
    const OPCODE: Opcode = Opcode::GetDispenseOrder;
}

impl Response for DispenseOrderResponse {
    const BODY_LEN: usize = 1 + CASSETTE_COUNT;

    fn parse_body(body: &[u8]) -> Result<Self> {
        let mut order = [Cassette::Top; CASSETTE_COUNT];
        for (cassette, &byte) in order.iter_mut().zip(&body[1..]) {
            *cassette = field(Cassette::try_from(Bias::Digit.decode(byte)?))?;
        }

        Ok(Self {
            order: field(DispenseOrder::new(order))?,
        })
    }
}
