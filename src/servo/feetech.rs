// Feetech STS serial bus in position mode
//
// Packet format: [0xFF, 0xFF, ID, Length, Instruction, Params..., Checksum]
// Each leg joint is one servo; the joint angle in [0, 180] maps onto the
// middle half of the 12-bit position range, centred on 2048.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use super::{ServoError, ServoOutput};

/// Default serial configuration for the leg servos
pub const DEFAULT_BAUDRATE: u32 = 1_000_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 20;

/// Encoder counts per full turn
pub const COUNTS_PER_TURN: f32 = 4096.0;

/// Encoder count at joint angle 90
pub const CENTER_POSITION: u16 = 2048;

const HEADER: [u8; 2] = [0xFF, 0xFF];

#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Ping = 0x01,
    Read = 0x02,
    Write = 0x03,
}

/// Control table addresses
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Register {
    OperatingMode = 33,   // 1 byte: 0=position
    TorqueEnable = 40,    // 1 byte
    GoalPosition = 42,    // 2 bytes
    Lock = 55,            // 1 byte
    PresentPosition = 56, // 2 bytes, read-only
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatingMode {
    Position = 0,
}

#[derive(Debug, thiserror::Error)]
pub enum FeetechError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from servo {id}: {reason}")]
    InvalidResponse { id: u8, reason: String },

    #[error("Checksum mismatch for servo {id}")]
    ChecksumMismatch { id: u8 },

    #[error("Servo {id} returned error status: 0x{status:02X}")]
    ServoStatus { id: u8, status: u8 },

    #[error("Timeout waiting for response from servo {id}")]
    Timeout { id: u8 },
}

pub type Result<T> = std::result::Result<T, FeetechError>;

/// Joint angle (degrees) to goal position counts
pub fn angle_to_position(angle: f32) -> u16 {
    let counts = CENTER_POSITION as f32 + (angle - 90.0) * COUNTS_PER_TURN / 360.0;
    counts.round().clamp(0.0, COUNTS_PER_TURN - 1.0) as u16
}

/// Present position counts to joint angle (degrees)
pub fn position_to_angle(position: u16) -> f32 {
    90.0 + (position as f32 - CENTER_POSITION as f32) * 360.0 / COUNTS_PER_TURN
}

fn checksum(data: &[u8]) -> u8 {
    let sum: u16 = data.iter().map(|&b| b as u16).sum();
    (!sum & 0xFF) as u8
}

fn build_packet(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
    let length = (params.len() + 2) as u8; // instruction + params + checksum
    let mut packet = Vec::with_capacity(6 + params.len());

    packet.extend_from_slice(&HEADER);
    packet.push(id);
    packet.push(length);
    packet.push(instruction as u8);
    packet.extend_from_slice(params);
    packet.push(checksum(&packet[2..]));

    packet
}

/// One half-duplex serial bus shared by every leg servo
pub struct FeetechBus {
    port: Box<dyn SerialPort>,
}

impl FeetechBus {
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        info!("Opening servo bus on {} at {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;
        Ok(Self { port })
    }

    fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read a status packet and return its parameters
    fn read_response(&mut self, expected_id: u8) -> Result<Vec<u8>> {
        let mut header = [0u8; 2];
        self.port.read_exact(&mut header).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                FeetechError::Timeout { id: expected_id }
            } else {
                FeetechError::Io(e)
            }
        })?;
        if header != HEADER {
            return Err(FeetechError::InvalidResponse {
                id: expected_id,
                reason: format!("Invalid header: {:02X?}", header),
            });
        }

        let mut id_length = [0u8; 2];
        self.port.read_exact(&mut id_length)?;
        let [id, length] = id_length;
        if id != expected_id {
            return Err(FeetechError::InvalidResponse {
                id: expected_id,
                reason: format!("ID mismatch: expected {}, got {}", expected_id, id),
            });
        }
        if length < 2 {
            return Err(FeetechError::InvalidResponse {
                id,
                reason: format!("Length {} too short", length),
            });
        }

        // error byte + params + checksum
        let mut body = vec![0u8; length as usize];
        self.port.read_exact(&mut body)?;
        parse_status(id, length, &body)
    }

    pub fn ping(&mut self, id: u8) -> Result<bool> {
        self.send_packet(&build_packet(id, Instruction::Ping, &[]))?;
        match self.read_response(id) {
            Ok(_) => Ok(true),
            Err(FeetechError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn write_u8(&mut self, id: u8, register: Register, value: u8) -> Result<()> {
        debug!("Write u8 to servo {}: reg={:?}, value={}", id, register, value);
        self.send_packet(&build_packet(id, Instruction::Write, &[register as u8, value]))?;
        self.read_response(id)?;
        Ok(())
    }

    /// Write two bytes (little-endian)
    pub fn write_u16(&mut self, id: u8, register: Register, value: u16) -> Result<()> {
        let [lo, hi] = value.to_le_bytes();
        debug!("Write u16 to servo {}: reg={:?}, value={}", id, register, value);
        self.send_packet(&build_packet(id, Instruction::Write, &[register as u8, lo, hi]))?;
        self.read_response(id)?;
        Ok(())
    }

    pub fn read_u16(&mut self, id: u8, register: Register) -> Result<u16> {
        self.send_packet(&build_packet(id, Instruction::Read, &[register as u8, 2]))?;
        let response = self.read_response(id)?;
        match response[..] {
            [lo, hi, ..] => Ok(u16::from_le_bytes([lo, hi])),
            _ => Err(FeetechError::InvalidResponse {
                id,
                reason: format!("Expected 2 bytes, got {}", response.len()),
            }),
        }
    }

    pub fn enable_torque(&mut self, id: u8) -> Result<()> {
        self.write_u8(id, Register::TorqueEnable, 1)?;
        self.write_u8(id, Register::Lock, 1)
    }

    pub fn disable_torque(&mut self, id: u8) -> Result<()> {
        self.write_u8(id, Register::TorqueEnable, 0)?;
        self.write_u8(id, Register::Lock, 0)
    }

    /// Must be called with torque disabled
    pub fn set_operating_mode(&mut self, id: u8, mode: OperatingMode) -> Result<()> {
        self.write_u8(id, Register::OperatingMode, mode as u8)
    }

    pub fn set_angle(&mut self, id: u8, angle: f32) -> Result<()> {
        self.write_u16(id, Register::GoalPosition, angle_to_position(angle))
    }

    pub fn get_angle(&mut self, id: u8) -> Result<f32> {
        let raw = self.read_u16(id, Register::PresentPosition)?;
        Ok(position_to_angle(raw))
    }
}

/// Validate a status packet body (error byte, params, checksum)
fn parse_status(id: u8, length: u8, body: &[u8]) -> Result<Vec<u8>> {
    let Some((&received, rest)) = body.split_last() else {
        return Err(FeetechError::InvalidResponse {
            id,
            reason: "Empty status packet".to_string(),
        });
    };

    let mut checked = vec![id, length];
    checked.extend_from_slice(rest);
    if checksum(&checked) != received {
        return Err(FeetechError::ChecksumMismatch { id });
    }

    match rest.split_first() {
        Some((&0, params)) => Ok(params.to_vec()),
        Some((&status, _)) => Err(FeetechError::ServoStatus { id, status }),
        None => Err(FeetechError::InvalidResponse {
            id,
            reason: "Missing error byte".to_string(),
        }),
    }
}

impl ServoOutput for FeetechBus {
    fn prepare(&mut self, channels: &[u8]) -> std::result::Result<(), ServoError> {
        for &id in channels {
            if !self.ping(id)? {
                return Err(ServoError::Disconnected { channel: id });
            }
            debug!("Servo {} responding", id);
        }
        for &id in channels {
            self.disable_torque(id)?;
            self.set_operating_mode(id, OperatingMode::Position)?;
            self.enable_torque(id)?;
        }
        info!("{} servos in position mode", channels.len());
        Ok(())
    }

    fn write_angle(&mut self, channel: u8, angle: f32) -> std::result::Result<(), ServoError> {
        self.set_angle(channel, angle)?;
        Ok(())
    }

    /// Tries every channel; reports the first failure
    fn release(&mut self, channels: &[u8]) -> std::result::Result<(), ServoError> {
        let mut first_err = None;
        for &id in channels {
            if let Err(e) = self.disable_torque(id) {
                debug!("Torque off failed for servo {}: {}", id, e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum() {
        // ID=1, Length=4, Instruction=WRITE, Addr=30, Data=0, 2
        let data = [1u8, 4, 0x03, 30, 0, 2];
        // ~(1+4+3+30+0+2) = ~40 = 215
        assert_eq!(checksum(&data), 215);
    }

    #[test]
    fn test_build_goal_position_packet() {
        let [lo, hi] = angle_to_position(90.0).to_le_bytes();
        let packet = build_packet(9, Instruction::Write, &[Register::GoalPosition as u8, lo, hi]);
        println!("packet: {:02X?}", packet);

        assert_eq!(&packet[..5], &[0xFF, 0xFF, 9, 5, 0x03]);
        assert_eq!(&packet[5..8], &[42, 0x00, 0x08]);
        assert_eq!(packet[8], checksum(&packet[2..8]));
    }

    #[test]
    fn test_angle_position_mapping() {
        assert_eq!(angle_to_position(90.0), 2048);
        assert_eq!(angle_to_position(0.0), 1024);
        assert_eq!(angle_to_position(180.0), 3072);
        assert_eq!(position_to_angle(2048), 90.0);
        assert_eq!(position_to_angle(3072), 180.0);

        // Out of range angles saturate at the encoder limits
        assert_eq!(angle_to_position(-1000.0), 0);
        assert_eq!(angle_to_position(1000.0), 4095);
    }

    #[test]
    fn test_parse_status() {
        // id 4, length 4: error 0, two params, checksum
        let mut body = vec![0u8, 0x00, 0x08];
        body.push(checksum(&[4, 4, 0, 0x00, 0x08]));
        assert_eq!(parse_status(4, 4, &body).unwrap(), vec![0x00, 0x08]);

        let mut bad = body.clone();
        bad[1] ^= 0x01;
        assert!(matches!(parse_status(4, 4, &bad), Err(FeetechError::ChecksumMismatch { id: 4 })));

        let overload = vec![0x20, checksum(&[4, 2, 0x20])];
        assert!(matches!(
            parse_status(4, 2, &overload),
            Err(FeetechError::ServoStatus { id: 4, status: 0x20 })
        ));
    }
}
