//! AT command identifiers and status codes
//!
//! # AT Command Frame (0x08)
//!
//! ```text
//! [frame_id: u8][mnemonic: 2 ASCII bytes][parameter...]
//! ```
//!
//! A query carries no parameter; a set carries the new value.
//!
//! # AT Response Frame (0x88)
//!
//! ```text
//! [frame_id: u8][mnemonic: 2 ASCII bytes][status: u8][data...]
//! ```

/// AT commands understood by the modem
///
/// Each maps to a fixed two-character mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtCommand {
    /// Exit command mode (CN)
    ExitCommandMode,
    /// API enable (AP)
    ApiEnable,
    /// API options (AO)
    ApiOptions,
    /// Baud rate (BD)
    BaudRate,
    /// Write settings to non-volatile memory (WR)
    Write,
    /// Restore factory defaults (RE)
    RestoreDefaults,
    /// Firmware version (VR)
    FirmwareVersion,
    /// Apply pending changes (AC)
    ApplyChanges,
    /// Network reset (NR)
    NetworkReset,
    /// Software reset (FR)
    SoftwareReset,
    /// LoRaWAN device EUI (DE)
    DevEui,
    /// LoRaWAN application key (AK)
    AppKey,
    /// LoRaWAN application EUI (AE)
    AppEui,
    /// LoRaWAN network key (NK)
    NwkKey,
    /// LoRaWAN join status (JS)
    JoinStatus,
    /// Test configuration frequency (FQ)
    TestFrequency,
    /// Test configuration power (PW)
    TestPower,
}

impl AtCommand {
    /// Every command, in declaration order
    pub const ALL: [AtCommand; 17] = [
        AtCommand::ExitCommandMode,
        AtCommand::ApiEnable,
        AtCommand::ApiOptions,
        AtCommand::BaudRate,
        AtCommand::Write,
        AtCommand::RestoreDefaults,
        AtCommand::FirmwareVersion,
        AtCommand::ApplyChanges,
        AtCommand::NetworkReset,
        AtCommand::SoftwareReset,
        AtCommand::DevEui,
        AtCommand::AppKey,
        AtCommand::AppEui,
        AtCommand::NwkKey,
        AtCommand::JoinStatus,
        AtCommand::TestFrequency,
        AtCommand::TestPower,
    ];

    /// The two-character wire mnemonic
    pub const fn as_str(self) -> &'static str {
        match self {
            AtCommand::ExitCommandMode => "CN",
            AtCommand::ApiEnable => "AP",
            AtCommand::ApiOptions => "AO",
            AtCommand::BaudRate => "BD",
            AtCommand::Write => "WR",
            AtCommand::RestoreDefaults => "RE",
            AtCommand::FirmwareVersion => "VR",
            AtCommand::ApplyChanges => "AC",
            AtCommand::NetworkReset => "NR",
            AtCommand::SoftwareReset => "FR",
            AtCommand::DevEui => "DE",
            AtCommand::AppKey => "AK",
            AtCommand::AppEui => "AE",
            AtCommand::NwkKey => "NK",
            AtCommand::JoinStatus => "JS",
            AtCommand::TestFrequency => "FQ",
            AtCommand::TestPower => "PW",
        }
    }

    /// The mnemonic as the two bytes sent on the wire
    pub const fn mnemonic(self) -> [u8; 2] {
        let bytes = self.as_str().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// Look a command up by its wire mnemonic
    pub fn from_mnemonic(mnemonic: &[u8]) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.mnemonic() == mnemonic)
    }
}

/// Command status byte of an AT response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtStatus {
    /// Command accepted (0x00)
    Ok,
    /// Generic error (0x01)
    Error,
    /// Unknown command (0x02)
    InvalidCommand,
    /// Parameter rejected (0x03)
    InvalidParameter,
    /// Any other status value
    Other(u8),
}

impl AtStatus {
    /// Decode a status byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => AtStatus::Ok,
            0x01 => AtStatus::Error,
            0x02 => AtStatus::InvalidCommand,
            0x03 => AtStatus::InvalidParameter,
            other => AtStatus::Other(other),
        }
    }

    /// The raw status byte
    pub fn as_byte(self) -> u8 {
        match self {
            AtStatus::Ok => 0x00,
            AtStatus::Error => 0x01,
            AtStatus::InvalidCommand => 0x02,
            AtStatus::InvalidParameter => 0x03,
            AtStatus::Other(byte) => byte,
        }
    }

    pub fn is_ok(self) -> bool {
        self == AtStatus::Ok
    }
}

/// Modem status values reported in 0x8A frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemStatus {
    /// Power-up or hardware reset (0x00)
    HardwareReset,
    /// Watchdog timer reset (0x01)
    WatchdogReset,
    /// Joined the LoRaWAN network (0x02)
    Joined,
    /// Left the network (0x03)
    Disassociated,
    /// Supply voltage out of range (0x0D)
    VoltageLimitExceeded,
    /// Configuration changed while a join was in progress (0x11)
    ConfigChangedDuringJoin,
    /// Any other status value
    Other(u8),
}

impl ModemStatus {
    /// Decode a modem status byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => ModemStatus::HardwareReset,
            0x01 => ModemStatus::WatchdogReset,
            0x02 => ModemStatus::Joined,
            0x03 => ModemStatus::Disassociated,
            0x0D => ModemStatus::VoltageLimitExceeded,
            0x11 => ModemStatus::ConfigChangedDuringJoin,
            other => ModemStatus::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_has_two_char_mnemonic() {
        for command in AtCommand::ALL {
            let mnemonic = command.as_str();
            assert_eq!(mnemonic.len(), 2, "{:?}", command);
            assert!(mnemonic.bytes().all(|b| b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_mnemonics_are_unique() {
        for (i, a) in AtCommand::ALL.iter().enumerate() {
            for b in &AtCommand::ALL[i + 1..] {
                assert_ne!(a.mnemonic(), b.mnemonic(), "{:?} / {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_lorawan_mnemonics() {
        assert_eq!(AtCommand::DevEui.as_str(), "DE");
        assert_eq!(AtCommand::AppEui.as_str(), "AE");
        assert_eq!(AtCommand::AppKey.as_str(), "AK");
        assert_eq!(AtCommand::NwkKey.as_str(), "NK");
        assert_eq!(AtCommand::JoinStatus.as_str(), "JS");
        assert_eq!(AtCommand::Write.as_str(), "WR");
        assert_eq!(AtCommand::ApplyChanges.as_str(), "AC");
    }

    #[test]
    fn test_from_mnemonic() {
        assert_eq!(AtCommand::from_mnemonic(b"JS"), Some(AtCommand::JoinStatus));
        assert_eq!(AtCommand::from_mnemonic(b"ZZ"), None);
        assert_eq!(AtCommand::from_mnemonic(b"J"), None);
    }

    #[test]
    fn test_status_bytes() {
        assert!(AtStatus::from_byte(0).is_ok());
        assert_eq!(AtStatus::from_byte(3), AtStatus::InvalidParameter);
        assert_eq!(AtStatus::from_byte(0x40), AtStatus::Other(0x40));
        assert_eq!(AtStatus::Other(0x40).as_byte(), 0x40);
    }

    #[test]
    fn test_modem_status() {
        assert_eq!(ModemStatus::from_byte(0x02), ModemStatus::Joined);
        assert_eq!(ModemStatus::from_byte(0x7F), ModemStatus::Other(0x7F));
    }
}
