//! BLE Service and Characteristic UUIDs.
//!
//! Contains the GATT layout of the cat printer peripheral.

use uuid::Uuid;

// Printer Service
/// Printer service UUID, as advertised by most stacks (BlueZ among them).
pub const PRINTER_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_ae30_0000_1000_8000_00805f9b34fb);
/// Printer service UUID as reported by CoreBluetooth for the same hardware.
pub const PRINTER_SERVICE_ALT_UUID: Uuid =
    Uuid::from_u128(0x0000_af30_0000_1000_8000_00805f9b34fb);

/// Every service UUID a printer may advertise under.
pub const PRINTER_SERVICE_UUIDS: [Uuid; 2] = [PRINTER_SERVICE_UUID, PRINTER_SERVICE_ALT_UUID];

/// Print data characteristic UUID (Write).
pub const PRINT_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000_ae01_0000_1000_8000_00805f9b34fb);
